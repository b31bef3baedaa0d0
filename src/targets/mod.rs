//! Target systems and single-document processing
//!
//! Each document is routed by its `apiVersion` to a [`Target`]:
//!
//! | apiVersion      | target     | apply path                       | bundles |
//! |-----------------|------------|----------------------------------|---------|
//! | `xl-deploy/v1`  | XL Deploy  | `deployit/devops-as-code/apply`  | yes     |
//! | `xl-release/v1` | XL Release | `devops-as-code/apply`           | no      |
//!
//! Delivery is delegated to a [`Transport`]; this crate only prepares the
//! payload (the rendered YAML, or the artifact bundle when `!file` tags are used).

pub mod apply;
pub mod transport;

pub use apply::{ApplySummary, apply_files};
pub use transport::{CONTENT_TYPE_YAML, CONTENT_TYPE_ZIP, DirectoryTransport, Transport};

use crate::config::EngineConfig;
use crate::constants::{XL_DEPLOY_API_VERSION, XL_RELEASE_API_VERSION};
use crate::core::{Result, XlError};
use crate::document::{Document, ResolutionContext, resolve_document};
use crate::functions::FunctionRegistry;
use crate::utils::read_bytes;
use crate::values::ValueMap;
use std::path::Path;
use tracing::{debug, info};

/// The systems documents can be sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// XL Deploy, `xl-deploy/v1`
    XlDeploy,
    /// XL Release, `xl-release/v1`
    XlRelease,
}

impl TargetKind {
    /// The `apiVersion` routed to this target
    pub const fn api_version(self) -> &'static str {
        match self {
            Self::XlDeploy => XL_DEPLOY_API_VERSION,
            Self::XlRelease => XL_RELEASE_API_VERSION,
        }
    }

    /// Endpoint receiving applied documents
    pub const fn apply_path(self) -> &'static str {
        match self {
            Self::XlDeploy => "deployit/devops-as-code/apply",
            Self::XlRelease => "devops-as-code/apply",
        }
    }

    /// Human-readable name
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::XlDeploy => "XL Deploy",
            Self::XlRelease => "XL Release",
        }
    }

    /// Whether the target accepts artifact bundles
    pub const fn supports_bundles(self) -> bool {
        matches!(self, Self::XlDeploy)
    }
}

/// A configured target: its kind and the metadata homes it injects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Which system this is
    pub kind: TargetKind,
    /// `(metadata key, home)` pairs added to documents lacking them
    pub homes: Vec<(&'static str, String)>,
}

impl Target {
    /// XL Deploy target with its four homes
    pub fn xl_deploy(config: &crate::config::XlDeployConfig) -> Self {
        Self {
            kind: TargetKind::XlDeploy,
            homes: vec![
                ("Applications-home", config.applications_home.clone()),
                ("Environments-home", config.environments_home.clone()),
                ("Infrastructure-home", config.infrastructure_home.clone()),
                ("Configuration-home", config.configuration_home.clone()),
            ],
        }
    }

    /// XL Release target with its home
    pub fn xl_release(config: &crate::config::XlReleaseConfig) -> Self {
        Self {
            kind: TargetKind::XlRelease,
            homes: vec![("home", config.home.clone())],
        }
    }

    /// Whether this target handles the document
    pub fn accepts(&self, doc: &Document) -> bool {
        doc.api_version == self.kind.api_version()
    }

    /// Adds configured homes the document does not set itself
    pub fn preprocess(&self, doc: &mut Document) {
        for (key, home) in &self.homes {
            doc.add_metadata_if_missing(key, home);
        }
    }
}

/// Everything needed to process documents during one invocation
#[derive(Debug)]
pub struct Context<'a> {
    /// Known targets, tried in order
    pub targets: Vec<Target>,
    /// Value context for `!value` and `!format`
    pub values: ValueMap,
    /// Registry for `!fn`
    pub functions: &'a FunctionRegistry,
}

impl<'a> Context<'a> {
    /// Builds a context with both targets configured from `config`
    pub fn new(config: &EngineConfig, values: ValueMap, functions: &'a FunctionRegistry) -> Self {
        Self {
            targets: vec![Target::xl_deploy(&config.xl_deploy), Target::xl_release(&config.xl_release)],
            values,
            functions,
        }
    }

    /// Finds the target handling `doc`.
    ///
    /// # Errors
    ///
    /// [`XlError::UnknownApiVersion`] if no target accepts the document.
    pub fn document_target(&self, doc: &Document) -> Result<&Target> {
        self.targets.iter().find(|t| t.accepts(doc)).ok_or_else(|| XlError::UnknownApiVersion {
            api_version: doc.api_version.clone(),
        })
    }

    /// Resolves tags in `doc` and sends it to its target.
    ///
    /// Steps: target homes are added, tags are resolved (with `artifacts_dir`
    /// for `!file`), the target is selected by `apiVersion`, and the rendered
    /// YAML or the artifact bundle is handed to `transport`. The bundle is
    /// deleted afterwards whatever the outcome.
    pub fn process_single_document(
        &self,
        doc: &mut Document,
        artifacts_dir: Option<&Path>,
        transport: &mut dyn Transport,
    ) -> Result<()> {
        let result = self.prepare_and_send(doc, artifacts_dir, transport);
        let cleanup = doc.cleanup();
        result.and(cleanup)
    }

    fn prepare_and_send(
        &self,
        doc: &mut Document,
        artifacts_dir: Option<&Path>,
        transport: &mut dyn Transport,
    ) -> Result<()> {
        for target in &self.targets {
            if target.accepts(doc) {
                target.preprocess(doc);
            }
        }

        resolve_document(
            doc,
            ResolutionContext {
                values: &self.values,
                artifacts_dir,
                functions: self.functions,
            },
        )?;

        if doc.api_version.is_empty() {
            return Err(XlError::MissingApiVersion);
        }
        let target = self.document_target(doc)?;
        let path = target.kind.apply_path();

        match doc.apply_zip_path() {
            Some(zip) => {
                if !target.kind.supports_bundles() {
                    return Err(XlError::FileTagsNotSupported {
                        target: target.kind.display_name().to_string(),
                    });
                }
                debug!("\tdocument contains !file tags, sending ZIP file with YAML document and artifacts");
                let body = read_bytes(zip)?;
                send(transport, path, CONTENT_TYPE_ZIP, &body)?;
            }
            None => {
                let body = doc.render_yaml()?;
                send(transport, path, CONTENT_TYPE_YAML, body.as_bytes())?;
            }
        }

        info!("Sent {} document to {}", doc.kind, target.kind.display_name());
        Ok(())
    }
}

fn send(transport: &mut dyn Transport, path: &str, content_type: &str, body: &[u8]) -> Result<()> {
    transport.send(path, content_type, body).map_err(|e| XlError::SendFailed {
        path: path.to_string(),
        reason: format!("{e:#}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{XlDeployConfig, XlReleaseConfig};
    use crate::document::parse_yaml_document;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recording {
        sent: Vec<(String, String, Vec<u8>)>,
    }

    impl Transport for Recording {
        fn send(&mut self, path: &str, content_type: &str, body: &[u8]) -> anyhow::Result<()> {
            self.sent.push((path.to_string(), content_type.to_string(), body.to_vec()));
            Ok(())
        }
    }

    fn config() -> EngineConfig {
        EngineConfig {
            xl_deploy: XlDeployConfig {
                applications_home: "Applications/Configured".to_string(),
                ..XlDeployConfig::default()
            },
            xl_release: XlReleaseConfig {
                home: "Configured".to_string(),
            },
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_unknown_api_version() {
        let functions = FunctionRegistry::new();
        let context = Context::new(&config(), ValueMap::new(), &functions);
        let mut doc = parse_yaml_document("apiVersion: xl-unknown/v1\nkind: Applications\n").unwrap();
        let mut transport = Recording::default();

        let err = context.process_single_document(&mut doc, None, &mut transport).unwrap_err();
        assert_eq!(err.to_string(), "unknown apiVersion: xl-unknown/v1");
        assert!(transport.sent.is_empty());
    }

    #[test]
    fn test_missing_api_version() {
        let functions = FunctionRegistry::new();
        let context = Context::new(&config(), ValueMap::new(), &functions);
        let mut doc = parse_yaml_document("kind: Applications\n").unwrap();
        let err = context.process_single_document(&mut doc, None, &mut Recording::default()).unwrap_err();
        assert_eq!(err.to_string(), "apiVersion missing");
    }

    #[test]
    fn test_homes_added_only_when_missing() {
        let functions = FunctionRegistry::new();
        let context = Context::new(&config(), ValueMap::new(), &functions);
        let mut doc = parse_yaml_document(
            "apiVersion: xl-release/v1\nkind: Templates\nmetadata:\n  home: Own\n",
        )
        .unwrap();
        let mut deploy_doc = parse_yaml_document("apiVersion: xl-deploy/v1\nkind: Applications\n").unwrap();
        let mut transport = Recording::default();

        context.process_single_document(&mut doc, None, &mut transport).unwrap();
        context.process_single_document(&mut deploy_doc, None, &mut transport).unwrap();

        assert_eq!(doc.metadata_str("home"), Some("Own"));
        assert_eq!(deploy_doc.metadata_str("Applications-home"), Some("Applications/Configured"));
        assert!(!deploy_doc.metadata.contains_key("Environments-home"));

        assert_eq!(transport.sent[0].0, "devops-as-code/apply");
        assert_eq!(transport.sent[0].1, CONTENT_TYPE_YAML);
        assert_eq!(transport.sent[1].0, "deployit/devops-as-code/apply");
    }

    #[test]
    fn test_bundle_sent_as_zip_and_removed() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("app.war"), b"war").unwrap();
        let functions = FunctionRegistry::new();
        let context = Context::new(&config(), ValueMap::new(), &functions);
        let mut doc = parse_yaml_document(
            "apiVersion: xl-deploy/v1\nkind: Applications\nspec:\n- name: app\n  file: !file app.war\n",
        )
        .unwrap();
        let mut transport = Recording::default();

        context.process_single_document(&mut doc, Some(temp.path()), &mut transport).unwrap();

        assert_eq!(transport.sent.len(), 1);
        assert_eq!(transport.sent[0].1, CONTENT_TYPE_ZIP);
        assert!(transport.sent[0].2.starts_with(b"PK"));
        assert!(doc.apply_zip.is_none());
    }

    #[test]
    fn test_release_rejects_bundles() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("app.war"), b"war").unwrap();
        let functions = FunctionRegistry::new();
        let context = Context::new(&config(), ValueMap::new(), &functions);
        let mut doc = parse_yaml_document(
            "apiVersion: xl-release/v1\nkind: Templates\nspec:\n- file: !file app.war\n",
        )
        .unwrap();

        let err = context
            .process_single_document(&mut doc, Some(temp.path()), &mut Recording::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "file tags found but XL Release does not support file references");
        assert!(doc.apply_zip.is_none());
    }
}
