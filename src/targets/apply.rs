//! Applying whole files: imports, value contexts and per-document processing

use super::{Context, Transport};
use crate::config::EngineConfig;
use crate::constants::IMPORT_KIND;
use crate::core::Result;
use crate::functions::FunctionRegistry;
use crate::imports::resolve_all;
use crate::values::{ValueMap, build_values, value_files_for};
use std::path::PathBuf;
use tracing::info;

/// Counts reported after a successful apply
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApplySummary {
    /// Files processed, imports included
    pub files: usize,
    /// Documents sent to a target
    pub documents: usize,
}

/// Applies `files` and everything they import.
///
/// Each file gets its own value context: home `.xlvals` files, then the
/// `.xlvals` files next to it, then `env` entries carrying the configured
/// prefix, then `overrides`. Documents of kind `Import` only carry imports
/// and are not sent. The first failure stops the run and is reported with the
/// file and line of the offending document.
pub fn apply_files(
    config: &EngineConfig,
    files: &[PathBuf],
    overrides: &ValueMap,
    env: &[(String, String)],
    functions: &FunctionRegistry,
    transport: &mut dyn Transport,
) -> Result<ApplySummary> {
    let resolved = resolve_all(files)?;
    let home = config.home_values_dir();
    let total = resolved.len();
    let mut summary = ApplySummary::default();

    for (index, mut file) in resolved.into_iter().enumerate() {
        let shown = file.file_name.display().to_string();
        match &file.parent {
            Some(parent) => info!("[{}/{total}] Applying {shown} (imported by {})", index + 1, parent.display()),
            None => info!("[{}/{total}] Applying {shown}", index + 1),
        }

        let base_dir = file.base_dir().to_path_buf();
        let value_files = value_files_for(home.as_deref(), &base_dir)?;
        let values = build_values(&value_files, env.iter().cloned(), overrides, &config.value_prefix)?;
        let context = Context::new(config, values, functions);

        for doc in &mut file.documents {
            if doc.kind == IMPORT_KIND {
                continue;
            }
            let line = doc.line;
            context
                .process_single_document(doc, Some(&base_dir), transport)
                .map_err(|e| e.in_document(shown.clone(), line))?;
            summary.documents += 1;
        }

        summary.files += 1;
        info!("Done");
    }

    Ok(summary)
}
