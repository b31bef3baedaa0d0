//! Document processing end to end: imports, value contexts, tags and bundles

use anyhow::Result;
use std::io::Read;
use xl_render::config::EngineConfig;
use xl_render::core::XlError;
use xl_render::imports::resolve_all;
use xl_render::targets::{CONTENT_TYPE_YAML, CONTENT_TYPE_ZIP, apply_files};
use xl_render::test_utils::init_test_logging;
use xl_render::values::ValueMap;

use crate::common::{RecordingTransport, TestProject, test_functions};

fn config() -> EngineConfig {
    EngineConfig {
        include_home_values: false,
        ..EngineConfig::default()
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

#[test]
fn test_diamond_import_reads_shared_file_once() -> Result<()> {
    init_test_logging(None);
    let project = TestProject::new()?;
    project.write("a.yaml", "apiVersion: xl-deploy/v1\nkind: Infrastructure\nspec:\n- name: shared\n")?;
    let b = project.write(
        "b.yaml",
        "apiVersion: xl-deploy/v1\nkind: Environments\nmetadata:\n  imports:\n  - a.yaml\nspec:\n- name: b\n",
    )?;
    let c = project.write(
        "c.yaml",
        "apiVersion: xl-deploy/v1\nkind: Environments\nmetadata:\n  imports:\n  - a.yaml\nspec:\n- name: c\n",
    )?;

    let files = resolve_all(&[b.clone(), c.clone()])?;
    let names: Vec<String> = files.iter().map(|f| file_name(&f.file_name)).collect();
    assert_eq!(names, ["a.yaml", "b.yaml", "c.yaml"]);

    let mut transport = RecordingTransport::default();
    let summary = apply_files(&config(), &[b, c], &ValueMap::new(), &[], &test_functions(), &mut transport)?;
    assert_eq!(summary.files, 3);
    assert_eq!(transport.sent.len(), 3);
    assert!(transport.sent[0].text().contains("name: shared"));
    for payload in &transport.sent {
        assert!(!payload.text().contains("imports"), "{}", payload.text());
    }
    Ok(())
}

#[test]
fn test_unknown_api_version_end_to_end() -> Result<()> {
    let project = TestProject::new()?;
    let file = project.write("deploy.yaml", "apiVersion: xl-unknown/v1\nkind: Applications\nspec:\n- name: app\n")?;

    let mut transport = RecordingTransport::default();
    let err = apply_files(&config(), &[file], &ValueMap::new(), &[], &test_functions(), &mut transport)
        .expect_err("unknown apiVersion must fail");

    let XlError::DocumentError { line, source, .. } = &err else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!(*line, 1);
    assert_eq!(source.to_string(), "unknown apiVersion: xl-unknown/v1");
    assert!(err.to_string().contains("unknown apiVersion: xl-unknown/v1"));
    assert!(transport.sent.is_empty());
    Ok(())
}

#[test]
fn test_tags_resolved_from_values_and_functions() -> Result<()> {
    let project = TestProject::new()?;
    project.write("env.xlvals", "host = db.local\nport = 5432\n")?;
    let file = project.write(
        "infra.yaml",
        r#"apiVersion: xl-release/v1
kind: Templates
spec:
- name: db
  url: !format 'jdbc://%host%:%port%/%%'
  region: !fn test.regions()[1]
  joined: !fn test.echo(a, b)
  user: !value user
"#,
    )?;

    let overrides = ValueMap::from([("user".to_string(), "admin".to_string())]);
    let mut transport = RecordingTransport::default();
    apply_files(&config(), &[file], &overrides, &[], &test_functions(), &mut transport)?;

    let sent = &transport.sent[0];
    assert_eq!(sent.path, "devops-as-code/apply");
    assert_eq!(sent.content_type, CONTENT_TYPE_YAML);
    let body = sent.text();
    assert!(body.contains("jdbc://db.local:5432/%"), "{body}");
    assert!(body.contains("region: us-east-1"), "{body}");
    assert!(body.contains("joined: a-b"), "{body}");
    assert!(body.contains("user: admin"), "{body}");
    Ok(())
}

#[test]
fn test_file_tags_produce_single_entry_bundle() -> Result<()> {
    let project = TestProject::new()?;
    project.write("build/app.war", "war-bytes")?;
    let file = project.write(
        "app.yaml",
        r#"apiVersion: xl-deploy/v1
kind: Applications
spec:
- name: app
  deployables:
  - name: war
    file: !file build/app.war
  - name: war-copy
    file: !file build/app.war
"#,
    )?;

    let mut transport = RecordingTransport::default();
    apply_files(&config(), &[file], &ValueMap::new(), &[], &test_functions(), &mut transport)?;

    let sent = &transport.sent[0];
    assert_eq!(sent.content_type, CONTENT_TYPE_ZIP);
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(sent.body.clone()))?;
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    assert_eq!(names, ["build/app.war", "index.yaml"]);

    let mut index = String::new();
    archive.by_name("index.yaml")?.read_to_string(&mut index)?;
    assert_eq!(index.matches("!file build/app.war").count(), 2);
    Ok(())
}

#[test]
fn test_parent_traversal_in_file_tag_is_rejected() -> Result<()> {
    let project = TestProject::new()?;
    project.write("secret.txt", "x")?;
    let file = project.write(
        "nested/app.yaml",
        "apiVersion: xl-deploy/v1\nkind: Applications\nspec:\n- file: !file ../secret.txt\n",
    )?;

    let mut transport = RecordingTransport::default();
    let err = apply_files(&config(), &[file], &ValueMap::new(), &[], &test_functions(), &mut transport)
        .expect_err("traversal must fail");
    assert!(err.to_string().contains("relative path with .. is not allowed in !file tag: ../secret.txt"));
    Ok(())
}
