//! The `xlr` binary

use anyhow::Result;
use predicates::prelude::*;

use crate::common::TestProject;

#[test]
fn test_apply_writes_payload_per_document() -> Result<()> {
    let project = TestProject::new()?;
    project.write(
        "xebialabs.yaml",
        r#"apiVersion: xl-deploy/v1
kind: Applications
spec:
- name: !value app
---
apiVersion: xl-release/v1
kind: Templates
spec:
- name: release
"#,
    )?;

    project
        .xlr()
        .args(["apply", "-f", "xebialabs.yaml", "--values", "app=shop", "-o", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 documents from 1 files"));

    let deploy = project.read("out/001-deployit_devops-as-code_apply.yaml")?;
    assert!(deploy.contains("name: shop"), "{deploy}");
    let release = project.read("out/002-devops-as-code_apply.yaml")?;
    assert!(release.contains("kind: Templates"), "{release}");
    Ok(())
}

#[test]
fn test_apply_reports_unknown_api_version() -> Result<()> {
    let project = TestProject::new()?;
    project.write("bad.yaml", "apiVersion: xl-unknown/v1\nkind: Applications\nspec: []\n")?;

    project
        .xlr()
        .args(["apply", "-f", "bad.yaml", "-o", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown apiVersion: xl-unknown/v1"))
        .stderr(predicate::str::contains("bad.yaml"));

    assert!(!project.path().join("out/001-deployit_devops-as-code_apply.yaml").exists());
    Ok(())
}

#[test]
fn test_blueprint_with_defaults_and_answers() -> Result<()> {
    let project = TestProject::new()?;
    project.write(
        "bp/blueprint.yaml",
        "apiVersion: xl/v1\nkind: Blueprint\nspec:\n- name: name\n  type: Input\n  saveInXlVals: true\n- name: replicas\n  type: Input\n  default: '2'\n",
    )?;
    project.write("bp/deploy.yaml.tmpl", "app: {{ name }}\nreplicas: {{ replicas }}\n")?;

    project
        .xlr()
        .args(["blueprint", "-b", "bp", "-o", "gen", "--use-defaults", "--skip-final-prompt", "--answer", "name=shop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated"));

    assert_eq!(project.read("gen/deploy.yaml")?, "app: shop\nreplicas: 2");
    assert!(project.read("gen/values.xlvals")?.contains("name = shop"));
    Ok(())
}

#[test]
fn test_blueprint_missing_directory() -> Result<()> {
    let project = TestProject::new()?;

    project
        .xlr()
        .args(["blueprint", "-b", "nowhere", "--use-defaults"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nowhere"));
    Ok(())
}

#[test]
fn test_config_prints_effective_settings() -> Result<()> {
    let project = TestProject::new()?;

    project
        .xlr()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"value-prefix = "XL_VALUE_""#))
        .stdout(predicate::str::contains("include-home-values = false"));
    Ok(())
}

#[test]
fn test_config_init_refuses_to_overwrite() -> Result<()> {
    let project = TestProject::new()?;

    project
        .xlr()
        .args(["config", "--init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    project.xlr().args(["config", "--init", "--force"]).assert().success();
    let written = std::fs::read_to_string(project.config_path())?;
    assert!(written.contains("include-home-values = true"), "{written}");
    Ok(())
}
