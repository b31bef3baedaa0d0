//! Blueprint variable resolution and generation through the public API

use anyhow::Result;
use serde_yaml::Mapping;
use xl_render::blueprint::variable::parse_variables;
use xl_render::blueprint::{
    LocalBlueprintRepository, Question, ScriptedPrompter, Variable, generate_blueprint, prepare_template_data,
};
use xl_render::config::EngineConfig;
use xl_render::core::XlError;

use crate::common::{RecordingPrompter, TestProject, test_functions};

fn variables(yaml: &str) -> Vec<Variable> {
    let maps: Vec<Mapping> = serde_yaml::from_str(yaml).expect("valid parameter list");
    parse_variables(&maps).expect("valid variables")
}

#[test]
fn test_secret_input_and_function_options() -> Result<()> {
    let mut vars = variables(
        r#"
- name: pass
  type: Input
  secret: true
- name: test
  type: Input
  default: lala
  saveInXlVals: true
- name: select
  type: Select
  options:
  - a
  - b
  - !fn test.regions()
  default: b
  saveInXlVals: true
"#,
    );
    let mut prompter = RecordingPrompter::new(ScriptedPrompter::new().answer("pass", "p4ss"));

    let data = prepare_template_data(&mut vars, &mut prompter, &test_functions())?;

    assert_eq!(data.secrets.get("pass").map(String::as_str), Some("p4ss"));
    assert_eq!(data.template_data.get("pass").map(String::as_str), Some("!value pass"));
    assert!(!data.values.contains_key("pass"));

    assert_eq!(data.values.get("test").map(String::as_str), Some("lala"));
    assert_eq!(data.values.get("select").map(String::as_str), Some("b"));
    assert_eq!(data.template_data.get("test").map(String::as_str), Some("lala"));
    assert_eq!(data.template_data.get("select").map(String::as_str), Some("b"));

    let Some(Question::Select { options, .. }) = prompter.question("select") else {
        panic!("select question not asked: {:?}", prompter.questions);
    };
    assert_eq!(options, &["a", "b", "eu-west-1", "us-east-1"]);

    let Some(Question::Input { secret, .. }) = prompter.question("pass") else {
        panic!("pass question not asked");
    };
    assert!(*secret);
    Ok(())
}

#[test]
fn test_confirm_defaults_to_false() -> Result<()> {
    let mut vars = variables("- name: useCache\n  type: Confirm\n");
    let mut prompter = RecordingPrompter::default();

    let data = prepare_template_data(&mut vars, &mut prompter, &test_functions())?;

    assert_eq!(data.template_data.get("useCache").map(String::as_str), Some("false"));
    assert!(matches!(prompter.question("useCache"), Some(Question::Confirm { default: false, .. })));
    Ok(())
}

#[test]
fn test_depends_on_false_skips_when_condition_holds() -> Result<()> {
    let mut vars = variables(
        r#"
- name: managed
  type: Confirm
- name: host
  type: Input
  default: localhost
  dependsOnFalse: managed
- name: tier
  type: Input
  default: basic
  dependsOnTrue: managed
"#,
    );
    let mut prompter = RecordingPrompter::new(ScriptedPrompter::new().answer("managed", "true").answer("tier", "gold"));

    let data = prepare_template_data(&mut vars, &mut prompter, &test_functions())?;

    let asked: Vec<&str> = prompter.questions.iter().map(Question::name).collect();
    assert_eq!(asked, ["managed", "tier"]);
    assert_eq!(data.template_data.get("host").map(String::as_str), Some("localhost"));
    assert_eq!(data.template_data.get("tier").map(String::as_str), Some("gold"));
    Ok(())
}

#[test]
fn test_function_condition_and_preset_value() -> Result<()> {
    let mut vars = variables(
        r#"
- name: region
  type: Input
  value: !fn test.regions()[1]
- name: flagged
  type: Input
  default: enabled
  dependsOnTrue: !fn test.flag(false)
"#,
    );
    let mut prompter = RecordingPrompter::default();

    let data = prepare_template_data(&mut vars, &mut prompter, &test_functions())?;

    assert!(prompter.questions.is_empty());
    assert_eq!(data.template_data.get("region").map(String::as_str), Some("us-east-1"));
    assert_eq!(data.template_data.get("flagged").map(String::as_str), Some("enabled"));
    Ok(())
}

#[test]
fn test_generate_blueprint_end_to_end() -> Result<()> {
    let project = TestProject::new()?;
    project.write(
        "bp/blueprint.yaml",
        r#"apiVersion: xl/v1
kind: Blueprint
metadata:
  projectName: Shop
spec:
  parameters:
  - name: appName
    type: Input
    saveInXlVals: true
  - name: password
    type: Input
    secret: true
    default: changeme
  - name: withDb
    type: Confirm
  files:
  - path: xebialabs/app.yaml.tmpl
  - path: xebialabs/db.yaml
    dependsOnTrue: withDb
"#,
    )?;
    project.write(
        "bp/xebialabs/app.yaml.tmpl",
        "apiVersion: xl-deploy/v1\nkind: Applications\nspec:\n- name: {{ appName | kebabcase }}\n  password: {{ password }}\n",
    )?;
    project.write("bp/xebialabs/db.yaml", "db\n")?;

    let repository = LocalBlueprintRepository::new(project.path().join("bp"))?;
    let mut prompter = RecordingPrompter::new(ScriptedPrompter::new().answer("appName", "MyShopApp"));
    let config = EngineConfig {
        skip_final_prompt: true,
        ..EngineConfig::default()
    };
    let output = project.path().join("out");

    let generated = generate_blueprint(&config, &repository, &mut prompter, &test_functions(), &output)?;

    assert_eq!(generated.data.secrets.get("password").map(String::as_str), Some("changeme"));
    assert_eq!(
        project.read("out/xebialabs/app.yaml")?,
        "apiVersion: xl-deploy/v1\nkind: Applications\nspec:\n- name: my-shop-app\n  password: !value password"
    );
    assert!(!output.join("xebialabs/db.yaml").exists());
    assert!(project.read("out/values.xlvals")?.contains("appName = MyShopApp"));
    assert!(project.read("out/secrets.xlvals")?.contains("password = changeme"));
    assert_eq!(project.read("out/.gitignore")?, "secrets.xlvals");
    Ok(())
}

#[test]
fn test_missing_blueprint_metadata() -> Result<()> {
    let project = TestProject::new()?;
    project.write("bp/app.yaml.tmpl", "x")?;

    let repository = LocalBlueprintRepository::new(project.path().join("bp"))?;
    let mut prompter = RecordingPrompter::default();
    let err = generate_blueprint(
        &EngineConfig::default(),
        &repository,
        &mut prompter,
        &test_functions(),
        &project.path().join("out"),
    )
    .expect_err("blueprint.yaml is required");

    assert!(matches!(err, XlError::BlueprintNotFound { .. }));
    assert!(!project.path().join("out").exists());
    Ok(())
}
