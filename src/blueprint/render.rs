//! Writing a resolved blueprint to disk

use super::document::TemplateFile;
use super::prepare::PreparedData;
use super::repository::BlueprintRepository;
use super::variable::{Variable, evaluate_condition};
use crate::core::{Result, XlError};
use crate::functions::FunctionRegistry;
use crate::utils::{atomic_write, safe_write, validate_relative_path};
use crate::values::write_properties;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tera::{Context as TeraContext, Tera};
use tracing::{debug, info};

pub const VALUES_FILE: &str = "values.xlvals";
pub const VALUES_FILE_HEADER: &str = "# This file includes all non-secret values, you can add variables here and then refer them with '!value' tag in YAML files";
pub const SECRETS_FILE: &str = "secrets.xlvals";
pub const SECRETS_FILE_HEADER: &str = "# This file includes all secret values, and will be excluded from GIT. You can add new values and/or edit them and then refer to them using '!value' YAML tag";
pub const GITIGNORE_FILE: &str = ".gitignore";

/// Writes `values.xlvals`, `secrets.xlvals` and `.gitignore` into `output_dir`.
pub fn write_value_files(data: &PreparedData, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let values = output_dir.join(VALUES_FILE);
    write_properties(VALUES_FILE_HEADER, &data.values, &values)?;

    let secrets = output_dir.join(SECRETS_FILE);
    write_properties(SECRETS_FILE_HEADER, &data.secrets, &secrets)?;

    let gitignore = output_dir.join(GITIGNORE_FILE);
    safe_write(&gitignore, SECRETS_FILE)?;
    info!("[file] Blueprint output file '{}' generated successfully", gitignore.display());

    Ok(vec![values, secrets, gitignore])
}

/// Renders or copies every file whose conditions hold.
///
/// Files ending in `template_suffix` are rendered with the template data and
/// written without the suffix, trimmed of surrounding whitespace. Other files
/// are copied byte for byte.
pub fn render_files(
    repository: &dyn BlueprintRepository,
    files: &[TemplateFile],
    variables: &[Variable],
    data: &PreparedData,
    functions: &FunctionRegistry,
    template_suffix: &str,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for file in files {
        if !file.depends_on_true.is_empty() && !evaluate_condition(&file.depends_on_true, variables, functions)? {
            debug!("[file] Skipping {} because dependsOnTrue [{}] is false", file.path, file.depends_on_true.val);
            continue;
        }
        if !file.depends_on_false.is_empty() && evaluate_condition(&file.depends_on_false, variables, functions)? {
            debug!("[file] Skipping {} because dependsOnFalse [{}] is true", file.path, file.depends_on_false.val);
            continue;
        }

        validate_relative_path(&file.path, "blueprint files")?;
        let content = repository.get_file_contents(&file.path)?;

        let template_name = if template_suffix.is_empty() {
            None
        } else {
            file.path.strip_suffix(template_suffix)
        };

        let target = match template_name {
            Some(output_name) => {
                debug!("[file] Processing template file {}", file.path);
                let source = String::from_utf8(content).map_err(|_| XlError::TemplateRender {
                    file: file.path.clone(),
                    reason: "template is not valid UTF-8".to_string(),
                })?;
                let rendered = render_template(&file.path, &source, &data.template_data)?;
                let target = output_dir.join(output_name);
                safe_write(&target, &rendered)?;
                target
            }
            None => {
                debug!("[file] Copying file {}", file.path);
                let target = output_dir.join(&file.path);
                atomic_write(&target, &content)?;
                target
            }
        };

        info!("[file] Blueprint output file '{}' generated successfully", target.display());
        written.push(target);
    }

    Ok(written)
}

/// Renders one template against the template data.
pub fn render_template(name: &str, source: &str, data: &BTreeMap<String, String>) -> Result<String> {
    let mut tera = Tera::default();
    tera.register_filter("kebabcase", kebabcase_filter);

    let context = TeraContext::from_serialize(data).map_err(|e| XlError::TemplateRender {
        file: name.to_string(),
        reason: format_tera_error(&e),
    })?;

    let rendered = tera.render_str(source, &context).map_err(|e| XlError::TemplateRender {
        file: name.to_string(),
        reason: format_tera_error(&e),
    })?;
    Ok(rendered.trim().to_string())
}

fn kebabcase_filter(value: &tera::Value, _args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
    let text = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("kebabcase filter expects a string"))?;
    Ok(tera::Value::String(to_kebab_case(text)))
}

/// Splits `input` into lowercase words and joins them with `-`.
///
/// Word boundaries are non-alphanumeric characters, a lowercase letter or
/// digit followed by an uppercase letter, and the last capital of an acronym
/// followed by a lowercase letter (`HTTPServer` is `http-server`).
pub fn to_kebab_case(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }

    words.join("-")
}

fn format_tera_error(error: &tera::Error) -> String {
    use std::error::Error;

    let mut messages = Vec::new();
    let mut current: Option<&dyn Error> = Some(error);
    while let Some(err) = current {
        let cleaned = err
            .to_string()
            .replace("while rendering '__tera_one_off'", "")
            .replace("Failed to render '__tera_one_off'", "")
            .replace("Failed to parse '__tera_one_off'", "syntax error")
            .replace("'__tera_one_off'", "template")
            .trim()
            .to_string();
        if !cleaned.is_empty() {
            messages.push(cleaned);
        }
        current = err.source();
    }

    if messages.is_empty() {
        error.to_string()
    } else {
        messages.join(": ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::repository::LocalBlueprintRepository;
    use crate::blueprint::variable::{VarField, parse_variables};
    use serde_yaml::Mapping;
    use tempfile::TempDir;

    #[test]
    fn test_kebab_case() {
        assert_eq!(to_kebab_case("HelloWorld"), "hello-world");
        assert_eq!(to_kebab_case("HTTPServer"), "http-server");
        assert_eq!(to_kebab_case("my_var name"), "my-var-name");
        assert_eq!(to_kebab_case("Area51Test"), "area51-test");
        assert_eq!(to_kebab_case("already-kebab"), "already-kebab");
    }

    #[test]
    fn test_render_template_trims_and_filters() {
        let data = BTreeMap::from([("AppName".to_string(), "MyShinyApp".to_string())]);
        let rendered = render_template("app.yaml.tmpl", "\n  name: {{ AppName | kebabcase }}\n\n", &data).unwrap();
        assert_eq!(rendered, "name: my-shiny-app");
    }

    #[test]
    fn test_render_template_error_names_file() {
        let err = render_template("bad.tmpl", "{{ missing }}", &BTreeMap::new()).unwrap_err();
        let XlError::TemplateRender { file, reason } = err else {
            panic!("unexpected error");
        };
        assert_eq!(file, "bad.tmpl");
        assert!(reason.contains("missing"), "{reason}");
    }

    #[test]
    fn test_render_files_honours_conditions() {
        let source = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        std::fs::create_dir(source.path().join("docker")).unwrap();
        std::fs::write(source.path().join("app.yaml.tmpl"), "app: {{ name }}\n").unwrap();
        std::fs::write(source.path().join("docker/Dockerfile"), "FROM scratch\n").unwrap();
        std::fs::write(source.path().join("legacy.txt"), "old").unwrap();

        let maps: Vec<Mapping> = serde_yaml::from_str("- name: docker\n  type: Confirm\n").unwrap();
        let mut variables = parse_variables(&maps).unwrap();
        variables[0].value.bool = true;

        let mut data = PreparedData::default();
        data.template_data.insert("name".to_string(), "shop".to_string());

        let files = vec![
            TemplateFile::new("app.yaml.tmpl"),
            TemplateFile {
                path: "docker/Dockerfile".to_string(),
                depends_on_true: VarField::literal("docker"),
                ..TemplateFile::default()
            },
            TemplateFile {
                path: "legacy.txt".to_string(),
                depends_on_false: VarField::literal("docker"),
                ..TemplateFile::default()
            },
        ];

        let repo = LocalBlueprintRepository::new(source.path()).unwrap();
        let written = render_files(
            &repo,
            &files,
            &variables,
            &data,
            &FunctionRegistry::new(),
            ".tmpl",
            output.path(),
        )
        .unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(std::fs::read_to_string(output.path().join("app.yaml")).unwrap(), "app: shop");
        assert_eq!(std::fs::read_to_string(output.path().join("docker/Dockerfile")).unwrap(), "FROM scratch\n");
        assert!(!output.path().join("legacy.txt").exists());
    }

    #[test]
    fn test_value_files() {
        let output = TempDir::new().unwrap();
        let mut data = PreparedData::default();
        data.values.insert("b".to_string(), "2".to_string());
        data.values.insert("a".to_string(), "1".to_string());
        data.secrets.insert("pass".to_string(), "x".to_string());

        write_value_files(&data, output.path()).unwrap();

        let values = std::fs::read_to_string(output.path().join(VALUES_FILE)).unwrap();
        assert_eq!(values, format!("{VALUES_FILE_HEADER}\na = 1\nb = 2\n"));
        let secrets = std::fs::read_to_string(output.path().join(SECRETS_FILE)).unwrap();
        assert!(secrets.starts_with(SECRETS_FILE_HEADER));
        assert!(secrets.contains("pass = x"));
        assert_eq!(std::fs::read_to_string(output.path().join(GITIGNORE_FILE)).unwrap(), "secrets.xlvals");
    }
}
