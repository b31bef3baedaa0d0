//! Blueprint variable definitions
//!
//! A blueprint parameter is a YAML map:
//!
//! ```yaml
//! - name: ClusterName
//!   type: Input
//!   description: Name of the cluster
//!   default: !fn aws.regions(ecs)[0]
//!   dependsOnTrue: UseCluster
//!   pattern: '[a-z]+'
//!   saveInXlVals: true
//! ```
//!
//! Every known key fills one [`VarField`] slot; keys are matched without regard
//! to case. Unknown keys are rejected rather than ignored.

use crate::core::{Result, XlError};
use crate::document::CustomTag;
use crate::document::reader::describe;
use crate::document::resolver::TAG_FN;
use crate::functions::FunctionRegistry;
use crate::utils::closest_match;
use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

/// One variable attribute: a literal, a boolean, or a deferred `!fn` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarField {
    /// Literal text, or the function expression when `tag` is `!fn`
    pub val: String,
    /// Boolean reading of the field
    pub bool: bool,
    /// Empty for literals, `!fn` for function calls
    pub tag: String,
}

impl VarField {
    /// A literal text field
    pub fn literal(val: impl Into<String>) -> Self {
        Self {
            val: val.into(),
            ..Self::default()
        }
    }

    /// A boolean field; the text form is `true` or `false`
    pub fn boolean(value: bool) -> Self {
        Self {
            val: value.to_string(),
            bool: value,
            tag: String::new(),
        }
    }

    /// A deferred function call
    pub fn function(expression: impl Into<String>) -> Self {
        Self {
            val: expression.into(),
            bool: false,
            tag: TAG_FN.to_string(),
        }
    }

    /// Whether the field holds a `!fn` expression
    pub fn is_function(&self) -> bool {
        self.tag == TAG_FN
    }

    /// Whether the field was left unset
    pub fn is_empty(&self) -> bool {
        self.val.is_empty()
    }

    /// Reads a scalar YAML value (string, number, bool or `!fn` tag).
    ///
    /// `Ok(None)` for null, `Err` naming `found` for other shapes.
    pub(crate) fn from_yaml(value: &Value) -> std::result::Result<Option<Self>, FieldShapeError> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(Self::literal(s.as_str()))),
            Value::Bool(b) => Ok(Some(Self::boolean(*b))),
            Value::Number(n) => {
                let text = match n.as_f64() {
                    Some(f) if !(n.is_i64() || n.is_u64()) => format!("{f:.6}"),
                    _ => n.to_string(),
                };
                Ok(Some(Self::literal(text)))
            }
            Value::Tagged(tagged) => {
                let tag = CustomTag::from_tagged(tagged).ok_or(FieldShapeError::Shape("a tagged collection"))?;
                if tag.tag == TAG_FN {
                    Ok(Some(Self::function(tag.value)))
                } else {
                    Err(FieldShapeError::Tag(tag))
                }
            }
            other => Err(FieldShapeError::Shape(describe(other))),
        }
    }
}

/// Why a YAML value could not become a [`VarField`]
#[derive(Debug)]
pub(crate) enum FieldShapeError {
    Shape(&'static str),
    Tag(CustomTag),
}

/// The question kinds a variable can ask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    /// Free text, masked when secret
    Input,
    /// One of a list of options
    Select,
    /// Yes or no
    Confirm,
}

impl VariableType {
    /// Parses the `type` field, case-sensitive as written in blueprints.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Input" => Some(Self::Input),
            "Select" => Some(Self::Select),
            "Confirm" => Some(Self::Confirm),
            _ => None,
        }
    }
}

/// A parsed blueprint parameter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variable {
    pub name: VarField,
    pub kind: VarField,
    pub secret: VarField,
    pub value: VarField,
    pub description: VarField,
    pub default: VarField,
    pub depends_on_true: VarField,
    pub depends_on_false: VarField,
    pub options: Vec<VarField>,
    pub pattern: VarField,
    pub save_in_xl_vals: VarField,
}

#[derive(Clone, Copy)]
enum Field {
    Name,
    Type,
    Secret,
    Value,
    Description,
    Default,
    DependsOnTrue,
    DependsOnFalse,
    Options,
    Pattern,
    SaveInXlVals,
}

const FIELDS: &[(&str, Field)] = &[
    ("name", Field::Name),
    ("type", Field::Type),
    ("secret", Field::Secret),
    ("value", Field::Value),
    ("description", Field::Description),
    ("default", Field::Default),
    ("dependsOnTrue", Field::DependsOnTrue),
    ("dependsOnFalse", Field::DependsOnFalse),
    ("options", Field::Options),
    ("pattern", Field::Pattern),
    ("saveInXlVals", Field::SaveInXlVals),
];

impl Variable {
    fn slot(&mut self, field: Field) -> Option<&mut VarField> {
        Some(match field {
            Field::Name => &mut self.name,
            Field::Type => &mut self.kind,
            Field::Secret => &mut self.secret,
            Field::Value => &mut self.value,
            Field::Description => &mut self.description,
            Field::Default => &mut self.default,
            Field::DependsOnTrue => &mut self.depends_on_true,
            Field::DependsOnFalse => &mut self.depends_on_false,
            Field::Pattern => &mut self.pattern,
            Field::SaveInXlVals => &mut self.save_in_xl_vals,
            Field::Options => return None,
        })
    }

    /// The parsed `type`, `None` when missing or unknown
    pub fn variable_type(&self) -> Option<VariableType> {
        VariableType::parse(&self.kind.val)
    }

    /// Whether answers are stored as secrets
    pub fn is_secret(&self) -> bool {
        self.secret.bool
    }

    /// Builds a variable from one parameter map.
    ///
    /// # Errors
    ///
    /// - [`XlError::UnknownVariableField`] for keys outside the known set
    /// - [`XlError::UnknownVariableType`] for maps, or lists outside `options`
    /// - [`XlError::UnknownTag`] for tags other than `!fn`
    pub fn from_mapping(map: &Mapping) -> Result<Self> {
        let mut variable = Self::default();
        let display_name = get_ignore_case(map, "name").and_then(Value::as_str).unwrap_or_default().to_string();

        for (key, value) in map {
            let Some(key) = key.as_str() else {
                return Err(XlError::UnknownVariableField {
                    name: display_name,
                    field: format!("{key:?}"),
                });
            };
            let field = FIELDS
                .iter()
                .find(|(known, _)| known.eq_ignore_ascii_case(key))
                .map(|(_, field)| *field)
                .ok_or_else(|| XlError::UnknownVariableField {
                    name: display_name.clone(),
                    field: key.to_string(),
                })?;

            if let Field::Options = field {
                variable.options = parse_options(key, value)?;
            } else if let Some(parsed) = parse_field(key, value)? {
                if let Some(slot) = variable.slot(field) {
                    *slot = parsed;
                }
            } else {
                debug!("[dataPrep] Got empty metadata variable field with key [{key}]");
            }
        }

        Ok(variable)
    }

    /// Checks the required fields and the `type`.
    pub fn validate(&self) -> Result<()> {
        let name = &self.name.val;
        if name.trim().is_empty() || self.kind.val.trim().is_empty() {
            return Err(XlError::InvalidVariable {
                name: name.clone(),
                reason: format!("parameter [{name}] is missing required fields: [type]"),
            });
        }
        match self.variable_type() {
            None => Err(XlError::InvalidVariable {
                name: name.clone(),
                reason: format!("type [{}] is not valid for parameter [{name}]", self.kind.val),
            }),
            Some(VariableType::Select) if self.options.is_empty() => Err(XlError::InvalidVariable {
                name: name.clone(),
                reason: format!("at least one option field is need to be set for parameter [{name}]"),
            }),
            Some(_) => Ok(()),
        }
    }

    /// The default answer.
    ///
    /// A failing `!fn` default falls back to empty with a warning. A `Confirm`
    /// without a default answers `false`.
    pub fn default_value(&self, functions: &FunctionRegistry) -> String {
        let mut default = self.default.val.clone();
        if self.default.is_function() {
            match functions.evaluate_first(&default) {
                Ok(value) => {
                    debug!("[fn] Processed value of function [{default}] is: {value}");
                    return value;
                }
                Err(e) => {
                    warn!("Error while processing default value !fn {default} for {}. {e}", self.name.val);
                    default.clear();
                }
            }
        }

        if default.is_empty() && self.variable_type() == Some(VariableType::Confirm) {
            return false.to_string();
        }
        default
    }

    /// The preset `value`, empty when unset or when its `!fn` call fails.
    pub fn preset_value(&self, functions: &FunctionRegistry) -> String {
        if !self.value.is_function() {
            return self.value.val.clone();
        }
        match functions.evaluate_first(&self.value.val) {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    "Error while processing !fn {}. Please update the value for {} manually. {e}",
                    self.value.val, self.name.val
                );
                String::new()
            }
        }
    }

    /// Options with every `!fn` option expanded to its full result list.
    pub fn resolved_options(&self, functions: &FunctionRegistry) -> Result<Vec<String>> {
        let mut options = Vec::new();
        for option in &self.options {
            if option.is_function() {
                let results = functions.evaluate(&option.val)?;
                debug!("[fn] Processed value of function [{}] is: {results:?}", option.val);
                options.extend(results);
            } else {
                options.push(option.val.clone());
            }
        }
        Ok(options)
    }
}

/// Looks up a string key without regard to ASCII case.
pub(crate) fn get_ignore_case<'a>(map: &'a Mapping, name: &str) -> Option<&'a Value> {
    map.iter()
        .find(|(key, _)| key.as_str().is_some_and(|key| key.eq_ignore_ascii_case(name)))
        .map(|(_, value)| value)
}

fn parse_field(key: &str, value: &Value) -> Result<Option<VarField>> {
    VarField::from_yaml(value).map_err(|e| match e {
        FieldShapeError::Shape(found) => XlError::UnknownVariableType {
            field: key.to_string(),
            found: found.to_string(),
        },
        FieldShapeError::Tag(tag) => XlError::UnknownTag {
            tag: tag.tag,
            value: tag.value,
        },
    })
}

fn parse_options(key: &str, value: &Value) -> Result<Vec<VarField>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => {
            let mut options = Vec::with_capacity(items.len());
            for item in items {
                options.extend(parse_field(key, item)?);
            }
            Ok(options)
        }
        other => Err(XlError::UnknownVariableType {
            field: key.to_string(),
            found: describe(other).to_string(),
        }),
    }
}

/// Parses every parameter map and validates the result.
pub fn parse_variables(parameters: &[Mapping]) -> Result<Vec<Variable>> {
    let variables = parameters.iter().map(Variable::from_mapping).collect::<Result<Vec<_>>>()?;
    for variable in &variables {
        variable.validate()?;
    }
    Ok(variables)
}

/// Evaluates a `dependsOnTrue`/`dependsOnFalse` condition.
///
/// A `!fn` condition reads the first function result as a boolean; otherwise the
/// field names a variable whose boolean value is used.
pub fn evaluate_condition(field: &VarField, variables: &[Variable], functions: &FunctionRegistry) -> Result<bool> {
    if field.is_function() {
        let value = functions.evaluate_first(&field.val)?;
        debug!("[fn] Processed value of function [{}] is: {value}", field.val);
        return parse_bool(&value);
    }

    variables
        .iter()
        .find(|v| v.name.val == field.val)
        .map(|v| v.value.bool)
        .ok_or_else(|| XlError::UnknownVariable {
            name: field.val.clone(),
            did_you_mean: closest_match(&field.val, variables.iter().map(|v| v.name.val.as_str())),
        })
}

/// Parses a boolean the way blueprint conditions spell them.
pub fn parse_bool(value: &str) -> Result<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(XlError::InvalidCondition {
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{FnCall, FunctionDomain};

    struct Fixed;

    impl FunctionDomain for Fixed {
        fn call(&self, call: &FnCall) -> anyhow::Result<Vec<String>> {
            match call.module.as_str() {
                "regions" => Ok(vec!["eu-west-1".to_string(), "us-east-1".to_string()]),
                "enabled" => Ok(vec!["true".to_string()]),
                other => anyhow::bail!("no module {other}"),
            }
        }
    }

    fn functions() -> FunctionRegistry {
        let mut registry = FunctionRegistry::new();
        registry.register("aws", Fixed);
        registry
    }

    fn variable(yaml: &str) -> Result<Variable> {
        let map: Mapping = serde_yaml::from_str(yaml).unwrap();
        Variable::from_mapping(&map)
    }

    #[test]
    fn test_fields_match_without_case() {
        let v = variable("Name: test\nTYPE: Input\ndependsontrue: other\nsaveInXlVals: true\nport: 1\n").unwrap_err();
        assert_eq!(v.to_string(), "unknown variable field [port] in parameter [test]");

        let v = variable("NAME: db\ntype: Input\nPort: 1\n").unwrap_err();
        assert_eq!(v.to_string(), "unknown variable field [Port] in parameter [db]");

        let v = variable("Name: test\nTYPE: Input\ndependsontrue: other\nsaveInXlVals: true\n").unwrap();
        assert_eq!(v.name.val, "test");
        assert_eq!(v.variable_type(), Some(VariableType::Input));
        assert_eq!(v.depends_on_true.val, "other");
        assert!(v.save_in_xl_vals.bool);
    }

    #[test]
    fn test_scalar_shapes() {
        let v = variable("name: n\ntype: Input\ndefault: 42\nvalue: 1.5\nsecret: true\npattern: ~\n").unwrap();
        assert_eq!(v.default.val, "42");
        assert_eq!(v.value.val, "1.500000");
        assert!(v.secret.bool);
        assert_eq!(v.secret.val, "true");
        assert!(v.pattern.is_empty());
    }

    #[test]
    fn test_options_keep_order_and_tags() {
        let v = variable("name: n\ntype: Select\noptions:\n- b\n- !fn aws.regions(ecs)\n- 3\n").unwrap();
        assert_eq!(
            v.options,
            vec![VarField::literal("b"), VarField::function("aws.regions(ecs)"), VarField::literal("3")]
        );
        assert_eq!(v.resolved_options(&functions()).unwrap(), vec!["b", "eu-west-1", "us-east-1", "3"]);
    }

    #[test]
    fn test_unsupported_shapes() {
        let err = variable("name: n\ndefault:\n  a: b\n").unwrap_err();
        assert_eq!(err.to_string(), "unknown variable type [a mapping] for field [default]");

        let err = variable("name: n\ndefault: !value x\n").unwrap_err();
        assert_eq!(err.to_string(), "unknown tag !value x");

        let err = variable("name: n\noptions: a\n").unwrap_err();
        assert!(matches!(err, XlError::UnknownVariableType { .. }));
    }

    #[test]
    fn test_validation_messages() {
        let missing = variable("name: test\n").unwrap().validate().unwrap_err();
        assert_eq!(missing.to_string(), "parameter [test] is missing required fields: [type]");

        let bad_type = variable("name: test\ntype: Editor\n").unwrap().validate().unwrap_err();
        assert_eq!(bad_type.to_string(), "type [Editor] is not valid for parameter [test]");

        let no_options = variable("name: test\ntype: Select\n").unwrap().validate().unwrap_err();
        assert_eq!(no_options.to_string(), "at least one option field is need to be set for parameter [test]");
    }

    #[test]
    fn test_default_values() {
        let functions = functions();
        assert_eq!(variable("name: c\ntype: Confirm\n").unwrap().default_value(&functions), "false");
        assert_eq!(
            variable("name: r\ntype: Input\ndefault: !fn aws.regions(ecs)[1]\n").unwrap().default_value(&functions),
            "us-east-1"
        );
        assert_eq!(
            variable("name: r\ntype: Input\ndefault: !fn aws.missing(x)\n").unwrap().default_value(&functions),
            ""
        );
    }

    #[test]
    fn test_conditions() {
        let functions = functions();
        let mut flag = variable("name: flag\ntype: Confirm\n").unwrap();
        flag.value.bool = true;
        let variables = vec![flag];

        assert!(evaluate_condition(&VarField::literal("flag"), &variables, &functions).unwrap());
        assert!(evaluate_condition(&VarField::function("aws.enabled()"), &variables, &functions).unwrap());

        let err = evaluate_condition(&VarField::literal("flga"), &variables, &functions).unwrap_err();
        assert_eq!(err.to_string(), "no variable found in list by name [flga]");
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("T").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("yes").is_err());
    }
}
