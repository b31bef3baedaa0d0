//! `!fn` expressions and the pluggable function registry
//!
//! A function reference has the shape `domain.module(arg1, arg2)` optionally
//! followed by `.attribute` or `[index]`:
//!
//! ```text
//! aws.credentials().IsAvailable
//! aws.regions(ecs)[0]
//! os._operatingsystem()
//! ```
//!
//! The domain selects a [`FunctionDomain`] registered in a [`FunctionRegistry`];
//! the domain evaluates the module with its arguments and attribute and returns a
//! list of strings. When an index is given, the registry narrows the result to
//! that single element.
//!
//! Domains are external collaborators (cloud metadata lookups, cluster queries);
//! the crate ships the [`os::OsFunctions`] domain and tests register fixed ones.

pub mod os;

use crate::core::{Result, XlError};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Grammar of a function reference. The separator between domain and module
/// matches any character.
const FN_PATTERN: &str = r"([\w\d]+).([\w\d]+)\(([,\s\w\d]*)\)(?:\.([\w\d]*)|\[([\d]+)\])*";

/// A parsed `!fn` expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FnCall {
    /// The raw expression as written in the YAML document
    pub expression: String,
    /// Registry key of the domain (e.g. `aws`)
    pub domain: String,
    /// Function within the domain (e.g. `regions`)
    pub module: String,
    /// Comma-separated arguments, trimmed
    pub params: Vec<String>,
    /// Attribute selector after `.`, if any
    pub attr: Option<String>,
    /// Index selector inside `[...]`, if any
    pub index: Option<usize>,
}

impl FnCall {
    /// Parses a function reference.
    ///
    /// # Errors
    ///
    /// Returns [`XlError::InvalidFunctionSyntax`] if the expression does not
    /// follow the `domain.module(args)[.attr|[index]]` grammar.
    pub fn parse(expression: &str) -> Result<Self> {
        let syntax_error = || XlError::InvalidFunctionSyntax {
            expression: expression.to_string(),
        };

        let pattern = Regex::new(FN_PATTERN).map_err(|e| XlError::Other {
            message: e.to_string(),
        })?;
        let groups = pattern.captures(expression).ok_or_else(syntax_error)?;

        let group = |i: usize| groups.get(i).map(|m| m.as_str().to_string());

        let domain = group(1).ok_or_else(syntax_error)?;
        let module = group(2).ok_or_else(syntax_error)?;
        let raw_params = group(3).unwrap_or_default();
        let params = if raw_params.trim().is_empty() {
            Vec::new()
        } else {
            raw_params.split(',').map(|p| p.trim().to_string()).collect()
        };
        let attr = group(4).filter(|a| !a.is_empty());
        let index = match group(5) {
            Some(raw) => Some(raw.parse::<usize>().map_err(|_| syntax_error())?),
            None => None,
        };

        Ok(Self {
            expression: expression.to_string(),
            domain,
            module,
            params,
            attr,
            index,
        })
    }
}

impl fmt::Display for FnCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

/// A family of functions reachable from `!fn` expressions
///
/// Implementations receive the parsed call (module, params and attribute) and
/// return every value the function produces. Index selection is applied by the
/// [`FunctionRegistry`], so domains can ignore [`FnCall::index`].
pub trait FunctionDomain: Send + Sync {
    /// Evaluates `call` and returns its results
    fn call(&self, call: &FnCall) -> anyhow::Result<Vec<String>>;
}

/// Maps domain names to their [`FunctionDomain`] implementation
#[derive(Default)]
pub struct FunctionRegistry {
    domains: BTreeMap<String, Box<dyn FunctionDomain>>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("domains", &self.domains.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FunctionRegistry {
    /// Creates an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in `os` domain
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("os", os::OsFunctions);
        registry
    }

    /// Registers `domain` under `name`, replacing any previous registration
    pub fn register(&mut self, name: impl Into<String>, domain: impl FunctionDomain + 'static) {
        self.domains.insert(name.into(), Box::new(domain));
    }

    /// Parses and evaluates a `!fn` expression.
    ///
    /// # Errors
    ///
    /// - [`XlError::InvalidFunctionSyntax`] for malformed expressions
    /// - [`XlError::UnknownFunctionDomain`] if no domain is registered for the call
    /// - [`XlError::FunctionFailed`] if the domain fails or the index is out of range
    pub fn evaluate(&self, expression: &str) -> Result<Vec<String>> {
        let call = FnCall::parse(expression)?;
        debug!("[fn] Calling fn [{}] for getting template variable value", call);

        let domain = self.domains.get(&call.domain).ok_or_else(|| XlError::UnknownFunctionDomain {
            domain: call.domain.clone(),
        })?;

        let results = domain.call(&call).map_err(|e| XlError::FunctionFailed {
            expression: call.expression.clone(),
            reason: format!("{e:#}"),
        })?;

        match call.index {
            Some(index) => match results.get(index) {
                Some(value) => Ok(vec![value.clone()]),
                None => Err(XlError::FunctionFailed {
                    expression: call.expression.clone(),
                    reason: format!("index {index} is out of range for {} results", results.len()),
                }),
            },
            None => Ok(results),
        }
    }

    /// Evaluates an expression and returns its first result.
    ///
    /// # Errors
    ///
    /// Everything [`evaluate`](Self::evaluate) returns, plus
    /// [`XlError::EmptyFunctionResult`] when the function produced nothing.
    pub fn evaluate_first(&self, expression: &str) -> Result<String> {
        let results = self.evaluate(expression)?;
        let first = results.into_iter().next().ok_or_else(|| XlError::EmptyFunctionResult {
            expression: expression.to_string(),
        })?;
        debug!("[fn] Processed value of function [{}] is: {}", expression, first);
        Ok(first)
    }
}
