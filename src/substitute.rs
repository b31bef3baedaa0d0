//! `%key%` placeholder substitution used by the `!format` tag
//!
//! The input is scanned left to right by a two-state machine. A `%` switches
//! between copying literal text and capturing a key. When a capture closes, an
//! empty key emits a literal `%` (so `%%` is an escaped percent sign) and any
//! other key is replaced by its value. Input that ends while a capture is open
//! is malformed.
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use xl_render::substitute::substitute;
//!
//! let values = BTreeMap::from([("a".to_string(), "X".to_string())]);
//! assert_eq!(substitute("a %%%a%%% a", &values).unwrap(), "a %X% a");
//! assert!(substitute("%", &values).is_err());
//! ```

use crate::core::{Result, XlError};
use crate::utils::closest_match;
use std::collections::BTreeMap;

const DELIMITER: char = '%';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Literal,
    Capturing,
}

/// Replaces every `%key%` placeholder in `input` with the matching entry of `values`.
///
/// # Errors
///
/// - [`XlError::UnknownValue`] when a placeholder names a key missing from `values`
/// - [`XlError::MalformedFormatString`] when the input ends inside a placeholder
pub fn substitute(input: &str, values: &BTreeMap<String, String>) -> Result<String> {
    let mut output = String::with_capacity(input.len());
    let mut key = String::new();
    let mut state = ScanState::Literal;

    for c in input.chars() {
        match (state, c) {
            (ScanState::Literal, DELIMITER) => state = ScanState::Capturing,
            (ScanState::Literal, _) => output.push(c),
            (ScanState::Capturing, DELIMITER) => {
                if key.is_empty() {
                    output.push(DELIMITER);
                } else {
                    output.push_str(lookup(&key, values)?);
                    key.clear();
                }
                state = ScanState::Literal;
            }
            (ScanState::Capturing, _) => key.push(c),
        }
    }

    if state == ScanState::Capturing {
        return Err(XlError::MalformedFormatString {
            input: input.to_string(),
        });
    }

    Ok(output)
}

fn lookup<'a>(key: &str, values: &'a BTreeMap<String, String>) -> Result<&'a str> {
    values.get(key).map(String::as_str).ok_or_else(|| XlError::UnknownValue {
        key: key.to_string(),
        did_you_mean: closest_match(key, values.keys().map(String::as_str)),
    })
}
