//! `.xlvals` property files
//!
//! The format is the classic `key = value` properties syntax:
//!
//! ```text
//! # comment
//! ! also a comment
//! host = example.com
//! port: 8080
//! motd = first line\nsecond line
//! long = one \
//!        two
//! ```

use super::ValueMap;
use crate::core::{Result, XlError};
use crate::utils::{atomic_write, read_text_file};
use std::path::Path;

/// Parses properties text into a map. Later duplicates win.
pub fn parse_properties(content: &str) -> Result<ValueMap> {
    let mut map = ValueMap::new();

    for logical in logical_lines(content) {
        let line = logical.trim_start();
        if line.is_empty() || is_comment(line) {
            continue;
        }

        let (raw_key, raw_value) = split_key_value(line);
        map.insert(unescape(raw_key)?, unescape(raw_value)?);
    }

    Ok(map)
}

/// Reads and parses a property file.
pub fn read_properties(path: &Path) -> Result<ValueMap> {
    let content = read_text_file(path)?;
    parse_properties(&content).map_err(|e| XlError::FileSystemError {
        operation: "parsing".to_string(),
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Formats a header line followed by `key = value` lines sorted by key.
pub fn format_properties(header: &str, values: &ValueMap) -> String {
    let mut out = String::new();
    out.push_str(header);
    out.push('\n');
    for (key, value) in values {
        out.push_str(&escape(key, true));
        out.push_str(" = ");
        out.push_str(&escape(value, false));
        out.push('\n');
    }
    out
}

/// Writes a property file with a header line and sorted entries.
pub fn write_properties(header: &str, values: &ValueMap, path: &Path) -> Result<()> {
    atomic_write(path, format_properties(header, values).as_bytes())?;
    tracing::info!("[file] Blueprint output file '{}' generated successfully", path.display());
    Ok(())
}

/// Joins physical lines ending in an odd number of backslashes.
fn logical_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut continuing = false;

    for physical in content.lines() {
        let piece = if continuing { physical.trim_start() } else { physical };
        if !continuing && is_comment(piece) {
            lines.push(piece.to_string());
            continue;
        }
        let trailing = piece.chars().rev().take_while(|c| *c == '\\').count();

        if trailing % 2 == 1 {
            current.push_str(&piece[..piece.len() - 1]);
            continuing = true;
        } else {
            current.push_str(piece);
            lines.push(std::mem::take(&mut current));
            continuing = false;
        }
    }
    if continuing {
        lines.push(current);
    }

    lines
}

fn is_comment(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with('#') || line.starts_with('!')
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' | '\x0c' => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let mut rest = line[key_end..].trim_start_matches([' ', '\t', '\x0c']);
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start_matches([' ', '\t', '\x0c']);
    }
    (key, rest)
}

fn unescape(raw: &str) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let decoded = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32);
                match decoded {
                    Some(decoded) if hex.len() == 4 => out.push(decoded),
                    _ => {
                        return Err(XlError::Other {
                            message: format!("invalid unicode escape \\u{hex} in property '{raw}'"),
                        });
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

fn escape(text: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            '=' | ':' if is_key => {
                out.push('\\');
                out.push(c);
            }
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            '#' | '!' if i == 0 && is_key => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
