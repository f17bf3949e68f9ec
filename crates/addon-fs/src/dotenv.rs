//! Dotenv reading and writing
//!
//! Grammar: one `KEY=value` per line, optional `export ` prefix, `#`
//! comments and blank lines ignored. Values may be bare, single-quoted
//! (literal) or double-quoted. Inside double quotes `\"`, `\$`, `\\` and
//! `\n` are escapes; [`render`] always writes double-quoted values so that
//! [`parse`] of its output returns the same mapping.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::{Error, Result, io};

/// Ordered key/value mapping read from a dotenv file.
pub type EnvMap = BTreeMap<String, String>;

/// Read a dotenv file. A missing file yields an empty mapping.
pub fn read(path: &Path) -> Result<EnvMap> {
    match fs::read_to_string(path) {
        Ok(content) => parse(&content).map_err(|(line, message)| Error::DotenvParse {
            path: path.to_path_buf(),
            line,
            message,
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(EnvMap::new()),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Write `env` to `path` atomically in the canonical double-quoted form.
pub fn write(path: &Path, env: &EnvMap) -> Result<()> {
    io::write_text(path, &render(env))
}

/// Render a mapping as dotenv text.
pub fn render(env: &EnvMap) -> String {
    let mut out = String::new();
    for (key, value) in env {
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_double_quoted(value));
        out.push_str("\"\n");
    }
    out
}

/// Parse dotenv text. Errors carry the 1-based line number.
pub fn parse(content: &str) -> std::result::Result<EnvMap, (usize, String)> {
    let mut env = EnvMap::new();
    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line).trim_start();
        let Some((key, value)) = line.split_once('=') else {
            return Err((line_no, "expected KEY=value".to_string()));
        };
        let key = key.trim();
        if !is_valid_key(key) {
            return Err((line_no, format!("invalid variable name '{key}'")));
        }
        let value = parse_value(value.trim()).map_err(|msg| (line_no, msg))?;
        env.insert(key.to_string(), value);
    }
    Ok(env)
}

/// Build a shell prelude exporting every variable of `env`.
///
/// Values are double-quoted with `\`, `"`, `$` and backticks escaped, so
/// spaces and dollar signs reach the script verbatim.
pub fn export_prelude(env: &EnvMap) -> String {
    let mut out = String::new();
    for (key, value) in env {
        out.push_str(&format!("export {key}=\"{}\"\n", escape_shell(value)));
    }
    out
}

fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_value(value: &str) -> std::result::Result<String, String> {
    if let Some(rest) = value.strip_prefix('"') {
        let mut out = String::new();
        let mut chars = rest.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some('n') => out.push('\n'),
                    Some(other @ ('"' | '$' | '\\')) => out.push(other),
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => return Err("dangling escape".to_string()),
                },
                '"' => {
                    let trailing = chars.as_str().trim();
                    if !trailing.is_empty() && !trailing.starts_with('#') {
                        return Err("unexpected content after closing quote".to_string());
                    }
                    return Ok(out);
                }
                other => out.push(other),
            }
        }
        Err("unterminated double quote".to_string())
    } else if let Some(rest) = value.strip_prefix('\'') {
        match rest.find('\'') {
            Some(end) => Ok(rest[..end].to_string()),
            None => Err("unterminated single quote".to_string()),
        }
    } else {
        let bare = match value.find(" #") {
            Some(pos) => &value[..pos],
            None => value,
        };
        Ok(bare.trim_end().to_string())
    }
}

fn escape_double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

fn escape_shell(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '"' | '$' | '`' => {
                out.push('\\');
                out.push(c);
            }
            other => out.push(other),
        }
    }
    out
}
