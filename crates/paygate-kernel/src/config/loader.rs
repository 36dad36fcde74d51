//! Override documents.
//!
//! Overrides can be kept in a TOML, YAML or JSON document whose top-level
//! keys become literal registry entries. YAML and JSON keep document order;
//! TOML key order is whatever the parser reports, so keep order-sensitive
//! `api.*` / `action.*` overrides in YAML or JSON, or use a prepend directive.
//!
//! ## Features
//!
//! - Auto-detection of format from file extension
//! - Environment variable substitution (`${VAR}` and `$VAR` syntax)
//!
//! ```toml
//! "template.layout" = "@Acme/layout.html"
//! prepend_actions = ["action.acme_capture"]
//!
//! [paths]
//! Acme = "${ACME_TEMPLATES}"
//! ```

use super::error::{ConfigError, ConfigReport, ConfigResult, IntoConfigReport};
use super::registry::ConfigRegistry;
use error_stack::ResultExt;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

/// Matches `${VAR_NAME}` (braced syntax, higher priority)
static BRACED_VAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid braced-var regex"));

/// Matches `$VAR_NAME`
static SIMPLE_VAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)\b").expect("valid simple-var regex"));

/// Supported override document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Toml,
    Yaml,
    Json,
}

/// Detect the document format from a file extension
///
/// # Supported Extensions
///
/// - YAML: `.yaml`, `.yml`
/// - TOML: `.toml`
/// - JSON: `.json`
pub fn detect_format(path: impl AsRef<Path>) -> ConfigResult<FileFormat> {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ConfigError::UnsupportedFormat("No file extension found".to_string()))?;

    match ext.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}

fn substitute(content: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let braced = BRACED_VAR.replace_all(content, |caps: &regex::Captures| {
        lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
    });
    SIMPLE_VAR
        .replace_all(&braced, |caps: &regex::Captures| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .to_string()
}

/// Substitute environment variables in a string
///
/// Supports both `${VAR_NAME}` and `$VAR_NAME`. Unset variables are left
/// untouched.
pub fn substitute_env_vars(content: &str) -> String {
    substitute(content, |name| std::env::var(name).ok())
}

/// Substitute variables from an explicit mapping instead of the environment.
pub fn substitute_with(content: &str, vars: &HashMap<String, String>) -> String {
    substitute(content, |name| vars.get(name).cloned())
}

fn parse_document(content: &str, format: FileFormat) -> ConfigResult<serde_json::Value> {
    match format {
        FileFormat::Toml => toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string())),
        FileFormat::Yaml => {
            serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
        FileFormat::Json => {
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }
}

/// Build an override registry from document text (after variable
/// substitution has been applied by the caller).
pub fn overrides_from_str(content: &str, format: FileFormat) -> ConfigResult<ConfigRegistry> {
    match parse_document(content, format)? {
        serde_json::Value::Object(entries) => Ok(entries.into_iter().collect()),
        serde_json::Value::Null => Ok(ConfigRegistry::new()),
        other => Err(ConfigError::Parse(format!(
            "override document must be a mapping, found {other}"
        ))),
    }
}

/// Load an override document from disk
///
/// Detects the format from the extension and substitutes environment
/// variables before parsing.
pub fn load_overrides(path: impl AsRef<Path>) -> ConfigReport<ConfigRegistry> {
    let path = path.as_ref();
    let context = format!("loading overrides from {}", path.display());

    let format = detect_format(path).into_report().attach(context.clone())?;
    let content = std::fs::read_to_string(path)
        .map_err(ConfigError::from)
        .into_report()
        .attach(context.clone())?;

    overrides_from_str(&substitute_env_vars(&content), format)
        .into_report()
        .attach(context)
}
