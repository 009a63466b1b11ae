//! pea.toml configuration parsing and serialization

use camino::Utf8Path;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ConfigResult;
use pea_core::error::PeaError;
use pea_core::types::{Package, SourceLanguage};

/// Complete pea.toml configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeaToml {
    /// Package metadata section
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageSection>,

    /// Module aliasing settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aliasing: Option<AliasingSection>,
}

/// Package metadata section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSection {
    /// Package name (required)
    pub name: String,

    /// Package version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Package description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `[aliasing]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AliasingSection {
    /// Language every renamed target must be written in
    pub primary_language: SourceLanguage,

    /// Treat aliases dropped during reconciliation as errors
    pub deny_conflicts: bool,
}

impl PeaToml {
    /// The aliasing section, or its defaults when absent
    pub fn aliasing(&self) -> AliasingSection {
        self.aliasing.clone().unwrap_or_default()
    }

    pub fn package_name(&self) -> Option<&str> {
        self.package.as_ref().map(|package| package.name.as_str())
    }
}

/// Parse TOML string to PeaToml configuration
pub fn parse_pea_toml(content: &str) -> ConfigResult<PeaToml> {
    parse_named("pea.toml", content)
}

fn parse_named(file: &str, content: &str) -> ConfigResult<PeaToml> {
    let config: PeaToml = parse_document(file, content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse a TOML document into `T`, reporting errors with their location.
///
/// toml_edit is run first for its syntax errors, then serde for type errors.
pub(crate) fn parse_document<T: DeserializeOwned>(file: &str, content: &str) -> ConfigResult<T> {
    content.parse::<toml_edit::DocumentMut>().map_err(|e| {
        let (line, column) = locate(content, e.span().map_or(0, |span| span.start));
        PeaError::TomlParse {
            file: file.to_string(),
            message: format!("TOML syntax error: {}", e.message()),
            line,
            column,
        }
    })?;

    toml::from_str(content).map_err(|e| {
        let (line, column) = locate(content, e.span().map_or(0, |span| span.start));
        PeaError::TomlParse {
            file: file.to_string(),
            message: e.message().to_string(),
            line,
            column,
        }
    })
}

/// 1-based line and column of a byte offset
pub(crate) fn locate(content: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(content.len());
    let before = content.get(..offset).unwrap_or(content);
    let line = before.matches('\n').count() + 1;
    let column = before.rfind('\n').map_or(before.chars().count(), |newline| {
        before[newline + 1..].chars().count()
    }) + 1;
    (line, column)
}

/// Serialize PeaToml to TOML string
pub fn serialize_pea_toml(config: &PeaToml) -> ConfigResult<String> {
    toml::to_string_pretty(config).map_err(|e| PeaError::TomlParse {
        file: "pea.toml".to_string(),
        message: format!("TOML serialization error: {}", e),
        line: 0,
        column: 0,
    })
}

/// Validate configuration completeness
pub fn validate_config(config: &PeaToml) -> ConfigResult<()> {
    if let Some(package) = &config.package {
        if package.name.is_empty() {
            return Err(PeaError::config(
                "package.name",
                "Package name is required in [package] section",
            ));
        }

        if !Package::is_valid_name(&package.name) {
            return Err(PeaError::config(
                "package.name",
                format!(
                    "Invalid package name '{}'. Package names may contain alphanumerics, hyphens, underscores, dots and a scope",
                    package.name
                ),
            ));
        }
    }

    if let Some(aliasing) = &config.aliasing {
        if aliasing.primary_language == SourceLanguage::Other {
            return Err(PeaError::config(
                "aliasing.primary-language",
                "Primary language must be a known source language",
            ));
        }
    }

    Ok(())
}

/// Load and parse pea.toml from file path
pub async fn load_from_file(path: &Utf8Path) -> ConfigResult<PeaToml> {
    debug!("Loading configuration from {}", path);
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| PeaError::io(format!("Failed to read {}", path), e))?;

    parse_named(path.as_str(), &content).map_err(|e| match e {
        PeaError::ConfigValidation { field, reason } => PeaError::ConfigValidation {
            field,
            reason: format!("In file {}: {}", path, reason),
        },
        other => other,
    })
}
