//! Configuration layering, fallback logic, and environment overrides

use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::toml::{AliasingSection, PeaToml};
use crate::ConfigResult;
use pea_core::error::PeaError;
use pea_core::types::SourceLanguage;

/// Environment variable overriding `aliasing.primary-language`
pub const ENV_PRIMARY_LANGUAGE: &str = "PEA_ALIASING_PRIMARY_LANGUAGE";
/// Environment variable overriding `aliasing.deny-conflicts`
pub const ENV_DENY_CONFLICTS: &str = "PEA_ALIASING_DENY_CONFLICTS";

/// Main configuration loading interface
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
}

/// Configuration layering and merging
#[derive(Debug, Default)]
pub struct ConfigLayering {
    /// Global configuration
    global_config: Option<PeaToml>,
    /// Project configuration
    project_config: PeaToml,
    /// Environment overrides
    env_overrides: HashMap<String, String>,
    /// CLI flag overrides
    cli_overrides: HashMap<String, String>,
}

/// Configuration source tracking
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Global config file
    Global(Utf8PathBuf),
    /// Project pea.toml file
    ProjectToml(Utf8PathBuf),
    /// No configuration file, built-in defaults
    Defaults,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self { cwd }
    }

    /// Load project configuration, falling back to defaults when no pea.toml exists
    pub async fn load_project_config(&self) -> ConfigResult<(PeaToml, ConfigSource)> {
        match self.resolve_config_path("pea.toml") {
            Some(path) => {
                let config = crate::toml::load_from_file(&path).await?;
                Ok((config, ConfigSource::ProjectToml(path)))
            }
            None => {
                debug!("No pea.toml found above {}, using defaults", self.cwd);
                Ok((PeaToml::default(), ConfigSource::Defaults))
            }
        }
    }

    /// Find configuration file in project (walks up directory tree)
    pub fn resolve_config_path(&self, filename: &str) -> Option<Utf8PathBuf> {
        let mut current: Option<&Utf8Path> = Some(self.cwd.as_path());

        while let Some(dir) = current {
            let config_path = dir.join(filename);
            if config_path.is_file() {
                return Some(config_path);
            }
            current = dir.parent();
        }

        None
    }

    /// Load global configuration from ~/.pea/config.toml
    pub async fn load_global_config(&self) -> ConfigResult<Option<(PeaToml, ConfigSource)>> {
        let Some(home_dir) = dirs::home_dir() else {
            debug!("Could not determine home directory, skipping global config");
            return Ok(None);
        };

        let global_config_path = Utf8PathBuf::try_from(home_dir)
            .map_err(|e| PeaError::config("home_dir", format!("Invalid home directory path: {}", e)))?
            .join(".pea")
            .join("config.toml");

        if global_config_path.is_file() {
            let config = crate::toml::load_from_file(&global_config_path).await?;
            Ok(Some((config, ConfigSource::Global(global_config_path))))
        } else {
            Ok(None)
        }
    }
}

impl ConfigLayering {
    /// Start layering from a project configuration
    pub fn new(project_config: PeaToml) -> Self {
        Self {
            project_config,
            ..Self::default()
        }
    }

    pub fn with_global(mut self, global_config: Option<PeaToml>) -> Self {
        self.global_config = global_config;
        self
    }

    pub fn with_env_overrides(mut self, overrides: HashMap<String, String>) -> Self {
        self.env_overrides = overrides;
        self
    }

    pub fn with_cli_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.cli_overrides.insert(key.into(), value.into());
        self
    }

    /// Merge every layer: global < project < environment < command line
    pub fn resolve(self) -> ConfigResult<PeaToml> {
        Self::merge_configs(
            self.global_config,
            self.project_config,
            self.env_overrides,
            self.cli_overrides,
        )
    }

    /// Merge multiple configuration layers
    pub fn merge_configs(
        global_config: Option<PeaToml>,
        project_config: PeaToml,
        env_overrides: HashMap<String, String>,
        cli_overrides: HashMap<String, String>,
    ) -> ConfigResult<PeaToml> {
        let mut merged = project_config;

        // Global sections only fill in what the project leaves out
        if let Some(global) = global_config {
            if merged.aliasing.is_none() {
                merged.aliasing = global.aliasing;
            }
        }

        Self::apply_env_overrides(&mut merged, &env_overrides)?;
        Self::apply_cli_overrides(&mut merged, &cli_overrides)?;

        Ok(merged)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(config: &mut PeaToml, overrides: &HashMap<String, String>) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                ENV_PRIMARY_LANGUAGE => {
                    aliasing_mut(config).primary_language = parse_language(key, value)?;
                }
                ENV_DENY_CONFLICTS => {
                    aliasing_mut(config).deny_conflicts = parse_bool(key, value)?;
                }
                _ => {
                    // Unknown environment variable, ignore
                }
            }
        }

        Ok(())
    }

    /// Apply CLI flag overrides
    fn apply_cli_overrides(config: &mut PeaToml, overrides: &HashMap<String, String>) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                "primary-language" => {
                    aliasing_mut(config).primary_language = parse_language("--primary-language", value)?;
                }
                "deny-conflicts" => {
                    aliasing_mut(config).deny_conflicts = parse_bool("--deny-conflicts", value)?;
                }
                _ => {
                    // Unknown CLI override, ignore
                }
            }
        }

        Ok(())
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars().filter(|(key, _)| key.starts_with("PEA_")).collect()
    }
}

fn aliasing_mut(config: &mut PeaToml) -> &mut AliasingSection {
    config.aliasing.get_or_insert_with(AliasingSection::default)
}

fn parse_language(field: &str, value: &str) -> ConfigResult<SourceLanguage> {
    value.parse::<SourceLanguage>().map_err(|reason| PeaError::config(field, reason))
}

pub(crate) fn parse_bool(field: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(PeaError::config(field, format!("Expected a boolean, got '{}'", value))),
    }
}
