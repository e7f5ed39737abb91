//! Container configuration.
//!
//! Sources, lowest priority first:
//! 1. `ContainerConfig::default()`
//! 2. a TOML, JSON or YAML file ([`ContainerConfig::from_file`])
//! 3. `DI_*` environment variables ([`ContainerConfig::apply_env`])

use std::{env, fs, path::Path};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    errors::{DiError, Result},
    selector::SelectionStrategy,
};

pub const ENV_PREFIX: &str = "DI_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Name used in logs
    pub name: String,
    /// Constructor chosen when a type declares several
    pub constructor_selection: SelectionStrategy,
    /// Build one-level plans for described but unregistered dependencies,
    /// so registration reports them as `UnregisteredType`
    pub speculative_lookup: bool,
    /// Log every resolve at `debug` instead of `trace`
    pub trace_resolutions: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            constructor_selection: SelectionStrategy::MostSpecific,
            speculative_lookup: true,
            trace_resolutions: false,
        }
    }
}

impl ContainerConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| DiError::configuration("toml", e.to_string()))?;
        config.validated()
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| DiError::configuration("json", e.to_string()))?;
        config.validated()
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| DiError::configuration("yaml", e.to_string()))?;
        config.validated()
    }

    /// Load from a file, picking the format from its extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| DiError::configuration(path.display().to_string(), e.to_string()))?;

        let config = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            other => Err(DiError::configuration(
                path.display().to_string(),
                format!("unsupported configuration file format: {:?}", other),
            )),
        }?;
        debug!("Loaded container configuration from {}", path.display());
        Ok(config)
    }

    /// Override fields from `DI_*` process environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(env::vars())
    }

    /// Override fields from `DI_*` pairs. Unknown `DI_*` keys are ignored.
    pub fn apply_env_from<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(field) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            self.apply_env_var(field, value.as_ref())?;
        }
        self.validate()
    }

    fn apply_env_var(&mut self, field: &str, value: &str) -> Result<()> {
        match field.to_uppercase().as_str() {
            "NAME" => self.name = value.to_string(),
            "CONSTRUCTOR_SELECTION" => {
                self.constructor_selection = SelectionStrategy::parse(value).ok_or_else(|| {
                    DiError::configuration(
                        "constructor_selection",
                        format!("unknown strategy '{}'", value),
                    )
                })?;
            }
            "SPECULATIVE_LOOKUP" => {
                self.speculative_lookup = parse_bool("speculative_lookup", value)?;
            }
            "TRACE_RESOLUTIONS" => {
                self.trace_resolutions = parse_bool("trace_resolutions", value)?;
            }
            _ => {}
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DiError::configuration("name", "must not be empty"));
        }
        Ok(())
    }

    fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(DiError::configuration(
            field,
            format!("expected a boolean, got '{}'", value),
        )),
    }
}
