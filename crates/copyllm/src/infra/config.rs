//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::app::filter::DEFAULT_EXTENSIONS;

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static WORKSPACE_CONFIG_PATH: &str = ".copyllm/config.toml";

const ENV_EXTENSIONS: &str = "COPYLLM_EXTENSIONS";
const ENV_USE_RELATIVE_PATHS: &str = "COPYLLM_USE_RELATIVE_PATHS";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub copy: CopyOptions,
    #[serde(default)]
    pub selection: Selection,
    #[serde(default)]
    pub viewer: Viewer,
}

/// Settings controlling which files are aggregated and how they are labelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CopyOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    extensions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    use_relative_paths: Option<bool>,
}

impl CopyOptions {
    /// Active extension list, falling back to the built-in set.
    pub fn extensions(&self) -> Vec<String> {
        self.extensions.clone().unwrap_or_else(|| {
            DEFAULT_EXTENSIONS
                .iter()
                .map(|ext| (*ext).to_owned())
                .collect()
        })
    }

    pub fn use_relative_paths(&self) -> bool {
        self.use_relative_paths.unwrap_or(false)
    }

    pub fn set_extensions(&mut self, extensions: Vec<String>) {
        self.extensions = Some(extensions);
    }

    pub fn set_use_relative_paths(&mut self, value: bool) {
        self.use_relative_paths = Some(value);
    }
}

/// Settings for the no-argument selection fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Selection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

/// Settings for displaying the aggregated document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Viewer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    open: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    theme: Option<String>,
}

impl Viewer {
    fn default_theme() -> &'static str {
        "base16-ocean.dark"
    }

    pub fn open(&self) -> bool {
        self.open.unwrap_or(true)
    }

    pub fn theme(&self) -> String {
        self.theme
            .clone()
            .unwrap_or_else(|| Self::default_theme().to_owned())
    }

    pub fn set_open(&mut self, value: bool) {
        self.open = Some(value);
    }

    pub fn set_theme(&mut self, theme: impl Into<String>) {
        self.theme = Some(theme.into());
    }
}

/// Environment overrides for the copy settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    extensions: Option<Vec<String>>,
    use_relative_paths: Option<bool>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            extensions: env::var(ENV_EXTENSIONS).ok().map(|raw| parse_extension_list(&raw)),
            use_relative_paths: env::var(ENV_USE_RELATIVE_PATHS)
                .ok()
                .and_then(|raw| parse_flag(ENV_USE_RELATIVE_PATHS, &raw)),
        }
    }

    #[cfg(test)]
    fn for_tests(extensions: &str, use_relative_paths: bool) -> Self {
        Self {
            extensions: Some(parse_extension_list(extensions)),
            use_relative_paths: Some(use_relative_paths),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load(workspace_root: Option<&Path>) -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_root.map(|root| root.join(WORKSPACE_CONFIG_PATH));
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            tracing::debug!(path = %global_path.display(), "loading user config");
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            tracing::debug!(path = %workspace_path.display(), "loading workspace config");
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            copy: CopyOptions {
                extensions: other.copy.extensions.or(self.copy.extensions),
                use_relative_paths: other.copy.use_relative_paths.or(self.copy.use_relative_paths),
            },
            selection: Selection {
                command: other.selection.command.or(self.selection.command),
            },
            viewer: Viewer {
                open: other.viewer.open.or(self.viewer.open),
                theme: other.viewer.theme.or(self.viewer.theme),
            },
        }
    }

    /// Fully resolved copy of the configuration with every default filled in.
    pub fn effective(&self) -> Self {
        Self {
            copy: CopyOptions {
                extensions: Some(self.copy.extensions()),
                use_relative_paths: Some(self.copy.use_relative_paths()),
            },
            selection: self.selection.clone(),
            viewer: Viewer {
                open: Some(self.viewer.open()),
                theme: Some(self.viewer.theme()),
            },
        }
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(&self.effective()).context("failed to serialize config")
    }
}

/// Split a comma or whitespace separated list, adding the leading dot where missing.
pub fn parse_extension_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|ext| !ext.is_empty())
        .map(normalize_extension)
        .collect()
}

pub fn normalize_extension(ext: &str) -> String {
    if ext.starts_with('.') {
        ext.to_owned()
    } else {
        format!(".{ext}")
    }
}

fn parse_flag(name: &str, raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        other => {
            tracing::warn!(variable = name, value = other, "ignoring unrecognized boolean");
            None
        }
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("copyllm/config.toml"))
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(extensions) = env.extensions {
        config.copy.extensions = Some(extensions);
    }
    if let Some(value) = env.use_relative_paths {
        config.copy.use_relative_paths = Some(value);
    }
    config
}
