//! `patchscope.toml` and the settings resolved from it.
//!
//! Precedence: command-line flags, then the config file, then defaults.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;

pub const CONFIG_ENV: &str = "PATCHSCOPE_CONFIG";
pub const CONFIG_FILE_NAME: &str = "patchscope.toml";
pub const DEFAULT_POOL_PATH: &str = ".patchscope/pool.jsonl";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
    Xml,
}

/// On-disk configuration. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub pool: Option<String>,
    pub output: Option<OutputFormat>,
    pub no_abbrev: Option<bool>,
    pub no_color: Option<bool>,
    pub patch: PatchSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatchSection {
    pub force: Option<bool>,
    pub skip_interactive: Option<bool>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

pub fn parse_config(raw: &str, path: &Path) -> Result<FileConfig, ConfigError> {
    toml::from_str(raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Find and read the config file.
///
/// An explicit `env_path` must exist; the working-directory file is optional.
pub fn load_file_config(
    env_path: Option<PathBuf>,
    cwd: &Path,
) -> Result<Option<(FileConfig, PathBuf)>, ConfigError> {
    let path = match env_path {
        Some(path) => path,
        None => {
            let local = cwd.join(CONFIG_FILE_NAME);
            if !local.is_file() {
                return Ok(None);
            }
            local
        }
    };
    let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let config = parse_config(&raw, &path)?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(Some((config, path)))
}

/// Effective settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub pool: PathBuf,
    pub output: OutputFormat,
    pub no_abbrev: bool,
    pub no_color: bool,
    pub force: bool,
    pub skip_interactive: bool,
    pub config_path: Option<PathBuf>,
}

impl Settings {
    pub fn resolve(global: &GlobalArgs, file: Option<(FileConfig, PathBuf)>) -> Self {
        let (file, config_path) = match file {
            Some((config, path)) => (config, Some(path)),
            None => (FileConfig::default(), None),
        };
        let pool = global
            .pool
            .clone()
            .or(file.pool)
            .unwrap_or_else(|| DEFAULT_POOL_PATH.to_string());
        let output = if global.json {
            OutputFormat::Json
        } else {
            file.output.unwrap_or_default()
        };
        Self {
            pool: PathBuf::from(pool),
            output,
            no_abbrev: global.no_abbrev || file.no_abbrev.unwrap_or(false),
            no_color: global.no_color || file.no_color.unwrap_or(false),
            force: file.patch.force.unwrap_or(false),
            skip_interactive: file.patch.skip_interactive.unwrap_or(false),
            config_path,
        }
    }

    /// Output format of a command; `xml` is that command's `--xml` flag.
    pub fn output_for(&self, xml: bool) -> OutputFormat {
        if xml { OutputFormat::Xml } else { self.output }
    }

    /// Output format of a command without markup output.
    pub fn output_without_xml(&self) -> OutputFormat {
        match self.output {
            OutputFormat::Xml => OutputFormat::Human,
            other => other,
        }
    }
}
