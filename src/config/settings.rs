use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::capture::CaptureOptions;
use crate::util::paths::config_path;

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Capture flags used when the command line does not set them
    pub capture: CaptureDefaults,
    /// Directory saved pages are written to
    pub output_dir: PathBuf,
    /// Location reported for captured files; `None` uses the input's file URL
    pub location: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureDefaults {
    pub selected: bool,
    pub remove_frames: bool,
    pub remove_hidden_elements: bool,
    pub remove_scripts: bool,
    pub shadow_enabled: bool,
    pub append_save_date: bool,
}

impl CaptureDefaults {
    /// Start options for a capture request.
    pub fn to_options(&self) -> CaptureOptions {
        CaptureOptions::default()
            .with_selected(self.selected)
            .with_remove_frames(self.remove_frames)
            .with_remove_hidden_elements(self.remove_hidden_elements)
            .with_remove_scripts(self.remove_scripts)
            .with_shadow_enabled(self.shadow_enabled)
            .with_append_save_date(self.append_save_date)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capture: CaptureDefaults::default(),
            output_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            location: None,
        }
    }
}

/// TOML representation of the `[capture]` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlCaptureConfig {
    pub selected: Option<bool>,
    pub remove_frames: Option<bool>,
    pub remove_hidden_elements: Option<bool>,
    pub remove_scripts: Option<bool>,
    pub shadow_enabled: Option<bool>,
    pub append_save_date: Option<bool>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub output_dir: Option<PathBuf>,
    pub location: Option<String>,
    pub capture: Option<TomlCaptureConfig>,
}

impl Config {
    /// Load configuration from the data directory, merging with defaults.
    ///
    /// A missing file is created from the bundled example; an unreadable or
    /// invalid one is logged and ignored.
    pub fn load() -> Self {
        let config_file = config_path();

        // Create example config on first run
        if !config_file.exists() {
            Self::create_default_config(&config_file);
        }

        match Self::load_from(&config_file) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring config file");
                Config::default()
            }
        }
    }

    /// Load configuration from `path`, failing on unreadable or invalid files.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let toml_config =
            toml::from_str::<TomlConfig>(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let mut config = Config::default();
        config.merge(toml_config);
        Ok(config)
    }

    /// Overlay the values present in `toml_config`.
    pub fn merge(&mut self, toml_config: TomlConfig) {
        if let Some(output_dir) = toml_config.output_dir {
            self.output_dir = expand_home(output_dir);
        }
        if toml_config.location.is_some() {
            self.location = toml_config.location;
        }
        if let Some(capture) = toml_config.capture {
            let defaults = &mut self.capture;
            let overlay = [
                (&mut defaults.selected, capture.selected),
                (&mut defaults.remove_frames, capture.remove_frames),
                (&mut defaults.remove_hidden_elements, capture.remove_hidden_elements),
                (&mut defaults.remove_scripts, capture.remove_scripts),
                (&mut defaults.shadow_enabled, capture.shadow_enabled),
                (&mut defaults.append_save_date, capture.append_save_date),
            ];
            for (field, value) in overlay {
                if let Some(value) = value {
                    *field = value;
                }
            }
        }
    }

    /// Create the default config file from the bundled example
    fn create_default_config(path: &Path) {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                if let Err(e) = fs::create_dir_all(parent) {
                    tracing::warn!(error = %e, "Failed to create config directory");
                    return;
                }
            }
        }

        if let Err(e) = fs::write(path, EXAMPLE_CONFIG) {
            tracing::warn!(error = %e, "Failed to write default config");
        }
    }

    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }
}

/// Expand a leading `~` to the home directory.
fn expand_home(path: PathBuf) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or(path),
        Err(_) => path,
    }
}
