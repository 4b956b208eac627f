mod settings;

pub use settings::{CaptureDefaults, Config, ConfigError, TomlCaptureConfig, TomlConfig, EXAMPLE_CONFIG};
