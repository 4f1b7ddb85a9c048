//! Configuration system
//!
//! Only backend and logging behaviour is configurable. The animation itself
//! (depth, step, delay, window title and size) is fixed in [`crate::animation`]
//! and [`crate::render`].

use std::path::Path;

pub use serde::{Deserialize, Serialize};

/// Files looked up in the working directory at startup, first match wins
pub const CONFIG_CANDIDATES: [&str; 2] = ["recursion_visualized.toml", "recursion_visualized.ron"];

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Load configuration from file, falling back to defaults when the file does not exist
    ///
    /// A file that exists but cannot be read or parsed is still an error.
    fn load_or_default(path: &str) -> Result<Self, ConfigError> {
        if Path::new(path).exists() {
            log::info!("Loading configuration from {}", path);
            Self::load_from_file(path)
        } else {
            log::debug!("No configuration at {}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Top-level visualizer configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    /// Vulkan presenter settings
    pub renderer: RendererSettings,
    /// Logger settings
    pub logging: LoggingSettings,
}

impl Config for VisualizerConfig {}

impl VisualizerConfig {
    /// First of `candidates` that exists on disk
    pub fn locate<'a>(candidates: &[&'a str]) -> Option<&'a str> {
        candidates.iter().copied().find(|path| Path::new(path).exists())
    }

    /// Load the first of `candidates` that exists, or defaults if none does
    pub fn discover(candidates: &[&str]) -> Result<Self, ConfigError> {
        match Self::locate(candidates) {
            Some(path) => Self::load_or_default(path),
            None => Ok(Self::default()),
        }
    }
}

/// Vulkan presenter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Enable Vulkan validation layers (only honoured in debug builds)
    pub validation: bool,
    /// Preferred swapchain present mode
    pub present_mode: PresentModePreference,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            validation: cfg!(debug_assertions),
            present_mode: PresentModePreference::Fifo,
        }
    }
}

/// Swapchain present mode preference
///
/// FIFO is always available, so it is also the fallback when the preferred
/// mode is not supported by the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresentModePreference {
    /// Vsync'd queue of images
    #[default]
    Fifo,
    /// Latest image replaces queued ones
    Mailbox,
}

/// Logger settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `env_logger` filter used when `RUST_LOG` is not set
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("recursion_engine_{}_{}", std::process::id(), name))
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: VisualizerConfig = toml::from_str(
            r#"
            [renderer]
            present_mode = "mailbox"
            "#,
        )
        .unwrap();

        assert_eq!(config.renderer.present_mode, PresentModePreference::Mailbox);
        assert_eq!(config.renderer.validation, cfg!(debug_assertions));
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = scratch_path("missing.toml");
        let config = VisualizerConfig::load_or_default(&path).unwrap();
        assert_eq!(config, VisualizerConfig::default());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let path = scratch_path("invalid.toml");
        std::fs::write(&path, "renderer = 42").unwrap();

        let result = VisualizerConfig::load_or_default(&path);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_discover_picks_first_existing() {
        let missing = scratch_path("absent.toml");
        let present = scratch_path("present.ron");
        std::fs::write(&present, "(logging: (filter: \"warn\"))").unwrap();

        let config = VisualizerConfig::discover(&[missing.as_str(), present.as_str()]);
        std::fs::remove_file(&present).unwrap();

        assert_eq!(config.unwrap().logging.filter, "warn");
        assert_eq!(
            VisualizerConfig::discover(&[missing.as_str()]).unwrap(),
            VisualizerConfig::default()
        );
    }

    #[test]
    fn test_locate_reports_chosen_file() {
        let missing = scratch_path("nowhere.toml");
        let present = scratch_path("located.toml");
        std::fs::write(&present, "[logging]\nfilter = \"debug\"\n").unwrap();

        let located = VisualizerConfig::locate(&[missing.as_str(), present.as_str()]);
        let none = VisualizerConfig::locate(&[missing.as_str()]);
        std::fs::remove_file(&present).unwrap();

        assert_eq!(located, Some(present.as_str()));
        assert_eq!(none, None);
    }

    #[test]
    fn test_unsupported_extension() {
        let config = VisualizerConfig::default();
        let result = config.save_to_file(&scratch_path("config.yaml"));
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_ron_file_is_read_back() {
        let path = scratch_path("settings.ron");
        let mut config = VisualizerConfig::default();
        config.logging.filter = "recursion_engine=debug".to_string();
        config.save_to_file(&path).unwrap();

        let loaded = VisualizerConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.logging.filter, "recursion_engine=debug");
    }
}
