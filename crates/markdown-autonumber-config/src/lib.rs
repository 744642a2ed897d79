use markdown_autonumber_engine::{FormulaSettings, HeadingSettings, NumberingController};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Global settings. Every field has a default so a partial file loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Notes folder processed when the CLI is given no path.
    pub notes_path: Option<PathBuf>,
    /// Delay between the editor losing focus and auto numbering.
    pub refresh_interval_ms: u64,
    pub headings: HeadingSettings,
    pub formulas: FormulaSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            notes_path: None,
            refresh_interval_ms: 1000,
            headings: HeadingSettings::default(),
            formulas: FormulaSettings::default(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the loaded notes path
        config.notes_path = config
            .notes_path
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/markdown-autonumber");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// A controller carrying these settings as its global defaults.
    pub fn controller(&self) -> NumberingController {
        NumberingController::new(self.headings.clone(), self.formulas.clone())
            .with_refresh_interval(self.refresh_interval())
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markdown_autonumber_engine::{FormulaMode, NumberingStyle};
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/markdown-autonumber/config.toml"));
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config: Config = toml::from_str(
            r#"
refresh_interval_ms = 250

[headings]
auto = true
styles = ["1", "A"]

[formulas]
mode = "heading-based"
max_depth = 2
"#,
        )
        .unwrap();

        assert_eq!(config.refresh_interval(), Duration::from_millis(250));
        assert!(config.headings.auto);
        assert_eq!(
            config.headings.styles,
            vec![NumberingStyle::Arabic, NumberingStyle::UpperLatin]
        );
        assert_eq!(config.headings.max_level, 6);
        assert_eq!(config.formulas.mode, FormulaMode::HeadingBased);
        assert_eq!(config.formulas.max_depth, 2);
        assert!(config.formulas.enabled);
    }

    #[test]
    fn test_unknown_style_is_a_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[headings]\nstyles = [\"x\"]\n").unwrap();

        let result = Config::load_from_path(&config_file);

        assert!(matches!(result, Err(ConfigError::ConfigParseError { .. })));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = Config::expand_path(Path::new("~/test/path")).unwrap();

        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("AUTONUMBER_TEST_VAR", "/test/env/path");
        }

        let expanded = Config::expand_path(Path::new("$AUTONUMBER_TEST_VAR/subdir")).unwrap();
        assert_eq!(expanded, PathBuf::from("/test/env/path/subdir"));

        unsafe {
            env::remove_var("AUTONUMBER_TEST_VAR");
        }
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let result = Config::load_from_path(temp_dir.path().join("nonexistent.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested/config.toml");
        let mut test_config = Config {
            notes_path: Some(PathBuf::from("/tmp/test-notes")),
            refresh_interval_ms: 500,
            ..Config::default()
        };
        test_config.headings.skip_suffix = "*".to_string();
        test_config.formulas.auto = true;

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_controller_uses_config_settings() {
        let config = Config {
            headings: HeadingSettings {
                first_level: 2,
                ..HeadingSettings::default()
            },
            ..Config::default()
        };

        let controller = config.controller();

        assert_eq!(controller.heading_settings().first_level, 2);
    }
}
