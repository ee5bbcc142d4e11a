use scriptalign_engine::AlignmentOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
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

/// The `[alignment]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentSettings {
    /// Known vernacular reporting clauses; empty means harvest from each book.
    pub reporting_clauses: Vec<String>,
    pub allow_splitting: bool,
    pub apply_narrator_overrides: bool,
}

impl Default for AlignmentSettings {
    fn default() -> Self {
        let options = AlignmentOptions::default();
        Self {
            reporting_clauses: options.reporting_clauses,
            allow_splitting: options.allow_splitting,
            apply_narrator_overrides: options.apply_narrator_overrides,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub reference_texts_path: PathBuf,
    #[serde(default)]
    pub alignment: AlignmentSettings,
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

        // Expand shell variables and tilde in the reference text location
        config.reference_texts_path =
            Self::expand_path(&config.reference_texts_path).unwrap_or(config.reference_texts_path);

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
        let config_dir = shellexpand::tilde("~/.config/scriptalign");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }

    /// Engine options for an alignment run.
    pub fn alignment_options(&self) -> AlignmentOptions {
        AlignmentOptions {
            reporting_clauses: self.alignment.reporting_clauses.clone(),
            allow_splitting: self.alignment.allow_splitting,
            apply_narrator_overrides: self.alignment.apply_narrator_overrides,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/scriptalign/config.toml"));
    }

    #[test]
    fn test_alignment_table_defaults() {
        let config: Config = toml::from_str(r#"reference_texts_path = "/srv/reference""#).unwrap();

        assert_eq!(config.alignment, AlignmentSettings::default());
        assert!(config.alignment.allow_splitting);
        assert_eq!(config.alignment_options(), AlignmentOptions::default());
    }

    #[test]
    fn test_alignment_table_overrides() {
        let config_content = r#"
reference_texts_path = "/srv/reference"

[alignment]
reporting_clauses = ["dijo Fred", "dijo Jesús"]
allow_splitting = false
"#;

        let config: Config = toml::from_str(config_content).unwrap();
        let options = config.alignment_options();

        assert_eq!(options.reporting_clauses, vec!["dijo Fred", "dijo Jesús"]);
        assert!(!options.allow_splitting);
        assert!(!options.apply_narrator_overrides);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = Config::expand_path(&path);

        assert!(expanded.is_some());
        let expanded = expanded.unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("SCRIPTALIGN_TEST_VAR", "/test/env/path");
        }

        let path = PathBuf::from("$SCRIPTALIGN_TEST_VAR/subdir");
        let expanded = Config::expand_path(&path);

        assert_eq!(expanded, Some(PathBuf::from("/test/env/path/subdir")));

        unsafe {
            env::remove_var("SCRIPTALIGN_TEST_VAR");
        }
    }

    #[test]
    fn test_expand_path_with_relative_path() {
        let path = PathBuf::from("relative/path");
        let expanded = Config::expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_load_reports_parse_errors_with_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "reference_texts_path = [").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();

        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let test_config = Config {
            reference_texts_path: PathBuf::from("/tmp/reference-texts"),
            alignment: AlignmentSettings {
                reporting_clauses: vec!["dijo Fred".to_string()],
                allow_splitting: false,
                apply_narrator_overrides: true,
            },
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config.reference_texts_path, test_config.reference_texts_path);
        assert_eq!(loaded_config.alignment, test_config.alignment);
    }

    #[test]
    fn test_config_with_env_var_in_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        unsafe {
            env::set_var("SCRIPTALIGN_REFERENCE_ROOT", "/custom/reference");
        }
        std::fs::write(
            &config_file,
            r#"reference_texts_path = "$SCRIPTALIGN_REFERENCE_ROOT/english""#,
        )
        .unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(
            config.reference_texts_path,
            PathBuf::from("/custom/reference/english")
        );

        unsafe {
            env::remove_var("SCRIPTALIGN_REFERENCE_ROOT");
        }
    }
}
