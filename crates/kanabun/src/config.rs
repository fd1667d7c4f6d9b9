//! Persistent engine settings.

use {
    crate::{
        analyzer::{AnalyzerConfig, DEFAULT_READING_FIELD, find_dictionary},
        convert::OutputMode,
        document::Tags,
    },
    derive_more::{Display, Error},
    directories::ProjectDirs,
    serde::{Deserialize, Serialize},
    std::{
        fs, io,
        path::{Path, PathBuf},
    },
    tracing::debug,
};

/// Name of the configuration file inside the configuration directory.
pub const CONFIG_FILE: &str = "config.json";

/// Settings for converting and validating documents.
///
/// Every field has a default, so a configuration file only needs to list the
/// settings it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Expand iteration marks when converting text.
    pub expand_odoriji: bool,
    /// Expand iteration marks when counting morae.
    pub expand_odoriji_when_counting: bool,
    /// Script of converted text.
    pub output_mode: OutputMode,
    /// Dictionary feature field holding the reading.
    pub reading_field_index: usize,
    /// Local name of verse line elements.
    pub line_tag: String,
    /// Local name of segment elements.
    pub segment_tag: String,
    /// Directory containing the analyzer dictionary.
    ///
    /// If unset, the first dictionary found under [`Config::dictionary_dir`]
    /// is used, falling back to the analyzer's own default.
    pub dictionary_path: Option<PathBuf>,
    /// Path to the analyzer rule configuration.
    pub rule_config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let tags = Tags::default();
        Self {
            expand_odoriji: true,
            expand_odoriji_when_counting: true,
            output_mode: OutputMode::default(),
            reading_field_index: DEFAULT_READING_FIELD,
            line_tag: tags.line,
            segment_tag: tags.segment,
            dictionary_path: None,
            rule_config_path: None,
        }
    }
}

/// Failed to load a [`Config`].
#[derive(Debug, Display, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[display("failed to read {path:?}")]
    Read {
        /// File which was read.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// The file is not a valid configuration.
    #[display("failed to parse {path:?}")]
    Parse {
        /// File which was parsed.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// The configuration could not be written.
    #[display("failed to write {path:?}")]
    Write {
        /// File which was written.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("io.github", "kanabun", "Kanabun")
}

impl Config {
    /// Default location of the configuration file.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Directory searched for an installed dictionary.
    #[must_use]
    pub fn dictionary_dir() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.data_dir().join("dic"))
    }

    /// Reads the configuration at `path`.
    ///
    /// # Errors
    ///
    /// Errors if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads the configuration at `path`, or the default configuration if
    /// there is no file there.
    ///
    /// # Errors
    ///
    /// Errors if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                debug!("No config at {path:?}, using defaults");
                Ok(Self::default())
            }
            result => result,
        }
    }

    /// Writes this configuration to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Errors if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let text = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, text).map_err(write_err)
    }

    /// Element names used to find verse.
    #[must_use]
    pub fn tags(&self) -> Tags {
        Tags {
            line: self.line_tag.clone(),
            segment: self.segment_tag.clone(),
        }
    }

    /// Settings for starting an analyzer.
    #[must_use]
    pub fn analyzer(&self) -> AnalyzerConfig {
        let dictionary_path = self.dictionary_path.clone().or_else(|| {
            let found = Self::dictionary_dir().and_then(|dir| find_dictionary(&dir));
            if let Some(path) = &found {
                debug!("Found installed dictionary at {path:?}");
            }
            found
        });
        AnalyzerConfig {
            dictionary_path,
            rule_config_path: self.rule_config_path.clone(),
            reading_field_index: self.reading_field_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(config.expand_odoriji);
        assert!(config.expand_odoriji_when_counting);
        assert_eq!(config.reading_field_index, 20);
        assert_eq!(config.tags(), Tags::default());
    }

    #[test]
    fn partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, r#"{ "output_mode": "katakana", "reading_field_index": 9 }"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.output_mode, OutputMode::Katakana);
        assert_eq!(config.reading_field_index, 9);
        assert_eq!(config.line_tag, "l");
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        assert_eq!(Config::load_or_default(&path).unwrap(), Config::default());
        assert!(matches!(Config::load(&path), Err(ConfigError::Read { .. })));
    }

    #[test]
    fn invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, r#"{ "output_mode": "romaji" }"#).unwrap();
        assert!(matches!(
            Config::load_or_default(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = Config {
            segment_tag: "s".into(),
            dictionary_path: Some("/opt/dic".into()),
            ..Config::default()
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn explicit_dictionary() {
        let config = Config {
            dictionary_path: Some("/opt/dic".into()),
            reading_field_index: 6,
            ..Config::default()
        };
        let analyzer = config.analyzer();
        assert_eq!(analyzer.dictionary_path, Some(PathBuf::from("/opt/dic")));
        assert_eq!(analyzer.reading_field_index, 6);
    }
}
