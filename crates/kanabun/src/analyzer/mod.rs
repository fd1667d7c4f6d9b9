//! Morphological analyzer backends.
//!
//! The engine never segments text itself. It hands text to an [`Analyzer`],
//! which returns one [`Token`] per morpheme along with the dictionary feature
//! chosen by [`AnalyzerConfig::reading_field_index`].
//!
//! Backends which speak MeCab's text protocol are configured with the output
//! format `%m\t%f[N]\n`, so every line of their output is a surface and a
//! candidate reading separated by a tab, and each sentence ends with `EOS`.

mod command;
mod fixed;
#[cfg(feature = "lindera")]
mod lindera;
#[cfg(feature = "mecab")]
mod mecab;

pub use command::CommandAnalyzer;
pub use fixed::StaticAnalyzer;
#[cfg(feature = "lindera")]
pub use lindera::LinderaAnalyzer;
#[cfg(feature = "mecab")]
pub use mecab::MecabAnalyzer;

use {
    derive_more::{Display, Error},
    std::{
        env, fs, io,
        path::{Path, PathBuf},
    },
};

/// Name of the file which marks a directory as a MeCab dictionary.
pub const DICRC: &str = "dicrc";

/// Marker line which ends the output for one sentence.
pub const EOS: &str = "EOS";

/// Reading field used by UniDic for classical verse.
pub const DEFAULT_READING_FIELD: usize = 20;

/// Places where a MeCab rule configuration is usually installed.
pub const RULE_CONFIG_CANDIDATES: &[&str] = &[
    r"C:\Program Files\MeCab\etc\mecabrc",
    r"C:\Program Files (x86)\MeCab\etc\mecabrc",
    "/etc/mecabrc",
    "/usr/local/etc/mecabrc",
];

/// Splits text into morphemes.
///
/// A single handle is reused for sequential calls within a session. Handles
/// are not required to support concurrent calls.
pub trait Analyzer {
    /// Analyzes `text` into tokens, in order. Sentence boundaries are not
    /// included.
    ///
    /// # Errors
    ///
    /// Errors if the backend fails while analyzing this text.
    fn analyze(&self, text: &str) -> Result<Vec<Token>, AnalyzeError>;
}

impl<A: Analyzer + ?Sized> Analyzer for Box<A> {
    fn analyze(&self, text: &str) -> Result<Vec<Token>, AnalyzeError> {
        (**self).analyze(text)
    }
}

/// Single unit of analyzer output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Surface form with its candidate reading feature.
    Morpheme {
        /// Text as it appears in the input.
        surface: String,
        /// Value of the configured feature field, if the analyzer produced one.
        feature: Option<String>,
    },
    /// Output line with no field separator, passed through as-is.
    Verbatim(String),
}

impl Token {
    /// Creates a [`Token::Morpheme`].
    #[must_use]
    pub fn morpheme(surface: impl Into<String>, feature: impl Into<String>) -> Self {
        Self::Morpheme {
            surface: surface.into(),
            feature: Some(feature.into()),
        }
    }
}

/// Parses MeCab-style `surface\tfeature` output lines into tokens.
///
/// # Examples
///
/// ```
/// # use kanabun::analyzer::{Token, parse_output};
/// let tokens = parse_output("春\tハル\nBROKEN\nEOS\n");
/// assert_eq!(
///     tokens,
///     [
///         Token::morpheme("春", "ハル"),
///         Token::Verbatim("BROKEN".into()),
///     ]
/// );
/// ```
#[must_use]
pub fn parse_output(output: &str) -> Vec<Token> {
    output
        .lines()
        .filter(|line| !line.is_empty() && *line != EOS)
        .map(|line| match line.split_once('\t') {
            Some((surface, feature)) => Token::morpheme(surface, feature),
            None => Token::Verbatim(line.to_owned()),
        })
        .collect()
}

/// How to start an analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// Directory containing the dictionary (and its [`DICRC`]).
    pub dictionary_path: Option<PathBuf>,
    /// Path to a `mecabrc` rule configuration.
    pub rule_config_path: Option<PathBuf>,
    /// Which feature field holds the reading.
    ///
    /// Defaults to [`DEFAULT_READING_FIELD`]. Other UniDic variants put the
    /// reading at 6, 7 or 9.
    pub reading_field_index: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            dictionary_path: None,
            rule_config_path: None,
            reading_field_index: DEFAULT_READING_FIELD,
        }
    }
}

impl AnalyzerConfig {
    /// Checks the configured paths and fills in the rule configuration from
    /// [`default_rule_config`] if none was given.
    ///
    /// # Errors
    ///
    /// Errors if the dictionary directory has no [`DICRC`], or if the rule
    /// configuration does not exist.
    pub fn resolve(mut self) -> Result<Self, EngineInitError> {
        if let Some(path) = &self.dictionary_path {
            if !has_dicrc(path) {
                return Err(EngineInitError::NoDicrc { path: path.clone() });
            }
        }
        match &self.rule_config_path {
            Some(path) if !path.is_file() => {
                return Err(EngineInitError::NoRuleConfig { path: path.clone() });
            }
            Some(_) => {}
            None => self.rule_config_path = default_rule_config(),
        }
        Ok(self)
    }

    /// Arguments for a MeCab tagger which outputs `surface\treading` lines.
    #[must_use]
    pub fn mecab_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(path) = &self.rule_config_path {
            args.extend(["-r".to_owned(), path.display().to_string()]);
        }
        if let Some(path) = &self.dictionary_path {
            args.extend(["-d".to_owned(), path.display().to_string()]);
        }
        args.extend([
            "-F".to_owned(),
            format!("%m\\t%f[{}]\\n", self.reading_field_index),
            "-U".to_owned(),
            "%m\\t%m\\n".to_owned(),
            "-E".to_owned(),
            "EOS\\n".to_owned(),
        ]);
        args
    }
}

/// Failed to start an analyzer.
#[derive(Debug, Display, Error)]
pub enum EngineInitError {
    /// The dictionary directory is not a MeCab dictionary.
    #[display("no `dicrc` in dictionary directory {path:?}")]
    NoDicrc {
        /// Directory which was checked.
        path: PathBuf,
    },
    /// The rule configuration file does not exist.
    #[display("rule configuration {path:?} does not exist")]
    NoRuleConfig {
        /// Path which was checked.
        path: PathBuf,
    },
    /// The analyzer program could not be run.
    #[display("failed to run analyzer {program:?}")]
    Spawn {
        /// Program which was run.
        program: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// The analyzer program ran, but did not start successfully.
    #[display("analyzer {program:?} exited with {status}: {stderr}")]
    Exited {
        /// Program which was run.
        program: PathBuf,
        /// Exit status.
        status: std::process::ExitStatus,
        /// Captured standard error.
        stderr: String,
    },
    /// The backend itself failed to load.
    #[display("failed to load analyzer backend: {_0}")]
    Backend(#[error(ignore)] String),
}

/// Failed to analyze a piece of text.
#[derive(Debug, Display, Error)]
pub enum AnalyzeError {
    /// Failed to talk to the analyzer process.
    #[display("failed to communicate with analyzer")]
    Io(io::Error),
    /// The analyzer process exited unsuccessfully.
    #[display("analyzer exited with {status}: {stderr}")]
    Exited {
        /// Exit status.
        status: std::process::ExitStatus,
        /// Captured standard error.
        stderr: String,
    },
    /// The backend reported an error.
    #[display("analyzer failed: {_0}")]
    Backend(#[error(ignore)] String),
}

/// Checks if `path` is a directory containing a [`DICRC`].
#[must_use]
pub fn has_dicrc(path: &Path) -> bool {
    path.join(DICRC).is_file()
}

/// Finds the first directory under `root`, including `root` itself, which
/// contains a [`DICRC`].
///
/// Directories are searched breadth-first in name order, so a shallow
/// dictionary is preferred over one nested deeper.
#[must_use]
pub fn find_dictionary(root: &Path) -> Option<PathBuf> {
    let mut queue = std::collections::VecDeque::from([root.to_path_buf()]);
    while let Some(dir) = queue.pop_front() {
        if has_dicrc(&dir) {
            return Some(dir);
        }
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        let mut children = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect::<Vec<_>>();
        children.sort();
        queue.extend(children);
    }
    None
}

/// Gets the rule configuration to use when none is configured.
///
/// Reads the `MECABRC` environment variable, then falls back to the first
/// [`RULE_CONFIG_CANDIDATES`] entry which exists.
#[must_use]
pub fn default_rule_config() -> Option<PathBuf> {
    if let Some(path) = env::var_os("MECABRC").filter(|path| !path.is_empty()) {
        return Some(PathBuf::from(path));
    }
    RULE_CONFIG_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_lines() {
        let output = "けふ\tケフ\n〳〵\t*\n\n。\t。\nEOS\n";
        assert_eq!(
            parse_output(output),
            [
                Token::morpheme("けふ", "ケフ"),
                Token::morpheme("〳〵", "*"),
                Token::morpheme("。", "。"),
            ]
        );
    }

    #[test]
    fn split_at_first_tab() {
        assert_eq!(parse_output("a\tb\tc"), [Token::morpheme("a", "b\tc")]);
    }

    #[test]
    fn find_nested_dictionary() {
        let root = tempfile::tempdir().unwrap();
        let dict = root.path().join("unidic-waka-v202512").join("dic");
        fs::create_dir_all(&dict).unwrap();
        fs::create_dir_all(root.path().join("aaa")).unwrap();
        fs::write(dict.join(DICRC), "").unwrap();

        assert!(!has_dicrc(root.path()));
        assert_eq!(find_dictionary(root.path()), Some(dict));
    }

    #[test]
    fn no_dictionary() {
        let root = tempfile::tempdir().unwrap();
        assert_eq!(find_dictionary(root.path()), None);
    }

    #[test]
    fn resolve_rejects_missing_dicrc() {
        let root = tempfile::tempdir().unwrap();
        let config = AnalyzerConfig {
            dictionary_path: Some(root.path().to_path_buf()),
            rule_config_path: Some(root.path().join("mecabrc")),
            ..Default::default()
        };
        assert!(matches!(config.resolve(), Err(EngineInitError::NoDicrc { .. })));
    }

    #[test]
    fn resolve_checks_rule_config() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join(DICRC), "").unwrap();
        let config = AnalyzerConfig {
            dictionary_path: Some(root.path().to_path_buf()),
            rule_config_path: Some(root.path().join("mecabrc")),
            ..Default::default()
        };
        assert!(matches!(
            config.clone().resolve(),
            Err(EngineInitError::NoRuleConfig { .. })
        ));

        fs::write(root.path().join("mecabrc"), "").unwrap();
        assert_eq!(config.clone().resolve().unwrap(), config);
    }

    #[test]
    fn mecab_format_args() {
        let config = AnalyzerConfig {
            dictionary_path: Some(PathBuf::from("dic")),
            rule_config_path: None,
            reading_field_index: 9,
        };
        assert_eq!(
            config.mecab_args(),
            [
                "-d",
                "dic",
                "-F",
                "%m\\t%f[9]\\n",
                "-U",
                "%m\\t%m\\n",
                "-E",
                "EOS\\n"
            ]
        );
    }
}
