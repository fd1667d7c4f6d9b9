use {
    super::{AnalyzeError, Analyzer, AnalyzerConfig, EngineInitError, Token, parse_output},
    itertools::Itertools,
    mecab::Tagger,
    std::sync::Mutex,
    tracing::info,
};

/// Analyzer backed by an in-process MeCab tagger.
///
/// The tagger keeps internal state between calls, so it is guarded by a lock.
#[derive(derive_more::Debug)]
pub struct MecabAnalyzer {
    #[debug(skip)]
    tagger: Mutex<Tagger>,
}

impl MecabAnalyzer {
    /// Creates a tagger with `config`.
    ///
    /// # Errors
    ///
    /// Errors if the dictionary or rule configuration is missing.
    pub fn new(config: AnalyzerConfig) -> Result<Self, EngineInitError> {
        let config = config.resolve()?;
        // MeCab splits its argument string itself, respecting double quotes
        let args = config
            .mecab_args()
            .into_iter()
            .map(|arg| {
                if arg.starts_with('-') {
                    arg
                } else {
                    format!("\"{arg}\"")
                }
            })
            .join(" ");
        info!(
            "Creating MeCab tagger with dictionary {:?}",
            config.dictionary_path
        );
        let tagger = Tagger::new(args);
        Ok(Self {
            tagger: Mutex::new(tagger),
        })
    }
}

impl Analyzer for MecabAnalyzer {
    fn analyze(&self, text: &str) -> Result<Vec<Token>, AnalyzeError> {
        let tagger = self
            .tagger
            .lock()
            .map_err(|_| AnalyzeError::Backend("tagger lock poisoned".into()))?;
        let output = tagger.parse_str(text);
        Ok(parse_output(&output))
    }
}
