use {
    super::{AnalyzeError, Analyzer, EngineInitError, Token},
    lindera::{
        dictionary::{DictionaryKind, load_dictionary_from_kind},
        mode::Mode,
        segmenter::Segmenter,
        tokenizer::Tokenizer,
    },
    tracing::info,
};

/// Analyzer backed by Lindera with its embedded UniDic dictionary.
///
/// The embedded dictionary is the contemporary UniDic, so readings of
/// classical forms are less accurate than with a verse-specific MeCab
/// dictionary.
#[derive(derive_more::Debug)]
pub struct LinderaAnalyzer {
    #[debug(skip)]
    tokenizer: Tokenizer,
    reading_field_index: usize,
}

impl LinderaAnalyzer {
    /// Number of detail columns in the embedded dictionary.
    pub const NUM_DETAILS: usize = 17;

    /// Detail column holding the katakana pronunciation of the surface.
    ///
    /// Column 6 is the reading of the lemma and column 7 the lemma itself, so
    /// neither follows conjugation. This is not [`DEFAULT_READING_FIELD`],
    /// which indexes the full UniDic feature string written by MeCab.
    ///
    /// [`DEFAULT_READING_FIELD`]: super::DEFAULT_READING_FIELD
    pub const DEFAULT_READING_FIELD: usize = 9;

    /// Loads the embedded dictionary, reading from detail column
    /// `reading_field_index`.
    ///
    /// # Errors
    ///
    /// Errors if `reading_field_index` is not below [`Self::NUM_DETAILS`], or
    /// if the dictionary fails to load.
    pub fn new(reading_field_index: usize) -> Result<Self, EngineInitError> {
        if reading_field_index >= Self::NUM_DETAILS {
            return Err(EngineInitError::Backend(format!(
                "reading field {reading_field_index} is out of range, embedded UniDic has 17 \
                 detail columns"
            )));
        }
        let dictionary = load_dictionary_from_kind(DictionaryKind::UniDic)
            .map_err(|err| EngineInitError::Backend(err.to_string()))?;
        let segmenter = Segmenter::new(Mode::Normal, dictionary, None);
        let tokenizer = Tokenizer::new(segmenter);
        info!("Loaded embedded UniDic, reading field {reading_field_index}");
        Ok(Self {
            tokenizer,
            reading_field_index,
        })
    }
}

impl Analyzer for LinderaAnalyzer {
    fn analyze(&self, text: &str) -> Result<Vec<Token>, AnalyzeError> {
        let tokens = self
            .tokenizer
            .tokenize(text)
            .map_err(|err| AnalyzeError::Backend(err.to_string()))?;
        Ok(tokens
            .into_iter()
            .map(|mut token| {
                let surface = text
                    .get(token.byte_start..token.byte_end)
                    .unwrap_or_default()
                    .to_owned();
                let feature = token
                    .get_detail(self.reading_field_index)
                    .map(ToOwned::to_owned);
                Token::Morpheme { surface, feature }
            })
            .collect())
    }
}
