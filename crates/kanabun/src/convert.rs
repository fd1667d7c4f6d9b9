//! Conversion of verse text into kana.

use {
    crate::{
        Engine,
        analyzer::AnalyzeError,
        document::{Document, DocumentParseError, Splice, has_local_name, in_variant, text_span},
        lang::jpn::{hiragana_to_katakana, katakana_to_hiragana},
        odoriji::{Expander, Pass, post_expand, pre_expand},
        reading::readings,
    },
    derive_more::{Display, Error, From},
    serde::{Deserialize, Serialize},
    std::{borrow::Cow, str::FromStr},
    tracing::debug,
};

/// Which script converted text is written in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Hiragana, such as `はる`.
    #[default]
    #[display("hiragana")]
    Hiragana,
    /// Katakana, such as `ハル`.
    #[display("katakana")]
    Katakana,
}

impl OutputMode {
    /// Writes hiragana text in this mode.
    #[must_use]
    pub fn apply(self, hiragana: String) -> String {
        match self {
            Self::Hiragana => hiragana,
            Self::Katakana => hiragana_to_katakana(&hiragana),
        }
    }
}

/// Name does not match any [`OutputMode`].
#[derive(Debug, Clone, Display, Error)]
#[display("unknown output mode {_0:?}, expected `hiragana` or `katakana`")]
pub struct UnknownOutputMode(#[error(ignore)] pub String);

impl FromStr for OutputMode {
    type Err = UnknownOutputMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hiragana" | "hira" => Ok(Self::Hiragana),
            "katakana" | "kata" => Ok(Self::Katakana),
            _ => Err(UnknownOutputMode(s.to_owned())),
        }
    }
}

/// Steps applied by [`Engine::convert_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pipeline {
    /// Expand iteration marks before analysis.
    pub pre_expand: bool,
    /// Expand iteration marks remaining after normalization.
    pub post_expand: bool,
    /// Script of the output.
    pub output_mode: OutputMode,
}

impl Pipeline {
    /// Creates a pipeline which runs both expansion passes if `expand` is set.
    #[must_use]
    pub const fn new(expand: bool, output_mode: OutputMode) -> Self {
        Self {
            pre_expand: expand,
            post_expand: expand,
            output_mode,
        }
    }
}

/// Failed to convert a document.
#[derive(Debug, Display, Error, From)]
pub enum ConvertError {
    /// The document could not be parsed.
    #[display("failed to parse document")]
    Parse(DocumentParseError),
    /// The analyzer failed on some of the document's text.
    #[display("failed to analyze text")]
    Analyze(AnalyzeError),
}

impl Engine {
    /// Pipeline for converting text with the current configuration.
    #[must_use]
    pub const fn pipeline(&self) -> Pipeline {
        Pipeline::new(self.config.expand_odoriji, self.config.output_mode)
    }

    /// Pipeline used for counting morae in segments.
    #[must_use]
    pub const fn counting_pipeline(&self) -> Pipeline {
        Pipeline::new(self.config.expand_odoriji_when_counting, OutputMode::Hiragana)
    }

    /// Gets the reading of every token in `text`, as the analyzer writes them.
    ///
    /// # Errors
    ///
    /// Errors if the analyzer fails.
    pub fn readings(&self, text: &str) -> Result<Vec<String>, AnalyzeError> {
        let tokens = self.analyzer.analyze(text)?;
        Ok(readings(&tokens))
    }

    /// Converts `text` into kana with the current configuration.
    ///
    /// # Errors
    ///
    /// Errors if the analyzer fails.
    pub fn convert_text(&self, text: &str) -> Result<String, AnalyzeError> {
        self.convert_with(text, self.pipeline())
    }

    /// Converts `text` into kana using `pipeline`.
    ///
    /// # Errors
    ///
    /// Errors if the analyzer fails.
    pub fn convert_with(&self, text: &str, pipeline: Pipeline) -> Result<String, AnalyzeError> {
        if text.is_empty() {
            return Ok(String::new());
        }

        let text = if pipeline.pre_expand {
            Cow::Owned(pre_expand(text))
        } else {
            Cow::Borrowed(text)
        };
        let reading = self.readings(&text)?.concat();
        let hiragana = katakana_to_hiragana(&reading);
        let hiragana = if pipeline.post_expand {
            post_expand(&hiragana)
        } else {
            hiragana
        };
        Ok(pipeline.output_mode.apply(hiragana))
    }

    /// Converts each line of `text` separately, keeping line breaks.
    ///
    /// # Errors
    ///
    /// Errors if the analyzer fails on any line.
    pub fn convert_lines(&self, text: &str) -> Result<String, AnalyzeError> {
        let pipeline = self.pipeline();
        let lines = text
            .lines()
            .map(|line| self.convert_padded(line, pipeline))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lines.join("\n"))
    }

    /// Converts the text of every line element in `document`.
    ///
    /// All text under a line element is converted, including text in child
    /// elements and alternate readings. Whitespace around each text node is
    /// kept, and everything outside of line elements is left as-is.
    ///
    /// # Errors
    ///
    /// Errors if the document cannot be parsed, or if the analyzer fails.
    pub fn convert_document(&self, document: &Document) -> Result<Document, ConvertError> {
        let tree = document.tree()?;
        let line_tag = self.config.line_tag.as_str();
        let pipeline = self.pipeline();
        // marks are expanded across text nodes here, not again per node
        let node_pipeline = Pipeline {
            pre_expand: false,
            ..pipeline
        };

        let mut splices = Vec::new();
        let mut num_lines = 0usize;
        let lines = tree.descendants().filter(|node| {
            has_local_name(*node, line_tag)
                && !node
                    .ancestors()
                    .skip(1)
                    .any(|ancestor| has_local_name(ancestor, line_tag))
        });
        for line in lines {
            num_lines += 1;
            let mut expander = Expander::new(Pass::Pre);
            for node in line.descendants().filter(roxmltree::Node::is_text) {
                let raw = node.text().unwrap_or_default();
                if raw.trim().is_empty() {
                    // formatting between elements, which must not reach the register
                    continue;
                }
                let text = match (pipeline.pre_expand, in_variant(node, line)) {
                    (false, _) => Cow::Borrowed(raw),
                    (true, true) => Cow::Owned(expander.peek_str(raw)),
                    (true, false) => Cow::Owned(expander.push_str(raw)),
                };
                let converted = self.convert_padded(&text, node_pipeline)?;
                if converted != raw {
                    splices.push(Splice {
                        range: text_span(document.as_str(), node),
                        text: html_escape::encode_text(&converted).into_owned(),
                    });
                }
            }
        }

        debug!(
            "Converted {num_lines} line elements, rewriting {} text nodes",
            splices.len()
        );
        Ok(document.splice(splices)?)
    }

    /// Converts the non-whitespace core of `text`, keeping the surrounding
    /// whitespace.
    fn convert_padded(&self, text: &str, pipeline: Pipeline) -> Result<String, AnalyzeError> {
        let core = text.trim();
        if core.is_empty() {
            return Ok(text.to_owned());
        }
        let start = text.len() - text.trim_start().len();
        let end = start + core.len();
        Ok(format!(
            "{}{}{}",
            &text[..start],
            self.convert_with(core, pipeline)?,
            &text[end..]
        ))
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{Config, analyzer::StaticAnalyzer},
    };

    fn analyzer() -> StaticAnalyzer {
        StaticAnalyzer::from_iter([
            ("春", "ハル"),
            ("過ぎ", "スギ"),
            ("て", "テ"),
            ("夏", "ナツ"),
            ("来", "キ"),
            ("けふ", "キョウ"),
            ("〳〵", "*"),
            ("心", "ココロ"),
        ])
    }

    fn engine(config: Config) -> Engine {
        Engine::new(analyzer(), config)
    }

    #[test]
    fn convert_to_hiragana() {
        let engine = engine(Config::default());
        assert_eq!(engine.convert_text("春過ぎて夏来").unwrap(), "はるすぎてなつき");
        assert_eq!(engine.convert_text("").unwrap(), "");
    }

    #[test]
    fn convert_to_katakana() {
        let engine = engine(Config {
            output_mode: OutputMode::Katakana,
            ..Config::default()
        });
        assert_eq!(engine.convert_text("春の夏").unwrap(), "ハルノナツ");
    }

    #[test]
    fn long_repeat_mark() {
        let engine = engine(Config::default());
        assert_eq!(engine.convert_text("けふ〳〵").unwrap(), "きょうきょう");
    }

    #[test]
    fn expansion_toggle() {
        let on = engine(Config::default());
        assert_eq!(on.convert_text("かゞみ").unwrap(), "かがみ");
        // left to the post pass, since the analyzer keeps the mark
        assert_eq!(on.convert_text("ハルヽ").unwrap(), "はるる");

        let off = engine(Config {
            expand_odoriji: false,
            ..Config::default()
        });
        assert_eq!(off.convert_text("かゞみ").unwrap(), "かゞみ");
    }

    #[test]
    fn convert_lines_keeps_breaks() {
        let engine = engine(Config::default());
        assert_eq!(
            engine.convert_lines("春過ぎて\n\n 夏来 ").unwrap(),
            "はるすぎて\n\n なつき "
        );
    }

    #[test]
    fn parse_output_mode() {
        assert_eq!("katakana".parse::<OutputMode>().unwrap(), OutputMode::Katakana);
        assert_eq!("hira".parse::<OutputMode>().unwrap(), OutputMode::Hiragana);
        assert!("romaji".parse::<OutputMode>().is_err());
    }

    #[test]
    fn convert_document_in_place() {
        let engine = engine(Config::default());
        let document = Document::parse(concat!(
            "<?xml version=\"1.0\"?>\n",
            "<!-- 春 -->\n",
            "<poem xmlns:x=\"urn:x\">\n",
            "  <head>春</head>\n",
            "  <l n='1'>\n    <seg>春<x:note>心</x:note>過ぎて</seg>\n  </l>\n",
            "</poem>\n",
        ))
        .unwrap();
        let converted = engine.convert_document(&document).unwrap();
        assert_eq!(
            converted.as_str(),
            concat!(
                "<?xml version=\"1.0\"?>\n",
                "<!-- 春 -->\n",
                "<poem xmlns:x=\"urn:x\">\n",
                "  <head>春</head>\n",
                "  <l n='1'>\n    <seg>はる<x:note>こころ</x:note>すぎて</seg>\n  </l>\n",
                "</poem>\n",
            )
        );
    }

    #[test]
    fn document_expansion_spans_nodes() {
        let engine = engine(Config::default());
        let document = Document::parse(
            "<r><l>こ<hi>ゝ</hi>か<rdg>ゞ</rdg>ゝ</l><l>ゝ</l></r>",
        )
        .unwrap();
        let converted = engine.convert_document(&document).unwrap();
        // the reading does not move the register, and each line starts empty
        assert_eq!(
            converted.as_str(),
            "<r><l>こ<hi>こ</hi>か<rdg>が</rdg>か</l><l>ゝ</l></r>"
        );
    }

    #[test]
    fn indented_document_keeps_register() {
        let engine = engine(Config::default());
        let source = "<l>\n  <seg>こ</seg>\n  <seg>ゝろ</seg>\n</l>";
        let converted = engine
            .convert_document(&Document::parse(source).unwrap())
            .unwrap();
        assert_eq!(
            converted.as_str(),
            "<l>\n  <seg>こ</seg>\n  <seg>ころ</seg>\n</l>"
        );
    }

    #[test]
    fn cdata_is_converted_once() {
        let engine = engine(Config::default());
        let source = "<r><l>春<![CDATA[夏]]>春</l><l><![CDATA[夏]]>春<hi>心</hi></l></r>";
        let converted = engine
            .convert_document(&Document::parse(source).unwrap())
            .unwrap();
        assert_eq!(
            converted.as_str(),
            "<r><l>はるなつはる</l><l>なつはる<hi>こころ</hi></l></r>"
        );
    }

    #[test]
    fn document_text_is_escaped() {
        let engine = engine(Config::default());
        let document = Document::parse("<l>春&amp;夏</l>").unwrap();
        let converted = engine.convert_document(&document).unwrap();
        assert_eq!(converted.as_str(), "<l>はる&amp;なつ</l>");
    }
}
