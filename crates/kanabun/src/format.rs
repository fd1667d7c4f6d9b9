//! Output containers for converted text.

use {
    derive_more::{Display, Error},
    itertools::Itertools,
    serde::{Deserialize, Serialize},
    std::{borrow::Cow, str::FromStr},
};

/// UTF-8 byte order mark.
pub const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Header of the single CSV column.
pub const CSV_HEADER: &str = "text";

/// File format to write converted texts in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text, one text per line.
    #[default]
    #[display("txt")]
    Txt,
    /// Comma-separated values with one `text` column.
    #[display("csv")]
    Csv,
    /// XML document with one `text` element per text.
    #[display("xml")]
    Xml,
}

/// Name does not match any [`OutputFormat`].
#[derive(Debug, Clone, Display, Error)]
#[display("unknown output format {_0:?}, expected `txt`, `csv` or `xml`")]
pub struct UnknownOutputFormat(#[error(ignore)] pub String);

impl FromStr for OutputFormat {
    type Err = UnknownOutputFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(Self::Txt),
            "csv" => Ok(Self::Csv),
            "xml" => Ok(Self::Xml),
            _ => Err(UnknownOutputFormat(s.to_owned())),
        }
    }
}

impl OutputFormat {
    /// File extension, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Csv => "csv",
            Self::Xml => "xml",
        }
    }

    /// Media type of files in this format.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Txt => "text/plain",
            Self::Csv => "text/csv",
            Self::Xml => "application/xml",
        }
    }

    /// Writes `texts` as a file in this format.
    #[must_use]
    pub fn render<S: AsRef<str>>(self, texts: &[S]) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Self::Txt => {
                out.extend_from_slice(BOM);
                let body = texts.iter().map(AsRef::<str>::as_ref).join("\n");
                out.extend_from_slice(body.as_bytes());
            }
            Self::Csv => {
                out.extend_from_slice(BOM);
                out.extend_from_slice(CSV_HEADER.as_bytes());
                out.extend_from_slice(b"\r\n");
                for text in texts {
                    out.extend_from_slice(csv_field(text.as_ref()).as_bytes());
                    out.extend_from_slice(b"\r\n");
                }
            }
            Self::Xml => {
                out.extend_from_slice(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root>");
                for text in texts {
                    out.extend_from_slice(b"<text>");
                    out.extend_from_slice(html_escape::encode_text(text.as_ref()).as_bytes());
                    out.extend_from_slice(b"</text>");
                }
                out.extend_from_slice(b"</root>\n");
            }
        }
        out
    }
}

fn csv_field(text: &str) -> Cow<'_, str> {
    if text.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", text.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(text)
    }
}

/// Decodes plain text input, dropping a byte order mark.
///
/// Invalid UTF-8 is replaced rather than rejected.
#[must_use]
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes.strip_prefix(BOM).unwrap_or(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn txt() {
        let out = OutputFormat::Txt.render(&["はる", "なつ"]);
        assert_eq!(out, [BOM, "はる\nなつ".as_bytes()].concat());
    }

    #[test]
    fn csv_quoting() {
        let out = OutputFormat::Csv.render(&["はる", "a,b", "say \"hi\"", "x\ny"]);
        let expected = "text\r\nはる\r\n\"a,b\"\r\n\"say \"\"hi\"\"\"\r\n\"x\ny\"\r\n";
        assert_eq!(out, [BOM, expected.as_bytes()].concat());
    }

    #[test]
    fn xml_escapes() {
        let out = OutputFormat::Xml.render(&["a<b&c"]);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root><text>a&lt;b&amp;c</text></root>\n"
        );
    }

    #[test]
    fn parse_names() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Txt);
        assert!("docx".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Xml.extension(), "xml");
    }

    #[test]
    fn decode() {
        assert_eq!(decode_text(b"\xEF\xBB\xBFabc"), "abc");
        assert_eq!(decode_text(b"a\xFFb"), "a\u{FFFD}b");
    }
}
