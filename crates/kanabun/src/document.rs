//! XML documents containing verse lines.
//!
//! A [`Document`] owns its source text and is never rebuilt from a tree.
//! Every modification is a set of byte-range [splices](Splice) over the
//! source, so the bytes outside of the modified text nodes are preserved
//! exactly, including namespace prefixes, attribute quoting and comments.

use {
    derive_more::{Display, Error, From},
    itertools::Itertools,
    roxmltree::{Node, ParsingOptions},
    serde::Serialize,
    std::ops::Range,
};

/// Namespace of the `xml:id` identity attribute.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Local name of the identity attribute, in [`XML_NS`].
pub const IDENTITY_ATTR: &str = "id";

/// Name of the ordinal attribute.
pub const ORDINAL_ATTR: &str = "n";

/// Local names of alternate reading elements. Their text is not part of the
/// verse.
pub const VARIANT_TAGS: &[&str] = &["rdg", "rt"];

/// Failed to parse a document.
#[derive(Debug, Display, Error, From)]
pub enum DocumentParseError {
    /// The document is not UTF-8.
    #[display("document is not valid UTF-8")]
    Encoding(std::str::Utf8Error),
    /// The document is not well-formed XML.
    #[display("failed to parse XML")]
    Xml(roxmltree::Error),
}

/// Local names of the elements which make up verse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tags {
    /// Element holding an entire verse line.
    pub line: String,
    /// Element holding a single segment of a line.
    pub segment: String,
}

impl Default for Tags {
    fn default() -> Self {
        Self {
            line: "l".into(),
            segment: "seg".into(),
        }
    }
}

/// Well-formed XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    source: String,
}

impl Document {
    /// Parses a document from text.
    ///
    /// # Errors
    ///
    /// Errors if the text is not well-formed XML.
    pub fn parse(source: impl Into<String>) -> Result<Self, DocumentParseError> {
        let document = Self {
            source: source.into(),
        };
        document.tree()?;
        Ok(document)
    }

    /// Parses a document from UTF-8 bytes, ignoring a leading byte order mark.
    ///
    /// # Errors
    ///
    /// Errors if the bytes are not UTF-8, or not well-formed XML.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocumentParseError> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let source = std::str::from_utf8(bytes)?;
        Self::parse(source)
    }

    /// Gets the source text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Takes the source text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.source
    }

    pub(crate) fn tree(&self) -> Result<roxmltree::Document<'_>, DocumentParseError> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        Ok(roxmltree::Document::parse_with_options(
            &self.source,
            options,
        )?)
    }

    /// Applies `splices` to the source, producing a new document.
    pub(crate) fn splice(
        &self,
        mut splices: Vec<Splice>,
    ) -> Result<Self, DocumentParseError> {
        if splices.is_empty() {
            return Ok(self.clone());
        }
        splices.sort_by_key(|splice| splice.range.start);

        let mut source = String::with_capacity(self.source.len());
        let mut cursor = 0;
        for splice in splices {
            if splice.range.start < cursor {
                // overlaps a previous splice, e.g. a segment nested in a segment
                continue;
            }
            source.push_str(&self.source[cursor..splice.range.start]);
            source.push_str(&splice.text);
            cursor = splice.range.end;
        }
        source.push_str(&self.source[cursor..]);
        Self::parse(source)
    }

    /// Extracts every verse line, in document order.
    ///
    /// # Errors
    ///
    /// Errors if the document fails to parse.
    pub fn lines(&self, tags: &Tags) -> Result<Vec<VerseLine>, DocumentParseError> {
        let tree = self.tree()?;
        let lines = tree
            .descendants()
            .filter(|node| has_local_name(*node, &tags.line))
            .enumerate()
            .map(|(position, line)| VerseLine {
                identity: attribute(line, (XML_NS, IDENTITY_ATTR)),
                ordinal: attribute(line, ORDINAL_ATTR),
                position,
                source_line: tree.text_pos_at(line.range().start).row,
                text: collect_text(line, false),
                segments: line
                    .descendants()
                    .skip(1)
                    .filter(|node| has_local_name(*node, &tags.segment))
                    .map(|segment| Segment::new(&self.source, segment))
                    .collect(),
            })
            .collect();
        Ok(lines)
    }

    /// Gets the full text of every element named `tag`, in document order.
    ///
    /// # Errors
    ///
    /// Errors if the document fails to parse.
    pub fn texts_of(&self, tag: &str) -> Result<Vec<String>, DocumentParseError> {
        let tree = self.tree()?;
        Ok(tree
            .descendants()
            .filter(|node| has_local_name(*node, tag))
            .map(|node| collect_text(node, false))
            .collect())
    }

    /// Gets the source markup of every element named `tag`, in document order.
    ///
    /// # Errors
    ///
    /// Errors if the document fails to parse.
    pub fn markup_of(&self, tag: &str) -> Result<Vec<String>, DocumentParseError> {
        let tree = self.tree()?;
        Ok(tree
            .descendants()
            .filter(|node| has_local_name(*node, tag))
            .map(|node| self.source[node.range()].to_owned())
            .collect())
    }
}

/// Replacement of a byte range of a document's source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Splice {
    pub range: Range<usize>,
    pub text: String,
}

/// Single verse line of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerseLine {
    /// Value of the `xml:id` attribute.
    pub identity: Option<String>,
    /// Value of the `n` attribute.
    pub ordinal: Option<String>,
    /// Index of this line among all lines of the document.
    pub position: usize,
    /// 1-based line number in the source where this line starts.
    pub source_line: u32,
    /// All text under this line, including alternate readings.
    pub text: String,
    /// Segments of this line, in document order.
    pub segments: Vec<Segment>,
}

impl VerseLine {
    /// Gets the key used to refer to this line in reports and edits.
    ///
    /// This is the identity if there is one, otherwise `n=` followed by the
    /// ordinal, otherwise `#` followed by the position.
    #[must_use]
    pub fn label(&self) -> String {
        match (&self.identity, &self.ordinal) {
            (Some(identity), _) => identity.clone(),
            (None, Some(ordinal)) => format!("n={ordinal}"),
            (None, None) => format!("#{}", self.position),
        }
    }

    /// Gets the source markup of all segments, one per line.
    #[must_use]
    pub fn segment_markup(&self) -> String {
        self.segments
            .iter()
            .map(|segment| segment.markup.as_str())
            .join("\n")
    }
}

/// Single segment of a verse line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    /// Text of this segment, excluding alternate readings.
    pub text: String,
    /// Source markup of the segment element.
    pub markup: String,
    #[serde(skip)]
    text_nodes: Vec<Range<usize>>,
    #[serde(skip)]
    content: Content,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Content {
    /// Content starts at this byte.
    At(usize),
    /// Element is written as `<seg/>`, spanning this range.
    Empty(Range<usize>),
}

impl Segment {
    fn new(source: &str, node: Node) -> Self {
        let range = node.range();
        let content = match node.first_child() {
            Some(child) => Content::At(child.range().start),
            None => {
                let raw = &source[range.clone()];
                if raw.ends_with("/>") {
                    Content::Empty(range.clone())
                } else {
                    Content::At(range.start + raw.rfind("</").unwrap_or(raw.len()))
                }
            }
        };
        Self {
            text: collect_text(node, true),
            markup: source[range].to_owned(),
            text_nodes: verse_text_nodes(node)
                .map(|text| text_span(source, text))
                .collect(),
            content,
        }
    }

    /// Splices which make the text of this segment exactly `text`.
    ///
    /// The first text node receives the new text, and any other text nodes
    /// are emptied. Elements inside the segment are kept.
    pub(crate) fn replace_text(&self, source: &str, text: &str) -> Vec<Splice> {
        let escaped = html_escape::encode_text(text).into_owned();
        let mut text_nodes = self.text_nodes.iter().cloned();
        if let Some(first) = text_nodes.next() {
            return std::iter::once(Splice {
                range: first,
                text: escaped,
            })
            .chain(text_nodes.map(|range| Splice {
                range,
                text: String::new(),
            }))
            .collect();
        }

        match &self.content {
            Content::At(at) => vec![Splice {
                range: *at..*at,
                text: escaped,
            }],
            Content::Empty(range) => {
                let raw = &source[range.clone()];
                let start_tag = &raw[..raw.len() - "/>".len()];
                let name = start_tag[1..]
                    .split(|c: char| c.is_whitespace())
                    .next()
                    .unwrap_or_default();
                vec![Splice {
                    range: range.clone(),
                    text: format!("{start_tag}>{escaped}</{name}>"),
                }]
            }
        }
    }
}

/// Checks if `node` is an element with the local name `name`, in any
/// namespace.
#[must_use]
pub fn has_local_name(node: Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

fn is_variant(node: Node) -> bool {
    node.is_element() && VARIANT_TAGS.contains(&node.tag_name().name())
}

/// Checks if `node` is inside an alternate reading element below `root`.
pub(crate) fn in_variant(node: Node, root: Node) -> bool {
    node.ancestors()
        .take_while(|ancestor| *ancestor != root)
        .any(is_variant)
}

/// Source span of the text node `node`.
///
/// roxmltree merges adjacent text and CDATA sections into one node, but only
/// records the range of the first piece. The span runs from there up to the
/// next sibling, or to the parent's end tag.
pub(crate) fn text_span(source: &str, node: Node) -> Range<usize> {
    let range = node.range();
    let end = match (node.next_sibling(), node.parent()) {
        (Some(next), _) => next.range().start,
        (None, Some(parent)) if parent.is_element() => {
            let outer = parent.range();
            source
                .get(outer.clone())
                .and_then(|raw| raw.rfind("</"))
                .map_or(range.end, |at| outer.start + at)
        }
        _ => range.end,
    };
    range.start..end.max(range.end)
}

/// Text nodes below `root` which are not inside alternate readings.
fn verse_text_nodes<'a, 'input: 'a>(
    root: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    root.descendants()
        .filter(move |node| node.is_text() && !in_variant(*node, root))
}

fn collect_text(root: Node, skip_variants: bool) -> String {
    root.descendants()
        .filter(|node| node.is_text() && !(skip_variants && in_variant(*node, root)))
        .filter_map(|node| node.text())
        .collect()
}

fn attribute<'a, 'input: 'a, 'n, 'm>(
    node: Node<'a, 'input>,
    name: impl Into<roxmltree::ExpandedName<'n, 'm>>,
) -> Option<String> {
    node.attribute(name)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    const POEM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TEI xmlns="http://www.tei-c.org/ns/1.0">
  <text>
    <lg>
      <l xml:id="L1" n="1"><seg>あし<choice><sic>ひ</sic><rdg>び</rdg></choice>きの</seg><seg>やまどりのをの</seg></l>
      <l n="2"><seg/><seg>なが<rt>x</rt>なが</seg></l>
      <l/>
    </lg>
  </text>
</TEI>
"#;

    fn lines() -> Vec<VerseLine> {
        Document::parse(POEM).unwrap().lines(&Tags::default()).unwrap()
    }

    #[test]
    fn extract_lines() {
        let lines = lines();
        assert_eq!(lines.len(), 3);

        assert_eq!(lines[0].identity.as_deref(), Some("L1"));
        assert_eq!(lines[0].ordinal.as_deref(), Some("1"));
        assert_eq!(lines[0].position, 0);
        assert_eq!(lines[0].source_line, 5);
        assert_eq!(lines[0].text, "あしひびきのやまどりのをの");
        assert_eq!(lines[0].segments.len(), 2);
        assert_eq!(lines[0].segments[0].text, "あしひきの");
        assert_eq!(lines[0].segments[1].markup, "<seg>やまどりのをの</seg>");

        assert_eq!(lines[1].identity, None);
        assert_eq!(lines[1].segments[0].text, "");
        assert_eq!(lines[1].segments[1].text, "ながなが");

        assert!(lines[2].segments.is_empty());
    }

    #[test]
    fn labels() {
        let lines = lines();
        assert_eq!(lines[0].label(), "L1");
        assert_eq!(lines[1].label(), "n=2");
        assert_eq!(lines[2].label(), "#2");
    }

    #[test]
    fn namespaced_tags() {
        let xml = r#"<t:root xmlns:t="urn:t"><t:l><t:seg>あ</t:seg></t:l></t:root>"#;
        let lines = Document::parse(xml)
            .unwrap()
            .lines(&Tags::default())
            .unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].segments[0].text, "あ");
    }

    #[test]
    fn replace_segment_text() {
        let document = Document::parse(POEM).unwrap();
        let lines = document.lines(&Tags::default()).unwrap();
        let splices = [
            lines[0].segments[0].replace_text(document.as_str(), "あ&し"),
            lines[1].segments[0].replace_text(document.as_str(), "ひさかたの"),
            lines[1].segments[1].replace_text(document.as_str(), "ながき"),
        ]
        .concat();
        let replaced = document.splice(splices).unwrap();

        let lines = replaced.lines(&Tags::default()).unwrap();
        assert_eq!(lines[0].segments[0].text, "あ&し");
        assert_eq!(
            lines[0].segments[0].markup,
            "<seg>あ&amp;し<choice><sic></sic><rdg>び</rdg></choice></seg>"
        );
        assert_eq!(lines[1].segments[0].markup, "<seg>ひさかたの</seg>");
        assert_eq!(lines[1].segments[1].markup, "<seg>ながき<rt>x</rt></seg>");
    }

    #[test]
    fn texts_and_markup() {
        let document = Document::parse(POEM).unwrap();
        assert_eq!(
            document.texts_of("l").unwrap(),
            ["あしひびきのやまどりのをの", "ながxなが", ""]
        );
        assert_eq!(document.markup_of("l").unwrap()[2], "<l/>");
    }

    #[test]
    fn byte_order_mark() {
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend_from_slice("<l>あ</l>".as_bytes());
        let document = Document::from_bytes(&bytes).unwrap();
        assert_eq!(document.as_str(), "<l>あ</l>");
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            Document::parse("<l><seg></l>"),
            Err(DocumentParseError::Xml(_))
        ));
        assert!(matches!(
            Document::from_bytes(b"<l>\xFF</l>"),
            Err(DocumentParseError::Encoding(_))
        ));
    }
}
