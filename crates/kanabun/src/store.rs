//! Named pairs of original and converted documents.

use crate::{IndexMap, document::Document};

/// Original document and its converted counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPair {
    /// Document as it was read.
    pub original: Document,
    /// Document after conversion, and any replayed edits.
    pub converted: Document,
}

/// Documents converted during a session, in the order they were added.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    pairs: IndexMap<String, DocumentPair>,
}

impl DocumentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a pair under `name`.
    ///
    /// If `name` is already stored, its pair is replaced and keeps its place
    /// in the order. Returns the replaced pair.
    pub fn insert(&mut self, name: impl Into<String>, pair: DocumentPair) -> Option<DocumentPair> {
        self.pairs.insert(name.into(), pair)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DocumentPair> {
        self.pairs.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut DocumentPair> {
        self.pairs.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<DocumentPair> {
        self.pairs.shift_remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DocumentPair)> {
        self.pairs.iter().map(|(name, pair)| (name.as_str(), pair))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(text: &str) -> DocumentPair {
        let document = Document::parse(format!("<l>{text}</l>")).unwrap();
        DocumentPair {
            original: document.clone(),
            converted: document,
        }
    }

    #[test]
    fn replace_keeps_order() {
        let mut store = DocumentStore::new();
        assert!(store.insert("a.xml", pair("a")).is_none());
        store.insert("b.xml", pair("b"));
        let replaced = store.insert("a.xml", pair("c"));

        assert_eq!(replaced, Some(pair("a")));
        assert_eq!(store.len(), 2);
        let names = store.iter().map(|(name, _)| name).collect::<Vec<_>>();
        assert_eq!(names, ["a.xml", "b.xml"]);
        assert_eq!(store.get("a.xml"), Some(&pair("c")));
    }

    #[test]
    fn remove() {
        let mut store = DocumentStore::new();
        store.insert("a.xml", pair("a"));
        assert!(store.remove("a.xml").is_some());
        assert!(store.is_empty());
        assert!(store.get("a.xml").is_none());
    }
}
