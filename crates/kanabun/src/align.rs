//! Matching of verse lines between an original and a converted document.

use {
    crate::document::VerseLine,
    derive_more::Deref,
    foldhash::HashMap,
    serde::Serialize,
    tracing::trace,
};

/// Which key matched a converted line to an original line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignKey {
    /// Both lines have the same `xml:id`.
    Identity,
    /// Both lines have the same `n`.
    Ordinal,
    /// Both lines are at the same position in their documents.
    Position,
}

/// Original line matched to a converted line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineMatch {
    /// Index of the original line.
    pub original: usize,
    /// How the lines were matched.
    pub key: AlignKey,
}

/// For each converted line, in order, the original line it matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref)]
pub struct Alignment(Vec<Option<LineMatch>>);

/// Matches every converted line to at most one original line.
///
/// A converted line is matched by identity if the original has a line with
/// that identity, otherwise by ordinal, otherwise to the original line at the
/// same position. If none of these exist, the line is unmatched. When the
/// original repeats a key, the later line wins.
#[must_use]
pub fn align(original: &[VerseLine], converted: &[VerseLine]) -> Alignment {
    let mut by_identity = HashMap::default();
    let mut by_ordinal = HashMap::default();
    for (index, line) in original.iter().enumerate() {
        if let Some(identity) = &line.identity {
            by_identity.insert(identity.as_str(), index);
        }
        if let Some(ordinal) = &line.ordinal {
            by_ordinal.insert(ordinal.as_str(), index);
        }
    }

    let matches = converted
        .iter()
        .enumerate()
        .map(|(position, line)| {
            let found = lookup(&by_identity, line.identity.as_ref())
                .map(|original| LineMatch {
                    original,
                    key: AlignKey::Identity,
                })
                .or_else(|| {
                    lookup(&by_ordinal, line.ordinal.as_ref()).map(|original| LineMatch {
                        original,
                        key: AlignKey::Ordinal,
                    })
                })
                .or_else(|| {
                    (position < original.len()).then_some(LineMatch {
                        original: position,
                        key: AlignKey::Position,
                    })
                });
            trace!("Line {:?} aligned to {found:?}", line.label());
            found
        })
        .collect();
    Alignment(matches)
}

fn lookup(table: &HashMap<&str, usize>, key: Option<&String>) -> Option<usize> {
    key.and_then(|key| table.get(key.as_str()).copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(identity: Option<&str>, ordinal: Option<&str>, position: usize) -> VerseLine {
        VerseLine {
            identity: identity.map(ToOwned::to_owned),
            ordinal: ordinal.map(ToOwned::to_owned),
            position,
            source_line: 1,
            text: String::new(),
            segments: Vec::new(),
        }
    }

    fn matched(original: usize, key: AlignKey) -> Option<LineMatch> {
        Some(LineMatch { original, key })
    }

    #[test]
    fn identity_beats_ordinal() {
        let original = [line(Some("a"), Some("2"), 0), line(Some("b"), Some("1"), 1)];
        let converted = [line(Some("b"), Some("2"), 0)];
        assert_eq!(*align(&original, &converted), [matched(1, AlignKey::Identity)]);
    }

    #[test]
    fn ordinal_without_identity() {
        let original = [line(None, Some("1"), 0), line(None, Some("2"), 1)];
        let converted = [line(None, Some("2"), 0), line(Some("x"), Some("1"), 1)];
        assert_eq!(
            *align(&original, &converted),
            [matched(1, AlignKey::Ordinal), matched(0, AlignKey::Ordinal)]
        );
    }

    #[test]
    fn position_fallback_then_unmatched() {
        let original = [line(Some("a"), None, 0)];
        let converted = [line(Some("x"), None, 0), line(None, Some("9"), 1)];
        assert_eq!(
            *align(&original, &converted),
            [matched(0, AlignKey::Position), None]
        );
    }

    #[test]
    fn repeated_key_last_wins() {
        let original = [line(None, Some("1"), 0), line(None, Some("1"), 1)];
        let converted = [line(None, Some("1"), 0)];
        assert_eq!(*align(&original, &converted), [matched(1, AlignKey::Ordinal)]);
    }

    #[test]
    fn empty_original() {
        let converted = [line(Some("a"), Some("1"), 0)];
        assert_eq!(*align(&[], &converted), [None]);
    }
}
