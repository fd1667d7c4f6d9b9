//! Writing corrected segment texts back into a converted document.

use {
    crate::{
        IndexMap,
        document::{Document, DocumentParseError, Tags},
        validate::{NUM_SEGMENTS, ValidationReport},
    },
    derive_more::{Display, Error, From},
    tracing::debug,
};

/// Replacement segment texts, keyed by [line label].
///
/// [line label]: crate::document::VerseLine::label
pub type EditSet = IndexMap<String, Vec<String>>;

/// Edit cannot be applied to the document.
#[derive(Debug, Display, Error)]
pub enum EditError {
    /// Edit does not have one text per segment.
    #[display("edit for line {label:?} has {count} texts, expected 5")]
    SegmentCount {
        /// Line being edited.
        label: String,
        /// Number of texts in the edit.
        count: usize,
    },
    /// Line in the report no longer matches the document.
    #[display("line {label:?} at position {position} is not in the document")]
    Stale {
        /// Line being edited.
        label: String,
        /// Position of the line in the report.
        position: usize,
    },
}

/// Failed to replay edits.
#[derive(Debug, Display, Error, From)]
pub enum ReplayError {
    /// The document could not be parsed.
    #[display("failed to parse document")]
    Parse(DocumentParseError),
    /// An edit was invalid.
    #[display("invalid edit")]
    Edit(EditError),
}

/// Applies `edits` to the mismatched lines of `report` in `converted`.
///
/// Only lines which the report marks as mismatched are edited. For each of
/// these with an entry in `edits`, the text of every segment becomes exactly
/// the corresponding edit text. Everything else in the document stays
/// byte-for-byte the same.
///
/// # Errors
///
/// Errors if an edit for a mismatched line does not have exactly
/// [`NUM_SEGMENTS`] texts, or if the report does not describe `converted`.
pub fn replay(
    converted: &Document,
    report: &ValidationReport,
    edits: &EditSet,
    tags: &Tags,
) -> Result<Document, ReplayError> {
    let lines = converted.lines(tags)?;
    let mut splices = Vec::new();
    let mut num_edited = 0usize;
    for entry in report.mismatches() {
        let Some(texts) = edits.get(&entry.label) else {
            continue;
        };
        let texts = <&[String; NUM_SEGMENTS]>::try_from(texts.as_slice()).map_err(|_| {
            EditError::SegmentCount {
                label: entry.label.clone(),
                count: texts.len(),
            }
        })?;
        let line = lines
            .get(entry.position)
            .filter(|line| line.label() == entry.label && line.segments.len() == NUM_SEGMENTS)
            .ok_or_else(|| EditError::Stale {
                label: entry.label.clone(),
                position: entry.position,
            })?;

        for (segment, text) in line.segments.iter().zip(texts) {
            splices.extend(segment.replace_text(converted.as_str(), text));
        }
        num_edited += 1;
    }

    debug!("Replayed edits into {num_edited} lines");
    Ok(converted.splice(splices)?)
}
