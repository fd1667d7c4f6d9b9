//! Checking converted verse lines against the waka mora pattern.

use {
    crate::{
        Engine,
        align::{LineMatch, align},
        analyzer::AnalyzeError,
        convert::{ConvertError, Pipeline},
        document::{Document, Segment, VerseLine},
        lang::jpn::count_morae,
    },
    serde::Serialize,
    tracing::debug,
};

/// Number of segments in a waka line.
pub const NUM_SEGMENTS: usize = 5;

/// Morae expected in each segment of a waka line.
pub const EXPECTED_MORAE: [usize; NUM_SEGMENTS] = [5, 7, 5, 7, 7];

/// Outcome of validating every line of a converted document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// One entry per converted line, in document order.
    pub lines: Vec<LineReport>,
}

impl ValidationReport {
    /// Lines whose mora counts do not match.
    pub fn mismatches(&self) -> impl Iterator<Item = &LineReport> {
        self.lines
            .iter()
            .filter(|line| matches!(line.status, LineStatus::Mismatch { .. }))
    }

    /// Lines which do not have the right number of segments.
    pub fn structural_errors(&self) -> impl Iterator<Item = &LineReport> {
        self.lines
            .iter()
            .filter(|line| matches!(line.status, LineStatus::StructuralError { .. }))
    }

    /// Checks if every line is [`LineStatus::Valid`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lines
            .iter()
            .all(|line| matches!(line.status, LineStatus::Valid { .. }))
    }
}

/// Validation outcome of a single converted line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineReport {
    /// See [`VerseLine::label`].
    pub label: String,
    /// See [`VerseLine::identity`].
    pub identity: Option<String>,
    /// See [`VerseLine::ordinal`].
    pub ordinal: Option<String>,
    /// See [`VerseLine::position`].
    pub position: usize,
    /// See [`VerseLine::source_line`].
    pub source_line: u32,
    /// Original line which this line was matched to.
    pub aligned: Option<LineMatch>,
    /// Result of the check.
    #[serde(flatten)]
    pub status: LineStatus,
}

/// Result of checking a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LineStatus {
    /// The line does not have [`NUM_SEGMENTS`] segments, so morae were not
    /// counted.
    StructuralError {
        /// Number of segments found.
        segment_count: usize,
        /// Whole text of the line.
        text: String,
    },
    /// The line has the right segments, but some have the wrong number of
    /// morae.
    Mismatch {
        /// Morae counted in each segment.
        counts: [usize; NUM_SEGMENTS],
        /// Indices of segments whose count differs from [`EXPECTED_MORAE`].
        diverging: Vec<usize>,
        /// Text of each segment.
        segments: Vec<String>,
        /// Markup of the segments of the matching original line.
        original_markup: Option<String>,
    },
    /// Every segment has the expected number of morae.
    Valid {
        /// Morae counted in each segment.
        counts: [usize; NUM_SEGMENTS],
    },
}

impl Engine {
    /// Validates every line of `converted`, using `original` for context.
    ///
    /// # Errors
    ///
    /// Errors if either document cannot be parsed, or if the analyzer fails.
    pub fn validate(
        &self,
        original: &Document,
        converted: &Document,
    ) -> Result<ValidationReport, ConvertError> {
        let tags = self.config.tags();
        let original_lines = original.lines(&tags)?;
        let converted_lines = converted.lines(&tags)?;
        let alignment = align(&original_lines, &converted_lines);
        let pipeline = self.counting_pipeline();

        let lines = converted_lines
            .iter()
            .zip(alignment.iter())
            .map(|(line, aligned)| {
                let original = aligned.map(|aligned| &original_lines[aligned.original]);
                let status = self.check_line(line, original, pipeline)?;
                Ok(LineReport {
                    label: line.label(),
                    identity: line.identity.clone(),
                    ordinal: line.ordinal.clone(),
                    position: line.position,
                    source_line: line.source_line,
                    aligned: *aligned,
                    status,
                })
            })
            .collect::<Result<Vec<_>, AnalyzeError>>()?;

        let report = ValidationReport { lines };
        debug!(
            "Validated {} lines: {} mismatched, {} malformed",
            report.lines.len(),
            report.mismatches().count(),
            report.structural_errors().count()
        );
        Ok(report)
    }

    /// Checks a single converted line.
    ///
    /// # Errors
    ///
    /// Errors if the analyzer fails.
    pub fn check_line(
        &self,
        line: &VerseLine,
        original: Option<&VerseLine>,
        pipeline: Pipeline,
    ) -> Result<LineStatus, AnalyzeError> {
        let Ok(segments) = <&[Segment; NUM_SEGMENTS]>::try_from(line.segments.as_slice()) else {
            debug!(
                "Line {:?} has {} segments, skipping",
                line.label(),
                line.segments.len()
            );
            return Ok(LineStatus::StructuralError {
                segment_count: line.segments.len(),
                text: line.text.clone(),
            });
        };

        let mut counts = [0; NUM_SEGMENTS];
        for (count, segment) in counts.iter_mut().zip(segments) {
            *count = self.count_morae(&segment.text, pipeline)?;
        }

        let diverging = diverging(&counts);
        if diverging.is_empty() {
            return Ok(LineStatus::Valid { counts });
        }
        Ok(LineStatus::Mismatch {
            counts,
            diverging,
            segments: segments.iter().map(|segment| segment.text.clone()).collect(),
            original_markup: original
                .filter(|original| !original.segments.is_empty())
                .map(VerseLine::segment_markup),
        })
    }

    /// Counts the morae in `text` after converting it with `pipeline`.
    ///
    /// # Errors
    ///
    /// Errors if the analyzer fails.
    pub fn count_morae(&self, text: &str, pipeline: Pipeline) -> Result<usize, AnalyzeError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(0);
        }
        let hiragana = self.convert_with(text, pipeline)?;
        Ok(count_morae(&hiragana))
    }
}

/// Indices of the segments whose count differs from [`EXPECTED_MORAE`].
#[must_use]
pub fn diverging(counts: &[usize; NUM_SEGMENTS]) -> Vec<usize> {
    counts
        .iter()
        .zip(EXPECTED_MORAE)
        .enumerate()
        .filter(|(_, (count, expected))| **count != *expected)
        .map(|(index, _)| index)
        .collect()
}
