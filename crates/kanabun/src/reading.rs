//! Selection of readings from analyzer tokens.

use crate::analyzer::Token;

/// Surface of the long iteration mark, which repeats the previous word.
pub const LONG_REPEAT_MARK: &str = "〳〵";

/// Feature value meaning "no value".
pub const EMPTY_FEATURE: &str = "*";

/// Picks the reading of a morpheme.
///
/// Analyzers give a surface form as its own "reading" for symbols and some
/// function words, or give no reading at all. In those cases the surface is
/// used.
///
/// # Examples
///
/// ```
/// # use kanabun::reading::pick_reading;
/// assert_eq!(pick_reading("春", Some("ハル")), "ハル");
/// assert_eq!(pick_reading("、", Some("*")), "、");
/// assert_eq!(pick_reading("の", Some("の")), "の");
/// assert_eq!(pick_reading("X", None), "X");
/// ```
#[must_use]
pub fn pick_reading<'a>(surface: &'a str, feature: Option<&'a str>) -> &'a str {
    match feature {
        Some(feature) if !feature.is_empty() && feature != EMPTY_FEATURE && feature != surface => {
            feature
        }
        _ => surface,
    }
}

/// Resolves the reading of every token, in order.
///
/// A [`LONG_REPEAT_MARK`] morpheme repeats the last resolved reading, if there
/// is one. Verbatim tokens are passed through and do not count as a previous
/// reading.
///
/// The readings are as the analyzer gives them, which is usually katakana.
#[must_use]
pub fn readings(tokens: &[Token]) -> Vec<String> {
    let mut prev_reading: Option<&str> = None;
    tokens
        .iter()
        .map(|token| match token {
            Token::Verbatim(line) => line.clone(),
            Token::Morpheme { surface, feature } => {
                if let Some(prev) = prev_reading.filter(|_| surface == LONG_REPEAT_MARK) {
                    return prev.to_owned();
                }
                let reading = pick_reading(surface, feature.as_deref());
                prev_reading = Some(reading);
                reading.to_owned()
            }
        })
        .collect()
}
