//! Resolution of iteration marks (*odoriji*).
//!
//! Verse text often writes a repeated syllable as `ゝ`/`ヽ`, or as `ゞ`/`ヾ` when
//! the repetition is voiced. These are resolved twice during conversion:
//!
//! - the [pre-pass](Pass::Pre) runs before the text reaches the analyzer, so the
//!   analyzer sees real syllables instead of an unknown symbol
//! - the [post-pass](Pass::Post) runs over the normalized kana output, catching
//!   marks that the analyzer passed through untouched
//!
//! A mark is only resolved if the character before it is one the pass accepts.
//! Otherwise it is left as-is.

use crate::lang::jpn::{is_hiragana_syllable, is_katakana_syllable, voiced};

/// Kind of iteration mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    /// `ゝ` or `ヽ`: repeat the previous character.
    Repeat,
    /// `ゞ` or `ヾ`: repeat the previous character with voicing.
    VoicedRepeat,
}

impl Mark {
    /// Classifies a character as an iteration mark.
    #[must_use]
    pub const fn of(c: char) -> Option<Self> {
        match c {
            'ゝ' | 'ヽ' => Some(Self::Repeat),
            'ゞ' | 'ヾ' => Some(Self::VoicedRepeat),
            _ => None,
        }
    }
}

/// Which of the two expansion passes is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Before analysis. Only hiragana may be repeated.
    Pre,
    /// After kana normalization. Hiragana or katakana may be repeated.
    Post,
}

impl Pass {
    fn accepts(self, prev: char) -> bool {
        match self {
            Self::Pre => is_hiragana_syllable(prev),
            Self::Post => is_hiragana_syllable(prev) || is_katakana_syllable(prev),
        }
    }
}

/// Stateful expander holding the "last real character" register.
///
/// Feed characters in document order with [`Expander::push`]. Characters which
/// should be rewritten but must not affect the register (for example text in
/// an alternate reading) go through [`Expander::peek`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expander {
    pass: Pass,
    last: Option<char>,
}

impl Expander {
    /// Creates an expander with an empty register.
    #[must_use]
    pub const fn new(pass: Pass) -> Self {
        Self { pass, last: None }
    }

    /// Empties the register.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Rewrites a single character and updates the register.
    pub fn push(&mut self, c: char) -> char {
        let Some(mark) = Mark::of(c) else {
            self.last = Some(c);
            return c;
        };
        let Some(prev) = self.last.filter(|prev| self.pass.accepts(*prev)) else {
            return c;
        };
        match mark {
            Mark::Repeat => prev,
            Mark::VoicedRepeat => {
                let voiced = voiced(prev).unwrap_or(prev);
                // chained voiced marks build on the voiced result
                self.last = Some(voiced);
                voiced
            }
        }
    }

    /// Rewrites a single character without touching the register.
    #[must_use]
    pub fn peek(&self, c: char) -> char {
        let mut scratch = *self;
        scratch.push(c)
    }

    /// Rewrites every character of `text` in order, updating the register.
    pub fn push_str(&mut self, text: &str) -> String {
        text.chars().map(|c| self.push(c)).collect()
    }

    /// Rewrites every character of `text` against the current register, without
    /// updating it.
    #[must_use]
    pub fn peek_str(&self, text: &str) -> String {
        text.chars().map(|c| self.peek(c)).collect()
    }
}

/// Runs the pre-analysis pass over a flat string.
///
/// # Examples
///
/// ```
/// # use kanabun::odoriji::pre_expand;
/// assert_eq!(pre_expand("かゞ"), "かが");
/// assert_eq!(pre_expand("Xゞ"), "Xゞ");
/// assert_eq!(pre_expand("こゝろ"), "こころ");
/// ```
#[must_use]
pub fn pre_expand(text: &str) -> String {
    Expander::new(Pass::Pre).push_str(text)
}

/// Runs the post-normalization pass over a flat string.
///
/// # Examples
///
/// ```
/// # use kanabun::odoriji::post_expand;
/// assert_eq!(post_expand("ススヽ"), "ススス");
/// assert_eq!(post_expand("ゝあ"), "ゝあ");
/// ```
#[must_use]
pub fn post_expand(text: &str) -> String {
    Expander::new(Pass::Post).push_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat() {
        assert_eq!(pre_expand("いすゝ"), "いすす");
        assert_eq!(pre_expand("いすヽ"), "いすす");
        assert_eq!(pre_expand("ほのほのと"), "ほのほのと");
    }

    #[test]
    fn voiced_repeat() {
        assert_eq!(pre_expand("かゞ"), "かが");
        assert_eq!(pre_expand("うゞ"), "うゔ");
        assert_eq!(pre_expand("しゞま"), "しじま");
        // no voiced form; repeats as-is
        assert_eq!(pre_expand("あゞ"), "ああ");
    }

    #[test]
    fn voiced_chain_compounds() {
        assert_eq!(pre_expand("かゞゝ"), "かがが");
        assert_eq!(pre_expand("かゞゞ"), "かがが");
    }

    #[test]
    fn unresolved_marks() {
        assert_eq!(pre_expand("ゝ"), "ゝ");
        assert_eq!(pre_expand("ゞあ"), "ゞあ");
        assert_eq!(pre_expand("Xゞ"), "Xゞ");
        assert_eq!(pre_expand("人ゝ"), "人ゝ");
        // the pre-pass only repeats hiragana
        assert_eq!(pre_expand("カゝ"), "カゝ");
        assert_eq!(post_expand("カゝ"), "カカ");
        assert_eq!(post_expand("カヾ"), "カガ");
        assert_eq!(post_expand("人ゝ"), "人ゝ");
    }

    #[test]
    fn idempotent() {
        for text in ["かゞゝ", "Xゞかゝ", "ゝゝあ", "カヾヽ", "こゝろ人ゞ", ""] {
            let once = pre_expand(text);
            assert_eq!(pre_expand(&once), once, "pre {text:?}");
            let once = post_expand(text);
            assert_eq!(post_expand(&once), once, "post {text:?}");
        }
    }

    #[test]
    fn peek_keeps_register() {
        let mut expander = Expander::new(Pass::Pre);
        expander.push('た');
        assert_eq!(expander.peek_str("かゝ"), "かた");
        assert_eq!(expander.push('ゝ'), 'た');
        expander.reset();
        assert_eq!(expander.push('ゝ'), 'ゝ');
    }
}
