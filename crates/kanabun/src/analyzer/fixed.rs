use {
    super::{AnalyzeError, Analyzer, Token},
    foldhash::HashMap,
};

/// Analyzer which looks morphemes up in a fixed table.
///
/// Text is segmented greedily by the longest surface in the table. Characters
/// not covered by any entry become single-character morphemes whose feature is
/// the surface itself, the same as MeCab's unknown-word output. Whitespace is
/// skipped, as MeCab does.
///
/// Useful for tests and for running the pipeline without a dictionary.
///
/// # Examples
///
/// ```
/// # use kanabun::analyzer::{Analyzer, StaticAnalyzer, Token};
/// let analyzer = StaticAnalyzer::default()
///     .with("春", "ハル")
///     .with("春日", "カスガ");
/// assert_eq!(
///     analyzer.analyze("春日の春").unwrap(),
///     [
///         Token::morpheme("春日", "カスガ"),
///         Token::morpheme("の", "の"),
///         Token::morpheme("春", "ハル"),
///     ]
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticAnalyzer {
    entries: HashMap<String, String>,
    max_chars: usize,
}

impl StaticAnalyzer {
    /// Adds an entry to the table.
    pub fn insert(&mut self, surface: impl Into<String>, feature: impl Into<String>) {
        let surface = surface.into();
        self.max_chars = self.max_chars.max(surface.chars().count());
        self.entries.insert(surface, feature.into());
    }

    /// Adds an entry to the table, builder-style.
    #[must_use]
    pub fn with(mut self, surface: impl Into<String>, feature: impl Into<String>) -> Self {
        self.insert(surface, feature);
        self
    }
}

impl<S: Into<String>, F: Into<String>> FromIterator<(S, F)> for StaticAnalyzer {
    fn from_iter<T: IntoIterator<Item = (S, F)>>(iter: T) -> Self {
        let mut analyzer = Self::default();
        for (surface, feature) in iter {
            analyzer.insert(surface, feature);
        }
        analyzer
    }
}

impl Analyzer for StaticAnalyzer {
    fn analyze(&self, text: &str) -> Result<Vec<Token>, AnalyzeError> {
        let chars = text.chars().collect::<Vec<_>>();
        let mut tokens = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            if chars[start].is_whitespace() {
                start += 1;
                continue;
            }

            let longest = (1..=self.max_chars.min(chars.len() - start))
                .rev()
                .find_map(|len| {
                    let surface = chars[start..start + len].iter().collect::<String>();
                    let feature = self.entries.get(&surface)?;
                    Some((len, Token::morpheme(surface, feature.clone())))
                });
            let (len, token) = longest.unwrap_or_else(|| {
                let surface = chars[start].to_string();
                (1, Token::morpheme(surface.clone(), surface))
            });
            tokens.push(token);
            start += len;
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_and_whitespace() {
        let analyzer = StaticAnalyzer::from_iter([("山", "ヤマ")]);
        assert_eq!(
            analyzer.analyze("山 X").unwrap(),
            [Token::morpheme("山", "ヤマ"), Token::morpheme("X", "X")]
        );
        assert_eq!(analyzer.analyze("").unwrap(), Vec::<Token>::new());
    }
}
