//! Japanese-specific items.

/// Offset between a katakana code point and its hiragana counterpart.
const KANA_OFFSET: u32 = 0x60;

/// Checks if the given character is in the hiragana block.
///
/// This is the block used for counting [morae], so it includes the iteration
/// marks `ゝ` and `ゞ`.
///
/// # Examples
///
/// ```
/// # use kanabun::lang::jpn::is_hiragana;
/// assert!(is_hiragana('あ'));
/// assert!(is_hiragana('ん'));
/// assert!(is_hiragana('ゝ'));
/// assert!(!is_hiragana('ア'));
/// assert!(!is_hiragana('A'));
/// ```
///
/// [morae]: https://en.wikipedia.org/wiki/Mora_(linguistics)
#[must_use]
pub fn is_hiragana(c: char) -> bool {
    ('\u{3040}'..='\u{309F}').contains(&c)
}

/// Checks if the given character is a hiragana syllable, excluding iteration
/// marks, voicing diacritics and unassigned code points.
///
/// # Examples
///
/// ```
/// # use kanabun::lang::jpn::is_hiragana_syllable;
/// assert!(is_hiragana_syllable('か'));
/// assert!(is_hiragana_syllable('ゖ'));
/// assert!(!is_hiragana_syllable('ゝ'));
/// assert!(!is_hiragana_syllable('カ'));
/// ```
#[must_use]
pub fn is_hiragana_syllable(c: char) -> bool {
    ('\u{3041}'..='\u{3096}').contains(&c)
}

/// Checks if the given character is a katakana syllable, excluding iteration
/// marks and the prolonged sound mark.
///
/// # Examples
///
/// ```
/// # use kanabun::lang::jpn::is_katakana_syllable;
/// assert!(is_katakana_syllable('ア'));
/// assert!(is_katakana_syllable('ヺ'));
/// assert!(!is_katakana_syllable('ヽ'));
/// assert!(!is_katakana_syllable('あ'));
/// ```
#[must_use]
pub fn is_katakana_syllable(c: char) -> bool {
    ('\u{30A1}'..='\u{30FA}').contains(&c)
}

/// Converts katakana characters to hiragana characters.
///
/// Only `ァ` to `ヶ` have a hiragana counterpart; every other character is left
/// unchanged.
///
/// # Examples
///
/// ```
/// # use kanabun::lang::jpn::katakana_to_hiragana;
/// assert_eq!(katakana_to_hiragana("カタカナ"), "かたかな");
/// assert_eq!(katakana_to_hiragana("ひらがな"), "ひらがな");
/// assert_eq!(katakana_to_hiragana("ミックス文字"), "みっくす文字");
/// assert_eq!(katakana_to_hiragana("ヷー"), "ヷー");
/// ```
#[must_use]
pub fn katakana_to_hiragana(s: &str) -> String {
    s.chars()
        .map(|c| {
            if ('\u{30A1}'..='\u{30F6}').contains(&c) {
                char::from_u32(c as u32 - KANA_OFFSET).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

/// Converts hiragana characters to katakana characters.
///
/// The inverse of [`katakana_to_hiragana`] over `ぁ` to `ゖ`.
///
/// # Examples
///
/// ```
/// # use kanabun::lang::jpn::hiragana_to_katakana;
/// assert_eq!(hiragana_to_katakana("ひらがな"), "ヒラガナ");
/// assert_eq!(hiragana_to_katakana("かゝみ"), "カゝミ");
/// assert_eq!(hiragana_to_katakana("和歌"), "和歌");
/// ```
#[must_use]
pub fn hiragana_to_katakana(s: &str) -> String {
    s.chars()
        .map(|c| {
            if is_hiragana_syllable(c) {
                char::from_u32(c as u32 + KANA_OFFSET).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

/// Gets the voiced ([dakuten]) form of a kana, if it has one.
///
/// [dakuten]: https://en.wikipedia.org/wiki/Dakuten_and_handakuten
#[must_use]
#[rustfmt::skip]
pub const fn voiced(c: char) -> Option<char> {
    Some(match c {
        'か' => 'が', 'き' => 'ぎ', 'く' => 'ぐ', 'け' => 'げ', 'こ' => 'ご',
        'さ' => 'ざ', 'し' => 'じ', 'す' => 'ず', 'せ' => 'ぜ', 'そ' => 'ぞ',
        'た' => 'だ', 'ち' => 'ぢ', 'つ' => 'づ', 'て' => 'で', 'と' => 'ど',
        'は' => 'ば', 'ひ' => 'び', 'ふ' => 'ぶ', 'へ' => 'べ', 'ほ' => 'ぼ',
        'う' => 'ゔ',
        'カ' => 'ガ', 'キ' => 'ギ', 'ク' => 'グ', 'ケ' => 'ゲ', 'コ' => 'ゴ',
        'サ' => 'ザ', 'シ' => 'ジ', 'ス' => 'ズ', 'セ' => 'ゼ', 'ソ' => 'ゾ',
        'タ' => 'ダ', 'チ' => 'ヂ', 'ツ' => 'ヅ', 'テ' => 'デ', 'ト' => 'ド',
        'ハ' => 'バ', 'ヒ' => 'ビ', 'フ' => 'ブ', 'ヘ' => 'ベ', 'ホ' => 'ボ',
        'ウ' => 'ヴ',
        _ => return None,
    })
}

/// Counts the [morae] of a hiragana reading.
///
/// Every character in the hiragana block counts as one mora, including small
/// kana, so `きょう` counts as 3. Characters outside the block are not counted.
///
/// [morae]: https://en.wikipedia.org/wiki/Mora_(linguistics)
#[must_use]
pub fn count_morae(reading: &str) -> usize {
    reading.chars().filter(|c| is_hiragana(*c)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kana_round_trip() {
        let hiragana = ('\u{3041}'..='\u{3096}').collect::<String>();
        let katakana = ('\u{30A1}'..='\u{30F6}').collect::<String>();
        assert_eq!(hiragana_to_katakana(&hiragana), katakana);
        assert_eq!(katakana_to_hiragana(&katakana), hiragana);
        assert_eq!(katakana_to_hiragana(&hiragana_to_katakana(&hiragana)), hiragana);
        assert_eq!(hiragana_to_katakana(&katakana_to_hiragana(&katakana)), katakana);
    }

    #[test]
    fn outside_ranges_unchanged() {
        assert_eq!(katakana_to_hiragana("ヽヾーヷ漢A"), "ヽヾーヷ漢A");
        assert_eq!(hiragana_to_katakana("ゝゞ゛漢A"), "ゝゞ゛漢A");
    }

    #[test]
    fn voicing() {
        assert_eq!(voiced('か'), Some('が'));
        assert_eq!(voiced('う'), Some('ゔ'));
        assert_eq!(voiced('ホ'), Some('ボ'));
        assert_eq!(voiced('あ'), None);
        assert_eq!(voiced('が'), None);
    }

    #[test]
    fn morae() {
        assert_eq!(count_morae("あしひきの"), 5);
        assert_eq!(count_morae("きょう"), 3);
        assert_eq!(count_morae("さっそく"), 4);
        assert_eq!(count_morae("やま どり"), 4);
        assert_eq!(count_morae("カナ"), 0);
        assert_eq!(count_morae(""), 0);
    }
}
