//! Phonetic normalizer: transcript text → lowercase romanized token string
//!
//! ASCII input is taken as already phonetic (e.g. "zuo", "next").
//! Anything else is transliterated: Han → toneless pinyin, other scripts →
//! compatibility decomposition with combining marks dropped.

use lazy_static::lazy_static;
use pinyin::ToPinyin;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    /// Whitespace and punctuation, removed before matching
    static ref RE_SEPARATORS: Regex = Regex::new(r"[\s\p{P}]+").unwrap();

    /// Anything left over after transliteration that is not a Latin letter
    static ref RE_NON_LETTER: Regex = Regex::new(r"[^a-z]+").unwrap();
}

/// Normalize raw transcript text into a comparable phonetic string.
///
/// Never fails; characters with no romanization are dropped.
pub fn to_phonetic(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let lower = trimmed.to_lowercase();
    let cleaned = RE_SEPARATORS.replace_all(&lower, "");

    if trimmed.is_ascii() {
        return cleaned.into_owned();
    }

    let mut latin = String::with_capacity(cleaned.len() * 3);
    for c in cleaned.chars() {
        if c.is_ascii() {
            latin.push(c);
        } else if let Some(py) = c.to_pinyin() {
            // plain() keeps ü (lü, nü)
            latin.extend(strip_marks(py.plain().chars()));
        } else {
            latin.extend(strip_marks(std::iter::once(c)));
        }
    }

    RE_NON_LETTER.replace_all(&latin, "").into_owned()
}

/// Compatibility decomposition, combining marks dropped, lowercased
fn strip_marks(chars: impl Iterator<Item = char>) -> impl Iterator<Item = char> {
    chars
        .nfkd()
        .filter(|d| !is_combining_mark(*d))
        .flat_map(char::to_lowercase)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_input() {
        assert_eq!(to_phonetic(""), "");
        assert_eq!(to_phonetic("   \n"), "");
    }

    #[test]
    fn test_single_directions() {
        assert_eq!(to_phonetic("上"), "shang");
        assert_eq!(to_phonetic("下"), "xia");
        assert_eq!(to_phonetic("左"), "zuo");
        assert_eq!(to_phonetic("右"), "you");
    }

    #[test]
    fn test_sentence_with_punctuation() {
        assert_eq!(to_phonetic("上，继续。下！"), "shangjixuxia");
    }

    #[test]
    fn test_ascii_is_already_phonetic() {
        assert_eq!(to_phonetic("  Zuo, YOU! "), "zuoyou");
        assert_eq!(to_phonetic("next"), "next");
    }

    #[test]
    fn test_mixed_script_keeps_latin() {
        assert_eq!(to_phonetic("上x下"), "shangxxia");
        assert_eq!(to_phonetic("x上"), "xshang");
    }

    #[test]
    fn test_diacritics_stripped() {
        assert_eq!(to_phonetic("jìxù"), "jixu");
        assert_eq!(to_phonetic("Café 上"), "cafeshang");
    }

    #[test]
    fn test_pinyin_umlaut_folds_to_u() {
        assert_eq!(to_phonetic("绿"), "lu");
        assert_eq!(to_phonetic("女"), "nu");
    }

    #[test]
    fn test_unromanizable_dropped() {
        assert_eq!(to_phonetic("上😀"), "shang");
        assert_eq!(to_phonetic("上 123"), "shang");
    }

    #[test]
    fn test_determinism() {
        let text = "上继续下继续左继续右";
        assert_eq!(to_phonetic(text), to_phonetic(text));
    }

}
