//! Text normalization applied before prompt construction.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Full normalization: NFKD, strip diacritics, lowercase, turn punctuation and
/// symbols into spaces, drop control characters, collapse whitespace.
///
/// Total and idempotent: `normalize(&normalize(t)) == normalize(t)`.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        // Lowercasing can reintroduce a mark ('İ' -> 'i' + U+0307).
        .filter(|c| !is_combining_mark(*c))
        .filter_map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                Some(c)
            } else if c.is_control() {
                None
            } else {
                Some(' ')
            }
        })
        .collect();

    collapse_spaces(&folded)
}

/// Collapses every whitespace run to a single space and trims both ends.
/// Case and accents are preserved.
pub fn collapse_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "   ",
        "Ontem às 14h, no escritório de São Paulo, houve uma falha no servidor principal.",
        "AÇÃO   IMEDIATA\t\nNECESSÁRIA!!!",
        "İstanbul ofisinde ŞİDDETLİ arıza",
        "ﬁ ligature ℌ and ① circled",
        "Straße — «Zürich» 2025-08-12",
        "emoji 🔥 e\u{0301}",
    ];

    #[test]
    fn test_lowercases_and_strips_diacritics() {
        assert_eq!(
            normalize("Ontem às 14h, no escritório de São Paulo"),
            "ontem as 14h no escritorio de sao paulo"
        );
    }

    #[test]
    fn test_punctuation_becomes_space() {
        assert_eq!(normalize("falha: servidor/rede (crítica)."), "falha servidor rede critica");
    }

    #[test]
    fn test_collapses_and_trims_whitespace() {
        assert_eq!(normalize("  a \t\n  b  "), "a b");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for sample in SAMPLES {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn test_collapse_spaces_preserves_case_and_accents() {
        assert_eq!(collapse_spaces("  São   Paulo\n\tCentro "), "São Paulo Centro");
    }

    #[test]
    fn test_collapse_spaces_is_idempotent() {
        for sample in SAMPLES {
            let once = collapse_spaces(sample);
            assert_eq!(collapse_spaces(&once), once);
        }
    }
}
