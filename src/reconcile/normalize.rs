//! Name normalization for comparison keys.
//!
//! Produces the canonical comparison form of a member name: never displayed,
//! never treated as identity on its own, only fed to the fuzzy matcher.
//! The function is total (no input fails) and idempotent
//! (`normalize_name(normalize_name(x)) == normalize_name(x)`).

use unicode_normalization::UnicodeNormalization;

/// Canonicalizes a name string for comparison.
///
/// Stages, in order: NFKD fold (fullwidth forms to ASCII, diacritics
/// decomposed), combining-mark strip, lowercase, script-confusable mapping
/// (Cyrillic/Greek lookalikes to their Latin representatives), edge
/// punctuation trim, internal whitespace collapse.
pub fn normalize_name(name: &str) -> String {
    let decomposed: String = name
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    let folded = decomposed.to_lowercase();
    let mapped: String = folded.chars().map(map_confusable).collect();

    let trimmed = mapped.trim_matches(|c: char| !c.is_alphanumeric());
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Combining diacritical marks left behind by NFKD decomposition.
/// Stripping this block is safe for Latin-script names; other scripts
/// pass through untouched.
fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}')
}

/// Maps characters that OCR and players both substitute for Latin letters.
/// Cyrillic and Greek homoglyphs are the common cases in alliance names.
fn map_confusable(c: char) -> char {
    match c {
        // Cyrillic lowercase lookalikes
        '\u{0430}' => 'a', // а
        '\u{0435}' => 'e', // е
        '\u{043E}' => 'o', // о
        '\u{0440}' => 'p', // р
        '\u{0441}' => 'c', // с
        '\u{0443}' => 'y', // у
        '\u{0445}' => 'x', // х
        '\u{043A}' => 'k', // к
        '\u{043C}' => 'm', // м
        '\u{0442}' => 't', // т
        '\u{0456}' => 'i', // і
        '\u{0455}' => 's', // ѕ
        '\u{0458}' => 'j', // ј
        // Greek lowercase lookalikes
        '\u{03BF}' => 'o', // ο
        '\u{03B1}' => 'a', // α
        '\u{03BD}' => 'v', // ν
        '\u{03C1}' => 'p', // ρ
        '\u{03C4}' => 't', // τ
        // Zero-width characters OCR occasionally emits
        '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}' => ' ',
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_trims() {
        assert_eq!(normalize_name("  DragonSlayer  "), "dragonslayer");
    }

    #[test]
    fn test_collapses_internal_whitespace() {
        assert_eq!(normalize_name("Dark   Lord\tOmega"), "dark lord omega");
    }

    #[test]
    fn test_strips_edge_punctuation() {
        assert_eq!(normalize_name("[TAG]Knight!"), "tag]knight");
        assert_eq!(normalize_name("~~~Rogue~~~"), "rogue");
    }

    #[test]
    fn test_strips_latin_diacritics() {
        assert_eq!(normalize_name("Çätàlin"), "catalin");
        assert_eq!(normalize_name("Müller"), "muller");
    }

    #[test]
    fn test_fullwidth_folds_to_ascii() {
        // Fullwidth forms common in CJK-locale screenshots
        assert_eq!(normalize_name("ＡＢＣ１２３"), "abc123");
    }

    #[test]
    fn test_cyrillic_homoglyphs_mapped() {
        // "сat" with Cyrillic es, "рower" with Cyrillic er
        assert_eq!(normalize_name("\u{0441}at"), "cat");
        assert_eq!(normalize_name("\u{0440}ower"), "power");
    }

    #[test]
    fn test_non_latin_scripts_pass_through() {
        assert_eq!(normalize_name("龍の騎士"), "龍の騎士");
        // Hangul decomposes to jamo under NFKD but stays stable
        let korean = normalize_name("남궁민수");
        assert_eq!(normalize_name(&korean), korean);
    }

    #[test]
    fn test_idempotent() {
        for input in [
            "DragonSlayer",
            "  Dark   Lord  ",
            "Çätàlin",
            "[TAG]Knight!",
            "ＡＢＣ",
            "\u{0441}\u{0430}t",
            "龍の騎士",
            "###",
            "",
        ] {
            let once = normalize_name(input);
            assert_eq!(normalize_name(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_total_on_degenerate_input() {
        // Worst cases reduce to the empty string rather than failing
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("###@@@"), "");
        assert_eq!(normalize_name("   "), "");
    }
}
