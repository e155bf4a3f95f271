use serde::{Deserialize, Deserializer};

/// Normalizes a search term by stripping surrounding whitespace and
/// folding it into Unicode Normalization Form KC, so that full-width
/// input such as `Ｔｏｋｙｏ` compares equal to `Tokyo`.
///
/// ```
/// use goshuin::normalization::normalize_term;
/// assert_eq!(normalize_term(" Ｔｏｋｙｏ "), "Tokyo");
/// ```
pub fn normalize_term(term: impl AsRef<str>) -> String {
    use unicode_normalization::UnicodeNormalization;

    term.as_ref().trim().nfkc().collect()
}

/// Normalizes a term and lowercases it for case-insensitive comparison.
pub fn fold(term: impl AsRef<str>) -> String {
    normalize_term(term).to_lowercase()
}

/// Deserializes an optional string, treating blank values as absent.
pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let o: Option<String> = Deserialize::deserialize(deserializer)?;
    Ok(o.and_then(|s| if s.trim().is_empty() { None } else { Some(s) }))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use unicode_normalization::is_nfkc;

    use super::{fold, normalize_term};

    fn count_whitespace(s: impl AsRef<str>) -> usize {
        s.as_ref().chars().filter(|c| c.is_whitespace()).count()
    }

    #[test]
    fn folding_ignores_width_and_case() {
        assert_eq!(fold("ＴＯＫＹＯ"), "tokyo");
        assert_eq!(fold("  Kyoto\t"), "kyoto");
        assert_eq!(fold("東京都"), "東京都");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 2000, ..ProptestConfig::default()
        })]

        #[test]
        fn normalization_works(string in "[a-zA-Z0-9東京都ＡＢＣ]([a-zA-Z0-9 東京都ＡＢＣ]*[a-zA-Z0-9東京都ＡＢＣ])?", space_before in "[ \t]*", space_after in "[ \t]*") {
            let normalized = normalize_term(format!("{}{}{}", space_before, string, space_after));

            prop_assert!(is_nfkc(&normalized), "{:?} (normalized form of {:?}) is in NFKC", normalized, string);

            prop_assert!(!normalized.starts_with(char::is_whitespace) && !normalized.ends_with(char::is_whitespace), "{:?} (normalized form of {:?}) has no leading or trailing whitespace", normalized, string);

            prop_assert_eq!(count_whitespace(&normalized), count_whitespace(&string), "{:?} (normalized form of {:?}) preserves inner whitespace", normalized, string);
        }
    }
}
