use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

/// Normalizes user-supplied text by stripping surrounding whitespace
/// and composing it into Unicode Normalization Form C.
///
/// ```
/// use tracker::normalization::normalize_text;
/// assert_eq!(normalize_text(" e\u{301} "), "\u{e9}");
/// ```
pub fn normalize_text(text: impl AsRef<str>) -> String {
    use unicode_normalization::UnicodeNormalization;

    text.as_ref().trim().nfc().collect()
}

/// Deserializes an optional `String` after running it through
/// `normalize_text`. Blank strings become `None`.
pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let o: Option<String> = Deserialize::deserialize(deserializer)?;

    Ok(o.map(normalize_text).filter(|s| !s.is_empty()))
}

/// Deserializes an optional identifier given either as a string or as
/// an integer. Blank strings become `None`.
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer identifier")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(IdVisitor)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            let v = v.trim();

            Ok(if v.is_empty() {
                None
            } else {
                Some(v.to_owned())
            })
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }
    }

    deserializer.deserialize_option(IdVisitor)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde::Deserialize;
    use unicode_normalization::is_nfc;

    use super::normalize_text;

    #[derive(Debug, Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "super::deserialize_id")]
        id: Option<String>,

        #[serde(default, deserialize_with = "super::deserialize_option")]
        name: Option<String>,
    }

    fn count_whitespace(s: impl AsRef<str>) -> usize {
        s.as_ref().chars().filter(|c| c.is_whitespace()).count()
    }

    #[test]
    fn ids_accept_strings_and_numbers() {
        let parse = |s: &str| serde_json::from_str::<Holder>(s).expect("parse holder").id;

        assert_eq!(parse(r#"{"id": "abc"}"#), Some("abc".to_owned()));
        assert_eq!(parse(r#"{"id": 1700000000000}"#), Some("1700000000000".to_owned()));
        assert_eq!(parse(r#"{"id": "  "}"#), None);
        assert_eq!(parse(r#"{"id": null}"#), None);
        assert_eq!(parse(r#"{}"#), None);

        assert!(serde_json::from_str::<Holder>(r#"{"id": [1]}"#).is_err());
    }

    #[test]
    fn blank_text_is_absent() {
        let holder: Holder = serde_json::from_str(r#"{"name": "   "}"#).expect("parse holder");

        assert_eq!(holder.name, None);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 1000, ..ProptestConfig::default()
        })]

        #[test]
        fn normalization_works(string in "(\\S.*\\S|\\S+)", space_before in "\\s*", space_after in "\\s*") {
            let normalized = normalize_text(format!("{}{}{}", space_before, string, space_after));

            prop_assert!(is_nfc(&normalized), "{:?} (normalized form of {:?}) is in NFC", normalized, string);

            prop_assert!(!normalized.starts_with(char::is_whitespace) && !normalized.ends_with(char::is_whitespace), "{:?} (normalized form of {:?}) has no leading or trailing whitespace", normalized, string);

            let trimmed = normalized.trim();

            prop_assert_eq!(count_whitespace(&normalized), count_whitespace(&trimmed), "{:?} (normalized form of {:?}) preserves inner whitespace", normalized, string);
        }
    }
}
