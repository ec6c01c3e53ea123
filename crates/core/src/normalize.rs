//! Conversion of raw OMDb strings into typed values.
//!
//! OMDb reports every field as a string and uses `"N/A"` for anything it does
//! not know. All helpers here are total: unparseable input yields `None`,
//! never an error, so one bad field cannot fail a whole fetch.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Value the catalog uses for unknown fields.
pub const MISSING_SENTINEL: &str = "N/A";

/// Date layouts seen in `Released` fields, most common first.
const DATE_FORMATS: &[&str] = &["%d %b %Y", "%d %B %Y", "%Y-%m-%d", "%b %d, %Y", "%m/%d/%Y"];

static NAME_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)\s*[\(\[](\d{4})[\)\]]\s*$").unwrap());

/// Whether a raw value is the catalog's "missing" marker (any letter case).
pub fn is_sentinel(value: &str) -> bool {
    value.eq_ignore_ascii_case(MISSING_SENTINEL)
}

/// Replace every sentinel string in a JSON payload with `null`.
///
/// Applied to the whole document before typed decoding so no field ever
/// surfaces the literal marker.
pub fn strip_sentinels(value: &mut Value) {
    match value {
        Value::String(s) if is_sentinel(s) => *value = Value::Null,
        Value::Array(items) => items.iter_mut().for_each(strip_sentinels),
        Value::Object(map) => map.values_mut().for_each(strip_sentinels),
        _ => {}
    }
}

/// Decode a raw catalog payload with sentinels removed.
pub fn decode_document<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, serde_json::Error> {
    let mut value: Value = serde_json::from_slice(bytes)?;
    strip_sentinels(&mut value);
    T::deserialize(value)
}

/// Trimmed, non-blank, non-sentinel text.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !is_sentinel(v))
}

/// Year from the first four characters (`"1999–2004"` gives 1999).
///
/// Values shorter than four characters are not years.
pub fn parse_year(raw: &str) -> Option<i32> {
    let head: String = raw.trim().chars().take(4).collect();
    if head.chars().count() < 4 {
        return None;
    }
    head.parse::<i32>().ok().filter(|year| *year >= 0)
}

/// A percentage such as `"87%"`.
pub fn parse_percent(raw: &str) -> Option<f32> {
    parse_float(raw.trim().trim_end_matches('%'))
}

/// Culture-invariant float; negative and non-finite values are rejected.
pub fn parse_float(raw: &str) -> Option<f32> {
    raw.trim()
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Integer count with optional thousands separators (`"2,345,678"`).
pub fn parse_count(raw: &str) -> Option<u64> {
    let digits: String = raw.trim().chars().filter(|c| *c != ',').collect();
    digits.parse().ok()
}

/// Best-effort calendar date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

/// Comma-separated list, trimmed, empties dropped, order kept.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split `"Title (1999)"` into its name and embedded year.
pub fn parse_name_year(raw: &str) -> (String, Option<i32>) {
    let trimmed = raw.trim();
    match NAME_YEAR_RE.captures(trimmed) {
        Some(caps) => {
            let name = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            if name.is_empty() {
                return (trimmed.to_string(), None);
            }
            let year = caps.get(2).and_then(|m| m.as_str().parse().ok());
            (name.to_string(), year)
        }
        None => (trimmed.to_string(), None),
    }
}

/// Accepts `1`, `"1"`, `""` or `null` for numeric catalog fields.
pub(crate) fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_sentinels_any_case_and_depth() {
        let mut value = json!({
            "Title": "Inception",
            "Rated": "N/A",
            "Website": "n/a",
            "Ratings": [{"Source": "Metacritic", "Value": "N/A"}],
        });
        strip_sentinels(&mut value);
        assert_eq!(value["Title"], "Inception");
        assert!(value["Rated"].is_null());
        assert!(value["Website"].is_null());
        assert!(value["Ratings"][0]["Value"].is_null());
        assert_eq!(value["Ratings"][0]["Source"], "Metacritic");
    }

    #[test]
    fn test_strip_sentinels_exact_match_only() {
        let mut value = json!({"Plot": "N/A for now", "Score": "N/A%"});
        strip_sentinels(&mut value);
        assert_eq!(value["Plot"], "N/A for now");
        assert_eq!(value["Score"], "N/A%");
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("2010"), Some(2010));
        assert_eq!(parse_year("1999–2004"), Some(1999));
        assert_eq!(parse_year("2008–"), Some(2008));
        assert_eq!(parse_year("N/A"), None);
        assert_eq!(parse_year(""), None);
        assert_eq!(parse_year("-199"), None);
        assert_eq!(parse_year("99"), None);
        assert_eq!(parse_year(" 201 "), None);
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent("87%"), Some(87.0));
        assert_eq!(parse_percent("100"), Some(100.0));
        assert_eq!(parse_percent("%"), None);
        assert_eq!(parse_percent("N/A%"), None);
        assert_eq!(parse_percent("-5%"), None);
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float("8.8"), Some(8.8));
        assert_eq!(parse_float(" 7 "), Some(7.0));
        assert_eq!(parse_float("-1.0"), None);
        assert_eq!(parse_float("NaN"), None);
        assert_eq!(parse_float("abc"), None);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("2,345,678"), Some(2_345_678));
        assert_eq!(parse_count("12"), Some(12));
        assert_eq!(parse_count("-3"), None);
        assert_eq!(parse_count(""), None);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("16 Jul 2010"),
            NaiveDate::from_ymd_opt(2010, 7, 16)
        );
        assert_eq!(
            parse_date("2010-07-16"),
            NaiveDate::from_ymd_opt(2010, 7, 16)
        );
        assert_eq!(parse_date("sometime in 2010"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list("Action, Adventure,, Sci-Fi ,"),
            vec!["Action", "Adventure", "Sci-Fi"]
        );
        assert!(split_list(" , ").is_empty());
    }

    #[test]
    fn test_parse_name_year() {
        assert_eq!(
            parse_name_year("The Matrix (1999)"),
            ("The Matrix".to_string(), Some(1999))
        );
        assert_eq!(
            parse_name_year("Heat [1995] "),
            ("Heat".to_string(), Some(1995))
        );
        assert_eq!(parse_name_year("Inception"), ("Inception".to_string(), None));
        assert_eq!(parse_name_year("(1999)"), ("(1999)".to_string(), None));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  x ")), Some("x"));
        assert_eq!(non_blank(Some("N/A")), None);
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn test_lenient_u32() {
        #[derive(Deserialize)]
        struct Probe {
            #[serde(default, deserialize_with = "lenient_u32")]
            n: Option<u32>,
        }
        let parse = |s: &str| serde_json::from_str::<Probe>(s).unwrap().n;
        assert_eq!(parse(r#"{"n": 3}"#), Some(3));
        assert_eq!(parse(r#"{"n": "4"}"#), Some(4));
        assert_eq!(parse(r#"{"n": ""}"#), None);
        assert_eq!(parse(r#"{"n": null}"#), None);
        assert_eq!(parse(r#"{}"#), None);
    }
}
