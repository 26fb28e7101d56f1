//! Attribute normalization
//!
//! Certificate fields arrive as free text: measurements like
//! `"6.5x4.5x2.9"` or `"4.00-4.05x2.50"`, percentages like `"58%"`, symbol
//! lists in several delimitings, girdle descriptions with parenthetical
//! percentages. This module derives the numeric and canonical values the
//! evaluator scores against.

use regex::Regex;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use std::sync::LazyLock;

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").expect("numeric pattern"));

static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("parenthetical pattern"));

/// First numeric substring of a text field, comma decimals normalized
pub fn extract_number(text: &str) -> Option<f64> {
    FIRST_NUMBER
        .find(text)
        .and_then(|m| m.as_str().replace(',', ".").parse().ok())
}

/// Numeric value of a percentage field (table %, depth %).
///
/// `"0"`, `"ND"` and `"Not Applicable"` mean "no value"; the attribute still
/// counts toward the composite denominator with a score of zero.
pub fn numeric_value(text: &str) -> Option<f64> {
    match text.trim() {
        "0" | "ND" | "Not Applicable" => None,
        trimmed => extract_number(trimmed),
    }
}

/// Numeric value of an angle/height field (pavilion angle and height, crown
/// angle). The feed historically writes `"1"` and `"false"` for unmeasured
/// angles, so both count as no value.
pub fn angle_value(text: &str) -> Option<f64> {
    match text.trim() {
        "" | "false" | "ND" | "Not Applicable" | "1" => None,
        trimmed => extract_number(trimmed),
    }
}

/// Carat weight from the leading token of the carat text
pub fn carat_value(text: &str) -> Option<f64> {
    text.split_whitespace().next()?.parse().ok()
}

/// Length/width ratio for fancy shapes, rounded to two decimals.
///
/// The measurement splits on `x`/`X`/`*`; when the first two segments do not
/// parse, some feeds put both dimensions in the first segment separated by
/// whitespace. `None` means the ratio cannot be computed and the ratio
/// attribute is inapplicable for this record.
pub fn ratio_from_measurement(measurement: &str) -> Option<Decimal> {
    let normalized = measurement.replace(',', ".").replace('*', "x").to_lowercase();
    let segments: Vec<&str> = normalized.split('x').collect();

    let mut pair = None;
    if segments.len() >= 2 {
        pair = segments[0]
            .trim()
            .parse::<f64>()
            .ok()
            .zip(segments[1].trim().parse::<f64>().ok());
    }
    if pair.is_none() {
        let mut words = segments.first()?.split_whitespace();
        let length = words.next().and_then(|w| w.parse::<f64>().ok());
        let width = words.next().and_then(|w| w.parse::<f64>().ok());
        pair = length.zip(width);
    }

    let (length, width) = pair?;
    if width == 0.0 {
        return None;
    }
    Decimal::from_f64(length / width).map(|d| d.round_dp(2))
}

/// Minimum diameter of a round stone.
///
/// Round measurements read `"min-max x depth"`; the minimum diameter is what
/// the carat table is checked against.
pub fn round_diameter(measurement: &str) -> Option<f64> {
    let first = measurement.split(['*', 'x', 'X']).next()?;
    let min = first.split('-').next().unwrap_or(first);
    min.trim().replace(',', ".").parse().ok()
}

/// Canonical uppercase symbol tokens for table lookup.
///
/// Handles list flattening upstream of this call; here the text splits on
/// commas when present, otherwise on whitespace. Multi-word characteristic
/// names survive the whitespace split because their known collapsed
/// spellings are folded before splitting and re-expanded after; a bare
/// "indented" token always means "Indented Natural".
pub fn symbol_tokens(text: &str) -> Vec<String> {
    let prepared = text
        .to_uppercase()
        .replace("TWINNING WISP", "TWINNINGWISP")
        .replace("INDENTED NATURAL", "INDENTEDNATURAL")
        .replace("GROWTH REMNANT", "GROWTHREMNANT");

    let raw_tokens: Vec<&str> = if prepared.contains(',') {
        prepared.split(',').collect()
    } else {
        prepared.split_whitespace().collect()
    };

    let mut tokens = Vec::new();
    for token in raw_tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let collapsed = token.replace(' ', "");
        let canonical = match collapsed.as_str() {
            "TWINNINGWISP" => "TWINNING WISP".to_string(),
            "INDENTEDNATURAL" | "INDENTED" => "INDENTED NATURAL".to_string(),
            "GROWTHREMNANT" => "GROWTH REMNANT".to_string(),
            _ => token.split_whitespace().collect::<Vec<_>>().join(" "),
        };
        tokens.push(canonical);
    }
    tokens
}

/// Girdle text as looked up on the round path: a trailing parenthetical
/// token and a trailing percentage token are dropped.
pub fn girdle_lookup_text(girdle: &str) -> String {
    let mut tokens: Vec<&str> = girdle.split_whitespace().collect();
    if tokens.len() > 1 {
        if tokens[tokens.len() - 2].contains('(') {
            tokens.remove(tokens.len() - 2);
        }
        if tokens.last().is_some_and(|t| t.contains('%')) {
            tokens.pop();
        }
        tokens.join(" ")
    } else {
        girdle.to_string()
    }
}

/// Presentation cleanup for girdle descriptions: hyphen ranges and commas
/// become the word "to", parenthetical content and stray digits/percent
/// signs are stripped. Never used for scoring.
pub fn collapse_range_text(text: &str) -> String {
    let without_parens = PARENTHETICAL.replace_all(text, " ");
    let mut collapsed = String::with_capacity(without_parens.len());
    for ch in without_parens.chars() {
        match ch {
            '-' | ',' => collapsed.push_str(" to "),
            '%' | '.' | ';' | ':' | '*' => {}
            c if c.is_ascii_digit() => {}
            c => collapsed.push(c),
        }
    }
    collapsed.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn extracts_first_number_with_comma_decimals() {
        assert_eq!(extract_number("58%"), Some(58.0));
        assert_eq!(extract_number("61,5 %"), Some(61.5));
        assert_eq!(extract_number("approx 34.5 deg"), Some(34.5));
        assert_eq!(extract_number("none"), None);
    }

    #[test]
    fn no_value_markers_are_skipped() {
        assert_eq!(numeric_value("ND"), None);
        assert_eq!(numeric_value("Not Applicable"), None);
        assert_eq!(numeric_value("0"), None);
        assert_eq!(numeric_value("58%"), Some(58.0));
    }

    #[test]
    fn angle_markers_include_legacy_placeholders() {
        assert_eq!(angle_value("1"), None);
        assert_eq!(angle_value("false"), None);
        assert_eq!(angle_value("40.8"), Some(40.8));
    }

    #[test]
    fn carat_takes_the_leading_token() {
        assert_eq!(carat_value("0.30 carat"), Some(0.30));
        assert_eq!(carat_value("1.52"), Some(1.52));
        assert_eq!(carat_value("heavy"), None);
    }

    #[test]
    fn ratio_from_x_delimited_measurement() {
        assert_eq!(ratio_from_measurement("6.5x4.5x2.9"), Some(dec("1.44")));
        assert_eq!(ratio_from_measurement("6.50X4.50X2.90"), Some(dec("1.44")));
        assert_eq!(ratio_from_measurement("6,5*4,5*2,9"), Some(dec("1.44")));
    }

    #[test]
    fn ratio_falls_back_to_whitespace_split() {
        assert_eq!(ratio_from_measurement("6.5 4.5 2.9"), Some(dec("1.44")));
    }

    #[test]
    fn ratio_failure_is_none() {
        assert_eq!(ratio_from_measurement("garbled"), None);
        assert_eq!(ratio_from_measurement("6.5x0"), None);
        assert_eq!(ratio_from_measurement(""), None);
    }

    #[test]
    fn round_diameter_takes_the_minimum() {
        assert_eq!(round_diameter("4.00-4.05x2.50"), Some(4.00));
        assert_eq!(round_diameter("6.40 - 6.45 x 3.95"), Some(6.40));
        assert_eq!(round_diameter("nonsense"), None);
    }

    #[test]
    fn symbol_tokens_split_on_commas_first() {
        assert_eq!(
            symbol_tokens("Feather, Cloud, Twinning Wisp"),
            vec!["FEATHER", "CLOUD", "TWINNING WISP"]
        );
    }

    #[test]
    fn symbol_tokens_split_on_whitespace_without_commas() {
        assert_eq!(
            symbol_tokens("Feather Cloud"),
            vec!["FEATHER", "CLOUD"]
        );
    }

    #[test]
    fn multiword_names_survive_whitespace_splitting() {
        assert_eq!(
            symbol_tokens("Feather Twinning Wisp Growth Remnant"),
            vec!["FEATHER", "TWINNING WISP", "GROWTH REMNANT"]
        );
    }

    #[test]
    fn indented_folds_to_indented_natural() {
        assert_eq!(
            symbol_tokens("Indented Natural Feather"),
            vec!["INDENTED NATURAL", "FEATHER"]
        );
        assert_eq!(symbol_tokens("Indented"), vec!["INDENTED NATURAL"]);
    }

    #[test]
    fn empty_symbol_text_yields_no_tokens() {
        assert!(symbol_tokens("").is_empty());
        assert!(symbol_tokens(" , ,").is_empty());
    }

    #[test]
    fn girdle_lookup_drops_parenthetical_and_percent() {
        assert_eq!(
            girdle_lookup_text("Medium to Slightly Thick (3.5) 4%"),
            "Medium to Slightly Thick"
        );
        assert_eq!(girdle_lookup_text("Medium"), "Medium");
        assert_eq!(girdle_lookup_text("Thin to Medium"), "Thin to Medium");
    }

    #[test]
    fn collapse_range_text_reads_like_a_listing() {
        assert_eq!(collapse_range_text("Thin - Medium (3.0%)"), "Thin to Medium");
        assert_eq!(collapse_range_text("Faint, Medium"), "Faint to Medium");
        assert_eq!(collapse_range_text("Medium"), "Medium");
    }
}
