//! Certificate attribute records
//!
//! Three views of one gem's attributes: the raw vision-model extraction, the
//! affiliate-supplied override set, and the cleaned record produced by the
//! evaluator for persistence.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::normalize::collapse_range_text;

/// Placeholder written into cleaned-record fields with no data
pub const NO_DATA: &str = "ND";

/// Tag for fields that are structurally absent for a shape family
pub const NOT_APPLICABLE: &str = "Not Applicable";

/// Key-to-symbols payload as returned by the vision model.
///
/// Depending on the certificate layout the model returns either a JSON list
/// of characteristic names or a single delimited string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SymbolText {
    List(Vec<String>),
    Text(String),
}

impl SymbolText {
    /// Flatten to the comma-delimited form the engine works on
    pub fn flatten(&self) -> String {
        match self {
            SymbolText::List(items) => items.join(","),
            SymbolText::Text(text) => text.clone(),
        }
    }
}

/// One gem's attributes as extracted from the certificate image by the
/// vision model. Immutable input to the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCertificateRecord {
    pub shape: Option<String>,
    pub carat: Option<String>,
    pub color_grade: Option<String>,
    pub clarity: Option<String>,
    pub cut: Option<String>,
    pub polish: Option<String>,
    pub symmetry: Option<String>,
    /// Accepts the long-standing `flouroscence` misspelling from older
    /// extraction prompts.
    #[serde(alias = "flouroscence")]
    pub fluorescence: Option<String>,
    pub girdle: Option<String>,
    pub culet: Option<String>,
    pub measurement: Option<String>,
    pub table_size: Option<String>,
    pub depth: Option<String>,
    pub crown_angle: Option<String>,
    pub crown_height: Option<String>,
    pub pavilion_angle: Option<String>,
    pub pavilion_height: Option<String>,
    pub star_length: Option<String>,
    pub lower_half_length: Option<String>,
    #[serde(alias = "key_to_symbols")]
    pub key_to_symbol: Option<SymbolText>,
}

/// The same attribute set sourced from the affiliate feed.
///
/// Absent fields arrive as sentinel spellings ("false", "none", "null", "",
/// "0.0000") rather than JSON null; see [`crate::merge`] for the rules that
/// decide which spellings count as data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverrideRecord {
    pub shape: Option<String>,
    pub carat: Option<String>,
    /// The affiliate feed calls the color grade plain `color`
    pub color: Option<String>,
    pub cut: Option<String>,
    pub polish: Option<String>,
    pub symmetry: Option<String>,
    pub fluorescence: Option<String>,
    /// Historic feed misspelling
    #[serde(alias = "griddle")]
    pub girdle: Option<String>,
    pub culet: Option<String>,
    pub measurement: Option<String>,
    pub table_size: Option<String>,
    pub depth: Option<String>,
    pub crown_angle: Option<String>,
    pub crown_height: Option<String>,
    pub pavilion_angle: Option<String>,
    pub pavilion_height: Option<String>,
}

/// The merged, normalized attribute record handed to persistence.
///
/// Every field carries text: real data, `"ND"` when nothing was available,
/// or `"Not Applicable"` for geometry the shape family does not have.
#[derive(Debug, Clone, Serialize)]
pub struct CleanedRecord {
    pub shape: String,
    pub carat: String,
    #[serde(rename = "color")]
    pub color_grade: String,
    pub clarity: String,
    pub cut: String,
    pub polish: String,
    pub symmetry: String,
    pub fluorescence: String,
    pub girdle: String,
    pub culet: String,
    pub measurement: String,
    pub table_size: String,
    pub depth: String,
    pub crown_angle: String,
    pub crown_height: String,
    pub pavilion_angle: String,
    pub pavilion_height: String,
    pub star_length: String,
    pub lower_half_length: String,
    pub key_to_symbol: String,
    /// Length/width ratio, only present for fancy shapes whose measurement
    /// parsed cleanly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length_width_ratio: Option<Decimal>,
}

impl CleanedRecord {
    /// Human-readable girdle description for listings.
    ///
    /// Presentation only; scoring always reads the stored girdle text.
    pub fn girdle_description(&self) -> String {
        collapse_range_text(&self.girdle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_text_flattens_list_to_commas() {
        let symbols = SymbolText::List(vec![
            "Feather".to_string(),
            "Cloud".to_string(),
            "Twinning Wisp".to_string(),
        ]);
        assert_eq!(symbols.flatten(), "Feather,Cloud,Twinning Wisp");
    }

    #[test]
    fn symbol_text_passes_strings_through() {
        let symbols = SymbolText::Text("Feather, Cloud".to_string());
        assert_eq!(symbols.flatten(), "Feather, Cloud");
    }

    #[test]
    fn raw_record_accepts_fluorescence_misspelling() {
        let json = r#"{"shape": "Round Brilliant", "flouroscence": "None"}"#;
        let record: RawCertificateRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.fluorescence.as_deref(), Some("None"));
    }

    #[test]
    fn raw_record_accepts_key_to_symbols_alias() {
        let json = r#"{"key_to_symbols": ["Feather", "Cloud"]}"#;
        let record: RawCertificateRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            record.key_to_symbol.unwrap().flatten(),
            "Feather,Cloud"
        );
    }

    #[test]
    fn override_record_accepts_griddle_alias() {
        let json = r#"{"griddle": "Medium", "color": "F"}"#;
        let record: OverrideRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.girdle.as_deref(), Some("Medium"));
        assert_eq!(record.color.as_deref(), Some("F"));
    }
}
