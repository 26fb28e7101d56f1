//! Two-source field merging
//!
//! The vision-model extraction is the primary source; the affiliate feed
//! fills gaps field by field. Affiliate absence is encoded by sentinel
//! spellings rather than nulls, centralized here in [`is_absent`]. Two
//! refinements carried from the production data: for culet and fluorescence
//! the word "none" is a real grade (a culet of "None" is the best one), and
//! the pavilion geometry fields use "0.0000" as an extra sentinel.

use crate::models::{OverrideRecord, RawCertificateRecord};

/// Sentinel spellings meaning "no data" in the affiliate feed
pub const ABSENT_SENTINELS: &[&str] = &["false", "False", "none", "None", "null", "Null", ""];

/// True when an affiliate value is a placeholder rather than data
pub fn is_absent(value: &str) -> bool {
    ABSENT_SENTINELS.contains(&value)
}

/// Sentinel check for fields where "none" is a legitimate value
/// (culet and fluorescence)
fn is_absent_keeping_none(value: &str) -> bool {
    matches!(value, "false" | "False" | "null" | "Null" | "")
}

/// Sentinel check for pavilion geometry, where the feed writes "0.0000"
/// for missing angles and heights
fn is_absent_geometry(value: &str) -> bool {
    is_absent(value) || value == "0.0000"
}

/// The merged working record the normalizer and evaluator operate on.
///
/// `None` means neither source had data; the output assembler later stamps
/// `"ND"` or `"Not Applicable"` depending on the shape family.
#[derive(Debug, Clone, Default)]
pub struct WorkingRecord {
    pub shape: Option<String>,
    pub carat: Option<String>,
    pub color_grade: Option<String>,
    pub clarity: Option<String>,
    pub cut: Option<String>,
    pub polish: Option<String>,
    pub symmetry: Option<String>,
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
    pub key_to_symbol: Option<String>,
    /// Names of fields filled from the affiliate feed
    pub substituted: Vec<&'static str>,
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Merge the raw extraction with the affiliate override, field by field.
///
/// A gem may end up with raw measurement but affiliate color; the merge is
/// never all-or-nothing.
pub fn merge(raw: &RawCertificateRecord, overrides: Option<&OverrideRecord>) -> WorkingRecord {
    let mut working = WorkingRecord {
        shape: present(&raw.shape),
        carat: present(&raw.carat),
        color_grade: present(&raw.color_grade),
        clarity: present(&raw.clarity),
        cut: present(&raw.cut),
        polish: present(&raw.polish),
        symmetry: present(&raw.symmetry),
        fluorescence: present(&raw.fluorescence),
        girdle: present(&raw.girdle),
        culet: present(&raw.culet),
        measurement: present(&raw.measurement),
        table_size: present(&raw.table_size),
        depth: present(&raw.depth),
        crown_angle: present(&raw.crown_angle),
        crown_height: present(&raw.crown_height),
        pavilion_angle: present(&raw.pavilion_angle),
        pavilion_height: present(&raw.pavilion_height),
        star_length: present(&raw.star_length),
        lower_half_length: present(&raw.lower_half_length),
        key_to_symbol: Some(
            raw.key_to_symbol
                .as_ref()
                .map(|s| s.flatten())
                .unwrap_or_default(),
        ),
        substituted: Vec::new(),
    };

    if let Some(overrides) = overrides {
        fill(&mut working.shape, &overrides.shape, "shape", is_absent, &mut working.substituted);
        fill(&mut working.carat, &overrides.carat, "carat", is_absent, &mut working.substituted);
        fill(
            &mut working.color_grade,
            &overrides.color,
            "color_grade",
            is_absent,
            &mut working.substituted,
        );
        fill(&mut working.cut, &overrides.cut, "cut", is_absent, &mut working.substituted);
        fill(&mut working.polish, &overrides.polish, "polish", is_absent, &mut working.substituted);
        fill(
            &mut working.symmetry,
            &overrides.symmetry,
            "symmetry",
            is_absent,
            &mut working.substituted,
        );
        fill(
            &mut working.fluorescence,
            &overrides.fluorescence,
            "fluorescence",
            is_absent_keeping_none,
            &mut working.substituted,
        );
        fill(&mut working.girdle, &overrides.girdle, "girdle", is_absent, &mut working.substituted);
        fill(
            &mut working.culet,
            &overrides.culet,
            "culet",
            is_absent_keeping_none,
            &mut working.substituted,
        );
        fill(
            &mut working.measurement,
            &overrides.measurement,
            "measurement",
            is_absent,
            &mut working.substituted,
        );
        fill(
            &mut working.table_size,
            &overrides.table_size,
            "table_size",
            is_absent,
            &mut working.substituted,
        );
        fill(&mut working.depth, &overrides.depth, "depth", is_absent, &mut working.substituted);
        fill(
            &mut working.crown_angle,
            &overrides.crown_angle,
            "crown_angle",
            is_absent,
            &mut working.substituted,
        );
        fill(
            &mut working.crown_height,
            &overrides.crown_height,
            "crown_height",
            is_absent,
            &mut working.substituted,
        );
        fill(
            &mut working.pavilion_angle,
            &overrides.pavilion_angle,
            "pavilion_angle",
            is_absent_geometry,
            &mut working.substituted,
        );
        fill(
            &mut working.pavilion_height,
            &overrides.pavilion_height,
            "pavilion_height",
            is_absent_geometry,
            &mut working.substituted,
        );
    }

    // a culet reported with an absence spelling means the stone has no
    // culet, which is the top grade
    if let Some(culet) = &working.culet {
        if matches!(culet.to_lowercase().as_str(), "false" | "none" | "null") {
            working.culet = Some("None".to_string());
        }
    }

    working
}

fn fill(
    target: &mut Option<String>,
    candidate: &Option<String>,
    name: &'static str,
    sentinel: fn(&str) -> bool,
    substituted: &mut Vec<&'static str>,
) {
    if target.is_some() {
        return;
    }
    if let Some(value) = candidate {
        if !sentinel(value) {
            *target = Some(value.clone());
            substituted.push(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_with(shape: &str, color: Option<&str>) -> RawCertificateRecord {
        RawCertificateRecord {
            shape: Some(shape.to_string()),
            color_grade: color.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn sentinel_spellings_are_absent() {
        for spelling in ["false", "False", "none", "None", "null", "Null", ""] {
            assert!(is_absent(spelling), "{spelling:?} should be absent");
        }
        assert!(!is_absent("Medium"));
        assert!(!is_absent("0.0000"));
        assert!(is_absent_geometry("0.0000"));
    }

    #[test]
    fn raw_values_win_over_overrides() {
        let raw = raw_with("Round Brilliant", Some("F"));
        let overrides = OverrideRecord {
            color: Some("G".to_string()),
            ..Default::default()
        };
        let working = merge(&raw, Some(&overrides));
        assert_eq!(working.color_grade.as_deref(), Some("F"));
        assert!(working.substituted.is_empty());
    }

    #[test]
    fn overrides_fill_gaps_per_field() {
        let raw = raw_with("Round Brilliant", None);
        let overrides = OverrideRecord {
            color: Some("G".to_string()),
            girdle: Some("Medium".to_string()),
            ..Default::default()
        };
        let working = merge(&raw, Some(&overrides));
        assert_eq!(working.color_grade.as_deref(), Some("G"));
        assert_eq!(working.girdle.as_deref(), Some("Medium"));
        assert_eq!(working.substituted, vec!["color_grade", "girdle"]);
    }

    #[test]
    fn all_sentinel_override_merge_is_idempotent() {
        let raw = raw_with("Round Brilliant", Some("F"));
        let sentinels = OverrideRecord {
            shape: Some("false".to_string()),
            carat: Some("".to_string()),
            color: Some("None".to_string()),
            girdle: Some("null".to_string()),
            pavilion_angle: Some("0.0000".to_string()),
            pavilion_height: Some("0.0000".to_string()),
            ..Default::default()
        };
        let merged = merge(&raw, Some(&sentinels));
        let raw_only = merge(&raw, None);
        assert_eq!(merged.shape, raw_only.shape);
        assert_eq!(merged.carat, raw_only.carat);
        assert_eq!(merged.color_grade, raw_only.color_grade);
        assert_eq!(merged.girdle, raw_only.girdle);
        assert_eq!(merged.pavilion_angle, raw_only.pavilion_angle);
        assert_eq!(merged.pavilion_height, raw_only.pavilion_height);
        assert!(merged.substituted.is_empty());
    }

    #[test]
    fn culet_none_from_override_is_a_value() {
        let raw = raw_with("Round Brilliant", None);
        let overrides = OverrideRecord {
            culet: Some("None".to_string()),
            ..Default::default()
        };
        let working = merge(&raw, Some(&overrides));
        assert_eq!(working.culet.as_deref(), Some("None"));
        assert_eq!(working.substituted, vec!["culet"]);
    }

    #[test]
    fn fluorescence_none_from_override_is_a_value() {
        let raw = raw_with("Round Brilliant", None);
        let overrides = OverrideRecord {
            fluorescence: Some("none".to_string()),
            ..Default::default()
        };
        let working = merge(&raw, Some(&overrides));
        assert_eq!(working.fluorescence.as_deref(), Some("none"));
    }

    #[test]
    fn culet_absence_spellings_normalize_to_the_top_grade() {
        let raw = RawCertificateRecord {
            shape: Some("Round Brilliant".to_string()),
            culet: Some("null".to_string()),
            ..Default::default()
        };
        let working = merge(&raw, None);
        assert_eq!(working.culet.as_deref(), Some("None"));
    }

    #[test]
    fn empty_raw_fields_fall_through_to_overrides() {
        let raw = RawCertificateRecord {
            shape: Some("Round Brilliant".to_string()),
            polish: Some("  ".to_string()),
            ..Default::default()
        };
        let overrides = OverrideRecord {
            polish: Some("Excellent".to_string()),
            ..Default::default()
        };
        let working = merge(&raw, Some(&overrides));
        assert_eq!(working.polish.as_deref(), Some("Excellent"));
    }

    #[test]
    fn symbol_list_is_flattened_on_merge() {
        let raw = RawCertificateRecord {
            shape: Some("Round".to_string()),
            key_to_symbol: Some(crate::models::SymbolText::List(vec![
                "Feather".to_string(),
                "Cloud".to_string(),
            ])),
            ..Default::default()
        };
        let working = merge(&raw, None);
        assert_eq!(working.key_to_symbol.as_deref(), Some("Feather,Cloud"));
    }
}
