//! Tests for the scoring engine against the shipped configuration tables
//!
//! These run the evaluator exactly as the worker does: the same two JSON
//! documents from `config/`, loaded once, shared by reference.

use shared::{evaluate, AttributeScore, EngineError, EngineTables, RawCertificateRecord, ShapeFamily, SymbolText};

const REQUIREMENTS_JSON: &str = include_str!("../../config/shape_requirements.json");
const CHARACTERISTICS_JSON: &str = include_str!("../../config/characteristics.json");

fn tables() -> EngineTables {
    EngineTables::from_json(REQUIREMENTS_JSON, CHARACTERISTICS_JSON).unwrap()
}

fn perfect_round() -> RawCertificateRecord {
    RawCertificateRecord {
        shape: Some("Round Brilliant".to_string()),
        measurement: Some("4.00-4.05x2.50".to_string()),
        carat: Some("0.30".to_string()),
        table_size: Some("58%".to_string()),
        depth: Some("61.5%".to_string()),
        girdle: Some("Medium".to_string()),
        polish: Some("Excellent".to_string()),
        symmetry: Some("Excellent".to_string()),
        cut: Some("Excellent".to_string()),
        fluorescence: Some("None".to_string()),
        color_grade: Some("F".to_string()),
        culet: Some("None".to_string()),
        key_to_symbol: Some(SymbolText::Text(String::new())),
        crown_angle: Some("34.5".to_string()),
        pavilion_angle: Some("40.8".to_string()),
        pavilion_height: Some("43.1".to_string()),
        ..Default::default()
    }
}

fn in_window_emerald() -> RawCertificateRecord {
    RawCertificateRecord {
        shape: Some("Emerald".to_string()),
        measurement: Some("7.00x5.00x3.20".to_string()),
        carat: Some("1.02".to_string()),
        table_size: Some("65%".to_string()),
        depth: Some("64%".to_string()),
        girdle: Some("Medium".to_string()),
        polish: Some("Excellent".to_string()),
        symmetry: Some("Excellent".to_string()),
        cut: Some("Excellent".to_string()),
        fluorescence: Some("None".to_string()),
        color_grade: Some("G".to_string()),
        culet: Some("None".to_string()),
        pavilion_angle: Some("42.0".to_string()),
        pavilion_height: Some("45.0".to_string()),
        ..Default::default()
    }
}

// =============================================================================
// Configuration loading
// =============================================================================

mod table_loading {
    use super::*;

    #[test]
    fn shipped_tables_load() {
        let tables = tables();
        assert!(tables.requirement(ShapeFamily::Round).is_some());
        assert!(tables.requirement(ShapeFamily::Heart).is_some());
    }

    #[test]
    fn every_canonical_family_has_requirements() {
        let tables = tables();
        for family in [
            ShapeFamily::Round,
            ShapeFamily::Princess,
            ShapeFamily::Asscher,
            ShapeFamily::Emerald,
            ShapeFamily::RadiantSq,
            ShapeFamily::RadiantRec,
            ShapeFamily::Pear,
            ShapeFamily::Cushion,
            ShapeFamily::Heart,
        ] {
            assert!(
                tables.requirement(family).is_some(),
                "missing requirement for {family}"
            );
        }
    }

    #[test]
    fn only_the_round_family_has_a_crown_window() {
        let tables = tables();
        assert!(tables
            .requirement(ShapeFamily::Round)
            .unwrap()
            .crown_angle
            .is_some());
        assert!(tables
            .requirement(ShapeFamily::Pear)
            .unwrap()
            .crown_angle
            .is_none());
    }
}

// =============================================================================
// Round path
// =============================================================================

mod round_scoring {
    use super::*;

    #[test]
    fn in_window_round_scores_one_hundred() {
        let evaluation = evaluate(&tables(), &perfect_round(), None).unwrap();
        assert_eq!(evaluation.family, ShapeFamily::Round);
        assert_eq!(evaluation.scores.digisation_score, "100.0%");
    }

    #[test]
    fn unmapped_girdle_text_zeroes_only_the_girdle() {
        let mut record = perfect_round();
        record.girdle = Some("Zzz".to_string());
        let evaluation = evaluate(&tables(), &record, None).unwrap();
        assert_eq!(evaluation.scores.girdle_score, AttributeScore::Points(0));
        assert_eq!(evaluation.scores.polish_score, AttributeScore::Points(5));
        assert_eq!(evaluation.scores.culet_score, AttributeScore::Points(5));
        assert_eq!(evaluation.scores.digisation_score, "92.31%");
    }

    #[test]
    fn round_denominator_is_thirteen_even_when_sparse() {
        let record = RawCertificateRecord {
            shape: Some("Round".to_string()),
            ..Default::default()
        };
        let evaluation = evaluate(&tables(), &record, None).unwrap();
        // only the empty symbol list scores (5), divided by 13 attributes
        assert_eq!(evaluation.scores.digisation_score, "7.69%");
    }

    #[test]
    fn out_of_window_pavilion_angle_takes_the_curve_score() {
        let mut record = perfect_round();
        record.pavilion_angle = Some("39.0".to_string());
        let evaluation = evaluate(&tables(), &record, None).unwrap();
        assert_eq!(
            evaluation.scores.pavilion_angle_score,
            AttributeScore::Points(2)
        );
    }

    #[test]
    fn strong_fluorescence_drags_high_colors_down() {
        let mut record = perfect_round();
        record.fluorescence = Some("Very Strong Blue".to_string());
        let evaluation = evaluate(&tables(), &record, None).unwrap();
        assert_eq!(
            evaluation.scores.fluorescence_score,
            AttributeScore::Points(1)
        );
    }

    #[test]
    fn compound_fluorescence_is_looked_up_verbatim() {
        let mut record = perfect_round();
        record.fluorescence = Some("Faint Blue".to_string());
        let evaluation = evaluate(&tables(), &record, None).unwrap();
        assert_eq!(
            evaluation.scores.fluorescence_score,
            AttributeScore::Points(4)
        );
    }

    #[test]
    fn large_stones_pass_measurement_at_eight_millimetres() {
        let mut record = perfect_round();
        record.carat = Some("2.10".to_string());
        record.measurement = Some("8.15-8.20x5.05".to_string());
        let evaluation = evaluate(&tables(), &record, None).unwrap();
        assert_eq!(
            evaluation.scores.measurement_score,
            AttributeScore::Points(5)
        );
    }

    #[test]
    fn ratio_slot_is_not_applicable_for_rounds() {
        let evaluation = evaluate(&tables(), &perfect_round(), None).unwrap();
        assert_eq!(
            evaluation.scores.length_width_ratio_score,
            AttributeScore::NotApplicable
        );
    }
}

// =============================================================================
// Fancy path
// =============================================================================

mod fancy_scoring {
    use super::*;

    #[test]
    fn in_window_emerald_scores_one_hundred() {
        let evaluation = evaluate(&tables(), &in_window_emerald(), None).unwrap();
        assert_eq!(evaluation.family, ShapeFamily::Emerald);
        assert_eq!(evaluation.scores.digisation_score, "100.0%");
        assert_eq!(
            evaluation.scores.length_width_ratio_score,
            AttributeScore::Points(5)
        );
    }

    #[test]
    fn crown_and_measurement_slots_are_not_applicable() {
        let evaluation = evaluate(&tables(), &in_window_emerald(), None).unwrap();
        assert_eq!(
            evaluation.scores.crown_angle_score,
            AttributeScore::NotApplicable
        );
        assert_eq!(
            evaluation.scores.measurement_score,
            AttributeScore::NotApplicable
        );
    }

    #[test]
    fn computable_ratio_joins_the_denominator() {
        // culet unmapped so the totals differ from the maximum
        let mut record = in_window_emerald();
        record.culet = Some("Zzz".to_string());
        let evaluation = evaluate(&tables(), &record, None).unwrap();
        // 55 of 60 across twelve attributes
        assert_eq!(evaluation.scores.digisation_score, "91.67%");
    }

    #[test]
    fn failed_ratio_leaves_the_denominator() {
        let mut record = in_window_emerald();
        record.culet = Some("Zzz".to_string());
        record.measurement = Some("garbled".to_string());
        let evaluation = evaluate(&tables(), &record, None).unwrap();
        assert_eq!(
            evaluation.scores.length_width_ratio_score,
            AttributeScore::NotApplicable
        );
        // 50 of 55 across eleven attributes
        assert_eq!(evaluation.scores.digisation_score, "90.91%");
        assert_eq!(evaluation.cleaned.measurement, "ND");
    }

    #[test]
    fn radiant_families_share_the_radiant_culet_sub_table() {
        let record = RawCertificateRecord {
            shape: Some("Cut-Cornered Rectangular Modified Brilliant".to_string()),
            culet: Some("Small".to_string()),
            ..Default::default()
        };
        let evaluation = evaluate(&tables(), &record, None).unwrap();
        assert_eq!(evaluation.family, ShapeFamily::RadiantRec);
        assert_eq!(evaluation.scores.culet_score, AttributeScore::Points(4));
    }

    #[test]
    fn heart_girdles_score_from_the_heart_table() {
        let record = RawCertificateRecord {
            shape: Some("Heart Brilliant".to_string()),
            girdle: Some("Thin".to_string()),
            ..Default::default()
        };
        let evaluation = evaluate(&tables(), &record, None).unwrap();
        // heart table rates Thin at 3 where the shared table says 4
        assert_eq!(evaluation.scores.girdle_score, AttributeScore::Points(3));
    }
}

// =============================================================================
// Classification failures
// =============================================================================

mod classification_failures {
    use super::*;

    #[test]
    fn unidentifiable_shape_returns_the_status() {
        let record = RawCertificateRecord {
            shape: Some("Unidentifiable Blob".to_string()),
            ..Default::default()
        };
        let err = evaluate(&tables(), &record, None).unwrap_err();
        assert_eq!(err, EngineError::UnknownShape);
        assert_eq!(err.to_string(), "can't find shape from data");
    }

    #[test]
    fn missing_shape_returns_the_status() {
        let record = RawCertificateRecord::default();
        assert!(evaluate(&tables(), &record, None).is_err());
    }
}

// =============================================================================
// Composite bounds
// =============================================================================

mod composite_bounds {
    use super::*;

    #[test]
    fn composites_stay_within_percentage_bounds() {
        let records = [
            perfect_round(),
            in_window_emerald(),
            RawCertificateRecord {
                shape: Some("Round".to_string()),
                ..Default::default()
            },
            RawCertificateRecord {
                shape: Some("Pear Brilliant".to_string()),
                table_size: Some("95%".to_string()),
                depth: Some("5%".to_string()),
                ..Default::default()
            },
        ];
        for record in records {
            let evaluation = evaluate(&tables(), &record, None).unwrap();
            let numeric = evaluation.scores.digisation_score_numeric().unwrap();
            assert!(
                (0.0..=100.0).contains(&numeric),
                "composite out of bounds: {}",
                evaluation.scores.digisation_score
            );
        }
    }
}
