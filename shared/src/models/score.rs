//! Score records produced by the evaluator

use serde::ser::Serializer;
use serde::Serialize;

/// Score for a single certificate attribute.
///
/// Either earned points in 0..=5 or the literal `"Not Applicable"` tag for
/// attributes that are not part of the gem's shape family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeScore {
    Points(i32),
    NotApplicable,
}

impl AttributeScore {
    /// Earned points, or `None` when the attribute does not apply
    pub fn points(&self) -> Option<i32> {
        match self {
            AttributeScore::Points(p) => Some(*p),
            AttributeScore::NotApplicable => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, AttributeScore::Points(_))
    }
}

impl Serialize for AttributeScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttributeScore::Points(p) => serializer.serialize_i32(*p),
            AttributeScore::NotApplicable => serializer.serialize_str("Not Applicable"),
        }
    }
}

impl std::fmt::Display for AttributeScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeScore::Points(p) => write!(f, "{}", p),
            AttributeScore::NotApplicable => write!(f, "Not Applicable"),
        }
    }
}

/// Per-attribute scores plus the composite digitization percentage.
///
/// Field names (and the `digisation_score` spelling) follow the downstream
/// score-row column contract.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreRecord {
    pub cut_score: AttributeScore,
    pub digisation_score: String,
    pub pavilion_angle_score: AttributeScore,
    pub pavilion_height_score: AttributeScore,
    pub measurement_score: AttributeScore,
    pub table_size_score: AttributeScore,
    pub symmetry_score: AttributeScore,
    pub polish_score: AttributeScore,
    pub girdle_score: AttributeScore,
    pub fluorescence_score: AttributeScore,
    pub depth_score: AttributeScore,
    pub culet_score: AttributeScore,
    pub key_to_symbol_score: AttributeScore,
    pub length_width_ratio_score: AttributeScore,
    pub crown_angle_score: AttributeScore,
}

impl ScoreRecord {
    /// Composite percentage as a number (without the trailing `%`)
    pub fn digisation_score_numeric(&self) -> Option<f64> {
        self.digisation_score.trim_end_matches('%').parse().ok()
    }
}
