//! Scoring evaluator
//!
//! The deterministic core: merges the two attribute sources, normalizes the
//! working record, scores every attribute applicable to the gem's shape
//! family against the configuration tables, and assembles the score record
//! and the cleaned attribute record.
//!
//! Rounds take a dedicated path with thirteen attributes always in the
//! composite denominator. All other families share the fancy path driven by
//! the matched shape requirement; its only conditional attribute is the
//! length/width ratio, which joins the tally solely when the ratio could be
//! computed from the measurement text.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::classify::{classify, ShapeFamily};
use crate::merge::{merge, WorkingRecord};
use crate::models::{
    AttributeScore, CleanedRecord, OverrideRecord, RawCertificateRecord, ScoreRecord, NOT_APPLICABLE,
    NO_DATA,
};
use crate::normalize::{
    angle_value, carat_value, girdle_lookup_text, numeric_value, ratio_from_measurement,
    round_diameter, symbol_tokens,
};
use crate::tables::{EngineTables, GradeColumn, Window};

/// Per-record engine failures.
///
/// Attribute-level problems never surface here; they degrade to zero scores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The shape text matched no classification rule. Terminal for this
    /// gem's scoring; the caller routes it to manual shape correction.
    #[error("can't find shape from data")]
    UnknownShape,
}

/// Result of evaluating one gem
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub family: ShapeFamily,
    pub scores: ScoreRecord,
    /// Untouched copy of the vision-model extraction
    pub original: RawCertificateRecord,
    pub cleaned: CleanedRecord,
    /// Fields filled in from the affiliate feed
    pub substituted_fields: Vec<&'static str>,
}

/// Score slots in tally order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Culet,
    Measurement,
    PavilionHeight,
    PavilionAngle,
    CrownAngle,
    TableSize,
    Depth,
    Girdle,
    Polish,
    Symmetry,
    Cut,
    Fluorescence,
    KeyToSymbol,
    LengthWidthRatio,
}

#[derive(Debug, Default)]
struct Tally {
    entries: Vec<(Slot, i32)>,
}

impl Tally {
    fn push(&mut self, slot: Slot, score: i32) {
        self.entries.push((slot, score));
    }

    fn slot(&self, slot: Slot) -> AttributeScore {
        self.entries
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, score)| AttributeScore::Points(*score))
            .unwrap_or(AttributeScore::NotApplicable)
    }

    fn composite(&self) -> String {
        let total: i32 = self.entries.iter().map(|(_, score)| score).sum();
        let attainable = 5 * self.entries.len() as i32;
        let percent = Decimal::from(total * 100) / Decimal::from(attainable);
        format_percent(percent)
    }
}

/// Percentage string with Python-float formatting: rounded to two decimals,
/// trailing zeros trimmed, always at least one decimal place.
fn format_percent(percent: Decimal) -> String {
    let rounded = percent.round_dp(2).normalize();
    let text = rounded.to_string();
    if text.contains('.') {
        format!("{}%", text)
    } else {
        format!("{}.0%", text)
    }
}

/// Evaluate one gem, classifying the shape internally
pub fn evaluate(
    tables: &EngineTables,
    raw: &RawCertificateRecord,
    overrides: Option<&OverrideRecord>,
) -> Result<Evaluation, EngineError> {
    let working = merge(raw, overrides);
    let family = family_of(&working, None)?;
    if family.is_round() {
        Ok(round_path(tables, raw.clone(), working, None))
    } else {
        Ok(fancy_path(tables, raw.clone(), working, family, None))
    }
}

/// Evaluate through the round path.
///
/// `shape_hint` optionally names the family key whose tolerance windows to
/// use instead of the classified one.
pub fn evaluate_round(
    tables: &EngineTables,
    raw: &RawCertificateRecord,
    overrides: Option<&OverrideRecord>,
    shape_hint: Option<&str>,
) -> Result<Evaluation, EngineError> {
    let working = merge(raw, overrides);
    if working.shape.is_none() {
        tracing::warn!("round evaluation without shape text");
        return Err(EngineError::UnknownShape);
    }
    Ok(round_path(tables, raw.clone(), working, shape_hint))
}

/// Evaluate through the fancy path.
///
/// A label that classifies as round is redirected to the round path, so
/// callers may use this as the general entry after their own dispatch.
pub fn evaluate_fancy(
    tables: &EngineTables,
    raw: &RawCertificateRecord,
    overrides: Option<&OverrideRecord>,
    shape_hint: Option<&str>,
) -> Result<Evaluation, EngineError> {
    let working = merge(raw, overrides);
    let family = family_of(&working, shape_hint)?;
    if family.is_round() {
        return Ok(round_path(tables, raw.clone(), working, None));
    }
    Ok(fancy_path(tables, raw.clone(), working, family, shape_hint))
}

fn family_of(
    working: &WorkingRecord,
    shape_hint: Option<&str>,
) -> Result<ShapeFamily, EngineError> {
    if let Some(family) = shape_hint.and_then(ShapeFamily::from_key) {
        return Ok(family);
    }
    let label = working.shape.as_deref().ok_or(EngineError::UnknownShape)?;
    classify(label).ok_or_else(|| {
        tracing::warn!(label, "shape label matched no classification rule");
        EngineError::UnknownShape
    })
}

fn window_score(value: Option<f64>, window: Option<Window>) -> i32 {
    match (value, window) {
        (Some(value), Some(window)) if window.contains(value) => 5,
        _ => 0,
    }
}

fn graded_score(tables: &EngineTables, value: &Option<String>, column: GradeColumn) -> i32 {
    value
        .as_deref()
        .and_then(|v| tables.graded_score(v, column))
        .unwrap_or(0)
}

fn fluorescence_score(tables: &EngineTables, working: &WorkingRecord) -> i32 {
    match (
        working.fluorescence.as_deref(),
        working.color_grade.as_deref(),
    ) {
        (Some(fluorescence), Some(color)) => tables
            .fluorescence_score(fluorescence, color)
            .unwrap_or(0),
        _ => 0,
    }
}

/// Minimum over recognized inclusion tokens; the worst inclusion dominates.
/// Unrecognized tokens are ignored and a clean record scores 5.
fn symbol_score(tables: &EngineTables, working: &WorkingRecord) -> i32 {
    match working.key_to_symbol.as_deref() {
        Some(text) => symbol_tokens(text)
            .iter()
            .filter_map(|token| tables.symbol_score(token))
            .min()
            .unwrap_or(5),
        None => 5,
    }
}

/// Girdle text that is only an absence spelling scores nothing and reads
/// back as no data.
fn normalize_girdle(working: &mut WorkingRecord) {
    if working
        .girdle
        .as_deref()
        .is_some_and(|g| matches!(g, "none" | "false" | "None"))
    {
        working.girdle = None;
    }
}

fn round_path(
    tables: &EngineTables,
    original: RawCertificateRecord,
    mut working: WorkingRecord,
    shape_hint: Option<&str>,
) -> Evaluation {
    let requirement = shape_hint
        .and_then(|hint| tables.requirement_for_key(hint))
        .or_else(|| tables.requirement(ShapeFamily::Round));

    normalize_girdle(&mut working);

    let mut tally = Tally::default();

    tally.push(
        Slot::Culet,
        working
            .culet
            .as_deref()
            .and_then(|c| tables.culet_score(ShapeFamily::Round, c))
            .unwrap_or(0),
    );

    let diameter = working.measurement.as_deref().and_then(round_diameter);
    let carat = working.carat.as_deref().and_then(carat_value);
    tally.push(
        Slot::Measurement,
        match (diameter, carat) {
            (Some(diameter), Some(carat)) => tables.measurement_score(diameter, carat),
            _ => 0,
        },
    );

    let pavilion_height = working.pavilion_height.as_deref().and_then(angle_value);
    tally.push(
        Slot::PavilionHeight,
        window_score(pavilion_height, requirement.map(|r| r.pavilion_depth)),
    );

    let pavilion_angle = working.pavilion_angle.as_deref().and_then(angle_value);
    tally.push(
        Slot::PavilionAngle,
        match (pavilion_angle, requirement) {
            (Some(value), Some(req)) => {
                if req.pavilion_angle.contains(value) {
                    5
                } else {
                    tables.pavilion_curve_score(value)
                }
            }
            _ => 0,
        },
    );

    let crown_angle = working.crown_angle.as_deref().and_then(angle_value);
    tally.push(
        Slot::CrownAngle,
        match (crown_angle, requirement.and_then(|r| r.crown_angle)) {
            (Some(value), Some(window)) => {
                if window.contains(value) {
                    5
                } else {
                    tables.crown_curve_score(value)
                }
            }
            _ => 0,
        },
    );

    let table_size = working.table_size.as_deref().and_then(numeric_value);
    tally.push(
        Slot::TableSize,
        window_score(table_size, requirement.map(|r| r.table)),
    );

    let depth = working.depth.as_deref().and_then(numeric_value);
    tally.push(Slot::Depth, window_score(depth, requirement.map(|r| r.depth)));

    tally.push(
        Slot::Girdle,
        working
            .girdle
            .as_deref()
            .and_then(|g| tables.girdle_score(&girdle_lookup_text(g), ShapeFamily::Round))
            .unwrap_or(0),
    );

    tally.push(
        Slot::Polish,
        graded_score(tables, &working.polish, GradeColumn::Polish),
    );
    tally.push(
        Slot::Symmetry,
        graded_score(tables, &working.symmetry, GradeColumn::Symmetry),
    );
    tally.push(Slot::Cut, graded_score(tables, &working.cut, GradeColumn::Cut));

    tally.push(Slot::Fluorescence, fluorescence_score(tables, &working));
    tally.push(Slot::KeyToSymbol, symbol_score(tables, &working));

    assemble(ShapeFamily::Round, tally, original, working, None)
}

fn fancy_path(
    tables: &EngineTables,
    original: RawCertificateRecord,
    mut working: WorkingRecord,
    family: ShapeFamily,
    shape_hint: Option<&str>,
) -> Evaluation {
    let requirement = shape_hint
        .and_then(|hint| tables.requirement_for_key(hint))
        .or_else(|| tables.requirement(family));

    normalize_girdle(&mut working);

    // ratio derivation first: a failed parse marks the measurement unusable
    let ratio = working.measurement.as_deref().and_then(ratio_from_measurement);
    if working.measurement.is_some() && ratio.is_none() {
        working.measurement = Some(NO_DATA.to_string());
    }

    let mut tally = Tally::default();

    tally.push(
        Slot::Culet,
        working
            .culet
            .as_deref()
            .and_then(|c| tables.culet_score(family, c))
            .unwrap_or(0),
    );

    // the ratio attribute joins the tally only when the ratio was computed;
    // otherwise it is absent from numerator and denominator both
    let ratio_window = requirement.and_then(|r| r.length_width_ratio);
    if let (Some(ratio), Some(window)) = (ratio, ratio_window) {
        let value = ratio.to_f64().unwrap_or(f64::NAN);
        tally.push(
            Slot::LengthWidthRatio,
            if window.contains(value) { 5 } else { 0 },
        );
    }

    let pavilion_height = working.pavilion_height.as_deref().and_then(angle_value);
    tally.push(
        Slot::PavilionHeight,
        window_score(pavilion_height, requirement.map(|r| r.pavilion_depth)),
    );

    let pavilion_angle = working.pavilion_angle.as_deref().and_then(angle_value);
    tally.push(
        Slot::PavilionAngle,
        window_score(pavilion_angle, requirement.map(|r| r.pavilion_angle)),
    );

    let table_size = working.table_size.as_deref().and_then(numeric_value);
    tally.push(
        Slot::TableSize,
        window_score(table_size, requirement.map(|r| r.table)),
    );

    let depth = working.depth.as_deref().and_then(numeric_value);
    tally.push(Slot::Depth, window_score(depth, requirement.map(|r| r.depth)));

    tally.push(
        Slot::Girdle,
        working
            .girdle
            .as_deref()
            .and_then(|g| tables.girdle_score(g, family))
            .unwrap_or(0),
    );

    tally.push(
        Slot::Polish,
        graded_score(tables, &working.polish, GradeColumn::Polish),
    );
    tally.push(
        Slot::Symmetry,
        graded_score(tables, &working.symmetry, GradeColumn::Symmetry),
    );
    tally.push(Slot::Cut, graded_score(tables, &working.cut, GradeColumn::Cut));

    tally.push(Slot::Fluorescence, fluorescence_score(tables, &working));
    tally.push(Slot::KeyToSymbol, symbol_score(tables, &working));

    assemble(family, tally, original, working, ratio)
}

/// Package the tally into the score record and stamp the cleaned record.
///
/// Runs strictly after the composite is computed, so the "Not Applicable"
/// folding never perturbs the score.
fn assemble(
    family: ShapeFamily,
    tally: Tally,
    original: RawCertificateRecord,
    working: WorkingRecord,
    ratio: Option<Decimal>,
) -> Evaluation {
    let digisation_score = tally.composite();

    tracing::debug!(
        family = %family,
        score = %digisation_score,
        attributes = tally.entries.len(),
        "evaluation complete"
    );

    let scores = ScoreRecord {
        cut_score: tally.slot(Slot::Cut),
        digisation_score,
        pavilion_angle_score: tally.slot(Slot::PavilionAngle),
        pavilion_height_score: tally.slot(Slot::PavilionHeight),
        measurement_score: tally.slot(Slot::Measurement),
        table_size_score: tally.slot(Slot::TableSize),
        symmetry_score: tally.slot(Slot::Symmetry),
        polish_score: tally.slot(Slot::Polish),
        girdle_score: tally.slot(Slot::Girdle),
        fluorescence_score: tally.slot(Slot::Fluorescence),
        depth_score: tally.slot(Slot::Depth),
        culet_score: tally.slot(Slot::Culet),
        key_to_symbol_score: tally.slot(Slot::KeyToSymbol),
        length_width_ratio_score: tally.slot(Slot::LengthWidthRatio),
        crown_angle_score: tally.slot(Slot::CrownAngle),
    };

    let nd = |field: &Option<String>| field.clone().unwrap_or_else(|| NO_DATA.to_string());
    let structural = |field: &Option<String>| {
        field
            .clone()
            .unwrap_or_else(|| NOT_APPLICABLE.to_string())
    };

    let cleaned = CleanedRecord {
        shape: nd(&working.shape),
        carat: nd(&working.carat),
        color_grade: nd(&working.color_grade),
        clarity: nd(&working.clarity),
        cut: structural(&working.cut),
        polish: nd(&working.polish),
        symmetry: nd(&working.symmetry),
        fluorescence: nd(&working.fluorescence),
        girdle: nd(&working.girdle),
        culet: nd(&working.culet),
        measurement: nd(&working.measurement),
        table_size: nd(&working.table_size),
        depth: nd(&working.depth),
        crown_angle: structural(&working.crown_angle),
        crown_height: structural(&working.crown_height),
        pavilion_angle: structural(&working.pavilion_angle),
        pavilion_height: structural(&working.pavilion_height),
        star_length: structural(&working.star_length),
        lower_half_length: structural(&working.lower_half_length),
        key_to_symbol: nd(&working.key_to_symbol),
        length_width_ratio: ratio,
    };

    Evaluation {
        family,
        scores,
        original,
        cleaned,
        substituted_fields: working.substituted,
    }
}
