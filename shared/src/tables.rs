//! Engine configuration tables
//!
//! Two static JSON documents drive the evaluator: per-shape-family geometric
//! tolerance windows and the named characteristic lookup tables (girdle,
//! culet, polish/symmetry/cut, fluorescence, inclusion symbols, the
//! out-of-window angle curves, and the carat/diameter table). Both are loaded
//! once at startup into an immutable [`EngineTables`]; any schema problem is
//! a fatal [`TableError`], never a per-record condition.

use serde::Deserialize;
use thiserror::Error;

use crate::classify::ShapeFamily;

/// Fatal configuration-load errors
#[derive(Debug, Error)]
pub enum TableError {
    #[error("configuration is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("missing characteristic table: {0}")]
    MissingTable(&'static str),

    #[error("invalid numeric range '{0}'")]
    InvalidRange(String),

    #[error("characteristic table {table}: {message}")]
    InvalidEntry {
        table: &'static str,
        message: String,
    },
}

/// Inclusive `[min, max]` tolerance window parsed from a `"min-max"` string
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub min: f64,
    pub max: f64,
}

impl Window {
    pub fn parse(text: &str) -> Result<Self, TableError> {
        let mut parts = text.splitn(2, '-');
        let min = parts.next().and_then(|p| p.trim().parse().ok());
        let max = parts.next().and_then(|p| p.trim().parse().ok());
        match (min, max) {
            (Some(min), Some(max)) => Ok(Window { min, max }),
            _ => Err(TableError::InvalidRange(text.to_string())),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Geometric tolerance windows for one shape family
#[derive(Debug, Clone)]
pub struct ShapeRequirement {
    pub length_width_ratio: Option<Window>,
    pub table: Window,
    pub depth: Window,
    pub pavilion_angle: Window,
    pub pavilion_depth: Window,
    /// Round family only
    pub crown_angle: Option<Window>,
}

/// Key of a graduated curve table: either a span or a single pinned value
#[derive(Debug, Clone, Copy)]
enum CurveKey {
    Span(f64, f64),
    Exact(f64),
}

impl CurveKey {
    fn parse(text: &str) -> Result<Self, TableError> {
        let parts: Vec<&str> = text.split('-').collect();
        if parts.len() == 2 {
            let window = Window::parse(text)?;
            Ok(CurveKey::Span(window.min, window.max))
        } else {
            text.trim()
                .parse()
                .map(CurveKey::Exact)
                .map_err(|_| TableError::InvalidRange(text.to_string()))
        }
    }

    fn matches(&self, value: f64) -> bool {
        match self {
            CurveKey::Span(min, max) => value >= *min && value <= *max,
            CurveKey::Exact(pin) => value == *pin,
        }
    }
}

/// Sub-score column within a `ROUND SCORE` grade row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeColumn {
    Cut = 0,
    Polish = 1,
    Symmetry = 2,
}

#[derive(Debug, Clone)]
struct GradedRow {
    grade: String,
    columns: Vec<i32>,
}

#[derive(Debug, Clone)]
struct CuletShapeTable {
    shape: String,
    entries: Vec<(String, i32)>,
}

#[derive(Debug, Clone)]
struct FluorescenceRow {
    color: String,
    entries: Vec<(String, i32)>,
}

#[derive(Debug, Clone)]
struct MeasurementBucket {
    weight: Window,
    min_diameter: f64,
}

/// All lookup tables, loaded once and shared read-only across evaluations
#[derive(Debug, Clone)]
pub struct EngineTables {
    requirements: Vec<(String, ShapeRequirement)>,
    girdle: Vec<(String, i32)>,
    girdle_heart: Vec<(String, i32)>,
    culet: Vec<CuletShapeTable>,
    graded: Vec<GradedRow>,
    fluorescence: Vec<FluorescenceRow>,
    symbols: Vec<(String, i32)>,
    pavilion_curve: Vec<(CurveKey, i32)>,
    crown_curve: Vec<(CurveKey, i32)>,
    measurement: Vec<MeasurementBucket>,
}

// ---------------------------------------------------------------------------
// Wire schema
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ShapeRequirementEntry {
    #[serde(rename = "Diamond_type")]
    diamond_type: String,
    #[serde(rename = "Diamonds_req")]
    requirements: RawRequirement,
}

#[derive(Deserialize)]
struct RawRequirement {
    length_width_ratio: Option<String>,
    table: String,
    depth: String,
    pavilion_angle: String,
    pavilion_depth: String,
    crown_angle: Option<String>,
}

#[derive(Deserialize)]
struct CharacteristicEntry {
    characteristic_name: String,
    characteristic_data: serde_json::Value,
}

const GIRDLE_TABLE: &str = "GIRDLE THICKNESS";
const GIRDLE_HEART_TABLE: &str = "GIRDLE THICKNESS HEART";
const CULET_TABLE: &str = "culet";
const GRADED_TABLE: &str = "ROUND SCORE";
const FLUORESCENCE_TABLE: &str = "FLUORESCENCE";
const SYMBOLS_TABLE: &str = "KEYS TO SYMBOLS";
const PAVILION_CURVE_TABLE: &str = "pavillion_angle";
const CROWN_CURVE_TABLE: &str = "round_crown";
const MEASUREMENT_TABLE: &str = "measurement";

impl EngineTables {
    /// Parse both configuration documents and validate every entry
    pub fn from_json(
        requirements_json: &str,
        characteristics_json: &str,
    ) -> Result<Self, TableError> {
        let requirement_entries: Vec<ShapeRequirementEntry> =
            serde_json::from_str(requirements_json)?;

        let mut requirements = Vec::with_capacity(requirement_entries.len());
        for entry in requirement_entries {
            let raw = entry.requirements;
            let requirement = ShapeRequirement {
                length_width_ratio: raw
                    .length_width_ratio
                    .as_deref()
                    .map(Window::parse)
                    .transpose()?,
                table: Window::parse(&raw.table)?,
                depth: Window::parse(&raw.depth)?,
                pavilion_angle: Window::parse(&raw.pavilion_angle)?,
                pavilion_depth: Window::parse(&raw.pavilion_depth)?,
                crown_angle: raw.crown_angle.as_deref().map(Window::parse).transpose()?,
            };
            requirements.push((entry.diamond_type.to_lowercase(), requirement));
        }

        let characteristic_entries: Vec<CharacteristicEntry> =
            serde_json::from_str(characteristics_json)?;

        fn find<'a>(
            entries: &'a [CharacteristicEntry],
            name: &'static str,
        ) -> Result<&'a serde_json::Value, TableError> {
            entries
                .iter()
                .find(|e| e.characteristic_name == name)
                .map(|e| &e.characteristic_data)
                .ok_or(TableError::MissingTable(name))
        }

        let find = |name| find(&characteristic_entries, name);

        let tables = EngineTables {
            requirements,
            girdle: parse_flat_table(find(GIRDLE_TABLE)?, GIRDLE_TABLE)?,
            girdle_heart: parse_flat_table(find(GIRDLE_HEART_TABLE)?, GIRDLE_HEART_TABLE)?,
            culet: parse_culet_table(find(CULET_TABLE)?)?,
            graded: parse_graded_table(find(GRADED_TABLE)?)?,
            fluorescence: parse_fluorescence_table(find(FLUORESCENCE_TABLE)?)?,
            symbols: parse_symbol_table(find(SYMBOLS_TABLE)?)?,
            pavilion_curve: parse_curve_table(find(PAVILION_CURVE_TABLE)?, PAVILION_CURVE_TABLE)?,
            crown_curve: parse_curve_table(find(CROWN_CURVE_TABLE)?, CROWN_CURVE_TABLE)?,
            measurement: parse_measurement_table(find(MEASUREMENT_TABLE)?)?,
        };

        tracing::debug!(
            shapes = tables.requirements.len(),
            symbols = tables.symbols.len(),
            "engine tables loaded"
        );

        Ok(tables)
    }

    /// Tolerance windows for a shape family, if configured
    pub fn requirement(&self, family: ShapeFamily) -> Option<&ShapeRequirement> {
        self.requirement_for_key(family.key())
    }

    /// Tolerance windows looked up by raw family key (used with shape hints)
    pub fn requirement_for_key(&self, key: &str) -> Option<&ShapeRequirement> {
        self.requirements
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, r)| r)
    }

    /// Girdle thickness score; the heart family has its own table
    pub fn girdle_score(&self, description: &str, family: ShapeFamily) -> Option<i32> {
        let table = if family == ShapeFamily::Heart {
            &self.girdle_heart
        } else {
            &self.girdle
        };
        table
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(description))
            .map(|(_, value)| *value)
    }

    /// Culet score from the family's sub-table.
    ///
    /// Sub-tables are keyed by a shape fragment contained in the family key,
    /// so one "radiant" sub-table covers both radiant families.
    pub fn culet_score(&self, family: ShapeFamily, description: &str) -> Option<i32> {
        let family_key = family.key();
        for sub_table in &self.culet {
            if family_key.contains(sub_table.shape.to_lowercase().as_str()) {
                return sub_table
                    .entries
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(description))
                    .map(|(_, value)| *value);
            }
        }
        None
    }

    /// Polish/symmetry/cut sub-score for a grade word
    pub fn graded_score(&self, grade: &str, column: GradeColumn) -> Option<i32> {
        self.graded
            .iter()
            .find(|row| row.grade.trim().eq_ignore_ascii_case(grade.trim()))
            .and_then(|row| row.columns.get(column as usize).copied())
    }

    /// Fluorescence score keyed by (description, color grade letter).
    ///
    /// A description of `none` reads the color row's `default` entry.
    pub fn fluorescence_score(&self, description: &str, color_grade: &str) -> Option<i32> {
        let key = if description.eq_ignore_ascii_case("none") {
            "default"
        } else {
            description
        };
        self.fluorescence
            .iter()
            .find(|row| row.color == color_grade.trim_end())
            .and_then(|row| {
                row.entries
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(key))
                    .map(|(_, value)| *value)
            })
    }

    /// Penalty score for one canonical inclusion/characteristic token
    pub fn symbol_score(&self, token: &str) -> Option<i32> {
        self.symbols
            .iter()
            .find(|(name, _)| name == token)
            .map(|(_, value)| *value)
    }

    /// Graduated fallback score for an out-of-window pavilion angle
    pub fn pavilion_curve_score(&self, value: f64) -> i32 {
        curve_lookup(&self.pavilion_curve, value)
    }

    /// Graduated fallback score for an out-of-window crown angle
    pub fn crown_curve_score(&self, value: f64) -> i32 {
        curve_lookup(&self.crown_curve, value)
    }

    /// Round diameter-vs-carat score.
    ///
    /// 5 when the diameter reaches the carat bucket's minimum; stones of two
    /// carats and up always pass at eight millimetres or more.
    pub fn measurement_score(&self, diameter: f64, carat: f64) -> i32 {
        for bucket in &self.measurement {
            if bucket.weight.contains(carat) && diameter >= bucket.min_diameter {
                return 5;
            }
        }
        if carat >= 2.0 && diameter >= 8.0 {
            return 5;
        }
        0
    }
}

fn curve_lookup(curve: &[(CurveKey, i32)], value: f64) -> i32 {
    curve
        .iter()
        .find(|(key, _)| key.matches(value))
        .map(|(_, score)| *score)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Per-table parsers
// ---------------------------------------------------------------------------

fn entry_error(table: &'static str, message: impl Into<String>) -> TableError {
    TableError::InvalidEntry {
        table,
        message: message.into(),
    }
}

fn value_as_score(
    value: &serde_json::Value,
    table: &'static str,
) -> Result<i32, TableError> {
    value
        .as_i64()
        .map(|v| v as i32)
        .ok_or_else(|| entry_error(table, format!("non-integer score: {value}")))
}

fn parse_flat_table(
    data: &serde_json::Value,
    table: &'static str,
) -> Result<Vec<(String, i32)>, TableError> {
    let items = data
        .as_array()
        .ok_or_else(|| entry_error(table, "expected a list"))?;
    let mut parsed = Vec::with_capacity(items.len());
    for item in items {
        let name = item["name"]
            .as_str()
            .ok_or_else(|| entry_error(table, "entry without a name"))?;
        parsed.push((name.to_string(), value_as_score(&item["value"], table)?));
    }
    Ok(parsed)
}

fn parse_culet_table(data: &serde_json::Value) -> Result<Vec<CuletShapeTable>, TableError> {
    let items = data
        .as_array()
        .ok_or_else(|| entry_error(CULET_TABLE, "expected a list"))?;
    let mut parsed = Vec::with_capacity(items.len());
    for item in items {
        let shape = item["shape"]
            .as_str()
            .ok_or_else(|| entry_error(CULET_TABLE, "sub-table without a shape"))?;
        let values = item["value"]
            .as_array()
            .ok_or_else(|| entry_error(CULET_TABLE, "sub-table without values"))?;
        let mut entries = Vec::with_capacity(values.len());
        for value in values {
            let name = value["name"]
                .as_str()
                .ok_or_else(|| entry_error(CULET_TABLE, "entry without a name"))?;
            entries.push((name.to_string(), value_as_score(&value["value"], CULET_TABLE)?));
        }
        parsed.push(CuletShapeTable {
            shape: shape.to_string(),
            entries,
        });
    }
    Ok(parsed)
}

fn parse_graded_table(data: &serde_json::Value) -> Result<Vec<GradedRow>, TableError> {
    let items = data
        .as_array()
        .ok_or_else(|| entry_error(GRADED_TABLE, "expected a list"))?;
    let mut parsed = Vec::with_capacity(items.len());
    for item in items {
        let grade = item["data_type"]
            .as_str()
            .ok_or_else(|| entry_error(GRADED_TABLE, "row without a data_type"))?;
        let configs = item["type_configuration"]
            .as_array()
            .ok_or_else(|| entry_error(GRADED_TABLE, "row without type_configuration"))?;
        let mut columns = Vec::with_capacity(configs.len());
        for config in configs {
            columns.push(value_as_score(&config["value"], GRADED_TABLE)?);
        }
        if columns.len() < 3 {
            return Err(entry_error(
                GRADED_TABLE,
                format!("row '{grade}' needs cut/polish/symmetry columns"),
            ));
        }
        parsed.push(GradedRow {
            grade: grade.to_string(),
            columns,
        });
    }
    Ok(parsed)
}

fn parse_fluorescence_table(
    data: &serde_json::Value,
) -> Result<Vec<FluorescenceRow>, TableError> {
    let items = data
        .as_array()
        .ok_or_else(|| entry_error(FLUORESCENCE_TABLE, "expected a list"))?;
    let mut parsed = Vec::with_capacity(items.len());
    for item in items {
        let color = item["data_type"]
            .as_str()
            .ok_or_else(|| entry_error(FLUORESCENCE_TABLE, "row without a data_type"))?;
        let configs = item["type_configuration"]
            .as_array()
            .ok_or_else(|| entry_error(FLUORESCENCE_TABLE, "row without type_configuration"))?;
        let mut entries = Vec::with_capacity(configs.len());
        for config in configs {
            let name = config["name"]
                .as_str()
                .ok_or_else(|| entry_error(FLUORESCENCE_TABLE, "entry without a name"))?;
            entries.push((
                name.to_string(),
                value_as_score(&config["value"], FLUORESCENCE_TABLE)?,
            ));
        }
        parsed.push(FluorescenceRow {
            color: color.to_string(),
            entries,
        });
    }
    Ok(parsed)
}

fn parse_symbol_table(data: &serde_json::Value) -> Result<Vec<(String, i32)>, TableError> {
    let items = data
        .as_array()
        .ok_or_else(|| entry_error(SYMBOLS_TABLE, "expected a list"))?;
    let mut parsed = Vec::with_capacity(items.len());
    for item in items {
        let name = item["data_type"]
            .as_str()
            .ok_or_else(|| entry_error(SYMBOLS_TABLE, "row without a data_type"))?;
        let score = item["type_configuration"]
            .as_array()
            .and_then(|configs| configs.first())
            .map(|config| value_as_score(&config["value"], SYMBOLS_TABLE))
            .ok_or_else(|| entry_error(SYMBOLS_TABLE, format!("row '{name}' has no score")))??;
        parsed.push((name.to_string(), score));
    }
    Ok(parsed)
}

fn parse_curve_table(
    data: &serde_json::Value,
    table: &'static str,
) -> Result<Vec<(CurveKey, i32)>, TableError> {
    let map = data
        .as_object()
        .ok_or_else(|| entry_error(table, "expected a range-keyed map"))?;
    let mut parsed = Vec::with_capacity(map.len());
    for (key, value) in map {
        parsed.push((CurveKey::parse(key)?, value_as_score(value, table)?));
    }
    Ok(parsed)
}

fn parse_measurement_table(
    data: &serde_json::Value,
) -> Result<Vec<MeasurementBucket>, TableError> {
    let items = data
        .as_array()
        .ok_or_else(|| entry_error(MEASUREMENT_TABLE, "expected a list"))?;
    let mut parsed = Vec::with_capacity(items.len());
    for item in items {
        let weight = item["weight"]
            .as_str()
            .ok_or_else(|| entry_error(MEASUREMENT_TABLE, "bucket without a weight range"))?;
        let min_diameter = item["value"]
            .as_f64()
            .ok_or_else(|| entry_error(MEASUREMENT_TABLE, "bucket without a diameter"))?;
        parsed.push(MeasurementBucket {
            weight: Window::parse(weight)?,
            min_diameter,
        });
    }
    Ok(parsed)
}
