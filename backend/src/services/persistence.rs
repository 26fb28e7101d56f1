//! Persistence of digitization results
//!
//! Upserts the digitization-attributes row and the score row keyed by gem,
//! updates the product characteristics with the numeric composite, stamps
//! the one-time extraction timestamp, and finally marks the inventory row
//! processed with foreign keys to both new rows.
//!
//! Column names (including the historic `flouroscence`, `gridle_score` and
//! `pavilior_height_score` misspellings) are the downstream contract and
//! must not be corrected here.

use chrono::Utc;
use sqlx::PgPool;

use crate::error::AppResult;
use shared::{AttributeScore, CleanedRecord, ScoreRecord};

/// Service for writing digitization results
#[derive(Clone)]
pub struct PersistenceService {
    db: PgPool,
}

impl PersistenceService {
    /// Create a new PersistenceService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Upsert the digitization-attributes row, returning its id.
    ///
    /// Round gems persist the crown/pavilion/cut geometry columns as well.
    pub async fn upsert_digitization(
        &self,
        gem_id: &str,
        cleaned: &CleanedRecord,
        is_round: bool,
    ) -> AppResult<i64> {
        let id: i64 = if is_round {
            sqlx::query_scalar(
                r#"
                INSERT INTO public."Affiliate_app_digitization" (
                    diamond_id, culet, depth, flouroscence, key_to_symbol,
                    measurement, table_size, girdle, clarity, color, shape,
                    symmetry, polish, carat, reprocess_status, value_check,
                    crown_angle, crown_height, pavilion_height, pavilion_angle,
                    cut, lower_half_length, star_length
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                        $14, $15, $16, $17, $18, $19, $20, $21, $22, $23)
                ON CONFLICT (diamond_id) DO UPDATE SET
                    culet = EXCLUDED.culet,
                    depth = EXCLUDED.depth,
                    flouroscence = EXCLUDED.flouroscence,
                    key_to_symbol = EXCLUDED.key_to_symbol,
                    measurement = EXCLUDED.measurement,
                    table_size = EXCLUDED.table_size,
                    girdle = EXCLUDED.girdle,
                    clarity = EXCLUDED.clarity,
                    color = EXCLUDED.color,
                    shape = EXCLUDED.shape,
                    symmetry = EXCLUDED.symmetry,
                    polish = EXCLUDED.polish,
                    carat = EXCLUDED.carat,
                    reprocess_status = EXCLUDED.reprocess_status,
                    value_check = EXCLUDED.value_check,
                    crown_angle = EXCLUDED.crown_angle,
                    crown_height = EXCLUDED.crown_height,
                    pavilion_height = EXCLUDED.pavilion_height,
                    pavilion_angle = EXCLUDED.pavilion_angle,
                    cut = EXCLUDED.cut,
                    lower_half_length = EXCLUDED.lower_half_length,
                    star_length = EXCLUDED.star_length
                RETURNING id
                "#,
            )
            .bind(gem_id)
            .bind(&cleaned.culet)
            .bind(&cleaned.depth)
            .bind(&cleaned.fluorescence)
            .bind(&cleaned.key_to_symbol)
            .bind(&cleaned.measurement)
            .bind(&cleaned.table_size)
            .bind(&cleaned.girdle)
            .bind(&cleaned.clarity)
            .bind(&cleaned.color_grade)
            .bind(&cleaned.shape)
            .bind(&cleaned.symmetry)
            .bind(&cleaned.polish)
            .bind(&cleaned.carat)
            .bind("pending")
            .bind("DF")
            .bind(&cleaned.crown_angle)
            .bind(&cleaned.crown_height)
            .bind(&cleaned.pavilion_height)
            .bind(&cleaned.pavilion_angle)
            .bind(&cleaned.cut)
            .bind(&cleaned.lower_half_length)
            .bind(&cleaned.star_length)
            .fetch_one(&self.db)
            .await?
        } else {
            sqlx::query_scalar(
                r#"
                INSERT INTO public."Affiliate_app_digitization" (
                    diamond_id, culet, depth, flouroscence, key_to_symbol,
                    measurement, table_size, girdle, clarity, color, shape,
                    symmetry, polish, carat, reprocess_status, value_check
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                        $14, $15, $16)
                ON CONFLICT (diamond_id) DO UPDATE SET
                    culet = EXCLUDED.culet,
                    depth = EXCLUDED.depth,
                    flouroscence = EXCLUDED.flouroscence,
                    key_to_symbol = EXCLUDED.key_to_symbol,
                    measurement = EXCLUDED.measurement,
                    table_size = EXCLUDED.table_size,
                    girdle = EXCLUDED.girdle,
                    clarity = EXCLUDED.clarity,
                    color = EXCLUDED.color,
                    shape = EXCLUDED.shape,
                    symmetry = EXCLUDED.symmetry,
                    polish = EXCLUDED.polish,
                    carat = EXCLUDED.carat,
                    reprocess_status = EXCLUDED.reprocess_status,
                    value_check = EXCLUDED.value_check
                RETURNING id
                "#,
            )
            .bind(gem_id)
            .bind(&cleaned.culet)
            .bind(&cleaned.depth)
            .bind(&cleaned.fluorescence)
            .bind(&cleaned.key_to_symbol)
            .bind(&cleaned.measurement)
            .bind(&cleaned.table_size)
            .bind(&cleaned.girdle)
            .bind(&cleaned.clarity)
            .bind(&cleaned.color_grade)
            .bind(&cleaned.shape)
            .bind(&cleaned.symmetry)
            .bind(&cleaned.polish)
            .bind(&cleaned.carat)
            .bind("pending")
            .bind("DF")
            .fetch_one(&self.db)
            .await?
        };

        tracing::info!(gem_id, id, "digitization row upserted");
        Ok(id)
    }

    /// Upsert the score row, returning its id.
    ///
    /// The composite is stored numerically with the `%` stripped. Round
    /// gems persist the crown/cut/measurement/pavilion score columns too.
    pub async fn upsert_score(
        &self,
        gem_id: &str,
        scores: &ScoreRecord,
        is_round: bool,
    ) -> AppResult<i64> {
        let digisation = numeric_composite(&scores.digisation_score);

        let id: i64 = if is_round {
            sqlx::query_scalar(
                r#"
                INSERT INTO public."Affiliate_app_scoreinfo" (
                    diamond_id, culet_score, depth_score, flouroscence,
                    gridle_score, polish_score, symmetry_score,
                    table_size_score, key_to_symbol_score, digisation_score,
                    crown_angle_score, cut_score, measurement_score,
                    pavilion_angle_score, pavilior_height_score
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                        $13, $14, $15)
                ON CONFLICT (diamond_id) DO UPDATE SET
                    culet_score = EXCLUDED.culet_score,
                    depth_score = EXCLUDED.depth_score,
                    flouroscence = EXCLUDED.flouroscence,
                    gridle_score = EXCLUDED.gridle_score,
                    polish_score = EXCLUDED.polish_score,
                    symmetry_score = EXCLUDED.symmetry_score,
                    table_size_score = EXCLUDED.table_size_score,
                    key_to_symbol_score = EXCLUDED.key_to_symbol_score,
                    digisation_score = EXCLUDED.digisation_score,
                    crown_angle_score = EXCLUDED.crown_angle_score,
                    cut_score = EXCLUDED.cut_score,
                    measurement_score = EXCLUDED.measurement_score,
                    pavilion_angle_score = EXCLUDED.pavilion_angle_score,
                    pavilior_height_score = EXCLUDED.pavilior_height_score
                RETURNING id
                "#,
            )
            .bind(gem_id)
            .bind(scores.culet_score.points())
            .bind(scores.depth_score.points())
            .bind(scores.fluorescence_score.points())
            .bind(scores.girdle_score.points())
            .bind(scores.polish_score.points())
            .bind(scores.symmetry_score.points())
            .bind(scores.table_size_score.points())
            .bind(scores.key_to_symbol_score.points())
            .bind(digisation)
            .bind(scores.crown_angle_score.points())
            .bind(scores.cut_score.points())
            .bind(scores.measurement_score.points())
            .bind(scores.pavilion_angle_score.points())
            .bind(scores.pavilion_height_score.points())
            .fetch_one(&self.db)
            .await?
        } else {
            sqlx::query_scalar(
                r#"
                INSERT INTO public."Affiliate_app_scoreinfo" (
                    diamond_id, culet_score, depth_score, flouroscence,
                    gridle_score, polish_score, symmetry_score,
                    table_size_score, key_to_symbol_score, digisation_score
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                ON CONFLICT (diamond_id) DO UPDATE SET
                    culet_score = EXCLUDED.culet_score,
                    depth_score = EXCLUDED.depth_score,
                    flouroscence = EXCLUDED.flouroscence,
                    gridle_score = EXCLUDED.gridle_score,
                    polish_score = EXCLUDED.polish_score,
                    symmetry_score = EXCLUDED.symmetry_score,
                    table_size_score = EXCLUDED.table_size_score,
                    key_to_symbol_score = EXCLUDED.key_to_symbol_score,
                    digisation_score = EXCLUDED.digisation_score
                RETURNING id
                "#,
            )
            .bind(gem_id)
            .bind(scores.culet_score.points())
            .bind(scores.depth_score.points())
            .bind(scores.fluorescence_score.points())
            .bind(scores.girdle_score.points())
            .bind(scores.polish_score.points())
            .bind(scores.symmetry_score.points())
            .bind(scores.table_size_score.points())
            .bind(scores.key_to_symbol_score.points())
            .bind(digisation)
            .fetch_one(&self.db)
            .await?
        };

        tracing::info!(gem_id, id, "score row upserted");
        Ok(id)
    }

    /// Update the product characteristics row with the composite and the
    /// inclusion score
    pub async fn update_characteristics(
        &self,
        gem_id: &str,
        digisation_score: &str,
        key_to_symbol_score: AttributeScore,
    ) -> AppResult<()> {
        let composite = numeric_composite(digisation_score).unwrap_or(0.0);
        let symbol = key_to_symbol_score
            .points()
            .map(f64::from)
            .unwrap_or(0.0);

        sqlx::query(
            r#"
            UPDATE public."Affiliate_app_productcharacteristics"
            SET digitization_score = $1, key_to_symbol_score = $2
            WHERE diamond_id = $3
            "#,
        )
        .bind(composite)
        .bind(symbol)
        .bind(gem_id)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Insert the one-time extraction timestamp row if none exists yet
    pub async fn ensure_extraction_timestamp(&self, gem_id: &str) -> AppResult<()> {
        let existing: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM authen_app_aidatetimerecord WHERE diamond_id = $1 LIMIT 1",
        )
        .bind(gem_id)
        .fetch_optional(&self.db)
        .await?;

        if existing.is_none() {
            sqlx::query(
                r#"
                INSERT INTO authen_app_aidatetimerecord (diamond_id, type, created_at)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(gem_id)
            .bind("digitization")
            .bind(Utc::now())
            .execute(&self.db)
            .await?;
        }

        Ok(())
    }

    /// Mark the inventory row processed and attach both result row ids
    pub async fn mark_processed(
        &self,
        gem_id: &str,
        digitization_id: i64,
        score_id: i64,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE public."Affiliate_app_productinfo"
            SET status = $1, digitization_id = $2, score_info_id = $3
            WHERE diamond_id = $4
            "#,
        )
        .bind(true)
        .bind(digitization_id)
        .bind(score_id)
        .bind(gem_id)
        .execute(&self.db)
        .await?;

        tracing::info!(gem_id, digitization_id, score_id, "gem marked processed");
        Ok(())
    }
}

/// Composite percentage as a number, `None` when unparseable
fn numeric_composite(digisation_score: &str) -> Option<f64> {
    digisation_score.trim_end_matches('%').parse().ok()
}
