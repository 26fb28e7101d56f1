//! Per-gem scoring orchestration
//!
//! Sequences the pipeline for each pending gem: vision extraction, engine
//! evaluation, listing rejection flags, and persistence. Per-gem failures
//! are logged and never abort the batch; only the cursor advance at the end
//! of a batch is shared state.

use std::sync::Arc;

use shared::{evaluate, EngineError, EngineTables, Evaluation};

use crate::error::{AppError, AppResult};
use crate::external::CertificateVisionClient;
use crate::services::inventory::{InventoryService, PendingGem};
use crate::services::persistence::PersistenceService;

/// Fluorescence descriptions that reject a gem from listing
pub const FLUORESCENCE_REJECTIONS: &[&str] = &["yellow", "Strong Blue", "Very Strong Blue"];

/// Inclusion characteristics that reject a gem from listing
pub const SYMBOL_REJECTIONS: &[&str] = &["Cavity", "Etched Channel", "Knot", "Laser Drill"];

/// True when a fluorescence description is on the rejection list.
///
/// Negated descriptions ("not strong blue") never reject.
pub fn fluorescence_rejected(value: &str) -> bool {
    let value = value.to_lowercase();
    if value.contains("not") {
        return false;
    }
    FLUORESCENCE_REJECTIONS
        .iter()
        .any(|rejected| rejected.to_lowercase() == value)
}

/// True when any comma-delimited symbol is on the rejection list
pub fn symbol_rejected(symbols: &str) -> bool {
    let lowered = symbols.to_lowercase();
    if lowered.is_empty() || lowered.contains("not") || lowered == "none" {
        return false;
    }
    lowered.split(',').any(|token| {
        SYMBOL_REJECTIONS
            .iter()
            .any(|rejected| rejected.to_lowercase() == token.trim())
    })
}

/// Outcome of one batch run
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub fetched: usize,
    pub processed: usize,
    pub unclassified: usize,
    pub failed: usize,
}

/// Service orchestrating the digitization pipeline
#[derive(Clone)]
pub struct ScoringService {
    tables: Arc<EngineTables>,
    vision: CertificateVisionClient,
    inventory: InventoryService,
    persistence: PersistenceService,
}

impl ScoringService {
    /// Create a new ScoringService instance
    pub fn new(
        tables: Arc<EngineTables>,
        vision: CertificateVisionClient,
        inventory: InventoryService,
        persistence: PersistenceService,
    ) -> Self {
        Self {
            tables,
            vision,
            inventory,
            persistence,
        }
    }

    /// Process one batch of pending gems.
    ///
    /// The cursor advances past every fetched row, including failures;
    /// failed gems stay unprocessed in the inventory and are picked up by
    /// the retry run.
    pub async fn process_batch(&self, batch_size: i64) -> AppResult<BatchSummary> {
        let pending = self.inventory.fetch_pending(batch_size).await?;

        let mut summary = BatchSummary {
            fetched: pending.len(),
            ..Default::default()
        };

        for gem in &pending {
            match self.process_gem(gem).await {
                Ok(()) => summary.processed += 1,
                Err(AppError::Engine(EngineError::UnknownShape)) => {
                    summary.unclassified += 1;
                    tracing::warn!(
                        gem_id = %gem.gem_id,
                        "can't find shape from data; routed to manual review"
                    );
                }
                Err(error) => {
                    summary.failed += 1;
                    tracing::error!(gem_id = %gem.gem_id, %error, "gem processing failed");
                }
            }
        }

        if let Some(last) = pending.last() {
            self.inventory.advance_cursor(last.id).await?;
        }

        tracing::info!(
            fetched = summary.fetched,
            processed = summary.processed,
            unclassified = summary.unclassified,
            failed = summary.failed,
            "batch complete"
        );

        Ok(summary)
    }

    async fn process_gem(&self, gem: &PendingGem) -> AppResult<()> {
        let raw = self.vision.extract(&gem.certificate_link).await?;

        // live runs score the extraction alone; the affiliate override set
        // is only supplied on reprocessing
        let evaluation = evaluate(&self.tables, &raw, None)?;

        self.log_evaluation(gem, &evaluation);
        self.persist(gem, &evaluation).await
    }

    fn log_evaluation(&self, gem: &PendingGem, evaluation: &Evaluation) {
        let cleaned = &evaluation.cleaned;
        tracing::info!(
            gem_id = %gem.gem_id,
            shape = %cleaned.shape,
            score = %evaluation.scores.digisation_score,
            fluorescence_rejected = fluorescence_rejected(&cleaned.fluorescence),
            symbol_rejected = symbol_rejected(&cleaned.key_to_symbol),
            color = %cleaned.color_grade,
            culet = %cleaned.culet,
            girdle = %cleaned.girdle_description(),
            "gem scored"
        );
    }

    async fn persist(&self, gem: &PendingGem, evaluation: &Evaluation) -> AppResult<()> {
        let digitization_id = self
            .persistence
            .upsert_digitization(
                &gem.gem_id,
                &evaluation.cleaned,
                evaluation.family.is_round(),
            )
            .await?;

        let score_id = self
            .persistence
            .upsert_score(
                &gem.gem_id,
                &evaluation.scores,
                evaluation.family.is_round(),
            )
            .await?;

        self.persistence
            .ensure_extraction_timestamp(&gem.gem_id)
            .await?;

        self.persistence
            .update_characteristics(
                &gem.gem_id,
                &evaluation.scores.digisation_score,
                evaluation.scores.key_to_symbol_score,
            )
            .await?;

        self.persistence
            .mark_processed(&gem.gem_id, digitization_id, score_id)
            .await
    }
}
