//! Pending-inventory fetching
//!
//! Supplies the next page of gems awaiting digitization. Pagination rides a
//! persisted cursor (the last processed inventory row id) so repeated worker
//! runs walk the inventory without re-reading processed rows.

use std::path::PathBuf;

use anyhow::Context;
use sqlx::PgPool;

use crate::error::AppResult;

/// One gem awaiting digitization
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PendingGem {
    /// Inventory row id, used as the pagination cursor
    pub id: i64,
    /// Gem identifier shared with the downstream rows
    #[sqlx(rename = "diamond_id")]
    pub gem_id: String,
    pub certificate_link: String,
}

/// Service for walking the pending inventory
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
    cursor_path: PathBuf,
}

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: PgPool, cursor_path: impl Into<PathBuf>) -> Self {
        Self {
            db,
            cursor_path: cursor_path.into(),
        }
    }

    /// Last processed inventory row id, zero when no run has completed yet
    pub async fn read_cursor(&self) -> i64 {
        match tokio::fs::read_to_string(&self.cursor_path).await {
            Ok(content) => content.trim().parse().unwrap_or(0),
            Err(_) => 0,
        }
    }

    /// Persist the cursor after a batch commits
    pub async fn advance_cursor(&self, last_id: i64) -> AppResult<()> {
        tokio::fs::write(&self.cursor_path, last_id.to_string())
            .await
            .with_context(|| format!("writing cursor file {}", self.cursor_path.display()))?;
        Ok(())
    }

    /// Fetch the next page of unprocessed gems above the cursor
    pub async fn fetch_pending(&self, batch_size: i64) -> AppResult<Vec<PendingGem>> {
        let cursor = self.read_cursor().await;

        let rows = sqlx::query_as::<_, PendingGem>(
            r#"
            SELECT id, diamond_id, certificate_link
            FROM public."Affiliate_app_productinfo"
            WHERE id > $1
              AND status = false
              AND certificate_link IS NOT NULL
            ORDER BY id ASC
            LIMIT $2
            "#,
        )
        .bind(cursor)
        .bind(batch_size)
        .fetch_all(&self.db)
        .await?;

        tracing::info!(
            cursor,
            fetched = rows.len(),
            "fetched pending gems from inventory"
        );

        Ok(rows)
    }
}
