use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::api::health::HealthState;
use crate::db::models::HistoryRecord;
use crate::error::Result;

/// Receives completed analyses and persists them to SQLite.
/// Runs as a dedicated background task and never blocks a response.
pub struct HistoryWriter {
    pool: sqlx::SqlitePool,
    history_rx: mpsc::Receiver<HistoryRecord>,
    health: Arc<HealthState>,
}

impl HistoryWriter {
    pub fn new(
        pool: sqlx::SqlitePool,
        history_rx: mpsc::Receiver<HistoryRecord>,
        health: Arc<HealthState>,
    ) -> Self {
        Self { pool, history_rx, health }
    }

    pub async fn run(mut self) {
        while let Some(record) = self.history_rx.recv().await {
            match self.write_record(&record).await {
                Ok(()) => {
                    self.health.inc_history_written();
                    debug!(startup = %record.startup_name, score = record.score, "History row written");
                }
                Err(e) => {
                    self.health.inc_history_failures();
                    error!("DB write error: {e}");
                }
            }
        }
    }

    async fn write_record(&self, r: &HistoryRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO analysis_history (
                startup_name, funding, market_size, team_size, sector,
                score, source, result_json, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&r.startup_name)
        .bind(r.funding)
        .bind(&r.market_size)
        .bind(&r.team_size)
        .bind(&r.sector)
        .bind(r.score)
        .bind(&r.source)
        .bind(&r.result_json)
        .bind(r.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Producer side of the history channel. A sink without a channel (no
/// database) drops records silently.
#[derive(Clone)]
pub struct HistorySink {
    tx: Option<mpsc::Sender<HistoryRecord>>,
    health: Arc<HealthState>,
}

impl HistorySink {
    pub fn new(tx: mpsc::Sender<HistoryRecord>, health: Arc<HealthState>) -> Self {
        Self { tx: Some(tx), health }
    }

    pub fn disabled(health: Arc<HealthState>) -> Self {
        Self { tx: None, health }
    }

    /// Best effort: a full or closed channel is logged and counted, the
    /// caller's response is unaffected.
    pub fn record(&self, record: HistoryRecord) {
        let Some(tx) = &self.tx else { return };
        if let Err(e) = tx.try_send(record) {
            self.health.inc_history_failures();
            warn!("History record dropped: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::input::AnalysisRequest;
    use crate::types::{AnalysisResult, NarrativeSource, Provenance};
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    #[derive(Debug, sqlx::FromRow)]
    struct HistoryRow {
        startup_name: String,
        market_size: String,
        score: i64,
        source: String,
        result_json: String,
    }

    async fn memory_pool() -> sqlx::SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    fn record() -> HistoryRecord {
        let req = AnalysisRequest::from_body(&json!({
            "startupName": "FarmLink", "funding": 250000, "marketSize": "Regional"
        }))
        .unwrap();
        let result = AnalysisResult {
            score: 64,
            analysis: "Promising.".to_string(),
            recommendations: vec!["a".into(), "b".into(), "c".into()],
            source: Provenance::ClassifierModel,
            narrative_source: NarrativeSource::Model,
            fallback_reason: None,
        };
        HistoryRecord::new(&req, &result)
    }

    #[tokio::test]
    async fn writer_persists_queued_records() {
        let pool = memory_pool().await;
        let health = Arc::new(HealthState::new());
        let (tx, rx) = mpsc::channel(8);
        let sink = HistorySink::new(tx, Arc::clone(&health));
        let writer = HistoryWriter::new(pool.clone(), rx, Arc::clone(&health));

        sink.record(record());
        drop(sink);
        writer.run().await;

        let rows: Vec<HistoryRow> = sqlx::query_as(
            "SELECT startup_name, market_size, score, source, result_json FROM analysis_history",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].startup_name, "FarmLink");
        assert_eq!(rows[0].score, 64);
        assert_eq!(rows[0].source, "classifier_model");
        assert_eq!(rows[0].market_size, "Regional");
        assert!(rows[0].result_json.contains("\"recommendations\""));
        assert_eq!(health.snapshot().history_written, 1);
    }

    #[tokio::test]
    async fn write_failures_are_counted() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        // No migration: the insert fails.
        let health = Arc::new(HealthState::new());
        let (tx, rx) = mpsc::channel(8);
        let sink = HistorySink::new(tx, Arc::clone(&health));
        sink.record(record());
        drop(sink);
        HistoryWriter::new(pool, rx, Arc::clone(&health)).run().await;
        assert_eq!(health.snapshot().history_failures, 1);
    }

    #[tokio::test]
    async fn full_channel_drops_and_counts() {
        let health = Arc::new(HealthState::new());
        let (tx, _rx) = mpsc::channel(1);
        let sink = HistorySink::new(tx, Arc::clone(&health));
        sink.record(record());
        sink.record(record());
        assert_eq!(health.snapshot().history_failures, 1);

        let disabled = HistorySink::disabled(Arc::clone(&health));
        disabled.record(record());
        assert_eq!(health.snapshot().history_failures, 1);
    }
}
