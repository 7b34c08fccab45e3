//! Shared health state for the /health endpoint.
//! Updated by the narrative generator, the history sink and the writer task.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;

/// Shared health counters. Updated by pipeline components, read by the API.
#[derive(Default)]
pub struct HealthState {
    /// True when a generative model client is configured.
    pub model_configured: AtomicBool,
    /// True when the classifier artifact loaded at startup.
    pub classifier_loaded: AtomicBool,
    /// Rows in the reference dataset.
    pub dataset_rows: AtomicU64,
    /// Generative calls answered by the model.
    pub model_replies: AtomicU64,
    /// Generative calls answered by a fallback payload.
    pub fallbacks: AtomicU64,
    /// History rows written.
    pub history_written: AtomicU64,
    /// History rows dropped (no database, full channel or insert failure).
    pub history_failures: AtomicU64,
}

#[derive(Debug, Serialize)]
pub struct HealthSnapshot {
    pub status: &'static str,
    pub model_configured: bool,
    pub classifier_loaded: bool,
    pub dataset_rows: u64,
    pub model_replies: u64,
    pub fallbacks: u64,
    pub history_written: u64,
    pub history_failures: u64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_model_configured(&self, v: bool) {
        self.model_configured.store(v, Ordering::Relaxed);
    }

    pub fn set_classifier_loaded(&self, v: bool) {
        self.classifier_loaded.store(v, Ordering::Relaxed);
    }

    pub fn set_dataset_rows(&self, n: u64) {
        self.dataset_rows.store(n, Ordering::Relaxed);
    }

    pub fn inc_model_replies(&self) {
        self.model_replies.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_fallbacks(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_history_written(&self) {
        self.history_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_history_failures(&self) {
        self.history_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            status: "ok",
            model_configured: self.model_configured.load(Ordering::Relaxed),
            classifier_loaded: self.classifier_loaded.load(Ordering::Relaxed),
            dataset_rows: self.dataset_rows.load(Ordering::Relaxed),
            model_replies: self.model_replies.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            history_written: self.history_written.load(Ordering::Relaxed),
            history_failures: self.history_failures.load(Ordering::Relaxed),
        }
    }
}
