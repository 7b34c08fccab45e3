use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AppError, Result};

/// One row of the reference dataset of known startups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub name: String,
    /// Historical success probability in 0..=1.
    #[serde(default)]
    pub success_probability: Option<f64>,
    /// Binary outcome (1 = succeeded) when no probability is recorded.
    #[serde(default)]
    pub outcome: Option<u8>,
    #[serde(default)]
    pub funding: f64,
    #[serde(default)]
    pub team_size: u32,
    #[serde(default)]
    pub sector: String,
    #[serde(default)]
    pub market_size: String,
    #[serde(default)]
    pub competition: String,
}

impl ScoreRecord {
    /// The row's score as a percentage. Probability wins over outcome.
    pub fn score(&self) -> Option<u8> {
        if let Some(p) = self.success_probability.filter(|p| p.is_finite()) {
            return Some((p.clamp(0.0, 1.0) * 100.0).round() as u8);
        }
        self.outcome.map(|o| if o > 0 { 100 } else { 0 })
    }
}

/// Read-only reference dataset keyed by trimmed, lowercased name.
#[derive(Debug, Default)]
pub struct ReferenceDataset {
    rows: Vec<ScoreRecord>,
    /// match key → index of the first row with that key
    by_name: HashMap<String, usize>,
}

impl ReferenceDataset {
    pub fn new(rows: Vec<ScoreRecord>) -> Self {
        let mut by_name = HashMap::with_capacity(rows.len());
        let mut duplicates = Vec::new();
        for (idx, row) in rows.iter().enumerate() {
            let key = match_key(&row.name);
            if key.is_empty() {
                continue;
            }
            if by_name.contains_key(&key) {
                duplicates.push(key);
            } else {
                by_name.insert(key, idx);
            }
        }
        if !duplicates.is_empty() {
            warn!(
                duplicates = duplicates.len(),
                "Reference dataset has duplicate names, first row wins: {duplicates:?}"
            );
        }
        Self { rows, by_name }
    }

    /// Load a JSON array of records. A missing file yields an empty dataset.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Reference dataset not found at {}, exact-match lookups disabled", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let rows: Vec<ScoreRecord> = serde_json::from_str(&raw).map_err(|e| AppError::Artifact {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        info!("Reference dataset loaded: {} rows from {}", rows.len(), path.display());
        Ok(Self::new(rows))
    }

    /// Trimmed, case-insensitive equality. First row wins on duplicates.
    pub fn lookup_exact(&self, name: &str) -> Option<&ScoreRecord> {
        let key = match_key(name);
        if key.is_empty() {
            return None;
        }
        self.by_name.get(&key).map(|&idx| &self.rows[idx])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn match_key(name: &str) -> String {
    name.trim().to_lowercase()
}
