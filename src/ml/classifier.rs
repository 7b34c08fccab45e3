//! Trained startup-success classifier.
//!
//! The artifact is a JSON export of a random forest: label encodings for the
//! categorical features plus a list of binary trees whose leaves hold the
//! success probability. Prediction averages the leaf reached in every tree,
//! going left when `x[feature] <= threshold`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AppError, Result};

/// Feature vector layout: funding, team size, sector, market, competition.
pub const FEATURE_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Node 0 is the root. Children always sit at higher indices than their parent.
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn predict(&self, x: &[f64; FEATURE_COUNT]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split { feature, threshold, left, right } => {
                    idx = if x[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split { feature, left, right, .. } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(format!("node {idx} splits on unknown feature {feature}"));
                    }
                    for child in [left, right] {
                        if *child <= idx || *child >= self.nodes.len() {
                            return Err(format!("node {idx} has invalid child {child}"));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if !value.is_finite() || !(0.0..=1.0).contains(value) {
                        return Err(format!("leaf {idx} probability {value} out of range"));
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestClassifier {
    /// Label encodings, in the order the trainer assigned codes.
    pub sector_classes: Vec<String>,
    pub market_classes: Vec<String>,
    pub competition_classes: Vec<String>,
    pub trees: Vec<DecisionTree>,
}

/// Raw categorical inputs for one prediction.
#[derive(Debug, Clone, Copy)]
pub struct Features<'a> {
    pub funding: f64,
    pub team_size: u32,
    pub sector: &'a str,
    pub market: &'a str,
    pub competition: &'a str,
}

impl ForestClassifier {
    pub fn from_json(raw: &str) -> std::result::Result<Self, String> {
        let forest: ForestClassifier = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        if forest.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (i, tree) in forest.trees.iter().enumerate() {
            tree.validate().map_err(|e| format!("tree {i}: {e}"))?;
        }
        Ok(forest)
    }

    /// Load the artifact. `Ok(None)` when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Classifier artifact not found at {}, using default probability", path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let forest = Self::from_json(&raw).map_err(|reason| AppError::Artifact {
            path: path.display().to_string(),
            reason,
        })?;
        info!(
            trees = forest.trees.len(),
            "Classifier artifact loaded from {}",
            path.display()
        );
        Ok(Some(forest))
    }

    /// Encode and predict. Unseen categories encode as 0.
    pub fn predict_proba(&self, f: &Features<'_>) -> f64 {
        let x = [
            f.funding,
            f64::from(f.team_size),
            encode(&self.sector_classes, f.sector) as f64,
            encode(&self.market_classes, f.market) as f64,
            encode(&self.competition_classes, f.competition) as f64,
        ];
        let sum: f64 = self.trees.iter().map(|t| t.predict(&x)).sum();
        (sum / self.trees.len() as f64).clamp(0.0, 1.0)
    }
}

/// Position of `value` in `classes` (case-insensitive), 0 when unseen.
pub fn encode(classes: &[String], value: &str) -> usize {
    let value = value.trim();
    classes
        .iter()
        .position(|c| c.eq_ignore_ascii_case(value))
        .unwrap_or(0)
}
