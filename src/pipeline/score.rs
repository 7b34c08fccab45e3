use std::sync::Arc;

use tracing::debug;

use crate::config::{default_score, DEFAULT_CLASSIFIER_PROBABILITY};
use crate::jitter::Jitter;
use crate::ml::{Features, ForestClassifier, ReferenceDataset, ScoreRecord};
use crate::pipeline::input::AnalysisRequest;
use crate::types::Provenance;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedScore {
    /// 0..=100
    pub score: u8,
    pub provenance: Provenance,
}

/// Produces a score from, in order: exact dataset match, classifier, default.
pub struct ScoreResolver {
    dataset: Arc<ReferenceDataset>,
    classifier: Option<Arc<ForestClassifier>>,
    jitter: Arc<Jitter>,
}

impl ScoreResolver {
    pub fn new(
        dataset: Arc<ReferenceDataset>,
        classifier: Option<Arc<ForestClassifier>>,
        jitter: Arc<Jitter>,
    ) -> Self {
        Self { dataset, classifier, jitter }
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn lookup_exact(&self, name: &str) -> Option<&ScoreRecord> {
        self.dataset.lookup_exact(name)
    }

    /// Classifier probability, or `DEFAULT_CLASSIFIER_PROBABILITY` with no artifact.
    pub fn classify(&self, req: &AnalysisRequest) -> f64 {
        match &self.classifier {
            Some(forest) => forest.predict_proba(&Features {
                funding: req.funding,
                team_size: req.team_size,
                sector: &req.sector,
                market: req.market.label(),
                competition: &req.competition,
            }),
            None => DEFAULT_CLASSIFIER_PROBABILITY,
        }
    }

    pub fn resolve(&self, req: &AnalysisRequest) -> ResolvedScore {
        if let Some(score) = self.lookup_exact(&req.startup_name).and_then(ScoreRecord::score) {
            debug!(name = %req.startup_name, score, "Score from reference dataset");
            return ResolvedScore { score, provenance: Provenance::ExactMatch };
        }

        if self.has_classifier() {
            let p = self.classify(req);
            let score = (p * 100.0).round().clamp(0.0, 100.0) as u8;
            debug!(name = %req.startup_name, probability = p, "Score from classifier");
            return ResolvedScore { score, provenance: Provenance::ClassifierModel };
        }

        let base = if req.funding < default_score::SMALL_FUNDING_MAX {
            default_score::SMALL_FUNDING_BASE
        } else {
            default_score::BASE
        };
        ResolvedScore {
            score: self.jitter.score(base),
            provenance: Provenance::Default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::classifier::tests::sample_forest;
    use crate::types::MarketScope;
    use serde_json::json;

    fn dataset() -> Arc<ReferenceDataset> {
        Arc::new(ReferenceDataset::new(vec![ScoreRecord {
            name: "FarmLink".to_string(),
            success_probability: Some(0.91),
            outcome: Some(1),
            funding: 2_000_000.0,
            team_size: 8,
            sector: "AgriTech".to_string(),
            market_size: "Regional".to_string(),
            competition: "Low".to_string(),
        }]))
    }

    fn request(name: &str, funding: f64) -> AnalysisRequest {
        AnalysisRequest::from_body(&json!({
            "startupName": name,
            "funding": funding,
            "marketSize": "Regional",
        }))
        .unwrap()
    }

    #[test]
    fn exact_match_beats_classifier() {
        let resolver = ScoreResolver::new(
            dataset(),
            Some(Arc::new(sample_forest())),
            Arc::new(Jitter::disabled()),
        );
        let r = resolver.resolve(&request(" FARMLINK", 1_000.0));
        assert_eq!(r, ResolvedScore { score: 91, provenance: Provenance::ExactMatch });
    }

    #[test]
    fn classifier_used_without_match() {
        let resolver = ScoreResolver::new(
            dataset(),
            Some(Arc::new(sample_forest())),
            Arc::new(Jitter::disabled()),
        );
        let r = resolver.resolve(&request("Unknown Co", 250_000.0));
        assert_eq!(r, ResolvedScore { score: 70, provenance: Provenance::ClassifierModel });
    }

    #[test]
    fn default_when_nothing_else_available() {
        let resolver = ScoreResolver::new(dataset(), None, Arc::new(Jitter::disabled()));
        assert_eq!(resolver.classify(&request("x", 1.0)), DEFAULT_CLASSIFIER_PROBABILITY);
        let r = resolver.resolve(&request("Unknown Co", 2_000.0));
        assert_eq!(r, ResolvedScore { score: 10, provenance: Provenance::Default });
        let r = resolver.resolve(&request("Unknown Co", 50_000.0));
        assert_eq!(r, ResolvedScore { score: 50, provenance: Provenance::Default });
    }

    #[test]
    fn default_score_jitter_stays_in_range() {
        let resolver = ScoreResolver::new(
            Arc::new(ReferenceDataset::default()),
            None,
            Arc::new(Jitter::new(30, Some(3))),
        );
        let mut req = request("Unknown Co", 0.0);
        req.market = MarketScope::Global;
        for _ in 0..100 {
            let r = resolver.resolve(&req);
            assert!(r.score <= 40);
        }
    }
}
