use tracing::info;

use crate::db::{HistoryRecord, HistorySink};
use crate::error::Result;
use crate::generators::{NarrativeContext, StartupAnalysis};
use crate::pipeline::input::AnalysisRequest;
use crate::pipeline::narrative::NarrativeGenerator;
use crate::pipeline::score::ScoreResolver;
use crate::pipeline::veto::VetoRules;
use crate::types::AnalysisResult;

/// Score → veto rules → narrative → result, with the result queued for history.
pub struct AnalysisPipeline {
    resolver: ScoreResolver,
    generator: NarrativeGenerator,
    veto: VetoRules,
    history: HistorySink,
}

impl AnalysisPipeline {
    pub fn new(
        resolver: ScoreResolver,
        generator: NarrativeGenerator,
        veto: VetoRules,
        history: HistorySink,
    ) -> Self {
        Self { resolver, generator, veto, history }
    }

    pub fn generator(&self) -> &NarrativeGenerator {
        &self.generator
    }

    pub async fn run(&self, request: AnalysisRequest) -> Result<AnalysisResult> {
        let resolved = self.resolver.resolve(&request);
        let verdict = self.veto.apply(resolved.score, &request);
        if let Some(rule) = verdict.rule {
            info!(
                name = %request.startup_name,
                ?rule,
                from = resolved.score,
                to = verdict.score,
                "Veto rule applied"
            );
        }

        // The narrative quotes the final score.
        let ctx = NarrativeContext { request, score: verdict.score };
        let generated = self.generator.run::<StartupAnalysis>(&ctx).await?;
        let narrative_source = generated.source();
        let fallback_reason = generated.reason();
        let narrative = generated.into_value();

        let result = AnalysisResult {
            score: verdict.score,
            analysis: verdict.narrative.unwrap_or(narrative.analysis),
            recommendations: narrative.recommendations,
            source: resolved.provenance,
            narrative_source,
            fallback_reason,
        };

        self.history.record(HistoryRecord::new(&ctx.request, &result));
        Ok(result)
    }
}
