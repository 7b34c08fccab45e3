pub mod assemble;
pub mod input;
pub mod narrative;
pub mod score;
pub mod veto;

pub use assemble::AnalysisPipeline;
pub use input::AnalysisRequest;
pub use narrative::{NarrativeGenerator, RetryPolicy};
pub use score::ScoreResolver;
pub use veto::VetoRules;
