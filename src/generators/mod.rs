//! Prompt, shape check and fallback for each generative endpoint.

pub mod analysis;
pub mod brands;
pub mod ideas;
pub mod market;
pub mod pitch;
pub mod valuation;

pub use analysis::{NarrativeContext, StartupAnalysis};
pub use brands::BrandNaming;
pub use ideas::IdeaGeneration;
pub use market::MarketAnalysis;
pub use pitch::PitchDeck;
pub use valuation::{ValuationEstimate, ValuationInput};
