pub mod classifier;
pub mod dataset;

pub use classifier::{Features, ForestClassifier};
pub use dataset::{ReferenceDataset, ScoreRecord};
