pub mod github;

pub use github::{Candidate, TalentSearch};
