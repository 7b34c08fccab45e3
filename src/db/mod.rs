pub mod models;
pub mod writer;

pub use models::HistoryRecord;
pub use writer::{HistorySink, HistoryWriter};
