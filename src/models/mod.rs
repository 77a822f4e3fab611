//! Core data models: normalized records, search parameters and identifiers.

mod identifier;
mod record;
mod search;

pub use identifier::{classify, IdType};
pub use record::{CitationMetrics, Identifiers, Record, RecordBuilder, SourceType};
pub use search::{JournalWorks, SearchQuery, SortBy, WorksPage};
