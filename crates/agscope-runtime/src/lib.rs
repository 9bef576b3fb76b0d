pub mod aggregator;
pub mod cache;
pub mod config;
pub mod error;
pub mod report;
pub mod search;
pub mod store;
pub mod workspace;

pub use aggregator::UnifiedIndex;
pub use cache::TranscriptCache;
pub use config::{CacheConfig, Config, ParserConfig, SearchConfig, SourceConfig};
pub use error::{Error, Result};
pub use report::{CorpusReport, IndexReport};
pub use search::{
    PromotionQueue, SearchCanceller, SearchCoordinator, SearchHandle, SearchOutcome, SearchUpdate,
};
pub use store::SessionStore;
pub use workspace::Workspace;
