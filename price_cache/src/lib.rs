//! Cache-aside storage for daily price records.
//!
//! Records are stored one JSON document per calendar day, keyed by the day
//! string. [`store::PriceCache`] writes a full history in bulk and rebuilds the
//! N-day window by probing day keys backwards from yesterday.

pub mod backend;
pub mod store;

pub use backend::{BackendError, DocumentStore, memory::MemoryBackend, redis_json::RedisJsonBackend};
pub use store::{CacheError, IngestReport, PriceCache, PriceStore};
