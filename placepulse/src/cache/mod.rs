mod store;

pub use store::{CacheBackend, DemographicCache, JsonFileBackend, MemoryBackend};
