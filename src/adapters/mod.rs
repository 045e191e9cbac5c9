// Adapters layer: concrete implementations of the domain ports (HTTP API, preference storage).

pub mod http;
pub mod storage;

pub use http::HttpPriceApi;
pub use storage::{FilePreferenceStore, MemoryPreferenceStore};
