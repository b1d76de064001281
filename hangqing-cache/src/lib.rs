//! hangqing-cache
//!
//! Durable file-per-key cache for the hangqing facade. One JSON entry per
//! (code, date range) key for daily series and one per macro kind, written
//! atomically (temp + rename). Cache corruption and I/O errors are absorbed
//! as misses — the cache never fails a fetch.
#![warn(missing_docs)]

mod store;

pub use store::CacheStore;
