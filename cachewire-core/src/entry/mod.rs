//! The cache entry record and the objects it carries.
//!
//! An [`EntryInfo`] holds a key (as a [`KeyCacheObject`] or raw bytes), an
//! optional [`CacheObject`] value, expiry settings and a [`CacheVersion`].
//! Keys and values are converted between objects and bytes lazily, only
//! when the entry is about to be encoded or has just been decoded.

mod cache_object;
pub mod expiry;
mod info;
mod marshal;
mod version;

pub use cache_object::{CacheObject, KeyCacheObject};
pub use info::{EntryInfo, EntryKey};
pub use version::{CacheVersion, MAX_DATA_CENTER_ID, MAX_NODE_ORDER};
