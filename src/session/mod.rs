//! Client-side conversation logic: pure merge/dedup of messages and thread
//! lists, the tenant-scoped thread cache, and the record-backend listing
//! mapper. None of this touches the network.

pub mod listing;
pub mod merge;
pub mod tenant_cache;

pub use listing::threads_from_listing;
pub use merge::{merge_messages, merge_thread_lists};
pub use tenant_cache::TenantThreadCache;
