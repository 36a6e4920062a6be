//! Storage backends for Snip.
//!
//! Both backends implement [`Repository`] and are selected at startup.

pub mod memory;
pub mod mysql;

pub use memory::InMemoryRepository;
pub use mysql::{MySqlRepository, MySqlSettings};
pub use snip_core::{Repository, StorageError, UrlRecord};
