//! URL shortening coordinator.
//!
//! [`ShortenerService`] combines a [`Repository`](snip_core::Repository) with a
//! [`Generator`](snip_generator::Generator) to provide get-or-create semantics
//! with bounded collision retry. Core types are re-exported from `snip_core`.

pub mod lock;
pub mod service;

pub use lock::UrlLocks;
pub use service::{ShortenerConfig, ShortenerService, MAX_ATTEMPTS};
pub use snip_core::{ExpirationPolicy, ShortenParams, Shortened, Shortener, ShortenerError};
