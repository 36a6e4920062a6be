//! Core types and traits for the Snip URL shortener.
//!
//! This crate provides the types shared by the code generator, the storage
//! backends, the shortening coordinator and the HTTP gateway.

pub mod error;
pub mod repository;
pub mod shortcode;
pub mod shortener;

pub use error::{CoreError, ShortenerError, StorageError};
pub use repository::{Repository, UrlRecord, MAX_URL_LENGTH};
pub use shortcode::ShortCode;
pub use shortener::{ExpirationPolicy, ShortenParams, Shortened, Shortener};
