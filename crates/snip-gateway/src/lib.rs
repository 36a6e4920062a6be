//! HTTP gateway for the Snip URL shortener.
//!
//! Exposes shortening and redirection over axum on top of any
//! [`Shortener`](snip_core::Shortener) implementation.

pub mod app;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use state::AppState;
