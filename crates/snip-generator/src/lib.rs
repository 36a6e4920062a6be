pub mod hash;

pub use hash::HashGenerator;
pub use snip_core::shortcode::{is_valid, ALPHABET, LENGTH};

use snip_core::ShortCode;

/// Trait for generating short codes.
///
/// Implementations are pure: they don't interact with storage, and the same
/// `(input, attempt)` pair always yields the same code. The `attempt` counter
/// is a deterministic perturbation used to step away from a collision.
pub trait Generator: Send + Sync + 'static {
    /// Generates the code for `input` at the given collision attempt.
    fn generate(&self, input: &str, attempt: u32) -> ShortCode;
}
