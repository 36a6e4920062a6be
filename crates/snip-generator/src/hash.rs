use crate::Generator;
use sha2::{Digest, Sha256};
use snip_core::shortcode::{ALPHABET, LENGTH};
use snip_core::ShortCode;

const RADIX: u64 = ALPHABET.len() as u64;

/// Deterministic generator hashing the input with SHA-256.
///
/// The first 8 bytes of the digest are read as a big-endian `u64` and written
/// out in base 63, most significant digit first, over a fixed number of
/// digits. For `attempt > 0` the hashed input is `"{input}#{attempt}"`, which
/// decorrelates successive attempts from the base input.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashGenerator;

impl HashGenerator {
    pub fn new() -> Self {
        Self
    }

    fn digest_prefix(input: &str, attempt: u32) -> u64 {
        let digest = if attempt == 0 {
            Sha256::digest(input.as_bytes())
        } else {
            Sha256::digest(format!("{input}#{attempt}").as_bytes())
        };

        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(prefix)
    }
}

/// Encodes `num` as a fixed-length base-63 string.
///
/// Digits beyond [`LENGTH`] are dropped, so the output length never varies.
pub(crate) fn encode(mut num: u64) -> ShortCode {
    let mut out = [0u8; LENGTH];
    for slot in out.iter_mut().rev() {
        *slot = ALPHABET[(num % RADIX) as usize];
        num /= RADIX;
    }
    // every byte comes from ALPHABET, which is ASCII
    let code: String = out.iter().map(|b| *b as char).collect();
    ShortCode::new_unchecked(code)
}

impl Generator for HashGenerator {
    fn generate(&self, input: &str, attempt: u32) -> ShortCode {
        encode(Self::digest_prefix(input, attempt))
    }
}
