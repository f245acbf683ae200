//! # Short code generation
//!
//! Random codes are drawn from a 62 symbol alphabet (`0-9A-Za-z`) using the
//! operating system's CSPRNG. Each character is picked with `gen_range`, which
//! rejects out-of-range samples instead of reducing modulo 62, so every symbol
//! is equally likely.
//!
//! The generator does not know about existing links; uniqueness is enforced by
//! the caller against the store.
//!
//! [`encode_id`] / [`decode_to_id`] offer a deterministic alternative: base62
//! positional encoding of a numeric id. It is collision free by construction
//! but is not used by the default creation path.

use rand::{rngs::OsRng, Rng};
use thiserror::Error;

// =====================================
// Constants
// =====================================
/// Symbols a generated code is made of.
pub const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Length used when the config does not say otherwise.
pub const DEFAULT_CODE_LENGTH: usize = 7;

/// Longest code a link may carry.
pub const MAX_CODE_LENGTH: usize = 52;

/// Codes taken by the router's own top-level paths. A link under one of them
/// could never be reached.
pub const RESERVED_CODES: &[&str] = &["api", "health"];

// =====================================
// Errors
// =====================================
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    #[error("code length must be positive, got {0}")]
    InvalidLength(i64),

    #[error("'{0}' is not a valid base62 id")]
    InvalidEncoding(String),
}

// =====================================
// Generator
// =====================================
/// Source of candidate short codes.
///
/// The service only depends on this trait so a deterministic generator can be
/// swapped in where collisions need to be forced.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self, length: i64) -> Result<String, GeneratorError>;
}

/// CSPRNG backed generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self, length: i64) -> Result<String, GeneratorError> {
        generate(length)
    }
}

/// Draws `length` uniformly distributed symbols from [`ALPHABET`].
///
/// # Errors
/// [`GeneratorError::InvalidLength`] when `length <= 0`.
///
/// ```rust
/// use link_shortener::shortener::{generate, is_valid_code};
///
/// let code = generate(7).unwrap();
/// assert_eq!(code.len(), 7);
/// assert!(is_valid_code(&code));
/// ```
pub fn generate(length: i64) -> Result<String, GeneratorError> {
    if length <= 0 {
        return Err(GeneratorError::InvalidLength(length));
    }

    let mut rng = OsRng;

    Ok((0..length)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect())
}

// =====================================
// Validation
// =====================================
/// True iff `code` is non-empty and made only of base62 symbols.
#[must_use]
pub fn is_valid_code(code: &str) -> bool {
    is_valid_code_with(code, &[])
}

/// Like [`is_valid_code`] but also accepts the characters in `extra`
/// (e.g. `&['-', '_']`).
#[must_use]
pub fn is_valid_code_with(code: &str, extra: &[char]) -> bool {
    !code.is_empty()
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || extra.contains(&c))
}

/// True iff `code` collides with a fixed route. Matching is exact, like
/// routing: `Health` is an ordinary code.
#[must_use]
pub fn is_reserved_code(code: &str) -> bool {
    RESERVED_CODES.contains(&code)
}

// =====================================
// Deterministic encoding
// =====================================
/// Base62 encoding of a numeric id.
#[must_use]
pub fn encode_id(id: u64) -> String {
    base62::encode(id)
}

/// Inverse of [`encode_id`].
///
/// # Errors
/// [`GeneratorError::InvalidEncoding`] for characters outside the alphabet or
/// values that do not fit in a `u64`.
pub fn decode_to_id(code: &str) -> Result<u64, GeneratorError> {
    let value = base62::decode(code)
        .map_err(|_| GeneratorError::InvalidEncoding(code.to_string()))?;

    u64::try_from(value).map_err(|_| GeneratorError::InvalidEncoding(code.to_string()))
}
