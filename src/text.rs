//! Binary-to-text encoding applied to packets before transmission.
//!
//! The transport carries one text argument per call and reserves delimiter
//! and control characters, so packets travel as standard padded base64. Every
//! three raw bytes become four characters, which is why fragment budgets are
//! derived from `floor(max_len / 4) * 3`.

use base64::{Engine, engine::general_purpose::STANDARD};

/// Encode `bytes` as transport-safe text.
///
/// # Examples
///
/// ```
/// use chunkwire::text::encode;
///
/// assert_eq!(encode(&[0, 1, 0, 1, 0]), "AAEAAQA=");
/// ```
#[must_use]
pub fn encode(bytes: &[u8]) -> String { STANDARD.encode(bytes) }

/// Decode transport text back into bytes.
///
/// # Errors
///
/// Returns [`base64::DecodeError`] if `text` is not padded standard base64.
pub fn decode(text: &str) -> Result<Vec<u8>, base64::DecodeError> { STANDARD.decode(text) }

/// Length of the text produced by [`encode`] for `raw_len` bytes.
///
/// # Examples
///
/// ```
/// use chunkwire::text::encoded_len;
///
/// assert_eq!(encoded_len(378), 504);
/// assert_eq!(encoded_len(4), 8);
/// ```
#[must_use]
pub const fn encoded_len(raw_len: usize) -> usize { raw_len.div_ceil(3) * 4 }

/// Largest raw byte count whose encoding fits within `text_budget`
/// characters.
///
/// # Examples
///
/// ```
/// use chunkwire::text::raw_budget;
///
/// assert_eq!(raw_budget(505), 378);
/// assert_eq!(raw_budget(3), 0);
/// ```
#[must_use]
pub const fn raw_budget(text_budget: usize) -> usize { text_budget / 4 * 3 }
