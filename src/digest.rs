//! Content digests for guard checks and selector hash matching.
//!
//! Digests are SHA-256 over UTF-8 bytes, encoded as truncated base64
//! (primary) or truncated hex (fallback). The selector engine accepts
//! either encoding and normalizes candidates by attempting both decodes.

use crate::bytemap::{ByteMapper, Span};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sha2::{Digest as _, Sha256};

/// Default number of characters kept from the base64 digest.
pub const DEFAULT_TRUNCATION: usize = 12;

/// Digest encoding preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashEncoding {
    Base64,
    Hex,
}

/// Configuration for digest truncation and preferred encoding.
#[derive(Debug, Clone, Copy)]
pub struct HashConfig {
    pub truncate_to: usize,
    pub encoding: HashEncoding,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            truncate_to: DEFAULT_TRUNCATION,
            encoding: HashEncoding::Base64,
        }
    }
}

/// Computes a SHA-256 digest of `text`, truncated per `config`.
pub fn create_digest(text: &str, config: &HashConfig) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let bytes = hasher.finalize();

    let full = match config.encoding {
        HashEncoding::Base64 => BASE64.encode(bytes),
        HashEncoding::Hex => hex_encode(&bytes),
    };
    truncate_chars(&full, config.truncate_to)
}

/// Computes the digest for a span's slice of a mapped source buffer.
pub fn compute_hash(mapper: &ByteMapper, span: &Span, config: &HashConfig) -> String {
    create_digest(mapper.slice_string(span), config)
}

fn truncate_chars(s: &str, n: usize) -> String {
    if n == 0 {
        return s.to_string();
    }
    s.chars().take(n).collect()
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Builds the set of candidate hash representations a selector `hash:`
/// filter may be compared against: the value as given, plus, when it
/// decodes cleanly, its hex and base64 round-trip forms.
pub fn hash_candidates(value: &str) -> Vec<String> {
    let mut candidates = vec![value.to_string()];

    if let Ok(bytes) = hex_decode(value) {
        candidates.push(BASE64.encode(&bytes));
    }
    if let Ok(bytes) = BASE64.decode(value) {
        candidates.push(hex_encode(&bytes));
    }

    candidates
}

/// True if `actual` (a record's own digest, possibly re-encoded) matches
/// any candidate form derived from the selector-supplied `expected` value,
/// accounting for truncation in either direction.
pub fn hash_matches(expected: &str, actual: &str) -> bool {
    if expected == actual {
        return true;
    }
    let candidates = hash_candidates(expected);
    candidates.iter().any(|c| {
        c == actual || c.starts_with(actual) || actual.starts_with(c.as_str())
    })
}

fn hex_decode(s: &str) -> Result<Vec<u8>, ()> {
    if s.len() % 2 != 0 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(());
    }
    let mut out = Vec::with_capacity(s.len() / 2);
    let bytes = s.as_bytes();
    for chunk in bytes.chunks(2) {
        let hi = (chunk[0] as char).to_digit(16).ok_or(())?;
        let lo = (chunk[1] as char).to_digit(16).ok_or(())?;
        out.push(((hi << 4) | lo) as u8);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_same_digest() {
        let config = HashConfig::default();
        assert_eq!(create_digest("alpha", &config), create_digest("alpha", &config));
    }

    #[test]
    fn different_text_different_digest() {
        let config = HashConfig::default();
        assert_ne!(create_digest("alpha", &config), create_digest("beta", &config));
    }

    #[test]
    fn truncation_respected() {
        let config = HashConfig {
            truncate_to: 8,
            encoding: HashEncoding::Base64,
        };
        assert_eq!(create_digest("alpha", &config).chars().count(), 8);
    }

    #[test]
    fn hex_fallback_round_trips_to_base64() {
        let config = HashConfig {
            truncate_to: 0,
            encoding: HashEncoding::Hex,
        };
        let hex_digest = create_digest("alpha", &config);
        let base64_config = HashConfig {
            truncate_to: 0,
            encoding: HashEncoding::Base64,
        };
        let base64_digest = create_digest("alpha", &base64_config);
        assert!(hash_candidates(&hex_digest).contains(&base64_digest));
    }

    #[test]
    fn hash_matches_handles_truncated_prefix() {
        let full = create_digest(
            "alpha",
            &HashConfig {
                truncate_to: 0,
                ..Default::default()
            },
        );
        let prefix: String = full.chars().take(10).collect();
        assert!(hash_matches(&prefix, &full));
    }

    #[test]
    fn empty_string_digest_is_stable() {
        let config = HashConfig::default();
        let a = create_digest("", &config);
        let b = create_digest("", &config);
        assert_eq!(a, b);
    }
}
