//! Fast hashing utilities using xxHash3.
//!
//! Used to derive stable `[hash]` / `[contenthash]` segments for emitted
//! template files.

use xxhash_rust::xxh3::xxh3_64;

/// Compute a 64-bit hash of the given string using xxHash3.
#[inline]
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}

/// Convert a hash to a hex string (16 characters).
#[inline]
pub fn hash_to_hex(hash: u64) -> String {
    format!("{:016x}", hash)
}

/// Compute hash of a string and return as hex.
#[inline]
pub fn content_hash(content: &str) -> String {
    hash_to_hex(hash_str(content))
}

/// Content hash truncated to at most `len` hex characters.
pub fn short_content_hash(content: &str, len: usize) -> String {
    let mut hex = content_hash(content);
    hex.truncate(len);
    hex
}
