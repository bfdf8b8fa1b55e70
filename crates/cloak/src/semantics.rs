//! Plaintext-side versions of commands the store cannot answer over ciphertext.
//!
//! Bit and range commands fetch the whole value, decrypt it, and compute here.
//! Index arguments follow the store's conventions: byte ranges are inclusive
//! and negative indices count from the end.

use std::ops::Range;

use crate::crypto::VALUE_OVERHEAD;

/// Plaintext length of a stored value given its on-wire `STRLEN`.
///
/// Missing keys (and nil values, stored empty) report zero, never a negative
/// length.
pub fn plaintext_len(stored_len: i64) -> i64 {
    if stored_len == 0 {
        return 0;
    }
    (stored_len - VALUE_OVERHEAD as i64).max(0)
}

/// Resolve an inclusive `start..=stop` byte range against a value of `len` bytes.
///
/// A range ending before the first byte is empty; only the start is clamped
/// onto the value.
pub fn byte_range(len: usize, start: i64, stop: i64) -> Range<usize> {
    let len_i = len as i64;
    let start = (if start < 0 { start + len_i } else { start }).max(0);
    let stop = (if stop < 0 { stop + len_i } else { stop }).min(len_i - 1);
    if stop < 0 || start > stop {
        return 0..0;
    }
    start as usize..stop as usize + 1
}

/// `GETRANGE` over plaintext.
pub fn getrange(value: &[u8], start: i64, stop: i64) -> Vec<u8> {
    value[byte_range(value.len(), start, stop)].to_vec()
}

/// Largest bit offset the store accepts: strings are capped at 512 MiB.
pub const MAX_BIT_OFFSET: u64 = (1 << 32) - 1;

/// `GETBIT` over plaintext: bit `offset` counting from the most significant
/// bit of the first byte. Offsets past the end read as zero.
pub fn getbit(value: &[u8], offset: u64) -> u8 {
    let byte = (offset / 8) as usize;
    let shift = 7 - (offset % 8) as u32;
    value.get(byte).map_or(0, |b| (b >> shift) & 1)
}

/// `BITCOUNT` over the plaintext bytes in the inclusive range.
pub fn bitcount(value: &[u8], start: i64, stop: i64) -> i64 {
    value[byte_range(value.len(), start, stop)]
        .iter()
        .map(|b| i64::from(b.count_ones()))
        .sum()
}

/// `BITPOS` over plaintext. Returns the absolute bit position of the first
/// bit equal to `bit` inside the byte range, or `-1` when there is none.
pub fn bitpos(value: &[u8], bit: bool, start: Option<i64>, stop: Option<i64>) -> i64 {
    let range = byte_range(value.len(), start.unwrap_or(0), stop.unwrap_or(-1));
    let base = range.start;
    value[range]
        .iter()
        .enumerate()
        .find_map(|(i, &b)| {
            // Flip so the target bit is always a one.
            let flipped = if bit { b } else { !b };
            (flipped != 0).then(|| ((base + i) * 8) as i64 + i64::from(flipped.leading_zeros()))
        })
        .unwrap_or(-1)
}
