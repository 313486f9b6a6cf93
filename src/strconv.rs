//! # Integer Codec
//!
//! Purpose: Convert between signed 64-bit integers and their ASCII decimal
//! form without heap allocations, for the hot framing paths.
//!
//! Digits are produced least-significant first into the tail of a scratch
//! array, so no reversal pass is needed, and a pair of 100-entry lookup
//! tables emits two digits per division.

use crate::error::{Error, Result};

const DIGITS01: &[u8; 100] =
    b"0123456789012345678901234567890123456789012345678901234567890123456789012345678901234567890123456789";
const DIGITS10: &[u8; 100] =
    b"0000000000111111111122222222223333333333444444444455555555556666666666777777777788888888889999999999";

/// Formats `v` as ASCII decimal into `buf` and returns the written sub-slice.
///
/// When `buf` is smaller than the digit count the output is silently
/// truncated to `buf.len()` bytes (the leading bytes of the full
/// representation). Callers that cannot tolerate truncation must provide at
/// least 20 bytes: a sign plus 19 digits.
pub fn encode_i64<'a>(v: i64, buf: &'a mut [u8]) -> &'a [u8] {
    if buf.is_empty() {
        return buf;
    }
    if v == 0 {
        buf[0] = b'0';
        return &buf[..1];
    }

    let mut tmp = [0u8; 24];
    // unsigned_abs keeps i64::MIN exact.
    let mut u = v.unsigned_abs();
    let mut o = tmp.len();
    while u >= 100 {
        o -= 2;
        let q = u / 100;
        let j = (u - q * 100) as usize;
        tmp[o + 1] = DIGITS01[j];
        tmp[o] = DIGITS10[j];
        u = q;
    }
    if u >= 10 {
        o -= 1;
        let q = u / 10;
        tmp[o] = DIGITS01[(u - q * 10) as usize];
        u = q;
    }
    o -= 1;
    tmp[o] = DIGITS01[u as usize];
    if v < 0 {
        o -= 1;
        tmp[o] = b'-';
    }

    let n = (tmp.len() - o).min(buf.len());
    buf[..n].copy_from_slice(&tmp[o..o + n]);
    &buf[..n]
}

/// Parses an ASCII decimal byte sequence with an optional leading `-`.
///
/// Fails with `InvalidValue` on empty input, a lone sign, or any non-digit
/// byte. Overflow is not detected; out-of-range input wraps.
pub fn decode_i64(data: &[u8]) -> Result<i64> {
    if data.is_empty() {
        return Err(Error::InvalidValue);
    }
    let (digits, negative) = match data[0] {
        b'-' => (&data[1..], true),
        _ => (data, false),
    };
    if digits.is_empty() {
        return Err(Error::InvalidValue);
    }

    let mut value: i64 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return Err(Error::InvalidValue);
        }
        value = value.wrapping_mul(10).wrapping_add(i64::from(b - b'0'));
    }
    Ok(if negative { value.wrapping_neg() } else { value })
}
