//! Numbers: equality, hashing, parsing and printing.
//!
//! Integral numbers hash to their own value truncated to 32 bits, which is
//! what lets a table recognize "positional" keys: a number is an index exactly
//! when it equals its own hash.

use crate::error::Error;
use crate::string::Str;
use crate::value::{Hash, Value};

/// Longest rendering [`repr`] produces before switching to exponent form.
pub const NUM_LEN: usize = 14;

/// Numeric equality (`nan` is unequal to itself).
#[inline]
#[allow(clippy::float_cmp, reason = "value equality is exact numeric equality")]
pub fn equals(a: f64, b: f64) -> bool {
    a == b
}

/// The value of `n` as an integer, when it has one.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    reason = "range checked before the cast"
)]
pub fn integral(n: f64) -> Option<i64> {
    #[allow(clippy::float_cmp, reason = "fract of an integral value is exactly zero")]
    let whole = n.fract() == 0.0;
    (whole && n >= i64::MIN as f64 && n < i64::MAX as f64).then(|| n as i64)
}

/// Hash of a number.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "hashes keep the low 32 bits"
)]
pub fn hash(n: f64) -> Hash {
    match integral(n) {
        Some(i) => i as u32,
        None => {
            let bits = n.to_bits();
            (bits ^ (bits >> 32)) as u32
        }
    }
}

/// Whether `key` is the number `hash`, i.e. a positional key.
#[inline]
#[allow(clippy::float_cmp, reason = "index keys are exact")]
pub fn is_index(key: &Value, hash: Hash) -> bool {
    matches!(key, Value::Number(n) if *n == f64::from(hash))
}

/// Position named by `key`, if it is a positional key with hash `hash`.
#[inline]
pub fn index_of(key: &Value, hash: Hash) -> Option<usize> {
    is_index(key, hash).then_some(hash as usize)
}

/// Parse a number literal.
///
/// Accepts an optional sign followed by either a `0x`/`0o`/`0b` prefixed
/// integer or a decimal with optional fraction and exponent. Anything else,
/// including trailing text, is [`Error::Parse`].
pub fn parse(text: &str) -> Result<f64, Error> {
    let (negative, body) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let magnitude = match radix_prefix(body) {
        Some((radix, digits)) => parse_radix(digits, radix)?,
        None => parse_decimal(body)?,
    };
    Ok(if negative { -magnitude } else { magnitude })
}

fn radix_prefix(body: &str) -> Option<(u32, &str)> {
    let bytes = body.as_bytes();
    if bytes.len() < 2 || bytes[0] != b'0' {
        return None;
    }
    let radix = match bytes[1] {
        b'x' | b'X' => 16,
        b'o' | b'O' => 8,
        b'b' | b'B' => 2,
        _ => return None,
    };
    Some((radix, &body[2..]))
}

fn digit_value(b: u8) -> Option<u32> {
    match b {
        b'0'..=b'9' => Some(u32::from(b - b'0')),
        b'a'..=b'f' => Some(u32::from(b - b'a') + 10),
        b'A'..=b'F' => Some(u32::from(b - b'A') + 10),
        _ => None,
    }
}

fn parse_radix(digits: &str, radix: u32) -> Result<f64, Error> {
    if digits.is_empty() {
        return Err(Error::Parse);
    }
    digits.bytes().try_fold(0.0, |acc: f64, b| match digit_value(b) {
        Some(d) if d < radix => Ok(acc * f64::from(radix) + f64::from(d)),
        _ => Err(Error::Parse),
    })
}

fn parse_decimal(body: &str) -> Result<f64, Error> {
    let starts_numeric = body
        .bytes()
        .next()
        .is_some_and(|b| b.is_ascii_digit() || b == b'.');
    let charset_ok = body
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !starts_numeric || !charset_ok {
        return Err(Error::Parse);
    }
    body.parse::<f64>().map_err(|_| Error::Parse)
}

/// Render a number for display.
///
/// Integral values print without a fraction, non-finite values print as
/// `inf`, `-inf` and `nan`, and nothing longer than [`NUM_LEN`] characters
/// is produced.
pub fn repr(n: f64) -> Result<Str, Error> {
    Str::new(&format_number(n))
}

pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_owned();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_owned();
    }

    let plain = match integral(n) {
        Some(i) => i.to_string(),
        None => n.to_string(),
    };
    if plain.len() <= NUM_LEN {
        return plain;
    }
    let short = format!("{n:e}");
    if short.len() <= NUM_LEN {
        return short;
    }

    let mut precision = NUM_LEN;
    loop {
        let text = format!("{n:.precision$e}");
        if text.len() <= NUM_LEN || precision == 0 {
            return text;
        }
        precision -= 1;
    }
}

#[cfg(test)]
mod tests;
