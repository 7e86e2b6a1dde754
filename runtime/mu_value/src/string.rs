//! Immutable strings.
//!
//! A `Str` is either a `&'static str` (literals, descriptor fields) or a
//! refcounted byte block from the base allocator. The two are
//! indistinguishable to callers: equality and hashing look at content only.

use std::borrow::Cow;
use std::fmt;
use std::hash::Hasher;

use mu_mem::RcBytes;
use rustc_hash::FxHasher;

use crate::error::Error;
use crate::value::Hash;

/// Maximum length of a string built at runtime.
pub const MAX_LEN: usize = u16::MAX as usize;

/// Immutable string value.
#[derive(Clone)]
pub struct Str(Repr);

#[derive(Clone)]
enum Repr {
    Static(&'static str),
    Heap(RcBytes),
}

impl Str {
    /// Wrap a static string. Never allocates.
    #[inline]
    pub const fn from_static(s: &'static str) -> Self {
        Str(Repr::Static(s))
    }

    /// Copy `s` into a new string.
    pub fn new(s: &str) -> Result<Self, Error> {
        Str::create(s.len(), |buf| buf.copy_from_slice(s.as_bytes()))
    }

    /// Allocate a `len`-byte string and let `fill` write its bytes.
    ///
    /// Fails with [`Error::LengthExceeded`] past [`MAX_LEN`] and with
    /// [`Error::OutOfMemory`] on exhaustion.
    pub fn create(len: usize, fill: impl FnOnce(&mut [u8])) -> Result<Self, Error> {
        if len > MAX_LEN {
            return Err(Error::LengthExceeded);
        }
        if len == 0 {
            return Ok(Str::from_static(""));
        }
        Ok(Str(Repr::Heap(RcBytes::new(len, fill)?)))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        match &self.0 {
            Repr::Static(s) => s.as_bytes(),
            Repr::Heap(bytes) => bytes.as_bytes(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Content as text, replacing invalid UTF-8.
    pub fn to_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    /// Content equality.
    #[inline]
    pub fn equals(&self, other: &Str) -> bool {
        self.as_bytes() == other.as_bytes()
    }

    /// Content hash.
    #[allow(clippy::cast_possible_truncation, reason = "hashes keep 32 bits")]
    pub fn hash(&self) -> Hash {
        let mut hasher = FxHasher::default();
        hasher.write(self.as_bytes());
        let h = hasher.finish();
        (h ^ (h >> 32)) as u32
    }

    /// Quoted, escaped rendering: `'a\nb'`.
    pub fn repr(&self) -> Result<Str, Error> {
        let bytes = self.as_bytes();
        let len = bytes
            .iter()
            .try_fold(2usize, |len, &b| len.checked_add(escaped_len(b)))
            .ok_or(Error::LengthExceeded)?;

        Str::create(len, |buf| {
            let mut at = 0;
            let mut put = |chunk: &[u8]| {
                buf[at..at + chunk.len()].copy_from_slice(chunk);
                at += chunk.len();
            };
            put(b"'");
            for &b in bytes {
                match escape(b) {
                    Escape::Raw => put(&[b]),
                    Escape::Short(c) => put(&[b'\\', c]),
                    Escape::Hex => {
                        let (hi, lo) = (HEX[usize::from(b >> 4)], HEX[usize::from(b & 0xf)]);
                        put(&[b'\\', b'x', hi, lo]);
                    }
                }
            }
            put(b"'");
        })
    }
}

const HEX: &[u8; 16] = b"0123456789abcdef";

enum Escape {
    Raw,
    Short(u8),
    Hex,
}

fn escape(b: u8) -> Escape {
    match b {
        b'\\' => Escape::Short(b'\\'),
        b'\'' => Escape::Short(b'\''),
        b'\n' => Escape::Short(b'n'),
        b'\t' => Escape::Short(b't'),
        b'\r' => Escape::Short(b'r'),
        0..=0x1f | 0x7f => Escape::Hex,
        _ => Escape::Raw,
    }
}

fn escaped_len(b: u8) -> usize {
    match escape(b) {
        Escape::Raw => 1,
        Escape::Short(_) => 2,
        Escape::Hex => 4,
    }
}

impl PartialEq for Str {
    #[inline]
    fn eq(&self, other: &Str) -> bool {
        self.equals(other)
    }
}

impl Eq for Str {}

impl From<&'static str> for Str {
    #[inline]
    fn from(s: &'static str) -> Self {
        Str::from_static(s)
    }
}

impl fmt::Display for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_str_lossy())
    }
}

impl fmt::Debug for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Str({:?})", self.to_str_lossy())
    }
}
