use super::Table;
use crate::error::Error;
use crate::string::{Str, MAX_LEN};

impl Table {
    /// Render as `[k: v, k: v]`, keys and values in their own reprs.
    ///
    /// The output length is computed before anything is written; past
    /// [`MAX_LEN`] this fails with [`Error::LengthExceeded`]. Tables that
    /// contain themselves are not supported.
    pub fn repr(&self) -> Result<Str, Error> {
        let mut parts = Vec::with_capacity(self.len());
        for (key, val) in self.entries() {
            parts.push((key.repr()?, val.repr()?));
        }

        let separators = 2 * parts.len().saturating_sub(1);
        let len = parts
            .iter()
            .try_fold(2 + separators, |len: usize, (k, v)| {
                len.checked_add(k.len())?.checked_add(v.len())?.checked_add(2)
            })
            .ok_or(Error::LengthExceeded)?;
        if len > MAX_LEN {
            return Err(Error::LengthExceeded);
        }

        Str::create(len, |buf| {
            let mut at = 0;
            let mut put = |chunk: &[u8]| {
                buf[at..at + chunk.len()].copy_from_slice(chunk);
                at += chunk.len();
            };
            put(b"[");
            for (n, (k, v)) in parts.iter().enumerate() {
                if n > 0 {
                    put(b", ");
                }
                put(k.as_bytes());
                put(b": ");
                put(v.as_bytes());
            }
            put(b"]");
        })
    }
}
