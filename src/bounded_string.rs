//! Fixed-capacity, NUL-terminated text field, truncated on construction.
//!
//! One generic type backs both `input` (`IN_CAP`) and `output` (`OUT_CAP`)
//! fields of a `Block`, keeping capacity as a single source of truth
//! (spec §9) rather than scattering size checks across the chain.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Text bounded to `N` bytes, including the implicit NUL terminator: the
/// longest string this type holds is `N - 1` bytes.
#[derive(Clone, Copy, Serialize, Deserialize)]
pub struct BoundedString<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> BoundedString<N> {
    /// An empty bounded string.
    pub fn empty() -> Self {
        Self {
            buf: [0u8; N],
            len: 0,
        }
    }

    /// Builds a bounded string from `s`, truncating to `N - 1` bytes if
    /// needed. Truncation backs off to the previous UTF-8 character
    /// boundary so a multi-byte code point is never split.
    pub fn from_str(s: &str) -> Self {
        let max = N.saturating_sub(1);
        let mut end = s.len().min(max);
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        let mut buf = [0u8; N];
        buf[..end].copy_from_slice(&s.as_bytes()[..end]);
        Self { buf, len: end }
    }

    /// The stored text as a `&str`.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }

    /// The stored text as raw bytes (no NUL terminator included).
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Byte length of the stored text.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Capacity, including the implicit NUL terminator.
    pub fn capacity() -> usize {
        N
    }
}

impl<const N: usize> Default for BoundedString<N> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<const N: usize> PartialEq for BoundedString<N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<const N: usize> Eq for BoundedString<N> {}

impl<const N: usize> fmt::Debug for BoundedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoundedString").field(&self.as_str()).finish()
    }
}

impl<const N: usize> fmt::Display for BoundedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
