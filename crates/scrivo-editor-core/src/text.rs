//! Rope-backed text storage.
//!
//! `EditorRope` wraps ropey and exposes byte-offset editing plus line
//! lookups. Char boundaries are validated by [`crate::Document`] before
//! anything reaches the rope.

use std::ops::Range;

use smol_str::{SmolStr, ToSmolStr};

/// Ropey-backed text buffer.
///
/// Provides O(log n) editing operations and line/offset conversions.
#[derive(Clone, Default)]
pub struct EditorRope {
    rope: ropey::Rope,
}

impl EditorRope {
    /// Create a new empty rope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a reference to the underlying rope (for advanced operations).
    pub fn rope(&self) -> &ropey::Rope {
        &self.rope
    }

    /// Total length in bytes (UTF-8).
    pub fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    /// Number of lines. An empty rope has one (empty) line.
    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_bytes() == 0
    }

    /// Insert text at a byte offset.
    pub fn insert(&mut self, byte_offset: usize, text: &str) {
        let char_offset = self.rope.byte_to_char(byte_offset);
        self.rope.insert(char_offset, text);
    }

    /// Delete a byte range.
    pub fn delete(&mut self, byte_range: Range<usize>) {
        let start = self.rope.byte_to_char(byte_range.start);
        let end = self.rope.byte_to_char(byte_range.end);
        self.rope.remove(start..end);
    }

    /// Replace a byte range with text.
    pub fn replace(&mut self, byte_range: Range<usize>, text: &str) {
        self.delete(byte_range.clone());
        self.insert(byte_range.start, text);
    }

    /// Get a slice as SmolStr. Returns None if range is invalid.
    pub fn slice(&self, byte_range: Range<usize>) -> Option<SmolStr> {
        if byte_range.end > self.len_bytes() || byte_range.start > byte_range.end {
            return None;
        }
        let start = self.rope.try_byte_to_char(byte_range.start).ok()?;
        let end = self.rope.try_byte_to_char(byte_range.end).ok()?;
        Some(self.rope.slice(start..end).to_smolstr())
    }

    /// Whether a byte offset falls on a char boundary (or the end).
    pub fn is_char_boundary(&self, byte_offset: usize) -> bool {
        if byte_offset > self.len_bytes() {
            return false;
        }
        match self.rope.try_byte_to_char(byte_offset) {
            Ok(c) => self.rope.char_to_byte(c) == byte_offset,
            Err(_) => false,
        }
    }

    /// Zero-based line index containing a byte offset.
    pub fn byte_to_line(&self, byte_offset: usize) -> usize {
        self.rope.byte_to_line(byte_offset.min(self.len_bytes()))
    }

    /// Byte offset where a zero-based line starts.
    pub fn line_to_byte(&self, line_idx: usize) -> usize {
        self.rope.line_to_byte(line_idx.min(self.len_lines()))
    }
}

impl std::fmt::Display for EditorRope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for chunk in self.rope.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for EditorRope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorRope")
            .field("len_bytes", &self.len_bytes())
            .finish()
    }
}

impl From<&str> for EditorRope {
    fn from(s: &str) -> Self {
        Self {
            rope: ropey::Rope::from_str(s),
        }
    }
}

impl From<String> for EditorRope {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}
