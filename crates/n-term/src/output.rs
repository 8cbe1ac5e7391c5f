// SPDX-License-Identifier: MIT
//
// Output buffering and terminal state tracking.
//
// `AnsiTerm` is built from two pieces:
//
//   OutputBuffer — collects the escape sequences of one tick in memory;
//   `AnsiTerm::flush` hands them to the writer in one go, wrapped in a
//   synchronized-update frame.
//
//   TermState — tracks what the terminal currently believes (cursor position
//   and pen) and skips redundant escape sequences. If the cursor is already
//   where the next span starts, no CUP is sent; if the next span's pen renders
//   the same as the last one, no SGR is sent.
//
// Either piece of knowledge can be lost (after a scroll-region change homes
// the cursor, or on startup), in which case the next request is emitted in
// full.

use std::io::{self, Write};

use crate::ansi;
use crate::pen::Pen;

// ─── OutputBuffer ────────────────────────────────────────────────────────────

/// Escape sequences pending for the next terminal flush.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

const DEFAULT_CAPACITY: usize = 16_384;

impl OutputBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Pending bytes, oldest first.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append text verbatim.
    #[inline]
    pub fn push_str(&mut self, text: &str) {
        self.buf.extend_from_slice(text.as_bytes());
    }

    /// Drop pending output, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Write accumulated output to `w` and clear the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails. The buffer is kept intact
    /// in that case so a later flush can retry.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        if !self.buf.is_empty() {
            w.write_all(&self.buf)?;
            w.flush()?;
            self.buf.clear();
        }
        Ok(())
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── TermState ───────────────────────────────────────────────────────────────

/// The terminal's cursor position and pen as last set by us.
///
/// `None` means unknown: the next request is emitted unconditionally.
#[derive(Debug, Clone, Copy, Default)]
pub struct TermState {
    cursor: Option<(i32, i32)>,
    pen: Option<Pen>,
}

impl TermState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cursor: None,
            pen: None,
        }
    }

    /// Forget everything. Call after a terminal reset.
    pub const fn invalidate(&mut self) {
        self.cursor = None;
        self.pen = None;
    }

    /// Forget the cursor position only.
    pub const fn invalidate_cursor(&mut self) {
        self.cursor = None;
    }

    #[must_use]
    pub const fn cursor(&self) -> Option<(i32, i32)> {
        self.cursor
    }

    /// Move the cursor unless it is already at `(line, col)`.
    pub fn goto(&mut self, out: &mut OutputBuffer, line: i32, col: i32) {
        if self.cursor == Some((line, col)) {
            return;
        }
        ansi::cursor_to(out, line, col).ok();
        self.cursor = Some((line, col));
    }

    /// Record that output advanced the cursor by `cols` columns.
    pub fn advance(&mut self, cols: i32) {
        if let Some((line, col)) = self.cursor {
            self.cursor = Some((line, col + cols));
        }
    }

    /// Switch to `pen`, emitting only the attributes that change.
    pub fn set_pen(&mut self, out: &mut OutputBuffer, pen: &Pen) {
        if self.pen.is_some_and(|last| last.equivalent(pen)) {
            return;
        }
        ansi::pen_diff(out, self.pen.as_ref(), pen).ok();
        self.pen = Some(*pen);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
