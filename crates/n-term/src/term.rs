// SPDX-License-Identifier: MIT
//
// The terminal sink — everything the compositor needs from a terminal.
//
// The render buffer and the window tree never emit bytes themselves. They
// drive a `TermSink`: move to a cell, print text in the current pen, erase
// a run of cells, ask for a hardware scroll, place the cursor. Two sinks
// ship with the crate:
//
//   AnsiTerm — writes escape sequences to any `io::Write`.
//   MockTerm — records every call and keeps a virtual screen, for tests.
//
// Coordinates are zero-based (line, col) throughout.

use std::io;

use crate::pen::Pen;
use crate::rect::Rect;

// ─── MoveEnd ─────────────────────────────────────────────────────────────────

/// Where the cursor must be after [`TermSink::erase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveEnd {
    /// Just past the erased run; the caller prints there next.
    Yes,
    /// Where it started.
    No,
    /// Either; the caller will reposition before printing.
    Maybe,
}

// ─── Cursor Shape ────────────────────────────────────────────────────────────

/// Shape of the visible terminal cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum CursorShape {
    #[default]
    Block,
    Underline,
    LeftBar,
}

// ─── TermSink ────────────────────────────────────────────────────────────────

/// A character-cell output device.
pub trait TermSink {
    /// Size as `(lines, cols)`.
    fn size(&self) -> (i32, i32);

    /// Move the cursor. Returns `false` if the position is unreachable.
    fn goto(&mut self, line: i32, col: i32) -> bool;

    /// Print text at the cursor in the current pen, advancing the cursor.
    fn print(&mut self, text: &str);

    /// Erase `count` cells at the cursor in the current pen.
    fn erase(&mut self, count: i32, moveend: MoveEnd);

    /// Scroll the contents of `rect` up by `downward` lines and left by
    /// `rightward` columns (negative values scroll the other way).
    ///
    /// Returns `false` if the terminal cannot perform this scroll; the caller
    /// must then redraw the area itself.
    fn scroll(&mut self, rect: Rect, downward: i32, rightward: i32) -> bool;

    /// Make `pen` the current pen. Absent attributes mean terminal defaults.
    fn set_pen(&mut self, pen: &Pen);

    /// Erase the whole screen.
    fn clear(&mut self);

    fn set_cursor_visible(&mut self, visible: bool);

    fn set_cursor_shape(&mut self, shape: CursorShape);

    fn set_cursor_blink(&mut self, blink: bool);

    /// Push buffered output to the device.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    fn flush(&mut self) -> io::Result<()>;
}
