// SPDX-License-Identifier: MIT
//
// MockTerm — a recording terminal sink for tests.
//
// Every call is appended to an operation log so tests can assert the exact
// sequence a render buffer or window tree produced. Alongside the log the
// mock keeps a virtual screen (text + pen per cell) updated the way a real
// terminal would, so tests can also assert on what ended up visible.
//
// Hardware scrolling can be switched off to exercise fallback paths.

use std::io;

use unicode_segmentation::UnicodeSegmentation;

use crate::pen::Pen;
use crate::rect::Rect;
use crate::renderbuffer::grapheme_width;
use crate::term::{CursorShape, MoveEnd, TermSink};

// ─── Operations ──────────────────────────────────────────────────────────────

/// One recorded sink call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermOp {
    Goto { line: i32, col: i32 },
    Print(String),
    Erase { count: i32, moveend: MoveEnd },
    Scroll { rect: Rect, downward: i32, rightward: i32 },
    SetPen(Pen),
    Clear,
    CursorVisible(bool),
    CursorShape(CursorShape),
    CursorBlink(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ScreenCell {
    text: String,
    pen: Pen,
}

impl ScreenCell {
    fn blank(pen: Pen) -> Self {
        Self {
            text: " ".to_owned(),
            pen,
        }
    }
}

// ─── MockTerm ────────────────────────────────────────────────────────────────

/// A terminal sink that records calls and emulates a screen.
#[derive(Debug)]
pub struct MockTerm {
    lines: i32,
    cols: i32,
    ops: Vec<TermOp>,
    screen: Vec<Vec<ScreenCell>>,
    cursor: (i32, i32),
    pen: Pen,
    cursor_visible: bool,
    cursor_shape: CursorShape,
    cursor_blink: bool,
    refuse_scroll: bool,
    flushes: usize,
}

impl MockTerm {
    #[must_use]
    pub fn new(lines: i32, cols: i32) -> Self {
        let mut term = Self {
            lines: 0,
            cols: 0,
            ops: Vec::new(),
            screen: Vec::new(),
            cursor: (0, 0),
            pen: Pen::new(),
            cursor_visible: true,
            cursor_shape: CursorShape::Block,
            cursor_blink: false,
            refuse_scroll: false,
            flushes: 0,
        };
        term.resize(lines, cols);
        term
    }

    /// Change the screen size, blanking its contents.
    pub fn resize(&mut self, lines: i32, cols: i32) {
        self.lines = lines.max(0);
        self.cols = cols.max(0);
        let row = vec![ScreenCell::blank(Pen::new()); usize::try_from(self.cols).unwrap_or(0)];
        self.screen = vec![row; usize::try_from(self.lines).unwrap_or(0)];
    }

    /// Make [`TermSink::scroll`] fail, forcing callers to redraw.
    pub const fn set_refuse_scroll(&mut self, refuse: bool) {
        self.refuse_scroll = refuse;
    }

    // ─── Operation log ───────────────────────────────────────────────────

    #[must_use]
    pub fn ops(&self) -> &[TermOp] {
        &self.ops
    }

    /// Return and clear the operation log.
    pub fn take_ops(&mut self) -> Vec<TermOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Number of `flush` calls so far.
    #[must_use]
    pub const fn flushes(&self) -> usize {
        self.flushes
    }

    // ─── Virtual screen ──────────────────────────────────────────────────

    /// Text of a whole screen line. Wide characters occupy one entry.
    #[must_use]
    pub fn display_text(&self, line: i32) -> String {
        self.display_span(line, 0, self.cols)
    }

    /// Text of `cols` cells starting at `(line, col)`.
    #[must_use]
    pub fn display_span(&self, line: i32, col: i32, cols: i32) -> String {
        (col..col + cols)
            .filter_map(|c| self.cell(line, c))
            .map(|cell| cell.text.as_str())
            .collect()
    }

    /// Pen the cell at `(line, col)` was last drawn with.
    #[must_use]
    pub fn display_pen(&self, line: i32, col: i32) -> Option<Pen> {
        self.cell(line, col).map(|cell| cell.pen)
    }

    #[must_use]
    pub const fn cursor_pos(&self) -> (i32, i32) {
        self.cursor
    }

    #[must_use]
    pub const fn cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    #[must_use]
    pub const fn cursor_shape(&self) -> CursorShape {
        self.cursor_shape
    }

    #[must_use]
    pub const fn cursor_blink(&self) -> bool {
        self.cursor_blink
    }

    fn cell(&self, line: i32, col: i32) -> Option<&ScreenCell> {
        let row = self.screen.get(usize::try_from(line).ok()?)?;
        row.get(usize::try_from(col).ok()?)
    }

    fn cell_mut(&mut self, line: i32, col: i32) -> Option<&mut ScreenCell> {
        let row = self.screen.get_mut(usize::try_from(line).ok()?)?;
        row.get_mut(usize::try_from(col).ok()?)
    }
}

impl TermSink for MockTerm {
    fn size(&self) -> (i32, i32) {
        (self.lines, self.cols)
    }

    fn goto(&mut self, line: i32, col: i32) -> bool {
        self.ops.push(TermOp::Goto { line, col });
        self.cursor = (line, col);
        (0..self.lines).contains(&line) && (0..self.cols).contains(&col)
    }

    fn print(&mut self, text: &str) {
        self.ops.push(TermOp::Print(text.to_owned()));
        let (line, mut col) = self.cursor;
        let pen = self.pen;
        for g in text.graphemes(true) {
            let width = i32::try_from(grapheme_width(g)).unwrap_or(1);
            if let Some(cell) = self.cell_mut(line, col) {
                *cell = ScreenCell {
                    text: g.to_owned(),
                    pen,
                };
            }
            for extra in 1..width {
                if let Some(cell) = self.cell_mut(line, col + extra) {
                    *cell = ScreenCell {
                        text: String::new(),
                        pen,
                    };
                }
            }
            col += width;
        }
        self.cursor = (line, col);
    }

    fn erase(&mut self, count: i32, moveend: MoveEnd) {
        self.ops.push(TermOp::Erase { count, moveend });
        let (line, col) = self.cursor;
        let pen = self.pen;
        for c in col..col + count {
            if let Some(cell) = self.cell_mut(line, c) {
                *cell = ScreenCell::blank(pen);
            }
        }
        if moveend == MoveEnd::Yes {
            self.cursor = (line, col + count);
        }
    }

    fn scroll(&mut self, rect: Rect, downward: i32, rightward: i32) -> bool {
        self.ops.push(TermOp::Scroll {
            rect,
            downward,
            rightward,
        });
        if self.refuse_scroll {
            return false;
        }

        let before = self.screen.clone();
        for line in rect.top..rect.bottom() {
            for col in rect.left..rect.right() {
                let (from_line, from_col) = (line + downward, col + rightward);
                let moved = if rect.contains_point(from_line, from_col) {
                    usize::try_from(from_line)
                        .ok()
                        .zip(usize::try_from(from_col).ok())
                        .and_then(|(l, c)| before.get(l)?.get(c).cloned())
                } else {
                    None
                };
                if let Some(cell) = self.cell_mut(line, col) {
                    *cell = moved.unwrap_or_else(|| ScreenCell::blank(Pen::new()));
                }
            }
        }
        true
    }

    fn set_pen(&mut self, pen: &Pen) {
        self.ops.push(TermOp::SetPen(*pen));
        self.pen = *pen;
    }

    fn clear(&mut self) {
        self.ops.push(TermOp::Clear);
        let pen = self.pen;
        for row in &mut self.screen {
            row.fill(ScreenCell::blank(pen));
        }
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        self.ops.push(TermOp::CursorVisible(visible));
        self.cursor_visible = visible;
    }

    fn set_cursor_shape(&mut self, shape: CursorShape) {
        self.ops.push(TermOp::CursorShape(shape));
        self.cursor_shape = shape;
    }

    fn set_cursor_blink(&mut self, blink: bool) {
        self.ops.push(TermOp::CursorBlink(blink));
        self.cursor_blink = blink;
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
