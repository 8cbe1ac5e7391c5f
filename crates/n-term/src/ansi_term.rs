// SPDX-License-Identifier: MIT
//
// AnsiTerm — a terminal sink speaking ANSI/ECMA-48 escape sequences.
//
// Everything is rendered into an `OutputBuffer` and written to the
// underlying writer in one go on `flush`, wrapped in synchronized-output
// markers so the terminal shows whole frames only. A `TermState` remembers
// the cursor position and pen the terminal last saw, so consecutive spans
// on a row need no CUP and repeated pens need no SGR.
//
// Hardware scrolling is offered in the two shapes a plain VT-compatible
// terminal can do without side effects:
//
//   - vertical scrolls of full-width rects, via a DECSTBM region and SU/SD
//   - horizontal scrolls of rects reaching the right edge, via DCH/ICH
//     applied to every line
//
// Anything else is refused and the caller redraws.

use std::io::{self, Write};

use crate::ansi;
use crate::output::{OutputBuffer, TermState};
use crate::pen::Pen;
use crate::rect::Rect;
use crate::renderbuffer::text_width;
use crate::term::{CursorShape, MoveEnd, TermSink};

/// A [`TermSink`] writing escape sequences to `W`.
pub struct AnsiTerm<W: Write> {
    writer: W,
    out: OutputBuffer,
    state: TermState,
    lines: i32,
    cols: i32,
    cursor_visible: Option<bool>,
    cursor_style: Option<(CursorShape, bool)>,
    shape: CursorShape,
    blink: bool,
}

impl<W: Write> AnsiTerm<W> {
    /// A sink for a `lines × cols` terminal behind `writer`.
    pub fn new(writer: W, lines: i32, cols: i32) -> Self {
        Self {
            writer,
            out: OutputBuffer::new(),
            state: TermState::new(),
            lines,
            cols,
            cursor_visible: None,
            cursor_style: None,
            shape: CursorShape::Block,
            blink: true,
        }
    }

    /// Record a new terminal size. Tracked state is dropped.
    pub const fn resize(&mut self, lines: i32, cols: i32) {
        self.lines = lines;
        self.cols = cols;
        self.state.invalidate();
    }

    /// Bytes rendered but not yet flushed.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        self.out.as_bytes()
    }

    /// The underlying writer.
    pub const fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Unwrap the sink, discarding anything not flushed.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn emit_cursor_style(&mut self) {
        let style = (self.shape, self.blink);
        if self.cursor_style != Some(style) {
            ansi::cursor_style(&mut self.out, style.0, style.1).ok();
            self.cursor_style = Some(style);
        }
    }
}

impl AnsiTerm<io::Stdout> {
    /// A sink on standard output, sized from the controlling terminal
    /// (80×24 if the size cannot be queried).
    #[must_use]
    pub fn stdout() -> Self {
        let (lines, cols) = crate::terminal::get_size()
            .map_or((24, 80), |size| (i32::from(size.rows), i32::from(size.cols)));
        Self::new(io::stdout(), lines, cols)
    }
}

impl<W: Write> TermSink for AnsiTerm<W> {
    fn size(&self) -> (i32, i32) {
        (self.lines, self.cols)
    }

    fn goto(&mut self, line: i32, col: i32) -> bool {
        if !(0..self.lines).contains(&line) || !(0..self.cols).contains(&col) {
            return false;
        }
        self.state.goto(&mut self.out, line, col);
        true
    }

    fn print(&mut self, text: &str) {
        self.out.push_str(text);
        self.state.advance(i32::try_from(text_width(text)).unwrap_or(i32::MAX));
    }

    fn erase(&mut self, count: i32, moveend: MoveEnd) {
        if count <= 0 {
            return;
        }
        ansi::erase_chars(&mut self.out, count).ok();
        if moveend == MoveEnd::Yes {
            ansi::cursor_forward(&mut self.out, count).ok();
            self.state.advance(count);
        }
    }

    fn scroll(&mut self, rect: Rect, downward: i32, rightward: i32) -> bool {
        if rect.is_empty() || (downward == 0 && rightward == 0) {
            return rect.is_empty();
        }

        if rightward == 0 && rect.left == 0 && rect.cols == self.cols {
            ansi::set_scroll_region(&mut self.out, rect.top, rect.bottom()).ok();
            if downward > 0 {
                ansi::scroll_up(&mut self.out, downward).ok();
            } else {
                ansi::scroll_down(&mut self.out, -downward).ok();
            }
            ansi::reset_scroll_region(&mut self.out).ok();
            // DECSTBM homes the cursor.
            self.state.invalidate_cursor();
            tracing::trace!(target: "render.flush", %rect, downward, "DECSTBM scroll");
            return true;
        }

        if downward == 0 && rect.right() == self.cols {
            for line in rect.top..rect.bottom() {
                self.state.goto(&mut self.out, line, rect.left);
                if rightward > 0 {
                    ansi::delete_chars(&mut self.out, rightward).ok();
                } else {
                    ansi::insert_chars(&mut self.out, -rightward).ok();
                }
            }
            tracing::trace!(target: "render.flush", %rect, rightward, "ICH/DCH scroll");
            return true;
        }

        false
    }

    fn set_pen(&mut self, pen: &Pen) {
        self.state.set_pen(&mut self.out, pen);
    }

    fn clear(&mut self) {
        ansi::clear_screen(&mut self.out).ok();
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        if self.cursor_visible == Some(visible) {
            return;
        }
        if visible {
            ansi::cursor_show(&mut self.out).ok();
        } else {
            ansi::cursor_hide(&mut self.out).ok();
        }
        self.cursor_visible = Some(visible);
    }

    fn set_cursor_shape(&mut self, shape: CursorShape) {
        self.shape = shape;
        self.emit_cursor_style();
    }

    fn set_cursor_blink(&mut self, blink: bool) {
        self.blink = blink;
        self.emit_cursor_style();
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.out.is_empty() {
            return Ok(());
        }
        let mut framed = OutputBuffer::new();
        ansi::begin_sync(&mut framed)?;
        framed.write_all(self.out.as_bytes())?;
        ansi::end_sync(&mut framed)?;
        framed.flush_to(&mut self.writer)?;
        self.out.clear();
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
