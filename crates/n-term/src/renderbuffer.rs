// SPDX-License-Identifier: MIT
//
// RenderBuffer — a per-frame cell grid that records drawing as spans.
//
// Drawing code never talks to the terminal directly. It draws into a render
// buffer, which remembers *what* each cell should become as a set of spans:
//
//   Skip   leave the terminal untouched
//   Text   a run of columns taken from a stored string
//   Erase  blank cells in a pen
//   Line   a box-drawing junction, merged with whatever lines cross it
//   Char   a single character
//
// Every row is exactly covered by contiguous spans. The first cell of a span
// (its head) carries the width, the pen and the content; the other cells
// point back at the head. Drawing over part of a span shortens it on the
// left and re-heads the remainder on the right, so a row is always a clean
// sequence of heads.
//
// On top of the grid sits a state stack. `save` records the virtual cursor,
// translation, clip rect and pen; `restore` brings them back and lifts every
// mask applied since. Translation and clipping are what let each window draw
// in its own coordinates without reaching outside its area. Masks mark cells
// that later drawing must not touch; the window tree masks each child after
// painting it, so nothing behind the child can overdraw it.
//
// `flush_to_term` walks the spans row by row, emitting the minimal sequence
// of sink calls, then resets the buffer. `blit` replays one buffer's spans
// into another.

use std::fmt;

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::error::{RenderError, Result};
use crate::line::{Direction, LineCaps, LineMask, LineStyle};
use crate::pen::Pen;
use crate::rect::Rect;
use crate::term::{MoveEnd, TermSink};

// ─── Width ───────────────────────────────────────────────────────────────────

/// Terminal columns occupied by one grapheme cluster (at most 2).
#[inline]
#[must_use]
pub fn grapheme_width(grapheme: &str) -> usize {
    grapheme.width().min(2)
}

/// Terminal columns occupied by `text`.
#[must_use]
pub fn text_width(text: &str) -> usize {
    text.graphemes(true).map(grapheme_width).sum()
}

/// The columns `[offset, offset + cols)` of `text`.
///
/// A wide grapheme cut by either edge is replaced by spaces for the columns
/// that fall inside, so the result always measures exactly `cols`.
fn slice_columns(text: &str, offset: usize, cols: usize) -> String {
    let end = offset + cols;
    let mut out = String::new();
    let mut pos = 0;
    for g in text.graphemes(true) {
        if pos >= end {
            break;
        }
        let gend = pos + grapheme_width(g);
        if pos >= offset && gend <= end {
            out.push_str(g);
        } else if gend > offset {
            let visible = gend.min(end) - pos.max(offset);
            out.extend(std::iter::repeat_n(' ', visible));
        }
        pos = gend;
    }
    out
}

/// The grapheme starting at column `col` of `text`; empty if `col` is the
/// trailing half of a wide grapheme.
fn grapheme_at(text: &str, col: usize) -> String {
    let mut pos = 0;
    for g in text.graphemes(true) {
        let gend = pos + grapheme_width(g);
        if pos == col {
            return g.to_owned();
        }
        if pos < col && col < gend {
            break;
        }
        pos = gend;
    }
    String::new()
}

#[inline]
fn ix(v: i32) -> usize {
    usize::try_from(v).unwrap_or(0)
}

#[inline]
fn coord(v: usize) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

// ─── Cells ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Skip,
    /// Columns of stored string `blob`, starting at column `offset`.
    Text { blob: usize, offset: usize },
    Erase,
    Line(LineMask),
    Char(char),
}

impl Kind {
    /// The same content starting `by` columns further in.
    const fn advanced(self, by: usize) -> Self {
        match self {
            Self::Text { blob, offset } => Self::Text {
                blob,
                offset: offset + by,
            },
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Span {
    cols: usize,
    pen: Pen,
    kind: Kind,
}

#[derive(Debug, Clone, Copy)]
enum Content {
    Head(Span),
    /// Interior cell; holds the column of its span's head.
    Cont(usize),
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    content: Content,
    /// Stack depth the mask was applied at, if masked.
    mask: Option<usize>,
}

impl Cell {
    const BLANK: Self = Self {
        content: Content::Cont(0),
        mask: None,
    };
}

fn reset_row(row: &mut [Cell]) {
    let cols = row.len();
    for (col, cell) in row.iter_mut().enumerate() {
        cell.mask = None;
        cell.content = if col == 0 {
            Content::Head(Span {
                cols,
                pen: Pen::new(),
                kind: Kind::Skip,
            })
        } else {
            Content::Cont(0)
        };
    }
}

// ─── State stack ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Frame {
    Full {
        cursor: Option<(i32, i32)>,
        xlate: (i32, i32),
        clip: Rect,
        pen: Pen,
    },
    PenOnly {
        pen: Pen,
    },
}

impl Frame {
    const fn pen(&self) -> &Pen {
        match self {
            Self::Full { pen, .. } | Self::PenOnly { pen } => pen,
        }
    }
}

/// A drawing request after translation and clipping, in grid indices.
struct Clipped {
    line: usize,
    col: usize,
    cols: usize,
    /// Columns cut off the left edge.
    skipped: usize,
}

// ─── RenderBuffer ────────────────────────────────────────────────────────────

/// A grid of cells accumulating one frame of drawing.
///
/// Coordinates passed to drawing calls are relative to the current
/// translation and are clipped to the current clip rect. Drawing entirely
/// outside the clip is silently ignored; calls still report the column
/// width they would have used. The `get_cell_*` queries take absolute grid
/// coordinates.
///
/// # Examples
///
/// ```
/// use n_term::mock::MockTerm;
/// use n_term::renderbuffer::RenderBuffer;
///
/// let mut rb = RenderBuffer::new(2, 20)?;
/// rb.text_at(0, 0, "Hello")?;
/// rb.erase_at(1, 0, 20);
///
/// let mut term = MockTerm::new(2, 20);
/// rb.flush_to_term(&mut term);
/// assert!(term.display_text(0).starts_with("Hello"));
/// # Ok::<(), n_term::error::RenderError>(())
/// ```
pub struct RenderBuffer {
    lines: i32,
    cols: i32,
    rows: Vec<Vec<Cell>>,
    blobs: Vec<String>,
    cursor: Option<(i32, i32)>,
    xlate: (i32, i32),
    clip: Rect,
    pen: Pen,
    stack: Vec<Frame>,
}

impl RenderBuffer {
    /// Allocate a buffer of `lines × cols` cells, all skipped.
    ///
    /// # Errors
    ///
    /// [`RenderError::Alloc`] if the grid cannot be allocated.
    pub fn new(lines: i32, cols: i32) -> Result<Self> {
        let (lines, cols) = (lines.max(0), cols.max(0));
        let mut rows = Vec::new();
        rows.try_reserve_exact(ix(lines))?;
        for _ in 0..lines {
            let mut row = Vec::new();
            row.try_reserve_exact(ix(cols))?;
            row.resize(ix(cols), Cell::BLANK);
            reset_row(&mut row);
            rows.push(row);
        }
        tracing::trace!(target: "render.buffer", lines, cols, "allocated render buffer");
        Ok(Self {
            lines,
            cols,
            rows,
            blobs: Vec::new(),
            cursor: None,
            xlate: (0, 0),
            clip: Rect::new(0, 0, lines, cols),
            pen: Pen::new(),
            stack: Vec::new(),
        })
    }

    /// Size as `(lines, cols)`.
    #[must_use]
    pub const fn size(&self) -> (i32, i32) {
        (self.lines, self.cols)
    }

    const fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.lines, self.cols)
    }

    /// Forget all content and drawing state.
    pub fn reset(&mut self) {
        for row in &mut self.rows {
            reset_row(row);
        }
        self.blobs.clear();
        self.stack.clear();
        self.cursor = None;
        self.xlate = (0, 0);
        self.clip = self.bounds();
        self.pen = Pen::new();
    }

    // ─── State ───────────────────────────────────────────────────────────

    /// Push cursor, translation, clip and pen.
    pub fn save(&mut self) {
        self.stack.push(Frame::Full {
            cursor: self.cursor,
            xlate: self.xlate,
            clip: self.clip,
            pen: self.pen,
        });
    }

    /// Push only the pen.
    pub fn savepen(&mut self) {
        self.stack.push(Frame::PenOnly { pen: self.pen });
    }

    /// Pop the last saved frame and lift masks applied since it was pushed.
    pub fn restore(&mut self) {
        let Some(frame) = self.stack.pop() else {
            tracing::trace!(target: "render.buffer", "restore with empty stack");
            return;
        };
        match frame {
            Frame::Full {
                cursor,
                xlate,
                clip,
                pen,
            } => {
                self.cursor = cursor;
                self.xlate = xlate;
                self.clip = clip;
                self.pen = pen;
            }
            Frame::PenOnly { pen } => self.pen = pen,
        }

        let depth = self.stack.len();
        for cell in self.rows.iter_mut().flatten() {
            if cell.mask.is_some_and(|d| d > depth) {
                cell.mask = None;
            }
        }
    }

    /// Restore a frame pushed by [`savepen`](Self::savepen).
    pub fn restorepen(&mut self) {
        self.restore();
    }

    /// Number of saved frames.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Shift the origin of later drawing.
    pub const fn translate(&mut self, downward: i32, rightward: i32) {
        self.xlate.0 = self.xlate.0.saturating_add(downward);
        self.xlate.1 = self.xlate.1.saturating_add(rightward);
    }

    /// Restrict later drawing to `rect` (in translated coordinates),
    /// intersected with the current clip.
    pub fn clip(&mut self, rect: Rect) {
        let rect = rect.translate(self.xlate.0, self.xlate.1);
        self.clip = self
            .clip
            .intersect(rect)
            .unwrap_or(Rect::new(self.clip.top, self.clip.left, 0, 0));
    }

    /// Protect the cells of `rect` (in translated coordinates) from drawing
    /// until the enclosing [`restore`](Self::restore).
    pub fn mask(&mut self, rect: Rect) {
        let rect = rect.translate(self.xlate.0, self.xlate.1);
        let Some(rect) = rect.intersect(self.bounds()) else {
            return;
        };
        let depth = self.stack.len();
        for line in rect.top..rect.bottom() {
            for cell in &mut self.rows[ix(line)][ix(rect.left)..ix(rect.right())] {
                cell.mask.get_or_insert(depth);
            }
        }
    }

    /// Set the pen for later drawing.
    ///
    /// Attributes `pen` leaves absent are inherited from the pen in force at
    /// the last save.
    pub fn setpen(&mut self, pen: &Pen) {
        let mut merged = *pen;
        if let Some(frame) = self.stack.last() {
            merged.copy_from(frame.pen(), false);
        }
        self.pen = merged;
    }

    /// The effective pen for drawing.
    #[must_use]
    pub const fn pen(&self) -> Pen {
        self.pen
    }

    // ─── Span plumbing ───────────────────────────────────────────────────

    fn xlate_and_clip(&self, line: i32, col: i32, cols: i32) -> Option<Clipped> {
        let line = line.saturating_add(self.xlate.0);
        let mut col = col.saturating_add(self.xlate.1);
        let mut cols = cols;
        let clip = self.clip;

        if clip.is_empty() || line < clip.top || line >= clip.bottom() || col >= clip.right() {
            return None;
        }
        let mut skipped = 0;
        if col < clip.left {
            skipped = clip.left.saturating_sub(col);
            cols = cols.saturating_sub(skipped);
            col = clip.left;
        }
        if cols <= 0 {
            return None;
        }
        cols = cols.min(clip.right() - col);

        Some(Clipped {
            line: ix(line),
            col: ix(col),
            cols: ix(cols),
            skipped: ix(skipped),
        })
    }

    /// Write a span covering `cols` columns at grid position `(line, col)`,
    /// splitting whatever spans it lands on.
    fn make_span(&mut self, line: usize, col: usize, cols: usize, pen: Pen, kind: Kind) {
        let row = &mut self.rows[line];
        let end = col + cols;

        // A span straddling `end` keeps its right part as a new span.
        if let Some(&Cell {
            content: Content::Cont(head),
            ..
        }) = row.get(end)
        {
            let Content::Head(old) = row[head].content else {
                debug_assert!(false, "continuation at {line},{end} points at non-head {head}");
                return;
            };
            let span_end = head + old.cols;
            debug_assert!(
                matches!(old.kind, Kind::Skip | Kind::Text { .. } | Kind::Erase),
                "single-cell span {:?} cannot straddle a split",
                old.kind
            );
            row[end].content = Content::Head(Span {
                cols: span_end - end,
                pen: old.pen,
                kind: old.kind.advanced(end - head),
            });
            for cell in &mut row[end + 1..span_end] {
                cell.content = Content::Cont(end);
            }
        }

        // A span started left of `col` is cut short.
        if let Content::Cont(head) = row[col].content {
            if let Content::Head(old) = &mut row[head].content {
                old.cols = col - head;
            }
        }

        row[col].content = Content::Head(Span { cols, pen, kind });
        for cell in &mut row[col + 1..end] {
            cell.content = Content::Cont(col);
        }
    }

    /// Translate, clip and write a span, leaving masked cells alone.
    fn put(&mut self, line: i32, col: i32, cols: usize, pen: Pen, kind: Kind) {
        let Some(c) = self.xlate_and_clip(line, col, coord(cols)) else {
            return;
        };
        let end = c.col + c.cols;
        let mut x = c.col;
        while x < end {
            if self.rows[c.line][x].mask.is_some() {
                x += 1;
                continue;
            }
            let start = x;
            while x < end && self.rows[c.line][x].mask.is_none() {
                x += 1;
            }
            let kind = kind.advanced(c.skipped + (start - c.col));
            self.make_span(c.line, start, x - start, pen, kind);
        }
    }

    fn store_blob(&mut self, text: &str) -> Result<usize> {
        self.blobs.try_reserve(1)?;
        let mut blob = String::new();
        blob.try_reserve_exact(text.len())?;
        blob.push_str(text);
        self.blobs.push(blob);
        Ok(self.blobs.len() - 1)
    }

    fn blob(&self, index: usize) -> &str {
        self.blobs.get(index).map_or("", String::as_str)
    }

    // ─── Drawing ─────────────────────────────────────────────────────────

    /// Draw `text` at `(line, col)` in the current pen.
    ///
    /// Returns the number of columns the text occupies, whether or not any
    /// of it was visible.
    ///
    /// # Errors
    ///
    /// [`RenderError::ControlCharacter`] if `text` contains a control
    /// character; [`RenderError::Alloc`] if it cannot be stored.
    pub fn text_at(&mut self, line: i32, col: i32, text: &str) -> Result<i32> {
        if let Some((index, ch)) = text.char_indices().find(|(_, ch)| ch.is_control()) {
            return Err(RenderError::ControlCharacter { ch, index });
        }
        let width = text_width(text);
        if self.xlate_and_clip(line, col, coord(width)).is_some() {
            let blob = self.store_blob(text)?;
            self.put(line, col, width, self.pen, Kind::Text { blob, offset: 0 });
        }
        Ok(coord(width))
    }

    /// Draw a single character cell.
    pub fn char_at(&mut self, line: i32, col: i32, ch: char) {
        self.put(line, col, 1, self.pen, Kind::Char(ch));
    }

    /// Blank `cols` cells in the current pen.
    pub fn erase_at(&mut self, line: i32, col: i32, cols: i32) {
        if cols > 0 {
            self.put(line, col, ix(cols), self.pen, Kind::Erase);
        }
    }

    /// Mark `cols` cells as untouched.
    pub fn skip_at(&mut self, line: i32, col: i32, cols: i32) {
        if cols > 0 {
            self.put(line, col, ix(cols), Pen::new(), Kind::Skip);
        }
    }

    pub fn eraserect(&mut self, rect: Rect) {
        for line in rect.top..rect.bottom() {
            self.erase_at(line, rect.left, rect.cols);
        }
    }

    pub fn skiprect(&mut self, rect: Rect) {
        for line in rect.top..rect.bottom() {
            self.skip_at(line, rect.left, rect.cols);
        }
    }

    /// Erase the whole buffer (within the clip) in the current pen.
    pub fn clear(&mut self) {
        let (dy, dx) = self.xlate;
        for line in 0..self.lines {
            self.erase_at(line.saturating_sub(dy), 0i32.saturating_sub(dx), self.cols);
        }
    }

    // ─── Lines ───────────────────────────────────────────────────────────

    fn linecell(&mut self, line: i32, col: i32, bits: LineMask) {
        let Some(c) = self.xlate_and_clip(line, col, 1) else {
            return;
        };
        let pen = self.pen;
        let cell = &mut self.rows[c.line][c.col];
        if cell.mask.is_some() {
            return;
        }
        if let Content::Head(span) = &mut cell.content {
            if let Kind::Line(existing) = span.kind {
                if span.pen.equivalent(&pen) {
                    span.kind = Kind::Line(existing.union(bits));
                    return;
                }
            }
        }
        self.make_span(c.line, c.col, 1, pen, Kind::Line(bits));
    }

    /// Draw a horizontal line from `startcol` to `endcol` inclusive.
    pub fn hline_at(
        &mut self,
        line: i32,
        startcol: i32,
        endcol: i32,
        style: LineStyle,
        caps: LineCaps,
    ) {
        let east = LineMask::EMPTY.with(Direction::East, style);
        let west = LineMask::EMPTY.with(Direction::West, style);
        let both = east.union(west);

        self.linecell(line, startcol, if caps.contains(LineCaps::START) { both } else { east });
        for col in startcol.saturating_add(1)..endcol {
            self.linecell(line, col, both);
        }
        self.linecell(line, endcol, if caps.contains(LineCaps::END) { both } else { west });
    }

    /// Draw a vertical line from `startline` to `endline` inclusive.
    pub fn vline_at(
        &mut self,
        startline: i32,
        endline: i32,
        col: i32,
        style: LineStyle,
        caps: LineCaps,
    ) {
        let north = LineMask::EMPTY.with(Direction::North, style);
        let south = LineMask::EMPTY.with(Direction::South, style);
        let both = north.union(south);

        self.linecell(startline, col, if caps.contains(LineCaps::START) { both } else { south });
        for line in startline.saturating_add(1)..endline {
            self.linecell(line, col, both);
        }
        self.linecell(endline, col, if caps.contains(LineCaps::END) { both } else { north });
    }

    // ─── Virtual cursor ──────────────────────────────────────────────────

    /// Place the virtual cursor used by [`text`](Self::text) and friends.
    pub const fn goto(&mut self, line: i32, col: i32) {
        self.cursor = Some((line, col));
    }

    pub const fn ungoto(&mut self) {
        self.cursor = None;
    }

    #[must_use]
    pub const fn cursor_pos(&self) -> Option<(i32, i32)> {
        self.cursor
    }

    fn cursor(&self) -> Result<(i32, i32)> {
        self.cursor.ok_or(RenderError::NoCursor)
    }

    /// Draw text at the virtual cursor and advance past it.
    ///
    /// # Errors
    ///
    /// [`RenderError::NoCursor`] if no cursor is set; otherwise as
    /// [`text_at`](Self::text_at).
    pub fn text(&mut self, text: &str) -> Result<i32> {
        let (line, col) = self.cursor()?;
        let cols = self.text_at(line, col, text)?;
        self.cursor = Some((line, col.saturating_add(cols)));
        Ok(cols)
    }

    /// # Errors
    ///
    /// [`RenderError::NoCursor`] if no cursor is set.
    pub fn erase(&mut self, cols: i32) -> Result<()> {
        let (line, col) = self.cursor()?;
        self.erase_at(line, col, cols);
        self.cursor = Some((line, col.saturating_add(cols)));
        Ok(())
    }

    /// Erase from the virtual cursor up to column `col`.
    ///
    /// # Errors
    ///
    /// [`RenderError::NoCursor`] if no cursor is set.
    pub fn erase_to(&mut self, col: i32) -> Result<()> {
        let (line, from) = self.cursor()?;
        if from < col {
            self.erase_at(line, from, col.saturating_sub(from));
        }
        self.cursor = Some((line, col));
        Ok(())
    }

    /// # Errors
    ///
    /// [`RenderError::NoCursor`] if no cursor is set.
    pub fn skip(&mut self, cols: i32) -> Result<()> {
        let (line, col) = self.cursor()?;
        self.skip_at(line, col, cols);
        self.cursor = Some((line, col.saturating_add(cols)));
        Ok(())
    }

    /// # Errors
    ///
    /// [`RenderError::NoCursor`] if no cursor is set.
    pub fn skip_to(&mut self, col: i32) -> Result<()> {
        let (line, from) = self.cursor()?;
        if from < col {
            self.skip_at(line, from, col.saturating_sub(from));
        }
        self.cursor = Some((line, col));
        Ok(())
    }

    /// # Errors
    ///
    /// [`RenderError::NoCursor`] if no cursor is set.
    pub fn char(&mut self, ch: char) -> Result<()> {
        let (line, col) = self.cursor()?;
        self.char_at(line, col, ch);
        self.cursor = Some((line, col.saturating_add(1)));
        Ok(())
    }

    // ─── Introspection ───────────────────────────────────────────────────

    /// Head column and span covering the absolute cell `(line, col)`.
    fn span_at(&self, line: i32, col: i32) -> Option<(usize, &Span, &Cell)> {
        let row = self.rows.get(usize::try_from(line).ok()?)?;
        let col = usize::try_from(col).ok()?;
        let cell = row.get(col)?;
        let head = match cell.content {
            Content::Head(_) => col,
            Content::Cont(head) => head,
        };
        match &row[head].content {
            Content::Head(span) => Some((head, span, cell)),
            Content::Cont(_) => {
                debug_assert!(false, "continuation at {line},{col} points at non-head {head}");
                None
            }
        }
    }

    /// Whether the cell will be drawn: covered by content and not masked.
    #[must_use]
    pub fn get_cell_active(&self, line: i32, col: i32) -> bool {
        self.span_at(line, col)
            .is_some_and(|(_, span, cell)| span.kind != Kind::Skip && cell.mask.is_none())
    }

    /// Pen of the span covering the cell, unless it is skipped.
    #[must_use]
    pub fn get_cell_pen(&self, line: i32, col: i32) -> Option<Pen> {
        self.span_at(line, col)
            .filter(|(_, span, _)| span.kind != Kind::Skip)
            .map(|(_, span, _)| span.pen)
    }

    /// Text of a TEXT cell: the grapheme starting there, or an empty string
    /// for the trailing column of a wide grapheme.
    #[must_use]
    pub fn get_cell_text(&self, line: i32, col: i32) -> Option<String> {
        let (head, span, _) = self.span_at(line, col)?;
        let Kind::Text { blob, offset } = span.kind else {
            return None;
        };
        Some(grapheme_at(self.blob(blob), offset + ix(col) - head))
    }

    #[must_use]
    pub fn get_cell_linemask(&self, line: i32, col: i32) -> Option<LineMask> {
        match self.span_at(line, col)?.1.kind {
            Kind::Line(mask) => Some(mask),
            _ => None,
        }
    }

    // ─── Output ──────────────────────────────────────────────────────────

    /// Emit every non-skipped span to `term`, then reset the buffer.
    pub fn flush_to_term<T: TermSink + ?Sized>(&mut self, term: &mut T) {
        let mut spans = 0_usize;

        for (line, row) in self.rows.iter().enumerate() {
            let mut phycol = None;
            let mut col = 0;
            while col < row.len() {
                let Content::Head(span) = row[col].content else {
                    debug_assert!(false, "continuation without head at {line},{col}");
                    col += 1;
                    continue;
                };
                let next = col + span.cols.max(1);
                if span.kind == Kind::Skip {
                    col = next;
                    continue;
                }

                if phycol != Some(col) {
                    term.goto(coord(line), coord(col));
                }
                term.set_pen(&span.pen);
                spans += 1;

                match span.kind {
                    Kind::Text { blob, offset } => {
                        term.print(&slice_columns(self.blob(blob), offset, span.cols));
                        phycol = Some(next);
                    }
                    Kind::Erase => {
                        let more = row.get(next).is_some_and(|cell| {
                            matches!(cell.content, Content::Head(s) if s.kind != Kind::Skip)
                        });
                        if more {
                            term.erase(coord(span.cols), MoveEnd::Yes);
                            phycol = Some(next);
                        } else {
                            term.erase(coord(span.cols), MoveEnd::Maybe);
                            phycol = None;
                        }
                    }
                    Kind::Line(mask) => {
                        let mut glyphs = String::from(mask.glyph());
                        let mut end = next;
                        while let Some(Cell {
                            content:
                                Content::Head(Span {
                                    cols,
                                    pen,
                                    kind: Kind::Line(more),
                                }),
                            ..
                        }) = row.get(end)
                        {
                            if !pen.equivalent(&span.pen) {
                                break;
                            }
                            glyphs.push(more.glyph());
                            end += (*cols).max(1);
                        }
                        term.print(&glyphs);
                        phycol = Some(end);
                        col = end;
                        continue;
                    }
                    Kind::Char(ch) => {
                        let mut buf = [0_u8; 4];
                        term.print(ch.encode_utf8(&mut buf));
                        phycol = Some(next);
                    }
                    Kind::Skip => {}
                }
                col = next;
            }
        }

        tracing::trace!(target: "render.flush", spans, "flushed render buffer");
        self.reset();
    }

    /// Replay the content of `src` into this buffer, under the current
    /// translation, clip, masks and pen. `src` is left untouched.
    ///
    /// Attributes absent from a source span's pen are taken from this
    /// buffer's current pen.
    ///
    /// # Errors
    ///
    /// [`RenderError::Alloc`] if text storage cannot grow.
    pub fn blit(&mut self, src: &Self) -> Result<()> {
        for (line, row) in src.rows.iter().enumerate() {
            let mut col = 0;
            while col < row.len() {
                let Content::Head(span) = row[col].content else {
                    col += 1;
                    continue;
                };
                let (l, c) = (coord(line), coord(col));
                if span.kind != Kind::Skip {
                    self.savepen();
                    self.setpen(&span.pen);
                    let drawn = match span.kind {
                        Kind::Text { blob, offset } => self
                            .text_at(l, c, &slice_columns(src.blob(blob), offset, span.cols))
                            .map(drop),
                        Kind::Erase => {
                            self.erase_at(l, c, coord(span.cols));
                            Ok(())
                        }
                        Kind::Line(mask) => {
                            self.linecell(l, c, mask);
                            Ok(())
                        }
                        Kind::Char(ch) => {
                            self.char_at(l, c, ch);
                            Ok(())
                        }
                        Kind::Skip => Ok(()),
                    };
                    self.restore();
                    drawn?;
                }
                col += span.cols.max(1);
            }
        }
        Ok(())
    }

    /// Copy the content of `src` to the same-sized area at `dest`'s
    /// position, leaving destination cells alone where `src` is skipped.
    ///
    /// Overlapping areas are handled as if the source were read in full
    /// before anything is written.
    pub fn copyrect(&mut self, dest: Rect, src: Rect) {
        self.copy_region(dest, src, false);
    }

    /// Like [`copyrect`](Self::copyrect), but skipped source cells are
    /// copied too, and the part of `src` not covered by the destination is
    /// skipped afterwards.
    pub fn moverect(&mut self, dest: Rect, src: Rect) {
        self.copy_region(dest, src, true);
        let dest = Rect::new(dest.top, dest.left, src.lines, src.cols);
        for rect in src.subtract(dest) {
            self.skiprect(rect);
        }
    }

    fn copy_region(&mut self, dest: Rect, src: Rect, with_skip: bool) {
        let (dy, dx) = (dest.top.saturating_sub(src.top), dest.left.saturating_sub(src.left));
        let (ty, tx) = self.xlate;
        let Some(abs) = src.translate(ty, tx).intersect(self.bounds()) else {
            return;
        };

        let lines: Vec<i32> = if dy > 0 {
            (abs.top..abs.bottom()).rev().collect()
        } else {
            (abs.top..abs.bottom()).collect()
        };
        let (left, right) = (ix(abs.left), ix(abs.right()));

        for line in lines {
            let row = &self.rows[ix(line)];
            let mut pieces = Vec::new();
            let mut col = left;
            while col < right {
                let head = match row[col].content {
                    Content::Head(_) => col,
                    Content::Cont(head) => head,
                };
                let Content::Head(span) = row[head].content else {
                    debug_assert!(false, "continuation at {line},{col} points at non-head");
                    break;
                };
                let end = (head + span.cols.max(1)).min(right);
                pieces.push((col, end - col, span.pen, span.kind.advanced(col - head)));
                col = end;
            }

            for (col, cols, pen, kind) in pieces {
                if kind == Kind::Skip && !with_skip {
                    continue;
                }
                self.put(
                    line.saturating_sub(ty).saturating_add(dy),
                    coord(col).saturating_sub(tx).saturating_add(dx),
                    cols,
                    pen,
                    kind,
                );
            }
        }
    }
}

impl fmt::Debug for RenderBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderBuffer")
            .field("lines", &self.lines)
            .field("cols", &self.cols)
            .field("depth", &self.stack.len())
            .field("xlate", &self.xlate)
            .field("clip", &self.clip)
            .field("pen", &self.pen)
            .finish_non_exhaustive()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockTerm, TermOp};
    use crate::pen::PenColor;
    use pretty_assertions::assert_eq;

    fn flush(rb: &mut RenderBuffer) -> Vec<TermOp> {
        let (lines, cols) = rb.size();
        let mut term = MockTerm::new(lines, cols);
        rb.flush_to_term(&mut term);
        term.take_ops()
    }

    fn flush_screen(rb: &mut RenderBuffer) -> MockTerm {
        let (lines, cols) = rb.size();
        let mut term = MockTerm::new(lines, cols);
        rb.flush_to_term(&mut term);
        term
    }

    fn goto(line: i32, col: i32) -> TermOp {
        TermOp::Goto { line, col }
    }

    fn print(text: &str) -> TermOp {
        TermOp::Print(text.to_owned())
    }

    const PLAIN: TermOp = TermOp::SetPen(Pen::new());

    /// Every row is a gapless chain of heads whose widths sum to the row.
    fn assert_rows_consistent(rb: &RenderBuffer) {
        for row in &rb.rows {
            let mut col = 0;
            while col < row.len() {
                let Content::Head(span) = row[col].content else {
                    panic!("expected head at {col}");
                };
                assert!(span.cols > 0);
                for c in col + 1..col + span.cols {
                    assert!(matches!(row[c].content, Content::Cont(h) if h == col));
                }
                col += span.cols;
            }
            assert_eq!(col, row.len());
        }
    }

    // ── Allocation ───────────────────────────────────────────────────────

    #[test]
    fn new_buffer_is_all_skip() {
        let mut rb = RenderBuffer::new(3, 5).unwrap();
        assert_eq!(rb.size(), (3, 5));
        assert!(!rb.get_cell_active(0, 0));
        assert_eq!(rb.get_cell_pen(2, 4), None);
        assert!(flush(&mut rb).is_empty());
    }

    #[test]
    fn out_of_range_queries_are_none() {
        let rb = RenderBuffer::new(2, 2).unwrap();
        assert!(!rb.get_cell_active(-1, 0));
        assert_eq!(rb.get_cell_text(0, 5), None);
        assert_eq!(rb.get_cell_linemask(9, 0), None);
    }

    // ── Text ─────────────────────────────────────────────────────────────

    #[test]
    fn text_at_emits_goto_pen_print() {
        let mut rb = RenderBuffer::new(2, 10).unwrap();
        assert_eq!(rb.text_at(1, 2, "Hello").unwrap(), 5);
        assert_eq!(flush(&mut rb), vec![goto(1, 2), PLAIN, print("Hello")]);
    }

    #[test]
    fn overwrite_splits_span() {
        let bold = Pen::new().with_bold(true);
        let mut rb = RenderBuffer::new(1, 10).unwrap();
        rb.text_at(0, 0, "aaaaaaaa").unwrap();
        rb.setpen(&bold);
        rb.text_at(0, 3, "AA").unwrap();
        assert_rows_consistent(&rb);

        assert_eq!(
            flush(&mut rb),
            vec![
                goto(0, 0),
                PLAIN,
                print("aaa"),
                TermOp::SetPen(bold),
                print("AA"),
                PLAIN,
                print("aaa"),
            ]
        );
    }

    #[test]
    fn utf8_widths() {
        let mut rb = RenderBuffer::new(1, 20).unwrap();
        assert_eq!(rb.text_at(0, 0, "\u{108}u vi?").unwrap(), 6);
        assert_eq!(rb.text_at(0, 6, "C\u{302}u vi?").unwrap(), 6);
        assert_eq!(rb.text_at(0, 12, "\u{FF10}").unwrap(), 2);

        assert_eq!(rb.get_cell_text(0, 6).as_deref(), Some("C\u{302}"));
        assert_eq!(rb.get_cell_text(0, 12).as_deref(), Some("\u{FF10}"));
        assert_eq!(rb.get_cell_text(0, 13).as_deref(), Some(""));

        let term = flush_screen(&mut rb);
        assert_eq!(
            term.display_span(0, 0, 14),
            "\u{108}u vi?C\u{302}u vi?\u{FF10}"
        );
    }

    #[test]
    fn control_characters_rejected() {
        let mut rb = RenderBuffer::new(1, 10).unwrap();
        let err = rb.text_at(0, 0, "a\tb").unwrap_err();
        assert!(matches!(err, RenderError::ControlCharacter { ch: '\t', index: 1 }));
        assert!(!rb.get_cell_active(0, 0));
    }

    #[test]
    fn second_flush_emits_nothing() {
        let mut rb = RenderBuffer::new(2, 10).unwrap();
        rb.text_at(0, 0, "frame").unwrap();
        rb.erase_at(1, 0, 10);
        assert!(!flush(&mut rb).is_empty());
        assert!(flush(&mut rb).is_empty());
    }

    // ── Clipping ─────────────────────────────────────────────────────────

    #[test]
    fn text_clipped_at_buffer_edges_reports_full_width() {
        let mut rb = RenderBuffer::new(1, 10).unwrap();
        assert_eq!(rb.text_at(0, -2, "Hello").unwrap(), 5);
        assert_eq!(rb.text_at(0, 8, "World").unwrap(), 5);
        assert_eq!(rb.text_at(3, 0, "gone").unwrap(), 4);
        assert_eq!(
            flush(&mut rb),
            vec![goto(0, 0), PLAIN, print("llo"), goto(0, 8), PLAIN, print("Wo")]
        );
    }

    #[test]
    fn wide_grapheme_cut_by_clip_is_padded() {
        let mut rb = RenderBuffer::new(1, 5).unwrap();
        rb.text_at(0, -1, "中x").unwrap();
        rb.text_at(0, 4, "中").unwrap();
        let term = flush_screen(&mut rb);
        assert_eq!(term.display_text(0), " x   ");
        assert_eq!(term.ops()[2], print(" x"));
        assert_eq!(term.ops()[5], print(" "));
    }

    #[test]
    fn translate_and_clip_apply_until_restore() {
        let mut rb = RenderBuffer::new(3, 10).unwrap();
        rb.save();
        rb.translate(1, 2);
        rb.clip(Rect::new(0, 0, 1, 3));
        rb.text_at(0, 0, "abcdef").unwrap();
        rb.text_at(1, 0, "hidden").unwrap();
        rb.restore();
        rb.text_at(0, 0, "z").unwrap();

        assert_eq!(
            flush(&mut rb),
            vec![goto(0, 0), PLAIN, print("z"), goto(1, 2), PLAIN, print("abc")]
        );
    }

    #[test]
    fn disjoint_clip_hides_everything() {
        let mut rb = RenderBuffer::new(3, 10).unwrap();
        rb.clip(Rect::new(0, 0, 1, 5));
        rb.clip(Rect::new(2, 0, 1, 5));
        rb.text_at(0, 0, "x").unwrap();
        rb.text_at(2, 0, "y").unwrap();
        assert!(flush(&mut rb).is_empty());
    }

    #[test]
    fn far_off_screen_geometry_is_dropped() {
        let mut rb = RenderBuffer::new(2, 10).unwrap();
        assert_eq!(rb.text_at(0, i32::MIN, "x").unwrap(), 1);
        rb.char_at(i32::MAX, i32::MAX, 'y');
        rb.erase_at(1, i32::MIN, i32::MAX);
        rb.hline_at(0, i32::MAX - 1, i32::MAX, LineStyle::Single, LineCaps::empty());

        rb.save();
        rb.translate(0, 5);
        rb.mask(Rect::new(0, i32::MAX - 2, 1, 1));
        rb.clip(Rect::new(i32::MAX - 1, 0, 5, 5));
        rb.text_at(0, 0, "hidden").unwrap();
        rb.restore();

        assert!(flush(&mut rb).is_empty());
    }

    // ── Masking ──────────────────────────────────────────────────────────

    #[test]
    fn mask_splits_drawing_around_it() {
        let mut rb = RenderBuffer::new(1, 10).unwrap();
        rb.save();
        rb.mask(Rect::new(0, 2, 1, 3));
        rb.text_at(0, 0, "abcdefgh").unwrap();
        assert!(rb.get_cell_active(0, 1));
        assert!(!rb.get_cell_active(0, 2));
        rb.restore();

        assert_eq!(
            flush(&mut rb),
            vec![goto(0, 0), PLAIN, print("ab"), goto(0, 5), PLAIN, print("fgh")]
        );
    }

    #[test]
    fn restore_lifts_mask() {
        let mut rb = RenderBuffer::new(1, 10).unwrap();
        rb.save();
        rb.mask(Rect::new(0, 2, 1, 3));
        rb.restore();
        rb.text_at(0, 0, "abcdefgh").unwrap();
        assert_eq!(flush(&mut rb), vec![goto(0, 0), PLAIN, print("abcdefgh")]);
    }

    #[test]
    fn masked_cell_of_existing_content_is_inactive() {
        let mut rb = RenderBuffer::new(1, 4).unwrap();
        rb.text_at(0, 0, "abcd").unwrap();
        rb.save();
        rb.mask(Rect::new(0, 1, 1, 1));
        assert!(rb.get_cell_active(0, 0));
        assert!(!rb.get_cell_active(0, 1));
        rb.restore();
        assert!(rb.get_cell_active(0, 1));
    }

    #[test]
    fn nested_masks_lift_one_level_at_a_time() {
        let mut rb = RenderBuffer::new(1, 6).unwrap();
        rb.save();
        rb.mask(Rect::new(0, 0, 1, 2));
        rb.save();
        rb.mask(Rect::new(0, 4, 1, 2));
        rb.restore();
        rb.text_at(0, 0, "abcdef").unwrap();
        rb.restore();

        assert_eq!(flush(&mut rb), vec![goto(0, 2), PLAIN, print("cdef")]);
    }

    // ── Pens ─────────────────────────────────────────────────────────────

    #[test]
    fn setpen_merges_under_saved_pen() {
        let red = Pen::new().with_fg(PenColor::Index(1));
        let mut rb = RenderBuffer::new(1, 1).unwrap();
        rb.setpen(&red);
        assert_eq!(rb.pen(), red);

        rb.save();
        rb.setpen(&Pen::new().with_bold(true));
        assert_eq!(rb.pen(), red.with_bold(true));

        rb.setpen(&Pen::new().with_fg(PenColor::Index(4)));
        assert_eq!(rb.pen(), Pen::new().with_fg(PenColor::Index(4)));

        rb.restore();
        assert_eq!(rb.pen(), red);
    }

    #[test]
    fn savepen_restores_only_pen() {
        let mut rb = RenderBuffer::new(2, 2).unwrap();
        rb.translate(1, 0);
        rb.savepen();
        rb.setpen(&Pen::new().with_italic(true));
        rb.translate(0, 1);
        rb.restorepen();
        assert!(rb.pen().is_empty());
        rb.char_at(0, 0, 'x');
        assert!(rb.get_cell_active(1, 1));
    }

    // ── Erase & skip ─────────────────────────────────────────────────────

    #[test]
    fn erase_moveend_depends_on_what_follows() {
        let mut rb = RenderBuffer::new(1, 10).unwrap();
        rb.erase_at(0, 0, 3);
        rb.text_at(0, 3, "x").unwrap();
        rb.erase_at(0, 5, 5);
        assert_eq!(
            flush(&mut rb),
            vec![
                goto(0, 0),
                PLAIN,
                TermOp::Erase { count: 3, moveend: MoveEnd::Yes },
                PLAIN,
                print("x"),
                goto(0, 5),
                PLAIN,
                TermOp::Erase { count: 5, moveend: MoveEnd::Maybe },
            ]
        );
    }

    #[test]
    fn skip_punches_hole_in_text() {
        let mut rb = RenderBuffer::new(1, 6).unwrap();
        rb.text_at(0, 0, "abcdef").unwrap();
        rb.skip_at(0, 2, 2);
        assert_rows_consistent(&rb);
        assert_eq!(
            flush(&mut rb),
            vec![goto(0, 0), PLAIN, print("ab"), goto(0, 4), PLAIN, print("ef")]
        );
    }

    #[test]
    fn clear_erases_every_line() {
        let mut rb = RenderBuffer::new(2, 3).unwrap();
        rb.translate(1, 1);
        rb.clear();
        assert!(rb.get_cell_active(0, 0));
        assert!(rb.get_cell_active(1, 2));
    }

    #[test]
    fn eraserect_and_skiprect() {
        let mut rb = RenderBuffer::new(3, 4).unwrap();
        rb.eraserect(Rect::new(0, 0, 3, 4));
        rb.skiprect(Rect::new(1, 1, 1, 2));
        assert!(rb.get_cell_active(1, 0));
        assert!(!rb.get_cell_active(1, 1));
        assert!(!rb.get_cell_active(1, 2));
        assert!(rb.get_cell_active(1, 3));
        assert_rows_consistent(&rb);
    }

    // ── Chars & lines ────────────────────────────────────────────────────

    #[test]
    fn char_at_is_one_cell() {
        let mut rb = RenderBuffer::new(1, 3).unwrap();
        rb.char_at(0, 1, 'X');
        assert_eq!(flush(&mut rb), vec![goto(0, 1), PLAIN, print("X")]);
    }

    #[test]
    fn crossing_lines_form_junctions() {
        let mut rb = RenderBuffer::new(3, 5).unwrap();
        rb.hline_at(1, 0, 4, LineStyle::Single, LineCaps::empty());
        rb.vline_at(0, 2, 2, LineStyle::Single, LineCaps::empty());
        assert_eq!(rb.get_cell_linemask(1, 2).map(LineMask::glyph), Some('┼'));

        assert_eq!(
            flush(&mut rb),
            vec![
                goto(0, 2),
                PLAIN,
                print("╷"),
                goto(1, 0),
                PLAIN,
                print("╶─┼─╴"),
                goto(2, 2),
                PLAIN,
                print("╵"),
            ]
        );
    }

    #[test]
    fn caps_extend_line_ends() {
        let mut rb = RenderBuffer::new(1, 3).unwrap();
        rb.hline_at(0, 0, 2, LineStyle::Double, LineCaps::BOTH);
        assert_eq!(flush(&mut rb), vec![goto(0, 0), PLAIN, print("═══")]);
    }

    #[test]
    fn box_corners() {
        let mut rb = RenderBuffer::new(3, 4).unwrap();
        rb.hline_at(0, 0, 3, LineStyle::Single, LineCaps::empty());
        rb.hline_at(2, 0, 3, LineStyle::Single, LineCaps::empty());
        rb.vline_at(0, 2, 0, LineStyle::Single, LineCaps::empty());
        rb.vline_at(0, 2, 3, LineStyle::Single, LineCaps::empty());
        let term = flush_screen(&mut rb);
        assert_eq!(term.display_text(0), "┌──┐");
        assert_eq!(term.display_text(1), "│  │");
        assert_eq!(term.display_text(2), "└──┘");
    }

    #[test]
    fn line_with_different_pen_replaces_cell() {
        let blue = Pen::new().with_fg(PenColor::Index(4));
        let mut rb = RenderBuffer::new(3, 3).unwrap();
        rb.hline_at(1, 0, 2, LineStyle::Single, LineCaps::BOTH);
        rb.setpen(&blue);
        rb.vline_at(0, 2, 1, LineStyle::Single, LineCaps::BOTH);

        assert_eq!(rb.get_cell_linemask(1, 1).map(LineMask::glyph), Some('│'));
        assert_eq!(rb.get_cell_pen(1, 1), Some(blue));

        let ops = flush(&mut rb);
        // The middle row no longer coalesces into one print.
        assert!(ops.contains(&print("─")));
        assert!(ops.contains(&print("│")));
    }

    #[test]
    fn text_over_line_cell() {
        let mut rb = RenderBuffer::new(1, 3).unwrap();
        rb.hline_at(0, 0, 2, LineStyle::Single, LineCaps::BOTH);
        rb.text_at(0, 1, "x").unwrap();
        assert_eq!(rb.get_cell_linemask(0, 1), None);
        let term = flush_screen(&mut rb);
        assert_eq!(term.display_text(0), "─x─");
    }

    // ── Virtual cursor ───────────────────────────────────────────────────

    #[test]
    fn cursor_ops_require_goto() {
        let mut rb = RenderBuffer::new(1, 5).unwrap();
        assert!(matches!(rb.text("ab"), Err(RenderError::NoCursor)));
        assert!(matches!(rb.erase(1), Err(RenderError::NoCursor)));
        assert!(matches!(rb.char('x'), Err(RenderError::NoCursor)));
        assert_eq!(rb.cursor_pos(), None);
    }

    #[test]
    fn cursor_ops_advance() {
        let mut rb = RenderBuffer::new(2, 10).unwrap();
        rb.goto(0, 0);
        assert_eq!(rb.text("ab").unwrap(), 2);
        rb.erase(2).unwrap();
        rb.skip(1).unwrap();
        rb.char('Z').unwrap();
        assert_eq!(rb.cursor_pos(), Some((0, 6)));

        rb.goto(1, 0);
        rb.skip_to(3).unwrap();
        rb.erase_to(5).unwrap();
        rb.erase_to(2).unwrap();
        assert_eq!(rb.cursor_pos(), Some((1, 2)));
        rb.ungoto();
        assert_eq!(rb.cursor_pos(), None);

        assert_eq!(
            flush(&mut rb),
            vec![
                goto(0, 0),
                PLAIN,
                print("ab"),
                PLAIN,
                TermOp::Erase { count: 2, moveend: MoveEnd::Maybe },
                goto(0, 5),
                PLAIN,
                print("Z"),
                goto(1, 3),
                PLAIN,
                TermOp::Erase { count: 2, moveend: MoveEnd::Maybe },
            ]
        );
    }

    #[test]
    fn save_restores_cursor() {
        let mut rb = RenderBuffer::new(1, 5).unwrap();
        rb.goto(0, 1);
        rb.save();
        rb.goto(0, 4);
        rb.restore();
        assert_eq!(rb.cursor_pos(), Some((0, 1)));
    }

    // ── Blit ─────────────────────────────────────────────────────────────

    #[test]
    fn blit_keeps_destination_ambient_pen() {
        let bold = Pen::new().with_bold(true);
        let green = Pen::new().with_fg(PenColor::Index(2));

        let mut src = RenderBuffer::new(1, 10).unwrap();
        src.setpen(&bold);
        src.text_at(0, 0, "hi").unwrap();
        src.erase_at(0, 5, 2);

        let mut dst = RenderBuffer::new(1, 10).unwrap();
        dst.setpen(&green);
        dst.blit(&src).unwrap();

        assert_eq!(dst.get_cell_text(0, 1).as_deref(), Some("i"));
        assert_eq!(dst.get_cell_pen(0, 0), Some(green.with_bold(true)));
        assert_eq!(dst.get_cell_pen(0, 5), Some(green.with_bold(true)));
        assert!(!dst.get_cell_active(0, 3));
        assert_eq!(dst.pen(), green);

        // The source is not consumed.
        assert_eq!(src.get_cell_text(0, 0).as_deref(), Some("h"));
    }

    #[test]
    fn blit_honours_translation() {
        let mut src = RenderBuffer::new(1, 3).unwrap();
        src.text_at(0, 0, "abc").unwrap();
        let mut dst = RenderBuffer::new(3, 5).unwrap();
        dst.translate(2, 1);
        dst.blit(&src).unwrap();
        assert_eq!(dst.get_cell_text(2, 1).as_deref(), Some("a"));
    }

    // ── Copy & move ──────────────────────────────────────────────────────

    fn filled(rows: &[&str]) -> RenderBuffer {
        let cols = rows.iter().map(|r| text_width(r)).max().unwrap_or(0);
        let mut rb = RenderBuffer::new(coord(rows.len()), coord(cols)).unwrap();
        for (line, text) in rows.iter().enumerate() {
            rb.text_at(coord(line), 0, text).unwrap();
        }
        rb
    }

    #[test]
    fn copyrect_to_other_line() {
        let mut rb = RenderBuffer::new(2, 10).unwrap();
        rb.text_at(0, 0, "abcdef").unwrap();
        rb.copyrect(Rect::new(1, 2, 1, 4), Rect::new(0, 0, 1, 4));
        let term = flush_screen(&mut rb);
        assert_eq!(term.display_text(1), "  abcd    ");
    }

    #[test]
    fn copyrect_overlapping_right() {
        let mut rb = filled(&["abcdef"]);
        rb.copyrect(Rect::new(0, 2, 1, 4), Rect::new(0, 0, 1, 4));
        assert_rows_consistent(&rb);
        assert_eq!(flush_screen(&mut rb).display_text(0), "ababcd");
    }

    #[test]
    fn copyrect_overlapping_down_reads_before_writing() {
        let mut rb = filled(&["abc", "def", "ghi"]);
        rb.copyrect(Rect::new(1, 0, 2, 3), Rect::new(0, 0, 2, 3));
        let term = flush_screen(&mut rb);
        assert_eq!(term.display_text(0), "abc");
        assert_eq!(term.display_text(1), "abc");
        assert_eq!(term.display_text(2), "def");
    }

    #[test]
    fn copyrect_overlapping_up() {
        let mut rb = filled(&["abc", "def", "ghi"]);
        rb.copyrect(Rect::new(0, 0, 2, 3), Rect::new(1, 0, 2, 3));
        let term = flush_screen(&mut rb);
        assert_eq!(term.display_text(0), "def");
        assert_eq!(term.display_text(1), "ghi");
        assert_eq!(term.display_text(2), "ghi");
    }

    #[test]
    fn copyrect_leaves_destination_under_skipped_source() {
        let mut rb = RenderBuffer::new(2, 6).unwrap();
        rb.text_at(0, 0, "ab").unwrap();
        rb.text_at(1, 0, "zzzzzz").unwrap();
        rb.copyrect(Rect::new(1, 0, 1, 4), Rect::new(0, 0, 1, 4));
        assert_eq!(flush_screen(&mut rb).display_text(1), "abzzzz");
    }

    #[test]
    fn moverect_copies_skip_and_vacates_source() {
        let mut rb = RenderBuffer::new(2, 6).unwrap();
        rb.text_at(0, 0, "ab").unwrap();
        rb.text_at(1, 0, "zzzzzz").unwrap();
        rb.moverect(Rect::new(1, 0, 1, 4), Rect::new(0, 0, 1, 4));
        assert_rows_consistent(&rb);
        assert!(!rb.get_cell_active(0, 0));
        let term = flush_screen(&mut rb);
        assert_eq!(term.display_text(0), "      ");
        assert_eq!(term.display_text(1), "ab  zz");
    }

    #[test]
    fn moverect_down_overlapping() {
        let mut rb = filled(&["abc", "def", "ghi"]);
        rb.moverect(Rect::new(1, 0, 2, 3), Rect::new(0, 0, 2, 3));
        assert!(!rb.get_cell_active(0, 0));
        let term = flush_screen(&mut rb);
        assert_eq!(term.display_text(1), "abc");
        assert_eq!(term.display_text(2), "def");
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    #[test]
    fn slice_columns_pads_cut_graphemes() {
        assert_eq!(slice_columns("a中b", 0, 4), "a中b");
        assert_eq!(slice_columns("a中b", 2, 2), " b");
        assert_eq!(slice_columns("a中b", 0, 2), "a ");
        assert_eq!(slice_columns("abc", 1, 1), "b");
    }
}
