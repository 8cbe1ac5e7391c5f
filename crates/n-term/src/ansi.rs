// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No state,
// no decisions about when to emit; `TermState` and `AnsiTerm` make those.
// This module just knows the byte-level encoding of every terminal
// command the compositor needs.
//
// All positions are 0-indexed in our API and converted to 1-indexed for the
// terminal (ANSI standard uses 1-based coordinates).
//
// All functions return `io::Result` propagated from the underlying writer.
// In practice they never fail when writing to `OutputBuffer` (backed by a Vec).
use std::io::{self, Write};

use crate::pen::{Pen, PenAttr, PenColor, Underline};
use crate::term::CursorShape;

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `(line, col)` using CUP.
#[inline]
pub fn cursor_to(w: &mut impl Write, line: i32, col: i32) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", line + 1, col + 1)
}

/// Move the cursor right by `n` columns (CUF).
#[inline]
pub fn cursor_forward(w: &mut impl Write, n: i32) -> io::Result<()> {
    write!(w, "\x1b[{n}C")
}

/// Hide the cursor (DECTCEM reset).
#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor (DECTCEM set).
#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

/// Set the cursor shape and blink using DECSCUSR.
pub fn cursor_style(w: &mut impl Write, shape: CursorShape, blink: bool) -> io::Result<()> {
    let steady = u8::from(!blink);
    let n = match shape {
        CursorShape::Block => 1,
        CursorShape::Underline => 3,
        CursorShape::LeftBar => 5,
    } + steady;
    write!(w, "\x1b[{n} q")
}

// ─── Editing ─────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2).
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// Erase `n` characters at the cursor without moving it (ECH).
#[inline]
pub fn erase_chars(w: &mut impl Write, n: i32) -> io::Result<()> {
    write!(w, "\x1b[{n}X")
}

/// Delete `n` characters at the cursor, shifting the rest of the line left (DCH).
#[inline]
pub fn delete_chars(w: &mut impl Write, n: i32) -> io::Result<()> {
    write!(w, "\x1b[{n}P")
}

/// Insert `n` blank characters at the cursor, shifting the rest right (ICH).
#[inline]
pub fn insert_chars(w: &mut impl Write, n: i32) -> io::Result<()> {
    write!(w, "\x1b[{n}@")
}

// ─── Scrolling ───────────────────────────────────────────────────────────────

/// Restrict scrolling to lines `top..bottom` (DECSTBM). Homes the cursor.
#[inline]
pub fn set_scroll_region(w: &mut impl Write, top: i32, bottom: i32) -> io::Result<()> {
    write!(w, "\x1b[{};{}r", top + 1, bottom)
}

/// Reset the scroll region to the full screen. Homes the cursor.
#[inline]
pub fn reset_scroll_region(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[r")
}

/// Scroll the region up by `n` lines (SU).
#[inline]
pub fn scroll_up(w: &mut impl Write, n: i32) -> io::Result<()> {
    write!(w, "\x1b[{n}S")
}

/// Scroll the region down by `n` lines (SD).
#[inline]
pub fn scroll_down(w: &mut impl Write, n: i32) -> io::Result<()> {
    write!(w, "\x1b[{n}T")
}

// ─── SGR ─────────────────────────────────────────────────────────────────────

/// Reset all SGR attributes to terminal defaults (SGR 0).
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

/// Write the SGR parameter(s) for a foreground colour, without the CSI.
///
/// Uses compact codes for standard colours (30–37, 90–97), the 256-colour
/// form for palette indices 16–255, and 24-bit `TrueColor` for RGB.
fn fg_params(w: &mut impl Write, colour: Option<PenColor>) -> io::Result<()> {
    match colour {
        None => w.write_all(b"39"),
        Some(PenColor::Index(idx)) if idx < 8 => write!(w, "{}", 30 + u16::from(idx)),
        Some(PenColor::Index(idx)) if idx < 16 => write!(w, "{}", 82 + u16::from(idx)),
        Some(PenColor::Index(idx)) => write!(w, "38;5;{idx}"),
        Some(PenColor::Rgb(r, g, b)) => write!(w, "38;2;{r};{g};{b}"),
    }
}

/// Same encoding strategy as [`fg_params`] with background codes
/// (40–47, 100–107, 48;5;N, 48;2;R;G;B).
fn bg_params(w: &mut impl Write, colour: Option<PenColor>) -> io::Result<()> {
    match colour {
        None => w.write_all(b"49"),
        Some(PenColor::Index(idx)) if idx < 8 => write!(w, "{}", 40 + u16::from(idx)),
        Some(PenColor::Index(idx)) if idx < 16 => write!(w, "{}", 92 + u16::from(idx)),
        Some(PenColor::Index(idx)) => write!(w, "48;5;{idx}"),
        Some(PenColor::Rgb(r, g, b)) => write!(w, "48;2;{r};{g};{b}"),
    }
}

/// Underline uses the modern SGR 4:N colon syntax for its variants.
fn attr_params(w: &mut impl Write, pen: &Pen, attr: PenAttr) -> io::Result<()> {
    let on = pen.bool_attr(attr);
    match attr {
        PenAttr::Fg => fg_params(w, pen.fg()),
        PenAttr::Bg => bg_params(w, pen.bg()),
        PenAttr::Bold => w.write_all(if on { b"1" } else { b"22" }),
        PenAttr::Italic => w.write_all(if on { b"3" } else { b"23" }),
        PenAttr::Blink => w.write_all(if on { b"5" } else { b"25" }),
        PenAttr::Reverse => w.write_all(if on { b"7" } else { b"27" }),
        PenAttr::Strike => w.write_all(if on { b"9" } else { b"29" }),
        PenAttr::Under => match pen.under().unwrap_or_default() {
            Underline::None => w.write_all(b"24"),
            Underline::Single => w.write_all(b"4"),
            Underline::Double => w.write_all(b"4:2"),
            Underline::Curly => w.write_all(b"4:3"),
        },
        PenAttr::AltFont => write!(w, "{}", 10 + u16::from(pen.altfont().unwrap_or(0).min(9))),
    }
}

/// Emit the SGR sequence that takes the terminal from pen `from` to pen `to`.
///
/// Only attributes that render differently are emitted, semicolon-separated
/// in one CSI: `\x1b[1;38;5;42m`. With `from = None` (terminal state unknown)
/// the sequence starts with a reset and sets every non-default attribute.
/// Writes nothing if the pens are equivalent.
pub fn pen_diff(w: &mut impl Write, from: Option<&Pen>, to: &Pen) -> io::Result<()> {
    let base = Pen::new();
    let (from, mut first) = match from {
        Some(pen) => (pen, true),
        None => {
            w.write_all(b"\x1b[0")?;
            (&base, false)
        }
    };

    for attr in PenAttr::ALL {
        if from.equivalent_attr(to, attr) {
            continue;
        }
        w.write_all(if first { b"\x1b[" } else { b";" })?;
        first = false;
        attr_params(w, to, attr)?;
    }

    if first { Ok(()) } else { w.write_all(b"m") }
}

// ─── Synchronized Output ─────────────────────────────────────────────────────

/// Begin synchronized output (DEC Private Mode 2026).
///
/// Tells the terminal to buffer all subsequent output until [`end_sync`].
/// This prevents partial frame updates from causing visible flicker.
/// Supported by modern terminals: Kitty, `WezTerm`, iTerm2, foot, etc.
#[inline]
pub fn begin_sync(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2026h")
}

/// End synchronized output; the terminal renders the buffered frame.
#[inline]
pub fn end_sync(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2026l")
}

// ─── Alternate Screen ───────────────────────────────────────────────────────

/// Enter the alternate screen buffer (DEC Private Mode 1049).
///
/// The alternate screen is a separate buffer that preserves the original
/// terminal content. On exit, the original content is restored.
#[inline]
pub fn enter_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049h")
}

/// Exit the alternate screen buffer and restore original content.
#[inline]
pub fn exit_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049l")
}

// ─── Tests ───────────────────────────────────────────────────────────────────
