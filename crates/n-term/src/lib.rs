// SPDX-License-Identifier: MIT
//
// n-term — the rendering layer of n-tui.
//
// Drawing happens in two stages. Callers describe a frame into a
// `RenderBuffer`: text, erases, box-drawing lines and single characters,
// under a save/restore stack of translation, clip rect, masks and pen. The
// buffer stores runs of cells as spans rather than per-cell state, so a
// flush walks spans and emits one terminal operation per span. Cells nobody
// drew are skipped entirely.
//
// The terminal itself is behind the `TermSink` trait. `AnsiTerm` speaks
// escape sequences with cursor and pen state tracking; `MockTerm` records
// calls and emulates a screen for tests.
//
// Damage is tracked with `Rect` and `RectSet`; callbacks live in
// `HookList`s that tolerate being modified while they run.

pub mod ansi;
pub mod ansi_term;
pub mod error;
pub mod hook;
pub mod line;
pub mod mock;
pub mod output;
pub mod pen;
pub mod rect;
pub mod rectset;
pub mod renderbuffer;
pub mod term;
pub mod terminal;

pub use ansi_term::AnsiTerm;
pub use error::{RenderError, Result};
pub use hook::{BindFlags, HookId, HookList, RunMode};
pub use line::{Direction, LineCaps, LineMask, LineStyle};
pub use mock::{MockTerm, TermOp};
pub use pen::{Pen, PenAttr, PenColor, Underline};
pub use rect::Rect;
pub use rectset::RectSet;
pub use renderbuffer::RenderBuffer;
pub use term::{CursorShape, MoveEnd, TermSink};
