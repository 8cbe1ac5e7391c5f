// SPDX-License-Identifier: MIT
//
// n-window — the window tree of n-tui.
//
// A `RootWindow` owns a terminal sink and a tree of rectangular windows,
// each positioned relative to its parent and stacked front-to-back among
// its siblings. Application code never draws directly. It binds EXPOSE
// hooks, marks areas damaged with `expose`, and calls `tick` once per
// event-loop iteration; the tick paints every damaged rectangle through one
// render buffer and flushes it, so each cell is written at most once.
//
// Focus, key and mouse routing, hardware scrolling and named window
// controls each live in their own module as further `impl RootWindow`
// blocks.

pub mod ctl;
pub mod error;
pub mod event;
mod focus;
mod input;
pub mod root;
mod scroll;
pub mod window;

pub use ctl::{CtlDirective, CtlValue, WindowCtl};
pub use error::{Result, WindowError};
pub use event::{
    EventMask, FocusKind, KeyEvent, KeyKind, Modifiers, MouseEvent, MouseKind, WindowEvent,
};
pub use root::RootWindow;
pub use window::{Cursor, WindowFlags, WindowHook, WindowId};
