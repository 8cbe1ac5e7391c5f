// SPDX-License-Identifier: MIT
//
// Window events and the input values routed through the tree.
//
// Hooks bound on a window receive a `WindowEvent`. The event carries its
// payload by reference where the payload belongs to the caller: an EXPOSE
// hook draws into the frame's render buffer, a KEY hook reads the key being
// routed. Key and mouse values are already decoded; turning terminal bytes
// into them is the host's job.

use n_term::{Rect, RenderBuffer};

use crate::window::WindowId;

// ─── Event Mask ──────────────────────────────────────────────────────────────

bitflags::bitflags! {
    /// Which events a hook is bound to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventMask: u16 {
        const GEOMCHANGE = 1 << 0;
        const EXPOSE     = 1 << 1;
        const FOCUS      = 1 << 2;
        const KEY        = 1 << 3;
        const MOUSE      = 1 << 4;
        const DESTROY    = 1 << 5;
    }
}

// ─── Input ───────────────────────────────────────────────────────────────────

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const ALT   = 1 << 1;
        const CTRL  = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// A named key such as `Enter` or `F1`.
    Key,
    /// Printable text.
    Text,
}

/// A decoded keypress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub kind: KeyKind,
    pub name: String,
    pub mods: Modifiers,
}

impl KeyEvent {
    #[must_use]
    pub fn key(name: &str, mods: Modifiers) -> Self {
        Self {
            kind: KeyKind::Key,
            name: name.to_owned(),
            mods,
        }
    }

    #[must_use]
    pub fn text(text: &str) -> Self {
        Self {
            kind: KeyKind::Text,
            name: text.to_owned(),
            mods: Modifiers::empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseKind {
    Press,
    Drag,
    Release,
    Wheel,
}

/// A decoded mouse event. `line`/`col` are relative to the window
/// receiving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub kind: MouseKind,
    pub button: u8,
    pub line: i32,
    pub col: i32,
    pub mods: Modifiers,
}

impl MouseEvent {
    #[must_use]
    pub const fn new(kind: MouseKind, button: u8, line: i32, col: i32) -> Self {
        Self {
            kind,
            button,
            line,
            col,
            mods: Modifiers::empty(),
        }
    }

    /// The same event seen from a child whose origin is `(top, left)`.
    #[must_use]
    pub const fn relative_to(self, top: i32, left: i32) -> Self {
        Self {
            line: self.line - top,
            col: self.col - left,
            ..self
        }
    }
}

// ─── Window Events ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusKind {
    In,
    Out,
}

/// An event delivered to a window's hooks.
#[derive(Debug)]
pub enum WindowEvent<'a> {
    /// Geometry changed from `old` to `rect`, both relative to the parent.
    Geomchange { rect: Rect, old: Rect },
    /// Paint `rect` (window coordinates) into `rb`, which is already
    /// translated and clipped to the window.
    Expose { rb: &'a mut RenderBuffer, rect: Rect },
    /// `win` is the window itself, or a child when focus-child-notify is set.
    Focus { kind: FocusKind, win: WindowId },
    Key(&'a KeyEvent),
    Mouse(&'a MouseEvent),
    Destroy,
}

impl WindowEvent<'_> {
    #[must_use]
    pub const fn mask(&self) -> EventMask {
        match self {
            Self::Geomchange { .. } => EventMask::GEOMCHANGE,
            Self::Expose { .. } => EventMask::EXPOSE,
            Self::Focus { .. } => EventMask::FOCUS,
            Self::Key(_) => EventMask::KEY,
            Self::Mouse(_) => EventMask::MOUSE,
            Self::Destroy => EventMask::DESTROY,
        }
    }
}
