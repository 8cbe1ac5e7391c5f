// SPDX-License-Identifier: MIT
//
// Window nodes and the arena that owns them.
//
// Windows form a tree, but nothing in the tree owns anything else: every
// node lives in an arena inside the `RootWindow` and refers to its parent
// and children by `WindowId`. An id carries a generation, so an id kept
// past its window's destruction never resolves to whatever later reuses
// the slot.

use n_term::{CursorShape, HookList, Pen, Rect};

use crate::event::{EventMask, WindowEvent};
use crate::root::RootWindow;

// ─── Ids & Flags ─────────────────────────────────────────────────────────────

/// Stable handle to a window. Stale once the window is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId {
    index: u32,
    generation: u32,
}

bitflags::bitflags! {
    /// Options for creating a window.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct WindowFlags: u8 {
        /// Start hidden.
        const HIDDEN      = 1 << 0;
        /// Insert behind existing siblings instead of in front.
        const LOWEST      = 1 << 1;
        /// Attach to the root instead of the given parent, keeping the
        /// same on-screen position.
        const ROOT_PARENT = 1 << 2;
        /// Receive input before siblings, regardless of position.
        const STEAL_INPUT = 1 << 3;
        const POPUP       = Self::ROOT_PARENT.bits() | Self::STEAL_INPUT.bits();
    }
}

/// A callback bound on a window. Receives the whole tree, the window it was
/// bound on, and the event. Returning `true` claims KEY and MOUSE events.
pub type WindowHook<T> = dyn FnMut(&mut RootWindow<T>, WindowId, &mut WindowEvent<'_>) -> bool;

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Where a window wants the terminal cursor while it has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub line: i32,
    pub col: i32,
    pub shape: CursorShape,
    pub visible: bool,
    pub blink: bool,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            line: 0,
            col: 0,
            shape: CursorShape::Block,
            visible: true,
            blink: true,
        }
    }
}

// ─── Window ──────────────────────────────────────────────────────────────────

pub(crate) struct Window<T> {
    pub(crate) parent: Option<WindowId>,
    /// Front-most first.
    pub(crate) children: Vec<WindowId>,
    pub(crate) pen: Pen,
    /// Relative to the parent.
    pub(crate) rect: Rect,
    pub(crate) cursor: Cursor,
    pub(crate) visible: bool,
    pub(crate) focused: bool,
    pub(crate) focused_child: Option<WindowId>,
    pub(crate) steal_input: bool,
    pub(crate) focus_child_notify: bool,
    pub(crate) hooks: HookList<EventMask, WindowHook<T>>,
}

impl<T> Window<T> {
    pub(crate) fn new(parent: Option<WindowId>, rect: Rect, flags: WindowFlags) -> Self {
        Self {
            parent,
            children: Vec::new(),
            pen: Pen::new(),
            rect,
            cursor: Cursor::default(),
            visible: !flags.contains(WindowFlags::HIDDEN),
            focused: false,
            focused_child: None,
            steal_input: flags.contains(WindowFlags::STEAL_INPUT),
            focus_child_notify: false,
            hooks: HookList::new(),
        }
    }

    /// The window's own area in its own coordinates.
    pub(crate) const fn self_rect(&self) -> Rect {
        Rect::new(0, 0, self.rect.lines, self.rect.cols)
    }
}

// ─── Arena ───────────────────────────────────────────────────────────────────

struct Slot<T> {
    generation: u32,
    window: Option<Window<T>>,
}

pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, window: Window<T>) -> WindowId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.window = Some(window);
            return WindowId {
                index,
                generation: slot.generation,
            };
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            window: Some(window),
        });
        WindowId {
            index,
            generation: 0,
        }
    }

    pub(crate) fn get(&self, id: WindowId) -> Option<&Window<T>> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?
            .window
            .as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: WindowId) -> Option<&mut Window<T>> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?
            .window
            .as_mut()
    }

    pub(crate) fn remove(&mut self, id: WindowId) -> Option<Window<T>> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?;
        let window = slot.window.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(window)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.window.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node() -> Window<()> {
        Window::new(None, Rect::new(0, 0, 1, 1), WindowFlags::empty())
    }

    #[test]
    fn stale_ids_do_not_resolve_after_reuse() {
        let mut arena = Arena::new();
        let a = arena.insert(node());
        assert!(arena.remove(a).is_some());
        let b = arena.insert(node());
        assert_ne!(a, b);
        assert!(arena.get(a).is_none());
        assert!(arena.get(b).is_some());
        assert!(arena.remove(a).is_none());
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn flags_shape_new_windows() {
        let w: Window<()> = Window::new(None, Rect::new(2, 3, 4, 5), WindowFlags::HIDDEN | WindowFlags::POPUP);
        assert!(!w.visible);
        assert!(w.steal_input);
        assert_eq!(w.self_rect(), Rect::new(0, 0, 4, 5));
        assert_eq!(w.cursor, Cursor::default());
    }
}
