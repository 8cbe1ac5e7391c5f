// SPDX-License-Identifier: MIT
//
// RootWindow — the window tree, its damage, and the tick that paints it.
//
// The root owns everything: the window arena, the terminal sink, the set of
// damaged screen rectangles and a queue of pending hierarchy changes.
// Nothing is drawn when application code exposes, moves or reorders a
// window. Those calls only record work. `tick` then does it in three steps:
//
//   1. Hierarchy: apply queued inserts, removals and reorders in order.
//   2. Expose: paint every damaged rectangle into one fresh RenderBuffer and
//      flush it, so each terminal cell is written at most once per tick.
//   3. Restore: put the terminal cursor where the focused window wants it,
//      or hide it, then flush the sink.
//
// Painting a window walks its children front-most first. Each visible child
// paints the part of the rect it covers, then gets masked, so windows behind
// it (and finally the parent's own EXPOSE hooks) cannot draw over it.
//
// Hierarchy changes are queued rather than applied directly because they are
// typically requested from inside hooks, while the child list that would
// change is being walked.

use std::collections::VecDeque;

use n_term::hook::{self, BindFlags, HookId, RunMode};
use n_term::{CursorShape, Pen, Rect, RectSet, RenderBuffer, TermSink};

use crate::error::Result;
use crate::event::{EventMask, WindowEvent};
use crate::window::{Arena, Cursor, Window, WindowFlags, WindowHook, WindowId};

// ─── Hierarchy Changes ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HierarchyChange {
    InsertFirst(WindowId),
    InsertLast(WindowId),
    Remove(WindowId),
    Raise(WindowId),
    RaiseToFront(WindowId),
    Lower(WindowId),
    LowerToBack(WindowId),
}

impl HierarchyChange {
    const fn window(self) -> WindowId {
        match self {
            Self::InsertFirst(win)
            | Self::InsertLast(win)
            | Self::Remove(win)
            | Self::Raise(win)
            | Self::RaiseToFront(win)
            | Self::Lower(win)
            | Self::LowerToBack(win) => win,
        }
    }
}

// ─── RootWindow ──────────────────────────────────────────────────────────────

/// The top of a window tree, drawing onto the terminal sink `T`.
pub struct RootWindow<T> {
    term: T,
    pub(crate) windows: Arena<T>,
    root: WindowId,
    pub(crate) damage: RectSet,
    queue: VecDeque<HierarchyChange>,
    needs_expose: bool,
    needs_restore: bool,
    needs_later_processing: bool,
}

impl<T: TermSink> RootWindow<T> {
    /// A root window covering the whole of `term`.
    pub fn new(term: T) -> Self {
        let (lines, cols) = term.size();
        let mut windows = Arena::new();
        let root = windows.insert(Window::new(
            None,
            Rect::new(0, 0, lines, cols),
            WindowFlags::empty(),
        ));
        tracing::debug!(target: "window.hierarchy", lines, cols, "new root window");
        Self {
            term,
            windows,
            root,
            damage: RectSet::new(),
            queue: VecDeque::new(),
            needs_expose: false,
            needs_restore: false,
            needs_later_processing: false,
        }
    }

    #[must_use]
    pub const fn root(&self) -> WindowId {
        self.root
    }

    #[must_use]
    pub const fn term(&self) -> &T {
        &self.term
    }

    pub const fn term_mut(&mut self) -> &mut T {
        &mut self.term
    }

    pub fn into_term(self) -> T {
        self.term
    }

    /// Screen areas waiting for the next tick.
    #[must_use]
    pub const fn damage(&self) -> &RectSet {
        &self.damage
    }

    /// Whether [`tick`](Self::tick) has work to do.
    #[must_use]
    pub const fn needs_tick(&self) -> bool {
        self.needs_later_processing
    }

    pub(crate) fn node(&self, win: WindowId) -> Option<&Window<T>> {
        self.windows.get(win)
    }

    pub(crate) fn node_mut(&mut self, win: WindowId) -> Option<&mut Window<T>> {
        self.windows.get_mut(win)
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    /// Whether `win` still exists.
    #[must_use]
    pub fn exists(&self, win: WindowId) -> bool {
        self.node(win).is_some()
    }

    /// Number of live windows, including the root.
    #[must_use]
    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    #[must_use]
    pub fn parent(&self, win: WindowId) -> Option<WindowId> {
        self.node(win)?.parent
    }

    /// Children in front-to-back order. Windows created since the last tick
    /// are not listed yet.
    #[must_use]
    pub fn children(&self, win: WindowId) -> Option<&[WindowId]> {
        self.node(win).map(|node| node.children.as_slice())
    }

    /// Geometry relative to the parent.
    #[must_use]
    pub fn geometry(&self, win: WindowId) -> Option<Rect> {
        self.node(win).map(|node| node.rect)
    }

    /// Geometry relative to the screen.
    #[must_use]
    pub fn abs_geometry(&self, win: WindowId) -> Option<Rect> {
        let node = self.node(win)?;
        let mut rect = node.rect;
        let mut parent = node.parent;
        while let Some(id) = parent {
            let up = self.node(id)?;
            rect = rect.translate(up.rect.top, up.rect.left);
            parent = up.parent;
        }
        Some(rect)
    }

    #[must_use]
    pub fn bottom(&self, win: WindowId) -> Option<i32> {
        self.geometry(win).map(Rect::bottom)
    }

    #[must_use]
    pub fn right(&self, win: WindowId) -> Option<i32> {
        self.geometry(win).map(Rect::right)
    }

    #[must_use]
    pub fn is_visible(&self, win: WindowId) -> bool {
        self.node(win).is_some_and(|node| node.visible)
    }

    #[must_use]
    pub fn is_focused(&self, win: WindowId) -> bool {
        self.node(win).is_some_and(|node| node.focused)
    }

    #[must_use]
    pub fn focused_child(&self, win: WindowId) -> Option<WindowId> {
        self.node(win)?.focused_child
    }

    #[must_use]
    pub fn pen(&self, win: WindowId) -> Option<Pen> {
        self.node(win).map(|node| node.pen)
    }

    #[must_use]
    pub fn cursor(&self, win: WindowId) -> Option<Cursor> {
        self.node(win).map(|node| node.cursor)
    }

    // ─── Creation & Destruction ──────────────────────────────────────────

    /// Create a window at `rect` inside `parent`.
    ///
    /// The window joins its parent's child list at the next tick. Returns
    /// `None` if `parent` no longer exists.
    pub fn new_window(
        &mut self,
        parent: WindowId,
        rect: Rect,
        flags: WindowFlags,
    ) -> Option<WindowId> {
        let mut parent = parent;
        let mut rect = rect;
        self.node(parent)?;

        if flags.contains(WindowFlags::ROOT_PARENT) {
            loop {
                let node = self.node(parent)?;
                let Some(up) = node.parent else { break };
                rect = rect.translate(node.rect.top, node.rect.left);
                parent = up;
            }
        }

        let win = self.windows.insert(Window::new(Some(parent), rect, flags));
        let change = if flags.contains(WindowFlags::LOWEST) {
            HierarchyChange::InsertLast(win)
        } else {
            HierarchyChange::InsertFirst(win)
        };
        self.request_hierarchy_change(change);
        tracing::debug!(target: "window.hierarchy", ?win, ?parent, %rect, ?flags, "new window");
        Some(win)
    }

    pub fn new_subwindow(&mut self, parent: WindowId, rect: Rect) -> Option<WindowId> {
        self.new_window(parent, rect, WindowFlags::empty())
    }

    pub fn new_hidden_subwindow(&mut self, parent: WindowId, rect: Rect) -> Option<WindowId> {
        self.new_window(parent, rect, WindowFlags::HIDDEN)
    }

    /// A window attached to the root, positioned relative to `parent`.
    pub fn new_float(&mut self, parent: WindowId, rect: Rect) -> Option<WindowId> {
        self.new_window(parent, rect, WindowFlags::ROOT_PARENT)
    }

    /// A floating window that takes all input.
    pub fn new_popup(&mut self, parent: WindowId, rect: Rect) -> Option<WindowId> {
        self.new_window(parent, rect, WindowFlags::POPUP)
    }

    /// Destroy `win` and all its descendants now.
    ///
    /// DESTROY hooks fire first, on the window before its children. The
    /// vacated area is damaged. The root cannot be destroyed.
    pub fn destroy(&mut self, win: WindowId) {
        if win == self.root {
            tracing::warn!(target: "window.hierarchy", "ignoring attempt to destroy the root window");
            return;
        }
        if !self.exists(win) {
            tracing::trace!(target: "window.hierarchy", ?win, "destroy of stale window");
            return;
        }

        self.run_event(win, &mut WindowEvent::Destroy, RunMode::All);

        let Some(node) = self.node_mut(win) else {
            return;
        };
        node.hooks.unbind_all();
        let mut doomed = node.children.clone();
        doomed.extend(self.queue.iter().filter_map(|change| match *change {
            HierarchyChange::InsertFirst(child) | HierarchyChange::InsertLast(child)
                if self.parent(child) == Some(win) =>
            {
                Some(child)
            }
            _ => None,
        }));
        for child in doomed {
            self.destroy(child);
        }

        self.queue.retain(|change| change.window() != win);
        let Some(node) = self.windows.remove(win) else {
            return;
        };

        if let Some(parent) = node.parent {
            let mut linked = false;
            if let Some(up) = self.node_mut(parent) {
                if let Some(pos) = up.children.iter().position(|&c| c == win) {
                    up.children.remove(pos);
                    linked = true;
                }
                if up.focused_child == Some(win) {
                    up.focused_child = None;
                }
            }
            if linked && node.visible {
                self.expose(parent, Some(node.rect));
            }
        }
        if node.focused || node.focused_child.is_some() {
            self.request_restore();
        }
        tracing::debug!(target: "window.hierarchy", ?win, "destroyed window");
    }

    /// Destroy `win` at the next tick.
    pub fn close(&mut self, win: WindowId) {
        if win != self.root && self.exists(win) {
            self.request_hierarchy_change(HierarchyChange::Remove(win));
        }
    }

    // ─── Hooks ───────────────────────────────────────────────────────────

    /// Bind `hook` to the events in `mask` on `win`.
    pub fn bind_event<F>(
        &mut self,
        win: WindowId,
        mask: EventMask,
        flags: BindFlags,
        hook: F,
    ) -> Option<HookId>
    where
        F: FnMut(&mut Self, WindowId, &mut WindowEvent<'_>) -> bool + 'static,
    {
        let hook: Box<WindowHook<T>> = Box::new(hook);
        Some(self.node_mut(win)?.hooks.bind(mask, flags, hook))
    }

    pub fn unbind_event(&mut self, win: WindowId, id: HookId) -> bool {
        self.node_mut(win).is_some_and(|node| node.hooks.unbind(id))
    }

    /// Run the hooks of `win` matching `event`. Returns whether any hook
    /// returned `true`.
    pub(crate) fn run_event(
        &mut self,
        win: WindowId,
        event: &mut WindowEvent<'_>,
        mode: RunMode,
    ) -> bool {
        let mask = event.mask();
        hook::dispatch(
            self,
            |root| root.windows.get_mut(win).map(|node| &mut node.hooks),
            mask,
            mode,
            |hook, root| hook(root, win, event),
        )
    }

    // ─── Visibility ──────────────────────────────────────────────────────

    pub fn show(&mut self, win: WindowId) {
        let Some(node) = self.node_mut(win) else {
            return;
        };
        node.visible = true;
        let holds_focus = node.focused || node.focused_child.is_some();
        let parent = node.parent;
        if holds_focus {
            let mut relinked = false;
            if let Some(up) = parent.and_then(|parent| self.node_mut(parent)) {
                if up.focused_child.is_none() {
                    up.focused_child = Some(win);
                    relinked = true;
                }
            }
            if relinked {
                self.request_restore();
            }
        }
        self.expose(win, None);
    }

    /// Hide `win`. A parent whose focus passed through it forgets the link.
    pub fn hide(&mut self, win: WindowId) {
        let Some(node) = self.node_mut(win) else {
            return;
        };
        node.visible = false;
        let rect = node.rect;
        let holds_focus = node.focused || node.focused_child.is_some();
        let Some(parent) = node.parent else {
            return;
        };
        if let Some(up) = self.node_mut(parent) {
            if up.focused_child == Some(win) {
                up.focused_child = None;
            }
        }
        if holds_focus {
            self.request_restore();
        }
        self.expose(parent, Some(rect));
    }

    // ─── Damage ──────────────────────────────────────────────────────────

    /// Mark `rect` of `win` (window coordinates; `None` for all of it) as
    /// needing a repaint at the next tick.
    pub fn expose(&mut self, win: WindowId, rect: Option<Rect>) {
        let Some(node) = self.node(win) else {
            return;
        };
        let mut damaged = match rect {
            Some(rect) => match node.self_rect().intersect(rect) {
                Some(damaged) => damaged,
                None => return,
            },
            None => node.self_rect(),
        };

        let mut win = win;
        loop {
            let Some(node) = self.node(win) else {
                return;
            };
            if !node.visible {
                return;
            }
            let Some(parent) = node.parent else {
                break;
            };
            damaged = damaged.translate(node.rect.top, node.rect.left);
            let Some(clipped) = self
                .node(parent)
                .and_then(|up| up.self_rect().intersect(damaged))
            else {
                return;
            };
            damaged = clipped;
            win = parent;
        }

        if damaged.is_empty() || self.damage.contains(damaged) {
            return;
        }
        self.damage.add(damaged);
        self.needs_expose = true;
        self.needs_later_processing = true;
        tracing::trace!(target: "window.tick", rect = %damaged, "damage");
    }

    pub(crate) const fn request_restore(&mut self) {
        self.needs_restore = true;
        self.needs_later_processing = true;
    }

    // ─── Geometry ────────────────────────────────────────────────────────

    /// Move and resize `win`, damaging both the old and new area in the
    /// parent, then fire GEOMCHANGE.
    pub fn set_geometry(&mut self, win: WindowId, geom: Rect) {
        let Some(node) = self.node(win) else {
            return;
        };
        let old = node.rect;
        if old == geom {
            return;
        }
        let parent = node.parent;
        let in_focus_chain = node.focused || node.focused_child.is_some();

        if let Some(parent) = parent {
            self.expose(parent, Some(old));
        }
        if let Some(node) = self.node_mut(win) {
            node.rect = geom;
        }
        if let Some(parent) = parent {
            self.expose(parent, Some(geom));
        }
        if in_focus_chain {
            self.request_restore();
        }
        tracing::trace!(target: "window.hierarchy", ?win, %old, new = %geom, "geometry change");
        self.run_event(win, &mut WindowEvent::Geomchange { rect: geom, old }, RunMode::All);
    }

    pub fn resize(&mut self, win: WindowId, lines: i32, cols: i32) {
        if let Some(rect) = self.geometry(win) {
            self.set_geometry(win, Rect::new(rect.top, rect.left, lines, cols));
        }
    }

    pub fn reposition(&mut self, win: WindowId, top: i32, left: i32) {
        if let Some(rect) = self.geometry(win) {
            self.set_geometry(win, Rect::new(top, left, rect.lines, rect.cols));
        }
    }

    /// The terminal changed size: resize the root and repaint everything.
    pub fn resize_term(&mut self, lines: i32, cols: i32) {
        let root = self.root;
        let bounds = Rect::new(0, 0, lines, cols);
        self.damage.intersect_with(bounds);
        self.set_geometry(root, bounds);
        self.expose(root, None);
    }

    // ─── Ordering ────────────────────────────────────────────────────────

    /// Move `win` one place towards the front (at the next tick).
    pub fn raise(&mut self, win: WindowId) {
        self.request_reorder(HierarchyChange::Raise(win));
    }

    pub fn raise_to_front(&mut self, win: WindowId) {
        self.request_reorder(HierarchyChange::RaiseToFront(win));
    }

    /// Move `win` one place towards the back (at the next tick).
    pub fn lower(&mut self, win: WindowId) {
        self.request_reorder(HierarchyChange::Lower(win));
    }

    pub fn lower_to_back(&mut self, win: WindowId) {
        self.request_reorder(HierarchyChange::LowerToBack(win));
    }

    fn request_reorder(&mut self, change: HierarchyChange) {
        if self.parent(change.window()).is_some() {
            self.request_hierarchy_change(change);
        }
    }

    fn request_hierarchy_change(&mut self, change: HierarchyChange) {
        tracing::trace!(target: "window.hierarchy", ?change, "queued");
        self.queue.push_back(change);
        self.needs_later_processing = true;
    }

    /// Changes are popped one at a time so that a `Remove` still sees the
    /// pending inserts of the children it takes with it.
    fn apply_hierarchy_changes(&mut self) {
        tracing::debug!(target: "window.hierarchy", changes = self.queue.len(), "applying hierarchy changes");
        while let Some(change) = self.queue.pop_front() {
            match change {
                HierarchyChange::InsertFirst(win) => self.link(win, true),
                HierarchyChange::InsertLast(win) => self.link(win, false),
                HierarchyChange::Remove(win) => self.destroy(win),
                HierarchyChange::Raise(win) => self.reorder(win, |children, pos| {
                    if pos > 0 {
                        children.swap(pos, pos - 1);
                    }
                }),
                HierarchyChange::RaiseToFront(win) => self.reorder(win, |children, pos| {
                    let win = children.remove(pos);
                    children.insert(0, win);
                }),
                HierarchyChange::Lower(win) => self.reorder(win, |children, pos| {
                    if pos + 1 < children.len() {
                        children.swap(pos, pos + 1);
                    }
                }),
                HierarchyChange::LowerToBack(win) => self.reorder(win, |children, pos| {
                    let win = children.remove(pos);
                    children.push(win);
                }),
            }
        }
    }

    fn link(&mut self, win: WindowId, first: bool) {
        let Some(parent) = self.parent(win) else {
            return;
        };
        let Some(up) = self.node_mut(parent) else {
            return;
        };
        if up.children.contains(&win) {
            return;
        }
        if first {
            up.children.insert(0, win);
        } else {
            up.children.push(win);
        }
        self.expose(win, None);
    }

    fn reorder(&mut self, win: WindowId, op: impl FnOnce(&mut Vec<WindowId>, usize)) {
        let Some(parent) = self.parent(win) else {
            return;
        };
        let Some(rect) = self.geometry(win) else {
            return;
        };
        let Some(up) = self.node_mut(parent) else {
            return;
        };
        let Some(pos) = up.children.iter().position(|&c| c == win) else {
            return;
        };
        op(&mut up.children, pos);
        if self.is_visible(win) {
            self.expose(parent, Some(rect));
        }
    }

    // ─── Pen & Cursor ────────────────────────────────────────────────────

    /// Replace the window's pen and repaint it.
    pub fn set_pen(&mut self, win: WindowId, pen: Pen) {
        if let Some(node) = self.node_mut(win) {
            node.pen = pen;
            self.expose(win, None);
        }
    }

    pub fn set_cursor_position(&mut self, win: WindowId, line: i32, col: i32) {
        self.update_cursor(win, |cursor| {
            cursor.line = line;
            cursor.col = col;
        });
    }

    pub fn set_cursor_visible(&mut self, win: WindowId, visible: bool) {
        self.update_cursor(win, |cursor| cursor.visible = visible);
    }

    pub fn set_cursor_shape(&mut self, win: WindowId, shape: CursorShape) {
        self.update_cursor(win, |cursor| cursor.shape = shape);
    }

    pub fn set_cursor_blink(&mut self, win: WindowId, blink: bool) {
        self.update_cursor(win, |cursor| cursor.blink = blink);
    }

    pub(crate) fn update_cursor(&mut self, win: WindowId, update: impl FnOnce(&mut Cursor)) {
        let Some(node) = self.node_mut(win) else {
            return;
        };
        update(&mut node.cursor);
        if node.focused {
            self.request_restore();
        }
    }

    // ─── Tick ────────────────────────────────────────────────────────────

    /// Apply pending hierarchy changes, repaint damage and restore the
    /// cursor.
    ///
    /// Hierarchy changes queued by DESTROY hooks while the queue drains are
    /// applied in the same tick. Hooks that expose or reorder windows while
    /// painting schedule work for the next one.
    ///
    /// # Errors
    ///
    /// Returns an error if the render buffer cannot be allocated or the
    /// terminal flush fails.
    pub fn tick(&mut self) -> Result<()> {
        self.needs_later_processing = false;

        if !self.queue.is_empty() {
            self.apply_hierarchy_changes();
        }

        if self.needs_expose {
            self.needs_expose = false;
            let root = self.root;
            let (lines, cols) = self
                .geometry(root)
                .map_or((0, 0), |rect| (rect.lines, rect.cols));
            let mut rb = RenderBuffer::new(lines, cols)?;

            let rects = self.damage.take();
            tracing::debug!(target: "window.tick", rects = rects.len(), "exposing damage");
            for rect in rects {
                rb.save();
                rb.clip(rect);
                self.paint(root, rect, &mut rb);
                rb.restore();
            }

            self.term.set_cursor_visible(false);
            rb.flush_to_term(&mut self.term);
            self.needs_restore = true;
        }

        if self.needs_restore {
            self.needs_restore = false;
            self.restore_cursor();
            self.term.flush()?;
        }
        Ok(())
    }

    fn paint(&mut self, win: WindowId, rect: Rect, rb: &mut RenderBuffer) {
        let Some(node) = self.node(win) else {
            return;
        };
        rb.setpen(&node.pen);
        let children = node.children.clone();

        for child in children {
            let Some(node) = self.node(child) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            let area = node.rect;
            if let Some(exposed) = rect.intersect(area) {
                rb.save();
                rb.clip(exposed);
                rb.translate(area.top, area.left);
                self.paint(child, exposed.translate(-area.top, -area.left), rb);
                rb.restore();
            }
            rb.mask(area);
        }

        self.run_event(win, &mut WindowEvent::Expose { rb, rect }, RunMode::All);
    }

    fn restore_cursor(&mut self) {
        let mut win = self.root;
        while let Some(node) = self.node(win) {
            if !node.visible {
                break;
            }
            match node.focused_child {
                Some(child) => win = child,
                None => break,
            }
        }

        let wanted = self
            .node(win)
            .filter(|node| node.visible && node.focused && node.cursor.visible)
            .map(|node| node.cursor)
            .filter(|cursor| self.cell_visible(win, cursor.line, cursor.col));

        match (wanted, self.abs_geometry(win)) {
            (Some(cursor), Some(abs)) => {
                tracing::trace!(target: "window.focus", ?win, line = cursor.line, col = cursor.col, "showing cursor");
                self.term.goto(abs.top + cursor.line, abs.left + cursor.col);
                self.term.set_cursor_shape(cursor.shape);
                self.term.set_cursor_blink(cursor.blink);
                self.term.set_cursor_visible(true);
            }
            _ => self.term.set_cursor_visible(false),
        }
    }

    /// Whether the cell `(line, col)` of `win` is on screen and not covered
    /// by a visible window in front of it at any level.
    pub(crate) fn cell_visible(&self, win: WindowId, line: i32, col: i32) -> bool {
        let (mut line, mut col) = (line, col);
        let mut win = win;
        let mut prev: Option<WindowId> = None;

        loop {
            let Some(node) = self.node(win) else {
                return false;
            };
            if !node.self_rect().contains_point(line, col) {
                return false;
            }
            for &child in &node.children {
                if Some(child) == prev {
                    break;
                }
                let Some(c) = self.node(child) else {
                    continue;
                };
                if c.visible && c.rect.contains_point(line, col) {
                    return false;
                }
            }
            line += node.rect.top;
            col += node.rect.left;
            prev = Some(win);
            match node.parent {
                Some(parent) => win = parent,
                None => return true,
            }
        }
    }
}

impl<T> std::fmt::Debug for RootWindow<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootWindow")
            .field("root", &self.root)
            .field("windows", &self.windows.len())
            .field("damage", &self.damage)
            .field("queued", &self.queue.len())
            .field("needs_expose", &self.needs_expose)
            .field("needs_restore", &self.needs_restore)
            .finish_non_exhaustive()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
