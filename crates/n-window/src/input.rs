// SPDX-License-Identifier: MIT
//
// Key and mouse routing.
//
// Input enters at the root and walks down the tree until some hook returns
// `true`. Hidden windows never see input.
//
// Keys follow the focus. At each window, in order:
//   1. the front-most child, if it steals input
//   2. the focused child
//   3. the window's own KEY hooks
//   4. every other child, front to back
//
// Mouse events follow position. Each child containing the point, front to
// back, gets the event in its own coordinates; a child stealing input gets it
// wherever the point is. Only then do the window's own MOUSE hooks run.

use n_term::TermSink;
use n_term::hook::RunMode;

use crate::event::{KeyEvent, MouseEvent, WindowEvent};
use crate::root::RootWindow;
use crate::window::WindowId;

impl<T: TermSink> RootWindow<T> {
    /// Route a keypress from the root. Returns whether a hook claimed it.
    pub fn dispatch_key(&mut self, key: &KeyEvent) -> bool {
        let root = self.root();
        let handled = self.handle_key(root, key);
        tracing::trace!(target: "window.focus", name = %key.name, handled, "key");
        handled
    }

    /// Route a mouse event (screen coordinates) from the root.
    pub fn dispatch_mouse(&mut self, mouse: &MouseEvent) -> bool {
        let root = self.root();
        self.handle_mouse(root, *mouse)
    }

    fn handle_key(&mut self, win: WindowId, key: &KeyEvent) -> bool {
        let Some(node) = self.node(win).filter(|node| node.visible) else {
            return false;
        };
        let children = node.children.clone();
        let focused = node.focused_child;

        if let Some(&first) = children.first() {
            if self.node(first).is_some_and(|c| c.steal_input) && self.handle_key(first, key) {
                return true;
            }
        }

        if let Some(child) = focused {
            if self.handle_key(child, key) {
                return true;
            }
        }

        if self.run_event(win, &mut WindowEvent::Key(key), RunMode::UntilTrue) {
            return true;
        }

        children
            .into_iter()
            .filter(|&child| Some(child) != focused)
            .any(|child| self.handle_key(child, key))
    }

    fn handle_mouse(&mut self, win: WindowId, mouse: MouseEvent) -> bool {
        let Some(children) = self
            .node(win)
            .filter(|node| node.visible)
            .map(|node| node.children.clone())
        else {
            return false;
        };

        for child in children {
            let Some(node) = self.node(child) else {
                continue;
            };
            if !node.steal_input && !node.rect.contains_point(mouse.line, mouse.col) {
                continue;
            }
            let inner = mouse.relative_to(node.rect.top, node.rect.left);
            if self.handle_mouse(child, inner) {
                return true;
            }
        }

        self.run_event(win, &mut WindowEvent::Mouse(&mouse), RunMode::UntilTrue)
    }
}
