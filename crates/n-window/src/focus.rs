// SPDX-License-Identifier: MIT
//
// Input focus.
//
// Focus is a chain of `focused_child` links from the root down to the one
// window that is itself `focused`. Taking focus rebuilds the chain from the
// window upwards: each ancestor first drops any other chain it was part of,
// then links towards the new window. The notifications are not mirror
// images:
//
//   gaining:  parents (with focus-child-notify) hear FOCUS_IN(child) on the
//             way back down, before the window's own FOCUS_IN
//   losing:   the old leaf hears FOCUS_OUT first, then each parent hears
//             FOCUS_OUT(child) on the way up

use n_term::TermSink;
use n_term::hook::RunMode;

use crate::event::{FocusKind, WindowEvent};
use crate::root::RootWindow;
use crate::window::WindowId;

impl<T: TermSink> RootWindow<T> {
    /// Give `win` the input focus, taking it from whichever window held it.
    ///
    /// A hidden window becomes focused but is not linked into its parent's
    /// chain until it is shown.
    pub fn take_focus(&mut self, win: WindowId) {
        if !self.exists(win) {
            tracing::trace!(target: "window.focus", ?win, "focus on stale window");
            return;
        }
        tracing::debug!(target: "window.focus", ?win, "take focus");
        self.focus_gained(win, None);
    }

    /// `win` gains focus, either itself (`child == None`) or through `child`.
    fn focus_gained(&mut self, win: WindowId, child: Option<WindowId>) {
        let Some(node) = self.node(win) else {
            return;
        };
        let current = node.focused_child;
        if (node.focused || current.is_some()) && current != child {
            self.focus_lost(win);
        }

        let Some(node) = self.node(win) else {
            return;
        };
        match node.parent {
            Some(parent) if node.visible => self.focus_gained(parent, Some(win)),
            Some(_) => {}
            None => self.request_restore(),
        }

        let Some(node) = self.node_mut(win) else {
            return;
        };
        match child {
            None => {
                node.focused = true;
                self.run_event(
                    win,
                    &mut WindowEvent::Focus {
                        kind: FocusKind::In,
                        win,
                    },
                    RunMode::All,
                );
            }
            Some(child) if node.focus_child_notify => {
                self.run_event(
                    win,
                    &mut WindowEvent::Focus {
                        kind: FocusKind::In,
                        win: child,
                    },
                    RunMode::All,
                );
            }
            Some(_) => {}
        }

        if let Some(node) = self.node_mut(win) {
            node.focused_child = child;
        }
    }

    /// `win` and everything below it in the focus chain lose focus.
    fn focus_lost(&mut self, win: WindowId) {
        let Some(node) = self.node(win) else {
            return;
        };
        if let Some(child) = node.focused_child {
            self.focus_lost(child);
            let notify = self.node(win).is_some_and(|node| node.focus_child_notify);
            if notify {
                self.run_event(
                    win,
                    &mut WindowEvent::Focus {
                        kind: FocusKind::Out,
                        win: child,
                    },
                    RunMode::All,
                );
            }
        }

        let Some(node) = self.node_mut(win) else {
            return;
        };
        node.focused_child = None;
        if node.focused {
            node.focused = false;
            self.run_event(
                win,
                &mut WindowEvent::Focus {
                    kind: FocusKind::Out,
                    win,
                },
                RunMode::All,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctl::{CtlValue, WindowCtl};
    use crate::event::EventMask;
    use n_term::{BindFlags, MockTerm, Rect};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<(WindowId, FocusKind, WindowId)>>>;

    fn watch(root: &mut RootWindow<MockTerm>, win: WindowId, log: &Log) {
        let log = Rc::clone(log);
        root.bind_event(win, EventMask::FOCUS, BindFlags::empty(), move |_, me, ev| {
            if let WindowEvent::Focus { kind, win } = ev {
                log.borrow_mut().push((me, *kind, *win));
            }
            false
        });
    }

    #[test]
    fn refocusing_a_sibling_moves_the_chain() {
        let mut root = RootWindow::new(MockTerm::new(10, 10));
        let top = root.root();
        let a = root.new_subwindow(top, Rect::new(0, 0, 5, 5)).unwrap();
        let b = root.new_subwindow(top, Rect::new(5, 5, 5, 5)).unwrap();
        root.tick().unwrap();

        let log = Log::default();
        watch(&mut root, a, &log);
        watch(&mut root, b, &log);

        root.take_focus(a);
        root.take_focus(b);
        assert_eq!(
            *log.borrow(),
            vec![
                (a, FocusKind::In, a),
                (a, FocusKind::Out, a),
                (b, FocusKind::In, b)
            ]
        );
        assert!(!root.is_focused(a));
        assert!(root.is_focused(b));
        assert_eq!(root.focused_child(top), Some(b));
    }

    #[test]
    fn parent_taking_focus_drops_child_chain() {
        let mut root = RootWindow::new(MockTerm::new(10, 10));
        let p = root.new_subwindow(root.root(), Rect::new(0, 0, 8, 8)).unwrap();
        let c = root.new_subwindow(p, Rect::new(0, 0, 2, 2)).unwrap();
        root.tick().unwrap();
        root.set_ctl(p, WindowCtl::FocusChildNotify, CtlValue::Bool(true))
            .unwrap();

        let log = Log::default();
        watch(&mut root, p, &log);
        watch(&mut root, c, &log);
        root.take_focus(c);
        log.borrow_mut().clear();

        root.take_focus(p);
        assert_eq!(
            *log.borrow(),
            vec![
                (c, FocusKind::Out, c),
                (p, FocusKind::Out, c),
                (p, FocusKind::In, p)
            ]
        );
        assert_eq!(root.focused_child(p), None);
        assert!(root.is_focused(p));
    }

    #[test]
    fn hidden_window_focus_not_linked_until_shown() {
        let mut root = RootWindow::new(MockTerm::new(10, 10));
        let top = root.root();
        let a = root.new_hidden_subwindow(top, Rect::new(0, 0, 5, 5)).unwrap();
        root.tick().unwrap();
        root.take_focus(a);
        assert!(root.is_focused(a));
        assert_eq!(root.focused_child(top), None);
        root.show(a);
        assert_eq!(root.focused_child(top), Some(a));
    }
}
