// SPDX-License-Identifier: MIT
//
// Hardware scrolling of window regions.
//
// A scroll asks the terminal to move existing cells instead of repainting
// them. That is only correct where the window is actually what the user
// sees, so the request is first cut down to the window's visible parts:
// clipped by every ancestor, with siblings in front (and, for a plain
// scroll, the window's own children) taken out. Each remaining piece is
// scrolled on its own, and the strip the scroll uncovers is exposed so the
// window can paint it at the next tick.
//
// Pending damage inside a scrolled piece moves with the content. A piece
// the terminal refuses to scroll, or one scrolled by its whole extent, is
// exposed in full instead.

use n_term::{Pen, Rect, RectSet, TermSink};

use crate::root::RootWindow;
use crate::window::WindowId;

impl<T: TermSink> RootWindow<T> {
    /// Scroll the contents of `win`, leaving its children where they are.
    ///
    /// Returns `false` if any part had to be exposed instead.
    pub fn scroll(&mut self, win: WindowId, downward: i32, rightward: i32) -> bool {
        let Some(rect) = self.node(win).map(|node| node.self_rect()) else {
            return false;
        };
        self.scroll_region(win, rect, downward, rightward, None, true)
    }

    /// Scroll `win` together with everything drawn by its children.
    pub fn scroll_with_children(&mut self, win: WindowId, downward: i32, rightward: i32) -> bool {
        let Some(rect) = self.node(win).map(|node| node.self_rect()) else {
            return false;
        };
        self.scroll_region(win, rect, downward, rightward, None, false)
    }

    /// Scroll `rect` of `win` (window coordinates). If `pen` is given, the
    /// uncovered cells are filled with its background.
    pub fn scrollrect(
        &mut self,
        win: WindowId,
        rect: Rect,
        downward: i32,
        rightward: i32,
        pen: Option<&Pen>,
    ) -> bool {
        self.scroll_region(win, rect, downward, rightward, pen, true)
    }

    fn scroll_region(
        &mut self,
        win: WindowId,
        rect: Rect,
        downward: i32,
        rightward: i32,
        pen: Option<&Pen>,
        mask_children: bool,
    ) -> bool {
        if downward == 0 && rightward == 0 {
            return true;
        }
        let Some(origin) = self.abs_geometry(win) else {
            return false;
        };
        let Some(visible) = self.visible_region(win, rect, mask_children) else {
            tracing::trace!(target: "window.scroll", ?win, "scroll of invisible window");
            return false;
        };

        let mut scrolled = true;
        for piece in visible.rects().to_vec() {
            let local = piece.translate(-origin.top, -origin.left);

            if downward.abs() >= piece.lines || rightward.abs() >= piece.cols {
                tracing::trace!(target: "window.scroll", ?win, rect = %local, downward, rightward, "scroll exceeds region; exposing");
                self.expose(win, Some(local));
                scrolled = false;
                continue;
            }

            self.move_damage(piece, downward, rightward);
            if let Some(pen) = pen {
                self.term_mut().set_pen(pen);
            }

            if self.term_mut().scroll(piece, downward, rightward) {
                tracing::debug!(target: "window.scroll", ?win, rect = %local, downward, rightward, "scrolled");
                for strip in uncovered(local, downward, rightward) {
                    self.expose(win, Some(strip));
                }
                self.request_restore();
            } else {
                tracing::debug!(target: "window.scroll", ?win, rect = %local, "terminal refused scroll; exposing");
                self.expose(win, Some(local));
                scrolled = false;
            }
        }
        scrolled
    }

    /// The parts of `rect` (in `win` coordinates) showing on screen, in
    /// screen coordinates. `None` if `win` or an ancestor is hidden.
    fn visible_region(&self, win: WindowId, rect: Rect, mask_children: bool) -> Option<RectSet> {
        let node = self.node(win)?;
        let mut visible = RectSet::new();
        visible.add(node.self_rect().intersect(rect)?);

        if mask_children {
            for &child in &node.children {
                if let Some(c) = self.node(child).filter(|c| c.visible) {
                    visible.subtract(c.rect);
                }
            }
        }

        let mut win = win;
        loop {
            let node = self.node(win)?;
            if !node.visible {
                return None;
            }
            let Some(parent) = node.parent else {
                break;
            };
            visible.translate(node.rect.top, node.rect.left);

            let up = self.node(parent)?;
            visible.intersect_with(up.self_rect());
            for &sibling in &up.children {
                if sibling == win {
                    break;
                }
                if let Some(s) = self.node(sibling).filter(|s| s.visible) {
                    visible.subtract(s.rect);
                }
            }
            win = parent;
        }
        Some(visible)
    }

    /// Pending damage inside `piece` follows the scrolled content.
    fn move_damage(&mut self, piece: Rect, downward: i32, rightward: i32) {
        let moved: Vec<Rect> = self
            .damage
            .rects()
            .iter()
            .filter_map(|r| r.intersect(piece))
            .collect();
        if moved.is_empty() {
            return;
        }
        self.damage.subtract(piece);
        for r in moved {
            if let Some(r) = r.translate(-downward, -rightward).intersect(piece) {
                self.damage.add(r);
            }
        }
    }
}

/// Strips of `rect` left blank by a scroll.
fn uncovered(rect: Rect, downward: i32, rightward: i32) -> Vec<Rect> {
    let mut strips = Vec::with_capacity(2);
    if downward > 0 {
        strips.push(Rect::new(rect.bottom() - downward, rect.left, downward, rect.cols));
    } else if downward < 0 {
        strips.push(Rect::new(rect.top, rect.left, -downward, rect.cols));
    }
    if rightward > 0 {
        strips.push(Rect::new(rect.top, rect.right() - rightward, rect.lines, rightward));
    } else if rightward < 0 {
        strips.push(Rect::new(rect.top, rect.left, rect.lines, -rightward));
    }
    strips
}

#[cfg(test)]
mod tests {
    use super::*;
    use n_term::{MockTerm, TermOp};
    use pretty_assertions::assert_eq;

    fn root() -> RootWindow<MockTerm> {
        let mut root = RootWindow::new(MockTerm::new(10, 20));
        root.tick().unwrap();
        root.term_mut().clear_ops();
        root
    }

    fn scroll_ops(root: &RootWindow<MockTerm>) -> Vec<TermOp> {
        root.term()
            .ops()
            .iter()
            .filter(|op| matches!(op, TermOp::Scroll { .. }))
            .cloned()
            .collect()
    }

    #[test]
    fn whole_window_scroll_exposes_bottom_strip() {
        let mut root = root();
        let top = root.root();
        assert!(root.scroll(top, 1, 0));
        assert_eq!(
            scroll_ops(&root),
            vec![TermOp::Scroll {
                rect: Rect::new(0, 0, 10, 20),
                downward: 1,
                rightward: 0
            }]
        );
        assert_eq!(root.damage().rects(), &[Rect::new(9, 0, 1, 20)]);
    }

    #[test]
    fn negative_scrolls_expose_leading_strips() {
        assert_eq!(
            uncovered(Rect::new(0, 0, 10, 20), -2, -3),
            vec![Rect::new(0, 0, 2, 20), Rect::new(0, 0, 10, 3)]
        );
        assert_eq!(
            uncovered(Rect::new(1, 1, 5, 5), 0, 2),
            vec![Rect::new(1, 4, 5, 2)]
        );
    }

    #[test]
    fn scroll_by_whole_extent_exposes_instead() {
        let mut root = root();
        let top = root.root();
        assert!(!root.scroll(top, 10, 0));
        assert!(scroll_ops(&root).is_empty());
        assert_eq!(root.damage().rects(), &[Rect::new(0, 0, 10, 20)]);
    }

    #[test]
    fn refused_scroll_exposes_region() {
        let mut root = root();
        let top = root.root();
        root.term_mut().set_refuse_scroll(true);
        assert!(!root.scrollrect(top, Rect::new(2, 0, 4, 20), 1, 0, None));
        assert_eq!(root.damage().rects(), &[Rect::new(2, 0, 4, 20)]);
    }

    #[test]
    fn front_sibling_is_cut_out() {
        let mut root = root();
        let top = root.root();
        let a = root.new_subwindow(top, Rect::new(0, 0, 10, 20)).unwrap();
        let _over = root.new_subwindow(top, Rect::new(0, 0, 2, 20)).unwrap();
        root.tick().unwrap();
        root.term_mut().clear_ops();

        assert!(root.scroll(a, 1, 0));
        assert_eq!(
            scroll_ops(&root),
            vec![TermOp::Scroll {
                rect: Rect::new(2, 0, 8, 20),
                downward: 1,
                rightward: 0
            }]
        );
        assert!(root.damage().contains(Rect::new(9, 0, 1, 20)));
    }

    #[test]
    fn children_masked_unless_scrolled_with_parent() {
        let mut root = root();
        let top = root.root();
        root.new_subwindow(top, Rect::new(0, 0, 3, 5)).unwrap();
        root.tick().unwrap();
        root.term_mut().clear_ops();

        assert!(root.scroll(top, 1, 0));
        assert_eq!(scroll_ops(&root).len(), 2);

        root.term_mut().clear_ops();
        assert!(root.scroll_with_children(top, 1, 0));
        assert_eq!(scroll_ops(&root).len(), 1);
    }

    #[test]
    fn pending_damage_moves_with_content() {
        let mut root = root();
        let top = root.root();
        root.expose(top, Some(Rect::new(5, 0, 1, 20)));
        assert!(root.scroll(top, 2, 0));
        assert!(root.damage().contains(Rect::new(3, 0, 1, 20)));
        assert!(!root.damage().contains(Rect::new(5, 0, 1, 20)));
        assert!(root.damage().contains(Rect::new(8, 0, 2, 20)));
    }

    #[test]
    fn hidden_window_does_not_scroll() {
        let mut root = root();
        let a = root
            .new_hidden_subwindow(root.root(), Rect::new(0, 0, 5, 5))
            .unwrap();
        root.tick().unwrap();
        assert!(!root.scroll(a, 1, 0));
        assert!(scroll_ops(&root).is_empty());
    }

    #[test]
    fn scroll_pen_is_applied_first() {
        let mut root = root();
        let top = root.root();
        let pen = Pen::new().with_reverse(true);
        assert!(root.scrollrect(top, Rect::new(0, 0, 5, 20), 1, 0, Some(&pen)));
        assert_eq!(root.term().ops().first(), Some(&TermOp::SetPen(pen)));
    }
}
