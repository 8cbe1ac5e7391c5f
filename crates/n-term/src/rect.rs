// SPDX-License-Identifier: MIT
//
// Rect — an axis-aligned rectangle of character cells.
//
// Everything in the compositor speaks in rectangles: window geometry,
// damage, clip regions, masks, scroll regions. Coordinates are signed so
// that a window can sit partially above or left of its parent (a translated
// drawing origin may well be negative); extents are never negative.
//
// Conventions:
//
//   - `top`/`left` are inclusive, `bottom()`/`right()` are exclusive.
//   - A rect with zero `lines` or zero `cols` is empty. Empty rects never
//     intersect anything, never contain anything and are never contained.
//
// The text notation `"L,T..R,B"` / `"L,T+COLS,LINES"` exists for tests: the
// damage-set cases read far better as literals than as constructor calls.

use std::fmt;
use std::str::FromStr;

/// A rectangle of cells: origin `(top, left)` and extent `(lines, cols)`.
///
/// # Examples
///
/// ```
/// use n_term::rect::Rect;
///
/// let a = Rect::new(0, 0, 10, 20);
/// let b = Rect::new(5, 10, 10, 20);
/// assert_eq!(a.intersect(b), Some(Rect::new(5, 10, 5, 10)));
/// assert!(a.intersects(b));
/// assert!(!a.contains(b));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub top: i32,
    pub left: i32,
    pub lines: i32,
    pub cols: i32,
}

impl Rect {
    /// Create a rect. Negative extents clamp to zero.
    #[inline]
    #[must_use]
    pub const fn new(top: i32, left: i32, lines: i32, cols: i32) -> Self {
        Self {
            top,
            left,
            lines: if lines < 0 { 0 } else { lines },
            cols: if cols < 0 { 0 } else { cols },
        }
    }

    /// Create a rect from its four edges (`bottom`/`right` exclusive).
    #[inline]
    #[must_use]
    pub const fn from_bounds(top: i32, left: i32, bottom: i32, right: i32) -> Self {
        Self::new(top, left, bottom.saturating_sub(top), right.saturating_sub(left))
    }

    /// Exclusive bottom edge.
    #[inline]
    #[must_use]
    pub const fn bottom(self) -> i32 {
        self.top.saturating_add(self.lines)
    }

    /// Exclusive right edge.
    #[inline]
    #[must_use]
    pub const fn right(self) -> i32 {
        self.left.saturating_add(self.cols)
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.lines <= 0 || self.cols <= 0
    }

    /// Number of cells covered.
    #[inline]
    #[must_use]
    pub const fn area(self) -> i64 {
        self.lines as i64 * self.cols as i64
    }

    /// The same rect shifted by `(downward, rightward)`.
    #[inline]
    #[must_use]
    pub const fn translate(self, downward: i32, rightward: i32) -> Self {
        Self {
            top: self.top.saturating_add(downward),
            left: self.left.saturating_add(rightward),
            ..self
        }
    }

    /// Whether the cell `(line, col)` lies inside.
    #[inline]
    #[must_use]
    pub const fn contains_point(self, line: i32, col: i32) -> bool {
        line >= self.top && line < self.bottom() && col >= self.left && col < self.right()
    }

    /// The overlapping area, or `None` if the rects share no cell.
    #[must_use]
    pub fn intersect(self, other: Self) -> Option<Self> {
        let top = self.top.max(other.top);
        let left = self.left.max(other.left);
        let bottom = self.bottom().min(other.bottom());
        let right = self.right().min(other.right());

        if top < bottom && left < right {
            Some(Self::from_bounds(top, left, bottom, right))
        } else {
            None
        }
    }

    /// Strict overlap test: rects that merely share an edge do not intersect.
    #[inline]
    #[must_use]
    pub fn intersects(self, other: Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.top < other.bottom()
            && other.top < self.bottom()
            && self.left < other.right()
            && other.left < self.right()
    }

    /// Whether `small` lies entirely within `self` (edges inclusive).
    #[inline]
    #[must_use]
    pub fn contains(self, small: Self) -> bool {
        !self.is_empty()
            && !small.is_empty()
            && small.top >= self.top
            && small.bottom() <= self.bottom()
            && small.left >= self.left
            && small.right() <= self.right()
    }

    /// Smallest rect enveloping both.
    #[must_use]
    pub fn bounding_union(self, other: Self) -> Self {
        Self::from_bounds(
            self.top.min(other.top),
            self.left.min(other.left),
            self.bottom().max(other.bottom()),
            self.right().max(other.right()),
        )
    }

    /// The parts of `self` not covered by `hole`, as at most four
    /// non-overlapping pieces: a full-width strip above, the middle band's
    /// left and right remainders, and a full-width strip below.
    ///
    /// If the rects don't intersect, the result is `self` alone.
    #[must_use]
    pub fn subtract(self, hole: Self) -> Vec<Self> {
        let Some(inner) = self.intersect(hole) else {
            return if self.is_empty() { Vec::new() } else { vec![self] };
        };

        let mut pieces = Vec::with_capacity(4);
        if inner.top > self.top {
            pieces.push(Self::from_bounds(self.top, self.left, inner.top, self.right()));
        }
        if inner.left > self.left {
            pieces.push(Self::from_bounds(inner.top, self.left, inner.bottom(), inner.left));
        }
        if inner.right() < self.right() {
            pieces.push(Self::from_bounds(inner.top, inner.right(), inner.bottom(), self.right()));
        }
        if inner.bottom() < self.bottom() {
            pieces.push(Self::from_bounds(inner.bottom(), self.left, self.bottom(), self.right()));
        }
        pieces
    }
}

/// Formats as `"L,T..R,B"`, the notation [`FromStr`] accepts.
impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}..{},{}", self.left, self.top, self.right(), self.bottom())
    }
}

/// Error returned when a rect literal cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid rect literal {0:?}: expected \"L,T..R,B\" or \"L,T+COLS,LINES\"")]
pub struct ParseRectError(String);

impl FromStr for Rect {
    type Err = ParseRectError;

    /// Parse `"L,T..R,B"` (edges) or `"L,T+COLS,LINES"` (origin plus extent).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseRectError(s.to_owned());
        let num = |part: &str| part.trim().parse::<i32>().map_err(|_| err());
        let pair = |part: &str| -> Result<(i32, i32), ParseRectError> {
            let (a, b) = part.split_once(',').ok_or_else(err)?;
            Ok((num(a)?, num(b)?))
        };

        if let Some((origin, corner)) = s.split_once("..") {
            let (left, top) = pair(origin)?;
            let (right, bottom) = pair(corner)?;
            Ok(Self::from_bounds(top, left, bottom, right))
        } else if let Some((origin, extent)) = s.split_once('+') {
            let (left, top) = pair(origin)?;
            let (cols, lines) = pair(extent)?;
            Ok(Self::new(top, left, lines, cols))
        } else {
            Err(err())
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn r(s: &str) -> Rect {
        s.parse().unwrap()
    }

    // ── Construction ─────────────────────────────────────────────────────

    #[test]
    fn negative_extent_clamps_to_zero() {
        let rect = Rect::new(3, 4, -2, -7);
        assert_eq!(rect.lines, 0);
        assert_eq!(rect.cols, 0);
        assert!(rect.is_empty());
    }

    #[test]
    fn edges() {
        let rect = Rect::new(10, 5, 3, 20);
        assert_eq!(rect.bottom(), 13);
        assert_eq!(rect.right(), 25);
        assert_eq!(rect.area(), 60);
    }

    #[test]
    fn extreme_coordinates_saturate() {
        let rect = Rect::new(i32::MAX - 2, i32::MIN, 10, 10);
        assert_eq!(rect.bottom(), i32::MAX);
        assert_eq!(rect.translate(5, -5), Rect::new(i32::MAX, i32::MIN, 10, 10));
        assert_eq!(rect.intersect(Rect::new(0, 0, 25, 80)), None);
    }

    // ── Literals ─────────────────────────────────────────────────────────

    #[test]
    fn parse_bounds_notation() {
        assert_eq!(r("10,10..30,15"), Rect::new(10, 10, 5, 20));
    }

    #[test]
    fn parse_extent_notation() {
        assert_eq!(r("5,2+20,3"), Rect::new(2, 5, 3, 20));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("10,10".parse::<Rect>().is_err());
        assert!("a,b..c,d".parse::<Rect>().is_err());
    }

    #[test]
    fn display_roundtrips_through_parse() {
        let rect = Rect::new(8, 15, 4, 10);
        assert_eq!(rect.to_string(), "15,8..25,12");
        assert_eq!(r(&rect.to_string()), rect);
    }

    // ── Intersection ─────────────────────────────────────────────────────

    #[test]
    fn intersect_overlap() {
        assert_eq!(r("0,0..20,20").intersect(r("10,10..30,30")), Some(r("10,10..20,20")));
    }

    #[test]
    fn intersect_adjacent_is_none() {
        assert_eq!(r("0,0..10,10").intersect(r("10,0..20,10")), None);
        assert!(!r("0,0..10,10").intersects(r("10,0..20,10")));
    }

    #[test]
    fn empty_rect_never_intersects() {
        let empty = Rect::new(5, 5, 0, 10);
        assert!(!empty.intersects(r("0,0..20,20")));
        assert!(!r("0,0..20,20").intersects(empty));
        assert!(!r("0,0..20,20").contains(empty));
    }

    #[test]
    fn contains_is_inclusive() {
        assert!(r("0,0..20,20").contains(r("0,0..20,20")));
        assert!(r("0,0..20,20").contains(r("5,5..20,10")));
        assert!(!r("0,0..20,20").contains(r("5,5..21,10")));
    }

    #[test]
    fn contains_point_excludes_far_edges() {
        let rect = Rect::new(2, 3, 4, 5);
        assert!(rect.contains_point(2, 3));
        assert!(rect.contains_point(5, 7));
        assert!(!rect.contains_point(6, 7));
        assert!(!rect.contains_point(5, 8));
    }

    // ── Subtraction ──────────────────────────────────────────────────────

    #[test]
    fn subtract_middle_leaves_four_pieces() {
        let pieces = r("0,0..30,30").subtract(r("10,10..20,20"));
        assert_eq!(
            pieces,
            vec![r("0,0..30,10"), r("0,10..10,20"), r("20,10..30,20"), r("0,20..30,30")]
        );
    }

    #[test]
    fn subtract_covering_hole_leaves_nothing() {
        assert!(r("10,10..30,15").subtract(r("8,8..32,17")).is_empty());
    }

    #[test]
    fn subtract_disjoint_is_identity() {
        assert_eq!(r("0,0..5,5").subtract(r("10,10..20,20")), vec![r("0,0..5,5")]);
    }

    // ── Properties ───────────────────────────────────────────────────────

    fn any_rect() -> impl Strategy<Value = Rect> {
        (-20..20i32, -20..20i32, 0..15i32, 0..15i32)
            .prop_map(|(top, left, lines, cols)| Rect::new(top, left, lines, cols))
    }

    proptest! {
        #[test]
        fn intersects_is_symmetric(a in any_rect(), b in any_rect()) {
            prop_assert_eq!(a.intersects(b), b.intersects(a));
        }

        #[test]
        fn intersect_agrees_with_intersects(a in any_rect(), b in any_rect()) {
            prop_assert_eq!(a.intersect(b).is_some(), a.intersects(b));
        }

        #[test]
        fn mutual_containment_is_equality(a in any_rect(), b in any_rect()) {
            prop_assume!(!a.is_empty() && !b.is_empty());
            prop_assert_eq!(a.contains(b) && b.contains(a), a == b);
        }

        #[test]
        fn subtract_pieces_preserve_area(a in any_rect(), b in any_rect()) {
            let pieces = a.subtract(b);
            let covered: i64 = pieces.iter().map(|p| p.area()).sum();
            let removed = a.intersect(b).map_or(0, Rect::area);
            prop_assert_eq!(covered + removed, a.area());
            for piece in &pieces {
                prop_assert!(!piece.intersects(b));
                prop_assert!(a.contains(*piece));
            }
        }
    }
}
