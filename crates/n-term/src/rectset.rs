// SPDX-License-Identifier: MIT
//
// RectSet — a union of rectangles kept as non-overlapping pieces.
//
// Damage is rarely a single rectangle: a window moves, a popup closes, a
// line of text changes somewhere else. The set stores the union as a list of
// disjoint rects sorted by (top, left), normalised on every insertion:
//
//   - Stretch: two rects with the same row-span that touch or overlap
//     horizontally (or the same column-span touching vertically) become one.
//   - Split: rects that genuinely overlap are cut into horizontal bands of
//     their union, and each band is re-added.
//   - Abut: rects that only share an edge stay separate. L and T shapes are
//     represented as two or more pieces.
//
// Re-adding (instead of raw insertion) after every split or subtraction is
// what keeps the merge invariant: a freshly cut band may well stretch into a
// neighbour that was already stored.

use crate::rect::Rect;

/// A set of cells described by disjoint, maximally merged rectangles.
///
/// # Examples
///
/// ```
/// use n_term::rect::Rect;
/// use n_term::rectset::RectSet;
///
/// let mut damage = RectSet::new();
/// damage.add(Rect::new(0, 0, 2, 10));
/// damage.add(Rect::new(2, 0, 3, 10));
/// assert_eq!(damage.rects(), &[Rect::new(0, 0, 5, 10)]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RectSet {
    rects: Vec<Rect>,
}

impl RectSet {
    #[must_use]
    pub const fn new() -> Self {
        Self { rects: Vec::new() }
    }

    /// The stored pieces, sorted by `(top, left)`.
    #[inline]
    #[must_use]
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// Remove and return every piece, leaving the set empty.
    pub fn take(&mut self) -> Vec<Rect> {
        std::mem::take(&mut self.rects)
    }

    /// Union `rect` into the set.
    pub fn add(&mut self, rect: Rect) {
        if rect.is_empty() {
            return;
        }

        let mut rect = rect;
        'restart: loop {
            for i in 0..self.rects.len() {
                let stored = self.rects[i];

                if stored.contains(rect) {
                    return;
                }

                if rect.contains(stored) || can_stretch(stored, rect) {
                    rect = rect.bounding_union(stored);
                    self.rects.remove(i);
                    continue 'restart;
                }

                if stored.intersects(rect) {
                    self.rects.remove(i);
                    for band in union_bands(stored, rect) {
                        self.add(band);
                    }
                    return;
                }
            }
            break;
        }

        let pos = self
            .rects
            .partition_point(|r| (r.top, r.left) < (rect.top, rect.left));
        self.rects.insert(pos, rect);
    }

    /// Remove every cell of `hole` from the set.
    pub fn subtract(&mut self, hole: Rect) {
        if hole.is_empty() {
            return;
        }

        let (hit, kept): (Vec<Rect>, Vec<Rect>) =
            self.rects.iter().partition(|r| r.intersects(hole));
        if hit.is_empty() {
            return;
        }

        self.rects = kept;
        for stored in hit {
            for piece in stored.subtract(hole) {
                self.add(piece);
            }
        }
    }

    /// Whether any stored piece overlaps `rect`.
    #[must_use]
    pub fn intersects(&self, rect: Rect) -> bool {
        self.rects.iter().any(|r| r.intersects(rect))
    }

    /// Whether every cell of `rect` is covered by the set.
    ///
    /// Carves each overlapping piece out of `rect`; the rect is covered
    /// exactly when nothing is left.
    #[must_use]
    pub fn contains(&self, rect: Rect) -> bool {
        if rect.is_empty() {
            return false;
        }

        let mut uncovered = vec![rect];
        for stored in self.rects.iter().filter(|r| r.intersects(rect)) {
            uncovered = uncovered
                .into_iter()
                .flat_map(|piece| piece.subtract(*stored))
                .collect();
            if uncovered.is_empty() {
                return true;
            }
        }
        uncovered.is_empty()
    }

    /// Shift every piece by `(downward, rightward)`.
    pub fn translate(&mut self, downward: i32, rightward: i32) {
        for rect in &mut self.rects {
            *rect = rect.translate(downward, rightward);
        }
    }

    /// Clip the set to `bound`, dropping everything outside it.
    pub fn intersect_with(&mut self, bound: Rect) {
        let clipped: Vec<Rect> = self.rects.iter().filter_map(|r| r.intersect(bound)).collect();
        self.rects.clear();
        for rect in clipped {
            self.add(rect);
        }
    }
}

impl Extend<Rect> for RectSet {
    fn extend<I: IntoIterator<Item = Rect>>(&mut self, iter: I) {
        for rect in iter {
            self.add(rect);
        }
    }
}

impl FromIterator<Rect> for RectSet {
    fn from_iter<I: IntoIterator<Item = Rect>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

/// Same row-span touching horizontally, or same column-span touching
/// vertically. Overlap counts as touching.
fn can_stretch(a: Rect, b: Rect) -> bool {
    let same_rows = a.top == b.top && a.bottom() == b.bottom();
    let same_cols = a.left == b.left && a.right() == b.right();

    (same_rows && a.left <= b.right() && b.left <= a.right())
        || (same_cols && a.top <= b.bottom() && b.top <= a.bottom())
}

/// Cut the union of two overlapping rects into horizontal bands.
///
/// Band edges are the distinct tops and bottoms of both rects, so there are
/// at most three bands. Within a band covered by both rects their column
/// ranges overlap, so each band is a single rect.
fn union_bands(a: Rect, b: Rect) -> Vec<Rect> {
    let mut edges = [a.top, a.bottom(), b.top, b.bottom()];
    edges.sort_unstable();

    let mut bands = Vec::with_capacity(3);
    for pair in edges.windows(2) {
        let (top, bottom) = (pair[0], pair[1]);
        if top == bottom {
            continue;
        }

        let spans = |r: Rect| r.top <= top && bottom <= r.bottom();
        let (left, right) = match (spans(a), spans(b)) {
            (true, true) => (a.left.min(b.left), a.right().max(b.right())),
            (true, false) => (a.left, a.right()),
            (false, true) => (b.left, b.right()),
            (false, false) => continue,
        };
        bands.push(Rect::from_bounds(top, left, bottom, right));
    }
    bands
}

// ─── Tests ───────────────────────────────────────────────────────────────────
