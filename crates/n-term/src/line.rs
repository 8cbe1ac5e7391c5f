// SPDX-License-Identifier: MIT
//
// Line-drawing cells.
//
// A LINE cell records, for each of its four edges, which style of line
// leaves the cell in that direction. Drawing a horizontal line across a
// vertical one ORs the arms together, and the cell renders as the matching
// junction glyph from the Unicode box-drawing block (U+2500–U+257F).
//
// Each arm takes two bits:
//
//   bits 0–1  north    bits 2–3  east
//   bits 4–5  south    bits 6–7  west
//
// so the mask is a direct index into a 256-entry glyph table. Combinations
// the block has no glyph for (heavy arms meeting double ones, lone double
// stubs) fall back to the closest available shape.

use std::fmt;

// ─── Style & Caps ────────────────────────────────────────────────────────────

/// Line weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LineStyle {
    Single = 1,
    Double = 2,
    Thick = 3,
}

impl LineStyle {
    const fn from_bits(bits: u8) -> Option<Self> {
        match bits & 0b11 {
            1 => Some(Self::Single),
            2 => Some(Self::Double),
            3 => Some(Self::Thick),
            _ => None,
        }
    }
}

bitflags::bitflags! {
    /// Which ends of a line extend to the far edge of their end cell.
    ///
    /// Without a cap, the end cell only carries the half of the line that
    /// points inwards, so it joins cleanly onto a perpendicular line.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct LineCaps: u8 {
        const START = 1 << 0;
        const END   = 1 << 1;
        const BOTH  = Self::START.bits() | Self::END.bits();
    }
}

/// One of the four edges of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    const fn shift(self) -> u8 {
        match self {
            Self::North => 0,
            Self::East => 2,
            Self::South => 4,
            Self::West => 6,
        }
    }
}

// ─── LineMask ────────────────────────────────────────────────────────────────

/// The four arms of a line-drawing cell.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LineMask(u8);

impl LineMask {
    pub const EMPTY: Self = Self(0);

    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// This mask with `dir` ORed to `style`.
    #[inline]
    #[must_use]
    pub const fn with(self, dir: Direction, style: LineStyle) -> Self {
        Self(self.0 | ((style as u8) << dir.shift()))
    }

    /// Bitwise union of both masks.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Style of the arm towards `dir`, if any.
    #[must_use]
    pub const fn arm(self, dir: Direction) -> Option<LineStyle> {
        LineStyle::from_bits(self.0 >> dir.shift())
    }

    /// The box-drawing glyph for this combination of arms.
    #[inline]
    #[must_use]
    pub fn glyph(self) -> char {
        GLYPHS[usize::from(self.0)]
    }
}

impl fmt::Debug for LineMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LineMask({:#04x} {:?})", self.0, self.glyph())
    }
}

#[rustfmt::skip]
const GLYPHS: [char; 256] = [
    ' ', '╵', '║', '╹', '╶', '└', '╙', '┖', '═', '╘', '╚', '╘', '╺', '┕', '╙', '┗', // 0x00
    '╷', '│', '│', '╿', '┌', '├', '├', '┞', '╒', '╞', '├', '╞', '┍', '┝', '┝', '┡', // 0x10
    '║', '│', '║', '╿', '╓', '├', '╟', '┞', '╔', '├', '╠', '┞', '╓', '┝', '╟', '┡', // 0x20
    '╻', '╽', '╽', '┃', '┎', '┟', '┟', '┠', '╒', '╞', '┟', '╞', '┏', '┢', '┢', '┣', // 0x30
    '╴', '┘', '╜', '┚', '─', '┴', '╨', '┸', '─', '┴', '┴', '┸', '╼', '┶', '╨', '┺', // 0x40
    '┐', '┤', '┤', '┦', '┬', '┼', '┼', '╀', '┬', '┼', '┼', '╀', '┮', '┾', '┾', '╄', // 0x50
    '╖', '┤', '╢', '┦', '╥', '┼', '╫', '╀', '┬', '┼', '┼', '╀', '╥', '┾', '╫', '╄', // 0x60
    '┒', '┧', '┧', '┨', '┰', '╁', '╁', '╂', '┰', '╁', '╁', '╂', '┲', '╆', '╆', '╊', // 0x70
    '═', '╛', '╝', '╛', '─', '┴', '┴', '┸', '═', '╧', '╩', '╧', '╼', '┶', '┶', '┺', // 0x80
    '╕', '╡', '┤', '╡', '┬', '┼', '┼', '╀', '╤', '╪', '┼', '╪', '┮', '┾', '┾', '╄', // 0x90
    '╗', '┤', '╣', '┦', '┬', '┼', '┼', '╀', '╦', '┼', '╬', '╀', '┮', '┾', '┾', '╄', // 0xA0
    '╕', '╡', '┧', '╡', '┰', '╁', '╁', '╂', '╤', '╪', '╁', '╪', '┲', '╆', '╆', '╊', // 0xB0
    '╸', '┙', '╜', '┛', '╾', '┵', '╨', '┹', '╾', '┵', '┵', '┹', '━', '┷', '╨', '┻', // 0xC0
    '┑', '┥', '┥', '┩', '┭', '┽', '┽', '╃', '┭', '┽', '┽', '╃', '┯', '┿', '┿', '╇', // 0xD0
    '╖', '┥', '╢', '┩', '╥', '┽', '╫', '╃', '┭', '┽', '┽', '╃', '╥', '┿', '╫', '╇', // 0xE0
    '┓', '┪', '┪', '┫', '┱', '╅', '╅', '╉', '┱', '╅', '╅', '╉', '┳', '╈', '╈', '╋', // 0xF0
];

// ─── Tests ───────────────────────────────────────────────────────────────────
