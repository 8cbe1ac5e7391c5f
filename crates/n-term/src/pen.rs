// SPDX-License-Identifier: MIT
//
// Pen — the rendering attributes carried by every drawn span.
//
// A pen is a sparse attribute bag: each attribute is either *present* (with
// a value) or *absent*. Absence matters. When a window paints inside its
// parent, the render buffer merges the window's pen *under* whatever the
// caller sets, so an attribute the caller leaves absent still inherits the
// ambient value, while an attribute explicitly set to "off" overrides it.
//
// For comparison purposes absent and off are the same thing: two pens are
// equivalent if they would render identically. `bold = false` and "no bold"
// produce the same SGR state, so they compare equivalent.
//
// Pens are small `Copy` values (16 bytes). Every span in a render buffer
// carries its own copy, so there is no shared pen object that could be
// mutated behind a span's back.

use std::fmt;

// ─── Colour ──────────────────────────────────────────────────────────────────

/// A foreground or background colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PenColor {
    /// Palette index: 0–7 standard, 8–15 bright, 16–255 extended.
    Index(u8),
    /// 24-bit colour.
    Rgb(u8, u8, u8),
}

// ─── Underline ───────────────────────────────────────────────────────────────

/// Underline style.
///
/// `None` is a real value: it lets a pen switch underlining off over an
/// ambient pen that has it on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Underline {
    #[default]
    None,
    Single,
    Double,
    Curly,
}

// ─── Attributes ──────────────────────────────────────────────────────────────

/// Names of the individual pen attributes, for generic get/set/compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PenAttr {
    Fg,
    Bg,
    Bold,
    Under,
    Italic,
    Reverse,
    Strike,
    Blink,
    AltFont,
}

impl PenAttr {
    /// Every attribute, in SGR emission order.
    pub const ALL: [Self; 9] = [
        Self::Fg,
        Self::Bg,
        Self::Bold,
        Self::Under,
        Self::Italic,
        Self::Reverse,
        Self::Strike,
        Self::Blink,
        Self::AltFont,
    ];

    const fn flag(self) -> Option<PenFlags> {
        match self {
            Self::Bold => Some(PenFlags::BOLD),
            Self::Italic => Some(PenFlags::ITALIC),
            Self::Reverse => Some(PenFlags::REVERSE),
            Self::Strike => Some(PenFlags::STRIKE),
            Self::Blink => Some(PenFlags::BLINK),
            Self::Fg | Self::Bg | Self::Under | Self::AltFont => None,
        }
    }
}

bitflags::bitflags! {
    /// Boolean attributes, used both as the "present" mask and the value mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    struct PenFlags: u8 {
        const BOLD    = 1 << 0;
        const ITALIC  = 1 << 1;
        const REVERSE = 1 << 2;
        const STRIKE  = 1 << 3;
        const BLINK   = 1 << 4;
    }
}

// ─── Pen ─────────────────────────────────────────────────────────────────────

/// A sparse set of rendering attributes.
///
/// # Examples
///
/// ```
/// use n_term::pen::{Pen, PenAttr, PenColor};
///
/// let pen = Pen::new().with_bold(true).with_fg(PenColor::Index(1));
/// assert!(pen.has(PenAttr::Bold));
/// assert!(!pen.has(PenAttr::Italic));
///
/// // Absent and explicitly-off render the same.
/// assert!(Pen::new().equivalent(&Pen::new().with_italic(false)));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pen {
    fg: Option<PenColor>,
    bg: Option<PenColor>,
    present: PenFlags,
    on: PenFlags,
    under: Option<Underline>,
    altfont: Option<u8>,
}

impl Pen {
    /// A pen with no attributes present.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fg: None,
            bg: None,
            present: PenFlags::empty(),
            on: PenFlags::empty(),
            under: None,
            altfont: None,
        }
    }

    // ─── Builders ────────────────────────────────────────────────────────

    #[must_use]
    pub const fn with_fg(mut self, colour: PenColor) -> Self {
        self.fg = Some(colour);
        self
    }

    #[must_use]
    pub const fn with_bg(mut self, colour: PenColor) -> Self {
        self.bg = Some(colour);
        self
    }

    #[must_use]
    pub fn with_bold(self, on: bool) -> Self {
        self.with_bool(PenAttr::Bold, on)
    }

    #[must_use]
    pub fn with_italic(self, on: bool) -> Self {
        self.with_bool(PenAttr::Italic, on)
    }

    #[must_use]
    pub fn with_reverse(self, on: bool) -> Self {
        self.with_bool(PenAttr::Reverse, on)
    }

    #[must_use]
    pub fn with_strike(self, on: bool) -> Self {
        self.with_bool(PenAttr::Strike, on)
    }

    #[must_use]
    pub fn with_blink(self, on: bool) -> Self {
        self.with_bool(PenAttr::Blink, on)
    }

    #[must_use]
    pub const fn with_under(mut self, style: Underline) -> Self {
        self.under = Some(style);
        self
    }

    #[must_use]
    pub const fn with_altfont(mut self, font: u8) -> Self {
        self.altfont = Some(font);
        self
    }

    #[must_use]
    pub fn with_bool(mut self, attr: PenAttr, on: bool) -> Self {
        self.set_bool(attr, on);
        self
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    /// Whether `attr` is present (set to any value, including off).
    #[must_use]
    pub fn has(&self, attr: PenAttr) -> bool {
        match attr {
            PenAttr::Fg => self.fg.is_some(),
            PenAttr::Bg => self.bg.is_some(),
            PenAttr::Under => self.under.is_some(),
            PenAttr::AltFont => self.altfont.is_some(),
            _ => attr.flag().is_some_and(|f| self.present.contains(f)),
        }
    }

    /// Whether no attribute is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        PenAttr::ALL.iter().all(|&a| !self.has(a))
    }

    /// Boolean value of `attr`; absent reads as `false`.
    ///
    /// For non-boolean attributes this reports whether the attribute is
    /// present with a non-default value.
    #[must_use]
    pub fn bool_attr(&self, attr: PenAttr) -> bool {
        match attr {
            PenAttr::Fg => self.fg.is_some(),
            PenAttr::Bg => self.bg.is_some(),
            PenAttr::Under => self.under.is_some_and(|u| u != Underline::None),
            PenAttr::AltFont => self.altfont.is_some_and(|f| f != 0),
            _ => attr.flag().is_some_and(|f| self.on.contains(f)),
        }
    }

    #[must_use]
    pub const fn fg(&self) -> Option<PenColor> {
        self.fg
    }

    #[must_use]
    pub const fn bg(&self) -> Option<PenColor> {
        self.bg
    }

    /// Colour of `Fg` or `Bg`; `None` for any other attribute.
    #[must_use]
    pub const fn colour(&self, attr: PenAttr) -> Option<PenColor> {
        match attr {
            PenAttr::Fg => self.fg,
            PenAttr::Bg => self.bg,
            _ => None,
        }
    }

    #[must_use]
    pub const fn under(&self) -> Option<Underline> {
        self.under
    }

    #[must_use]
    pub const fn altfont(&self) -> Option<u8> {
        self.altfont
    }

    // ─── Mutation ────────────────────────────────────────────────────────

    pub const fn set_fg(&mut self, colour: PenColor) {
        self.fg = Some(colour);
    }

    pub const fn set_bg(&mut self, colour: PenColor) {
        self.bg = Some(colour);
    }

    pub const fn set_under(&mut self, style: Underline) {
        self.under = Some(style);
    }

    pub const fn set_altfont(&mut self, font: u8) {
        self.altfont = Some(font);
    }

    /// Set a boolean attribute. Non-boolean attributes are ignored.
    pub fn set_bool(&mut self, attr: PenAttr, on: bool) {
        if let Some(flag) = attr.flag() {
            self.present.insert(flag);
            self.on.set(flag, on);
        }
    }

    /// Make `attr` absent.
    pub fn clear(&mut self, attr: PenAttr) {
        match attr {
            PenAttr::Fg => self.fg = None,
            PenAttr::Bg => self.bg = None,
            PenAttr::Under => self.under = None,
            PenAttr::AltFont => self.altfont = None,
            _ => {
                if let Some(flag) = attr.flag() {
                    self.present.remove(flag);
                    self.on.remove(flag);
                }
            }
        }
    }

    /// Make every attribute absent.
    pub fn clear_all(&mut self) {
        *self = Self::new();
    }

    /// Copy attributes present in `src` into `self`.
    ///
    /// With `overwrite`, present attributes in `src` replace ours. Without
    /// it, only attributes we don't already have are filled in.
    pub fn copy_from(&mut self, src: &Self, overwrite: bool) {
        for attr in PenAttr::ALL {
            if !src.has(attr) || (!overwrite && self.has(attr)) {
                continue;
            }
            match attr {
                PenAttr::Fg => self.fg = src.fg,
                PenAttr::Bg => self.bg = src.bg,
                PenAttr::Under => self.under = src.under,
                PenAttr::AltFont => self.altfont = src.altfont,
                _ => self.set_bool(attr, src.bool_attr(attr)),
            }
        }
    }

    // ─── Equivalence ─────────────────────────────────────────────────────

    /// Whether both pens render `attr` the same way (absent ≡ off/default).
    #[must_use]
    pub fn equivalent_attr(&self, other: &Self, attr: PenAttr) -> bool {
        match attr {
            PenAttr::Fg => self.fg == other.fg,
            PenAttr::Bg => self.bg == other.bg,
            PenAttr::Under => {
                self.under.unwrap_or_default() == other.under.unwrap_or_default()
            }
            PenAttr::AltFont => self.altfont.unwrap_or(0) == other.altfont.unwrap_or(0),
            _ => self.bool_attr(attr) == other.bool_attr(attr),
        }
    }

    /// Whether both pens render identically.
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        PenAttr::ALL.iter().all(|&a| self.equivalent_attr(other, a))
    }
}

impl fmt::Debug for Pen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pen{{")?;
        let mut sep = "";
        let mut field = |f: &mut fmt::Formatter<'_>, text: fmt::Arguments<'_>| {
            let r = write!(f, "{sep}{text}");
            sep = " ";
            r
        };
        if let Some(c) = self.fg {
            field(f, format_args!("fg={c:?}"))?;
        }
        if let Some(c) = self.bg {
            field(f, format_args!("bg={c:?}"))?;
        }
        for (attr, name) in [
            (PenAttr::Bold, "b"),
            (PenAttr::Italic, "i"),
            (PenAttr::Reverse, "rv"),
            (PenAttr::Strike, "strike"),
            (PenAttr::Blink, "blink"),
        ] {
            if self.has(attr) {
                field(f, format_args!("{name}={}", u8::from(self.bool_attr(attr))))?;
            }
        }
        if let Some(u) = self.under {
            field(f, format_args!("u={u:?}"))?;
        }
        if let Some(font) = self.altfont {
            field(f, format_args!("af={font}"))?;
        }
        write!(f, "}}")
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pen_is_empty() {
        let pen = Pen::new();
        assert!(pen.is_empty());
        for attr in PenAttr::ALL {
            assert!(!pen.has(attr));
        }
    }

    #[test]
    fn pen_is_small() {
        assert!(std::mem::size_of::<Pen>() <= 16);
    }

    // ── Presence ─────────────────────────────────────────────────────────

    #[test]
    fn explicit_off_is_present() {
        let pen = Pen::new().with_bold(false);
        assert!(pen.has(PenAttr::Bold));
        assert!(!pen.bool_attr(PenAttr::Bold));
        assert!(!pen.is_empty());
    }

    #[test]
    fn clear_makes_absent() {
        let mut pen = Pen::new().with_italic(true).with_fg(PenColor::Index(3));
        pen.clear(PenAttr::Italic);
        pen.clear(PenAttr::Fg);
        assert!(pen.is_empty());
    }

    #[test]
    fn set_bool_ignores_non_boolean_attrs() {
        let mut pen = Pen::new();
        pen.set_bool(PenAttr::Fg, true);
        assert!(!pen.has(PenAttr::Fg));
    }

    // ── Copy ─────────────────────────────────────────────────────────────

    #[test]
    fn copy_with_overwrite_replaces() {
        let mut dst = Pen::new().with_fg(PenColor::Index(1)).with_bold(true);
        let src = Pen::new().with_fg(PenColor::Index(2)).with_italic(true);
        dst.copy_from(&src, true);
        assert_eq!(dst.fg(), Some(PenColor::Index(2)));
        assert!(dst.bool_attr(PenAttr::Bold));
        assert!(dst.bool_attr(PenAttr::Italic));
    }

    #[test]
    fn copy_without_overwrite_fills_gaps() {
        let mut dst = Pen::new().with_fg(PenColor::Index(1)).with_bold(false);
        let src = Pen::new()
            .with_fg(PenColor::Index(2))
            .with_bold(true)
            .with_under(Underline::Double);
        dst.copy_from(&src, false);
        assert_eq!(dst.fg(), Some(PenColor::Index(1)));
        assert!(!dst.bool_attr(PenAttr::Bold));
        assert_eq!(dst.under(), Some(Underline::Double));
    }

    // ── Equivalence ──────────────────────────────────────────────────────

    #[test]
    fn absent_equivalent_to_off() {
        let a = Pen::new();
        let b = Pen::new()
            .with_bold(false)
            .with_under(Underline::None)
            .with_altfont(0);
        assert!(a.equivalent(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn different_colours_not_equivalent() {
        let a = Pen::new().with_bg(PenColor::Rgb(1, 2, 3));
        let b = Pen::new().with_bg(PenColor::Rgb(1, 2, 4));
        assert!(!a.equivalent(&b));
        assert!(a.equivalent_attr(&b, PenAttr::Fg));
        assert!(!a.equivalent_attr(&b, PenAttr::Bg));
    }

    #[test]
    fn colour_default_differs_from_index_zero() {
        let a = Pen::new();
        let b = Pen::new().with_fg(PenColor::Index(0));
        assert!(!a.equivalent(&b));
    }

    // ── Debug ────────────────────────────────────────────────────────────

    #[test]
    fn debug_lists_present_attrs() {
        let pen = Pen::new().with_bold(true).with_fg(PenColor::Index(4));
        assert_eq!(format!("{pen:?}"), "Pen{fg=Index(4) b=1}");
        assert_eq!(format!("{:?}", Pen::new()), "Pen{}");
    }
}
