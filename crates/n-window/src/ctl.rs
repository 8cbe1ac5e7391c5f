// SPDX-License-Identifier: MIT
//
// Window controls — per-window settings addressable by name.
//
// Every control has a typed accessor on `RootWindow`, but hosts that read
// settings from a config file or a command line want to name them. This
// module maps names to controls and parses directives in the familiar
// `:set` style:
//
// | Directive          | Effect                          |
// |--------------------|---------------------------------|
// | `name`             | Enable a boolean control        |
// | `noname`           | Disable a boolean control       |
// | `name!`            | Toggle a boolean control        |
// | `name=value`       | Assign any control              |
//
// | Full name            | Alias       | Type  | Default |
// |----------------------|-------------|-------|---------|
// | `steal-input`        | `steal`     | bool  | false   |
// | `focus-child-notify` | `notify`    | bool  | false   |
// | `cursor-visible`     | `cursorvis` | bool  | true    |
// | `cursor-blink`       | `blink`     | bool  | true    |
// | `cursor-shape`       | `shape`     | shape | block   |

use std::fmt;
use std::str::FromStr;

use n_term::{CursorShape, TermSink};

use crate::error::{Result, WindowError};
use crate::root::RootWindow;
use crate::window::WindowId;

// ─── Controls ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowCtl {
    StealInput,
    FocusChildNotify,
    CursorVisible,
    CursorBlink,
    CursorShape,
}

impl WindowCtl {
    pub const ALL: [Self; 5] = [
        Self::StealInput,
        Self::FocusChildNotify,
        Self::CursorVisible,
        Self::CursorBlink,
        Self::CursorShape,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::StealInput => "steal-input",
            Self::FocusChildNotify => "focus-child-notify",
            Self::CursorVisible => "cursor-visible",
            Self::CursorBlink => "cursor-blink",
            Self::CursorShape => "cursor-shape",
        }
    }

    #[must_use]
    pub const fn alias(self) -> &'static str {
        match self {
            Self::StealInput => "steal",
            Self::FocusChildNotify => "notify",
            Self::CursorVisible => "cursorvis",
            Self::CursorBlink => "blink",
            Self::CursorShape => "shape",
        }
    }

    /// Find a control by full name or alias.
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ctl| ctl.name() == name || ctl.alias() == name)
    }

    #[must_use]
    pub const fn is_bool(self) -> bool {
        !matches!(self, Self::CursorShape)
    }
}

impl fmt::Display for WindowCtl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WindowCtl {
    type Err = WindowError;

    fn from_str(s: &str) -> Result<Self> {
        Self::lookup(s).ok_or_else(|| WindowError::UnknownCtl(s.to_owned()))
    }
}

// ─── Values ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtlValue {
    Bool(bool),
    Shape(CursorShape),
}

impl CtlValue {
    /// Parse `text` as a value for `ctl`.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::InvalidCtlValue`] if `text` is not a value of
    /// the control's type.
    pub fn parse(ctl: WindowCtl, text: &str) -> Result<Self> {
        let value = if ctl.is_bool() {
            parse_bool(text).map(Self::Bool)
        } else {
            parse_shape(text).map(Self::Shape)
        };
        value.ok_or_else(|| WindowError::InvalidCtlValue {
            ctl,
            value: text.to_owned(),
        })
    }
}

impl fmt::Display for CtlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(on) => write!(f, "{on}"),
            Self::Shape(CursorShape::Block) => f.write_str("block"),
            Self::Shape(CursorShape::Underline) => f.write_str("under"),
            Self::Shape(CursorShape::LeftBar) => f.write_str("bar"),
        }
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_shape(text: &str) -> Option<CursorShape> {
    match text {
        "1" | "block" => Some(CursorShape::Block),
        "2" | "under" | "underline" => Some(CursorShape::Underline),
        "3" | "bar" | "leftbar" | "left-bar" => Some(CursorShape::LeftBar),
        _ => None,
    }
}

// ─── Directives ──────────────────────────────────────────────────────────────

/// One parsed control directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtlDirective {
    On(WindowCtl),
    Off(WindowCtl),
    Toggle(WindowCtl),
    Assign(WindowCtl, CtlValue),
}

impl FromStr for CtlDirective {
    type Err = WindowError;

    fn from_str(arg: &str) -> Result<Self> {
        if let Some((name, value)) = arg.split_once('=') {
            let ctl = name.parse()?;
            return Ok(Self::Assign(ctl, CtlValue::parse(ctl, value)?));
        }

        if let Some(name) = arg.strip_suffix('!') {
            return bool_ctl(name).map(Self::Toggle);
        }

        // `notify` is a control, not `no` + `tify`.
        if let Some(ctl) = arg.strip_prefix("no").and_then(WindowCtl::lookup) {
            return bool_ctl(ctl.name()).map(Self::Off);
        }

        bool_ctl(arg).map(Self::On)
    }
}

fn bool_ctl(name: &str) -> Result<WindowCtl> {
    let ctl: WindowCtl = name.parse()?;
    if ctl.is_bool() {
        Ok(ctl)
    } else {
        Err(WindowError::InvalidCtlValue {
            ctl,
            value: String::new(),
        })
    }
}

/// Parse whitespace-separated directives, e.g. `"steal noblink shape=bar"`.
///
/// # Errors
///
/// Returns the first directive's error; nothing is returned on failure.
pub fn parse_ctl_directives(text: &str) -> Result<Vec<CtlDirective>> {
    text.split_whitespace().map(str::parse).collect()
}

// ─── RootWindow Accessors ────────────────────────────────────────────────────

impl<T: TermSink> RootWindow<T> {
    #[must_use]
    pub fn get_ctl(&self, win: WindowId, ctl: WindowCtl) -> Option<CtlValue> {
        let node = self.node(win)?;
        Some(match ctl {
            WindowCtl::StealInput => CtlValue::Bool(node.steal_input),
            WindowCtl::FocusChildNotify => CtlValue::Bool(node.focus_child_notify),
            WindowCtl::CursorVisible => CtlValue::Bool(node.cursor.visible),
            WindowCtl::CursorBlink => CtlValue::Bool(node.cursor.blink),
            WindowCtl::CursorShape => CtlValue::Shape(node.cursor.shape),
        })
    }

    /// Set a control. Cursor controls on a focused window take effect at
    /// the next tick.
    ///
    /// # Errors
    ///
    /// [`WindowError::StaleWindow`] if `win` is gone,
    /// [`WindowError::InvalidCtlValue`] if `value` has the wrong type.
    pub fn set_ctl(&mut self, win: WindowId, ctl: WindowCtl, value: CtlValue) -> Result<()> {
        let node = self.node_mut(win).ok_or(WindowError::StaleWindow)?;
        match (ctl, value) {
            (WindowCtl::StealInput, CtlValue::Bool(on)) => node.steal_input = on,
            (WindowCtl::FocusChildNotify, CtlValue::Bool(on)) => node.focus_child_notify = on,
            (WindowCtl::CursorVisible, CtlValue::Bool(on)) => {
                self.update_cursor(win, |cursor| cursor.visible = on);
            }
            (WindowCtl::CursorBlink, CtlValue::Bool(on)) => {
                self.update_cursor(win, |cursor| cursor.blink = on);
            }
            (WindowCtl::CursorShape, CtlValue::Shape(shape)) => {
                self.update_cursor(win, |cursor| cursor.shape = shape);
            }
            (ctl, value) => {
                return Err(WindowError::InvalidCtlValue {
                    ctl,
                    value: value.to_string(),
                });
            }
        }
        tracing::trace!(target: "window.hierarchy", ?win, %ctl, %value, "set ctl");
        Ok(())
    }

    /// Apply whitespace-separated directives to `win`, in order.
    ///
    /// # Errors
    ///
    /// Fails before changing anything if any directive does not parse;
    /// otherwise as [`set_ctl`](Self::set_ctl).
    pub fn apply_ctl_directive(&mut self, win: WindowId, text: &str) -> Result<()> {
        for directive in parse_ctl_directives(text)? {
            let (ctl, value) = match directive {
                CtlDirective::On(ctl) => (ctl, CtlValue::Bool(true)),
                CtlDirective::Off(ctl) => (ctl, CtlValue::Bool(false)),
                CtlDirective::Toggle(ctl) => match self.get_ctl(win, ctl) {
                    Some(CtlValue::Bool(on)) => (ctl, CtlValue::Bool(!on)),
                    _ => return Err(WindowError::StaleWindow),
                },
                CtlDirective::Assign(ctl, value) => (ctl, value),
            };
            self.set_ctl(win, ctl, value)?;
        }
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
