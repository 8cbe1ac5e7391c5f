// SPDX-License-Identifier: MIT
//
// Errors surfaced by the window tree.

use std::io;

use n_term::RenderError;
use thiserror::Error;

use crate::ctl::WindowCtl;

#[derive(Debug, Error)]
pub enum WindowError {
    /// Flushing to the terminal failed.
    #[error("terminal output failed")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("unknown window control '{0}'")]
    UnknownCtl(String),

    #[error("invalid value '{value}' for window control {ctl}")]
    InvalidCtlValue { ctl: WindowCtl, value: String },

    /// The window id no longer resolves.
    #[error("window no longer exists")]
    StaleWindow,
}

pub type Result<T> = std::result::Result<T, WindowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            WindowError::UnknownCtl("wobble".into()).to_string(),
            "unknown window control 'wobble'"
        );
        let err = WindowError::InvalidCtlValue {
            ctl: WindowCtl::CursorShape,
            value: "round".into(),
        };
        assert_eq!(err.to_string(), "invalid value 'round' for window control cursor-shape");
    }

    #[test]
    fn render_errors_pass_through() {
        let err = WindowError::from(RenderError::NoCursor);
        assert_eq!(err.to_string(), RenderError::NoCursor.to_string());
    }
}
