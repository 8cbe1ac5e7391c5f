// SPDX-License-Identifier: MIT
//
// Errors raised by the render buffer.
//
// Geometry is never an error: drawing outside the buffer or the clip rect is
// silently clipped. The failures below are the ones a caller can act on.

use std::collections::TryReserveError;

/// Failure of a render buffer operation.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Text contained a control character, which has no cell width.
    #[error("control character {ch:?} at byte {index} in drawn text")]
    ControlCharacter { ch: char, index: usize },

    /// A virtual-cursor operation was used before `goto`.
    #[error("virtual cursor is not set")]
    NoCursor,

    /// Cell grid or text storage could not be allocated.
    #[error("render buffer allocation failed: {0}")]
    Alloc(#[from] TryReserveError),
}

/// Convenience alias used throughout the render buffer.
pub type Result<T> = std::result::Result<T, RenderError>;
