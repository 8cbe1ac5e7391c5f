// SPDX-License-Identifier: MIT
//
// Terminal session control: raw mode, alternate screen, and RAII cleanup.
//
// Safety: This module uses `unsafe` for termios (tcgetattr, tcsetattr),
// ioctl (TIOCGWINSZ), isatty, and raw fd writes. These are the POSIX
// interfaces for terminal control and have no safe std equivalent. Each
// unsafe block is minimal.
#![allow(unsafe_code)]
//
// A `Session` puts the controlling terminal into the state a compositor
// needs: raw input, alternate screen, hidden cursor. It puts everything back
// when dropped. A process-wide panic hook writes a pre-built restore sequence
// straight to fd 1, bypassing the stdout lock a panicking frame flush may
// still hold, so the panic message lands on a usable terminal.

use std::io::{self, Write};
use std::sync::{Mutex, Once};

use crate::ansi;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Screen size of the controlling terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub cols: u16,
    pub rows: u16,
}

impl Size {
    /// Used when the terminal cannot be queried.
    pub const FALLBACK: Self = Self { cols: 80, rows: 24 };

    /// As `(lines, cols)`, the order the render buffer and window tree use.
    #[must_use]
    pub fn lines_cols(self) -> (i32, i32) {
        (i32::from(self.rows), i32::from(self.cols))
    }
}

// ─── Queries ────────────────────────────────────────────────────────────────

/// Ask the kernel how big the terminal on stdout is. `None` when stdout is
/// redirected.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    (result == 0 && ws.ws_col > 0 && ws.ws_row > 0).then_some(Size {
        cols: ws.ws_col,
        rows: ws.ws_row,
    })
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// Whether stdin is connected to a terminal.
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Panic-Safe Restore ─────────────────────────────────────────────────────

/// Original termios, for the panic hook which cannot reach the `Session`.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

#[cfg(unix)]
fn restore_termios_from_backup() {
    let Ok(guard) = TERMIOS_BACKUP.lock() else {
        return;
    };
    if let Some(ref original) = *guard {
        unsafe {
            let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, original);
        }
    }
}

/// End synchronized output, reset the scroll region and SGR, reset the
/// cursor shape, show the cursor, leave the alternate screen. Alternate
/// screen exit comes last so the shell's content reappears clean.
#[rustfmt::skip]
const EMERGENCY_RESTORE: &[u8] = b"\
    \x1b[?2026l\
    \x1b[r\
    \x1b[0m\
    \x1b[0 q\
    \x1b[?25h\
    \x1b[?1049l";

static PANIC_HOOK_INSTALLED: Once = Once::new();

fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── Session ────────────────────────────────────────────────────────────────

/// The controlling terminal in compositor mode, restored on drop.
///
/// ```no_run
/// use n_term::terminal::Session;
///
/// let mut session = Session::new();
/// session.enter()?;
/// // ... tick windows onto an AnsiTerm ...
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct Session {
    #[cfg(unix)]
    original_termios: Option<libc::termios>,
    size: Size,
    active: bool,
}

impl Session {
    /// A session handle for the current terminal, not yet entered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            #[cfg(unix)]
            original_termios: None,
            size: get_size().unwrap_or(Size::FALLBACK),
            active: false,
        }
    }

    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Re-query the size, e.g. after SIGWINCH.
    pub fn refresh_size(&mut self) -> Size {
        if let Some(size) = get_size() {
            self.size = size;
        }
        self.size
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Enter raw mode and the alternate screen, hide the cursor and clear.
    /// Does nothing if already active.
    ///
    /// # Errors
    ///
    /// Returns an error if termios or terminal output fails.
    pub fn enter(&mut self) -> io::Result<()> {
        if self.active {
            return Ok(());
        }
        install_panic_hook();
        self.enable_raw_mode()?;

        let stdout = io::stdout();
        let mut lock = stdout.lock();
        ansi::enter_alt_screen(&mut lock)?;
        ansi::cursor_hide(&mut lock)?;
        ansi::clear_screen(&mut lock)?;
        lock.flush()?;

        self.active = true;
        tracing::debug!(target: "render.flush", cols = self.size.cols, rows = self.size.rows, "entered terminal session");
        Ok(())
    }

    /// Undo [`enter`](Self::enter). Does nothing if not active.
    ///
    /// # Errors
    ///
    /// Returns an error if writing the restore sequence or resetting
    /// termios fails.
    pub fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }

        let stdout = io::stdout();
        let mut lock = stdout.lock();
        lock.write_all(EMERGENCY_RESTORE)?;
        lock.flush()?;
        drop(lock);

        self.disable_raw_mode()?;
        self.active = false;
        tracing::debug!(target: "render.flush", "left terminal session");
        Ok(())
    }

    // ── Raw mode (termios) ──────────────────────────────────────────

    #[cfg(unix)]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        if !is_tty() {
            return Ok(());
        }
        let fd = io::stdin().as_raw_fd();

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            self.original_termios = Some(termios);
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(termios);
            }

            libc::cfmakeraw(&raw mut termios);
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        if let Some(ref original) = self.original_termios {
            let fd = io::stdin().as_raw_fd();
            unsafe {
                if libc::tcsetattr(fd, libc::TCSAFLUSH, original) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }
            self.original_termios = None;
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.active {
            let _ = self.leave();
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
