// SPDX-License-Identifier: MIT
//
// n-tui — a small interactive demo of the compositor.
//
// Two framed panels overlap on a tinted background, with a status line at
// the bottom. Typing goes to the focused panel; Enter starts a new line and
// scrolls the panel once it is full. Tab moves focus to the other panel and
// raises it.
//
//   ┌─ one ──────────┐
//   │ text...   ┌─ two ──────────┐
//   │           │ text...        │
//   └───────────│                │
//               └────────────────┘
//   Tab: switch  Enter: new line  q: quit
//
// Set N_TUI_LOG (e.g. `N_TUI_LOG=window=debug`) and redirect stderr to a
// file to watch the window tree work.

use std::cell::RefCell;
use std::io::{self, Read};
use std::rc::Rc;

use anyhow::{Context, Result};
use n_term::terminal::Session;
use n_term::{AnsiTerm, BindFlags, LineCaps, LineStyle, Pen, PenColor, Rect, RenderBuffer};
use n_window::{EventMask, KeyEvent, KeyKind, Modifiers, RootWindow, WindowEvent, WindowId};
use tracing_subscriber::EnvFilter;

type Root = RootWindow<AnsiTerm<io::Stdout>>;

const STATUS: &str = " Tab: switch  Enter: new line  Backspace: erase  q: quit";

fn main() -> Result<()> {
    init_logging();

    let mut session = Session::new();
    session.enter().context("failed to enter terminal session")?;
    let result = run(&session);
    session.leave().context("failed to restore terminal")?;
    result
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("N_TUI_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(session: &Session) -> Result<()> {
    let (lines, cols) = session.size().lines_cols();
    let mut root = RootWindow::new(AnsiTerm::stdout());
    let top = root.root();

    root.set_pen(top, Pen::new().with_bg(PenColor::Index(236)));
    root.bind_event(top, EventMask::EXPOSE, BindFlags::empty(), move |_, _, ev| {
        if let WindowEvent::Expose { rb, rect } = ev {
            rb.eraserect(*rect);
            rb.savepen();
            rb.setpen(&Pen::new().with_reverse(true));
            rb.erase_at(lines - 1, 0, cols);
            if let Err(err) = rb.text_at(lines - 1, 0, STATUS) {
                tracing::warn!(%err, "failed to draw status line");
            }
            rb.restorepen();
        }
        false
    });

    let (panel_lines, panel_cols) = ((lines / 2).max(5), (cols / 2).max(20));
    let one = new_panel(&mut root, Rect::new(1, 2, panel_lines, panel_cols), "one")
        .context("failed to create panel")?;
    let two = new_panel(
        &mut root,
        Rect::new(lines / 3, cols / 3, panel_lines, panel_cols),
        "two",
    )
    .context("failed to create panel")?;

    root.take_focus(two);
    root.tick()?;

    let mut focused = two;
    let mut stdin = io::stdin().lock();
    let mut byte = [0u8; 1];
    loop {
        if stdin.read(&mut byte)? == 0 {
            break;
        }
        match byte[0] {
            b'q' | 0x03 => break,
            b'\t' => {
                focused = if focused == one { two } else { one };
                root.raise_to_front(focused);
                root.take_focus(focused);
            }
            b'\r' | b'\n' => {
                root.dispatch_key(&KeyEvent::key("Enter", Modifiers::empty()));
            }
            0x7f | 0x08 => {
                root.dispatch_key(&KeyEvent::key("Backspace", Modifiers::empty()));
            }
            b if b == b' ' || b.is_ascii_graphic() => {
                root.dispatch_key(&KeyEvent::text(&char::from(b).to_string()));
            }
            other => tracing::debug!(byte = other, "ignored input byte"),
        }

        if root.needs_tick() {
            root.tick()?;
        }
    }
    Ok(())
}

// ─── Panels ──────────────────────────────────────────────────────────────────

/// A framed window holding lines of typed text.
fn new_panel(root: &mut Root, rect: Rect, title: &str) -> Option<WindowId> {
    let top = root.root();
    let win = root.new_subwindow(top, rect)?;
    root.apply_ctl_directive(win, "cursor-shape=bar noblink").ok()?;

    let text = Rc::new(RefCell::new(vec![String::new()]));
    let title = format!(" {title} ");

    let shown = Rc::clone(&text);
    root.bind_event(win, EventMask::EXPOSE, BindFlags::empty(), move |root, win, ev| {
        let (Some(geom), WindowEvent::Expose { rb, rect }) = (root.geometry(win), ev) else {
            return false;
        };
        rb.eraserect(*rect);
        draw_frame(rb, geom.lines, geom.cols, &title);
        for (line, content) in (1..).zip(shown.borrow().iter()) {
            if let Err(err) = rb.text_at(line, 2, content) {
                tracing::warn!(%err, line, "failed to draw panel text");
            }
        }
        false
    });

    root.bind_event(win, EventMask::KEY, BindFlags::empty(), move |root, win, ev| {
        let WindowEvent::Key(key) = ev else {
            return false;
        };
        let Some(geom) = root.geometry(win) else {
            return false;
        };
        let interior = Rect::new(1, 1, geom.lines - 2, geom.cols - 2);
        let mut lines = text.borrow_mut();

        match (key.kind, key.name.as_str()) {
            (KeyKind::Text, s) => {
                if let Some(last) = lines.last_mut() {
                    if i32::try_from(last.len()).unwrap_or(i32::MAX) < interior.cols - 2 {
                        last.push_str(s);
                    }
                }
            }
            (KeyKind::Key, "Backspace") => {
                if let Some(last) = lines.last_mut() {
                    last.pop();
                }
            }
            (KeyKind::Key, "Enter") => {
                lines.push(String::new());
                if i32::try_from(lines.len()).unwrap_or(i32::MAX) > interior.lines {
                    lines.remove(0);
                    root.scrollrect(win, interior, 1, 0, None);
                }
            }
            (KeyKind::Key, _) => return false,
        }

        let row = i32::try_from(lines.len()).unwrap_or(i32::MAX);
        let col = lines.last().map_or(0, |l| i32::try_from(l.len()).unwrap_or(0));
        root.expose(win, Some(Rect::new(row, 1, 1, interior.cols)));
        root.set_cursor_position(win, row, col + 2);
        true
    });

    Some(win)
}

fn draw_frame(rb: &mut RenderBuffer, lines: i32, cols: i32, title: &str) {
    let (bottom, right) = (lines - 1, cols - 1);
    rb.hline_at(0, 0, right, LineStyle::Single, LineCaps::empty());
    rb.hline_at(bottom, 0, right, LineStyle::Single, LineCaps::empty());
    rb.vline_at(0, bottom, 0, LineStyle::Single, LineCaps::empty());
    rb.vline_at(0, bottom, right, LineStyle::Single, LineCaps::empty());
    if let Err(err) = rb.text_at(0, 2, title) {
        tracing::warn!(%err, title, "failed to draw panel title");
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
