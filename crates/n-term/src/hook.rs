// SPDX-License-Identifier: MIT
//
// Hook lists — ordered callbacks filtered by an event mask.
//
// The hard part of a hook list is that callbacks usually need mutable access
// to the very structure that owns the list (a window callback wants to
// expose, resize or unbind itself). So dispatch never holds a borrow of the
// list while a callback runs:
//
//   1. `begin_run` snapshots the matching entries: id, one-shot flag and a
//      shared handle to the callback.
//   2. Before each call, the dispatcher re-resolves the list through the
//      owning context and checks the entry is still bound. Entries unbound
//      by an earlier callback in the same run are skipped. A callback that
//      unbinds itself still completes, since the dispatcher holds its handle.
//   3. `end_run` drops the run depth; dead entries are compacted away once
//      the outermost run finishes.
//
// A callback that is already executing (the owner re-dispatched the same
// event from inside it) is skipped rather than re-entered.

use std::cell::RefCell;
use std::rc::Rc;

use bitflags::Flags;

// ─── Ids & Flags ─────────────────────────────────────────────────────────────

/// Handle returned by [`HookList::bind`], used to unbind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HookId(u64);

bitflags::bitflags! {
    /// Options for [`HookList::bind`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct BindFlags: u8 {
        /// Insert at the front instead of the back.
        const FIRST   = 1 << 0;
        /// Unbind automatically before the first invocation.
        const ONESHOT = 1 << 1;
    }
}

/// Whether a dispatch stops at the first callback returning `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    All,
    UntilTrue,
}

type Shared<F> = Rc<RefCell<Box<F>>>;

struct Entry<M, F: ?Sized> {
    id: HookId,
    mask: M,
    oneshot: bool,
    live: bool,
    callback: Shared<F>,
}

/// A matching entry captured at the start of a run.
pub struct Pending<F: ?Sized> {
    id: HookId,
    oneshot: bool,
    callback: Shared<F>,
}

// ─── HookList ────────────────────────────────────────────────────────────────

/// Ordered list of callbacks of type `F`, each bound to an event mask `M`.
pub struct HookList<M, F: ?Sized> {
    entries: Vec<Entry<M, F>>,
    next_id: u64,
    depth: usize,
}

impl<M: Flags + Copy, F: ?Sized> HookList<M, F> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
            depth: 0,
        }
    }

    /// Bind `callback` to events intersecting `mask`.
    pub fn bind(&mut self, mask: M, flags: BindFlags, callback: Box<F>) -> HookId {
        let id = HookId(self.next_id);
        self.next_id += 1;
        let entry = Entry {
            id,
            mask,
            oneshot: flags.contains(BindFlags::ONESHOT),
            live: true,
            callback: Rc::new(RefCell::new(callback)),
        };
        if flags.contains(BindFlags::FIRST) {
            self.entries.insert(0, entry);
        } else {
            self.entries.push(entry);
        }
        id
    }

    /// Unbind a callback. Returns `false` if `id` was not bound.
    ///
    /// During a run the entry is only marked dead; it is removed when the
    /// outermost run ends.
    pub fn unbind(&mut self, id: HookId) -> bool {
        let Some(pos) = self.entries.iter().position(|e| e.id == id && e.live) else {
            return false;
        };
        if self.depth > 0 {
            self.entries[pos].live = false;
        } else {
            self.entries.remove(pos);
        }
        true
    }

    /// Unbind every callback.
    pub fn unbind_all(&mut self) {
        if self.depth > 0 {
            for e in &mut self.entries {
                e.live = false;
            }
        } else {
            self.entries.clear();
        }
    }

    #[must_use]
    pub fn is_bound(&self, id: HookId) -> bool {
        self.entries.iter().any(|e| e.id == id && e.live)
    }

    /// Number of bound (live) callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.live).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start a run: snapshot the live entries whose mask intersects `event`.
    ///
    /// Every `begin_run` must be paired with an [`end_run`](Self::end_run).
    pub fn begin_run(&mut self, event: M) -> Vec<Pending<F>> {
        self.depth += 1;
        self.entries
            .iter()
            .filter(|e| e.live && e.mask.intersects(event))
            .map(|e| Pending {
                id: e.id,
                oneshot: e.oneshot,
                callback: Rc::clone(&e.callback),
            })
            .collect()
    }

    /// Finish a run, compacting dead entries if it was the outermost one.
    pub fn end_run(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.entries.retain(|e| e.live);
        }
    }
}

impl<M: Flags + Copy, F: ?Sized> Default for HookList<M, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: std::fmt::Debug, F: ?Sized> std::fmt::Debug for HookList<M, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().filter(|e| e.live).map(|e| (e.id, &e.mask)))
            .finish()
    }
}

// ─── Dispatch ────────────────────────────────────────────────────────────────

/// Run the hooks of the list reached through `list` for `event`.
///
/// `list` re-resolves the hook list from the context before every call, so
/// callbacks receive `ctx` mutably and may modify the list (or destroy its
/// owner, in which case the run simply ends). `call` invokes one callback.
///
/// Returns whether any callback returned `true`. With
/// [`RunMode::UntilTrue`], dispatch stops at the first such callback.
pub fn dispatch<C, M, F>(
    ctx: &mut C,
    list: impl Fn(&mut C) -> Option<&mut HookList<M, F>>,
    event: M,
    mode: RunMode,
    mut call: impl FnMut(&mut F, &mut C) -> bool,
) -> bool
where
    M: Flags + Copy,
    F: ?Sized,
{
    let Some(hooks) = list(ctx) else {
        return false;
    };
    let pending = hooks.begin_run(event);
    let mut handled = false;

    for hook in pending {
        match list(ctx) {
            Some(hooks) if hooks.is_bound(hook.id) => {
                if hook.oneshot {
                    hooks.unbind(hook.id);
                }
            }
            Some(_) => continue,
            None => return handled,
        }
        let Ok(mut callback) = hook.callback.try_borrow_mut() else {
            tracing::trace!(target: "render.hook", id = hook.id.0, "skipping re-entrant hook");
            continue;
        };
        let result = call(&mut **callback, ctx);
        drop(callback);
        if result {
            handled = true;
            if mode == RunMode::UntilTrue {
                break;
            }
        }
    }

    if let Some(hooks) = list(ctx) {
        hooks.end_run();
    }
    handled
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    bitflags::bitflags! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        struct Ev: u8 {
            const A = 1;
            const B = 2;
        }
    }

    type Hook = dyn FnMut(&mut Ctx, Ev) -> bool;

    #[derive(Default)]
    struct Ctx {
        hooks: HookList<Ev, Hook>,
        log: Vec<String>,
        ids: Vec<HookId>,
    }

    fn run(ctx: &mut Ctx, ev: Ev, mode: RunMode) -> bool {
        dispatch(ctx, |c: &mut Ctx| Some(&mut c.hooks), ev, mode, |cb, c| cb(c, ev))
    }

    fn logger(name: &'static str, ret: bool) -> Box<Hook> {
        Box::new(move |c: &mut Ctx, ev: Ev| {
            c.log.push(format!("{name}:{ev:?}"));
            ret
        })
    }

    // ── Binding ──────────────────────────────────────────────────────────

    #[test]
    fn runs_in_bind_order_filtered_by_mask() {
        let mut ctx = Ctx::default();
        ctx.hooks.bind(Ev::A, BindFlags::empty(), logger("one", false));
        ctx.hooks.bind(Ev::B, BindFlags::empty(), logger("two", false));
        ctx.hooks.bind(Ev::A | Ev::B, BindFlags::empty(), logger("three", false));

        assert!(!run(&mut ctx, Ev::A, RunMode::All));
        assert_eq!(ctx.log, vec!["one:Ev(A)", "three:Ev(A)"]);
    }

    #[test]
    fn first_flag_prepends() {
        let mut ctx = Ctx::default();
        ctx.hooks.bind(Ev::A, BindFlags::empty(), logger("back", false));
        ctx.hooks.bind(Ev::A, BindFlags::FIRST, logger("front", false));
        run(&mut ctx, Ev::A, RunMode::All);
        assert_eq!(ctx.log, vec!["front:Ev(A)", "back:Ev(A)"]);
    }

    #[test]
    fn unbind_removes() {
        let mut ctx = Ctx::default();
        let id = ctx.hooks.bind(Ev::A, BindFlags::empty(), logger("x", false));
        assert!(ctx.hooks.is_bound(id));
        assert!(ctx.hooks.unbind(id));
        assert!(!ctx.hooks.unbind(id));
        assert!(ctx.hooks.is_empty());
        run(&mut ctx, Ev::A, RunMode::All);
        assert!(ctx.log.is_empty());
    }

    // ── Run modes ────────────────────────────────────────────────────────

    #[test]
    fn until_true_stops_early() {
        let mut ctx = Ctx::default();
        ctx.hooks.bind(Ev::A, BindFlags::empty(), logger("one", false));
        ctx.hooks.bind(Ev::A, BindFlags::empty(), logger("two", true));
        ctx.hooks.bind(Ev::A, BindFlags::empty(), logger("three", true));

        assert!(run(&mut ctx, Ev::A, RunMode::UntilTrue));
        assert_eq!(ctx.log, vec!["one:Ev(A)", "two:Ev(A)"]);

        ctx.log.clear();
        assert!(run(&mut ctx, Ev::A, RunMode::All));
        assert_eq!(ctx.log.len(), 3);
    }

    #[test]
    fn oneshot_fires_once() {
        let mut ctx = Ctx::default();
        ctx.hooks.bind(Ev::A, BindFlags::ONESHOT, logger("once", false));
        run(&mut ctx, Ev::A, RunMode::All);
        run(&mut ctx, Ev::A, RunMode::All);
        assert_eq!(ctx.log, vec!["once:Ev(A)"]);
        assert!(ctx.hooks.is_empty());
    }

    // ── Unbinding during dispatch ────────────────────────────────────────

    #[test]
    fn self_unbind_completes_and_does_not_fire_again() {
        let mut ctx = Ctx::default();
        let id = ctx.hooks.bind(
            Ev::A,
            BindFlags::empty(),
            Box::new(|c: &mut Ctx, _| {
                let me = c.ids[0];
                c.hooks.unbind(me);
                c.log.push("self".into());
                false
            }),
        );
        ctx.ids.push(id);
        ctx.hooks.bind(Ev::A, BindFlags::empty(), logger("after", false));

        run(&mut ctx, Ev::A, RunMode::All);
        run(&mut ctx, Ev::A, RunMode::All);
        assert_eq!(ctx.log, vec!["self", "after:Ev(A)", "after:Ev(A)"]);
        assert_eq!(ctx.hooks.len(), 1);
    }

    #[test]
    fn unbinding_a_later_hook_skips_it() {
        let mut ctx = Ctx::default();
        ctx.hooks.bind(
            Ev::A,
            BindFlags::empty(),
            Box::new(|c: &mut Ctx, _| {
                let victim = c.ids[0];
                c.hooks.unbind(victim);
                c.log.push("killer".into());
                false
            }),
        );
        let victim = ctx.hooks.bind(Ev::A, BindFlags::empty(), logger("victim", false));
        ctx.ids.push(victim);

        run(&mut ctx, Ev::A, RunMode::All);
        assert_eq!(ctx.log, vec!["killer"]);
    }

    #[test]
    fn dead_entries_compacted_after_run() {
        let mut ctx = Ctx::default();
        let id = ctx.hooks.bind(
            Ev::A,
            BindFlags::empty(),
            Box::new(|c: &mut Ctx, _| {
                let me = c.ids[0];
                c.hooks.unbind(me);
                // Still in the run: marked dead, not yet removed.
                c.log.push(format!("entries={}", c.hooks.entries.len()));
                false
            }),
        );
        ctx.ids.push(id);
        run(&mut ctx, Ev::A, RunMode::All);
        assert_eq!(ctx.log, vec!["entries=1"]);
        assert_eq!(ctx.hooks.entries.len(), 0);
    }

    #[test]
    fn bind_during_run_does_not_fire_in_same_run() {
        let mut ctx = Ctx::default();
        ctx.hooks.bind(
            Ev::A,
            BindFlags::ONESHOT,
            Box::new(|c: &mut Ctx, _| {
                c.hooks.bind(Ev::A, BindFlags::empty(), logger("late", false));
                false
            }),
        );
        run(&mut ctx, Ev::A, RunMode::All);
        assert!(ctx.log.is_empty());
        run(&mut ctx, Ev::A, RunMode::All);
        assert_eq!(ctx.log, vec!["late:Ev(A)"]);
    }

    // ── Re-entrancy ──────────────────────────────────────────────────────

    #[test]
    fn nested_dispatch_skips_running_callback() {
        let mut ctx = Ctx::default();
        ctx.hooks.bind(
            Ev::A,
            BindFlags::empty(),
            Box::new(|c: &mut Ctx, _| {
                c.log.push("outer".into());
                run(c, Ev::A, RunMode::All);
                false
            }),
        );
        ctx.hooks.bind(Ev::A, BindFlags::empty(), logger("inner", false));
        run(&mut ctx, Ev::A, RunMode::All);
        assert_eq!(ctx.log, vec!["outer", "inner:Ev(A)", "inner:Ev(A)"]);
    }
}
