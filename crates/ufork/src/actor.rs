//! Actor transaction lifecycle: begin, stage, commit, release, abort, stop
//! (spec.md §4.3).
//!
//! Staged *events* have a natural home in the heap: an actor's `txn` (`z`)
//! field becomes the head of a singly-linked chain of not-yet-committed
//! Event cells, threaded through their own `z` fields exactly like the
//! global queue in [`crate::queue`] — spec.md's own table already describes
//! `txn` this way, so there is no need to shadow it with a side table.
//! Events are prepended (O(1), no tail pointer available) and reversed once
//! at commit time to restore production order.
//!
//! A staged *become*, by contrast, has nowhere to live in the heap: the
//! Actor cell's `x`/`y` fields are its *persistent* behavior/state, and
//! design Notes §9 is explicit that `become` must stay invisible until
//! commit. [`Transaction`] is the Rust-level value the design note asks
//! for, owned by the running continuation for exactly this one purpose.

use crate::{
    cell::{CellView, Heap},
    word::{CellId, ProcConst, Word},
};
use ufork_interface::Tag;

/// The out-of-heap half of an in-flight transaction: a pending `become`.
/// Owned by the continuation running the actor's current thread; dropped
/// (never applied) on abort or stop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transaction {
    staged_become: Option<(Word, Word)>,
}

impl Transaction {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a `beh`/`new`-style restage. Spec.md §4.3: "multiple becomes
    /// in one transaction take the last one" — later calls simply overwrite.
    pub fn stage_become(&mut self, behavior: Word, state: Word) {
        self.staged_become = Some((behavior, state));
    }

    #[must_use]
    pub fn pending_become(&self) -> Option<(Word, Word)> {
        self.staged_become
    }
}

/// `true` iff the actor is mid-transaction (spec.md §3: "pending-event list
/// = UNDEF ⇔ ready; any other value (including NIL) ⇔ busy").
#[must_use]
pub fn is_busy(heap: &Heap, actor: CellId) -> bool {
    heap.cell(actor).z != Word::UNDEF
}

/// Starts a transaction: `txn := NIL` (spec.md §4.3 step 1).
pub fn begin(heap: &mut Heap, actor: CellId) {
    debug_assert!(!is_busy(heap, actor), "begin on an already-busy actor");
    heap.set_z(actor, Word::NIL);
}

/// Prepends `event` onto the actor's staged chain (spec.md §4.3 step 2).
pub fn stage_event(heap: &mut Heap, actor: CellId, event: CellId) {
    let head = heap.cell(actor).z;
    heap.set_z(event, head);
    heap.set_z(actor, Word::from(event));
}

/// Drains the actor's staged-event chain in production order (oldest
/// first), undoing the prepend-order storage.
fn drain_staged(heap: &Heap, actor: CellId) -> Vec<CellId> {
    let mut reversed = Vec::new();
    let mut cursor = heap.cell(actor).z;
    while let Word::Ptr(id) = cursor {
        let CellView::Event { next, .. } = heap.cell(id).view() else {
            panic!("staged txn entry {id:?} is not an Event cell");
        };
        reversed.push(id);
        cursor = next;
    }
    reversed.reverse();
    reversed
}

/// `end/commit`: flushes staged events (in production order) to the global
/// queue, persists any staged `become`, and marks the actor ready.
pub fn commit(
    heap: &mut Heap,
    queue: &mut crate::queue::EventQueue,
    actor: CellId,
    txn: Transaction,
) {
    for event in drain_staged(heap, actor) {
        queue.push_back(heap, event);
    }
    if let Some((behavior, state)) = txn.pending_become() {
        heap.set_x(actor, behavior);
        heap.set_y(actor, state);
    }
    heap.set_z(actor, Word::UNDEF);
}

/// `end/release`: like [`commit`], but additionally frees the actor cell.
/// Callers must ensure (per spec.md §4.3) that nothing still references it.
pub fn release(
    heap: &mut Heap,
    queue: &mut crate::queue::EventQueue,
    actor: CellId,
    txn: Transaction,
) {
    commit(heap, queue, actor, txn);
    heap.free(actor);
}

/// `end/abort` or `end/stop`: discards any staged events and `become`,
/// leaving the actor ready with its prior behavior/state untouched. Staged
/// Event cells are not explicitly freed here — once `txn` is cleared nothing
/// roots them, so the next mark-and-sweep reclaims them like any other
/// garbage (spec.md §9: "cycles are data-only and GC traces through them").
pub fn abort(heap: &mut Heap, actor: CellId) {
    heap.set_z(actor, Word::UNDEF);
}

/// Allocates a fresh, ready Actor cell (`new n` with no saved stack, or the
/// image loader's initial population).
pub fn alloc(heap: &mut Heap, behavior: Word, state: Word) -> Result<CellId, crate::error::Fault> {
    heap.alloc(
        Word::Const(ProcConst::Tag(Tag::Actor)),
        behavior,
        state,
        Word::UNDEF,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::EventQueue;
    use crate::word::ProcConst;

    fn mk_event(heap: &mut Heap, message: Word) -> CellId {
        heap.alloc(
            Word::Const(ProcConst::Tag(Tag::Event)),
            Word::UNDEF,
            message,
            Word::UNDEF,
        )
        .unwrap()
    }

    #[test]
    fn commit_flushes_events_in_production_order() {
        let mut heap = Heap::new(32);
        let actor = alloc(&mut heap, Word::UNDEF, Word::UNDEF).unwrap();
        begin(&mut heap, actor);
        assert!(is_busy(&heap, actor));

        let e1 = mk_event(&mut heap, Word::Fixnum(1));
        let e2 = mk_event(&mut heap, Word::Fixnum(2));
        stage_event(&mut heap, actor, e1);
        stage_event(&mut heap, actor, e2);

        let mut queue = EventQueue::new();
        commit(&mut heap, &mut queue, actor, Transaction::new());

        assert!(!is_busy(&heap, actor));
        assert_eq!(queue.pop_front(&heap), Some(e1));
        assert_eq!(queue.pop_front(&heap), Some(e2));
    }

    #[test]
    fn abort_leaves_behavior_state_untouched_and_no_events_flushed() {
        let mut heap = Heap::new(32);
        let actor = alloc(&mut heap, Word::Fixnum(100), Word::UNDEF).unwrap();
        begin(&mut heap, actor);
        let e1 = mk_event(&mut heap, Word::Fixnum(1));
        stage_event(&mut heap, actor, e1);

        let mut txn = Transaction::new();
        txn.stage_become(Word::Fixnum(200), Word::Fixnum(1));
        abort(&mut heap, actor);

        assert!(!is_busy(&heap, actor));
        assert_eq!(heap.cell(actor).x, Word::Fixnum(100));
        let mut queue = EventQueue::new();
        assert_eq!(queue.pop_front(&heap), None);
        drop(txn);
    }

    #[test]
    fn last_become_wins() {
        let mut txn = Transaction::new();
        txn.stage_become(Word::Fixnum(1), Word::UNDEF);
        txn.stage_become(Word::Fixnum(2), Word::UNDEF);
        assert_eq!(txn.pending_become(), Some((Word::Fixnum(2), Word::UNDEF)));
    }
}
