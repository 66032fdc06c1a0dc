//! The global event queue: an intrusive singly-linked FIFO threaded through
//! each Event cell's own `z` field (spec.md §4.6).
//!
//! Unlike the continuation queue (see [`crate::continuation`], kept as a
//! plain Rust `VecDeque` — see `DESIGN.md`'s Open Question on why), the event
//! queue is genuinely intrusive: queued-ness is a property of the cell
//! itself, not of some separate collection, mirroring the way the teacher's
//! own `RollbackableLog` stores a flat sequence rather than boxing each
//! entry.

use crate::{
    cell::{CellView, Heap},
    word::{CellId, Word},
};

/// Head/tail pointers into the Event cells making up the global FIFO.
/// `NIL` in the tail cell's `z` field sentinels the end of the chain
/// (spec.md §4.6: "NIL sentinels the tail").
#[derive(Debug, Clone, Copy, Default)]
pub struct EventQueue {
    head: Option<CellId>,
    tail: Option<CellId>,
}

impl EventQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Appends an already-allocated Event cell to the tail. The cell's own
    /// `z` field is rewritten to `NIL` (it becomes the new tail).
    pub fn push_back(&mut self, heap: &mut Heap, event: CellId) {
        heap.set_z(event, Word::NIL);
        match self.tail {
            Some(tail) => heap.set_z(tail, Word::from(event)),
            None => self.head = Some(event),
        }
        self.tail = Some(event);
    }

    /// Pops the head Event cell, if any. The cell itself is left allocated —
    /// callers decide when to free it (the dispatcher frees it once the
    /// continuation it spawned terminates; spec.md §4.7 step 3).
    pub fn pop_front(&mut self, heap: &Heap) -> Option<CellId> {
        let head = self.head?;
        let CellView::Event { next, .. } = heap.cell(head).view() else {
            panic!("event queue head {head:?} is not an Event cell");
        };
        self.head = next.ptr();
        if self.head.is_none() {
            self.tail = None;
        }
        Some(head)
    }

    /// Every root the GC must trace through to keep the queue's contents —
    /// and transitively, their message payloads and target actors — alive.
    pub fn roots(&self) -> impl Iterator<Item = CellId> {
        self.head.into_iter()
    }
}
