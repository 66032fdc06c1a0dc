//! A live VM thread: `(ip, sp, ep)` (spec.md §4.4), and the FIFO of them the
//! runtime round-robins over (spec.md §4.6/§4.7).
//!
//! spec.md §4.6 calls both queues "intrusive singly-linked FIFOs", and the
//! event queue genuinely is one (see [`crate::queue`]). The continuation
//! queue is kept as a plain `VecDeque` instead — see `DESIGN.md`'s Open
//! Question entry for why a literal per-cell `z`-as-next-pointer encoding
//! doesn't fit the continuation's three fields without breaking the
//! "`t` is always a type/opcode discriminant" invariant every other cell
//! relies on. This mirrors the teacher's own `Callframe`: a plain Rust
//! struct for a live thread's register file, not a GC-managed heap value.

use std::collections::VecDeque;

use crate::{actor::Transaction, word::{CellId, Word}};

/// One live thread: the instruction to execute next, the top of its operand
/// stack, and the event it is handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Continuation {
    /// Points at the next instruction cell to execute, or holds a terminal
    /// marker (spec.md §4.5) once the thread has died.
    pub ip: Word,
    /// Top of the operand stack (a Pair chain), or `UNDEF` when empty.
    pub sp: Word,
    /// The event this thread is handling; reachable from it are the current
    /// actor (`self`) and the message (`msg`).
    pub ep: CellId,
    /// The out-of-heap half of this thread's in-flight transaction (a
    /// staged `become`); see [`crate::actor::Transaction`]. Staged events
    /// themselves live in the heap, threaded through the actor's own `txn`
    /// field (spec.md §4.3), so they don't need a seat here.
    pub txn: Transaction,
}

impl Continuation {
    #[must_use]
    pub fn new(ip: Word, sp: Word, ep: CellId) -> Self {
        Self {
            ip,
            sp,
            ep,
            txn: Transaction::new(),
        }
    }

    /// `true` once `ip` no longer names a live instruction — i.e. the
    /// handler returned a terminal marker (spec.md §4.5's "Returning a
    /// next-ip that is not a heap instruction index ... tells the runtime
    /// the thread has died").
    #[must_use]
    pub fn is_dead(&self) -> bool {
        !matches!(self.ip, Word::Ptr(_))
    }
}

/// Round-robin FIFO of live threads (spec.md §2 component D).
#[derive(Debug, Clone, Default)]
pub struct ContinuationQueue {
    threads: VecDeque<Continuation>,
}

impl ContinuationQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    pub fn push_back(&mut self, thread: Continuation) {
        self.threads.push_back(thread);
    }

    pub fn pop_front(&mut self) -> Option<Continuation> {
        self.threads.pop_front()
    }

    /// Every event each live thread is handling — a GC root (spec.md §4.2:
    /// "the continuation-queue head", generalized here to every queued
    /// thread since the queue isn't itself heap-resident).
    pub fn event_roots(&self) -> impl Iterator<Item = CellId> + '_ {
        self.threads.iter().map(|c| c.ep)
    }

    /// Every stack cell each live thread owns — also a GC root, since a
    /// thread's operand stack is a Pair chain the thread exclusively owns
    /// until it terminates (spec.md §5: "A continuation exclusively owns its
    /// operand-stack cells").
    pub fn stack_roots(&self) -> impl Iterator<Item = CellId> + '_ {
        self.threads.iter().filter_map(|c| c.sp.ptr())
    }

    /// The instruction cell each paused thread will resume at — also a GC
    /// root. spec.md §9 allows `set` to patch an instruction cell's own
    /// fields at runtime; a thread paused mid-behavior can have its `ip`
    /// pointing at a cell no other root currently reaches (e.g. a later
    /// instruction in the same chain that a sibling thread hasn't re-linked
    /// yet), so it must be rooted directly rather than assumed reachable
    /// through the behavior entry point.
    pub fn ip_roots(&self) -> impl Iterator<Item = CellId> + '_ {
        self.threads.iter().filter_map(|c| c.ip.ptr())
    }
}
