//! Mark-and-sweep collection over the [`Heap`] (spec.md §4.2).
//!
//! The algorithm follows the textbook shape the retrieval pack's Scheme
//! implementation documents at length in its own `heap` module: start from an
//! explicit root set, mark everything transitively reachable from it, then
//! sweep every allocated cell that didn't get marked back onto the free list.
//! [`Bitset`] plays the role the teacher's own fixed-size bitset plays for
//! per-slot collector bookkeeping, generalized to the heap's runtime capacity
//! since (unlike the teacher's 16-bit stack slots) cell counts aren't a
//! compile-time constant here.

use crate::{
    cell::{CellView, Heap},
    error::Fault,
    word::{CellId, Word},
};

/// A growable bitset indexed by [`CellId`], used to track which cells are
/// marked during a collection.
#[derive(Debug, Clone)]
struct Bitset {
    words: Vec<u64>,
}

impl Bitset {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(64)],
        }
    }

    fn get(&self, id: CellId) -> bool {
        let i = id.as_u32() as usize;
        self.words[i / 64] & (1 << (i % 64)) != 0
    }

    fn set(&mut self, id: CellId) {
        let i = id.as_u32() as usize;
        self.words[i / 64] |= 1 << (i % 64);
    }
}

/// What a collection reclaimed, reported back for diagnostics and tests
/// (spec.md §8: "GC round-trip — after a collection, every still-reachable
/// value reads identically").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcStats {
    pub marked: usize,
    pub swept: usize,
}

/// Runs one full mark-and-sweep cycle. `roots` yields every cell directly
/// reachable from outside the heap: continuation registers (`ip`/`ep`'s
/// pointee fields), the event and continuation queues, and the symbol
/// table's bindings.
pub fn collect(heap: &mut Heap, roots: impl IntoIterator<Item = CellId>) -> Result<GcStats, Fault> {
    let mut marked = Bitset::with_capacity(heap.stats().frontier);
    let mut worklist: Vec<CellId> = roots.into_iter().collect();

    let mut mark_count = 0;
    // Sanity-counter guard against a corrupt heap forming a worklist cycle
    // that never drains (spec.md §7: sanity-counter exhaustion on a
    // suspected infinite walk).
    let limit = heap.stats().capacity.saturating_mul(4).max(1024);

    while let Some(id) = worklist.pop() {
        if heap.is_free(id) || marked.get(id) {
            continue;
        }
        marked.set(id);
        mark_count += 1;
        if mark_count > limit {
            return Err(Fault::SanityLimitExceeded {
                context: "gc mark phase",
            });
        }
        push_children(heap.cell(id).view(), &mut worklist);
    }

    let mut swept = 0;
    for id in heap.indices().collect::<Vec<_>>() {
        if heap.is_free(id) || marked.get(id) {
            continue;
        }
        heap.free(id);
        swept += 1;
    }

    Ok(GcStats {
        marked: mark_count,
        swept,
    })
}

/// Pushes every `Word::Ptr` a cell's fields hold onto the mark worklist.
/// Reserved constants (`FALSE`/`TRUE`/`NIL`/`UNDEF`/`UNIT`) are always
/// trivially "marked" by virtue of never entering the allocatable range, so
/// pushing them is harmless; `collect` skips them via `is_free`'s bounds.
fn push_children(view: CellView, worklist: &mut Vec<CellId>) {
    let mut push = |w: Word| {
        if let Word::Ptr(id) = w {
            if id.as_u32() >= CellId::FIRST_ALLOCATABLE.as_u32() {
                worklist.push(id);
            }
        }
    };
    match view {
        CellView::Boolean(_) | CellView::Null | CellView::Undef | CellView::Unit => {}
        CellView::Pair { car, cdr } => {
            push(car);
            push(cdr);
        }
        CellView::Symbol { chars, binding, .. } => {
            push(chars);
            push(binding);
        }
        CellView::Actor {
            behavior,
            state,
            txn,
        } => {
            push(behavior);
            push(state);
            push(txn);
        }
        CellView::Event {
            target,
            message,
            next,
        } => {
            push(target);
            push(message);
            push(next);
        }
        CellView::Free { next } => push(next),
        CellView::Instr { imm, next_ip, .. } => {
            push(imm);
            push(next_ip);
        }
    }
}
