//! Operand-stack primitives shared by every opcode handler (spec.md §4.4):
//! the stack is a Pair chain, so push/pop are just `cons`/un-`cons` plus a
//! cell free.

use crate::{
    cell::{CellView, Heap},
    error::Fault,
    word::Word,
};

/// `push(v)`: allocates `(v . sp)`, returns the new `sp`.
pub fn push(heap: &mut Heap, sp: Word, v: Word) -> Result<Word, Fault> {
    Ok(Word::from(heap.cons(v, sp)?))
}

/// `pop()`: returns `(top, new_sp)`. Underflow (sp not a Pair) yields
/// `(UNDEF, sp)` unchanged — spec.md §4.4/§7: "not an error".
pub fn pop(heap: &mut Heap, sp: Word) -> (Word, Word) {
    match sp {
        Word::Ptr(id) => {
            let CellView::Pair { car, cdr } = heap.cell(id).view() else {
                return (Word::UNDEF, sp);
            };
            heap.free(id);
            (car, cdr)
        }
        _ => (Word::UNDEF, sp),
    }
}

/// Pops `n` items, returning them top-first (`items[0]` was the top of
/// stack) along with the resulting `sp`.
pub fn pop_n(heap: &mut Heap, mut sp: Word, n: usize) -> (Vec<Word>, Word) {
    let mut items = Vec::with_capacity(n);
    for _ in 0..n {
        let (v, rest) = pop(heap, sp);
        items.push(v);
        sp = rest;
    }
    (items, sp)
}

/// Walks `n` cdrs from `list`, bounded by `limit` to catch a cyclic or
/// corrupt heap (spec.md §7: "sanity-counter exhaustion on a suspected
/// infinite list walk"). Returns the tail after `n` steps, or `UNDEF` if the
/// list is shorter than `n` (spec.md §7: "stack underflow is not an error";
/// the same leniency applies to short-list projections).
pub fn nth_tail(heap: &Heap, mut list: Word, n: usize, limit: usize) -> Result<Word, Fault> {
    for step in 0..n {
        if step > limit {
            return Err(Fault::SanityLimitExceeded {
                context: "list walk (nth/part)",
            });
        }
        match list {
            Word::Ptr(id) => {
                let CellView::Pair { cdr, .. } = heap.cell(id).view() else {
                    return Ok(Word::UNDEF);
                };
                list = cdr;
            }
            _ => return Ok(Word::UNDEF),
        }
    }
    Ok(list)
}

/// The car at the head of `list`, or `UNDEF` if it isn't a Pair.
pub fn car(heap: &Heap, list: Word) -> Word {
    match list {
        Word::Ptr(id) => match heap.cell(id).view() {
            CellView::Pair { car, .. } => car,
            _ => Word::UNDEF,
        },
        _ => Word::UNDEF,
    }
}

/// A generous bound on how many cells any single list walk may visit before
/// it's treated as a corrupt/cyclic heap (spec.md §7).
pub fn sanity_limit(heap: &Heap) -> usize {
    heap.stats().capacity.saturating_mul(2).max(1024)
}

/// Counts the items on `sp`'s Pair chain (`depth`, spec.md §4.4).
pub fn depth(heap: &Heap, sp: Word) -> Result<i64, Fault> {
    let limit = sanity_limit(heap);
    let mut n: i64 = 0;
    let mut cursor = sp;
    while let Word::Ptr(id) = cursor {
        if n as usize > limit {
            return Err(Fault::SanityLimitExceeded { context: "stack depth walk" });
        }
        let CellView::Pair { cdr, .. } = heap.cell(id).view() else {
            break;
        };
        n += 1;
        cursor = cdr;
    }
    Ok(n)
}
