//! Symbol interning (spec.md §3: "Interned symbols are unique: two Symbol
//! cells with equal character-list payloads and equal hashes are the same
//! cell").
//!
//! spec.md §1 puts "CRC-32 symbol hashing" out of scope — any stable hash
//! over the character list is a faithful substitute, so this uses a plain
//! FNV-1a fold rather than reimplementing CRC-32. What *is* in scope is the
//! uniqueness contract: two `cvt`-to-symbol calls on char-lists with the same
//! content must return the same heap cell. The intern table itself lives
//! outside the heap (a `HashMap`, mirroring how [`crate::continuation`] keeps
//! the continuation queue as a plain `VecDeque` rather than forcing every
//! runtime-side collection into a cell), but every symbol cell it names is a
//! GC root: an interned symbol must survive collection even with no other
//! live reference to it, exactly like the teacher's `decommit` cache keeping
//! a deployed contract's bytecode hash pinned.

use std::collections::HashMap;

use ufork_interface::Tag;

use crate::{
    cell::{CellView, Heap},
    error::Fault,
    word::{CellId, ProcConst, Raw, Word},
};

/// FNV-1a over a char-list's Fixnum values, folded to the configured word
/// width. Used only as a bucket key; content equality is still checked
/// element-by-element on lookup.
fn hash_chars(heap: &Heap, mut chars: Word, limit: usize) -> Result<Raw, Fault> {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    let mut steps = 0;
    while let Word::Ptr(id) = chars {
        if steps > limit {
            return Err(Fault::SanityLimitExceeded {
                context: "symbol char-list walk",
            });
        }
        steps += 1;
        let CellView::Pair { car, cdr } = heap.cell(id).view() else {
            break;
        };
        if let Word::Fixnum(ch) = car {
            hash ^= ch as u64;
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        chars = cdr;
    }
    Ok(hash as Raw)
}

/// `true` iff two char-lists hold the same Fixnum sequence.
fn chars_equal(heap: &Heap, mut a: Word, mut b: Word, limit: usize) -> Result<bool, Fault> {
    let mut steps = 0;
    loop {
        if steps > limit {
            return Err(Fault::SanityLimitExceeded {
                context: "symbol char-list comparison",
            });
        }
        steps += 1;
        match (a, b) {
            (Word::Ptr(ia), Word::Ptr(ib)) => {
                let (CellView::Pair { car: ca, cdr: da }, CellView::Pair { car: cb, cdr: db }) =
                    (heap.cell(ia).view(), heap.cell(ib).view())
                else {
                    return Ok(a == b);
                };
                if ca != cb {
                    return Ok(false);
                }
                a = da;
                b = db;
            }
            _ => return Ok(a == b),
        }
    }
}

/// The process-wide intern table: every live Symbol cell, bucketed by hash.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    buckets: HashMap<Raw, Vec<CellId>>,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `chars` (a proper list of character Fixnums), returning the
    /// existing Symbol cell if one with equal content is already interned,
    /// or allocating and registering a fresh one otherwise.
    pub fn intern(&mut self, heap: &mut Heap, chars: Word) -> Result<CellId, Fault> {
        let limit = heap.stats().capacity.saturating_mul(2).max(1024);
        let hash = hash_chars(heap, chars, limit)?;
        if let Some(candidates) = self.buckets.get(&hash) {
            for &id in candidates {
                let CellView::Symbol { chars: existing, .. } = heap.cell(id).view() else {
                    panic!("interned id {id:?} is not a Symbol cell");
                };
                if chars_equal(heap, existing, chars, limit)? {
                    return Ok(id);
                }
            }
        }
        let id = heap.alloc(
            Word::Const(ProcConst::Tag(Tag::Symbol)),
            Word::Fixnum(hash),
            chars,
            Word::UNDEF,
        )?;
        self.buckets.entry(hash).or_default().push(id);
        Ok(id)
    }

    /// Every interned symbol cell: a GC root set (spec.md §4.2: "symbol-intern
    /// hash-chain heads").
    pub fn roots(&self) -> impl Iterator<Item = CellId> + '_ {
        self.buckets.values().flatten().copied()
    }

    /// Drops bucket entries for cells a sweep just reclaimed, so a future
    /// `intern` of the same spelling allocates fresh instead of handing back
    /// a (now-wrong) free cell id. Called by the runtime after a GC cycle.
    pub fn retain_live(&mut self, heap: &Heap) {
        for ids in self.buckets.values_mut() {
            ids.retain(|&id| !heap.is_free(id));
        }
        self.buckets.retain(|_, ids| !ids.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(heap: &mut Heap, s: &str) -> Word {
        let mut list = Word::NIL;
        for ch in s.chars().rev() {
            list = Word::from(heap.cons(Word::Fixnum(ch as Raw), list).unwrap());
        }
        list
    }

    #[test]
    fn equal_spellings_intern_to_the_same_cell() {
        let mut heap = Heap::new(64);
        let mut table = SymbolTable::new();
        let a = chars(&mut heap, "hello");
        let b = chars(&mut heap, "hello");
        let sym_a = table.intern(&mut heap, a).unwrap();
        let sym_b = table.intern(&mut heap, b).unwrap();
        assert_eq!(sym_a, sym_b);
    }

    #[test]
    fn different_spellings_intern_distinctly() {
        let mut heap = Heap::new(64);
        let mut table = SymbolTable::new();
        let a = chars(&mut heap, "hello");
        let b = chars(&mut heap, "world");
        assert_ne!(
            table.intern(&mut heap, a).unwrap(),
            table.intern(&mut heap, b).unwrap()
        );
    }
}
