//! The cell heap: a fixed-capacity array of 4-field cells, a free-list
//! allocator, and the typed accessors built on top (spec.md §4.1).

use ufork_interface::{Opcode, Tag};

use crate::{
    error::Fault,
    word::{CellId, ProcConst, Raw, Word},
};

/// A single heap entry: four tagged machine words (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub t: Word,
    pub x: Word,
    pub y: Word,
    pub z: Word,
}

impl Cell {
    const fn new(t: Word, x: Word, y: Word, z: Word) -> Self {
        Self { t, x, y, z }
    }

    fn free(next: Word) -> Self {
        Self::new(
            Word::Const(ProcConst::Tag(Tag::Free)),
            Word::UNDEF,
            Word::UNDEF,
            next,
        )
    }
}

/// An ergonomic, match-friendly view of a cell's contents, derived from its
/// raw [`Cell`] fields. Design Notes §9 calls for a tagged enum at the
/// seams where code actually branches on kind; [`Cell`] stays a uniform
/// four-field record (so GC and the allocator need no per-kind code), and
/// [`CellView`] is what instruction handlers pattern-match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellView {
    Boolean(bool),
    Null,
    Undef,
    Unit,
    Pair { car: Word, cdr: Word },
    Symbol { hash: Raw, chars: Word, binding: Word },
    Actor { behavior: Word, state: Word, txn: Word },
    Event { target: Word, message: Word, next: Word },
    Free { next: Word },
    Instr { op: Opcode, imm: Word, next_ip: Word },
}

impl Cell {
    /// Decodes this cell's `t` field into a matchable view of its contents.
    ///
    /// # Panics
    ///
    /// Panics if `t` is not a valid [`ProcConst`] — this indicates heap
    /// corruption, not a recoverable program error.
    #[must_use]
    pub fn view(&self) -> CellView {
        let Word::Const(c) = self.t else {
            panic!("cell has non-constant type tag {:?}", self.t);
        };
        match c {
            ProcConst::Tag(Tag::Boolean) => CellView::Boolean(self.x.fixnum() == Some(1)),
            ProcConst::Tag(Tag::Null) => CellView::Null,
            ProcConst::Tag(Tag::Undef) => CellView::Undef,
            ProcConst::Tag(Tag::Unit) => CellView::Unit,
            ProcConst::Tag(Tag::Pair) => CellView::Pair { car: self.x, cdr: self.y },
            ProcConst::Tag(Tag::Symbol) => CellView::Symbol {
                hash: self.x.fixnum().unwrap_or(0),
                chars: self.y,
                binding: self.z,
            },
            ProcConst::Tag(Tag::Actor) => CellView::Actor {
                behavior: self.x,
                state: self.y,
                txn: self.z,
            },
            ProcConst::Tag(Tag::Event) => CellView::Event {
                target: self.x,
                message: self.y,
                next: self.z,
            },
            ProcConst::Tag(Tag::Free) => CellView::Free { next: self.z },
            ProcConst::Tag(Tag::Fixnum) => {
                panic!("Tag::Fixnum is a synthetic typeq target, never a real cell tag")
            }
            ProcConst::Opcode(op) => CellView::Instr {
                op,
                imm: self.x,
                next_ip: self.y,
            },
        }
    }

    /// The cell's [`Tag`], or `None` for an instruction cell (which has an
    /// [`Opcode`] instead).
    #[must_use]
    pub fn tag(&self) -> Option<Tag> {
        match self.t {
            Word::Const(ProcConst::Tag(tag)) => Some(tag),
            _ => None,
        }
    }
}

/// Read-only summary of heap occupancy, used by tests and `ufork-cli`'s
/// `--trace` output (spec.md §8's GC round-trip property reads these).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
    pub capacity: usize,
    pub frontier: usize,
    pub free_count: usize,
}

impl HeapStats {
    /// Number of cells currently holding live (non-free) data.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.frontier - CellId::FIRST_ALLOCATABLE.as_usize() - self.free_count
    }
}

/// The fixed-capacity cell array plus its free-list allocator.
#[derive(Debug, Clone)]
pub struct Heap {
    cells: Vec<Cell>,
    capacity: usize,
    frontier: usize,
    free_head: Option<CellId>,
    free_count: usize,
}

impl Heap {
    /// Creates a heap with room for `capacity` cells, with indices `0..=4`
    /// pre-populated with the reserved constants (spec.md §4.1).
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is too small to hold the five reserved constants.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity >= CellId::FIRST_ALLOCATABLE.as_usize(),
            "heap capacity must be at least {}",
            CellId::FIRST_ALLOCATABLE.as_usize()
        );
        let boolean = |b: bool| {
            Cell::new(
                Word::Const(ProcConst::Tag(Tag::Boolean)),
                Word::Fixnum(Raw::from(b)),
                Word::UNDEF,
                Word::UNDEF,
            )
        };
        let mut cells = Vec::with_capacity(capacity);
        cells.push(boolean(false));
        cells.push(boolean(true));
        cells.push(Cell::new(
            Word::Const(ProcConst::Tag(Tag::Null)),
            Word::UNDEF,
            Word::UNDEF,
            Word::UNDEF,
        ));
        cells.push(Cell::new(
            Word::Const(ProcConst::Tag(Tag::Undef)),
            Word::UNDEF,
            Word::UNDEF,
            Word::UNDEF,
        ));
        cells.push(Cell::new(
            Word::Const(ProcConst::Tag(Tag::Unit)),
            Word::UNDEF,
            Word::UNDEF,
            Word::UNDEF,
        ));

        Self {
            cells,
            capacity,
            frontier: CellId::FIRST_ALLOCATABLE.as_usize(),
            free_head: None,
            free_count: 0,
        }
    }

    /// Allocates a new cell, reusing a free-list entry (LIFO, spec.md §8)
    /// before bumping the frontier.
    pub fn alloc(&mut self, t: Word, x: Word, y: Word, z: Word) -> Result<CellId, Fault> {
        if let Some(id) = self.free_head {
            let next = self.cells[id.as_usize()].view();
            let CellView::Free { next } = next else {
                panic!("free-list head {id:?} is not a Free cell");
            };
            self.free_head = next.ptr();
            self.free_count -= 1;
            self.cells[id.as_usize()] = Cell::new(t, x, y, z);
            return Ok(id);
        }

        if self.frontier >= self.capacity {
            return Err(Fault::OutOfMemory);
        }
        let id = CellId::from_u32_unchecked(self.frontier as u32);
        self.frontier += 1;
        self.cells.push(Cell::new(t, x, y, z));
        Ok(id)
    }

    /// Reclaims `id` onto the free-list head.
    ///
    /// # Panics
    ///
    /// Panics (spec.md §4.1: "Double-free is a fatal assertion") if `id` is
    /// a reserved constant or is already Free.
    pub fn free(&mut self, id: CellId) {
        assert!(
            id.as_u32() >= CellId::FIRST_ALLOCATABLE.as_u32(),
            "attempted to free reserved cell {id:?}"
        );
        assert!(
            self.cells[id.as_usize()].tag() != Some(Tag::Free),
            "double free of cell {id:?}"
        );
        // `Word::Fixnum(0)` (not `Word::NIL`!) marks the free-list's end: `NIL`
        // is `Word::Ptr(CellId::NIL)`, a valid pointer to the reserved Null
        // cell, so using it here would make `alloc` mistake list-end for
        // "next free cell is the Null cell" and corrupt the next allocation.
        let next = self
            .free_head
            .map_or(Word::Fixnum(0), |head| Word::Ptr(head));
        self.cells[id.as_usize()] = Cell::free(next);
        self.free_head = Some(id);
        self.free_count += 1;
    }

    /// Reads a cell's contents.
    #[must_use]
    pub fn cell(&self, id: CellId) -> Cell {
        self.cells[id.as_usize()]
    }

    pub fn set_t(&mut self, id: CellId, v: Word) {
        self.cells[id.as_usize()].t = v;
    }
    pub fn set_x(&mut self, id: CellId, v: Word) {
        self.cells[id.as_usize()].x = v;
    }
    pub fn set_y(&mut self, id: CellId, v: Word) {
        self.cells[id.as_usize()].y = v;
    }
    pub fn set_z(&mut self, id: CellId, v: Word) {
        self.cells[id.as_usize()].z = v;
    }

    /// Allocates a cons cell.
    pub fn cons(&mut self, car: Word, cdr: Word) -> Result<CellId, Fault> {
        self.alloc(Word::Const(ProcConst::Tag(Tag::Pair)), car, cdr, Word::UNDEF)
    }

    /// `0..frontier`, for GC sweep and debugging.
    pub(crate) fn indices(&self) -> impl Iterator<Item = CellId> {
        (CellId::FIRST_ALLOCATABLE.as_u32()..self.frontier as u32).map(CellId::from_u32_unchecked)
    }

    #[must_use]
    pub fn stats(&self) -> HeapStats {
        HeapStats {
            capacity: self.capacity,
            frontier: self.frontier,
            free_count: self.free_count,
        }
    }

    #[must_use]
    pub(crate) fn is_free(&self, id: CellId) -> bool {
        self.cells[id.as_usize()].tag() == Some(Tag::Free)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_constants_have_expected_views() {
        let heap = Heap::new(16);
        assert_eq!(heap.cell(CellId::FALSE).view(), CellView::Boolean(false));
        assert_eq!(heap.cell(CellId::TRUE).view(), CellView::Boolean(true));
        assert_eq!(heap.cell(CellId::NIL).view(), CellView::Null);
        assert_eq!(heap.cell(CellId::UNDEF).view(), CellView::Undef);
        assert_eq!(heap.cell(CellId::UNIT).view(), CellView::Unit);
    }

    #[test]
    fn alloc_bumps_frontier_then_reuses_free_list_lifo() {
        let mut heap = Heap::new(16);
        let a = heap.cons(Word::Fixnum(1), Word::NIL).unwrap();
        let b = heap.cons(Word::Fixnum(2), Word::NIL).unwrap();
        assert_eq!(heap.stats().frontier, 7);

        heap.free(a);
        heap.free(b);
        // LIFO: b was freed last, so it comes back first.
        let c = heap.cons(Word::Fixnum(3), Word::NIL).unwrap();
        assert_eq!(c, b);
        let d = heap.cons(Word::Fixnum(4), Word::NIL).unwrap();
        assert_eq!(d, a);
        assert_eq!(heap.stats().frontier, 7);
    }

    #[test]
    fn out_of_memory_when_capacity_exhausted() {
        let mut heap = Heap::new(CellId::FIRST_ALLOCATABLE.as_usize() + 1);
        heap.cons(Word::Fixnum(1), Word::NIL).unwrap();
        assert_eq!(heap.cons(Word::Fixnum(2), Word::NIL), Err(Fault::OutOfMemory));
    }

    #[test]
    #[should_panic(expected = "double free")]
    fn double_free_panics() {
        let mut heap = Heap::new(16);
        let a = heap.cons(Word::Fixnum(1), Word::NIL).unwrap();
        heap.free(a);
        heap.free(a);
    }

    #[test]
    fn live_count_reflects_frees() {
        let mut heap = Heap::new(16);
        let a = heap.cons(Word::Fixnum(1), Word::NIL).unwrap();
        let _b = heap.cons(Word::Fixnum(2), Word::NIL).unwrap();
        assert_eq!(heap.stats().live_count(), 2);
        heap.free(a);
        assert_eq!(heap.stats().live_count(), 1);
    }
}
