//! A hand-assembled demo image (spec.md §6): no assembler exists in this
//! workspace (producing an image is explicitly out of scope, spec.md §1), so
//! this lays out cells by hand at the indices the loader expects.
//!
//! The demo actor reads the console byte-by-byte, echoes each non-EOF
//! character, and re-sends itself a wake-up event to keep looping — a small
//! but real exercise of `getc`/`putc`/`cmp`/`if`/`self`/`send`/`end`.

use ufork::image::{Image, ImageCell};
use ufork::word::{CellId, ProcConst, Word};
use ufork_interface::{EndKind, Opcode, Relation, Tag};

fn instr(op: Opcode, imm: Word, next_ip: Word) -> ImageCell {
    ImageCell::new(Word::Const(ProcConst::Opcode(op)), imm, next_ip, Word::UNDEF)
}

/// Builds the echo-reader demo image. Cell indices below 5 are the reserved
/// constants (their content doesn't matter to the loader); index 5 is the
/// seed Event the loader hands to the queue.
#[must_use]
pub fn echo_reader() -> Image {
    let mut image = Image::new();
    for _ in 0..CellId::FIRST_ALLOCATABLE.as_u32() {
        image.push(ImageCell::new(Word::UNDEF, Word::UNDEF, Word::UNDEF, Word::UNDEF));
    }

    // Forward references below are resolved by hand: each cell's index is
    // `image.cells.len()` at the moment just before it's pushed, so later
    // cells can be addressed before they exist.
    let actor = CellId::from_u32_unchecked(6);
    let getc = CellId::from_u32_unchecked(7);
    let dup = CellId::from_u32_unchecked(8);
    let push_zero = CellId::from_u32_unchecked(9);
    let cmp_lt = CellId::from_u32_unchecked(10);
    let branch = CellId::from_u32_unchecked(11);
    let putc = CellId::from_u32_unchecked(12);
    let push_msg = CellId::from_u32_unchecked(13);
    let self_ref = CellId::from_u32_unchecked(14);
    let send = CellId::from_u32_unchecked(15);
    let loop_end = CellId::from_u32_unchecked(16);
    let stop_end = CellId::from_u32_unchecked(17);

    image.push(ImageCell::new(
        Word::Const(ProcConst::Tag(Tag::Event)),
        Word::from(actor),
        Word::UNDEF,
        Word::NIL,
    )); // 5: seed Event
    image.push(ImageCell::new(
        Word::Const(ProcConst::Tag(Tag::Actor)),
        Word::from(getc),
        Word::UNDEF,
        Word::UNDEF,
    )); // 6: actor
    image.push(instr(Opcode::Getc, Word::UNDEF, Word::from(dup))); // 7
    image.push(instr(Opcode::Dup, Word::Fixnum(1), Word::from(push_zero))); // 8
    image.push(instr(Opcode::Push, Word::Fixnum(0), Word::from(cmp_lt))); // 9
    image.push(instr(
        Opcode::Cmp,
        Word::Const(ProcConst::Cmp(Relation::Lt)),
        Word::from(branch),
    )); // 10
    image.push(instr(Opcode::If, Word::from(stop_end), Word::from(putc))); // 11
    image.push(instr(Opcode::Putc, Word::UNDEF, Word::from(push_msg))); // 12
    image.push(instr(Opcode::Push, Word::UNDEF, Word::from(self_ref))); // 13
    image.push(instr(Opcode::SelfRef, Word::UNDEF, Word::from(send))); // 14
    image.push(instr(Opcode::Send, Word::Fixnum(0), Word::from(loop_end))); // 15
    image.push(instr(
        Opcode::End,
        Word::Const(ProcConst::End(EndKind::Commit)),
        Word::UNDEF,
    )); // 16: loop tail, re-enters via the self-send above
    image.push(instr(
        Opcode::End,
        Word::Const(ProcConst::End(EndKind::Commit)),
        Word::UNDEF,
    )); // 17: EOF, no resend

    image
}
