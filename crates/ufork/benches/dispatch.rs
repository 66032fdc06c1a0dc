//! Steady-state throughput of the runtime loop (spec.md §4.7): one actor
//! runs a fixed-length instruction chain to completion, rebuilt fresh each
//! iteration the way the teacher's own `nested_near_call` bench rebuilds a
//! `VirtualMachine` per closure call rather than reusing mutable state across
//! samples.

use divan::{black_box, Bencher};

use ufork::clock::ManualClock;
use ufork::console::BufferConsole;
use ufork::image::{Image, ImageCell};
use ufork::word::{CellId, ProcConst, Raw, Word};
use ufork::{Runtime, Settings};
use ufork_interface::{EndKind, Opcode, StderrSink, Tag};

const CHAIN_LEN: u32 = 100;

fn instr(op: Opcode, imm: Word, next_ip: Word) -> ImageCell {
    ImageCell::new(Word::Const(ProcConst::Opcode(op)), imm, next_ip, Word::UNDEF)
}

/// One actor whose behavior pushes `CHAIN_LEN` Fixnums, drops them all, then
/// commits — a cheap proxy for the dispatch/execute overhead of a thread
/// running `CHAIN_LEN + 2` instructions start to finish.
fn build_image() -> Image {
    let mut image = Image::new();
    for _ in 0..CellId::FIRST_ALLOCATABLE.as_u32() {
        image.push(ImageCell::new(Word::UNDEF, Word::UNDEF, Word::UNDEF, Word::UNDEF));
    }

    let actor = CellId::from_u32_unchecked(6);
    image.push(ImageCell::new(
        Word::Const(ProcConst::Tag(Tag::Event)),
        Word::from(actor),
        Word::UNDEF,
        Word::NIL,
    ));
    let behavior = CellId::from_u32_unchecked(7);
    image.push(ImageCell::new(
        Word::Const(ProcConst::Tag(Tag::Actor)),
        Word::from(behavior),
        Word::UNDEF,
        Word::UNDEF,
    ));

    for i in 0..CHAIN_LEN {
        let this_ip = 7 + i;
        let next_ip = this_ip + 1;
        image.push(instr(
            Opcode::Push,
            Word::Fixnum(1),
            Word::from(CellId::from_u32_unchecked(next_ip)),
        ));
    }
    let drop_ip = 7 + CHAIN_LEN;
    let end_ip = drop_ip + 1;
    image.push(instr(
        Opcode::Drop,
        Word::Fixnum(CHAIN_LEN as Raw),
        Word::from(CellId::from_u32_unchecked(end_ip)),
    ));
    image.push(instr(
        Opcode::End,
        Word::Const(ProcConst::End(EndKind::Commit)),
        Word::UNDEF,
    ));

    image
}

#[divan::bench]
fn thread_to_completion(bencher: Bencher) {
    let image = build_image();

    bencher.bench(|| {
        let mut runtime = Runtime::new(
            black_box(&image),
            Settings::default(),
            Box::new(BufferConsole::new()),
            Box::new(StderrSink),
            Box::new(ManualClock::new()),
        )
        .unwrap();
        runtime.run_until_idle(CHAIN_LEN as usize + 8).unwrap();
        black_box(runtime.heap_stats());
    });
}

fn main() {
    divan::main();
}
