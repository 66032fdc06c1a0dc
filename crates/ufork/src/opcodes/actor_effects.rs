//! `send`, `new`, `beh` (spec.md §4.3/§4.5): the opcodes that reach outside
//! the running thread's own stack to stage an outbound event or restage the
//! current actor's behavior/state.

use super::{common, ExecCtx};
use crate::{actor, continuation::Continuation, error::Fault, word::Word};

fn self_actor(ctx: &ExecCtx<'_>, cont: &Continuation) -> crate::word::CellId {
    let crate::cell::CellView::Event { target, .. } = ctx.heap.cell(cont.ep).view() else {
        panic!("continuation ep {:?} is not an Event cell", cont.ep);
    };
    target.ptr().expect("an Event's target is always an Actor pointer")
}

/// Pops `n` items and builds a proper `n`-long list terminated by `NIL`
/// (top-first: the most recently pushed item becomes the list's head).
fn build_list(ctx: &mut ExecCtx<'_>, sp: Word, n: usize) -> Result<(Word, Word), Fault> {
    let (items, sp) = common::pop_n(ctx.heap, sp, n);
    let mut list = Word::NIL;
    for v in items.into_iter().rev() {
        list = Word::from(ctx.heap.cons(v, list)?);
    }
    Ok((list, sp))
}

/// `send n`: stages an outbound Event on the current transaction. Not
/// committed to the global queue until `end/commit` or `end/release`
/// (spec.md §4.3).
pub(super) fn send_n(
    ctx: &mut ExecCtx<'_>,
    cont: &mut Continuation,
    imm: Word,
    next_ip: Word,
) -> Result<(), Fault> {
    let n = imm.fixnum().unwrap_or(0).max(0) as usize;
    let (target, sp) = common::pop(ctx.heap, cont.sp);
    let (message, sp) = if n == 0 {
        common::pop(ctx.heap, sp)
    } else {
        build_list(ctx, sp, n)?
    };
    cont.sp = sp;

    let event = ctx.heap.alloc(
        Word::Const(crate::word::ProcConst::Tag(ufork_interface::Tag::Event)),
        target,
        message,
        Word::UNDEF,
    )?;
    let self_id = self_actor(ctx, cont);
    actor::stage_event(ctx.heap, self_id, event);
    let _ = next_ip;
    Ok(())
}

/// `new n`: allocates a fresh, ready Actor cell from a popped behavior and
/// (for `n > 0`) a detached slice of the current operand stack used as its
/// saved state. Open Question (spec.md §9) resolved: the `n` items are
/// fully removed from the caller's stack, not merely copied — see
/// `DESIGN.md`.
pub(super) fn new_n(
    ctx: &mut ExecCtx<'_>,
    cont: &mut Continuation,
    imm: Word,
    next_ip: Word,
) -> Result<Word, Fault> {
    let n = imm.fixnum().unwrap_or(0).max(0) as usize;
    let (behavior, sp) = common::pop(ctx.heap, cont.sp);
    let (state, sp) = if n == 0 {
        (Word::UNDEF, sp)
    } else {
        build_list(ctx, sp, n)?
    };
    cont.sp = sp;
    let actor_id = actor::alloc(ctx.heap, behavior, state)?;
    cont.sp = common::push(ctx.heap, cont.sp, Word::from(actor_id))?;
    Ok(next_ip)
}

/// `beh n`: like `new`, but restages the *current* actor's behavior (and,
/// for `n > 0`, state) instead of creating a new one. Takes effect only on
/// commit/release (spec.md §4.3); staged here as a [`crate::actor::Transaction`]
/// update on the running continuation.
pub(super) fn beh_n(
    ctx: &mut ExecCtx<'_>,
    cont: &mut Continuation,
    imm: Word,
    next_ip: Word,
) -> Result<Word, Fault> {
    let n = imm.fixnum().unwrap_or(0).max(0) as usize;
    let (behavior, sp) = common::pop(ctx.heap, cont.sp);
    let self_id = self_actor(ctx, cont);
    let (state, sp) = if n == 0 {
        (ctx.heap.cell(self_id).y, sp)
    } else {
        build_list(ctx, sp, n)?
    };
    cont.sp = sp;
    cont.txn.stage_become(behavior, state);
    Ok(next_ip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cell::Heap, console::BufferConsole, symbol::SymbolTable, word::CellId};
    use ufork_interface::StderrSink;

    fn ctx<'a>(
        heap: &'a mut Heap,
        symtab: &'a mut SymbolTable,
        console: &'a mut BufferConsole,
        debug: &'a mut StderrSink,
    ) -> ExecCtx<'a> {
        ExecCtx { heap, symtab, console, debug }
    }

    #[test]
    fn new_with_saved_state_empties_source_stack() {
        let mut heap = Heap::new(64);
        let actor0 = actor::alloc(&mut heap, Word::UNDEF, Word::UNDEF).unwrap();
        let event = heap
            .alloc(
                Word::Const(crate::word::ProcConst::Tag(ufork_interface::Tag::Event)),
                Word::from(actor0),
                Word::NIL,
                Word::UNDEF,
            )
            .unwrap();
        let mut symtab = SymbolTable::new();
        let mut console = BufferConsole::new();
        let mut debug = StderrSink;
        let mut cont = Continuation::new(Word::UNDEF, Word::NIL, event);
        cont.sp = common::push(&mut heap, cont.sp, Word::Fixnum(10)).unwrap();
        cont.sp = common::push(&mut heap, cont.sp, Word::Fixnum(99)).unwrap();
        cont.sp = common::push(&mut heap, cont.sp, Word::Fixnum(20)).unwrap();

        let mut c = ctx(&mut heap, &mut symtab, &mut console, &mut debug);
        // behavior (20) then n=2 saved-state items (99, 10).
        new_n(&mut c, &mut cont, Word::Fixnum(2), Word::UNDEF).unwrap();

        // The only thing left on the stack is the freshly pushed Actor cell:
        // all 3 source items were consumed, not merely copied.
        let (pushed, rest) = common::pop(&mut heap, cont.sp);
        assert!(matches!(pushed, Word::Ptr(_)));
        assert_eq!(rest, Word::NIL);
    }
}
