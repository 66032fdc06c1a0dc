//! VM instruction dispatch (spec.md §4.5): one function per opcode family,
//! fanned out from [`execute`] the way the teacher's `instruction_handlers`
//! directory splits binops, heap access, and control flow into their own
//! modules.
//!
//! Every handler takes the instruction cell's decoded `imm` (the `x` field)
//! and `next_ip` (the `y` field) and returns the next instruction to run.
//! Since almost every opcode pushes something (a cons cell allocation), each
//! handler returns `Result<Word, Fault>` uniformly rather than distinguishing
//! the rare non-allocating ones. The terminal-marker bookkeeping (spec.md
//! §4.5: "Returning a next-ip that is not a heap instruction index ... tells
//! the runtime the thread has died") and the actual commit/release/abort
//! side effects on the event queue are left to [`crate::vm::Runtime::step`],
//! which alone holds the queue.

pub(crate) mod actor_effects;
pub(crate) mod common;
pub(crate) mod control;
pub(crate) mod data;
pub(crate) mod io;
pub(crate) mod stack;

use ufork_interface::{DebugSink, EndKind, Opcode};

use crate::{
    cell::{CellView, Heap},
    console::Console,
    continuation::Continuation,
    error::Fault,
    symbol::SymbolTable,
    word::Word,
};

/// What an instruction handler wants the runtime to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Effect {
    /// Resume at this instruction next.
    Continue(Word),
    /// `end k`: terminate the current thread.
    End(EndKind),
}

/// Everything an opcode handler needs besides the running [`Continuation`]
/// itself: the shared heap, the symbol table, and the two I/O collaborators.
pub(crate) struct ExecCtx<'a> {
    pub heap: &'a mut Heap,
    pub symtab: &'a mut SymbolTable,
    pub console: &'a mut dyn Console,
    pub debug: &'a mut dyn DebugSink,
}

/// Dispatches one instruction: decodes the instruction cell at `cont.ip`,
/// invokes its handler, and returns the [`Effect`] it produced.
///
/// # Panics
///
/// Panics if `cont.ip` doesn't point at an instruction cell — callers must
/// check [`Continuation::is_dead`] first.
pub(crate) fn execute(ctx: &mut ExecCtx<'_>, cont: &mut Continuation) -> Result<Effect, Fault> {
    let Word::Ptr(ip) = cont.ip else {
        panic!("execute called on a dead continuation");
    };
    let CellView::Instr { op, imm, next_ip } = ctx.heap.cell(ip).view() else {
        panic!("continuation ip {ip:?} is not an instruction cell");
    };

    let next = match op {
        Opcode::Push => stack::push(ctx, cont, imm, next_ip)?,
        Opcode::Drop => stack::drop_n(ctx, cont, imm, next_ip),
        Opcode::Dup => stack::dup_n(ctx, cont, imm, next_ip)?,
        Opcode::Pick => stack::pick_n(ctx, cont, imm, next_ip)?,
        Opcode::Roll => stack::roll_n(ctx, cont, imm, next_ip),
        Opcode::Depth => stack::depth(ctx, cont, next_ip)?,
        Opcode::Typeq => stack::typeq(ctx, cont, imm, next_ip)?,
        Opcode::Eq => stack::eq_k(ctx, cont, imm, next_ip)?,

        Opcode::Cell => data::cell_n(ctx, cont, imm, next_ip)?,
        Opcode::Get => data::get_f(ctx, cont, imm, next_ip)?,
        Opcode::Set => data::set_f(ctx, cont, imm, next_ip),
        Opcode::Pair => data::pair_n(ctx, cont, imm, next_ip)?,
        Opcode::Part => data::part_n(ctx, cont, imm, next_ip)?,
        Opcode::Nth => data::nth_i(ctx, cont, imm, next_ip)?,
        Opcode::Alu => data::alu(ctx, cont, imm, next_ip)?,
        Opcode::Cmp => data::cmp(ctx, cont, imm, next_ip)?,

        Opcode::If => return Ok(Effect::Continue(control::branch_if(ctx, cont, imm, next_ip))),
        Opcode::Msg => control::msg_i(ctx, cont, imm, next_ip)?,
        Opcode::SelfRef => control::push_self(ctx, cont, next_ip)?,
        Opcode::Send => {
            actor_effects::send_n(ctx, cont, imm, next_ip)?;
            next_ip
        }
        Opcode::New => actor_effects::new_n(ctx, cont, imm, next_ip)?,
        Opcode::Beh => actor_effects::beh_n(ctx, cont, imm, next_ip)?,
        Opcode::End => return Ok(Effect::End(imm.as_end_kind().unwrap_or(EndKind::Stop))),

        Opcode::Cvt => io::cvt(ctx, cont, imm, next_ip)?,
        Opcode::Putc => io::putc(ctx, cont, next_ip),
        Opcode::Getc => io::getc(ctx, cont, next_ip)?,
        Opcode::Debug => io::debug(ctx, cont, imm, next_ip),
    };
    Ok(Effect::Continue(next))
}
