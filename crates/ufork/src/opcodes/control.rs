//! `if`, `msg`, `self` (spec.md §4.5).

use super::{common, ExecCtx};
use crate::{continuation::Continuation, error::Fault, word::Word};

/// `if t-ip, f-ip`. Unlike every other opcode, `if`'s instruction cell
/// repurposes both data fields as jump targets: `imm` (the cell's `x`) is
/// the true branch, `next_ip` (`y`) the false branch — there is no
/// fallthrough (spec.md §4.5: "next-ip is t-ip if b != FALSE, f-ip
/// otherwise").
pub(super) fn branch_if(
    ctx: &mut ExecCtx<'_>,
    cont: &mut Continuation,
    imm: Word,
    next_ip: Word,
) -> Word {
    let (b, sp) = common::pop(ctx.heap, cont.sp);
    cont.sp = sp;
    if b.is_truthy() {
        imm
    } else {
        next_ip
    }
}

/// `msg i`: projects the `i`-th element (or tail, for negative `i`, or the
/// whole message for `i = 0`) of the event this continuation is handling.
/// Does not touch the stack except to push the result.
pub(super) fn msg_i(
    ctx: &mut ExecCtx<'_>,
    cont: &mut Continuation,
    imm: Word,
    next_ip: Word,
) -> Result<Word, Fault> {
    let crate::cell::CellView::Event { message, .. } = ctx.heap.cell(cont.ep).view() else {
        panic!("continuation ep {:?} is not an Event cell", cont.ep);
    };
    let i = imm.fixnum().unwrap_or(0);
    let limit = common::sanity_limit(ctx.heap);
    let result = match i.cmp(&0) {
        std::cmp::Ordering::Equal => message,
        std::cmp::Ordering::Greater => {
            let tail = common::nth_tail(ctx.heap, message, (i - 1) as usize, limit)?;
            common::car(ctx.heap, tail)
        }
        std::cmp::Ordering::Less => common::nth_tail(ctx.heap, message, (-i) as usize, limit)?,
    };
    cont.sp = common::push(ctx.heap, cont.sp, result)?;
    Ok(next_ip)
}

/// `self`: pushes the actor handling the current event.
pub(super) fn push_self(ctx: &mut ExecCtx<'_>, cont: &mut Continuation, next_ip: Word) -> Result<Word, Fault> {
    let crate::cell::CellView::Event { target, .. } = ctx.heap.cell(cont.ep).view() else {
        panic!("continuation ep {:?} is not an Event cell", cont.ep);
    };
    cont.sp = common::push(ctx.heap, cont.sp, target)?;
    Ok(next_ip)
}
