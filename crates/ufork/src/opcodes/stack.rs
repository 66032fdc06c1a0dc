//! `push`, `drop`, `dup`, `pick`, `roll`, `depth`, `typeq`, `eq` (spec.md
//! §4.4/§4.5).

use ufork_interface::Tag;

use super::{common, ExecCtx};
use crate::{continuation::Continuation, error::Fault, word::Word};

fn imm_usize(imm: Word) -> usize {
    match imm.fixnum() {
        Some(n) if n > 0 => n as usize,
        _ => 0,
    }
}

pub(super) fn push(
    ctx: &mut ExecCtx<'_>,
    cont: &mut Continuation,
    imm: Word,
    next_ip: Word,
) -> Result<Word, Fault> {
    cont.sp = common::push(ctx.heap, cont.sp, imm)?;
    Ok(next_ip)
}

pub(super) fn drop_n(ctx: &mut ExecCtx<'_>, cont: &mut Continuation, imm: Word, next_ip: Word) -> Word {
    let n = imm_usize(imm);
    let (_, sp) = common::pop_n(ctx.heap, cont.sp, n);
    cont.sp = sp;
    next_ip
}

/// Reads the top `n` items without consuming them, top-first.
fn peek_n(ctx: &ExecCtx<'_>, sp: Word, n: usize) -> Result<Vec<Word>, Fault> {
    let limit = common::sanity_limit(ctx.heap);
    let mut items = Vec::with_capacity(n);
    let mut cursor = sp;
    for _ in 0..n {
        items.push(common::car(ctx.heap, cursor));
        cursor = common::nth_tail(ctx.heap, cursor, 1, limit)?;
    }
    Ok(items)
}

pub(super) fn dup_n(
    ctx: &mut ExecCtx<'_>,
    cont: &mut Continuation,
    imm: Word,
    next_ip: Word,
) -> Result<Word, Fault> {
    let n = imm_usize(imm);
    let items = peek_n(ctx, cont.sp, n)?;
    let mut sp = cont.sp;
    for &v in items.iter().rev() {
        sp = common::push(ctx.heap, sp, v)?;
    }
    cont.sp = sp;
    Ok(next_ip)
}

pub(super) fn pick_n(
    ctx: &mut ExecCtx<'_>,
    cont: &mut Continuation,
    imm: Word,
    next_ip: Word,
) -> Result<Word, Fault> {
    let n = imm_usize(imm);
    let v = if n == 0 {
        Word::UNDEF
    } else {
        peek_n(ctx, cont.sp, n)?.pop().unwrap_or(Word::UNDEF)
    };
    cont.sp = common::push(ctx.heap, cont.sp, v)?;
    Ok(next_ip)
}

pub(super) fn roll_n(ctx: &mut ExecCtx<'_>, cont: &mut Continuation, imm: Word, next_ip: Word) -> Word {
    let n = imm.fixnum().unwrap_or(0);
    if n == 0 {
        return next_ip;
    }
    let absn = n.unsigned_abs() as usize;
    let (items, rest) = common::pop_n(ctx.heap, cont.sp, absn);
    let mut order = items.clone();
    if n > 0 {
        let last = order.pop().unwrap();
        order.insert(0, last);
    } else {
        let first = order.remove(0);
        order.push(first);
    }
    let mut sp = rest;
    for &v in order.iter().rev() {
        sp = common::push(ctx.heap, sp, v)
            .expect("roll re-pushes exactly as many cells as it just freed");
    }
    cont.sp = sp;
    next_ip
}

pub(super) fn depth(ctx: &mut ExecCtx<'_>, cont: &mut Continuation, next_ip: Word) -> Result<Word, Fault> {
    let n = common::depth(ctx.heap, cont.sp)?;
    cont.sp = common::push(ctx.heap, cont.sp, Word::Fixnum(n as crate::word::Raw))?;
    Ok(next_ip)
}

pub(super) fn typeq(
    ctx: &mut ExecCtx<'_>,
    cont: &mut Continuation,
    imm: Word,
    next_ip: Word,
) -> Result<Word, Fault> {
    let (v, sp) = common::pop(ctx.heap, cont.sp);
    cont.sp = sp;
    let matches = match imm.as_tag_const() {
        Some(Tag::Fixnum) => matches!(v, Word::Fixnum(_)),
        Some(tag) => match v {
            Word::Ptr(id) => ctx.heap.cell(id).tag() == Some(tag),
            _ => false,
        },
        // Not a Tag at all: a procedure constant compares by identity
        // (spec.md §4.5: "Fixnum and procedure-constant handled specially").
        None => v == imm,
    };
    cont.sp = common::push(ctx.heap, cont.sp, Word::from_bool(matches))?;
    Ok(next_ip)
}

pub(super) fn eq_k(
    ctx: &mut ExecCtx<'_>,
    cont: &mut Continuation,
    imm: Word,
    next_ip: Word,
) -> Result<Word, Fault> {
    let (v, sp) = common::pop(ctx.heap, cont.sp);
    cont.sp = sp;
    cont.sp = common::push(ctx.heap, cont.sp, Word::from_bool(v == imm))?;
    Ok(next_ip)
}
