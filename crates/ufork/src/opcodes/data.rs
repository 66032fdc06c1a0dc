//! `cell`, `get`/`set`, `pair`/`part`, `nth`, `alu`, `cmp` (spec.md §4.5).

use ufork_interface::{AluOp, Field, Relation, Tag};

use super::{common, ExecCtx};
use crate::{
    continuation::Continuation,
    error::Fault,
    word::{Raw, Word},
};

pub(super) fn cell_n(
    ctx: &mut ExecCtx<'_>,
    cont: &mut Continuation,
    imm: Word,
    next_ip: Word,
) -> Result<Word, Fault> {
    let n = imm.fixnum().unwrap_or(1).clamp(1, 4);
    let (t, sp) = common::pop(ctx.heap, cont.sp);
    let mut sp = sp;
    let mut field = |sp: &mut Word| -> Word {
        let (v, rest) = common::pop(ctx.heap, *sp);
        *sp = rest;
        v
    };
    let x = if n >= 2 { field(&mut sp) } else { Word::UNDEF };
    let y = if n >= 3 { field(&mut sp) } else { Word::UNDEF };
    let z = if n >= 4 { field(&mut sp) } else { Word::UNDEF };
    let id = ctx.heap.alloc(t, x, y, z)?;
    cont.sp = common::push(ctx.heap, sp, Word::from(id))?;
    Ok(next_ip)
}

pub(super) fn get_f(
    ctx: &mut ExecCtx<'_>,
    cont: &mut Continuation,
    imm: Word,
    next_ip: Word,
) -> Result<Word, Fault> {
    let (idx, sp) = common::pop(ctx.heap, cont.sp);
    cont.sp = sp;
    let result = match (idx.ptr(), imm.as_field()) {
        (Some(id), Some(field)) => {
            let cell = ctx.heap.cell(id);
            match field {
                Field::T => cell.t,
                Field::X => cell.x,
                Field::Y => cell.y,
                Field::Z => cell.z,
            }
        }
        _ => Word::UNDEF,
    };
    cont.sp = common::push(ctx.heap, cont.sp, result)?;
    Ok(next_ip)
}

/// `set f` never pushes a result (spec.md is silent on one; see DESIGN.md).
/// An invalid cell index or field selector is a silent no-op (spec.md §7
/// tier 2: "unknown field").
pub(super) fn set_f(ctx: &mut ExecCtx<'_>, cont: &mut Continuation, imm: Word, next_ip: Word) -> Word {
    let (value, sp) = common::pop(ctx.heap, cont.sp);
    let (idx, sp) = common::pop(ctx.heap, sp);
    cont.sp = sp;
    if let (Some(id), Some(field)) = (idx.ptr(), imm.as_field()) {
        match field {
            Field::T => ctx.heap.set_t(id, value),
            Field::X => ctx.heap.set_x(id, value),
            Field::Y => ctx.heap.set_y(id, value),
            Field::Z => ctx.heap.set_z(id, value),
        }
    }
    next_ip
}

pub(super) fn pair_n(
    ctx: &mut ExecCtx<'_>,
    cont: &mut Continuation,
    imm: Word,
    next_ip: Word,
) -> Result<Word, Fault> {
    let n = imm.fixnum().unwrap_or(0).max(0) as usize;
    let (items, sp) = common::pop_n(ctx.heap, cont.sp, n + 1);
    let mut tail = items[n];
    for i in (0..n).rev() {
        tail = Word::from(ctx.heap.cons(items[i], tail)?);
    }
    cont.sp = common::push(ctx.heap, sp, tail)?;
    Ok(next_ip)
}

pub(super) fn part_n(
    ctx: &mut ExecCtx<'_>,
    cont: &mut Continuation,
    imm: Word,
    next_ip: Word,
) -> Result<Word, Fault> {
    let n = imm.fixnum().unwrap_or(0).max(0) as usize;
    let (list, sp) = common::pop(ctx.heap, cont.sp);
    let limit = common::sanity_limit(ctx.heap);
    let mut items = Vec::with_capacity(n);
    let mut cursor = list;
    for _ in 0..n {
        items.push(common::car(ctx.heap, cursor));
        cursor = common::nth_tail(ctx.heap, cursor, 1, limit)?;
    }
    let mut new_sp = common::push(ctx.heap, sp, cursor)?;
    for i in (0..n).rev() {
        new_sp = common::push(ctx.heap, new_sp, items[i])?;
    }
    cont.sp = new_sp;
    Ok(next_ip)
}

pub(super) fn nth_i(
    ctx: &mut ExecCtx<'_>,
    cont: &mut Continuation,
    imm: Word,
    next_ip: Word,
) -> Result<Word, Fault> {
    let i = imm.fixnum().unwrap_or(0);
    let (list, sp) = common::pop(ctx.heap, cont.sp);
    cont.sp = sp;
    let limit = common::sanity_limit(ctx.heap);
    let result = match i.cmp(&0) {
        std::cmp::Ordering::Equal => list,
        std::cmp::Ordering::Greater => {
            let tail = common::nth_tail(ctx.heap, list, (i - 1) as usize, limit)?;
            common::car(ctx.heap, tail)
        }
        std::cmp::Ordering::Less => common::nth_tail(ctx.heap, list, (-i) as usize, limit)?,
    };
    cont.sp = common::push(ctx.heap, cont.sp, result)?;
    Ok(next_ip)
}

pub(super) fn alu(
    ctx: &mut ExecCtx<'_>,
    cont: &mut Continuation,
    imm: Word,
    next_ip: Word,
) -> Result<Word, Fault> {
    let op = imm.as_alu_op();
    let result = match op {
        Some(AluOp::Not) => {
            let (v, sp) = common::pop(ctx.heap, cont.sp);
            cont.sp = sp;
            v.fixnum().map(|n| Word::Fixnum(!n)).unwrap_or(Word::UNDEF)
        }
        Some(binary_op) => {
            let (b, sp) = common::pop(ctx.heap, cont.sp);
            let (a, sp) = common::pop(ctx.heap, sp);
            cont.sp = sp;
            match (a.fixnum(), b.fixnum()) {
                (Some(a), Some(b)) => Word::Fixnum(apply_binary(binary_op, a, b)),
                _ => Word::UNDEF,
            }
        }
        None => Word::UNDEF,
    };
    cont.sp = common::push(ctx.heap, cont.sp, result)?;
    Ok(next_ip)
}

fn apply_binary(op: AluOp, a: Raw, b: Raw) -> Raw {
    match op {
        AluOp::And => a & b,
        AluOp::Or => a | b,
        AluOp::Xor => a ^ b,
        AluOp::Add => a.wrapping_add(b),
        AluOp::Sub => a.wrapping_sub(b),
        // spec.md §4.5: "the result is the low word of the product (wrap)".
        AluOp::Mul => a.wrapping_mul(b),
        AluOp::Not => unreachable!("Not is handled as the unary case"),
    }
}

/// A word's comparison key when it isn't known to be a Fixnum. spec.md §4.5
/// leaves `cmp` on non-Fixnum operands implementation-defined ("typical
/// implementations perform raw integer compare on the tagged
/// representation"); this assigns each variant a distinct, stable ordering
/// key rather than bit-packing one the way spec.md's reference VMs do.
fn raw_repr(w: Word) -> i64 {
    match w {
        Word::Fixnum(n) => i64::from(n),
        Word::Ptr(id) => i64::from(id.as_u32()),
        Word::Const(_) => -1,
    }
}

pub(super) fn cmp(
    ctx: &mut ExecCtx<'_>,
    cont: &mut Continuation,
    imm: Word,
    next_ip: Word,
) -> Result<Word, Fault> {
    let (b, sp) = common::pop(ctx.heap, cont.sp);
    let (a, sp) = common::pop(ctx.heap, sp);
    cont.sp = sp;
    let result = match imm.as_relation() {
        Some(Relation::Cls) => match b.as_tag_const() {
            Some(Tag::Fixnum) => matches!(a, Word::Fixnum(_)),
            Some(tag) => matches!(a, Word::Ptr(id) if ctx.heap.cell(id).tag() == Some(tag)),
            None => false,
        },
        Some(r) => {
            let (a, b) = (raw_repr(a), raw_repr(b));
            match r {
                Relation::Eq => a == b,
                Relation::Ne => a != b,
                Relation::Lt => a < b,
                Relation::Le => a <= b,
                Relation::Gt => a > b,
                Relation::Ge => a >= b,
                Relation::Cls => unreachable!("Cls handled above"),
            }
        }
        None => false,
    };
    cont.sp = common::push(ctx.heap, cont.sp, Word::from_bool(result))?;
    Ok(next_ip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cell::Heap, console::BufferConsole, symbol::SymbolTable, word::CellId,
    };
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
    fn pair_then_part_round_trips() {
        let mut heap = Heap::new(64);
        let mut symtab = SymbolTable::new();
        let mut console = BufferConsole::new();
        let mut debug = StderrSink;
        let mut cont = Continuation::new(Word::UNDEF, Word::NIL, CellId::NIL);
        for v in [Word::Fixnum(1), Word::Fixnum(2), Word::Fixnum(3)] {
            cont.sp = common::push(&mut heap, cont.sp, v).unwrap();
        }
        let mut c = ctx(&mut heap, &mut symtab, &mut console, &mut debug);
        pair_n(&mut c, &mut cont, Word::Fixnum(2), Word::UNDEF).unwrap();
        part_n(&mut c, &mut cont, Word::Fixnum(2), Word::UNDEF).unwrap();
        let (items, _) = common::pop_n(&mut heap, cont.sp, 3);
        assert_eq!(
            items,
            vec![Word::Fixnum(3), Word::Fixnum(2), Word::Fixnum(1)]
        );
    }

    #[test]
    fn alu_add_wraps() {
        let mut heap = Heap::new(16);
        let mut symtab = SymbolTable::new();
        let mut console = BufferConsole::new();
        let mut debug = StderrSink;
        let mut cont = Continuation::new(Word::UNDEF, Word::NIL, CellId::NIL);
        cont.sp = common::push(&mut heap, cont.sp, Word::Fixnum(crate::word::Raw::MAX)).unwrap();
        cont.sp = common::push(&mut heap, cont.sp, Word::Fixnum(1)).unwrap();
        let mut c = ctx(&mut heap, &mut symtab, &mut console, &mut debug);
        alu(&mut c, &mut cont, Word::Const(crate::word::ProcConst::Alu(AluOp::Add)), Word::UNDEF).unwrap();
        let (result, _) = common::pop(&mut heap, cont.sp);
        assert_eq!(result, Word::Fixnum(crate::word::Raw::MIN));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// spec.md §8: "`pair(n)` followed by `part(n)` restores the
            /// original stack (above the n items)" — for any n+1 Fixnums,
            /// `pair n` then `part n` must hand back exactly what was
            /// pushed, leaving an untouched item below them alone.
            #[test]
            fn pair_then_part_round_trips_for_any_n(
                values in proptest::collection::vec(-1000i64..1000, 1..7),
                marker in -1000i64..1000,
            ) {
                let n = values.len() - 1;
                let mut heap = Heap::new(128);
                let mut symtab = SymbolTable::new();
                let mut console = BufferConsole::new();
                let mut debug = StderrSink;
                let mut cont = Continuation::new(Word::UNDEF, Word::NIL, CellId::NIL);

                // A sentinel beneath everything `pair`/`part` touch, to confirm
                // neither opcode disturbs what's below the n+1 items it pops.
                cont.sp = common::push(&mut heap, cont.sp, Word::Fixnum(marker as Raw)).unwrap();
                for v in &values {
                    cont.sp = common::push(&mut heap, cont.sp, Word::Fixnum(*v as Raw)).unwrap();
                }

                let mut c = ctx(&mut heap, &mut symtab, &mut console, &mut debug);
                pair_n(&mut c, &mut cont, Word::Fixnum(n as Raw), Word::UNDEF).unwrap();
                part_n(&mut c, &mut cont, Word::Fixnum(n as Raw), Word::UNDEF).unwrap();

                let (restored, sp_after) = common::pop_n(&mut heap, cont.sp, n + 1);
                let expected: Vec<Word> = values.iter().rev().map(|v| Word::Fixnum(*v as Raw)).collect();
                prop_assert_eq!(restored, expected);

                let (under, _) = common::pop(&mut heap, sp_after);
                prop_assert_eq!(under, Word::Fixnum(marker as Raw));
            }
        }
    }
}
