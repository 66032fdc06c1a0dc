//! `cvt`, `putc`, `getc`, `debug` (spec.md §4.5/§6).

use ufork_interface::Convert;

use super::{common, ExecCtx};
use crate::{continuation::Continuation, error::Fault, word::{Raw, Word}};

/// Parses a list of character Fixnums as a signed decimal integer,
/// ignoring `_` separators (spec.md §4.5). Returns `None` on an empty or
/// malformed list.
fn parse_decimal(ctx: &ExecCtx<'_>, mut chars: Word, limit: usize) -> Option<Raw> {
    let mut digits = Vec::new();
    let mut steps = 0;
    while let Word::Ptr(id) = chars {
        if steps > limit {
            return None;
        }
        steps += 1;
        let crate::cell::CellView::Pair { car, cdr } = ctx.heap.cell(id).view() else {
            break;
        };
        if let Word::Fixnum(ch) = car {
            digits.push(ch);
        }
        chars = cdr;
    }
    if digits.is_empty() {
        return None;
    }
    let mut chars_iter = digits.into_iter().peekable();
    let neg = matches!(chars_iter.peek(), Some(&c) if c as u8 as char == '-');
    if neg {
        chars_iter.next();
    }
    let mut value: Raw = 0;
    let mut saw_digit = false;
    for ch in chars_iter {
        let ch = ch as u32;
        if ch == u32::from(b'_') {
            continue;
        }
        let Some(digit) = char::from_u32(ch).and_then(|c| c.to_digit(10)) else {
            return None;
        };
        value = value.wrapping_mul(10).wrapping_add(digit as Raw);
        saw_digit = true;
    }
    if !saw_digit {
        return None;
    }
    Some(if neg { -value } else { value })
}

pub(super) fn cvt(
    ctx: &mut ExecCtx<'_>,
    cont: &mut Continuation,
    imm: Word,
    next_ip: Word,
) -> Result<Word, Fault> {
    let (v, sp) = common::pop(ctx.heap, cont.sp);
    cont.sp = sp;
    let limit = common::sanity_limit(ctx.heap);
    let result = match imm.as_convert() {
        Some(Convert::CharsToFixnum) => {
            parse_decimal(ctx, v, limit).map_or(Word::UNDEF, Word::Fixnum)
        }
        Some(Convert::CharsToSymbol) => Word::from(ctx.symtab.intern(ctx.heap, v)?),
        // This VM's `Word` never carries an untagged raw integer distinct
        // from a Fixnum, so both directions are identity on Fixnums
        // (see DESIGN.md).
        Some(Convert::ToFixnum | Convert::ToRaw) => {
            if matches!(v, Word::Fixnum(_)) {
                v
            } else {
                Word::UNDEF
            }
        }
        None => Word::UNDEF,
    };
    cont.sp = common::push(ctx.heap, cont.sp, result)?;
    Ok(next_ip)
}

pub(super) fn putc(ctx: &mut ExecCtx<'_>, cont: &mut Continuation, next_ip: Word) -> Word {
    let (ch, sp) = common::pop(ctx.heap, cont.sp);
    cont.sp = sp;
    if let Word::Fixnum(n) = ch {
        ctx.console.putc((n & 0xff) as u8);
    }
    next_ip
}

pub(super) fn getc(ctx: &mut ExecCtx<'_>, cont: &mut Continuation, next_ip: Word) -> Result<Word, Fault> {
    let ch = ctx.console.getc();
    cont.sp = common::push(ctx.heap, cont.sp, Word::Fixnum(ch as Raw))?;
    Ok(next_ip)
}

pub(super) fn debug(ctx: &mut ExecCtx<'_>, cont: &mut Continuation, imm: Word, next_ip: Word) -> Word {
    let (v, sp) = common::pop(ctx.heap, cont.sp);
    cont.sp = sp;
    let tag = imm.fixnum().map_or(0, i64::from);
    ctx.debug.emit(tag, &v);
    next_ip
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
    fn putc_writes_low_byte() {
        let mut heap = Heap::new(16);
        let mut symtab = SymbolTable::new();
        let mut console = BufferConsole::new();
        let mut debug = StderrSink;
        let mut cont = Continuation::new(Word::UNDEF, Word::NIL, CellId::NIL);
        cont.sp = common::push(&mut heap, cont.sp, Word::Fixnum(65)).unwrap();
        let mut c = ctx(&mut heap, &mut symtab, &mut console, &mut debug);
        putc(&mut c, &mut cont, Word::UNDEF);
        assert_eq!(console.output(), b"A");
    }

    #[test]
    fn chars_to_fixnum_parses_with_underscores() {
        let mut heap = Heap::new(64);
        let mut symtab = SymbolTable::new();
        let mut console = BufferConsole::new();
        let mut debug = StderrSink;
        let mut sp = Word::NIL;
        for ch in "1_000".chars().rev() {
            sp = Word::from(heap.cons(Word::Fixnum(ch as Raw), sp).unwrap());
        }
        let mut cont = Continuation::new(Word::UNDEF, sp, CellId::NIL);
        let mut c = ctx(&mut heap, &mut symtab, &mut console, &mut debug);
        cvt(&mut c, &mut cont, Word::Const(crate::word::ProcConst::Cvt(Convert::CharsToFixnum)), Word::UNDEF).unwrap();
        let (result, _) = common::pop(&mut heap, cont.sp);
        assert_eq!(result, Word::Fixnum(1000));
    }
}
