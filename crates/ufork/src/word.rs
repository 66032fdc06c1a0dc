//! The machine word and the tagged values it can hold (spec.md §3).
//!
//! The spec describes a single bit-packed machine word that does triple duty
//! as a Fixnum, a heap index, or a procedure/opcode constant, distinguished
//! by which bits are set. Design Notes §9 suggests the idiomatic Rust shape
//! directly: "the uniform 4-field cell with tag discrimination maps cleanly
//! to a tagged enum ... The Fixnum tag bit can be preserved as a newtype
//! wrapping the machine integer." [`Word`] is exactly that sum type rather
//! than a hand-packed bitfield — see `DESIGN.md` for why this reading was
//! chosen over literal bit-packing.

use std::fmt;

use ufork_interface::{AluOp, Convert, EndKind, Field, Opcode, Relation, Tag};

/// Raw signed machine integer underlying a Fixnum. Width is a compile-time
/// choice (spec.md §3: "16, 32, or 64 bits; configurable"), selected by the
/// `word16`/`word64` Cargo features (default 32-bit).
#[cfg(feature = "word16")]
pub type Raw = i16;
#[cfg(feature = "word64")]
pub type Raw = i64;
#[cfg(not(any(feature = "word16", feature = "word64")))]
pub type Raw = i32;

/// Index into the cell heap. Never negative, always `< CELL_MAX`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(u32);

impl CellId {
    /// `FALSE` — the Boolean singleton for false.
    pub const FALSE: CellId = CellId(0);
    /// `TRUE` — the Boolean singleton for true.
    pub const TRUE: CellId = CellId(1);
    /// `NIL` — the empty list.
    pub const NIL: CellId = CellId(2);
    /// `UNDEF` — the undefined-value singleton.
    pub const UNDEF: CellId = CellId(3);
    /// `UNIT` — the unit-value singleton.
    pub const UNIT: CellId = CellId(4);
    /// First index available for allocation; 0..=4 are reserved constants.
    pub const FIRST_ALLOCATABLE: CellId = CellId(5);

    /// Wraps a raw index without checking it against any heap's frontier.
    #[must_use]
    pub const fn from_u32_unchecked(index: u32) -> Self {
        Self(index)
    }

    /// The raw index, for use in error messages, tests, and tracer output.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[must_use]
    pub(crate) const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A procedure or opcode constant (spec.md §3): names either the kind of a
/// non-instruction cell, the opcode of an instruction cell, or one of the
/// small sub-selectors an opcode's immediate field picks among (`alu op`'s
/// `op`, `cmp r`'s `r`, `get`/`set`'s field, `end k`'s kind, `cvt c`'s
/// conversion). Such constants are never heap indices.
///
/// spec.md bit-packs these as "a small negative word in a reserved range";
/// this crate instead represents each family as its own Rust enum (Design
/// Notes §9: "Procedure constants become a separate opcode enum, dispatched
/// with a table") rather than hand-rolling a bitfield, so an immediate like
/// `Word::Const(ProcConst::End(EndKind::Commit))` is exhaustively matched by
/// the compiler instead of by a magic integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcConst {
    /// Discriminates a non-instruction cell's kind.
    Tag(Tag),
    /// Discriminates an instruction cell's opcode.
    Opcode(Opcode),
    /// `end k`'s termination kind.
    End(EndKind),
    /// `get f` / `set f`'s field selector.
    Field(Field),
    /// `alu op`'s operation.
    Alu(AluOp),
    /// `cmp r`'s relation.
    Cmp(Relation),
    /// `cvt c`'s conversion.
    Cvt(Convert),
}

/// A tagged machine word: the value that lives in every cell field.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Word {
    /// A signed integer, wrapping modulo the configured word width.
    Fixnum(Raw),
    /// A reference to a heap cell.
    Ptr(CellId),
    /// A procedure or opcode constant.
    Const(ProcConst),
}

impl Word {
    /// The `FALSE` singleton.
    pub const FALSE: Word = Word::Ptr(CellId::FALSE);
    /// The `TRUE` singleton.
    pub const TRUE: Word = Word::Ptr(CellId::TRUE);
    /// The `NIL` singleton.
    pub const NIL: Word = Word::Ptr(CellId::NIL);
    /// The `UNDEF` singleton.
    pub const UNDEF: Word = Word::Ptr(CellId::UNDEF);
    /// The `UNIT` singleton.
    pub const UNIT: Word = Word::Ptr(CellId::UNIT);

    /// Boolean-to-word conversion used by every comparison opcode (spec.md
    /// §4.5: comparisons always produce `TRUE` or `FALSE`, never `UNDEF`).
    #[must_use]
    pub const fn from_bool(b: bool) -> Word {
        if b {
            Word::TRUE
        } else {
            Word::FALSE
        }
    }

    /// `if` treats anything other than `FALSE` as truthy, including `UNDEF`
    /// (spec.md §4.5).
    #[must_use]
    pub fn is_truthy(self) -> bool {
        self != Word::FALSE
    }

    #[must_use]
    pub(crate) fn fixnum(self) -> Option<Raw> {
        match self {
            Word::Fixnum(n) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub(crate) fn ptr(self) -> Option<CellId> {
        match self {
            Word::Ptr(id) => Some(id),
            _ => None,
        }
    }

    /// Extracts the `Tag` this word names, for `typeq`'s target operand.
    #[must_use]
    pub(crate) fn as_tag_const(self) -> Option<Tag> {
        match self {
            Word::Const(ProcConst::Tag(t)) => Some(t),
            _ => None,
        }
    }

    #[must_use]
    pub(crate) fn as_end_kind(self) -> Option<EndKind> {
        match self {
            Word::Const(ProcConst::End(k)) => Some(k),
            _ => None,
        }
    }

    #[must_use]
    pub(crate) fn as_field(self) -> Option<Field> {
        match self {
            Word::Const(ProcConst::Field(f)) => Some(f),
            _ => None,
        }
    }

    #[must_use]
    pub(crate) fn as_alu_op(self) -> Option<AluOp> {
        match self {
            Word::Const(ProcConst::Alu(op)) => Some(op),
            _ => None,
        }
    }

    #[must_use]
    pub(crate) fn as_relation(self) -> Option<Relation> {
        match self {
            Word::Const(ProcConst::Cmp(r)) => Some(r),
            _ => None,
        }
    }

    #[must_use]
    pub(crate) fn as_convert(self) -> Option<Convert> {
        match self {
            Word::Const(ProcConst::Cvt(c)) => Some(c),
            _ => None,
        }
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Word::Fixnum(n) => write!(f, "{n}"),
            Word::Ptr(id) if *id == CellId::FALSE => write!(f, "#f"),
            Word::Ptr(id) if *id == CellId::TRUE => write!(f, "#t"),
            Word::Ptr(id) if *id == CellId::NIL => write!(f, "()"),
            Word::Ptr(id) if *id == CellId::UNDEF => write!(f, "#?"),
            Word::Ptr(id) if *id == CellId::UNIT => write!(f, "#unit"),
            Word::Ptr(id) => write!(f, "{id:?}"),
            Word::Const(c) => write!(f, "{c:?}"),
        }
    }
}

impl fmt::Display for Word {
    /// Used by `debug tag v` (spec.md §6), whose output format "is
    /// unspecified" — this reuses the `Debug` rendering rather than
    /// maintaining a second textual form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<CellId> for Word {
    fn from(id: CellId) -> Self {
        Word::Ptr(id)
    }
}
