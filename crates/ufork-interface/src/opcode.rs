//! Tag and opcode constants.
//!
//! Every cell's `t` field holds one of these as a small negative machine
//! word (spec.md §3: "a small negative word in a reserved range identifies
//! a primitive dispatcher or an instruction kind"). [`Tag`] covers the
//! non-instruction kinds; [`Opcode`] covers instruction cells, whose `t`
//! field is further into negative territory (`<= -10`).

/// What kind of cell a `t` field of `< 0` (and not an [`Opcode`]) denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// One of the two Boolean singletons, `FALSE` or `TRUE`.
    Boolean,
    /// The single `NIL` (empty list).
    Null,
    /// The `UNDEF` singleton.
    Undef,
    /// The `UNIT` singleton.
    Unit,
    /// A cons cell: `x` = car, `y` = cdr.
    Pair,
    /// An interned identifier: `x` = hash, `y` = char-list, `z` = global binding.
    Symbol,
    /// An actor: `x` = behavior ip, `y` = saved stack, `z` = txn / `UNDEF`.
    Actor,
    /// A pending message: `x` = target actor, `y` = message, `z` = queue-next.
    Event,
    /// A reclaimed cell on the free list: `z` = free-list-next.
    Free,
    /// Synthetic: matches a `Fixnum`, which (unlike every other variant
    /// here) never occupies a cell of its own. Valid only as a `typeq`
    /// target (spec.md §4.5: "Fixnum ... handled specially").
    Fixnum,
}

impl Tag {
    /// All non-instruction tags, in a stable order (used to size reserved-constant tables).
    pub const ALL: [Tag; 10] = [
        Tag::Boolean,
        Tag::Null,
        Tag::Undef,
        Tag::Unit,
        Tag::Pair,
        Tag::Symbol,
        Tag::Actor,
        Tag::Event,
        Tag::Free,
        Tag::Fixnum,
    ];
}

/// A VM instruction kind (spec.md §4.5). Immediate operands named in the
/// spec (`push v`, `drop n`, ...) are carried by the instruction cell's `x`
/// field, not by the variant itself — this enum only names *which* handler
/// a cell's `t` field dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// `push v` — push the immediate.
    Push,
    /// `drop n` — discard the top `n` items.
    Drop,
    /// `dup n` — duplicate the top `n` items.
    Dup,
    /// `pick n` — copy the `n`-th item (1-indexed) to the top.
    Pick,
    /// `roll n` — rotate the top `|n|` items.
    Roll,
    /// `depth` — push the current stack depth as a Fixnum.
    Depth,
    /// `typeq T` — push `TRUE` iff the popped value's tag is `T`.
    Typeq,
    /// `cell n` — allocate a new `{t,x,y,z}` cell from `n` popped fields.
    Cell,
    /// `get f` — read field `f` of a popped cell index.
    Get,
    /// `set f` — write field `f` of a popped cell index.
    Set,
    /// `pair n` — build an `n`-long cons chain from `n+1` popped items.
    Pair,
    /// `part n` — split a popped list into its first `n` items plus tail.
    Part,
    /// `nth i` — project the `i`-th element/tail of a popped list.
    Nth,
    /// `alu op` — arithmetic/bitwise operation on Fixnums.
    Alu,
    /// `eq k` — identity comparison against the immediate.
    Eq,
    /// `cmp r` — relational comparison of two popped Fixnums.
    Cmp,
    /// `if t,f` — branch depending on a popped Boolean.
    If,
    /// `msg i` — project the `i`-th element/tail of the current message.
    Msg,
    /// `self` — push the actor handling the current event.
    SelfRef,
    /// `send n` — stage an outbound event in the running transaction.
    Send,
    /// `new n` — create an actor from a popped behavior (and saved stack).
    New,
    /// `beh n` — restage the current actor's behavior (and state).
    Beh,
    /// `end k` — terminate the current thread (see [`EndKind`]).
    End,
    /// `cvt c` — value conversion (see [`Convert`]).
    Cvt,
    /// `putc` — write a character to the console.
    Putc,
    /// `getc` — read a character from the console.
    Getc,
    /// `debug tag` — emit a value to the [`DebugSink`](crate::DebugSink).
    Debug,
}

impl Opcode {
    /// All opcodes, in a stable order. Used by the VM's dispatch table and by
    /// tracers that want to enumerate the instruction set.
    pub const ALL: [Opcode; 27] = [
        Opcode::Push,
        Opcode::Drop,
        Opcode::Dup,
        Opcode::Pick,
        Opcode::Roll,
        Opcode::Depth,
        Opcode::Typeq,
        Opcode::Cell,
        Opcode::Get,
        Opcode::Set,
        Opcode::Pair,
        Opcode::Part,
        Opcode::Nth,
        Opcode::Alu,
        Opcode::Eq,
        Opcode::Cmp,
        Opcode::If,
        Opcode::Msg,
        Opcode::SelfRef,
        Opcode::Send,
        Opcode::New,
        Opcode::Beh,
        Opcode::End,
        Opcode::Cvt,
        Opcode::Putc,
        Opcode::Getc,
        Opcode::Debug,
    ];
}

/// Cell field selector for `get`/`set` (spec.md §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// The cell's type tag.
    T,
    /// The cell's first data field.
    X,
    /// The cell's second data field.
    Y,
    /// The cell's third data field.
    Z,
}

/// `alu op` operations (spec.md §4.5). `Not` is unary; the rest are binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AluOp {
    /// Bitwise NOT (unary).
    Not,
    /// Bitwise AND.
    And,
    /// Bitwise OR.
    Or,
    /// Bitwise XOR.
    Xor,
    /// Wrapping addition.
    Add,
    /// Wrapping subtraction.
    Sub,
    /// Wrapping multiplication (low word of the product, spec.md §4.5).
    Mul,
}

/// `cmp r` relations (spec.md §4.5). Always produces a Boolean, never `UNDEF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// `m == n`
    Eq,
    /// `m != n`
    Ne,
    /// `m < n`
    Lt,
    /// `m <= n`
    Le,
    /// `m > n`
    Gt,
    /// `m >= n`
    Ge,
    /// `m` is a member of the class named by `n` (spec.md §4.5 "class-membership").
    Cls,
}

/// `end k` termination kinds (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndKind {
    /// Discard staged events and behavior/state; actor stays ready.
    Abort,
    /// Terminate without committing; actor stays ready, unchanged.
    Stop,
    /// Flush staged events and persist staged behavior/state.
    Commit,
    /// Like `Commit`, but also frees the actor cell.
    Release,
}

/// `cvt c` conversions (spec.md §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Convert {
    /// List of character Fixnums (decimal, `_` separators ignored) to a Fixnum.
    CharsToFixnum,
    /// List of character Fixnums to an interned Symbol.
    CharsToSymbol,
    /// Raw machine integer to a tagged Fixnum.
    ToFixnum,
    /// Tagged Fixnum to a raw machine integer.
    ToRaw,
}
