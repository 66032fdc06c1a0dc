//! # uFork Stable Interface
//!
//! This crate defines the types a tracer, debugger, or pretty-printer needs
//! to observe a running [`ufork`](https://docs.rs/ufork) virtual machine
//! without depending on its internal cell representation: the [`Tag`] and
//! [`Opcode`] enums a cell's `t` field decodes to, the [`Tracer`] hook
//! trait, a read-only [`StateView`] over the currently executing
//! continuation, and the [`DebugSink`] trait behind the `debug` instruction.
//!
//! Keeping this surface in its own crate means a tracer written against one
//! version of the VM keeps compiling against the next: the VM crate may grow
//! new opcodes or state, but it does so by extending these types, not by
//! breaking them.

pub use self::{
    debug_sink::{DebugSink, StderrSink},
    opcode::{AluOp, Convert, EndKind, Field, Opcode, Relation, Tag},
    state_view::StateView,
    tracer::Tracer,
};

mod debug_sink;
mod opcode;
mod state_view;
mod tracer;
