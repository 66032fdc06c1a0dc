//! # uFork
//!
//! An actor virtual machine over a uniformly-typed cell heap (spec.md §1-§9):
//! a fixed-capacity 4-field cell heap with mark-and-sweep GC, a
//! transactional actor model, event/continuation queues, a ~30-opcode
//! instruction set, and the single-threaded cooperative runtime loop that
//! ties them together.
//!
//! The stable cross-crate surface — [`ufork_interface::Tag`],
//! [`ufork_interface::Opcode`], [`ufork_interface::Tracer`],
//! [`ufork_interface::StateView`] — lives in the sibling `ufork_interface`
//! crate so a tracer or debugger can depend on it without depending on this
//! crate's internal cell representation.

pub mod actor;
pub mod cell;
pub mod clock;
pub mod console;
pub mod continuation;
pub mod error;
mod gc;
pub mod image;
mod opcodes;
pub mod queue;
pub mod settings;
pub mod symbol;
pub mod vm;
pub mod word;

pub use crate::{
    error::Fault,
    gc::GcStats,
    settings::{Settings, WordWidth},
    vm::{ContinuationStateView, Runtime, StepReport},
};
