use std::fmt;

/// Process-fatal failure (spec.md §7, tier 1). Returned up through
/// [`crate::Runtime::step`] and [`crate::Runtime::run`] — the caller decides
/// what "exit" means (the teacher's own `Panic`/`ExecutionEnd` split plays
/// the same role: a plain enum, propagated by `?`, with no `thiserror`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// The heap's free-list is empty and its frontier has reached capacity.
    OutOfMemory,
    /// A sanity counter guarding a suspected-infinite list walk ran out
    /// (spec.md §7: "sanity-counter exhaustion on a suspected infinite list
    /// walk").
    SanityLimitExceeded {
        /// What operation was walking the list.
        context: &'static str,
    },
    /// An internal invariant was violated — a bug in the VM itself, not in
    /// the program it is running.
    Invariant(&'static str),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::OutOfMemory => write!(f, "out of memory: heap at capacity"),
            Fault::SanityLimitExceeded { context } => {
                write!(f, "sanity limit exceeded while {context}")
            }
            Fault::Invariant(msg) => write!(f, "internal invariant violated: {msg}"),
        }
    }
}

impl std::error::Error for Fault {}
