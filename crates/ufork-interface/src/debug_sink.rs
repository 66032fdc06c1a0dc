use std::fmt;

/// The target of the `debug tag v` instruction (spec.md §6): an external
/// collaborator the VM writes diagnostics to, kept as a trait for the same
/// reason `World` is a trait in the teacher crate — tests substitute an
/// in-memory sink instead of capturing stderr.
pub trait DebugSink {
    /// Emit `tag: value` (exact formatting is unspecified by spec.md §6; this
    /// trait only fixes the two logical fields).
    fn emit(&mut self, tag: i64, value: &dyn fmt::Display);
}

/// Default sink: writes `tag: value` to stderr, one line per call.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl DebugSink for StderrSink {
    fn emit(&mut self, tag: i64, value: &dyn fmt::Display) {
        eprintln!("{tag}: {value}");
    }
}
