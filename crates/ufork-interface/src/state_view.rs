/// Read-only view of a running continuation, for tracers and debuggers.
///
/// Heap cells are addressed by plain `usize` indices here rather than by the
/// VM's internal handle type, so that a tracer crate never needs to depend
/// on `ufork`'s cell representation — only on this stable interface.
pub trait StateView {
    /// Index of the instruction cell about to execute.
    fn ip(&self) -> usize;
    /// Index of the cons cell at the top of the operand stack, or the `NIL` index if empty.
    fn sp(&self) -> usize;
    /// Index of the event this continuation is handling.
    fn ep(&self) -> usize;
    /// Index of the actor handling the current event.
    fn self_actor(&self) -> usize;
    /// Number of items currently on the operand stack.
    fn stack_depth(&self) -> usize;
}
