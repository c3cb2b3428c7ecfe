/// Errors reported by [`Runtime::try_block_on`](super::Runtime::try_block_on).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    /// Nothing can make progress: no task is ready, no timer is armed and
    /// the future has not completed.
    ///
    /// This usually means a deadlock, such as a task acquiring a mutex it
    /// already holds.
    #[error("runtime stalled with {pending} pending task(s) and no armed timer")]
    Stalled {
        /// Number of spawned tasks that have not finished.
        pending: usize,
    },

    /// `block_on` was called from inside a running runtime.
    #[error("cannot start a runtime from within a runtime")]
    Nested,
}
