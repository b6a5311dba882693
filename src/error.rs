use thiserror::Error;

/// Failures surfaced by the manager.
///
/// Out-of-memory is the only recoverable condition: it is raised by node
/// insertion when growing the pool would exceed the configured ceiling, and
/// the evaluator retries the computation once after a full garbage collection
/// before letting it escape. Everything else (malformed handles, cross-manager
/// use, precondition violations) is a programmer error and panics.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum Error {
    #[error("node pool limit reached")]
    MemOut,
}

pub type Result<T> = std::result::Result<T, Error>;
