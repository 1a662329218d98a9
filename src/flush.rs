//! Flush policies.

/// Controls when the collection gets written to disk.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlushPolicy {
    /// Write after every insert/update/remove, before the call returns.
    #[default]
    Immediate,
    /// Only write when you call `flush()` yourself.
    Manual,
}
