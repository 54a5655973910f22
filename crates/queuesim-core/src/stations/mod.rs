//! The station library: Source, Process, Delay, Decide, Dispose, Batcher,
//! and Separator.

pub mod batcher;
pub mod decide;
pub mod delay;
pub mod dispose;
pub mod process;
pub mod separator;
pub mod source;

/// Queueing discipline for a [`process::ProcessState`] when no explicit
/// priority function is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discipline {
    Fifo,
    Lifo,
}
