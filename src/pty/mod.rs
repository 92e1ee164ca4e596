//! Pseudoterminal (PTY) management
//!
//! Owns the OS pseudo-terminal pair and the spawned child process, and
//! provides byte-oriented I/O that never blocks the caller: a dedicated
//! reader thread delivers output chunks, a wait thread reports child exit,
//! and writes retry briefly on would-block before failing.

pub mod handle;

pub use handle::{PtyHandle, SIGNAL_EXIT_CODE};
