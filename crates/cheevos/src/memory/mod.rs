//! Memory access adapter.
//!
//! Achievement addresses start at `$00000000`, which normally maps to the
//! first byte of system RAM. Hosts expose memory through [`ReadMemory`];
//! the runtime wraps it in a [`MemoryReader`] that never fails: bytes the
//! host cannot provide read as zero.

mod reader;

pub use reader::{FnMemory, MemoryReader, ReadMemory};
