//! The loopback module provides an instrument simulator for testing purposes.
//!
//! The [`LoopbackInterfaceString`] allows to test instrument drivers that communicate using
//! strings (which are then encoded as bytes of course) and have a fixed terminator to declare
//! the end of a line.
//!
//! The [`LoopbackInterfaceBytes`] covers drivers that exchange raw byte frames, e.g., over
//! USB bulk endpoints. Each scripted response entry is served as one frame; once the script
//! is exhausted, further frame reads time out the same way a drained hardware buffer would.
//!
//! Check out the interface documentation for details and examples on how to use them. You can
//! also find simple and more advanced test examples that use the loopback interfaces in the
//! instrument driver crates of this workspace.

mod loopback_interface_bytes;
mod loopback_interface_string;

pub use loopback_interface_bytes::*;
pub use loopback_interface_string::*;

/// A self-incrementing index structure that by default starts at 0 and increments whenever
/// `next` is called.
#[derive(Debug, Default)]
struct IncrIndex {
    index: usize,
}

impl IncrIndex {
    fn next(&mut self) -> usize {
        let current = self.index;
        self.index += 1;
        current
    }

    fn peek(&self) -> usize {
        self.index
    }
}
