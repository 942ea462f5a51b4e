use core::fmt;

/// Internal diagnostic detail for memory subsystem failures.
///
/// This never escapes the crate as a `Result`; every public allocator
/// entry point still returns a plain `Option`/null pointer as the
/// out-of-memory contract, with this logged to serial first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// No Multiboot memory map tag with at least one available region.
    NoUsableMemory,
    /// The physical frame allocator has no clear bits left.
    FramesExhausted,
    /// The heap window could not be grown because frames ran out.
    HeapExhausted,
    /// A heap segment header failed its magic-number check.
    HeapCorruption,
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::NoUsableMemory => write!(f, "no usable memory region in the Multiboot memory map"),
            MemoryError::FramesExhausted => write!(f, "physical frame allocator is out of frames"),
            MemoryError::HeapExhausted => write!(f, "heap could not be grown, frame allocator exhausted"),
            MemoryError::HeapCorruption => write!(f, "heap segment header has an invalid magic number"),
        }
    }
}
