//! Configuration constants (§6 Limits). Fixed at compile time, not dynamic.

/// Word capacity of the memory array and of the storage array.
pub const MEMORY_SIZE: usize = 64;
pub const STORAGE_SIZE: usize = 64;

/// Register file size: index 0 is the program counter, 1..9 are
/// general-purpose.
pub const NUM_REGISTERS: usize = 10;

/// Maximum number of distinct labels a program may define.
pub const MAX_LABELS: usize = 16;

/// Infinite-loop guard: aborts a run once this many branch evaluations
/// have been recorded.
pub const MAX_LABEL_JUMPS: u32 = 1000;
