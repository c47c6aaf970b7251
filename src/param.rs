//! Build-time tunables for the scheduling core.

/// Maximum number of CPUs.
pub const NCPU: usize = 8;
/// Maximum number of processes in the process table.
pub const NPROC: usize = 64;
/// Open files per process. The scheduler never inspects these; they exist
/// only so `Pcb` mirrors the real PCB shape (owned by the file-table
/// collaborator, out of scope here).
pub const NOFILE: usize = 16;

/// Default process priority under PBS (lower value = higher priority).
pub const DEFAULT_PRIORITY: u8 = 60;
/// Valid priority range, inclusive.
pub const PRIORITY_RANGE: core::ops::RangeInclusive<u8> = 0..=100;

/// Number of MLFQ queues.
pub const NQUEUE: usize = 5;
/// Ticks a RUNNABLE process may wait in a non-top queue before it is
/// promoted one level.
pub const AGE: u64 = 20;
/// Per-queue time slice allotments, in ticks. Index 0 is the highest
/// priority queue.
pub const Q_TICKS_MAX: [u64; NQUEUE] = [1, 2, 4, 8, 16];
