//! Process scheduling core for a small teaching OS kernel.
//!
//! Owns the process table, admits processes to the run queues, picks
//! which process a CPU executes next, and accounts for CPU/wait time,
//! under one of four build-time-selected dispatch policies.
//!
//! The virtual-memory layer, file system, trap/interrupt entry paths, the
//! low-level context switch primitive, and hardware spinlock primitives
//! are external collaborators and out of scope for this crate.

#[cfg(not(any(feature = "rr", feature = "fcfs", feature = "pbs", feature = "mlfq")))]
compile_error!("exactly one of the `rr`, `fcfs`, `pbs`, `mlfq` features must be enabled");

#[cfg(any(
    all(feature = "rr", feature = "fcfs"),
    all(feature = "rr", feature = "pbs"),
    all(feature = "rr", feature = "mlfq"),
    all(feature = "fcfs", feature = "pbs"),
    all(feature = "fcfs", feature = "mlfq"),
    all(feature = "pbs", feature = "mlfq"),
))]
compile_error!("the `rr`, `fcfs`, `pbs`, `mlfq` features are mutually exclusive");

pub mod console;
pub mod error;
pub mod introspection;
pub mod mlfq;
pub mod param;
pub mod printf;
pub mod proc;
pub mod scheduler;
pub mod spinlock;
pub mod sync;
pub mod syscall;
pub mod sysproc;
pub mod tick;
