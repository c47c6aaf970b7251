//! Priority & Introspection (C7): the `ps`-facing snapshot dump.
//!
//! Grounded in `examples/original_source/proc.c`'s `printpinfos()`. The
//! raw source picks a state label with independent `if`s, so only the
//! *last* true condition wins — since the final arm has no `if` at all,
//! every process except `UNUSED`/`EMBRYO`/`SLEEPING`/`RUNNABLE` prints as
//! `"ZOMBIE"`, including `RUNNING` (§9, flagged as a bug to fix, not
//! preserve). This is an `if`/`else if` chain instead.

use crate::println;
use crate::proc::{ProcState, ProcTableState};

fn state_label(state: ProcState) -> &'static str {
    match state {
        ProcState::Unused => "UNUSED",
        ProcState::Embryo => "EMBRYO",
        ProcState::Sleeping => "SLEEPING",
        ProcState::Runnable => "RUNNABLE",
        ProcState::Running => "RUNNING",
        ProcState::Zombie => "ZOMBIE",
    }
}

/// `printpinfos() -> 0` (§4.7): snapshot every PCB with `pid != 0`.
pub fn printpinfos(state: &ProcTableState) {
    for p in state.procs.iter() {
        if p.pid == 0 {
            continue;
        }

        #[cfg(feature = "mlfq")]
        println!(
            " {}\t{}\t{}\t{}\t{}\t{}\t{}  |  {}    {}    {}    {}    {}",
            p.pid,
            p.priority,
            state_label(p.state),
            p.rtime,
            p.wtime,
            p.n_run,
            p.curr_queue,
            p.ticks[0],
            p.ticks[1],
            p.ticks[2],
            p.ticks[3],
            p.ticks[4],
        );

        #[cfg(not(feature = "mlfq"))]
        println!(
            " {}\t{}\t{}\t{}\t{}",
            p.pid,
            p.priority,
            state_label(p.state),
            p.rtime,
            p.wtime,
        );
    }
}
