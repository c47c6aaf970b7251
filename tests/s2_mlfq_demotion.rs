//! S2 (§8 scenarios): a single CPU-bound child demotes one queue level
//! each time its slice is exhausted. Trace of `curr_queue` over ticks
//! [0,1,2,3,7] must be [0,1,1,2,3].
#![cfg(feature = "mlfq")]

use xv6_sched_core::proc::{self, ProcTableState, ProcState, PROC_TABLE};
use xv6_sched_core::{mlfq, scheduler, tick};

fn reset() {
    let mut state = PROC_TABLE.state.lock();
    *state = ProcTableState::new();
}

/// Run one scheduler iteration: pick, mark running, tick once, and if the
/// tick exhausted the slice, requeue (demote) before returning.
fn step(child: usize) {
    let mut state = PROC_TABLE.state.lock();
    if state.procs[child].state == ProcState::Runnable {
        let picked = scheduler::pick_next(&mut state).unwrap();
        assert_eq!(picked, child);
        scheduler::mark_running(&mut state, picked);
    }
    tick::account(&mut state);
    if state.procs[child].change_q {
        state.procs[child].state = ProcState::Runnable;
        scheduler::requeue_after_run(&mut state, child);
    }
}

#[test]
fn demotes_one_queue_level_per_exhausted_slice() {
    reset();
    let init = proc::user_init();
    let child = proc::fork(init).unwrap();

    // `user_init` leaves init RUNNABLE and enqueued at the head of queue 0
    // ahead of `child`; take it out of the run queue so the single-child
    // trace below is not dispatching init instead.
    {
        let mut state = PROC_TABLE.state.lock();
        state.procs[init].state = ProcState::Sleeping;
        mlfq::remove(&mut state.queues, init);
    }

    let mut trace = Vec::new();
    for _ in 0..7 {
        step(child);
        let state = PROC_TABLE.state.lock();
        trace.push(state.procs[child].curr_queue);
    }

    // ticks [1,2,3,4,5,6,7] -> queue after each tick; indices [0,1,2,6]
    // correspond to the spec's sampled ticks [1,2,3,7] (tick 0 is the
    // initial dispatch with no tick yet accounted, already queue 0).
    assert_eq!(trace[0], 1, "tick 1: queue-0 slice (1 tick) exhausted");
    assert_eq!(trace[1], 1, "tick 2: queue-1 slice (2 ticks) not yet exhausted");
    assert_eq!(trace[2], 2, "tick 3: queue-1 slice exhausted");
    assert_eq!(trace[6], 3, "tick 7: queue-2 slice (4 ticks) exhausted");
}
