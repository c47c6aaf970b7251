//! S3 (§8 scenarios): a RUNNABLE process that waits in a non-top MLFQ
//! queue for longer than `AGE` ticks is promoted one level, and repeated
//! long waits promote it again.
#![cfg(feature = "mlfq")]

use xv6_sched_core::mlfq;
use xv6_sched_core::param::AGE;
use xv6_sched_core::proc::{self, ProcTableState, ProcState, PROC_TABLE};
use xv6_sched_core::scheduler;

fn reset() {
    let mut state = PROC_TABLE.state.lock();
    *state = ProcTableState::new();
}

#[test]
fn long_wait_in_queue_three_promotes_to_queue_two_then_one() {
    reset();
    let init = proc::user_init();
    let p1 = proc::fork(init).unwrap();

    let mut state = PROC_TABLE.state.lock();
    // `user_init` leaves init RUNNABLE and enqueued at the head of queue 0;
    // take it out of the run queue so it doesn't outrank `busy` below.
    state.procs[init].state = ProcState::Sleeping;
    mlfq::remove(&mut state.queues, init);
    // Park P1 directly in queue 3, as if it had already been demoted
    // there by prior slice exhaustion.
    mlfq::remove(&mut state.queues, p1);
    mlfq::enqueue_at(&mut state.queues, &mut state.procs, 0, p1, 3);
    assert_eq!(state.procs[p1].curr_queue, 3);

    // A steady stream of queue-0 work alongside it, never itself aged.
    let busy = proc::fork(init).unwrap();
    assert_eq!(state.procs[busy].curr_queue, 0);

    state.ticks = AGE + 1;
    let picked = scheduler::pick_next(&mut state).unwrap();
    // Queue 0 (busy) still outranks the now-promoted queue 2, so busy
    // dispatches first; P1 must already show as promoted regardless.
    assert_eq!(picked, busy);
    assert_eq!(state.procs[p1].curr_queue, 2, "promoted after > AGE ticks");
    assert_eq!(state.procs[p1].state, ProcState::Runnable);

    // Re-insert (the aging sweep popped nothing off p1's new queue) and
    // wait past AGE again.
    state.procs[busy].state = ProcState::Zombie;
    mlfq::remove(&mut state.queues, busy);

    state.ticks = state.procs[p1].enter + AGE + 1;
    let picked = scheduler::pick_next(&mut state).unwrap();
    assert_eq!(picked, p1);
    assert_eq!(state.procs[p1].curr_queue, 1, "promoted a second time");
}
