//! S5 (§8 scenarios): a parent blocked in `waitx` on its own channel wakes
//! exactly once when its child exits, reaps it, and the reported
//! `rtime + wtime` accounts for the child's whole lifetime.

use std::time::{Duration, Instant};

use xv6_sched_core::proc::{self, ProcState, ProcTableState, PROC_TABLE};

fn reset() {
    let mut state = PROC_TABLE.state.lock();
    *state = ProcTableState::new();
}

fn wait_until<F: Fn() -> bool>(f: F) {
    let start = Instant::now();
    while !f() {
        assert!(start.elapsed() < Duration::from_secs(5), "timed out waiting for condition");
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn parent_wakes_once_and_reaps_with_consistent_accounting() {
    reset();
    let init = proc::user_init();
    let parent = proc::fork(init).unwrap();
    let child = proc::fork(parent).unwrap();

    let child_pid = {
        let mut state = PROC_TABLE.state.lock();
        state.procs[child].rtime = 3;
        state.procs[child].pid
    };

    let parent_thread = std::thread::spawn(move || proc::waitx(parent));

    // `waitx` finds no zombie child yet and blocks on its own channel.
    wait_until(|| PROC_TABLE.state.lock().procs[parent].state == ProcState::Sleeping);

    {
        let mut state = PROC_TABLE.state.lock();
        state.ticks = 10;
    }
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| proc::exit(child)));
    assert!(result.is_err(), "exit() unwinds rather than returning");

    let reaped = parent_thread.join().unwrap();
    let (pid, rtime, wtime) = reaped.expect("parent must observe the reaped child");

    assert_eq!(pid, child_pid);
    assert_eq!(rtime, 3);
    assert_eq!(rtime + wtime, 10, "rtime + wtime must equal etime - ctime");

    let state = PROC_TABLE.state.lock();
    assert_eq!(state.procs[parent].state, ProcState::Runnable, "woken exactly once, not left sleeping");
}
