//! `time <cmd> [args...]` (§6 "User tools"): forks, the child execs the
//! command, the parent `waitx`es and prints the accounted `rtime`/`wtime`.
//!
//! `exec` itself belongs to the file-system/VM collaborators this crate
//! treats as out of scope (§1); the child here actually runs `cmd` as a
//! real OS subprocess while its scheduling-core PCB accounts the
//! surrounding ticks, so the printed `rtime`/`wtime` reflect this crate's
//! own tick accountant rather than wall-clock time.

use xv6_sched_core::proc;
use xv6_sched_core::println;
use xv6_sched_core::syscall::{Syscall, SyscallArgs, SyscallResult, dispatch};
use xv6_sched_core::tick;

fn main() {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    if argv.is_empty() {
        println!("Usage: time <cmd> [args...]");
        std::process::exit(1);
    }

    let parent = proc::user_init();
    let child = proc::fork(parent).expect("time: fork failed");

    // The child's "workload": actually run the requested command, then
    // exit. `proc::exit` never returns (§6); it unwinds back here via the
    // same `ExitUnwind` panic the scheduler's dispatch loop catches.
    let run_child = std::panic::AssertUnwindSafe(|| {
        {
            let mut state = proc::PROC_TABLE.state.lock();
            state.procs[child].state = proc::ProcState::Running;
            tick::account(&mut state);
        }
        let status = std::process::Command::new(&argv[0]).args(&argv[1..]).status();
        match status {
            Ok(s) if !s.success() => eprintln!("time: {} exited with {}", argv[0], s),
            Err(e) => eprintln!("time: failed to run {}: {}", argv[0], e),
            _ => {}
        }
        proc::exit(child);
    });
    let _ = std::panic::catch_unwind(run_child);

    let args = SyscallArgs::new(parent, [0, 0]);
    match dispatch(Syscall::Waitx as usize, &args) {
        Ok(SyscallResult::Waitx { rtime, wtime, .. }) => {
            println!("rtime = {}, wtime = {}", rtime, wtime);
        }
        _ => println!("time: waitx failed"),
    }
}
