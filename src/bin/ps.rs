//! `ps` (§6 "User tools"): no arguments, prints a header then the
//! scheduler's `printpinfos` snapshot.
//!
//! On real xv6/octopos this is a tiny userspace binary that traps into
//! the kernel's `printpinfos` syscall; here, in the host-testable
//! rendering, it links the scheduling core directly and drives it against
//! a freshly bootstrapped process table (there is no other kernel process
//! to share state with in a standalone host binary).

use xv6_sched_core::proc;
use xv6_sched_core::println;
use xv6_sched_core::syscall::{Syscall, SyscallArgs, dispatch};

fn main() {
    if std::env::args().count() != 1 {
        println!("Usage: ps");
        std::process::exit(1);
    }

    let init = proc::user_init();
    println!(
        "PID Priority   State   r_time w_time  n_run  cur_q  | q0  q1  q2  q3  q4"
    );

    let args = SyscallArgs::new(init, [0, 0]);
    let _ = dispatch(Syscall::Printpinfos as usize, &args);
}
