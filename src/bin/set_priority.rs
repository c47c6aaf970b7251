//! `setPriority <new> <pid>` (§6 "User tools"): exits non-zero with a
//! usage message if `argc != 3` or `new` is outside `[0, 100]`.

use xv6_sched_core::proc;
use xv6_sched_core::println;
use xv6_sched_core::syscall::{Syscall, SyscallArgs, SyscallResult, dispatch};

fn main() {
    let argv: Vec<String> = std::env::args().collect();
    if argv.len() != 3 {
        println!("Usage: setPriority <new_priority> <pid>");
        std::process::exit(1);
    }

    let new: i64 = match argv[1].parse() {
        Ok(n) => n,
        Err(_) => {
            println!("Usage: setPriority <new_priority> <pid>");
            std::process::exit(1);
        }
    };
    let pid: i64 = match argv[2].parse() {
        Ok(n) => n,
        Err(_) => {
            println!("Usage: setPriority <new_priority> <pid>");
            std::process::exit(1);
        }
    };

    if !(0..=100).contains(&new) {
        println!("<new_priority> should be between 0 and 100");
        std::process::exit(1);
    }

    let caller = proc::user_init();
    let args = SyscallArgs::new(caller, [new, pid]);
    match dispatch(Syscall::SetPriority as usize, &args) {
        Ok(SyscallResult::Value(old)) => {
            println!(
                "Process {} priority changed: Old priority {} -> New priority {}",
                pid, old, new
            );
        }
        _ => println!("PID not found"),
    }
}
