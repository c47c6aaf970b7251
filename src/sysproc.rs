//! Syscall bodies (§6): thin shims over `proc`/`scheduler`/`introspection`
//! that translate between `SyscallArgs`/`SyscallResult` and the scheduling
//! core's native types.

use crate::introspection;
use crate::proc::{self, Channel, PROC_TABLE};
use crate::scheduler;
use crate::syscall::{SyscallArgs, SyscallError, SyscallResult};

/// `exit() -> !` (§6): never returns.
pub fn sys_exit(args: &SyscallArgs) -> ! {
    proc::exit(args.caller())
}

/// `getpid() -> pid` (§6).
pub fn sys_getpid(args: &SyscallArgs) -> i64 {
    PROC_TABLE.state.lock().procs[args.caller()].pid as i64
}

/// `fork() -> pid` (§6).
pub fn sys_fork(args: &SyscallArgs) -> Result<i64, SyscallError> {
    let child = crate::try_log!(proc::fork(args.caller()).map_err(|_| SyscallError::Fork));
    Ok(PROC_TABLE.state.lock().procs[child].pid as i64)
}

/// `wait() -> pid | -1` (§6).
pub fn sys_wait(args: &SyscallArgs) -> Result<i64, SyscallError> {
    proc::wait(args.caller())
        .map(|pid| pid as i64)
        .ok_or(SyscallError::Wait)
}

/// `waitx(&wtime, &rtime) -> pid | -1` (§6).
pub fn sys_waitx(args: &SyscallArgs) -> Result<SyscallResult, SyscallError> {
    proc::waitx(args.caller())
        .map(|(pid, rtime, wtime)| SyscallResult::Waitx {
            pid: pid as i64,
            rtime,
            wtime,
        })
        .ok_or(SyscallError::Wait)
}

/// `kill(pid) -> 0 | -1` (§6).
pub fn sys_kill(args: &SyscallArgs) -> Result<i64, SyscallError> {
    let pid = args.get_int(0) as usize;
    if proc::kill(pid) {
        Ok(0)
    } else {
        crate::err!(SyscallError::Kill);
    }
}

/// `sleep_ticks(n)` (§6): block the caller for `n` ticks on the shared
/// `Channel::Ticks` rendezvous. `kill`ed sleepers return early.
pub fn sys_sleep_ticks(args: &SyscallArgs) -> Result<i64, SyscallError> {
    let n = args.get_int(0).max(0) as u64;
    let target = { PROC_TABLE.state.lock().ticks + n };

    loop {
        let now = PROC_TABLE.state.lock().ticks;
        if now >= target {
            return Ok(0);
        }
        if proc::is_killed(args.caller()) {
            return Ok(0);
        }
        proc::sleep_on_channel(args.caller(), Channel::Ticks);
    }
}

/// `set_priority(new, pid) -> old | -1` (§6, §4.7).
pub fn sys_set_priority(args: &SyscallArgs) -> Result<i64, SyscallError> {
    let new = args.get_int(0);
    let pid = args.get_int(1) as usize;
    if !(0..=100).contains(&new) {
        return Err(SyscallError::SetPriority);
    }
    let mut state = PROC_TABLE.state.lock();
    scheduler::set_priority(&mut state, pid, new as u8)
        .map(|old| old as i64)
        .ok_or(SyscallError::SetPriority)
}

/// `printpinfos() -> 0` (§6, §4.7).
pub fn sys_printpinfos() {
    let state = PROC_TABLE.state.lock();
    introspection::printpinfos(&state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proc::ProcTableState;
    use crate::syscall::SyscallArgs;

    fn reset() {
        let mut state = PROC_TABLE.state.lock();
        *state = ProcTableState::new();
    }

    #[test]
    fn getpid_reports_the_callers_pid() {
        reset();
        let init = proc::user_init();
        let pid = { PROC_TABLE.state.lock().procs[init].pid };
        let args = SyscallArgs::new(init, [0, 0]);
        assert_eq!(sys_getpid(&args), pid as i64);
    }

    #[test]
    fn set_priority_rejects_out_of_range_values() {
        reset();
        let init = proc::user_init();
        let pid = { PROC_TABLE.state.lock().procs[init].pid };
        let args = SyscallArgs::new(init, [101, pid as i64]);
        assert_eq!(sys_set_priority(&args), Err(SyscallError::SetPriority));
    }

    #[test]
    fn set_priority_returns_the_old_value() {
        reset();
        let init = proc::user_init();
        let pid = { PROC_TABLE.state.lock().procs[init].pid };
        let args = SyscallArgs::new(init, [40, pid as i64]);
        assert_eq!(sys_set_priority(&args), Ok(60));
    }

    #[test]
    fn kill_of_unknown_pid_fails() {
        reset();
        let _init = proc::user_init();
        let args = SyscallArgs::new(0, [99999, 0]);
        assert_eq!(sys_kill(&args), Err(SyscallError::Kill));
    }
}
