//! Syscall numbering and argument marshaling (§6 "System calls exposed").
//!
//! On real xv6/octopos, syscall arguments arrive in trapframe registers
//! (`a0`..`a7`) and the number in `a7`; the full trapframe and its VA
//! accessors belong to the trap-entry/VM collaborators this crate treats
//! as out of scope (§1). What the scheduling core needs from a syscall is
//! just: which caller, which operation, and up to two integer arguments —
//! so `SyscallArgs` keeps the teacher's indexed-accessor shape
//! (`get_raw`/`get_int`) without the register file underneath it.

use crate::sysproc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyscallError {
    Unknown(usize),
    Fork,
    Wait,
    Kill,
    SetPriority,
}

/// System call numbers (§6).
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syscall {
    Fork = 1,
    Exit = 2,
    Wait = 3,
    Waitx = 4,
    Kill = 5,
    Getpid = 6,
    SleepTicks = 7,
    SetPriority = 8,
    Printpinfos = 9,
}

impl TryFrom<usize> for Syscall {
    type Error = SyscallError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Syscall::Fork),
            2 => Ok(Syscall::Exit),
            3 => Ok(Syscall::Wait),
            4 => Ok(Syscall::Waitx),
            5 => Ok(Syscall::Kill),
            6 => Ok(Syscall::Getpid),
            7 => Ok(Syscall::SleepTicks),
            8 => Ok(Syscall::SetPriority),
            9 => Ok(Syscall::Printpinfos),
            _ => Err(SyscallError::Unknown(value)),
        }
    }
}

/// Up to two integer arguments for a syscall, plus the caller's process
/// table slot. Mirrors the teacher's `SyscallArgs` indexed-accessor shape.
pub struct SyscallArgs {
    caller: usize,
    args: [i64; 2],
}

impl SyscallArgs {
    pub fn new(caller: usize, args: [i64; 2]) -> Self {
        SyscallArgs { caller, args }
    }

    pub fn caller(&self) -> usize {
        self.caller
    }

    pub fn get_raw(&self, index: usize) -> i64 {
        self.args[index]
    }

    pub fn get_int(&self, index: usize) -> i64 {
        self.get_raw(index)
    }
}

/// Return value of a syscall that doesn't `!`-diverge: a single integer,
/// matching the trapframe's `a0` return-value register convention, or a
/// pair for `waitx`'s two out-parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyscallResult {
    Value(i64),
    Waitx { pid: i64, rtime: u64, wtime: u64 },
}

/// Dispatch a non-exiting syscall by number. `Syscall::Exit` is handled
/// separately by callers since it never returns.
pub fn dispatch(number: usize, args: &SyscallArgs) -> Result<SyscallResult, SyscallError> {
    let syscall = Syscall::try_from(number)?;
    match syscall {
        Syscall::Fork => sysproc::sys_fork(args).map(SyscallResult::Value),
        Syscall::Exit => unreachable!("Syscall::Exit never returns; call proc::exit directly"),
        Syscall::Wait => sysproc::sys_wait(args).map(SyscallResult::Value),
        Syscall::Waitx => sysproc::sys_waitx(args),
        Syscall::Kill => sysproc::sys_kill(args).map(SyscallResult::Value),
        Syscall::Getpid => Ok(SyscallResult::Value(sysproc::sys_getpid(args))),
        Syscall::SleepTicks => sysproc::sys_sleep_ticks(args).map(SyscallResult::Value),
        Syscall::SetPriority => sysproc::sys_set_priority(args).map(SyscallResult::Value),
        Syscall::Printpinfos => {
            sysproc::sys_printpinfos();
            Ok(SyscallResult::Value(0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_syscall_number_is_rejected() {
        let args = SyscallArgs::new(0, [0, 0]);
        assert_eq!(dispatch(999, &args), Err(SyscallError::Unknown(999)));
    }

    #[test]
    fn getpid_roundtrips_through_dispatch() {
        let mut state = crate::proc::PROC_TABLE.state.lock();
        *state = crate::proc::ProcTableState::new();
        drop(state);
        let init = crate::proc::user_init();
        let pid = { crate::proc::PROC_TABLE.state.lock().procs[init].pid };

        let args = SyscallArgs::new(init, [0, 0]);
        assert_eq!(
            dispatch(Syscall::Getpid as usize, &args),
            Ok(SyscallResult::Value(pid as i64))
        );
    }
}
