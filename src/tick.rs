//! Tick Accountant (C5): invoked once per timer tick under `ptable.lock`
//! (§4.5). Updates `rtime`/`wtime` for every live PCB and, under MLFQ,
//! drives both halves of aging: per-tick promotion of a process that has
//! waited too long outside the top queue, and flagging a RUNNING
//! process's slice as exhausted.

#[cfg(feature = "mlfq")]
use crate::param::AGE;
use crate::proc::{ProcState, ProcTableState};

/// Advance the global tick counter and account one tick's worth of
/// rtime/wtime (and, under MLFQ, slice/aging bookkeeping) for every
/// non-UNUSED PCB.
pub fn account(state: &mut ProcTableState) {
    state.ticks += 1;
    let now = state.ticks;

    for i in 0..state.procs.len() {
        if state.procs[i].state == ProcState::Unused {
            continue;
        }
        if state.procs[i].state == ProcState::Running {
            state.procs[i].rtime += 1;
            #[cfg(feature = "mlfq")]
            {
                let q = state.procs[i].curr_queue;
                state.procs[i].ticks[q] += 1;
                state.procs[i].curr_ticks += 1;
                if state.procs[i].curr_ticks >= crate::param::Q_TICKS_MAX[q] {
                    state.procs[i].change_q = true;
                }
            }
        } else {
            state.procs[i].wtime += 1;
            #[cfg(feature = "mlfq")]
            if state.procs[i].state == ProcState::Runnable {
                age_waiting(state, i, now);
            }
        }
    }
}

/// §4.5's second aging path: a RUNNABLE PCB outside the top queue whose
/// wait since its `curr_ticks` stamp exceeds `AGE` is promoted one level,
/// resetting `curr_ticks` and `wtime` — mirrors
/// `examples/original_source/proc.c`'s `change_time()` exactly, including
/// its reuse of `curr_ticks` (rather than `enter`) as the wait-since
/// marker for this particular check. `scheduler::pick_next`'s own aging
/// sweep (keyed on `enter`) is the other half of §4.4 step 1; the two are
/// independent per the source and both are preserved. Only RUNNABLE PCBs
/// hold a queue slot (§8 invariant 2), so this must move `idx` out of its
/// current queue `q`, not just insert it into `q - 1`.
#[cfg(feature = "mlfq")]
fn age_waiting(state: &mut ProcTableState, idx: usize, now: u64) {
    let q = state.procs[idx].curr_queue;
    if q == 0 {
        return;
    }
    if now.saturating_sub(state.procs[idx].curr_ticks) <= AGE {
        return;
    }
    state.procs[idx].curr_ticks = 0;
    state.procs[idx].wtime = 0;
    state
        .queues
        .shift_proc_q(&mut state.procs, now, idx, Some(q), Some(q - 1));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_process_accrues_rtime_not_wtime() {
        let mut state = ProcTableState::new();
        state.procs[0].state = ProcState::Running;
        state.procs[0].pid = 1;
        account(&mut state);
        assert_eq!(state.procs[0].rtime, 1);
        assert_eq!(state.procs[0].wtime, 0);
    }

    #[test]
    fn runnable_process_accrues_wtime() {
        let mut state = ProcTableState::new();
        state.procs[0].state = ProcState::Runnable;
        state.procs[0].pid = 1;
        account(&mut state);
        assert_eq!(state.procs[0].wtime, 1);
    }

    #[test]
    fn unused_slots_are_left_alone() {
        let mut state = ProcTableState::new();
        account(&mut state);
        assert_eq!(state.procs[0].rtime, 0);
        assert_eq!(state.procs[0].wtime, 0);
    }

    #[cfg(feature = "mlfq")]
    #[test]
    fn slice_exhaustion_sets_change_q() {
        let mut state = ProcTableState::new();
        state.procs[0].pid = 1;
        state.procs[0].state = ProcState::Running;
        state.procs[0].curr_queue = 0;
        account(&mut state);
        assert!(state.procs[0].change_q);
    }
}
