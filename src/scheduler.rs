//! Dispatch Policies (C4): exactly one of RR, FCFS, PBS, MLFQ is compiled
//! in (§6 "Build-time configuration"), each specializing `pick_next` and
//! (PBS, MLFQ) the preemption/requeue decision around the same process
//! table substrate. Per §1 the actual context switch ("switch user page
//! table, context-switch into it") is an external collaborator; this
//! module only makes the scheduling *decisions* a per-CPU dispatch loop
//! would act on.

use crate::param::{AGE, NPROC, PRIORITY_RANGE};
use crate::proc::{ProcState, ProcTableState};

/// Select the next PCB to run, mutating whatever bookkeeping the active
/// policy needs to perform the selection (MLFQ's aging sweep and queue
/// pop). Returns `None` if no PCB is RUNNABLE.
pub fn pick_next(state: &mut ProcTableState) -> Option<usize> {
    #[cfg(feature = "rr")]
    {
        pick_rr(state)
    }
    #[cfg(feature = "fcfs")]
    {
        pick_fcfs(state)
    }
    #[cfg(feature = "pbs")]
    {
        pick_pbs(state)
    }
    #[cfg(feature = "mlfq")]
    {
        pick_mlfq(state)
    }
}

/// **RR** (§4.4): linear scan from index 0; first RUNNABLE dispatched.
/// Fairness comes from ticks preempting via `yield`, not round-robin-by-
/// index bookkeeping.
#[cfg(feature = "rr")]
fn pick_rr(state: &ProcTableState) -> Option<usize> {
    (0..NPROC).find(|&i| state.procs[i].state == ProcState::Runnable)
}

/// **FCFS** (§4.4): RUNNABLE with minimum `ctime`, ties broken by lower
/// index. Non-preemptive — the timer tick never forces this policy's
/// running process off (enforced by callers never invoking `yield` purely
/// on slice exhaustion under this feature).
#[cfg(feature = "fcfs")]
fn pick_fcfs(state: &ProcTableState) -> Option<usize> {
    let mut best: Option<usize> = None;
    for i in 0..NPROC {
        if state.procs[i].state != ProcState::Runnable {
            continue;
        }
        match best {
            None => best = Some(i),
            Some(b) if state.procs[i].ctime < state.procs[b].ctime => best = Some(i),
            _ => {}
        }
    }
    best
}

/// **PBS** (§4.4): RUNNABLE with minimum `priority`, ties broken by scan
/// order. A single pass — the raw source's inner re-scan for the minimum
/// is redundant and can select a stale entry if the table mutates
/// mid-scan (§9); this keeps the minimum as it goes instead.
#[cfg(feature = "pbs")]
fn pick_pbs(state: &ProcTableState) -> Option<usize> {
    let mut best: Option<usize> = None;
    for i in 0..NPROC {
        if state.procs[i].state != ProcState::Runnable {
            continue;
        }
        match best {
            None => best = Some(i),
            Some(b) if state.procs[i].priority < state.procs[b].priority => best = Some(i),
            _ => {}
        }
    }
    best
}

/// **MLFQ** (§4.4 steps 1-2): age first, then pick the lowest nonempty
/// queue's head.
#[cfg(feature = "mlfq")]
fn pick_mlfq(state: &mut ProcTableState) -> Option<usize> {
    age_sweep(state);

    let q = state.queues.lowest_nonempty()?;
    let idx = *state.queues.queue(q).front()?;
    let now = state.ticks;
    state
        .queues
        .shift_proc_q(&mut state.procs, now, idx, Some(q), None);
    Some(idx)
}

/// §4.4 step 1 / §8 invariant 6: for each queue above the top, promote any
/// entry that has waited longer than `AGE`. The raw source's aging loop
/// mutates the very queue it iterates (§9, "a correct implementation must
/// snapshot queue contents or iterate defensively") — we snapshot each
/// queue's slot indices before moving any of them.
#[cfg(feature = "mlfq")]
fn age_sweep(state: &mut ProcTableState) {
    let now = state.ticks;
    for q in 1..crate::param::NQUEUE {
        let stale: Vec<usize> = state
            .queues
            .queue(q)
            .iter()
            .copied()
            .filter(|&idx| now.saturating_sub(state.procs[idx].enter) > AGE)
            .collect();
        for idx in stale {
            state
                .queues
                .shift_proc_q(&mut state.procs, now, idx, Some(q), Some(q - 1));
        }
    }
}

/// Mark `idx` RUNNING and perform whatever per-dispatch accounting the
/// active policy defines (MLFQ's `n_run`). `curr_ticks`/`ticks[]` are
/// accounted purely by the tick handler (`tick::account`) — see
/// `DESIGN.md` for why duplicating that increment at dispatch time would
/// desynchronize the demotion trace from §8 scenario S2.
pub fn mark_running(state: &mut ProcTableState, idx: usize) {
    state.procs[idx].state = ProcState::Running;
    #[cfg(feature = "mlfq")]
    {
        state.procs[idx].n_run += 1;
    }
}

/// §4.4 step 5: called when a dispatched PCB returns to the scheduler
/// still RUNNABLE (voluntary yield or slice exhaustion), before the next
/// `pick_next`. No-op under RR/FCFS/PBS, which have no per-process queue
/// state to update — the PCB is already RUNNABLE and a plain table scan
/// will find it again.
#[allow(unused_variables)]
pub fn requeue_after_run(state: &mut ProcTableState, idx: usize) {
    #[cfg(feature = "mlfq")]
    {
        if state.procs[idx].state != ProcState::Runnable {
            return;
        }
        state.procs[idx].curr_ticks = 0;
        let now = state.ticks;
        let curr = state.procs[idx].curr_queue;
        let next_q = if state.procs[idx].change_q {
            state.procs[idx].change_q = false;
            (curr + 1).min(crate::param::NQUEUE - 1)
        } else {
            curr
        };
        crate::mlfq::enqueue_at(&mut state.queues, &mut state.procs, now, idx, next_q);
    }
}

/// **PBS** `checkPreempt(priority, samePriority)` (§4.4): `samePriority =
/// false` checks whether any RUNNABLE PCB has strictly lower priority
/// (preempt immediately); `samePriority = true` checks whether any
/// RUNNABLE PCB has priority less-or-equal (slice elapsed, round robin
/// among peers). Only RUNNABLE PCBs are considered — §4.4's own wording
/// ("any RUNNABLE has...") is a deliberate narrowing of the raw source,
/// which tests every non-unused slot regardless of state.
#[cfg(feature = "pbs")]
pub fn check_preempt(state: &ProcTableState, priority: u8, same_priority: bool) -> bool {
    for i in 0..NPROC {
        if state.procs[i].pid == 0 || state.procs[i].state != ProcState::Runnable {
            continue;
        }
        let p = state.procs[i].priority;
        let wins = if same_priority { p <= priority } else { p < priority };
        if wins {
            return true;
        }
    }
    false
}

/// `set_priority(new, pid) -> old | -1` (§4.7).
pub fn set_priority(state: &mut ProcTableState, pid: usize, new: u8) -> Option<u8> {
    if !PRIORITY_RANGE.contains(&new) {
        return None;
    }
    for i in 0..NPROC {
        if state.procs[i].pid == pid {
            let old = state.procs[i].priority;
            state.procs[i].priority = new;
            return Some(old);
        }
    }
    None
}
