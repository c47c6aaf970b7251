//! Process table (C1) and PCB lifecycle (C2): the single substrate the
//! four dispatch policies in `scheduler.rs` share.
//!
//! CPU identity is a thread-local id instead of the `tp` register, and the
//! `ptable.lock` spinlock's interrupt-nesting discipline (`push_off`/
//! `pop_off`) is tracked per logical CPU the same way, just driven by a
//! plain flag instead of real CSRs (§1: hardware trap/interrupt entry is an
//! external collaborator here).

use std::cell::Cell;
use std::cell::UnsafeCell;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::KernelError;
use crate::mlfq::QueueBank;
use crate::param::{DEFAULT_PRIORITY, NCPU, NOFILE, NPROC};
use crate::spinlock::{SpinLock, SpinLockGuard};
use crate::sync::OnceLock;

/// Opaque rendezvous token for sleep/wakeup (GLOSSARY "Channel").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Another PCB's slot index: `wait`/`waitx` block on themselves,
    /// `exit` wakes its parent's channel.
    Proc(usize),
    /// The tick counter (`sleep_ticks`).
    Ticks,
    /// Escape hatch for collaborators (buffers, pipes, locks) that sleep on
    /// resources the scheduler itself never looks at (§1 out of scope), so
    /// `sleep`/`wakeup` stay usable outside this crate too.
    Custom(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcState {
    Unused,
    Embryo,
    Sleeping,
    Runnable,
    Running,
    Zombie,
}

/// Process id. Allocation is monotonic for the process's lifetime in the
/// table (§3 invariant: "pid values are monotonically increasing").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pid(pub usize);

static NEXT_PID: AtomicUsize = AtomicUsize::new(1);

impl Pid {
    fn alloc() -> Pid {
        Pid(NEXT_PID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Address space handle. Owned by the VM collaborator (§1 out of scope);
/// the scheduler moves it between PCBs on fork but never inspects it.
#[derive(Debug, Default, Clone, Copy)]
pub struct AddressSpace;

/// Open-file table entry, owned by the FS collaborator (§1 out of scope).
pub type OpenFile = ();

/// Kernel stack handle. Present iff the PCB's state is not UNUSED.
#[derive(Debug, Clone, Copy)]
pub struct KernelStack;

/// Saved user register snapshot. The scheduler only ever sets the
/// return-value register (`fork`'s "child observes 0"); everything else is
/// the trap/syscall collaborator's concern (§1 out of scope).
#[derive(Debug, Default, Clone, Copy)]
pub struct TrapFrame {
    pub return_value: usize,
}

/// Saved kernel context for this PCB's side of the coroutine handoff
/// (§9 "Context switch as coroutine"). On hardware this is a callee-saved
/// register save area restored by `swtch`; resuming a process here is an
/// ordinary function call (see `scheduler::run_once`), so there is nothing
/// to persist between dispatches.
#[derive(Debug, Default, Clone, Copy)]
pub struct Context;

/// Process control block. One per slot in the fixed-size table (§3).
#[derive(Debug)]
pub struct Pcb {
    pub pid: usize,
    pub state: ProcState,
    pub parent: Option<usize>,
    pub kstack: Option<KernelStack>,
    pub addr_space: AddressSpace,
    pub open_files: [OpenFile; NOFILE],
    pub name: [u8; 16],
    pub tf: TrapFrame,
    pub context: Context,
    pub killed: bool,
    pub chan: Option<Channel>,

    pub ctime: u64,
    pub etime: u64,
    pub rtime: u64,
    pub wtime: u64,

    /// PBS priority; lower value = higher priority.
    pub priority: u8,

    #[cfg(feature = "mlfq")]
    pub curr_queue: usize,
    #[cfg(feature = "mlfq")]
    pub curr_ticks: u64,
    #[cfg(feature = "mlfq")]
    pub ticks: [u64; crate::param::NQUEUE],
    #[cfg(feature = "mlfq")]
    pub enter: u64,
    #[cfg(feature = "mlfq")]
    pub change_q: bool,
    #[cfg(feature = "mlfq")]
    pub n_run: u64,
}

impl Pcb {
    pub(crate) fn unused() -> Self {
        Pcb {
            pid: 0,
            state: ProcState::Unused,
            parent: None,
            kstack: None,
            addr_space: AddressSpace,
            open_files: [(); NOFILE],
            name: [0; 16],
            tf: TrapFrame::default(),
            context: Context::default(),
            killed: false,
            chan: None,
            ctime: 0,
            etime: 0,
            rtime: 0,
            wtime: 0,
            priority: DEFAULT_PRIORITY,
            #[cfg(feature = "mlfq")]
            curr_queue: 0,
            #[cfg(feature = "mlfq")]
            curr_ticks: 0,
            #[cfg(feature = "mlfq")]
            ticks: [0; crate::param::NQUEUE],
            #[cfg(feature = "mlfq")]
            enter: 0,
            #[cfg(feature = "mlfq")]
            change_q: false,
            #[cfg(feature = "mlfq")]
            n_run: 0,
        }
    }
}

pub struct ProcTableState {
    pub procs: [Pcb; NPROC],
    #[cfg(feature = "mlfq")]
    pub queues: QueueBank,
    pub ticks: u64,
}

impl ProcTableState {
    pub(crate) fn new() -> Self {
        ProcTableState {
            procs: std::array::from_fn(|_| Pcb::unused()),
            #[cfg(feature = "mlfq")]
            queues: QueueBank::new(),
            ticks: 0,
        }
    }
}

pub struct ProcTable {
    pub state: SpinLock<ProcTableState>,
}

pub static PROC_TABLE: LazyLock<ProcTable> = LazyLock::new(|| ProcTable {
    state: SpinLock::new(ProcTableState::new(), "ptable"),
});

/// Slot of the init process (pid 1). Set once by `user_init`.
pub static INIT_PROC: OnceLock<usize> = OnceLock::new();

// --- CPU identity & interrupt-nesting bookkeeping -------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuId(pub usize);

#[derive(Debug, Clone, Copy)]
struct CpuSlot {
    running: Option<usize>,
    num_off: usize,
    interrupts_enabled: bool,
}

impl CpuSlot {
    const fn new() -> Self {
        CpuSlot {
            running: None,
            num_off: 0,
            interrupts_enabled: true,
        }
    }
}

struct CpuTable([UnsafeCell<CpuSlot>; NCPU]);

// Safety: each slot is only ever touched by code running as that logical
// CPU (enforced by `current_cpu_id`'s thread-local assignment), mirroring
// the real kernel where a hart only ever accesses its own `Cpu` struct.
unsafe impl Sync for CpuTable {}

static CPUS: CpuTable = CpuTable([const { UnsafeCell::new(CpuSlot::new()) }; NCPU]);

thread_local! {
    static MY_CPU: Cell<Option<usize>> = const { Cell::new(None) };
}
static NEXT_CPU: AtomicUsize = AtomicUsize::new(0);

/// Identity of the logical CPU the calling thread represents, assigned
/// round-robin on first use and stable for the thread's lifetime.
pub fn current_cpu_id() -> CpuId {
    let id = MY_CPU.with(|cell| {
        if let Some(id) = cell.get() {
            id
        } else {
            let id = NEXT_CPU.fetch_add(1, Ordering::Relaxed) % NCPU;
            cell.set(Some(id));
            id
        }
    });
    CpuId(id)
}

fn slot(id: CpuId) -> &'static UnsafeCell<CpuSlot> {
    &CPUS.0[id.0]
}

/// Enter an interrupt-disabled critical section on this cpu. Nests.
pub fn push_off() {
    let id = current_cpu_id();
    unsafe {
        let c = &mut *slot(id).get();
        if c.num_off == 0 {
            c.interrupts_enabled = true;
        }
        c.num_off += 1;
    }
}

/// Leave one level of interrupt-disabled nesting.
pub fn pop_off() {
    let id = current_cpu_id();
    unsafe {
        let c = &mut *slot(id).get();
        assert!(c.num_off >= 1, "pop_off: not held");
        c.num_off -= 1;
    }
}

/// Nesting depth of `push_off` on this cpu (`ncli` in §5).
pub fn ncli() -> usize {
    let id = current_cpu_id();
    unsafe { (*slot(id).get()).num_off }
}

pub fn set_current(slot_idx: usize) {
    let id = current_cpu_id();
    unsafe { (*slot(id).get()).running = Some(slot_idx) };
}

pub fn clear_current() {
    let id = current_cpu_id();
    unsafe { (*slot(id).get()).running = None };
}

pub fn current() -> Option<usize> {
    let id = current_cpu_id();
    unsafe { (*slot(id).get()).running }
}

/// Marker payload used to unwind a process's workload thread out of
/// `exit()` without returning control to it (§6 "exit() -> !"); caught by
/// `scheduler::run_once`, which treats it as an ordinary exit rather than a
/// real panic.
pub(crate) struct ExitUnwind;

// --- PCB lifecycle (C2) ----------------------------------------------------

impl ProcTableState {
    fn allocproc(&mut self) -> Result<usize, KernelError> {
        let Some(idx) = self.procs.iter().position(|p| p.state == ProcState::Unused) else {
            crate::err!(KernelError::OutOfProc);
        };

        let pid = Pid::alloc().0;
        let now = self.ticks;
        let p = &mut self.procs[idx];
        *p = Pcb::unused();
        p.pid = pid;
        p.state = ProcState::Embryo;
        p.ctime = now;
        p.kstack = Some(KernelStack);
        #[cfg(feature = "mlfq")]
        {
            p.enter = now;
        }
        Ok(idx)
    }
}

/// `allocproc() -> PCB|nil` (§4.2).
pub fn alloc() -> Result<usize, KernelError> {
    let mut state = PROC_TABLE.state.lock();
    state.allocproc()
}

/// Bring up the very first process (pid 1, adopts all orphans, never
/// exits). Not itself a spec syscall, but required once at kernel init for
/// `fork`'s reparenting target to exist.
pub fn user_init() -> usize {
    let mut state = PROC_TABLE.state.lock();
    let idx = state.allocproc().expect("userinit: out of proc");
    state.procs[idx].parent = None;
    state.procs[idx].state = ProcState::Runnable;
    #[cfg(feature = "mlfq")]
    {
        let now = state.ticks;
        crate::mlfq::enqueue(&mut state.queues, &mut state.procs, now, idx);
    }
    drop(state);
    INIT_PROC
        .initialize(|| Ok::<_, ()>(idx))
        .expect("user_init called more than once");
    idx
}

/// `fork() -> pid | -1` (§4.2).
pub fn fork(parent: usize) -> Result<usize, KernelError> {
    let mut state = PROC_TABLE.state.lock();
    let child = state.allocproc()?;

    let addr_space = state.procs[parent].addr_space;
    let open_files = state.procs[parent].open_files;
    let name = state.procs[parent].name;

    let c = &mut state.procs[child];
    c.parent = Some(parent);
    c.addr_space = addr_space;
    c.open_files = open_files;
    c.name = name;
    c.tf.return_value = 0;
    c.state = ProcState::Runnable;

    #[cfg(feature = "mlfq")]
    {
        let now = state.ticks;
        crate::mlfq::enqueue(&mut state.queues, &mut state.procs, now, child);
    }

    Ok(child)
}

/// `exit()` (§4.2): never returns to its caller. Must be the last thing a
/// process's workload does; anything after it is unreachable.
pub fn exit(slot_idx: usize) -> ! {
    let mut state = PROC_TABLE.state.lock();

    let init = *INIT_PROC.get().expect("exit: init not initialized");
    assert!(slot_idx != init, "init exiting");

    #[cfg(feature = "mlfq")]
    crate::mlfq::remove(&mut state.queues, slot_idx);

    for i in 0..NPROC {
        if state.procs[i].parent == Some(slot_idx) {
            state.procs[i].parent = Some(init);
            if state.procs[i].state == ProcState::Zombie {
                wakeup_locked(&mut state, Channel::Proc(init));
            }
        }
    }

    let now = state.ticks;
    state.procs[slot_idx].state = ProcState::Zombie;
    state.procs[slot_idx].etime = now;

    if let Some(parent) = state.procs[slot_idx].parent {
        wakeup_locked(&mut state, Channel::Proc(parent));
    }

    drop(state);
    std::panic::panic_any(ExitUnwind)
}

fn has_live_children(state: &ProcTableState, caller: usize) -> bool {
    state
        .procs
        .iter()
        .enumerate()
        .any(|(i, p)| i != caller && p.parent == Some(caller) && p.state != ProcState::Unused)
}

fn reap_zombie_child(
    state: &mut ProcTableState,
    caller: usize,
    restamp_etime: bool,
) -> Option<(usize, u64, u64)> {
    for i in 0..NPROC {
        if state.procs[i].parent == Some(caller) && state.procs[i].state == ProcState::Zombie {
            if restamp_etime {
                state.procs[i].etime = state.ticks;
            }
            let pid = state.procs[i].pid;
            let rtime = state.procs[i].rtime;
            let wtime = state.procs[i].etime - state.procs[i].ctime - rtime;
            #[cfg(feature = "mlfq")]
            crate::mlfq::remove(&mut state.queues, i);
            state.procs[i] = Pcb::unused();
            return Some((pid, rtime, wtime));
        }
    }
    None
}

/// `wait() -> pid | -1` (§4.2).
pub fn wait(caller: usize) -> Option<usize> {
    loop {
        let mut state = PROC_TABLE.state.lock();
        if state.procs[caller].killed {
            return None;
        }
        if !has_live_children(&state, caller) {
            return None;
        }
        if let Some((pid, _, _)) = reap_zombie_child(&mut state, caller, false) {
            return Some(pid);
        }
        sleep_self(state, caller, Channel::Proc(caller));
    }
}

/// `waitx(&wtime, &rtime) -> pid | -1` (§4.2): identical to `wait` but
/// restamps `etime` at reap time and hands back the accounted times.
pub fn waitx(caller: usize) -> Option<(usize, u64, u64)> {
    loop {
        let mut state = PROC_TABLE.state.lock();
        if state.procs[caller].killed {
            return None;
        }
        if !has_live_children(&state, caller) {
            return None;
        }
        if let Some(result) = reap_zombie_child(&mut state, caller, true) {
            return Some(result);
        }
        sleep_self(state, caller, Channel::Proc(caller));
    }
}

pub fn is_killed(slot_idx: usize) -> bool {
    PROC_TABLE.state.lock().procs[slot_idx].killed
}

// --- Sleep/Wakeup (C6) ------------------------------------------------------

fn wait_until_runnable(
    mut state: SpinLockGuard<'_, ProcTableState>,
    slot_idx: usize,
) -> SpinLockGuard<'_, ProcTableState> {
    loop {
        if state.procs[slot_idx].state != ProcState::Sleeping {
            return state;
        }
        drop(state);
        std::thread::yield_now();
        state = PROC_TABLE.state.lock();
    }
}

/// Block `slot_idx` on `chan` while already holding the table lock (the
/// `lk == ptable.lock` arm of §4.6 — `wait`/`waitx` block on themselves).
fn sleep_self(state: SpinLockGuard<'_, ProcTableState>, slot_idx: usize, chan: Channel) {
    let mut state = state;
    #[cfg(feature = "mlfq")]
    crate::mlfq::remove(&mut state.queues, slot_idx);
    state.procs[slot_idx].chan = Some(chan);
    state.procs[slot_idx].state = ProcState::Sleeping;

    let mut state = wait_until_runnable(state, slot_idx);
    state.procs[slot_idx].chan = None;
}

/// `sleep(chan, lk)` (§4.6): block the caller until `wakeup(chan)`. `lk` is
/// whatever lock the caller held before calling; it is released while
/// asleep and re-acquired before returning, with the process table lock
/// bridging the gap so a racing `wakeup` can never be lost.
pub fn sleep<'a, T>(
    slot_idx: usize,
    chan: Channel,
    lk: &'a SpinLock<T>,
    held: SpinLockGuard<'a, T>,
) -> SpinLockGuard<'a, T> {
    let mut state = PROC_TABLE.state.lock();
    drop(held);

    #[cfg(feature = "mlfq")]
    crate::mlfq::remove(&mut state.queues, slot_idx);
    state.procs[slot_idx].chan = Some(chan);
    state.procs[slot_idx].state = ProcState::Sleeping;

    let mut state = wait_until_runnable(state, slot_idx);
    state.procs[slot_idx].chan = None;
    drop(state);

    lk.lock()
}

/// Block on a channel with no second lock to hand off (used by syscalls
/// that already released everything else before calling in, e.g.
/// `sleep_ticks`).
pub fn sleep_on_channel(slot_idx: usize, chan: Channel) {
    let state = PROC_TABLE.state.lock();
    sleep_self(state, slot_idx, chan);
}

pub(crate) fn wakeup_locked(state: &mut ProcTableState, chan: Channel) {
    for i in 0..NPROC {
        if state.procs[i].state == ProcState::Sleeping && state.procs[i].chan == Some(chan) {
            state.procs[i].state = ProcState::Runnable;
            #[cfg(feature = "mlfq")]
            {
                state.procs[i].curr_ticks = 0;
                let now = state.ticks;
                let q = state.procs[i].curr_queue;
                crate::mlfq::enqueue_at(&mut state.queues, &mut state.procs, now, i, q);
            }
        }
    }
}

/// `wakeup(chan)` (§4.6): every SLEEPING PCB on `chan` becomes RUNNABLE.
pub fn wakeup(chan: Channel) {
    let mut state = PROC_TABLE.state.lock();
    wakeup_locked(&mut state, chan);
}

/// `kill(pid) -> 0 | -1` (§4.6): sets `killed`; a SLEEPING target is
/// promoted to RUNNABLE so it can observe the flag on its next trap.
pub fn kill(pid: usize) -> bool {
    let mut state = PROC_TABLE.state.lock();
    for i in 0..NPROC {
        if state.procs[i].pid == pid {
            state.procs[i].killed = true;
            if state.procs[i].state == ProcState::Sleeping {
                state.procs[i].state = ProcState::Runnable;
                #[cfg(feature = "mlfq")]
                {
                    let now = state.ticks;
                    let q = state.procs[i].curr_queue;
                    crate::mlfq::enqueue_at(&mut state.queues, &mut state.procs, now, i, q);
                }
            }
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reset() {
        let mut state = PROC_TABLE.state.lock();
        *state = ProcTableState::new();
    }

    #[test]
    fn alloc_assigns_embryo_with_positive_pid() {
        reset();
        let idx = alloc().unwrap();
        let state = PROC_TABLE.state.lock();
        assert_eq!(state.procs[idx].state, ProcState::Embryo);
        assert!(state.procs[idx].pid > 0);
    }

    #[test]
    fn fork_child_sees_zero_return_value_and_is_runnable() {
        reset();
        let parent = user_init();
        let child = fork(parent).unwrap();
        let state = PROC_TABLE.state.lock();
        assert_eq!(state.procs[child].tf.return_value, 0);
        assert_eq!(state.procs[child].state, ProcState::Runnable);
        assert_eq!(state.procs[child].parent, Some(parent));
    }

    #[test]
    fn exit_reparents_zombie_children_to_init_and_wakes_it() {
        reset();
        let init = user_init();
        let parent = fork(init).unwrap();
        let child = fork(parent).unwrap();
        {
            let mut state = PROC_TABLE.state.lock();
            state.procs[child].state = ProcState::Zombie;
        }

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| exit(parent)));
        assert!(result.is_err());

        let state = PROC_TABLE.state.lock();
        assert_eq!(state.procs[child].parent, Some(init));
        assert_eq!(state.procs[parent].state, ProcState::Zombie);
    }

    #[test]
    fn wait_reaps_zombie_child_and_frees_its_slot() {
        reset();
        let init = user_init();
        let child = fork(init).unwrap();
        {
            let mut state = PROC_TABLE.state.lock();
            state.procs[child].state = ProcState::Zombie;
            state.procs[child].etime = 5;
            state.procs[child].rtime = 2;
            state.procs[child].ctime = 0;
        }

        let pid = wait(init);
        assert!(pid.is_some());
        let state = PROC_TABLE.state.lock();
        assert_eq!(state.procs[child].state, ProcState::Unused);
        assert_eq!(state.procs[child].pid, 0);
    }

    #[test]
    fn waitx_reports_rtime_and_wtime_summing_to_total_lifetime() {
        reset();
        let init = user_init();
        let child = fork(init).unwrap();
        {
            let mut state = PROC_TABLE.state.lock();
            state.procs[child].state = ProcState::Zombie;
            state.procs[child].ctime = 0;
            state.procs[child].rtime = 3;
            state.ticks = 10;
        }

        let (_, rtime, wtime) = waitx(init).unwrap();
        assert_eq!(rtime, 3);
        assert_eq!(rtime + wtime, 10);
    }

    #[test]
    fn wait_with_no_children_returns_none() {
        reset();
        let init = user_init();
        assert_eq!(wait(init), None);
    }

    #[test]
    fn kill_wakes_a_sleeping_process() {
        reset();
        let init = user_init();
        let child = fork(init).unwrap();
        {
            let mut state = PROC_TABLE.state.lock();
            state.procs[child].state = ProcState::Sleeping;
            state.procs[child].chan = Some(Channel::Custom(1));
        }

        let pid = { PROC_TABLE.state.lock().procs[child].pid };
        assert!(kill(pid));

        let state = PROC_TABLE.state.lock();
        assert_eq!(state.procs[child].state, ProcState::Runnable);
        assert!(state.procs[child].killed);
    }

    #[test]
    fn wakeup_only_affects_matching_channel() {
        reset();
        let init = user_init();
        let a = fork(init).unwrap();
        let b = fork(init).unwrap();
        {
            let mut state = PROC_TABLE.state.lock();
            state.procs[a].state = ProcState::Sleeping;
            state.procs[a].chan = Some(Channel::Custom(1));
            state.procs[b].state = ProcState::Sleeping;
            state.procs[b].chan = Some(Channel::Custom(2));
        }

        wakeup(Channel::Custom(1));

        let state = PROC_TABLE.state.lock();
        assert_eq!(state.procs[a].state, ProcState::Runnable);
        assert_eq!(state.procs[b].state, ProcState::Sleeping);
    }
}
