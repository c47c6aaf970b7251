//! MLFQ Queue Bank (C3): five FIFO queues of process-table slot indices.
//!
//! `shift_proc_q` in the teacher's source (`examples/original_source/proc.c`)
//! is a single primitive overloaded on its `(q_i, q_f)` sentinel arguments
//! (`-1` means "no source"/"no destination"). Here the sentinel is `Option`
//! instead of `-1`, which is the same contract without the magic number
//! (§9 "shift_proc_q bounds... Preserve this contract or redesign the
//! indexing to half-open" — we keep the contract, just typed).

use std::collections::VecDeque;

use crate::param::NQUEUE;
use crate::proc::Pcb;

#[derive(Debug)]
pub struct QueueBank {
    queues: [VecDeque<usize>; NQUEUE],
}

impl QueueBank {
    pub fn new() -> Self {
        QueueBank {
            queues: std::array::from_fn(|_| VecDeque::new()),
        }
    }

    pub fn queue(&self, i: usize) -> &VecDeque<usize> {
        &self.queues[i]
    }

    pub fn len(&self, i: usize) -> usize {
        self.queues[i].len()
    }

    pub fn is_empty(&self, i: usize) -> bool {
        self.queues[i].is_empty()
    }

    /// Lowest-indexed nonempty queue, or `None` if every queue is empty.
    pub fn lowest_nonempty(&self) -> Option<usize> {
        (0..NQUEUE).find(|&i| !self.queues[i].is_empty())
    }

    fn insert_at(&mut self, procs: &mut [Pcb], now: u64, idx: usize, q_f: usize) -> bool {
        if self.queues[q_f].contains(&idx) {
            return false;
        }
        procs[idx].enter = now;
        procs[idx].curr_queue = q_f;
        self.queues[q_f].push_back(idx);
        true
    }

    fn remove_from(&mut self, q_i: usize, idx: usize) -> bool {
        match self.queues[q_i].iter().position(|&x| x == idx) {
            Some(pos) => {
                self.queues[q_i].remove(pos);
                true
            }
            None => false,
        }
    }

    /// The `shift_proc_q(p, q_i, q_f)` primitive (§4.3):
    /// - `q_i = None`: insert at the tail of `q_f`.
    /// - `q_f = None`: remove from `q_i`.
    /// - both `Some`: atomic move preserving tail-insert semantics.
    pub fn shift_proc_q(
        &mut self,
        procs: &mut [Pcb],
        now: u64,
        idx: usize,
        q_i: Option<usize>,
        q_f: Option<usize>,
    ) -> bool {
        match (q_i, q_f) {
            (None, Some(q_f)) => self.insert_at(procs, now, idx, q_f),
            (Some(q_i), None) => self.remove_from(q_i, idx),
            (Some(q_i), Some(q_f)) => {
                if !self.remove_from(q_i, idx) {
                    return false;
                }
                self.insert_at(procs, now, idx, q_f)
            }
            (None, None) => false,
        }
    }

    /// Remove `idx` from whichever queue currently holds it (if any). Used
    /// by sleep/exit paths that don't track which queue a PCB is in beyond
    /// `Pcb::curr_queue`, and by tests asserting single-occupancy.
    pub fn remove_wherever(&mut self, idx: usize) -> bool {
        (0..NQUEUE).any(|q| self.remove_from(q, idx))
    }

    pub fn contains(&self, idx: usize) -> bool {
        self.queues.iter().any(|q| q.contains(&idx))
    }
}

impl Default for QueueBank {
    fn default() -> Self {
        Self::new()
    }
}

/// Insert `idx` at queue 0 (a freshly RUNNABLE PCB: `fork`/`userinit`).
pub fn enqueue(queues: &mut QueueBank, procs: &mut [Pcb], now: u64, idx: usize) -> bool {
    queues.shift_proc_q(procs, now, idx, None, Some(0))
}

/// Insert `idx` at a specific queue (wakeup/kill re-enqueue into
/// `curr_queue`, not queue 0 — §4.6).
pub fn enqueue_at(queues: &mut QueueBank, procs: &mut [Pcb], now: u64, idx: usize, q: usize) -> bool {
    queues.shift_proc_q(procs, now, idx, None, Some(q))
}

/// Remove `idx` from whichever queue holds it (sleep/exit paths).
pub fn remove(queues: &mut QueueBank, idx: usize) -> bool {
    queues.remove_wherever(idx)
}
