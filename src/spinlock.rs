//! Busy-wait mutex guarding shared kernel state.
//!
//! The real kernel's spinlock also disables interrupts on the owning hart
//! while held, via a nesting counter on the per-CPU struct (`push_off`/
//! `pop_off`). Per §1 that primitive is an external collaborator here — CPU
//! identity is a thread-local instead of the `tp` register and "interrupts"
//! are a per-thread flag instead of `sstatus` bits, but the nesting
//! discipline `proc.rs` relies on (a `sleep()` that must not race a
//! `wakeup()` against its own preemption) is preserved exactly.

use std::cell::UnsafeCell;
use std::hint;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::proc::{self, CpuId};

const UNLOCKED: usize = 0;

/// Safe because a locked id is always `CpuId + 1` (ids are 0-based).
fn encode(id: CpuId) -> usize {
    id.0 + 1
}

pub struct SpinLock<T> {
    name: &'static str,
    owner: AtomicUsize,
    data: UnsafeCell<T>,
}

unsafe impl<T> Sync for SpinLock<T> where T: Send {}

pub struct SpinLockGuard<'a, T> {
    lock: &'a SpinLock<T>,
}

unsafe impl<T> Sync for SpinLockGuard<'_, T> where T: Sync {}

impl<T> SpinLock<T> {
    pub const fn new(value: T, name: &'static str) -> Self {
        SpinLock {
            name,
            owner: AtomicUsize::new(UNLOCKED),
            data: UnsafeCell::new(value),
        }
    }

    fn holding(&self) -> bool {
        self.owner.load(Ordering::Relaxed) == encode(proc::current_cpu_id())
    }

    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        proc::push_off();

        assert!(!self.holding(), "acquire {}: already held by this cpu", self.name);

        let me = encode(proc::current_cpu_id());
        loop {
            if self
                .owner
                .compare_exchange(UNLOCKED, me, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                break;
            }
            hint::spin_loop();
        }

        SpinLockGuard { lock: self }
    }

    /// Release a guard early without waiting for its scope to end, returning
    /// the lock so it can be re-acquired later (the `sleep()` double-lock
    /// handoff needs exactly this: drop the proc lock, keep holding the
    /// caller's lock, then re-acquire the proc lock afterwards).
    pub fn unlock(guard: SpinLockGuard<'_, T>) -> &'_ SpinLock<T> {
        let lock = guard.lock;
        drop(guard);
        lock
    }

    /// Force an already-held lock open without going through the guard.
    /// Used only when panicking mid-hold needs to release the proc table so
    /// a diagnostic print can itself take other locks.
    ///
    /// # Safety
    /// Caller must hold the lock on the current cpu.
    pub unsafe fn force_unlock(&self) {
        assert!(self.holding(), "force_unlock {}: not held", self.name);
        self.owner.store(UNLOCKED, Ordering::Release);
        proc::pop_off();
    }

    #[allow(clippy::mut_from_ref)]
    pub unsafe fn get_mut_unchecked(&self) -> &mut T {
        unsafe { &mut *self.data.get() }
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T> Drop for SpinLockGuard<'_, T> {
    fn drop(&mut self) {
        assert!(self.lock.holding(), "release {}: not held", self.lock.name);
        self.lock.owner.store(UNLOCKED, Ordering::Release);
        proc::pop_off();
    }
}

impl<T> Deref for SpinLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for SpinLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

/// A lock that does not participate in the interrupt-nesting discipline,
/// for state with no preemption hazard (the `printf` writer, mostly).
/// Same shape as `SpinLock<T>`, without the `push_off`/`pop_off` bookkeeping.
pub struct Mutex<T> {
    locked: std::sync::atomic::AtomicBool,
    data: UnsafeCell<T>,
}

unsafe impl<T> Sync for Mutex<T> where T: Send {}

pub struct MutexGuard<'a, T> {
    mutex: &'a Mutex<T>,
}

impl<T> Mutex<T> {
    pub const fn new(value: T, _name: &'static str) -> Self {
        Mutex {
            locked: std::sync::atomic::AtomicBool::new(false),
            data: UnsafeCell::new(value),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, T> {
        while self
            .locked
            .compare_exchange(
                false,
                true,
                std::sync::atomic::Ordering::Acquire,
                std::sync::atomic::Ordering::Relaxed,
            )
            .is_err()
        {
            hint::spin_loop();
        }
        MutexGuard { mutex: self }
    }
}

impl<T> Drop for MutexGuard<'_, T> {
    fn drop(&mut self) {
        self.mutex
            .locked
            .store(false, std::sync::atomic::Ordering::Release);
    }
}

impl<T> Deref for MutexGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.mutex.data.get() }
    }
}

impl<T> DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.mutex.data.get() }
    }
}
