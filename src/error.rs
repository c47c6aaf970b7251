//! Scheduler error taxonomy.
//!
//! Per §7 (ERROR HANDLING DESIGN): allocation failures are returned to the
//! caller as `KernelError`, not-found conditions return `-1`/`None` to the
//! caller silently, and invariant violations panic rather than return an
//! error — those represent programmer mistakes, not recoverable conditions.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// `allocproc` found no `UNUSED` slot in the process table.
    OutOfProc,
    /// A kernel-stack (or other per-process resource) allocation failed.
    Alloc,
}

impl KernelError {
    pub fn as_str(&self) -> &'static str {
        match self {
            KernelError::OutOfProc => "out of proc",
            KernelError::Alloc => "alloc error",
        }
    }
}

impl core::fmt::Display for KernelError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for KernelError {}

/// Return an error, logging file:line under debug builds. Use instead of
/// `return Err(...)`.
#[macro_export]
macro_rules! err {
    ($e:expr) => {{
        #[cfg(debug_assertions)]
        $crate::println!("! errored at {}:{}: {}", file!(), line!(), $e);
        return Err($e.into());
    }};
}

/// Log an error without consuming it.
#[macro_export]
macro_rules! log {
    ($e:expr) => {
        match $e {
            Ok(v) => Ok(v),
            Err(e) => {
                #[cfg(debug_assertions)]
                $crate::println!("  at {}:{}: {}", file!(), line!(), e);
                Err(e)
            }
        }
    };
}

/// Propagate an error with location logging. Use instead of bare `?`.
#[macro_export]
macro_rules! try_log {
    ($e:expr) => {
        match $e {
            Ok(v) => v,
            Err(e) => {
                #[cfg(debug_assertions)]
                $crate::println!("  at {}:{}: {}", file!(), line!(), e);
                return Err(e.into());
            }
        }
    };
}
