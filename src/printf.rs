//! Formatting layer behind the `print!`/`println!` macros.
//!
//! A single `Writer` guarded by a `Mutex` backs both macros, matching the
//! teacher's one-lock-per-output-stream design; `console::write_bytes` is
//! the pluggable sink underneath it.

use std::fmt::{self, Write};

use crate::spinlock::Mutex;
use crate::console;

pub static PRINTF: Printf = Printf {
    writer: Mutex::new(Writer, "printf"),
};

pub struct Printf {
    writer: Mutex<Writer>,
}

pub struct Writer;

impl fmt::Write for Writer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        console::write_bytes(s.as_bytes());
        Ok(())
    }
}

pub fn _print(args: fmt::Arguments<'_>, newline: bool) {
    let mut lock = PRINTF.writer.lock();

    lock.write_fmt(args).expect("print error");
    if newline {
        lock.write_char('\n').expect("print error nl");
    }
}

#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {{
        $crate::printf::_print(format_args!($($arg)*), false);
    }};
}

#[macro_export]
macro_rules! println {
    () => {
        $crate::print!("\n");
    };
    ($($arg:tt)*) => {{
        $crate::printf::_print(format_args!($($arg)*), true);
    }};
}
