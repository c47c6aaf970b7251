//! Output sink for `print!`/`println!`.
//!
//! On real xv6/octopos this is a UART byte register. Here (§1: the hardware
//! trap/UART layer is out of scope) it is a pluggable sink: real stdout by
//! default, swapped for an in-memory buffer under test so `printpinfos`/`ps`
//! output can be asserted on without touching the process's actual stdout.

use std::cell::RefCell;
use std::io::Write as _;

thread_local! {
    static CAPTURE: RefCell<Option<Vec<u8>>> = const { RefCell::new(None) };
}

/// Write a chunk of already-formatted output to the active sink.
pub fn write_bytes(bytes: &[u8]) {
    let captured = CAPTURE.with(|cell| {
        let mut cell = cell.borrow_mut();
        if let Some(buf) = cell.as_mut() {
            buf.extend_from_slice(bytes);
            true
        } else {
            false
        }
    });

    if !captured {
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(bytes);
        let _ = stdout.flush();
    }
}

/// Run `f` with this thread's `print!`/`println!` output redirected into an
/// in-memory buffer, returning what was written instead of what's on stdout.
///
/// Used by tests that assert on `printpinfos`/`ps` output.
pub fn capture<F: FnOnce()>(f: F) -> String {
    CAPTURE.with(|cell| *cell.borrow_mut() = Some(Vec::new()));
    f();
    let bytes = CAPTURE.with(|cell| cell.borrow_mut().take().unwrap());
    String::from_utf8(bytes).expect("console output was not valid utf8")
}
