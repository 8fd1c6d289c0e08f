//! UART console for firmware diagnostics.
//!
//! Writes to the QEMU 'virt' 16550 UART. Output is serialized with a
//! spinlock so lines from different harts never interleave.

use crate::smp::SpinLock;
use core::fmt;
use msort_common::mmio::UART0;

/// Global spinlock protecting UART access.
static CONSOLE_LOCK: SpinLock<()> = SpinLock::new(());

/// UART transmitter implementing `fmt::Write`.
///
/// Converts `\n` to `\r\n` for serial terminals.
pub struct Uart;

impl fmt::Write for Uart {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let tx = UART0 as *mut u8;
        for c in s.bytes() {
            // SAFETY: UART0 is the transmit holding register of the
            // platform UART, always mapped on this machine.
            unsafe {
                if c == b'\n' {
                    tx.write_volatile(b'\r');
                }
                tx.write_volatile(c);
            }
        }
        Ok(())
    }
}

/// Currently a no-op: the QEMU UART needs no setup.
pub fn init() {}

/// Prints formatted arguments followed by a newline under the console lock.
///
/// Called by [`println!`]; the line is emitted atomically with respect to
/// other harts.
#[doc(hidden)]
pub fn _print_line(args: fmt::Arguments) {
    use fmt::Write;
    let _guard = CONSOLE_LOCK.lock();
    let _ = Uart.write_fmt(args);
    let _ = Uart.write_str("\n");
}

/// Prints a line to the UART console.
///
/// ```ignore
/// println!("Verified {} words sorted", n);
/// ```
#[macro_export]
macro_rules! println {
    ($($arg:tt)*) => ({
        $crate::console::_print_line(format_args!($($arg)*));
    });
}
pub use println;
