//! Bare-metal merge-sort harness for RISC-V.
//!
//! Runs the software merge sort and, when built with `use_fpga_mmio`, the
//! accelerator on the same reference workload, then powers QEMU off with a
//! pass/fail status. Build for `riscv64gc-unknown-none-elf`; a host build
//! produces only a stub that says so.

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
mod console;
#[cfg(target_os = "none")]
mod drivers;
#[cfg(target_os = "none")]
mod harness;
#[cfg(target_os = "none")]
mod smp;

#[cfg(target_os = "none")]
core::arch::global_asm!(include_str!("entry.S"));

/// Powers the machine off through the SiFive test device.
#[cfg(target_os = "none")]
fn exit(pass: bool) -> ! {
    use msort_common::mmio::{EXIT_FAIL, EXIT_PASS, TEST_DEVICE};

    let code = if pass { EXIT_PASS } else { (1 << 16) | EXIT_FAIL };
    // SAFETY: TEST_DEVICE is the platform's test/finisher register.
    unsafe { (TEST_DEVICE as *mut u32).write_volatile(code) };
    loop {
        core::hint::spin_loop();
    }
}

#[cfg(target_os = "none")]
#[unsafe(no_mangle)]
pub extern "C" fn kmain() -> ! {
    use console::println;
    use harness::SortPath;

    console::init();
    println!("[BOOT] Core 0 Online");

    println!("Running software mergesort");
    #[allow(unused_mut)]
    let mut pass = harness::run(SortPath::Software);
    println!("Done");

    #[cfg(feature = "use_fpga_mmio")]
    {
        println!("Running hardware-accelerated mergesort");
        pass &= harness::run(SortPath::Accelerated);
        println!("Done");
    }
    #[cfg(not(feature = "use_fpga_mmio"))]
    println!("Skipping hardware-accelerated mergesort (built without use_fpga_mmio)");

    println!("{}", if pass { "TEST PASS" } else { "TEST FAIL" });
    exit(pass)
}

#[cfg(target_os = "none")]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    console::println!("PANIC: {:?}", info);
    exit(false)
}

#[cfg(not(target_os = "none"))]
fn main() {
    eprintln!("msort_firmware runs bare-metal; build it with --target riscv64gc-unknown-none-elf");
}
