//! Common definitions shared by the sort firmware, host tools and the
//! accelerator model.
//!
//! This crate holds the memory map of the target system-on-chip and the
//! register layout of the merge-sort accelerator. The register layout is a
//! fixed wire contract with the hardware: offsets, field order and command
//! values must match the accelerator RTL bit for bit.

#![no_std]

// Memory-mapped I/O address space definitions for the system-on-chip.
//
// These addresses must match the hardware memory map. The firmware passes
// them to driver constructors; nothing else in the workspace hard-codes them.
pub mod mmio {
    /// Base address of the 16550-compatible UART on QEMU's RISC-V 'virt' machine.
    ///
    /// Writing a byte to this address transmits it over the serial console.
    pub const UART0: usize = 0x1000_0000;

    /// Address of the SiFive test device used to terminate a QEMU run.
    ///
    /// Writing [`EXIT_PASS`] powers the machine off with status 0; writing
    /// `(code << 16) | EXIT_FAIL` exits with a failure code.
    pub const TEST_DEVICE: usize = 0x10_0000;

    /// Value written to [`TEST_DEVICE`] to end the run successfully.
    pub const EXIT_PASS: u32 = 0x5555;

    /// Value written to [`TEST_DEVICE`] to end the run with a failure.
    pub const EXIT_FAIL: u32 = 0x3333;

    /// Base address of the merge-sort accelerator register block.
    ///
    /// Four 64-bit registers starting at this address, laid out as described
    /// by [`crate::regs::Register`]. This address must match the address
    /// decoder in the accelerator's bus interface.
    pub const ACCEL_BASE: usize = 0xC000_2000;
}

/// Register layout of the merge-sort accelerator.
///
/// The block is four consecutive 64-bit words. The host programs the source
/// address, scratch address and element count, then writes [`CMD_START`] to
/// the command word. The device clears the command word to [`CMD_IDLE`] once
/// the sorted data is in memory.
pub mod regs {
    /// Number of 64-bit registers in the accelerator block.
    pub const NUM_REGISTERS: usize = 4;

    /// Command/status value meaning "idle" (read) or "done" (after a run).
    pub const CMD_IDLE: u64 = 0;

    /// Command value that starts a sort. Must be written after every other
    /// register, since the write itself is the trigger.
    pub const CMD_START: u64 = 1;

    /// Word offsets of the accelerator registers.
    #[repr(usize)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Register {
        /// Command/status word.
        ///
        /// Host writes [`CMD_START`]; the device holds a non-zero value while
        /// running and clears it to [`CMD_IDLE`] on completion.
        Command = 0,

        /// Address of the buffer to be sorted. The sorted result is left here.
        SrcAddr = 1,

        /// Address of the scratch buffer, same capacity as the source.
        DstAddr = 2,

        /// Number of elements to sort.
        Count = 3,
    }

    impl Register {
        /// All registers in offset order.
        pub const ALL: [Register; NUM_REGISTERS] = [
            Register::Command,
            Register::SrcAddr,
            Register::DstAddr,
            Register::Count,
        ];

        /// Word offset of this register from the block base.
        #[inline(always)]
        pub const fn offset(self) -> usize {
            self as usize
        }
    }
}
