//! `#[test_case]` runner and the QEMU `isa-debug-exit` driver that
//! turns an in-kernel test run into a host-visible process exit code.
//!
//! https://os.phil-opp.com/testing/#exiting-qemu

use crate::io_port::IoPort;
use core::panic::PanicInfo;

const ISA_DEBUG_EXIT: IoPort = IoPort::new(0xf4);

#[repr(u32)]
#[derive(Debug, Clone, Copy)]
pub enum QemuExitCode {
    Success = 0x10,
    Failed = 0x11,
}

/// Writes `code` to the `isa-debug-exit` device, which QEMU (started
/// with `-device isa-debug-exit,iobase=0xf4,iosize=0x04`) turns into
/// the process exit status `(code << 1) | 1`.
pub fn exit_qemu(code: QemuExitCode) -> ! {
    ISA_DEBUG_EXIT.write_u32(code as u32);
    crate::hlt()
}

pub trait Testable {
    fn run(&self);
}

impl<T: Fn()> Testable for T {
    fn run(&self) {
        crate::serial_print!("{}...\t", core::any::type_name::<T>());
        self();
        crate::serial_println!("[ok]");
    }
}

pub fn test_runner(tests: &[&dyn Testable]) {
    crate::serial_println!("Running {} tests", tests.len());
    for test in tests {
        test.run();
    }
    exit_qemu(QemuExitCode::Success);
}

pub fn test_panic_handler(info: &PanicInfo) -> ! {
    crate::serial_println!("[failed]\n");
    crate::serial_println!("Error: {}\n", info);
    exit_qemu(QemuExitCode::Failed);
}
