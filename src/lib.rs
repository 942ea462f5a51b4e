#![no_std]
#![no_main]
#![feature(lazy_get)]
#![feature(custom_test_frameworks)]
#![test_runner(crate::testing::test_runner)]
#![reexport_test_harness_main = "test_main"]

extern crate alloc;

#[macro_use]
pub mod macros;

pub mod data_structures;
pub mod drivers;
pub mod fs;
pub mod input;
pub mod interrupts;
pub mod io_port;
pub mod logger;
pub mod memory;
pub mod multiboot;
pub mod serial;
pub mod task;
pub mod testing;
pub mod vga_buffer;

use core::arch::asm;
use core::panic::PanicInfo;
use multiboot::MbBootInfo;

pub fn hlt() -> ! {
    loop {
        unsafe {
            asm!("hlt", options(nomem, nostack));
        }
    }
}

/// Brings up segmentation, interrupts, and physical/virtual memory plus
/// the heap: everything a test binary needs before it can allocate or
/// print, and everything the real kernel's boot sequence needs before
/// it goes on to touch a disk or start the scheduler.
///
/// # Safety
/// Must run exactly once, at the very start of `main`, before any
/// other subsystem in this crate is used.
pub unsafe fn init_core(mb_info: &MbBootInfo) {
    unsafe {
        interrupts::gdt::init();
        interrupts::init();
    }

    let mmap = mb_info.memory_map().expect("Multiboot info has no memory map");
    let (kernel_start, kernel_end) = memory::kernel_bounds();

    unsafe {
        fail_boot_on_err(memory::PMM.init(mmap, kernel_start, kernel_end));
        log!(ok, "Physical memory manager initialized.");

        fail_boot_on_err(memory::VMM.init());
        log!(ok, "Paging enabled.");

        fail_boot_on_err(memory::HEAP.init(memory::HEAP_START));
        log!(ok, "Kernel heap initialized.");
    }

    interrupts::enable_interrupts();
}

/// Collapses a boot-time `MemoryError` into the crate's halt-on-fatal
/// contract: log it to both consoles, then park the CPU. Every one-shot
/// setup routine `init_core` drives is fatal if it fails, so there is
/// nowhere to propagate a `Result` to.
fn fail_boot_on_err(result: Result<(), memory::MemoryError>) {
    if let Err(err) = result {
        log!(failed, "{}", err);
        hlt();
    }
}

#[cfg(test)]
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    testing::test_panic_handler(info);
}

/// # Safety
///
/// The caller (the asm bootstrap) must ensure `mb_boot_info_addr` is
/// non-null and points to a valid Multiboot1 info struct. This function
/// may only be called once.
#[cfg(test)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn main(mb_boot_info_addr: *const u8) -> ! {
    let mb_info = unsafe { MbBootInfo::new(mb_boot_info_addr) }.expect("Invalid Multiboot info");
    unsafe {
        init_core(&mb_info);
    }

    test_main();
    hlt();
}
