#![no_std]
#![no_main]
#![feature(lazy_get)]
#![feature(custom_test_frameworks)]
#![test_runner(farix::testing::test_runner)]
#![reexport_test_harness_main = "test_main"]

extern crate alloc;

use core::panic::PanicInfo;
use farix::drivers::ata::ATA;
use farix::fs::fat32::FAT32;
use farix::fs::mount;
use farix::multiboot::MbBootInfo;
use farix::{hlt, init_core, log, println, task};

#[cfg(not(test))]
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    log!(failed, "Kernel panic!");
    println!("{}", info);
    hlt();
}

#[cfg(test)]
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    farix::testing::test_panic_handler(info);
}

/// # Safety
///
/// The caller (the asm bootstrap) must ensure `mb_boot_info_addr` is
/// the untouched value the Multiboot loader left in `ebx`, pointing at
/// a valid `multiboot_info` struct, and that this function is only
/// called once. The bootstrap is also responsible for checking `eax`
/// against the Multiboot loader magic before ever reaching this
/// function; a mismatch there halts before Rust code runs at all.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn main(mb_boot_info_addr: *const u8) -> ! {
    let mb_info = match unsafe { MbBootInfo::new(mb_boot_info_addr) } {
        Ok(info) => info,
        Err(err) => {
            log!(failed, "Invalid Multiboot boot information: {}", err);
            hlt();
        }
    };

    unsafe {
        init_core(&mb_info);
    }
    log!(ok, "Kernel core initialized.");

    unsafe {
        ATA.init();
    }
    if ATA.present() {
        log!(ok, "ATA drive detected.");
    } else {
        log!(warn, "No ATA drive detected.");
    }

    if FAT32.init() {
        mount(&FAT32);
        log!(ok, "FAT32 filesystem mounted.");
    } else {
        log!(warn, "No FAT32 filesystem found; booting without a mounted disk.");
    }

    unsafe {
        farix::input::mouse::init();
    }
    log!(ok, "PS/2 mouse initialized.");

    unsafe {
        task::init();
    }
    task::create_task(demo_task, "demo");
    log!(ok, "Scheduler started.");

    #[cfg(test)]
    test_main();

    loop {
        task::yield_now();
    }
}

/// Stands in for the shell: the real command dispatcher lives outside
/// this crate and is scheduled the same way.
fn demo_task() {
    println!("farix: no shell mounted, idling.");
}
