#![no_std]
#![no_main]
#![feature(lazy_get)]
#![feature(custom_test_frameworks)]
#![test_runner(farix::testing::test_runner)]
#![reexport_test_harness_main = "test_main"]

use core::panic::PanicInfo;
use farix::multiboot::MbBootInfo;

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    farix::testing::test_panic_handler(info);
}

/// # Safety
///
/// The caller (the asm bootstrap) must ensure `mb_boot_info_addr` is
/// non-null and points to a valid Multiboot1 info struct.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn main(mb_boot_info_addr: *const u8) -> ! {
    let mb_info = unsafe { MbBootInfo::new(mb_boot_info_addr) }.expect("Invalid Multiboot info");
    unsafe {
        farix::init_core(&mb_info);
    }

    test_main();
    farix::hlt();
}

#[test_case]
fn boot_reaches_rust_code() {
    assert_eq!(1, 1);
}

#[test_case]
fn heap_is_initialized_after_boot() {
    assert!(farix::memory::HEAP.total_bytes() > 0);
}
