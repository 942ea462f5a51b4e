//! 32-bit IDT: 256 gates, all routed through a handful of external
//! assembly trampolines that save the caller-saved registers and call
//! back into the `extern "C"` functions below.
//!
//! https://wiki.osdev.org/Interrupt_Descriptor_Table

pub mod gdt;
pub mod pic;

use crate::interrupts::gdt::KERNEL_CODE_SELECTOR;
use core::arch::asm;

const ENTRY_COUNT: usize = 256;
const GATE_PRESENT_RING0_32BIT: u8 = 0x8E;

pub const TIMER_VECTOR: u8 = 32;
pub const KEYBOARD_VECTOR: u8 = 33;
pub const MOUSE_VECTOR: u8 = 44;

#[repr(C, packed)]
#[derive(Clone, Copy)]
struct IdtEntry {
    offset_low: u16,
    selector: u16,
    zero: u8,
    type_attr: u8,
    offset_high: u16,
}

impl IdtEntry {
    const fn missing() -> Self {
        IdtEntry { offset_low: 0, selector: 0, zero: 0, type_attr: 0, offset_high: 0 }
    }

    fn new(handler: u32, selector: u16, type_attr: u8) -> Self {
        IdtEntry {
            offset_low: (handler & 0xFFFF) as u16,
            selector,
            zero: 0,
            type_attr,
            offset_high: (handler >> 16) as u16,
        }
    }
}

#[repr(C, packed)]
struct Idt([IdtEntry; ENTRY_COUNT]);

#[repr(C, packed)]
struct Idtr {
    limit: u16,
    base: u32,
}

static mut IDT: Idt = Idt([IdtEntry::missing(); ENTRY_COUNT]);

/// Register state visible to an interrupt handler, pushed by the
/// trampoline before it calls back into Rust.
#[repr(C)]
pub struct InterruptFrame {
    pub eip: u32,
    pub cs: u32,
    pub eflags: u32,
}

unsafe extern "C" {
    /// Implemented outside this crate: routes every unhandled vector
    /// here, pushing the vector number and an `InterruptFrame`.
    fn isr_default_trampoline();
    fn isr_timer_trampoline();
    fn isr_keyboard_trampoline();
    fn isr_mouse_trampoline();
}

fn set_gate(vector: u8, handler: unsafe extern "C" fn()) {
    unsafe {
        #[allow(static_mut_refs)]
        let idt = &raw mut IDT;
        (*idt).0[vector as usize] = IdtEntry::new(handler as u32, KERNEL_CODE_SELECTOR, GATE_PRESENT_RING0_32BIT);
    }
}

/// Builds the full 256-gate table (every vector defaults to the
/// catch-all trampoline, with the three IRQs this kernel services
/// overridden), loads it, then remaps and unmasks the PIC.
///
/// # Safety
/// Must run after `gdt::init`, before `enable_interrupts`.
pub unsafe fn init() {
    unsafe {
        for vector in 0..ENTRY_COUNT {
            set_gate(vector as u8, isr_default_trampoline);
        }

        set_gate(TIMER_VECTOR, isr_timer_trampoline);
        set_gate(KEYBOARD_VECTOR, isr_keyboard_trampoline);
        set_gate(MOUSE_VECTOR, isr_mouse_trampoline);

        #[allow(static_mut_refs)]
        let idt = &raw const IDT;
        let idtr = Idtr {
            limit: (core::mem::size_of::<Idt>() - 1) as u16,
            base: idt as usize as u32,
        };

        asm!("lidt [{0}]", in(reg) &idtr, options(readonly, nostack, preserves_flags));

        pic::remap();
    }
}

pub fn interrupts_enabled() -> bool {
    let flags: u32;
    unsafe {
        asm!("pushfd", "pop {0}", out(reg) flags, options(nomem, preserves_flags));
    }
    flags & (1 << 9) != 0
}

pub fn disable_interrupts() {
    unsafe {
        asm!("cli", options(nomem, nostack));
    }
}

pub fn enable_interrupts() {
    unsafe {
        asm!("sti", options(nomem, nostack));
    }
}

/// Called by `isr_timer_trampoline` on every IRQ0.
#[no_mangle]
pub extern "C" fn timer_interrupt_handler() {
    crate::task::on_timer_tick();
    pic::send_eoi(TIMER_VECTOR);
}

/// Called by `isr_keyboard_trampoline` on every IRQ1.
#[no_mangle]
pub extern "C" fn keyboard_interrupt_handler() {
    let scancode = crate::io_port::IoPort::new(0x60).read_u8();
    crate::input::keyboard::on_scancode(scancode);
    pic::send_eoi(KEYBOARD_VECTOR);
}

/// Called by `isr_mouse_trampoline` on every IRQ12.
#[no_mangle]
pub extern "C" fn mouse_interrupt_handler() {
    let byte = crate::io_port::IoPort::new(0x60).read_u8();
    crate::input::mouse::on_byte(byte);
    pic::send_eoi(MOUSE_VECTOR);
}

/// Called by `isr_default_trampoline` for every vector this kernel
/// does not otherwise service: CPU exceptions and spurious IRQs alike.
#[no_mangle]
pub extern "C" fn default_interrupt_handler(vector: u32) {
    if vector < 32 {
        panic!("unhandled CPU exception {vector}");
    }

    crate::log!(warn, "unhandled interrupt vector {}", vector);
    if (32..48).contains(&vector) {
        pic::send_eoi(vector as u8);
    }
}
