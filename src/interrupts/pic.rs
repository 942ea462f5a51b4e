//! 8259 PIC pair, remapped off the CPU exception vectors and onto
//! 0x20..0x30 (master) / 0x28..0x30 (slave).
//!
//! https://wiki.osdev.org/8259_PIC

use crate::io_port::{io_wait, IoPort};

const MASTER_COMMAND: IoPort = IoPort::new(0x20);
const MASTER_DATA: IoPort = IoPort::new(0x21);
const SLAVE_COMMAND: IoPort = IoPort::new(0xA0);
const SLAVE_DATA: IoPort = IoPort::new(0xA1);

const ICW1_INIT: u8 = 0x11; // edge triggered, cascade, expect ICW4
const ICW4_8086: u8 = 0x01;
const PIC_EOI: u8 = 0x20;

pub const MASTER_OFFSET: u8 = 32;
pub const SLAVE_OFFSET: u8 = 40;

// Port 0x64 is the controller's command register on write and its
// status register on read; same port, one `IoPort` handle for both.
const KBD_CONTROLLER_CMD_STATUS: IoPort = IoPort::new(0x64);
const KBD_CONTROLLER_DATA: IoPort = IoPort::new(0x60);
const KBD_ENABLE: u8 = 0xAE;
const KBD_STATUS_OUTPUT_FULL: u8 = 1 << 0;

/// Remaps IRQ0..7 to vectors 32..39 and IRQ8..15 to 40..47, then
/// unmasks every line this kernel services (timer, keyboard, mouse)
/// and masks the rest.
///
/// # Safety
/// Must run once, before `enable_interrupts`.
pub unsafe fn remap() {
    let master_mask = MASTER_DATA.read_u8();
    let slave_mask = SLAVE_DATA.read_u8();

    MASTER_COMMAND.write_u8(ICW1_INIT);
    io_wait();
    SLAVE_COMMAND.write_u8(ICW1_INIT);
    io_wait();

    MASTER_DATA.write_u8(MASTER_OFFSET);
    io_wait();
    SLAVE_DATA.write_u8(SLAVE_OFFSET);
    io_wait();

    MASTER_DATA.write_u8(0b0000_0100); // slave sits on master's IRQ2
    io_wait();
    SLAVE_DATA.write_u8(0b0000_0010); // slave's cascade identity
    io_wait();

    MASTER_DATA.write_u8(ICW4_8086);
    io_wait();
    SLAVE_DATA.write_u8(ICW4_8086);
    io_wait();

    // keep whatever the saved masks had set for every other line, but
    // force IRQ0 (timer), IRQ1 (keyboard), IRQ2 (the cascade line,
    // needed for IRQ8..15 to reach the CPU at all) and IRQ12 (mouse, on
    // the slave's line 4) unmasked regardless of what they were before.
    MASTER_DATA.write_u8(master_mask & 0b1111_1000);
    SLAVE_DATA.write_u8(slave_mask & 0b1110_1111);

    // enable the keyboard controller and drain whatever it left in its
    // output buffer from before the remap.
    KBD_CONTROLLER_CMD_STATUS.write_u8(KBD_ENABLE);
    while KBD_CONTROLLER_CMD_STATUS.read_u8() & KBD_STATUS_OUTPUT_FULL != 0 {
        KBD_CONTROLLER_DATA.read_u8();
    }
}

/// Sends an End-Of-Interrupt for the IRQ that raised `vector`. Slave
/// IRQs (40..47) require an EOI on both PICs.
pub fn send_eoi(vector: u8) {
    if vector >= SLAVE_OFFSET {
        SLAVE_COMMAND.write_u8(PIC_EOI);
    }
    MASTER_COMMAND.write_u8(PIC_EOI);
}
