//! PS/2 mouse: standard 3-byte packet assembly, pushed into an SPSC
//! ring buffer that a single consumer task drains.
//!
//! https://wiki.osdev.org/Mouse_Input
//!
//! This driver does not negotiate the IntelliMouse 4th (scroll) byte;
//! every packet is the plain 3-byte PS/2 shape, so `MouseEvent::scroll`
//! is always 0.

use crate::data_structures::ring_buffer::RingBuffer;
use crate::io_port::IoPort;
use core::sync::atomic::{AtomicU8, Ordering};
use spin::Mutex;

const BUFFER_CAPACITY: usize = 16;

const CONTROLLER_DATA: IoPort = IoPort::new(0x60);
const CONTROLLER_STATUS: IoPort = IoPort::new(0x64);
const CONTROLLER_COMMAND: IoPort = IoPort::new(0x64);

const STATUS_OUTPUT_FULL: u8 = 1 << 0;
const STATUS_INPUT_FULL: u8 = 1 << 1;

/// Bit 1 of the controller *configuration byte* (distinct from the
/// status register bit of the same value): enables the second PS/2
/// port's IRQ (IRQ12, the mouse line).
const CONFIG_ENABLE_IRQ12: u8 = 1 << 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MouseEvent {
    pub dx: i8,
    pub dy: i8,
    pub scroll: i8,
    pub left: bool,
    pub right: bool,
}

static BUFFER: Mutex<RingBuffer<MouseEvent, BUFFER_CAPACITY>> = Mutex::new(RingBuffer::new());
static CYCLE: AtomicU8 = AtomicU8::new(0);
static PACKET: Mutex<[u8; 3]> = Mutex::new([0; 3]);

fn wait_for_write_ready() {
    let mut timeout = 100_000;
    while timeout > 0 && CONTROLLER_STATUS.read_u8() & STATUS_INPUT_FULL != 0 {
        timeout -= 1;
    }
}

fn wait_for_read_ready() {
    let mut timeout = 100_000;
    while timeout > 0 && CONTROLLER_STATUS.read_u8() & STATUS_OUTPUT_FULL == 0 {
        timeout -= 1;
    }
}

fn write_command(command: u8) {
    wait_for_write_ready();
    CONTROLLER_COMMAND.write_u8(command);
}

fn write_data(data: u8) {
    wait_for_write_ready();
    CONTROLLER_DATA.write_u8(data);
}

fn read_data() -> u8 {
    wait_for_read_ready();
    CONTROLLER_DATA.read_u8()
}

/// Sends `data` to the mouse (via the `0xD4` passthrough command) and
/// consumes its ACK byte.
fn write_to_mouse(data: u8) {
    write_command(0xD4);
    write_data(data);
    read_data();
}

/// Resets the mouse, enables the auxiliary device and its IRQ line,
/// then switches on data reporting with default settings.
///
/// # Safety
/// Must run once, after `interrupts::init` has unmasked IRQ12.
pub unsafe fn init() {
    write_to_mouse(0xFF); // reset
    read_data(); // self-test result
    read_data(); // device id

    write_command(0xA8); // enable auxiliary device

    write_command(0x20); // read controller configuration byte
    let config = read_data() | CONFIG_ENABLE_IRQ12;
    write_command(0x60); // write controller configuration byte
    write_data(config);

    write_to_mouse(0xF6); // use default settings
    write_to_mouse(0xF4); // enable data reporting
}

/// Called from `mouse_interrupt_handler` with the raw byte read from
/// port 0x60, assembling one 3-byte packet before pushing a decoded
/// event.
pub fn on_byte(byte: u8) {
    let cycle = CYCLE.load(Ordering::SeqCst);
    PACKET.lock()[cycle as usize] = byte;

    if cycle < 2 {
        CYCLE.store(cycle + 1, Ordering::SeqCst);
        return;
    }

    CYCLE.store(0, Ordering::SeqCst);
    let packet = *PACKET.lock();
    let flags = packet[0];
    let event = MouseEvent {
        dx: packet[1] as i8,
        dy: packet[2] as i8,
        scroll: 0,
        left: flags & 0x01 != 0,
        right: flags & 0x02 != 0,
    };

    crate::without_interrupts!({
        BUFFER.lock().push(event);
    });
}

/// Pops the oldest decoded event, or `None` if the buffer is empty.
pub fn read() -> Option<MouseEvent> {
    crate::without_interrupts!({ BUFFER.lock().pop() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_case]
    fn three_bytes_assemble_into_one_event() {
        while read().is_some() {}
        CYCLE.store(0, Ordering::SeqCst);

        on_byte(0b0000_0001); // left button down, no overflow/sign bits
        on_byte(5); // dx
        on_byte((-3i8) as u8); // dy

        let event = read().expect("a full packet must produce one event");
        assert_eq!(event, MouseEvent { dx: 5, dy: -3, scroll: 0, left: true, right: false });
        assert!(read().is_none());
    }
}
