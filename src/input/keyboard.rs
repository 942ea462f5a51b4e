//! PS/2 keyboard: scancode set 1 decoding, pushed into an SPSC ring
//! buffer that a single consumer task drains.
//!
//! https://wiki.osdev.org/PS/2_Keyboard

use crate::data_structures::ring_buffer::RingBuffer;
use core::sync::atomic::{AtomicBool, Ordering};
use spin::Mutex;

const BUFFER_CAPACITY: usize = 128;

/// Synthetic byte the original firmware layer used for the up arrow;
/// outside the ASCII range so it cannot collide with a real key.
pub const KEY_UP: u8 = 0x80;
pub const KEY_DOWN: u8 = 0x81;

const LEFT_SHIFT_MAKE: u8 = 0x2A;
const LEFT_SHIFT_BREAK: u8 = 0xAA;
const RIGHT_SHIFT_MAKE: u8 = 0x36;
const RIGHT_SHIFT_BREAK: u8 = 0xB6;
const EXTENDED_PREFIX: u8 = 0xE0;
const ARROW_UP_SCANCODE: u8 = 0x48;
const ARROW_DOWN_SCANCODE: u8 = 0x50;
const BREAK_BIT: u8 = 0x80;

static SHIFT_PRESSED: AtomicBool = AtomicBool::new(false);
static EXTENDED_PENDING: AtomicBool = AtomicBool::new(false);

static BUFFER: Mutex<RingBuffer<u8, BUFFER_CAPACITY>> = Mutex::new(RingBuffer::new());

#[rustfmt::skip]
static SCANCODE_TO_ASCII: [u8; 128] = [
    0,    0,    b'1', b'2', b'3', b'4', b'5', b'6',
    b'7', b'8', b'9', b'0', b'-', b'=', 8,    b'\t',
    b'q', b'w', b'e', b'r', b't', b'y', b'u', b'i',
    b'o', b'p', b'[', b']', b'\n', 0,   b'a', b's',
    b'd', b'f', b'g', b'h', b'j', b'k', b'l', b';',
    b'\'', b'`', 0,   b'\\', b'z', b'x', b'c', b'v',
    b'b', b'n', b'm', b',', b'.', b'/', 0,    b'*',
    0,    b' ', 0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
];

#[rustfmt::skip]
static SCANCODE_TO_ASCII_SHIFTED: [u8; 128] = [
    0,    0,    b'!', b'@', b'#', b'$', b'%', b'^',
    b'&', b'*', b'(', b')', b'_', b'+', 8,    b'\t',
    b'Q', b'W', b'E', b'R', b'T', b'Y', b'U', b'I',
    b'O', b'P', b'{', b'}', b'\n', 0,   b'A', b'S',
    b'D', b'F', b'G', b'H', b'J', b'K', b'L', b':',
    b'"', b'~', 0,    b'|', b'Z', b'X', b'C', b'V',
    b'B', b'N', b'M', b'<', b'>', b'?', 0,    b'*',
    0,    b' ', 0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
];

/// Called from `timer_interrupt_handler`'s sibling, the keyboard IRQ
/// handler, with the raw byte read from port 0x60.
pub fn on_scancode(scancode: u8) {
    if EXTENDED_PENDING.swap(false, Ordering::SeqCst) {
        let key = match scancode & !BREAK_BIT {
            ARROW_UP_SCANCODE => Some(KEY_UP),
            ARROW_DOWN_SCANCODE => Some(KEY_DOWN),
            _ => None,
        };
        if let Some(key) = key {
            if scancode & BREAK_BIT == 0 {
                push(key);
            }
        }
        return;
    }

    match scancode {
        EXTENDED_PREFIX => EXTENDED_PENDING.store(true, Ordering::SeqCst),
        LEFT_SHIFT_MAKE | RIGHT_SHIFT_MAKE => SHIFT_PRESSED.store(true, Ordering::SeqCst),
        LEFT_SHIFT_BREAK | RIGHT_SHIFT_BREAK => SHIFT_PRESSED.store(false, Ordering::SeqCst),
        code if code & BREAK_BIT != 0 => {}
        code => {
            let table = if SHIFT_PRESSED.load(Ordering::SeqCst) {
                &SCANCODE_TO_ASCII_SHIFTED
            } else {
                &SCANCODE_TO_ASCII
            };
            let ascii = table[code as usize];
            if ascii != 0 {
                push(ascii);
            }
        }
    }
}

fn push(byte: u8) {
    crate::without_interrupts!({
        BUFFER.lock().push(byte);
    });
}

/// Pops the oldest decoded byte, or `None` if the buffer is empty.
pub fn read() -> Option<u8> {
    crate::without_interrupts!({ BUFFER.lock().pop() })
}
