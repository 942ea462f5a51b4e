#![allow(dead_code)]

// https://wiki.osdev.org/I/O_Ports
// https://wiki.osdev.org/Serial_Ports
use crate::io_port::IoPort;
use core::{cell::LazyCell, fmt};
use spin::Mutex;

pub struct SerialPort {
    data: IoPort,
    line_status: IoPort,
}

// 0x3F8 is the default addr for COM1
pub static SERIAL_PORT: Mutex<LazyCell<SerialPort>> = Mutex::new(LazyCell::new(|| SerialPort::init(0x3F8)));

impl SerialPort {
    #[allow(clippy::identity_op)]
    /// This `needs` to be called at least once before any data being sent but should be fine if it is called mutiple times.
    fn init(port: u16) -> SerialPort {
        let data = IoPort::new(port);
        let int_en = IoPort::new(port + 1);
        let fifo_ctrl = IoPort::new(port + 2);
        let line_ctrl = IoPort::new(port + 3);
        let modem_ctrl = IoPort::new(port + 4);
        let line_status = IoPort::new(port + 5);

        int_en.write_u8(0x00); // disable all interrupts
        line_ctrl.write_u8(0x80); // enable DLAB (set baud rate divisor)
        data.write_u8(0x03); // set divisor to 3 (lo byte) 38400 baud rate
        int_en.write_u8(0x00); //                  (hi byte)
        line_ctrl.write_u8(0x03); // 8 bits, no parity, one stop bit
        fifo_ctrl.write_u8(0xC7); // enable FIFO, clear them, with 14-byte threshold
        modem_ctrl.write_u8(0x0B); // IRQs enabled, RTS/DSR set

        // set the port to normal operation mode (not-loopback with IRQs enabled and OUT#1 and OUT#2 bits enabled)
        modem_ctrl.write_u8(0x0F);

        Self { data, line_status }
    }

    fn send(&self, value: u8) {
        // wait for the serial port to be ready for the transmission
        while self.line_status.read_u8() & 0x20 == 0 {}

        self.data.write_u8(value);
    }

    fn receive(&self) -> u8 {
        // wait for the serial port to be ready to receive
        while self.line_status.read_u8() & 1 == 0 {}

        self.data.read_u8()
    }
}

impl fmt::Write for SerialPort {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        // send all the bytes 'as is'
        for byte in s.bytes() {
            self.send(byte);
        }

        Ok(())
    }
}
