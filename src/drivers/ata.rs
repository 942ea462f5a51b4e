//! ATA PIO, 28-bit LBA, primary bus, master drive only.
//!
//! https://wiki.osdev.org/ATA_PIO_Mode
//!
//! No DMA, no secondary bus, no slave drive: the reference driver this
//! is built from only ever spoke to one disk, and so does this one.

use crate::drivers::BlockDevice;
use crate::io_port::IoPort;
use spin::Mutex;

const DATA: IoPort = IoPort::new(0x1F0);
const SECTOR_COUNT: IoPort = IoPort::new(0x1F2);
const LBA_LOW: IoPort = IoPort::new(0x1F3);
const LBA_MID: IoPort = IoPort::new(0x1F4);
const LBA_HIGH: IoPort = IoPort::new(0x1F5);
const DRIVE_HEAD: IoPort = IoPort::new(0x1F6);
const STATUS_COMMAND: IoPort = IoPort::new(0x1F7);

const STATUS_ERR: u8 = 1 << 0;
const STATUS_DRQ: u8 = 1 << 3;
const STATUS_BSY: u8 = 1 << 7;

const CMD_READ: u8 = 0x20;
const CMD_WRITE: u8 = 0x30;
const CMD_CACHE_FLUSH: u8 = 0xE7;
const CMD_IDENTIFY: u8 = 0xEC;

pub struct AtaDrive {
    present: Mutex<bool>,
}

impl AtaDrive {
    const fn new() -> Self {
        AtaDrive { present: Mutex::new(false) }
    }

    /// Selects the master drive and issues IDENTIFY, as a presence
    /// check. Absence of the drive (status reads back 0) is not an
    /// error: callers later see `present() == false` and simply never
    /// mount a filesystem.
    ///
    /// # Safety
    /// Must run once, before any `read_sector`/`write_sector` call.
    pub unsafe fn init(&self) {
        DRIVE_HEAD.write_u8(0xA0);
        SECTOR_COUNT.write_u8(0);
        LBA_LOW.write_u8(0);
        LBA_MID.write_u8(0);
        LBA_HIGH.write_u8(0);
        STATUS_COMMAND.write_u8(CMD_IDENTIFY);

        let status = STATUS_COMMAND.read_u8();
        if status == 0 {
            *self.present.lock() = false;
            return;
        }

        self.wait_ready();
        for _ in 0..256 {
            DATA.read_u16();
        }

        *self.present.lock() = true;
    }

    pub fn present(&self) -> bool {
        *self.present.lock()
    }

    /// Polls `BSY` clear, then `DRQ` set or `ERR` set. Per the reference
    /// driver, an `ERR` status is left for the caller to notice from the
    /// data it gets back rather than surfaced here: this routine only
    /// ever reports readiness, never failure.
    fn wait_ready(&self) {
        while STATUS_COMMAND.read_u8() & STATUS_BSY != 0 {}

        loop {
            let status = STATUS_COMMAND.read_u8();
            if status & STATUS_DRQ != 0 || status & STATUS_ERR != 0 {
                break;
            }
        }
    }

    fn select_lba(&self, lba: u32) {
        DRIVE_HEAD.write_u8(0xE0 | ((lba >> 24) & 0x0F) as u8);
        for _ in 0..4 {
            STATUS_COMMAND.read_u8();
        }
        SECTOR_COUNT.write_u8(1);
        LBA_LOW.write_u8((lba & 0xFF) as u8);
        LBA_MID.write_u8(((lba >> 8) & 0xFF) as u8);
        LBA_HIGH.write_u8(((lba >> 16) & 0xFF) as u8);
    }
}

impl BlockDevice for AtaDrive {
    fn read_sector(&self, lba: u32, buf: &mut [u8; 512]) {
        self.select_lba(lba);
        STATUS_COMMAND.write_u8(CMD_READ);
        self.wait_ready();

        for word in buf.chunks_exact_mut(2) {
            let value = DATA.read_u16().to_le_bytes();
            word[0] = value[0];
            word[1] = value[1];
        }
    }

    fn write_sector(&self, lba: u32, buf: &[u8; 512]) {
        self.select_lba(lba);
        STATUS_COMMAND.write_u8(CMD_WRITE);
        self.wait_ready();

        for word in buf.chunks_exact(2) {
            DATA.write_u16(u16::from_le_bytes([word[0], word[1]]));
        }

        STATUS_COMMAND.write_u8(CMD_CACHE_FLUSH);
        while STATUS_COMMAND.read_u8() & STATUS_BSY != 0 {}
    }
}

pub static ATA: AtaDrive = AtaDrive::new();
