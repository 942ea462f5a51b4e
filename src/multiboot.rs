//! Multiboot 1 boot information parsing.
//!
//! https://www.gnu.org/software/grub/manual/multiboot/multiboot.html
//!
//! Unlike Multiboot2's tag list, Multiboot1's `multiboot_info` is a
//! single fixed-layout struct with a `flags` bitmask indicating which
//! optional fields are valid.

use core::ffi::CStr;
use core::fmt;

pub const MULTIBOOT_BOOTLOADER_MAGIC: u32 = 0x2BADB002;

/// Internal diagnostic detail for why `MbBootInfo::new` refused a
/// bootloader-supplied pointer. Logged to serial by the caller before
/// collapsing to the crate's halt-on-invalid-boot contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootError {
    /// The bootloader left a null pointer in `ebx`.
    NullInfoPointer,
    /// The pointer is not aligned for `RawMbInfo`.
    MisalignedInfoPointer,
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootError::NullInfoPointer => write!(f, "bootloader passed a null Multiboot info pointer"),
            BootError::MisalignedInfoPointer => write!(f, "Multiboot info pointer is misaligned"),
        }
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy)]
    struct InfoFlags: u32 {
        const MEM           = 1 << 0;
        const BOOTDEV       = 1 << 1;
        const CMDLINE       = 1 << 2;
        const MODS          = 1 << 3;
        const AOUT_SYMS     = 1 << 4;
        const ELF_SHDR      = 1 << 5;
        const MEM_MAP       = 1 << 6;
        const DRIVE_INFO    = 1 << 7;
        const CONFIG_TABLE  = 1 << 8;
        const BOOT_LOADER_NAME = 1 << 9;
    }
}

/// Raw layout of the struct a Multiboot1-compliant loader leaves behind.
#[repr(C)]
struct RawMbInfo {
    flags: u32,
    mem_lower: u32,
    mem_upper: u32,
    boot_device: u32,
    cmdline: u32,
    mods_count: u32,
    mods_addr: u32,
    syms: [u32; 4],
    mmap_length: u32,
    mmap_addr: u32,
    drives_length: u32,
    drives_addr: u32,
    config_table: u32,
    boot_loader_name: u32,
    apm_table: u32,
    vbe_control_info: u32,
    vbe_mode_info: u32,
    vbe_mode: u16,
    vbe_interface_seg: u16,
    vbe_interface_off: u16,
    vbe_interface_len: u16,
}

/// A validated handle to the Multiboot1 info struct the bootloader
/// passed in `ebx`.
pub struct MbBootInfo {
    raw: &'static RawMbInfo,
}

impl MbBootInfo {
    /// # Safety
    ///
    /// `ptr` must be the address the bootloader placed in `ebx`,
    /// untouched, and must stay mapped and unmodified for the lifetime
    /// of the returned handle.
    pub unsafe fn new(ptr: *const u8) -> Result<Self, BootError> {
        if ptr.is_null() {
            return Err(BootError::NullInfoPointer);
        }
        if (ptr as usize) % core::mem::align_of::<RawMbInfo>() != 0 {
            return Err(BootError::MisalignedInfoPointer);
        }

        Ok(MbBootInfo {
            raw: unsafe { &*(ptr as *const RawMbInfo) },
        })
    }

    pub fn addr(&self) -> usize {
        self.raw as *const RawMbInfo as usize
    }

    pub fn mem_lower_upper(&self) -> Option<(u32, u32)> {
        InfoFlags::from_bits_truncate(self.raw.flags)
            .contains(InfoFlags::MEM)
            .then_some((self.raw.mem_lower, self.raw.mem_upper))
    }

    pub fn cmdline(&self) -> Option<&str> {
        if !InfoFlags::from_bits_truncate(self.raw.flags).contains(InfoFlags::CMDLINE) {
            return None;
        }

        unsafe { read_c_str(self.raw.cmdline) }
    }

    pub fn memory_map(&self) -> Option<MemoryMapEntryIter> {
        if !InfoFlags::from_bits_truncate(self.raw.flags).contains(InfoFlags::MEM_MAP) {
            return None;
        }

        Some(MemoryMapEntryIter {
            cursor: self.raw.mmap_addr as usize,
            end: self.raw.mmap_addr as usize + self.raw.mmap_length as usize,
        })
    }
}

unsafe fn read_c_str(addr: u32) -> Option<&'static str> {
    if addr == 0 {
        return None;
    }

    let cstr = unsafe { CStr::from_ptr(addr as *const i8) };
    cstr.to_str().ok()
}

#[repr(C, packed)]
struct RawMmapEntry {
    size: u32,
    base_addr: u64,
    length: u64,
    entry_type: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryMapRegionType {
    Available,
    Reserved(u32),
}

#[derive(Clone, Copy)]
pub struct MemoryMapEntry {
    pub base_addr: u64,
    pub length: u64,
    entry_type: u32,
}

impl MemoryMapEntry {
    pub fn region_type(&self) -> MemoryMapRegionType {
        match self.entry_type {
            1 => MemoryMapRegionType::Available,
            other => MemoryMapRegionType::Reserved(other),
        }
    }
}

/// Walks the variable-length `multiboot_mmap_entry` records.
///
/// Each record's `size` field is the length of everything *after*
/// `size` itself, so the next record starts at `size + 4` bytes past
/// the current one.
#[derive(Clone, Copy)]
pub struct MemoryMapEntryIter {
    cursor: usize,
    end: usize,
}

impl Iterator for MemoryMapEntryIter {
    type Item = MemoryMapEntry;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor + core::mem::size_of::<RawMmapEntry>() > self.end {
            return None;
        }

        let raw = unsafe { core::ptr::read_unaligned(self.cursor as *const RawMmapEntry) };
        self.cursor += raw.size as usize + 4;

        Some(MemoryMapEntry {
            base_addr: raw.base_addr,
            length: raw.length,
            entry_type: raw.entry_type,
        })
    }
}
