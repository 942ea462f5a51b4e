//! Two-level x86 paging: a single page directory (the only one this
//! kernel ever builds) mapping 4 KiB pages through 4 MiB page tables.

use crate::memory::error::MemoryError;
use crate::memory::pmm::{PAGE_SIZE, PMM};
use bitflags::bitflags;
use core::arch::asm;
use spin::Mutex;

const ENTRIES_PER_TABLE: usize = 1024;

bitflags! {
    #[derive(Clone, Copy)]
    pub struct PageFlags: u32 {
        const PRESENT = 1 << 0;
        const RW      = 1 << 1;
        const USER    = 1 << 2;
    }
}

#[repr(transparent)]
struct Table {
    entries: [u32; ENTRIES_PER_TABLE],
}

impl Table {
    /// # Safety
    /// `frame` must be a physical frame this kernel owns and that is
    /// currently accessible at the same address (identity-mapped or
    /// not-yet-paged).
    unsafe fn at(frame: usize) -> *mut Table {
        frame as *mut Table
    }
}

struct VmmInner {
    directory_phys: usize,
}

pub struct Vmm {
    inner: Mutex<Option<VmmInner>>,
}

impl Vmm {
    const fn new() -> Self {
        Vmm { inner: Mutex::new(None) }
    }

    /// Builds the kernel page directory, identity-maps the first 4 MiB,
    /// installs CR3 and sets CR0.PG.
    ///
    /// # Safety
    /// Must be called exactly once, after `Pmm::init`, before any
    /// `map` call or paged memory access.
    pub unsafe fn init(&self) -> Result<(), MemoryError> {
        let dir_frame = PMM.alloc_page().ok_or(MemoryError::FramesExhausted)?;
        let table_frame = PMM.alloc_page().ok_or(MemoryError::FramesExhausted)?;

        let directory = unsafe { &mut *Table::at(dir_frame) };
        for entry in directory.entries.iter_mut() {
            *entry = PageFlags::RW.bits();
        }

        let table = unsafe { &mut *Table::at(table_frame) };
        for (i, entry) in table.entries.iter_mut().enumerate() {
            let phys = i * PAGE_SIZE;
            *entry = (phys as u32) | (PageFlags::PRESENT | PageFlags::RW).bits();
        }

        directory.entries[0] = (table_frame as u32) | (PageFlags::PRESENT | PageFlags::RW).bits();

        *self.inner.lock() = Some(VmmInner { directory_phys: dir_frame });

        unsafe {
            enable_paging(dir_frame);
        }

        Ok(())
    }

    fn directory(&self) -> *mut Table {
        let guard = self.inner.lock();
        let inner = guard.as_ref().expect("Vmm::init must run before Vmm::map");
        unsafe { Table::at(inner.directory_phys) }
    }

    /// Maps a single 4 KiB page, allocating and installing a new page
    /// table if the covering directory entry is not yet present.
    pub fn map(&self, phys: usize, virt: usize, flags: PageFlags) {
        let pd_index = (virt >> 22) & 0x3FF;
        let pt_index = (virt >> 12) & 0x3FF;

        let directory = unsafe { &mut *self.directory() };
        if directory.entries[pd_index] & PageFlags::PRESENT.bits() == 0 {
            let table_frame = PMM.alloc_page().expect("no frame available for a new page table");
            let table = unsafe { &mut *Table::at(table_frame) };
            for entry in table.entries.iter_mut() {
                *entry = 0;
            }
            directory.entries[pd_index] = (table_frame as u32) | (PageFlags::PRESENT | PageFlags::RW).bits();
        }

        let table_frame = (directory.entries[pd_index] & !0xFFF) as usize;
        let table = unsafe { &mut *Table::at(table_frame) };
        table.entries[pt_index] = (phys as u32) | flags.bits() | PageFlags::PRESENT.bits();

        unsafe {
            invlpg(virt);
        }
    }
}

unsafe fn enable_paging(directory_phys: usize) {
    unsafe {
        asm!(
            "mov cr3, {dir}",
            "mov {tmp}, cr0",
            "or {tmp}, 0x80000000",
            "mov cr0, {tmp}",
            dir = in(reg) directory_phys,
            tmp = out(reg) _,
            options(nostack, preserves_flags),
        );
    }
}

unsafe fn invlpg(addr: usize) {
    unsafe {
        asm!("invlpg [{0}]", in(reg) addr, options(nostack, preserves_flags));
    }
}

pub static VMM: Vmm = Vmm::new();
