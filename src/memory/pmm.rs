//! Bitmap physical memory manager.
//!
//! One bit per 4 KiB frame across the full 32-bit physical address
//! space (4 GiB / 4 KiB = 131072 bits). Bit set means used, bit clear
//! means free, matching the reference kernel's `pmm` design.

use crate::data_structures::bitmap::Bitmap;
use crate::memory::error::MemoryError;
use crate::multiboot::{MemoryMapEntryIter, MemoryMapRegionType};
use spin::Mutex;

pub const PAGE_SIZE: usize = 4096;
const TOTAL_FRAMES: usize = (4usize * 1024 * 1024 * 1024) / PAGE_SIZE;
const BITMAP_BYTES: usize = TOTAL_FRAMES / 8;

/// Frames below 1 MiB are never handed out, even if the memory map
/// claims they are available (real-mode IVT, BDA, video memory, the
/// original boot sector, ...).
const RESERVED_LOW_FRAMES: usize = 0x100000 / PAGE_SIZE;

pub struct Pmm {
    bitmap: Mutex<Bitmap<BITMAP_BYTES>>,
}

impl Pmm {
    const fn new() -> Self {
        Pmm { bitmap: Mutex::new(Bitmap::new(Some(TOTAL_FRAMES))) }
    }

    /// Marks every frame used, then clears the frames fully contained
    /// in an available Multiboot memory region, then re-marks the
    /// first 1 MiB and the kernel image as used.
    ///
    /// Fails with `NoUsableMemory` if the memory map names no
    /// available region at all; the bitmap is left fully marked used
    /// in that case, so every subsequent `alloc_page` would fail too.
    ///
    /// # Safety
    /// Must be called exactly once, before any `alloc_page`/`free_page`.
    pub unsafe fn init(
        &self,
        mmap: MemoryMapEntryIter,
        kernel_start: usize,
        kernel_end: usize,
    ) -> Result<(), MemoryError> {
        let mut bitmap = self.bitmap.lock();

        // start out fully used
        unsafe {
            core::ptr::write_bytes(bitmap.data_ptr_mut(), 0xFF, bitmap.len());
        }

        let mut saw_available = false;
        for entry in mmap {
            if entry.region_type() != MemoryMapRegionType::Available {
                continue;
            }
            saw_available = true;

            let first_frame = entry.base_addr.div_ceil(PAGE_SIZE as u64) as usize;
            let last_frame = ((entry.base_addr + entry.length) / PAGE_SIZE as u64) as usize;

            for frame in first_frame..last_frame {
                if frame < TOTAL_FRAMES {
                    bitmap.set(frame, false);
                }
            }
        }

        if !saw_available {
            return Err(MemoryError::NoUsableMemory);
        }

        for frame in 0..RESERVED_LOW_FRAMES {
            bitmap.set(frame, true);
        }

        let k_first = kernel_start / PAGE_SIZE;
        let k_last = kernel_end.div_ceil(PAGE_SIZE);
        for frame in k_first..k_last {
            bitmap.set(frame, true);
        }

        Ok(())
    }

    /// Returns the physical address of the lowest-numbered clear frame,
    /// marking it used, or `None` if the bitmap has no clear bit left.
    pub fn alloc_page(&self) -> Option<usize> {
        let mut bitmap = self.bitmap.lock();

        for frame in 0..bitmap.bit_len() {
            if bitmap.get(frame) == Some(false) {
                bitmap.set(frame, true);
                return Some(frame * PAGE_SIZE);
            }
        }

        None
    }

    /// Clears the bit for the frame containing `addr`. Callers must own
    /// the frame; there is no double-free detection.
    pub fn free_page(&self, addr: usize) {
        let mut bitmap = self.bitmap.lock();
        let frame = addr / PAGE_SIZE;
        if frame < bitmap.bit_len() {
            bitmap.set(frame, false);
        }
    }
}

pub static PMM: Pmm = Pmm::new();

#[cfg(test)]
mod tests {
    use super::*;

    // These run against the live, already-initialized global PMM (the
    // test harness boots the real kernel before `test_main` runs), so
    // they only check relative behavior, not absolute frame numbers.

    #[test_case]
    fn successive_allocations_never_collide() {
        let a = PMM.alloc_page().expect("frame allocator exhausted");
        let b = PMM.alloc_page().expect("frame allocator exhausted");
        assert_ne!(a, b);
        PMM.free_page(a);
        PMM.free_page(b);
    }

    #[test_case]
    fn free_then_alloc_can_return_the_same_frame() {
        let a = PMM.alloc_page().expect("frame allocator exhausted");
        PMM.free_page(a);
        let b = PMM.alloc_page().expect("frame allocator exhausted");
        assert_eq!(a, b);
        PMM.free_page(b);
    }
}
