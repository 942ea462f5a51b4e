//! Flat 32-bit GDT: null, kernel code, kernel data, user code, user
//! data. Every segment spans 0..4 GiB with 4 KiB granularity; the
//! ring-3 descriptors exist because the GDT shape calls for them, but
//! this kernel never switches to ring 3 (see the crate's Non-goals).

use bitflags::bitflags;

bitflags! {
    #[derive(Clone, Copy)]
    struct AccessByte: u8 {
        const ACCESSED   = 1 << 0;
        const RW         = 1 << 1;
        const DC         = 1 << 2;
        const EXECUTABLE = 1 << 3;
        const DESCRIPTOR = 1 << 4; // 1 = code/data, 0 = system
        const DPL_LO     = 1 << 5;
        const DPL_HI     = 1 << 6;
        const PRESENT    = 1 << 7;
    }
}

bitflags! {
    #[derive(Clone, Copy)]
    struct FlagsNibble: u8 {
        const SIZE_32BIT      = 1 << 2;
        const GRANULARITY_4K  = 1 << 3;
    }
}

#[repr(C, packed)]
#[derive(Clone, Copy)]
struct Descriptor {
    limit_0: u16,
    base_0: u16,
    base_1: u8,
    access: u8,
    limit_1_and_flags: u8,
    base_2: u8,
}

impl Descriptor {
    const fn null() -> Self {
        Descriptor { limit_0: 0, base_0: 0, base_1: 0, access: 0, limit_1_and_flags: 0, base_2: 0 }
    }

    /// A flat 0..4 GiB, 4 KiB-granular, 32-bit segment with the given
    /// access byte. Base is always 0 since the whole kernel runs
    /// identity-mapped with a single flat address space.
    fn flat(access: AccessByte) -> Self {
        let flags = FlagsNibble::SIZE_32BIT | FlagsNibble::GRANULARITY_4K;
        Descriptor {
            limit_0: 0xFFFF,
            base_0: 0,
            base_1: 0,
            access: access.bits(),
            limit_1_and_flags: 0x0F | (flags.bits() << 4),
            base_2: 0,
        }
    }
}

#[repr(C, packed)]
struct Gdtr {
    limit: u16,
    base: u32,
}

pub const KERNEL_CODE_SELECTOR: u16 = 0x08;
pub const KERNEL_DATA_SELECTOR: u16 = 0x10;

#[repr(C, packed)]
struct Gdt {
    null: Descriptor,
    kernel_code: Descriptor,
    kernel_data: Descriptor,
    user_code: Descriptor,
    user_data: Descriptor,
}

static mut GDT: Gdt = Gdt {
    null: Descriptor::null(),
    kernel_code: Descriptor::null(),
    kernel_data: Descriptor::null(),
    user_code: Descriptor::null(),
    user_data: Descriptor::null(),
};

unsafe extern "C" {
    /// Implemented outside this crate: loads the GDTR from the pointer
    /// handed to it, then reloads CS (far jump/ret) and the data
    /// segment registers with the kernel selectors.
    fn gdt_flush(gdtr: *const u8);
}

/// Builds the five flat descriptors and loads them via `gdt_flush`.
///
/// # Safety
/// Must run once, before `idt::init` enables interrupts.
pub unsafe fn init() {
    let kernel_code_access = AccessByte::PRESENT | AccessByte::DESCRIPTOR | AccessByte::EXECUTABLE | AccessByte::RW;
    let kernel_data_access = AccessByte::PRESENT | AccessByte::DESCRIPTOR | AccessByte::RW;
    let user_code_access = kernel_code_access | AccessByte::DPL_LO | AccessByte::DPL_HI;
    let user_data_access = kernel_data_access | AccessByte::DPL_LO | AccessByte::DPL_HI;

    unsafe {
        #[allow(static_mut_refs)]
        let gdt = &raw mut GDT;
        (*gdt).kernel_code = Descriptor::flat(kernel_code_access);
        (*gdt).kernel_data = Descriptor::flat(kernel_data_access);
        (*gdt).user_code = Descriptor::flat(user_code_access);
        (*gdt).user_data = Descriptor::flat(user_data_access);

        let gdtr = Gdtr {
            limit: (core::mem::size_of::<Gdt>() - 1) as u16,
            base: gdt as usize as u32,
        };

        gdt_flush(&gdtr as *const Gdtr as *const u8);
    }
}
