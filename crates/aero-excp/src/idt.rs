//! IDT gate lookup used to report where a delivered vector would land.
//!
//! Nothing here feeds back into classification; an out-of-range vector just
//! means the handler address is not reported.

use std::fmt;

use crate::host::GuestMemory;

/// IDTR/GDTR-style base + limit pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DescriptorTableReg {
    pub base: u64,
    /// Offset of the last valid byte in the table.
    pub limit: u16,
}

/// On-memory layout of a single interrupt/trap gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateLayout {
    /// 8-byte protected-mode gate.
    Legacy,
    /// 16-byte long-mode gate.
    Long,
}

impl GateLayout {
    pub const fn entry_size(self) -> u64 {
        match self {
            GateLayout::Legacy => 8,
            GateLayout::Long => 16,
        }
    }

    /// Number of dwords holding the handler offset.
    const fn words(self) -> usize {
        match self {
            GateLayout::Legacy => 2,
            GateLayout::Long => 3,
        }
    }
}

/// Handler entry point decoded from a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerAddress {
    Legacy(u32),
    Long(u64),
}

impl HandlerAddress {
    pub fn addr(self) -> u64 {
        match self {
            HandlerAddress::Legacy(addr) => addr as u64,
            HandlerAddress::Long(addr) => addr,
        }
    }
}

impl fmt::Display for HandlerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HandlerAddress::Legacy(addr) => write!(f, "{addr:#010x}"),
            HandlerAddress::Long(addr) => write!(f, "{addr:#018x}"),
        }
    }
}

/// Reassembles the handler offset from the leading dwords of a gate.
///
/// Word 0 carries offset 15:0 in its low half, word 1 carries offset 31:16 in
/// its high half and (long mode only) word 2 is offset 63:32.
pub fn decode_handler(layout: GateLayout, words: &[u32; 3]) -> HandlerAddress {
    let low = (words[0] & 0xFFFF) | (words[1] & 0xFFFF_0000);
    match layout {
        GateLayout::Legacy => HandlerAddress::Legacy(low),
        GateLayout::Long => HandlerAddress::Long(low as u64 | ((words[2] as u64) << 32)),
    }
}

/// Resolves the handler address of `vector` in the table described by `idtr`.
///
/// Returns `None` when the gate is not fully covered by `idtr.limit`, in which
/// case guest memory is not touched at all, or when one of the gate reads
/// faults.
pub fn resolve_handler<M: GuestMemory + ?Sized>(
    idtr: &DescriptorTableReg,
    vector: u8,
    layout: GateLayout,
    mem: &mut M,
) -> Option<HandlerAddress> {
    let entry_size = layout.entry_size();
    let offset = (vector as u64) * entry_size;
    if offset + (entry_size - 1) > idtr.limit as u64 {
        return None;
    }

    let addr = idtr.base.wrapping_add(offset);
    let mut words = [0u32; 3];
    for (i, word) in words.iter_mut().take(layout.words()).enumerate() {
        *word = mem.read_u32_kernel(addr.wrapping_add(i as u64 * 4))?;
    }
    Some(decode_handler(layout, &words))
}
