//! Human-readable fault descriptions for the debug log.

use std::fmt;

use bitflags::bitflags;

use crate::exceptions::{vector_info, Exception};

bitflags! {
    /// #PF error code bits (SDM Vol. 3A, 4.7).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PageFaultErrorCode: u32 {
        /// Protection violation; clear means the page was not present.
        const PRESENT = 1 << 0;
        /// Write access; clear means read.
        const WRITE = 1 << 1;
        /// CPL 3 access; clear means supervisor.
        const USER = 1 << 2;
        const RESERVED_BIT = 1 << 3;
        /// Instruction fetch from an NX page.
        const INSTRUCTION_FETCH = 1 << 4;
        const PROTECTION_KEY = 1 << 5;
        const SHADOW_STACK = 1 << 6;
        const SGX = 1 << 15;
    }
}

impl PageFaultErrorCode {
    /// Renders the cause, e.g. `"non-present page, read access, ring 0"`.
    pub fn describe(self) -> String {
        let mut parts = vec![
            if self.contains(Self::PRESENT) {
                "page-protection violation"
            } else {
                "non-present page"
            },
            if self.contains(Self::WRITE) {
                "write access"
            } else {
                "read access"
            },
            if self.contains(Self::USER) {
                "ring 3"
            } else {
                "ring 0"
            },
        ];
        let extra = [
            (Self::RESERVED_BIT, "reserved bit violation"),
            (Self::INSTRUCTION_FETCH, "instruction fetch on NX"),
            (Self::PROTECTION_KEY, "protection key violation"),
            (Self::SHADOW_STACK, "shadow stack access"),
            (Self::SGX, "SGX access violation"),
        ];
        parts.extend(
            extra
                .iter()
                .filter(|(bit, _)| self.contains(*bit))
                .map(|&(_, text)| text),
        );
        parts.join(", ")
    }
}

/// One-line description of a raised exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultSummary {
    pub vector: u8,
    pub error_code: u32,
    pub eip: u64,
}

impl fmt::Display for FaultSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match vector_info(self.vector) {
            Some(info) => write!(f, "{} {}", info.mnemonic, info.name)?,
            None => write!(f, "vector {:#04x}", self.vector)?,
        }
        write!(f, " at eip={:#x}", self.eip)?;
        if self.vector == Exception::PageFault.vector() {
            let bits = PageFaultErrorCode::from_bits_retain(self.error_code);
            write!(f, " error_code={:#x} ({})", self.error_code, bits.describe())
        } else if vector_info(self.vector).is_some_and(|info| info.error_code) {
            write!(f, " error_code={:#x}", self.error_code)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_user_write_to_missing_page() {
        let code = PageFaultErrorCode::WRITE | PageFaultErrorCode::USER;
        assert_eq!(code.describe(), "non-present page, write access, ring 3");
    }

    #[test]
    fn describes_optional_bits_in_order() {
        let code = PageFaultErrorCode::PRESENT
            | PageFaultErrorCode::INSTRUCTION_FETCH
            | PageFaultErrorCode::SGX;
        assert_eq!(
            code.describe(),
            "page-protection violation, read access, ring 0, instruction fetch on NX, SGX access violation"
        );
    }

    #[test]
    fn summary_formats() {
        let gp = FaultSummary {
            vector: 13,
            error_code: 0x18,
            eip: 0x1000,
        };
        assert_eq!(gp.to_string(), "#GP General Protection at eip=0x1000 error_code=0x18");

        let pf = FaultSummary {
            vector: 14,
            error_code: 0b111,
            eip: 0x2000,
        };
        assert_eq!(
            pf.to_string(),
            "#PF Page Fault at eip=0x2000 error_code=0x7 (page-protection violation, write access, ring 3)"
        );

        let ud = FaultSummary {
            vector: 6,
            error_code: 0,
            eip: 0x10,
        };
        assert_eq!(ud.to_string(), "#UD Invalid Opcode at eip=0x10");

        let irq = FaultSummary {
            vector: 0x80,
            error_code: 0,
            eip: 0x10,
        };
        assert_eq!(irq.to_string(), "vector 0x80 at eip=0x10");
    }
}
