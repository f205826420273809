//! Architectural exception vectors and the per-vector diagnostic table.

use crate::error::ExcpError;

/// Architecturally defined x86 exception vectors.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exception {
    DivideError = 0,                // #DE
    Debug = 1,                      // #DB
    NonMaskableInterrupt = 2,       // NMI
    Breakpoint = 3,                 // #BP
    Overflow = 4,                   // #OF
    BoundRangeExceeded = 5,         // #BR
    InvalidOpcode = 6,              // #UD
    DeviceNotAvailable = 7,         // #NM
    DoubleFault = 8,                // #DF
    CoprocessorSegmentOverrun = 9,  // legacy, never raised by modern CPUs
    InvalidTss = 10,                // #TS
    SegmentNotPresent = 11,         // #NP
    StackFault = 12,                // #SS
    GeneralProtection = 13,         // #GP
    PageFault = 14,                 // #PF
    X87Fpu = 16,                    // #MF
    AlignmentCheck = 17,            // #AC
    MachineCheck = 18,              // #MC
    SimdFloatingPoint = 19,         // #XM/#XF
    Virtualization = 20,            // #VE
    ControlProtection = 21,         // #CP
    HypervisorInjection = 28,       // #HV
    VmmCommunication = 29,          // #VC
    Security = 30,                  // #SX
}

impl Exception {
    #[inline]
    pub const fn vector(self) -> u8 {
        self as u8
    }

    /// Whether the CPU pushes an error code for this exception.
    #[inline]
    pub fn pushes_error_code(self) -> bool {
        self.info().error_code
    }

    pub fn info(self) -> &'static VectorInfo {
        &VECTOR_INFO[self as usize]
    }
}

impl TryFrom<u8> for Exception {
    type Error = ExcpError;

    fn try_from(vector: u8) -> Result<Self, Self::Error> {
        Ok(match vector {
            0 => Exception::DivideError,
            1 => Exception::Debug,
            2 => Exception::NonMaskableInterrupt,
            3 => Exception::Breakpoint,
            4 => Exception::Overflow,
            5 => Exception::BoundRangeExceeded,
            6 => Exception::InvalidOpcode,
            7 => Exception::DeviceNotAvailable,
            8 => Exception::DoubleFault,
            9 => Exception::CoprocessorSegmentOverrun,
            10 => Exception::InvalidTss,
            11 => Exception::SegmentNotPresent,
            12 => Exception::StackFault,
            13 => Exception::GeneralProtection,
            14 => Exception::PageFault,
            16 => Exception::X87Fpu,
            17 => Exception::AlignmentCheck,
            18 => Exception::MachineCheck,
            19 => Exception::SimdFloatingPoint,
            20 => Exception::Virtualization,
            21 => Exception::ControlProtection,
            28 => Exception::HypervisorInjection,
            29 => Exception::VmmCommunication,
            30 => Exception::Security,
            other => return Err(ExcpError::InvalidVector(other)),
        })
    }
}

impl From<Exception> for u8 {
    fn from(value: Exception) -> Self {
        value.vector()
    }
}

/// Static description of one exception vector, used only for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorInfo {
    pub mnemonic: &'static str,
    pub name: &'static str,
    pub error_code: bool,
}

const fn info(mnemonic: &'static str, name: &'static str, error_code: bool) -> VectorInfo {
    VectorInfo {
        mnemonic,
        name,
        error_code,
    }
}

const RESERVED: VectorInfo = info("#RSV", "Reserved", false);

/// Diagnostic table for the 32 architecturally reserved exception vectors.
pub static VECTOR_INFO: [VectorInfo; 32] = [
    info("#DE", "Divide Error", false),
    info("#DB", "Debug", false),
    info("NMI", "Non-Maskable Interrupt", false),
    info("#BP", "Breakpoint", false),
    info("#OF", "Overflow", false),
    info("#BR", "BOUND Range Exceeded", false),
    info("#UD", "Invalid Opcode", false),
    info("#NM", "Device Not Available", false),
    info("#DF", "Double Fault", true),
    info("#CSO", "Coprocessor Segment Overrun", false),
    info("#TS", "Invalid TSS", true),
    info("#NP", "Segment Not Present", true),
    info("#SS", "Stack Fault", true),
    info("#GP", "General Protection", true),
    info("#PF", "Page Fault", true),
    RESERVED,
    info("#MF", "x87 Floating-Point Error", false),
    info("#AC", "Alignment Check", true),
    info("#MC", "Machine Check", false),
    info("#XM", "SIMD Floating-Point", false),
    info("#VE", "Virtualization", false),
    info("#CP", "Control Protection", true),
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    info("#HV", "Hypervisor Injection", false),
    info("#VC", "VMM Communication", true),
    info("#SX", "Security", true),
    RESERVED,
];

/// Looks up the diagnostic entry for `vector`.
///
/// Vectors 32..=255 are external or software interrupts and have no entry.
pub fn vector_info(vector: u8) -> Option<&'static VectorInfo> {
    VECTOR_INFO.get(vector as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_from_matches_vector_for_every_defined_exception() {
        for v in 0..=u8::MAX {
            if let Ok(exc) = Exception::try_from(v) {
                assert_eq!(exc.vector(), v);
                assert_ne!(exc.info().mnemonic, "#RSV", "vector {v}");
            }
        }
    }

    #[test]
    fn reserved_vectors_are_rejected() {
        for v in [15u8, 22, 27, 31, 32, 0x80, 0xFF] {
            assert_eq!(Exception::try_from(v), Err(ExcpError::InvalidVector(v)));
        }
    }

    #[test]
    fn error_code_table_matches_sdm() {
        let with_code: Vec<u8> = (0u8..32)
            .filter(|&v| VECTOR_INFO[v as usize].error_code)
            .collect();
        assert_eq!(with_code, vec![8, 10, 11, 12, 13, 14, 17, 21, 29, 30]);
        assert!(Exception::PageFault.pushes_error_code());
        assert!(!Exception::Breakpoint.pushes_error_code());
    }

    #[test]
    fn vector_info_only_covers_exceptions() {
        assert_eq!(vector_info(13).map(|i| i.mnemonic), Some("#GP"));
        assert!(vector_info(32).is_none());
    }
}
