//! Per-vCPU state touched by exception dispatch.
//!
//! Everything here is owned by the thread running the vCPU. There is no
//! locking: a [`CpuCore`] is only ever reached through `&mut` from its own
//! execution loop.

use crate::config::FaultConfig;
use crate::idt::{DescriptorTableReg, GateLayout};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CpuMode {
    /// Protected mode (including compatibility mode code on a 32-bit IDT).
    #[default]
    Protected,
    /// IA-32e mode.
    Long,
}

impl CpuMode {
    pub fn ip_mask(self) -> u64 {
        match self {
            CpuMode::Protected => 0xFFFF_FFFF,
            CpuMode::Long => u64::MAX,
        }
    }

    pub fn gate_layout(self) -> GateLayout {
        match self {
            CpuMode::Protected => GateLayout::Legacy,
            CpuMode::Long => GateLayout::Long,
        }
    }
}

/// The slice of architectural state exception dispatch reads.
#[derive(Debug, Clone, Default)]
pub struct CpuState {
    eip: u64,
    pub mode: CpuMode,
    pub idtr: DescriptorTableReg,
    /// Running as an SVM guest of an emulated hypervisor (`HF_GUEST`).
    pub nested_guest: bool,
}

impl CpuState {
    pub fn new(mode: CpuMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Start of the instruction currently being emulated.
    pub fn eip(&self) -> u64 {
        self.eip & self.mode.ip_mask()
    }

    pub fn set_eip(&mut self, eip: u64) {
        self.eip = eip & self.mode.ip_mask();
    }
}

/// Architectural fault handed from the raise path to the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultRecord {
    pub vector: u8,
    pub error_code: u32,
    pub is_software_interrupt: bool,
    /// For `INT n` the address of the next instruction, otherwise the
    /// faulting instruction.
    pub resume_eip: u64,
}

/// Exception bookkeeping that lives across instructions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultState {
    /// Last exception that can take part in a #DF/triple-fault chain.
    ///
    /// Written exactly once per classified exception and never for
    /// interrupts. Cleared by any benign exception.
    pub previously_pending_exception: Option<u8>,
    /// Filled in right before the raise path unwinds; taken by the loop.
    pub pending_fault: Option<FaultRecord>,
}

impl FaultState {
    /// Back to power-on state, after the host has reset the machine.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Owns the architectural state together with the dispatch bookkeeping.
#[derive(Debug, Default)]
pub struct CpuCore {
    pub state: CpuState,
    pub faults: FaultState,
    pub config: FaultConfig,
}

impl CpuCore {
    pub fn new(mode: CpuMode) -> Self {
        Self {
            state: CpuState::new(mode),
            ..Self::default()
        }
    }

    pub fn with_config(mut self, config: FaultConfig) -> Self {
        self.config = config;
        self
    }
}

impl core::ops::Deref for CpuCore {
    type Target = CpuState;

    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

impl core::ops::DerefMut for CpuCore {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.state
    }
}
