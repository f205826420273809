//! Interfaces to the systems that surround exception dispatch.
//!
//! The guest memory/TLB subsystem, the nested SVM intercept engine and the
//! machine reset logic are all owned by the embedder. This crate only calls
//! into them at the points documented on each trait.

use crate::error::ExcpError;

/// SVM `#VMEXIT` exit code, as reported in the VMCB `EXITCODE` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SvmExitCode(u32);

impl SvmExitCode {
    /// First exception intercept (`#DE`); exception `n` exits with `EXCP_BASE + n`.
    pub const EXCP_BASE: Self = Self(0x40);
    /// `INT n` intercept.
    pub const SWINT: Self = Self(0x75);
    /// Shutdown (triple fault) intercept.
    pub const SHUTDOWN: Self = Self(0x7f);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Exit code of the exception intercept for `vector`.
    pub const fn exception(vector: u8) -> Self {
        Self(Self::EXCP_BASE.0 + vector as u32)
    }

    pub fn exception_vector(self) -> Result<u8, ExcpError> {
        match self.0.checked_sub(Self::EXCP_BASE.0) {
            Some(v @ 0..=31) => Ok(v as u8),
            _ => Err(ExcpError::NotAnExceptionExit(self)),
        }
    }
}

/// Why the machine is being reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetCause {
    /// The guest triple faulted.
    GuestReset,
}

/// Byte-level access to guest memory with supervisor privileges.
pub trait GuestMemory {
    /// Reads a little-endian dword at linear address `addr`, ignoring CPL.
    ///
    /// Returns `None` if the read would fault (unmapped, MMIO, walk error).
    /// Implementations must not raise or unwind from here: the dispatcher
    /// calls this while a fault is already being delivered, and a failed
    /// read only means the handler address goes unreported.
    fn read_u32_kernel(&mut self, addr: u64) -> Option<u32>;
}

/// Nested virtualization (SVM) intercept engine.
pub trait NestedIntercept {
    /// Gives an outer hypervisor the chance to intercept the event.
    ///
    /// Implementations that decide to take a `#VMEXIT` never return; they
    /// leave through [`crate::exit::cpu_loop_exit`] with
    /// [`crate::LoopExit::NestedVmExit`]. Returning means "not intercepted".
    fn check_intercept(&mut self, exit_code: SvmExitCode, info: u64, resume_addr: Option<u64>);

    /// Unconditionally takes a `#VMEXIT` to the outer hypervisor.
    fn vmexit(&mut self, exit_code: SvmExitCode, info: u64, resume_addr: Option<u64>) -> !;
}

/// Machine-level reset requests.
pub trait ResetControl {
    /// Schedules a full machine reset. Must not block on the calling vCPU.
    ///
    /// The dispatcher then exits with [`crate::LoopExit::Halt`]. Once the reset
    /// has been carried out the host clears each vCPU's fault bookkeeping with
    /// [`crate::FaultState::reset`]; until then the pending #DF stays recorded.
    fn request_machine_reset(&mut self, cause: ResetCause);
}

/// Everything the dispatcher needs from its embedder.
pub trait FaultHost: GuestMemory + NestedIntercept + ResetControl {}

impl<T: GuestMemory + NestedIntercept + ResetControl> FaultHost for T {}
