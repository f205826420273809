//! The one place where guest execution is abandoned mid-instruction.
//!
//! Raising a fault unwinds with a [`LoopExit`] payload via
//! [`std::panic::resume_unwind`]; [`catch_loop_exit`] at the dispatch loop is
//! the only frame that stops it. `resume_unwind` skips the panic hook, so a
//! fault never shows up as a panic message. Any other panic passes through
//! [`catch_loop_exit`] untouched.

use std::panic::{self, AssertUnwindSafe};

use crate::host::SvmExitCode;
use crate::state::{CpuCore, FaultRecord};

/// Why the current instruction was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Deliver `FaultState::pending_fault`.
    ///
    /// `resume_addr` is the guest address to restore before delivery when the
    /// raise came from inside a helper that had already moved past the start
    /// of the instruction.
    Fault { resume_addr: Option<u64> },
    /// Triple fault outside a nested guest; a machine reset was requested.
    Halt,
    /// The nested SVM layer took a `#VMEXIT`.
    NestedVmExit {
        exit_code: SvmExitCode,
        info: u64,
        resume_addr: Option<u64>,
    },
}

/// Abandons the current instruction and unwinds to the dispatch loop.
pub fn cpu_loop_exit(exit: LoopExit) -> ! {
    panic::resume_unwind(Box::new(exit))
}

/// Runs `f`, turning a [`cpu_loop_exit`] inside it into `Err`.
pub fn catch_loop_exit<R>(f: impl FnOnce() -> R) -> Result<R, LoopExit> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Ok(value),
        Err(payload) => match payload.downcast::<LoopExit>() {
            Ok(exit) => Err(*exit),
            Err(other) => panic::resume_unwind(other),
        },
    }
}

/// What happened to one emulated instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Retired,
    /// Hand this to exception delivery.
    Fault(FaultRecord),
    /// Triple fault; the machine is going through reset.
    Halted,
    NestedVmExit { exit_code: SvmExitCode, info: u64 },
    /// A [`LoopExit::Fault`] arrived with nothing in `pending_fault`, e.g. a
    /// host callback unwound on its own. The instruction is dropped and the
    /// loop carries on.
    Abandoned,
}

impl CpuCore {
    /// Dispatch-loop side of [`cpu_loop_exit`]: runs one instruction's
    /// emulation and collects whatever fault it raised.
    pub fn execute<H, F>(&mut self, host: &mut H, f: F) -> StepOutcome
    where
        F: FnOnce(&mut CpuCore, &mut H),
    {
        let exit = match catch_loop_exit(|| f(&mut *self, &mut *host)) {
            Ok(()) => return StepOutcome::Retired,
            Err(exit) => exit,
        };

        match exit {
            LoopExit::Fault { resume_addr } => {
                if let Some(addr) = resume_addr {
                    self.set_eip(addr);
                }
                let Some(mut record) = self.faults.pending_fault.take() else {
                    tracing::error!(eip = self.eip(), "fault exit without a pending fault");
                    return StepOutcome::Abandoned;
                };
                if resume_addr.is_some() && !record.is_software_interrupt {
                    record.resume_eip = self.eip();
                }
                StepOutcome::Fault(record)
            }
            LoopExit::Halt => StepOutcome::Halted,
            LoopExit::NestedVmExit {
                exit_code,
                info,
                resume_addr,
            } => {
                if let Some(addr) = resume_addr {
                    self.set_eip(addr);
                }
                StepOutcome::NestedVmExit { exit_code, info }
            }
        }
    }
}
