//! Raising exceptions and software interrupts from instruction helpers.
//!
//! Every function here ends the current instruction: the fault is recorded
//! in [`crate::FaultState::pending_fault`] and control unwinds to the
//! dispatch loop. The order of work inside [`raise`] is fixed:
//!
//! 1. SVM intercept check (may `#VMEXIT` and never come back),
//! 2. classification against the pending chain (exceptions only),
//! 3. update of `previously_pending_exception`,
//! 4. write of `pending_fault`, then the unwind.
//!
//! The optional handler lookup for diagnostics runs between the last two
//! steps, once the record can no longer change.
//!
//! Touching the chain before step 1 would leave the outer hypervisor's view
//! of it corrupted after a nested `#VMEXIT`.

use crate::classify::{classify, Classification};
use crate::diag::FaultSummary;
use crate::exit::{cpu_loop_exit, LoopExit};
use crate::host::{FaultHost, ResetCause, SvmExitCode};
use crate::idt::resolve_handler;
use crate::state::{CpuCore, FaultRecord};

/// Signals `vector` and abandons the current instruction.
///
/// `next_eip_delta` is the length of the instruction for `INT n` style
/// software interrupts and `0` otherwise. `resume_addr` is forwarded to the
/// intercept check and the loop exit; see [`LoopExit::Fault`].
pub fn raise<H: FaultHost + ?Sized>(
    cpu: &mut CpuCore,
    host: &mut H,
    vector: u8,
    is_software_interrupt: bool,
    error_code: u32,
    next_eip_delta: u64,
    resume_addr: Option<u64>,
) -> ! {
    let (vector, error_code) = if is_software_interrupt {
        host.check_intercept(SvmExitCode::SWINT, 0, resume_addr);
        (vector, error_code)
    } else {
        host.check_intercept(
            SvmExitCode::exception(vector),
            error_code as u64,
            resume_addr,
        );
        match classify(cpu.faults.previously_pending_exception, vector) {
            Classification::Deliver {
                vector,
                error_code: forced,
                next_pending,
            } => {
                cpu.faults.previously_pending_exception = next_pending;
                (vector, forced.unwrap_or(error_code))
            }
            Classification::TripleFault => triple_fault(cpu, host, resume_addr),
        }
    };

    let resume_eip = cpu.eip().wrapping_add(next_eip_delta) & cpu.mode.ip_mask();
    cpu.faults.pending_fault = Some(FaultRecord {
        vector,
        error_code,
        is_software_interrupt,
        resume_eip,
    });

    // Reporting only. The record above is final whatever the gate reads do.
    if !is_software_interrupt && cpu.config.handler_diagnostics {
        let layout = cpu.mode.gate_layout();
        match resolve_handler(&cpu.idtr, vector, layout, host) {
            Some(handler) => tracing::debug!(vector, %handler, "exception handler"),
            None => tracing::debug!(vector, limit = cpu.idtr.limit, "handler not resolvable"),
        }
    }

    cpu_loop_exit(LoopExit::Fault { resume_addr })
}

fn triple_fault<H: FaultHost + ?Sized>(
    cpu: &mut CpuCore,
    host: &mut H,
    resume_addr: Option<u64>,
) -> ! {
    if cpu.nested_guest {
        tracing::warn!(eip = cpu.eip(), "triple fault in nested guest");
        host.vmexit(SvmExitCode::SHUTDOWN, 0, resume_addr);
    }

    tracing::warn!(eip = cpu.eip(), "Triple fault");
    host.request_machine_reset(ResetCause::GuestReset);
    cpu_loop_exit(LoopExit::Halt)
}

/// `INT n`: software interrupt returning to `eip + next_eip_delta`.
pub fn raise_interrupt<H: FaultHost + ?Sized>(
    cpu: &mut CpuCore,
    host: &mut H,
    vector: u8,
    next_eip_delta: u64,
) -> ! {
    raise(cpu, host, vector, true, 0, next_eip_delta, None)
}

pub fn raise_exception<H: FaultHost + ?Sized>(cpu: &mut CpuCore, host: &mut H, vector: u8) -> ! {
    raise(cpu, host, vector, false, 0, 0, None)
}

pub fn raise_exception_ra<H: FaultHost + ?Sized>(
    cpu: &mut CpuCore,
    host: &mut H,
    vector: u8,
    resume_addr: Option<u64>,
) -> ! {
    raise(cpu, host, vector, false, 0, 0, resume_addr)
}

pub fn raise_exception_err<H: FaultHost + ?Sized>(
    cpu: &mut CpuCore,
    host: &mut H,
    vector: u8,
    error_code: u32,
) -> ! {
    raise_exception_err_ra(cpu, host, vector, error_code, None)
}

/// Raises an exception with an error code, logging a decoded summary first.
pub fn raise_exception_err_ra<H: FaultHost + ?Sized>(
    cpu: &mut CpuCore,
    host: &mut H,
    vector: u8,
    error_code: u32,
    resume_addr: Option<u64>,
) -> ! {
    if cpu.config.fault_summaries {
        let summary = FaultSummary {
            vector,
            error_code,
            eip: cpu.eip(),
        };
        tracing::debug!("{summary}");
    }
    raise(cpu, host, vector, false, error_code, 0, resume_addr)
}
