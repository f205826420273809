//! Misaligned SSE/AVX operands, reported as #GP(0).

use crate::exceptions::Exception;
use crate::host::FaultHost;
use crate::raise::raise_exception_ra;
use crate::state::CpuCore;

/// Kind of memory access that tripped an alignment check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
    Execute,
}

/// Raises the fault for a misaligned operand.
///
/// Only SSE/AVX instructions with aligned-operand requirements get here, and
/// those raise #GP(0). `addr` and `access` do not influence the result (no
/// #AC modelling yet); they are only logged.
pub fn on_unaligned_access<H: FaultHost + ?Sized>(
    cpu: &mut CpuCore,
    host: &mut H,
    addr: u64,
    access: AccessKind,
    resume_addr: Option<u64>,
) -> ! {
    tracing::trace!(addr, ?access, "unaligned vector operand");
    raise_exception_ra(
        cpu,
        host,
        Exception::GeneralProtection.vector(),
        resume_addr,
    )
}
