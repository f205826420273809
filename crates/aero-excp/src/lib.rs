#![forbid(unsafe_code)]

//! x86 exception escalation and dispatch for the Aero CPU core.
//!
//! When an instruction helper signals a fault or software interrupt, this
//! crate decides which vector is actually delivered (including escalation to
//! #DF and triple-fault reset), records it in [`state::FaultState`] and
//! abandons the current instruction by unwinding to the dispatch loop
//! ([`exit::catch_loop_exit`] / [`CpuCore::execute`]).
//!
//! Frame construction, privilege switches and the nested SVM engine live
//! elsewhere; they are reached through the traits in [`host`].

mod error;

pub mod classify;
pub mod config;
pub mod diag;
pub mod exceptions;
pub mod exit;
pub mod host;
pub mod idt;
pub mod raise;
pub mod state;
pub mod unaligned;

pub use classify::{classify, Classification};
pub use config::FaultConfig;
pub use error::ExcpError;
pub use exceptions::Exception;
pub use exit::{LoopExit, StepOutcome};
pub use host::{FaultHost, GuestMemory, NestedIntercept, ResetCause, ResetControl, SvmExitCode};
pub use idt::{resolve_handler, DescriptorTableReg, GateLayout, HandlerAddress};
pub use raise::{
    raise, raise_exception, raise_exception_err, raise_exception_err_ra, raise_exception_ra,
    raise_interrupt,
};
pub use state::{CpuCore, CpuMode, CpuState, FaultRecord, FaultState};
pub use unaligned::{on_unaligned_access, AccessKind};
