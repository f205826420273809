use thiserror::Error;

use crate::host::SvmExitCode;

/// Fallible conversions exposed by the crate.
///
/// The raise path itself never returns an error; every outcome there is a
/// [`crate::LoopExit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExcpError {
    #[error("vector {0} is not an architecturally defined exception")]
    InvalidVector(u8),

    #[error("SVM exit code {:#x} is not an exception intercept", .0.raw())]
    NotAnExceptionExit(SvmExitCode),
}
