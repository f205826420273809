//! Contributory/benign exception classes and #DF/triple-fault escalation.

use crate::exceptions::Exception;

const DE: u8 = Exception::DivideError.vector();
const DF: u8 = Exception::DoubleFault.vector();
const TS: u8 = Exception::InvalidTss.vector();
const GP: u8 = Exception::GeneralProtection.vector();
const PF: u8 = Exception::PageFault.vector();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionClass {
    Benign,
    /// #DE, #TS, #NP, #SS and #GP.
    Contributory,
    PageFault,
    DoubleFault,
}

impl ExceptionClass {
    pub const fn of(vector: u8) -> Self {
        match vector {
            DE | TS..=GP => Self::Contributory,
            PF => Self::PageFault,
            DF => Self::DoubleFault,
            _ => Self::Benign,
        }
    }

    /// Whether an exception of this class keeps the pending chain alive.
    pub const fn is_chained(self) -> bool {
        !matches!(self, Self::Benign)
    }
}

/// Outcome of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Deliver {
        /// Vector to deliver, `8` if the pair escalated.
        vector: u8,
        /// `Some(0)` when escalation replaced the caller's error code.
        error_code: Option<u32>,
        /// New value for `FaultState::previously_pending_exception`.
        next_pending: Option<u8>,
    },
    /// An exception arrived while a #DF was pending. Nothing is delivered;
    /// the machine either takes a nested `#VMEXIT(SHUTDOWN)` or resets, and
    /// the pending state is left as is.
    TripleFault,
}

impl Classification {
    /// Vector that will be delivered, `None` for a triple fault.
    pub fn effective_vector(&self) -> Option<u8> {
        match *self {
            Classification::Deliver { vector, .. } => Some(vector),
            Classification::TripleFault => None,
        }
    }
}

/// Applies the SDM double-fault table to `new_vector` given the exception
/// that was pending when it was raised.
///
/// Only true exceptions go through here; `INT n` and external interrupts
/// never touch the pending chain.
pub fn classify(prev: Option<u8>, new_vector: u8) -> Classification {
    use ExceptionClass as C;

    let prev_class = prev.map(C::of);
    if prev_class == Some(C::DoubleFault) {
        tracing::trace!(old = DF, new = new_vector, "exception during #DF delivery");
        return Classification::TripleFault;
    }

    // A page fault on a page fault escalates, a contributory fault on a page
    // fault escalates, and two contributory faults escalate. A benign
    // exception on either side never does.
    let escalate = matches!(
        (prev_class, C::of(new_vector)),
        (Some(C::Contributory), C::Contributory)
            | (Some(C::PageFault), C::Contributory | C::PageFault)
    );

    let (vector, error_code) = if escalate {
        (DF, Some(0))
    } else {
        (new_vector, None)
    };
    let next_pending = C::of(vector).is_chained().then_some(vector);

    tracing::trace!(old = ?prev, new = new_vector, effective = vector, "check_exception");

    Classification::Deliver {
        vector,
        error_code,
        next_pending,
    }
}
