/// Knobs for the diagnostics emitted while raising faults.
///
/// Neither setting changes which vector is delivered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaultConfig {
    /// Resolve the IDT handler of each delivered exception and include it in
    /// the debug log. Costs two or three guest memory reads per fault.
    pub handler_diagnostics: bool,
    /// Log a one-line summary for exceptions raised with an error code.
    pub fault_summaries: bool,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            handler_diagnostics: true,
            fault_summaries: true,
        }
    }
}
