use thiserror::Error;

/// Rejected input, caught at construction/initialization time.
///
/// Runtime operations (`step`, `allocate`, `deallocate`, merge) are total
/// over engine state and report no-ops through booleans instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("process `{id}` has zero burst time")]
    ZeroBurst { id: String },

    #[error("duplicate process id `{id}`")]
    DuplicateProcess { id: String },

    #[error("round robin quantum must be positive")]
    ZeroQuantum,

    #[error("total memory size must be positive")]
    ZeroMemory,

    #[error("allocation request for `{process}` has zero size")]
    ZeroRequest { process: String },

    #[error("initial layout block {index} has zero size")]
    ZeroLayoutBlock { index: usize },
}
