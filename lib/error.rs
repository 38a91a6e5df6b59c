//! Error types for tableau construction, composition, and gate dispatch.

use thiserror::Error;

/// Errors surfaced to callers of the tableau engine.
///
/// Out-of-range row/column indices passed directly to a [`Tableau`][crate::tableau::Tableau]
/// mutator are not represented here; those are usage defects and panic.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TableauError {
    /// Every dispatch strategy declined the operation.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("dimension mismatch: {left} qubits vs {right} qubits")]
    DimensionMismatch { left: usize, right: usize },

    #[error("shape mismatch for {what}: expected {expected:?}, got {found:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("basis state {state} does not fit in {n} qubits")]
    BasisStateOutOfRange { state: u64, n: usize },

    #[error("qubit {qubit} out of range for a register of {n} qubits")]
    QubitOutOfRange { qubit: usize, n: usize },

    #[error("gate {gate} acts on {expected} qubit(s) but was given {found}")]
    ArityMismatch { gate: String, expected: usize, found: usize },

    #[error("qubit {0} appears more than once in a single operation")]
    DuplicateQubit(usize),

    #[error("invalid mixture: {0}")]
    InvalidMixture(String),

    #[error("invalid decomposition: {0}")]
    InvalidDecomposition(String),

    #[error("recursive decomposition exceeded depth {0}")]
    DecompositionDepth(usize),
}

pub type TableauResult<T> = Result<T, TableauError>;
