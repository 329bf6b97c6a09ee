use thiserror::Error;

/// Error type returned when binding a QP onto a memory block, or when
/// re-packing an already bound QP.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    /// The memory block is smaller than the layout requires
    #[error("arena capacity exceeded: requested {required} bytes, capacity {available} bytes")]
    CapacityExceeded {
        /// bytes required by the layout
        required: usize,
        /// bytes available in the block
        available: usize,
    },
    /// The binder cursor moved past the end of the block
    #[error("arena cursor {cursor} outside memory bounds (limit {limit})")]
    OutOfBounds {
        /// final cursor position
        cursor: usize,
        /// end of the memory block
        limit: usize,
    },
}

/// Error type returned by QP construction, marshalling and residual
/// evaluation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QpError {
    /// Array lengths are incompatible with the problem dimensions
    #[error("incompatible dimension: expected {expected}, found {found}")]
    IncompatibleDimension {
        /// length implied by the problem dimensions
        expected: usize,
        /// length supplied
        found: usize,
    },
    /// Stage index is past the end of the horizon
    #[error("stage {stage} out of range (last valid stage is {max})")]
    StageOutOfRange { stage: usize, max: usize },
    /// Unrecognized field name
    #[error("unknown field name '{0}'")]
    UnknownField(String),
    /// Field used through an accessor for a different kind of data
    #[error("field {field} is not a {expected} field")]
    FieldKind {
        field: &'static str,
        expected: &'static str,
    },
    /// An index array entry points outside of its target
    #[error("index {index} out of range (limit {limit})")]
    IndexOutOfRange { index: usize, limit: usize },
    /// More input or state bounds than inputs or states at a stage
    #[error("bound split at stage {stage} exceeds the stage dimensions")]
    BadBoundSplit { stage: usize },
    /// Memory arena failure
    #[error("arena error: {0}")]
    Arena(#[from] ArenaError),
}

// dimension check helper used throughout
pub(crate) fn check_len(expected: usize, found: usize) -> Result<(), QpError> {
    if expected != found {
        return Err(QpError::IncompatibleDimension { expected, found });
    }
    Ok(())
}

// every entry of an index array must lie below `limit`
pub(crate) fn check_indices(idx: &[usize], limit: usize) -> Result<(), QpError> {
    match idx.iter().find(|&&k| k >= limit) {
        Some(&index) => Err(QpError::IndexOutOfRange { index, limit }),
        None => Ok(()),
    }
}
