// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Lowering errors.

use brook_ir::EmitError;
use brook_types::TypeError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LoweringError {
    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error("unresolved variable '{0}'")]
    UnresolvedVariable(String),

    #[error("invalid construct: {0}")]
    InvalidConstruct(String),

    #[error("internal lowering fault: {0}")]
    Internal(#[from] InternalFault),
}

/// A broken bookkeeping invariant. Always a bug in lowering, never in the
/// program being compiled.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InternalFault {
    #[error("{live} temporary slot(s) live after loop, expected {expected}")]
    SlotImbalance { expected: usize, live: usize },

    #[error("operand stack depth {actual}, expected {expected}")]
    StackImbalance { expected: usize, actual: usize },
}
