// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Execution faults.

use brook_ir::{Label, SlotId};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExecError {
    #[error("null reference in {0}")]
    NullPointer(&'static str),

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i32, len: usize },

    #[error("array length {0} does not fit in an int")]
    ArrayTooLong(usize),

    #[error("negative array size {0}")]
    NegativeArraySize(i32),

    #[error("operand stack underflow")]
    StackUnderflow,

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("jump to unplaced label {0}")]
    UnknownLabel(Label),

    #[error("slot {0} outside the frame")]
    BadSlot(SlotId),

    #[error("no more elements")]
    NoSuchElement,

    #[error("step limit of {0} exceeded")]
    StepLimit(usize),
}
