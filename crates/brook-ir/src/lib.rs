// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Instruction model for the slot-addressed stack target.
//!
//! The target has indexed local slots, a typed operand stack, jump labels
//! and typed array access opcodes. This crate holds the instruction set and
//! the three pieces of bookkeeping lowering drives while emitting:
//! [`CodeBuffer`] (instructions and labels), [`OperandStack`] (statically
//! known stack shape) and [`Frame`] (slots and lexical scopes).

mod code;
mod display;
mod error;
mod frame;
mod instr;
mod stack;

pub mod runtime;

pub use code::{CodeBuffer, MethodCode};
pub use error::EmitError;
pub use frame::{Frame, LoopLabels, Variable};
pub use instr::{
    ArithOp, ArrayElementKind, Dispatch, Instruction, JumpCond, Label, SlotId, ValueKind,
};
pub use stack::{OperandStack, StackMark};
