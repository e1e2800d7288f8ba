// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Reference interpreter for lowered method bodies.
//!
//! Executes [`brook_ir::MethodCode`] directly so tests can observe what
//! generated code does at runtime: how often an array length is read, how
//! many elements are loaded and with which opcode class, how many times a
//! protocol method is called. It implements the runtime support routines
//! from [`brook_ir::runtime`] natively.

mod builtins;
mod error;
mod heap;
mod interp;
mod stats;

pub use error::ExecError;
pub use heap::{Heap, HeapRef, Object, Protocol, Value};
pub use interp::{HostFn, Interpreter};
pub use stats::ExecStats;
