// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Typed statement and expression tree handed to the backend.
//!
//! By the time a tree reaches lowering every declaration carries its
//! resolved [`StaticType`]; expressions carry none, the backend asks a type
//! resolver for them.

mod expr;
mod stmt;

pub use expr::{BinOp, Expr, ExprKind, Literal};
pub use stmt::{ForEach, LoopVariable, Stmt, StmtKind};

/// Source position. Line 0 means unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub line: u32,
    pub col: u32,
}

impl Span {
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    pub fn is_known(&self) -> bool {
        self.line != 0
    }
}

pub use brook_types::StaticType;
