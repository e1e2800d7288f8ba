// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Expression nodes.

use crate::{Span, StaticType};

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Local(String),
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `new T[] { a, b, c }`
    ArrayLiteral {
        elem_ty: StaticType,
        elems: Vec<Expr>,
    },
    StaticCall {
        owner: String,
        name: String,
        args: Vec<Expr>,
    },
    MethodCall {
        receiver: Box<Expr>,
        name: String,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    Char(char),
    Str(String),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Lt,
    Eq,
}

impl BinOp {
    pub fn is_comparison(self) -> bool {
        matches!(self, BinOp::Lt | BinOp::Eq)
    }

    pub fn name(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::Lt => "lt",
            BinOp::Eq => "eq",
        }
    }
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Self {
            kind,
            span: Span::default(),
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn int(value: i32) -> Self {
        Self::new(ExprKind::Literal(Literal::Int(value)))
    }

    pub fn null() -> Self {
        Self::new(ExprKind::Literal(Literal::Null))
    }

    pub fn local(name: &str) -> Self {
        Self::new(ExprKind::Local(name.to_string()))
    }

    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Self::new(ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn array(elem_ty: StaticType, elems: Vec<Expr>) -> Self {
        Self::new(ExprKind::ArrayLiteral { elem_ty, elems })
    }

    pub fn static_call(owner: &str, name: &str, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::StaticCall {
            owner: owner.to_string(),
            name: name.to_string(),
            args,
        })
    }

    pub fn method_call(receiver: Expr, name: &str, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::MethodCall {
            receiver: Box::new(receiver),
            name: name.to_string(),
            args,
        })
    }
}
