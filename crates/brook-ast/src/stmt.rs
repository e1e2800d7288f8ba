// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Statement nodes.

use crate::{BinOp, Expr, Span, StaticType};

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expr(Expr),
    Local {
        name: String,
        ty: StaticType,
        init: Option<Expr>,
    },
    /// `name = value`, or `name op= value` when `op` is set.
    Assign {
        name: String,
        op: Option<BinOp>,
        value: Expr,
    },
    Block(Vec<Stmt>),
    ForEach(ForEach),
    If {
        cond: Expr,
        then: Box<Stmt>,
    },
    Break(Option<String>),
    Continue(Option<String>),
    Return(Option<Expr>),
}

/// The variable a for-each binds on every iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopVariable {
    pub name: String,
    pub ty: StaticType,
}

/// `labels: for (ty name : collection) body`
#[derive(Debug, Clone, PartialEq)]
pub struct ForEach {
    pub variable: LoopVariable,
    pub collection: Expr,
    pub body: Box<Stmt>,
    pub labels: Vec<String>,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Self {
            kind,
            span: Span::default(),
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        if let StmtKind::ForEach(fe) = &mut self.kind {
            fe.span = span;
        }
        self
    }

    pub fn expr(expr: Expr) -> Self {
        Self::new(StmtKind::Expr(expr))
    }

    pub fn local(name: &str, ty: StaticType, init: Option<Expr>) -> Self {
        Self::new(StmtKind::Local {
            name: name.to_string(),
            ty,
            init,
        })
    }

    pub fn assign(name: &str, value: Expr) -> Self {
        Self::new(StmtKind::Assign {
            name: name.to_string(),
            op: None,
            value,
        })
    }

    pub fn compound(name: &str, op: BinOp, value: Expr) -> Self {
        Self::new(StmtKind::Assign {
            name: name.to_string(),
            op: Some(op),
            value,
        })
    }

    pub fn block(stmts: Vec<Stmt>) -> Self {
        Self::new(StmtKind::Block(stmts))
    }

    pub fn for_each(name: &str, ty: StaticType, collection: Expr, body: Stmt) -> Self {
        Self::new(StmtKind::ForEach(ForEach {
            variable: LoopVariable {
                name: name.to_string(),
                ty,
            },
            collection,
            body: Box::new(body),
            labels: Vec::new(),
            span: Span::default(),
        }))
    }

    /// Attach a statement label; only meaningful on a for-each.
    pub fn labelled(mut self, label: &str) -> Self {
        if let StmtKind::ForEach(fe) = &mut self.kind {
            fe.labels.push(label.to_string());
        }
        self
    }

    pub fn if_then(cond: Expr, then: Stmt) -> Self {
        Self::new(StmtKind::If {
            cond,
            then: Box::new(then),
        })
    }

    pub fn break_(label: Option<&str>) -> Self {
        Self::new(StmtKind::Break(label.map(str::to_string)))
    }

    pub fn continue_(label: Option<&str>) -> Self {
        Self::new(StmtKind::Continue(label.map(str::to_string)))
    }

    pub fn ret(value: Option<Expr>) -> Self {
        Self::new(StmtKind::Return(value))
    }
}
