// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Block lowering under the specialized emission mode.

use brook_ast::Stmt;

use crate::mode::ModeGuard;
use crate::{EmissionMode, LoweringError, MethodLowerer};

impl MethodLowerer<'_> {
    /// Lower `stmts` as one lexical block in the specialized mode. The
    /// previous mode is back in force when this returns, on error too.
    pub fn lower_block_with_mode_toggle(&mut self, stmts: &[Stmt]) -> Result<(), LoweringError> {
        let mode = if self.config().specialize_blocks {
            EmissionMode::Specialized
        } else {
            self.mode
        };
        let mut guard = ModeGuard::enter(self, mode);
        guard.lower_block(stmts)
    }

    fn lower_block(&mut self, stmts: &[Stmt]) -> Result<(), LoweringError> {
        let depth = self.frame.scope_depth();
        self.frame.push_block();
        for stmt in stmts {
            if let Err(err) = self.lower_stmt(stmt) {
                self.frame.unwind_to(depth);
                return Err(err);
            }
        }
        Ok(self.frame.pop_scope()?)
    }

    /// Lower a single statement in a scope of its own, so any local it
    /// declares is gone before the caller releases its temporaries.
    pub(crate) fn lower_scoped_stmt(&mut self, stmt: &Stmt) -> Result<(), LoweringError> {
        let depth = self.frame.scope_depth();
        self.frame.push_block();
        if let Err(err) = self.lower_stmt(stmt) {
            self.frame.unwind_to(depth);
            return Err(err);
        }
        Ok(self.frame.pop_scope()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BasicExprLowering, LocalTypeResolver, LoweringConfig};
    use brook_ast::{BinOp, Expr};
    use brook_types::{StaticType, TypeTable};

    fn lowerer<'a>(types: &'a TypeTable, config: &'a LoweringConfig) -> MethodLowerer<'a> {
        MethodLowerer::new(
            types,
            config,
            &LocalTypeResolver,
            &BasicExprLowering,
            StaticType::named("Main"),
        )
    }

    #[test]
    fn block_runs_specialized_and_restores() {
        let types = TypeTable::new();
        let config = LoweringConfig::default();
        let mut cx = lowerer(&types, &config);
        assert_eq!(cx.mode(), EmissionMode::Generic);
        cx.lower_block_with_mode_toggle(&[Stmt::local(
            "x",
            StaticType::int(),
            Some(Expr::binary(BinOp::Add, Expr::int(1), Expr::int(2))),
        )])
        .unwrap();
        assert_eq!(cx.mode(), EmissionMode::Generic);
        assert!(cx
            .code()
            .instructions()
            .iter()
            .any(|i| matches!(i, brook_ir::Instruction::Arith { .. })));
    }

    #[test]
    fn failed_block_still_restores_mode_and_scopes() {
        let types = TypeTable::new();
        let config = LoweringConfig::default();
        let mut cx = lowerer(&types, &config);
        let err = cx
            .lower_block_with_mode_toggle(&[
                Stmt::local("x", StaticType::int(), None),
                Stmt::expr(Expr::local("missing")),
            ])
            .unwrap_err();
        assert_eq!(err, LoweringError::UnresolvedVariable("missing".into()));
        assert_eq!(cx.mode(), EmissionMode::Generic);
        assert_eq!(cx.frame().scope_depth(), 0);
    }

    #[test]
    fn nested_blocks_restore_the_enclosing_mode() {
        let types = TypeTable::new();
        let config = LoweringConfig {
            specialize_blocks: false,
            ..LoweringConfig::default()
        };
        let mut cx = lowerer(&types, &config);
        cx.mode = EmissionMode::Specialized;
        cx.lower_block_with_mode_toggle(&[Stmt::block(vec![])]).unwrap();
        assert_eq!(cx.mode(), EmissionMode::Specialized);
    }
}
