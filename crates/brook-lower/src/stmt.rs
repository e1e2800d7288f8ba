// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Statement lowering.

use brook_ast::{Stmt, StmtKind};
use brook_ir::{Instruction, JumpCond, MethodCode, ValueKind};
use brook_types::{StaticType, TypeTable};

use crate::expr::{lower_binary, Operand};
use crate::{
    BasicExprLowering, LocalTypeResolver, LoopLoweringRequest, LoweringConfig, LoweringError,
    MethodLowerer,
};

impl MethodLowerer<'_> {
    pub fn lower_stmt(&mut self, stmt: &Stmt) -> Result<(), LoweringError> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                let mark = self.stack.mark();
                self.lower_expression(expr)?;
                Ok(self.stack.pop_down_to(mark, &mut self.code)?)
            }
            StmtKind::Local { name, ty, init } => {
                match init {
                    Some(init) => {
                        let found = self.lower_expression(init)?;
                        self.coerce_top(&found, ty)?;
                    }
                    None => self.push_default(ty),
                }
                let var = self.frame.define_variable(name, ty.clone())?;
                self.store_var(&var)
            }
            StmtKind::Assign { name, op, value } => {
                let var = self
                    .frame
                    .lookup(name)
                    .cloned()
                    .ok_or_else(|| LoweringError::UnresolvedVariable(name.clone()))?;
                let found = match op {
                    None => self.lower_expression(value)?,
                    Some(op) => lower_binary(self, *op, Operand::Var(var.clone()), Operand::Expr(value))?,
                };
                self.coerce_top(&found, &var.ty)?;
                self.store_var(&var)
            }
            StmtKind::Block(stmts) => self.lower_block_with_mode_toggle(stmts),
            StmtKind::ForEach(for_each) => self.lower_for_each(&LoopLoweringRequest::from(for_each)),
            StmtKind::If { cond, then } => {
                let found = self.lower_expression(cond)?;
                self.coerce_top(&found, &StaticType::boolean())?;
                let end = self.code.new_label();
                self.jump(JumpCond::IfEq, end)?;
                self.lower_scoped_stmt(then)?;
                self.place_label(end)
            }
            StmtKind::Break(label) => {
                let labels = self.enclosing_loop(label.as_deref(), "break")?;
                self.jump(JumpCond::Always, labels.break_label)
            }
            StmtKind::Continue(label) => {
                let labels = self.enclosing_loop(label.as_deref(), "continue")?;
                self.jump(JumpCond::Always, labels.continue_label)
            }
            StmtKind::Return(value) => {
                let kind = match value {
                    Some(value) => {
                        let ty = self.lower_expression(value)?;
                        self.stack.pop()?;
                        Some(ValueKind::of(&ty))
                    }
                    None => None,
                };
                self.emit(Instruction::Return(kind));
                Ok(())
            }
        }
    }

    fn enclosing_loop(
        &self,
        label: Option<&str>,
        keyword: &str,
    ) -> Result<brook_ir::LoopLabels, LoweringError> {
        self.frame.find_loop(label).ok_or_else(|| {
            LoweringError::InvalidConstruct(match label {
                Some(label) => format!("{} to unknown loop label '{}'", keyword, label),
                None => format!("{} outside of a loop", keyword),
            })
        })
    }
}

/// Lower a whole method body with the stock resolver and expression
/// lowering. `params` take the first slots in order.
pub fn lower_method(
    types: &TypeTable,
    config: &LoweringConfig,
    enclosing: StaticType,
    params: &[(String, StaticType)],
    body: &Stmt,
) -> Result<MethodCode, LoweringError> {
    let resolver = LocalTypeResolver;
    let exprs = BasicExprLowering;
    let mut lowerer = MethodLowerer::new(types, config, &resolver, &exprs, enclosing);
    for (name, ty) in params {
        lowerer.define_parameter(name, ty.clone())?;
    }
    lowerer.lower_stmt(body)?;
    lowerer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use brook_ast::{BinOp, Expr};
    use brook_ir::SlotId;

    fn lower(body: Stmt) -> Result<MethodCode, LoweringError> {
        lower_method(
            &TypeTable::new(),
            &LoweringConfig::default(),
            StaticType::named("Main"),
            &[("n".to_string(), StaticType::int())],
            &body,
        )
    }

    #[test]
    fn compound_assignment_loads_computes_and_stores() {
        let code = lower(Stmt::block(vec![
            Stmt::local("sum", StaticType::int(), None),
            Stmt::compound("sum", BinOp::Add, Expr::local("n")),
        ]))
        .unwrap();
        let ints = |slot| Instruction::Load { kind: ValueKind::Int, slot: SlotId(slot) };
        assert_eq!(
            code.instructions,
            vec![
                Instruction::IConst(0),
                Instruction::Store { kind: ValueKind::Int, slot: SlotId(1) },
                ints(1),
                ints(0),
                Instruction::Arith { op: brook_ir::ArithOp::Add, kind: ValueKind::Int },
                Instruction::Store { kind: ValueKind::Int, slot: SlotId(1) },
            ]
        );
        assert_eq!(code.max_locals, 2);
        assert_eq!(code.max_stack, 2);
    }

    #[test]
    fn expression_statement_discards_its_value() {
        let code = lower(Stmt::expr(Expr::local("n"))).unwrap();
        assert_eq!(code.instructions.last(), Some(&Instruction::Pop));
    }

    #[test]
    fn break_outside_loop_is_rejected() {
        assert_eq!(
            lower(Stmt::break_(None)),
            Err(LoweringError::InvalidConstruct("break outside of a loop".into()))
        );
        assert!(matches!(
            lower(Stmt::continue_(Some("outer"))),
            Err(LoweringError::InvalidConstruct(msg)) if msg.contains("'outer'")
        ));
    }

    #[test]
    fn local_declared_under_if_ends_with_the_branch() {
        let code = lower(Stmt::block(vec![
            Stmt::if_then(
                Expr::binary(BinOp::Lt, Expr::local("n"), Expr::int(3)),
                Stmt::local("y", StaticType::int(), Some(Expr::local("n"))),
            ),
            Stmt::local("z", StaticType::int(), Some(Expr::local("n"))),
        ]))
        .unwrap();
        // y and z share slot 1
        assert_eq!(code.max_locals, 2);
        let stores = code
            .instructions
            .iter()
            .filter(|i| **i == Instruction::Store { kind: ValueKind::Int, slot: SlotId(1) })
            .count();
        assert_eq!(stores, 2);
    }

    #[test]
    fn if_jumps_over_its_body() {
        let code = lower(Stmt::if_then(
            Expr::binary(BinOp::Lt, Expr::local("n"), Expr::int(3)),
            Stmt::ret(None),
        ))
        .unwrap();
        let end = code
            .instructions
            .iter()
            .rev()
            .find_map(|i| match i {
                Instruction::Label(l) => Some(*l),
                _ => None,
            })
            .unwrap();
        assert!(code
            .instructions
            .contains(&Instruction::Jump { cond: JumpCond::IfEq, target: end }));
    }
}
