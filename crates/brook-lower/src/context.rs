// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Per-method lowering state.

use brook_ast::Expr;
use brook_ir::{
    runtime, CodeBuffer, Frame, Instruction, JumpCond, Label, MethodCode, OperandStack,
    ValueKind, Variable,
};
use brook_types::{MethodSig, PrimitiveKind, StaticType, TypeTable};

use crate::{
    EmissionMode, ExprLowering, InternalFault, LoweringConfig, LoweringError, TypeResolver,
};

/// Everything needed to lower one method body: the emission target, the
/// operand stack model, the slot frame and the current emission mode.
///
/// A lowerer is never shared; lowering several methods concurrently means
/// one lowerer per method.
pub struct MethodLowerer<'a> {
    pub(crate) code: CodeBuffer,
    pub(crate) stack: OperandStack,
    pub(crate) frame: Frame,
    pub(crate) mode: EmissionMode,
    types: &'a TypeTable,
    config: &'a LoweringConfig,
    resolver: &'a dyn TypeResolver,
    exprs: &'a dyn ExprLowering,
    enclosing: StaticType,
}

impl<'a> MethodLowerer<'a> {
    pub fn new(
        types: &'a TypeTable,
        config: &'a LoweringConfig,
        resolver: &'a dyn TypeResolver,
        exprs: &'a dyn ExprLowering,
        enclosing: StaticType,
    ) -> Self {
        Self {
            code: CodeBuffer::new(),
            stack: OperandStack::new(),
            frame: Frame::new(),
            mode: EmissionMode::default(),
            types,
            config,
            resolver,
            exprs,
            enclosing,
        }
    }

    pub fn types(&self) -> &'a TypeTable {
        self.types
    }

    pub fn config(&self) -> &'a LoweringConfig {
        self.config
    }

    /// Type whose method is being lowered.
    pub fn enclosing_type(&self) -> &StaticType {
        &self.enclosing
    }

    pub fn mode(&self) -> EmissionMode {
        self.mode
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn stack(&self) -> &OperandStack {
        &self.stack
    }

    pub fn code(&self) -> &CodeBuffer {
        &self.code
    }

    pub fn define_parameter(&mut self, name: &str, ty: StaticType) -> Result<Variable, LoweringError> {
        Ok(self.frame.define_parameter(name, ty)?)
    }

    pub fn resolve_static_type(&self, expr: &Expr) -> Result<StaticType, LoweringError> {
        self.resolver.resolve_static_type(expr, self)
    }

    /// Lower `expr`, leaving its value on the stack (nothing for a void
    /// call), and return its static type.
    pub fn lower_expression(&mut self, expr: &Expr) -> Result<StaticType, LoweringError> {
        let exprs = self.exprs;
        let before = self.stack.depth();
        let ty = exprs.lower_expr(self, expr)?;
        let expected = before + usize::from(ty != StaticType::Void);
        if self.stack.depth() != expected {
            return Err(InternalFault::StackImbalance {
                expected,
                actual: self.stack.depth(),
            }
            .into());
        }
        Ok(ty)
    }

    pub fn emit(&mut self, inst: Instruction) {
        self.code.emit(inst);
    }

    pub fn push_type(&mut self, ty: StaticType) {
        self.stack.push(ty);
    }

    pub fn load_var(&mut self, var: &Variable) {
        self.stack.load_var(var, &mut self.code);
    }

    pub fn store_var(&mut self, var: &Variable) -> Result<(), LoweringError> {
        Ok(self.stack.store_var(var, &mut self.code)?)
    }

    /// Acquire a temporary slot and pop the top of the stack into it.
    pub fn store_temporary(&mut self, name: &str, ty: StaticType) -> Result<Variable, LoweringError> {
        let var = self.frame.define_temporary(name, ty)?;
        self.store_var(&var)?;
        Ok(var)
    }

    pub fn release_temporary(&mut self, var: &Variable) -> Result<(), LoweringError> {
        Ok(self.frame.release(var)?)
    }

    pub fn place_label(&mut self, label: Label) -> Result<(), LoweringError> {
        Ok(self.code.place(label)?)
    }

    /// Emit a jump, consuming the operands its condition tests.
    pub fn jump(&mut self, cond: JumpCond, target: Label) -> Result<(), LoweringError> {
        self.stack.pop_n(cond.operands())?;
        self.emit(Instruction::Jump { cond, target });
        Ok(())
    }

    /// Emit a call. Arguments (and the receiver, for instance methods) must
    /// already be on the stack; the result, if any, replaces them.
    pub fn invoke(&mut self, method: MethodSig) -> Result<(), LoweringError> {
        let receiver = usize::from(!method.is_static);
        self.stack.pop_n(method.arity() + receiver)?;
        let ret = method.ret.clone();
        self.emit(Instruction::invoke(method));
        if ret != StaticType::Void {
            self.stack.push(ret);
        }
        Ok(())
    }

    /// Convert the value on top of the stack from `from` to `to`: unbox,
    /// box, or check-cast as needed. Numeric conversions between primitive
    /// classes are not supported.
    pub(crate) fn coerce_top(&mut self, from: &StaticType, to: &StaticType) -> Result<(), LoweringError> {
        if from == to {
            return Ok(());
        }
        match (from.as_primitive(), to.as_primitive()) {
            (Some(_), Some(_)) => {
                if ValueKind::of(from) != ValueKind::of(to) {
                    return Err(LoweringError::InvalidConstruct(format!(
                        "no implicit conversion from {} to {}",
                        from, to
                    )));
                }
                self.stack.replace(to.clone())?;
                Ok(())
            }
            (None, Some(kind)) => self.invoke(runtime::unbox_primitive(kind)),
            (Some(kind), None) => {
                self.invoke(runtime::box_primitive(kind))?;
                self.coerce_top(&StaticType::named(kind.boxed_name()), to)
            }
            (None, None) => {
                if !self.types.is_assignable(from, to) && !to.is_object_root() {
                    let target = match to {
                        StaticType::Object(name) => name.clone(),
                        other => other.descriptor(),
                    };
                    self.emit(Instruction::CheckCast(target));
                }
                self.stack.replace(to.clone())?;
                Ok(())
            }
        }
    }

    /// Push the zero value of `ty`.
    pub(crate) fn push_default(&mut self, ty: &StaticType) {
        let inst = match ty.as_primitive() {
            Some(PrimitiveKind::Long) => Instruction::LConst(0),
            Some(PrimitiveKind::Float) => Instruction::FConst(0.0),
            Some(PrimitiveKind::Double) => Instruction::DConst(0.0),
            Some(_) => Instruction::IConst(0),
            None => Instruction::AConstNull,
        };
        self.emit(inst);
        self.push_type(ty.clone());
    }

    /// Close the body. The operand stack must be empty.
    pub fn finish(self) -> Result<MethodCode, LoweringError> {
        if self.stack.depth() != 0 {
            return Err(InternalFault::StackImbalance {
                expected: 0,
                actual: self.stack.depth(),
            }
            .into());
        }
        let max_locals = self.frame.max_locals();
        let max_stack = self.stack.max_units();
        Ok(self.code.finish(max_locals, max_stack)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BasicExprLowering, LocalTypeResolver};
    use brook_types::well_known;

    fn with_lowerer<R>(f: impl FnOnce(&mut MethodLowerer<'_>) -> R) -> R {
        let types = TypeTable::new();
        let config = LoweringConfig::default();
        let resolver = LocalTypeResolver;
        let exprs = BasicExprLowering;
        let mut lowerer =
            MethodLowerer::new(&types, &config, &resolver, &exprs, StaticType::named("Main"));
        f(&mut lowerer)
    }

    #[test]
    fn invoke_replaces_receiver_and_args_with_result() {
        with_lowerer(|cx| {
            cx.push_type(StaticType::named(well_known::ITERATOR));
            cx.invoke(well_known::iterator_has_next()).unwrap();
            assert_eq!(cx.stack().top(), Some(&StaticType::boolean()));
            assert_eq!(cx.stack().depth(), 1);
        });
    }

    #[test]
    fn object_to_string_needs_checkcast() {
        with_lowerer(|cx| {
            cx.push_type(StaticType::object());
            cx.coerce_top(&StaticType::object(), &StaticType::named("String"))
                .unwrap();
            assert_eq!(
                cx.code().instructions(),
                &[Instruction::CheckCast("String".into())]
            );
        });
    }

    #[test]
    fn object_to_int_unboxes() {
        with_lowerer(|cx| {
            cx.push_type(StaticType::object());
            cx.coerce_top(&StaticType::object(), &StaticType::int()).unwrap();
            assert_eq!(
                cx.code().instructions(),
                &[Instruction::invoke(runtime::unbox_primitive(PrimitiveKind::Int))]
            );
            assert_eq!(cx.stack().top(), Some(&StaticType::int()));
        });
    }

    #[test]
    fn widening_between_primitive_classes_is_rejected() {
        with_lowerer(|cx| {
            cx.push_type(StaticType::int());
            let err = cx
                .coerce_top(&StaticType::int(), &StaticType::primitive(PrimitiveKind::Long))
                .unwrap_err();
            assert!(matches!(err, LoweringError::InvalidConstruct(_)));
        });
    }

    #[test]
    fn finish_rejects_leftover_values() {
        let types = TypeTable::new();
        let config = LoweringConfig::default();
        let mut lowerer = MethodLowerer::new(
            &types,
            &config,
            &LocalTypeResolver,
            &BasicExprLowering,
            StaticType::named("Main"),
        );
        lowerer.push_type(StaticType::int());
        assert_eq!(
            lowerer.finish(),
            Err(LoweringError::Internal(InternalFault::StackImbalance {
                expected: 0,
                actual: 1
            }))
        );
    }
}
