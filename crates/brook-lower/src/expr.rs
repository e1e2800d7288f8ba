// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Expression lowering.

use brook_ast::{BinOp, Expr, ExprKind, Literal};
use brook_ir::{runtime, ArithOp, Instruction, JumpCond, ValueKind, Variable};
use brook_types::{StaticType, TypeError};

use crate::element_load::array_element_kind;
use crate::resolve::{binary_result_type, literal_type};
use crate::{EmissionMode, LoweringError, MethodLowerer};

pub trait ExprLowering {
    /// Emit `expr`, leaving its value on the operand stack (nothing for a
    /// void call), and return its static type.
    fn lower_expr(&self, cx: &mut MethodLowerer<'_>, expr: &Expr) -> Result<StaticType, LoweringError>;
}

/// Lowering for the expression forms of `brook-ast`. Operators honour the
/// lowerer's [`EmissionMode`].
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicExprLowering;

impl ExprLowering for BasicExprLowering {
    fn lower_expr(&self, cx: &mut MethodLowerer<'_>, expr: &Expr) -> Result<StaticType, LoweringError> {
        match &expr.kind {
            ExprKind::Literal(lit) => {
                cx.emit(literal_instruction(lit));
                let ty = literal_type(lit);
                cx.push_type(ty.clone());
                Ok(ty)
            }
            ExprKind::Local(name) => {
                let var = cx
                    .frame()
                    .lookup(name)
                    .cloned()
                    .ok_or_else(|| LoweringError::UnresolvedVariable(name.clone()))?;
                cx.load_var(&var);
                Ok(var.ty)
            }
            ExprKind::Binary { op, left, right } => {
                lower_binary(cx, *op, Operand::Expr(left), Operand::Expr(right))
            }
            ExprKind::ArrayLiteral { elem_ty, elems } => lower_array_literal(cx, elem_ty, elems),
            ExprKind::StaticCall { owner, name, args } => {
                let method = cx.types().find_static(owner, name, args.len())?.clone();
                lower_args(cx, &method.params, args)?;
                let ret = method.ret.clone();
                cx.invoke(method)?;
                Ok(ret)
            }
            ExprKind::MethodCall {
                receiver,
                name,
                args,
            } => {
                let receiver_ty = cx.resolve_static_type(receiver)?;
                let method = cx
                    .types()
                    .find_method(&receiver_ty, name, args.len())
                    .cloned()
                    .ok_or_else(|| TypeError::UnknownMethod {
                        owner: receiver_ty.to_string(),
                        name: name.clone(),
                        arity: args.len(),
                    })?;
                cx.lower_expression(receiver)?;
                lower_args(cx, &method.params, args)?;
                let ret = method.ret.clone();
                cx.invoke(method)?;
                Ok(ret)
            }
        }
    }
}

fn literal_instruction(lit: &Literal) -> Instruction {
    match lit {
        Literal::Int(v) => Instruction::IConst(*v),
        Literal::Long(v) => Instruction::LConst(*v),
        Literal::Float(v) => Instruction::FConst(*v),
        Literal::Double(v) => Instruction::DConst(*v),
        Literal::Bool(b) => Instruction::IConst(i32::from(*b)),
        Literal::Char(c) => Instruction::IConst(*c as i32),
        Literal::Str(s) => Instruction::Ldc(s.clone()),
        Literal::Null => Instruction::AConstNull,
    }
}

fn lower_args(cx: &mut MethodLowerer<'_>, params: &[StaticType], args: &[Expr]) -> Result<(), LoweringError> {
    for (param, arg) in params.iter().zip(args) {
        let ty = cx.lower_expression(arg)?;
        cx.coerce_top(&ty, param)?;
    }
    Ok(())
}

/// `new T[] { e0, e1, ... }`: allocate, then `dup; index; value; store`
/// per element.
fn lower_array_literal(
    cx: &mut MethodLowerer<'_>,
    elem_ty: &StaticType,
    elems: &[Expr],
) -> Result<StaticType, LoweringError> {
    let array_ty = StaticType::array_of(elem_ty.clone());
    let len = i32::try_from(elems.len())
        .map_err(|_| LoweringError::InvalidConstruct("array literal too long".to_string()))?;
    cx.emit(Instruction::IConst(len));
    cx.push_type(StaticType::int());
    cx.emit(Instruction::NewArray(elem_ty.clone()));
    cx.stack.replace(array_ty.clone())?;

    let store = array_element_kind(elem_ty);
    for (index, elem) in (0..len).zip(elems) {
        cx.emit(Instruction::Dup);
        cx.push_type(array_ty.clone());
        cx.emit(Instruction::IConst(index));
        cx.push_type(StaticType::int());
        let ty = cx.lower_expression(elem)?;
        cx.coerce_top(&ty, elem_ty)?;
        cx.emit(Instruction::ArrayStore(store));
        cx.stack.pop_n(3)?;
    }
    Ok(array_ty)
}

/// An operand already evaluated into a local, or still to be lowered.
pub(crate) enum Operand<'e> {
    Expr(&'e Expr),
    Var(Variable),
}

impl Operand<'_> {
    fn static_type(&self, cx: &MethodLowerer<'_>) -> Result<StaticType, LoweringError> {
        match self {
            Operand::Expr(expr) => cx.resolve_static_type(expr),
            Operand::Var(var) => Ok(var.ty.clone()),
        }
    }

    fn push(&self, cx: &mut MethodLowerer<'_>) -> Result<StaticType, LoweringError> {
        match self {
            Operand::Expr(expr) => cx.lower_expression(expr),
            Operand::Var(var) => {
                cx.load_var(var);
                Ok(var.ty.clone())
            }
        }
    }
}

/// Lower `left op right`.
///
/// In specialized mode, operands of the same machine class use typed
/// arithmetic and int comparisons branch on `if_icmp*`. Anything else is
/// boxed and dispatched through the dynamic runtime, then unboxed to the
/// static result type.
pub(crate) fn lower_binary(
    cx: &mut MethodLowerer<'_>,
    op: BinOp,
    left: Operand<'_>,
    right: Operand<'_>,
) -> Result<StaticType, LoweringError> {
    let left_ty = left.static_type(cx)?;
    let right_ty = right.static_type(cx)?;
    let result = binary_result_type(op, &left_ty, &right_ty)?;

    let kind = ValueKind::of(&left_ty);
    let same_class = kind == ValueKind::of(&right_ty);
    let specialized = cx.mode() == EmissionMode::Specialized
        && same_class
        && match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul => true,
            BinOp::Lt | BinOp::Eq => kind == ValueKind::Int,
        };

    if specialized {
        left.push(cx)?;
        right.push(cx)?;
        match op {
            BinOp::Add => arith(cx, ArithOp::Add, kind, &result)?,
            BinOp::Sub => arith(cx, ArithOp::Sub, kind, &result)?,
            BinOp::Mul => arith(cx, ArithOp::Mul, kind, &result)?,
            BinOp::Lt => int_compare(cx, JumpCond::IfICmpGe)?,
            BinOp::Eq => int_compare(cx, JumpCond::IfICmpNe)?,
        }
        return Ok(result);
    }

    let pushed = left.push(cx)?;
    cx.coerce_top(&pushed, &StaticType::object())?;
    let pushed = right.push(cx)?;
    cx.coerce_top(&pushed, &StaticType::object())?;
    cx.invoke(runtime::dynamic_binary(op.name()))?;
    cx.coerce_top(&StaticType::object(), &result)?;
    Ok(result)
}

fn arith(
    cx: &mut MethodLowerer<'_>,
    op: ArithOp,
    kind: ValueKind,
    result: &StaticType,
) -> Result<(), LoweringError> {
    cx.emit(Instruction::Arith { op, kind });
    cx.stack.pop_n(2)?;
    cx.push_type(result.clone());
    Ok(())
}

/// Materialize an int comparison as 0/1. `jump_if_false` is the negated
/// condition.
fn int_compare(cx: &mut MethodLowerer<'_>, jump_if_false: JumpCond) -> Result<(), LoweringError> {
    let when_false = cx.code.new_label();
    let end = cx.code.new_label();
    cx.jump(jump_if_false, when_false)?;
    cx.emit(Instruction::IConst(1));
    cx.jump(JumpCond::Always, end)?;
    cx.place_label(when_false)?;
    cx.emit(Instruction::IConst(0));
    cx.place_label(end)?;
    cx.push_type(StaticType::boolean());
    Ok(())
}
