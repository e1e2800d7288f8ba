// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Static type resolution of expressions.

use brook_ast::{BinOp, Expr, ExprKind, Literal};
use brook_types::{PrimitiveKind, StaticType, TypeError};

use crate::{LoweringError, MethodLowerer};

/// Answers "what is the static type of this expression here?" without
/// emitting anything.
pub trait TypeResolver {
    fn resolve_static_type(
        &self,
        expr: &Expr,
        cx: &MethodLowerer<'_>,
    ) -> Result<StaticType, LoweringError>;
}

/// Resolves types from literals, the lowerer's frame and the type table.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalTypeResolver;

impl TypeResolver for LocalTypeResolver {
    fn resolve_static_type(
        &self,
        expr: &Expr,
        cx: &MethodLowerer<'_>,
    ) -> Result<StaticType, LoweringError> {
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(literal_type(lit)),
            ExprKind::Local(name) => cx
                .frame()
                .lookup(name)
                .map(|var| var.ty.clone())
                .ok_or_else(|| LoweringError::UnresolvedVariable(name.clone())),
            ExprKind::Binary { op, left, right } => {
                let left = self.resolve_static_type(left, cx)?;
                let right = self.resolve_static_type(right, cx)?;
                binary_result_type(*op, &left, &right)
            }
            ExprKind::ArrayLiteral { elem_ty, .. } => Ok(StaticType::array_of(elem_ty.clone())),
            ExprKind::StaticCall { owner, name, args } => {
                Ok(cx.types().find_static(owner, name, args.len())?.ret.clone())
            }
            ExprKind::MethodCall {
                receiver,
                name,
                args,
            } => {
                let receiver = self.resolve_static_type(receiver, cx)?;
                let method = cx
                    .types()
                    .find_method(&receiver, name, args.len())
                    .ok_or_else(|| TypeError::UnknownMethod {
                        owner: receiver.to_string(),
                        name: name.clone(),
                        arity: args.len(),
                    })?;
                Ok(method.ret.clone())
            }
        }
    }
}

pub(crate) fn literal_type(lit: &Literal) -> StaticType {
    match lit {
        Literal::Int(_) => StaticType::int(),
        Literal::Long(_) => StaticType::primitive(PrimitiveKind::Long),
        Literal::Float(_) => StaticType::primitive(PrimitiveKind::Float),
        Literal::Double(_) => StaticType::primitive(PrimitiveKind::Double),
        Literal::Bool(_) => StaticType::boolean(),
        Literal::Char(_) => StaticType::primitive(PrimitiveKind::Char),
        Literal::Str(_) => StaticType::named(brook_types::well_known::STRING),
        Literal::Null => StaticType::Null,
    }
}

/// Binary numeric promotion. Booleans only take part in `==`.
pub(crate) fn promote(left: PrimitiveKind, right: PrimitiveKind) -> Option<PrimitiveKind> {
    use PrimitiveKind::*;
    match (left, right) {
        (Boolean, _) | (_, Boolean) => None,
        (Double, _) | (_, Double) => Some(Double),
        (Float, _) | (_, Float) => Some(Float),
        (Long, _) | (_, Long) => Some(Long),
        _ => Some(Int),
    }
}

pub(crate) fn binary_result_type(
    op: BinOp,
    left: &StaticType,
    right: &StaticType,
) -> Result<StaticType, LoweringError> {
    let invalid = || {
        LoweringError::InvalidConstruct(format!(
            "operator '{}' on {} and {}",
            op.name(),
            left,
            right
        ))
    };
    let (Some(l), Some(r)) = (left.as_primitive(), right.as_primitive()) else {
        return Err(invalid());
    };
    if op == BinOp::Eq && l == PrimitiveKind::Boolean && r == PrimitiveKind::Boolean {
        return Ok(StaticType::boolean());
    }
    let promoted = promote(l, r).ok_or_else(invalid)?;
    if op.is_comparison() {
        Ok(StaticType::boolean())
    } else {
        Ok(StaticType::primitive(promoted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prim(kind: PrimitiveKind) -> StaticType {
        StaticType::primitive(kind)
    }

    #[test]
    fn arithmetic_promotes_to_widest() {
        let ty = binary_result_type(BinOp::Add, &prim(PrimitiveKind::Short), &prim(PrimitiveKind::Long));
        assert_eq!(ty, Ok(prim(PrimitiveKind::Long)));
        let ty = binary_result_type(BinOp::Mul, &prim(PrimitiveKind::Char), &prim(PrimitiveKind::Byte));
        assert_eq!(ty, Ok(StaticType::int()));
    }

    #[test]
    fn comparisons_are_boolean() {
        let ty = binary_result_type(BinOp::Lt, &StaticType::int(), &prim(PrimitiveKind::Double));
        assert_eq!(ty, Ok(StaticType::boolean()));
        let ty = binary_result_type(BinOp::Eq, &StaticType::boolean(), &StaticType::boolean());
        assert_eq!(ty, Ok(StaticType::boolean()));
    }

    #[test]
    fn references_and_boolean_arithmetic_are_rejected() {
        assert!(binary_result_type(BinOp::Add, &StaticType::object(), &StaticType::int()).is_err());
        assert!(binary_result_type(BinOp::Add, &StaticType::boolean(), &StaticType::int()).is_err());
    }
}
