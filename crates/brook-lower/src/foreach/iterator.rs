// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Loops over the `Iterator` protocol.

use brook_ir::{JumpCond, LoopLabels};
use brook_types::{well_known, MethodSig, StaticType, TypeTable};

use super::{LoopLoweringRequest, LoopScope};
use crate::LoweringError;

/// The `iterator()` method a for-each over `collection` calls directly.
///
/// Candidates are the zero-argument instance method declared on the type
/// or its superclass chain, then those declared on each transitive
/// interface in [`TypeTable::transitive_interfaces`] order. The first
/// candidate whose return type is an `Iterator` wins. `None` sends the
/// loop through the runtime coercion.
pub fn find_iterator_method<'t>(
    types: &'t TypeTable,
    collection: &StaticType,
) -> Option<&'t MethodSig> {
    let direct = types.find_zero_arg_method(collection, well_known::ITERATOR_METHOD);
    let inherited = types.transitive_interfaces(collection).into_iter().filter_map(|def| {
        def.methods
            .iter()
            .find(|m| m.name == well_known::ITERATOR_METHOD && m.params.is_empty() && !m.is_static)
    });
    let mut candidates = direct
        .into_iter()
        .chain(inherited)
        .filter(|m| types.is_or_implements(&m.ret, well_known::ITERATOR));

    let chosen = candidates.next()?;
    let others = candidates.count();
    if others > 0 {
        tracing::debug!(
            target: "brook::foreach",
            %collection,
            chosen = %chosen,
            others,
            "several iterator() candidates, using the first"
        );
    }
    Some(chosen)
}

pub(super) fn lower(
    scope: &mut LoopScope<'_, '_>,
    request: &LoopLoweringRequest<'_>,
    collection: &StaticType,
) -> Result<(), LoweringError> {
    match find_iterator_method(scope.types(), collection) {
        Some(method) => {
            scope.lower_expression(request.collection)?;
            scope.invoke(method.clone())?;
        }
        None => {
            tracing::debug!(target: "brook::foreach", %collection, "no iterator(), using runtime coercion");
            let found = scope.lower_expression(request.collection)?;
            scope.coerce_top(&found, &StaticType::object())?;
            let coercion = scope.config().iterator_coercion();
            scope.invoke(coercion)?;
        }
    }
    scope.stack.replace(StaticType::named(well_known::ITERATOR))?;
    lower_iterator_loop(scope, request)
}

/// Drive the iterator on top of the stack: store it, then `hasNext`/`next`
/// until exhausted.
fn lower_iterator_loop(
    scope: &mut LoopScope<'_, '_>,
    request: &LoopLoweringRequest<'_>,
) -> Result<(), LoweringError> {
    let LoopLabels {
        continue_label,
        break_label,
    } = scope.labels();
    let variable = scope
        .frame
        .define_variable(&request.variable.name, request.variable.ty.clone())?;
    let iterator = scope.store_temporary("$iter", StaticType::named(well_known::ITERATOR))?;

    scope.place_label(continue_label)?;
    scope.load_var(&iterator);
    scope.invoke(well_known::iterator_has_next())?;
    scope.jump(JumpCond::IfEq, break_label)?;
    scope.load_var(&iterator);
    scope.invoke(well_known::iterator_next())?;
    scope.bind_element(&variable)?;

    scope.lower_scoped_stmt(request.body)?;
    scope.jump(JumpCond::Always, continue_label)?;
    scope.place_label(break_label)?;

    scope.release_temporary(&iterator)
}
