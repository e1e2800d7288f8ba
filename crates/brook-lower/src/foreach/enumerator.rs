// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Loops over the `Enumerator` protocol.

use brook_ir::{JumpCond, LoopLabels};
use brook_types::{well_known, StaticType};

use super::{LoopLoweringRequest, LoopScope};
use crate::LoweringError;

pub(super) fn lower(
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

    let enumerator_ty = StaticType::named(well_known::ENUMERATOR);
    scope.lower_expression(request.collection)?;
    scope.stack.replace(enumerator_ty.clone())?;
    let enumerator = scope.store_temporary("$enum", enumerator_ty)?;

    scope.place_label(continue_label)?;
    scope.load_var(&enumerator);
    scope.invoke(well_known::enumerator_has_more())?;
    scope.jump(JumpCond::IfEq, break_label)?;
    scope.load_var(&enumerator);
    scope.invoke(well_known::enumerator_next())?;
    scope.bind_element(&variable)?;

    scope.lower_scoped_stmt(request.body)?;
    scope.jump(JumpCond::Always, continue_label)?;
    scope.place_label(break_label)?;

    scope.release_temporary(&enumerator)
}
