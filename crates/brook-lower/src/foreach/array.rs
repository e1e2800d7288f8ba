// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Index walk over an array.

use brook_ir::{Instruction, JumpCond, LoopLabels};
use brook_types::StaticType;

use super::{LoopLoweringRequest, LoopScope};
use crate::LoweringError;

/// ```text
///     <collection>; dup; astore $arr; ifnull break
///     aload $arr; arraylength; istore $len
///     iconst 0; istore $idx
/// continue:
///     iload $idx; iload $len; if_icmpge break
///     aload $arr; iload $idx; <t>aload; <t>store var
///     iinc $idx 1
///     <body>
///     goto continue
/// break:
/// ```
pub(super) fn lower(
    scope: &mut LoopScope<'_, '_>,
    request: &LoopLoweringRequest<'_>,
    collection: &StaticType,
) -> Result<(), LoweringError> {
    let LoopLabels {
        continue_label,
        break_label,
    } = scope.labels();
    let variable = scope
        .frame
        .define_variable(&request.variable.name, request.variable.ty.clone())?;

    scope.lower_expression(request.collection)?;
    scope.emit(Instruction::Dup);
    scope.push_type(collection.clone());
    let array = scope.store_temporary("$arr", collection.clone())?;
    scope.jump(JumpCond::IfNull, break_label)?;

    scope.load_var(&array);
    scope.emit(Instruction::ArrayLength);
    scope.stack.replace(StaticType::int())?;
    let len = scope.store_temporary("$len", StaticType::int())?;

    scope.emit(Instruction::IConst(0));
    scope.push_type(StaticType::int());
    let index = scope.store_temporary("$idx", StaticType::int())?;

    scope.place_label(continue_label)?;
    scope.load_var(&index);
    scope.load_var(&len);
    scope.jump(JumpCond::IfICmpGe, break_label)?;
    scope.load_from_array(&variable, &array, &index)?;
    scope.emit(Instruction::Iinc {
        slot: index.slot,
        delta: 1,
    });

    scope.lower_scoped_stmt(request.body)?;
    scope.jump(JumpCond::Always, continue_label)?;
    scope.place_label(break_label)?;

    scope.release_temporary(&index)?;
    scope.release_temporary(&len)?;
    scope.release_temporary(&array)
}
