// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Typed array element loads.

use brook_ir::{ArrayElementKind, Instruction, Variable};
use brook_types::{PrimitiveKind, StaticType};

use crate::{LoweringError, MethodLowerer};

/// Load class for elements of static type `ty`. Every reference type,
/// arrays included, uses the reference load.
pub fn array_element_kind(ty: &StaticType) -> ArrayElementKind {
    match ty.as_primitive() {
        Some(PrimitiveKind::Int) => ArrayElementKind::Int,
        Some(PrimitiveKind::Long) => ArrayElementKind::Long,
        Some(PrimitiveKind::Byte | PrimitiveKind::Boolean) => ArrayElementKind::ByteOrBoolean,
        Some(PrimitiveKind::Char) => ArrayElementKind::Char,
        Some(PrimitiveKind::Short) => ArrayElementKind::Short,
        Some(PrimitiveKind::Float) => ArrayElementKind::Float,
        Some(PrimitiveKind::Double) => ArrayElementKind::Double,
        None => ArrayElementKind::Ref,
    }
}

impl MethodLowerer<'_> {
    /// `variable = array[index]`
    pub(crate) fn load_from_array(
        &mut self,
        variable: &Variable,
        array: &Variable,
        index: &Variable,
    ) -> Result<(), LoweringError> {
        self.load_var(array);
        self.load_var(index);
        self.emit(Instruction::ArrayLoad(array_element_kind(&variable.ty)));
        self.stack.pop_n(2)?;
        self.push_type(variable.ty.clone());
        self.store_var(variable)
    }
}
