// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Compile-time model of the operand stack.

use brook_types::StaticType;

use crate::{CodeBuffer, EmitError, Instruction, ValueKind, Variable};

/// Depth snapshot taken before lowering a construct that must leave the
/// stack as it found it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackMark(usize);

impl StackMark {
    pub fn depth(self) -> usize {
        self.0
    }
}

/// Types currently on the operand stack, bottom first.
///
/// Pushing and popping here never emits anything; callers emit the
/// instruction and record its effect. The exceptions are the helpers that
/// pair an instruction with its effect (`load_var`, `store_var`,
/// `pop_down_to`).
#[derive(Debug, Default)]
pub struct OperandStack {
    types: Vec<StaticType>,
    units: u16,
    max_units: u16,
}

impl OperandStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, ty: StaticType) {
        self.units += ty.slot_width();
        self.max_units = self.max_units.max(self.units);
        self.types.push(ty);
    }

    pub fn pop(&mut self) -> Result<StaticType, EmitError> {
        let ty = self.types.pop().ok_or(EmitError::StackUnderflow {
            needed: 1,
            depth: 0,
        })?;
        self.units -= ty.slot_width();
        Ok(ty)
    }

    pub fn pop_n(&mut self, n: usize) -> Result<(), EmitError> {
        if self.types.len() < n {
            return Err(EmitError::StackUnderflow {
                needed: n,
                depth: self.types.len(),
            });
        }
        for _ in 0..n {
            self.pop()?;
        }
        Ok(())
    }

    pub fn top(&self) -> Option<&StaticType> {
        self.types.last()
    }

    /// Retype the top value, e.g. after a call whose result is known to be
    /// more specific than its declared type.
    pub fn replace(&mut self, ty: StaticType) -> Result<(), EmitError> {
        self.pop()?;
        self.push(ty);
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.types.len()
    }

    /// Highest stack size seen, in stack units.
    pub fn max_units(&self) -> u16 {
        self.max_units
    }

    pub fn mark(&self) -> StackMark {
        StackMark(self.types.len())
    }

    /// Pop values above `mark`, emitting a `pop`/`pop2` for each.
    pub fn pop_down_to(&mut self, mark: StackMark, code: &mut CodeBuffer) -> Result<(), EmitError> {
        if self.types.len() < mark.0 {
            return Err(EmitError::StackUnderflow {
                needed: mark.0,
                depth: self.types.len(),
            });
        }
        while self.types.len() > mark.0 {
            let ty = self.pop()?;
            code.emit(if ty.slot_width() == 2 {
                Instruction::Pop2
            } else {
                Instruction::Pop
            });
        }
        Ok(())
    }

    /// Forget values above `mark` without emitting anything. Used when a
    /// lowering is being abandoned.
    pub fn truncate(&mut self, mark: StackMark) {
        while self.types.len() > mark.0 {
            if let Some(ty) = self.types.pop() {
                self.units -= ty.slot_width();
            }
        }
    }

    pub fn load_var(&mut self, var: &Variable, code: &mut CodeBuffer) {
        code.emit(Instruction::Load {
            kind: ValueKind::of(&var.ty),
            slot: var.slot,
        });
        self.push(var.ty.clone());
    }

    /// Pop the top value into `var`'s slot.
    pub fn store_var(&mut self, var: &Variable, code: &mut CodeBuffer) -> Result<(), EmitError> {
        let kind = ValueKind::of(&var.ty);
        let top = self.pop()?;
        if ValueKind::of(&top) != kind {
            return Err(EmitError::StoreMismatch {
                name: var.name.clone(),
                expected: var.ty.clone(),
                found: top,
            });
        }
        code.emit(Instruction::Store {
            kind,
            slot: var.slot,
        });
        Ok(())
    }
}
