// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Emission target: an instruction list plus label bookkeeping.

use std::collections::{HashMap, HashSet};

use crate::{EmitError, Instruction, Label};

/// Instructions of one method body under construction.
#[derive(Debug, Default)]
pub struct CodeBuffer {
    code: Vec<Instruction>,
    next_label: u32,
    placed: HashSet<Label>,
}

impl CodeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    pub fn emit(&mut self, inst: Instruction) {
        self.code.push(inst);
    }

    /// Bind `label` to the current position.
    pub fn place(&mut self, label: Label) -> Result<(), EmitError> {
        if !self.placed.insert(label) {
            return Err(EmitError::LabelPlacedTwice(label));
        }
        tracing::trace!(target: "brook::emit", %label, at = self.code.len(), "place label");
        self.code.push(Instruction::Label(label));
        Ok(())
    }

    pub fn is_placed(&self, label: Label) -> bool {
        self.placed.contains(&label)
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.code
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Close the body. Every jump must target a placed label.
    pub fn finish(self, max_locals: u16, max_stack: u16) -> Result<MethodCode, EmitError> {
        if let Some(target) = self
            .code
            .iter()
            .filter_map(Instruction::jump_target)
            .find(|target| !self.placed.contains(target))
        {
            return Err(EmitError::UnplacedLabel(target));
        }
        Ok(MethodCode {
            instructions: self.code,
            max_locals,
            max_stack,
        })
    }
}

/// A finished method body.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCode {
    pub instructions: Vec<Instruction>,
    pub max_locals: u16,
    pub max_stack: u16,
}

impl MethodCode {
    /// Instruction index of every placed label.
    pub fn label_positions(&self) -> HashMap<Label, usize> {
        self.instructions
            .iter()
            .enumerate()
            .filter_map(|(pc, inst)| match inst {
                Instruction::Label(label) => Some((*label, pc)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Instruction) -> bool) -> usize {
        self.instructions.iter().filter(|inst| pred(inst)).count()
    }
}
