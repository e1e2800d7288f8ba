// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Local slot allocation and lexical scopes.

use brook_types::StaticType;

use crate::{CodeBuffer, EmitError, Label, SlotId};

/// A named local bound to a slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub ty: StaticType,
    pub slot: SlotId,
    /// Compiler-introduced (`$arr`, `$idx`, ...) and released explicitly.
    pub temporary: bool,
}

/// Jump targets of one loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopLabels {
    pub continue_label: Label,
    pub break_label: Label,
}

#[derive(Debug)]
enum ScopeKind {
    Block,
    Loop {
        labels: LoopLabels,
        statement_labels: Vec<String>,
    },
}

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    first_var: usize,
    base_slot: u16,
}

/// Slots and scopes of one method body.
///
/// Slots are handed out stack-wise: a scope's variables sit above those
/// of enclosing scopes and vanish with it, so siblings reuse the same
/// slot numbers.
#[derive(Debug, Default)]
pub struct Frame {
    vars: Vec<Variable>,
    scopes: Vec<Scope>,
    next_slot: u16,
    max_locals: u16,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self, name: &str, ty: StaticType, temporary: bool) -> Result<Variable, EmitError> {
        let slot = SlotId(self.next_slot);
        self.next_slot = self
            .next_slot
            .checked_add(ty.slot_width())
            .ok_or(EmitError::SlotsExhausted)?;
        self.max_locals = self.max_locals.max(self.next_slot);
        tracing::trace!(target: "brook::frame", name, %slot, temporary, "acquire slot");
        let var = Variable {
            name: name.to_string(),
            ty,
            slot,
            temporary,
        };
        self.vars.push(var.clone());
        Ok(var)
    }

    pub fn define_parameter(&mut self, name: &str, ty: StaticType) -> Result<Variable, EmitError> {
        self.allocate(name, ty, false)
    }

    /// Declare a source variable in the innermost scope.
    pub fn define_variable(&mut self, name: &str, ty: StaticType) -> Result<Variable, EmitError> {
        if self.scopes.is_empty() {
            return Err(EmitError::NoOpenScope);
        }
        self.allocate(name, ty, false)
    }

    /// Acquire a compiler temporary; must be handed back with
    /// [`Frame::release`] before its scope closes.
    pub fn define_temporary(&mut self, name: &str, ty: StaticType) -> Result<Variable, EmitError> {
        if self.scopes.is_empty() {
            return Err(EmitError::NoOpenScope);
        }
        self.allocate(name, ty, true)
    }

    /// Release the most recently acquired variable of the innermost scope.
    pub fn release(&mut self, var: &Variable) -> Result<(), EmitError> {
        let floor = self.scopes.last().map_or(0, |s| s.first_var);
        let is_last = self.vars.len() > floor
            && self.vars.last().is_some_and(|last| last.slot == var.slot);
        if !is_last {
            return Err(EmitError::ReleaseOutOfOrder {
                name: var.name.clone(),
                slot: var.slot,
            });
        }
        self.vars.pop();
        self.next_slot = var.slot.0;
        tracing::trace!(target: "brook::frame", name = %var.name, slot = %var.slot, "release slot");
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Variable> {
        self.vars.iter().rev().find(|v| v.name == name)
    }

    pub fn live_temporaries(&self) -> usize {
        self.vars.iter().filter(|v| v.temporary).count()
    }

    pub fn push_block(&mut self) {
        self.push_scope(ScopeKind::Block);
    }

    /// Open a loop scope with fresh continue/break labels.
    pub fn push_loop(&mut self, code: &mut CodeBuffer, statement_labels: &[String]) -> LoopLabels {
        let labels = LoopLabels {
            continue_label: code.new_label(),
            break_label: code.new_label(),
        };
        self.push_scope(ScopeKind::Loop {
            labels,
            statement_labels: statement_labels.to_vec(),
        });
        labels
    }

    fn push_scope(&mut self, kind: ScopeKind) {
        self.scopes.push(Scope {
            kind,
            first_var: self.vars.len(),
            base_slot: self.next_slot,
        });
    }

    /// Close the innermost scope, dropping its variables.
    pub fn pop_scope(&mut self) -> Result<(), EmitError> {
        let scope = self.scopes.pop().ok_or(EmitError::NoOpenScope)?;
        if let Some(leaked) = self.vars[scope.first_var..].iter().find(|v| v.temporary) {
            let name = leaked.name.clone();
            self.discard(scope);
            return Err(EmitError::LeakedTemporary(name));
        }
        self.discard(scope);
        Ok(())
    }

    fn discard(&mut self, scope: Scope) {
        self.vars.truncate(scope.first_var);
        self.next_slot = scope.base_slot;
    }

    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    /// Close scopes until `depth` remain, without any checks.
    pub fn unwind_to(&mut self, depth: usize) {
        while self.scopes.len() > depth {
            if let Some(scope) = self.scopes.pop() {
                self.discard(scope);
            }
        }
    }

    pub fn current_loop(&self) -> Option<LoopLabels> {
        self.find_loop(None)
    }

    /// Innermost loop, or the innermost loop carrying `label`.
    pub fn find_loop(&self, label: Option<&str>) -> Option<LoopLabels> {
        self.scopes.iter().rev().find_map(|scope| match &scope.kind {
            ScopeKind::Loop {
                labels,
                statement_labels,
            } => match label {
                None => Some(*labels),
                Some(name) if statement_labels.iter().any(|l| l == name) => Some(*labels),
                Some(_) => None,
            },
            ScopeKind::Block => None,
        })
    }

    pub fn max_locals(&self) -> u16 {
        self.max_locals
    }

    pub fn next_slot(&self) -> u16 {
        self.next_slot
    }
}
