// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Lifetime of one loop's labels, slots and stack mark.

use std::ops::{Deref, DerefMut};

use brook_ir::{LoopLabels, StackMark};

use crate::{InternalFault, LoweringError, MethodLowerer};

/// An open loop scope. Strategies lower through it as if it were the
/// lowerer itself.
///
/// [`LoopScope::finish`] closes the scope after checking that the loop
/// released every temporary it took and left the operand stack where it
/// found it. Dropping an unfinished scope (an error path) discards the
/// loop's scopes and stack entries without checks, so the lowerer stays
/// usable for reporting.
pub(crate) struct LoopScope<'l, 'a> {
    lowerer: &'l mut MethodLowerer<'a>,
    labels: LoopLabels,
    stack_mark: StackMark,
    temporaries: usize,
    scope_depth: usize,
    finished: bool,
}

impl<'l, 'a> LoopScope<'l, 'a> {
    pub(crate) fn enter(lowerer: &'l mut MethodLowerer<'a>, statement_labels: &[String]) -> Self {
        let stack_mark = lowerer.stack.mark();
        let temporaries = lowerer.frame.live_temporaries();
        let scope_depth = lowerer.frame.scope_depth();
        let labels = lowerer.frame.push_loop(&mut lowerer.code, statement_labels);
        Self {
            lowerer,
            labels,
            stack_mark,
            temporaries,
            scope_depth,
            finished: false,
        }
    }

    pub(crate) fn labels(&self) -> LoopLabels {
        self.labels
    }

    pub(crate) fn finish(mut self) -> Result<(), LoweringError> {
        let live = self.lowerer.frame.live_temporaries();
        if live != self.temporaries {
            return Err(InternalFault::SlotImbalance {
                expected: self.temporaries,
                live,
            }
            .into());
        }
        let depth = self.lowerer.stack.depth();
        if self.lowerer.config().verify_balance && depth != self.stack_mark.depth() {
            return Err(InternalFault::StackImbalance {
                expected: self.stack_mark.depth(),
                actual: depth,
            }
            .into());
        }
        let lowerer = &mut *self.lowerer;
        lowerer.stack.pop_down_to(self.stack_mark, &mut lowerer.code)?;
        lowerer.frame.pop_scope()?;
        self.finished = true;
        Ok(())
    }
}

impl<'a> Deref for LoopScope<'_, 'a> {
    type Target = MethodLowerer<'a>;

    fn deref(&self) -> &Self::Target {
        self.lowerer
    }
}

impl DerefMut for LoopScope<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.lowerer
    }
}

impl Drop for LoopScope<'_, '_> {
    fn drop(&mut self) {
        if !self.finished {
            self.lowerer.stack.truncate(self.stack_mark);
            self.lowerer.frame.unwind_to(self.scope_depth);
        }
    }
}
