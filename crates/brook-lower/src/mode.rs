// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Emission mode and its scoped switch.

use std::ops::{Deref, DerefMut};

use crate::MethodLowerer;

/// How expression lowering emits operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmissionMode {
    /// Operators go through the dynamic runtime on boxed operands.
    #[default]
    Generic,
    /// Operators on matching primitive operands use typed instructions.
    Specialized,
}

/// Switches the lowerer's mode for its lifetime and puts the previous mode
/// back when dropped, whether lowering succeeded or not.
pub(crate) struct ModeGuard<'l, 'a> {
    lowerer: &'l mut MethodLowerer<'a>,
    previous: EmissionMode,
}

impl<'l, 'a> ModeGuard<'l, 'a> {
    pub(crate) fn enter(lowerer: &'l mut MethodLowerer<'a>, mode: EmissionMode) -> Self {
        let previous = lowerer.mode;
        if previous != mode {
            tracing::trace!(target: "brook::lower", ?previous, ?mode, "switch emission mode");
        }
        lowerer.mode = mode;
        Self { lowerer, previous }
    }
}

impl<'a> Deref for ModeGuard<'_, 'a> {
    type Target = MethodLowerer<'a>;

    fn deref(&self) -> &Self::Target {
        self.lowerer
    }
}

impl DerefMut for ModeGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.lowerer
    }
}

impl Drop for ModeGuard<'_, '_> {
    fn drop(&mut self) {
        self.lowerer.mode = self.previous;
    }
}
