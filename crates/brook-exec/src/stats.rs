// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Runtime event counters.

use std::collections::HashMap;

use brook_ir::ArrayElementKind;

#[derive(Debug, Clone, Default)]
pub struct ExecStats {
    pub steps: usize,
    pub array_length_reads: usize,
    pub element_reads_by_kind: HashMap<ArrayElementKind, usize>,
    /// Invocations keyed by `Owner.name`.
    pub calls: HashMap<String, usize>,
}

impl ExecStats {
    pub fn element_reads(&self) -> usize {
        self.element_reads_by_kind.values().sum()
    }

    pub fn element_reads_of(&self, kind: ArrayElementKind) -> usize {
        self.element_reads_by_kind.get(&kind).copied().unwrap_or(0)
    }

    pub fn calls_to(&self, key: &str) -> usize {
        self.calls.get(key).copied().unwrap_or(0)
    }

    pub(crate) fn record_call(&mut self, owner: &str, name: &str) {
        *self.calls.entry(format!("{}.{}", owner, name)).or_default() += 1;
    }
}
