// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Emission errors.

use brook_types::StaticType;
use thiserror::Error;

use crate::{Label, SlotId};

/// A violation of the emission discipline. Every variant indicates a
/// defect in the code driving the emitter, not in the program being
/// compiled.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EmitError {
    #[error("label {0} placed twice")]
    LabelPlacedTwice(Label),

    #[error("jump to label {0} which is never placed")]
    UnplacedLabel(Label),

    #[error("operand stack underflow: needed {needed} value(s), depth is {depth}")]
    StackUnderflow { needed: usize, depth: usize },

    #[error("cannot store {found} into '{name}' of type {expected}")]
    StoreMismatch {
        name: String,
        expected: StaticType,
        found: StaticType,
    },

    #[error("slot {slot} ('{name}') released out of order")]
    ReleaseOutOfOrder { name: String, slot: SlotId },

    #[error("local slot space exhausted")]
    SlotsExhausted,

    #[error("no open scope")]
    NoOpenScope,

    #[error("temporary '{0}' still live when its scope closed")]
    LeakedTemporary(String),
}
