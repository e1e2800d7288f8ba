// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Runtime support routines generated code may call.
//!
//! These are static methods provided by the target's runtime library. The
//! generic (non-specialized) emission mode routes operators through them
//! on boxed values, and for-each falls back to [`iterator_coercion`] when a
//! collection type declares no usable iterator method.

use brook_types::{well_known, MethodSig, PrimitiveKind, StaticType};

pub const DEFAULT_METHODS: &str = "brook/runtime/DefaultMethods";
pub const DYNAMIC_OPS: &str = "brook/runtime/DynamicOps";

/// Default name of the object-to-iterator coercion on [`DEFAULT_METHODS`].
pub const ITERATOR_COERCION: &str = "iterator";

/// `static Iterator <owner>.<name>(Object)`
pub fn iterator_coercion(owner: &str, name: &str) -> MethodSig {
    MethodSig::static_fn(
        owner,
        name,
        vec![StaticType::object()],
        StaticType::named(well_known::ITERATOR),
    )
}

/// Box a primitive into its reference form.
pub fn box_primitive(kind: PrimitiveKind) -> MethodSig {
    MethodSig::static_fn(
        DYNAMIC_OPS,
        "box",
        vec![StaticType::primitive(kind)],
        StaticType::named(kind.boxed_name()),
    )
}

/// Unbox (and convert) any boxed value to `kind`, e.g. `intValue`.
pub fn unbox_primitive(kind: PrimitiveKind) -> MethodSig {
    MethodSig::static_fn(
        DYNAMIC_OPS,
        format!("{}Value", kind.name()),
        vec![StaticType::object()],
        StaticType::primitive(kind),
    )
}

/// Dynamically dispatched binary operator on two boxed operands.
pub fn dynamic_binary(op_name: &str) -> MethodSig {
    MethodSig::static_fn(
        DYNAMIC_OPS,
        op_name,
        vec![StaticType::object(), StaticType::object()],
        StaticType::object(),
    )
}
