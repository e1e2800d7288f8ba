// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Static types for the brook backend.
//!
//! Types here are already resolved: the type checker ran upstream, and
//! lowering only asks shape questions (is this an array, what is its
//! component, does this class implement a capability).

mod protocol;
mod table;
mod types;

pub use protocol::well_known;
pub use table::{MethodSig, TypeDef, TypeDefKind, TypeError, TypeTable};
pub use types::{PrimitiveKind, StaticType};
