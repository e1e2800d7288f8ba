// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Statement lowering onto the slot-addressed stack target.
//!
//! The centrepiece is for-each lowering ([`MethodLowerer::lower_for_each`]),
//! which picks one of three strategies by static type:
//!
//! - arrays whose component type equals the loop variable type are walked
//!   by index with typed element loads;
//! - `Enumerator` values are driven through `hasMoreElements`/`nextElement`;
//! - everything else goes through an `Iterator`, obtained from an
//!   `iterator()` method when the type has one and from the runtime
//!   coercion routine otherwise.
//!
//! Blocks switch the method into the specialized emission mode for their
//! duration ([`MethodLowerer::lower_block_with_mode_toggle`]).

mod block;
mod config;
mod context;
mod element_load;
mod error;
mod expr;
mod foreach;
mod mode;
mod resolve;
mod stmt;

pub use config::{ConfigError, LoweringConfig, RuntimeRoutine};
pub use context::MethodLowerer;
pub use element_load::array_element_kind;
pub use error::{InternalFault, LoweringError};
pub use expr::{BasicExprLowering, ExprLowering};
pub use foreach::{find_iterator_method, select_strategy, ForEachStrategy, LoopLoweringRequest};
pub use mode::EmissionMode;
pub use resolve::{LocalTypeResolver, TypeResolver};
pub use stmt::lower_method;
