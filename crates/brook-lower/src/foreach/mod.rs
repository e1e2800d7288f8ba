// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! For-each lowering.
//!
//! Every strategy has the same outline: open a [`LoopScope`], define the
//! loop variable, evaluate the collection exactly once into a temporary,
//! test at the continue label, bind the element, lower the body, jump
//! back, place the break label and release the temporaries in reverse
//! order.

mod array;
mod enumerator;
mod iterator;
mod scope;

use brook_ast::{Expr, ForEach, LoopVariable, Span, Stmt};
use brook_ir::{Instruction, Variable};
use brook_types::{well_known, StaticType, TypeTable};

use crate::{LoweringError, MethodLowerer};

pub use iterator::find_iterator_method;
use scope::LoopScope;

/// Borrowed view of one for-each statement.
#[derive(Debug, Clone, Copy)]
pub struct LoopLoweringRequest<'r> {
    pub collection: &'r Expr,
    pub variable: &'r LoopVariable,
    pub body: &'r Stmt,
    pub labels: &'r [String],
    pub span: Span,
}

impl<'r> From<&'r ForEach> for LoopLoweringRequest<'r> {
    fn from(for_each: &'r ForEach) -> Self {
        Self {
            collection: &for_each.collection,
            variable: &for_each.variable,
            body: &for_each.body,
            labels: &for_each.labels,
            span: for_each.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForEachStrategy {
    /// Index walk over an array whose component type is the loop
    /// variable's type.
    IndexedArray,
    /// `hasMoreElements` / `nextElement`.
    Enumerator,
    /// `hasNext` / `next` on an iterator from `iterator()` or the runtime
    /// coercion.
    Iterator,
}

/// Pick the strategy for iterating `collection` into a variable of type
/// `variable`. First match wins.
pub fn select_strategy(
    types: &TypeTable,
    collection: &StaticType,
    variable: &StaticType,
) -> ForEachStrategy {
    if collection.component_type() == Some(variable) {
        ForEachStrategy::IndexedArray
    } else if types.is_or_implements(collection, well_known::ENUMERATOR) {
        ForEachStrategy::Enumerator
    } else {
        ForEachStrategy::Iterator
    }
}

impl MethodLowerer<'_> {
    pub fn lower_for_each(&mut self, request: &LoopLoweringRequest<'_>) -> Result<(), LoweringError> {
        if request.span.is_known() {
            self.emit(Instruction::LineNumber(request.span.line));
        }
        let collection = self.resolve_static_type(request.collection)?;
        let strategy = select_strategy(self.types(), &collection, &request.variable.ty);
        tracing::debug!(
            target: "brook::foreach",
            %collection,
            variable = %request.variable.ty,
            ?strategy,
            "lower for-each"
        );

        let mut scope = LoopScope::enter(self, request.labels);
        match strategy {
            ForEachStrategy::IndexedArray => array::lower(&mut scope, request, &collection)?,
            ForEachStrategy::Enumerator => enumerator::lower(&mut scope, request)?,
            ForEachStrategy::Iterator => iterator::lower(&mut scope, request, &collection)?,
        }
        scope.finish()
    }

    /// Store the `Object` element on top of the stack into `variable`,
    /// casting or unboxing to its declared type.
    fn bind_element(&mut self, variable: &Variable) -> Result<(), LoweringError> {
        self.coerce_top(&StaticType::object(), &variable.ty)?;
        self.store_var(variable)
    }
}

#[cfg(test)]
mod tests;
