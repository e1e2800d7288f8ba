// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Built-in capability types and their protocol methods.

pub mod well_known {
    use crate::{MethodSig, StaticType};

    pub const OBJECT: &str = "Object";
    pub const STRING: &str = "String";
    pub const ITERATOR: &str = "Iterator";
    pub const ITERABLE: &str = "Iterable";
    pub const ENUMERATOR: &str = "Enumerator";

    /// Name of the zero-argument method that yields an iterator.
    pub const ITERATOR_METHOD: &str = "iterator";

    pub fn iterator_has_next() -> MethodSig {
        MethodSig::instance(ITERATOR, "hasNext", vec![], StaticType::boolean()).on_interface()
    }

    pub fn iterator_next() -> MethodSig {
        MethodSig::instance(ITERATOR, "next", vec![], StaticType::object()).on_interface()
    }

    pub fn iterable_iterator() -> MethodSig {
        MethodSig::instance(
            ITERABLE,
            ITERATOR_METHOD,
            vec![],
            StaticType::named(ITERATOR),
        )
        .on_interface()
    }

    pub fn enumerator_has_more() -> MethodSig {
        MethodSig::instance(ENUMERATOR, "hasMoreElements", vec![], StaticType::boolean())
            .on_interface()
    }

    pub fn enumerator_next() -> MethodSig {
        MethodSig::instance(ENUMERATOR, "nextElement", vec![], StaticType::object())
            .on_interface()
    }
}
