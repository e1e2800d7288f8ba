// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Static type representation.

use std::fmt;

use crate::well_known;

/// Primitive value kinds of the target machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Byte,
        PrimitiveKind::Char,
        PrimitiveKind::Short,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Descriptor character (`I` for int, `J` for long, ...).
    pub fn descriptor(self) -> char {
        match self {
            PrimitiveKind::Boolean => 'Z',
            PrimitiveKind::Byte => 'B',
            PrimitiveKind::Char => 'C',
            PrimitiveKind::Short => 'S',
            PrimitiveKind::Int => 'I',
            PrimitiveKind::Long => 'J',
            PrimitiveKind::Float => 'F',
            PrimitiveKind::Double => 'D',
        }
    }

    /// Name of the reference type a value of this kind boxes into.
    pub fn boxed_name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Byte => "Byte",
            PrimitiveKind::Char => "Character",
            PrimitiveKind::Short => "Short",
            PrimitiveKind::Int => "Integer",
            PrimitiveKind::Long => "Long",
            PrimitiveKind::Float => "Float",
            PrimitiveKind::Double => "Double",
        }
    }

    /// Long and double occupy two local slots and two stack units.
    pub fn is_wide(self) -> bool {
        matches!(self, PrimitiveKind::Long | PrimitiveKind::Double)
    }

    /// True for kinds the machine computes with as 32-bit ints.
    pub fn is_int_class(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Boolean
                | PrimitiveKind::Byte
                | PrimitiveKind::Char
                | PrimitiveKind::Short
                | PrimitiveKind::Int
        )
    }
}

/// Resolved static type of an expression or declared variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StaticType {
    Void,
    /// Type of the `null` literal; assignable to every reference type.
    Null,
    Primitive(PrimitiveKind),
    Array(Box<StaticType>),
    /// Class or interface, looked up by name in a [`crate::TypeTable`].
    Object(String),
}

impl StaticType {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        StaticType::Primitive(kind)
    }

    pub fn int() -> Self {
        StaticType::Primitive(PrimitiveKind::Int)
    }

    pub fn boolean() -> Self {
        StaticType::Primitive(PrimitiveKind::Boolean)
    }

    pub fn object() -> Self {
        StaticType::Object(well_known::OBJECT.to_string())
    }

    pub fn named(name: impl Into<String>) -> Self {
        StaticType::Object(name.into())
    }

    pub fn array_of(elem: StaticType) -> Self {
        StaticType::Array(Box::new(elem))
    }

    pub fn component_type(&self) -> Option<&StaticType> {
        match self {
            StaticType::Array(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            StaticType::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn object_name(&self) -> Option<&str> {
        match self {
            StaticType::Object(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, StaticType::Primitive(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, StaticType::Array(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            StaticType::Null | StaticType::Array(_) | StaticType::Object(_)
        )
    }

    pub fn is_object_root(&self) -> bool {
        matches!(self, StaticType::Object(name) if name == well_known::OBJECT)
    }

    /// Number of local slots (and operand stack units) a value occupies.
    pub fn slot_width(&self) -> u16 {
        match self {
            StaticType::Void => 0,
            StaticType::Primitive(kind) if kind.is_wide() => 2,
            _ => 1,
        }
    }

    /// Type descriptor, e.g. `[I` or `LIterator;`.
    pub fn descriptor(&self) -> String {
        match self {
            StaticType::Void => "V".to_string(),
            StaticType::Null => format!("L{};", well_known::OBJECT),
            StaticType::Primitive(kind) => kind.descriptor().to_string(),
            StaticType::Array(elem) => format!("[{}", elem.descriptor()),
            StaticType::Object(name) => format!("L{};", name),
        }
    }
}

impl fmt::Display for StaticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaticType::Void => write!(f, "void"),
            StaticType::Null => write!(f, "null"),
            StaticType::Primitive(kind) => write!(f, "{}", kind.name()),
            StaticType::Array(elem) => write!(f, "{}[]", elem),
            StaticType::Object(name) => write!(f, "{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_primitives_take_two_slots() {
        assert_eq!(StaticType::primitive(PrimitiveKind::Long).slot_width(), 2);
        assert_eq!(StaticType::primitive(PrimitiveKind::Double).slot_width(), 2);
        assert_eq!(StaticType::int().slot_width(), 1);
        assert_eq!(StaticType::object().slot_width(), 1);
        assert_eq!(StaticType::Void.slot_width(), 0);
    }

    #[test]
    fn descriptors() {
        let ty = StaticType::array_of(StaticType::array_of(StaticType::int()));
        assert_eq!(ty.descriptor(), "[[I");
        assert_eq!(StaticType::named("Iterator").descriptor(), "LIterator;");
        assert_eq!(ty.to_string(), "int[][]");
    }

    #[test]
    fn component_type_of_array_only() {
        let ty = StaticType::array_of(StaticType::primitive(PrimitiveKind::Char));
        assert_eq!(
            ty.component_type(),
            Some(&StaticType::primitive(PrimitiveKind::Char))
        );
        assert_eq!(StaticType::object().component_type(), None);
    }

    #[test]
    fn primitive_names_round_trip() {
        for kind in PrimitiveKind::ALL {
            assert_eq!(PrimitiveKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(PrimitiveKind::from_name("Integer"), None);
    }
}
