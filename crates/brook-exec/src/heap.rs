// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Runtime values and the object heap.

use brook_ir::ArrayElementKind;
use brook_types::{PrimitiveKind, StaticType};

use crate::ExecError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeapRef(pub usize);

/// A runtime value. Boxed primitives are represented by the primitive
/// itself, so boxing is the identity at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Null,
    Ref(HeapRef),
}

impl Value {
    /// Local slots this value occupies.
    pub fn width(self) -> usize {
        match self {
            Value::Long(_) | Value::Double(_) => 2,
            _ => 1,
        }
    }

    pub fn as_int(self) -> Result<i32, ExecError> {
        match self {
            Value::Int(v) => Ok(v),
            other => Err(ExecError::TypeMismatch(format!("expected int, found {:?}", other))),
        }
    }

    pub fn as_heap_ref(self, op: &'static str) -> Result<Option<HeapRef>, ExecError> {
        match self {
            Value::Ref(r) => Ok(Some(r)),
            Value::Null => Ok(None),
            other => Err(ExecError::TypeMismatch(format!(
                "{} expected a reference, found {:?}",
                op, other
            ))),
        }
    }

    /// Numeric view used by the dynamic operators.
    pub(crate) fn as_f64(self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(f64::from(v)),
            Value::Long(v) => Some(v as f64),
            Value::Float(v) => Some(f64::from(v)),
            Value::Double(v) => Some(v),
            Value::Null | Value::Ref(_) => None,
        }
    }

    pub(crate) fn as_i64(self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(i64::from(v)),
            Value::Long(v) => Some(v),
            Value::Float(v) => Some(v as i64),
            Value::Double(v) => Some(v as i64),
            Value::Null | Value::Ref(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// `hasNext` / `next`
    Iterator,
    /// `hasMoreElements` / `nextElement`
    Enumerator,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Array {
        elem: ArrayElementKind,
        values: Vec<Value>,
    },
    Str(String),
    /// Instance of a user class that answers `iterator()` with a cursor
    /// over `items`.
    Collection {
        class: String,
        items: Vec<Value>,
    },
    Cursor {
        protocol: Protocol,
        items: Vec<Value>,
        pos: usize,
    },
}

#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<Object>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, object: Object) -> Value {
        self.objects.push(object);
        Value::Ref(HeapRef(self.objects.len() - 1))
    }

    pub fn get(&self, r: HeapRef) -> Result<&Object, ExecError> {
        self.objects
            .get(r.0)
            .ok_or_else(|| ExecError::TypeMismatch(format!("dangling reference {}", r.0)))
    }

    pub fn get_mut(&mut self, r: HeapRef) -> Result<&mut Object, ExecError> {
        self.objects
            .get_mut(r.0)
            .ok_or_else(|| ExecError::TypeMismatch(format!("dangling reference {}", r.0)))
    }

    pub fn alloc_array(&mut self, elem: &StaticType, values: Vec<Value>) -> Value {
        self.alloc(Object::Array {
            elem: storage_kind(elem),
            values,
        })
    }

    pub fn alloc_int_array(&mut self, values: &[i32]) -> Value {
        let values = values.iter().copied().map(Value::Int).collect();
        self.alloc_array(&StaticType::int(), values)
    }

    pub fn alloc_collection(&mut self, class: &str, items: Vec<Value>) -> Value {
        self.alloc(Object::Collection {
            class: class.to_string(),
            items,
        })
    }

    pub fn alloc_cursor(&mut self, protocol: Protocol, items: Vec<Value>) -> Value {
        self.alloc(Object::Cursor {
            protocol,
            items,
            pos: 0,
        })
    }

    pub fn alloc_str(&mut self, text: &str) -> Value {
        self.alloc(Object::Str(text.to_string()))
    }

    /// Contents of an array reference, for assertions.
    pub fn array_values(&self, value: Value) -> Result<&[Value], ExecError> {
        let r = value
            .as_heap_ref("array_values")?
            .ok_or(ExecError::NullPointer("array_values"))?;
        match self.get(r)? {
            Object::Array { values, .. } => Ok(values),
            other => Err(ExecError::TypeMismatch(format!("not an array: {:?}", other))),
        }
    }
}

/// Storage class of an array with component type `elem`.
pub(crate) fn storage_kind(elem: &StaticType) -> ArrayElementKind {
    match elem.as_primitive() {
        Some(PrimitiveKind::Int) => ArrayElementKind::Int,
        Some(PrimitiveKind::Long) => ArrayElementKind::Long,
        Some(PrimitiveKind::Byte | PrimitiveKind::Boolean) => ArrayElementKind::ByteOrBoolean,
        Some(PrimitiveKind::Char) => ArrayElementKind::Char,
        Some(PrimitiveKind::Short) => ArrayElementKind::Short,
        Some(PrimitiveKind::Float) => ArrayElementKind::Float,
        Some(PrimitiveKind::Double) => ArrayElementKind::Double,
        None => ArrayElementKind::Ref,
    }
}

pub(crate) fn default_value(kind: ArrayElementKind) -> Value {
    match kind {
        ArrayElementKind::Long => Value::Long(0),
        ArrayElementKind::Float => Value::Float(0.0),
        ArrayElementKind::Double => Value::Double(0.0),
        ArrayElementKind::Ref => Value::Null,
        _ => Value::Int(0),
    }
}
