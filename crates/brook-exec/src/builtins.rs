// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Native implementations of the runtime support routines.

use brook_ir::runtime;
use brook_types::PrimitiveKind;

use crate::{ExecError, Heap, Object, Protocol, Value};

/// Dispatch a static call on one of the runtime support classes. `None`
/// means the routine is not a builtin.
pub(crate) fn call_static(
    heap: &mut Heap,
    owner: &str,
    name: &str,
    args: &[Value],
) -> Option<Result<Option<Value>, ExecError>> {
    match owner {
        runtime::DEFAULT_METHODS if name == runtime::ITERATOR_COERCION => {
            Some(coerce_iterator(heap, arg(args, 0)).map(Some))
        }
        runtime::DYNAMIC_OPS => dynamic_op(name, args).map(|r| r.map(Some)),
        _ => None,
    }
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).copied().unwrap_or(Value::Null)
}

/// Turn any value into an iterator cursor. Null iterates nothing and a
/// plain value iterates once.
pub(crate) fn coerce_iterator(heap: &mut Heap, value: Value) -> Result<Value, ExecError> {
    let Some(r) = value.as_heap_ref("iterator").ok().flatten() else {
        let items = if value == Value::Null { Vec::new() } else { vec![value] };
        return Ok(heap.alloc_cursor(Protocol::Iterator, items));
    };
    let items = match heap.get(r)? {
        Object::Array { values, .. } => values.clone(),
        Object::Collection { items, .. } => items.clone(),
        Object::Cursor {
            protocol: Protocol::Iterator,
            ..
        } => return Ok(value),
        Object::Cursor { items, pos, .. } => items.get(*pos..).unwrap_or_default().to_vec(),
        Object::Str(text) => text.chars().map(|c| Value::Int(c as i32)).collect(),
    };
    Ok(heap.alloc_cursor(Protocol::Iterator, items))
}

fn dynamic_op(name: &str, args: &[Value]) -> Option<Result<Value, ExecError>> {
    if name == "box" {
        return Some(Ok(arg(args, 0)));
    }
    if let Some(kind) = name.strip_suffix("Value").and_then(PrimitiveKind::from_name) {
        return Some(unbox(kind, arg(args, 0)));
    }
    let (a, b) = (arg(args, 0), arg(args, 1));
    let result = match name {
        "add" => arith(a, b, i32::wrapping_add, i64::wrapping_add, |x, y| x + y),
        "sub" => arith(a, b, i32::wrapping_sub, i64::wrapping_sub, |x, y| x - y),
        "mul" => arith(a, b, i32::wrapping_mul, i64::wrapping_mul, |x, y| x * y),
        "lt" => compare(a, b).map(|o| Value::Int(i32::from(o == std::cmp::Ordering::Less))),
        "eq" => compare(a, b).map(|o| Value::Int(i32::from(o == std::cmp::Ordering::Equal))),
        _ => return None,
    };
    Some(result)
}

fn operands(a: Value, b: Value) -> Result<(f64, f64), ExecError> {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(ExecError::TypeMismatch(format!(
            "dynamic operator on {:?} and {:?}",
            a, b
        ))),
    }
}

/// Int and long results wrap, matching the typed instructions.
fn arith(
    a: Value,
    b: Value,
    int_op: impl Fn(i32, i32) -> i32,
    long_op: impl Fn(i64, i64) -> i64,
    float_op: impl Fn(f64, f64) -> f64,
) -> Result<Value, ExecError> {
    let (x, y) = operands(a, b)?;
    match (a, b) {
        (Value::Double(_), _) | (_, Value::Double(_)) => Ok(Value::Double(float_op(x, y))),
        (Value::Float(_), _) | (_, Value::Float(_)) => Ok(Value::Float(float_op(x, y) as f32)),
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(int_op(x, y))),
        _ => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => Ok(Value::Long(long_op(x, y))),
            _ => Err(ExecError::TypeMismatch(format!(
                "dynamic operator on {:?} and {:?}",
                a, b
            ))),
        },
    }
}

fn compare(a: Value, b: Value) -> Result<std::cmp::Ordering, ExecError> {
    let (x, y) = operands(a, b)?;
    x.partial_cmp(&y)
        .ok_or_else(|| ExecError::TypeMismatch("comparison with NaN".to_string()))
}

fn unbox(kind: PrimitiveKind, value: Value) -> Result<Value, ExecError> {
    if value == Value::Null {
        return Err(ExecError::NullPointer("unbox"));
    }
    let bad = || ExecError::TypeMismatch(format!("cannot unbox {:?} as {}", value, kind.name()));
    Ok(match kind {
        PrimitiveKind::Long => Value::Long(value.as_i64().ok_or_else(bad)?),
        PrimitiveKind::Float => Value::Float(value.as_f64().ok_or_else(bad)? as f32),
        PrimitiveKind::Double => Value::Double(value.as_f64().ok_or_else(bad)?),
        PrimitiveKind::Boolean => Value::Int(i32::from(value.as_i64().ok_or_else(bad)? != 0)),
        PrimitiveKind::Byte => Value::Int(i32::from(value.as_i64().ok_or_else(bad)? as i8)),
        PrimitiveKind::Short => Value::Int(i32::from(value.as_i64().ok_or_else(bad)? as i16)),
        PrimitiveKind::Char => Value::Int(i32::from(value.as_i64().ok_or_else(bad)? as u16)),
        PrimitiveKind::Int => Value::Int(value.as_i64().ok_or_else(bad)? as i32),
    })
}
