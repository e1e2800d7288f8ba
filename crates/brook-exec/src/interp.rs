// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! The instruction loop.

use std::collections::HashMap;

use brook_ir::{
    ArithOp, ArrayElementKind, Dispatch, Instruction, JumpCond, MethodCode, SlotId, ValueKind,
};
use brook_types::{MethodSig, StaticType};

use crate::builtins;
use crate::heap::{default_value, storage_kind};
use crate::{ExecError, ExecStats, Heap, Object, Protocol, Value};

/// Host implementation of a method. Instance methods receive the receiver
/// as the first argument.
pub type HostFn = Box<dyn Fn(&mut Heap, &[Value]) -> Result<Option<Value>, ExecError>>;

const DEFAULT_STEP_LIMIT: usize = 1_000_000;

pub struct Interpreter {
    heap: Heap,
    host: HashMap<(String, String), HostFn>,
    stats: ExecStats,
    step_limit: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            heap: Heap::new(),
            host: HashMap::new(),
            stats: ExecStats::default(),
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = limit;
        self
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    pub fn stats(&self) -> &ExecStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = ExecStats::default();
    }

    /// Provide `owner.name`. Host functions take precedence over builtins.
    pub fn register(
        &mut self,
        owner: &str,
        name: &str,
        f: impl Fn(&mut Heap, &[Value]) -> Result<Option<Value>, ExecError> + 'static,
    ) {
        self.host
            .insert((owner.to_string(), name.to_string()), Box::new(f));
    }

    /// Run `code` with `args` placed in consecutive slots from slot 0.
    pub fn run(&mut self, code: &MethodCode, args: &[Value]) -> Result<Option<Value>, ExecError> {
        let labels = code.label_positions();
        let mut frame = Frame::new(code.max_locals, args);
        let mut pc = 0;
        tracing::debug!(target: "brook::exec", instructions = code.instructions.len(), "run");

        while let Some(inst) = code.instructions.get(pc) {
            self.stats.steps += 1;
            if self.stats.steps > self.step_limit {
                return Err(ExecError::StepLimit(self.step_limit));
            }
            pc += 1;
            match inst {
                Instruction::Load { slot, .. } => {
                    let value = frame.local(*slot)?;
                    frame.push(value);
                }
                Instruction::Store { slot, .. } => {
                    let value = frame.pop()?;
                    frame.set_local(*slot, value)?;
                }
                Instruction::ArrayLoad(kind) => {
                    let index = frame.pop()?.as_int()?;
                    let array = frame.pop()?;
                    let value = self.array_load(array, index, *kind)?;
                    frame.push(value);
                }
                Instruction::ArrayStore(kind) => {
                    let value = frame.pop()?;
                    let index = frame.pop()?.as_int()?;
                    let array = frame.pop()?;
                    self.array_store(array, index, *kind, value)?;
                }
                Instruction::ArrayLength => {
                    let array = frame.pop()?;
                    self.stats.array_length_reads += 1;
                    let len = self.array_values("arraylength", array)?.len();
                    frame.push(Value::Int(array_length(len)?));
                }
                Instruction::NewArray(elem) => {
                    let len = frame.pop()?.as_int()?;
                    let size = usize::try_from(len).map_err(|_| ExecError::NegativeArraySize(len))?;
                    let kind = storage_kind(elem);
                    let array = self.heap.alloc(Object::Array {
                        elem: kind,
                        values: vec![default_value(kind); size],
                    });
                    frame.push(array);
                }
                Instruction::Dup => {
                    let top = frame.peek()?;
                    frame.push(top);
                }
                Instruction::Pop => {
                    frame.pop()?;
                }
                Instruction::Pop2 => {
                    if frame.pop()?.width() == 1 {
                        frame.pop()?;
                    }
                }
                Instruction::IConst(v) => frame.push(Value::Int(*v)),
                Instruction::LConst(v) => frame.push(Value::Long(*v)),
                Instruction::FConst(v) => frame.push(Value::Float(*v)),
                Instruction::DConst(v) => frame.push(Value::Double(*v)),
                Instruction::AConstNull => frame.push(Value::Null),
                Instruction::Ldc(text) => {
                    let value = self.heap.alloc_str(text);
                    frame.push(value);
                }
                Instruction::Iinc { slot, delta } => {
                    let current = frame.local(*slot)?.as_int()?;
                    frame.set_local(*slot, Value::Int(current.wrapping_add(i32::from(*delta))))?;
                }
                Instruction::Arith { op, kind } => {
                    let b = frame.pop()?;
                    let a = frame.pop()?;
                    frame.push(arith(*op, *kind, a, b)?);
                }
                Instruction::Jump { cond, target } => {
                    if self.condition_holds(*cond, &mut frame)? {
                        pc = *labels.get(target).ok_or(ExecError::UnknownLabel(*target))?;
                    }
                }
                Instruction::Label(_) | Instruction::LineNumber(_) => {}
                Instruction::Invoke { dispatch, method } => {
                    let result = self.invoke(*dispatch, method, &mut frame)?;
                    if method.ret != StaticType::Void {
                        frame.push(result.unwrap_or(Value::Null));
                    }
                }
                Instruction::CheckCast(_) => {
                    frame.peek()?;
                }
                Instruction::Return(kind) => {
                    return match kind {
                        Some(_) => frame.pop().map(Some),
                        None => Ok(None),
                    };
                }
            }
        }
        Ok(None)
    }

    fn condition_holds(&self, cond: JumpCond, frame: &mut Frame) -> Result<bool, ExecError> {
        Ok(match cond {
            JumpCond::Always => true,
            JumpCond::IfEq => frame.pop()?.as_int()? == 0,
            JumpCond::IfNe => frame.pop()?.as_int()? != 0,
            JumpCond::IfNull => frame.pop()? == Value::Null,
            JumpCond::IfNonNull => frame.pop()? != Value::Null,
            JumpCond::IfICmpGe | JumpCond::IfICmpLt | JumpCond::IfICmpNe => {
                let b = frame.pop()?.as_int()?;
                let a = frame.pop()?.as_int()?;
                match cond {
                    JumpCond::IfICmpGe => a >= b,
                    JumpCond::IfICmpLt => a < b,
                    _ => a != b,
                }
            }
        })
    }

    fn array_values(&self, op: &'static str, array: Value) -> Result<&[Value], ExecError> {
        let r = array.as_heap_ref(op)?.ok_or(ExecError::NullPointer(op))?;
        match self.heap.get(r)? {
            Object::Array { values, .. } => Ok(values),
            other => Err(ExecError::TypeMismatch(format!("{} on {:?}", op, other))),
        }
    }

    fn array_load(
        &mut self,
        array: Value,
        index: i32,
        kind: ArrayElementKind,
    ) -> Result<Value, ExecError> {
        let r = array.as_heap_ref("array load")?.ok_or(ExecError::NullPointer("array load"))?;
        let Object::Array { elem, values } = self.heap.get(r)? else {
            return Err(ExecError::TypeMismatch("array load on non-array".to_string()));
        };
        if *elem != kind {
            return Err(ExecError::TypeMismatch(format!(
                "{} on an array of {:?}",
                kind.load_mnemonic(),
                elem
            )));
        }
        let value = element(values, index)?;
        *self.stats.element_reads_by_kind.entry(kind).or_default() += 1;
        Ok(value)
    }

    fn array_store(
        &mut self,
        array: Value,
        index: i32,
        kind: ArrayElementKind,
        value: Value,
    ) -> Result<(), ExecError> {
        let r = array.as_heap_ref("array store")?.ok_or(ExecError::NullPointer("array store"))?;
        let Object::Array { elem, values } = self.heap.get_mut(r)? else {
            return Err(ExecError::TypeMismatch("array store on non-array".to_string()));
        };
        if *elem != kind {
            return Err(ExecError::TypeMismatch(format!(
                "{} on an array of {:?}",
                kind.store_mnemonic(),
                elem
            )));
        }
        let len = values.len();
        let slot = usize::try_from(index)
            .ok()
            .and_then(|i| values.get_mut(i))
            .ok_or(ExecError::IndexOutOfBounds { index, len })?;
        *slot = value;
        Ok(())
    }

    fn invoke(
        &mut self,
        dispatch: Dispatch,
        method: &MethodSig,
        frame: &mut Frame,
    ) -> Result<Option<Value>, ExecError> {
        self.stats.record_call(&method.owner, &method.name);
        tracing::trace!(target: "brook::exec", %method, "invoke");

        let mut args = frame.pop_n(method.arity())?;
        if dispatch != Dispatch::Static {
            let receiver = frame.pop()?;
            if receiver == Value::Null {
                return Err(ExecError::NullPointer("invoke"));
            }
            args.insert(0, receiver);
        }

        let key = (method.owner.clone(), method.name.clone());
        if let Some(host) = self.host.get(&key) {
            return host(&mut self.heap, &args);
        }
        if dispatch == Dispatch::Static {
            return builtins::call_static(&mut self.heap, &method.owner, &method.name, &args)
                .unwrap_or_else(|| Err(unknown(method)));
        }
        self.call_protocol(method, args[0])
    }

    /// Instance calls the heap objects answer natively.
    fn call_protocol(&mut self, method: &MethodSig, receiver: Value) -> Result<Option<Value>, ExecError> {
        let r = receiver.as_heap_ref("invoke")?.ok_or(ExecError::NullPointer("invoke"))?;
        match (self.heap.get_mut(r)?, method.name.as_str()) {
            (
                Object::Cursor {
                    protocol: Protocol::Iterator,
                    items,
                    pos,
                },
                "hasNext",
            )
            | (
                Object::Cursor {
                    protocol: Protocol::Enumerator,
                    items,
                    pos,
                },
                "hasMoreElements",
            ) => Ok(Some(Value::Int(i32::from(*pos < items.len())))),
            (
                Object::Cursor {
                    protocol: Protocol::Iterator,
                    items,
                    pos,
                },
                "next",
            )
            | (
                Object::Cursor {
                    protocol: Protocol::Enumerator,
                    items,
                    pos,
                },
                "nextElement",
            ) => {
                let value = items.get(*pos).copied().ok_or(ExecError::NoSuchElement)?;
                *pos += 1;
                Ok(Some(value))
            }
            (Object::Collection { items, .. }, "iterator") => {
                let items = items.clone();
                Ok(Some(self.heap.alloc_cursor(Protocol::Iterator, items)))
            }
            _ => Err(unknown(method)),
        }
    }
}

fn unknown(method: &MethodSig) -> ExecError {
    ExecError::UnknownFunction(format!("{}.{}", method.owner, method.name))
}

fn array_length(len: usize) -> Result<i32, ExecError> {
    i32::try_from(len).map_err(|_| ExecError::ArrayTooLong(len))
}

fn element(values: &[Value], index: i32) -> Result<Value, ExecError> {
    usize::try_from(index)
        .ok()
        .and_then(|i| values.get(i))
        .copied()
        .ok_or(ExecError::IndexOutOfBounds {
            index,
            len: values.len(),
        })
}

fn arith(op: ArithOp, kind: ValueKind, a: Value, b: Value) -> Result<Value, ExecError> {
    Ok(match (kind, a, b) {
        (ValueKind::Int, Value::Int(x), Value::Int(y)) => Value::Int(match op {
            ArithOp::Add => x.wrapping_add(y),
            ArithOp::Sub => x.wrapping_sub(y),
            ArithOp::Mul => x.wrapping_mul(y),
        }),
        (ValueKind::Long, Value::Long(x), Value::Long(y)) => Value::Long(match op {
            ArithOp::Add => x.wrapping_add(y),
            ArithOp::Sub => x.wrapping_sub(y),
            ArithOp::Mul => x.wrapping_mul(y),
        }),
        (ValueKind::Float, Value::Float(x), Value::Float(y)) => Value::Float(match op {
            ArithOp::Add => x + y,
            ArithOp::Sub => x - y,
            ArithOp::Mul => x * y,
        }),
        (ValueKind::Double, Value::Double(x), Value::Double(y)) => Value::Double(match op {
            ArithOp::Add => x + y,
            ArithOp::Sub => x - y,
            ArithOp::Mul => x * y,
        }),
        _ => {
            return Err(ExecError::TypeMismatch(format!(
                "{}{} on {:?} and {:?}",
                kind.prefix(),
                op.name(),
                a,
                b
            )))
        }
    })
}

/// Locals and operand stack of one activation.
struct Frame {
    locals: Vec<Value>,
    stack: Vec<Value>,
}

impl Frame {
    fn new(max_locals: u16, args: &[Value]) -> Self {
        let needed: usize = args.iter().map(|a| a.width()).sum();
        let mut locals = vec![Value::Null; usize::from(max_locals).max(needed)];
        let mut slot = 0;
        for arg in args {
            locals[slot] = *arg;
            slot += arg.width();
        }
        Self {
            locals,
            stack: Vec::new(),
        }
    }

    fn local(&self, slot: SlotId) -> Result<Value, ExecError> {
        self.locals
            .get(usize::from(slot.0))
            .copied()
            .ok_or(ExecError::BadSlot(slot))
    }

    fn set_local(&mut self, slot: SlotId, value: Value) -> Result<(), ExecError> {
        let cell = self
            .locals
            .get_mut(usize::from(slot.0))
            .ok_or(ExecError::BadSlot(slot))?;
        *cell = value;
        Ok(())
    }

    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn pop(&mut self) -> Result<Value, ExecError> {
        self.stack.pop().ok_or(ExecError::StackUnderflow)
    }

    fn pop_n(&mut self, n: usize) -> Result<Vec<Value>, ExecError> {
        if self.stack.len() < n {
            return Err(ExecError::StackUnderflow);
        }
        Ok(self.stack.split_off(self.stack.len() - n))
    }

    fn peek(&self) -> Result<Value, ExecError> {
        self.stack.last().copied().ok_or(ExecError::StackUnderflow)
    }
}
