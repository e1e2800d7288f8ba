// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Instructions of the stack target.

use brook_types::{MethodSig, PrimitiveKind, StaticType};

/// Index of a local variable slot. Wide values occupy `slot` and `slot + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub u16);

/// Jump target. Placed exactly once in a method body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u32);

/// Machine value class used by local loads/stores, arithmetic and returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    Long,
    Float,
    Double,
    Ref,
}

impl ValueKind {
    /// Boolean, byte, char and short compute as int.
    pub fn of(ty: &StaticType) -> Self {
        match ty.as_primitive() {
            Some(PrimitiveKind::Long) => ValueKind::Long,
            Some(PrimitiveKind::Float) => ValueKind::Float,
            Some(PrimitiveKind::Double) => ValueKind::Double,
            Some(_) => ValueKind::Int,
            None => ValueKind::Ref,
        }
    }

    pub fn prefix(self) -> char {
        match self {
            ValueKind::Int => 'i',
            ValueKind::Long => 'l',
            ValueKind::Float => 'f',
            ValueKind::Double => 'd',
            ValueKind::Ref => 'a',
        }
    }

    pub fn is_wide(self) -> bool {
        matches!(self, ValueKind::Long | ValueKind::Double)
    }
}

/// Array element access classes. Byte and boolean arrays share one class:
/// both are single-byte elements on the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayElementKind {
    Int,
    Long,
    ByteOrBoolean,
    Char,
    Short,
    Float,
    Double,
    Ref,
}

impl ArrayElementKind {
    pub const ALL: [ArrayElementKind; 8] = [
        ArrayElementKind::Int,
        ArrayElementKind::Long,
        ArrayElementKind::ByteOrBoolean,
        ArrayElementKind::Char,
        ArrayElementKind::Short,
        ArrayElementKind::Float,
        ArrayElementKind::Double,
        ArrayElementKind::Ref,
    ];

    pub fn load_mnemonic(self) -> &'static str {
        match self {
            ArrayElementKind::Int => "iaload",
            ArrayElementKind::Long => "laload",
            ArrayElementKind::ByteOrBoolean => "baload",
            ArrayElementKind::Char => "caload",
            ArrayElementKind::Short => "saload",
            ArrayElementKind::Float => "faload",
            ArrayElementKind::Double => "daload",
            ArrayElementKind::Ref => "aaload",
        }
    }

    pub fn store_mnemonic(self) -> &'static str {
        match self {
            ArrayElementKind::Int => "iastore",
            ArrayElementKind::Long => "lastore",
            ArrayElementKind::ByteOrBoolean => "bastore",
            ArrayElementKind::Char => "castore",
            ArrayElementKind::Short => "sastore",
            ArrayElementKind::Float => "fastore",
            ArrayElementKind::Double => "dastore",
            ArrayElementKind::Ref => "aastore",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
}

impl ArithOp {
    pub fn name(self) -> &'static str {
        match self {
            ArithOp::Add => "add",
            ArithOp::Sub => "sub",
            ArithOp::Mul => "mul",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JumpCond {
    Always,
    /// Int on top equals zero (a false boolean).
    IfEq,
    IfNe,
    IfNull,
    IfNonNull,
    IfICmpGe,
    IfICmpLt,
    IfICmpNe,
}

impl JumpCond {
    /// Number of operand stack values the jump consumes.
    pub fn operands(self) -> usize {
        match self {
            JumpCond::Always => 0,
            JumpCond::IfEq | JumpCond::IfNe | JumpCond::IfNull | JumpCond::IfNonNull => 1,
            JumpCond::IfICmpGe | JumpCond::IfICmpLt | JumpCond::IfICmpNe => 2,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            JumpCond::Always => "goto",
            JumpCond::IfEq => "ifeq",
            JumpCond::IfNe => "ifne",
            JumpCond::IfNull => "ifnull",
            JumpCond::IfNonNull => "ifnonnull",
            JumpCond::IfICmpGe => "if_icmpge",
            JumpCond::IfICmpLt => "if_icmplt",
            JumpCond::IfICmpNe => "if_icmpne",
        }
    }
}

/// How an invoke binds its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dispatch {
    Static,
    Virtual,
    Interface,
}

impl Dispatch {
    pub fn of(method: &MethodSig) -> Self {
        if method.is_static {
            Dispatch::Static
        } else if method.owner_is_interface {
            Dispatch::Interface
        } else {
            Dispatch::Virtual
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Dispatch::Static => "invokestatic",
            Dispatch::Virtual => "invokevirtual",
            Dispatch::Interface => "invokeinterface",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Load { kind: ValueKind, slot: SlotId },
    Store { kind: ValueKind, slot: SlotId },
    /// `[array, index] -> [element]`
    ArrayLoad(ArrayElementKind),
    /// `[array, index, value] -> []`
    ArrayStore(ArrayElementKind),
    ArrayLength,
    /// `[length] -> [array]` with the given component type.
    NewArray(StaticType),
    Dup,
    Pop,
    Pop2,
    IConst(i32),
    LConst(i64),
    FConst(f32),
    DConst(f64),
    AConstNull,
    Ldc(String),
    /// Add a constant to an int slot in place; touches no stack.
    Iinc { slot: SlotId, delta: i16 },
    Arith { op: ArithOp, kind: ValueKind },
    Jump { cond: JumpCond, target: Label },
    /// Placement of a jump target.
    Label(Label),
    Invoke { dispatch: Dispatch, method: MethodSig },
    CheckCast(String),
    Return(Option<ValueKind>),
    LineNumber(u32),
}

impl Instruction {
    pub fn invoke(method: MethodSig) -> Self {
        Instruction::Invoke {
            dispatch: Dispatch::of(&method),
            method,
        }
    }

    pub fn jump_target(&self) -> Option<Label> {
        match self {
            Instruction::Jump { target, .. } => Some(*target),
            _ => None,
        }
    }
}
