// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Textual listings of instructions and method bodies.

use std::fmt;

use crate::*;

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Load { kind, slot } => write!(f, "{}load {}", kind.prefix(), slot),
            Instruction::Store { kind, slot } => write!(f, "{}store {}", kind.prefix(), slot),
            Instruction::ArrayLoad(kind) => write!(f, "{}", kind.load_mnemonic()),
            Instruction::ArrayStore(kind) => write!(f, "{}", kind.store_mnemonic()),
            Instruction::ArrayLength => write!(f, "arraylength"),
            Instruction::NewArray(elem) => write!(f, "newarray {}", elem),
            Instruction::Dup => write!(f, "dup"),
            Instruction::Pop => write!(f, "pop"),
            Instruction::Pop2 => write!(f, "pop2"),
            Instruction::IConst(v) => write!(f, "iconst {}", v),
            Instruction::LConst(v) => write!(f, "lconst {}", v),
            Instruction::FConst(v) => write!(f, "fconst {}", v),
            Instruction::DConst(v) => write!(f, "dconst {}", v),
            Instruction::AConstNull => write!(f, "aconst_null"),
            Instruction::Ldc(s) => write!(f, "ldc {:?}", s),
            Instruction::Iinc { slot, delta } => write!(f, "iinc {} {}", slot, delta),
            Instruction::Arith { op, kind } => write!(f, "{}{}", kind.prefix(), op.name()),
            Instruction::Jump { cond, target } => write!(f, "{} {}", cond.mnemonic(), target),
            Instruction::Label(label) => write!(f, "{}:", label),
            Instruction::Invoke { dispatch, method } => {
                write!(f, "{} {}", dispatch.mnemonic(), method)
            }
            Instruction::CheckCast(name) => write!(f, "checkcast {}", name),
            Instruction::Return(None) => write!(f, "return"),
            Instruction::Return(Some(kind)) => write!(f, "{}return", kind.prefix()),
            Instruction::LineNumber(line) => write!(f, "line {}", line),
        }
    }
}

impl fmt::Display for MethodCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "max_locals={} max_stack={}", self.max_locals, self.max_stack)?;
        for inst in &self.instructions {
            match inst {
                Instruction::Label(_) => writeln!(f, "{}", inst)?,
                _ => writeln!(f, "    {}", inst)?,
            }
        }
        Ok(())
    }
}
