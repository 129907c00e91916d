use std::convert::TryFrom;

#[cfg(feature = "debug-bytecode")]
use std::fmt;

use super::error::CompileError;
use super::token::Token;
use super::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Constant,
    Nil,
    True,
    False,
    Pop,
    GetLocal,
    SetLocal,
    GetGlobal,
    DefineGlobal,
    SetGlobal,
    Equal,
    Greater,
    Less,
    Add,
    Subtract,
    Multiply,
    Divide,
    Not,
    Negate,
    Print,
    Jump,
    JumpIfFalse,
    Loop,
    Return,
}

impl From<Instruction> for u8 {
    fn from(instr: Instruction) -> u8 {
        use Instruction::*;
        match instr {
            Constant => 0,
            Nil => 1,
            True => 2,
            False => 3,
            Pop => 4,
            GetLocal => 5,
            SetLocal => 6,
            GetGlobal => 7,
            DefineGlobal => 8,
            SetGlobal => 9,
            Equal => 10,
            Greater => 11,
            Less => 12,
            Add => 13,
            Subtract => 14,
            Multiply => 15,
            Divide => 16,
            Not => 17,
            Negate => 18,
            Print => 19,
            Jump => 20,
            JumpIfFalse => 21,
            Loop => 22,
            Return => 23,
        }
    }
}

impl TryFrom<u8> for Instruction {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use Instruction::*;
        Ok(match value {
            0 => Constant,
            1 => Nil,
            2 => True,
            3 => False,
            4 => Pop,
            5 => GetLocal,
            6 => SetLocal,
            7 => GetGlobal,
            8 => DefineGlobal,
            9 => SetGlobal,
            10 => Equal,
            11 => Greater,
            12 => Less,
            13 => Add,
            14 => Subtract,
            15 => Multiply,
            16 => Divide,
            17 => Not,
            18 => Negate,
            19 => Print,
            20 => Jump,
            21 => JumpIfFalse,
            22 => Loop,
            23 => Return,
            _ => return Err(()),
        })
    }
}

#[cfg(feature = "debug-bytecode")]
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        write!(
            f,
            "{}",
            match self {
                Constant => "OP_CONSTANT",
                Nil => "OP_NIL",
                True => "OP_TRUE",
                False => "OP_FALSE",
                Pop => "OP_POP",
                GetLocal => "OP_GET_LOCAL",
                SetLocal => "OP_SET_LOCAL",
                GetGlobal => "OP_GET_GLOBAL",
                DefineGlobal => "OP_DEFINE_GLOBAL",
                SetGlobal => "OP_SET_GLOBAL",
                Equal => "OP_EQUAL",
                Greater => "OP_GREATER",
                Less => "OP_LESS",
                Add => "OP_ADD",
                Subtract => "OP_SUBTRACT",
                Multiply => "OP_MULTIPLY",
                Divide => "OP_DIVIDE",
                Not => "OP_NOT",
                Negate => "OP_NEGATE",
                Print => "OP_PRINT",
                Jump => "OP_JUMP",
                JumpIfFalse => "OP_JUMP_IF_FALSE",
                Loop => "OP_LOOP",
                Return => "OP_RETURN",
            }
        )
    }
}

/// A self-contained executable unit: bytecode, a source line for every
/// byte of it, and the constant pool those bytes index into.
pub struct Chunk {
    code: Vec<u8>,
    lines: Vec<u32>,
    constants: Vec<Value>,
}

impl Chunk {
    pub fn new() -> Self {
        Self {
            code: Vec::new(),
            lines: Vec::new(),
            constants: Vec::new(),
        }
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn line_at(&self, offset: usize) -> u32 {
        self.lines[offset]
    }

    pub fn constant(&self, index: u8) -> Value {
        self.constants[index as usize].clone()
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn write_byte(&mut self, byte: u8, line: u32) {
        self.code.push(byte);
        self.lines.push(line);
    }

    pub fn write_instr(&mut self, instr: Instruction, line: u32) {
        self.write_byte(instr.into(), line);
    }

    pub fn add_constant(&mut self, value: Value, at: &Token) -> Result<u8, CompileError> {
        if self.constants.len() >= 256 {
            return Err(CompileError::too_many_constants(at));
        }
        self.constants.push(value);
        Ok((self.constants.len() - 1) as u8)
    }

    pub fn emit_constant(&mut self, value: Value, at: &Token) -> Result<(), CompileError> {
        let index = self.add_constant(value, at)?;
        self.write_instr(Instruction::Constant, at.line);
        self.write_byte(index, at.line);
        Ok(())
    }

    /// Writes `instr` followed by two placeholder bytes, returning the
    /// offset of the instruction byte (patched later by [`Self::patch_jump`]).
    pub fn emit_jump(&mut self, instr: Instruction, line: u32) -> usize {
        self.write_instr(instr, line);
        let offset = self.code.len();
        self.write_byte(0xff, line);
        self.write_byte(0xff, line);
        offset
    }

    /// Backpatches the jump written at `offset` to land on the current
    /// end of code. `offset` points at the first placeholder byte.
    pub fn patch_jump(&mut self, offset: usize, at: &Token) -> Result<(), CompileError> {
        let jump = self.code.len() - offset - 2;
        if jump > u16::MAX as usize {
            return Err(CompileError::jump_too_large(at));
        }
        let jump = jump as u16;
        self.code[offset] = (jump >> 8) as u8;
        self.code[offset + 1] = jump as u8;
        Ok(())
    }

    /// Emits `OP_LOOP` plus the big-endian back-edge distance to `loop_start`.
    pub fn emit_loop(&mut self, loop_start: usize, at: &Token) -> Result<(), CompileError> {
        self.write_instr(Instruction::Loop, at.line);
        let offset = self.code.len() - loop_start + 2;
        if offset > u16::MAX as usize {
            return Err(CompileError::loop_body_too_large(at));
        }
        let offset = offset as u16;
        self.write_byte((offset >> 8) as u8, at.line);
        self.write_byte(offset as u8, at.line);
        Ok(())
    }

    #[cfg(feature = "debug-bytecode")]
    pub fn disassemble(&self, name: &str) -> String {
        let mut buffer = format!("== {name} ==\n");
        let mut offset = 0;
        while offset < self.code.len() {
            let (text, advance) = self.disassemble_instr_at(offset);
            buffer += &text;
            offset += advance;
        }
        buffer
    }

    #[cfg(feature = "debug-bytecode")]
    fn disassemble_instr_at(&self, offset: usize) -> (String, usize) {
        use Instruction::*;

        let instr = Instruction::try_from(self.code[offset]).unwrap();
        let line = self.lines[offset];
        let mut buffer = format!("{offset:04} {line:4} {instr}");

        match instr {
            Constant | GetGlobal | DefineGlobal | SetGlobal => {
                let index = self.code[offset + 1];
                buffer += &format!(" {index} ({})\n", self.constants[index as usize]);
                (buffer, 2)
            }
            GetLocal | SetLocal => {
                let slot = self.code[offset + 1];
                buffer += &format!(" {slot}\n");
                (buffer, 2)
            }
            Jump | JumpIfFalse | Loop => {
                let hi = self.code[offset + 1] as u16;
                let lo = self.code[offset + 2] as u16;
                buffer += &format!(" {}\n", (hi << 8) | lo);
                (buffer, 3)
            }
            _ => {
                buffer += "\n";
                (buffer, 1)
            }
        }
    }
}
