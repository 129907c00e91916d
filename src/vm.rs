use std::convert::TryFrom;
use std::rc::Rc;

use super::chunk::{Chunk, Instruction};
use super::compiler;
use super::debug;
use super::error::{CompileError, RuntimeError};
use super::table::Table;
use super::value::{values_equal, Heap, ObjString, Value};

const STACK_MAX: usize = 256;

#[cfg(feature = "debug-execution")]
fn trace_stack(stack: &[Value]) {
    print!("          ");
    for value in stack {
        print!("[ {value} ]");
    }
    println!();
}

/// Everything a `Reporter` needs to render a runtime failure: the
/// message and the source line read from the chunk's `lines` array at
/// the point of failure.
pub struct RuntimeFailure {
    pub error: RuntimeError,
    pub line: u32,
}

pub enum InterpretError {
    Compile(Vec<CompileError>),
    Runtime(RuntimeFailure),
}

/// The stack machine: owns the value stack, the globals environment,
/// and the heap (string intern table plus the live-object list), so a
/// REPL can keep reusing one `Vm` across lines.
pub struct Vm {
    stack: Vec<Value>,
    globals: Table<Value>,
    heap: Heap,
}

impl Vm {
    pub fn new() -> Self {
        Self {
            stack: Vec::with_capacity(STACK_MAX),
            globals: Table::new(),
            heap: Heap::new(),
        }
    }

    /// Compiles and runs one source unit. Leaves globals and the heap
    /// intact even on failure, so a REPL can keep going after an error.
    pub fn interpret(&mut self, source: &str) -> Result<(), InterpretError> {
        let chunk = compiler::compile(source, &mut self.heap).map_err(InterpretError::Compile)?;
        debug::debug_bytecode(&chunk, "script");
        debug::debug_execution_header();
        self.run(&chunk).map_err(InterpretError::Runtime)
    }

    /// Restores the VM to a usable state after a runtime error, for the
    /// REPL's next line.
    pub fn recover(&mut self) {
        self.stack.clear();
    }

    fn push(&mut self, value: Value) -> Result<(), RuntimeError> {
        if self.stack.len() >= STACK_MAX {
            return Err(RuntimeError::StackOverflow);
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Value {
        self.stack
            .pop()
            .expect("stack discipline guarantees a value is present")
    }

    fn peek(&self, distance: usize) -> &Value {
        let index = self.stack.len() - 1 - distance;
        &self.stack[index]
    }

    fn run(&mut self, chunk: &Chunk) -> Result<(), RuntimeFailure> {
        let mut ip: usize = 0;

        macro_rules! fail {
            ($error:expr) => {{
                self.stack.clear();
                return Err(RuntimeFailure {
                    error: $error,
                    line: chunk.line_at(ip.saturating_sub(1)),
                });
            }};
        }

        macro_rules! push_or_fail {
            ($value:expr) => {{
                let value = $value;
                if self.push(value).is_err() {
                    fail!(RuntimeError::StackOverflow);
                }
            }};
        }

        macro_rules! numeric_binary {
            ($wrap:ident, $op:tt) => {{
                let (Some(b), Some(a)) = (self.peek(0).as_number(), self.peek(1).as_number())
                else {
                    fail!(RuntimeError::OperandsMustBeNumbers);
                };
                self.pop();
                self.pop();
                push_or_fail!(Value::$wrap(a $op b));
            }};
        }

        loop {
            #[cfg(feature = "debug-execution")]
            trace_stack(&self.stack);

            let byte = chunk.code()[ip];
            ip += 1;
            let instr =
                Instruction::try_from(byte).expect("compiler only ever emits valid opcodes");

            match instr {
                Instruction::Constant => {
                    let index = chunk.code()[ip];
                    ip += 1;
                    push_or_fail!(chunk.constant(index));
                }
                Instruction::Nil => push_or_fail!(Value::Nil),
                Instruction::True => push_or_fail!(Value::Bool(true)),
                Instruction::False => push_or_fail!(Value::Bool(false)),
                Instruction::Pop => {
                    self.pop();
                }
                Instruction::GetLocal => {
                    let slot = chunk.code()[ip];
                    ip += 1;
                    push_or_fail!(self.stack[slot as usize].clone());
                }
                Instruction::SetLocal => {
                    let slot = chunk.code()[ip];
                    ip += 1;
                    self.stack[slot as usize] = self.peek(0).clone();
                }
                Instruction::GetGlobal => {
                    let index = chunk.code()[ip];
                    ip += 1;
                    let name = string_constant(chunk, index);
                    match self.globals.get(&name) {
                        Some(value) => {
                            let value = value.clone();
                            push_or_fail!(value);
                        }
                        None => fail!(RuntimeError::UndefinedVariable {
                            name: name.chars.clone(),
                        }),
                    }
                }
                Instruction::DefineGlobal => {
                    let index = chunk.code()[ip];
                    ip += 1;
                    let name = string_constant(chunk, index);
                    let value = self.pop();
                    self.globals.set(name, value);
                }
                Instruction::SetGlobal => {
                    let index = chunk.code()[ip];
                    ip += 1;
                    let name = string_constant(chunk, index);
                    let value = self.peek(0).clone();
                    if self.globals.set(Rc::clone(&name), value) {
                        self.globals.delete(&name);
                        fail!(RuntimeError::UndefinedVariable {
                            name: name.chars.clone(),
                        });
                    }
                }
                Instruction::Equal => {
                    let b = self.pop();
                    let a = self.pop();
                    push_or_fail!(Value::Bool(values_equal(&a, &b)));
                }
                Instruction::Greater => numeric_binary!(Bool, >),
                Instruction::Less => numeric_binary!(Bool, <),
                Instruction::Add => {
                    let result = match (self.peek(0), self.peek(1)) {
                        (Value::Number(_), Value::Number(_)) => {
                            let b = self.pop().as_number().unwrap();
                            let a = self.pop().as_number().unwrap();
                            Value::Number(a + b)
                        }
                        (Value::Obj(_), Value::Obj(_)) => {
                            let b = self.pop();
                            let a = self.pop();
                            let a = a.as_string().unwrap();
                            let b = b.as_string().unwrap();
                            let concatenated = format!("{}{}", a.chars, b.chars);
                            Value::Obj(self.heap.take_string(concatenated))
                        }
                        _ => fail!(RuntimeError::OperandsMustBeNumbersOrStrings),
                    };
                    push_or_fail!(result);
                }
                Instruction::Subtract => numeric_binary!(Number, -),
                Instruction::Multiply => numeric_binary!(Number, *),
                Instruction::Divide => numeric_binary!(Number, /),
                Instruction::Not => {
                    let value = self.pop();
                    push_or_fail!(Value::Bool(value.is_falsey()));
                }
                Instruction::Negate => {
                    let Some(n) = self.peek(0).as_number() else {
                        fail!(RuntimeError::OperandMustBeNumber);
                    };
                    self.pop();
                    push_or_fail!(Value::Number(-n));
                }
                Instruction::Print => {
                    let value = self.pop();
                    println!("{value}");
                }
                Instruction::Jump => {
                    let offset = read_short(chunk, ip);
                    ip += 2 + offset as usize;
                }
                Instruction::JumpIfFalse => {
                    let offset = read_short(chunk, ip);
                    ip += 2;
                    if self.peek(0).is_falsey() {
                        ip += offset as usize;
                    }
                }
                Instruction::Loop => {
                    let offset = read_short(chunk, ip);
                    ip = ip + 2 - offset as usize;
                }
                Instruction::Return => {
                    self.stack.clear();
                    return Ok(());
                }
            }
        }
    }
}

fn read_short(chunk: &Chunk, offset: usize) -> u16 {
    let hi = chunk.code()[offset] as u16;
    let lo = chunk.code()[offset + 1] as u16;
    (hi << 8) | lo
}

fn string_constant(chunk: &Chunk, index: u8) -> Rc<ObjString> {
    match chunk.constant(index) {
        Value::Obj(s) => s,
        _ => unreachable!("compiler only ever stores identifier/string constants as Obj"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_ok(source: &str) -> Vm {
        let mut vm = Vm::new();
        match vm.interpret(source) {
            Ok(()) => vm,
            Err(InterpretError::Compile(errs)) => panic!("compile error: {errs:?}"),
            Err(InterpretError::Runtime(f)) => {
                panic!("runtime error: {} (line {})", f.error, f.line)
            }
        }
    }

    fn run_err(source: &str) -> InterpretError {
        let mut vm = Vm::new();
        vm.interpret(source).expect_err("expected interpret to fail")
    }

    #[test]
    fn arithmetic_and_print_do_not_panic() {
        run_ok("print 1 + 2 * 3;");
    }

    #[test]
    fn string_concatenation() {
        run_ok("print \"foo\" + \"bar\";");
    }

    #[test]
    fn globals_persist_across_interpret_calls() {
        let mut vm = run_ok("var a = 1;");
        vm.interpret("print a + 1;").unwrap();
    }

    #[test]
    fn undefined_global_read_is_a_runtime_error() {
        let err = run_err("print nope;");
        assert!(matches!(
            err,
            InterpretError::Runtime(RuntimeFailure {
                error: RuntimeError::UndefinedVariable { .. },
                ..
            })
        ));
    }

    #[test]
    fn assigning_undefined_global_is_a_runtime_error() {
        let err = run_err("nope = 1;");
        assert!(matches!(
            err,
            InterpretError::Runtime(RuntimeFailure {
                error: RuntimeError::UndefinedVariable { .. },
                ..
            })
        ));
    }

    #[test]
    fn adding_number_and_string_is_a_runtime_error() {
        let err = run_err("print 1 + \"a\";");
        assert!(matches!(
            err,
            InterpretError::Runtime(RuntimeFailure {
                error: RuntimeError::OperandsMustBeNumbersOrStrings,
                ..
            })
        ));
    }

    #[test]
    fn while_loop_accumulates() {
        run_ok("var i = 0; var sum = 0; while (i < 5) { sum = sum + i; i = i + 1; } print sum;");
    }

    #[test]
    fn for_loop_and_scoped_locals() {
        run_ok("var total = 0; for (var i = 0; i < 3; i = i + 1) { total = total + i; } print total;");
    }

    #[test]
    fn and_or_short_circuit() {
        run_ok("print false and (1/0 == 0);");
        run_ok("print true or (1/0 == 0);");
    }

    #[test]
    fn runtime_error_resets_stack_for_next_line() {
        let mut vm = Vm::new();
        assert!(vm.interpret("1 + \"a\";").is_err());
        vm.recover();
        vm.interpret("print 1 + 1;").unwrap();
    }
}
