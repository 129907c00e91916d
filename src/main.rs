mod args;
mod chunk;
mod cli_reporter;
mod compiler;
mod debug;
mod error;
mod reporter;
mod scanner;
mod table;
mod token;
mod value;
mod vm;

use std::{fs, process};

use args::{Action, EvalMode};
use cli_reporter::CliReporter;
use error::CompileError;
use reporter::{Phase, Report, Reporter};
use rustyline::error::ReadlineError;
use rustyline::Editor;
use vm::{InterpretError, Vm};

fn main() {
    let action = args::get_action().unwrap_or_else(|err| {
        eprintln!("{err}");
        process::exit(exitcode::USAGE);
    });

    match action {
        Action::Version => println!("{}", env!("CARGO_PKG_VERSION")),
        Action::Help => print!("{}", include_str!("../help.md")),
        Action::Eval(EvalMode::Repl) => run_repl(),
        Action::Eval(EvalMode::File(path)) => {
            let source = fs::read_to_string(&path).unwrap_or_else(|err| {
                eprintln!("error reading {}: {err}", path.display());
                process::exit(exitcode::IOERR);
            });
            let mut vm = Vm::new();
            let mut reporter = CliReporter::new();
            if run(&source, &mut vm, &mut reporter) == RunOutcome::CompileError {
                process::exit(exitcode::DATAERR);
            }
        }
    }
}

fn run_repl() {
    let mut vm = Vm::new();
    let mut rl = Editor::<()>::new();
    loop {
        match rl.readline("> ") {
            Ok(line) => {
                rl.add_history_entry(line.as_str());
                let mut reporter = CliReporter::new();
                run(&line, &mut vm, &mut reporter);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{err}");
                break;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunOutcome {
    Ok,
    CompileError,
    RuntimeError,
}

/// Compiles and runs one source unit, reporting any failure through
/// `reporter`. Only a `CompileError` outcome should affect the process
/// exit code: a reported runtime error mirrors the reference driver,
/// which only inspects the compile step's result and otherwise relies
/// on the error having already been printed to stderr.
fn run(source: &str, vm: &mut Vm, reporter: &mut CliReporter) -> RunOutcome {
    match vm.interpret(source) {
        Ok(()) => RunOutcome::Ok,
        Err(InterpretError::Compile(errors)) => {
            for error in errors {
                reporter.error(compile_error_report(error));
            }
            RunOutcome::CompileError
        }
        Err(InterpretError::Runtime(failure)) => {
            vm.recover();
            reporter.runtime_error(failure.error, failure.line);
            RunOutcome::RuntimeError
        }
    }
}

fn compile_error_report(error: CompileError) -> Report {
    let phase = match &error {
        CompileError::Lexical(..) => Phase::Tokenizing,
        _ => Phase::Parsing,
    };
    Report::new(phase, error.to_string(), error.line())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_script_returns_ok() {
        let mut vm = Vm::new();
        let mut reporter = CliReporter::new();
        assert_eq!(run("print 1 + 1;", &mut vm, &mut reporter), RunOutcome::Ok);
    }

    #[test]
    fn compile_error_returns_compile_error_outcome() {
        let mut vm = Vm::new();
        let mut reporter = CliReporter::new();
        assert_eq!(
            run("var;", &mut vm, &mut reporter),
            RunOutcome::CompileError
        );
        assert_eq!(run("print 1;", &mut vm, &mut reporter), RunOutcome::Ok);
    }

    #[test]
    fn runtime_error_returns_runtime_error_outcome_not_compile_error() {
        let mut vm = Vm::new();
        let mut reporter = CliReporter::new();
        assert_eq!(
            run("print nope;", &mut vm, &mut reporter),
            RunOutcome::RuntimeError
        );
        assert_eq!(run("print 1;", &mut vm, &mut reporter), RunOutcome::Ok);
    }
}
