use std::fmt;

use super::token::{Token, TokenType};

/// Where a compile error was raised: the line it occurred on, plus the
/// clause `errorAt` prints to locate it within that line. `at` is
/// `None` for lexical errors (the reference prints no "at" clause for
/// those, since the offending token IS the error message) and for
/// ordinary tokens holds `"end"` or `"'<lexeme>'"`.
#[derive(Debug, Clone)]
pub struct Site {
    pub line: u32,
    at: Option<String>,
}

impl Site {
    fn at_token(token: &Token) -> Self {
        Self {
            line: token.line,
            at: Some(describe(token)),
        }
    }

    fn lexical(line: u32) -> Self {
        Self { line, at: None }
    }
}

fn describe(token: &Token) -> String {
    match token.typ {
        TokenType::Eof => "end".to_string(),
        _ => format!("'{}'", token.lexeme),
    }
}

/// One variant per distinct compile-time failure the compiler can
/// raise. Every variant carries a [`Site`] rather than a borrowed
/// `Token`, so the error can be handed to a `Reporter` without
/// fighting the compiler's own borrow of the token stream, and every
/// variant renders through the same `"Error at ...: ..."` wrapper.
#[derive(Debug, Clone)]
pub enum CompileError {
    ExpectExpression(Site),
    ExpectToken(Site, &'static str),
    InvalidAssignmentTarget(Site),
    TooManyConstants(Site),
    TooManyLocals(Site),
    AlreadyDeclared(Site),
    ReadInOwnInitializer(Site),
    JumpTooLarge(Site),
    LoopBodyTooLarge(Site),
    Lexical(Site, String),
}

impl CompileError {
    pub fn line(&self) -> u32 {
        match self {
            Self::ExpectExpression(site)
            | Self::ExpectToken(site, ..)
            | Self::InvalidAssignmentTarget(site)
            | Self::TooManyConstants(site)
            | Self::TooManyLocals(site)
            | Self::AlreadyDeclared(site)
            | Self::ReadInOwnInitializer(site)
            | Self::JumpTooLarge(site)
            | Self::LoopBodyTooLarge(site)
            | Self::Lexical(site, ..) => site.line,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (site, message): (&Site, &str) = match self {
            Self::ExpectExpression(site) => (site, "Expect expression."),
            Self::ExpectToken(site, expected) => (site, expected),
            Self::InvalidAssignmentTarget(site) => (site, "Invalid assignment target."),
            Self::TooManyConstants(site) => (site, "Too many constants in one chunk."),
            Self::TooManyLocals(site) => (site, "Too many local variables in function."),
            Self::AlreadyDeclared(site) => {
                (site, "Already a variable with this name exists in the scope")
            }
            Self::ReadInOwnInitializer(site) => {
                (site, "Can't read local variable in its own initializer.")
            }
            Self::JumpTooLarge(site) => (site, "Too much code to jump"),
            Self::LoopBodyTooLarge(site) => (site, "Loop body too large"),
            Self::Lexical(site, message) => (site, message.as_str()),
        };
        write!(f, "Error")?;
        if let Some(at) = &site.at {
            write!(f, " at {at}")?;
        }
        write!(f, ": {message}")
    }
}

/// Token-carrying constructor helpers, used throughout the compiler so
/// call sites don't repeat `Site` construction.
impl CompileError {
    pub fn expect_expression(found: &Token) -> Self {
        Self::ExpectExpression(Site::at_token(found))
    }

    pub fn expect_token(expected: &'static str, found: &Token) -> Self {
        Self::ExpectToken(Site::at_token(found), expected)
    }

    pub fn too_many_locals(at: &Token) -> Self {
        Self::TooManyLocals(Site::at_token(at))
    }

    pub fn already_declared(at: &Token) -> Self {
        Self::AlreadyDeclared(Site::at_token(at))
    }

    pub fn read_in_own_initializer(at: &Token) -> Self {
        Self::ReadInOwnInitializer(Site::at_token(at))
    }

    pub fn invalid_assignment_target(at: &Token) -> Self {
        Self::InvalidAssignmentTarget(Site::at_token(at))
    }

    pub fn too_many_constants(at: &Token) -> Self {
        Self::TooManyConstants(Site::at_token(at))
    }

    pub fn jump_too_large(at: &Token) -> Self {
        Self::JumpTooLarge(Site::at_token(at))
    }

    pub fn loop_body_too_large(at: &Token) -> Self {
        Self::LoopBodyTooLarge(Site::at_token(at))
    }

    pub fn lexical(line: u32, message: String) -> Self {
        Self::Lexical(Site::lexical(line), message)
    }
}

/// One variant per distinct runtime failure the VM can raise.
#[derive(Debug, Clone)]
pub enum RuntimeError {
    UndefinedVariable { name: String },
    OperandMustBeNumber,
    OperandsMustBeNumbers,
    OperandsMustBeNumbersOrStrings,
    StackOverflow,
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedVariable { name } => write!(f, "Undefined variable {name}."),
            Self::OperandMustBeNumber => write!(f, "Operand must be a number."),
            Self::OperandsMustBeNumbers => write!(f, "Operands must both be numbers."),
            Self::OperandsMustBeNumbersOrStrings => {
                write!(f, "Operands must be two numbers or two strings.")
            }
            Self::StackOverflow => write!(f, "Stack overflow."),
        }
    }
}
