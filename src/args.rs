use std::env;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy)]
enum Flag {
    Version,
    Help,
}

const VERSION: &str = "--version";
const HELP: &str = "--help";

impl Flag {
    fn try_from(value: &str) -> Option<Self> {
        match value {
            VERSION => Some(Self::Version),
            HELP => Some(Self::Help),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
enum Token {
    Flag(Flag),
    Path(PathBuf),
}

#[derive(Debug, Clone)]
pub enum LexError {
    UnknownFlag(String),
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFlag(flag) => write!(f, "no such option: {flag}"),
        }
    }
}

fn lex(iter: &mut env::Args) -> Result<Vec<Token>, LexError> {
    iter.next();
    let mut tokens = Vec::new();
    for arg in iter {
        if let Some(suffix) = arg.strip_prefix("--") {
            match Flag::try_from(&format!("--{suffix}")) {
                Some(flag) => tokens.push(Token::Flag(flag)),
                None => return Err(LexError::UnknownFlag(arg)),
            }
        } else {
            tokens.push(Token::Path(PathBuf::from(arg)));
        }
    }
    Ok(tokens)
}

#[derive(Debug, Clone)]
pub enum EvalMode {
    File(PathBuf),
    Repl,
}

#[derive(Clone)]
pub enum Action {
    Eval(EvalMode),
    Version,
    Help,
}

#[derive(Debug, Clone)]
pub enum CompileError {
    UnexpectedArgument,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedArgument => write!(f, "expected at most one script path"),
        }
    }
}

fn build_action(tokens: Vec<Token>) -> Result<Action, CompileError> {
    let mut path: Option<PathBuf> = None;
    for token in tokens {
        match token {
            Token::Flag(Flag::Help) => return Ok(Action::Help),
            Token::Flag(Flag::Version) => return Ok(Action::Version),
            Token::Path(p) => {
                if path.is_some() {
                    return Err(CompileError::UnexpectedArgument);
                }
                path = Some(p);
            }
        }
    }
    Ok(Action::Eval(match path {
        Some(path) => EvalMode::File(path),
        None => EvalMode::Repl,
    }))
}

#[derive(Debug, Clone)]
pub enum Error {
    Lex(LexError),
    Compile(CompileError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex(err) => write!(f, "{err}"),
            Self::Compile(err) => write!(f, "{err}"),
        }
    }
}

impl From<LexError> for Error {
    fn from(err: LexError) -> Self {
        Self::Lex(err)
    }
}

impl From<CompileError> for Error {
    fn from(err: CompileError) -> Self {
        Self::Compile(err)
    }
}

pub fn get_action() -> Result<Action, Error> {
    let tokens = lex(&mut env::args())?;
    Ok(build_action(tokens)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_flag_is_rejected() {
        let tokens = vec![Token::Path(PathBuf::from("ok.lox"))];
        assert!(build_action(tokens).is_ok());
    }

    #[test]
    fn two_paths_is_an_error() {
        let tokens = vec![
            Token::Path(PathBuf::from("a.lox")),
            Token::Path(PathBuf::from("b.lox")),
        ];
        assert!(matches!(
            build_action(tokens),
            Err(CompileError::UnexpectedArgument)
        ));
    }

    #[test]
    fn no_path_means_repl() {
        assert!(matches!(
            build_action(Vec::new()),
            Ok(Action::Eval(EvalMode::Repl))
        ));
    }

    #[test]
    fn help_flag_short_circuits() {
        let tokens = vec![Token::Flag(Flag::Help), Token::Path(PathBuf::from("a.lox"))];
        assert!(matches!(build_action(tokens), Ok(Action::Help)));
    }
}
