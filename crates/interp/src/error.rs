//! Runtime errors for the Aceto interpreter.
//!
//! A [`RuntimeError`] is raised by a command handler and is subject to the
//! catch mechanism (`@`): with a catch cell set, the instruction pointer
//! teleports there and execution resumes. Only errors that escape the
//! catch mechanism become a [`ProgramError`] with a grid position attached.

use thiserror::Error;

/// Errors a command handler can raise during execution.
///
/// All kinds are uniform at the interpreter level: every one of them
/// triggers the catch mechanism when a catch cell is set.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// A command was applied to values it cannot coerce.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Integer or float division (or remainder) by zero.
    #[error("division by zero")]
    DivideByZero,

    /// String indexing (`F`) outside the string.
    #[error("index {index} out of range (length {len})")]
    IndexOutOfRange { index: i64, len: usize },

    /// A string command (`/`, `%`, `a`) received an invalid pattern.
    #[error("bad regex: {0}")]
    RegexSyntax(String),

    /// Raised by `&` or a failed `$` assertion.
    #[error("{0}")]
    UserRaised(String),

    /// Reading or writing the program's streams failed.
    #[error("i/o error: {0}")]
    Io(String),
}

/// Errors that terminate the program.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProgramError {
    /// A runtime error with no catch cell set (or with `-e` given).
    #[error("{kind} at ({x}, {y})")]
    Uncaught { kind: RuntimeError, x: usize, y: usize },

    /// The Hilbert walk left the grid while collecting a string or
    /// character literal.
    #[error("unterminated literal (walk left the grid at ({x}, {y}))")]
    UnterminatedLiteral { x: usize, y: usize },
}

impl ProgramError {
    /// Process exit code for this failure: 1 for uncaught runtime errors,
    /// 2 for unterminated literals.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProgramError::Uncaught { .. } => 1,
            ProgramError::UnterminatedLiteral { .. } => 2,
        }
    }
}
