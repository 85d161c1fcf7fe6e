//! Module containing the Planar universal error type
use crate::var::Var;
use thiserror::Error;

/// Structural errors found while compiling an expression
///
/// These are reported before any sampling begins, since there is no sensible
/// per-point fallback for an expression that can't be parsed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Expression contains nothing but whitespace
    #[error("expression is empty")]
    Empty,

    /// Character that is not part of the expression grammar
    #[error("unexpected character '{c}' at position {pos}")]
    UnexpectedChar {
        /// The offending character
        c: char,
        /// Byte offset into the expression
        pos: usize,
    },

    /// Identifier that is neither a variable nor a known function
    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    /// Closing parenthesis without a matching opening parenthesis
    #[error("unmatched ')' at position {pos}")]
    UnmatchedClose {
        /// Byte offset into the expression
        pos: usize,
    },

    /// Opening parenthesis that is never closed
    #[error("unmatched '('")]
    UnmatchedOpen,
}

/// Errors produced while evaluating a single point
///
/// The sampling pipeline turns every one of these into a `NaN` sample, so a
/// surface renders with holes instead of failing outright.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// An operator or function found too few values on the stack
    #[error("not enough operands for '{0}'")]
    StackUnderflow(&'static str),

    /// Division by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Argument is outside the domain of the given operation
    #[error("argument outside the domain of '{0}'")]
    Domain(&'static str),

    /// Operand text is not a valid number
    #[error("invalid numeric literal '{0}'")]
    BadLiteral(String),

    /// Variable is used by the program but not bound in the context
    #[error("variable {0} is not bound")]
    UnboundVar(Var),

    /// Value stack did not reduce to exactly one value
    #[error("expected one value on the stack after evaluation, found {0}")]
    Malformed(usize),
}

/// Universal error type for Planar
#[derive(Error, Debug)]
pub enum Error {
    /// Expression could not be compiled; see inner error for details
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Expression could not be evaluated; see inner error for details
    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),

    /// Domain bounds must be finite with `min < max`
    #[error("invalid domain [{min}, {max}]")]
    BadDomain {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },

    /// At least two base samples are needed to form an interval
    #[error("bad sample count {0}; must be at least 2")]
    BadSampleCount(usize),

    /// Recursion depth exceeds [`MAX_DEPTH`](crate::sample::MAX_DEPTH)
    #[error("bad recursion depth {0}; must be at most {}", crate::sample::MAX_DEPTH)]
    BadDepth(u8),

    /// Derivative threshold must be finite and positive
    #[error("bad derivative threshold {0}; must be finite and positive")]
    BadThreshold(f64),

    /// Grid dimensions do not match the number of vertices
    #[error("grid of {rows} × {cols} does not match vertex count {len}")]
    BadGrid {
        /// Number of rows
        rows: usize,
        /// Number of columns
        cols: usize,
        /// Number of vertices
        len: usize,
    },

    /// Vertex count does not fit in a 32-bit index buffer
    #[error("too many vertices ({0}) for a 32-bit index buffer")]
    MeshTooLarge(usize),

    /// IO error; see inner code for details
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}
