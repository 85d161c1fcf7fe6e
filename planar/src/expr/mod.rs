//! Expression compilation
//!
//! An expression is written in infix notation using decimal literals, the
//! operators `+ - * / ^`, parentheses, the free variables `x`, `y`, `z`, and
//! the functions `sin`, `cos`, `tan`, and `log` (base 10).
//!
//! [`compile`] turns the expression text into a [`Program`]: a sequence of
//! postfix [`Token`]s which is compiled once and then evaluated many times.
//!
//! ```
//! use planar::expr::compile;
//!
//! let program = compile("(2 + 3) * x")?;
//! assert_eq!(program.to_string(), "2 3 + x *");
//! # Ok::<(), planar::Error>(())
//! ```
mod op;
mod parse;

pub use op::{BinaryOpcode, Function, Operand, Token};

use crate::{error::ParseError, var::Var};
use std::sync::Arc;

/// A compiled expression, as postfix tokens
///
/// Programs are immutable and cheap to clone, so a single program can be
/// shared between any number of evaluating threads.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    tokens: Arc<[Token]>,
    stack_size: usize,
}

impl Program {
    fn new(tokens: Vec<Token>) -> Self {
        // Simulate the stack to find its peak size, ignoring underflow (which
        // is reported during evaluation)
        let mut depth = 0usize;
        let mut stack_size = 0;
        for t in &tokens {
            match t {
                Token::Operand(..) => depth += 1,
                Token::Binary(..) => depth = depth.saturating_sub(2) + 1,
                Token::Function(..) | Token::Neg => {
                    depth = depth.saturating_sub(1) + 1
                }
            }
            stack_size = stack_size.max(depth);
        }
        Self {
            tokens: tokens.into(),
            stack_size,
        }
    }

    /// Returns the postfix tokens
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Returns the number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Checks whether the program has no tokens
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Peak number of values on the stack during evaluation
    pub fn stack_size(&self) -> usize {
        self.stack_size
    }

    /// Checks whether the program reads the given variable
    pub fn uses(&self, v: Var) -> bool {
        self.tokens.iter().any(|t| {
            matches!(t, Token::Operand(Operand::Var { var, .. }) if *var == v)
        })
    }
}

/// Prints the program in postfix notation, with space-separated tokens
impl std::fmt::Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for t in self.tokens.iter() {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{t}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::str::FromStr for Program {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        compile(s)
    }
}

/// Compiles an infix expression into a postfix [`Program`]
///
/// Structural problems (unbalanced parentheses, unknown identifiers, empty
/// input) are reported here.  Problems that only show up when running the
/// program, e.g. an invalid numeric literal or a missing operand, are
/// reported by the [evaluator](crate::eval::Evaluator).
pub fn compile(text: &str) -> Result<Program, ParseError> {
    let tokens = parse::to_postfix(text)?;
    log::debug!("compiled '{text}' into {} tokens", tokens.len());
    Ok(Program::new(tokens))
}
