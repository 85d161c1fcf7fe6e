//! Postfix evaluation and variable binding
//!
//! The [`Evaluator`] is a small stack machine which runs a compiled
//! [`Program`] against an evaluation context ([`Vars`]).  It carries no state
//! between calls other than its scratch stack, so it's typically built once
//! per thread and reused for every point that thread evaluates.
//!
//! ```
//! use planar::{eval::Evaluator, expr::compile, var::Vars};
//!
//! let program = compile("x^2 + y")?;
//! let mut eval = Evaluator::new();
//! assert_eq!(eval.eval(&program, &Vars::xy(3.0, 1.0))?, 10.0);
//! assert_eq!(eval.eval(&program, &Vars::xy(2.0, 0.5))?, 4.5);
//! # Ok::<(), planar::Error>(())
//! ```
//!
//! Two ways of binding variables are supported:
//!
//! - [`Expression`] compiles once and rebinds variable slots before each
//!   call.  This is what the sampler uses.
//! - [`substitute`] and [`eval_substituted`] rewrite the expression text with
//!   literal values and compile it from scratch.  This is simpler, but
//!   re-parses on every call, so it's only suitable for a handful of points.
mod bind;

pub use bind::{Expression, Slice, eval_substituted, substitute};

use crate::{
    error::EvalError,
    expr::{BinaryOpcode, Function, Operand, Program, Token},
    var::Vars,
};

/// Stack-machine evaluator for postfix programs
#[derive(Clone, Debug, Default)]
pub struct Evaluator {
    stack: Vec<f64>,
}

impl Evaluator {
    /// Builds a new evaluator with an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates a program with the given variable bindings
    ///
    /// Invalid literals are skipped and evaluation continues without them;
    /// if any were seen, the first one is returned as
    /// [`EvalError::BadLiteral`] in place of the result or of any later
    /// error (e.g. an underflow caused by the missing operand).  Any other
    /// error aborts this evaluation.  The program itself remains valid and may be evaluated
    /// again with different bindings.
    pub fn eval(
        &mut self,
        program: &Program,
        vars: &Vars,
    ) -> Result<f64, EvalError> {
        let mut bad = None;
        let out = self.run(program, vars, &mut bad);
        match bad {
            Some(text) => Err(EvalError::BadLiteral(text)),
            None => out,
        }
    }

    fn run(
        &mut self,
        program: &Program,
        vars: &Vars,
        bad: &mut Option<String>,
    ) -> Result<f64, EvalError> {
        self.stack.clear();
        self.stack.reserve(program.stack_size());

        for t in program.tokens() {
            match t {
                Token::Operand(Operand::Literal { text, value }) => {
                    match value {
                        Some(v) => self.stack.push(*v),
                        None => {
                            log::trace!("skipping invalid literal '{text}'");
                            bad.get_or_insert_with(|| text.clone());
                        }
                    }
                }
                Token::Operand(Operand::Var { var, negated }) => {
                    let v = vars.get(*var).ok_or(EvalError::UnboundVar(*var))?;
                    self.stack.push(if *negated { -v } else { v });
                }
                Token::Binary(op) => {
                    let underflow = || EvalError::StackUnderflow(op.symbol());
                    let rhs = self.stack.pop().ok_or_else(underflow)?;
                    let lhs = self.stack.pop().ok_or_else(underflow)?;
                    self.stack.push(binary(*op, lhs, rhs)?);
                }
                Token::Function(f) => {
                    let arg = self
                        .stack
                        .pop()
                        .ok_or(EvalError::StackUnderflow(f.name()))?;
                    self.stack.push(function(*f, arg)?);
                }
                Token::Neg => {
                    let arg = self
                        .stack
                        .pop()
                        .ok_or(EvalError::StackUnderflow("neg"))?;
                    self.stack.push(-arg);
                }
            }
        }

        match self.stack.as_slice() {
            [v] => Ok(*v),
            s => Err(EvalError::Malformed(s.len())),
        }
    }

    /// Evaluates a program, mapping any error to `NaN`
    ///
    /// This is the lenient policy used while sampling: a bad point becomes a
    /// hole in the output rather than failing the whole pass.
    pub fn eval_or_nan(&mut self, program: &Program, vars: &Vars) -> f64 {
        match self.eval(program, vars) {
            Ok(v) => v,
            Err(e) => {
                log::trace!("evaluation failed at {vars:?}: {e}");
                f64::NAN
            }
        }
    }
}

fn binary(op: BinaryOpcode, lhs: f64, rhs: f64) -> Result<f64, EvalError> {
    let out = match op {
        BinaryOpcode::Add => lhs + rhs,
        BinaryOpcode::Sub => lhs - rhs,
        BinaryOpcode::Mul => lhs * rhs,
        BinaryOpcode::Div => {
            if rhs == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            lhs / rhs
        }
        BinaryOpcode::Pow => {
            if lhs == 0.0 && rhs < 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            let v = lhs.powf(rhs);
            if v.is_nan() && !lhs.is_nan() && !rhs.is_nan() {
                return Err(EvalError::Domain(op.symbol()));
            }
            v
        }
    };
    Ok(out)
}

fn function(f: Function, arg: f64) -> Result<f64, EvalError> {
    let out = match f {
        Function::Sin => arg.sin(),
        Function::Cos => arg.cos(),
        Function::Tan => arg.tan(),
        Function::Log => {
            if arg <= 0.0 {
                return Err(EvalError::Domain(f.name()));
            }
            arg.log10()
        }
    };
    if out.is_nan() && !arg.is_nan() {
        // e.g. sin(inf)
        Err(EvalError::Domain(f.name()))
    } else {
        Ok(out)
    }
}
