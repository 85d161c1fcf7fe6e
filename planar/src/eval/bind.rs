use super::Evaluator;
use crate::{
    Error,
    error::{EvalError, ParseError},
    expr::{Program, compile},
    sample::SampleFn,
    var::{Var, Vars},
};

/// An expression which is compiled once and evaluated with bound variables
#[derive(Clone, Debug)]
pub struct Expression {
    text: String,
    program: Program,
}

impl Expression {
    /// Compiles the given expression text
    pub fn new(text: &str) -> Result<Self, ParseError> {
        let program = compile(text)?;
        Ok(Self {
            text: text.to_owned(),
            program,
        })
    }

    /// Returns the original expression text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the compiled program
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Evaluates the expression using a temporary evaluator
    ///
    /// When evaluating many points, prefer [`Expression::eval_with`] and reuse
    /// the evaluator.
    pub fn eval(&self, vars: &Vars) -> Result<f64, EvalError> {
        self.eval_with(vars, &mut Evaluator::new())
    }

    /// Evaluates the expression with the given evaluator
    pub fn eval_with(
        &self,
        vars: &Vars,
        eval: &mut Evaluator,
    ) -> Result<f64, EvalError> {
        eval.eval(&self.program, vars)
    }

    /// Returns a one-dimensional view of this expression
    ///
    /// The view varies `axis` and holds every other variable at its value in
    /// `fixed`.
    pub fn slice(&self, axis: Var, fixed: Vars) -> Slice<'_> {
        Slice {
            program: &self.program,
            axis,
            fixed,
        }
    }
}

/// One-dimensional view of a compiled expression, used for sampling
///
/// Evaluation failures produce `NaN`.
#[derive(Copy, Clone, Debug)]
pub struct Slice<'a> {
    program: &'a Program,
    axis: Var,
    fixed: Vars,
}

impl SampleFn for Slice<'_> {
    type Data = Evaluator;

    fn eval(&self, t: f64, data: &mut Evaluator) -> f64 {
        let vars = self.fixed.with(self.axis, t);
        data.eval_or_nan(self.program, &vars)
    }
}

/// Replaces every bound variable in the expression with its literal value
///
/// Each value is wrapped in parentheses, so negative values keep their sign.
/// Unbound variables and other identifiers are left untouched.
///
/// ```
/// use planar::{eval::substitute, var::Vars};
///
/// let s = substitute("x*sin(y) - x", &Vars::xy(2.0, -0.5));
/// assert_eq!(s, "(2)*sin((-0.5)) - (2)");
/// ```
pub fn substitute(text: &str, vars: &Vars) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = String::new();
    let flush = |run: &mut String, out: &mut String| {
        match Var::from_name(run).and_then(|v| vars.get(v)) {
            Some(value) => {
                out.push('(');
                out.push_str(&value.to_string());
                out.push(')');
            }
            None => out.push_str(run),
        }
        run.clear();
    };
    for c in text.chars() {
        if c.is_ascii_alphanumeric() || c == '.' {
            run.push(c);
        } else {
            flush(&mut run, &mut out);
            out.push(c);
        }
    }
    flush(&mut run, &mut out);
    out
}

/// Evaluates an expression by textual substitution
///
/// The expression is rewritten with [`substitute`], then compiled and
/// evaluated from scratch.  Variables which aren't bound in `vars` are
/// reported as [`EvalError::UnboundVar`].
pub fn eval_substituted(text: &str, vars: &Vars) -> Result<f64, Error> {
    let program = compile(&substitute(text, vars))?;
    let v = Evaluator::new().eval(&program, &Vars::new())?;
    Ok(v)
}
