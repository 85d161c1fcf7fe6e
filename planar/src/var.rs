//! Free variables and their bindings
//!
//! A [`Var`] names one of the three free variables an expression may use.  At
//! evaluation time, a [`Vars`] context maps each variable to its current value;
//! the caller mutates the context between calls and the evaluator only reads
//! from it.
use serde::{Deserialize, Serialize};

/// A free variable in an expression
#[allow(missing_docs)]
#[derive(
    Copy,
    Clone,
    Debug,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Serialize,
    Deserialize,
)]
pub enum Var {
    X,
    Y,
    Z,
}

impl Var {
    /// Looks up a variable by its name in expression text
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "x" => Some(Var::X),
            "y" => Some(Var::Y),
            "z" => Some(Var::Z),
            _ => None,
        }
    }

    /// Returns the name used for this variable in expression text
    pub fn name(&self) -> &'static str {
        match self {
            Var::X => "x",
            Var::Y => "y",
            Var::Z => "z",
        }
    }

    fn index(&self) -> usize {
        match self {
            Var::X => 0,
            Var::Y => 1,
            Var::Z => 2,
        }
    }
}

impl std::fmt::Display for Var {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Var::X => write!(f, "X"),
            Var::Y => write!(f, "Y"),
            Var::Z => write!(f, "Z"),
        }
    }
}

/// Evaluation context, binding each [`Var`] to an optional value
///
/// Unbound variables are reported as an
/// [`EvalError::UnboundVar`](crate::EvalError::UnboundVar) if a program reads
/// them.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vars {
    values: [Option<f64>; 3],
}

impl Vars {
    /// Builds a new context with every variable unbound
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a context with `x` and `y` bound
    pub fn xy(x: f64, y: f64) -> Self {
        Self::new().with(Var::X, x).with(Var::Y, y)
    }

    /// Builds a context with `x`, `y`, and `z` bound
    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self::xy(x, y).with(Var::Z, z)
    }

    /// Returns a copy of this context with the given variable bound
    pub fn with(mut self, v: Var, value: f64) -> Self {
        self.set(v, value);
        self
    }

    /// Binds a variable, replacing any previous value
    pub fn set(&mut self, v: Var, value: f64) {
        self.values[v.index()] = Some(value);
    }

    /// Removes the binding for a variable
    pub fn unset(&mut self, v: Var) {
        self.values[v.index()] = None;
    }

    /// Looks up the current value of a variable
    pub fn get(&self, v: Var) -> Option<f64> {
        self.values[v.index()]
    }

    /// Iterates over bound variables and their values
    pub fn iter(&self) -> impl Iterator<Item = (Var, f64)> + '_ {
        [Var::X, Var::Y, Var::Z]
            .into_iter()
            .filter_map(|v| self.get(v).map(|value| (v, value)))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_var_names() {
        for v in [Var::X, Var::Y, Var::Z] {
            assert_eq!(Var::from_name(v.name()), Some(v));
        }
        assert_eq!(Var::from_name("w"), None);
        assert_eq!(Var::from_name("X"), None);
    }

    #[test]
    fn test_vars_binding() {
        let mut vars = Vars::xy(1.0, 2.0);
        assert_eq!(vars.get(Var::X), Some(1.0));
        assert_eq!(vars.get(Var::Y), Some(2.0));
        assert_eq!(vars.get(Var::Z), None);

        vars.set(Var::X, 3.0);
        vars.unset(Var::Y);
        assert_eq!(vars.iter().collect::<Vec<_>>(), vec![(Var::X, 3.0)]);
    }
}
