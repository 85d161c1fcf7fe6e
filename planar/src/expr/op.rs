use crate::var::Var;

/// A two-argument infix operator
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
    strum::IntoStaticStr,
    strum::EnumIter,
)]
pub enum BinaryOpcode {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "^")]
    Pow,
}

impl BinaryOpcode {
    /// Parses an operator character
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Self::Add),
            '-' => Some(Self::Sub),
            '*' => Some(Self::Mul),
            '/' => Some(Self::Div),
            '^' => Some(Self::Pow),
            _ => None,
        }
    }

    /// Binding strength; all operators are left-associative
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div => 2,
            Self::Pow => 3,
        }
    }

    /// Returns the operator's symbol
    pub fn symbol(&self) -> &'static str {
        self.into()
    }
}

/// A named single-argument function
///
/// Trigonometric functions work in radians; `log` is base 10.
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
    strum::EnumString,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Log,
}

impl Function {
    /// Returns the function's name in expression text
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// Precedence given to prefix operations (functions and grouped negation)
///
/// This is higher than any binary operator, so a prefix operation is applied
/// to the operand (or parenthesized group) that immediately follows it.
pub(crate) const PREFIX_PRECEDENCE: u8 = 4;

/// A value pushed onto the evaluation stack
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// Numeric literal, with any folded unary minus included in `text`
    ///
    /// `value` is `None` if `text` isn't a valid number; this is reported
    /// when the literal is evaluated, not when it is compiled.
    Literal {
        /// Literal text, as written
        text: String,
        /// Parsed value
        value: Option<f64>,
    },
    /// Free variable, optionally negated by a folded unary minus
    Var {
        /// Variable to read from the evaluation context
        var: Var,
        /// Whether to negate the bound value
        negated: bool,
    },
}

impl Operand {
    pub(crate) fn literal(text: String) -> Self {
        let value = text.parse().ok();
        Operand::Literal { text, value }
    }
}

/// A single postfix instruction
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// Pushes a value
    Operand(Operand),
    /// Pops two values and pushes the result
    Binary(BinaryOpcode),
    /// Pops one value and pushes the result
    Function(Function),
    /// Pops one value and pushes its negation
    ///
    /// This is only emitted for a unary minus that can't be folded into an
    /// operand, i.e. one in front of a parenthesized group or a function call.
    Neg,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Operand(Operand::Literal { text, .. }) => write!(f, "{text}"),
            Token::Operand(Operand::Var { var, negated }) => {
                if *negated {
                    write!(f, "-")?;
                }
                write!(f, "{}", var.name())
            }
            Token::Binary(op) => write!(f, "{}", op.symbol()),
            Token::Function(func) => write!(f, "{}", func.name()),
            Token::Neg => write!(f, "neg"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_symbols() {
        for op in BinaryOpcode::iter() {
            let mut chars = op.symbol().chars();
            let c = chars.next().unwrap();
            assert!(chars.next().is_none());
            assert_eq!(BinaryOpcode::from_char(c), Some(op));
        }
        assert_eq!(BinaryOpcode::from_char('%'), None);
    }

    #[test]
    fn test_function_names() {
        for f in Function::iter() {
            assert_eq!(f.name().parse::<Function>(), Ok(f));
        }
        assert!("Sin".parse::<Function>().is_err());
        assert!("sqrt".parse::<Function>().is_err());
    }
}
