//! Infix-to-postfix conversion (shunting-yard)
use super::op::{BinaryOpcode, Function, Operand, PREFIX_PRECEDENCE, Token};
use crate::{error::ParseError, var::Var};

/// Entry on the operator stack
#[derive(Copy, Clone, Debug)]
enum Stacked {
    Open,
    Binary(BinaryOpcode),
    Function(Function),
    Neg,
}

impl Stacked {
    /// Returns the precedence, or `None` for an open parenthesis (which acts
    /// as a barrier when popping)
    fn precedence(&self) -> Option<u8> {
        match self {
            Stacked::Open => None,
            Stacked::Binary(op) => Some(op.precedence()),
            Stacked::Function(..) | Stacked::Neg => Some(PREFIX_PRECEDENCE),
        }
    }

    fn token(self) -> Option<Token> {
        match self {
            Stacked::Open => None,
            Stacked::Binary(op) => Some(Token::Binary(op)),
            Stacked::Function(f) => Some(Token::Function(f)),
            Stacked::Neg => Some(Token::Neg),
        }
    }
}

/// Most recent significant item, used to classify `-` as unary or binary
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Prev {
    Start,
    Open,
    Operator,
    Function,
    Operand,
    Close,
}

impl Prev {
    /// A `-` in this position is a sign rather than a subtraction
    fn expects_operand(&self) -> bool {
        matches!(self, Prev::Start | Prev::Open | Prev::Operator | Prev::Function)
    }
}

struct Parser {
    out: Vec<Token>,
    stack: Vec<Stacked>,

    /// Alphanumeric run that has not yet been classified
    pending: String,

    /// Unary minus waiting to be folded into the next operand
    sign: bool,

    prev: Prev,
}

impl Parser {
    fn new() -> Self {
        Self {
            out: vec![],
            stack: vec![],
            pending: String::new(),
            sign: false,
            prev: Prev::Start,
        }
    }

    /// Classifies the pending run as a literal, variable, or function name
    fn flush(&mut self) -> Result<(), ParseError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let run = std::mem::take(&mut self.pending);
        let sign = std::mem::take(&mut self.sign);
        if run.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
            let text = if sign { format!("-{run}") } else { run };
            self.out.push(Token::Operand(Operand::literal(text)));
            self.prev = Prev::Operand;
        } else if let Some(var) = Var::from_name(&run) {
            self.out.push(Token::Operand(Operand::Var { var, negated: sign }));
            self.prev = Prev::Operand;
        } else if let Ok(f) = run.parse::<Function>() {
            if sign {
                self.stack.push(Stacked::Neg);
            }
            self.stack.push(Stacked::Function(f));
            self.prev = Prev::Function;
        } else {
            return Err(ParseError::UnknownIdentifier(run));
        }
        Ok(())
    }

    /// Emits a unary minus that has nothing to fold into
    ///
    /// The lone `-` becomes an invalid literal, which is reported when the
    /// program is evaluated.
    fn flush_dangling_sign(&mut self) {
        if std::mem::take(&mut self.sign) {
            self.out.push(Token::Operand(Operand::literal("-".to_owned())));
            self.prev = Prev::Operand;
        }
    }

    fn open(&mut self) {
        if std::mem::take(&mut self.sign) {
            self.stack.push(Stacked::Neg);
        }
        self.stack.push(Stacked::Open);
        self.prev = Prev::Open;
    }

    fn close(&mut self, pos: usize) -> Result<(), ParseError> {
        self.flush_dangling_sign();
        loop {
            match self.stack.pop() {
                Some(Stacked::Open) => break,
                Some(s) => self.out.extend(s.token()),
                None => return Err(ParseError::UnmatchedClose { pos }),
            }
        }
        // A group directly after a function (or grouped negation) is its
        // argument, so the prefix operation is complete
        if let Some(s @ (Stacked::Function(..) | Stacked::Neg)) =
            self.stack.last().copied()
        {
            self.stack.pop();
            self.out.extend(s.token());
        }
        self.prev = Prev::Close;
        Ok(())
    }

    fn operator(&mut self, op: BinaryOpcode) {
        if op == BinaryOpcode::Sub && self.prev.expects_operand() {
            self.sign = !self.sign;
            return;
        }
        self.flush_dangling_sign();
        let prec = op.precedence();
        while let Some(top) = self.stack.last().copied() {
            match top.precedence() {
                Some(p) if p >= prec => {
                    self.stack.pop();
                    self.out.extend(top.token());
                }
                _ => break,
            }
        }
        self.stack.push(Stacked::Binary(op));
        self.prev = Prev::Operator;
    }

    fn finish(mut self) -> Result<Vec<Token>, ParseError> {
        self.flush()?;
        self.flush_dangling_sign();
        while let Some(s) = self.stack.pop() {
            match s {
                Stacked::Open => return Err(ParseError::UnmatchedOpen),
                s => self.out.extend(s.token()),
            }
        }
        Ok(self.out)
    }
}

/// Converts an infix expression into a sequence of postfix tokens
///
/// A `-` is treated as a sign when it starts the expression or follows `(`,
/// another operator, or a function name; the sign is folded into the next
/// literal or variable.  In front of `(` or a function name, it becomes a
/// [`Token::Neg`] instead.
///
/// All binary operators are left-associative, so `2^3^2` is `(2^3)^2`.
pub(crate) fn to_postfix(text: &str) -> Result<Vec<Token>, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let mut p = Parser::new();
    for (pos, c) in text.char_indices() {
        if c.is_ascii_alphanumeric() || c == '.' {
            p.pending.push(c);
            continue;
        }
        p.flush()?;
        if c.is_whitespace() {
            continue;
        } else if c == '(' {
            p.open();
        } else if c == ')' {
            p.close(pos)?;
        } else if let Some(op) = BinaryOpcode::from_char(c) {
            p.operator(op);
        } else {
            return Err(ParseError::UnexpectedChar { c, pos });
        }
    }
    p.finish()
}
