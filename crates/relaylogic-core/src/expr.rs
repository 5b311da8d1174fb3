//! A small arithmetic expression compiler for the math element.
//!
//! Expressions are parsed once at element construction into an AST and
//! evaluated per tick against the variable slots `x0..x(N-1)`. The grammar
//! covers `+ - * / % ^`, unary sign, parentheses, numeric literals, the
//! constants `pi` and `e`, and a fixed function set.

use std::fmt;

/// Why an expression failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    /// Unexpected character at byte offset.
    UnexpectedChar(usize),
    /// Input ended mid-expression.
    UnexpectedEnd,
    /// Identifier is not a variable, constant, or function.
    UnknownIdentifier(String),
    /// Variable index at or past the declared variable count.
    VariableOutOfRange(String),
    /// A function was called with the wrong number of arguments.
    WrongArity(&'static str),
    /// Trailing input after a complete expression.
    TrailingInput(usize),
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedChar(pos) => write!(f, "unexpected character at offset {pos}"),
            Self::UnexpectedEnd => write!(f, "unexpected end of expression"),
            Self::UnknownIdentifier(name) => write!(f, "unknown identifier '{name}'"),
            Self::VariableOutOfRange(name) => write!(f, "variable '{name}' out of range"),
            Self::WrongArity(name) => write!(f, "wrong number of arguments to '{name}'"),
            Self::TrailingInput(pos) => write!(f, "trailing input at offset {pos}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sqrt,
    Ln,
    Log10,
    Exp,
    Abs,
    Floor,
    Ceil,
    Pow,
    Atan2,
    Min,
    Max,
}

impl Func {
    fn lookup(name: &str) -> Option<(Self, usize)> {
        Some(match name {
            "sin" => (Self::Sin, 1),
            "cos" => (Self::Cos, 1),
            "tan" => (Self::Tan, 1),
            "asin" => (Self::Asin, 1),
            "acos" => (Self::Acos, 1),
            "atan" => (Self::Atan, 1),
            "sqrt" => (Self::Sqrt, 1),
            "ln" => (Self::Ln, 1),
            "log10" => (Self::Log10, 1),
            "exp" => (Self::Exp, 1),
            "abs" => (Self::Abs, 1),
            "floor" => (Self::Floor, 1),
            "ceil" => (Self::Ceil, 1),
            "pow" => (Self::Pow, 2),
            "atan2" => (Self::Atan2, 2),
            "min" => (Self::Min, 2),
            "max" => (Self::Max, 2),
            _ => return None,
        })
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Asin => "asin",
            Self::Acos => "acos",
            Self::Atan => "atan",
            Self::Sqrt => "sqrt",
            Self::Ln => "ln",
            Self::Log10 => "log10",
            Self::Exp => "exp",
            Self::Abs => "abs",
            Self::Floor => "floor",
            Self::Ceil => "ceil",
            Self::Pow => "pow",
            Self::Atan2 => "atan2",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    fn apply(&self, args: &[f32]) -> f32 {
        match self {
            Self::Sin => args[0].sin(),
            Self::Cos => args[0].cos(),
            Self::Tan => args[0].tan(),
            Self::Asin => args[0].asin(),
            Self::Acos => args[0].acos(),
            Self::Atan => args[0].atan(),
            Self::Sqrt => args[0].sqrt(),
            Self::Ln => args[0].ln(),
            Self::Log10 => args[0].log10(),
            Self::Exp => args[0].exp(),
            Self::Abs => args[0].abs(),
            Self::Floor => args[0].floor(),
            Self::Ceil => args[0].ceil(),
            Self::Pow => args[0].powf(args[1]),
            Self::Atan2 => args[0].atan2(args[1]),
            Self::Min => args[0].min(args[1]),
            Self::Max => args[0].max(args[1]),
        }
    }
}

#[derive(Debug, Clone)]
enum Ast {
    Const(f32),
    Var(usize),
    Neg(Box<Ast>),
    Add(Box<Ast>, Box<Ast>),
    Sub(Box<Ast>, Box<Ast>),
    Mul(Box<Ast>, Box<Ast>),
    Div(Box<Ast>, Box<Ast>),
    Rem(Box<Ast>, Box<Ast>),
    Pow(Box<Ast>, Box<Ast>),
    Call(Func, Vec<Ast>),
}

/// A compiled expression over `n_vars` variable slots.
#[derive(Debug, Clone)]
pub struct Expr {
    root: Ast,
}

impl Expr {
    /// Parse `src` against `n_vars` variables `x0..x(n_vars-1)`.
    pub fn parse(src: &str, n_vars: usize) -> Result<Self, ExprError> {
        let mut parser = Parser {
            src: src.as_bytes(),
            pos: 0,
            n_vars,
        };
        let root = parser.expression()?;
        parser.skip_whitespace();
        if parser.pos != parser.src.len() {
            return Err(ExprError::TrailingInput(parser.pos));
        }
        Ok(Self { root })
    }

    /// Evaluate against the variable slots. Slots past `vars.len()` read 0.
    pub fn eval(&self, vars: &[f32]) -> f32 {
        Self::eval_node(&self.root, vars)
    }

    fn eval_node(node: &Ast, vars: &[f32]) -> f32 {
        match node {
            Ast::Const(v) => *v,
            Ast::Var(i) => vars.get(*i).copied().unwrap_or(0.0),
            Ast::Neg(a) => -Self::eval_node(a, vars),
            Ast::Add(a, b) => Self::eval_node(a, vars) + Self::eval_node(b, vars),
            Ast::Sub(a, b) => Self::eval_node(a, vars) - Self::eval_node(b, vars),
            Ast::Mul(a, b) => Self::eval_node(a, vars) * Self::eval_node(b, vars),
            Ast::Div(a, b) => Self::eval_node(a, vars) / Self::eval_node(b, vars),
            Ast::Rem(a, b) => Self::eval_node(a, vars) % Self::eval_node(b, vars),
            Ast::Pow(a, b) => Self::eval_node(a, vars).powf(Self::eval_node(b, vars)),
            Ast::Call(func, args) => {
                let values: Vec<f32> = args.iter().map(|a| Self::eval_node(a, vars)).collect();
                func.apply(&values)
            }
        }
    }
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
    n_vars: usize,
}

impl Parser<'_> {
    fn skip_whitespace(&mut self) {
        while self.pos < self.src.len() && self.src[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.src.get(self.pos).copied()
    }

    fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<Ast, ExprError> {
        let mut lhs = self.term()?;
        loop {
            if self.eat(b'+') {
                lhs = Ast::Add(Box::new(lhs), Box::new(self.term()?));
            } else if self.eat(b'-') {
                lhs = Ast::Sub(Box::new(lhs), Box::new(self.term()?));
            } else {
                return Ok(lhs);
            }
        }
    }

    /// term := unary (('*' | '/' | '%') unary)*
    fn term(&mut self) -> Result<Ast, ExprError> {
        let mut lhs = self.unary()?;
        loop {
            if self.eat(b'*') {
                lhs = Ast::Mul(Box::new(lhs), Box::new(self.unary()?));
            } else if self.eat(b'/') {
                lhs = Ast::Div(Box::new(lhs), Box::new(self.unary()?));
            } else if self.eat(b'%') {
                lhs = Ast::Rem(Box::new(lhs), Box::new(self.unary()?));
            } else {
                return Ok(lhs);
            }
        }
    }

    /// unary := ('+' | '-')* power
    fn unary(&mut self) -> Result<Ast, ExprError> {
        if self.eat(b'-') {
            return Ok(Ast::Neg(Box::new(self.unary()?)));
        }
        if self.eat(b'+') {
            return self.unary();
        }
        self.power()
    }

    /// power := atom ('^' unary)?   (right-associative)
    fn power(&mut self) -> Result<Ast, ExprError> {
        let base = self.atom()?;
        if self.eat(b'^') {
            let exponent = self.unary()?;
            return Ok(Ast::Pow(Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Ast, ExprError> {
        match self.peek() {
            None => Err(ExprError::UnexpectedEnd),
            Some(b'(') => {
                self.pos += 1;
                let inner = self.expression()?;
                if !self.eat(b')') {
                    Err(ExprError::UnexpectedEnd)
                } else {
                    Ok(inner)
                }
            }
            Some(c) if c.is_ascii_digit() || c == b'.' => self.number(),
            Some(c) if c.is_ascii_alphabetic() || c == b'_' => self.identifier(),
            Some(_) => Err(ExprError::UnexpectedChar(self.pos)),
        }
    }

    fn number(&mut self) -> Result<Ast, ExprError> {
        let start = self.pos;
        while self.pos < self.src.len()
            && (self.src[self.pos].is_ascii_digit() || self.src[self.pos] == b'.')
        {
            self.pos += 1;
        }
        // Exponent suffix: 1e-3, 2.5E4.
        if self.pos < self.src.len() && (self.src[self.pos] | 0x20) == b'e' {
            let mut ahead = self.pos + 1;
            if ahead < self.src.len() && (self.src[ahead] == b'+' || self.src[ahead] == b'-') {
                ahead += 1;
            }
            if ahead < self.src.len() && self.src[ahead].is_ascii_digit() {
                self.pos = ahead;
                while self.pos < self.src.len() && self.src[self.pos].is_ascii_digit() {
                    self.pos += 1;
                }
            }
        }

        let text = std::str::from_utf8(&self.src[start..self.pos]).expect("ascii slice");
        text.parse::<f32>()
            .map(Ast::Const)
            .map_err(|_| ExprError::UnexpectedChar(start))
    }

    fn identifier(&mut self) -> Result<Ast, ExprError> {
        let start = self.pos;
        while self.pos < self.src.len()
            && (self.src[self.pos].is_ascii_alphanumeric() || self.src[self.pos] == b'_')
        {
            self.pos += 1;
        }
        let name = std::str::from_utf8(&self.src[start..self.pos]).expect("ascii slice");

        // Variable slots: x0, x1, ...
        if let Some(index) = name.strip_prefix('x').and_then(|d| d.parse::<usize>().ok()) {
            if index >= self.n_vars {
                return Err(ExprError::VariableOutOfRange(name.to_string()));
            }
            return Ok(Ast::Var(index));
        }

        match name {
            "pi" => return Ok(Ast::Const(std::f32::consts::PI)),
            "e" => return Ok(Ast::Const(std::f32::consts::E)),
            _ => {}
        }

        let Some((func, arity)) = Func::lookup(name) else {
            return Err(ExprError::UnknownIdentifier(name.to_string()));
        };

        if !self.eat(b'(') {
            return Err(ExprError::WrongArity(func.name()));
        }
        let mut args = vec![self.expression()?];
        while self.eat(b',') {
            args.push(self.expression()?);
        }
        if !self.eat(b')') {
            return Err(ExprError::UnexpectedEnd);
        }
        if args.len() != arity {
            return Err(ExprError::WrongArity(func.name()));
        }
        Ok(Ast::Call(func, args))
    }
}
