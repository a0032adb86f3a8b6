//! Sandboxed arithmetic expressions for `custom` steps.
//!
//! Expressions are parsed once into an AST and evaluated per sample. Only the
//! variables `x`, `y`, `i` (sample index) and `n` (series length), the
//! constants `pi` and `e`, the operators `+ - * / % ^`, parentheses, and a
//! fixed function table are accepted. Anything else is a parse error.

use std::fmt;

use echem_core::{EchemError, Result};

/// Longest accepted expression source, in bytes.
const MAX_SOURCE_LEN: usize = 1024;

/// Deepest accepted nesting of sub-expressions.
const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Var {
    X,
    Y,
    Index,
    Len,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Func {
    Abs,
    Sqrt,
    Ln,
    Log10,
    Exp,
    Sin,
    Cos,
    Tan,
    Floor,
    Ceil,
    Round,
    Min,
    Max,
    Pow,
}

impl Func {
    fn lookup(name: &str) -> Option<Func> {
        Some(match name {
            "abs" => Func::Abs,
            "sqrt" => Func::Sqrt,
            "ln" | "log" => Func::Ln,
            "log10" => Func::Log10,
            "exp" => Func::Exp,
            "sin" => Func::Sin,
            "cos" => Func::Cos,
            "tan" => Func::Tan,
            "floor" => Func::Floor,
            "ceil" => Func::Ceil,
            "round" => Func::Round,
            "min" => Func::Min,
            "max" => Func::Max,
            "pow" => Func::Pow,
            _ => return None,
        })
    }

    fn arity(self) -> usize {
        match self {
            Func::Min | Func::Max | Func::Pow => 2,
            _ => 1,
        }
    }

    fn call(self, args: &[f64]) -> f64 {
        match self {
            Func::Abs => args[0].abs(),
            Func::Sqrt => args[0].sqrt(),
            Func::Ln => args[0].ln(),
            Func::Log10 => args[0].log10(),
            Func::Exp => args[0].exp(),
            Func::Sin => args[0].sin(),
            Func::Cos => args[0].cos(),
            Func::Tan => args[0].tan(),
            Func::Floor => args[0].floor(),
            Func::Ceil => args[0].ceil(),
            Func::Round => args[0].round(),
            Func::Min => args[0].min(args[1]),
            Func::Max => args[0].max(args[1]),
            Func::Pow => args[0].powf(args[1]),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Num(f64),
    Var(Var),
    Neg(Box<Node>),
    Bin(BinOp, Box<Node>, Box<Node>),
    Call(Func, Vec<Node>),
}

/// Values bound to the expression variables for one sample.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub index: usize,
    pub len: usize,
}

/// A parsed, evaluable expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    source: String,
    root: Node,
}

impl Expr {
    /// Parse an expression, rejecting anything outside the sandbox grammar.
    pub fn parse(source: &str) -> Result<Self> {
        if source.len() > MAX_SOURCE_LEN {
            return Err(EchemError::InvalidExpression(format!(
                "expression longer than {} bytes",
                MAX_SOURCE_LEN
            )));
        }
        let tokens = tokenize(source)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let root = parser.expr()?;
        if let Some(tok) = parser.peek() {
            return Err(EchemError::InvalidExpression(format!(
                "unexpected '{}' after end of expression",
                tok
            )));
        }
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn eval(&self, sample: Sample) -> f64 {
        eval_node(&self.root, &sample)
    }
}

fn eval_node(node: &Node, s: &Sample) -> f64 {
    match node {
        Node::Num(v) => *v,
        Node::Var(Var::X) => s.x,
        Node::Var(Var::Y) => s.y,
        Node::Var(Var::Index) => s.index as f64,
        Node::Var(Var::Len) => s.len as f64,
        Node::Neg(inner) => -eval_node(inner, s),
        Node::Bin(op, lhs, rhs) => {
            let a = eval_node(lhs, s);
            let b = eval_node(rhs, s);
            match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Div => a / b,
                BinOp::Rem => a % b,
                BinOp::Pow => a.powf(b),
            }
        }
        Node::Call(func, args) => {
            let values: Vec<f64> = args.iter().map(|a| eval_node(a, s)).collect();
            func.call(&values)
        }
    }
}

// ── Tokenizer ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Op(char),
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Num(v) => write!(f, "{}", v),
            Token::Ident(name) => write!(f, "{}", name),
            Token::Op(c) => write!(f, "{}", c),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_digit() || c == '.' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            // Exponent only when followed by a digit, so `2*e` still reads `e` as a constant.
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                let mut j = i + 1;
                if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    i = j;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let text: String = chars[start..i].iter().collect();
            let value = text.parse::<f64>().map_err(|_| {
                EchemError::InvalidExpression(format!("malformed number '{}'", text))
            })?;
            tokens.push(Token::Num(value));
        } else if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
        } else {
            tokens.push(match c {
                '+' | '-' | '*' | '/' | '%' | '^' => Token::Op(c),
                '(' => Token::LParen,
                ')' => Token::RParen,
                ',' => Token::Comma,
                other => {
                    return Err(EchemError::InvalidExpression(format!(
                        "unexpected character '{}'",
                        other
                    )))
                }
            });
            i += 1;
        }
    }

    if tokens.is_empty() {
        return Err(EchemError::InvalidExpression("expression is empty".to_string()));
    }
    Ok(tokens)
}

// ── Recursive-descent parser ────────────────────────────────────────

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.next() {
            Some(tok) if tok == expected => Ok(()),
            Some(tok) => Err(EchemError::InvalidExpression(format!(
                "expected '{}', found '{}'",
                expected, tok
            ))),
            None => Err(EchemError::InvalidExpression(format!(
                "expected '{}', found end of expression",
                expected
            ))),
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EchemError::InvalidExpression(format!(
                "expression nested deeper than {}",
                MAX_DEPTH
            )));
        }
        Ok(())
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<Node> {
        self.enter()?;
        let mut node = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.term()?;
            let op = if op == '+' { BinOp::Add } else { BinOp::Sub };
            node = Node::Bin(op, Box::new(node), Box::new(rhs));
        }
        self.depth -= 1;
        Ok(node)
    }

    // term := unary (('*' | '/' | '%') unary)*
    fn term(&mut self) -> Result<Node> {
        let mut node = self.unary()?;
        while let Some(Token::Op(op @ ('*' | '/' | '%'))) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.unary()?;
            let op = match op {
                '*' => BinOp::Mul,
                '/' => BinOp::Div,
                _ => BinOp::Rem,
            };
            node = Node::Bin(op, Box::new(node), Box::new(rhs));
        }
        Ok(node)
    }

    // unary := ('-' | '+') unary | power
    fn unary(&mut self) -> Result<Node> {
        match self.peek() {
            Some(Token::Op('-')) => {
                self.pos += 1;
                self.enter()?;
                let inner = self.unary()?;
                self.depth -= 1;
                Ok(Node::Neg(Box::new(inner)))
            }
            Some(Token::Op('+')) => {
                self.pos += 1;
                self.enter()?;
                let inner = self.unary();
                self.depth -= 1;
                inner
            }
            _ => self.power(),
        }
    }

    // power := atom ('^' unary)?   (right-associative)
    fn power(&mut self) -> Result<Node> {
        let base = self.atom()?;
        if let Some(Token::Op('^')) = self.peek() {
            self.pos += 1;
            self.enter()?;
            let exponent = self.unary()?;
            self.depth -= 1;
            return Ok(Node::Bin(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Node> {
        match self.next() {
            Some(Token::Num(v)) => Ok(Node::Num(v)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => {
                if let Some(Token::LParen) = self.peek() {
                    self.pos += 1;
                    return self.call(&name);
                }
                match name.as_str() {
                    "x" => Ok(Node::Var(Var::X)),
                    "y" => Ok(Node::Var(Var::Y)),
                    "i" => Ok(Node::Var(Var::Index)),
                    "n" => Ok(Node::Var(Var::Len)),
                    "pi" => Ok(Node::Num(std::f64::consts::PI)),
                    "e" => Ok(Node::Num(std::f64::consts::E)),
                    other => Err(EchemError::InvalidExpression(format!(
                        "unknown identifier '{}'",
                        other
                    ))),
                }
            }
            Some(tok) => Err(EchemError::InvalidExpression(format!(
                "unexpected '{}'",
                tok
            ))),
            None => Err(EchemError::InvalidExpression(
                "unexpected end of expression".to_string(),
            )),
        }
    }

    fn call(&mut self, name: &str) -> Result<Node> {
        let func = Func::lookup(name).ok_or_else(|| {
            EchemError::InvalidExpression(format!("unknown function '{}'", name))
        })?;
        let mut args = Vec::new();
        if let Some(Token::RParen) = self.peek() {
            self.pos += 1;
        } else {
            loop {
                args.push(self.expr()?);
                match self.next() {
                    Some(Token::Comma) => continue,
                    Some(Token::RParen) => break,
                    _ => {
                        return Err(EchemError::InvalidExpression(format!(
                            "unterminated argument list for '{}'",
                            name
                        )))
                    }
                }
            }
        }
        if args.len() != func.arity() {
            return Err(EchemError::InvalidExpression(format!(
                "'{}' takes {} argument(s), got {}",
                name,
                func.arity(),
                args.len()
            )));
        }
        Ok(Node::Call(func, args))
    }
}
