//! Textual aesthetic expressions.
//!
//! A mapping like `y = "log10(b) * 2"` is parsed into an [`Expr`] and
//! evaluated against a [`Namespace`]: the layer's columns first, then the
//! plot [`Environment`], then a few helper functions.
//!
//! Grammar (lowest to highest binding):
//!
//! ```text
//! expr   := or
//! or     := and ("||" and)*
//! and    := cmp ("&&" cmp)*
//! cmp    := sum (("==" | "!=" | "<" | "<=" | ">" | ">=") sum)*
//! sum    := prod (("+" | "-") prod)*
//! prod   := unary (("*" | "/" | "%") unary)*
//! unary  := ("-" | "!") unary | power
//! power  := atom ("^" | "**") unary
//! atom   := number | string | true | false | ident | ident "(" args ")" | "(" expr ")"
//! ```

use crate::color::Rgba;
use crate::data::{Categorical, Column, DataFrame, DataValue};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Values and namespaces
// ============================================================================

/// Result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A single value, broadcast on storage.
    Scalar(DataValue),
    /// One value per row.
    Column(Column),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Scalar(DataValue::Null) => "null",
            Self::Scalar(DataValue::Number(_)) => "number",
            Self::Scalar(DataValue::Bool(_)) => "bool",
            Self::Scalar(DataValue::Text(_)) => "text",
            Self::Scalar(DataValue::DateTime(_)) => "datetime",
            Self::Scalar(DataValue::Color(_)) => "color",
            Self::Column(c) => c.type_name(),
        }
    }
}

impl From<DataValue> for Value {
    fn from(v: DataValue) -> Self {
        Self::Scalar(v)
    }
}

impl From<Column> for Value {
    fn from(c: Column) -> Self {
        Self::Column(c)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Scalar(DataValue::Number(v))
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Self::Column(Column::Number(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Scalar(DataValue::from(v))
    }
}

/// Variables of the scope a plot was declared in.
///
/// Columns shadow environment variables of the same name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    vars: BTreeMap<String, Value>,
}

impl Environment {
    /// Create an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Bind a variable in place.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.vars.insert(name.to_string(), value.into());
    }

    /// Look a variable up.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }
}

/// Names visible to an expression.
#[derive(Debug, Clone, Copy)]
pub struct Namespace<'a> {
    data: &'a DataFrame,
    env: &'a Environment,
}

impl<'a> Namespace<'a> {
    /// Columns of `data` shadowing the variables of `env`.
    #[must_use]
    pub fn new(data: &'a DataFrame, env: &'a Environment) -> Self {
        Self { data, env }
    }

    /// Row count of the underlying data.
    #[must_use]
    pub fn nrow(&self) -> usize {
        self.data.nrow()
    }

    /// A column of the underlying data.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&'a Column> {
        self.data.get(name)
    }

    /// Resolve a name: columns first, then environment variables.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.data
            .get(name)
            .map(|c| Value::Column(c.clone()))
            .or_else(|| self.env.get(name).cloned())
    }
}

// ============================================================================
// Tokens and lexer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    EqEq,
    BangEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,
    Bang,
    LParen,
    RParen,
    Comma,
    Eof,
}

struct Lexer {
    source: Vec<char>,
    pos: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, String> {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.pos += 1;
            }
            let Some(ch) = self.advance() else { break };
            let token = match ch {
                '+' => Token::Plus,
                '-' => Token::Minus,
                '*' if self.eat('*') => Token::Caret,
                '*' => Token::Star,
                '/' => Token::Slash,
                '%' => Token::Percent,
                '^' => Token::Caret,
                '(' => Token::LParen,
                ')' => Token::RParen,
                ',' => Token::Comma,
                '=' if self.eat('=') => Token::EqEq,
                '!' if self.eat('=') => Token::BangEq,
                '!' => Token::Bang,
                '<' if self.eat('=') => Token::LtEq,
                '<' => Token::Lt,
                '>' if self.eat('=') => Token::GtEq,
                '>' => Token::Gt,
                '&' if self.eat('&') => Token::AndAnd,
                '|' if self.eat('|') => Token::OrOr,
                '"' | '\'' => self.string(ch)?,
                c if c.is_ascii_digit() || c == '.' => self.number(c)?,
                c if c.is_alphabetic() || c == '_' => self.ident(c),
                c => return Err(format!("unexpected character '{c}'")),
            };
            self.tokens.push(token);
        }
        self.tokens.push(Token::Eof);
        Ok(self.tokens)
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn string(&mut self, quote: char) -> Result<Token, String> {
        let mut s = String::new();
        loop {
            match self.advance() {
                Some(c) if c == quote => return Ok(Token::Str(s)),
                Some('\\') => match self.advance() {
                    Some(c) => s.push(c),
                    None => break,
                },
                Some(c) => s.push(c),
                None => break,
            }
        }
        Err("unterminated string literal".to_string())
    }

    fn number(&mut self, first: char) -> Result<Token, String> {
        let mut s = String::from(first);
        while let Some(c) = self.peek() {
            let exponent_sign = (c == '-' || c == '+') && s.ends_with(['e', 'E']);
            if c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || exponent_sign {
                s.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        s.parse()
            .map(Token::Number)
            .map_err(|_| format!("invalid number '{s}'"))
    }

    fn ident(&mut self, first: char) -> Token {
        let mut s = String::from(first);
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                s.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        Token::Ident(s)
    }
}

// ============================================================================
// AST and parser
// ============================================================================

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal.
    Number(f64),
    /// String literal.
    Str(String),
    /// Boolean literal.
    Bool(bool),
    /// Column or variable reference.
    Ident(String),
    /// Arithmetic negation.
    Neg(Box<Expr>),
    /// Logical negation.
    Not(Box<Expr>),
    /// Binary operation.
    Binary(BinOp, Box<Expr>, Box<Expr>),
    /// Helper function call.
    Call(String, Vec<Expr>),
}

impl Expr {
    /// Parse expression text.
    pub fn parse(source: &str) -> Result<Self, String> {
        let tokens = Lexer::new(source).tokenize()?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.parse_expr(0)?;
        match parser.peek() {
            Token::Eof => Ok(expr),
            tok => Err(format!("unexpected {tok:?} after expression")),
        }
    }

    /// Names of all identifiers referenced outside function position.
    #[must_use]
    pub fn identifiers(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Ident(name) => out.push(name),
            Self::Neg(e) | Self::Not(e) => e.collect_identifiers(out),
            Self::Binary(_, a, b) => {
                a.collect_identifiers(out);
                b.collect_identifiers(out);
            }
            Self::Call(_, args) => args.iter().for_each(|a| a.collect_identifiers(out)),
            Self::Number(_) | Self::Str(_) | Self::Bool(_) => {}
        }
    }

    /// Evaluate against a namespace.
    pub fn eval(&self, ns: &Namespace<'_>) -> Result<Value, String> {
        match self {
            Self::Number(v) => Ok(Value::Scalar(DataValue::Number(*v))),
            Self::Str(s) => Ok(Value::Scalar(DataValue::Text(s.clone()))),
            Self::Bool(b) => Ok(Value::Scalar(DataValue::Bool(*b))),
            Self::Ident(name) => ns
                .lookup(name)
                .ok_or_else(|| format!("name '{name}' is not defined")),
            Self::Neg(e) => map_numeric(&e.eval(ns)?, |v| -v),
            Self::Not(e) => map_bool(&e.eval(ns)?, |b| !b),
            Self::Binary(op, a, b) => binary(*op, &a.eval(ns)?, &b.eval(ns)?),
            Self::Call(name, args) => {
                let values = args
                    .iter()
                    .map(|a| a.eval(ns))
                    .collect::<Result<Vec<_>, _>>()?;
                call(name, &values)
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "'{s}'"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Ident(name) => f.write_str(name),
            Self::Neg(e) => write!(f, "-{e}"),
            Self::Not(e) => write!(f, "!{e}"),
            Self::Binary(op, a, b) => write!(f, "({a} {} {b})", op_symbol(*op)),
            Self::Call(name, args) => {
                let args: Vec<String> = args.iter().map(ToString::to_string).collect();
                write!(f, "{name}({})", args.join(", "))
            }
        }
    }
}

fn op_symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::Pow => "^",
        BinOp::Eq => "==",
        BinOp::Ne => "!=",
        BinOp::Lt => "<",
        BinOp::Le => "<=",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
        BinOp::And => "&&",
        BinOp::Or => "||",
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: &Token) -> Result<(), String> {
        let tok = self.advance();
        if &tok == expected {
            Ok(())
        } else {
            Err(format!("expected {expected:?}, found {tok:?}"))
        }
    }

    fn parse_expr(&mut self, min_bp: u8) -> Result<Expr, String> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let (op, left_bp, right_bp) = match self.peek() {
                Token::OrOr => (BinOp::Or, 1, 2),
                Token::AndAnd => (BinOp::And, 3, 4),
                Token::EqEq => (BinOp::Eq, 5, 6),
                Token::BangEq => (BinOp::Ne, 5, 6),
                Token::Lt => (BinOp::Lt, 7, 8),
                Token::LtEq => (BinOp::Le, 7, 8),
                Token::Gt => (BinOp::Gt, 7, 8),
                Token::GtEq => (BinOp::Ge, 7, 8),
                Token::Plus => (BinOp::Add, 9, 10),
                Token::Minus => (BinOp::Sub, 9, 10),
                Token::Star => (BinOp::Mul, 11, 12),
                Token::Slash => (BinOp::Div, 11, 12),
                Token::Percent => (BinOp::Mod, 11, 12),
                Token::Caret => (BinOp::Pow, 16, 15),
                _ => break,
            };
            if left_bp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_expr(right_bp)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr, String> {
        match self.advance() {
            Token::Number(v) => Ok(Expr::Number(v)),
            Token::Str(s) => Ok(Expr::Str(s)),
            Token::Ident(name) if name == "true" || name == "True" => Ok(Expr::Bool(true)),
            Token::Ident(name) if name == "false" || name == "False" => Ok(Expr::Bool(false)),
            Token::Ident(name) => {
                if self.peek() == &Token::LParen {
                    self.advance();
                    self.parse_call(name)
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            Token::LParen => {
                let inner = self.parse_expr(0)?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            // unary minus binds tighter than * but looser than ^
            Token::Minus => Ok(Expr::Neg(Box::new(self.parse_expr(13)?))),
            Token::Bang => Ok(Expr::Not(Box::new(self.parse_expr(13)?))),
            tok => Err(format!("expected expression, found {tok:?}")),
        }
    }

    fn parse_call(&mut self, name: String) -> Result<Expr, String> {
        let mut args = Vec::new();
        if self.peek() != &Token::RParen {
            loop {
                args.push(self.parse_expr(0)?);
                if self.peek() == &Token::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(&Token::RParen)?;
        Ok(Expr::Call(name, args))
    }
}

// ============================================================================
// Evaluation
// ============================================================================

enum Nums {
    One(f64),
    Many(Vec<f64>),
}

fn numeric(v: &Value) -> Result<Nums, String> {
    match v {
        Value::Scalar(DataValue::Null) => Ok(Nums::One(f64::NAN)),
        Value::Scalar(s) => s
            .as_f64()
            .map(Nums::One)
            .ok_or_else(|| format!("expected a number, got {}", v.type_name())),
        Value::Column(c) => c
            .to_numbers()
            .map(Nums::Many)
            .ok_or_else(|| format!("expected numbers, got a {} column", c.type_name())),
    }
}

fn map_numeric(v: &Value, f: impl Fn(f64) -> f64) -> Result<Value, String> {
    Ok(match numeric(v)? {
        Nums::One(x) => Value::Scalar(DataValue::Number(f(x))),
        Nums::Many(xs) => Value::Column(Column::Number(xs.into_iter().map(f).collect())),
    })
}

fn zip_numeric(a: &Value, b: &Value, f: impl Fn(f64, f64) -> f64) -> Result<Value, String> {
    Ok(match (numeric(a)?, numeric(b)?) {
        (Nums::One(x), Nums::One(y)) => Value::Scalar(DataValue::Number(f(x, y))),
        (Nums::One(x), Nums::Many(ys)) => {
            Value::Column(Column::Number(ys.into_iter().map(|y| f(x, y)).collect()))
        }
        (Nums::Many(xs), Nums::One(y)) => {
            Value::Column(Column::Number(xs.into_iter().map(|x| f(x, y)).collect()))
        }
        (Nums::Many(xs), Nums::Many(ys)) => {
            if xs.len() != ys.len() {
                return Err(format!(
                    "operands have different lengths ({} and {})",
                    xs.len(),
                    ys.len()
                ));
            }
            Value::Column(Column::Number(
                xs.into_iter().zip(ys).map(|(x, y)| f(x, y)).collect(),
            ))
        }
    })
}

/// Per-row values of an operand, `None` length for scalars.
fn cells(v: &Value) -> (Option<usize>, Box<dyn Fn(usize) -> DataValue + '_>) {
    match v {
        Value::Scalar(s) => (None, Box::new(move |_| s.clone())),
        Value::Column(c) => (Some(c.len()), Box::new(move |i| c.get(i))),
    }
}

fn zip_cells(
    a: &Value,
    b: &Value,
    f: impl Fn(&DataValue, &DataValue) -> DataValue,
) -> Result<Value, String> {
    let (la, ga) = cells(a);
    let (lb, gb) = cells(b);
    let n = match (la, lb) {
        (None, None) => return Ok(Value::Scalar(f(&ga(0), &gb(0)))),
        (Some(n), None) | (None, Some(n)) => n,
        (Some(x), Some(y)) if x == y => x,
        (Some(x), Some(y)) => {
            return Err(format!("operands have different lengths ({x} and {y})"));
        }
    };
    let values: Vec<DataValue> = (0..n).map(|i| f(&ga(i), &gb(i))).collect();
    Column::from_values(&values)
        .map(Value::Column)
        .map_err(|e| e.to_string())
}

fn map_bool(v: &Value, f: impl Fn(bool) -> bool) -> Result<Value, String> {
    let truthy = |d: &DataValue| match d {
        DataValue::Bool(b) => Ok(Some(*b)),
        DataValue::Number(x) if !x.is_nan() => Ok(Some(*x != 0.0)),
        d if d.is_missing() => Ok(None),
        d => Err(format!("cannot negate {d:?}")),
    };
    match v {
        Value::Scalar(s) => Ok(Value::Scalar(
            truthy(s)?.map_or(DataValue::Null, |b| DataValue::Bool(f(b))),
        )),
        Value::Column(c) => (0..c.len())
            .map(|i| truthy(&c.get(i)).map(|b| b.map(&f)))
            .collect::<Result<Vec<_>, _>>()
            .map(|v| Value::Column(Column::Bool(v))),
    }
}

fn compare(op: BinOp, a: &DataValue, b: &DataValue) -> DataValue {
    if a.is_missing() || b.is_missing() {
        return DataValue::Null;
    }
    let ord = match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y),
        _ => Some(a.to_label().cmp(&b.to_label())),
    };
    let Some(ord) = ord else {
        return DataValue::Null;
    };
    DataValue::Bool(match op {
        BinOp::Eq => ord.is_eq(),
        BinOp::Ne => ord.is_ne(),
        BinOp::Lt => ord.is_lt(),
        BinOp::Le => ord.is_le(),
        BinOp::Gt => ord.is_gt(),
        _ => ord.is_ge(),
    })
}

fn is_text(v: &Value) -> bool {
    match v {
        Value::Scalar(s) => matches!(s, DataValue::Text(_)),
        Value::Column(c) => c.is_discrete(),
    }
}

fn binary(op: BinOp, a: &Value, b: &Value) -> Result<Value, String> {
    match op {
        BinOp::Add if is_text(a) || is_text(b) => zip_cells(a, b, |x, y| {
            if x.is_missing() || y.is_missing() {
                DataValue::Null
            } else {
                DataValue::Text(format!("{}{}", x.to_label(), y.to_label()))
            }
        }),
        BinOp::Add => zip_numeric(a, b, |x, y| x + y),
        BinOp::Sub => zip_numeric(a, b, |x, y| x - y),
        BinOp::Mul => zip_numeric(a, b, |x, y| x * y),
        BinOp::Div => zip_numeric(a, b, |x, y| x / y),
        BinOp::Mod => zip_numeric(a, b, f64::rem_euclid),
        BinOp::Pow => zip_numeric(a, b, f64::powf),
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            zip_cells(a, b, |x, y| compare(op, x, y))
        }
        BinOp::And | BinOp::Or => zip_cells(a, b, |x, y| match (x, y) {
            (DataValue::Bool(p), DataValue::Bool(q)) => {
                DataValue::Bool(if op == BinOp::And { *p && *q } else { *p || *q })
            }
            _ => DataValue::Null,
        }),
    }
}

fn call(name: &str, args: &[Value]) -> Result<Value, String> {
    let arity = |n: usize| {
        if args.len() == n {
            Ok(())
        } else {
            Err(format!("{name}() takes {n} argument(s), {} given", args.len()))
        }
    };
    match name {
        "log" => {
            arity(1)?;
            map_numeric(&args[0], f64::ln)
        }
        "log10" => {
            arity(1)?;
            map_numeric(&args[0], f64::log10)
        }
        "log2" => {
            arity(1)?;
            map_numeric(&args[0], f64::log2)
        }
        "sqrt" => {
            arity(1)?;
            map_numeric(&args[0], f64::sqrt)
        }
        "exp" => {
            arity(1)?;
            map_numeric(&args[0], f64::exp)
        }
        "abs" => {
            arity(1)?;
            map_numeric(&args[0], f64::abs)
        }
        "round" => match args {
            [x] => map_numeric(x, f64::round),
            [x, Value::Scalar(d)] => {
                let scale = 10f64.powf(d.as_f64().unwrap_or(0.0).trunc());
                map_numeric(x, |v| (v * scale).round() / scale)
            }
            _ => Err("round() takes a value and optional digits".to_string()),
        },
        "str" => {
            arity(1)?;
            Ok(match &args[0] {
                Value::Scalar(s) => Value::Scalar(DataValue::Text(s.to_label())),
                Value::Column(c) => Value::Column(Column::Text(c.labels())),
            })
        }
        "factor" => {
            arity(1)?;
            Ok(Value::Column(factor(&as_column(&args[0]))))
        }
        "reorder" => match args {
            [x, by] => reorder(x, by, "median"),
            [x, by, Value::Scalar(DataValue::Text(fun))] => reorder(x, by, fun),
            _ => Err("reorder() takes a variable, a variable to order by and an optional summary name".to_string()),
        },
        "alpha" => match args {
            [colors, Value::Scalar(a)] => {
                let a = a.as_f64().ok_or("alpha() needs a numeric opacity")?;
                with_alpha(&as_column(colors), a).map(Value::Column)
            }
            _ => Err("alpha() takes colors and one opacity".to_string()),
        },
        // legacy staging markers evaluate to their argument
        "stat" | "after_stat" | "after_scale" => {
            arity(1)?;
            Ok(args[0].clone())
        }
        _ => Err(format!("name '{name}' is not defined")),
    }
}

fn as_column(v: &Value) -> Column {
    match v {
        Value::Scalar(s) => Column::broadcast(s, 1),
        Value::Column(c) => c.clone(),
    }
}

/// Set the opacity of a column of colors or color names.
fn with_alpha(colors: &Column, alpha: f64) -> Result<Column, String> {
    let out = (0..colors.len())
        .map(|i| match colors.get(i) {
            DataValue::Color(c) => Ok(Some(c.with_alpha_f(alpha))),
            DataValue::Text(name) => Rgba::parse(&name)
                .map(|c| Some(c.with_alpha_f(alpha)))
                .map_err(|e| e.to_string()),
            _ => Ok(None),
        })
        .collect::<Result<Vec<_>, String>>()?;
    Ok(Column::Color(out))
}

/// Turn a column into a categorical with levels in natural order.
fn factor(col: &Column) -> Column {
    if let Column::Categorical(_) = col {
        return col.clone();
    }
    Column::Categorical(Categorical::with_levels(&col.labels(), col.categories()))
}

/// Reorder the levels of `x` by a summary of `by` within each level.
fn reorder(x: &Value, by: &Value, fun: &str) -> Result<Value, String> {
    let x = as_column(x);
    let by = match numeric(by)? {
        Nums::Many(v) => v,
        Nums::One(v) => vec![v; x.len()],
    };
    if by.len() != x.len() {
        return Err(format!(
            "reorder() needs equal lengths, got {} and {}",
            x.len(),
            by.len()
        ));
    }
    let labels = x.labels();
    let mut summaries: Vec<(String, f64)> = Vec::new();
    for level in x.categories() {
        let values: Vec<f64> = labels
            .iter()
            .zip(&by)
            .filter(|(l, v)| l.as_deref() == Some(level.as_str()) && !v.is_nan())
            .map(|(_, v)| *v)
            .collect();
        summaries.push((level, summarize(&values, fun)?));
    }
    summaries.sort_by(|a, b| a.1.total_cmp(&b.1));
    let levels = summaries.into_iter().map(|(l, _)| l).collect();
    Ok(Value::Column(Column::Categorical(Categorical::with_levels(
        &labels, levels,
    ))))
}

fn summarize(values: &[f64], fun: &str) -> Result<f64, String> {
    if values.is_empty() {
        return Ok(f64::NAN);
    }
    let n = values.len() as f64;
    Ok(match fun {
        "mean" => values.iter().sum::<f64>() / n,
        "sum" => values.iter().sum(),
        "min" => values.iter().copied().fold(f64::INFINITY, f64::min),
        "max" => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        "len" | "count" => n,
        "median" => {
            let mut sorted = values.to_vec();
            sorted.sort_by(f64::total_cmp);
            let mid = sorted.len() / 2;
            if sorted.len() % 2 == 0 {
                (sorted[mid - 1] + sorted[mid]) / 2.0
            } else {
                sorted[mid]
            }
        }
        other => return Err(format!("unknown summary function '{other}'")),
    })
}
