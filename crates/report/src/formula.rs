//! Stored-formula evaluation over a restricted expression grammar.
//!
//! Formula bodies are admin-editable text from an external store. They are
//! interpreted here (lexed, parsed, and evaluated against the resolution
//! context), never executed as host code. The grammar covers arithmetic,
//! comparisons, variable references, and a fixed set of call forms.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use lampo_core::parse_number;

/// One stored formula: an expression body plus the variables it declares.
/// An empty `variables` list means any context variable may be referenced.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormulaDefinition {
    pub expression: String,
    #[serde(default)]
    pub variables: Vec<String>,
}

/// Named formulas as supplied by the external store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormulaTable {
    #[serde(flatten)]
    formulas: BTreeMap<String, FormulaDefinition>,
}

impl FormulaTable {
    pub fn get(&self, name: &str) -> Option<&FormulaDefinition> {
        self.formulas.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, definition: FormulaDefinition) {
        self.formulas.insert(name.into(), definition);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormulaDefinition)> {
        self.formulas.iter().map(|(name, definition)| (name.as_str(), definition))
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum FormulaError {
    #[error("unexpected character `{0}` in expression")]
    UnexpectedChar(char),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unexpected token `{0}`")]
    UnexpectedToken(String),
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    #[error("`{name}` expects {expected} argument(s), got {got}")]
    WrongArity { name: String, expected: usize, got: usize },
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),
    #[error("variable `{0}` is not declared by the formula")]
    UndeclaredVariable(String),
}

/// Evaluate a stored formula against the resolution context. Variables are
/// coerced through the locale-tolerant numeric parser, so `"2 500,5"` in
/// the context reads as 2500.5.
pub fn evaluate(
    definition: &FormulaDefinition,
    values: &Map<String, Value>,
) -> Result<f64, FormulaError> {
    let expr = parse(&definition.expression)?;
    eval(&expr, definition, values)
}

/// Parse without evaluating; used by readiness checks.
pub fn parse(expression: &str) -> Result<Expr, FormulaError> {
    let tokens = lex(expression)?;
    let mut parser = Parser { tokens: &tokens, position: 0 };
    let expr = parser.comparison()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(FormulaError::UnexpectedToken(token.describe())),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    Negate(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
    Comma,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(value) => value.to_string(),
            Token::Ident(name) => name.clone(),
            Token::Plus => "+".to_string(),
            Token::Minus => "-".to_string(),
            Token::Star => "*".to_string(),
            Token::Slash => "/".to_string(),
            Token::Percent => "%".to_string(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
            Token::Comma => ",".to_string(),
            Token::Less => "<".to_string(),
            Token::LessEqual => "<=".to_string(),
            Token::Greater => ">".to_string(),
            Token::GreaterEqual => ">=".to_string(),
            Token::Equal => "==".to_string(),
            Token::NotEqual => "!=".to_string(),
        }
    }
}

fn lex(expression: &str) -> Result<Vec<Token>, FormulaError> {
    let mut tokens = Vec::new();
    let mut chars = expression.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        literal.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| FormulaError::UnexpectedToken(literal.clone()))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '.' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(name));
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '%' => {
                chars.next();
                tokens.push(Token::Percent);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '<' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::LessEqual);
                } else {
                    tokens.push(Token::Less);
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::GreaterEqual);
                } else {
                    tokens.push(Token::Greater);
                }
            }
            '=' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Equal);
                } else {
                    return Err(FormulaError::UnexpectedChar('='));
                }
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::NotEqual);
                } else {
                    return Err(FormulaError::UnexpectedChar('!'));
                }
            }
            other => return Err(FormulaError::UnexpectedChar(other)),
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    position: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.position);
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> Result<(), FormulaError> {
        match self.advance() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(FormulaError::UnexpectedToken(token.describe())),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }

    fn comparison(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.additive()?;
        while let Some(op) = self.peek().and_then(|token| match token {
            Token::Less => Some(BinaryOp::Less),
            Token::LessEqual => Some(BinaryOp::LessEqual),
            Token::Greater => Some(BinaryOp::Greater),
            Token::GreaterEqual => Some(BinaryOp::GreaterEqual),
            Token::Equal => Some(BinaryOp::Equal),
            Token::NotEqual => Some(BinaryOp::NotEqual),
            _ => None,
        }) {
            self.advance();
            let right = self.additive()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn additive(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.multiplicative()?;
        while let Some(op) = self.peek().and_then(|token| match token {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Subtract),
            _ => None,
        }) {
            self.advance();
            let right = self.multiplicative()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.unary()?;
        while let Some(op) = self.peek().and_then(|token| match token {
            Token::Star => Some(BinaryOp::Multiply),
            Token::Slash => Some(BinaryOp::Divide),
            Token::Percent => Some(BinaryOp::Modulo),
            _ => None,
        }) {
            self.advance();
            let right = self.unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        if self.peek() == Some(&Token::Minus) {
            self.advance();
            let inner = self.unary()?;
            return Ok(Expr::Negate(Box::new(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        match self.advance().cloned() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.advance();
                    let mut args = Vec::new();
                    if self.peek() != Some(&Token::RParen) {
                        loop {
                            args.push(self.comparison()?);
                            if self.peek() == Some(&Token::Comma) {
                                self.advance();
                            } else {
                                break;
                            }
                        }
                    }
                    self.expect(&Token::RParen)?;
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Variable(name))
                }
            }
            Some(Token::LParen) => {
                let inner = self.comparison()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(token) => Err(FormulaError::UnexpectedToken(token.describe())),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }
}

fn eval(
    expr: &Expr,
    definition: &FormulaDefinition,
    values: &Map<String, Value>,
) -> Result<f64, FormulaError> {
    match expr {
        Expr::Number(value) => Ok(*value),
        Expr::Variable(name) => resolve_variable(name, definition, values),
        Expr::Negate(inner) => Ok(-eval(inner, definition, values)?),
        Expr::Binary(op, left, right) => {
            let lhs = eval(left, definition, values)?;
            let rhs = eval(right, definition, values)?;
            Ok(apply_binary(*op, lhs, rhs))
        }
        Expr::Call(name, args) => {
            let mut evaluated = Vec::with_capacity(args.len());
            for arg in args {
                evaluated.push(eval(arg, definition, values)?);
            }
            apply_call(name, &evaluated)
        }
    }
}

/// Variables may be written with a `data.` prefix, mirroring how the
/// store's formulas address the submission object.
fn resolve_variable(
    name: &str,
    definition: &FormulaDefinition,
    values: &Map<String, Value>,
) -> Result<f64, FormulaError> {
    let key = name.strip_prefix("data.").unwrap_or(name);

    if !definition.variables.is_empty()
        && !definition.variables.iter().any(|declared| declared == key)
    {
        return Err(FormulaError::UndeclaredVariable(key.to_string()));
    }

    match values.get(key) {
        Some(value) => Ok(parse_number(value)),
        None => Err(FormulaError::UnknownVariable(key.to_string())),
    }
}

/// Division and modulo by zero evaluate to 0, preserving the lenient
/// behavior report templates rely on.
fn apply_binary(op: BinaryOp, lhs: f64, rhs: f64) -> f64 {
    match op {
        BinaryOp::Add => lhs + rhs,
        BinaryOp::Subtract => lhs - rhs,
        BinaryOp::Multiply => lhs * rhs,
        BinaryOp::Divide => {
            if rhs == 0.0 {
                0.0
            } else {
                lhs / rhs
            }
        }
        BinaryOp::Modulo => {
            if rhs == 0.0 {
                0.0
            } else {
                lhs % rhs
            }
        }
        BinaryOp::Less => bool_value(lhs < rhs),
        BinaryOp::LessEqual => bool_value(lhs <= rhs),
        BinaryOp::Greater => bool_value(lhs > rhs),
        BinaryOp::GreaterEqual => bool_value(lhs >= rhs),
        BinaryOp::Equal => bool_value(lhs == rhs),
        BinaryOp::NotEqual => bool_value(lhs != rhs),
    }
}

fn bool_value(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

fn apply_call(name: &str, args: &[f64]) -> Result<f64, FormulaError> {
    let arity = |expected: usize| -> Result<(), FormulaError> {
        if args.len() == expected {
            Ok(())
        } else {
            Err(FormulaError::WrongArity {
                name: name.to_string(),
                expected,
                got: args.len(),
            })
        }
    };

    match name {
        "round" => {
            arity(1)?;
            Ok(args[0].round())
        }
        "floor" => {
            arity(1)?;
            Ok(args[0].floor())
        }
        "ceil" => {
            arity(1)?;
            Ok(args[0].ceil())
        }
        "abs" => {
            arity(1)?;
            Ok(args[0].abs())
        }
        "min" => {
            arity(2)?;
            Ok(args[0].min(args[1]))
        }
        "max" => {
            arity(2)?;
            Ok(args[0].max(args[1]))
        }
        "if" => {
            arity(3)?;
            Ok(if args[0] != 0.0 { args[1] } else { args[2] })
        }
        other => Err(FormulaError::UnknownFunction(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value};

    use super::{evaluate, parse, FormulaDefinition, FormulaError};

    fn context(entries: &[(&str, Value)]) -> Map<String, Value> {
        entries.iter().map(|(key, value)| (key.to_string(), value.clone())).collect()
    }

    fn formula(expression: &str) -> FormulaDefinition {
        FormulaDefinition { expression: expression.to_string(), variables: Vec::new() }
    }

    #[test]
    fn arithmetic_follows_precedence() {
        let values = Map::new();
        assert_eq!(evaluate(&formula("2 + 3 * 4"), &values), Ok(14.0));
        assert_eq!(evaluate(&formula("(2 + 3) * 4"), &values), Ok(20.0));
        assert_eq!(evaluate(&formula("-3 + 5"), &values), Ok(2.0));
        assert_eq!(evaluate(&formula("10 % 3"), &values), Ok(1.0));
    }

    #[test]
    fn variables_resolve_through_locale_parsing() {
        let values = context(&[("vuosikustannus", json!("3 200,5")), ("saasto", json!(400))]);
        assert_eq!(evaluate(&formula("vuosikustannus - saasto"), &values), Ok(2800.5));
    }

    #[test]
    fn data_prefix_addresses_the_same_context() {
        let values = context(&[("energiantarve", json!(24_000))]);
        assert_eq!(evaluate(&formula("data.energiantarve / 10"), &values), Ok(2400.0));
    }

    #[test]
    fn declared_variable_list_restricts_references() {
        let values = context(&[("a", json!(1)), ("b", json!(2))]);
        let restricted = FormulaDefinition {
            expression: "a + b".to_string(),
            variables: vec!["a".to_string()],
        };
        assert_eq!(
            evaluate(&restricted, &values),
            Err(FormulaError::UndeclaredVariable("b".to_string()))
        );
    }

    #[test]
    fn unknown_variable_is_an_error() {
        let values = Map::new();
        assert_eq!(
            evaluate(&formula("puuttuva * 2"), &values),
            Err(FormulaError::UnknownVariable("puuttuva".to_string()))
        );
    }

    #[test]
    fn division_by_zero_is_lenient() {
        let values = Map::new();
        assert_eq!(evaluate(&formula("5 / 0"), &values), Ok(0.0));
        assert_eq!(evaluate(&formula("5 % 0"), &values), Ok(0.0));
    }

    #[test]
    fn call_forms_cover_rounding_and_branching() {
        let values = context(&[("x", json!(2.4))]);
        assert_eq!(evaluate(&formula("round(x)"), &values), Ok(2.0));
        assert_eq!(evaluate(&formula("ceil(x)"), &values), Ok(3.0));
        assert_eq!(evaluate(&formula("min(x, 1)"), &values), Ok(1.0));
        assert_eq!(evaluate(&formula("if(x > 2, 10, 20)"), &values), Ok(10.0));
    }

    #[test]
    fn malformed_expressions_fail_with_typed_errors() {
        assert!(matches!(parse("2 +"), Err(FormulaError::UnexpectedEnd)));
        assert!(matches!(parse("2 $ 3"), Err(FormulaError::UnexpectedChar('$'))));
        assert!(matches!(parse("(1 + 2"), Err(FormulaError::UnexpectedEnd)));
        assert!(matches!(parse("1 2"), Err(FormulaError::UnexpectedToken(_))));
    }

    #[test]
    fn unknown_function_is_rejected_not_executed() {
        let values = Map::new();
        assert_eq!(
            evaluate(&formula("system(1)"), &values),
            Err(FormulaError::UnknownFunction("system".to_string()))
        );
    }

    #[test]
    fn comparison_chain_yields_zero_or_one() {
        let values = context(&[("a", json!(5))]);
        assert_eq!(evaluate(&formula("a >= 5"), &values), Ok(1.0));
        assert_eq!(evaluate(&formula("a != 5"), &values), Ok(0.0));
    }
}
