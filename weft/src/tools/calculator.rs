//! Arithmetic expression evaluator.
//!
//! Parses a small expression grammar directly, so model-supplied input never
//! reaches anything resembling `eval`. Unknown identifiers, stray characters,
//! malformed syntax and overly deep nesting all come back as
//! [`ToolError::Evaluation`].
//!
//! Supported: `+ - * / % ^`, `**` and `//` as power and floor-division
//! aliases, parentheses, the constants `pi` and `e`, and a whitelist of
//! functions (`sqrt`, `sin`, `cos`, `tan`, `log`, `log10`, `log2`, `exp`,
//! `abs`, `floor`, `ceil`, `round`).

use serde_json::{Map, Value};

use crate::error::ToolError;

use super::{ParamKind, ParamSpec, Tool, ToolSpec};

pub const TOOL_CALCULATOR: &str = "calculator";

pub struct CalculatorTool;

impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        TOOL_CALCULATOR
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            TOOL_CALCULATOR,
            "Evaluate a mathematical expression. Supports basic arithmetic (+, -, *, /, **, %, //) \
             and math functions (sqrt, sin, cos, log, etc.).",
        )
        .with_param(ParamSpec::required(
            "expression",
            ParamKind::String,
            "The mathematical expression to evaluate, e.g. '2 + 3 * 4' or 'sqrt(144)'.",
        ))
    }

    fn call(&self, args: &Map<String, Value>) -> Result<String, ToolError> {
        let expression = args
            .get("expression")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::MissingArgument {
                tool: TOOL_CALCULATOR.to_string(),
                argument: "expression".to_string(),
            })?;
        let value = evaluate(expression.trim())?;
        Ok(format_number(value))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Pow,
    FloorDiv,
    LParen,
    RParen,
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(value) => value.to_string(),
        Token::Ident(name) => name.clone(),
        Token::Plus => "+".to_string(),
        Token::Minus => "-".to_string(),
        Token::Star => "*".to_string(),
        Token::Slash => "/".to_string(),
        Token::Percent => "%".to_string(),
        Token::Pow => "^".to_string(),
        Token::FloorDiv => "//".to_string(),
        Token::LParen => "(".to_string(),
        Token::RParen => ")".to_string(),
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, ToolError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                // Exponent suffix, e.g. 2e3 or 1.5e-2.
                if let Some(&e) = chars.peek() {
                    if e == 'e' || e == 'E' {
                        literal.push(e);
                        chars.next();
                        if let Some(&sign) = chars.peek() {
                            if sign == '+' || sign == '-' {
                                literal.push(sign);
                                chars.next();
                            }
                        }
                        while let Some(&d) = chars.peek() {
                            if d.is_ascii_digit() {
                                literal.push(d);
                                chars.next();
                            } else {
                                break;
                            }
                        }
                    }
                }
                let value = literal.parse::<f64>().map_err(|_| {
                    ToolError::Evaluation(format!("invalid number '{literal}'"))
                })?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        ident.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
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
                if chars.peek() == Some(&'*') {
                    chars.next();
                    tokens.push(Token::Pow);
                } else {
                    tokens.push(Token::Star);
                }
            }
            '/' => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    tokens.push(Token::FloorDiv);
                } else {
                    tokens.push(Token::Slash);
                }
            }
            '%' => {
                chars.next();
                tokens.push(Token::Percent);
            }
            '^' => {
                chars.next();
                tokens.push(Token::Pow);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            other => {
                return Err(ToolError::Evaluation(format!(
                    "unexpected character '{other}' in expression"
                )));
            }
        }
    }
    Ok(tokens)
}

/// Recursive descent over the token list, evaluating as it parses.
///
/// Grammar, loosest to tightest binding:
///
/// ```text
/// expr    := term (('+' | '-') term)*
/// term    := unary (('*' | '/' | '%' | '//') unary)*
/// unary   := ('-' | '+') unary | power
/// power   := primary ('^' unary)?
/// primary := number | ident '(' expr ')' | ident | '(' expr ')'
/// ```
///
/// Power is right-associative and binds tighter than unary minus, so
/// `-2^2 == -4` and `2^3^2 == 512`.
///
/// Every recursive cycle of the grammar passes through `unary`, which caps
/// the nesting depth at [`MAX_DEPTH`] so pathological input fails with an
/// evaluation error instead of exhausting the stack.
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

/// Nesting depth cap enforced in [`Parser::unary`].
const MAX_DEPTH: usize = 128;

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect_rparen(&mut self) -> Result<(), ToolError> {
        match self.advance() {
            Some(Token::RParen) => Ok(()),
            _ => Err(ToolError::Evaluation(
                "missing closing parenthesis".to_string(),
            )),
        }
    }

    fn expr(&mut self) -> Result<f64, ToolError> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.advance();
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, ToolError> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    value *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.advance();
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err(ToolError::Evaluation("division by zero".to_string()));
                    }
                    value /= rhs;
                }
                Some(Token::Percent) => {
                    self.advance();
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err(ToolError::Evaluation("modulo by zero".to_string()));
                    }
                    // Floored modulo, matching // below.
                    value -= rhs * (value / rhs).floor();
                }
                Some(Token::FloorDiv) => {
                    self.advance();
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err(ToolError::Evaluation("division by zero".to_string()));
                    }
                    value = (value / rhs).floor();
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64, ToolError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ToolError::Evaluation(
                "expression too deeply nested".to_string(),
            ));
        }
        let value = match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                -self.unary()?
            }
            Some(Token::Plus) => {
                self.advance();
                self.unary()?
            }
            _ => self.power()?,
        };
        self.depth -= 1;
        Ok(value)
    }

    fn power(&mut self) -> Result<f64, ToolError> {
        let base = self.primary()?;
        if matches!(self.peek(), Some(Token::Pow)) {
            self.advance();
            let exponent = self.unary()?;
            Ok(base.powf(exponent))
        } else {
            Ok(base)
        }
    }

    fn primary(&mut self) -> Result<f64, ToolError> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::Ident(name)) => {
                if matches!(self.peek(), Some(Token::LParen)) {
                    self.advance();
                    let argument = self.expr()?;
                    self.expect_rparen()?;
                    apply_function(&name, argument)
                } else {
                    constant(&name)
                }
            }
            Some(Token::LParen) => {
                let value = self.expr()?;
                self.expect_rparen()?;
                Ok(value)
            }
            Some(token) => Err(ToolError::Evaluation(format!(
                "unexpected token '{}'",
                describe(&token)
            ))),
            None => Err(ToolError::Evaluation(
                "unexpected end of expression".to_string(),
            )),
        }
    }
}

fn apply_function(name: &str, argument: f64) -> Result<f64, ToolError> {
    let value = match name {
        "sqrt" => argument.sqrt(),
        "sin" => argument.sin(),
        "cos" => argument.cos(),
        "tan" => argument.tan(),
        "log" => argument.ln(),
        "log10" => argument.log10(),
        "log2" => argument.log2(),
        "exp" => argument.exp(),
        "abs" => argument.abs(),
        "floor" => argument.floor(),
        "ceil" => argument.ceil(),
        "round" => argument.round(),
        _ => {
            return Err(ToolError::Evaluation(format!("unknown function '{name}'")));
        }
    };
    Ok(value)
}

fn constant(name: &str) -> Result<f64, ToolError> {
    match name {
        "pi" => Ok(std::f64::consts::PI),
        "e" => Ok(std::f64::consts::E),
        _ => Err(ToolError::Evaluation(format!("unknown identifier '{name}'"))),
    }
}

fn evaluate(expression: &str) -> Result<f64, ToolError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(ToolError::Evaluation("empty expression".to_string()));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if let Some(token) = parser.peek() {
        return Err(ToolError::Evaluation(format!(
            "unexpected input after expression: '{}'",
            describe(token)
        )));
    }
    if !value.is_finite() {
        return Err(ToolError::Evaluation(
            "result is not a finite number".to_string(),
        ));
    }
    Ok(value)
}

/// Whole numbers print without a trailing `.0`, everything else as the
/// shortest f64 representation.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
