//! Boolean combination expressions over single-letter identifiers.
//!
//! Grammar, lowest to highest precedence:
//!
//! ```text
//! or   := and ( ("OR" | "||") and )*
//! and  := not ( ("AND" | "&&") not )*
//! not  := ("NOT" | "!") not | atom
//! atom := IDENT | "(" or ")"
//! ```
//!
//! Keywords are case-insensitive; identifiers are single lowercase ASCII
//! letters. Expressions are parsed into an [`Expr`] tree and evaluated
//! directly, never executed as code.

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

/// Nesting beyond this depth is rejected rather than recursed into.
const MAX_DEPTH: usize = 64;

/// Structural problems found while parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("expression is empty")]
    Empty,

    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unknown token '{token}' at position {pos}")]
    UnknownToken { token: String, pos: usize },

    #[error("unexpected '{token}' at position {pos}")]
    UnexpectedToken { token: String, pos: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unbalanced parentheses")]
    Unbalanced,

    #[error("expression nests deeper than {MAX_DEPTH} levels")]
    TooDeep,

    #[error("identifier '{0}' is not defined")]
    Undefined(char),
}

/// Parsed expression tree.
///
/// `And`/`Or` hold every operand of a flat chain, so tree depth only grows
/// with parentheses and `NOT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Var(char),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        let tokens = tokenize(source)?;
        if tokens.is_empty() {
            return Err(ExpressionError::Empty);
        }
        let mut parser = Parser { tokens, pos: 0, depth: 0 };
        let expr = parser.or_expr()?;
        match parser.peek() {
            None => Ok(expr),
            Some((Token::RParen, _)) => Err(ExpressionError::Unbalanced),
            Some((token, pos)) => Err(ExpressionError::UnexpectedToken {
                token: token.to_string(),
                pos: *pos,
            }),
        }
    }

    /// Identifiers referenced anywhere in the tree.
    pub fn identifiers(&self) -> BTreeSet<char> {
        let mut out = BTreeSet::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers(&self, out: &mut BTreeSet<char>) {
        match self {
            Expr::Var(c) => {
                out.insert(*c);
            }
            Expr::Not(inner) => inner.collect_identifiers(out),
            Expr::And(operands) | Expr::Or(operands) => {
                for operand in operands {
                    operand.collect_identifiers(out);
                }
            }
        }
    }

    /// Evaluate with every referenced identifier checked up front, so the
    /// outcome never depends on which branch short-circuits.
    pub fn eval(&self, values: &HashMap<char, bool>) -> Result<bool, ExpressionError> {
        if let Some(missing) = self.identifiers().into_iter().find(|c| !values.contains_key(c)) {
            return Err(ExpressionError::Undefined(missing));
        }
        Ok(self.eval_unchecked(values))
    }

    fn eval_unchecked(&self, values: &HashMap<char, bool>) -> bool {
        match self {
            Expr::Var(c) => values.get(c).copied().unwrap_or(false),
            Expr::Not(inner) => !inner.eval_unchecked(values),
            Expr::And(operands) => operands.iter().all(|e| e.eval_unchecked(values)),
            Expr::Or(operands) => operands.iter().any(|e| e.eval_unchecked(values)),
        }
    }
}

/// Parse and evaluate `expression` against letter values.
pub fn evaluate(expression: &str, values: &HashMap<char, bool>) -> Result<bool, ExpressionError> {
    Expr::parse(expression)?.eval(values)
}

/// Letter for the `index`-th outcome: `a` for 0 through `z` for 25.
pub fn letter_for(index: usize) -> Option<char> {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map(|i| char::from(b'a' + i))
}

/// Map outcomes to letters in order; outcomes past `z` are not addressable.
pub fn letter_values(outcomes: impl IntoIterator<Item = bool>) -> HashMap<char, bool> {
    outcomes
        .into_iter()
        .enumerate()
        .map_while(|(i, passed)| letter_for(i).map(|c| (c, passed)))
        .collect()
}

// ── Tokenizer ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(char),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Ident(c) => write!(f, "{c}"),
            Token::And => write!(f, "AND"),
            Token::Or => write!(f, "OR"),
            Token::Not => write!(f, "NOT"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<(Token, usize)>, ExpressionError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let start = i;
        match ch {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '(' => tokens.push((Token::LParen, start)),
            ')' => tokens.push((Token::RParen, start)),
            '!' => tokens.push((Token::Not, start)),
            '&' | '|' => {
                if chars.get(i + 1) != Some(&ch) {
                    return Err(ExpressionError::UnexpectedChar { ch, pos: start });
                }
                i += 1;
                tokens.push((if ch == '&' { Token::And } else { Token::Or }, start));
            }
            c if c.is_ascii_alphanumeric() || c == '_' => {
                while i + 1 < chars.len() && (chars[i + 1].is_ascii_alphanumeric() || chars[i + 1] == '_') {
                    i += 1;
                }
                let word: String = chars[start..=i].iter().collect();
                tokens.push((word_token(&word, start)?, start));
            }
            _ => return Err(ExpressionError::UnexpectedChar { ch, pos: start }),
        }
        i += 1;
    }

    Ok(tokens)
}

fn word_token(word: &str, pos: usize) -> Result<Token, ExpressionError> {
    if word.eq_ignore_ascii_case("and") {
        return Ok(Token::And);
    }
    if word.eq_ignore_ascii_case("or") {
        return Ok(Token::Or);
    }
    if word.eq_ignore_ascii_case("not") {
        return Ok(Token::Not);
    }
    let mut chars = word.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_lowercase() => Ok(Token::Ident(c)),
        _ => Err(ExpressionError::UnknownToken {
            token: word.to_string(),
            pos,
        }),
    }
}

// ── Parser ──────────────────────────────────────────────────────────

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&(Token, usize)> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if matches!(self.peek(), Some((t, _)) if t == expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn descend(&mut self) -> Result<(), ExpressionError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExpressionError::TooDeep);
        }
        Ok(())
    }

    fn or_expr(&mut self) -> Result<Expr, ExpressionError> {
        let mut operands = vec![self.and_expr()?];
        while self.eat(&Token::Or) {
            operands.push(self.and_expr()?);
        }
        Ok(flatten(operands, Expr::Or))
    }

    fn and_expr(&mut self) -> Result<Expr, ExpressionError> {
        let mut operands = vec![self.not_expr()?];
        while self.eat(&Token::And) {
            operands.push(self.not_expr()?);
        }
        Ok(flatten(operands, Expr::And))
    }

    fn not_expr(&mut self) -> Result<Expr, ExpressionError> {
        if self.eat(&Token::Not) {
            self.descend()?;
            let inner = self.not_expr()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Expr, ExpressionError> {
        let Some((token, pos)) = self.peek().cloned() else {
            return Err(ExpressionError::UnexpectedEnd);
        };
        self.pos += 1;
        match token {
            Token::Ident(c) => Ok(Expr::Var(c)),
            Token::LParen => {
                self.descend()?;
                let inner = self.or_expr()?;
                if !self.eat(&Token::RParen) {
                    return Err(ExpressionError::Unbalanced);
                }
                self.depth -= 1;
                Ok(inner)
            }
            other => Err(ExpressionError::UnexpectedToken {
                token: other.to_string(),
                pos,
            }),
        }
    }
}

/// A single operand is returned as-is rather than wrapped.
fn flatten(mut operands: Vec<Expr>, combine: fn(Vec<Expr>) -> Expr) -> Expr {
    if operands.len() == 1 {
        if let Some(only) = operands.pop() {
            return only;
        }
    }
    combine(operands)
}

// ── Tests ───────────────────────────────────────────────────────────
