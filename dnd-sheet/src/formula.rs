//! Deterministic formula evaluation.
//!
//! Authored bonuses ("+2", "@abilities.dex.mod + 1", "floor(@prof / 2)") are
//! stored as [`Formula`] strings and reduced to numbers against the actor's
//! [`RollData`]. Only deterministic expressions are accepted; anything that
//! would need a dice roll is reported as [`EvalError::NonDeterministic`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::store::set_path;

/// Maximum depth for references that resolve to other formulas.
const MAX_REFERENCE_DEPTH: usize = 8;

/// Maximum nesting of parentheses, signs and function calls in one formula.
const MAX_NESTING: usize = 64;

/// Largest magnitude a formula result may have when used as an integer bonus.
pub const MAX_MAGNITUDE: f64 = 1_000_000.0;

// ============================================================================
// Formula
// ============================================================================

/// An authored bonus or expression. Accepts JSON numbers as well as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FormulaRepr", into = "String")]
pub struct Formula(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum FormulaRepr {
    Number(f64),
    Text(String),
}

impl From<FormulaRepr> for Formula {
    fn from(repr: FormulaRepr) -> Self {
        match repr {
            FormulaRepr::Number(n) if n.fract() == 0.0 => Formula(format!("{}", n as i64)),
            FormulaRepr::Number(n) => Formula(n.to_string()),
            FormulaRepr::Text(s) => Formula(s),
        }
    }
}

impl From<Formula> for String {
    fn from(formula: Formula) -> Self {
        formula.0
    }
}

impl From<&str> for Formula {
    fn from(s: &str) -> Self {
        Formula(s.to_string())
    }
}

impl From<i32> for Formula {
    fn from(n: i32) -> Self {
        Formula(n.to_string())
    }
}

impl Formula {
    pub fn new(expr: impl Into<String>) -> Self {
        Formula(expr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

// ============================================================================
// Roll data
// ============================================================================

/// The variable context formulas are evaluated against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RollData(Value);

impl RollData {
    pub fn new(value: Value) -> Self {
        RollData(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Look up a dotted path such as `abilities.dex.mod`.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(&self.0, |value, segment| value.get(segment))
    }

    /// Set a dotted path, creating intermediate objects as needed.
    pub fn insert(&mut self, path: &str, value: Value) {
        set_path(&mut self.0, path, value);
    }
}

impl From<Value> for RollData {
    fn from(value: Value) -> Self {
        RollData(value)
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Why a formula could not be reduced to a number.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),
    #[error("unexpected end of formula")]
    UnexpectedEnd,
    #[error("unknown reference @{0}")]
    UnknownReference(String),
    #[error("formula is not deterministic: {0}")]
    NonDeterministic(String),
    #[error("unknown function {0}()")]
    UnknownFunction(String),
    #[error("formula produced a non-finite result")]
    NonFinite,
    #[error("unexpected trailing input at position {0}")]
    TrailingInput(usize),
    #[error("formula nested too deeply at position {0}")]
    TooDeep(usize),
    #[error("formula result {0} is out of range")]
    OutOfRange(f64),
}

/// Reduces a formula to a number in the context of some roll data.
pub trait Evaluator: Send + Sync {
    fn simplify(&self, formula: &Formula, data: &RollData) -> Result<f64, EvalError>;
}

/// The built-in arithmetic evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormulaEvaluator;

impl Evaluator for FormulaEvaluator {
    fn simplify(&self, formula: &Formula, data: &RollData) -> Result<f64, EvalError> {
        evaluate(formula.as_str(), data, 0)
    }
}

/// Floor a formula result to an integer, rejecting values beyond
/// [`MAX_MAGNITUDE`].
pub fn to_integer(value: f64) -> Result<i32, EvalError> {
    let floored = value.floor();
    if !floored.is_finite() || floored.abs() > MAX_MAGNITUDE {
        return Err(EvalError::OutOfRange(value));
    }
    Ok(floored as i32)
}

/// Evaluate an authored bonus, treating any failure as 0.
///
/// Empty formulas are 0 without a warning. Results are floored.
pub fn simplify_bonus(evaluator: &dyn Evaluator, formula: &Formula, data: &RollData) -> i32 {
    if formula.is_empty() {
        return 0;
    }
    match evaluator.simplify(formula, data).and_then(to_integer) {
        Ok(n) => n,
        Err(err) => {
            warn!(formula = formula.as_str(), error = %err, "bonus formula treated as 0");
            0
        }
    }
}

fn evaluate(expr: &str, data: &RollData, depth: usize) -> Result<f64, EvalError> {
    let mut parser = Parser {
        chars: expr.chars().collect(),
        pos: 0,
        data,
        depth,
        nesting: 0,
    };
    let value = parser.expression()?;
    parser.skip_whitespace();
    if parser.pos < parser.chars.len() {
        return Err(EvalError::TrailingInput(parser.pos));
    }
    if !value.is_finite() {
        return Err(EvalError::NonFinite);
    }
    Ok(value)
}

fn value_to_number(path: &str, value: &Value, data: &RollData, depth: usize) -> Result<f64, EvalError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| EvalError::UnknownReference(path.to_string())),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) if s.trim().is_empty() => Ok(0.0),
        Value::String(s) => {
            if depth >= MAX_REFERENCE_DEPTH {
                return Err(EvalError::UnknownReference(path.to_string()));
            }
            evaluate(s, data, depth + 1)
        }
        _ => Err(EvalError::UnknownReference(path.to_string())),
    }
}

/// Recursive-descent parser over `+ - * / %`, parentheses and function calls.
struct Parser<'a> {
    chars: Vec<char>,
    pos: usize,
    data: &'a RollData,
    depth: usize,
    nesting: usize,
}

impl Parser<'_> {
    fn skip_whitespace(&mut self) {
        while self.pos < self.chars.len() && self.chars[self.pos].is_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.chars.get(self.pos).copied()
    }

    fn expect(&mut self, expected: char) -> Result<(), EvalError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(EvalError::UnexpectedChar(c, self.pos)),
            None => Err(EvalError::UnexpectedEnd),
        }
    }

    fn expression(&mut self) -> Result<f64, EvalError> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                '+' => {
                    self.pos += 1;
                    value += self.term()?;
                }
                '-' => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, EvalError> {
        let mut value = self.unary()?;
        while let Some(op) = self.peek() {
            match op {
                '*' => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                '/' => {
                    self.pos += 1;
                    value /= self.unary()?;
                }
                '%' => {
                    self.pos += 1;
                    value %= self.unary()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    /// Every nested construct passes through here.
    fn unary(&mut self) -> Result<f64, EvalError> {
        if self.nesting >= MAX_NESTING {
            return Err(EvalError::TooDeep(self.pos));
        }
        self.nesting += 1;
        let value = self.signed();
        self.nesting -= 1;
        value
    }

    fn signed(&mut self) -> Result<f64, EvalError> {
        match self.peek() {
            Some('-') => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some('+') => {
                self.pos += 1;
                self.unary()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<f64, EvalError> {
        match self.peek() {
            None => Err(EvalError::UnexpectedEnd),
            Some('(') => {
                self.pos += 1;
                let value = self.expression()?;
                self.expect(')')?;
                Ok(value)
            }
            Some('@') => {
                self.pos += 1;
                let path = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
                let path = path.trim_end_matches('.').to_string();
                if path.is_empty() {
                    return Err(EvalError::UnexpectedEnd);
                }
                let value = self
                    .data
                    .lookup(&path)
                    .ok_or_else(|| EvalError::UnknownReference(path.clone()))?;
                value_to_number(&path, value, self.data, self.depth)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) if c.is_ascii_alphabetic() => self.identifier(),
            Some(c) => Err(EvalError::UnexpectedChar(c, self.pos)),
        }
    }

    fn number(&mut self) -> Result<f64, EvalError> {
        let start = self.pos;
        let digits = self.take_while(|c| c.is_ascii_digit() || c == '.');
        if matches!(self.chars.get(self.pos), Some('d') | Some('D')) {
            let rest = self.take_while(|c| c.is_ascii_alphanumeric());
            return Err(EvalError::NonDeterministic(format!("{digits}{rest}")));
        }
        digits
            .parse::<f64>()
            .map_err(|_| EvalError::UnexpectedChar(self.chars[start], start))
    }

    fn identifier(&mut self) -> Result<f64, EvalError> {
        let name = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let lower = name.to_lowercase();
        if is_die_term(&lower) {
            return Err(EvalError::NonDeterministic(name));
        }

        self.expect('(')?;
        let mut args = Vec::new();
        if self.peek() != Some(')') {
            args.push(self.expression()?);
            while self.peek() == Some(',') {
                self.pos += 1;
                args.push(self.expression()?);
            }
        }
        self.expect(')')?;

        let first = || args.first().copied().ok_or(EvalError::UnexpectedEnd);
        match lower.as_str() {
            "floor" => Ok(first()?.floor()),
            "ceil" => Ok(first()?.ceil()),
            "round" => Ok(first()?.round()),
            "abs" => Ok(first()?.abs()),
            "min" if !args.is_empty() => Ok(args.iter().copied().fold(f64::INFINITY, f64::min)),
            "max" if !args.is_empty() => Ok(args.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
            "min" | "max" => Err(EvalError::UnexpectedEnd),
            _ => Err(EvalError::UnknownFunction(name)),
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.pos < self.chars.len() && pred(self.chars[self.pos]) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }
}

/// `d20`, `d8` and the like.
fn is_die_term(name: &str) -> bool {
    name.len() > 1 && name.starts_with('d') && name[1..].chars().all(|c| c.is_ascii_digit())
}
