//! Challenge text generation.
//!
//! Produces random strings and arithmetic formulas together with the answer
//! a user is expected to type.

use crate::config::{CaptchaError, CaptchaKind, CaptchaOptions, Result};
use rand::Rng;
use serde::Serialize;

/// Multiply sign as displayed in formulas.
pub const MULTIPLY_PLACEHOLDER: char = 'x';

/// Operators drawn by [`generate_random_formula`].
pub const OPERATOR_SET: [char; 3] = ['+', '-', MULTIPLY_PLACEHOLDER];

const MAX_FORMULA_ATTEMPTS: usize = 1000;

/// Display text and expected answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Challenge {
    pub text: String,
    pub answer: String,
}

/// Draws `length` characters uniformly from `chars`.
///
/// # Errors
///
/// Returns [`CaptchaError::Config`] if `chars` is empty.
pub fn generate_random_string(length: usize, chars: &[char], rng: &mut impl Rng) -> Result<String> {
    if chars.is_empty() {
        return Err(CaptchaError::Config(
            "effective character set must not be empty".to_string(),
        ));
    }
    Ok((0..length)
        .map(|_| chars[rng.random_range(0..chars.len())])
        .collect())
}

/// Builds `digit_count` operands in `1..=9` joined by random operators.
#[must_use]
pub fn generate_random_formula(digit_count: usize, rng: &mut impl Rng) -> String {
    let mut formula = String::with_capacity(digit_count * 2);
    for i in 0..digit_count {
        if i > 0 {
            formula.push(OPERATOR_SET[rng.random_range(0..OPERATOR_SET.len())]);
        }
        let digit = rng.random_range(1..=9_u32);
        formula.push(char::from_digit(digit, 10).unwrap_or('1'));
    }
    formula
}

/// Resamples [`generate_random_formula`] until the result is non-negative.
///
/// # Errors
///
/// Returns [`CaptchaError::Generation`] if no qualifying formula turns up
/// within a bounded number of attempts.
pub fn generate_positive_formula(digit_count: usize, rng: &mut impl Rng) -> Result<String> {
    positive_formula_within(digit_count, MAX_FORMULA_ATTEMPTS, rng)
}

fn positive_formula_within(
    digit_count: usize,
    attempts: usize,
    rng: &mut impl Rng,
) -> Result<String> {
    for _ in 0..attempts {
        let formula = generate_random_formula(digit_count, rng);
        if evaluate_formula(&formula)? >= 0 {
            return Ok(formula);
        }
    }
    Err(CaptchaError::Generation(format!(
        "no non-negative formula with {digit_count} operands after {attempts} attempts"
    )))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Number(i64),
    Op(char),
}

fn tokenize(formula: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = formula.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '0'..='9' => {
                let mut value = i64::from(c.to_digit(10).unwrap_or(0));
                while let Some(d) = chars.peek().and_then(|d| d.to_digit(10)) {
                    value = value
                        .checked_mul(10)
                        .and_then(|v| v.checked_add(i64::from(d)))
                        .ok_or_else(|| overflow(formula))?;
                    chars.next();
                }
                tokens.push(Token::Number(value));
            }
            '+' | '-' | '*' | '/' => tokens.push(Token::Op(c)),
            other => {
                return Err(CaptchaError::Formula(format!(
                    "unexpected character {other:?} in {formula:?}"
                )));
            }
        }
    }
    Ok(tokens)
}

fn overflow(formula: &str) -> CaptchaError {
    CaptchaError::Formula(format!("integer overflow in {formula:?}"))
}

/// Evaluates a formula with standard precedence.
///
/// The multiply placeholder is substituted with `*` first. Products and
/// quotients are resolved left to right, then sums and differences. Division
/// truncates toward zero.
///
/// # Errors
///
/// Returns [`CaptchaError::Formula`] for malformed text, division by zero or
/// overflow.
pub fn evaluate_formula(text: &str) -> Result<i64> {
    let formula = text.replace(MULTIPLY_PLACEHOLDER, "*");
    let tokens = tokenize(&formula)?;

    let malformed = || CaptchaError::Formula(format!("malformed formula {text:?}"));

    // Operands and operators must alternate, starting and ending with a number.
    if tokens.len() % 2 == 0 {
        return Err(malformed());
    }
    let mut iter = tokens.into_iter();
    let Some(Token::Number(first)) = iter.next() else {
        return Err(malformed());
    };

    let mut terms: Vec<(char, i64)> = Vec::new();
    let mut current = first;
    let mut pending_sign = '+';

    while let Some(op) = iter.next() {
        let (Token::Op(op), Some(Token::Number(rhs))) = (op, iter.next()) else {
            return Err(malformed());
        };
        match op {
            '*' => current = current.checked_mul(rhs).ok_or_else(|| overflow(text))?,
            '/' => {
                if rhs == 0 {
                    return Err(CaptchaError::Formula(format!("division by zero in {text:?}")));
                }
                current = current.checked_div(rhs).ok_or_else(|| overflow(text))?;
            }
            sign => {
                terms.push((pending_sign, current));
                pending_sign = sign;
                current = rhs;
            }
        }
    }
    terms.push((pending_sign, current));

    terms.into_iter().try_fold(0_i64, |acc, (sign, value)| {
        let next = if sign == '-' {
            acc.checked_sub(value)
        } else {
            acc.checked_add(value)
        };
        next.ok_or_else(|| overflow(text))
    })
}

impl CaptchaOptions {
    /// Generates fresh challenge content for these options.
    ///
    /// # Errors
    ///
    /// Returns [`CaptchaError::Config`] for a zero length or an empty
    /// effective character set, and formula errors from generation.
    pub fn challenge(&self, rng: &mut impl Rng) -> Result<Challenge> {
        let length = self.effective_length();
        if length == 0 {
            return Err(CaptchaError::Config("captcha length must be positive".to_string()));
        }

        let text = match self.kind {
            CaptchaKind::Formula if self.non_negative => generate_positive_formula(length, rng)?,
            CaptchaKind::Formula => generate_random_formula(length, rng),
            CaptchaKind::Number | CaptchaKind::Letter | CaptchaKind::Mix => {
                generate_random_string(length, &self.effective_chars(), rng)?
            }
        };
        self.kind.challenge_for_text(&text)
    }
}

impl CaptchaKind {
    /// Wraps caller-supplied text, evaluating it for formulas.
    ///
    /// # Errors
    ///
    /// Returns [`CaptchaError::Formula`] if a formula text cannot be evaluated.
    pub fn challenge_for_text(self, text: &str) -> Result<Challenge> {
        let answer = match self {
            Self::Formula => evaluate_formula(text)?.to_string(),
            Self::Number | Self::Letter | Self::Mix => text.to_string(),
        };
        Ok(Challenge {
            text: text.to_string(),
            answer,
        })
    }
}
