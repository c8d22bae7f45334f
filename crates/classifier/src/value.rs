// Rust guideline compliant 2026-10-18

//! Dynamically-typed values compared by rule conditions.

use std::cmp::Ordering;
use std::fmt;

/// A field value read from a snapshot, or an expected value in a condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Int(i64),
    List(Vec<Value>),
}

impl Value {
    /// Empty text, the value of a present-but-unset field.
    #[must_use]
    pub fn empty() -> Self {
        Value::Text(String::new())
    }

    /// List of text values.
    #[must_use]
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::List(items.into_iter().map(|s| Value::Text(s.into())).collect())
    }

    /// Integer reading: an `Int`, or `Text` holding a base-10 integer.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Text(s) => s.parse().ok(),
            Value::List(_) => None,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            #[expect(clippy::cast_precision_loss, reason = "state codes and counters are small")]
            Value::Int(i) => Some(*i as f64),
            Value::Text(s) => s.parse().ok(),
            Value::List(_) => None,
        }
    }

    /// `true` for empty text.
    #[must_use]
    pub fn is_empty_text(&self) -> bool {
        matches!(self, Value::Text(s) if s.is_empty())
    }

    /// Equality used by `eq`, `ne`, `in` and `not_in`.
    ///
    /// Operands that both read as integers compare numerically, so `"200"`
    /// equals `200` and `"007"` equals `"7"`. Everything else compares
    /// structurally.
    #[must_use]
    pub fn loosely_equals(&self, other: &Value) -> bool {
        if let (Some(a), Some(b)) = (self.as_int(), other.as_int()) {
            return a == b;
        }
        match (self, other) {
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loosely_equals(y))
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }

    /// Ordering used by `lt` and `gt`.
    ///
    /// Numeric when both operands parse as numbers, lexicographic on the
    /// rendered text otherwise. `None` only for NaN operands.
    #[must_use]
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => Some(self.to_string().cmp(&other.to_string())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl<const N: usize> From<[&str; N]> for Value {
    fn from(items: [&str; N]) -> Self {
        Value::list(items)
    }
}
