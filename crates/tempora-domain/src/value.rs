//! Value module - typed observation values carried by propositions

use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed value attached to a proposition or produced by an abstraction
/// algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// A categorical string value.
    Nominal(String),
    /// A numeric value.
    Number(f64),
    /// A boolean value.
    Boolean(bool),
    /// A value from an ordered category scale.
    Ordinal {
        /// The category label.
        value: String,
        /// The category's position on its scale.
        rank: i32,
    },
    /// An ordered list of values.
    List(Vec<Value>),
}

impl Value {
    /// The numeric content, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The string content, if this is a nominal or ordinal value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Nominal(s) => Some(s),
            Value::Ordinal { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Compare two values where an ordering is meaningful: numbers by
    /// magnitude, ordinals by rank. Everything else is unordered.
    pub fn partial_order(&self, other: &Value) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::Ordinal { rank: a, .. }, Value::Ordinal { rank: b, .. }) => {
                Some(a.cmp(b))
            }
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Nominal(s.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nominal(s) => write!(f, "{}", s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Ordinal { value, rank } => write!(f, "{}#{}", value, rank),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn test_number_accessor() {
        assert_eq!(Value::Number(1.5).as_number(), Some(1.5));
        assert_eq!(Value::Boolean(true).as_number(), None);
    }

    #[test]
    fn test_partial_order() {
        let low = Value::Ordinal {
            value: "low".to_string(),
            rank: 0,
        };
        let high = Value::Ordinal {
            value: "high".to_string(),
            rank: 2,
        };
        assert_eq!(low.partial_order(&high), Some(Ordering::Less));
        assert_eq!(
            Value::Number(3.0).partial_order(&Value::Number(2.0)),
            Some(Ordering::Greater)
        );
        assert_eq!(low.partial_order(&Value::Number(1.0)), None);
    }

    #[test]
    fn test_display_list() {
        let v = Value::List(vec![Value::Number(1.0), Value::from("a")]);
        assert_eq!(v.to_string(), "[1, a]");
    }
}
