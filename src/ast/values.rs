use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::Record;

/// A value read through an accessor or copied by a projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// String
    Text(String),
    /// UUID value
    Uuid(Uuid),
    /// Calendar date
    Date(NaiveDate),
    /// UTC timestamp
    Timestamp(DateTime<Utc>),
    /// Fixed-point decimal
    Decimal(Decimal),
    /// Snapshot of a nested record: (field name, value) pairs in schema order
    Struct(Vec<(String, Value)>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Snapshot a record as a nested struct value, readable fields only,
    /// in schema declaration order.
    pub fn record<R: Record>(record: &R) -> Value {
        let fields = R::schema()
            .fields
            .iter()
            .filter(|field| field.readable)
            .map(|field| (field.name.to_string(), record.get(field.name)))
            .collect();
        Value::Struct(fields)
    }

    /// Look up a field of a struct value by exact name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(fields) => fields
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Total ordering used when a value becomes a sort key.
    ///
    /// Nulls sort first; the numeric kinds compare across each other; struct
    /// values compare equal. This is the pipeline convention, not a general
    /// semantic ordering.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Value::Decimal(a), Value::Decimal(b)) => a.cmp(b),
            (Value::Int(a), Value::Float(b)) => {
                (*a as f64).partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (Value::Float(a), Value::Int(b)) => {
                a.partial_cmp(&(*b as f64)).unwrap_or(Ordering::Equal)
            }
            (Value::Int(a), Value::Decimal(b)) => Decimal::from(*a).cmp(b),
            (Value::Decimal(a), Value::Int(b)) => a.cmp(&Decimal::from(*b)),
            (Value::Float(a), Value::Decimal(b)) => a
                .partial_cmp(&b.to_f64().unwrap_or(f64::NAN))
                .unwrap_or(Ordering::Equal),
            (Value::Decimal(a), Value::Float(b)) => a
                .to_f64()
                .unwrap_or(f64::NAN)
                .partial_cmp(b)
                .unwrap_or(Ordering::Equal),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Uuid(a), Value::Uuid(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (Value::Date(a), Value::Timestamp(b)) => match a.and_hms_opt(0, 0, 0) {
                Some(t) => t.and_utc().cmp(b),
                None => Ordering::Equal,
            },
            (Value::Timestamp(a), Value::Date(b)) => match b.and_hms_opt(0, 0, 0) {
                Some(t) => a.cmp(&t.and_utc()),
                None => Ordering::Equal,
            },
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) | Value::Decimal(_) => 2,
            Value::Text(_) => 3,
            Value::Uuid(_) => 4,
            Value::Date(_) | Value::Timestamp(_) => 5,
            Value::Struct(_) => 6,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "'{}'", s),
            Value::Uuid(u) => write!(f, "'{}'", u),
            Value::Date(d) => write!(f, "{}", d),
            Value::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Struct(fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Value::Uuid(u)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Timestamp(t)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(opt: Option<V>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nulls_sort_first() {
        assert_eq!(Value::Null.sort_cmp(&Value::Int(1)), Ordering::Less);
        assert_eq!(Value::Int(1).sort_cmp(&Value::Null), Ordering::Greater);
        assert_eq!(Value::Null.sort_cmp(&Value::Null), Ordering::Equal);
    }

    #[test]
    fn test_numeric_cross_compare() {
        assert_eq!(Value::Int(2).sort_cmp(&Value::Float(2.5)), Ordering::Less);
        assert_eq!(
            Value::Decimal(Decimal::from(3)).sort_cmp(&Value::Int(2)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from(Some(5i64)), Value::Int(5));
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Text("x".to_string()).to_string(), "'x'");
        let s = Value::Struct(vec![("City".to_string(), Value::from("Oslo"))]);
        assert_eq!(s.to_string(), "{City: 'Oslo'}");
    }
}
