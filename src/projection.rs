//! Projection plan synthesis and application.
//!
//! A plan is built once per (source schema, target schema) pair by matching
//! field names, then applied per row to construct target instances. Only
//! flat, direct field-to-field copies are supported, with at most one
//! recorded coercion per field.

use std::collections::HashMap;
use std::sync::{LazyLock, RwLock};

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use tracing::debug;

use crate::ast::Value;
use crate::error::{ShapeError, ShapeResult};
use crate::schema::{FieldType, Record, Schema};

/// Process-wide plan cache keyed by the (source, target) schema pair.
///
/// Racing writers may both compute a plan; the plans are pure and equivalent,
/// so either result may be stored.
static PLAN_CACHE: LazyLock<RwLock<HashMap<(usize, usize), ProjectionPlan>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// A recorded type-cast between a source and a target field type.
///
/// Legality is checked only when a value actually flows through it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coercion {
    pub from: FieldType,
    pub to: FieldType,
}

impl Coercion {
    /// Cast a runtime value to the target type.
    ///
    /// Null passes through untouched, the numeric family interconverts, and
    /// Date widens to Timestamp (midnight UTC). Anything else fails with
    /// `CoercionFailure` naming the field and both types.
    pub fn apply(&self, field: &str, value: Value) -> ShapeResult<Value> {
        if value.is_null() || self.to.matches(&value) {
            return Ok(value);
        }

        let cast = match (&value, self.to) {
            (Value::Int(n), FieldType::Float) => Some(Value::Float(*n as f64)),
            (Value::Int(n), FieldType::Decimal) => Some(Value::Decimal(Decimal::from(*n))),
            (Value::Float(x), FieldType::Int) => Some(Value::Int(*x as i64)),
            (Value::Float(x), FieldType::Decimal) => Decimal::from_f64(*x).map(Value::Decimal),
            (Value::Decimal(d), FieldType::Int) => d.trunc().to_i64().map(Value::Int),
            (Value::Decimal(d), FieldType::Float) => d.to_f64().map(Value::Float),
            (Value::Date(d), FieldType::Timestamp) => d
                .and_hms_opt(0, 0, 0)
                .map(|midnight| Value::Timestamp(midnight.and_utc())),
            _ => None,
        };

        match cast {
            Some(value) => Ok(value),
            None => Err(ShapeError::CoercionFailure {
                field: field.to_string(),
                from: self.from,
                to: self.to,
            }),
        }
    }
}

/// One planned copy: the shared field name plus an optional coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCopy {
    pub field: String,
    pub coercion: Option<Coercion>,
}

/// A field-by-field recipe for constructing a target-shaped value from a
/// source-shaped value.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionPlan {
    source: &'static str,
    target: &'static str,
    copies: Vec<FieldCopy>,
}

impl ProjectionPlan {
    /// Build a plan between two schemas by exact-name matching.
    ///
    /// Non-writable target fields, target fields with no same-named source,
    /// and unreadable source fields are omitted silently; partial projection
    /// is the normal outcome, not a failure. A declared-type mismatch records
    /// a [`Coercion`] checked at application time.
    pub fn between(source: &'static Schema, target: &'static Schema) -> ProjectionPlan {
        let mut copies = Vec::new();
        for field in &target.fields {
            if !field.writable {
                continue;
            }
            let src = match source.lookup(field.name) {
                Some(src) if src.readable => src,
                _ => continue,
            };
            let coercion = if src.typ == field.typ {
                None
            } else {
                Some(Coercion {
                    from: src.typ,
                    to: field.typ,
                })
            };
            copies.push(FieldCopy {
                field: field.name.to_string(),
                coercion,
            });
        }
        debug!(
            source = source.name,
            target = target.name,
            fields = copies.len(),
            "synthesized projection plan"
        );
        ProjectionPlan {
            source: source.name,
            target: target.name,
            copies,
        }
    }

    /// Cached synthesis for a (source, target) record type pair.
    pub fn for_types<S: Record, T: Record>() -> ProjectionPlan {
        let key = (
            S::schema() as *const Schema as usize,
            T::schema() as *const Schema as usize,
        );
        if let Ok(cache) = PLAN_CACHE.read() {
            if let Some(plan) = cache.get(&key) {
                return plan.clone();
            }
        }
        let plan = ProjectionPlan::between(S::schema(), T::schema());
        if let Ok(mut cache) = PLAN_CACHE.write() {
            cache.insert(key, plan.clone());
        }
        plan
    }

    /// Apply the plan: construct a default target and assign every planned
    /// field. Target fields outside the plan keep their default values.
    pub fn apply<S: Record, T: Record + Default>(&self, source: &S) -> ShapeResult<T> {
        let mut target = T::default();
        for copy in &self.copies {
            let mut value = source.get(&copy.field);
            if let Some(coercion) = &copy.coercion {
                value = coercion.apply(&copy.field, value)?;
            }
            target.set(&copy.field, value);
        }
        Ok(target)
    }

    /// Planned target field names, in target declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.copies.iter().map(|copy| copy.field.as_str())
    }

    /// Name of the source schema this plan reads from.
    pub fn source(&self) -> &'static str {
        self.source
    }

    /// Name of the target schema this plan constructs.
    pub fn target(&self) -> &'static str {
        self.target
    }

    pub fn len(&self) -> usize {
        self.copies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.copies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use super::*;
    use pretty_assertions::assert_eq;

    static SOURCE: LazyLock<Schema> = LazyLock::new(|| {
        Schema::new("User")
            .field("Name", FieldType::Text)
            .field("Age", FieldType::Int)
            .field("Secret", FieldType::Text)
    });

    static TARGET: LazyLock<Schema> = LazyLock::new(|| {
        Schema::new("UserSummary")
            .field("Name", FieldType::Text)
            .field("Age", FieldType::Float)
            .field("Nickname", FieldType::Text)
            .read_only("Tag", FieldType::Text)
    });

    static BAD_TARGET: LazyLock<Schema> =
        LazyLock::new(|| Schema::new("NameAsNumber").field("Name", FieldType::Int));

    #[derive(Default)]
    struct User {
        name: String,
        age: i64,
    }

    impl Record for User {
        fn schema() -> &'static Schema {
            LazyLock::force(&SOURCE)
        }

        fn get(&self, field: &str) -> Value {
            match field {
                "Name" => Value::from(self.name.as_str()),
                "Age" => Value::Int(self.age),
                "Secret" => Value::Null,
                _ => Value::Null,
            }
        }

        fn set(&mut self, _field: &str, _value: Value) {}
    }

    #[derive(Debug, Default, PartialEq)]
    struct UserSummary {
        name: String,
        age: f64,
        nickname: String,
        tag: String,
    }

    impl Record for UserSummary {
        fn schema() -> &'static Schema {
            LazyLock::force(&TARGET)
        }

        fn get(&self, field: &str) -> Value {
            match field {
                "Name" => Value::from(self.name.as_str()),
                "Age" => Value::Float(self.age),
                "Nickname" => Value::from(self.nickname.as_str()),
                "Tag" => Value::from(self.tag.as_str()),
                _ => Value::Null,
            }
        }

        fn set(&mut self, field: &str, value: Value) {
            match (field, value) {
                ("Name", Value::Text(name)) => self.name = name,
                ("Age", Value::Float(age)) => self.age = age,
                ("Nickname", Value::Text(nickname)) => self.nickname = nickname,
                _ => {}
            }
        }
    }

    #[derive(Default, Debug)]
    struct NameAsNumber {
        name: i64,
    }

    impl Record for NameAsNumber {
        fn schema() -> &'static Schema {
            LazyLock::force(&BAD_TARGET)
        }

        fn get(&self, field: &str) -> Value {
            match field {
                "Name" => Value::Int(self.name),
                _ => Value::Null,
            }
        }

        fn set(&mut self, field: &str, value: Value) {
            if let ("Name", Value::Int(name)) = (field, value) {
                self.name = name;
            }
        }
    }

    #[test]
    fn test_plan_skips_unmatched_and_unwritable_fields() {
        let plan = ProjectionPlan::between(User::schema(), UserSummary::schema());
        assert_eq!(plan.source(), "User");
        assert_eq!(plan.target(), "UserSummary");
        let fields: Vec<&str> = plan.fields().collect();
        // Nickname has no source; Tag has no setter.
        assert_eq!(fields, vec!["Name", "Age"]);
    }

    #[test]
    fn test_plan_records_coercion_on_type_mismatch() {
        let plan = ProjectionPlan::between(User::schema(), UserSummary::schema());
        let age = plan.copies.iter().find(|c| c.field == "Age").unwrap();
        assert_eq!(
            age.coercion,
            Some(Coercion {
                from: FieldType::Int,
                to: FieldType::Float,
            })
        );
    }

    #[test]
    fn test_apply_copies_and_coerces() {
        let plan = ProjectionPlan::between(User::schema(), UserSummary::schema());
        let user = User {
            name: "Ada".to_string(),
            age: 36,
        };
        let summary: UserSummary = plan.apply(&user).unwrap();
        assert_eq!(
            summary,
            UserSummary {
                name: "Ada".to_string(),
                age: 36.0,
                nickname: String::new(),
                tag: String::new(),
            }
        );
    }

    #[test]
    fn test_incompatible_cast_fails_at_apply_time() {
        let plan = ProjectionPlan::between(User::schema(), NameAsNumber::schema());
        assert_eq!(plan.len(), 1);

        let user = User {
            name: "Ada".to_string(),
            age: 36,
        };
        let err = plan.apply::<User, NameAsNumber>(&user).unwrap_err();
        match err {
            ShapeError::CoercionFailure { field, from, to } => {
                assert_eq!(field, "Name");
                assert_eq!(from, FieldType::Text);
                assert_eq!(to, FieldType::Int);
            }
            other => panic!("expected CoercionFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_null_passes_through_a_coercion() {
        let coercion = Coercion {
            from: FieldType::Text,
            to: FieldType::Int,
        };
        assert_eq!(coercion.apply("Secret", Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_date_widens_to_timestamp() {
        use chrono::NaiveDate;

        let coercion = Coercion {
            from: FieldType::Date,
            to: FieldType::Timestamp,
        };
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let widened = coercion.apply("Since", Value::Date(date)).unwrap();
        match widened {
            Value::Timestamp(t) => assert_eq!(t.to_rfc3339(), "2024-03-01T00:00:00+00:00"),
            other => panic!("expected Timestamp, got {other:?}"),
        }
    }

    #[test]
    fn test_cached_plan_is_equivalent() {
        let cached = ProjectionPlan::for_types::<User, UserSummary>();
        let fresh = ProjectionPlan::between(User::schema(), UserSummary::schema());
        assert_eq!(cached, fresh);
        // Second lookup hits the cache and stays equivalent.
        assert_eq!(ProjectionPlan::for_types::<User, UserSummary>(), fresh);
    }
}
