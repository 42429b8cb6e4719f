//! Value validation engine
//!
//! Every field type validates raw input through the same contract:
//!
//! 1. absent + non-nullable rejects with a non-null violation
//! 2. absent + nullable yields the configured default, or stays absent
//! 3. the raw value is type-checked against the native representation
//! 4. variant-specific range/shape checks run, each with a distinct,
//!    human-readable message
//! 5. the accepted (possibly coerced) value is returned
//!
//! Raw values arrive as `serde_json::Value`; JSON null and an absent value
//! are equivalent. Validation is pure and synchronous; dynamic bounds are
//! read through the field's [`TimeSource`] strategies at call time.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use super::errors::{SchemaError, SchemaResult, ValidationError};
use super::types::{
    BoolField, CollectionSchema, DateTimeField, EnumField, Field, FieldType, FloatField, IdField,
    IntField, RelationField, TextField, TimeSource,
};
use crate::id::validate_id;

/// Normalized value produced by the validation engine.
///
/// Id, Enum and SingleRelation values normalize to `Text`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(DateTime<Utc>),
}

fn check_nullable(nullable: bool, value: Option<&Value>) -> Result<(), ValidationError> {
    if value.is_none() && !nullable {
        return Err(ValidationError::NonNullRequired);
    }

    Ok(())
}

fn expect_str<'a>(value: &'a Value) -> Result<&'a str, ValidationError> {
    value
        .as_str()
        .ok_or(ValidationError::TypeMismatch { expected: "string" })
}

impl IdField {
    fn validate(&self, value: Option<&Value>) -> SchemaResult<Option<FieldValue>> {
        // A primary key may be generated rather than supplied, so it is
        // never required from caller input.
        check_nullable(self.nullable || self.primary_key, value)?;

        let Some(value) = value else {
            return Ok(None);
        };

        let s = expect_str(value)?;
        validate_id(s)?;

        Ok(Some(FieldValue::Text(s.to_string())))
    }
}

impl TextField {
    fn validate(&self, value: Option<&Value>) -> SchemaResult<Option<FieldValue>> {
        check_nullable(self.nullable, value)?;

        let Some(value) = value else {
            return Ok(self.default_value.clone().map(FieldValue::Text));
        };

        let s = expect_str(value)?;
        let length = s.chars().count();

        if let Some(max) = self.max_length {
            if length > max {
                return Err(ValidationError::TooLong { max }.into());
            }
        }

        if let Some(min) = self.min_length {
            if length < min {
                return Err(ValidationError::TooShort { min }.into());
            }
        }

        if let Some(pattern) = &self.pattern {
            let re = Regex::new(pattern).map_err(|_| {
                SchemaError::Configuration(format!("invalid pattern {}", pattern))
            })?;

            if !re.is_match(s) {
                return Err(ValidationError::PatternMismatch {
                    pattern: pattern.clone(),
                }
                .into());
            }
        }

        Ok(Some(FieldValue::Text(s.to_string())))
    }
}

impl IntField {
    fn validate(&self, value: Option<&Value>) -> SchemaResult<Option<FieldValue>> {
        check_nullable(self.nullable, value)?;

        let Some(value) = value else {
            return Ok(self.default_value.map(FieldValue::Int));
        };

        let i = value.as_i64().ok_or(ValidationError::TypeMismatch {
            expected: "integer",
        })?;

        if let Some(min) = self.min_value {
            if i < min {
                return Err(ValidationError::OutOfRange {
                    detail: format!("too small, min value is {}", min),
                }
                .into());
            }
        }

        if let Some(max) = self.max_value {
            if i > max {
                return Err(ValidationError::OutOfRange {
                    detail: format!("too big, max value is {}", max),
                }
                .into());
            }
        }

        Ok(Some(FieldValue::Int(i)))
    }
}

impl FloatField {
    fn validate(&self, value: Option<&Value>) -> SchemaResult<Option<FieldValue>> {
        check_nullable(self.nullable, value)?;

        let Some(value) = value else {
            return Ok(self.default_value.map(FieldValue::Float));
        };

        // Integer input is accepted as float.
        let f = value
            .as_f64()
            .ok_or(ValidationError::TypeMismatch { expected: "float" })?;

        if let Some(min) = self.min_value {
            if f < min {
                return Err(ValidationError::OutOfRange {
                    detail: format!("too small, min value is {}", min),
                }
                .into());
            }
        }

        if let Some(max) = self.max_value {
            if f > max {
                return Err(ValidationError::OutOfRange {
                    detail: format!("too big, max value is {}", max),
                }
                .into());
            }
        }

        Ok(Some(FieldValue::Float(f)))
    }
}

impl BoolField {
    fn validate(&self, value: Option<&Value>) -> SchemaResult<Option<FieldValue>> {
        check_nullable(self.nullable, value)?;

        let Some(value) = value else {
            return Ok(self.default_value.map(FieldValue::Bool));
        };

        let b = value
            .as_bool()
            .ok_or(ValidationError::TypeMismatch { expected: "bool" })?;

        Ok(Some(FieldValue::Bool(b)))
    }
}

impl DateTimeField {
    fn validate(&self, value: Option<&Value>) -> SchemaResult<Option<FieldValue>> {
        check_nullable(self.nullable, value)?;

        let Some(value) = value else {
            let default = self.default_value.as_ref().map(TimeSource::get);
            return Ok(default.map(FieldValue::DateTime));
        };

        let s = value.as_str().ok_or(ValidationError::TypeMismatch {
            expected: "RFC-3339 datetime string",
        })?;

        let instant = DateTime::parse_from_rfc3339(s)
            .map_err(|_| ValidationError::TypeMismatch {
                expected: "RFC-3339 datetime string",
            })?
            .with_timezone(&Utc);

        if let Some(min) = &self.min_value {
            let min = min.get();
            if instant < min {
                return Err(ValidationError::OutOfRange {
                    detail: format!("too early, min value is {}", min.to_rfc3339()),
                }
                .into());
            }
        }

        if let Some(max) = &self.max_value {
            let max = max.get();
            if instant > max {
                return Err(ValidationError::OutOfRange {
                    detail: format!("too late, max value is {}", max.to_rfc3339()),
                }
                .into());
            }
        }

        Ok(Some(FieldValue::DateTime(instant)))
    }
}

impl EnumField {
    fn validate(&self, value: Option<&Value>) -> SchemaResult<Option<FieldValue>> {
        // The configured default must itself be a member. Checked before
        // anything else so a bad configuration surfaces even when input is
        // supplied.
        if let Some(default) = &self.default_value {
            if !self.values.contains(default) {
                return Err(SchemaError::Configuration("invalid default value".into()));
            }
        }

        check_nullable(self.nullable, value)?;

        let Some(value) = value else {
            return Ok(self.default_value.clone().map(FieldValue::Text));
        };

        let s = expect_str(value)?;

        if !self.values.iter().any(|v| v == s) {
            return Err(ValidationError::NotEnumMember {
                allowed: self.values.join(", "),
            }
            .into());
        }

        Ok(Some(FieldValue::Text(s.to_string())))
    }
}

impl RelationField {
    fn validate(&self, value: Option<&Value>) -> SchemaResult<Option<FieldValue>> {
        check_nullable(self.nullable, value)?;

        let Some(value) = value else {
            return Ok(None);
        };

        // Identity-format validation is the id rule's.
        let s = expect_str(value)?;
        validate_id(s)?;

        Ok(Some(FieldValue::Text(s.to_string())))
    }
}

impl FieldType {
    /// Validates and normalizes one raw value against this type.
    ///
    /// `None` and JSON null are equivalent absent inputs. The result is
    /// `Ok(None)` when an absent value is accepted without a default.
    pub fn validate_value(&self, value: Option<&Value>) -> SchemaResult<Option<FieldValue>> {
        let value = value.filter(|v| !v.is_null());

        match self {
            Self::Id(config) => config.validate(value),
            Self::Text(config) => config.validate(value),
            Self::Int(config) => config.validate(value),
            Self::Float(config) => config.validate(value),
            Self::Bool(config) => config.validate(value),
            Self::DateTime(config) => config.validate(value),
            Self::Enum(config) => config.validate(value),
            Self::SingleRelation(config) => config.validate(value),
        }
    }
}

impl Field {
    /// Validates one raw value against this field's type.
    pub fn validate(&self, value: Option<&Value>) -> SchemaResult<Option<FieldValue>> {
        self.schema.field_type.validate_value(value)
    }
}

impl CollectionSchema {
    /// Validates a whole record before a write.
    ///
    /// Undeclared keys are rejected; declared fields validate in declared
    /// order, absent ones against `None`. The result pairs each field name
    /// with its normalized value.
    pub fn validate_record(
        &self,
        record: &serde_json::Map<String, Value>,
    ) -> SchemaResult<Vec<(String, Option<FieldValue>)>> {
        for key in record.keys() {
            if self.field(key).is_none() {
                return Err(ValidationError::UnknownField { field: key.clone() }.into());
            }
        }

        let mut normalized = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let value = field.validate(record.get(&field.name))?;
            normalized.push((field.name.clone(), value));
        }

        Ok(normalized)
    }
}
