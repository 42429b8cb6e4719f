//! Schema entities and the field type catalog
//!
//! A [`Collection`] is a declared table-like entity: a name plus an ordered
//! field list. Every collection and field carries an optional `original`
//! slot, the frozen baseline as of the last successful reconciliation.
//! An empty slot means the entity has never been persisted.
//!
//! The catalog of field types is closed: every routine consuming it
//! (column derivation, validation) matches exhaustively, so adding a
//! variant forces a review of all consumers.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Zero-argument strategy producing an instant.
///
/// Used by [`DateTimeField`] for dynamic defaults and bounds ("not before
/// now"). Evaluated lazily, at validation time only; substitute a fixed
/// clock in tests.
#[derive(Clone)]
pub struct TimeSource(Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>);

impl TimeSource {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// The wall clock.
    pub fn now() -> Self {
        Self::new(Utc::now)
    }

    /// Always yields the given instant.
    pub fn fixed(instant: DateTime<Utc>) -> Self {
        Self::new(move || instant)
    }

    pub fn get(&self) -> DateTime<Utc> {
        (self.0)()
    }
}

impl fmt::Debug for TimeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TimeSource(..)")
    }
}

/// Opaque access-policy predicate attached to a collection.
///
/// Evaluated by outer layers against a candidate record; the core never
/// invokes it.
#[derive(Clone)]
pub struct AccessRule(Arc<dyn Fn(&serde_json::Value) -> bool + Send + Sync>);

impl AccessRule {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&serde_json::Value) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn allows(&self, record: &serde_json::Value) -> bool {
        (self.0)(record)
    }
}

impl fmt::Debug for AccessRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessRule(..)")
    }
}

/// Surrogate key column. `primary_key` additionally marks the column as the
/// table's primary key; a primary key may be supplied or generated, so it is
/// treated as nullable at validation time.
#[derive(Debug, Clone, Default)]
pub struct IdField {
    pub nullable: bool,
    pub primary_key: bool,
}

/// UTF-8 text column with optional length bounds (in characters, inclusive)
/// and an optional regex pattern.
#[derive(Debug, Clone, Default)]
pub struct TextField {
    pub nullable: bool,
    pub default_value: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<String>,
}

/// 64-bit signed integer column with optional inclusive bounds.
#[derive(Debug, Clone, Default)]
pub struct IntField {
    pub nullable: bool,
    pub default_value: Option<i64>,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
}

/// 64-bit floating point column with optional inclusive bounds.
#[derive(Debug, Clone, Default)]
pub struct FloatField {
    pub nullable: bool,
    pub default_value: Option<f64>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

/// Boolean column.
#[derive(Debug, Clone, Default)]
pub struct BoolField {
    pub nullable: bool,
    pub default_value: Option<bool>,
}

/// Timestamp column. Default and bounds are lazy [`TimeSource`] strategies
/// so constraints like "not before now" are computed at validation time.
#[derive(Debug, Clone, Default)]
pub struct DateTimeField {
    pub nullable: bool,
    pub default_value: Option<TimeSource>,
    pub min_value: Option<TimeSource>,
    pub max_value: Option<TimeSource>,
}

/// Text column restricted to a fixed, ordered set of allowed values.
/// Membership is enforced by the validation engine, not by storage.
#[derive(Debug, Clone, Default)]
pub struct EnumField {
    pub nullable: bool,
    pub default_value: Option<String>,
    pub values: Vec<String>,
}

/// Reference to a single record of another collection, stored as that
/// record's identifier. `cascade_delete` is consumed when deriving the
/// foreign-key column definition.
#[derive(Debug, Clone, Default)]
pub struct RelationField {
    pub nullable: bool,
    pub collection: String,
    pub cascade_delete: bool,
}

/// The closed set of semantic column types.
#[derive(Debug, Clone)]
pub enum FieldType {
    Id(IdField),
    Text(TextField),
    Int(IntField),
    Float(FloatField),
    Bool(BoolField),
    DateTime(DateTimeField),
    Enum(EnumField),
    SingleRelation(RelationField),
}

impl FieldType {
    /// Non-nullable primary-key id.
    pub fn primary_id() -> Self {
        Self::Id(IdField {
            primary_key: true,
            ..Default::default()
        })
    }

    pub fn id() -> Self {
        Self::Id(IdField::default())
    }

    pub fn text() -> Self {
        Self::Text(TextField::default())
    }

    pub fn int() -> Self {
        Self::Int(IntField::default())
    }

    pub fn float() -> Self {
        Self::Float(FloatField::default())
    }

    pub fn boolean() -> Self {
        Self::Bool(BoolField::default())
    }

    pub fn date_time() -> Self {
        Self::DateTime(DateTimeField::default())
    }

    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum(EnumField {
            values: values.into_iter().map(Into::into).collect(),
            ..Default::default()
        })
    }

    pub fn relation(collection: impl Into<String>) -> Self {
        Self::SingleRelation(RelationField {
            collection: collection.into(),
            ..Default::default()
        })
    }

    /// Returns the type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Id(_) => "id",
            Self::Text(_) => "text",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::DateTime(_) => "datetime",
            Self::Enum(_) => "enum",
            Self::SingleRelation(_) => "single_relation",
        }
    }

    /// Effective nullability at validation time. A primary-key id counts as
    /// nullable: the key may be generated rather than supplied by the caller.
    pub fn is_nullable(&self) -> bool {
        match self {
            Self::Id(c) => c.nullable || c.primary_key,
            Self::Text(c) => c.nullable,
            Self::Int(c) => c.nullable,
            Self::Float(c) => c.nullable,
            Self::Bool(c) => c.nullable,
            Self::DateTime(c) => c.nullable,
            Self::Enum(c) => c.nullable,
            Self::SingleRelation(c) => c.nullable,
        }
    }
}

/// Wraps exactly one [`FieldType`]. Owned by its [`Field`].
#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub field_type: FieldType,
}

impl FieldSchema {
    pub fn new(field_type: FieldType) -> Self {
        Self { field_type }
    }
}

/// A named, typed column declaration within a collection.
#[derive(Debug)]
pub struct Field {
    pub name: String,
    pub schema: FieldSchema,
    original: Option<Box<Field>>,
}

// Clones never carry the baseline slot: a clone is a fresh, never-persisted
// declaration. This also bounds baseline history to depth 1.
impl Clone for Field {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            schema: self.schema.clone(),
            original: None,
        }
    }
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            schema: FieldSchema::new(field_type),
            original: None,
        }
    }

    /// The frozen baseline from the last successful reconciliation, if any.
    pub fn original(&self) -> Option<&Field> {
        self.original.as_deref()
    }

    /// Freezes the current state as the new baseline.
    pub fn forward(&mut self) {
        self.original = Some(Box::new(self.clone()));
    }
}

/// Ordered field list of a collection. Order is the declared column order.
#[derive(Debug, Clone, Default)]
pub struct CollectionSchema {
    pub fields: Vec<Field>,
    pub read_rule: Option<AccessRule>,
    pub write_rule: Option<AccessRule>,
}

impl CollectionSchema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            read_rule: None,
            write_rule: None,
        }
    }

    /// Looks a field up by its current name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name == name)
    }
}

/// A declared table-like entity.
#[derive(Debug)]
pub struct Collection {
    pub name: String,
    pub schema: CollectionSchema,
    original: Option<Box<Collection>>,
}

impl Clone for Collection {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            schema: self.schema.clone(),
            original: None,
        }
    }
}

impl Collection {
    pub fn new(name: impl Into<String>, schema: CollectionSchema) -> Self {
        Self {
            name: name.into(),
            schema,
            original: None,
        }
    }

    /// Collection with the given fields and no access rules.
    pub fn with_fields(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self::new(name, CollectionSchema::new(fields))
    }

    /// The frozen baseline from the last successful reconciliation, if any.
    pub fn original(&self) -> Option<&Collection> {
        self.original.as_deref()
    }

    /// Advances the baseline to the current state, recursively: the
    /// collection's `original` becomes a frozen clone of `{name, schema}`,
    /// and every field's `original` becomes a frozen clone of that field.
    ///
    /// Must be called exactly once per successful reconciliation. Calling it
    /// without a successful apply makes the next diff report "no changes"
    /// against a database that was never converged.
    pub fn forward(&mut self) {
        self.original = Some(Box::new(self.clone()));
        for field in &mut self.schema.fields {
            field.forward();
        }
    }
}

/// Schema of a database view. No design lives here yet; views exist only so
/// the storage capability can name them.
#[derive(Debug, Clone, Default)]
pub struct ViewSchema {}

/// A declared view. `original_name` tracks renames the way a collection's
/// baseline does.
#[derive(Debug, Clone)]
pub struct View {
    pub name: String,
    pub original_name: String,
    pub schema: ViewSchema,
}
