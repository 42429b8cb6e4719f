//! Structural diff engine
//!
//! Compares a collection against its frozen baseline and derives the ordered
//! list of structural operations that converge the database:
//!
//! - no baseline: a single create-table carrying every column
//! - otherwise: table rename first, then column drops, renames and adds,
//!   in that fixed order so a rename target can reuse a just-dropped name
//!   and an added column cannot collide with a pre-rename name
//!
//! Fields are matched against the baseline through their own `original`
//! back-pointers, not by name; renames stay renames. Constraint-only changes
//! to an existing, unrenamed field are not diffed.

use std::fmt;

use serde::Serialize;

use super::types::{Collection, Field, FieldType};

/// Column definition handed to the storage capability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDef {
    pub name: String,
    pub native_type: String,
    pub nullable: bool,
    /// Trailing clauses such as `PRIMARY KEY` or a foreign-key reference.
    pub extras: Vec<String>,
}

impl ColumnDef {
    fn plain(name: &str, native_type: &str, nullable: bool) -> Self {
        Self {
            name: name.to_string(),
            native_type: native_type.to_string(),
            nullable,
            extras: Vec::new(),
        }
    }

    /// Derives the column definition for one field.
    ///
    /// The mapping is total over the field type catalog; the closed enum
    /// keeps it that way at compile time. Enum values are enforced by the
    /// validation engine, not by storage, so an enum column is plain text.
    pub fn from_field(field: &Field) -> Self {
        let name = field.name.as_str();

        match &field.schema.field_type {
            FieldType::Bool(c) => Self::plain(name, "BOOL", c.nullable),
            FieldType::DateTime(c) => Self::plain(name, "TIMESTAMP", c.nullable),
            FieldType::Enum(c) => Self::plain(name, "TEXT", c.nullable),
            FieldType::Float(c) => Self::plain(name, "REAL", c.nullable),
            FieldType::Id(c) => {
                // Storage is stricter than caller input: the column is NOT
                // NULL even though validation lets the key be generated.
                let mut def = Self::plain(name, "TEXT", c.nullable && !c.primary_key);
                if c.primary_key {
                    def.extras.push("PRIMARY KEY".to_string());
                }
                def
            }
            FieldType::Int(c) => Self::plain(name, "BIGINT", c.nullable),
            FieldType::SingleRelation(c) => {
                let mut def = Self::plain(name, "TEXT", c.nullable);
                def.extras.push(format!("REFERENCES {}(id)", c.collection));
                if c.cascade_delete {
                    def.extras.push("ON DELETE CASCADE".to_string());
                }
                def
            }
            FieldType::Text(c) => Self::plain(name, "TEXT", c.nullable),
        }
    }
}

/// One DDL-equivalent action derived by the diff engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StructuralOp {
    CreateTable {
        table: String,
        columns: Vec<ColumnDef>,
    },
    RenameTable {
        from: String,
        to: String,
    },
    DropColumn {
        table: String,
        column: String,
    },
    RenameColumn {
        table: String,
        from: String,
        to: String,
    },
    AddColumn {
        table: String,
        column: ColumnDef,
    },
    DropTable {
        table: String,
    },
}

impl fmt::Display for StructuralOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateTable { table, .. } => write!(f, "create table {}", table),
            Self::RenameTable { from, to } => write!(f, "rename table {} to {}", from, to),
            Self::DropColumn { table, column } => {
                write!(f, "drop column {} on {}", column, table)
            }
            Self::RenameColumn { table, from, to } => {
                write!(f, "rename column {} to {} on {}", from, to, table)
            }
            Self::AddColumn { table, column } => {
                write!(f, "add column {} on {}", column.name, table)
            }
            Self::DropTable { table } => write!(f, "drop table {}", table),
        }
    }
}

impl Collection {
    /// Computes the ordered operations converging the database to this
    /// collection's current state. Empty when nothing changed since the
    /// baseline.
    pub fn diff(&self) -> Vec<StructuralOp> {
        let Some(baseline) = self.original() else {
            return vec![StructuralOp::CreateTable {
                table: self.name.clone(),
                columns: self.schema.fields.iter().map(ColumnDef::from_field).collect(),
            }];
        };

        let mut ops = Vec::new();

        if baseline.name != self.name {
            ops.push(StructuralOp::RenameTable {
                from: baseline.name.clone(),
                to: self.name.clone(),
            });
        }

        // Every operation below the rename references the new table name.
        let table = &self.name;

        // Removed: baseline fields no surviving field points back to.
        for orig_field in &baseline.schema.fields {
            let survives = self
                .schema
                .fields
                .iter()
                .any(|f| f.original().is_some_and(|o| o.name == orig_field.name));

            if !survives {
                ops.push(StructuralOp::DropColumn {
                    table: table.clone(),
                    column: orig_field.name.clone(),
                });
            }
        }

        // Renamed: persisted fields whose recorded name differs.
        for field in &self.schema.fields {
            if let Some(orig) = field.original() {
                if orig.name != field.name {
                    ops.push(StructuralOp::RenameColumn {
                        table: table.clone(),
                        from: orig.name.clone(),
                        to: field.name.clone(),
                    });
                }
            }
        }

        // Added: fields that have never been persisted.
        for field in &self.schema.fields {
            if field.original().is_none() {
                ops.push(StructuralOp::AddColumn {
                    table: table.clone(),
                    column: ColumnDef::from_field(field),
                });
            }
        }

        ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{IdField, RelationField, TextField};

    fn users() -> Collection {
        Collection::with_fields(
            "users",
            vec![
                Field::new("id", FieldType::primary_id()),
                Field::new(
                    "email",
                    FieldType::Text(TextField {
                        max_length: Some(100),
                        ..Default::default()
                    }),
                ),
            ],
        )
    }

    #[test]
    fn test_create_if_absent() {
        let ops = users().diff();

        assert_eq!(ops.len(), 1);
        let StructuralOp::CreateTable { table, columns } = &ops[0] else {
            panic!("expected create table, got {:?}", ops[0]);
        };

        assert_eq!(table, "users");
        let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "email"]);
    }

    #[test]
    fn test_diff_is_empty_after_forward() {
        let mut collection = users();
        collection.forward();
        assert!(collection.diff().is_empty());
    }

    #[test]
    fn test_table_rename_comes_first_and_uses_new_name_after() {
        let mut collection = users();
        collection.forward();

        collection.name = "people".into();
        collection
            .schema
            .fields
            .push(Field::new("active", FieldType::boolean()));

        let ops = collection.diff();
        assert_eq!(ops.len(), 2);
        assert_eq!(
            ops[0],
            StructuralOp::RenameTable {
                from: "users".into(),
                to: "people".into(),
            }
        );
        let StructuralOp::AddColumn { table, .. } = &ops[1] else {
            panic!("expected add column, got {:?}", ops[1]);
        };
        assert_eq!(table, "people");
    }

    #[test]
    fn test_field_rename_yields_single_rename() {
        let mut collection = users();
        collection.forward();

        collection.schema.field_mut("email").unwrap().name = "contact".into();

        let ops = collection.diff();
        assert_eq!(
            ops,
            vec![StructuralOp::RenameColumn {
                table: "users".into(),
                from: "email".into(),
                to: "contact".into(),
            }]
        );
    }

    #[test]
    fn test_removed_field_yields_drop() {
        let mut collection = users();
        collection.forward();

        collection.schema.fields.retain(|f| f.name != "email");

        let ops = collection.diff();
        assert_eq!(
            ops,
            vec![StructuralOp::DropColumn {
                table: "users".into(),
                column: "email".into(),
            }]
        );
    }

    #[test]
    fn test_drop_rename_add_order_is_fixed() {
        let mut collection = users();
        collection.forward();

        // Drop email, rename id, add two fields.
        collection.schema.fields.retain(|f| f.name != "email");
        collection.schema.field_mut("id").unwrap().name = "pk".into();
        collection
            .schema
            .fields
            .push(Field::new("active", FieldType::boolean()));
        collection
            .schema
            .fields
            .push(Field::new("score", FieldType::float()));

        let ops = collection.diff();
        let kinds: Vec<_> = ops
            .iter()
            .map(|op| match op {
                StructuralOp::DropColumn { .. } => "drop",
                StructuralOp::RenameColumn { .. } => "rename",
                StructuralOp::AddColumn { .. } => "add",
                other => panic!("unexpected op {:?}", other),
            })
            .collect();

        assert_eq!(kinds, vec!["drop", "rename", "add", "add"]);
    }

    #[test]
    fn test_added_removed_renamed_are_disjoint() {
        let mut collection = users();
        collection.forward();

        // Rename one field, add another with the old name. The renamed field
        // must not be classified as removed or added, and the new field must
        // not be classified as a rename.
        collection.schema.field_mut("email").unwrap().name = "contact".into();
        collection
            .schema
            .fields
            .push(Field::new("email", FieldType::text()));

        let ops = collection.diff();
        assert_eq!(ops.len(), 2);
        assert_eq!(
            ops[0],
            StructuralOp::RenameColumn {
                table: "users".into(),
                from: "email".into(),
                to: "contact".into(),
            }
        );
        let StructuralOp::AddColumn { column, .. } = &ops[1] else {
            panic!("expected add column, got {:?}", ops[1]);
        };
        assert_eq!(column.name, "email");
    }

    #[test]
    fn test_primary_id_column_definition() {
        let def = ColumnDef::from_field(&Field::new("id", FieldType::primary_id()));

        assert_eq!(def.native_type, "TEXT");
        assert!(!def.nullable);
        assert_eq!(def.extras, vec!["PRIMARY KEY".to_string()]);
    }

    #[test]
    fn test_plain_id_column_keeps_declared_nullability() {
        let def = ColumnDef::from_field(&Field::new(
            "ref",
            FieldType::Id(IdField {
                nullable: true,
                primary_key: false,
            }),
        ));

        assert!(def.nullable);
        assert!(def.extras.is_empty());
    }

    #[test]
    fn test_relation_column_definition() {
        let def = ColumnDef::from_field(&Field::new(
            "author",
            FieldType::SingleRelation(RelationField {
                nullable: true,
                collection: "users".into(),
                cascade_delete: true,
            }),
        ));

        assert_eq!(def.native_type, "TEXT");
        assert!(def.nullable);
        assert_eq!(
            def.extras,
            vec!["REFERENCES users(id)".to_string(), "ON DELETE CASCADE".to_string()]
        );
    }

    #[test]
    fn test_native_type_mapping() {
        let cases = [
            (FieldType::boolean(), "BOOL"),
            (FieldType::date_time(), "TIMESTAMP"),
            (FieldType::enumeration(["a"]), "TEXT"),
            (FieldType::float(), "REAL"),
            (FieldType::int(), "BIGINT"),
            (FieldType::text(), "TEXT"),
        ];

        for (field_type, expected) in cases {
            let def = ColumnDef::from_field(&Field::new("c", field_type));
            assert_eq!(def.native_type, expected);
        }
    }

    #[test]
    fn test_operation_display() {
        let op = StructuralOp::RenameColumn {
            table: "users".into(),
            from: "email".into(),
            to: "contact".into(),
        };
        assert_eq!(op.to_string(), "rename column email to contact on users");
    }
}
