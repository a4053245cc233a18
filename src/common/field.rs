use crate::error::{Error, Result};

use aws_sdk_dynamodb::types;
use serde::{Deserialize, Serialize};
use std::collections;

/// Name of the partition key every model table is keyed on.
pub const PARTITION_KEY: &str = "id";

/// Creation timestamp attribute, stamped once by `create`.
pub const CREATED_AT: &str = "createdAt";

/// Modification timestamp attribute, refreshed by every `write`.
pub const UPDATED_AT: &str = "updatedAt";

/// Attributes every record carries besides its declared fields.
pub const DEFAULT_FIELDS: [&str; 3] = [PARTITION_KEY, CREATED_AT, UPDATED_AT];

/// Scalar type of a declared field, serialized with the store's own tokens.
///
/// ```rust
/// use dynamodb_model::common::field;
///
/// let field_type: field::FieldType = serde_json::from_str("\"N\"").unwrap();
/// assert_eq!(field_type, field::FieldType::Number);
/// ```
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum FieldType {
    /// String attribute (`S`).
    #[default]
    #[serde(rename = "S")]
    String,
    /// Number attribute (`N`).
    #[serde(rename = "N")]
    Number,
    /// Binary attribute (`B`).
    #[serde(rename = "B")]
    Binary,
}

impl From<FieldType> for types::ScalarAttributeType {
    fn from(field_type: FieldType) -> Self {
        match field_type {
            FieldType::String => Self::S,
            FieldType::Number => Self::N,
            FieldType::Binary => Self::B,
        }
    }
}

/// A declared model field.
///
/// ```rust
/// use dynamodb_model::common::field;
///
/// let name = field::FieldSpec::indexed("name", field::FieldType::String);
/// assert_eq!(name.index_name(), "nameIndex");
/// ```
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct FieldSpec {
    /// Attribute name of the field.
    pub name: String,
    /// Scalar type of the field.
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    /// Whether the field gets its own global secondary index.
    #[serde(default)]
    pub index: bool,
}

impl FieldSpec {
    /// A plain, non-indexed field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            index: false,
        }
    }

    /// A field with a single-field global secondary index.
    pub fn indexed(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            index: true,
            ..Self::new(name, field_type)
        }
    }

    /// Name of the secondary index keyed on this field.
    pub fn index_name(&self) -> String {
        index_name(&self.name)
    }
}

/// Name of the secondary index keyed on `field`.
pub fn index_name(field: &str) -> String {
    format!("{field}Index")
}

/// Capacity mode a table is created with.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingMode {
    /// On-demand capacity.
    #[default]
    PayPerRequest,
    /// Provisioned capacity, applied to the table and to each index it creates.
    Provisioned {
        /// Read capacity units.
        read_capacity_units: i64,
        /// Write capacity units.
        write_capacity_units: i64,
    },
}

/// The schema of a model table: partition key `id` plus the declared fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableSchema {
    /// Name of the table.
    pub name: String,
    /// Declared fields, in declaration order.
    pub fields: Vec<FieldSpec>,
    /// Capacity mode used when the table has to be created.
    pub billing_mode: BillingMode,
}

impl TableSchema {
    /// Build a schema, rejecting declarations that would shadow the partition key
    /// or the timestamp attributes, and duplicated fields.
    pub fn new(
        name: impl Into<String>,
        fields: Vec<FieldSpec>,
        billing_mode: BillingMode,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::Schema("missing table name".to_string()));
        }
        let mut seen = collections::HashSet::with_capacity(fields.len());
        for field in &fields {
            if DEFAULT_FIELDS.contains(&field.name.as_str()) {
                return Err(Error::Schema(format!(
                    "{} is a reserved field and cannot be declared",
                    field.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(Error::Schema(format!(
                    "{} is declared more than once",
                    field.name
                )));
            }
        }
        Ok(Self {
            name,
            fields,
            billing_mode,
        })
    }

    /// Declared fields that carry a secondary index.
    pub fn indexed_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|field| field.index)
    }

    /// Declared field named `name`, if any.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Whether `name` is a declared field.
    pub fn is_declared(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Whether `name` is a declared, indexed field.
    pub fn is_indexed(&self, name: &str) -> bool {
        self.field(name).is_some_and(|field| field.index)
    }

    /// Whether `name` may be written: a declared field or one of [`DEFAULT_FIELDS`].
    pub fn is_writable(&self, name: &str) -> bool {
        DEFAULT_FIELDS.contains(&name) || self.is_declared(name)
    }

    /// Every attribute name the model knows about: defaults first, then declared fields.
    pub fn known_attributes(&self) -> Vec<String> {
        DEFAULT_FIELDS
            .iter()
            .map(|name| name.to_string())
            .chain(self.fields.iter().map(|field| field.name.clone()))
            .collect()
    }
}

/// Primary key map addressing the record `id`.
pub(crate) fn id_key(id: &str) -> super::Item {
    super::Item::from([(
        PARTITION_KEY.to_string(),
        types::AttributeValue::S(id.to_string()),
    )])
}
