//! Table shapes exchanged with the store and the reconciliation of a model's schema.
//!
//! [`reconcile::ensure_table`] brings the live table in line with the declared
//! fields; [`cache::SchemaCache`] decides how often that happens.

/// Schema cache keyed by table name.
pub mod cache;

/// Creating a model table or adding its missing indexes.
pub mod reconcile;

use crate::{
    common,
    error::{Error, Result},
};

use aws_sdk_dynamodb::types;

/// What the store reports about a live table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableHandle {
    /// Name of the table.
    pub name: String,
    /// Names of the attributes the table defines (key and index attributes).
    pub attributes: Vec<String>,
    /// Names of the global secondary indexes.
    pub indexes: Vec<String>,
    /// Table status, when reported.
    pub status: Option<types::TableStatus>,
}

impl TableHandle {
    /// Whether `name` is among the table's attribute definitions.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|attribute| attribute == name)
    }

    /// Whether the table accepts reads and writes.
    pub fn is_active(&self) -> bool {
        self.status == Some(types::TableStatus::Active)
    }

    /// Whether the table has a global secondary index named `index_name`.
    pub fn has_index(&self, index_name: &str) -> bool {
        self.indexes.iter().any(|index| index == index_name)
    }

    /// Whether every indexed field of `schema` has its attribute definition and index.
    pub fn covers(&self, schema: &common::field::TableSchema) -> bool {
        schema
            .indexed_fields()
            .all(|field| self.has_attribute(&field.name) && self.has_index(&field.index_name()))
    }

    fn with_fields(mut self, fields: &[&common::field::FieldSpec]) -> Self {
        for field in fields {
            if !self.has_attribute(&field.name) {
                self.attributes.push(field.name.clone());
            }
            self.indexes.push(field.index_name());
        }
        self
    }
}

impl From<types::TableDescription> for TableHandle {
    fn from(description: types::TableDescription) -> Self {
        Self {
            name: description.table_name().unwrap_or_default().to_string(),
            attributes: description
                .attribute_definitions()
                .iter()
                .map(|definition| definition.attribute_name().to_string())
                .collect(),
            indexes: description
                .global_secondary_indexes()
                .iter()
                .filter_map(|index| index.index_name().map(str::to_string))
                .collect(),
            status: description.table_status().cloned(),
        }
    }
}

/// Create table request for a model table.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateTableInput {
    /// `id` plus every indexed field.
    pub attribute_definitions: Vec<types::AttributeDefinition>,
    /// Capacity mode of the table.
    pub billing_mode: types::BillingMode,
    /// One index per indexed field; `None` when no field is indexed.
    pub global_secondary_indexes: Option<Vec<types::GlobalSecondaryIndex>>,
    /// `id` as the hash key.
    pub key_schema: Vec<types::KeySchemaElement>,
    /// Table throughput, only for provisioned tables.
    pub provisioned_throughput: Option<types::ProvisionedThroughput>,
    /// Name of the table.
    pub table_name: String,
}

impl TryFrom<&common::field::TableSchema> for CreateTableInput {
    type Error = Error;

    fn try_from(schema: &common::field::TableSchema) -> Result<Self> {
        let provisioned_throughput = get_provisioned_throughput(schema.billing_mode)?;
        let mut attribute_definitions = vec![get_attribute_definition(
            common::field::PARTITION_KEY,
            common::field::FieldType::String,
        )?];
        let mut global_secondary_indexes = Vec::new();
        for field in schema.indexed_fields() {
            attribute_definitions.push(get_attribute_definition(&field.name, field.field_type)?);
            let index = types::GlobalSecondaryIndex::builder()
                .index_name(field.index_name())
                .key_schema(get_hash_key(&field.name)?)
                .projection(get_projection())
                .set_provisioned_throughput(provisioned_throughput.clone())
                .build()
                .map_err(Error::store)?;
            global_secondary_indexes.push(index);
        }
        let input = Self {
            attribute_definitions,
            billing_mode: get_billing_mode(schema.billing_mode),
            global_secondary_indexes: (!global_secondary_indexes.is_empty())
                .then_some(global_secondary_indexes),
            key_schema: vec![get_hash_key(common::field::PARTITION_KEY)?],
            provisioned_throughput,
            table_name: schema.name.clone(),
        };
        Ok(input)
    }
}

/// Update table request adding indexed fields to a live table.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateTableInput {
    /// Definitions of the added attributes.
    pub attribute_definitions: Vec<types::AttributeDefinition>,
    /// One index creation per added field.
    pub global_secondary_index_updates: Vec<types::GlobalSecondaryIndexUpdate>,
    /// Name of the table.
    pub table_name: String,
}

impl UpdateTableInput {
    pub(crate) fn add_indexes(
        schema: &common::field::TableSchema,
        fields: &[&common::field::FieldSpec],
    ) -> Result<Self> {
        let provisioned_throughput = get_provisioned_throughput(schema.billing_mode)?;
        let mut attribute_definitions = Vec::with_capacity(fields.len());
        let mut global_secondary_index_updates = Vec::with_capacity(fields.len());
        for field in fields {
            attribute_definitions.push(get_attribute_definition(&field.name, field.field_type)?);
            let create = types::CreateGlobalSecondaryIndexAction::builder()
                .index_name(field.index_name())
                .key_schema(get_hash_key(&field.name)?)
                .projection(get_projection())
                .set_provisioned_throughput(provisioned_throughput.clone())
                .build()
                .map_err(Error::store)?;
            global_secondary_index_updates.push(
                types::GlobalSecondaryIndexUpdate::builder()
                    .create(create)
                    .build(),
            );
        }
        let input = Self {
            attribute_definitions,
            global_secondary_index_updates,
            table_name: schema.name.clone(),
        };
        Ok(input)
    }
}

fn get_attribute_definition(
    name: &str,
    field_type: common::field::FieldType,
) -> Result<types::AttributeDefinition> {
    types::AttributeDefinition::builder()
        .attribute_name(name)
        .attribute_type(field_type.into())
        .build()
        .map_err(Error::store)
}

fn get_hash_key(name: &str) -> Result<types::KeySchemaElement> {
    types::KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(types::KeyType::Hash)
        .build()
        .map_err(Error::store)
}

fn get_projection() -> types::Projection {
    types::Projection::builder()
        .projection_type(types::ProjectionType::All)
        .build()
}

fn get_billing_mode(billing_mode: common::field::BillingMode) -> types::BillingMode {
    match billing_mode {
        common::field::BillingMode::PayPerRequest => types::BillingMode::PayPerRequest,
        common::field::BillingMode::Provisioned { .. } => types::BillingMode::Provisioned,
    }
}

fn get_provisioned_throughput(
    billing_mode: common::field::BillingMode,
) -> Result<Option<types::ProvisionedThroughput>> {
    match billing_mode {
        common::field::BillingMode::PayPerRequest => Ok(None),
        common::field::BillingMode::Provisioned {
            read_capacity_units,
            write_capacity_units,
        } => types::ProvisionedThroughput::builder()
            .read_capacity_units(read_capacity_units)
            .write_capacity_units(write_capacity_units)
            .build()
            .map(Some)
            .map_err(Error::store),
    }
}
