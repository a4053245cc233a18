//! The CRUD facade of a declared model.
//!
//! A [`Model`] ties a [`ModelDescriptor`] to a [`store::Store`]. Every operation
//! validates its input locally first, then makes sure the table is reconciled
//! (per the descriptor's [`table::cache::CachePolicy`]) before talking to the
//! store.

use crate::{
    common,
    error::{Error, Result},
    read,
    record::{self, Record, RecordSet},
    store, table, write,
};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{marker::PhantomData, mem, sync::Arc, time::Duration};

/// Declaration of a model: its table, fields and behavior.
///
/// Every attribute but `table_name` has a default, so a descriptor can be kept
/// in configuration:
///
/// ```rust
/// use dynamodb_model::model;
///
/// let descriptor: model::ModelDescriptor = serde_json::from_value(serde_json::json!({
///     "table_name": "users",
///     "fields": [
///         {"name": "name", "type": "S", "index": true},
///         {"name": "age", "type": "N"},
///     ],
///     "default_limit": 50,
/// }))
/// .unwrap();
/// assert_eq!(descriptor.fields.len(), 2);
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct ModelDescriptor {
    /// Name of the backing table.
    pub table_name: String,
    /// Declared fields, besides `id`, `createdAt` and `updatedAt`.
    pub fields: Vec<common::field::FieldSpec>,
    /// Capacity mode used when the table is created.
    pub billing_mode: common::field::BillingMode,
    /// Limit applied to searches that do not give one; `None` returns every match.
    pub default_limit: Option<i32>,
    /// Attributes withheld from reads and searches.
    pub sensitive_fields: common::selection::SensitiveFieldPolicy,
    /// How often the table is reconciled.
    pub cache_policy: table::cache::CachePolicy,
    /// Longest wait for a newly created table to become active.
    pub table_wait: Duration,
}

impl Default for ModelDescriptor {
    fn default() -> Self {
        Self {
            table_name: String::new(),
            fields: Vec::new(),
            billing_mode: common::field::BillingMode::default(),
            default_limit: None,
            sensitive_fields: common::selection::SensitiveFieldPolicy::default(),
            cache_policy: table::cache::CachePolicy::default(),
            table_wait: table::reconcile::DEFAULT_TABLE_WAIT,
        }
    }
}

/// A declared model bound to a store.
///
/// `T` is the record type holding the declared fields. Attributes can be absent
/// from a stored item or left out by a projection, so its fields are usually
/// `Option`s or `#[serde(default)]`.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_model::{common, model};
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// struct User {
///     name: Option<String>,
/// }
///
/// # async fn example(client: Client) -> Result<(), Box<dyn std::error::Error>> {
/// let users: model::Model<User, Client> = model::Model::new(
///     client,
///     model::ModelDescriptor {
///         table_name: "users".to_string(),
///         fields: vec![common::field::FieldSpec::indexed(
///             "name",
///             common::field::FieldType::String,
///         )],
///         ..Default::default()
///     },
/// )?;
/// let user = users.create(serde_json::json!({"name": "Person 1"})).await?;
/// users
///     .write(serde_json::json!({"id": user.id, "name": "Mohammed"}))
///     .await?;
/// let found = users
///     .search(
///         vec![common::condition::DomainTriple::try_from(("name", "=", "Mohammed"))?],
///         None,
///         None,
///     )
///     .await?;
/// println!("{found}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Model<T, S> {
    store: S,
    schema: common::field::TableSchema,
    known_attributes: Vec<String>,
    default_limit: Option<i32>,
    sensitive_fields: common::selection::SensitiveFieldPolicy,
    cache_policy: table::cache::CachePolicy,
    table_wait: Duration,
    cache: Arc<table::cache::SchemaCache>,
    record: PhantomData<fn() -> T>,
}

impl<T, S> Model<T, S> {
    /// Bind `descriptor` to `store`, rejecting invalid declarations.
    pub fn new(store: S, descriptor: ModelDescriptor) -> Result<Self> {
        let schema = common::field::TableSchema::new(
            descriptor.table_name,
            descriptor.fields,
            descriptor.billing_mode,
        )?;
        let model = Self {
            store,
            known_attributes: schema.known_attributes(),
            schema,
            default_limit: descriptor.default_limit,
            sensitive_fields: descriptor.sensitive_fields,
            cache_policy: descriptor.cache_policy,
            table_wait: descriptor.table_wait,
            cache: Arc::default(),
            record: PhantomData,
        };
        Ok(model)
    }

    /// Use `cache` for table handles, e.g. one shared by several models.
    pub fn with_cache(mut self, cache: Arc<table::cache::SchemaCache>) -> Self {
        self.cache = cache;
        self
    }

    /// The model's table schema.
    pub fn schema(&self) -> &common::field::TableSchema {
        &self.schema
    }

    /// The store the model talks to.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Drop the cached table handle; the next operation reconciles the table.
    pub fn invalidate_schema(&self) {
        self.cache.invalidate(&self.schema.name);
    }

    fn projection(&self, fields: Option<&[String]>) -> Option<common::selection::ProjectionSpec> {
        common::selection::project(fields, &self.known_attributes, &self.sensitive_fields)
    }
}

impl<T: DeserializeOwned, S: store::Store> Model<T, S> {
    /// Make sure the table exists with every declared index.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_model.ensure_table",
            skip_all,
            fields(table = %self.schema.name),
            err
        )
    )]
    pub async fn ensure_table(&self) -> Result<table::TableHandle> {
        self.cache
            .ensure_table(&self.store, &self.schema, self.cache_policy, self.table_wait)
            .await
    }

    /// Create one record from declared fields.
    ///
    /// The record gets a fresh id and equal `createdAt` and `updatedAt`.
    /// `NULL` values are not stored.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_model.create",
            skip_all,
            fields(table = %self.schema.name),
            err
        )
    )]
    pub async fn create<V: Serialize>(&self, values: V) -> Result<Record<T>> {
        let item = write::common::to_validated_item(values, &self.schema, false)?;
        self.ensure_table().await?;
        let item = write::common::new_record_item(item, &write::common::timestamp());
        let put_item = write::put_item::PutItemInput {
            item: item.clone(),
            table_name: self.schema.name.clone(),
        };
        self.store.put_item(put_item).await?;
        Record::from_item(item, &self.schema)
    }

    /// Create several records through the batch writer.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_model.create_many",
            skip_all,
            fields(table = %self.schema.name),
            err
        )
    )]
    pub async fn create_many<V: Serialize>(&self, values: Vec<V>) -> Result<Vec<Record<T>>> {
        let items = values
            .into_iter()
            .map(|values| write::common::to_validated_item(values, &self.schema, false))
            .collect::<Result<Vec<_>>>()?;
        if items.is_empty() {
            return Ok(Vec::new());
        }
        self.ensure_table().await?;
        let now = write::common::timestamp();
        let items: Vec<_> = items
            .into_iter()
            .map(|item| write::common::new_record_item(item, &now))
            .collect();
        let batch_write = write::batch_write_item::BatchWriteItemInput {
            requests: items
                .iter()
                .cloned()
                .map(write::batch_write_item::BatchWriteItemRequest::PutItem)
                .collect(),
            table_name: self.schema.name.clone(),
        };
        self.store.batch_write_item(batch_write).await?;
        record::into_records(items, &self.schema)
    }

    /// Read records by id, in the order the ids are given.
    ///
    /// Absent ids are skipped. `fields` restricts the returned attributes; `id`
    /// is always returned.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_model.read",
            skip_all,
            fields(table = %self.schema.name),
            err
        )
    )]
    pub async fn read<I: AsRef<str>>(
        &self,
        ids: &[I],
        fields: Option<&[String]>,
    ) -> Result<Vec<Record<T>>> {
        let ids = get_ids(ids).ok_or_else(|| Error::MissingKey("missing ids".to_string()))?;
        self.ensure_table().await?;
        let items = self.get_items(ids, self.projection(fields), false).await?;
        record::into_records(items, &self.schema)
    }

    /// Fetch the current state of `record`; `None` once it was deleted.
    pub async fn reload(&self, record: &Record<T>) -> Result<Option<Record<T>>> {
        let records = self.read(&[record.id.as_str()], None).await?;
        Ok(records.into_iter().next())
    }

    /// Merge `values` into the stored record named by their `id`.
    ///
    /// Returns `false` when no record has that id. A `NULL` value removes the
    /// attribute.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_model.write",
            skip_all,
            fields(table = %self.schema.name),
            err
        )
    )]
    pub async fn write<V: Serialize>(&self, values: V) -> Result<bool> {
        let item = write::common::to_validated_item(values, &self.schema, true)?;
        if write::common::item_id(&item).is_none() {
            return Err(Error::MissingKey("missing id".to_string()));
        }
        let written = self.write_items(vec![item]).await?;
        Ok(!written.is_empty())
    }

    /// Merge `values` into `record`, then refresh `record` from what was written.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_model.write_record",
            skip_all,
            fields(table = %self.schema.name, id = %record.id),
            err
        )
    )]
    pub async fn write_record<V: Serialize>(
        &self,
        record: &mut Record<T>,
        values: V,
    ) -> Result<bool> {
        if record.id.is_empty() {
            return Err(Error::MissingKey("missing id".to_string()));
        }
        let mut item = write::common::to_validated_item(values, &self.schema, true)?;
        item.insert(
            common::field::PARTITION_KEY.to_string(),
            aws_sdk_dynamodb::types::AttributeValue::S(record.id.clone()),
        );
        match self.write_items(vec![item]).await?.pop() {
            Some(written) => {
                *record = Record::from_item(written, &self.schema)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Merge each of `values` into the stored record named by its `id`.
    ///
    /// Returns `false` when none of the records exists.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_model.write_many",
            skip_all,
            fields(table = %self.schema.name),
            err
        )
    )]
    pub async fn write_many<V: Serialize>(&self, values: Vec<V>) -> Result<bool> {
        let items = values
            .into_iter()
            .map(|values| write::common::to_validated_item(values, &self.schema, true))
            .collect::<Result<Vec<_>>>()?;
        if items
            .iter()
            .any(|item| write::common::item_id(item).is_none())
        {
            return Err(Error::MissingKey(
                "one or more records missing id".to_string(),
            ));
        }
        if items.is_empty() {
            return Ok(false);
        }
        let written = self.write_items(items).await?;
        Ok(!written.is_empty())
    }

    /// Delete records by id.
    ///
    /// Returns `false`, without raising, when no id is given or none exists.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_model.delete",
            skip_all,
            fields(table = %self.schema.name),
            err
        )
    )]
    pub async fn delete<I: AsRef<str>>(&self, ids: &[I]) -> Result<bool> {
        let Some(ids) = get_ids(ids) else {
            return Ok(false);
        };
        self.ensure_table().await?;
        let key_only = common::selection::project(
            Some(&[common::field::PARTITION_KEY.to_string()]),
            &self.known_attributes,
            &common::selection::SensitiveFieldPolicy::Disabled,
        );
        let existing: Vec<_> = self
            .get_items(ids, key_only, true)
            .await?
            .iter()
            .filter_map(write::common::item_id)
            .map(|id| write::batch_write_item::BatchWriteItemRequest::DeleteItem(id.to_string()))
            .collect();
        if existing.is_empty() {
            return Ok(false);
        }
        let batch_write = write::batch_write_item::BatchWriteItemInput {
            requests: existing,
            table_name: self.schema.name.clone(),
        };
        self.store.batch_write_item(batch_write).await?;
        Ok(true)
    }

    /// Delete `record`.
    pub async fn delete_record(&self, record: &Record<T>) -> Result<bool> {
        self.delete(&[record.id.as_str()]).await
    }

    /// Search the table with `domain`, returning typed records.
    ///
    /// An empty domain scans the table. Otherwise the first triple is the key
    /// condition on its field's index and the others filter the matches; every
    /// triple must name an indexed field. `limit` falls back to the model's
    /// default limit.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_model.search",
            skip_all,
            fields(table = %self.schema.name),
            err
        )
    )]
    pub async fn search<V: Serialize>(
        &self,
        domain: Vec<common::condition::DomainTriple<V>>,
        fields: Option<&[String]>,
        limit: Option<i32>,
    ) -> Result<RecordSet<T>> {
        let items = self.search_items(domain, fields, limit).await?;
        let records = record::into_records(items, &self.schema)?;
        Ok(RecordSet::new(self.schema.name.clone(), records))
    }

    /// Like [`Model::search`], returning plain mappings with every returned attribute.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_model.search_read",
            skip_all,
            fields(table = %self.schema.name),
            err
        )
    )]
    pub async fn search_read<M: DeserializeOwned, V: Serialize>(
        &self,
        domain: Vec<common::condition::DomainTriple<V>>,
        fields: Option<&[String]>,
        limit: Option<i32>,
    ) -> Result<Vec<M>> {
        let items = self.search_items(domain, fields, limit).await?;
        record::into_mappings(items)
    }

    async fn search_items<V: Serialize>(
        &self,
        domain: Vec<common::condition::DomainTriple<V>>,
        fields: Option<&[String]>,
        limit: Option<i32>,
    ) -> Result<Vec<common::Item>> {
        let search = read::query::Search {
            domain,
            limit: limit.or(self.default_limit),
            projection: self.projection(fields),
        };
        let input = search.compile(&self.schema)?;
        self.ensure_table().await?;
        match input {
            read::query::SearchInput::Scan(scan) => self.store.scan(scan).await,
            read::query::SearchInput::Query(query) => self.store.query(query).await,
        }
    }

    async fn get_items(
        &self,
        ids: Vec<String>,
        projection: Option<common::selection::ProjectionSpec>,
        consistent_read: bool,
    ) -> Result<Vec<common::Item>> {
        let batch_get: read::batch_get_item::BatchGetItemInput =
            read::batch_get_item::BatchGetItem {
                consistent_read,
                ids,
                projection,
                table_name: self.schema.name.clone(),
            }
            .into();
        let order: Vec<String> = batch_get
            .keys
            .iter()
            .filter_map(write::common::item_id)
            .map(str::to_string)
            .collect();
        let mut found: IndexMap<String, common::Item> = self
            .store
            .batch_get_item(batch_get)
            .await?
            .into_iter()
            .filter_map(|item| {
                let id = write::common::item_id(&item)?.to_string();
                Some((id, item))
            })
            .collect();
        Ok(order.iter().filter_map(|id| found.swap_remove(id)).collect())
    }

    /// Read-merge-write of `items`; returns the merged items that were written.
    async fn write_items(&self, items: Vec<common::Item>) -> Result<Vec<common::Item>> {
        self.ensure_table().await?;
        let ids = items
            .iter()
            .filter_map(write::common::item_id)
            .map(str::to_string)
            .collect();
        let mut existing: IndexMap<String, common::Item> = self
            .get_items(ids, None, true)
            .await?
            .into_iter()
            .filter_map(|item| {
                let id = write::common::item_id(&item)?.to_string();
                Some((id, item))
            })
            .collect();
        let now = write::common::timestamp();
        let mut touched = IndexSet::new();
        for item in items {
            let Some(id) = write::common::item_id(&item).map(str::to_string) else {
                continue;
            };
            if let Some(current) = existing.get_mut(&id) {
                *current = write::common::merge_items(mem::take(current), item, &now);
                touched.insert(id);
            }
        }
        let written: Vec<_> = touched
            .iter()
            .filter_map(|id| existing.swap_remove(id))
            .collect();
        if written.is_empty() {
            return Ok(written);
        }
        let batch_write = write::batch_write_item::BatchWriteItemInput {
            requests: written
                .iter()
                .cloned()
                .map(write::batch_write_item::BatchWriteItemRequest::PutItem)
                .collect(),
            table_name: self.schema.name.clone(),
        };
        self.store.batch_write_item(batch_write).await?;
        Ok(written)
    }
}

/// Non-empty ids, or `None` when there is none.
fn get_ids<I: AsRef<str>>(ids: &[I]) -> Option<Vec<String>> {
    let ids: Vec<String> = ids
        .iter()
        .map(|id| id.as_ref())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();
    (!ids.is_empty()).then_some(ids)
}
