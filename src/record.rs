//! Typed records materialized from store items.
//!
//! Declared fields are deserialized into the model's record type `T` with
//! `serde_dynamo`. Attributes the model does not declare are kept aside in
//! [`Record::extra`] rather than widening `T`.

use crate::{
    common,
    error::{Error, Result},
};

use aws_sdk_dynamodb::types;
use serde::de::DeserializeOwned;
use serde_dynamo::{from_item, from_items};
use std::{fmt, ops, slice, vec};

/// A stored record: its key, timestamps, declared fields and anything else the
/// store returned.
#[derive(Clone, Debug, PartialEq)]
pub struct Record<T> {
    /// Record id (UUID v4 for records created through a model).
    pub id: String,
    /// Creation timestamp, when returned.
    pub created_at: Option<String>,
    /// Last modification timestamp, when returned.
    pub updated_at: Option<String>,
    /// Declared fields.
    pub fields: T,
    /// Returned attributes that are not declared on the model.
    pub extra: common::Item,
}

fn take_string(item: &mut common::Item, name: &str) -> Option<String> {
    match item.remove(name) {
        Some(types::AttributeValue::S(value)) => Some(value),
        Some(other) => {
            item.insert(name.to_string(), other);
            None
        }
        None => None,
    }
}

impl<T: DeserializeOwned> Record<T> {
    /// Split `item` into a record of `schema`'s model.
    ///
    /// A timestamp stored with another type than a string stays in `extra`.
    pub fn from_item(mut item: common::Item, schema: &common::field::TableSchema) -> Result<Self> {
        let id = take_string(&mut item, common::field::PARTITION_KEY)
            .ok_or_else(|| Error::MissingKey("record returned without id".to_string()))?;
        let created_at = take_string(&mut item, common::field::CREATED_AT);
        let updated_at = take_string(&mut item, common::field::UPDATED_AT);
        let (declared, extra): (common::Item, common::Item) = item
            .into_iter()
            .partition(|(name, _)| schema.is_declared(name));
        let record = Self {
            id,
            created_at,
            updated_at,
            fields: from_item(declared)?,
            extra,
        };
        Ok(record)
    }
}

/// Materialize store items, in the order given, as typed records.
pub fn into_records<T: DeserializeOwned>(
    items: Vec<common::Item>,
    schema: &common::field::TableSchema,
) -> Result<Vec<Record<T>>> {
    items
        .into_iter()
        .map(|item| Record::from_item(item, schema))
        .collect()
}

/// Materialize store items, in the order given, as plain mappings such as
/// `serde_json::Value` or `HashMap<String, serde_json::Value>`.
///
/// Every attribute is kept, declared or not.
///
/// ```rust
/// use aws_sdk_dynamodb::types::AttributeValue;
/// use dynamodb_model::record;
/// use std::collections::HashMap;
///
/// let items = vec![HashMap::from([
///     ("id".to_string(), AttributeValue::S("1".to_string())),
///     ("nickname".to_string(), AttributeValue::S("Mo".to_string())),
/// ])];
/// let mappings: Vec<serde_json::Value> = record::into_mappings(items).unwrap();
/// assert_eq!(mappings[0]["nickname"], "Mo");
/// ```
pub fn into_mappings<M: DeserializeOwned>(items: Vec<common::Item>) -> Result<Vec<M>> {
    Ok(from_items(items)?)
}

/// Records returned by a search, in store order.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordSet<T> {
    table_name: String,
    records: Vec<Record<T>>,
}

impl<T> RecordSet<T> {
    /// A record set over `records` of the table `table_name`.
    pub fn new(table_name: impl Into<String>, records: Vec<Record<T>>) -> Self {
        Self {
            table_name: table_name.into(),
            records,
        }
    }

    /// Name of the table the records come from.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the set holds no record.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the records.
    pub fn iter(&self) -> slice::Iter<'_, Record<T>> {
        self.records.iter()
    }

    /// Ids of the records, in order.
    pub fn ids(&self) -> Vec<&str> {
        self.records.iter().map(|record| record.id.as_str()).collect()
    }

    /// Keep the records matching `predicate`, without another store request.
    pub fn filter<F>(self, mut predicate: F) -> Self
    where
        F: FnMut(&Record<T>) -> bool,
    {
        let records = self
            .records
            .into_iter()
            .filter(|record| predicate(record))
            .collect();
        Self {
            table_name: self.table_name,
            records,
        }
    }

    /// The records, consuming the set.
    pub fn into_vec(self) -> Vec<Record<T>> {
        self.records
    }
}

impl<T> ops::Index<usize> for RecordSet<T> {
    type Output = Record<T>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.records[index]
    }
}

impl<T> IntoIterator for RecordSet<T> {
    type Item = Record<T>;
    type IntoIter = vec::IntoIter<Record<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a RecordSet<T> {
    type Item = &'a Record<T>;
    type IntoIter = slice::Iter<'a, Record<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl<T> fmt::Display for RecordSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<RecordSet {}(", self.table_name)?;
        for record in &self.records {
            write!(f, "{}, ", record.id)?;
        }
        f.write_str(")>")
    }
}
