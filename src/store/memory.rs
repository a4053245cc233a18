use crate::{
    common,
    error::{Error, Result, StoreMessage},
    read, store, table, write,
};

use aws_sdk_dynamodb::types;
use indexmap::IndexMap;
use std::{
    cmp, collections,
    sync::{Mutex, MutexGuard, PoisonError, atomic},
    time::Duration,
};

#[derive(Debug, Default)]
struct MemoryTable {
    handle: table::TableHandle,
    items: IndexMap<String, common::Item>,
}

/// In-process store keeping items in insertion order.
///
/// Understands the expressions this crate compiles: `AND` conjunctions of
/// comparisons and `begins_with`, and comma separated projections.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    tables: Mutex<collections::HashMap<String, MemoryTable>>,
    deny_table_creation: bool,
    describes: atomic::AtomicUsize,
    consistent_reads: atomic::AtomicUsize,
    item_writes: atomic::AtomicUsize,
    table_mutations: atomic::AtomicUsize,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A store whose credentials may not create tables.
    pub(crate) fn denying_table_creation() -> Self {
        Self {
            deny_table_creation: true,
            ..Self::default()
        }
    }

    /// A store already holding an active table described by `handle`.
    pub(crate) fn with_table(self, mut handle: table::TableHandle) -> Self {
        handle.status = Some(types::TableStatus::Active);
        self.tables().insert(
            handle.name.clone(),
            MemoryTable {
                handle,
                ..Default::default()
            },
        );
        self
    }

    pub(crate) fn handle(&self, table_name: &str) -> Option<table::TableHandle> {
        self.tables()
            .get(table_name)
            .map(|table| table.handle.clone())
    }

    /// Store an item as is, bypassing any validation.
    pub(crate) fn insert_item(&self, table_name: &str, item: common::Item) {
        let id = write::common::item_id(&item).map(str::to_string);
        if let (Some(id), Some(table)) = (id, self.tables().get_mut(table_name)) {
            table.items.insert(id, item);
        }
    }

    pub(crate) fn describes(&self) -> usize {
        self.describes.load(atomic::Ordering::SeqCst)
    }

    pub(crate) fn consistent_reads(&self) -> usize {
        self.consistent_reads.load(atomic::Ordering::SeqCst)
    }

    pub(crate) fn item_writes(&self) -> usize {
        self.item_writes.load(atomic::Ordering::SeqCst)
    }

    pub(crate) fn table_mutations(&self) -> usize {
        self.table_mutations.load(atomic::Ordering::SeqCst)
    }

    fn tables(&self) -> MutexGuard<'_, collections::HashMap<String, MemoryTable>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_table<F>(&self, table_name: &str, read: F) -> Result<Vec<common::Item>>
    where
        F: FnOnce(&MemoryTable) -> Result<Vec<common::Item>>,
    {
        let tables = self.tables();
        let table = tables.get(table_name).ok_or_else(|| missing_table(table_name))?;
        read(table)
    }
}

fn missing_table(table_name: &str) -> Error {
    Error::store(StoreMessage(format!("requested resource not found: {table_name}")))
}

fn unsupported(expression: &str) -> Error {
    Error::store(StoreMessage(format!("unsupported expression: {expression}")))
}

fn compare(left: &types::AttributeValue, right: &types::AttributeValue) -> Option<cmp::Ordering> {
    match (left, right) {
        (types::AttributeValue::S(left), types::AttributeValue::S(right)) => Some(left.cmp(right)),
        (types::AttributeValue::N(left), types::AttributeValue::N(right)) => {
            let left: f64 = left.parse().ok()?;
            let right: f64 = right.parse().ok()?;
            left.partial_cmp(&right)
        }
        _ => None,
    }
}

struct Expression<'a> {
    names: Option<&'a collections::HashMap<String, String>>,
    values: Option<&'a collections::HashMap<String, types::AttributeValue>>,
}

impl Expression<'_> {
    fn name<'n>(&'n self, placeholder: &'n str) -> &'n str {
        match self.names.and_then(|names| names.get(placeholder)) {
            Some(name) => name,
            None => placeholder,
        }
    }

    fn value(&self, placeholder: &str) -> Result<&types::AttributeValue> {
        self.values
            .and_then(|values| values.get(placeholder))
            .ok_or_else(|| unsupported(placeholder))
    }

    fn matches(&self, item: &common::Item, expression: &str) -> Result<bool> {
        for condition in expression.split(common::condition::AND) {
            if !self.matches_condition(item, condition.trim())? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn matches_condition(&self, item: &common::Item, condition: &str) -> Result<bool> {
        if let Some(arguments) = condition
            .strip_prefix("begins_with(")
            .and_then(|arguments| arguments.strip_suffix(')'))
        {
            let (name, value) = arguments
                .split_once(", ")
                .ok_or_else(|| unsupported(condition))?;
            let matched = match (item.get(self.name(name)), self.value(value)?) {
                (Some(types::AttributeValue::S(actual)), types::AttributeValue::S(prefix)) => {
                    actual.starts_with(prefix.as_str())
                }
                _ => false,
            };
            return Ok(matched);
        }
        let mut parts = condition.splitn(3, ' ');
        let (Some(name), Some(operator), Some(value)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(unsupported(condition));
        };
        let expected = self.value(value)?;
        let Some(actual) = item.get(self.name(name)) else {
            return Ok(operator == "<>");
        };
        let ordering = compare(actual, expected);
        let matched = match operator {
            "=" => ordering == Some(cmp::Ordering::Equal),
            "<>" => ordering != Some(cmp::Ordering::Equal),
            "<" => ordering == Some(cmp::Ordering::Less),
            "<=" => matches!(ordering, Some(cmp::Ordering::Less | cmp::Ordering::Equal)),
            ">" => ordering == Some(cmp::Ordering::Greater),
            ">=" => matches!(
                ordering,
                Some(cmp::Ordering::Greater | cmp::Ordering::Equal)
            ),
            _ => return Err(unsupported(condition)),
        };
        Ok(matched)
    }

    fn project(&self, item: &common::Item, projection: Option<&str>) -> common::Item {
        match projection {
            None => item.clone(),
            Some(projection) => projection
                .split(", ")
                .map(|placeholder| self.name(placeholder))
                .filter_map(|name| {
                    item.get(name)
                        .map(|value| (name.to_string(), value.clone()))
                })
                .collect(),
        }
    }
}

fn read_items<'a>(
    items: impl Iterator<Item = &'a common::Item>,
    key_condition: Option<&str>,
    read_operation: &read::common::ReadInput,
) -> Result<Vec<common::Item>> {
    let expression = Expression {
        names: read_operation.expression_attribute_names.as_ref(),
        values: read_operation.expression_attribute_values.as_ref(),
    };
    let limit = read_operation
        .limit
        .and_then(|limit| usize::try_from(limit).ok())
        .unwrap_or(usize::MAX);
    let mut found = Vec::new();
    for item in items {
        if found.len() >= limit {
            break;
        }
        let key_matches = match key_condition {
            Some(key_condition) => expression.matches(item, key_condition)?,
            None => true,
        };
        let filter_matches = match &read_operation.filter_expression {
            Some(filter) => expression.matches(item, filter)?,
            None => true,
        };
        if key_matches && filter_matches {
            found.push(expression.project(item, read_operation.projection_expression.as_deref()));
        }
    }
    Ok(found)
}

impl store::Store for MemoryStore {
    async fn describe_table(&self, table_name: &str) -> Result<Option<table::TableHandle>> {
        self.describes.fetch_add(1, atomic::Ordering::SeqCst);
        Ok(self.handle(table_name))
    }

    async fn create_table(&self, input: table::CreateTableInput) -> Result<()> {
        if self.deny_table_creation {
            return Err(Error::store(StoreMessage(
                "not authorized to perform: dynamodb:CreateTable".to_string(),
            )));
        }
        let mut tables = self.tables();
        if tables.contains_key(&input.table_name) {
            return Err(Error::store(StoreMessage(format!(
                "table already exists: {}",
                input.table_name
            ))));
        }
        let handle = table::TableHandle {
            name: input.table_name.clone(),
            attributes: input
                .attribute_definitions
                .iter()
                .map(|definition| definition.attribute_name().to_string())
                .collect(),
            indexes: input
                .global_secondary_indexes
                .iter()
                .flatten()
                .map(|index| index.index_name().to_string())
                .collect(),
            status: Some(types::TableStatus::Creating),
        };
        tables.insert(
            input.table_name,
            MemoryTable {
                handle,
                ..Default::default()
            },
        );
        self.table_mutations.fetch_add(1, atomic::Ordering::SeqCst);
        Ok(())
    }

    async fn wait_until_active(
        &self,
        table_name: &str,
        _max_wait: Duration,
    ) -> Result<table::TableHandle> {
        let mut tables = self.tables();
        let table = tables
            .get_mut(table_name)
            .ok_or_else(|| missing_table(table_name))?;
        table.handle.status = Some(types::TableStatus::Active);
        Ok(table.handle.clone())
    }

    async fn update_table(&self, input: table::UpdateTableInput) -> Result<()> {
        let mut tables = self.tables();
        let table = tables
            .get_mut(&input.table_name)
            .ok_or_else(|| missing_table(&input.table_name))?;
        for definition in &input.attribute_definitions {
            if !table.handle.has_attribute(definition.attribute_name()) {
                table
                    .handle
                    .attributes
                    .push(definition.attribute_name().to_string());
            }
        }
        for update in &input.global_secondary_index_updates {
            if let Some(create) = update.create() {
                table.handle.indexes.push(create.index_name().to_string());
            }
        }
        self.table_mutations.fetch_add(1, atomic::Ordering::SeqCst);
        Ok(())
    }

    async fn batch_get_item(
        &self,
        input: read::batch_get_item::BatchGetItemInput,
    ) -> Result<Vec<common::Item>> {
        if input.consistent_read {
            self.consistent_reads.fetch_add(1, atomic::Ordering::SeqCst);
        }
        self.read_table(&input.table_name, |table| {
            let expression = Expression {
                names: input.expression_attribute_names.as_ref(),
                values: None,
            };
            let found = input
                .keys
                .iter()
                .filter_map(write::common::item_id)
                .filter_map(|id| table.items.get(id))
                .map(|item| expression.project(item, input.projection_expression.as_deref()))
                .collect();
            Ok(found)
        })
    }

    async fn put_item(&self, input: write::put_item::PutItemInput) -> Result<()> {
        let id = write::common::item_id(&input.item)
            .ok_or_else(|| Error::store(StoreMessage("missing key id".to_string())))?
            .to_string();
        let mut tables = self.tables();
        let table = tables
            .get_mut(&input.table_name)
            .ok_or_else(|| missing_table(&input.table_name))?;
        table.items.insert(id, input.item);
        self.item_writes.fetch_add(1, atomic::Ordering::SeqCst);
        Ok(())
    }

    async fn batch_write_item(
        &self,
        input: write::batch_write_item::BatchWriteItemInput,
    ) -> Result<()> {
        let mut tables = self.tables();
        let table = tables
            .get_mut(&input.table_name)
            .ok_or_else(|| missing_table(&input.table_name))?;
        for request in input.requests {
            match request {
                write::batch_write_item::BatchWriteItemRequest::PutItem(item) => {
                    let id = write::common::item_id(&item)
                        .ok_or_else(|| Error::store(StoreMessage("missing key id".to_string())))?
                        .to_string();
                    table.items.insert(id, item);
                }
                write::batch_write_item::BatchWriteItemRequest::DeleteItem(id) => {
                    table.items.shift_remove(&id);
                }
            }
            self.item_writes.fetch_add(1, atomic::Ordering::SeqCst);
        }
        Ok(())
    }

    async fn scan(&self, input: read::scan::ScanInput) -> Result<Vec<common::Item>> {
        self.read_table(&input.read_operation.table_name, |table| {
            read_items(table.items.values(), None, &input.read_operation)
        })
    }

    async fn query(&self, input: read::query::QueryInput) -> Result<Vec<common::Item>> {
        self.read_table(&input.read_operation.table_name, |table| {
            let index_name = input.read_operation.index_name.as_deref().unwrap_or_default();
            if !table.handle.indexes.iter().any(|index| index == index_name) {
                return Err(Error::store(StoreMessage(format!(
                    "the table does not have the specified index: {index_name}"
                ))));
            }
            read_items(
                table.items.values(),
                Some(input.key_condition_expression.as_str()),
                &input.read_operation,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    fn item(id: &str, name: &str, age: &str) -> common::Item {
        common::Item::from([
            ("id".to_string(), types::AttributeValue::S(id.to_string())),
            ("name".to_string(), types::AttributeValue::S(name.to_string())),
            ("age".to_string(), types::AttributeValue::N(age.to_string())),
        ])
    }

    fn expression_names() -> collections::HashMap<String, String> {
        collections::HashMap::from([
            ("#name".to_string(), "name".to_string()),
            ("#age".to_string(), "age".to_string()),
        ])
    }

    fn expression_values() -> collections::HashMap<String, types::AttributeValue> {
        collections::HashMap::from([
            (":name".to_string(), types::AttributeValue::S("Mo".to_string())),
            (":age".to_string(), types::AttributeValue::N("30".to_string())),
        ])
    }

    #[rstest]
    #[case::equal("#age = :age", "30", true)]
    #[case::not_equal("#age <> :age", "30", false)]
    #[case::numeric_less("#age < :age", "4", true)]
    #[case::greater_or_equal("#age >= :age", "30", true)]
    #[case::begins_with("begins_with(#name, :name)", "1", true)]
    #[case::conjunction("begins_with(#name, :name) AND #age > :age", "30", false)]
    fn test_expression_matches(#[case] expression: &str, #[case] age: &str, #[case] expected: bool) {
        let names = expression_names();
        let values = expression_values();
        let evaluator = Expression {
            names: Some(&names),
            values: Some(&values),
        };
        let actual = evaluator
            .matches(&item("1", "Mohammed", age), expression)
            .unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_expression_projects() {
        let names = expression_names();
        let evaluator = Expression {
            names: Some(&names),
            values: None,
        };
        let actual = evaluator.project(&item("1", "Mohammed", "30"), Some("#name, id"));
        assert_eq!(actual.len(), 2);
        assert!(actual.contains_key("id"));
        assert!(actual.contains_key("name"));
    }
}
