use crate::{
    common,
    error::{Error, Result},
};

use aws_sdk_dynamodb::types;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_dynamo::to_item;

/// Fresh record id (UUID v4).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current time as an RFC 3339 UTC string with microseconds.
///
/// Fixed width, so timestamps order the same as strings and as instants.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Serialize `values` into an item, checking each attribute against `schema`.
///
/// `create` passes `allow_default_fields = false`: only declared fields may be
/// given. `write` passes `true` so `id` and the timestamps are accepted too.
pub fn to_validated_item<V: Serialize>(
    values: V,
    schema: &common::field::TableSchema,
    allow_default_fields: bool,
) -> Result<common::Item> {
    let item: common::Item = to_item(values)?;
    let unknown = item.keys().find(|name| {
        if allow_default_fields {
            !schema.is_writable(name)
        } else {
            !schema.is_declared(name)
        }
    });
    match unknown {
        Some(name) => Err(Error::unknown_field(name)),
        None => Ok(item),
    }
}

/// Item for a new record: fresh id, both timestamps, `NULL` attributes left out.
pub(crate) fn new_record_item(mut item: common::Item, now: &str) -> common::Item {
    item.retain(|_, value| !value.is_null());
    item.insert(
        common::field::PARTITION_KEY.to_string(),
        types::AttributeValue::S(new_id()),
    );
    for name in [common::field::CREATED_AT, common::field::UPDATED_AT] {
        item.insert(name.to_string(), types::AttributeValue::S(now.to_string()));
    }
    item
}

/// Apply `incoming` over `existing`, refreshing `updatedAt`.
///
/// A `NULL` incoming attribute removes the attribute from the record.
pub(crate) fn merge_items(
    mut existing: common::Item,
    incoming: common::Item,
    now: &str,
) -> common::Item {
    for (name, value) in incoming {
        if value.is_null() {
            existing.remove(&name);
        } else {
            existing.insert(name, value);
        }
    }
    existing.insert(
        common::field::UPDATED_AT.to_string(),
        types::AttributeValue::S(now.to_string()),
    );
    existing
}

/// The `id` attribute of `item`, when it is a non-empty string.
pub(crate) fn item_id(item: &common::Item) -> Option<&str> {
    match item.get(common::field::PARTITION_KEY) {
        Some(types::AttributeValue::S(id)) if !id.is_empty() => Some(id.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;
    use serde_json::{Value, json};

    fn schema() -> common::field::TableSchema {
        common::field::TableSchema::new(
            "users",
            vec![
                common::field::FieldSpec::indexed("name", common::field::FieldType::String),
                common::field::FieldSpec::new("age", common::field::FieldType::Number),
            ],
            common::field::BillingMode::PayPerRequest,
        )
        .unwrap()
    }

    fn s(value: &str) -> types::AttributeValue {
        types::AttributeValue::S(value.to_string())
    }

    #[rstest]
    #[case::declared(json!({"name": "Person 1", "age": 3}), false, None)]
    #[case::unknown(json!({"unknownField": "x"}), false, Some("unknownField"))]
    #[case::id_on_create(json!({"id": "1", "name": "x"}), false, Some("id"))]
    #[case::id_on_write(json!({"id": "1", "name": "x"}), true, None)]
    #[case::timestamps_on_write(json!({"updatedAt": "x"}), true, None)]
    #[case::unknown_on_write(json!({"id": "1", "nickname": "x"}), true, Some("nickname"))]
    fn test_to_validated_item(
        #[case] values: Value,
        #[case] allow_default_fields: bool,
        #[case] unknown: Option<&str>,
    ) {
        let actual = to_validated_item(values, &schema(), allow_default_fields);
        match unknown {
            Some(name) => assert!(
                matches!(actual, Err(Error::Schema(ref message)) if *message == format!("invalid field {name}"))
            ),
            None => assert!(actual.is_ok()),
        }
    }

    #[test]
    fn test_new_record_item() {
        let item = common::Item::from([
            ("name".to_string(), s("Person 1")),
            ("age".to_string(), types::AttributeValue::Null(true)),
        ]);
        let actual = new_record_item(item, "2024-01-01T00:00:00.000000Z");
        assert_eq!(actual.len(), 4);
        assert!(!actual.contains_key("age"));
        assert_eq!(actual.get("createdAt"), actual.get("updatedAt"));
        let id = item_id(&actual).unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[test]
    fn test_merge_items() {
        let existing = common::Item::from([
            ("id".to_string(), s("1")),
            ("name".to_string(), s("Person 1")),
            ("age".to_string(), types::AttributeValue::N("3".to_string())),
            ("createdAt".to_string(), s("t0")),
            ("updatedAt".to_string(), s("t0")),
        ]);
        let incoming = common::Item::from([
            ("id".to_string(), s("1")),
            ("name".to_string(), s("Mohammed")),
            ("age".to_string(), types::AttributeValue::Null(true)),
        ]);
        let actual = merge_items(existing, incoming, "t1");
        let expected = common::Item::from([
            ("id".to_string(), s("1")),
            ("name".to_string(), s("Mohammed")),
            ("createdAt".to_string(), s("t0")),
            ("updatedAt".to_string(), s("t1")),
        ]);
        assert_eq!(actual, expected);
    }

    #[rstest]
    #[case::present(json!({"id": "1"}), Some("1"))]
    #[case::empty(json!({"id": ""}), None)]
    #[case::number(json!({"id": 1}), None)]
    #[case::absent(json!({"name": "x"}), None)]
    fn test_item_id(#[case] values: Value, #[case] expected: Option<&str>) {
        let item: common::Item = to_item(values).unwrap();
        assert_eq!(item_id(&item), expected);
    }

    #[test]
    fn test_timestamp_is_fixed_width() {
        let first = timestamp();
        let second = timestamp();
        assert_eq!(first.len(), "2024-01-01T00:00:00.000000Z".len());
        assert!(first <= second);
    }
}
