use crate::common;

/// Put item request for a single, already validated record.
///
/// ```rust
/// use aws_sdk_dynamodb::types::AttributeValue;
/// use dynamodb_model::write;
/// use std::collections::HashMap;
///
/// let put_item = write::put_item::PutItemInput {
///     item: HashMap::from([("id".to_string(), AttributeValue::S("1".to_string()))]),
///     table_name: "users".to_string(),
/// };
/// assert_eq!(put_item.item.len(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PutItemInput {
    /// The item to put into the table.
    pub item: common::Item,
    /// The name of the table to write to.
    pub table_name: String,
}
