use crate::{
    common,
    error::{Error, Result},
};

use aws_sdk_dynamodb::types;
use indexmap::IndexSet;
use std::collections;

/// Most keys a single BatchGetItem request may carry.
pub const BATCH_GET_SIZE: usize = 100;

/// Batch get item request.
///
/// ```rust
/// use dynamodb_model::read;
///
/// let batch_get = read::batch_get_item::BatchGetItem {
///     ids: vec!["1".to_string(), "2".to_string(), "1".to_string()],
///     table_name: "users".to_string(),
///     ..Default::default()
/// };
/// let input: read::batch_get_item::BatchGetItemInput = batch_get.into();
/// assert_eq!(input.keys.len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchGetItem {
    /// Read the latest committed items instead of an eventually consistent view.
    pub consistent_read: bool,
    /// Record ids to fetch; duplicates are sent once.
    pub ids: Vec<String>,
    /// Attributes to return; `None` returns whole items.
    pub projection: Option<common::selection::ProjectionSpec>,
    /// Table to read from.
    pub table_name: String,
}

/// Batch get item request with serialized keys.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchGetItemInput {
    /// Strongly consistent read.
    pub consistent_read: bool,
    /// Placeholder to attribute name for the projection.
    pub expression_attribute_names: Option<collections::HashMap<String, String>>,
    /// `{id}` keys, in request order.
    pub keys: Vec<common::Item>,
    /// Attributes to return.
    pub projection_expression: Option<String>,
    /// Table to read from.
    pub table_name: String,
}

impl From<BatchGetItem> for BatchGetItemInput {
    fn from(batch_get_item: BatchGetItem) -> Self {
        let ids: IndexSet<String> = batch_get_item.ids.into_iter().collect();
        let keys = ids
            .iter()
            .map(|id| common::field::id_key(id))
            .collect();
        let (expression_attribute_names, projection_expression) = match batch_get_item.projection
        {
            Some(projection) => (Some(projection.aliases), Some(projection.expression)),
            None => (None, None),
        };
        Self {
            consistent_read: batch_get_item.consistent_read,
            expression_attribute_names,
            keys,
            projection_expression,
            table_name: batch_get_item.table_name,
        }
    }
}

impl BatchGetItemInput {
    /// Keys and projection for one chunk of this request.
    pub(crate) fn keys_and_attributes(
        &self,
        keys: Vec<common::Item>,
    ) -> Result<types::KeysAndAttributes> {
        types::KeysAndAttributes::builder()
            .set_consistent_read(self.consistent_read.then_some(true))
            .set_expression_attribute_names(self.expression_attribute_names.clone())
            .set_keys(Some(keys))
            .set_projection_expression(self.projection_expression.clone())
            .build()
            .map_err(Error::store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::empty(
        BatchGetItem {
            ids: vec![
                "b".to_string(),
            ],
            table_name: "a".to_string(),
            ..Default::default()
        },
        BatchGetItemInput {
            keys: vec![
                collections::HashMap::from(
                    [
                        (
                            "id".to_string(),
                            types::AttributeValue::S(
                                "b".to_string()
                            )
                        ),
                    ]
                ),
            ],
            table_name: "a".to_string(),
            ..Default::default()
        }
    )]
    #[case::full(
        BatchGetItem {
            consistent_read: true,
            ids: vec![
                "b".to_string(),
                "c".to_string(),
                "b".to_string(),
            ],
            projection: Some(
                common::selection::ProjectionSpec {
                    expression: "#d, #id".to_string(),
                    aliases: collections::HashMap::from(
                        [
                            ("#d".to_string(), "d".to_string()),
                            ("#id".to_string(), "id".to_string()),
                        ]
                    ),
                }
            ),
            table_name: "a".to_string(),
        },
        BatchGetItemInput {
            consistent_read: true,
            expression_attribute_names: Some(
                collections::HashMap::from(
                    [
                        ("#d".to_string(), "d".to_string()),
                        ("#id".to_string(), "id".to_string()),
                    ]
                )
            ),
            keys: vec![
                collections::HashMap::from(
                    [
                        (
                            "id".to_string(),
                            types::AttributeValue::S(
                                "b".to_string()
                            )
                        ),
                    ]
                ),
                collections::HashMap::from(
                    [
                        (
                            "id".to_string(),
                            types::AttributeValue::S(
                                "c".to_string()
                            )
                        ),
                    ]
                ),
            ],
            projection_expression: Some(
                "#d, #id".to_string()
            ),
            table_name: "a".to_string(),
        }
    )]
    fn test_batch_get_item(#[case] args: BatchGetItem, #[case] expected: BatchGetItemInput) {
        let actual: BatchGetItemInput = args.into();
        assert_eq!(actual, expected);
    }

    #[rstest]
    #[case::eventually_consistent(false, None)]
    #[case::consistent(true, Some(true))]
    fn test_keys_and_attributes(#[case] consistent_read: bool, #[case] expected: Option<bool>) {
        let input: BatchGetItemInput = BatchGetItem {
            consistent_read,
            ids: vec!["b".to_string()],
            table_name: "a".to_string(),
            ..Default::default()
        }
        .into();
        let actual = input.keys_and_attributes(input.keys.clone()).unwrap();
        let expected = types::KeysAndAttributes::builder()
            .set_consistent_read(expected)
            .set_keys(Some(input.keys.clone()))
            .build()
            .unwrap();
        assert_eq!(actual, expected);
        assert_eq!(actual.consistent_read(), expected.consistent_read());
    }
}
