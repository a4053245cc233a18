use crate::common;

use aws_sdk_dynamodb::types;
use std::collections;

/// Parameters shared by scan and query requests.
///
/// Produced by [`crate::read::query::Search::compile`]; a [`crate::store::Store`]
/// implementation forwards them to the store unchanged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReadInput {
    /// Placeholder to attribute name, for every name used in any expression.
    pub expression_attribute_names: Option<collections::HashMap<String, String>>,
    /// Placeholder to literal value, for every value used in any expression.
    pub expression_attribute_values:
        Option<collections::HashMap<String, types::AttributeValue>>,
    /// Residual filter applied by the store after the key lookup.
    pub filter_expression: Option<String>,
    /// Secondary index addressed by a query.
    pub index_name: Option<String>,
    /// Maximum number of items to return.
    pub limit: Option<i32>,
    /// Attributes to return; `None` returns whole items.
    pub projection_expression: Option<String>,
    /// Table to read from.
    pub table_name: String,
}

impl ReadInput {
    pub(crate) fn new(
        table_name: String,
        projection: Option<common::selection::ProjectionSpec>,
        limit: Option<i32>,
    ) -> Self {
        let mut input = Self {
            limit,
            table_name,
            ..Default::default()
        };
        if let Some(projection) = projection {
            let projection_expression = input.merge_expression(projection.into());
            input.projection_expression = Some(projection_expression);
        }
        input
    }

    /// Merge an expression operation into this read operation.
    pub(crate) fn merge_expression(&mut self, operation: common::ExpressionInput) -> String {
        operation.merge_into(
            &mut self.expression_attribute_names,
            &mut self.expression_attribute_values,
        )
    }
}

/// apply common read operation settings to a scan or query builder
#[macro_export]
macro_rules! apply_read_operation {
    ($builder:expr, $read_operation:expr) => {
        $builder
            .set_expression_attribute_names($read_operation.expression_attribute_names)
            .set_expression_attribute_values($read_operation.expression_attribute_values)
            .set_filter_expression($read_operation.filter_expression)
            .set_index_name($read_operation.index_name)
            .set_limit($read_operation.limit)
            .set_projection_expression($read_operation.projection_expression)
            .table_name($read_operation.table_name)
    };
}

/// collect the items of every page, stopping once `limit` items are gathered
#[macro_export]
macro_rules! get_paginated_items {
    ($paginator:expr, $limit:expr) => {{
        let limit: Option<usize> = $limit.and_then(|limit: i32| usize::try_from(limit).ok());
        let mut items = Vec::new();
        while let Some(page) = $paginator.next().await {
            let page = page.map_err($crate::error::Error::store)?;
            if let Some(page_items) = page.items {
                items.extend(page_items);
            }
            if limit.is_some_and(|limit| items.len() >= limit) {
                break;
            }
        }
        if let Some(limit) = limit {
            items.truncate(limit);
        }
        Ok(items)
    }};
}
