//! Common utilities for model operations.
//!
//! This module provides shared types used across read and write operations,
//! including the declared field schema, domain conditions, and attribute projection.

/// Domain triples and their compilation into condition expressions.
pub mod condition;

/// Declared fields and the table schema derived from them.
pub mod field;

/// Attribute projection and the sensitive-field policy.
pub mod selection;

use aws_sdk_dynamodb::types;
use std::collections;

/// A raw DynamoDB item: attribute name to attribute value.
pub type Item = collections::HashMap<String, types::AttributeValue>;

pub(crate) fn name_placeholder(name: &str) -> String {
    format!("#{name}")
}

fn get_expression(left: String, operator: &str, right: String) -> String {
    if left.is_empty() {
        right
    } else if right.is_empty() {
        left
    } else {
        format!("{left}{operator}{right}")
    }
}

/// expression operation
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ExpressionInput {
    pub(crate) expression: String,
    pub(crate) expression_attribute_names: collections::HashMap<String, String>,
    pub(crate) expression_attribute_values: collections::HashMap<String, types::AttributeValue>,
}

impl ExpressionInput {
    pub(crate) fn merge(operator: &str, items: Vec<Self>) -> Self {
        let mut operation = Self::default();
        for item in items {
            operation
                .expression_attribute_names
                .extend(item.expression_attribute_names);
            operation
                .expression_attribute_values
                .extend(item.expression_attribute_values);
            operation.expression = get_expression(operation.expression, operator, item.expression);
        }
        operation
    }

    pub(crate) fn merge_into(
        self,
        names: &mut Option<collections::HashMap<String, String>>,
        values: &mut Option<collections::HashMap<String, types::AttributeValue>>,
    ) -> String {
        if !self.expression_attribute_names.is_empty() {
            match names {
                Some(existing) => existing.extend(self.expression_attribute_names),
                None => *names = Some(self.expression_attribute_names),
            }
        }
        if !self.expression_attribute_values.is_empty() {
            match values {
                Some(existing) => existing.extend(self.expression_attribute_values),
                None => *values = Some(self.expression_attribute_values),
            }
        }
        self.expression
    }
}
