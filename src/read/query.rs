use crate::{
    common,
    error::{Error, Result},
    read,
};

use aws_sdk_dynamodb::types;
use serde::Serialize;
use std::collections;

/// Index query compiled from a non-empty domain.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexQuery {
    /// `{field}Index` of the domain's first triple.
    pub index_name: String,
    /// Condition of the domain's first triple.
    pub key_condition_expression: String,
    /// Remaining triples joined with `AND`, if any.
    pub filter_expression: Option<String>,
    /// Placeholder to attribute name for both expressions.
    pub expression_attribute_names: collections::HashMap<String, String>,
    /// Placeholder to literal value for both expressions.
    pub expression_attribute_values: collections::HashMap<String, types::AttributeValue>,
}

/// What a domain compiles to.
#[derive(Clone, Debug, PartialEq)]
pub enum QuerySpec {
    /// Empty domain: read the whole table.
    Scan,
    /// Query the index of the first triple's field.
    Query(IndexQuery),
}

/// Compile a domain against `schema`.
///
/// Every triple must name a declared, indexed field. The first triple becomes the
/// key condition on its field's index and the rest become a residual filter.
/// The residual filter may not name the key field again.
///
/// ```rust
/// use dynamodb_model::common::{condition, field};
/// use dynamodb_model::read::query;
///
/// let schema = field::TableSchema::new(
///     "users",
///     vec![field::FieldSpec::indexed("name", field::FieldType::String)],
///     field::BillingMode::PayPerRequest,
/// )
/// .unwrap();
/// let domain = vec![condition::DomainTriple::try_from(("name", "=", "Mohammed")).unwrap()];
/// let query::QuerySpec::Query(index_query) = query::compile(domain, &schema).unwrap() else {
///     unreachable!()
/// };
/// assert_eq!(index_query.index_name, "nameIndex");
/// assert_eq!(index_query.key_condition_expression, "#name = :name_eq0");
/// ```
pub fn compile<T: Serialize>(
    domain: Vec<common::condition::DomainTriple<T>>,
    schema: &common::field::TableSchema,
) -> Result<QuerySpec> {
    if let Some(triple) = domain
        .iter()
        .find(|triple| !schema.is_indexed(&triple.field))
    {
        return Err(Error::not_an_index(&triple.field));
    }
    let mut triples = domain.into_iter();
    let Some(first) = triples.next() else {
        return Ok(QuerySpec::Scan);
    };
    let index_name = common::field::index_name(&first.field);
    let residual: Vec<_> = triples.collect();
    if residual.iter().any(|triple| triple.field == first.field) {
        return Err(Error::Schema(format!(
            "{} is the key of {index_name} and cannot also be filtered",
            first.field
        )));
    }
    let key_condition = first.get_expression_operation(0)?;
    let filter = if residual.is_empty() {
        None
    } else {
        Some(common::condition::get_conjunction_operation(residual, 1)?)
    };
    let mut expression_attribute_names = key_condition.expression_attribute_names;
    let mut expression_attribute_values = key_condition.expression_attribute_values;
    let filter_expression = filter.map(|filter| {
        expression_attribute_names.extend(filter.expression_attribute_names);
        expression_attribute_values.extend(filter.expression_attribute_values);
        filter.expression
    });
    let query = IndexQuery {
        index_name,
        key_condition_expression: key_condition.expression,
        filter_expression,
        expression_attribute_names,
        expression_attribute_values,
    };
    Ok(QuerySpec::Query(query))
}

/// Query request against a secondary index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryInput {
    /// Key condition on the index partition key.
    pub key_condition_expression: String,
    /// Table, index, filter, projection and limit.
    pub read_operation: read::common::ReadInput,
}

/// Request a search resolves to.
#[derive(Clone, Debug, PartialEq)]
pub enum SearchInput {
    /// Whole-table scan.
    Scan(read::scan::ScanInput),
    /// Secondary index query.
    Query(QueryInput),
}

/// Search over a model table.
///
/// ```rust
/// use dynamodb_model::common::{condition, field};
/// use dynamodb_model::read::query;
///
/// let schema = field::TableSchema::new(
///     "users",
///     vec![field::FieldSpec::indexed("name", field::FieldType::String)],
///     field::BillingMode::PayPerRequest,
/// )
/// .unwrap();
/// let search: query::Search<String> = query::Search {
///     limit: Some(10),
///     ..Default::default()
/// };
/// assert!(matches!(search.compile(&schema).unwrap(), query::SearchInput::Scan(_)));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Search<T> {
    /// Filter triples; empty for a scan.
    pub domain: Vec<common::condition::DomainTriple<T>>,
    /// Maximum number of items to return.
    pub limit: Option<i32>,
    /// Attributes to return.
    pub projection: Option<common::selection::ProjectionSpec>,
}

impl<T> Default for Search<T> {
    fn default() -> Self {
        Self {
            domain: Vec::new(),
            limit: None,
            projection: None,
        }
    }
}

impl<T: Serialize> Search<T> {
    /// Resolve the search into a scan or a query on `schema`'s table.
    ///
    /// A limit below one is rejected.
    pub fn compile(self, schema: &common::field::TableSchema) -> Result<SearchInput> {
        if let Some(limit) = self.limit.filter(|limit| *limit < 1) {
            return Err(Error::Limit(limit));
        }
        let mut read_operation =
            read::common::ReadInput::new(schema.name.clone(), self.projection, self.limit);
        let input = match compile(self.domain, schema)? {
            QuerySpec::Scan => SearchInput::Scan(read::scan::ScanInput { read_operation }),
            QuerySpec::Query(query) => {
                let key_condition_expression = read_operation.merge_expression(
                    common::ExpressionInput {
                        expression: query.key_condition_expression,
                        expression_attribute_names: query.expression_attribute_names,
                        expression_attribute_values: query.expression_attribute_values,
                    },
                );
                read_operation.filter_expression = query.filter_expression;
                read_operation.index_name = Some(query.index_name);
                SearchInput::Query(QueryInput {
                    key_condition_expression,
                    read_operation,
                })
            }
        };
        Ok(input)
    }
}
