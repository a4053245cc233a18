use crate::{
    common,
    error::{Error, Result},
};

use aws_sdk_dynamodb::types;
use serde::Serialize;
use serde_dynamo::to_attribute_value;
use std::{collections, fmt, str};

/// Separator placed between residual domain conditions.
pub(crate) const AND: &str = " AND ";

/// Comparison operator of a domain triple.
///
/// Only [`Operator::Equals`] is accepted by the store as a key condition on a
/// hash-only index; the others are passed through and left to the store to reject.
///
/// ```rust
/// use dynamodb_model::common::condition;
///
/// let operator: condition::Operator = "<=".parse().unwrap();
/// assert_eq!(operator, condition::Operator::LessThanOrEqual);
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operator {
    /// `=`
    Equals,
    /// `<>`
    NotEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
    /// `begins_with`
    BeginsWith,
}

impl Operator {
    /// The token used for this operator in domains and expressions.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::NotEqual => "<>",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::BeginsWith => "begins_with",
        }
    }

    fn placeholder_suffix(&self) -> &'static str {
        match self {
            Self::Equals => "eq",
            Self::NotEqual => "ne",
            Self::LessThan => "lt",
            Self::LessThanOrEqual => "lte",
            Self::GreaterThan => "gt",
            Self::GreaterThanOrEqual => "gte",
            Self::BeginsWith => "begins_with",
        }
    }
}

impl str::FromStr for Operator {
    type Err = Error;

    fn from_str(token: &str) -> Result<Self> {
        let operator = match token {
            "=" | "==" => Self::Equals,
            "<>" | "!=" => Self::NotEqual,
            "<" => Self::LessThan,
            "<=" => Self::LessThanOrEqual,
            ">" => Self::GreaterThan,
            ">=" => Self::GreaterThanOrEqual,
            "begins_with" => Self::BeginsWith,
            other => return Err(Error::Operator(other.to_string())),
        };
        Ok(operator)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A `(field, operator, value)` filter triple.
///
/// A domain is an ordered list of triples: the first one selects the index to
/// query, the rest become a residual filter.
///
/// ```rust
/// use dynamodb_model::common::condition;
///
/// let triple = condition::DomainTriple::try_from(("name", "=", "Mohammed")).unwrap();
/// assert_eq!(triple.operator, condition::Operator::Equals);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DomainTriple<T> {
    /// Attribute the condition applies to.
    pub field: String,
    /// Comparison operator.
    pub operator: Operator,
    /// Literal compared against.
    pub value: T,
}

impl<T> DomainTriple<T> {
    /// Build a triple from an already parsed operator.
    pub fn new(field: impl Into<String>, operator: Operator, value: T) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }
}

impl<T> TryFrom<(&str, &str, T)> for DomainTriple<T> {
    type Error = Error;

    fn try_from((field, token, value): (&str, &str, T)) -> Result<Self> {
        let operator = token.parse()?;
        Ok(Self::new(field, operator, value))
    }
}

impl<T: Serialize> DomainTriple<T> {
    /// Expression for this triple; `index` is its position in the domain and keeps
    /// value placeholders unique when a field appears more than once.
    pub(crate) fn get_expression_operation(self, index: usize) -> Result<common::ExpressionInput> {
        let name_placeholder = common::name_placeholder(&self.field);
        let value_placeholder = format!(
            ":{}_{}{}",
            self.field,
            self.operator.placeholder_suffix(),
            index
        );
        let expression = match self.operator {
            Operator::BeginsWith => format!("begins_with({name_placeholder}, {value_placeholder})"),
            operator => format!("{name_placeholder} {operator} {value_placeholder}"),
        };
        let value: types::AttributeValue = to_attribute_value(self.value)?;
        let operation = common::ExpressionInput {
            expression,
            expression_attribute_names: collections::HashMap::from([(
                name_placeholder,
                self.field,
            )]),
            expression_attribute_values: collections::HashMap::from([(value_placeholder, value)]),
        };
        Ok(operation)
    }
}

/// Conjunction of `triples`, numbering their placeholders from `offset`.
pub(crate) fn get_conjunction_operation<T: Serialize>(
    triples: Vec<DomainTriple<T>>,
    offset: usize,
) -> Result<common::ExpressionInput> {
    let mut operations = Vec::with_capacity(triples.len());
    for (index, triple) in triples.into_iter().enumerate() {
        let operation = triple.get_expression_operation(offset + index)?;
        operations.push(operation);
    }
    Ok(common::ExpressionInput::merge(AND, operations))
}
