use crate::common;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections;

/// Which attributes are withheld when a read or search does not name its fields.
///
/// The same policy applies to `read`, `search` and `search_read`. Under
/// [`SensitiveFieldPolicy::ExcludeSubstrings`], attributes whose name contains
/// one of the substrings are also dropped from explicit field lists.
///
/// ```rust
/// use dynamodb_model::common::selection;
///
/// let policy = selection::SensitiveFieldPolicy::default();
/// assert!(policy.is_sensitive("passwordHash"));
/// assert!(!policy.is_sensitive("email"));
/// ```
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitiveFieldPolicy {
    /// Nothing is withheld; without explicit fields the whole item is returned.
    Disabled,
    /// Attributes whose name contains any of these substrings, ignoring case, are withheld.
    ExcludeSubstrings(Vec<String>),
}

impl Default for SensitiveFieldPolicy {
    fn default() -> Self {
        Self::ExcludeSubstrings(vec!["password".to_string(), "secret".to_string()])
    }
}

impl SensitiveFieldPolicy {
    /// Whether `name` must be withheld.
    pub fn is_sensitive(&self, name: &str) -> bool {
        match self {
            Self::Disabled => false,
            Self::ExcludeSubstrings(substrings) => {
                let name = name.to_lowercase();
                substrings
                    .iter()
                    .any(|substring| name.contains(&substring.to_lowercase()))
            }
        }
    }
}

/// Projection clause shared by batch-get, scan and query requests.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ProjectionSpec {
    /// Comma separated name placeholders, e.g. `#name, #id`.
    pub expression: String,
    /// Placeholder to attribute name.
    pub aliases: collections::HashMap<String, String>,
}

impl From<common::ExpressionInput> for ProjectionSpec {
    fn from(operation: common::ExpressionInput) -> Self {
        Self {
            expression: operation.expression,
            aliases: operation.expression_attribute_names,
        }
    }
}

impl From<ProjectionSpec> for common::ExpressionInput {
    fn from(projection: ProjectionSpec) -> Self {
        Self {
            expression: projection.expression,
            expression_attribute_names: projection.aliases,
            ..Default::default()
        }
    }
}

fn get_selection_operation<'a>(fields: impl Iterator<Item = &'a str>) -> common::ExpressionInput {
    let operations: Vec<_> = fields
        .map(|field| {
            let placeholder = common::name_placeholder(field);
            common::ExpressionInput {
                expression: placeholder.clone(),
                expression_attribute_names: collections::HashMap::from([(
                    placeholder,
                    field.to_string(),
                )]),
                ..Default::default()
            }
        })
        .collect();
    common::ExpressionInput::merge(", ", operations)
}

/// Build the projection for a read or search.
///
/// `known_attributes` are the attributes the table is known to carry. Requested
/// fields missing from it are dropped silently and `id` is always added to an
/// explicit list; the policy never withholds `id`. `None` means no projection
/// clause: the whole item comes back.
///
/// ```rust
/// use dynamodb_model::common::selection;
///
/// let known = vec!["id".to_string(), "name".to_string(), "secretToken".to_string()];
/// let projection = selection::project(
///     Some(&["name".to_string()]),
///     &known,
///     &selection::SensitiveFieldPolicy::default(),
/// )
/// .unwrap();
/// assert_eq!(projection.expression, "#name, #id");
/// ```
pub fn project(
    requested_fields: Option<&[String]>,
    known_attributes: &[String],
    policy: &SensitiveFieldPolicy,
) -> Option<ProjectionSpec> {
    let visible: IndexSet<&str> = known_attributes
        .iter()
        .map(String::as_str)
        .filter(|name| *name == common::field::PARTITION_KEY || !policy.is_sensitive(name))
        .collect();
    let operation = match requested_fields {
        Some(fields) if !fields.is_empty() => {
            let mut fields: IndexSet<&str> = fields.iter().map(String::as_str).collect();
            fields.insert(common::field::PARTITION_KEY);
            get_selection_operation(fields.into_iter().filter(|field| visible.contains(field)))
        }
        _ => match policy {
            SensitiveFieldPolicy::Disabled => return None,
            SensitiveFieldPolicy::ExcludeSubstrings(_) => {
                get_selection_operation(visible.into_iter())
            }
        },
    };
    Some(operation.into())
}
