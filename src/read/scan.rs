use crate::read;

/// Scan request over a whole model table.
///
/// ```rust
/// use dynamodb_model::read;
///
/// let scan = read::scan::ScanInput {
///     read_operation: read::common::ReadInput {
///         table_name: "users".to_string(),
///         limit: Some(1),
///         ..Default::default()
///     },
/// };
/// assert!(scan.read_operation.filter_expression.is_none());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanInput {
    /// Table, projection and limit.
    pub read_operation: read::common::ReadInput,
}
