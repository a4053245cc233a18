use std::error;
#[cfg(test)]
use std::fmt;

/// Boxed error coming from the storage collaborator.
pub type BoxError = Box<dyn error::Error + Send + Sync + 'static>;

/// Errors raised by model operations.
///
/// Validation errors ([`Error::Schema`], [`Error::MissingKey`], [`Error::Operator`],
/// [`Error::Limit`])
/// are always raised before any request reaches the store, so they never leave
/// a partial write behind.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A field was not declared on the model, or is not indexed where an index is required.
    #[error("{0}")]
    Schema(String),
    /// An operation needing a record id was called without one.
    #[error("{0}")]
    MissingKey(String),
    /// A domain used an operator token that has no expression counterpart.
    #[error("unsupported operator `{0}`")]
    Operator(String),
    /// A search limit below one.
    #[error("invalid limit {0}, expected at least 1")]
    Limit(i32),
    /// A value could not be converted to or from DynamoDB attribute values.
    #[error(transparent)]
    Serialization(#[from] serde_dynamo::Error),
    /// Any failure reported by the store (throttling, permissions, network, ...).
    #[error("store request failed: {0}")]
    Store(#[source] BoxError),
}

impl Error {
    pub(crate) fn unknown_field(name: &str) -> Self {
        Self::Schema(format!("invalid field {name}"))
    }

    pub(crate) fn not_an_index(name: &str) -> Self {
        Self::Schema(format!("{name} is not an index field"))
    }

    pub(crate) fn store<E>(error: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        Self::Store(Box::new(error))
    }

    /// Whether the error was raised by local validation rather than by the store.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Schema(_) | Self::MissingKey(_) | Self::Operator(_) | Self::Limit(_)
        )
    }
}

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Store error that carries only a message, used by in-process stores.
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct StoreMessage(pub(crate) String);

#[cfg(test)]
impl fmt::Display for StoreMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
impl error::Error for StoreMessage {}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::unknown_field(Error::unknown_field("age"), "invalid field age", true)]
    #[case::not_an_index(Error::not_an_index("email"), "email is not an index field", true)]
    #[case::missing_key(Error::MissingKey("missing id".to_string()), "missing id", true)]
    #[case::operator(Error::Operator("~".to_string()), "unsupported operator `~`", true)]
    #[case::limit(Error::Limit(0), "invalid limit 0, expected at least 1", true)]
    #[case::store(
        Error::store(StoreMessage("throttled".to_string())),
        "store request failed: throttled",
        false
    )]
    fn test_error_display(
        #[case] error: Error,
        #[case] expected: &str,
        #[case] is_validation: bool,
    ) {
        assert_eq!(error.to_string(), expected);
        assert_eq!(error.is_validation(), is_validation);
    }
}
