use crate::{
    common,
    error::{Error, Result},
};

use aws_sdk_dynamodb::types;
use std::time::Duration;

/// Most requests a single BatchWriteItem call may carry.
pub const BATCH_WRITE_SIZE: usize = 25;

/// A single request within a batch write.
#[derive(Clone, Debug, PartialEq)]
pub enum BatchWriteItemRequest {
    /// Creates or replaces the item.
    PutItem(common::Item),
    /// Removes the record with this id.
    DeleteItem(String),
}

impl TryFrom<BatchWriteItemRequest> for types::WriteRequest {
    type Error = Error;

    fn try_from(write_request: BatchWriteItemRequest) -> Result<Self> {
        let builder = match write_request {
            BatchWriteItemRequest::PutItem(item) => {
                let put_request = types::PutRequest::builder()
                    .set_item(Some(item))
                    .build()
                    .map_err(Error::store)?;
                Self::builder().set_put_request(Some(put_request))
            }
            BatchWriteItemRequest::DeleteItem(id) => {
                let delete_request = types::DeleteRequest::builder()
                    .set_key(Some(common::field::id_key(&id)))
                    .build()
                    .map_err(Error::store)?;
                Self::builder().set_delete_request(Some(delete_request))
            }
        };
        Ok(builder.build())
    }
}

/// Batch write against one table.
///
/// ```rust
/// use dynamodb_model::write;
///
/// let batch_write = write::batch_write_item::BatchWriteItemInput {
///     requests: vec![write::batch_write_item::BatchWriteItemRequest::DeleteItem(
///         "1".to_string(),
///     )],
///     table_name: "users".to_string(),
/// };
/// assert_eq!(batch_write.write_requests().unwrap().len(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchWriteItemInput {
    /// Puts and deletes, in submission order.
    pub requests: Vec<BatchWriteItemRequest>,
    /// The name of the table to write to.
    pub table_name: String,
}

impl BatchWriteItemInput {
    /// The requests in their wire form.
    pub fn write_requests(self) -> Result<Vec<types::WriteRequest>> {
        self.requests.into_iter().map(TryInto::try_into).collect()
    }
}

/// Retry settings for items the store leaves unprocessed in a batch.
///
/// Delays grow exponentially from `initial_delay` and are capped at `max_delay`.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryConfig {
    /// How many times unprocessed items are re-sent.
    pub max_retries: usize,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for any delay.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(2000),
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (0-based).
    pub fn retry_delay(&self, attempt: usize) -> Duration {
        let factor = 2u32.saturating_pow(u32::try_from(attempt).unwrap_or(u32::MAX));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}
