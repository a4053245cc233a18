//! The storage collaborator behind every model.
//!
//! [`Store`] is the contract the reconciler and the CRUD facade are written
//! against. It is implemented for [`aws_sdk_dynamodb::Client`]; the application
//! builds the client (credentials, region, timeouts) and hands it to
//! [`crate::model::Model::new`].

/// [`Store`] implementation for the DynamoDB client.
pub mod client;

#[cfg(test)]
pub(crate) mod memory;

use crate::{common, error::Result, read, table, write};

use std::{future::Future, sync::Arc, time::Duration};

/// Requests a model issues against its table.
///
/// Each method is a single logical request. Implementations own chunking,
/// pagination and the re-sending of unprocessed batch entries.
pub trait Store: Send + Sync {
    /// Describe `table_name`, or `Ok(None)` when the table does not exist.
    fn describe_table(
        &self,
        table_name: &str,
    ) -> impl Future<Output = Result<Option<table::TableHandle>>> + Send;

    /// Start creating a table.
    fn create_table(
        &self,
        input: table::CreateTableInput,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Wait for `table_name` to exist and be active, for at most `max_wait`.
    fn wait_until_active(
        &self,
        table_name: &str,
        max_wait: Duration,
    ) -> impl Future<Output = Result<table::TableHandle>> + Send;

    /// Add attribute definitions and secondary indexes to a live table.
    fn update_table(
        &self,
        input: table::UpdateTableInput,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Fetch items by id. Absent ids are left out of the result.
    fn batch_get_item(
        &self,
        input: read::batch_get_item::BatchGetItemInput,
    ) -> impl Future<Output = Result<Vec<common::Item>>> + Send;

    /// Create or replace a single item.
    fn put_item(
        &self,
        input: write::put_item::PutItemInput,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Submit puts and deletes through the batch writer.
    fn batch_write_item(
        &self,
        input: write::batch_write_item::BatchWriteItemInput,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Read the whole table, up to the request's limit.
    fn scan(
        &self,
        input: read::scan::ScanInput,
    ) -> impl Future<Output = Result<Vec<common::Item>>> + Send;

    /// Query a secondary index, up to the request's limit.
    fn query(
        &self,
        input: read::query::QueryInput,
    ) -> impl Future<Output = Result<Vec<common::Item>>> + Send;
}

impl<S: Store> Store for Arc<S> {
    fn describe_table(
        &self,
        table_name: &str,
    ) -> impl Future<Output = Result<Option<table::TableHandle>>> + Send {
        (**self).describe_table(table_name)
    }

    fn create_table(
        &self,
        input: table::CreateTableInput,
    ) -> impl Future<Output = Result<()>> + Send {
        (**self).create_table(input)
    }

    fn wait_until_active(
        &self,
        table_name: &str,
        max_wait: Duration,
    ) -> impl Future<Output = Result<table::TableHandle>> + Send {
        (**self).wait_until_active(table_name, max_wait)
    }

    fn update_table(
        &self,
        input: table::UpdateTableInput,
    ) -> impl Future<Output = Result<()>> + Send {
        (**self).update_table(input)
    }

    fn batch_get_item(
        &self,
        input: read::batch_get_item::BatchGetItemInput,
    ) -> impl Future<Output = Result<Vec<common::Item>>> + Send {
        (**self).batch_get_item(input)
    }

    fn put_item(
        &self,
        input: write::put_item::PutItemInput,
    ) -> impl Future<Output = Result<()>> + Send {
        (**self).put_item(input)
    }

    fn batch_write_item(
        &self,
        input: write::batch_write_item::BatchWriteItemInput,
    ) -> impl Future<Output = Result<()>> + Send {
        (**self).batch_write_item(input)
    }

    fn scan(
        &self,
        input: read::scan::ScanInput,
    ) -> impl Future<Output = Result<Vec<common::Item>>> + Send {
        (**self).scan(input)
    }

    fn query(
        &self,
        input: read::query::QueryInput,
    ) -> impl Future<Output = Result<Vec<common::Item>>> + Send {
        (**self).query(input)
    }
}
