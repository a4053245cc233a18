use crate::{
    common,
    error::{Error, Result},
    read, store, table, write,
};

use aws_sdk_dynamodb::{Client, client::Waiters};
use std::time::Duration;

/// Sleep before re-sending unprocessed batch entries, or give up once the
/// retries are exhausted.
async fn back_off(
    retry: &write::batch_write_item::RetryConfig,
    attempt: usize,
    pending: usize,
) -> Result<()> {
    if attempt == 0 {
        return Ok(());
    }
    if attempt > retry.max_retries {
        let message = format!(
            "{pending} batch entries left unprocessed after {} retries",
            retry.max_retries
        );
        return Err(Error::Store(message.into()));
    }
    #[cfg(feature = "tracing")]
    tracing::debug!(attempt, pending, "re-sending unprocessed batch entries");
    tokio::time::sleep(retry.retry_delay(attempt - 1)).await;
    Ok(())
}

impl store::Store for Client {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_model.describe_table", skip(self), err)
    )]
    async fn describe_table(&self, table_name: &str) -> Result<Option<table::TableHandle>> {
        let output = match self.describe_table().table_name(table_name).send().await {
            Ok(output) => output,
            Err(error)
                if error
                    .as_service_error()
                    .is_some_and(|error| error.is_resource_not_found_exception()) =>
            {
                return Ok(None);
            }
            Err(error) => return Err(Error::store(error)),
        };
        Ok(output.table.map(table::TableHandle::from))
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_model.create_table", skip(self), err)
    )]
    async fn create_table(&self, input: table::CreateTableInput) -> Result<()> {
        self.create_table()
            .set_attribute_definitions(Some(input.attribute_definitions))
            .billing_mode(input.billing_mode)
            .set_global_secondary_indexes(input.global_secondary_indexes)
            .set_key_schema(Some(input.key_schema))
            .set_provisioned_throughput(input.provisioned_throughput)
            .table_name(input.table_name)
            .send()
            .await
            .map_err(Error::store)?;
        Ok(())
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_model.wait_until_active", skip(self), err)
    )]
    async fn wait_until_active(
        &self,
        table_name: &str,
        max_wait: Duration,
    ) -> Result<table::TableHandle> {
        self.wait_until_table_exists()
            .table_name(table_name)
            .wait(max_wait)
            .await
            .map_err(Error::store)?;
        let handle = store::Store::describe_table(self, table_name).await?;
        handle.ok_or_else(|| Error::Store(format!("table {table_name} missing after creation").into()))
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_model.update_table", skip(self), err)
    )]
    async fn update_table(&self, input: table::UpdateTableInput) -> Result<()> {
        // The service accepts a single index creation per request.
        for update in input.global_secondary_index_updates {
            let key_names: Vec<&str> = update
                .create()
                .map(|create| {
                    create
                        .key_schema()
                        .iter()
                        .map(|key| key.attribute_name())
                        .collect()
                })
                .unwrap_or_default();
            let attribute_definitions: Vec<_> = input
                .attribute_definitions
                .iter()
                .filter(|definition| key_names.contains(&definition.attribute_name()))
                .cloned()
                .collect();
            self.update_table()
                .table_name(&input.table_name)
                .set_attribute_definitions(
                    (!attribute_definitions.is_empty()).then_some(attribute_definitions),
                )
                .global_secondary_index_updates(update)
                .send()
                .await
                .map_err(Error::store)?;
        }
        Ok(())
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_model.batch_get_item", skip(self), err)
    )]
    async fn batch_get_item(
        &self,
        input: read::batch_get_item::BatchGetItemInput,
    ) -> Result<Vec<common::Item>> {
        let retry = write::batch_write_item::RetryConfig::default();
        let mut items = Vec::with_capacity(input.keys.len());
        for chunk in input.keys.chunks(read::batch_get_item::BATCH_GET_SIZE) {
            let mut pending = Some(input.keys_and_attributes(chunk.to_vec())?);
            let mut attempt = 0;
            while let Some(keys_and_attributes) = pending.take() {
                back_off(&retry, attempt, keys_and_attributes.keys().len()).await?;
                let output = self
                    .batch_get_item()
                    .request_items(&input.table_name, keys_and_attributes)
                    .send()
                    .await
                    .map_err(Error::store)?;
                if let Some(found) = output
                    .responses
                    .and_then(|mut responses| responses.remove(&input.table_name))
                {
                    items.extend(found);
                }
                pending = output
                    .unprocessed_keys
                    .and_then(|mut unprocessed| unprocessed.remove(&input.table_name))
                    .filter(|unprocessed| !unprocessed.keys().is_empty());
                attempt += 1;
            }
        }
        Ok(items)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_model.put_item", skip(self), err)
    )]
    async fn put_item(&self, input: write::put_item::PutItemInput) -> Result<()> {
        self.put_item()
            .set_item(Some(input.item))
            .table_name(input.table_name)
            .send()
            .await
            .map_err(Error::store)?;
        Ok(())
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_model.batch_write_item", skip(self), err)
    )]
    async fn batch_write_item(
        &self,
        input: write::batch_write_item::BatchWriteItemInput,
    ) -> Result<()> {
        let retry = write::batch_write_item::RetryConfig::default();
        let table_name = input.table_name.clone();
        let write_requests = input.write_requests()?;
        for chunk in write_requests.chunks(write::batch_write_item::BATCH_WRITE_SIZE) {
            let mut pending = chunk.to_vec();
            let mut attempt = 0;
            while !pending.is_empty() {
                back_off(&retry, attempt, pending.len()).await?;
                let output = self
                    .batch_write_item()
                    .request_items(&table_name, pending)
                    .send()
                    .await
                    .map_err(Error::store)?;
                pending = output
                    .unprocessed_items
                    .and_then(|mut unprocessed| unprocessed.remove(&table_name))
                    .unwrap_or_default();
                attempt += 1;
            }
        }
        Ok(())
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_model.scan", skip(self), err)
    )]
    async fn scan(&self, input: read::scan::ScanInput) -> Result<Vec<common::Item>> {
        let limit = input.read_operation.limit;
        let mut paginator = crate::apply_read_operation!(self.scan(), input.read_operation)
            .into_paginator()
            .send();
        crate::get_paginated_items!(paginator, limit)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_model.query", skip(self), err)
    )]
    async fn query(&self, input: read::query::QueryInput) -> Result<Vec<common::Item>> {
        let limit = input.read_operation.limit;
        let builder = self
            .query()
            .key_condition_expression(input.key_condition_expression);
        let mut paginator = crate::apply_read_operation!(builder, input.read_operation)
            .into_paginator()
            .send();
        crate::get_paginated_items!(paginator, limit)
    }
}
