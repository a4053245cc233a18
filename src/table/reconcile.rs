use crate::{common, error::Result, store, table};

use std::time::Duration;

/// How long a freshly created table may take to become active.
pub const DEFAULT_TABLE_WAIT: Duration = Duration::from_secs(300);

/// Make sure the table behind `schema` exists with an index per indexed field.
///
/// A missing table is created (partition key `id`, one index per indexed field,
/// projection `ALL`) and waited on until active, for at most `max_wait`. On a
/// live table, indexed fields lacking their attribute definition or their
/// index are added in an update; index backfill is not waited on. Any store
/// failure other than the table being absent is returned as is.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_model::common::field;
/// use dynamodb_model::table::reconcile;
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let schema = field::TableSchema::new(
///     "users",
///     vec![field::FieldSpec::indexed("name", field::FieldType::String)],
///     field::BillingMode::PayPerRequest,
/// )?;
/// let handle = reconcile::ensure_table(client, &schema, reconcile::DEFAULT_TABLE_WAIT).await?;
/// assert!(handle.has_index("nameIndex"));
/// # Ok(())
/// # }
/// ```
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        name = "dynamodb_model.ensure_table",
        skip_all,
        fields(table = %schema.name),
        err
    )
)]
pub async fn ensure_table<S: store::Store>(
    store: &S,
    schema: &common::field::TableSchema,
    max_wait: Duration,
) -> Result<table::TableHandle> {
    match store.describe_table(&schema.name).await? {
        Some(handle) => {
            let missing: Vec<_> = schema
                .indexed_fields()
                .filter(|field| {
                    !handle.has_attribute(&field.name) || !handle.has_index(&field.index_name())
                })
                .collect();
            if missing.is_empty() {
                return Ok(handle);
            }
            let update = table::UpdateTableInput::add_indexes(schema, &missing)?;
            store.update_table(update).await?;
            #[cfg(feature = "tracing")]
            tracing::info!(
                indexes = ?missing.iter().map(|field| field.index_name()).collect::<Vec<_>>(),
                "adding secondary indexes"
            );
            Ok(handle.with_fields(&missing))
        }
        None => {
            let create = table::CreateTableInput::try_from(schema)?;
            store.create_table(create).await?;
            #[cfg(feature = "tracing")]
            tracing::info!("table created, waiting until active");
            store.wait_until_active(&schema.name, max_wait).await
        }
    }
}
