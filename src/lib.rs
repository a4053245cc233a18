#![deny(missing_docs)]

//! # DynamoDB Model
//!
//! A declarative record-model layer over Amazon DynamoDB.
//!
//! ## Overview
//!
//! A model is declared once: a table name, typed fields and which of them are
//! searchable. From that declaration the crate:
//! - Provisions the table on first use, and adds a secondary index for every
//!   indexed field declared later
//! - Creates records with a generated id and `createdAt`/`updatedAt` timestamps
//! - Reads, merges and deletes records by id through the batch APIs, retrying
//!   unprocessed entries
//! - Compiles a search domain of `(field, operator, value)` triples into an index
//!   query or a scan, without hand-written expression strings
//! - Withholds sensitive attributes from reads and searches
//!
//! ## Quick Example
//!
//! ```no_run
//! use aws_sdk_dynamodb::Client;
//! use dynamodb_model::{common, model};
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! #[derive(Debug, Deserialize)]
//! struct User {
//!     name: Option<String>,
//!     age: Option<u32>,
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let client = Client::from_conf(aws_sdk_dynamodb::config::Config::builder().build());
//! let users: model::Model<User, Client> = model::Model::new(
//!     client,
//!     model::ModelDescriptor {
//!         table_name: "users".to_string(),
//!         fields: vec![
//!             common::field::FieldSpec::indexed("name", common::field::FieldType::String),
//!             common::field::FieldSpec::new("age", common::field::FieldType::Number),
//!         ],
//!         ..Default::default()
//!     },
//! )?;
//! // The table and its "nameIndex" are created on first use
//! let user = users.create(json!({"name": "Person 1", "age": 30})).await?;
//! users.write(json!({"id": user.id, "name": "Mohammed"})).await?;
//! // Resolves to a query on "nameIndex": "#name = :name_eq0"
//! let found = users
//!     .search(
//!         vec![common::condition::DomainTriple::try_from(("name", "=", "Mohammed"))?],
//!         None,
//!         None,
//!     )
//!     .await?;
//! assert_eq!(found.ids(), vec![user.id.as_str()]);
//! users.delete(&found.ids()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`mod@model`] - Model declaration and its CRUD operations
//! - [`mod@record`] - Typed records and record sets
//! - [`mod@table`] - Table provisioning, index reconciliation and the schema cache
//! - [`mod@store`] - The store seam and its DynamoDB client implementation
//! - [`mod@common`] - Fields, conditions and attribute selection
//! - [`mod@read`] - Search compilation and read requests
//! - [`mod@write`] - Write requests and record stamping

pub mod common;

/// Errors raised by model operations.
pub mod error;

pub mod model;

pub mod read;

pub mod record;

pub mod store;

pub mod table;

pub mod write;

pub use error::{Error, Result};
pub use model::{Model, ModelDescriptor};
pub use record::{Record, RecordSet};
pub use store::Store;
