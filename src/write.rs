//! Write operations for modifying records in model tables.
//!
//! This module provides the request shapes for writing data to DynamoDB:
//! - Putting a single record
//! - Batch putting and deleting records
//! - Validating and stamping incoming values

/// Batch write item request and its retry settings.
pub mod batch_write_item;

/// Field validation, ids and timestamps shared by write operations.
pub mod common;

/// Put item request for a single record.
pub mod put_item;
