//! Read operations for retrieving records from model tables.
//!
//! This module provides the request shapes for reading data from DynamoDB:
//! - Batch retrieving records by id
//! - Compiling a domain into an index query
//! - Scanning the whole table

/// Batch get item request for retrieving records by id.
pub mod batch_get_item;

/// Common types and helpers for read operations.
pub mod common;

/// Domain compilation and the index query request.
pub mod query;

/// Scan request for reading a table without a domain.
pub mod scan;
