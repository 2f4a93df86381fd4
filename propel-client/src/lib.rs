//! Propel Client
//!
//! Typed operations of the Propel GraphQL API.
//!
//! ## Module Structure
//!
//! - `api` - The `PropelApi` trait, one method per operation
//! - `data_source` / `data_pool` / `metric` - Inputs and responses per entity
//! - `types` - Column types, pagination and other shared types
//! - `error` - `ClientError` and "not found" detection

pub mod api;
pub mod data_pool;
pub mod data_source;
pub mod error;
pub mod metric;
pub mod types;

pub use api::PropelApi;
pub use error::{ClientError, ClientResult};
pub use types::ColumnType;
