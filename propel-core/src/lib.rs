//! Propel Core
//!
//! Resource contract shared by the Propel provider and its orchestrator:
//! desired and local state, the Provider trait, diagnostics, schema
//! validation, and the status poller used to wait on asynchronous
//! provisioning.

pub mod diagnostics;
pub mod differ;
pub mod operations;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod wait;
