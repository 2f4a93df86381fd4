//! Propel Provider
//!
//! Manages Propel Data Sources, Data Pools and Metrics.
//!
//! ## Module Structure
//!
//! - `provider` - PropelProvider, routing calls to the adapter of each type
//! - `adapter` - The per-kind CRUD contract
//! - `data_source` / `data_pool` / `metric` - One adapter per resource kind
//! - `mapper` - Conversion between configuration records and API types
//! - `resources` - Resource type definitions and schemas
//! - `config` - Credentials and poll settings
//! - `logging` - env_logger initialisation

pub mod adapter;
pub mod config;
pub mod data_pool;
pub mod data_source;
pub mod logging;
pub mod mapper;
pub mod metric;
pub mod provider;
pub mod resources;

#[cfg(test)]
mod testing;

// Re-export main types
pub use config::{PollSettings, ProviderConfig};
pub use logging::init_logging;
pub use provider::PropelProvider;

use propel_core::provider::{BoxFuture, OperationContext, Provider, ProviderResult, ResourceType};
use propel_core::resource::{Resource, ResourceId, State};

use resources::resource_types;

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for PropelProvider {
    fn name(&self) -> &'static str {
        "propel"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        resource_types()
    }

    fn read<'a>(
        &'a self,
        _ctx: &'a OperationContext,
        current: &'a State,
    ) -> BoxFuture<'a, ProviderResult<State>> {
        Box::pin(self.read_resource(current))
    }

    fn create<'a>(
        &'a self,
        ctx: &'a OperationContext,
        resource: &'a Resource,
    ) -> BoxFuture<'a, ProviderResult<State>> {
        Box::pin(self.create_resource(ctx, resource))
    }

    fn update<'a>(
        &'a self,
        ctx: &'a OperationContext,
        from: &'a State,
        to: &'a Resource,
    ) -> BoxFuture<'a, ProviderResult<State>> {
        Box::pin(self.update_resource(ctx, from, to))
    }

    fn delete<'a>(
        &'a self,
        ctx: &'a OperationContext,
        id: &'a ResourceId,
        identifier: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(self.delete_resource(ctx, id, identifier))
    }
}
