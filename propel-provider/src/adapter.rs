//! Per-kind CRUD contract
//!
//! Each resource kind implements `ResourceAdapter`; `PropelProvider` routes
//! orchestrator calls to the adapter registered for the resource type.

use std::collections::HashMap;

use async_trait::async_trait;
use propel_core::provider::{ErrorKind, OperationContext, ProviderError, ProviderResult};
use propel_core::resource::{Resource, ResourceId, State, Value};

#[async_trait]
pub trait ResourceAdapter: Send + Sync {
    fn resource_type(&self) -> &'static str;

    /// Create the remote resource, wait for it to be ready and read it back
    ///
    /// An error raised after the remote create succeeded carries the new
    /// identifier.
    async fn create(&self, ctx: &OperationContext, resource: &Resource) -> ProviderResult<State>;

    /// Mirror the remote resource into a fresh `State`
    ///
    /// `prior` is the last known local attribute set; values the API never
    /// echoes back (secrets) are carried over from it.
    async fn read(
        &self,
        id: &ResourceId,
        identifier: &str,
        prior: &HashMap<String, Value>,
    ) -> ProviderResult<State>;

    async fn update(
        &self,
        ctx: &OperationContext,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State>;

    async fn delete(
        &self,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<()>;
}

/// Identifier of a stored resource
pub fn identifier_of(state: &State) -> ProviderResult<&str> {
    state
        .identifier
        .as_deref()
        .ok_or_else(|| ProviderError::new("Cannot update a resource without an identifier"))
}

/// Final read of a Create; a resource missing right after creation is an error
pub fn read_back(state: State, kind: &str, identifier: &str) -> ProviderResult<State> {
    if state.exists {
        Ok(state)
    } else {
        Err(ProviderError::new(format!(
            "{} {} no longer exists after creation",
            kind, identifier
        ))
        .with_kind(ErrorKind::Provisioning)
        .with_identifier(identifier))
    }
}
