//! Provider - Trait abstracting resource operations
//!
//! A Provider owns a set of resource types and turns the orchestrator's CRUD
//! calls into remote API calls, reporting the resulting local state.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::resource::{Resource, ResourceId, State};
use crate::schema::ResourceSchema;

/// Category of a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid or contradictory configuration, detected before any remote call
    Configuration,
    /// The remote API (or its transport) returned an error
    Api,
    /// The remote resource settled in a status outside the expected sets
    Provisioning,
    /// A wait exceeded its deadline
    Timeout,
    /// The operation context was cancelled
    Cancelled,
    /// The remote answer could not be mapped into local state
    Internal,
}

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub message: String,
    pub kind: ErrorKind,
    pub resource_id: Option<ResourceId>,
    /// Remote identifier of a resource that exists despite the failure
    pub identifier: Option<String>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref id) = self.resource_id {
            write!(f, "[{}.{}] {}", id.resource_type, id.name, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ErrorKind::Internal,
            resource_id: None,
            identifier: None,
            cause: None,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(ErrorKind::Configuration)
    }

    /// Wrap a remote error with the name of the failing operation
    ///
    /// The remote text is kept verbatim in the message.
    pub fn api(operation: &str, cause: impl fmt::Display) -> Self {
        Self::new(format!("{}: {}", operation, cause)).with_kind(ErrorKind::Api)
    }

    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id = Some(id);
        self
    }

    /// Record that the remote resource was created under `identifier`
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Prefix the message, keeping kind, identifier and cause
    pub fn context(mut self, prefix: impl fmt::Display) -> Self {
        self.message = format!("{}: {}", prefix, self.message);
        self
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Per-operation timeouts configured on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub delete: Duration,
}

impl Timeouts {
    pub const DEFAULT: Duration = Duration::from_secs(30 * 60);
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: Self::DEFAULT,
            delete: Self::DEFAULT,
        }
    }
}

/// Context handed in by the orchestrator with every operation
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    pub cancellation: CancellationToken,
    pub timeouts: Timeouts,
}

impl OperationContext {
    pub fn new(cancellation: CancellationToken) -> Self {
        Self {
            cancellation,
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }
}

/// Definition of resource types that a Provider can handle
pub trait ResourceType: Send + Sync {
    /// Resource type name (e.g., "propel_data_pool")
    fn name(&self) -> &'static str;

    /// Attribute schema used to validate desired state
    fn schema(&self) -> ResourceSchema;
}

/// Main Provider trait
///
/// All operations are async and involve side effects on the remote API.
pub trait Provider: Send + Sync {
    /// Name of this Provider (e.g., "propel")
    fn name(&self) -> &'static str;

    /// List of resource types this Provider can handle
    fn resource_types(&self) -> Vec<Box<dyn ResourceType>>;

    /// Refresh a resource from the remote API
    ///
    /// `current` is the stored local state; attributes the remote never echoes
    /// back (secrets) are carried over from it.
    /// Returns `State::not_found()` when `current` has no identifier.
    fn read<'a>(
        &'a self,
        ctx: &'a OperationContext,
        current: &'a State,
    ) -> BoxFuture<'a, ProviderResult<State>>;

    /// Create a resource and wait until it is usable
    ///
    /// Returns State with identifier set to the remote ID
    fn create<'a>(
        &'a self,
        ctx: &'a OperationContext,
        resource: &'a Resource,
    ) -> BoxFuture<'a, ProviderResult<State>>;

    /// Update a resource in place
    fn update<'a>(
        &'a self,
        ctx: &'a OperationContext,
        from: &'a State,
        to: &'a Resource,
    ) -> BoxFuture<'a, ProviderResult<State>>;

    /// Delete a resource
    fn delete<'a>(
        &'a self,
        ctx: &'a OperationContext,
        id: &'a ResourceId,
        identifier: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>>;

    /// Adopt an existing remote resource by its identifier
    fn import(&self, id: &ResourceId, identifier: &str) -> State {
        State::not_found(id.clone()).with_identifier(identifier)
    }
}

/// Provider implementation for Box<dyn Provider>
/// This enables dynamic dispatch for Providers
impl Provider for Box<dyn Provider> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        (**self).resource_types()
    }

    fn read<'a>(
        &'a self,
        ctx: &'a OperationContext,
        current: &'a State,
    ) -> BoxFuture<'a, ProviderResult<State>> {
        (**self).read(ctx, current)
    }

    fn create<'a>(
        &'a self,
        ctx: &'a OperationContext,
        resource: &'a Resource,
    ) -> BoxFuture<'a, ProviderResult<State>> {
        (**self).create(ctx, resource)
    }

    fn update<'a>(
        &'a self,
        ctx: &'a OperationContext,
        from: &'a State,
        to: &'a Resource,
    ) -> BoxFuture<'a, ProviderResult<State>> {
        (**self).update(ctx, from, to)
    }

    fn delete<'a>(
        &'a self,
        ctx: &'a OperationContext,
        id: &'a ResourceId,
        identifier: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        (**self).delete(ctx, id, identifier)
    }

    fn import(&self, id: &ResourceId, identifier: &str) -> State {
        (**self).import(id, identifier)
    }
}
