//! Operations - Orchestrator-facing CRUD entry points
//!
//! Wraps a Provider so that each call validates desired state, keeps the
//! stored local state consistent, and reports the outcome as Diagnostics.

use log::{debug, info, warn};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::differ::changed_attributes;
use crate::provider::{ErrorKind, OperationContext, Provider, ProviderError};
use crate::resource::{Resource, ResourceId, State};
use crate::schema::ResourceSchema;

/// Executes CRUD calls against a Provider on behalf of the orchestrator
pub struct Operations<P: Provider> {
    provider: P,
}

impl<P: Provider> Operations<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn schema(&self, resource_type: &str) -> Option<ResourceSchema> {
        self.provider
            .resource_types()
            .into_iter()
            .find(|t| t.name() == resource_type)
            .map(|t| t.schema())
    }

    /// Check desired state against the resource type's schema
    pub fn validate(&self, resource: &Resource) -> Diagnostics {
        let mut diags = Diagnostics::new();

        let Some(schema) = self.schema(&resource.id.resource_type) else {
            diags.push(
                ProviderError::configuration(format!(
                    "Unknown resource type: {}",
                    resource.id.resource_type
                ))
                .for_resource(resource.id.clone()),
            );
            return diags;
        };

        if let Err(errors) = schema.validate(&resource.attributes) {
            for e in errors {
                diags.push(
                    Diagnostic::error(format!("Invalid configuration for {}", resource.id.name))
                        .with_detail(e.to_string()),
                );
            }
        }
        diags
    }

    /// Create the resource; `state` receives the new identifier
    ///
    /// When the remote resource was created but never became ready, the
    /// identifier is still recorded so the next reconciliation can find it.
    pub async fn create(
        &self,
        ctx: &OperationContext,
        resource: &Resource,
        state: &mut State,
    ) -> Diagnostics {
        let diags = self.validate(resource);
        if diags.has_errors() {
            return diags;
        }

        match self.provider.create(ctx, resource).await {
            Ok(created) => {
                info!(
                    "created {}.{} ({})",
                    resource.id.resource_type,
                    resource.id.name,
                    created.identifier.as_deref().unwrap_or("")
                );
                *state = created;
                diags
            }
            Err(e) => {
                if let Some(identifier) = &e.identifier {
                    warn!(
                        "{}.{} exists remotely as {} but did not become ready",
                        resource.id.resource_type, resource.id.name, identifier
                    );
                    *state = State::not_found(resource.id.clone()).with_identifier(identifier);
                }
                e.into()
            }
        }
    }

    /// Refresh `state` from the remote API
    ///
    /// `state` is only replaced when the whole read succeeds.
    pub async fn read(&self, ctx: &OperationContext, state: &mut State) -> Diagnostics {
        match self.provider.read(ctx, state).await {
            Ok(refreshed) => {
                *state = refreshed;
                Diagnostics::new()
            }
            Err(e) => e.into(),
        }
    }

    /// Apply in-place changes to the resource
    ///
    /// Changed force-new attributes are reported as warnings; replacing the
    /// resource is left to the caller.
    pub async fn update(
        &self,
        ctx: &OperationContext,
        resource: &Resource,
        state: &mut State,
    ) -> Diagnostics {
        let mut diags = self.validate(resource);
        if diags.has_errors() {
            return diags;
        }
        if state.identifier.is_none() {
            return ProviderError::new("Cannot update a resource without an identifier")
                .for_resource(resource.id.clone())
                .into();
        }

        let changed = changed_attributes(state, resource);
        debug!(
            "updating {}.{}: {:?}",
            resource.id.resource_type, resource.id.name, changed
        );
        if let Some(schema) = self.schema(&resource.id.resource_type) {
            let force_new = schema.force_new_attributes();
            for name in changed.iter().filter(|c| force_new.contains(&c.as_str())) {
                diags.push(Diagnostic::warning(format!(
                    "[{}.{}] Changing \"{}\" requires replacement",
                    resource.id.resource_type, resource.id.name, name
                )));
            }
        }

        match self.provider.update(ctx, state, resource).await {
            Ok(updated) => {
                *state = updated;
                diags
            }
            Err(e) => e.into(),
        }
    }

    /// Delete the resource; `state` is cleared only on success
    pub async fn delete(&self, ctx: &OperationContext, state: &mut State) -> Diagnostics {
        let Some(identifier) = state.identifier.clone() else {
            state.clear();
            return Diagnostics::new();
        };

        match self.provider.delete(ctx, &state.id, &identifier).await {
            Ok(()) => {
                info!(
                    "deleted {}.{} ({})",
                    state.id.resource_type, state.id.name, identifier
                );
                state.clear();
                Diagnostics::new()
            }
            Err(e) => {
                if e.kind == ErrorKind::Cancelled {
                    warn!("delete of {} cancelled", identifier);
                }
                e.into()
            }
        }
    }

    /// Identity passthrough import
    pub fn import(&self, id: &ResourceId, identifier: &str) -> State {
        self.provider.import(id, identifier)
    }
}
