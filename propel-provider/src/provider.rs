//! Propel Provider implementation
//!
//! Routes orchestrator calls to the adapter registered for each resource
//! type.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info};
use propel_client::{ClientResult, PropelApi};
use propel_core::diagnostics::{Diagnostic, Diagnostics};
use propel_core::provider::{OperationContext, ProviderError, ProviderResult};
use propel_core::resource::{Resource, ResourceId, State, Value};

use crate::adapter::ResourceAdapter;
use crate::config::{PollSettings, ProviderConfig};
use crate::data_pool::DataPoolAdapter;
use crate::data_source::DataSourceAdapter;
use crate::metric::MetricAdapter;

fn single(diagnostic: Diagnostic) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    diagnostics.push(diagnostic);
    diagnostics
}

/// Propel Provider
pub struct PropelProvider {
    adapters: Vec<Box<dyn ResourceAdapter>>,
}

impl PropelProvider {
    pub fn new(api: Arc<dyn PropelApi>, poll: PollSettings) -> Self {
        Self {
            adapters: vec![
                Box::new(DataSourceAdapter::new(api.clone(), poll.clone())),
                Box::new(DataPoolAdapter::new(api.clone(), poll)),
                Box::new(MetricAdapter::new(api)),
            ],
        }
    }

    /// Build the provider from the provider block
    ///
    /// `connect` turns validated credentials into an API client.
    pub fn configure<F>(attributes: &HashMap<String, Value>, connect: F) -> Result<Self, Diagnostics>
    where
        F: FnOnce(&ProviderConfig) -> ClientResult<Arc<dyn PropelApi>>,
    {
        let config = ProviderConfig::from_attributes(attributes)
            .map_err(|e| single(e.into()))?;
        debug!("configuring provider with {:?}", config);

        let api = connect(&config).map_err(|e| {
            single(Diagnostic::error("Unable to create Propel client").with_detail(e.to_string()))
        })?;
        info!("Propel client ready for {}", config.client_id);
        Ok(Self::new(api, config.poll))
    }

    fn adapter(&self, resource_type: &str) -> ProviderResult<&dyn ResourceAdapter> {
        self.adapters
            .iter()
            .find(|a| a.resource_type() == resource_type)
            .map(|a| a.as_ref())
            .ok_or_else(|| {
                ProviderError::configuration(format!("Unknown resource type: {}", resource_type))
            })
    }

    // =========================================================================
    // CRUD
    // =========================================================================

    pub async fn read_resource(&self, current: &State) -> ProviderResult<State> {
        let Some(identifier) = current.identifier.as_deref() else {
            return Ok(State::not_found(current.id.clone()));
        };
        self.adapter(&current.id.resource_type)?
            .read(&current.id, identifier, &current.attributes)
            .await
            .map_err(|e| e.for_resource(current.id.clone()))
    }

    pub async fn create_resource(
        &self,
        ctx: &OperationContext,
        resource: &Resource,
    ) -> ProviderResult<State> {
        self.adapter(&resource.id.resource_type)?
            .create(ctx, resource)
            .await
            .map_err(|e| e.for_resource(resource.id.clone()))
    }

    pub async fn update_resource(
        &self,
        ctx: &OperationContext,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        self.adapter(&to.id.resource_type)?
            .update(ctx, from, to)
            .await
            .map_err(|e| e.for_resource(to.id.clone()))
    }

    pub async fn delete_resource(
        &self,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<()> {
        self.adapter(&id.resource_type)?
            .delete(ctx, id, identifier)
            .await
            .map_err(|e| e.for_resource(id.clone()))
    }
}
