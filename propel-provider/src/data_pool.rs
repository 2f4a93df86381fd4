//! propel_data_pool
//!
//! Data Pools provision asynchronously: create waits for `LIVE`, delete
//! waits until the pool can no longer be fetched.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};
use propel_client::PropelApi;
use propel_client::data_pool::{
    CreateDataPoolInput, DataPool, ModifyDataPoolInput, TenantInput, TimestampInput,
};
use propel_client::types::IdOrUniqueName;
use propel_core::differ::{has_changes, has_cleared};
use propel_core::provider::{OperationContext, ProviderError, ProviderResult};
use propel_core::resource::{AttributesExt, Resource, ResourceId, State, Value};
use propel_core::wait::StatusSets;

use crate::adapter::{ResourceAdapter, identifier_of, read_back};
use crate::config::PollSettings;
use crate::mapper::{
    ColumnSpec, data_pool_columns_to_value, decode_columns, description_of, optional_str,
    required_str,
};

pub const RESOURCE_TYPE: &str = "propel_data_pool";

const PENDING: &[&str] = &["CREATED", "PENDING"];
const TARGET: &[&str] = &["LIVE"];

pub struct DataPoolAdapter {
    api: Arc<dyn PropelApi>,
    poll: PollSettings,
}

impl DataPoolAdapter {
    pub fn new(api: Arc<dyn PropelApi>, poll: PollSettings) -> Self {
        Self { api, poll }
    }

    async fn status(&self, id: &str) -> ProviderResult<String> {
        let pool = self
            .api
            .data_pool(id)
            .await
            .map_err(|e| ProviderError::api("error trying to read Data Pool status", e))?;
        Ok(pool.status.to_string())
    }

    /// `None` once the API reports the pool as not found
    async fn presence(&self, id: &str) -> ProviderResult<Option<String>> {
        match self.api.data_pool(id).await {
            Ok(pool) => Ok(Some(pool.status.to_string())),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(ProviderError::api("error trying to fetch Data Pool", e)),
        }
    }
}

fn create_input(attributes: &HashMap<String, Value>) -> ProviderResult<CreateDataPoolInput> {
    let columns = decode_columns(attributes.get_list("column"))?
        .into_iter()
        .map(ColumnSpec::into_data_pool_input)
        .collect();

    Ok(CreateDataPoolInput {
        unique_name: optional_str(attributes, "unique_name"),
        description: optional_str(attributes, "description"),
        data_source: required_str(attributes, "data_source")?,
        table: required_str(attributes, "table")?,
        timestamp: TimestampInput {
            column_name: required_str(attributes, "timestamp")?,
        },
        tenant: optional_str(attributes, "tenant_id").map(|column_name| TenantInput { column_name }),
        columns,
    })
}

fn to_attributes(pool: &DataPool) -> HashMap<String, Value> {
    let mut attributes = HashMap::new();
    attributes.insert("unique_name".to_string(), Value::from(pool.unique_name.as_str()));
    attributes.insert("description".to_string(), Value::from(pool.description.as_str()));
    attributes.insert("status".to_string(), Value::from(pool.status.as_str()));
    attributes.insert("environment".to_string(), Value::from(pool.environment.id.as_str()));
    attributes.insert("account".to_string(), Value::from(pool.account.id.as_str()));
    attributes.insert("data_source".to_string(), Value::from(pool.data_source.id.as_str()));
    attributes.insert("table".to_string(), Value::from(pool.table.as_str()));
    attributes.insert(
        "timestamp".to_string(),
        Value::from(pool.timestamp.column_name.as_str()),
    );
    if let Some(tenant) = &pool.tenant {
        attributes.insert("tenant_id".to_string(), Value::from(tenant.column_name.as_str()));
    }
    if let Some(columns) = &pool.columns {
        attributes.insert("column".to_string(), data_pool_columns_to_value(columns));
    }
    attributes
}

#[async_trait]
impl ResourceAdapter for DataPoolAdapter {
    fn resource_type(&self) -> &'static str {
        RESOURCE_TYPE
    }

    async fn create(&self, ctx: &OperationContext, resource: &Resource) -> ProviderResult<State> {
        let input = create_input(&resource.attributes)?;

        info!("creating Data Pool {}", resource.id.name);
        let response = self
            .api
            .create_data_pool(&input)
            .await
            .map_err(|e| ProviderError::api("Failed to create Data Pool", e))?;
        let id = response.data_pool.id;
        info!("Data Pool {} created with status {}", id, response.data_pool.status);

        let sets = StatusSets::new(PENDING, TARGET).with_stability(self.poll.stability);
        let pool_id = id.as_str();
        self.poll
            .waiter(ctx.timeouts.create)
            .until_status(&sets, &ctx.cancellation, move || self.status(pool_id))
            .await
            .map_err(|e| {
                ProviderError::from(e)
                    .context("error waiting for Data Pool to be LIVE")
                    .with_identifier(pool_id)
            })?;

        self.read(&resource.id, &id, &resource.attributes)
            .await
            .and_then(|state| read_back(state, "Data Pool", pool_id))
            .map_err(|e| e.with_identifier(pool_id))
    }

    async fn read(
        &self,
        id: &ResourceId,
        identifier: &str,
        _prior: &HashMap<String, Value>,
    ) -> ProviderResult<State> {
        let pool = match self.api.data_pool(identifier).await {
            Ok(pool) => pool,
            Err(e) if e.is_not_found() => {
                warn!("Data Pool {} no longer exists", identifier);
                return Ok(State::not_found(id.clone()));
            }
            Err(e) => return Err(ProviderError::api("Failed to read Data Pool", e)),
        };

        Ok(State::existing(id.clone(), to_attributes(&pool)).with_identifier(pool.id))
    }

    async fn update(
        &self,
        _ctx: &OperationContext,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let identifier = identifier_of(from)?;

        if has_changes(from, to, &["unique_name", "description"])
            || has_cleared(from, to, &["description"])
        {
            let input = ModifyDataPoolInput {
                id_or_unique_name: IdOrUniqueName::id(identifier),
                unique_name: optional_str(&to.attributes, "unique_name"),
                description: Some(description_of(to)),
            };
            info!("modifying Data Pool {}", identifier);
            self.api
                .modify_data_pool(&input)
                .await
                .map_err(|e| ProviderError::api("Failed to update Data Pool", e))?;
        }

        self.read(&to.id, identifier, &to.attributes).await
    }

    async fn delete(
        &self,
        ctx: &OperationContext,
        _id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<()> {
        info!("deleting Data Pool {}", identifier);
        self.api
            .delete_data_pool(identifier)
            .await
            .map_err(|e| ProviderError::api("Failed to delete Data Pool", e))?;

        self.poll
            .waiter(ctx.timeouts.delete)
            .until_absent(&ctx.cancellation, move || self.presence(identifier))
            .await
            .map_err(|e| ProviderError::from(e).context("error waiting for Data Pool to be deleted"))
    }
}
