//! propel_metric
//!
//! Metrics are ready as soon as the create mutation returns.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};
use propel_client::PropelApi;
use propel_client::metric::{
    CreateMetricInput, Filter, FilterOperator, Metric, MetricSettingsInput, MetricType,
    ModifyMetricInput,
};
use propel_client::types::IdOrUniqueName;
use propel_core::differ::{has_changes, has_cleared};
use propel_core::provider::{OperationContext, ProviderError, ProviderResult};
use propel_core::resource::{AttributesExt, Resource, ResourceId, State, Value};

use crate::adapter::{ResourceAdapter, identifier_of, read_back};
use crate::mapper::{description_of, optional_str, required_str};

pub const RESOURCE_TYPE: &str = "propel_metric";

fn parse_metric_type(s: &str) -> Option<MetricType> {
    MetricType::ALL
        .into_iter()
        .find(|t| t.as_str().eq_ignore_ascii_case(s))
}

fn parse_operator(s: &str) -> Option<FilterOperator> {
    FilterOperator::ALL
        .into_iter()
        .find(|op| op.as_str().eq_ignore_ascii_case(s))
}

fn string_list(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

/// Type-specific settings from the `type` and `measure` attributes
pub fn settings_from_attributes(
    attributes: &HashMap<String, Value>,
) -> ProviderResult<MetricSettingsInput> {
    let raw = required_str(attributes, "type")?;
    let metric_type = parse_metric_type(&raw).ok_or_else(|| {
        ProviderError::configuration(format!("Unsupported Metric type \"{}\"", raw))
    })?;
    let measure = optional_str(attributes, "measure");

    let measure = match (metric_type, measure) {
        (MetricType::Count, None) => return Ok(MetricSettingsInput::Count),
        (MetricType::Count, Some(_)) => {
            return Err(ProviderError::configuration(
                "\"measure\" cannot be used with COUNT Metrics",
            ));
        }
        (_, Some(measure)) => measure,
        (other, None) => {
            return Err(ProviderError::configuration(format!(
                "\"measure\" is required for {} Metrics",
                other
            )));
        }
    };

    Ok(match metric_type {
        MetricType::Count => MetricSettingsInput::Count,
        MetricType::Sum => MetricSettingsInput::Sum { measure },
        MetricType::CountDistinct => MetricSettingsInput::CountDistinct { dimension: measure },
        MetricType::Average => MetricSettingsInput::Average { measure },
        MetricType::Min => MetricSettingsInput::Min { measure },
        MetricType::Max => MetricSettingsInput::Max { measure },
    })
}

fn filters_from_attributes(attributes: &HashMap<String, Value>) -> ProviderResult<Vec<Filter>> {
    attributes
        .get_list("filter")
        .iter()
        .map(|v| {
            let record = v
                .as_map()
                .ok_or_else(|| ProviderError::configuration("Each filter must be a block"))?;
            let raw = required_str(record, "operator")?;
            let operator = parse_operator(&raw).ok_or_else(|| {
                ProviderError::configuration(format!("Unsupported filter operator \"{}\"", raw))
            })?;
            Ok(Filter {
                column: required_str(record, "column")?,
                operator,
                value: optional_str(record, "value"),
            })
        })
        .collect()
}

fn create_input(attributes: &HashMap<String, Value>) -> ProviderResult<CreateMetricInput> {
    Ok(CreateMetricInput {
        unique_name: optional_str(attributes, "unique_name"),
        description: optional_str(attributes, "description"),
        data_pool: required_str(attributes, "data_pool")?,
        dimensions: string_list(attributes.get_list("dimensions")),
        filters: filters_from_attributes(attributes)?,
        settings: settings_from_attributes(attributes)?,
    })
}

fn to_attributes(metric: &Metric) -> HashMap<String, Value> {
    let mut attributes = HashMap::new();
    attributes.insert("unique_name".to_string(), Value::from(metric.unique_name.as_str()));
    attributes.insert("description".to_string(), Value::from(metric.description.as_str()));
    attributes.insert("type".to_string(), Value::from(metric.metric_type.as_str()));
    attributes.insert("account".to_string(), Value::from(metric.account.id.as_str()));
    attributes.insert("environment".to_string(), Value::from(metric.environment.id.as_str()));
    attributes.insert("data_pool".to_string(), Value::from(metric.data_pool.id.as_str()));
    attributes.insert(
        "dimensions".to_string(),
        Value::List(metric.dimensions.iter().map(|d| Value::from(d.as_str())).collect()),
    );
    if let Some(measure) = &metric.measure {
        attributes.insert("measure".to_string(), Value::from(measure.as_str()));
    }

    let filters = metric
        .filters
        .iter()
        .map(|f| {
            let mut record = HashMap::new();
            record.insert("column".to_string(), Value::from(f.column.as_str()));
            record.insert("operator".to_string(), Value::from(f.operator.as_str()));
            if let Some(value) = &f.value {
                record.insert("value".to_string(), Value::from(value.as_str()));
            }
            Value::Map(record)
        })
        .collect();
    attributes.insert("filter".to_string(), Value::List(filters));
    attributes
}

pub struct MetricAdapter {
    api: Arc<dyn PropelApi>,
}

impl MetricAdapter {
    pub fn new(api: Arc<dyn PropelApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ResourceAdapter for MetricAdapter {
    fn resource_type(&self) -> &'static str {
        RESOURCE_TYPE
    }

    async fn create(&self, _ctx: &OperationContext, resource: &Resource) -> ProviderResult<State> {
        let input = create_input(&resource.attributes)?;

        info!(
            "creating {} Metric {}",
            input.settings.metric_type(),
            resource.id.name
        );
        let response = self
            .api
            .create_metric(&input)
            .await
            .map_err(|e| ProviderError::api("Failed to create Metric", e))?;
        let id = response.metric.id;

        self.read(&resource.id, &id, &resource.attributes)
            .await
            .and_then(|state| read_back(state, "Metric", &id))
            .map_err(|e| e.with_identifier(id.as_str()))
    }

    async fn read(
        &self,
        id: &ResourceId,
        identifier: &str,
        _prior: &HashMap<String, Value>,
    ) -> ProviderResult<State> {
        let metric = match self.api.metric(identifier).await {
            Ok(metric) => metric,
            Err(e) if e.is_not_found() => {
                warn!("Metric {} no longer exists", identifier);
                return Ok(State::not_found(id.clone()));
            }
            Err(e) => return Err(ProviderError::api("Failed to read Metric", e)),
        };

        Ok(State::existing(id.clone(), to_attributes(&metric)).with_identifier(metric.id))
    }

    async fn update(
        &self,
        _ctx: &OperationContext,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let identifier = identifier_of(from)?;

        if has_changes(from, to, &["unique_name", "description", "dimensions"])
            || has_cleared(from, to, &["description", "dimensions"])
        {
            let input = ModifyMetricInput {
                id_or_unique_name: IdOrUniqueName::id(identifier),
                unique_name: optional_str(&to.attributes, "unique_name"),
                description: Some(description_of(to)),
                dimensions: Some(string_list(to.attributes.get_list("dimensions"))),
            };
            info!("modifying Metric {}", identifier);
            self.api
                .modify_metric(&input)
                .await
                .map_err(|e| ProviderError::api("Failed to update Metric", e))?;
        }

        self.read(&to.id, identifier, &to.attributes).await
    }

    async fn delete(
        &self,
        _ctx: &OperationContext,
        _id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<()> {
        info!("deleting Metric {}", identifier);
        self.api
            .delete_metric(identifier)
            .await
            .map_err(|e| ProviderError::api("Failed to delete Metric", e))?;
        Ok(())
    }
}
