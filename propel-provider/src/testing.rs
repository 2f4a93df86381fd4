//! Scripted `PropelApi` for adapter tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use propel_client::data_pool::{CreateDataPoolInput, DataPool, DataPoolResponse, ModifyDataPoolInput};
use propel_client::data_source::{
    CreateHttpDataSourceInput, CreateS3DataSourceInput, CreateSnowflakeDataSourceInput,
    CreateSnowflakeDataSourceResult, DataSource, DataSourceResponse, ModifyDataSourceInput,
};
use propel_client::metric::{CreateMetricInput, Metric, MetricResponse, ModifyMetricInput};
use propel_client::{ClientError, ClientResult, PropelApi};
use serde_json::{Value as Json, json};

pub type Queue<T> = Mutex<VecDeque<ClientResult<T>>>;

/// Responses are queued per operation and handed out in order
///
/// An operation with an empty queue fails with a transport error.
#[derive(Default)]
pub struct MockApi {
    /// `(operation, argument)` of every call, in order
    pub calls: Mutex<Vec<(String, Json)>>,

    pub snowflake_creates: Queue<CreateSnowflakeDataSourceResult>,
    pub data_source_creates: Queue<DataSourceResponse>,
    pub data_source_reads: Queue<DataSource>,
    pub data_source_modifies: Queue<DataSourceResponse>,
    pub data_source_deletes: Queue<String>,

    pub data_pool_creates: Queue<DataPoolResponse>,
    pub data_pool_reads: Queue<DataPool>,
    pub data_pool_modifies: Queue<DataPoolResponse>,
    pub data_pool_deletes: Queue<String>,

    pub metric_creates: Queue<MetricResponse>,
    pub metric_reads: Queue<Metric>,
    pub metric_modifies: Queue<MetricResponse>,
    pub metric_deletes: Queue<String>,
}

pub fn script<T>(queue: &Queue<T>, responses: impl IntoIterator<Item = ClientResult<T>>) {
    queue.lock().unwrap().extend(responses);
}

impl MockApi {
    fn respond<T>(&self, queue: &Queue<T>, operation: &str, argument: Json) -> ClientResult<T> {
        self.calls
            .lock()
            .unwrap()
            .push((operation.to_string(), argument));
        queue.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(ClientError::Transport(format!(
                "no scripted response for {}",
                operation
            )))
        })
    }

    pub fn operations(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(op, _)| op.clone())
            .collect()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.operations().iter().filter(|op| *op == operation).count()
    }

    /// Argument of the first call to `operation`
    pub fn argument(&self, operation: &str) -> Option<Json> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|(op, _)| op == operation)
            .map(|(_, arg)| arg.clone())
    }
}

fn input(value: impl serde::Serialize) -> Json {
    serde_json::to_value(value).unwrap()
}

#[async_trait]
impl PropelApi for MockApi {
    async fn create_snowflake_data_source(
        &self,
        i: &CreateSnowflakeDataSourceInput,
    ) -> ClientResult<CreateSnowflakeDataSourceResult> {
        self.respond(&self.snowflake_creates, "create_snowflake_data_source", input(i))
    }

    async fn create_http_data_source(
        &self,
        i: &CreateHttpDataSourceInput,
    ) -> ClientResult<DataSourceResponse> {
        self.respond(&self.data_source_creates, "create_http_data_source", input(i))
    }

    async fn create_s3_data_source(
        &self,
        i: &CreateS3DataSourceInput,
    ) -> ClientResult<DataSourceResponse> {
        self.respond(&self.data_source_creates, "create_s3_data_source", input(i))
    }

    async fn data_source(&self, id: &str) -> ClientResult<DataSource> {
        self.respond(&self.data_source_reads, "data_source", json!(id))
    }

    async fn modify_data_source(
        &self,
        i: &ModifyDataSourceInput,
    ) -> ClientResult<DataSourceResponse> {
        self.respond(&self.data_source_modifies, "modify_data_source", input(i))
    }

    async fn delete_data_source(&self, id: &str) -> ClientResult<String> {
        self.respond(&self.data_source_deletes, "delete_data_source", json!(id))
    }

    async fn create_data_pool(&self, i: &CreateDataPoolInput) -> ClientResult<DataPoolResponse> {
        self.respond(&self.data_pool_creates, "create_data_pool", input(i))
    }

    async fn data_pool(&self, id: &str) -> ClientResult<DataPool> {
        self.respond(&self.data_pool_reads, "data_pool", json!(id))
    }

    async fn modify_data_pool(&self, i: &ModifyDataPoolInput) -> ClientResult<DataPoolResponse> {
        self.respond(&self.data_pool_modifies, "modify_data_pool", input(i))
    }

    async fn delete_data_pool(&self, id: &str) -> ClientResult<String> {
        self.respond(&self.data_pool_deletes, "delete_data_pool", json!(id))
    }

    async fn create_metric(&self, i: &CreateMetricInput) -> ClientResult<MetricResponse> {
        self.respond(&self.metric_creates, "create_metric", input(i))
    }

    async fn metric(&self, id: &str) -> ClientResult<Metric> {
        self.respond(&self.metric_reads, "metric", json!(id))
    }

    async fn modify_metric(&self, i: &ModifyMetricInput) -> ClientResult<MetricResponse> {
        self.respond(&self.metric_modifies, "modify_metric", input(i))
    }

    async fn delete_metric(&self, id: &str) -> ClientResult<String> {
        self.respond(&self.metric_deletes, "delete_metric", json!(id))
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn data_pool(id: &str, status: &str) -> DataPool {
    serde_json::from_value(json!({
        "id": id,
        "uniqueName": "events",
        "description": "Event pool",
        "status": status,
        "account": {"id": "acc_1"},
        "environment": {"id": "env_1"},
        "dataSource": {"id": "ds_1"},
        "table": "EVENTS",
        "timestamp": {"columnName": "created_at"},
        "columns": {"nodes": [
            {"columnName": "id", "type": "INT64", "isNullable": false},
            {"columnName": "created_at", "type": "TIMESTAMP", "isNullable": false}
        ]}
    }))
    .unwrap()
}

pub fn data_source(id: &str, status: &str, settings: Json) -> DataSource {
    serde_json::from_value(data_source_json(id, status, settings)).unwrap()
}

pub fn data_source_json(id: &str, status: &str, settings: Json) -> Json {
    let kind = match settings["__typename"].as_str() {
        Some("HttpConnectionSettings") => "Http",
        Some("S3ConnectionSettings") => "S3",
        _ => "Snowflake",
    };
    json!({
        "id": id,
        "uniqueName": "warehouse",
        "description": "",
        "type": kind,
        "status": status,
        "account": {"id": "acc_1"},
        "environment": {"id": "env_1"},
        "createdAt": "2023-03-01T10:00:00Z",
        "createdBy": "terraform",
        "modifiedAt": "2023-03-01T10:05:00Z",
        "modifiedBy": "terraform",
        "connectionSettings": settings,
        "tables": {"nodes": [
            {"name": "events", "columns": {"nodes": [
                {"name": "id", "type": "INT64", "isNullable": false}
            ]}}
        ]}
    })
}

pub fn snowflake_settings() -> Json {
    json!({
        "__typename": "SnowflakeConnectionSettings",
        "account": "zn12345.us-east-2.aws",
        "database": "ANALYTICS",
        "warehouse": "PROPELLING",
        "schema": "PUBLIC",
        "role": "PROPELLER",
        "username": "PROPEL"
    })
}

pub fn data_source_response(id: &str, status: &str, settings: Json) -> DataSourceResponse {
    DataSourceResponse {
        data_source: data_source(id, status, settings),
    }
}

pub fn metric(id: &str, metric_type: &str, measure: Option<&str>) -> Metric {
    serde_json::from_value(json!({
        "id": id,
        "uniqueName": "revenue",
        "description": "",
        "type": metric_type,
        "account": {"id": "acc_1"},
        "environment": {"id": "env_1"},
        "dataPool": {"id": "dp_1"},
        "dimensions": ["country"],
        "filters": [{"column": "country", "operator": "EQUALS", "value": "ES"}],
        "measure": measure
    }))
    .unwrap()
}
