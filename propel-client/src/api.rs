//! The Propel API as seen by the provider
//!
//! One method per GraphQL operation. Implementations own transport and
//! authentication; callers only see typed inputs and outputs.

use async_trait::async_trait;

use crate::data_pool::{CreateDataPoolInput, DataPool, DataPoolResponse, ModifyDataPoolInput};
use crate::data_source::{
    CreateHttpDataSourceInput, CreateS3DataSourceInput, CreateSnowflakeDataSourceInput,
    CreateSnowflakeDataSourceResult, DataSource, DataSourceResponse, ModifyDataSourceInput,
};
use crate::error::ClientResult;
use crate::metric::{CreateMetricInput, Metric, MetricResponse, ModifyMetricInput};

#[async_trait]
pub trait PropelApi: Send + Sync {
    // Data Sources

    async fn create_snowflake_data_source(
        &self,
        input: &CreateSnowflakeDataSourceInput,
    ) -> ClientResult<CreateSnowflakeDataSourceResult>;

    async fn create_http_data_source(
        &self,
        input: &CreateHttpDataSourceInput,
    ) -> ClientResult<DataSourceResponse>;

    async fn create_s3_data_source(
        &self,
        input: &CreateS3DataSourceInput,
    ) -> ClientResult<DataSourceResponse>;

    async fn data_source(&self, id: &str) -> ClientResult<DataSource>;

    async fn modify_data_source(
        &self,
        input: &ModifyDataSourceInput,
    ) -> ClientResult<DataSourceResponse>;

    /// Returns the ID of the deleted Data Source
    async fn delete_data_source(&self, id: &str) -> ClientResult<String>;

    // Data Pools

    async fn create_data_pool(&self, input: &CreateDataPoolInput)
    -> ClientResult<DataPoolResponse>;

    async fn data_pool(&self, id: &str) -> ClientResult<DataPool>;

    async fn modify_data_pool(&self, input: &ModifyDataPoolInput)
    -> ClientResult<DataPoolResponse>;

    /// Returns the ID of the deleted Data Pool
    async fn delete_data_pool(&self, id: &str) -> ClientResult<String>;

    // Metrics

    async fn create_metric(&self, input: &CreateMetricInput) -> ClientResult<MetricResponse>;

    async fn metric(&self, id: &str) -> ClientResult<Metric>;

    async fn modify_metric(&self, input: &ModifyMetricInput) -> ClientResult<MetricResponse>;

    /// Returns the ID of the deleted Metric
    async fn delete_metric(&self, id: &str) -> ClientResult<String>;
}
