//! Data Source inputs and responses

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ColumnType, Connection, FailureResponse, IdOrUniqueName, Node};

/// Status of a Data Source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataSourceStatus {
    Created,
    Connecting,
    Connected,
    Broken,
    Pausing,
    Paused,
    Deleting,
    #[serde(other)]
    Unknown,
}

impl DataSourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSourceStatus::Created => "CREATED",
            DataSourceStatus::Connecting => "CONNECTING",
            DataSourceStatus::Connected => "CONNECTED",
            DataSourceStatus::Broken => "BROKEN",
            DataSourceStatus::Pausing => "PAUSING",
            DataSourceStatus::Paused => "PAUSED",
            DataSourceStatus::Deleting => "DELETING",
            DataSourceStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for DataSourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Inputs
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSnowflakeDataSourceInput {
    pub unique_name: Option<String>,
    pub description: Option<String>,
    pub connection_settings: SnowflakeConnectionSettingsInput,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnowflakeConnectionSettingsInput {
    pub account: String,
    pub database: String,
    pub warehouse: String,
    pub schema: String,
    pub role: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHttpDataSourceInput {
    pub unique_name: Option<String>,
    pub description: Option<String>,
    pub connection_settings: HttpConnectionSettingsInput,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpConnectionSettingsInput {
    pub basic_auth: Option<HttpBasicAuthInput>,
    pub tables: Vec<HttpDataSourceTableInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpBasicAuthInput {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpDataSourceTableInput {
    pub name: String,
    pub columns: Vec<DataSourceColumnInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateS3DataSourceInput {
    pub unique_name: Option<String>,
    pub description: Option<String>,
    pub connection_settings: S3ConnectionSettingsInput,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct S3ConnectionSettingsInput {
    pub bucket: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub tables: Vec<S3DataSourceTableInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct S3DataSourceTableInput {
    pub name: String,
    pub path: Option<String>,
    pub columns: Vec<DataSourceColumnInput>,
}

/// Column of an HTTP or S3 table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataSourceColumnInput {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyDataSourceInput {
    pub id_or_unique_name: IdOrUniqueName,
    pub unique_name: Option<String>,
    pub description: Option<String>,
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    pub id: String,
    pub unique_name: String,
    #[serde(default)]
    pub description: String,
    /// Connection type as reported by the API (e.g., "Snowflake")
    #[serde(rename = "type")]
    pub data_source_type: String,
    pub status: DataSourceStatus,
    pub account: Node,
    pub environment: Node,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub modified_at: DateTime<Utc>,
    pub modified_by: String,
    #[serde(default)]
    pub connection_settings: Option<ConnectionSettings>,
    /// First page of the introspected tables
    #[serde(default)]
    pub tables: Option<Connection<Table>>,
}

/// Connection settings, one variant per Data Source type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "__typename")]
pub enum ConnectionSettings {
    #[serde(rename = "SnowflakeConnectionSettings")]
    Snowflake(SnowflakeConnectionSettings),
    #[serde(rename = "HttpConnectionSettings")]
    Http(HttpConnectionSettings),
    #[serde(rename = "S3ConnectionSettings")]
    S3(S3ConnectionSettings),
}

/// Snowflake settings as echoed by the API (no password)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnowflakeConnectionSettings {
    pub account: String,
    pub database: String,
    pub warehouse: String,
    pub schema: String,
    pub role: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpConnectionSettings {
    #[serde(default)]
    pub basic_auth: Option<HttpBasicAuth>,
}

/// Basic auth as echoed by the API (no password)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpBasicAuth {
    pub username: String,
}

/// S3 settings as echoed by the API (no secret key)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3ConnectionSettings {
    pub bucket: String,
    pub aws_access_key_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
    pub columns: Connection<Column>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub is_nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceResponse {
    pub data_source: DataSource,
}

/// Result of `createSnowflakeDataSource`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "__typename")]
pub enum CreateSnowflakeDataSourceResult {
    #[serde(rename = "DataSourceResponse")]
    Created(DataSourceResponse),
    #[serde(rename = "FailureResponse")]
    Failed(FailureResponse),
}
