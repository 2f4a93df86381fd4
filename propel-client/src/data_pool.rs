//! Data Pool inputs and responses

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ColumnType, Connection, IdOrUniqueName, Node};

/// Status of a Data Pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataPoolStatus {
    Created,
    Pending,
    Live,
    Failed,
    Deleting,
    #[serde(other)]
    Unknown,
}

impl DataPoolStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataPoolStatus::Created => "CREATED",
            DataPoolStatus::Pending => "PENDING",
            DataPoolStatus::Live => "LIVE",
            DataPoolStatus::Failed => "FAILED",
            DataPoolStatus::Deleting => "DELETING",
            DataPoolStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for DataPoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDataPoolInput {
    pub unique_name: Option<String>,
    pub description: Option<String>,
    pub data_source: String,
    pub table: String,
    pub timestamp: TimestampInput,
    pub tenant: Option<TenantInput>,
    pub columns: Vec<DataPoolColumnInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimestampInput {
    pub column_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantInput {
    pub column_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPoolColumnInput {
    pub column_name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub is_nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyDataPoolInput {
    pub id_or_unique_name: IdOrUniqueName,
    pub unique_name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPool {
    pub id: String,
    pub unique_name: String,
    #[serde(default)]
    pub description: String,
    pub status: DataPoolStatus,
    pub account: Node,
    pub environment: Node,
    pub data_source: Node,
    pub table: String,
    pub timestamp: DataPoolColumnRef,
    #[serde(default)]
    pub tenant: Option<DataPoolColumnRef>,
    /// First page of the pool's columns
    #[serde(default)]
    pub columns: Option<Connection<DataPoolColumn>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPoolColumnRef {
    pub column_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPoolColumn {
    pub column_name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub is_nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPoolResponse {
    pub data_pool: DataPool,
}
