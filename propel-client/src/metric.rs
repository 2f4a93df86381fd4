//! Metric inputs and responses

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{IdOrUniqueName, Node};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricType {
    Count,
    Sum,
    CountDistinct,
    Average,
    Min,
    Max,
}

impl MetricType {
    pub const ALL: [MetricType; 6] = [
        MetricType::Count,
        MetricType::Sum,
        MetricType::CountDistinct,
        MetricType::Average,
        MetricType::Min,
        MetricType::Max,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Count => "COUNT",
            MetricType::Sum => "SUM",
            MetricType::CountDistinct => "COUNT_DISTINCT",
            MetricType::Average => "AVERAGE",
            MetricType::Min => "MIN",
            MetricType::Max => "MAX",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEqualTo,
    LessThan,
    LessThanOrEqualTo,
    IsNull,
    IsNotNull,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 8] = [
        FilterOperator::Equals,
        FilterOperator::NotEquals,
        FilterOperator::GreaterThan,
        FilterOperator::GreaterThanOrEqualTo,
        FilterOperator::LessThan,
        FilterOperator::LessThanOrEqualTo,
        FilterOperator::IsNull,
        FilterOperator::IsNotNull,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Equals => "EQUALS",
            FilterOperator::NotEquals => "NOT_EQUALS",
            FilterOperator::GreaterThan => "GREATER_THAN",
            FilterOperator::GreaterThanOrEqualTo => "GREATER_THAN_OR_EQUAL_TO",
            FilterOperator::LessThan => "LESS_THAN",
            FilterOperator::LessThanOrEqualTo => "LESS_THAN_OR_EQUAL_TO",
            FilterOperator::IsNull => "IS_NULL",
            FilterOperator::IsNotNull => "IS_NOT_NULL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: Option<String>,
}

/// Type-specific settings of a new Metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricSettingsInput {
    Count,
    Sum { measure: String },
    CountDistinct { dimension: String },
    Average { measure: String },
    Min { measure: String },
    Max { measure: String },
}

impl MetricSettingsInput {
    pub fn metric_type(&self) -> MetricType {
        match self {
            MetricSettingsInput::Count => MetricType::Count,
            MetricSettingsInput::Sum { .. } => MetricType::Sum,
            MetricSettingsInput::CountDistinct { .. } => MetricType::CountDistinct,
            MetricSettingsInput::Average { .. } => MetricType::Average,
            MetricSettingsInput::Min { .. } => MetricType::Min,
            MetricSettingsInput::Max { .. } => MetricType::Max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMetricInput {
    pub unique_name: Option<String>,
    pub description: Option<String>,
    pub data_pool: String,
    pub dimensions: Vec<String>,
    pub filters: Vec<Filter>,
    pub settings: MetricSettingsInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyMetricInput {
    pub id_or_unique_name: IdOrUniqueName,
    pub unique_name: Option<String>,
    pub description: Option<String>,
    pub dimensions: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub id: String,
    pub unique_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    pub account: Node,
    pub environment: Node,
    pub data_pool: Node,
    #[serde(default)]
    pub dimensions: Vec<String>,
    #[serde(default)]
    pub filters: Vec<Filter>,
    /// Measured column, or the counted dimension of a COUNT_DISTINCT metric
    #[serde(default)]
    pub measure: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricResponse {
    pub metric: Metric,
}
