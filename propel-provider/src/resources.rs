//! Resource type definitions for the Propel provider
//!
//! Schemas here are what the orchestrator validates desired state against
//! before any remote call is made.

use propel_core::provider::ResourceType;
use propel_core::schema::{AttributeSchema, AttributeType, BlockSchema, ResourceSchema};
use propel_client::metric::{FilterOperator, MetricType};

use crate::data_source::{DataSourceKind, HTTP_SETTINGS, S3_SETTINGS, SNOWFLAKE_SETTINGS};
use crate::mapper::COLUMN_TYPES;
use crate::{data_pool, data_source, metric};

// =============================================================================
// Resource Type Definitions
// =============================================================================

macro_rules! define_resource_type {
    ($name:ident, $type_name:expr, $schema:ident) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
            fn schema(&self) -> ResourceSchema {
                $schema()
            }
        }
    };
}

define_resource_type!(DataSourceType, data_source::RESOURCE_TYPE, data_source_schema);
define_resource_type!(DataPoolType, data_pool::RESOURCE_TYPE, data_pool_schema);
define_resource_type!(MetricResourceType, metric::RESOURCE_TYPE, metric_schema);

/// Returns all resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(DataSourceType),
        Box::new(DataPoolType),
        Box::new(MetricResourceType),
    ]
}

// =============================================================================
// Shared attributes
// =============================================================================

fn string(name: &str) -> AttributeSchema {
    AttributeSchema::new(name, AttributeType::String)
}

fn computed(name: &str, description: &str) -> AttributeSchema {
    string(name).computed().with_description(description)
}

fn column_block() -> BlockSchema {
    BlockSchema::new()
        .attribute(string("name").required())
        .attribute(
            AttributeSchema::new("type", AttributeType::enumeration(&COLUMN_TYPES)).required(),
        )
        .attribute(AttributeSchema::new("nullable", AttributeType::Bool).required())
}

fn naming(schema: ResourceSchema, kind: &str) -> ResourceSchema {
    schema
        .attribute(string("unique_name").with_description(format!("The {}'s name.", kind)))
        .attribute(string("description").with_description(format!("The {}'s description.", kind)))
        .attribute(computed("account", &format!("The Account that the {} belongs to.", kind)))
        .attribute(computed(
            "environment",
            &format!("The Environment that the {} belongs to.", kind),
        ))
}

// =============================================================================
// Data Source
// =============================================================================

pub fn data_source_schema() -> ResourceSchema {
    let snowflake = BlockSchema::single()
        .attribute(string("account").required())
        .attribute(string("database").required())
        .attribute(string("warehouse").required())
        .attribute(string("schema").required())
        .attribute(string("role").required())
        .attribute(string("username").required())
        .attribute(string("password").required().sensitive());

    let basic_auth = BlockSchema::single()
        .attribute(string("username").required())
        .attribute(string("password").required().sensitive());
    let http = BlockSchema::single()
        .attribute(AttributeSchema::new("basic_auth", basic_auth.into_type()));

    let s3 = BlockSchema::single()
        .attribute(string("bucket").required())
        .attribute(string("aws_access_key_id").required())
        .attribute(string("aws_secret_access_key").required().sensitive());

    let table = BlockSchema::new()
        .attribute(string("name").required())
        .attribute(string("path").with_description("The path to the table's files in S3."))
        .attribute(
            AttributeSchema::new("column", column_block().into_type())
                .required()
                .force_new(),
        );

    naming(ResourceSchema::new(data_source::RESOURCE_TYPE), "Data Source")
        .with_description("A Data Source connected to Snowflake, HTTP or S3")
        .attribute(
            AttributeSchema::new(
                "type",
                AttributeType::enumeration_ignore_case(&DataSourceKind::NAMES),
            )
            .required()
            .force_new(),
        )
        .attribute(computed("status", "The Data Source's status."))
        .attribute(computed("created_at", "When the Data Source was created."))
        .attribute(computed("created_by", "Who created the Data Source."))
        .attribute(computed("modified_at", "When the Data Source was last modified."))
        .attribute(computed("modified_by", "Who last modified the Data Source."))
        .attribute(
            AttributeSchema::new(SNOWFLAKE_SETTINGS, snowflake.into_type())
                .conflicts_with(&[HTTP_SETTINGS, S3_SETTINGS]),
        )
        .attribute(
            AttributeSchema::new(HTTP_SETTINGS, http.into_type())
                .conflicts_with(&[SNOWFLAKE_SETTINGS, S3_SETTINGS]),
        )
        .attribute(
            AttributeSchema::new(S3_SETTINGS, s3.into_type())
                .conflicts_with(&[SNOWFLAKE_SETTINGS, HTTP_SETTINGS]),
        )
        .attribute(AttributeSchema::new("table", table.into_type()).force_new())
}

// =============================================================================
// Data Pool
// =============================================================================

pub fn data_pool_schema() -> ResourceSchema {
    naming(ResourceSchema::new(data_pool::RESOURCE_TYPE), "Data Pool")
        .with_description("A Data Pool that caches one table of a Data Source")
        .attribute(computed("status", "The Data Pool's status."))
        .attribute(string("data_source").required().force_new())
        .attribute(string("table").required().force_new())
        .attribute(
            string("timestamp")
                .required()
                .force_new()
                .with_description("The Data Pool's timestamp column."),
        )
        .attribute(
            string("tenant_id")
                .force_new()
                .with_description("The Data Pool's tenant ID column."),
        )
        .attribute(
            AttributeSchema::new("column", column_block().into_type())
                .required()
                .force_new(),
        )
}

// =============================================================================
// Metric
// =============================================================================

pub fn metric_schema() -> ResourceSchema {
    let metric_types: Vec<&str> = MetricType::ALL.iter().map(MetricType::as_str).collect();
    let operators: Vec<&str> = FilterOperator::ALL.iter().map(FilterOperator::as_str).collect();

    let filter = BlockSchema::new()
        .attribute(string("column").required())
        .attribute(
            AttributeSchema::new("operator", AttributeType::enumeration_ignore_case(&operators))
                .required(),
        )
        .attribute(string("value"));

    naming(ResourceSchema::new(metric::RESOURCE_TYPE), "Metric")
        .with_description("A Metric computed over a Data Pool")
        .attribute(string("data_pool").required().force_new())
        .attribute(
            AttributeSchema::new("type", AttributeType::enumeration_ignore_case(&metric_types))
                .required()
                .force_new(),
        )
        .attribute(AttributeSchema::new(
            "dimensions",
            AttributeType::List(Box::new(AttributeType::String)),
        ))
        .attribute(AttributeSchema::new("filter", filter.into_type()).force_new())
        .attribute(
            string("measure")
                .force_new()
                .with_description("The column measured; required for every type except COUNT."),
        )
}
