//! Conversion between configuration records and Propel API types
//!
//! Desired state arrives as loosely-typed nested maps and lists. Everything
//! in here turns those into the client's typed inputs, and turns typed
//! responses back into records for local state.

use std::collections::HashMap;

use log::warn;
use propel_client::ColumnType;
use propel_client::data_pool::{DataPoolColumn, DataPoolColumnInput};
use propel_client::data_source::{
    DataSourceColumnInput, HttpDataSourceTableInput, S3DataSourceTableInput, Table,
};
use propel_client::types::Connection;
use propel_core::provider::{ProviderError, ProviderResult};
use propel_core::resource::{AttributesExt, Resource, Value};

/// Column type literals accepted in configuration
pub const COLUMN_TYPES: [&str; 10] = [
    "BOOLEAN",
    "DATE",
    "DOUBLE",
    "FLOAT",
    "INT8",
    "INT16",
    "INT32",
    "INT64",
    "STRING",
    "TIMESTAMP",
];

/// Map a configured column type literal to the remote enum
///
/// Unrecognised literals yield `ColumnType::Unspecified`; schema validation
/// normally rejects them first.
pub fn to_remote_column_type(literal: &str) -> ColumnType {
    match literal {
        "BOOLEAN" => ColumnType::Boolean,
        "DATE" => ColumnType::Date,
        "DOUBLE" => ColumnType::Double,
        "FLOAT" => ColumnType::Float,
        "INT8" => ColumnType::Int8,
        "INT16" => ColumnType::Int16,
        "INT32" => ColumnType::Int32,
        "INT64" => ColumnType::Int64,
        "STRING" => ColumnType::String,
        "TIMESTAMP" => ColumnType::Timestamp,
        other => {
            warn!("unrecognised column type '{}', sending it as unspecified", other);
            ColumnType::Unspecified
        }
    }
}

/// String attribute that must be present and non-empty
pub fn required_str(attributes: &HashMap<String, Value>, key: &str) -> ProviderResult<String> {
    match attributes.get_str(key) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(ProviderError::configuration(format!(
            "Required attribute '{}' is missing",
            key
        ))),
    }
}

/// String attribute, with the empty string treated as unset
pub fn optional_str(attributes: &HashMap<String, Value>, key: &str) -> Option<String> {
    attributes
        .get_str(key)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Description to send on modify; an unset description clears the remote one
pub fn description_of(resource: &Resource) -> String {
    resource
        .attributes
        .get_str("description")
        .unwrap_or_default()
        .to_string()
}

fn record<'a>(value: &'a Value, what: &str) -> ProviderResult<&'a HashMap<String, Value>> {
    value
        .as_map()
        .ok_or_else(|| ProviderError::configuration(format!("Each {} must be a block", what)))
}

/// One `column { name, type, nullable }` record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
}

impl ColumnSpec {
    pub fn from_record(record: &HashMap<String, Value>) -> ProviderResult<Self> {
        Ok(Self {
            name: required_str(record, "name")?,
            column_type: to_remote_column_type(&required_str(record, "type")?),
            nullable: record.get_bool("nullable").unwrap_or(false),
        })
    }

    pub fn to_record(name: &str, column_type: ColumnType, nullable: bool) -> Value {
        let mut map = HashMap::new();
        map.insert("name".to_string(), Value::from(name));
        map.insert("type".to_string(), Value::from(column_type.as_str()));
        map.insert("nullable".to_string(), Value::Bool(nullable));
        Value::Map(map)
    }

    pub fn into_data_source_input(self) -> DataSourceColumnInput {
        DataSourceColumnInput {
            name: self.name,
            column_type: self.column_type,
            nullable: self.nullable,
        }
    }

    pub fn into_data_pool_input(self) -> DataPoolColumnInput {
        DataPoolColumnInput {
            column_name: self.name,
            column_type: self.column_type,
            is_nullable: self.nullable,
        }
    }
}

pub fn decode_columns(values: &[Value]) -> ProviderResult<Vec<ColumnSpec>> {
    values
        .iter()
        .map(|v| record(v, "column").and_then(ColumnSpec::from_record))
        .collect()
}

/// One `table { name, path, column }` record of an HTTP or S3 Data Source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub name: String,
    pub path: Option<String>,
    pub columns: Vec<ColumnSpec>,
}

impl TableSpec {
    pub fn from_record(record: &HashMap<String, Value>) -> ProviderResult<Self> {
        Ok(Self {
            name: required_str(record, "name")?,
            path: optional_str(record, "path"),
            columns: decode_columns(record.get_list("column"))?,
        })
    }

    pub fn into_http_input(self) -> HttpDataSourceTableInput {
        if self.path.is_some() {
            warn!("table '{}': path is only used by S3 Data Sources", self.name);
        }
        HttpDataSourceTableInput {
            name: self.name,
            columns: columns_input(self.columns),
        }
    }

    pub fn into_s3_input(self) -> S3DataSourceTableInput {
        S3DataSourceTableInput {
            name: self.name,
            path: self.path,
            columns: columns_input(self.columns),
        }
    }
}

fn columns_input(columns: Vec<ColumnSpec>) -> Vec<DataSourceColumnInput> {
    columns
        .into_iter()
        .map(ColumnSpec::into_data_source_input)
        .collect()
}

pub fn decode_tables(values: &[Value]) -> ProviderResult<Vec<TableSpec>> {
    values
        .iter()
        .map(|v| record(v, "table").and_then(TableSpec::from_record))
        .collect()
}

/// Nodes of the first page; later pages are not fetched
fn first_page<'a, T>(connection: &'a Connection<T>, what: &str) -> &'a [T] {
    if connection.has_next_page() {
        warn!("only the first page of {} is mirrored into state", what);
    }
    &connection.nodes
}

/// Flatten remote tables into `table` records
pub fn tables_to_value(tables: &Connection<Table>) -> Value {
    let records = first_page(tables, "tables")
        .iter()
        .map(|table| {
            let columns = first_page(&table.columns, "table columns")
                .iter()
                .map(|c| ColumnSpec::to_record(&c.name, c.column_type, c.is_nullable))
                .collect();

            let mut map = HashMap::new();
            map.insert("name".to_string(), Value::from(table.name.as_str()));
            if let Some(path) = &table.path {
                map.insert("path".to_string(), Value::from(path.as_str()));
            }
            map.insert("column".to_string(), Value::List(columns));
            Value::Map(map)
        })
        .collect();
    Value::List(records)
}

/// Flatten remote Data Pool columns into `column` records
pub fn data_pool_columns_to_value(columns: &Connection<DataPoolColumn>) -> Value {
    Value::List(
        first_page(columns, "Data Pool columns")
            .iter()
            .map(|c| ColumnSpec::to_record(&c.column_name, c.column_type, c.is_nullable))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use propel_client::data_source::Column;
    use propel_client::types::PageInfo;
    use std::collections::HashSet;

    fn column(name: &str, ty: &str, nullable: bool) -> Value {
        let mut map = HashMap::new();
        map.insert("name".to_string(), Value::from(name));
        map.insert("type".to_string(), Value::from(ty));
        map.insert("nullable".to_string(), Value::Bool(nullable));
        Value::Map(map)
    }

    #[test]
    fn every_literal_maps_to_a_distinct_type() {
        let mapped: HashSet<ColumnType> = COLUMN_TYPES
            .iter()
            .map(|l| to_remote_column_type(l))
            .collect();
        assert_eq!(mapped.len(), COLUMN_TYPES.len());
        assert!(!mapped.contains(&ColumnType::Unspecified));

        for literal in COLUMN_TYPES {
            assert_eq!(to_remote_column_type(literal).as_str(), literal);
        }
    }

    #[test]
    fn float_has_its_own_mapping() {
        assert_eq!(to_remote_column_type("FLOAT"), ColumnType::Float);
    }

    #[test]
    fn unknown_literal_is_unspecified() {
        assert_eq!(to_remote_column_type("DECIMAL"), ColumnType::Unspecified);
        assert_eq!(to_remote_column_type("int64"), ColumnType::Unspecified);
    }

    #[test]
    fn decode_column_records() {
        let columns = decode_columns(&[column("id", "INT64", false), column("name", "STRING", true)])
            .unwrap();
        assert_eq!(
            columns[0],
            ColumnSpec {
                name: "id".to_string(),
                column_type: ColumnType::Int64,
                nullable: false,
            }
        );
        assert!(columns[1].nullable);
    }

    #[test]
    fn column_without_name_is_a_configuration_error() {
        let mut map = HashMap::new();
        map.insert("type".to_string(), Value::from("INT64"));
        let err = decode_columns(&[Value::Map(map)]).unwrap_err();
        assert_eq!(err.message, "Required attribute 'name' is missing");
    }

    #[test]
    fn decode_table_with_path() {
        let mut map = HashMap::new();
        map.insert("name".to_string(), Value::from("events"));
        map.insert("path".to_string(), Value::from("events/*.parquet"));
        map.insert(
            "column".to_string(),
            Value::List(vec![column("id", "INT64", false)]),
        );

        let tables = decode_tables(&[Value::Map(map)]).unwrap();
        let input = tables[0].clone().into_s3_input();
        assert_eq!(input.path.as_deref(), Some("events/*.parquet"));
        assert_eq!(input.columns[0].column_type, ColumnType::Int64);
    }

    #[test]
    fn tables_flatten_first_page_only() {
        let mut tables = Connection::new(vec![Table {
            name: "events".to_string(),
            path: None,
            columns: Connection::new(vec![Column {
                name: "id".to_string(),
                column_type: ColumnType::Int64,
                is_nullable: false,
            }]),
        }]);
        tables.page_info = Some(PageInfo {
            has_next_page: true,
            end_cursor: Some("c1".to_string()),
        });

        let value = tables_to_value(&tables);
        let records = value.as_list().unwrap();
        assert_eq!(records.len(), 1);

        let table = records[0].as_map().unwrap();
        assert_eq!(table.get_str("name"), Some("events"));
        assert!(!table.contains_key("path"));
        assert_eq!(table.get_list("column"), &[column("id", "INT64", false)]);
    }
}
