//! propel_data_source
//!
//! A Data Source connects to one of three kinds of storage. The configured
//! `type` picks the create mutation; on Read, the type reported by the API
//! picks how connection settings and tables are mirrored.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use propel_client::{ClientError, PropelApi};
use propel_client::data_source::{
    ConnectionSettings, CreateHttpDataSourceInput, CreateS3DataSourceInput,
    CreateSnowflakeDataSourceInput, CreateSnowflakeDataSourceResult, DataSource,
    HttpBasicAuthInput, HttpConnectionSettingsInput, ModifyDataSourceInput,
    S3ConnectionSettingsInput, SnowflakeConnectionSettingsInput,
};
use propel_client::types::IdOrUniqueName;
use propel_core::differ::{has_changes, has_cleared};
use propel_core::provider::{ErrorKind, OperationContext, ProviderError, ProviderResult};
use propel_core::resource::{AttributesExt, Resource, ResourceId, State, Value};
use propel_core::wait::StatusSets;

use crate::adapter::{ResourceAdapter, identifier_of, read_back};
use crate::config::PollSettings;
use crate::mapper::{
    TableSpec, decode_tables, description_of, optional_str, required_str, tables_to_value,
};

pub const RESOURCE_TYPE: &str = "propel_data_source";

pub const SNOWFLAKE_SETTINGS: &str = "snowflake_connection_settings";
pub const HTTP_SETTINGS: &str = "http_connection_settings";
pub const S3_SETTINGS: &str = "s3_connection_settings";

const PENDING: &[&str] = &["CREATED", "CONNECTING"];
const TARGET: &[&str] = &["CONNECTED"];

// =============================================================================
// Variant dispatch
// =============================================================================

/// Discriminator of a Data Source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSourceKind {
    Snowflake,
    Http,
    S3,
}

impl DataSourceKind {
    pub const NAMES: [&'static str; 3] = ["Snowflake", "S3", "Http"];

    /// Case-insensitive
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("snowflake") {
            Some(DataSourceKind::Snowflake)
        } else if s.eq_ignore_ascii_case("http") {
            Some(DataSourceKind::Http)
        } else if s.eq_ignore_ascii_case("s3") {
            Some(DataSourceKind::S3)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataSourceKind::Snowflake => "Snowflake",
            DataSourceKind::Http => "Http",
            DataSourceKind::S3 => "S3",
        }
    }

    pub fn settings_block(&self) -> &'static str {
        match self {
            DataSourceKind::Snowflake => SNOWFLAKE_SETTINGS,
            DataSourceKind::Http => HTTP_SETTINGS,
            DataSourceKind::S3 => S3_SETTINGS,
        }
    }
}

impl fmt::Display for DataSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection settings of one kind, decoded from desired state
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionSpec {
    Snowflake(SnowflakeConnectionSettingsInput),
    Http {
        basic_auth: Option<HttpBasicAuthInput>,
        tables: Vec<TableSpec>,
    },
    S3 {
        bucket: String,
        aws_access_key_id: String,
        aws_secret_access_key: String,
        tables: Vec<TableSpec>,
    },
}

impl ConnectionSpec {
    pub fn from_attributes(attributes: &HashMap<String, Value>) -> ProviderResult<Self> {
        let raw = required_str(attributes, "type")?;
        let kind = DataSourceKind::parse(&raw).ok_or_else(|| {
            ProviderError::configuration(format!("Unsupported Data Source type \"{}\"", raw))
        })?;

        for other in [SNOWFLAKE_SETTINGS, HTTP_SETTINGS, S3_SETTINGS] {
            if other != kind.settings_block() && attributes.get_block(other).is_some() {
                return Err(ProviderError::configuration(format!(
                    "\"{}\" cannot be used with a {} Data Source",
                    other, kind
                )));
            }
        }

        match kind {
            DataSourceKind::Snowflake => {
                let block = settings_block(attributes, kind)?;
                Ok(ConnectionSpec::Snowflake(SnowflakeConnectionSettingsInput {
                    account: required_str(block, "account")?,
                    database: required_str(block, "database")?,
                    warehouse: required_str(block, "warehouse")?,
                    schema: required_str(block, "schema")?,
                    role: required_str(block, "role")?,
                    username: required_str(block, "username")?,
                    password: required_str(block, "password")?,
                }))
            }
            DataSourceKind::Http => {
                let basic_auth = attributes
                    .get_block(HTTP_SETTINGS)
                    .and_then(|settings| settings.get_block("basic_auth"))
                    .map(|auth| -> ProviderResult<HttpBasicAuthInput> {
                        Ok(HttpBasicAuthInput {
                            username: required_str(auth, "username")?,
                            password: required_str(auth, "password")?,
                        })
                    })
                    .transpose()?;
                Ok(ConnectionSpec::Http {
                    basic_auth,
                    tables: decode_tables(attributes.get_list("table"))?,
                })
            }
            DataSourceKind::S3 => {
                let block = settings_block(attributes, kind)?;
                Ok(ConnectionSpec::S3 {
                    bucket: required_str(block, "bucket")?,
                    aws_access_key_id: required_str(block, "aws_access_key_id")?,
                    aws_secret_access_key: required_str(block, "aws_secret_access_key")?,
                    tables: decode_tables(attributes.get_list("table"))?,
                })
            }
        }
    }

    pub fn kind(&self) -> DataSourceKind {
        match self {
            ConnectionSpec::Snowflake(_) => DataSourceKind::Snowflake,
            ConnectionSpec::Http { .. } => DataSourceKind::Http,
            ConnectionSpec::S3 { .. } => DataSourceKind::S3,
        }
    }
}

fn settings_block(
    attributes: &HashMap<String, Value>,
    kind: DataSourceKind,
) -> ProviderResult<&HashMap<String, Value>> {
    attributes.get_block(kind.settings_block()).ok_or_else(|| {
        ProviderError::configuration(format!(
            "\"{}\" is required for {} Data Sources",
            kind.settings_block(),
            kind
        ))
    })
}

// =============================================================================
// Read mapping
// =============================================================================

fn insert_str(map: &mut HashMap<String, Value>, key: &str, value: &str) {
    map.insert(key.to_string(), Value::from(value));
}

/// Value of `key` inside the prior settings block (or one of its nested blocks)
fn prior_secret<'a>(prior: &'a HashMap<String, Value>, path: &[&str], key: &str) -> Option<&'a str> {
    let mut block = prior;
    for name in path {
        block = block.get_block(name)?;
    }
    block.get_str(key)
}

fn to_attributes(
    source: &DataSource,
    prior: &HashMap<String, Value>,
) -> ProviderResult<HashMap<String, Value>> {
    let mut attributes = HashMap::new();
    insert_str(&mut attributes, "unique_name", &source.unique_name);
    insert_str(&mut attributes, "description", &source.description);
    insert_str(&mut attributes, "created_at", &source.created_at.to_rfc3339());
    insert_str(&mut attributes, "created_by", &source.created_by);
    insert_str(&mut attributes, "modified_at", &source.modified_at.to_rfc3339());
    insert_str(&mut attributes, "modified_by", &source.modified_by);
    insert_str(&mut attributes, "environment", &source.environment.id);
    insert_str(&mut attributes, "account", &source.account.id);
    insert_str(&mut attributes, "type", &source.data_source_type);
    insert_str(&mut attributes, "status", source.status.as_str());

    if let Some(configured) = prior.get_str("type") {
        if !configured.eq_ignore_ascii_case(&source.data_source_type) {
            warn!(
                "Data Source {} is configured as {} but the API reports {}",
                source.id, configured, source.data_source_type
            );
        }
    }

    let Some(kind) = DataSourceKind::parse(&source.data_source_type) else {
        warn!(
            "Data Source {} has unsupported type {}, leaving its settings unmanaged",
            source.id, source.data_source_type
        );
        return Ok(attributes);
    };

    let settings = source.connection_settings.as_ref();
    match kind {
        DataSourceKind::Snowflake => {
            let Some(ConnectionSettings::Snowflake(remote)) = settings else {
                return Err(ProviderError::new("Missing SnowflakeConnectionSettings"));
            };
            let mut block = HashMap::new();
            insert_str(&mut block, "account", &remote.account);
            insert_str(&mut block, "database", &remote.database);
            insert_str(&mut block, "warehouse", &remote.warehouse);
            insert_str(&mut block, "schema", &remote.schema);
            insert_str(&mut block, "role", &remote.role);
            insert_str(&mut block, "username", &remote.username);
            if let Some(password) = prior_secret(prior, &[SNOWFLAKE_SETTINGS], "password") {
                insert_str(&mut block, "password", password);
            }
            attributes.insert(SNOWFLAKE_SETTINGS.to_string(), Value::block(block));
        }
        DataSourceKind::Http => {
            let Some(ConnectionSettings::Http(remote)) = settings else {
                return Err(ProviderError::new("Missing HttpConnectionSettings"));
            };
            if let Some(tables) = &source.tables {
                attributes.insert("table".to_string(), tables_to_value(tables));
            }
            if prior.get_block(HTTP_SETTINGS).is_some() {
                let mut block = HashMap::new();
                if let Some(auth) = &remote.basic_auth {
                    let mut basic_auth = HashMap::new();
                    insert_str(&mut basic_auth, "username", &auth.username);
                    if let Some(password) =
                        prior_secret(prior, &[HTTP_SETTINGS, "basic_auth"], "password")
                    {
                        insert_str(&mut basic_auth, "password", password);
                    }
                    block.insert("basic_auth".to_string(), Value::block(basic_auth));
                }
                attributes.insert(HTTP_SETTINGS.to_string(), Value::block(block));
            }
        }
        DataSourceKind::S3 => {
            let Some(ConnectionSettings::S3(remote)) = settings else {
                return Err(ProviderError::new("Missing S3ConnectionSettings"));
            };
            if let Some(tables) = &source.tables {
                attributes.insert("table".to_string(), tables_to_value(tables));
            }
            let mut block = HashMap::new();
            insert_str(&mut block, "bucket", &remote.bucket);
            insert_str(&mut block, "aws_access_key_id", &remote.aws_access_key_id);
            if let Some(secret) = prior_secret(prior, &[S3_SETTINGS], "aws_secret_access_key") {
                insert_str(&mut block, "aws_secret_access_key", secret);
            }
            attributes.insert(S3_SETTINGS.to_string(), Value::block(block));
        }
    }

    Ok(attributes)
}

// =============================================================================
// Adapter
// =============================================================================

pub struct DataSourceAdapter {
    api: Arc<dyn PropelApi>,
    poll: PollSettings,
}

impl DataSourceAdapter {
    pub fn new(api: Arc<dyn PropelApi>, poll: PollSettings) -> Self {
        Self { api, poll }
    }

    async fn create_remote(
        &self,
        spec: ConnectionSpec,
        unique_name: Option<String>,
        description: Option<String>,
    ) -> ProviderResult<DataSource> {
        let failed = |e: ClientError| ProviderError::api("Failed to create Data Source", e);

        match spec {
            ConnectionSpec::Snowflake(connection_settings) => {
                let input = CreateSnowflakeDataSourceInput {
                    unique_name,
                    description,
                    connection_settings,
                };
                match self
                    .api
                    .create_snowflake_data_source(&input)
                    .await
                    .map_err(failed)?
                {
                    CreateSnowflakeDataSourceResult::Created(response) => Ok(response.data_source),
                    CreateSnowflakeDataSourceResult::Failed(failure) => {
                        Err(ProviderError::new("Failed to create Data Source")
                            .with_kind(ErrorKind::Api)
                            .with_cause(failure.error))
                    }
                }
            }
            ConnectionSpec::Http { basic_auth, tables } => {
                let input = CreateHttpDataSourceInput {
                    unique_name,
                    description,
                    connection_settings: HttpConnectionSettingsInput {
                        basic_auth,
                        tables: tables.into_iter().map(TableSpec::into_http_input).collect(),
                    },
                };
                let response = self.api.create_http_data_source(&input).await.map_err(failed)?;
                Ok(response.data_source)
            }
            ConnectionSpec::S3 {
                bucket,
                aws_access_key_id,
                aws_secret_access_key,
                tables,
            } => {
                let input = CreateS3DataSourceInput {
                    unique_name,
                    description,
                    connection_settings: S3ConnectionSettingsInput {
                        bucket,
                        aws_access_key_id,
                        aws_secret_access_key,
                        tables: tables.into_iter().map(TableSpec::into_s3_input).collect(),
                    },
                };
                let response = self.api.create_s3_data_source(&input).await.map_err(failed)?;
                Ok(response.data_source)
            }
        }
    }

    async fn status(&self, id: &str) -> ProviderResult<String> {
        let source = self
            .api
            .data_source(id)
            .await
            .map_err(|e| ProviderError::api("error trying to read Data Source status", e))?;
        Ok(source.status.to_string())
    }
}

#[async_trait]
impl ResourceAdapter for DataSourceAdapter {
    fn resource_type(&self) -> &'static str {
        RESOURCE_TYPE
    }

    async fn create(&self, ctx: &OperationContext, resource: &Resource) -> ProviderResult<State> {
        let spec = ConnectionSpec::from_attributes(&resource.attributes)?;
        let kind = spec.kind();

        info!("creating {} Data Source {}", kind, resource.id.name);
        let created = self
            .create_remote(
                spec,
                optional_str(&resource.attributes, "unique_name"),
                optional_str(&resource.attributes, "description"),
            )
            .await?;
        let id = created.id;
        debug!("Data Source {} created with status {}", id, created.status);

        let sets = StatusSets::new(PENDING, TARGET).with_stability(self.poll.stability);
        let source_id = id.as_str();
        self.poll
            .waiter(ctx.timeouts.create)
            .until_status(&sets, &ctx.cancellation, move || self.status(source_id))
            .await
            .map_err(|e| {
                ProviderError::from(e)
                    .context("error waiting for Data Source to be CONNECTED")
                    .with_identifier(source_id)
            })?;

        self.read(&resource.id, &id, &resource.attributes)
            .await
            .and_then(|state| read_back(state, "Data Source", source_id))
            .map_err(|e| e.with_identifier(source_id))
    }

    async fn read(
        &self,
        id: &ResourceId,
        identifier: &str,
        prior: &HashMap<String, Value>,
    ) -> ProviderResult<State> {
        let source = match self.api.data_source(identifier).await {
            Ok(source) => source,
            Err(e) if e.is_not_found() => {
                warn!("Data Source {} no longer exists", identifier);
                return Ok(State::not_found(id.clone()));
            }
            Err(e) => return Err(ProviderError::api("Failed to read Data Source", e)),
        };

        let attributes = to_attributes(&source, prior)?;
        Ok(State::existing(id.clone(), attributes).with_identifier(source.id))
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
            let input = ModifyDataSourceInput {
                id_or_unique_name: IdOrUniqueName::id(identifier),
                unique_name: optional_str(&to.attributes, "unique_name"),
                description: Some(description_of(to)),
            };
            info!("modifying Data Source {}", identifier);
            self.api
                .modify_data_source(&input)
                .await
                .map_err(|e| ProviderError::api("Failed to update Data Source", e))?;
        }

        self.read(&to.id, identifier, &to.attributes).await
    }

    async fn delete(
        &self,
        _ctx: &OperationContext,
        _id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<()> {
        info!("deleting Data Source {}", identifier);
        self.api
            .delete_data_source(identifier)
            .await
            .map_err(|e| ProviderError::api("Failed to delete Data Source", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, MockApi, script};
    use propel_client::data_source::DataSourceResponse;
    use propel_client::types::{ApiFailure, FailureResponse};
    use propel_core::provider::Timeouts;
    use serde_json::json;
    use std::time::Duration;

    fn adapter(api: &Arc<MockApi>) -> DataSourceAdapter {
        DataSourceAdapter::new(api.clone(), PollSettings::default())
    }

    fn block(pairs: &[(&str, &str)]) -> Value {
        Value::block(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), Value::from(*v)))
                .collect(),
        )
    }

    fn snowflake() -> Resource {
        Resource::new(RESOURCE_TYPE, "warehouse")
            .with_attribute("unique_name", "warehouse")
            .with_attribute("type", "snowflake")
            .with_attribute(
                SNOWFLAKE_SETTINGS,
                block(&[
                    ("account", "zn12345.us-east-2.aws"),
                    ("database", "ANALYTICS"),
                    ("warehouse", "PROPELLING"),
                    ("schema", "PUBLIC"),
                    ("role", "PROPELLER"),
                    ("username", "PROPEL"),
                    ("password", "hunter2"),
                ]),
            )
    }

    fn events_table(path: Option<&str>) -> Value {
        let mut column = HashMap::new();
        column.insert("name".to_string(), Value::from("id"));
        column.insert("type".to_string(), Value::from("INT64"));
        column.insert("nullable".to_string(), Value::Bool(false));

        let mut table = HashMap::new();
        table.insert("name".to_string(), Value::from("events"));
        if let Some(path) = path {
            table.insert("path".to_string(), Value::from(path));
        }
        table.insert("column".to_string(), Value::List(vec![Value::Map(column)]));
        Value::List(vec![Value::Map(table)])
    }

    fn created(settings: serde_json::Value) -> CreateSnowflakeDataSourceResult {
        CreateSnowflakeDataSourceResult::Created(testing::data_source_response(
            "ds_1", "CREATED", settings,
        ))
    }

    #[test]
    fn kind_is_case_insensitive() {
        assert_eq!(DataSourceKind::parse("SNOWFLAKE"), Some(DataSourceKind::Snowflake));
        assert_eq!(DataSourceKind::parse("http"), Some(DataSourceKind::Http));
        assert_eq!(DataSourceKind::parse("s3"), Some(DataSourceKind::S3));
        assert_eq!(DataSourceKind::parse("Kafka"), None);
    }

    #[test]
    fn unsupported_type_is_a_configuration_error() {
        let resource = snowflake().with_attribute("type", "Kafka");
        let err = ConnectionSpec::from_attributes(&resource.attributes).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
        assert_eq!(err.message, "Unsupported Data Source type \"Kafka\"");
    }

    #[test]
    fn conflicting_settings_are_rejected() {
        let resource = snowflake().with_attribute(
            S3_SETTINGS,
            block(&[("bucket", "b"), ("aws_access_key_id", "k"), ("aws_secret_access_key", "s")]),
        );
        let err = ConnectionSpec::from_attributes(&resource.attributes).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[test]
    fn s3_requires_its_settings_block() {
        let resource = Resource::new(RESOURCE_TYPE, "lake").with_attribute("type", "S3");
        let err = ConnectionSpec::from_attributes(&resource.attributes).unwrap_err();
        assert_eq!(
            err.message,
            "\"s3_connection_settings\" is required for S3 Data Sources"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn snowflake_create_waits_for_connected() {
        let api = Arc::new(MockApi::default());
        script(&api.snowflake_creates, [Ok(created(testing::snowflake_settings()))]);
        script(
            &api.data_source_reads,
            ["CONNECTING", "CONNECTED", "CONNECTED", "CONNECTED", "CONNECTED"]
                .map(|s| Ok(testing::data_source("ds_1", s, testing::snowflake_settings()))),
        );

        let state = adapter(&api)
            .create(&OperationContext::default(), &snowflake())
            .await
            .unwrap();

        assert_eq!(state.identifier.as_deref(), Some("ds_1"));
        assert_eq!(state.attributes.get_str("status"), Some("CONNECTED"));
        assert_eq!(state.attributes.get_str("type"), Some("Snowflake"));
        assert_eq!(state.attributes.get_str("created_at"), Some("2023-03-01T10:00:00+00:00"));

        let settings = state.attributes.get_block(SNOWFLAKE_SETTINGS).unwrap();
        assert_eq!(settings.get_str("warehouse"), Some("PROPELLING"));
        assert_eq!(settings.get_str("password"), Some("hunter2"));

        let input = api.argument("create_snowflake_data_source").unwrap();
        assert_eq!(input["connectionSettings"]["password"], "hunter2");
    }

    #[tokio::test(start_paused = true)]
    async fn snowflake_failure_branch_assigns_no_identifier() {
        let api = Arc::new(MockApi::default());
        script(
            &api.snowflake_creates,
            [Ok(CreateSnowflakeDataSourceResult::Failed(FailureResponse {
                error: ApiFailure {
                    code: Some(400),
                    message: "Invalid Snowflake credentials".to_string(),
                },
            }))],
        );

        let err = adapter(&api)
            .create(&OperationContext::default(), &snowflake())
            .await
            .unwrap_err();

        assert_eq!(err.message, "Failed to create Data Source");
        assert_eq!(err.identifier, None);
        let diagnostic = propel_core::diagnostics::Diagnostic::from(&err);
        assert_eq!(
            diagnostic.detail.as_deref(),
            Some("Invalid Snowflake credentials (code 400)")
        );
        assert_eq!(api.count("data_source"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn connecting_past_deadline_times_out() {
        let api = Arc::new(MockApi::default());
        script(&api.snowflake_creates, [Ok(created(testing::snowflake_settings()))]);
        script(
            &api.data_source_reads,
            std::iter::repeat_with(|| {
                Ok(testing::data_source("ds_1", "CONNECTING", testing::snowflake_settings()))
            })
            .take(200),
        );
        let ctx = OperationContext::default().with_timeouts(Timeouts {
            create: Duration::from_secs(5 * 60),
            delete: Timeouts::DEFAULT,
        });

        let err = adapter(&api).create(&ctx, &snowflake()).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Timeout);
        assert_eq!(
            err.message,
            "error waiting for Data Source to be CONNECTED: timeout while waiting for state to become 'CONNECTED' (last state: 'CONNECTING', timeout: 4m0s)"
        );
        assert_eq!(err.identifier.as_deref(), Some("ds_1"));
    }

    #[tokio::test(start_paused = true)]
    async fn http_create_sends_tables_and_mirrors_basic_auth() {
        let http = json!({
            "__typename": "HttpConnectionSettings",
            "basicAuth": {"username": "loader"}
        });
        let api = Arc::new(MockApi::default());
        script(
            &api.data_source_creates,
            [Ok(testing::data_source_response("ds_2", "CREATED", http.clone()))],
        );
        script(
            &api.data_source_reads,
            ["CONNECTED", "CONNECTED", "CONNECTED", "CONNECTED"]
                .map(|s| Ok(testing::data_source("ds_2", s, http.clone()))),
        );

        let auth = block(&[("username", "loader"), ("password", "s3cret")]);
        let resource = Resource::new(RESOURCE_TYPE, "ingest")
            .with_attribute("type", "Http")
            .with_attribute(
                HTTP_SETTINGS,
                Value::block(HashMap::from([("basic_auth".to_string(), auth)])),
            )
            .with_attribute("table", events_table(None));

        let state = adapter(&api)
            .create(&OperationContext::default(), &resource)
            .await
            .unwrap();

        let input = api.argument("create_http_data_source").unwrap();
        assert_eq!(input["connectionSettings"]["tables"][0]["name"], "events");
        assert_eq!(
            input["connectionSettings"]["tables"][0]["columns"][0],
            json!({"name": "id", "type": "INT64", "nullable": false})
        );

        let auth = state
            .attributes
            .get_block(HTTP_SETTINGS)
            .and_then(|s| s.get_block("basic_auth"))
            .unwrap();
        assert_eq!(auth.get_str("username"), Some("loader"));
        assert_eq!(auth.get_str("password"), Some("s3cret"));
        assert_eq!(state.attributes.get_list("table").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn s3_create_sends_paths_and_keeps_secret() {
        let s3 = json!({
            "__typename": "S3ConnectionSettings",
            "bucket": "events-bucket",
            "awsAccessKeyId": "AKIA"
        });
        let api = Arc::new(MockApi::default());
        script(
            &api.data_source_creates,
            [Ok(testing::data_source_response("ds_3", "CREATED", s3.clone()))],
        );
        script(
            &api.data_source_reads,
            ["CONNECTED", "CONNECTED", "CONNECTED", "CONNECTED"]
                .map(|s| Ok(testing::data_source("ds_3", s, s3.clone()))),
        );

        let resource = Resource::new(RESOURCE_TYPE, "lake")
            .with_attribute("type", "S3")
            .with_attribute(
                S3_SETTINGS,
                block(&[
                    ("bucket", "events-bucket"),
                    ("aws_access_key_id", "AKIA"),
                    ("aws_secret_access_key", "wJalr"),
                ]),
            )
            .with_attribute("table", events_table(Some("events/*.parquet")));

        let state = adapter(&api)
            .create(&OperationContext::default(), &resource)
            .await
            .unwrap();

        let input = api.argument("create_s3_data_source").unwrap();
        assert_eq!(input["connectionSettings"]["awsSecretAccessKey"], "wJalr");
        assert_eq!(input["connectionSettings"]["tables"][0]["path"], "events/*.parquet");

        let settings = state.attributes.get_block(S3_SETTINGS).unwrap();
        assert_eq!(settings.get_str("bucket"), Some("events-bucket"));
        assert_eq!(settings.get_str("aws_secret_access_key"), Some("wJalr"));
    }

    #[tokio::test]
    async fn read_follows_remote_type() {
        let api = Arc::new(MockApi::default());
        let s3 = json!({
            "__typename": "S3ConnectionSettings",
            "bucket": "events-bucket",
            "awsAccessKeyId": "AKIA"
        });
        script(&api.data_source_reads, [Ok(testing::data_source("ds_1", "CONNECTED", s3))]);
        let prior = snowflake().attributes;

        let state = adapter(&api)
            .read(&ResourceId::new(RESOURCE_TYPE, "warehouse"), "ds_1", &prior)
            .await
            .unwrap();

        assert_eq!(state.attributes.get_str("type"), Some("S3"));
        assert!(state.attributes.get_block(S3_SETTINGS).is_some());
        assert!(state.attributes.get_block(SNOWFLAKE_SETTINGS).is_none());
    }

    #[tokio::test]
    async fn read_without_snowflake_settings_fails() {
        let api = Arc::new(MockApi::default());
        let mut source =
            testing::data_source("ds_1", "CONNECTED", testing::snowflake_settings());
        source.connection_settings = None;
        script(&api.data_source_reads, [Ok(source)]);

        let err = adapter(&api)
            .read(&ResourceId::new(RESOURCE_TYPE, "warehouse"), "ds_1", &HashMap::new())
            .await
            .unwrap_err();
        assert_eq!(err.message, "Missing SnowflakeConnectionSettings");
    }

    #[tokio::test]
    async fn update_then_delete_without_confirmation() {
        let api = Arc::new(MockApi::default());
        script(
            &api.data_source_modifies,
            [Ok(DataSourceResponse {
                data_source: testing::data_source("ds_1", "CONNECTED", testing::snowflake_settings()),
            })],
        );
        script(
            &api.data_source_reads,
            [Ok(testing::data_source("ds_1", "CONNECTED", testing::snowflake_settings()))],
        );
        script(&api.data_source_deletes, [Ok("ds_1".to_string())]);

        let stored = State::existing(snowflake().id, snowflake().attributes).with_identifier("ds_1");
        let renamed = snowflake().with_attribute("description", "Production warehouse");
        adapter(&api)
            .update(&OperationContext::default(), &stored, &renamed)
            .await
            .unwrap();
        assert_eq!(
            api.argument("modify_data_source").unwrap()["description"],
            "Production warehouse"
        );

        adapter(&api)
            .delete(&OperationContext::default(), &stored.id, "ds_1")
            .await
            .unwrap();
        assert_eq!(
            api.operations(),
            ["modify_data_source", "data_source", "delete_data_source"]
        );
    }

    #[tokio::test]
    async fn removing_description_clears_it_remotely() {
        let api = Arc::new(MockApi::default());
        script(
            &api.data_source_modifies,
            [Ok(DataSourceResponse {
                data_source: testing::data_source("ds_1", "CONNECTED", testing::snowflake_settings()),
            })],
        );
        script(
            &api.data_source_reads,
            [Ok(testing::data_source("ds_1", "CONNECTED", testing::snowflake_settings()))],
        );

        let previous = snowflake().with_attribute("description", "Production warehouse");
        let stored = State::existing(previous.id, previous.attributes).with_identifier("ds_1");
        adapter(&api)
            .update(&OperationContext::default(), &stored, &snowflake())
            .await
            .unwrap();

        assert_eq!(api.count("modify_data_source"), 1);
        assert_eq!(api.argument("modify_data_source").unwrap()["description"], "");
    }

    #[tokio::test(start_paused = true)]
    async fn source_vanishing_after_create_keeps_identifier() {
        let api = Arc::new(MockApi::default());
        script(
            &api.snowflake_creates,
            [Ok(CreateSnowflakeDataSourceResult::Created(
                testing::data_source_response("ds_1", "CREATED", testing::snowflake_settings()),
            ))],
        );
        script(
            &api.data_source_reads,
            std::iter::repeat_with(|| {
                Ok(testing::data_source("ds_1", "CONNECTED", testing::snowflake_settings()))
            })
            .take(3)
            .chain([Err(ClientError::graphql("Data Source ds_1 not found"))]),
        );

        let err = adapter(&api)
            .create(&OperationContext::default(), &snowflake())
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Provisioning);
        assert_eq!(err.identifier.as_deref(), Some("ds_1"));
    }

    #[tokio::test]
    async fn read_error_is_wrapped() {
        let api = Arc::new(MockApi::default());
        script(
            &api.data_source_reads,
            [Err(ClientError::Transport("connection refused".to_string()))],
        );
        let err = adapter(&api)
            .read(&ResourceId::new(RESOURCE_TYPE, "warehouse"), "ds_1", &HashMap::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Api);
        assert_eq!(
            err.message,
            "Failed to read Data Source: transport error: connection refused"
        );
    }
}
