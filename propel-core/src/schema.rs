//! Schema - Define type schemas for resources
//!
//! Providers define schemas for each resource type so that configuration
//! errors surface before any remote call is made.

use std::collections::HashMap;
use std::fmt;

use crate::resource::Value;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Enum (list of allowed values)
    Enum {
        variants: Vec<String>,
        ignore_case: bool,
    },
    /// List
    List(Box<AttributeType>),
    /// Nested records; a singleton block is a block with `max_items` of 1
    Block(Box<BlockSchema>),
}

impl AttributeType {
    pub fn enumeration(variants: &[&str]) -> Self {
        AttributeType::Enum {
            variants: variants.iter().map(|v| v.to_string()).collect(),
            ignore_case: false,
        }
    }

    pub fn enumeration_ignore_case(variants: &[&str]) -> Self {
        AttributeType::Enum {
            variants: variants.iter().map(|v| v.to_string()).collect(),
            ignore_case: true,
        }
    }

    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (
                AttributeType::Enum {
                    variants,
                    ignore_case,
                },
                Value::String(s),
            ) => {
                let matches = |v: &String| {
                    if *ignore_case {
                        v.eq_ignore_ascii_case(s)
                    } else {
                        v == s
                    }
                };
                if variants.iter().any(matches) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::List(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Block(block), Value::Map(map)) => block.validate_record(map),

            (AttributeType::Block(block), Value::List(items)) => {
                if let Some(max) = block.max_items
                    && items.len() > max
                {
                    return Err(TypeError::TooManyItems {
                        max,
                        got: items.len(),
                    });
                }
                for (i, item) in items.iter().enumerate() {
                    let record = item.as_map().ok_or_else(|| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(TypeError::TypeMismatch {
                            expected: "Map".to_string(),
                            got: item.type_name().to_string(),
                        }),
                    })?;
                    block
                        .validate_record(record)
                        .map_err(|e| TypeError::ListItemError {
                            index: i,
                            inner: Box::new(e),
                        })?;
                }
                Ok(())
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name().to_string(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum { variants, .. } => format!("Enum({})", variants.join(" | ")),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Block(_) => "Block".to_string(),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Attribute '{name}' conflicts with '{other}'")]
    Conflict { name: String, other: String },

    #[error("At most {max} item(s) allowed, got {got}")]
    TooManyItems { max: usize, got: usize },

    #[error("Attribute '{name}': {inner}")]
    AttributeError { name: String, inner: Box<TypeError> },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    /// Value is supplied by the remote API and never read from configuration
    pub computed: bool,
    /// Value must not be printed
    pub sensitive: bool,
    /// Changing the value replaces the resource
    pub force_new: bool,
    pub description: Option<String>,
    /// Attributes that must not be set together with this one
    pub conflicts_with: Vec<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            computed: false,
            sensitive: false,
            force_new: false,
            description: None,
            conflicts_with: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn conflicts_with(mut self, others: &[&str]) -> Self {
        self.conflicts_with = others.iter().map(|o| o.to_string()).collect();
        self
    }
}

/// Schema of a nested record
#[derive(Debug, Clone, Default)]
pub struct BlockSchema {
    pub attributes: HashMap<String, AttributeSchema>,
    pub max_items: Option<usize>,
}

impl BlockSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// A block that may appear at most once
    pub fn single() -> Self {
        Self {
            attributes: HashMap::new(),
            max_items: Some(1),
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn into_type(self) -> AttributeType {
        AttributeType::Block(Box::new(self))
    }

    fn validate_record(&self, record: &HashMap<String, Value>) -> Result<(), TypeError> {
        validate_attributes(&self.attributes, record)
            .map_err(|mut errors| errors.remove(0))
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Names of the attributes whose change requires replacement
    pub fn force_new_attributes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .attributes
            .values()
            .filter(|a| a.force_new)
            .map(|a| a.name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Validate resource attributes
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        validate_attributes(&self.attributes, attributes)
    }
}

fn validate_attributes(
    schemas: &HashMap<String, AttributeSchema>,
    attributes: &HashMap<String, Value>,
) -> Result<(), Vec<TypeError>> {
    let mut errors = Vec::new();

    let mut names: Vec<&String> = schemas.keys().collect();
    names.sort();

    for name in names {
        let schema = &schemas[name];
        let value = attributes.get(name).filter(|v| is_set(v));

        match value {
            None if schema.required => {
                errors.push(TypeError::MissingRequired { name: name.clone() });
            }
            None => {}
            Some(value) => {
                if let Err(e) = schema.attr_type.validate(value) {
                    errors.push(TypeError::AttributeError {
                        name: name.clone(),
                        inner: Box::new(e),
                    });
                }
                for other in &schema.conflicts_with {
                    // Report each conflicting pair once
                    if other > name && attributes.get(other).is_some_and(is_set) {
                        errors.push(TypeError::Conflict {
                            name: name.clone(),
                            other: other.clone(),
                        });
                    }
                }
            }
        }
        // Unknown attributes are allowed (computed values, timeouts, ...)
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Empty blocks count as absent
fn is_set(value: &Value) -> bool {
    !matches!(value, Value::List(items) if items.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_block() -> BlockSchema {
        BlockSchema::new()
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(
                AttributeSchema::new("type", AttributeType::enumeration(&["INT64", "STRING"]))
                    .required(),
            )
            .attribute(AttributeSchema::new("nullable", AttributeType::Bool).required())
    }

    fn column(name: &str, ty: &str) -> Value {
        let mut map = HashMap::new();
        map.insert("name".to_string(), Value::from(name));
        map.insert("type".to_string(), Value::from(ty));
        map.insert("nullable".to_string(), Value::Bool(false));
        Value::Map(map)
    }

    #[test]
    fn validate_string_type() {
        let t = AttributeType::String;
        assert!(t.validate(&Value::from("hello")).is_ok());
        assert!(t.validate(&Value::Int(42)).is_err());
    }

    #[test]
    fn validate_enum_type() {
        let t = AttributeType::enumeration(&["BOOLEAN", "STRING"]);
        assert!(t.validate(&Value::from("STRING")).is_ok());
        assert!(t.validate(&Value::from("string")).is_err());

        let t = AttributeType::enumeration_ignore_case(&["Snowflake", "Http", "S3"]);
        assert!(t.validate(&Value::from("SNOWFLAKE")).is_ok());
        assert!(t.validate(&Value::from("http")).is_ok());
        assert!(t.validate(&Value::from("Kafka")).is_err());
    }

    #[test]
    fn validate_nested_columns() {
        let t = column_block().into_type();
        assert!(
            t.validate(&Value::List(vec![column("id", "INT64"), column("name", "STRING")]))
                .is_ok()
        );

        let err = t
            .validate(&Value::List(vec![column("id", "INT64"), column("x", "DECIMAL")]))
            .unwrap_err();
        assert!(matches!(err, TypeError::ListItemError { index: 1, .. }));
    }

    #[test]
    fn single_block_rejects_two_items() {
        let t = BlockSchema::single()
            .attribute(AttributeSchema::new("bucket", AttributeType::String).required())
            .into_type();
        let mut map = HashMap::new();
        map.insert("bucket".to_string(), Value::from("b"));

        assert!(t.validate(&Value::Map(map.clone())).is_ok());
        assert!(t.validate(&Value::block(map.clone())).is_ok());

        let two = Value::List(vec![Value::Map(map.clone()), Value::Map(map)]);
        assert!(matches!(
            t.validate(&two),
            Err(TypeError::TooManyItems { max: 1, got: 2 })
        ));
    }

    #[test]
    fn missing_required_attribute() {
        let schema = ResourceSchema::new("propel_data_pool")
            .attribute(AttributeSchema::new("table", AttributeType::String).required());

        let errors = schema.validate(&HashMap::new()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "Required attribute 'table' is missing");
    }

    #[test]
    fn conflicting_blocks_are_reported_once() {
        let block = BlockSchema::single()
            .attribute(AttributeSchema::new("bucket", AttributeType::String));
        let schema = ResourceSchema::new("propel_data_source")
            .attribute(
                AttributeSchema::new("http_connection_settings", block.clone().into_type())
                    .conflicts_with(&["s3_connection_settings"]),
            )
            .attribute(
                AttributeSchema::new("s3_connection_settings", block.into_type())
                    .conflicts_with(&["http_connection_settings"]),
            );

        let mut attrs = HashMap::new();
        attrs.insert(
            "http_connection_settings".to_string(),
            Value::block(HashMap::new()),
        );
        attrs.insert(
            "s3_connection_settings".to_string(),
            Value::block(HashMap::new()),
        );

        let errors = schema.validate(&attrs).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], TypeError::Conflict { .. }));

        // An empty block list is the same as not setting the block
        attrs.insert("s3_connection_settings".to_string(), Value::List(vec![]));
        assert!(schema.validate(&attrs).is_ok());
    }
}
