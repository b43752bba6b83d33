//! Tool-related type definitions

use super::error::ToolError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A tool call from the LLM
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// LLM-issued id uniquely naming this call
    pub id: String,
    /// Name of the tool to call
    pub name: String,
    /// Arguments to pass to the tool
    pub arguments: HashMap<String, serde_json::Value>,
    /// Conversation this call belongs to (set by the stream handler)
    pub conversation_id: Option<String>,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new<S: Into<String>>(
        id: S,
        name: S,
        arguments: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
            conversation_id: None,
        }
    }

    /// Attach the ambient conversation id
    pub fn with_conversation<S: Into<String>>(mut self, conversation_id: S) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    /// Get a typed argument value
    pub fn get_argument<T>(&self, key: &str) -> Option<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.arguments
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Get a string argument
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get_argument::<String>(key)
    }

    /// Get a boolean argument
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get_argument::<bool>(key)
    }

    /// Get a number argument
    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.get_argument::<f64>(key)
    }

    /// Get a required string argument or fail with invalid-arguments
    pub fn require_string(&self, key: &str) -> Result<String, ToolError> {
        self.get_string(key)
            .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{}' parameter", key)))
    }
}

/// Result of a tool execution
///
/// `output` carries the JSON envelope surfaced to the LLM; `metadata`
/// duplicates the load-bearing envelope fields (status, file path, error
/// kind) for the host UI without re-parsing the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool call id this result corresponds to
    pub call_id: String,
    /// Name of the tool that was executed
    pub tool_name: String,
    /// Whether the tool execution was successful
    pub success: bool,
    /// Envelope surfaced to the LLM (if successful)
    pub output: Option<String>,
    /// Error message (if failed)
    pub error: Option<String>,
    /// Execution time in milliseconds
    pub execution_time_ms: Option<u64>,
    /// Additional structured data
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            success: true,
            output: Some(output.into()),
            error: None,
            execution_time_ms: None,
            metadata: HashMap::new(),
        }
    }

    /// Create a failed tool result
    pub fn error(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            success: false,
            output: None,
            error: Some(error.into()),
            execution_time_ms: None,
            metadata: HashMap::new(),
        }
    }

    /// Add execution time
    pub fn with_execution_time(mut self, time_ms: u64) -> Self {
        self.execution_time_ms = Some(time_ms);
        self
    }

    /// Add metadata
    pub fn with_metadata<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Parameter definition for a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub description: String,
    /// Parameter type (string, integer, boolean, array)
    pub param_type: String,
    pub required: bool,
    pub default: Option<serde_json::Value>,
    pub enum_values: Option<Vec<serde_json::Value>>,
    /// Additional schema properties (e.g. array item types)
    pub properties: HashMap<String, serde_json::Value>,
}

impl ToolParameter {
    /// Create a required string parameter
    pub fn string<S: Into<String>>(name: S, description: S) -> Self {
        Self::typed(name, description, "string")
    }

    /// Create a required boolean parameter
    pub fn boolean<S: Into<String>>(name: S, description: S) -> Self {
        Self::typed(name, description, "boolean")
    }

    /// Create a required integer parameter
    pub fn integer<S: Into<String>>(name: S, description: S) -> Self {
        Self::typed(name, description, "integer")
    }

    /// Create a required string-array parameter
    pub fn string_array<S: Into<String>>(name: S, description: S) -> Self {
        let mut param = Self::typed(name, description, "array");
        param
            .properties
            .insert("items".to_string(), serde_json::json!({ "type": "string" }));
        param
    }

    fn typed<S: Into<String>>(name: S, description: S, param_type: &str) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            param_type: param_type.to_string(),
            required: true,
            default: None,
            enum_values: None,
            properties: HashMap::new(),
        }
    }

    /// Make parameter optional
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set default value
    pub fn with_default<V: Into<serde_json::Value>>(mut self, default: V) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Restrict the parameter to an enumerated set of values
    pub fn with_enum_values(mut self, values: &[&str]) -> Self {
        self.enum_values = Some(values.iter().map(|v| serde_json::json!(v)).collect());
        self
    }
}

/// JSON schema for a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// Input parameters schema
    pub parameters: serde_json::Value,
}

impl ToolSchema {
    /// Create a new tool schema
    pub fn new<S: Into<String>>(name: S, description: S, parameters: Vec<ToolParameter>) -> Self {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for param in parameters {
            if param.required {
                required.push(param.name.clone());
            }

            let mut param_schema = serde_json::Map::new();
            param_schema.insert("type".to_string(), param.param_type.into());
            param_schema.insert("description".to_string(), param.description.into());

            if let Some(default) = param.default {
                param_schema.insert("default".to_string(), default);
            }

            if let Some(enum_values) = param.enum_values {
                param_schema.insert("enum".to_string(), enum_values.into());
            }

            for (key, value) in param.properties {
                param_schema.insert(key, value);
            }

            properties.insert(param.name, param_schema.into());
        }

        let parameters_schema = serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required
        });

        Self {
            name: name.into(),
            description: description.into(),
            parameters: parameters_schema,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn typed_argument_accessors() {
        let mut arguments = HashMap::new();
        arguments.insert("file_path".to_string(), json!("/tmp/a.txt"));
        arguments.insert("offset".to_string(), json!(12));
        arguments.insert("is_regex".to_string(), json!(true));

        let call = ToolCall::new("t1", "file_operation", arguments).with_conversation("conv");
        assert_eq!(call.get_string("file_path").unwrap(), "/tmp/a.txt");
        assert_eq!(call.get_number("offset").unwrap(), 12.0);
        assert!(call.get_bool("is_regex").unwrap());
        assert_eq!(call.conversation_id.as_deref(), Some("conv"));
        assert!(call.require_string("missing").is_err());
    }

    #[test]
    fn schema_collects_required_and_enums() {
        let schema = ToolSchema::new(
            "file_operation",
            "unified file tool",
            vec![
                ToolParameter::string("type", "operation type")
                    .with_enum_values(&["read", "edit"]),
                ToolParameter::integer("limit", "line limit").optional(),
            ],
        );

        assert_eq!(schema.parameters["required"], json!(["type"]));
        assert_eq!(
            schema.parameters["properties"]["type"]["enum"],
            json!(["read", "edit"])
        );
        assert_eq!(
            schema.parameters["properties"]["limit"]["type"],
            json!("integer")
        );
    }
}
