use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::charts::ChartImageArtifact;
use crate::core::slides::SlidesError;

/// Tool as advertised by `tools/list`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: ToolParameters,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolParameters {
    #[serde(rename = "type")]
    pub param_type: String,
    pub properties: BTreeMap<String, PropertyDef>,
    pub required: Vec<String>,
}

/// JSON-schema fragment for one argument.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyDef {
    #[serde(rename = "type")]
    pub prop_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PropertyDef>>,
}

impl PropertyDef {
    pub fn new(prop_type: &str, description: &str) -> Self {
        Self {
            prop_type: prop_type.to_string(),
            description: Some(description.to_string()),
            enum_values: None,
            items: None,
        }
    }

    pub fn with_enum(mut self, values: &[&str]) -> Self {
        self.enum_values = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn with_items(mut self, items: PropertyDef) -> Self {
        self.items = Some(Box::new(items));
        self
    }
}

/// Small builder so catalog entries read top to bottom.
pub struct ToolBuilder {
    definition: ToolDefinition,
}

impl ToolBuilder {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            definition: ToolDefinition {
                name: name.to_string(),
                description: description.to_string(),
                input_schema: ToolParameters {
                    param_type: "object".to_string(),
                    properties: BTreeMap::new(),
                    required: Vec::new(),
                },
            },
        }
    }

    pub fn required(mut self, name: &str, property: PropertyDef) -> Self {
        self.definition.input_schema.required.push(name.to_string());
        self.optional(name, property)
    }

    pub fn optional(mut self, name: &str, property: PropertyDef) -> Self {
        self.definition
            .input_schema
            .properties
            .insert(name.to_string(), property);
        self
    }

    pub fn build(self) -> ToolDefinition {
        self.definition
    }
}

/// One item of a `tools/call` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text {
        text: String,
    },
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

/// Successful handler output: a JSON payload and optionally an image.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub value: serde_json::Value,
    pub image: Option<ToolContent>,
}

impl ToolOutput {
    pub fn json(value: serde_json::Value) -> Self {
        Self { value, image: None }
    }

    pub fn with_image(mut self, artifact: &ChartImageArtifact) -> Self {
        self.image = Some(ToolContent::Image {
            data: artifact.base64(),
            mime_type: artifact.content_type.to_string(),
        });
        self
    }
}

/// `tools/call` result body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    pub content: Vec<ToolContent>,
    pub is_error: bool,
}

impl CallToolResult {
    pub fn success(output: ToolOutput) -> Self {
        let mut content = vec![ToolContent::Text {
            text: output.value.to_string(),
        }];
        content.extend(output.image);
        Self {
            content,
            is_error: false,
        }
    }

    /// Uniform error payload: `{"error": {"kind": ..., "message": ...}}`.
    pub fn failure(err: &SlidesError) -> Self {
        let payload = serde_json::json!({
            "error": {
                "kind": err.kind(),
                "message": err.to_string(),
            }
        });
        Self {
            content: vec![ToolContent::Text {
                text: payload.to_string(),
            }],
            is_error: true,
        }
    }
}
