use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::FieldMap;
use crate::error::Result;

/// LLM 可调用的 function tool 定义
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FunctionTool {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionSpec,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FunctionSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: ParameterSchema,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ParameterSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(default)]
    pub properties: FieldMap,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl FunctionTool {
    pub fn builder(name: impl Into<String>) -> FunctionToolBuilder {
        FunctionToolBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// 转为 JSON，可直接放入 `tools` / `general_tools` 列表
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self).map_err(anyhow::Error::from)?)
    }
}

#[derive(Clone, Debug)]
pub struct FunctionToolBuilder {
    tool: FunctionTool,
}

impl FunctionToolBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            tool: FunctionTool {
                tool_type: "function".to_string(),
                function: FunctionSpec {
                    name: name.into(),
                    description: None,
                    parameters: ParameterSchema {
                        schema_type: "object".to_string(),
                        properties: FieldMap::new(),
                        required: Vec::new(),
                    },
                },
            },
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.tool.function.description = Some(description.into());
        self
    }

    pub fn param(
        mut self,
        name: impl Into<String>,
        type_name: &str,
        description: impl Into<String>,
    ) -> Self {
        self.tool.function.parameters.properties.insert(
            name.into(),
            json!({"type": type_name, "description": description.into()}),
        );
        self
    }

    pub fn string_param(self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.param(name, "string", description)
    }

    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.tool.function.parameters.required.push(name.into());
        self
    }

    pub fn build(self) -> FunctionTool {
        self.tool
    }
}
