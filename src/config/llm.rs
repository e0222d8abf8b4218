use serde_json::Value;

use super::constants::llm::*;
use super::constants::reference::KNOWLEDGE_BASE_IDS;
use super::fields::{FieldMap, FieldReader};
use super::payload::{ConfigPayload, PayloadWriter};
use crate::error::Result;

/// Retell LLM（agent 的 response engine）配置
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    model: String,
    model_temperature: Option<f64>,
    general_prompt: String,
    begin_message: String,
    general_tools: Vec<FieldMap>,
    default_dynamic_variables: FieldMap,
    llm_id: Option<String>,
    version: Option<u64>,
    is_published: Option<bool>,
    knowledge_base_ids: Vec<String>,
    extra: FieldMap,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            model_temperature: None,
            general_prompt: String::new(),
            begin_message: String::new(),
            general_tools: Vec::new(),
            default_dynamic_variables: FieldMap::new(),
            llm_id: None,
            version: None,
            is_published: None,
            knowledge_base_ids: Vec::new(),
            extra: FieldMap::new(),
        }
    }
}

impl LlmConfig {
    pub fn builder() -> LlmConfigBuilder {
        LlmConfigBuilder::new()
    }

    /// agent 引用该 LLM 时使用的 response engine 映射
    pub fn response_engine(llm_id: &str) -> FieldMap {
        let mut engine = FieldMap::new();
        engine.insert("type".to_string(), Value::String(RESPONSE_ENGINE_TYPE.to_string()));
        engine.insert(LLM_ID.to_string(), Value::String(llm_id.to_string()));
        engine
    }

    /// 追加一个知识库引用，已存在时不重复添加
    pub fn with_knowledge_base_id(mut self, knowledge_base_id: impl Into<String>) -> Self {
        let knowledge_base_id = knowledge_base_id.into();
        if !self.knowledge_base_ids.contains(&knowledge_base_id) {
            self.knowledge_base_ids.push(knowledge_base_id);
        }
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn model_temperature(&self) -> Option<f64> {
        self.model_temperature
    }

    pub fn general_prompt(&self) -> &str {
        &self.general_prompt
    }

    pub fn begin_message(&self) -> &str {
        &self.begin_message
    }

    pub fn general_tools(&self) -> &[FieldMap] {
        &self.general_tools
    }

    pub fn default_dynamic_variables(&self) -> &FieldMap {
        &self.default_dynamic_variables
    }

    pub fn llm_id(&self) -> Option<&str> {
        self.llm_id.as_deref()
    }

    pub fn version(&self) -> Option<u64> {
        self.version
    }

    pub fn is_published(&self) -> Option<bool> {
        self.is_published
    }

    pub fn knowledge_base_ids(&self) -> &[String] {
        &self.knowledge_base_ids
    }

    pub fn extra(&self) -> &FieldMap {
        &self.extra
    }
}

impl ConfigPayload for LlmConfig {
    fn from_fields(fields: FieldMap) -> Result<Self> {
        let mut reader = FieldReader::new(fields);
        let mut llm = Self::default();

        if let Some(value) = reader.string(MODEL)? {
            llm.model = value;
        }
        llm.model_temperature = reader.number(MODEL_TEMPERATURE)?;
        if let Some(value) = reader.string(GENERAL_PROMPT)? {
            llm.general_prompt = value;
        }
        if let Some(value) = reader.string(BEGIN_MESSAGE)? {
            llm.begin_message = value;
        }
        if let Some(value) = reader.mapping_list(GENERAL_TOOLS)? {
            llm.general_tools = value;
        }
        if let Some(value) = reader.mapping(DEFAULT_DYNAMIC_VARIABLES)? {
            llm.default_dynamic_variables = value;
        }
        llm.llm_id = reader.string(LLM_ID)?;
        llm.version = reader.integer(VERSION)?;
        llm.is_published = reader.bool(IS_PUBLISHED)?;
        if let Some(value) = reader.string_list(KNOWLEDGE_BASE_IDS)? {
            llm.knowledge_base_ids = value;
        }
        llm.extra = reader.into_extra();
        Ok(llm)
    }

    fn to_payload(&self) -> FieldMap {
        let mut writer = PayloadWriter::new(READ_ONLY_FIELDS);
        writer
            .field(MODEL, self.model.as_str())
            .optional(MODEL_TEMPERATURE, self.model_temperature)
            .field(GENERAL_PROMPT, self.general_prompt.as_str())
            .field(BEGIN_MESSAGE, self.begin_message.as_str())
            .field(GENERAL_TOOLS, self.general_tools.clone())
            .field(DEFAULT_DYNAMIC_VARIABLES, self.default_dynamic_variables.clone())
            .extend(&self.extra)
            .field(KNOWLEDGE_BASE_IDS, self.knowledge_base_ids.clone());
        writer.finish()
    }
}

crate::impl_payload_serialize!(LlmConfig);

/// [`LlmConfig`] 构建器
#[derive(Debug, Clone, Default)]
pub struct LlmConfigBuilder {
    fields: FieldMap,
}

impl LlmConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn model(self, model: impl Into<String>) -> Self {
        self.field(MODEL, Value::String(model.into()))
    }

    pub fn model_temperature(self, temperature: f64) -> Self {
        self.field(MODEL_TEMPERATURE, temperature)
    }

    pub fn general_prompt(self, prompt: impl Into<String>) -> Self {
        self.field(GENERAL_PROMPT, Value::String(prompt.into()))
    }

    pub fn begin_message(self, message: impl Into<String>) -> Self {
        self.field(BEGIN_MESSAGE, Value::String(message.into()))
    }

    pub fn general_tools(self, tools: Vec<Value>) -> Self {
        self.field(GENERAL_TOOLS, tools)
    }

    pub fn default_dynamic_variables(self, variables: FieldMap) -> Self {
        self.field(DEFAULT_DYNAMIC_VARIABLES, variables)
    }

    pub fn knowledge_base_ids<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        self.field(KNOWLEDGE_BASE_IDS, ids)
    }

    pub fn build(self) -> Result<LlmConfig> {
        LlmConfig::from_fields(self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_engine_shape() {
        let engine = LlmConfig::response_engine("llm_123");
        assert_eq!(
            Value::Object(engine),
            json!({"type": "retell-llm", "llm_id": "llm_123"})
        );
    }

    #[test]
    fn test_default_llm_payload() {
        let payload = LlmConfig::default().to_json();
        assert_eq!(payload, json!({"model": "gpt-4o"}));
    }

    #[test]
    fn test_read_only_llm_fields_not_written() {
        let llm = LlmConfig::builder()
            .field("llm_id", "llm_1")
            .field("is_published", true)
            .field("version", 3)
            .general_prompt("Hi {{customer_name}}")
            .build()
            .unwrap();
        assert_eq!(llm.llm_id(), Some("llm_1"));
        let payload = llm.to_payload();
        assert!(!payload.contains_key("llm_id"));
        assert!(!payload.contains_key("is_published"));
        assert!(!payload.contains_key("version"));
        assert_eq!(payload["general_prompt"], json!("Hi {{customer_name}}"));
    }
}
