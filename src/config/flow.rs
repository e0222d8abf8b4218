use std::collections::HashSet;

use serde_json::{json, Value};

use super::constants::flow::*;
use super::constants::reference::KNOWLEDGE_BASE_IDS;
use super::fields::{FieldMap, FieldReader};
use super::payload::{ConfigPayload, PayloadWriter};
use crate::error::{Result, VoiceAgentError};
use crate::utils::validation::ConfigValidator;

fn default_model_choice() -> FieldMap {
    let mut choice = FieldMap::new();
    choice.insert("model".to_string(), Value::String(DEFAULT_MODEL.to_string()));
    choice.insert("type".to_string(), Value::String(DEFAULT_MODEL_TYPE.to_string()));
    choice
}

/// 单个 conversation 节点，指令为纯 prompt 文本
pub fn conversation_node(id: impl Into<String>, prompt: impl Into<String>) -> FieldMap {
    let mut instruction = FieldMap::new();
    instruction.insert("text".to_string(), Value::String(prompt.into()));
    instruction.insert("type".to_string(), Value::String(INSTRUCTION_TYPE_PROMPT.to_string()));

    let mut node = FieldMap::new();
    node.insert("id".to_string(), Value::String(id.into()));
    node.insert("instruction".to_string(), Value::Object(instruction));
    node.insert("type".to_string(), Value::String(NODE_TYPE_CONVERSATION.to_string()));
    node
}

/// 图结构的对话流程配置
///
/// `nodes` 与 `tools` 的每个元素必须是 mapping，否则构造时返回 `InvalidFieldShape`。
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationFlow {
    nodes: Vec<FieldMap>,
    start_node_id: String,
    start_speaker: String,
    model_choice: FieldMap,
    global_prompt: Option<String>,
    tools: Vec<FieldMap>,
    model_temperature: Option<f64>,
    tool_call_strict_mode: Option<bool>,
    default_dynamic_variables: FieldMap,
    begin_tag_display_position: FieldMap,
    mcps: Vec<FieldMap>,
    conversation_flow_id: Option<String>,
    version: Option<u64>,
    knowledge_base_ids: Vec<String>,
    extra: FieldMap,
}

impl Default for ConversationFlow {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            start_node_id: DEFAULT_START_NODE_ID.to_string(),
            start_speaker: DEFAULT_START_SPEAKER.to_string(),
            model_choice: default_model_choice(),
            global_prompt: None,
            tools: Vec::new(),
            model_temperature: None,
            tool_call_strict_mode: None,
            default_dynamic_variables: FieldMap::new(),
            begin_tag_display_position: FieldMap::new(),
            mcps: Vec::new(),
            conversation_flow_id: None,
            version: None,
            knowledge_base_ids: Vec::new(),
            extra: FieldMap::new(),
        }
    }
}

impl ConversationFlow {
    pub fn builder() -> ConversationFlowBuilder {
        ConversationFlowBuilder::new()
    }

    /// 由单个 prompt 构建只有一个 conversation 节点的流程
    ///
    /// `overrides` 中的 `model_choice`、`start_speaker` 优先于内置默认值，
    /// `start_node_id` 同时决定节点 ID，其余字段按普通构造处理。
    pub fn single_prompt_flow(
        prompt: impl Into<String>,
        tools: Option<Vec<Value>>,
        mut overrides: FieldMap,
    ) -> Result<Self> {
        let node_id = match overrides.get(START_NODE_ID) {
            Some(Value::String(id)) => id.clone(),
            _ => DEFAULT_START_NODE_ID.to_string(),
        };
        let node = conversation_node(node_id, prompt);

        if overrides.contains_key(NODES) {
            tracing::debug!("single prompt flow replaces caller supplied nodes");
        }
        overrides.insert(NODES.to_string(), Value::Array(vec![Value::Object(node)]));
        if let Some(tools) = tools {
            overrides.insert(TOOLS.to_string(), Value::Array(tools));
        }

        Self::from_fields(overrides)
    }

    pub fn nodes(&self) -> &[FieldMap] {
        &self.nodes
    }

    pub fn start_node_id(&self) -> &str {
        &self.start_node_id
    }

    pub fn start_speaker(&self) -> &str {
        &self.start_speaker
    }

    pub fn model_choice(&self) -> &FieldMap {
        &self.model_choice
    }

    pub fn global_prompt(&self) -> Option<&str> {
        self.global_prompt.as_deref()
    }

    pub fn tools(&self) -> &[FieldMap] {
        &self.tools
    }

    pub fn conversation_flow_id(&self) -> Option<&str> {
        self.conversation_flow_id.as_deref()
    }

    pub fn version(&self) -> Option<u64> {
        self.version
    }

    pub fn knowledge_base_ids(&self) -> &[String] {
        &self.knowledge_base_ids
    }

    pub fn extra(&self) -> &FieldMap {
        &self.extra
    }

    /// 根据 ID 获取节点
    pub fn get_node(&self, node_id: &str) -> Option<&FieldMap> {
        self.nodes
            .iter()
            .find(|node| node.get("id").and_then(Value::as_str) == Some(node_id))
    }

    /// 验证图结构的完整性
    ///
    /// 构造过程保持宽松，该检查需显式调用。
    pub fn validate_graph(&self) -> Result<()> {
        let mut node_ids = HashSet::new();
        for (index, node) in self.nodes.iter().enumerate() {
            let id = node.get("id").and_then(Value::as_str).ok_or_else(|| {
                VoiceAgentError::invalid_shape(format!("{NODES}[{index}].id"), "a string")
            })?;
            ConfigValidator::validate_node_id(id)?;
            if !node_ids.insert(id) {
                return Err(VoiceAgentError::DuplicateNode(id.to_string()));
            }
        }

        if !self.nodes.is_empty() && !node_ids.contains(self.start_node_id.as_str()) {
            return Err(VoiceAgentError::UnknownNode(self.start_node_id.clone()));
        }
        if let Some(temperature) = self.model_temperature {
            ConfigValidator::validate_temperature(temperature)?;
        }

        Ok(())
    }
}

impl ConfigPayload for ConversationFlow {
    fn from_fields(fields: FieldMap) -> Result<Self> {
        let mut reader = FieldReader::new(fields);
        let mut flow = Self::default();

        if let Some(value) = reader.mapping_list(NODES)? {
            flow.nodes = value;
        }
        if let Some(value) = reader.string(START_NODE_ID)? {
            flow.start_node_id = value;
        }
        if let Some(value) = reader.string(START_SPEAKER)? {
            flow.start_speaker = value;
        }
        if let Some(value) = reader.mapping(MODEL_CHOICE)? {
            flow.model_choice = value;
        }
        flow.global_prompt = reader.string(GLOBAL_PROMPT)?;
        if let Some(value) = reader.mapping_list(TOOLS)? {
            flow.tools = value;
        }
        flow.model_temperature = reader.number(MODEL_TEMPERATURE)?;
        flow.tool_call_strict_mode = reader.bool(TOOL_CALL_STRICT_MODE)?;
        if let Some(value) = reader.mapping(DEFAULT_DYNAMIC_VARIABLES)? {
            flow.default_dynamic_variables = value;
        }
        if let Some(value) = reader.mapping(BEGIN_TAG_DISPLAY_POSITION)? {
            flow.begin_tag_display_position = value;
        }
        if let Some(value) = reader.mapping_list(MCPS)? {
            flow.mcps = value;
        }
        flow.conversation_flow_id = reader.string(CONVERSATION_FLOW_ID)?;
        flow.version = reader.integer(VERSION)?;
        if let Some(value) = reader.string_list(KNOWLEDGE_BASE_IDS)? {
            flow.knowledge_base_ids = value;
        }
        flow.extra = reader.into_extra();

        tracing::debug!(
            nodes = flow.nodes.len(),
            tools = flow.tools.len(),
            start_node_id = %flow.start_node_id,
            "conversation flow constructed"
        );
        Ok(flow)
    }

    fn to_payload(&self) -> FieldMap {
        let mut writer = PayloadWriter::new(READ_ONLY_FIELDS);
        writer
            .field(NODES, self.nodes.clone())
            .field(START_NODE_ID, self.start_node_id.as_str())
            .field(START_SPEAKER, self.start_speaker.as_str())
            .field(MODEL_CHOICE, self.model_choice.clone())
            .optional(GLOBAL_PROMPT, self.global_prompt.as_deref())
            .field(TOOLS, self.tools.clone())
            .optional(MODEL_TEMPERATURE, self.model_temperature)
            .optional(TOOL_CALL_STRICT_MODE, self.tool_call_strict_mode)
            .field(DEFAULT_DYNAMIC_VARIABLES, self.default_dynamic_variables.clone())
            .field(BEGIN_TAG_DISPLAY_POSITION, self.begin_tag_display_position.clone())
            .field(MCPS, self.mcps.clone())
            .extend(&self.extra)
            .field(KNOWLEDGE_BASE_IDS, self.knowledge_base_ids.clone());
        writer.finish()
    }
}

crate::impl_payload_serialize!(ConversationFlow);

/// [`ConversationFlow`] 构建器
#[derive(Debug, Clone, Default)]
pub struct ConversationFlowBuilder {
    fields: FieldMap,
}

impl ConversationFlowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn node(mut self, node: FieldMap) -> Self {
        let nodes = self
            .fields
            .entry(NODES.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = nodes {
            items.push(Value::Object(node));
        }
        self
    }

    pub fn start_node_id(self, id: impl Into<String>) -> Self {
        self.field(START_NODE_ID, Value::String(id.into()))
    }

    pub fn start_speaker(self, speaker: impl Into<String>) -> Self {
        self.field(START_SPEAKER, Value::String(speaker.into()))
    }

    pub fn model_choice(self, model: impl Into<String>, model_type: impl Into<String>) -> Self {
        self.field(MODEL_CHOICE, json!({"model": model.into(), "type": model_type.into()}))
    }

    pub fn global_prompt(self, prompt: impl Into<String>) -> Self {
        self.field(GLOBAL_PROMPT, Value::String(prompt.into()))
    }

    pub fn tools(self, tools: Vec<Value>) -> Self {
        self.field(TOOLS, tools)
    }

    pub fn model_temperature(self, temperature: f64) -> Self {
        self.field(MODEL_TEMPERATURE, temperature)
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

    pub fn build(self) -> Result<ConversationFlow> {
        ConversationFlow::from_fields(self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_node_shape() {
        let node = conversation_node("start", "Hello");
        assert_eq!(
            Value::Object(node),
            json!({
                "id": "start",
                "instruction": {"text": "Hello", "type": "prompt"},
                "type": "conversation"
            })
        );
    }

    #[test]
    fn test_builder_appends_nodes_in_order() {
        let flow = ConversationFlow::builder()
            .node(conversation_node("start", "Hi"))
            .node(conversation_node("follow_up", "Anything else?"))
            .build()
            .unwrap();
        assert_eq!(flow.nodes().len(), 2);
        assert!(flow.get_node("follow_up").is_some());
        assert!(flow.validate_graph().is_ok());
    }

    #[test]
    fn test_validate_graph_rejects_duplicates() {
        let flow = ConversationFlow::builder()
            .node(conversation_node("start", "a"))
            .node(conversation_node("start", "b"))
            .build()
            .unwrap();
        assert!(matches!(
            flow.validate_graph(),
            Err(VoiceAgentError::DuplicateNode(id)) if id == "start"
        ));
    }

    #[test]
    fn test_validate_graph_rejects_unknown_start() {
        let flow = ConversationFlow::builder()
            .node(conversation_node("greeting", "a"))
            .build()
            .unwrap();
        assert!(matches!(
            flow.validate_graph(),
            Err(VoiceAgentError::UnknownNode(id)) if id == "start"
        ));
    }

    #[test]
    fn test_empty_flow_is_valid_graph() {
        assert!(ConversationFlow::default().validate_graph().is_ok());
    }
}
