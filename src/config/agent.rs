use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde_json::Value;

use super::constants::agent::*;
use super::constants::reference::{KNOWLEDGE_BASE_IDS, VOICE_ID};
use super::constants::voice;
use super::fields::{FieldMap, FieldReader};
use super::payload::{ConfigPayload, PayloadWriter};
use crate::error::{Result, VoiceAgentError};

static ALLOWED_VOICE_MODELS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| voice::ALLOWED_MODELS.iter().copied().collect());

/// 语音模型是否在允许列表中
pub fn is_allowed_voice_model(model: &str) -> bool {
    ALLOWED_VOICE_MODELS.contains(model)
}

/// 不在允许列表中的取值（包括非字符串）一律回退为默认模型，只记录警告
fn coerce_voice_model(value: Value) -> String {
    match value {
        Value::String(model) if is_allowed_voice_model(&model) => model,
        other => {
            tracing::warn!(
                requested = %other,
                fallback = voice::FALLBACK_MODEL,
                "voice model not in allow-list, falling back"
            );
            voice::FALLBACK_MODEL.to_string()
        }
    }
}

/// 远端托管的语音 Agent 配置
///
/// 不可变值对象：通过 [`AgentConfig::builder`] 或 [`ConfigPayload::from_fields`] 构造，
/// 通过 [`ConfigPayload::to_payload`] 生成 create/update 请求体。
///
/// - `prompt` 序列化时放入 `config` 子映射
/// - `voice_id`、`knowledge_base_ids` 为引用字段，排在最后
/// - `agent_id`、`is_published`、`last_modification_timestamp` 只在读取时有意义，从不写出
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// 未提供时为 `None`，序列化时使用默认名称
    agent_name: Option<String>,
    allow_user_dtmf: bool,
    language: String,
    webhook_url: String,
    voice_model: String,
    voice_temperature: Option<f64>,
    voice_speed: Option<f64>,
    responsiveness: Option<f64>,
    interruption_sensitivity: Option<f64>,
    enable_backchannel: Option<bool>,
    boosted_keywords: Vec<String>,
    end_call_after_silence_ms: Option<u64>,
    max_call_duration_ms: Option<u64>,
    post_call_analysis_data: Vec<FieldMap>,
    response_engine: FieldMap,
    prompt: String,
    /// `config` 子映射中除 prompt 以外的字段
    config_extra: FieldMap,
    agent_id: Option<String>,
    is_published: Option<bool>,
    last_modification_timestamp: Option<u64>,
    voice_id: Option<String>,
    knowledge_base_ids: Vec<String>,
    extra: FieldMap,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent_name: None,
            allow_user_dtmf: DEFAULT_ALLOW_USER_DTMF,
            language: DEFAULT_LANGUAGE.to_string(),
            webhook_url: String::new(),
            voice_model: voice::FALLBACK_MODEL.to_string(),
            voice_temperature: None,
            voice_speed: None,
            responsiveness: None,
            interruption_sensitivity: None,
            enable_backchannel: None,
            boosted_keywords: Vec::new(),
            end_call_after_silence_ms: None,
            max_call_duration_ms: None,
            post_call_analysis_data: Vec::new(),
            response_engine: FieldMap::new(),
            prompt: String::new(),
            config_extra: FieldMap::new(),
            agent_id: None,
            is_published: None,
            last_modification_timestamp: None,
            voice_id: None,
            knowledge_base_ids: Vec::new(),
            extra: FieldMap::new(),
        }
    }
}

impl AgentConfig {
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::new()
    }

    /// 替换 response engine，通常在 LLM 创建后调用
    pub fn with_response_engine(mut self, response_engine: FieldMap) -> Self {
        self.response_engine = response_engine;
        self
    }

    pub fn with_voice_id(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = Some(voice_id.into());
        self
    }

    /// 生效的名称；未提供时为默认名称
    pub fn agent_name(&self) -> &str {
        self.agent_name.as_deref().unwrap_or(DEFAULT_AGENT_NAME)
    }

    /// 调用方或远端响应实际给出的名称
    pub fn supplied_agent_name(&self) -> Option<&str> {
        self.agent_name.as_deref()
    }

    pub fn allow_user_dtmf(&self) -> bool {
        self.allow_user_dtmf
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    pub fn voice_model(&self) -> &str {
        &self.voice_model
    }

    pub fn voice_temperature(&self) -> Option<f64> {
        self.voice_temperature
    }

    pub fn boosted_keywords(&self) -> &[String] {
        &self.boosted_keywords
    }

    pub fn post_call_analysis_data(&self) -> &[FieldMap] {
        &self.post_call_analysis_data
    }

    pub fn response_engine(&self) -> &FieldMap {
        &self.response_engine
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn agent_id(&self) -> Option<&str> {
        self.agent_id.as_deref()
    }

    pub fn is_published(&self) -> Option<bool> {
        self.is_published
    }

    pub fn last_modification_timestamp(&self) -> Option<u64> {
        self.last_modification_timestamp
    }

    pub fn voice_id(&self) -> Option<&str> {
        self.voice_id.as_deref()
    }

    pub fn knowledge_base_ids(&self) -> &[String] {
        &self.knowledge_base_ids
    }

    pub fn extra(&self) -> &FieldMap {
        &self.extra
    }

    fn read_config_group(&mut self, mut config: FieldMap) -> Result<()> {
        match config.shift_remove(PROMPT) {
            None | Some(Value::Null) => {}
            Some(Value::String(prompt)) => self.prompt = prompt,
            Some(_) => {
                return Err(VoiceAgentError::invalid_shape(
                    format!("{CONFIG}.{PROMPT}"),
                    "a string",
                ))
            }
        }
        self.config_extra = config;
        Ok(())
    }
}

impl ConfigPayload for AgentConfig {
    fn from_fields(fields: FieldMap) -> Result<Self> {
        let mut reader = FieldReader::new(fields);
        let mut agent = Self::default();

        agent.agent_name = reader.string(AGENT_NAME)?;
        if let Some(value) = reader.bool(ALLOW_USER_DTMF)? {
            agent.allow_user_dtmf = value;
        }
        if let Some(value) = reader.string(LANGUAGE)? {
            agent.language = value;
        }
        if let Some(value) = reader.string(WEBHOOK_URL)? {
            agent.webhook_url = value;
        }
        if let Some(value) = reader.value(VOICE_MODEL) {
            agent.voice_model = coerce_voice_model(value);
        }
        agent.voice_temperature = reader.number(VOICE_TEMPERATURE)?;
        agent.voice_speed = reader.number(VOICE_SPEED)?;
        agent.responsiveness = reader.number(RESPONSIVENESS)?;
        agent.interruption_sensitivity = reader.number(INTERRUPTION_SENSITIVITY)?;
        agent.enable_backchannel = reader.bool(ENABLE_BACKCHANNEL)?;
        if let Some(value) = reader.string_list(BOOSTED_KEYWORDS)? {
            agent.boosted_keywords = value;
        }
        agent.end_call_after_silence_ms = reader.integer(END_CALL_AFTER_SILENCE_MS)?;
        agent.max_call_duration_ms = reader.integer(MAX_CALL_DURATION_MS)?;
        if let Some(value) = reader.mapping_list(POST_CALL_ANALYSIS_DATA)? {
            agent.post_call_analysis_data = value;
        }
        if let Some(value) = reader.mapping(RESPONSE_ENGINE)? {
            agent.response_engine = value;
        }
        if let Some(config) = reader.mapping(CONFIG)? {
            agent.read_config_group(config)?;
        }
        // 顶层 prompt 优先于 config.prompt
        if let Some(value) = reader.string(PROMPT)? {
            agent.prompt = value;
        }
        agent.agent_id = reader.string(AGENT_ID)?;
        agent.is_published = reader.bool(IS_PUBLISHED)?;
        agent.last_modification_timestamp = reader.integer(LAST_MODIFICATION_TIMESTAMP)?;
        agent.voice_id = reader.string(VOICE_ID)?;
        if let Some(value) = reader.string_list(KNOWLEDGE_BASE_IDS)? {
            agent.knowledge_base_ids = value;
        }
        agent.extra = reader.into_extra();

        tracing::debug!(
            agent_name = %agent.agent_name(),
            extra_fields = agent.extra.len(),
            "agent config constructed"
        );
        Ok(agent)
    }

    fn to_payload(&self) -> FieldMap {
        let mut writer = PayloadWriter::new(READ_ONLY_FIELDS);
        writer
            .field(AGENT_NAME, self.agent_name())
            .field(ALLOW_USER_DTMF, self.allow_user_dtmf)
            .field(LANGUAGE, self.language.as_str())
            .field(WEBHOOK_URL, self.webhook_url.as_str())
            .field(VOICE_MODEL, self.voice_model.as_str())
            .optional(VOICE_TEMPERATURE, self.voice_temperature)
            .optional(VOICE_SPEED, self.voice_speed)
            .optional(RESPONSIVENESS, self.responsiveness)
            .optional(INTERRUPTION_SENSITIVITY, self.interruption_sensitivity)
            .optional(ENABLE_BACKCHANNEL, self.enable_backchannel)
            .field(BOOSTED_KEYWORDS, self.boosted_keywords.clone())
            .optional(END_CALL_AFTER_SILENCE_MS, self.end_call_after_silence_ms)
            .optional(MAX_CALL_DURATION_MS, self.max_call_duration_ms)
            .field(POST_CALL_ANALYSIS_DATA, self.post_call_analysis_data.clone())
            .field(RESPONSE_ENGINE, self.response_engine.clone());

        let mut config = self.config_extra.clone();
        if !self.prompt.is_empty() {
            config.insert(PROMPT.to_string(), Value::String(self.prompt.clone()));
        }
        writer.field(CONFIG, config);

        writer.extend(&self.extra);

        writer
            .optional(VOICE_ID, self.voice_id.as_deref())
            .field(KNOWLEDGE_BASE_IDS, self.knowledge_base_ids.clone());
        writer.finish()
    }
}

crate::impl_payload_serialize!(AgentConfig);

/// [`AgentConfig`] 构建器
///
/// 所有 setter 最终都汇入 `from_fields`，默认值与校验规则只有一处实现。
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    fields: FieldMap,
}

impl AgentConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置任意字段；固定 schema 以外的字段作为 extra 透传
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn agent_name(self, name: impl Into<String>) -> Self {
        self.field(AGENT_NAME, Value::String(name.into()))
    }

    pub fn allow_user_dtmf(self, allow: bool) -> Self {
        self.field(ALLOW_USER_DTMF, allow)
    }

    pub fn language(self, language: impl Into<String>) -> Self {
        self.field(LANGUAGE, Value::String(language.into()))
    }

    pub fn webhook_url(self, url: impl Into<String>) -> Self {
        self.field(WEBHOOK_URL, Value::String(url.into()))
    }

    pub fn voice_model(self, model: impl Into<String>) -> Self {
        self.field(VOICE_MODEL, Value::String(model.into()))
    }

    pub fn voice_temperature(self, temperature: f64) -> Self {
        self.field(VOICE_TEMPERATURE, temperature)
    }

    pub fn voice_speed(self, speed: f64) -> Self {
        self.field(VOICE_SPEED, speed)
    }

    pub fn responsiveness(self, responsiveness: f64) -> Self {
        self.field(RESPONSIVENESS, responsiveness)
    }

    pub fn interruption_sensitivity(self, sensitivity: f64) -> Self {
        self.field(INTERRUPTION_SENSITIVITY, sensitivity)
    }

    pub fn enable_backchannel(self, enable: bool) -> Self {
        self.field(ENABLE_BACKCHANNEL, enable)
    }

    pub fn boosted_keywords<I, S>(self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords: Vec<String> = keywords.into_iter().map(Into::into).collect();
        self.field(BOOSTED_KEYWORDS, keywords)
    }

    pub fn end_call_after_silence_ms(self, ms: u64) -> Self {
        self.field(END_CALL_AFTER_SILENCE_MS, ms)
    }

    pub fn max_call_duration_ms(self, ms: u64) -> Self {
        self.field(MAX_CALL_DURATION_MS, ms)
    }

    pub fn post_call_analysis_data(self, items: Vec<Value>) -> Self {
        self.field(POST_CALL_ANALYSIS_DATA, items)
    }

    pub fn response_engine(self, engine: FieldMap) -> Self {
        self.field(RESPONSE_ENGINE, engine)
    }

    pub fn prompt(self, prompt: impl Into<String>) -> Self {
        self.field(PROMPT, Value::String(prompt.into()))
    }

    pub fn voice_id(self, voice_id: impl Into<String>) -> Self {
        self.field(VOICE_ID, Value::String(voice_id.into()))
    }

    pub fn knowledge_base_ids<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        self.field(KNOWLEDGE_BASE_IDS, ids)
    }

    pub fn build(self) -> Result<AgentConfig> {
        AgentConfig::from_fields(self.fields)
    }
}
