/// 配置模型相关的常量定义
///
/// 统一管理字段名、默认值和允许列表

/// Agent 字段名常量
pub mod agent {
    pub const AGENT_NAME: &str = "agent_name";
    pub const ALLOW_USER_DTMF: &str = "allow_user_dtmf";
    pub const LANGUAGE: &str = "language";
    pub const WEBHOOK_URL: &str = "webhook_url";
    pub const VOICE_MODEL: &str = "voice_model";
    pub const VOICE_TEMPERATURE: &str = "voice_temperature";
    pub const VOICE_SPEED: &str = "voice_speed";
    pub const RESPONSIVENESS: &str = "responsiveness";
    pub const INTERRUPTION_SENSITIVITY: &str = "interruption_sensitivity";
    pub const ENABLE_BACKCHANNEL: &str = "enable_backchannel";
    pub const BOOSTED_KEYWORDS: &str = "boosted_keywords";
    pub const END_CALL_AFTER_SILENCE_MS: &str = "end_call_after_silence_ms";
    pub const MAX_CALL_DURATION_MS: &str = "max_call_duration_ms";
    pub const POST_CALL_ANALYSIS_DATA: &str = "post_call_analysis_data";
    pub const RESPONSE_ENGINE: &str = "response_engine";
    pub const PROMPT: &str = "prompt";
    pub const CONFIG: &str = "config";

    // 只读字段：创建/更新时 API 会拒绝
    pub const AGENT_ID: &str = "agent_id";
    pub const IS_PUBLISHED: &str = "is_published";
    pub const LAST_MODIFICATION_TIMESTAMP: &str = "last_modification_timestamp";

    pub const DEFAULT_AGENT_NAME: &str = "Ava";
    pub const DEFAULT_ALLOW_USER_DTMF: bool = true;
    pub const DEFAULT_LANGUAGE: &str = "en-US";

    pub const READ_ONLY_FIELDS: &[&str] = &[AGENT_ID, IS_PUBLISHED, LAST_MODIFICATION_TIMESTAMP];
}

/// 引用字段：指向其它远程实体的标识，序列化时排在最后
pub mod reference {
    pub const VOICE_ID: &str = "voice_id";
    pub const KNOWLEDGE_BASE_IDS: &str = "knowledge_base_ids";
}

/// 语音模型
pub mod voice {
    /// 不在允许列表中的值会被重置为该值
    pub const FALLBACK_MODEL: &str = "eleven_turbo_v2";

    pub const ALLOWED_MODELS: &[&str] = &[
        "eleven_turbo_v2",
        "eleven_turbo_v2_5",
        "eleven_flash_v2",
        "eleven_flash_v2_5",
        "eleven_multilingual_v2",
        "tts-1",
        "gpt-4o-mini-tts",
    ];
}

/// Conversation Flow 字段名常量
pub mod flow {
    pub const NODES: &str = "nodes";
    pub const START_NODE_ID: &str = "start_node_id";
    pub const START_SPEAKER: &str = "start_speaker";
    pub const MODEL_CHOICE: &str = "model_choice";
    pub const GLOBAL_PROMPT: &str = "global_prompt";
    pub const TOOLS: &str = "tools";
    pub const MODEL_TEMPERATURE: &str = "model_temperature";
    pub const TOOL_CALL_STRICT_MODE: &str = "tool_call_strict_mode";
    pub const DEFAULT_DYNAMIC_VARIABLES: &str = "default_dynamic_variables";
    pub const BEGIN_TAG_DISPLAY_POSITION: &str = "begin_tag_display_position";
    pub const MCPS: &str = "mcps";

    pub const CONVERSATION_FLOW_ID: &str = "conversation_flow_id";
    pub const VERSION: &str = "version";

    pub const DEFAULT_START_NODE_ID: &str = "start";
    pub const DEFAULT_START_SPEAKER: &str = "agent";
    pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
    pub const DEFAULT_MODEL_TYPE: &str = "cascading";

    pub const NODE_TYPE_CONVERSATION: &str = "conversation";
    pub const INSTRUCTION_TYPE_PROMPT: &str = "prompt";

    pub const READ_ONLY_FIELDS: &[&str] = &[CONVERSATION_FLOW_ID, VERSION];
}

/// Retell LLM（response engine）字段名常量
pub mod llm {
    pub const MODEL: &str = "model";
    pub const MODEL_TEMPERATURE: &str = "model_temperature";
    pub const GENERAL_PROMPT: &str = "general_prompt";
    pub const BEGIN_MESSAGE: &str = "begin_message";
    pub const GENERAL_TOOLS: &str = "general_tools";
    pub const DEFAULT_DYNAMIC_VARIABLES: &str = "default_dynamic_variables";

    pub const LLM_ID: &str = "llm_id";
    pub const VERSION: &str = "version";
    pub const IS_PUBLISHED: &str = "is_published";

    pub const DEFAULT_MODEL: &str = "gpt-4o";
    pub const RESPONSE_ENGINE_TYPE: &str = "retell-llm";

    pub const READ_ONLY_FIELDS: &[&str] = &[LLM_ID, VERSION, IS_PUBLISHED];
}
