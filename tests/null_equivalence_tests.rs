use serde_json::{json, Value};
use voiceagent::{AgentConfig, ConfigPayload, ConversationFlow, FieldMap, LlmConfig};

const AGENT_FIELDS: &[&str] = &[
    "agent_name",
    "allow_user_dtmf",
    "language",
    "webhook_url",
    "voice_model",
    "voice_temperature",
    "voice_speed",
    "responsiveness",
    "interruption_sensitivity",
    "enable_backchannel",
    "boosted_keywords",
    "end_call_after_silence_ms",
    "max_call_duration_ms",
    "post_call_analysis_data",
    "response_engine",
    "prompt",
    "config",
    "agent_id",
    "is_published",
    "last_modification_timestamp",
    "voice_id",
    "knowledge_base_ids",
];

const FLOW_FIELDS: &[&str] = &[
    "nodes",
    "start_node_id",
    "start_speaker",
    "model_choice",
    "global_prompt",
    "tools",
    "model_temperature",
    "tool_call_strict_mode",
    "default_dynamic_variables",
    "begin_tag_display_position",
    "mcps",
    "conversation_flow_id",
    "version",
    "knowledge_base_ids",
];

const LLM_FIELDS: &[&str] = &[
    "model",
    "model_temperature",
    "general_prompt",
    "begin_message",
    "general_tools",
    "default_dynamic_variables",
    "llm_id",
    "version",
    "is_published",
    "knowledge_base_ids",
];

fn all_null(keys: &[&str]) -> FieldMap {
    keys.iter().map(|key| (key.to_string(), Value::Null)).collect()
}

fn one_null(key: &str) -> FieldMap {
    all_null(&[key])
}

/// 所有字段同时为 null，以及逐个字段为 null，都应等同于未提供
fn assert_null_is_default<C>(keys: &[&str])
where
    C: ConfigPayload + Default + PartialEq + std::fmt::Debug,
{
    assert_eq!(C::from_fields(all_null(keys)).unwrap(), C::default());
    for key in keys {
        let config = C::from_fields(one_null(key)).unwrap();
        assert_eq!(config, C::default(), "null `{key}` changed the config");
        assert_eq!(config.to_payload(), C::default().to_payload());
    }
}

#[test]
fn agent_null_fields_match_defaults() {
    assert_null_is_default::<AgentConfig>(AGENT_FIELDS);
}

#[test]
fn flow_null_fields_match_defaults() {
    assert_null_is_default::<ConversationFlow>(FLOW_FIELDS);
}

#[test]
fn llm_null_fields_match_defaults() {
    assert_null_is_default::<LlmConfig>(LLM_FIELDS);
}

#[test]
fn null_next_to_real_values_is_ignored() {
    let mut with_nulls = all_null(FLOW_FIELDS);
    with_nulls.insert("start_speaker".into(), json!("user"));
    with_nulls.insert("global_prompt".into(), json!("Be brief."));

    let mut plain = FieldMap::new();
    plain.insert("start_speaker".into(), json!("user"));
    plain.insert("global_prompt".into(), json!("Be brief."));

    assert_eq!(
        ConversationFlow::from_fields(with_nulls).unwrap(),
        ConversationFlow::from_fields(plain).unwrap()
    );
}
