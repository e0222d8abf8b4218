use serde::{Deserialize, Serialize};

use crate::config::FieldMap;
use crate::prompt::DynamicVariables;

/// 购买号码并绑定 agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhoneNumberRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inbound_agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outbound_agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inbound_webhook_url: Option<String>,
}

impl PhoneNumberRequest {
    /// 呼入、呼出都使用同一个 agent
    pub fn bound_to(mut self, agent_id: &str) -> Self {
        self.inbound_agent_id = Some(agent_id.to_string());
        self.outbound_agent_id = Some(agent_id.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoneNumberResponse {
    pub phone_number: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub inbound_agent_id: Option<String>,
    #[serde(default)]
    pub outbound_agent_id: Option<String>,
}

/// 外呼电话
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhoneCallRequest {
    pub from_number: String,
    pub to_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "FieldMap::is_empty")]
    pub metadata: FieldMap,
    #[serde(default, skip_serializing_if = "DynamicVariables::is_empty")]
    pub retell_llm_dynamic_variables: DynamicVariables,
}

/// 网页通话
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebCallRequest {
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "FieldMap::is_empty")]
    pub metadata: FieldMap,
    #[serde(default, skip_serializing_if = "DynamicVariables::is_empty")]
    pub retell_llm_dynamic_variables: DynamicVariables,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallResponse {
    pub call_id: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub call_status: Option<String>,
}

/// 知识库中的一段纯文本来源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseText {
    pub title: String,
    pub text: String,
}

/// 创建知识库，以 multipart 表单提交
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseRequest {
    pub knowledge_base_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub knowledge_base_texts: Vec<KnowledgeBaseText>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub knowledge_base_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_auto_refresh: Option<bool>,
}

/// 追加到已有知识库的来源
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseSources {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub knowledge_base_texts: Vec<KnowledgeBaseText>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub knowledge_base_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub knowledge_base_id: String,
    #[serde(default)]
    pub knowledge_base_name: Option<String>,
    /// in_progress / complete / error
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub knowledge_base_sources: Vec<serde_json::Value>,
    #[serde(default)]
    pub enable_auto_refresh: Option<bool>,
    #[serde(default)]
    pub last_refreshed_timestamp: Option<u64>,
}
