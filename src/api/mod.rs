//! 语音 agent 平台的调用接口
//!
//! [`AgentApi`] 描述远端 API，[`Provisioner`] 在其上按顺序完成
//! 创建知识库 → 创建 LLM → 创建 agent → 创建号码 → 外呼。HTTP 实现见 `retell` 模块（`retell-client` feature）。

pub mod provision;
#[cfg(feature = "retell-client")]
pub mod retell;
pub mod types;

use async_trait::async_trait;

use crate::config::{AgentConfig, ConversationFlow, LlmConfig};
use crate::error::Result;

pub use provision::{OutboundCall, ProvisionPlan, Provisioned, Provisioner};
#[cfg(feature = "retell-client")]
pub use retell::RetellClient;
pub use types::{
    CallResponse, KnowledgeBase, KnowledgeBaseRequest, KnowledgeBaseSources, KnowledgeBaseText,
    PhoneCallRequest, PhoneNumberRequest, PhoneNumberResponse, WebCallRequest,
};

/// 远端 agent 管理 API
///
/// 读取类接口直接复用配置对象：响应中的只读字段（`agent_id`、`llm_id`、`is_published`）
/// 在构造时被识别，序列化时被排除。
#[async_trait]
pub trait AgentApi: Send + Sync {
    async fn create_llm(&self, llm: &LlmConfig) -> Result<LlmConfig>;

    async fn get_llm(&self, llm_id: &str) -> Result<LlmConfig>;

    async fn update_llm(&self, llm_id: &str, llm: &LlmConfig) -> Result<LlmConfig>;

    async fn delete_llm(&self, llm_id: &str) -> Result<()>;

    async fn create_agent(&self, agent: &AgentConfig) -> Result<AgentConfig>;

    async fn update_agent(&self, agent_id: &str, agent: &AgentConfig) -> Result<AgentConfig>;

    async fn get_agent(&self, agent_id: &str) -> Result<AgentConfig>;

    async fn list_agents(&self) -> Result<Vec<AgentConfig>>;

    async fn delete_agent(&self, agent_id: &str) -> Result<()>;

    /// 某个 agent 的全部历史版本
    async fn list_agent_versions(&self, agent_id: &str) -> Result<Vec<AgentConfig>>;

    async fn create_knowledge_base(&self, request: &KnowledgeBaseRequest) -> Result<KnowledgeBase>;

    async fn get_knowledge_base(&self, knowledge_base_id: &str) -> Result<KnowledgeBase>;

    /// 向已有知识库追加文本或 URL 来源
    async fn update_knowledge_base(
        &self,
        knowledge_base_id: &str,
        sources: &KnowledgeBaseSources,
    ) -> Result<KnowledgeBase>;

    async fn delete_knowledge_base(&self, knowledge_base_id: &str) -> Result<()>;

    async fn create_conversation_flow(&self, flow: &ConversationFlow) -> Result<ConversationFlow>;

    async fn create_phone_number(&self, request: &PhoneNumberRequest) -> Result<PhoneNumberResponse>;

    async fn create_phone_call(&self, request: &PhoneCallRequest) -> Result<CallResponse>;

    async fn create_web_call(&self, request: &WebCallRequest) -> Result<CallResponse>;
}

/// 列出 agent，可按发布状态过滤；缺少发布状态的 agent 在过滤时被跳过
pub async fn list_agents_filtered<A>(api: &A, is_published: Option<bool>) -> Result<Vec<AgentConfig>>
where
    A: AgentApi + ?Sized,
{
    let agents = api.list_agents().await?;
    Ok(match is_published {
        None => agents,
        Some(wanted) => agents
            .into_iter()
            .filter(|agent| agent.is_published() == Some(wanted))
            .collect(),
    })
}

/// 按名称查找第一个匹配的 agent
///
/// 只比较远端实际返回的名称；没有名称的 agent 不会匹配默认名称。
pub async fn find_agent_by_name<A>(
    api: &A,
    agent_name: &str,
    is_published: Option<bool>,
) -> Result<Option<AgentConfig>>
where
    A: AgentApi + ?Sized,
{
    let agents = list_agents_filtered(api, is_published).await?;
    Ok(agents
        .into_iter()
        .find(|agent| agent.supplied_agent_name() == Some(agent_name)))
}
