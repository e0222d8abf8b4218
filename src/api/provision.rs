use anyhow::anyhow;

use super::types::{KnowledgeBaseRequest, PhoneCallRequest, PhoneNumberRequest};
use super::{find_agent_by_name, AgentApi};
use crate::config::{AgentConfig, FieldMap, LlmConfig};
use crate::error::{Result, VoiceAgentError};
use crate::prompt::DynamicVariables;

/// 号码创建后立即发起的外呼
#[derive(Debug, Clone, Default)]
pub struct OutboundCall {
    pub to_number: String,
    pub metadata: FieldMap,
    pub dynamic_variables: DynamicVariables,
}

/// 一次完整的开通计划
#[derive(Debug, Clone)]
pub struct ProvisionPlan {
    pub llm: LlmConfig,
    pub agent: AgentConfig,
    /// 在 LLM 之前创建，并加入 LLM 的 `knowledge_base_ids`
    pub knowledge_base: Option<KnowledgeBaseRequest>,
    pub phone_number: Option<PhoneNumberRequest>,
    pub outbound_call: Option<OutboundCall>,
    /// 为 true 时若已存在同名 agent 则直接复用，不再创建 LLM 与 agent
    pub reuse_existing: bool,
}

impl ProvisionPlan {
    pub fn new(llm: LlmConfig, agent: AgentConfig) -> Self {
        Self {
            llm,
            agent,
            knowledge_base: None,
            phone_number: None,
            outbound_call: None,
            reuse_existing: false,
        }
    }

    pub fn with_knowledge_base(mut self, request: KnowledgeBaseRequest) -> Self {
        self.knowledge_base = Some(request);
        self
    }

    pub fn with_phone_number(mut self, request: PhoneNumberRequest) -> Self {
        self.phone_number = Some(request);
        self
    }

    pub fn with_outbound_call(mut self, call: OutboundCall) -> Self {
        self.outbound_call = Some(call);
        self
    }

    pub fn reuse_existing(mut self, reuse: bool) -> Self {
        self.reuse_existing = reuse;
        self
    }
}

/// 开通结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioned {
    pub knowledge_base_id: Option<String>,
    pub llm_id: Option<String>,
    pub agent_id: String,
    pub reused_agent: bool,
    pub phone_number: Option<String>,
    pub call_id: Option<String>,
}

/// 顺序执行开通步骤，任一步失败立即返回
pub struct Provisioner<'a, A: AgentApi + ?Sized> {
    api: &'a A,
}

impl<'a, A: AgentApi + ?Sized> Provisioner<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    pub async fn create_knowledge_base(&self, request: &KnowledgeBaseRequest) -> Result<String> {
        let created = self.api.create_knowledge_base(request).await?;
        tracing::info!(
            knowledge_base_id = %created.knowledge_base_id,
            status = ?created.status,
            "knowledge base created"
        );
        Ok(created.knowledge_base_id)
    }

    pub async fn create_llm(&self, llm: &LlmConfig) -> Result<String> {
        let created = self.api.create_llm(llm).await?;
        let llm_id = created
            .llm_id()
            .ok_or_else(|| anyhow!("create llm response carried no llm_id"))?
            .to_string();
        tracing::info!(llm_id = %llm_id, "llm created");
        Ok(llm_id)
    }

    /// 创建 LLM 并以其为 response engine 创建 agent
    pub async fn create_agent_with_llm(
        &self,
        llm: &LlmConfig,
        agent: AgentConfig,
    ) -> Result<(String, String)> {
        let llm_id = self.create_llm(llm).await?;
        let agent = agent.with_response_engine(LlmConfig::response_engine(&llm_id));
        let created = self.api.create_agent(&agent).await?;
        let agent_id = created
            .agent_id()
            .ok_or_else(|| anyhow!("create agent response carried no agent_id"))?
            .to_string();
        tracing::info!(agent_id = %agent_id, agent_name = %agent.agent_name(), "agent created");
        Ok((llm_id, agent_id))
    }

    pub async fn run(&self, plan: ProvisionPlan) -> Result<Provisioned> {
        if plan.outbound_call.is_some() && plan.phone_number.is_none() {
            return Err(VoiceAgentError::Config(
                "an outbound call needs a phone number to call from".into(),
            ));
        }

        let existing = if plan.reuse_existing {
            find_agent_by_name(self.api, plan.agent.agent_name(), None).await?
        } else {
            None
        };

        let (knowledge_base_id, llm_id, agent_id, reused_agent) =
            match existing.as_ref().and_then(AgentConfig::agent_id) {
                Some(agent_id) => {
                    tracing::info!(agent_id = %agent_id, agent_name = %plan.agent.agent_name(), "reusing existing agent");
                    (None, None, agent_id.to_string(), true)
                }
                None => {
                    let mut llm = plan.llm;
                    let knowledge_base_id = match &plan.knowledge_base {
                        Some(request) => {
                            let id = self.create_knowledge_base(request).await?;
                            llm = llm.with_knowledge_base_id(id.clone());
                            Some(id)
                        }
                        None => None,
                    };
                    let (llm_id, agent_id) = self.create_agent_with_llm(&llm, plan.agent).await?;
                    (knowledge_base_id, Some(llm_id), agent_id, false)
                }
            };

        let mut provisioned = Provisioned {
            knowledge_base_id,
            llm_id,
            agent_id,
            reused_agent,
            phone_number: None,
            call_id: None,
        };

        let Some(request) = plan.phone_number else {
            return Ok(provisioned);
        };
        let number = self
            .api
            .create_phone_number(&request.bound_to(&provisioned.agent_id))
            .await?;
        tracing::info!(phone_number = %number.phone_number, "phone number created");

        if let Some(call) = plan.outbound_call {
            let request = PhoneCallRequest {
                from_number: number.phone_number.clone(),
                to_number: call.to_number,
                override_agent_id: Some(provisioned.agent_id.clone()),
                metadata: call.metadata,
                retell_llm_dynamic_variables: call.dynamic_variables,
            };
            let response = self.api.create_phone_call(&request).await?;
            tracing::info!(call_id = %response.call_id, "outbound call placed");
            provisioned.call_id = Some(response.call_id);
        }

        provisioned.phone_number = Some(number.phone_number);
        Ok(provisioned)
    }
}
