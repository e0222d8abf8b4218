use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use super::types::{
    CallResponse, KnowledgeBase, KnowledgeBaseRequest, KnowledgeBaseSources, KnowledgeBaseText,
    PhoneCallRequest, PhoneNumberRequest, PhoneNumberResponse, WebCallRequest,
};
use super::AgentApi;
use crate::config::env::DEFAULT_BASE_URL;
use crate::config::{AgentConfig, ConfigPayload, ConversationFlow, FieldMap, LlmConfig, Settings};
use crate::error::{Result, VoiceAgentError};

/// 各接口路径
pub mod endpoints {
    pub const CREATE_LLM: &str = "/create-retell-llm";
    pub const GET_LLM: &str = "/get-retell-llm/{llm_id}";
    pub const UPDATE_LLM: &str = "/update-retell-llm/{llm_id}";
    pub const DELETE_LLM: &str = "/delete-retell-llm/{llm_id}";
    pub const CREATE_AGENT: &str = "/create-agent";
    pub const UPDATE_AGENT: &str = "/update-agent/{agent_id}";
    pub const GET_AGENT: &str = "/get-agent/{agent_id}";
    pub const LIST_AGENTS: &str = "/list-agents";
    pub const DELETE_AGENT: &str = "/delete-agent/{agent_id}";
    pub const LIST_AGENT_VERSIONS: &str = "/get-agent-versions/{agent_id}";
    pub const CREATE_KNOWLEDGE_BASE: &str = "/create-knowledge-base";
    pub const GET_KNOWLEDGE_BASE: &str = "/get-knowledge-base/{knowledge_base_id}";
    pub const ADD_KNOWLEDGE_BASE_SOURCES: &str = "/add-knowledge-base-sources/{knowledge_base_id}";
    pub const DELETE_KNOWLEDGE_BASE: &str = "/delete-knowledge-base/{knowledge_base_id}";
    pub const CREATE_CONVERSATION_FLOW: &str = "/create-conversation-flow";
    pub const CREATE_PHONE_NUMBER: &str = "/create-phone-number";
    pub const CREATE_PHONE_CALL: &str = "/v2/create-phone-call";
    pub const CREATE_WEB_CALL: &str = "/v2/create-web-call";
}

/// 基于 reqwest 的 [`AgentApi`] 实现
#[derive(Clone)]
pub struct RetellClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RetellClient {
    /// 创建 HTTP 客户端
    ///
    /// - 连接池：复用连接
    /// - 超时设置：避免长时间等待
    fn create_http_client() -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| VoiceAgentError::Other(anyhow!("failed to build http client: {}", e)))
    }

    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let base_url: String = base_url.into();
        Ok(Self {
            client: Self::create_http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::with_base_url(settings.api_key.clone(), settings.base_url.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request<B: Serialize + ?Sized>(&self, method: Method, path: &str, body: Option<&B>) -> RequestBuilder {
        let builder = self
            .client
            .request(method, self.url(path))
            .bearer_auth(&self.api_key);
        match body {
            Some(body) => builder.json(body),
            None => builder,
        }
    }

    async fn check(&self, builder: RequestBuilder, endpoint: &str) -> Result<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| VoiceAgentError::Other(anyhow!("HTTP request error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(endpoint = %endpoint, status = status.as_u16(), "api request rejected");
            return Err(VoiceAgentError::Api {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder, endpoint: &str) -> Result<T> {
        self.check(builder, endpoint)
            .await?
            .json::<T>()
            .await
            .map_err(|e| VoiceAgentError::Other(anyhow!("Response parse error: {}", e)))
    }

    /// 删除类接口只关心状态码
    async fn send_empty(&self, builder: RequestBuilder, endpoint: &str) -> Result<()> {
        self.check(builder, endpoint).await.map(|_| ())
    }

    async fn send_config<C: ConfigPayload>(&self, builder: RequestBuilder, endpoint: &str) -> Result<C> {
        let value: Value = self.send(builder, endpoint).await?;
        match value {
            Value::Object(fields) => C::from_fields(fields),
            _ => Err(VoiceAgentError::Other(anyhow!(
                "expected a JSON object from `{endpoint}`"
            ))),
        }
    }
}

/// 知识库接口要求 multipart 表单，列表字段以 JSON 字符串提交
fn knowledge_base_form(
    name: Option<&str>,
    texts: &[KnowledgeBaseText],
    urls: &[String],
    enable_auto_refresh: Option<bool>,
) -> Result<Form> {
    let mut form = Form::new();
    if let Some(name) = name {
        form = form.text("knowledge_base_name", name.to_string());
    }
    if !texts.is_empty() {
        let texts = serde_json::to_string(texts).map_err(anyhow::Error::from)?;
        form = form.text("knowledge_base_texts", texts);
    }
    if !urls.is_empty() {
        let urls = serde_json::to_string(urls).map_err(anyhow::Error::from)?;
        form = form.text("knowledge_base_urls", urls);
    }
    if let Some(enable) = enable_auto_refresh {
        form = form.text("enable_auto_refresh", enable.to_string());
    }
    Ok(form)
}

#[async_trait]
impl AgentApi for RetellClient {
    #[instrument(skip(self, llm))]
    async fn create_llm(&self, llm: &LlmConfig) -> Result<LlmConfig> {
        let builder = self.request(Method::POST, endpoints::CREATE_LLM, Some(&llm.to_payload()));
        self.send_config(builder, endpoints::CREATE_LLM).await
    }

    #[instrument(skip(self))]
    async fn get_llm(&self, llm_id: &str) -> Result<LlmConfig> {
        let path = endpoints::GET_LLM.replace("{llm_id}", llm_id);
        let builder = self.request::<Value>(Method::GET, &path, None);
        self.send_config(builder, endpoints::GET_LLM).await
    }

    #[instrument(skip(self, llm))]
    async fn update_llm(&self, llm_id: &str, llm: &LlmConfig) -> Result<LlmConfig> {
        let path = endpoints::UPDATE_LLM.replace("{llm_id}", llm_id);
        let builder = self.request(Method::PATCH, &path, Some(&llm.to_payload()));
        self.send_config(builder, endpoints::UPDATE_LLM).await
    }

    #[instrument(skip(self))]
    async fn delete_llm(&self, llm_id: &str) -> Result<()> {
        let path = endpoints::DELETE_LLM.replace("{llm_id}", llm_id);
        let builder = self.request::<Value>(Method::DELETE, &path, None);
        self.send_empty(builder, endpoints::DELETE_LLM).await
    }

    #[instrument(skip(self, agent), fields(agent_name = %agent.agent_name()))]
    async fn create_agent(&self, agent: &AgentConfig) -> Result<AgentConfig> {
        let builder = self.request(Method::POST, endpoints::CREATE_AGENT, Some(&agent.to_payload()));
        self.send_config(builder, endpoints::CREATE_AGENT).await
    }

    #[instrument(skip(self, agent))]
    async fn update_agent(&self, agent_id: &str, agent: &AgentConfig) -> Result<AgentConfig> {
        let path = endpoints::UPDATE_AGENT.replace("{agent_id}", agent_id);
        let builder = self.request(Method::PATCH, &path, Some(&agent.to_payload()));
        self.send_config(builder, endpoints::UPDATE_AGENT).await
    }

    #[instrument(skip(self))]
    async fn get_agent(&self, agent_id: &str) -> Result<AgentConfig> {
        let path = endpoints::GET_AGENT.replace("{agent_id}", agent_id);
        let builder = self.request::<Value>(Method::GET, &path, None);
        self.send_config(builder, endpoints::GET_AGENT).await
    }

    #[instrument(skip(self))]
    async fn list_agents(&self) -> Result<Vec<AgentConfig>> {
        let builder = self.request::<Value>(Method::GET, endpoints::LIST_AGENTS, None);
        let agents: Vec<FieldMap> = self.send(builder, endpoints::LIST_AGENTS).await?;
        agents.into_iter().map(AgentConfig::from_fields).collect()
    }

    #[instrument(skip(self))]
    async fn delete_agent(&self, agent_id: &str) -> Result<()> {
        let path = endpoints::DELETE_AGENT.replace("{agent_id}", agent_id);
        let builder = self.request::<Value>(Method::DELETE, &path, None);
        self.send_empty(builder, endpoints::DELETE_AGENT).await
    }

    #[instrument(skip(self))]
    async fn list_agent_versions(&self, agent_id: &str) -> Result<Vec<AgentConfig>> {
        let path = endpoints::LIST_AGENT_VERSIONS.replace("{agent_id}", agent_id);
        let builder = self.request::<Value>(Method::GET, &path, None);
        let versions: Vec<FieldMap> = self.send(builder, endpoints::LIST_AGENT_VERSIONS).await?;
        versions.into_iter().map(AgentConfig::from_fields).collect()
    }

    #[instrument(skip(self, request), fields(name = %request.knowledge_base_name))]
    async fn create_knowledge_base(&self, request: &KnowledgeBaseRequest) -> Result<KnowledgeBase> {
        let form = knowledge_base_form(
            Some(&request.knowledge_base_name),
            &request.knowledge_base_texts,
            &request.knowledge_base_urls,
            request.enable_auto_refresh,
        )?;
        let builder = self
            .request::<Value>(Method::POST, endpoints::CREATE_KNOWLEDGE_BASE, None)
            .multipart(form);
        self.send(builder, endpoints::CREATE_KNOWLEDGE_BASE).await
    }

    #[instrument(skip(self))]
    async fn get_knowledge_base(&self, knowledge_base_id: &str) -> Result<KnowledgeBase> {
        let path = endpoints::GET_KNOWLEDGE_BASE.replace("{knowledge_base_id}", knowledge_base_id);
        let builder = self.request::<Value>(Method::GET, &path, None);
        self.send(builder, endpoints::GET_KNOWLEDGE_BASE).await
    }

    #[instrument(skip(self, sources))]
    async fn update_knowledge_base(
        &self,
        knowledge_base_id: &str,
        sources: &KnowledgeBaseSources,
    ) -> Result<KnowledgeBase> {
        let path = endpoints::ADD_KNOWLEDGE_BASE_SOURCES.replace("{knowledge_base_id}", knowledge_base_id);
        let form = knowledge_base_form(
            None,
            &sources.knowledge_base_texts,
            &sources.knowledge_base_urls,
            None,
        )?;
        let builder = self.request::<Value>(Method::POST, &path, None).multipart(form);
        self.send(builder, endpoints::ADD_KNOWLEDGE_BASE_SOURCES).await
    }

    #[instrument(skip(self))]
    async fn delete_knowledge_base(&self, knowledge_base_id: &str) -> Result<()> {
        let path = endpoints::DELETE_KNOWLEDGE_BASE.replace("{knowledge_base_id}", knowledge_base_id);
        let builder = self.request::<Value>(Method::DELETE, &path, None);
        self.send_empty(builder, endpoints::DELETE_KNOWLEDGE_BASE).await
    }

    #[instrument(skip(self, flow))]
    async fn create_conversation_flow(&self, flow: &ConversationFlow) -> Result<ConversationFlow> {
        let builder = self.request(
            Method::POST,
            endpoints::CREATE_CONVERSATION_FLOW,
            Some(&flow.to_payload()),
        );
        self.send_config(builder, endpoints::CREATE_CONVERSATION_FLOW).await
    }

    #[instrument(skip(self, request))]
    async fn create_phone_number(&self, request: &PhoneNumberRequest) -> Result<PhoneNumberResponse> {
        let builder = self.request(Method::POST, endpoints::CREATE_PHONE_NUMBER, Some(request));
        self.send(builder, endpoints::CREATE_PHONE_NUMBER).await
    }

    #[instrument(skip(self, request), fields(to_number = %request.to_number))]
    async fn create_phone_call(&self, request: &PhoneCallRequest) -> Result<CallResponse> {
        let builder = self.request(Method::POST, endpoints::CREATE_PHONE_CALL, Some(request));
        self.send(builder, endpoints::CREATE_PHONE_CALL).await
    }

    #[instrument(skip(self, request))]
    async fn create_web_call(&self, request: &WebCallRequest) -> Result<CallResponse> {
        let builder = self.request(Method::POST, endpoints::CREATE_WEB_CALL, Some(request));
        self.send(builder, endpoints::CREATE_WEB_CALL).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> RetellClient {
        RetellClient::with_base_url("key_test", "https://api.example.test/").unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        assert_eq!(client().url(endpoints::CREATE_AGENT), "https://api.example.test/create-agent");
    }

    #[test]
    fn test_create_agent_request_carries_payload_and_auth() {
        let agent = AgentConfig::builder()
            .agent_name("Sarah")
            .field("agent_id", "agent_old")
            .build()
            .unwrap();
        let request = client()
            .request(Method::POST, endpoints::CREATE_AGENT, Some(&agent.to_payload()))
            .build()
            .unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.url().path(), "/create-agent");
        assert_eq!(
            request.headers()["authorization"].to_str().unwrap(),
            "Bearer key_test"
        );
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        let json: Value = serde_json::from_slice(body).unwrap();
        assert_eq!(json["agent_name"], "Sarah");
        assert!(json.get("agent_id").is_none());
    }

    #[test]
    fn test_get_agent_request_has_no_body() {
        let path = endpoints::GET_AGENT.replace("{agent_id}", "agent_42");
        let request = client()
            .request::<Value>(Method::GET, &path, None)
            .build()
            .unwrap();
        assert_eq!(request.url().path(), "/get-agent/agent_42");
        assert!(request.body().is_none());
    }

    #[test]
    fn test_delete_endpoints_use_delete_method() {
        let path = endpoints::DELETE_KNOWLEDGE_BASE.replace("{knowledge_base_id}", "kb_7");
        let request = client()
            .request::<Value>(Method::DELETE, &path, None)
            .build()
            .unwrap();
        assert_eq!(request.method(), Method::DELETE);
        assert_eq!(request.url().path(), "/delete-knowledge-base/kb_7");
    }

    #[test]
    fn test_knowledge_base_request_is_multipart() {
        let form = knowledge_base_form(
            Some("faq"),
            &[KnowledgeBaseText {
                title: "Hours".into(),
                text: "9 to 5".into(),
            }],
            &["https://example.test/faq".to_string()],
            Some(true),
        )
        .unwrap();
        let request = client()
            .request::<Value>(Method::POST, endpoints::CREATE_KNOWLEDGE_BASE, None)
            .multipart(form)
            .build()
            .unwrap();
        let content_type = request.headers()["content-type"].to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        assert_eq!(
            request.headers()["authorization"].to_str().unwrap(),
            "Bearer key_test"
        );
    }
}
