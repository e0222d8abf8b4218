pub mod api;
pub mod config;
pub mod error;
pub mod history;
pub mod prompt;
pub mod utils;

pub use api::{
    find_agent_by_name, list_agents_filtered, AgentApi, CallResponse, KnowledgeBase,
    KnowledgeBaseRequest, KnowledgeBaseSources, KnowledgeBaseText, OutboundCall,
    PhoneCallRequest, PhoneNumberRequest, PhoneNumberResponse, ProvisionPlan, Provisioned,
    Provisioner, WebCallRequest,
};
#[cfg(feature = "retell-client")]
pub use api::RetellClient;
pub use config::{
    conversation_node, AgentConfig, AgentConfigBuilder, ConfigPayload, ConversationFlow,
    ConversationFlowBuilder, EnvConfig, FieldMap, LlmConfig, LlmConfigBuilder, Settings,
};
pub use error::{Result, VoiceAgentError};
pub use history::{CallAnalysis, CallRecord, CustomerContext, CustomerProfile};
pub use prompt::{DynamicVariables, FunctionTool, InvoiceReminder, PromptTemplate};
pub use utils::{logging, validation};
