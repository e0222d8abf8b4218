pub mod agent;
pub mod constants;
pub mod env;
pub mod fields;
pub mod flow;
pub mod llm;
pub mod payload;

pub use agent::{is_allowed_voice_model, AgentConfig, AgentConfigBuilder};
pub use env::{EnvConfig, Settings};
pub use fields::{FieldMap, FieldReader};
pub use flow::{conversation_node, ConversationFlow, ConversationFlowBuilder};
pub use llm::{LlmConfig, LlmConfigBuilder};
pub use payload::{is_absent, ConfigPayload, PayloadWriter};
