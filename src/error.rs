use thiserror::Error;

pub type Result<T> = std::result::Result<T, VoiceAgentError>;

#[derive(Debug, Error)]
pub enum VoiceAgentError {
    #[error("field `{field}` has an invalid shape: expected {expected}")]
    InvalidFieldShape { field: String, expected: String },
    #[error("unknown node `{0}` in conversation flow")]
    UnknownNode(String),
    #[error("duplicate node `{0}` in conversation flow")]
    DuplicateNode(String),
    #[error("missing value for dynamic variable `{0}`")]
    MissingVariable(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("api request to `{endpoint}` failed with status {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VoiceAgentError {
    pub fn invalid_shape(field: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::InvalidFieldShape {
            field: field.into(),
            expected: expected.into(),
        }
    }
}
