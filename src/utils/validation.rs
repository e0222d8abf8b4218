use crate::error::{Result, VoiceAgentError};

/// 配置验证器
pub struct ConfigValidator;

impl ConfigValidator {
    /// 验证 API Key 格式
    pub fn validate_api_key(api_key: &str) -> Result<()> {
        if api_key.trim().is_empty() {
            return Err(VoiceAgentError::Config("API key must not be empty".into()));
        }

        if api_key.starts_with("your_") || api_key.starts_with("YOUR_") {
            return Err(VoiceAgentError::Config(
                "API key looks like a placeholder, provide a real key".into(),
            ));
        }

        Ok(())
    }

    /// 验证 URL 格式
    pub fn validate_url(url: &str) -> Result<()> {
        if url.is_empty() {
            return Err(VoiceAgentError::Config("URL must not be empty".into()));
        }

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(VoiceAgentError::Config(format!(
                "URL '{url}' must start with http:// or https://"
            )));
        }

        Ok(())
    }

    /// 验证节点 ID
    pub fn validate_node_id(node_id: &str) -> Result<()> {
        if node_id.is_empty() {
            return Err(VoiceAgentError::Config("node id must not be empty".into()));
        }

        if !node_id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        {
            return Err(VoiceAgentError::Config(format!(
                "node id '{node_id}' may only contain letters, digits, '_' and '-'"
            )));
        }

        Ok(())
    }

    /// 验证温度参数
    pub fn validate_temperature(temperature: f64) -> Result<()> {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(VoiceAgentError::Config(format!(
                "temperature must be between 0.0 and 2.0, got {temperature}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_api_key() {
        assert!(ConfigValidator::validate_api_key("").is_err());
        assert!(ConfigValidator::validate_api_key("YOUR_RETELL_API_KEY").is_err());
        assert!(ConfigValidator::validate_api_key("key_1234567890abcdef").is_ok());
    }

    #[test]
    fn test_validate_url() {
        assert!(ConfigValidator::validate_url("").is_err());
        assert!(ConfigValidator::validate_url("example.com").is_err());
        assert!(ConfigValidator::validate_url("http://example.com").is_ok());
        assert!(ConfigValidator::validate_url("https://your-domain.com/webhook").is_ok());
    }

    #[test]
    fn test_validate_node_id() {
        assert!(ConfigValidator::validate_node_id("").is_err());
        assert!(ConfigValidator::validate_node_id("node-1").is_ok());
        assert!(ConfigValidator::validate_node_id("node_1").is_ok());
        assert!(ConfigValidator::validate_node_id("node@1").is_err());
    }

    #[test]
    fn test_validate_temperature() {
        assert!(ConfigValidator::validate_temperature(-0.1).is_err());
        assert!(ConfigValidator::validate_temperature(0.0).is_ok());
        assert!(ConfigValidator::validate_temperature(2.0).is_ok());
        assert!(ConfigValidator::validate_temperature(2.1).is_err());
    }
}
