use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Result, VoiceAgentError};
use crate::utils::validation::ConfigValidator;

pub const RETELL_API_KEY: &str = "RETELL_API_KEY";
pub const RETELL_AGENT_NAME: &str = "RETELL_AGENT_NAME";
pub const RETELL_BASE_URL: &str = "RETELL_BASE_URL";
pub const RETELL_WEBHOOK_URL: &str = "RETELL_WEBHOOK_URL";
pub const VOICE_ID: &str = "VOICE_ID";

pub const DEFAULT_BASE_URL: &str = "https://api.retellai.com";

/// 环境变量配置管理
pub struct EnvConfig;

impl EnvConfig {
    /// 获取 API Key
    ///
    /// 优先级：
    /// 1. 直接传入的 api_key（如果不以 ${} 包裹）
    /// 2. `${VAR_NAME}` 形式时读取对应环境变量
    /// 3. 为空时读取 default_env_var
    pub fn get_api_key(api_key: &str, default_env_var: &str) -> Result<String> {
        if api_key.starts_with("${") && api_key.ends_with('}') {
            let env_var_name = &api_key[2..api_key.len() - 1];
            Self::get_env(env_var_name)
        } else if api_key.is_empty() {
            Self::get_env(default_env_var)
        } else {
            Ok(api_key.to_string())
        }
    }

    /// 从环境变量获取值
    pub fn get_env(key: &str) -> Result<String> {
        env::var(key).map_err(|_| {
            VoiceAgentError::Config(format!(
                "environment variable '{key}' is not set; export it or add it to your .env"
            ))
        })
    }

    /// 获取可选的环境变量，空字符串视为未设置
    pub fn get_env_optional(key: &str) -> Option<String> {
        env::var(key).ok().filter(|value| !value.is_empty())
    }

    /// 布尔值：true / 1 / yes（不区分大小写）
    pub fn get_bool(key: &str) -> Option<bool> {
        Self::get_env_optional(key).map(|value| parse_bool(&value))
    }

    /// 解析数值等类型；无法解析时返回 Config 错误
    pub fn get_parsed<T>(key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match Self::get_env_optional(key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
                VoiceAgentError::Config(format!("environment variable '{key}' is invalid: {e}"))
            }),
        }
    }

    /// 加载当前目录（或上级目录）中的 `.env`，已存在的环境变量不会被覆盖
    ///
    /// 找不到文件不是错误，返回 `None`。
    pub fn load_dotenv() -> Option<PathBuf> {
        match dotenvy::dotenv() {
            Ok(path) => {
                tracing::debug!(path = %path.display(), ".env loaded");
                Some(path)
            }
            Err(_) => None,
        }
    }

    /// 加载指定的 env 文件；文件不存在或格式错误时返回 Config 错误
    pub fn load_env_file(path: &Path) -> Result<()> {
        dotenvy::from_path(path).map_err(|e| {
            VoiceAgentError::Config(format!("failed to load env file '{}': {e}", path.display()))
        })
    }

    /// 检查是否启用调试模式
    pub fn is_debug_mode() -> bool {
        env::var("VOICEAGENT_DEBUG").is_ok()
    }
}

pub fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

/// 运行所需的全部设置
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub base_url: String,
    pub agent_name: Option<String>,
    pub voice_id: Option<String>,
    pub webhook_url: Option<String>,
}

impl Settings {
    /// 先加载 `.env`（若存在），再读取环境变量
    pub fn from_env() -> Result<Self> {
        EnvConfig::load_dotenv();
        Self::from_process_env()
    }

    /// 从指定的 env 文件加载后读取环境变量
    pub fn from_env_file(path: &Path) -> Result<Self> {
        EnvConfig::load_env_file(path)?;
        Self::from_process_env()
    }

    fn from_process_env() -> Result<Self> {
        let api_key = EnvConfig::get_api_key("", RETELL_API_KEY)?;
        ConfigValidator::validate_api_key(&api_key)?;

        let base_url =
            EnvConfig::get_env_optional(RETELL_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        ConfigValidator::validate_url(&base_url)?;

        let webhook_url = EnvConfig::get_env_optional(RETELL_WEBHOOK_URL);
        if let Some(url) = &webhook_url {
            ConfigValidator::validate_url(url)?;
        }

        let settings = Self {
            api_key,
            base_url,
            agent_name: EnvConfig::get_env_optional(RETELL_AGENT_NAME),
            voice_id: EnvConfig::get_env_optional(VOICE_ID),
            webhook_url,
        };
        tracing::debug!(
            base_url = %settings.base_url,
            agent_name = ?settings.agent_name,
            "settings loaded from environment"
        );
        Ok(settings)
    }
}

/// 宏：简化环境变量获取
#[macro_export]
macro_rules! env_var {
    ($key:expr) => {
        $crate::config::EnvConfig::get_env($key)
    };
}
