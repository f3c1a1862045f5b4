//! 配置管理
//!
//! 所有配置在启动时通过命令行参数或环境变量读取一次，运行期间不可变

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::errors::{RelayError, Result};
use crate::infrastructure::logger::LogFormat;

/// 默认系统提示词
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Alya, a sweet, smart anime-style girl assistant.";

/// 注册表文件名
pub const USERS_FILE_NAME: &str = "users.json";

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Telegram relay bot that forwards messages to an LLM"
)]
pub struct AppConfig {
    /// Telegram 机器人令牌
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    pub bot_token: String,

    /// OpenAI API 密钥
    #[arg(long, env = "OPENAI_KEY", hide_env_values = true)]
    pub openai_key: String,

    /// 管理员 ID 列表（逗号分隔），为空表示不限制
    #[arg(long, env = "ADMIN_IDS", default_value = "")]
    pub admin_ids: String,

    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o-mini")]
    pub openai_model: String,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    /// 单次补全请求超时（秒）
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 60)]
    pub request_timeout_secs: u64,

    /// 数据目录，存放用户注册表
    #[arg(long, env = "DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// 系统提示词
    #[arg(long, env = "SYSTEM_PROMPT", default_value = DEFAULT_SYSTEM_PROMPT)]
    pub system_prompt: String,

    /// 问候语中使用的机器人名字
    #[arg(long, env = "BOT_NAME", default_value = "Alya")]
    pub bot_name: String,

    /// 日志格式: pretty, compact, json
    #[arg(long, env = "LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,
}

impl AppConfig {
    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            return Err(RelayError::ConfigError(
                "BOT_TOKEN environment variable missing".to_string(),
            ));
        }
        if self.openai_key.trim().is_empty() {
            return Err(RelayError::ConfigError(
                "OPENAI_KEY environment variable missing".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(RelayError::ConfigError(
                "REQUEST_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// 用户注册表文件路径
    pub fn users_file(&self) -> PathBuf {
        self.data_dir.join(USERS_FILE_NAME)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
