//! 标准化错误处理
//!
//! 定义中继服务专用的错误类型

use thiserror::Error;

/// 项目主要错误类型
#[derive(Error, Debug)]
pub enum RelayError {
    /// 配置错误（启动时致命）
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Telegram 接口错误
    #[error("Telegram error: {0}")]
    TelegramError(#[from] teloxide::RequestError),
}

/// 项目结果类型别名
pub type Result<T> = std::result::Result<T, RelayError>;
