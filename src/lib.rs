//! Telegram 到 LLM 的消息中继
//!
//! 提供以下能力：
//! - 用户注册表（去重、落盘、重启后恢复）
//! - 管理命令访问控制
//! - 单轮补全网关（OpenAI 兼容接口）
//! - 按事件类型分发的中继处理器
//!
//! # 架构分层
//!
//! - `domain`: 领域模型
//! - `core`: 核心层，注册表、访问策略、网关抽象和配置
//! - `infrastructure`: 基础设施层，LLM、Telegram 与日志
//! - `application`: 应用层，事件编排

// 领域层
pub mod domain;

// 核心层
pub mod core;

// 基础设施层
pub mod infrastructure;

// 应用层
pub mod application;

pub mod errors;

pub use application::relay::{RelayHandler, RelaySettings};
pub use core::config::AppConfig;
pub use core::gateway::{CompletionGateway, GatewayError};
pub use core::policy::AccessPolicy;
pub use core::registry::{RegistryError, RegistryLoad, UserRegistry};
pub use domain::{ChatReply, ChatRequest, EventKind, InboundEvent, Sender, UserId};
pub use errors::{RelayError, Result};
pub use infrastructure::llm::OpenAIClient;
pub use infrastructure::logger;
