//! 核心层：注册表、访问策略、网关抽象和配置

pub mod config;
pub mod gateway;
pub mod policy;
pub mod registry;
