//! 补全网关抽象

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ChatReply, ChatRequest, GatewayErrorKind};

/// 补全调用错误，仅用于内部诊断，不会发送给用户
#[derive(Error, Debug)]
#[error("{kind} error: {detail}")]
pub struct GatewayError {
    pub kind: GatewayErrorKind,
    pub detail: String,
}

impl GatewayError {
    pub fn new(kind: GatewayErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

/// 补全网关
///
/// 每次调用只发起一次外部请求，不重试、不保留上下文。
/// 实现不得向调用方返回错误，失败统一折叠为 `ChatReply::Failed`
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> ChatReply;
}
