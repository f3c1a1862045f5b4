//! 测试通用工具
//!
//! 提供测试辅助函数和假网关

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex, Once};

use alya_relay::{
    AccessPolicy, ChatReply, ChatRequest, CompletionGateway, RelayHandler, RelaySettings,
    UserRegistry,
};
use async_trait::async_trait;

static INIT: Once = Once::new();

/// 初始化测试环境
pub fn setup() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}

/// 测试超时包装器
pub async fn with_timeout<F, T>(duration: std::time::Duration, f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(duration, f)
        .await
        .expect("Test timed out")
}

pub const TEST_TIMEOUT_SHORT: std::time::Duration = std::time::Duration::from_secs(5);

/// 返回固定结果并记录调用的假网关
pub struct StubGateway {
    reply: ChatReply,
    calls: Mutex<Vec<ChatRequest>>,
}

impl StubGateway {
    pub fn replying(reply: ChatReply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<ChatRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionGateway for StubGateway {
    async fn complete(&self, request: &ChatRequest) -> ChatReply {
        self.calls.lock().unwrap().push(request.clone());
        self.reply.clone()
    }
}

/// 构造使用给定注册表文件的中继处理器
pub async fn relay_at(
    users_file: &Path,
    policy: AccessPolicy,
    gateway: Arc<dyn CompletionGateway>,
) -> RelayHandler {
    let registry = Arc::new(UserRegistry::open(users_file).await);
    RelayHandler::new(registry, policy, gateway, RelaySettings::default())
}

/// 构造使用临时目录注册表的中继处理器
pub async fn relay_with(
    dir: &Path,
    policy: AccessPolicy,
    gateway: Arc<dyn CompletionGateway>,
) -> RelayHandler {
    relay_at(&dir.join("users.json"), policy, gateway).await
}

/// 标准的聊天补全响应体
pub fn completion_body(content: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1_700_000_000u32,
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": content,
                "refusal": null
            },
            "logprobs": null,
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": 12,
            "completion_tokens": 3,
            "total_tokens": 15
        }
    })
}
