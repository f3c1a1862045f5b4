//! 中继处理器
//!
//! 每个入站事件独立处理：先登记发送者，再根据事件类型
//! 生成至多一条回复。跨事件保留的状态只有注册表成员

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::core::config::DEFAULT_SYSTEM_PROMPT;
use crate::core::gateway::CompletionGateway;
use crate::core::policy::AccessPolicy;
use crate::core::registry::UserRegistry;
use crate::domain::{ChatRequest, EventKind, InboundEvent, Sender};

/// 非管理员执行管理命令时的回复
pub const ACCESS_DENIED_MESSAGE: &str = "Access denied.";

/// 没有显示名时问候语使用的称呼
pub const FALLBACK_DISPLAY_NAME: &str = "friend";

/// 中继设置
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub system_prompt: String,
    pub bot_name: String,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            bot_name: "Alya".to_string(),
        }
    }
}

/// 中继处理器
pub struct RelayHandler {
    registry: Arc<UserRegistry>,
    policy: AccessPolicy,
    gateway: Arc<dyn CompletionGateway>,
    settings: RelaySettings,
}

impl RelayHandler {
    pub fn new(
        registry: Arc<UserRegistry>,
        policy: AccessPolicy,
        gateway: Arc<dyn CompletionGateway>,
        settings: RelaySettings,
    ) -> Self {
        Self {
            registry,
            policy,
            gateway,
            settings,
        }
    }

    pub fn registry(&self) -> &Arc<UserRegistry> {
        &self.registry
    }

    /// 处理一个入站事件，返回需要发送的回复
    ///
    /// 返回 `None` 表示事件被忽略
    pub async fn handle(&self, event: InboundEvent) -> Option<String> {
        self.track(event.sender.as_ref()).await;

        match event.kind {
            EventKind::Greeting => Some(self.greeting(event.sender.as_ref())),
            EventKind::AdminQuery => Some(self.admin_query(event.sender.as_ref()).await),
            EventKind::FreeText(text) => self.chat(text.as_deref()).await,
        }
    }

    /// 登记发送者；写回失败不影响回复
    async fn track(&self, sender: Option<&Sender>) {
        let Some(sender) = sender else {
            return;
        };
        match self.registry.record(sender.id).await {
            Ok(true) => info!(user_id = %sender.id, "new user tracked"),
            // 写回失败已由注册表记录
            Ok(false) | Err(_) => {}
        }
    }

    fn greeting(&self, sender: Option<&Sender>) -> String {
        let name = sender
            .and_then(|s| s.display_name.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(FALLBACK_DISPLAY_NAME);
        format!(
            "Hey {}!\nI am {}.\nAsk me anything!",
            name, self.settings.bot_name
        )
    }

    async fn admin_query(&self, sender: Option<&Sender>) -> String {
        let id = sender.map(|s| s.id);
        if !self.policy.is_authorized_sender(id) {
            warn!(user_id = ?id.map(|id| id.0), "admin command denied");
            return ACCESS_DENIED_MESSAGE.to_string();
        }
        format!("Total Users: {}", self.registry.count().await)
    }

    async fn chat(&self, text: Option<&str>) -> Option<String> {
        let text = text.map(str::trim).filter(|t| !t.is_empty());
        let Some(text) = text else {
            debug!("ignoring message without text");
            return None;
        };

        let request = ChatRequest::new(self.settings.system_prompt.clone(), text);
        let reply = self.gateway.complete(&request).await;
        Some(reply.text().to_string())
    }
}
