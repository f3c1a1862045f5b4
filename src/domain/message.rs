//! 消息领域实体
//!
//! 入站事件、补全请求与补全回复

use std::fmt;

use super::user::Sender;

/// 补全成功但内容为空时的回复
pub const EMPTY_REPLY_MESSAGE: &str = "Sorry, I couldn't generate a reply.";

/// 补全失败时返回给用户的通用消息，不包含任何内部细节
pub const FAILURE_REPLY_MESSAGE: &str = "Sorry, something went wrong. Try again in a moment.";

/// 入站事件类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// `/start`
    Greeting,
    /// `/admin`
    AdminQuery,
    /// 普通文本消息，文本可能缺失
    FreeText(Option<String>),
}

impl EventKind {
    /// 根据消息文本判定事件类型
    ///
    /// 只有 `/` 后紧跟 1 到 32 个字母、数字或下划线时才视为命令，
    /// 其余文本一律是普通消息。`@用户名` 后缀与 `bot_username` 不符的命令
    /// 属于其他机器人，与未识别的命令一样返回 `None`，调用方应直接忽略
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let free_text = || Some(EventKind::FreeText(Some(text.to_string())));

        let Some(rest) = text.trim_start().strip_prefix('/') else {
            return free_text();
        };
        let token = rest.split_whitespace().next().unwrap_or_default();
        let (name, mention) = match token.split_once('@') {
            Some((name, mention)) => (name, Some(mention)),
            None => (token, None),
        };

        if !is_command_name(name) {
            return free_text();
        }

        if let (Some(mention), Some(own)) = (mention, bot_username) {
            if !mention.eq_ignore_ascii_case(own.trim_start_matches('@')) {
                return None;
            }
        }

        match name.to_ascii_lowercase().as_str() {
            "start" => Some(EventKind::Greeting),
            "admin" => Some(EventKind::AdminQuery),
            _ => None,
        }
    }
}

fn is_command_name(name: &str) -> bool {
    (1..=32).contains(&name.len())
        && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// 入站事件
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub sender: Option<Sender>,
    pub kind: EventKind,
}

impl InboundEvent {
    pub fn new(sender: Option<Sender>, kind: EventKind) -> Self {
        Self { sender, kind }
    }

    pub fn greeting(sender: Sender) -> Self {
        Self::new(Some(sender), EventKind::Greeting)
    }

    pub fn admin_query(sender: Sender) -> Self {
        Self::new(Some(sender), EventKind::AdminQuery)
    }

    pub fn free_text(sender: Sender, text: impl Into<String>) -> Self {
        Self::new(Some(sender), EventKind::FreeText(Some(text.into())))
    }
}

/// 单次补全请求，不携带历史
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub system_prompt: String,
    pub user_text: String,
}

impl ChatRequest {
    pub fn new(system_prompt: impl Into<String>, user_text: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_text: user_text.into(),
        }
    }
}

/// 补全失败的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    /// 请求构建失败
    Request,
    /// 服务端返回错误（含鉴权失败、响应格式错误）
    Provider,
    /// 网络传输错误
    Transport,
    /// 超时
    Timeout,
}

impl fmt::Display for GatewayErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayErrorKind::Request => write!(f, "request"),
            GatewayErrorKind::Provider => write!(f, "provider"),
            GatewayErrorKind::Transport => write!(f, "transport"),
            GatewayErrorKind::Timeout => write!(f, "timeout"),
        }
    }
}

/// 补全结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    /// 非空的生成文本
    Generated(String),
    /// 服务返回空内容
    Empty,
    /// 调用失败，详细错误已记录日志
    Failed(GatewayErrorKind),
}

impl ChatReply {
    /// 由服务返回的原始文本构造，空白内容视为 `Empty`
    pub fn from_content(content: Option<String>) -> Self {
        match content.map(|c| c.trim().to_string()) {
            Some(text) if !text.is_empty() => ChatReply::Generated(text),
            _ => ChatReply::Empty,
        }
    }

    /// 发送给用户的文本
    pub fn text(&self) -> &str {
        match self {
            ChatReply::Generated(text) => text,
            ChatReply::Empty => EMPTY_REPLY_MESSAGE,
            ChatReply::Failed(_) => FAILURE_REPLY_MESSAGE,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ChatReply::Failed(_))
    }
}
