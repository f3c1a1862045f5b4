//! LLM 客户端
//!
//! 使用 async-openai 调用 OpenAI 兼容的聊天补全接口

use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, error};

use crate::core::gateway::{CompletionGateway, GatewayError};
use crate::domain::{ChatReply, ChatRequest, GatewayErrorKind};
use crate::infrastructure::logger::Timer;

/// OpenAI 客户端
#[derive(Clone)]
pub struct OpenAIClient {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAIClient {
    pub fn new_with_base_url(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();

        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);

        let client = Client::with_config(config);

        Self {
            client,
            model,
            timeout,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 调用聊天 API，返回首个候选的文本
    pub async fn chat(&self, request: &ChatRequest) -> Result<Option<String>, GatewayError> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system_prompt.clone())
                .build()
                .map(ChatCompletionRequestMessage::System)
                .map_err(classify)?,
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.user_text.clone())
                .build()
                .map(ChatCompletionRequestMessage::User)
                .map_err(classify)?,
        ];

        let body = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .map_err(classify)?;

        let _timer = Timer::new("chat_completion");
        let response = tokio::time::timeout(self.timeout, self.client.chat().create(body))
            .await
            .map_err(|_| {
                GatewayError::new(
                    GatewayErrorKind::Timeout,
                    format!("no response within {:?}", self.timeout),
                )
            })?
            .map_err(classify)?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content))
    }
}

/// 将 async-openai 错误归类
fn classify(err: OpenAIError) -> GatewayError {
    let kind = match &err {
        OpenAIError::InvalidArgument(_) => GatewayErrorKind::Request,
        OpenAIError::ApiError(_) | OpenAIError::JSONDeserialize(..) => GatewayErrorKind::Provider,
        _ => GatewayErrorKind::Transport,
    };
    GatewayError::new(kind, err.to_string())
}

#[async_trait]
impl CompletionGateway for OpenAIClient {
    async fn complete(&self, request: &ChatRequest) -> ChatReply {
        match self.chat(request).await {
            Ok(content) => {
                let reply = ChatReply::from_content(content);
                debug!(model = %self.model, empty = matches!(reply, ChatReply::Empty), "completion received");
                reply
            }
            Err(e) => {
                error!(model = %self.model, kind = %e.kind, error = %e.detail, "completion request failed");
                ChatReply::Failed(e.kind)
            }
        }
    }
}
