//! Telegram 接入
//!
//! 通过 teloxide 长轮询接收消息，转换为入站事件交给中继处理器，
//! 并把回复发回原会话

use std::sync::Arc;

use teloxide::{
    dispatching::{Dispatcher, UpdateFilterExt},
    dptree,
    error_handlers::LoggingErrorHandler,
    prelude::*,
    types::Update,
};
use tracing::{error, info, Instrument};

use crate::application::RelayHandler;
use crate::domain::{EventKind, InboundEvent, Sender, UserId};
use crate::errors::Result;
use crate::infrastructure::logger::RequestContext;
use crate::request_span;

/// 机器人自身的用户名，用于识别 `/command@username`
#[derive(Debug, Clone)]
pub struct BotUsername(pub Option<String>);

/// 将 Telegram 消息转换为入站事件
///
/// 未识别的命令和发给其他机器人的命令返回 `None`
pub fn to_event(msg: &Message, bot_username: Option<&str>) -> Option<InboundEvent> {
    let sender = msg.from.as_ref().map(|user| Sender {
        id: UserId(user.id.0),
        display_name: Some(user.first_name.clone()),
    });

    let kind = match msg.text() {
        Some(text) => EventKind::parse(text, bot_username)?,
        None => EventKind::FreeText(None),
    };

    Some(InboundEvent::new(sender, kind))
}

/// 启动长轮询，直到收到 Ctrl+C
pub async fn run(token: String, relay: Arc<RelayHandler>) -> Result<()> {
    let bot = Bot::new(token);

    let me = bot.get_me().await?;
    let username = BotUsername(me.user.username.clone());
    info!(username = ?username.0, "connected to telegram");

    let handler = Update::filter_message().endpoint(message_handler);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![relay, username])
        .default_handler(|upd| async move {
            tracing::debug!(update_id = ?upd.id, "unhandled update");
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "Error in message handler",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("dispatcher stopped");
    Ok(())
}

async fn message_handler(
    bot: Bot,
    msg: Message,
    relay: Arc<RelayHandler>,
    username: BotUsername,
) -> ResponseResult<()> {
    let Some(event) = to_event(&msg, username.0.as_deref()) else {
        return Ok(());
    };

    let ctx = RequestContext::new();
    let span = request_span!(ctx);
    let chat_id = msg.chat.id;

    async move {
        let Some(reply) = relay.handle(event).await else {
            return;
        };
        if let Err(e) = bot.send_message(chat_id, reply).await {
            error!(chat_id = chat_id.0, error = %e, "failed to send reply");
        }
        tracing::debug!(elapsed_ms = ctx.elapsed().as_millis() as u64, "event handled");
    }
    .instrument(span)
    .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn private_message(extra: serde_json::Value) -> Message {
        let mut value = json!({
            "message_id": 1,
            "date": 1_700_000_000,
            "chat": { "id": 4242, "type": "private", "first_name": "Masachika" },
            "from": { "id": 4242, "is_bot": false, "first_name": "Masachika" }
        });
        if let (Some(base), Some(extra)) = (value.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_text_message_maps_sender() {
        let msg = private_message(json!({ "text": "Hello" }));
        let event = to_event(&msg, Some("alya_bot")).unwrap();

        let sender = event.sender.unwrap();
        assert_eq!(sender.id, UserId(4242));
        assert_eq!(sender.display_name.as_deref(), Some("Masachika"));
        assert_eq!(event.kind, EventKind::FreeText(Some("Hello".to_string())));
    }

    #[test]
    fn test_commands_map_to_event_kinds() {
        let msg = private_message(json!({ "text": "/start" }));
        assert_eq!(to_event(&msg, None).unwrap().kind, EventKind::Greeting);

        let msg = private_message(json!({ "text": "/admin@alya_bot" }));
        assert_eq!(
            to_event(&msg, Some("alya_bot")).unwrap().kind,
            EventKind::AdminQuery
        );
    }

    #[test]
    fn test_unknown_or_foreign_command_is_dropped() {
        let msg = private_message(json!({ "text": "/help" }));
        assert!(to_event(&msg, Some("alya_bot")).is_none());

        let msg = private_message(json!({ "text": "/start@other_bot" }));
        assert!(to_event(&msg, Some("alya_bot")).is_none());
    }

    #[test]
    fn test_non_text_message_has_no_text() {
        let msg = private_message(json!({
            "location": { "latitude": 35.68, "longitude": 139.76 }
        }));
        let event = to_event(&msg, Some("alya_bot")).unwrap();

        assert_eq!(event.kind, EventKind::FreeText(None));
        assert_eq!(event.sender.unwrap().id, UserId(4242));
    }
}
