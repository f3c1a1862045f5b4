use std::sync::Arc;

use alya_relay::infrastructure::logger::{self, LogConfig, Sanitizer};
use alya_relay::infrastructure::telegram;
use alya_relay::{AccessPolicy, AppConfig, OpenAIClient, RelayHandler, RelaySettings, UserRegistry};
use anyhow::Result;
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cfg = AppConfig::parse();
    logger::init(LogConfig::with_format(cfg.log_format));
    cfg.validate()?;

    info!(
        bot_token = %Sanitizer::bot_token(&cfg.bot_token),
        openai_key = %Sanitizer::api_key(&cfg.openai_key),
        model = %cfg.openai_model,
        data_dir = %cfg.data_dir.display(),
        "starting relay"
    );

    let policy = AccessPolicy::from_csv(&cfg.admin_ids);
    if policy.is_enabled() {
        info!(admins = policy.admin_count(), "admin allowlist enabled");
    } else {
        info!("admin allowlist empty, /admin is open to everyone");
    }

    let registry = Arc::new(UserRegistry::open(cfg.users_file()).await);
    let gateway = Arc::new(OpenAIClient::new_with_base_url(
        cfg.openai_key.clone(),
        cfg.openai_model.clone(),
        cfg.openai_base_url.clone(),
        cfg.request_timeout(),
    ));

    let relay = Arc::new(RelayHandler::new(
        registry,
        policy,
        gateway,
        RelaySettings {
            system_prompt: cfg.system_prompt.clone(),
            bot_name: cfg.bot_name.clone(),
        },
    ));

    telegram::run(cfg.bot_token.clone(), relay).await?;
    Ok(())
}
