//! Concierge 控制台前端
//!
//! 入口：初始化日志、加载配置、创建机器人，并在标准输入输出上运行对话。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use concierge::config::load_config;
use concierge::core::ShutdownManager;
use concierge::gateway::{BotAdapter, ConsoleChannel};
use concierge::{observability, ConciergeBot};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = load_config(config_path).context("Failed to load config")?;
    let bot = ConciergeBot::from_config(&config).context("Failed to create bot")?;

    let shutdown = Arc::new(ShutdownManager::new());
    shutdown.install_signal_handlers();

    let channel = ConsoleChannel::new(BotAdapter::new(Arc::new(bot)), &config.console);
    println!(
        "{} (conversation {}) - type /quit to exit",
        config.app.name,
        channel.conversation_id()
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let reason = channel
        .run(stdin, tokio::io::stdout(), &shutdown)
        .await
        .context("Console channel failed")?;
    tracing::info!(?reason, "console channel stopped");

    Ok(())
}
