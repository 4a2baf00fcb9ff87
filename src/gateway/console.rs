//! 控制台渠道：每行输入一条消息活动，回复打印到输出
//!
//! `/quit` 或输入结束（EOF）退出；收到关闭信号时放弃进行中的回合（不保存状态）。

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use super::adapter::BotAdapter;
use super::message::{Activity, OutboundMessage};
use crate::config::ConsoleSection;
use crate::core::{ShutdownManager, ShutdownReason};

pub const CHANNEL_ID: &str = "console";
const QUIT_COMMAND: &str = "/quit";

pub struct ConsoleChannel {
    adapter: BotAdapter,
    user_id: String,
    user_name: Option<String>,
    conversation_id: String,
}

impl ConsoleChannel {
    pub fn new(adapter: BotAdapter, section: &ConsoleSection) -> Self {
        let conversation_id = section
            .conversation_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Self {
            adapter,
            user_id: section.user_id.clone(),
            user_name: section.user_name.clone(),
            conversation_id,
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    fn activity(&self, text: &str) -> Activity {
        let activity = Activity::message(CHANNEL_ID, &self.conversation_id, &self.user_id, text)
            .with_local_timestamp(chrono::Local::now().fixed_offset());
        match &self.user_name {
            Some(name) => activity.with_from_name(name),
            None => activity,
        }
    }

    /// 运行读-处理-打印循环，返回退出原因
    pub async fn run<R, W>(
        &self,
        reader: R,
        mut writer: W,
        shutdown: &ShutdownManager,
    ) -> std::io::Result<ShutdownReason>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        tracing::info!(conversation = %self.conversation_id, "console channel started");

        loop {
            writer.write_all(b"> ").await?;
            writer.flush().await?;

            let line = tokio::select! {
                _ = shutdown.wait_for_shutdown() => {
                    return Ok(shutdown.reason().unwrap_or(ShutdownReason::UserInitiated));
                }
                line = lines.next_line() => line?,
            };
            let Some(line) = line else {
                shutdown.shutdown(ShutdownReason::InputClosed);
                return Ok(ShutdownReason::InputClosed);
            };
            if line.trim() == QUIT_COMMAND {
                shutdown.shutdown(ShutdownReason::UserInitiated);
                return Ok(ShutdownReason::UserInitiated);
            }

            let replies = tokio::select! {
                _ = shutdown.wait_for_shutdown() => {
                    tracing::warn!("turn cancelled by shutdown");
                    return Ok(shutdown.reason().unwrap_or(ShutdownReason::UserInitiated));
                }
                replies = self.adapter.process_activity(self.activity(&line)) => replies,
            };
            for reply in &replies {
                writer.write_all(render(reply).as_bytes()).await?;
            }
            writer.flush().await?;
        }
    }
}

fn render(reply: &OutboundMessage) -> String {
    format!("{}\n", reply)
}
