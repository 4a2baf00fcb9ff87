//! 适配器：把一条入站活动跑成一个回合，返回要发给渠道的回复
//!
//! 回合出错时丢弃已缓冲的回复，只返回一条致歉消息；状态不保存，用户停留在原处。

use std::sync::Arc;

use super::message::{Activity, OutboundMessage};
use super::turn::TurnContext;
use crate::bot::ConciergeBot;

#[derive(Debug, Clone)]
pub struct BotAdapter {
    bot: Arc<ConciergeBot>,
}

impl BotAdapter {
    pub fn new(bot: Arc<ConciergeBot>) -> Self {
        Self { bot }
    }

    pub async fn process_activity(&self, activity: Activity) -> Vec<OutboundMessage> {
        let conversation_id = activity.conversation.id.clone();
        let mut turn = TurnContext::new(activity);

        match self.bot.on_turn(&mut turn).await {
            Ok(()) => turn.into_responses(),
            Err(e) => {
                tracing::error!(conversation = %conversation_id, error = %e, "turn failed");
                vec![OutboundMessage::text(e.user_message())]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BotError;
    use crate::recognizer::RuleBasedRecognizer;
    use crate::state::MemoryStorage;

    fn adapter() -> BotAdapter {
        let bot = ConciergeBot::builder()
            .with_storage(Arc::new(MemoryStorage::new()))
            .with_recognizer(Arc::new(RuleBasedRecognizer::new()))
            .build()
            .unwrap();
        BotAdapter::new(Arc::new(bot))
    }

    async fn say(adapter: &BotAdapter, text: &str) -> Vec<String> {
        adapter
            .process_activity(Activity::message("test", "conv-1", "user-1", text))
            .await
            .iter()
            .map(|m| m.body().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_failed_turn_apologizes_and_keeps_position() {
        let adapter = adapter();
        for text in ["hello", "Alice", "12", "wake up"] {
            say(&adapter, text).await;
        }

        let replies = say(&adapter, "whenever").await;
        assert_eq!(replies.len(), 1);
        assert!(replies[0].starts_with("Sorry, I couldn't work out a time"));

        // 失败回合没有保存，仍在等待时间
        let replies = say(&adapter, "tomorrow 7am").await;
        assert!(replies[0].starts_with("Your alarm is set to"));
        assert!(replies[0].contains("room 12"));
    }

    #[tokio::test]
    async fn test_out_of_range_relative_time_is_no_resolution() {
        let adapter = adapter();
        for text in ["hello", "Alice", "12", "wake up"] {
            say(&adapter, text).await;
        }

        let replies = say(&adapter, "in 9999999999 hours").await;
        assert_eq!(replies, vec![BotError::NoResolution(String::new()).user_message()]);

        let replies = say(&adapter, "in 99999999999999 minutes").await;
        assert!(replies[0].starts_with("Sorry, I couldn't work out a time"));
    }

    #[tokio::test]
    async fn test_invalid_activity_gets_generic_apology() {
        let adapter = adapter();
        let replies = adapter
            .process_activity(Activity::message("", "conv-1", "user-1", "hi"))
            .await;
        assert_eq!(replies.len(), 1);
        assert!(replies[0].body().starts_with("Sorry, it looks like"));
    }
}
