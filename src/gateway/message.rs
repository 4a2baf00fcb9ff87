//! 渠道消息协议定义
//!
//! 入站为 Activity（每个用户回合一条），出站为 OutboundMessage（文本或带建议选项的消息）。
//! JSON 字段命名与常见 Bot 渠道保持一致（camelCase）。

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// 活动类型：只有 `message` 会驱动对话逻辑
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityType {
    Message,
    ConversationUpdate,
    Typing,
    EndOfConversation,
    Event,
    /// 其他未知类型
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityType::Message => write!(f, "message"),
            ActivityType::ConversationUpdate => write!(f, "conversationUpdate"),
            ActivityType::Typing => write!(f, "typing"),
            ActivityType::EndOfConversation => write!(f, "endOfConversation"),
            ActivityType::Event => write!(f, "event"),
            ActivityType::Unknown => write!(f, "unknown"),
        }
    }
}

/// 消息发送者
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelAccount {
    pub id: String,
    /// 用户显示名称
    #[serde(default)]
    pub name: Option<String>,
}

/// 所属会话
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationAccount {
    pub id: String,
}

/// 入站活动
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[serde(default)]
    pub id: Option<String>,
    /// 来源渠道（console / http / ...）
    pub channel_id: String,
    pub conversation: ConversationAccount,
    pub from: ChannelAccount,
    #[serde(default)]
    pub text: Option<String>,
    /// 用户本地时间（日期时间识别的参考时间）
    #[serde(default)]
    pub local_timestamp: Option<DateTime<FixedOffset>>,
}

impl Activity {
    pub fn new(
        activity_type: ActivityType,
        channel_id: impl Into<String>,
        conversation_id: impl Into<String>,
        from_id: impl Into<String>,
    ) -> Self {
        Self {
            activity_type,
            id: Some(uuid::Uuid::new_v4().to_string()),
            channel_id: channel_id.into(),
            conversation: ConversationAccount {
                id: conversation_id.into(),
            },
            from: ChannelAccount {
                id: from_id.into(),
                name: None,
            },
            text: None,
            local_timestamp: None,
        }
    }

    /// 构造一条文本消息活动
    pub fn message(
        channel_id: impl Into<String>,
        conversation_id: impl Into<String>,
        from_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let mut activity = Self::new(ActivityType::Message, channel_id, conversation_id, from_id);
        activity.text = Some(text.into());
        activity
    }

    pub fn with_from_name(mut self, name: impl Into<String>) -> Self {
        self.from.name = Some(name.into());
        self
    }

    pub fn with_local_timestamp(mut self, timestamp: DateTime<FixedOffset>) -> Self {
        self.local_timestamp = Some(timestamp);
        self
    }

    /// 消息文本（无文本时为空串）
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    pub fn is_message(&self) -> bool {
        self.activity_type == ActivityType::Message
    }
}

/// 出站消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// 纯文本
    Text { text: String },
    /// 带建议选项（按钮）的消息
    SuggestedActions { text: String, actions: Vec<String> },
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        OutboundMessage::Text { text: text.into() }
    }

    pub fn suggested_actions(text: impl Into<String>, actions: &[&str]) -> Self {
        OutboundMessage::SuggestedActions {
            text: text.into(),
            actions: actions.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// 消息正文
    pub fn body(&self) -> &str {
        match self {
            OutboundMessage::Text { text } | OutboundMessage::SuggestedActions { text, .. } => text,
        }
    }
}

impl std::fmt::Display for OutboundMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutboundMessage::Text { text } => write!(f, "{}", text),
            OutboundMessage::SuggestedActions { text, actions } => {
                write!(f, "{}", text)?;
                for action in actions {
                    write!(f, " [{}]", action)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_from_channel_json() {
        let json = r#"{
            "type": "message",
            "channelId": "http",
            "conversation": {"id": "c1"},
            "from": {"id": "u1", "name": "Alice"},
            "text": "wake up",
            "localTimestamp": "2026-10-19T21:30:00+02:00"
        }"#;
        let activity: Activity = serde_json::from_str(json).unwrap();
        assert!(activity.is_message());
        assert_eq!(activity.text(), "wake up");
        assert_eq!(activity.from.name.as_deref(), Some("Alice"));
        assert!(activity.local_timestamp.is_some());
    }

    #[test]
    fn test_unknown_activity_type() {
        let json = r#"{"type": "installationUpdate", "channelId": "http",
            "conversation": {"id": "c1"}, "from": {"id": "u1"}}"#;
        let activity: Activity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.activity_type, ActivityType::Unknown);
        assert_eq!(activity.text(), "");
    }

    #[test]
    fn test_outbound_display() {
        let msg = OutboundMessage::suggested_actions("Pick one", &["Reserve Table", "Wake Up"]);
        assert_eq!(msg.to_string(), "Pick one [Reserve Table] [Wake Up]");
        assert_eq!(msg.body(), "Pick one");

        let json = serde_json::to_value(OutboundMessage::text("hi")).unwrap();
        assert_eq!(json["type"], "text");
    }
}
