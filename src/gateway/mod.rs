//! 渠道接入层
//!
//! - **message**: 入站活动与出站消息
//! - **turn**: 回合上下文（状态缓存 + 回复缓冲）
//! - **adapter**: 运行回合、统一处理错误
//! - **console**: 标准输入输出渠道

mod adapter;
pub mod console;
mod message;
mod turn;

pub use adapter::BotAdapter;
pub use console::ConsoleChannel;
pub use message::{Activity, ActivityType, ChannelAccount, ConversationAccount, OutboundMessage};
pub use turn::TurnContext;
