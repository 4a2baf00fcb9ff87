//! 机器人错误类型
//!
//! 回合处理中的错误原样返回给调用方（适配器），由适配器决定如何向用户致歉；
//! 菜单无法识别的输入不是错误，由主菜单对话自行处理。

use thiserror::Error;

use crate::state::StorageError;

/// 回合处理过程中可能出现的错误
#[derive(Error, Debug)]
pub enum BotError {
    /// 构建时缺少必需的协作者（存储、识别器等）
    #[error("Missing required argument: {0}")]
    NullArgument(&'static str),

    /// 日期时间识别没有给出任何可用的候选
    #[error("No date/time resolution for input: {0:?}")]
    NoResolution(String),

    /// 活动缺少计算存储键所需的字段
    #[error("Invalid activity: {0}")]
    InvalidActivity(String),

    /// 回合内访问了尚未读入的状态作用域
    #[error("State scope not loaded for this turn: {0}")]
    StateNotLoaded(&'static str),

    /// 对话栈状态异常（深度超限、结果类型不符等）
    #[error("Dialog stack error: {0}")]
    DialogStack(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("State serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl BotError {
    /// 回合失败时展示给用户的提示语
    pub fn user_message(&self) -> &'static str {
        match self {
            BotError::NoResolution(_) => concat!(
                "Sorry, I couldn't work out a time from that. ",
                "Please try again, for example \"tomorrow 7am\"."
            ),
            _ => "Sorry, it looks like something went wrong. Please try again.",
        }
    }
}
