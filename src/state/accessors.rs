//! 对话与业务记录使用的属性访问器集合
//!
//! 显式地传入每个对话步骤，不使用全局单例。

use super::bot_state::{BotState, StatePropertyAccessor};
use super::models::UserInfo;
use crate::dialogs::DialogStack;

/// 会话级：对话栈
pub const DIALOG_STATE_PROPERTY: &str = "DialogState";
/// 用户级：用户记录
pub const USER_INFO_PROPERTY: &str = "UserInfo";
/// 会话级：闹钟对话写入的演示值
pub const ALARM_STATE_PROPERTY: &str = "AlarmSpecificDialogState";

#[derive(Debug, Clone)]
pub struct BotAccessors {
    pub dialog_state: StatePropertyAccessor<DialogStack>,
    pub user_info: StatePropertyAccessor<UserInfo>,
    pub alarm_state: StatePropertyAccessor<String>,
}

impl BotAccessors {
    pub fn new(conversation_state: &BotState, user_state: &BotState) -> Self {
        Self {
            dialog_state: conversation_state.create_property(DIALOG_STATE_PROPERTY),
            user_info: user_state.create_property(USER_INFO_PROPERTY),
            alarm_state: conversation_state.create_property(ALARM_STATE_PROPERTY),
        }
    }
}
