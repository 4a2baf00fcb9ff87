//! 对话栈与栈帧

use serde::{Deserialize, Serialize};

use super::check_in::CheckInState;
use super::context::{DialogResult, StepContext, StepOutcome};
use super::main_menu::MainMenuState;
use super::prompt::{PromptOptions, PromptState};
use super::set_alarm::SetAlarmState;
use super::waterfall;
use crate::core::BotError;
use crate::state::UserInfo;

/// 栈帧：对话标识（serde 标签）+ 该对话自己的步骤游标与临时值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "dialog", content = "state", rename_all = "snake_case")]
pub enum DialogFrame {
    CheckIn(CheckInState),
    SetAlarm(SetAlarmState),
    MainMenu(MainMenuState),
    Prompt(PromptState),
}

impl DialogFrame {
    pub fn check_in() -> Self {
        DialogFrame::CheckIn(CheckInState::default())
    }

    /// 叫醒闹钟对话，`options` 为发起方传入的用户记录
    pub fn set_alarm(options: Option<UserInfo>) -> Self {
        DialogFrame::SetAlarm(SetAlarmState::new(options))
    }

    pub fn main_menu() -> Self {
        DialogFrame::MainMenu(MainMenuState::default())
    }

    pub fn prompt(options: PromptOptions) -> Self {
        DialogFrame::Prompt(PromptState::new(options))
    }

    /// 稳定的对话标识
    pub fn id(&self) -> &'static str {
        match self {
            DialogFrame::CheckIn(_) => "check_in",
            DialogFrame::SetAlarm(_) => "set_alarm",
            DialogFrame::MainMenu(_) => "main_menu",
            DialogFrame::Prompt(_) => "prompt",
        }
    }

    pub(crate) fn begin(&mut self, ctx: &mut StepContext<'_>) -> Result<StepOutcome, BotError> {
        match self {
            DialogFrame::CheckIn(state) => waterfall::begin(state, ctx),
            DialogFrame::SetAlarm(state) => waterfall::begin(state, ctx),
            DialogFrame::MainMenu(state) => waterfall::begin(state, ctx),
            DialogFrame::Prompt(prompt) => Ok(prompt.begin(ctx)),
        }
    }

    /// 继续执行：`result` 为子对话的结果，直接由用户消息恢复时为 None
    pub(crate) fn resume(
        &mut self,
        ctx: &mut StepContext<'_>,
        result: Option<DialogResult>,
    ) -> Result<StepOutcome, BotError> {
        match self {
            DialogFrame::CheckIn(state) => waterfall::resume(state, ctx, result),
            DialogFrame::SetAlarm(state) => waterfall::resume(state, ctx, result),
            DialogFrame::MainMenu(state) => waterfall::resume(state, ctx, result),
            DialogFrame::Prompt(_) => Err(BotError::DialogStack(
                "prompt frames do not host child dialogs".into(),
            )),
        }
    }
}

/// 每个会话一份的对话栈；只允许严格嵌套（压栈 / 出栈）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogStack {
    #[serde(default)]
    frames: Vec<DialogFrame>,
}

impl DialogStack {
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// 栈顶（当前活动）帧
    pub fn active(&self) -> Option<&DialogFrame> {
        self.frames.last()
    }

    /// 自底向上的对话标识
    pub fn ids(&self) -> Vec<&'static str> {
        self.frames.iter().map(DialogFrame::id).collect()
    }

    pub(crate) fn push(&mut self, frame: DialogFrame, max_depth: usize) -> Result<(), BotError> {
        if self.frames.len() >= max_depth {
            return Err(BotError::DialogStack(format!(
                "maximum dialog depth {} exceeded while starting {}",
                max_depth,
                frame.id()
            )));
        }
        self.frames.push(frame);
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> Option<DialogFrame> {
        self.frames.pop()
    }

    pub(crate) fn top_mut(&mut self) -> Option<&mut DialogFrame> {
        self.frames.last_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_respects_max_depth() {
        let mut stack = DialogStack::default();
        stack.push(DialogFrame::main_menu(), 2).unwrap();
        stack.push(DialogFrame::set_alarm(None), 2).unwrap();
        let err = stack
            .push(DialogFrame::prompt(PromptOptions::text("?")), 2)
            .unwrap_err();
        assert!(matches!(err, BotError::DialogStack(_)));
        assert_eq!(stack.ids(), vec!["main_menu", "set_alarm"]);
    }

    #[test]
    fn test_stack_json_uses_dialog_ids() {
        let mut stack = DialogStack::default();
        stack.push(DialogFrame::check_in(), 8).unwrap();
        let json = serde_json::to_value(&stack).unwrap();
        assert_eq!(json["frames"][0]["dialog"], "check_in");

        let restored: DialogStack = serde_json::from_value(json).unwrap();
        assert_eq!(restored, stack);
    }
}
