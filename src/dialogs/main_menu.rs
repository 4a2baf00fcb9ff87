//! 主菜单：展示建议操作，按选择启动子对话，子对话结束后把结果并入用户记录并重新开始
//!
//! 主菜单从不结束；每一轮都用新的实例替换自己。

use serde::{Deserialize, Serialize};

use super::context::{DialogResult, StepContext, StepOutcome};
use super::stack::DialogFrame;
use super::waterfall::{Step, Waterfall};
use crate::core::BotError;
use crate::gateway::OutboundMessage;

pub const MENU_PROMPT: &str = "How can I help you?";
pub const MENU_ACTIONS: [&str; 2] = ["Reserve Table", "Wake Up"];
pub const UNKNOWN_CHOICE: &str =
    "Sorry, I can only help with a wake-up call right now. Please choose an option.";

/// 菜单选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    WakeUp,
    ReserveTable,
}

impl MenuChoice {
    /// 去掉首尾空白、忽略大小写后匹配
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "wake up" => Some(MenuChoice::WakeUp),
            "reserve table" => Some(MenuChoice::ReserveTable),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainMenuState {
    #[serde(default)]
    step: usize,
}

impl Waterfall for MainMenuState {
    const ID: &'static str = "main_menu";
    const STEPS: &'static [Step<Self>] = &[menu_step, choice_step, loop_step];

    fn cursor(&mut self) -> &mut usize {
        &mut self.step
    }
}

fn menu_step(
    _state: &mut MainMenuState,
    ctx: &mut StepContext<'_>,
    _result: Option<DialogResult>,
) -> Result<StepOutcome, BotError> {
    ctx.send(OutboundMessage::suggested_actions(MENU_PROMPT, &MENU_ACTIONS));
    Ok(StepOutcome::EndOfTurn)
}

fn choice_step(
    _state: &mut MainMenuState,
    ctx: &mut StepContext<'_>,
    _result: Option<DialogResult>,
) -> Result<StepOutcome, BotError> {
    match MenuChoice::parse(ctx.text()) {
        Some(MenuChoice::WakeUp) => {
            let user_info = ctx.user_info()?;
            Ok(StepOutcome::Begin(DialogFrame::set_alarm(Some(user_info))))
        }
        // 订桌对话尚未实现，与无法识别的输入同样处理
        choice => {
            tracing::debug!(input = ctx.text(), ?choice, "unsupported menu choice");
            ctx.send_text(UNKNOWN_CHOICE);
            Ok(StepOutcome::Replace(DialogFrame::main_menu()))
        }
    }
}

fn loop_step(
    _state: &mut MainMenuState,
    ctx: &mut StepContext<'_>,
    result: Option<DialogResult>,
) -> Result<StepOutcome, BotError> {
    let mut user_info = ctx.user_info()?;
    match result {
        Some(DialogResult::WakeUp(wake_up)) => user_info.wake_up = Some(wake_up),
        Some(DialogResult::Table(table)) => user_info.table = Some(table),
        Some(
            other @ (DialogResult::Text(_) | DialogResult::DateTime(_) | DialogResult::Guest(_)),
        ) => {
            tracing::warn!(kind = other.kind(), "unexpected result returned to main menu");
        }
        None => tracing::warn!("child dialog returned no result to main menu"),
    }
    ctx.set_user_info(&user_info)?;
    Ok(StepOutcome::Replace(DialogFrame::main_menu()))
}
