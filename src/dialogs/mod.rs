//! 组件对话
//!
//! 对话栈是显式的带标签帧列表（`DialogFrame`），随会话级状态持久化：
//! - **运行时**：`DialogContext` 负责压栈 / 替换 / 出栈并把子对话结果交还父对话
//! - **提示**：文本提示与日期时间提示，本身也是栈上的一帧
//! - **业务对话**：入住登记、叫醒闹钟、主菜单（循环分发）
//!
//! 每个步骤显式返回 `StepOutcome`，运行时据此判断是否等待下一条用户消息。

pub mod check_in;
mod context;
pub mod main_menu;
mod prompt;
pub mod set_alarm;
mod stack;
mod waterfall;

pub use check_in::CheckInState;
pub use context::{
    DialogContext, DialogResult, DialogTurnStatus, StepContext, StepOutcome, DEFAULT_MAX_DEPTH,
    MIN_MAX_DEPTH,
};
pub use main_menu::{MainMenuState, MenuChoice};
pub use prompt::{PromptKind, PromptOptions, PromptState};
pub use set_alarm::{resolve_wake_up, SetAlarmState};
pub use stack::{DialogFrame, DialogStack};
