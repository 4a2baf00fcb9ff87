//! 对话运行时
//!
//! 驱动对话栈：继续栈顶对话、按步骤返回的 `StepOutcome` 压栈 / 替换 / 出栈，
//! 并把子对话的结果交给父对话的下一步，直到某一步要求等待用户输入或栈被清空。

use serde::{Deserialize, Serialize};

use super::prompt::{PromptOptions, PromptState};
use super::stack::{DialogFrame, DialogStack};
use crate::core::BotError;
use crate::gateway::{OutboundMessage, TurnContext};
use crate::recognizer::{DateTimeRecognizer, DateTimeResolution};
use crate::state::{BotAccessors, GuestInfo, TableInfo, UserInfo, WakeUpInfo};

/// 默认的最大嵌套深度
pub const DEFAULT_MAX_DEPTH: usize = 8;
/// 主菜单 → 叫醒闹钟 → 提示，最深的嵌套
pub const MIN_MAX_DEPTH: usize = 3;

/// 对话（或提示）结束时交给父对话的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DialogResult {
    /// 文本提示的回答
    Text(String),
    /// 日期时间提示的候选列表（可能为空）
    DateTime(Vec<DateTimeResolution>),
    Guest(GuestInfo),
    WakeUp(WakeUpInfo),
    Table(TableInfo),
}

impl DialogResult {
    pub fn kind(&self) -> &'static str {
        match self {
            DialogResult::Text(_) => "text",
            DialogResult::DateTime(_) => "date_time",
            DialogResult::Guest(_) => "guest",
            DialogResult::WakeUp(_) => "wake_up",
            DialogResult::Table(_) => "table",
        }
    }

    /// 结果类型与步骤期望不符时的错误
    pub(crate) fn unexpected(
        dialog: &'static str,
        expected: &'static str,
        got: Option<&DialogResult>,
    ) -> BotError {
        BotError::DialogStack(format!(
            "{} expected a {} result, got {}",
            dialog,
            expected,
            got.map(DialogResult::kind).unwrap_or("nothing")
        ))
    }
}

/// 单个步骤执行完后的去向
#[derive(Debug)]
pub enum StepOutcome {
    /// 结束本回合，下一条用户消息到达时继续下一步
    EndOfTurn,
    /// 压入子对话并立即开始
    Begin(DialogFrame),
    /// 用新对话替换当前对话（重新开始循环）
    Replace(DialogFrame),
    /// 结束当前对话，把结果交给父对话
    End(Option<DialogResult>),
}

impl StepOutcome {
    /// 发出提示并等待回答
    pub fn prompt(options: PromptOptions) -> Self {
        StepOutcome::Begin(DialogFrame::Prompt(PromptState::new(options)))
    }
}

/// 本回合对话栈的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogTurnStatus {
    /// 栈为空，没有进行中的对话
    Empty,
    /// 有对话在等待用户输入
    Waiting,
    /// 最外层对话刚刚结束
    Complete(Option<DialogResult>),
}

/// 步骤函数可见的上下文：回合上下文 + 属性访问器
pub struct StepContext<'a> {
    pub turn: &'a mut TurnContext,
    pub accessors: &'a BotAccessors,
}

impl StepContext<'_> {
    /// 当前用户消息文本
    pub fn text(&self) -> &str {
        self.turn.activity().text()
    }

    pub fn send(&mut self, message: OutboundMessage) {
        self.turn.send(message);
    }

    pub fn send_text(&mut self, text: impl Into<String>) {
        self.turn.send_text(text);
    }

    /// 读取用户记录（不存在时创建空记录）
    pub fn user_info(&mut self) -> Result<UserInfo, BotError> {
        self.accessors
            .user_info
            .get_or_default(self.turn, UserInfo::default)
    }

    pub fn set_user_info(&mut self, info: &UserInfo) -> Result<(), BotError> {
        self.accessors.user_info.set(self.turn, info)
    }
}

/// 绑定到一个回合的对话栈驱动器
pub struct DialogContext<'a> {
    stack: &'a mut DialogStack,
    turn: &'a mut TurnContext,
    accessors: &'a BotAccessors,
    recognizer: &'a dyn DateTimeRecognizer,
    max_depth: usize,
}

impl<'a> DialogContext<'a> {
    pub fn new(
        stack: &'a mut DialogStack,
        turn: &'a mut TurnContext,
        accessors: &'a BotAccessors,
        recognizer: &'a dyn DateTimeRecognizer,
    ) -> Self {
        Self {
            stack,
            turn,
            accessors,
            recognizer,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn turn_mut(&mut self) -> &mut TurnContext {
        &mut *self.turn
    }

    pub fn active_dialog(&self) -> Option<&DialogFrame> {
        self.stack.active()
    }

    /// 压入并开始一个对话
    pub fn begin_dialog(&mut self, frame: DialogFrame) -> Result<DialogTurnStatus, BotError> {
        self.drive(StepOutcome::Begin(frame))
    }

    /// 用当前用户消息继续栈顶对话
    pub async fn continue_dialog(&mut self) -> Result<DialogTurnStatus, BotError> {
        let Some(frame) = self.stack.top_mut() else {
            return Ok(DialogTurnStatus::Empty);
        };

        let outcome = match frame {
            DialogFrame::Prompt(prompt) => {
                match prompt.recognize(self.turn.activity(), self.recognizer).await? {
                    Some(answer) => StepOutcome::End(Some(answer)),
                    None => {
                        prompt.reprompt(self.turn);
                        return Ok(DialogTurnStatus::Waiting);
                    }
                }
            }
            other => {
                let mut ctx = StepContext {
                    turn: &mut *self.turn,
                    accessors: self.accessors,
                };
                other.resume(&mut ctx, None)?
            }
        };

        self.drive(outcome)
    }

    /// 执行步骤结果，直到需要等待输入或栈被清空
    fn drive(&mut self, mut outcome: StepOutcome) -> Result<DialogTurnStatus, BotError> {
        loop {
            outcome = match outcome {
                StepOutcome::EndOfTurn => return Ok(DialogTurnStatus::Waiting),
                StepOutcome::Begin(frame) => {
                    tracing::debug!(
                        dialog = frame.id(),
                        depth = self.stack.len() + 1,
                        "begin dialog"
                    );
                    self.stack.push(frame, self.max_depth)?;
                    self.begin_top()?
                }
                StepOutcome::Replace(frame) => {
                    let replaced = self.stack.pop();
                    tracing::debug!(
                        dialog = frame.id(),
                        replaced = replaced.as_ref().map(DialogFrame::id).unwrap_or("none"),
                        "replace dialog"
                    );
                    self.stack.push(frame, self.max_depth)?;
                    self.begin_top()?
                }
                StepOutcome::End(result) => {
                    if let Some(ended) = self.stack.pop() {
                        tracing::debug!(
                            dialog = ended.id(),
                            result = result.as_ref().map(DialogResult::kind).unwrap_or("none"),
                            "end dialog"
                        );
                    }
                    if self.stack.is_empty() {
                        return Ok(DialogTurnStatus::Complete(result));
                    }
                    self.resume_top(result)?
                }
            };
        }
    }

    fn begin_top(&mut self) -> Result<StepOutcome, BotError> {
        let frame = self
            .stack
            .top_mut()
            .ok_or_else(|| BotError::DialogStack("no dialog to begin".into()))?;
        let mut ctx = StepContext {
            turn: &mut *self.turn,
            accessors: self.accessors,
        };
        frame.begin(&mut ctx)
    }

    fn resume_top(&mut self, result: Option<DialogResult>) -> Result<StepOutcome, BotError> {
        let frame = self
            .stack
            .top_mut()
            .ok_or_else(|| BotError::DialogStack("no dialog to resume".into()))?;
        let mut ctx = StepContext {
            turn: &mut *self.turn,
            accessors: self.accessors,
        };
        frame.resume(&mut ctx, result)
    }
}
