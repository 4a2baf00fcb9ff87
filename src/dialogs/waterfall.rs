//! 瀑布式对话：按顺序执行的步骤列表
//!
//! 每个对话状态自带步骤游标；步骤返回 `StepOutcome`，游标在执行前前移，
//! 因此由子对话结果恢复时总是执行下一步。越过最后一步等同于以输入结果结束。

use super::context::{DialogResult, StepContext, StepOutcome};
use crate::core::BotError;
use crate::recognizer::DateTimeResolution;

/// 单个步骤：`result` 为上一个子对话（通常是提示）的结果
pub type Step<S> =
    fn(&mut S, &mut StepContext<'_>, Option<DialogResult>) -> Result<StepOutcome, BotError>;

pub trait Waterfall: Sized + 'static {
    /// 日志中使用的对话标识
    const ID: &'static str;
    const STEPS: &'static [Step<Self>];

    /// 下一个要执行的步骤下标
    fn cursor(&mut self) -> &mut usize;
}

pub fn begin<S: Waterfall>(
    state: &mut S,
    ctx: &mut StepContext<'_>,
) -> Result<StepOutcome, BotError> {
    *state.cursor() = 0;
    run(state, ctx, None)
}

pub fn resume<S: Waterfall>(
    state: &mut S,
    ctx: &mut StepContext<'_>,
    result: Option<DialogResult>,
) -> Result<StepOutcome, BotError> {
    run(state, ctx, result)
}

fn run<S: Waterfall>(
    state: &mut S,
    ctx: &mut StepContext<'_>,
    result: Option<DialogResult>,
) -> Result<StepOutcome, BotError> {
    let index = *state.cursor();
    let Some(step) = S::STEPS.get(index) else {
        return Ok(StepOutcome::End(result));
    };
    *state.cursor() = index + 1;
    tracing::trace!(dialog = S::ID, step = index, "run waterfall step");
    step(state, ctx, result)
}

/// 取出文本提示的回答
pub(crate) fn expect_text(
    dialog: &'static str,
    result: Option<DialogResult>,
) -> Result<String, BotError> {
    match result {
        Some(DialogResult::Text(text)) => Ok(text),
        other => Err(DialogResult::unexpected(dialog, "text", other.as_ref())),
    }
}

/// 取出日期时间提示的候选列表
pub(crate) fn expect_date_time(
    dialog: &'static str,
    result: Option<DialogResult>,
) -> Result<Vec<DateTimeResolution>, BotError> {
    match result {
        Some(DialogResult::DateTime(candidates)) => Ok(candidates),
        other => Err(DialogResult::unexpected(dialog, "date_time", other.as_ref())),
    }
}
