//! 提示：向用户提问并等待一个可识别的回答
//!
//! 提示也是栈帧。回答被识别后提示出栈，把结果交给发起它的对话；
//! 无法识别（空输入）时发送重试提示并继续等待。

use serde::{Deserialize, Serialize};

use super::context::{DialogResult, StepContext, StepOutcome};
use crate::core::BotError;
use crate::gateway::{Activity, TurnContext};
use crate::recognizer::DateTimeRecognizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    /// 任意非空文本
    Text,
    /// 交给日期时间识别器
    DateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptOptions {
    pub kind: PromptKind,
    pub prompt: String,
    #[serde(default)]
    pub retry_prompt: Option<String>,
}

impl PromptOptions {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            kind: PromptKind::Text,
            prompt: prompt.into(),
            retry_prompt: None,
        }
    }

    pub fn date_time(prompt: impl Into<String>) -> Self {
        Self {
            kind: PromptKind::DateTime,
            prompt: prompt.into(),
            retry_prompt: None,
        }
    }

    pub fn with_retry(mut self, retry_prompt: impl Into<String>) -> Self {
        self.retry_prompt = Some(retry_prompt.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptState {
    pub options: PromptOptions,
    /// 已收到的无效回答次数
    #[serde(default)]
    pub attempts: u32,
}

impl PromptState {
    pub fn new(options: PromptOptions) -> Self {
        Self {
            options,
            attempts: 0,
        }
    }

    pub(crate) fn begin(&mut self, ctx: &mut StepContext<'_>) -> StepOutcome {
        ctx.send_text(self.options.prompt.clone());
        StepOutcome::EndOfTurn
    }

    /// 识别用户回答；`None` 表示需要重新提示
    pub(crate) async fn recognize(
        &mut self,
        activity: &Activity,
        recognizer: &dyn DateTimeRecognizer,
    ) -> Result<Option<DialogResult>, BotError> {
        let text = activity.text().trim();
        if text.is_empty() {
            self.attempts += 1;
            return Ok(None);
        }

        match self.options.kind {
            PromptKind::Text => Ok(Some(DialogResult::Text(text.to_string()))),
            PromptKind::DateTime => {
                let reference = activity.local_timestamp.map(|ts| ts.naive_local());
                let candidates = recognizer.recognize(text, reference).await?;
                tracing::debug!(
                    input = text,
                    candidates = candidates.len(),
                    "date/time recognized"
                );
                Ok(Some(DialogResult::DateTime(candidates)))
            }
        }
    }

    pub(crate) fn reprompt(&self, turn: &mut TurnContext) {
        let text = self
            .options
            .retry_prompt
            .as_deref()
            .unwrap_or(&self.options.prompt);
        turn.send_text(text);
    }
}
