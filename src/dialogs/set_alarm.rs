//! 叫醒闹钟对话
//!
//! 先问候并询问时间，再把识别器给出的第一个候选规范成 `WakeUpInfo`。
//! 问候语同时写入帧内临时值和会话级属性 `AlarmSpecificDialogState`，
//! 第二步读回并比对，用来确认会话级状态在回合之间被持久化。

use serde::{Deserialize, Serialize};

use super::context::{DialogResult, StepContext, StepOutcome};
use super::prompt::PromptOptions;
use super::waterfall::{expect_date_time, Step, Waterfall};
use crate::core::BotError;
use crate::recognizer::DateTimeResolution;
use crate::state::{UserInfo, WakeUpInfo};

pub const TIME_PROMPT: &str = "When would you like your alarm set for?";
pub const TIME_RETRY_PROMPT: &str = "Please tell me a time, for example \"tomorrow 7am\".";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetAlarmState {
    #[serde(default)]
    step: usize,
    /// 发起方传入的用户记录
    #[serde(default)]
    pub options: Option<UserInfo>,
    #[serde(default)]
    pub marker: Option<String>,
}

impl SetAlarmState {
    pub fn new(options: Option<UserInfo>) -> Self {
        Self {
            step: 0,
            options,
            marker: None,
        }
    }

    fn guest_name(&self) -> Option<&str> {
        self.options.as_ref().and_then(UserInfo::guest_name)
    }

    fn room(&self) -> Option<&str> {
        self.options.as_ref().and_then(UserInfo::room)
    }
}

impl Waterfall for SetAlarmState {
    const ID: &'static str = "set_alarm";
    const STEPS: &'static [Step<Self>] = &[time_step, confirm_step];

    fn cursor(&mut self) -> &mut usize {
        &mut self.step
    }
}

/// 取第一个候选：时间点优先，否则取时间段起点
pub fn resolve_wake_up(
    candidates: &[DateTimeResolution],
    input: &str,
) -> Result<WakeUpInfo, BotError> {
    candidates
        .first()
        .and_then(DateTimeResolution::point_or_start)
        .map(|time| WakeUpInfo {
            time: time.to_string(),
        })
        .ok_or_else(|| BotError::NoResolution(input.to_string()))
}

fn time_step(
    state: &mut SetAlarmState,
    ctx: &mut StepContext<'_>,
    _result: Option<DialogResult>,
) -> Result<StepOutcome, BotError> {
    let greeting = match state.guest_name() {
        Some(name) => format!("Hi {}", name),
        None => "Hi".to_string(),
    };

    ctx.accessors.alarm_state.set(ctx.turn, &greeting)?;
    state.marker = Some(greeting.clone());
    ctx.send_text(greeting);

    Ok(StepOutcome::prompt(
        PromptOptions::date_time(TIME_PROMPT).with_retry(TIME_RETRY_PROMPT),
    ))
}

fn confirm_step(
    state: &mut SetAlarmState,
    ctx: &mut StepContext<'_>,
    result: Option<DialogResult>,
) -> Result<StepOutcome, BotError> {
    let candidates = expect_date_time(SetAlarmState::ID, result)?;
    let wake_up = resolve_wake_up(&candidates, ctx.text())?;

    let persisted = ctx.accessors.alarm_state.get(ctx.turn)?;
    if persisted != state.marker {
        tracing::warn!(persisted = ?persisted, scratch = ?state.marker, "alarm marker mismatch");
    } else {
        tracing::debug!(marker = ?persisted, "alarm marker read back");
    }

    let confirmation = match state.room() {
        Some(room) => format!("Your alarm is set to {} for room {}.", wake_up.time, room),
        None => format!("Your alarm is set to {}.", wake_up.time),
    };
    ctx.send_text(confirmation);
    tracing::info!(time = %wake_up.time, "wake-up alarm set");

    Ok(StepOutcome::End(Some(DialogResult::WakeUp(wake_up))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogs::{DialogContext, DialogFrame, DialogStack, DialogTurnStatus};
    use crate::gateway::{Activity, TurnContext};
    use crate::recognizer::RuleBasedRecognizer;
    use crate::state::{BotAccessors, BotState, GuestInfo, MemoryStorage};
    use chrono::{FixedOffset, TimeZone};
    use std::sync::Arc;

    fn range(start: &str) -> DateTimeResolution {
        DateTimeResolution {
            start: Some(start.to_string()),
            ..DateTimeResolution::default()
        }
    }

    #[test]
    fn test_resolve_uses_start_when_no_value() {
        let info = resolve_wake_up(&[range("2026-10-20 08:00:00")], "tomorrow morning").unwrap();
        assert_eq!(info.time, "2026-10-20 08:00:00");
    }

    #[test]
    fn test_resolve_prefers_value_over_start() {
        let candidate = DateTimeResolution {
            value: Some("07:00:00".into()),
            start: Some("08:00:00".into()),
            ..DateTimeResolution::default()
        };
        assert_eq!(resolve_wake_up(&[candidate], "7").unwrap().time, "07:00:00");
    }

    #[test]
    fn test_resolve_without_candidates_fails() {
        let err = resolve_wake_up(&[], "whenever").unwrap_err();
        assert!(matches!(err, BotError::NoResolution(ref input) if input == "whenever"));

        let err = resolve_wake_up(&[DateTimeResolution::default()], "?").unwrap_err();
        assert!(matches!(err, BotError::NoResolution(_)));
    }

    #[tokio::test]
    async fn test_alarm_flow_greets_and_confirms_with_room() {
        let storage = Arc::new(MemoryStorage::new());
        let conversation = BotState::conversation(storage.clone());
        let user = BotState::user(storage);
        let accessors = BotAccessors::new(&conversation, &user);
        let recognizer = RuleBasedRecognizer::new();
        let mut stack = DialogStack::default();

        let options = UserInfo {
            guest: Some(GuestInfo {
                name: "Alice".into(),
                room: "12".into(),
            }),
            ..UserInfo::default()
        };

        let mut first = TurnContext::new(Activity::message("test", "conv-1", "user-1", "wake up"));
        conversation.load(&mut first, false).await.unwrap();
        let status = DialogContext::new(&mut stack, &mut first, &accessors, &recognizer)
            .begin_dialog(DialogFrame::set_alarm(Some(options)))
            .unwrap();
        assert_eq!(status, DialogTurnStatus::Waiting);
        let bodies: Vec<_> = first.responses().iter().map(|r| r.body().to_string()).collect();
        assert_eq!(bodies, vec!["Hi Alice", TIME_PROMPT]);
        conversation.save_changes(&mut first, false).await.unwrap();

        let now = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 19, 21, 30, 0)
            .unwrap();
        let activity = Activity::message("test", "conv-1", "user-1", "tomorrow 7am")
            .with_local_timestamp(now);
        let mut second = TurnContext::new(activity);
        conversation.load(&mut second, false).await.unwrap();
        let status = DialogContext::new(&mut stack, &mut second, &accessors, &recognizer)
            .continue_dialog()
            .await
            .unwrap();

        assert_eq!(
            status,
            DialogTurnStatus::Complete(Some(DialogResult::WakeUp(WakeUpInfo {
                time: "2026-10-20 07:00:00".into(),
            })))
        );
        assert_eq!(
            second.responses()[0].body(),
            "Your alarm is set to 2026-10-20 07:00:00 for room 12."
        );
    }

    #[tokio::test]
    async fn test_unrecognized_time_is_an_error() {
        let storage = Arc::new(MemoryStorage::new());
        let conversation = BotState::conversation(storage.clone());
        let accessors = BotAccessors::new(&conversation, &BotState::user(storage));
        let recognizer = RuleBasedRecognizer::new();
        let mut stack = DialogStack::default();

        let mut first = TurnContext::new(Activity::message("test", "conv-1", "user-1", "wake up"));
        conversation.load(&mut first, false).await.unwrap();
        DialogContext::new(&mut stack, &mut first, &accessors, &recognizer)
            .begin_dialog(DialogFrame::set_alarm(None))
            .unwrap();
        assert_eq!(first.responses()[0].body(), "Hi");

        let activity = Activity::message("test", "conv-1", "user-1", "whenever");
        let mut second = TurnContext::new(activity);
        conversation.load(&mut second, false).await.unwrap();
        let err = DialogContext::new(&mut stack, &mut second, &accessors, &recognizer)
            .continue_dialog()
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::NoResolution(_)));
    }
}
