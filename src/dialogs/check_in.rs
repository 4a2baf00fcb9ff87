//! 入住登记对话：询问姓名和房间号，以 `GuestInfo` 结束

use serde::{Deserialize, Serialize};

use super::context::{DialogResult, StepContext, StepOutcome};
use super::prompt::PromptOptions;
use super::waterfall::{expect_text, Step, Waterfall};
use crate::core::BotError;
use crate::state::GuestInfo;

pub const NAME_PROMPT: &str = "What is your name?";
pub const ROOM_PROMPT: &str = "What room will you be staying in?";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInState {
    #[serde(default)]
    step: usize,
    /// 逐步填写中的客人信息
    #[serde(default)]
    pub guest: GuestInfo,
}

impl Waterfall for CheckInState {
    const ID: &'static str = "check_in";
    const STEPS: &'static [Step<Self>] = &[name_step, room_step, final_step];

    fn cursor(&mut self) -> &mut usize {
        &mut self.step
    }
}

fn name_step(
    state: &mut CheckInState,
    _ctx: &mut StepContext<'_>,
    _result: Option<DialogResult>,
) -> Result<StepOutcome, BotError> {
    state.guest = GuestInfo::default();
    Ok(StepOutcome::prompt(PromptOptions::text(NAME_PROMPT)))
}

fn room_step(
    state: &mut CheckInState,
    _ctx: &mut StepContext<'_>,
    result: Option<DialogResult>,
) -> Result<StepOutcome, BotError> {
    state.guest.name = expect_text(CheckInState::ID, result)?;
    Ok(StepOutcome::prompt(PromptOptions::text(ROOM_PROMPT)))
}

fn final_step(
    state: &mut CheckInState,
    ctx: &mut StepContext<'_>,
    result: Option<DialogResult>,
) -> Result<StepOutcome, BotError> {
    state.guest.room = expect_text(CheckInState::ID, result)?;
    ctx.send_text(format!(
        "Great, {}! You're checked in to room {}.",
        state.guest.name, state.guest.room
    ));
    tracing::info!(name = %state.guest.name, room = %state.guest.room, "guest checked in");
    Ok(StepOutcome::End(Some(DialogResult::Guest(state.guest.clone()))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogs::{DialogContext, DialogFrame, DialogStack, DialogTurnStatus};
    use crate::gateway::{Activity, TurnContext};
    use crate::recognizer::RuleBasedRecognizer;
    use crate::state::{BotAccessors, BotState, MemoryStorage};
    use std::sync::Arc;

    fn accessors() -> BotAccessors {
        let storage = Arc::new(MemoryStorage::new());
        BotAccessors::new(
            &BotState::conversation(storage.clone()),
            &BotState::user(storage),
        )
    }

    async fn turn(
        stack: &mut DialogStack,
        accessors: &BotAccessors,
        text: &str,
        begin: Option<DialogFrame>,
    ) -> (DialogTurnStatus, Vec<String>) {
        let recognizer = RuleBasedRecognizer::new();
        let mut turn = TurnContext::new(Activity::message("test", "conv-1", "user-1", text));
        let status = {
            let mut dc = DialogContext::new(stack, &mut turn, accessors, &recognizer);
            match begin {
                Some(frame) => dc.begin_dialog(frame).unwrap(),
                None => dc.continue_dialog().await.unwrap(),
            }
        };
        let replies = turn.responses().iter().map(|r| r.body().to_string()).collect();
        (status, replies)
    }

    #[tokio::test]
    async fn test_check_in_collects_name_and_room() {
        let accessors = accessors();
        let mut stack = DialogStack::default();

        let (status, replies) =
            turn(&mut stack, &accessors, "hello", Some(DialogFrame::check_in())).await;
        assert_eq!(status, DialogTurnStatus::Waiting);
        assert_eq!(replies, vec![NAME_PROMPT]);
        assert_eq!(stack.ids(), vec!["check_in", "prompt"]);

        let (_, replies) = turn(&mut stack, &accessors, "Alice", None).await;
        assert_eq!(replies, vec![ROOM_PROMPT]);

        let (status, replies) = turn(&mut stack, &accessors, "12", None).await;
        assert_eq!(
            status,
            DialogTurnStatus::Complete(Some(DialogResult::Guest(GuestInfo {
                name: "Alice".into(),
                room: "12".into(),
            })))
        );
        assert!(replies[0].contains("room 12"));
        assert!(stack.is_empty());
    }

    #[tokio::test]
    async fn test_blank_answer_is_reprompted() {
        let accessors = accessors();
        let mut stack = DialogStack::default();
        turn(&mut stack, &accessors, "hi", Some(DialogFrame::check_in())).await;

        let (status, replies) = turn(&mut stack, &accessors, "  ", None).await;
        assert_eq!(status, DialogTurnStatus::Waiting);
        assert_eq!(replies, vec![NAME_PROMPT]);
        assert_eq!(stack.len(), 2);
    }
}
