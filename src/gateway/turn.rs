//! 回合上下文：一条入站活动的处理范围
//!
//! 出站消息先缓冲在这里，回合成功结束后由适配器统一交给渠道。

use super::message::{Activity, OutboundMessage};
use crate::state::TurnState;

pub struct TurnContext {
    activity: Activity,
    state: TurnState,
    responses: Vec<OutboundMessage>,
}

impl TurnContext {
    pub fn new(activity: Activity) -> Self {
        Self {
            activity,
            state: TurnState::default(),
            responses: Vec::new(),
        }
    }

    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    pub fn state(&self) -> &TurnState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut TurnState {
        &mut self.state
    }

    pub fn send(&mut self, message: OutboundMessage) {
        tracing::debug!(reply = %message, "queued reply");
        self.responses.push(message);
    }

    pub fn send_text(&mut self, text: impl Into<String>) {
        self.send(OutboundMessage::text(text));
    }

    pub fn responses(&self) -> &[OutboundMessage] {
        &self.responses
    }

    pub fn into_responses(self) -> Vec<OutboundMessage> {
        self.responses
    }
}
