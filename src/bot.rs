//! 回合分发器：每条入站活动执行一次
//!
//! 读入会话级与用户级状态 → 继续栈顶对话 → 按完成结果更新用户记录 →
//! 栈为空时按是否已登记启动入住登记或主菜单 → 回合结束时统一保存两份状态。

use std::sync::Arc;

use crate::config::AppConfig;
use crate::core::BotError;
use crate::dialogs::{
    DialogContext, DialogFrame, DialogResult, DialogStack, DialogTurnStatus, DEFAULT_MAX_DEPTH,
    MIN_MAX_DEPTH,
};
use crate::gateway::TurnContext;
use crate::recognizer::{DateTimeRecognizer, RuleBasedRecognizer};
use crate::state::{create_storage, BotAccessors, BotState, Storage, UserInfo};

/// 酒店前台机器人
pub struct ConciergeBot {
    conversation_state: BotState,
    user_state: BotState,
    accessors: BotAccessors,
    recognizer: Arc<dyn DateTimeRecognizer>,
    max_depth: usize,
}

impl std::fmt::Debug for ConciergeBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConciergeBot")
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

/// 机器人构建器：存储与识别器是必需的
#[derive(Default)]
pub struct ConciergeBotBuilder {
    storage: Option<Arc<dyn Storage>>,
    recognizer: Option<Arc<dyn DateTimeRecognizer>>,
    max_depth: Option<usize>,
}

impl ConciergeBotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_recognizer(mut self, recognizer: Arc<dyn DateTimeRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn build(self) -> Result<ConciergeBot, BotError> {
        let storage = self.storage.ok_or(BotError::NullArgument("storage"))?;
        let recognizer = self.recognizer.ok_or(BotError::NullArgument("recognizer"))?;

        let conversation_state = BotState::conversation(storage.clone());
        let user_state = BotState::user(storage);
        let accessors = BotAccessors::new(&conversation_state, &user_state);

        Ok(ConciergeBot {
            conversation_state,
            user_state,
            accessors,
            recognizer,
            max_depth: self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
        })
    }
}

impl ConciergeBot {
    pub fn builder() -> ConciergeBotBuilder {
        ConciergeBotBuilder::new()
    }

    /// 按配置创建存储后端与规则识别器
    pub fn from_config(config: &AppConfig) -> Result<Self, BotError> {
        if config.dialogs.max_depth < MIN_MAX_DEPTH {
            return Err(BotError::Config(format!(
                "dialogs.max_depth must be at least {}, got {}",
                MIN_MAX_DEPTH, config.dialogs.max_depth
            )));
        }
        let recognizer = RuleBasedRecognizer::new()
            .with_utc_offset_minutes(config.recognizer.utc_offset_minutes);
        Self::builder()
            .with_storage(create_storage(&config.storage))
            .with_recognizer(Arc::new(recognizer))
            .with_max_depth(config.dialogs.max_depth)
            .build()
    }

    pub fn accessors(&self) -> &BotAccessors {
        &self.accessors
    }

    pub fn conversation_state(&self) -> &BotState {
        &self.conversation_state
    }

    pub fn user_state(&self) -> &BotState {
        &self.user_state
    }

    /// 处理一个回合；出错时不保存任何状态
    pub async fn on_turn(&self, turn: &mut TurnContext) -> Result<(), BotError> {
        self.conversation_state.load(turn, false).await?;
        self.user_state.load(turn, false).await?;

        let activity = turn.activity();
        if !activity.is_message() {
            let notice = format!("{} event detected", activity.activity_type);
            tracing::debug!(activity_type = %activity.activity_type, "non-message activity");
            turn.send_text(notice);
        } else {
            self.run_dialogs(turn).await?;
        }

        // 两个作用域合并成一次写入
        BotState::save_all(&[&self.conversation_state, &self.user_state], turn, true).await
    }

    async fn run_dialogs(&self, turn: &mut TurnContext) -> Result<(), BotError> {
        let mut stack = self
            .accessors
            .dialog_state
            .get_or_default(turn, DialogStack::default)?;
        let user_info = self
            .accessors
            .user_info
            .get_or_default(turn, UserInfo::default)?;

        {
            let mut dc = DialogContext::new(
                &mut stack,
                turn,
                &self.accessors,
                self.recognizer.as_ref(),
            )
            .with_max_depth(self.max_depth);

            match dc.continue_dialog().await? {
                DialogTurnStatus::Complete(Some(DialogResult::Guest(guest))) => {
                    tracing::info!(name = %guest.name, room = %guest.room, "check-in complete");
                    let mut info = user_info.clone();
                    info.guest = Some(guest);
                    self.accessors.user_info.set(dc.turn_mut(), &info)?;
                    dc.begin_dialog(DialogFrame::main_menu())?;
                }
                DialogTurnStatus::Complete(other) => {
                    tracing::warn!(
                        kind = other.as_ref().map(DialogResult::kind).unwrap_or("none"),
                        "unexpected result at top level"
                    );
                }
                DialogTurnStatus::Empty => {
                    let frame = if user_info.guest_name().is_some() {
                        DialogFrame::main_menu()
                    } else {
                        DialogFrame::check_in()
                    };
                    dc.begin_dialog(frame)?;
                }
                DialogTurnStatus::Waiting => {}
            }
        }

        self.accessors.dialog_state.set(turn, &stack)?;
        Ok(())
    }
}
