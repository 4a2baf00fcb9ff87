//! 会话级 / 用户级状态与属性访问器
//!
//! 每个作用域在存储中占一个键（整块 JSON 对象），回合开始时整体读入 `TurnState`
//! 缓存，回合内的所有读写只落在缓存上，回合结束时一次性写回。
//! 回合中途失败或被取消时缓存直接丢弃，存储保持回合开始前的状态。

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::storage::{Storage, StoreItems};
use crate::core::BotError;
use crate::gateway::{Activity, TurnContext};

/// 状态作用域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateScope {
    /// 按 channel + conversation 隔离
    Conversation,
    /// 按 channel + 用户隔离
    User,
}

impl StateScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateScope::Conversation => "conversation",
            StateScope::User => "user",
        }
    }
}

/// 单个作用域在本回合内的缓存
#[derive(Debug, Clone, Default)]
pub struct CachedState {
    values: Map<String, Value>,
    /// 读入（或上次保存）时的内容，用于判断是否需要写回
    original: Map<String, Value>,
}

impl CachedState {
    fn from_stored(value: Option<Value>) -> Self {
        let values = match value {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Self {
            original: values.clone(),
            values,
        }
    }

    pub fn is_changed(&self) -> bool {
        self.values != self.original
    }
}

/// 本回合已读入的两个作用域缓存
#[derive(Debug, Default)]
pub struct TurnState {
    conversation: Option<CachedState>,
    user: Option<CachedState>,
}

impl TurnState {
    fn slot(&mut self, scope: StateScope) -> &mut Option<CachedState> {
        match scope {
            StateScope::Conversation => &mut self.conversation,
            StateScope::User => &mut self.user,
        }
    }

    pub fn is_loaded(&self, scope: StateScope) -> bool {
        match scope {
            StateScope::Conversation => self.conversation.is_some(),
            StateScope::User => self.user.is_some(),
        }
    }

    fn cache(&self, scope: StateScope) -> Result<&CachedState, BotError> {
        let cache = match scope {
            StateScope::Conversation => self.conversation.as_ref(),
            StateScope::User => self.user.as_ref(),
        };
        cache.ok_or(BotError::StateNotLoaded(scope.as_str()))
    }

    fn cache_mut(&mut self, scope: StateScope) -> Result<&mut CachedState, BotError> {
        self.slot(scope)
            .as_mut()
            .ok_or(BotError::StateNotLoaded(scope.as_str()))
    }
}

/// 某个作用域的状态：负责计算存储键、读入缓存、写回
#[derive(Clone)]
pub struct BotState {
    storage: Arc<dyn Storage>,
    scope: StateScope,
}

impl BotState {
    pub fn new(storage: Arc<dyn Storage>, scope: StateScope) -> Self {
        Self { storage, scope }
    }

    pub fn conversation(storage: Arc<dyn Storage>) -> Self {
        Self::new(storage, StateScope::Conversation)
    }

    pub fn user(storage: Arc<dyn Storage>) -> Self {
        Self::new(storage, StateScope::User)
    }

    /// 存储键：`{channelId}/conversations/{conversationId}` 或 `{channelId}/users/{fromId}`
    pub fn storage_key(&self, activity: &Activity) -> Result<String, BotError> {
        if activity.channel_id.is_empty() {
            return Err(BotError::InvalidActivity("missing channelId".into()));
        }
        match self.scope {
            StateScope::Conversation => {
                let id = &activity.conversation.id;
                if id.is_empty() {
                    return Err(BotError::InvalidActivity("missing conversation.id".into()));
                }
                Ok(format!("{}/conversations/{}", activity.channel_id, id))
            }
            StateScope::User => {
                let id = &activity.from.id;
                if id.is_empty() {
                    return Err(BotError::InvalidActivity("missing from.id".into()));
                }
                Ok(format!("{}/users/{}", activity.channel_id, id))
            }
        }
    }

    /// 读入缓存；已读入且未强制时不重复读取
    pub async fn load(&self, turn: &mut TurnContext, force: bool) -> Result<(), BotError> {
        if !force && turn.state().is_loaded(self.scope) {
            return Ok(());
        }
        let key = self.storage_key(turn.activity())?;
        let mut items = self.storage.read(std::slice::from_ref(&key)).await?;
        let cache = CachedState::from_stored(items.remove(&key));
        *turn.state_mut().slot(self.scope) = Some(cache);
        tracing::debug!(scope = self.scope.as_str(), %key, "state loaded");
        Ok(())
    }

    /// 本作用域待写回的 (键, 内容)；内容未变化且未强制时为 None
    pub fn pending_changes(
        &self,
        turn: &TurnContext,
        force: bool,
    ) -> Result<Option<(String, Value)>, BotError> {
        let key = self.storage_key(turn.activity())?;
        let cache = turn.state().cache(self.scope)?;
        if !force && !cache.is_changed() {
            return Ok(None);
        }
        Ok(Some((key, Value::Object(cache.values.clone()))))
    }

    fn mark_saved(&self, turn: &mut TurnContext) -> Result<(), BotError> {
        let cache = turn.state_mut().cache_mut(self.scope)?;
        cache.original = cache.values.clone();
        Ok(())
    }

    /// 写回本作用域
    pub async fn save_changes(&self, turn: &mut TurnContext, force: bool) -> Result<(), BotError> {
        Self::save_all(&[self], turn, force).await
    }

    /// 把多个作用域的改动合并成一次 `Storage::write`，要么全部写入要么都不写。
    /// 各作用域必须共用同一个存储。
    pub async fn save_all(
        states: &[&BotState],
        turn: &mut TurnContext,
        force: bool,
    ) -> Result<(), BotError> {
        let Some(first) = states.first() else {
            return Ok(());
        };

        let mut changes = StoreItems::new();
        for state in states {
            if let Some((key, value)) = state.pending_changes(turn, force)? {
                changes.insert(key, value);
            }
        }
        if changes.is_empty() {
            return Ok(());
        }

        let keys: Vec<String> = changes.keys().cloned().collect();
        first.storage.write(changes).await?;
        for state in states {
            state.mark_saved(turn)?;
        }
        tracing::debug!(?keys, "state saved");
        Ok(())
    }

    /// 创建本作用域下的具名属性访问器
    pub fn create_property<T>(&self, name: impl Into<String>) -> StatePropertyAccessor<T> {
        StatePropertyAccessor {
            scope: self.scope,
            name: name.into(),
            _marker: PhantomData,
        }
    }
}

/// 具名属性的类型化访问器（只读写回合缓存）
pub struct StatePropertyAccessor<T> {
    scope: StateScope,
    name: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for StatePropertyAccessor<T> {
    fn clone(&self) -> Self {
        Self {
            scope: self.scope,
            name: self.name.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for StatePropertyAccessor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatePropertyAccessor")
            .field("scope", &self.scope)
            .field("name", &self.name)
            .finish()
    }
}

impl<T: Serialize + DeserializeOwned> StatePropertyAccessor<T> {
    pub fn get(&self, turn: &TurnContext) -> Result<Option<T>, BotError> {
        let cache = turn.state().cache(self.scope)?;
        match cache.values.get(&self.name) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// 读取属性；不存在时用 `default` 创建并写入缓存
    pub fn get_or_default(
        &self,
        turn: &mut TurnContext,
        default: impl FnOnce() -> T,
    ) -> Result<T, BotError> {
        if let Some(value) = self.get(turn)? {
            return Ok(value);
        }
        let value = default();
        self.set(turn, &value)?;
        Ok(value)
    }

    pub fn set(&self, turn: &mut TurnContext, value: &T) -> Result<(), BotError> {
        let value = serde_json::to_value(value)?;
        turn.state_mut()
            .cache_mut(self.scope)?
            .values
            .insert(self.name.clone(), value);
        Ok(())
    }

    pub fn delete(&self, turn: &mut TurnContext) -> Result<(), BotError> {
        turn.state_mut().cache_mut(self.scope)?.values.remove(&self.name);
        Ok(())
    }
}
