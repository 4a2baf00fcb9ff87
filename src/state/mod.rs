//! 状态层：键值存储、会话级 / 用户级状态缓存、属性访问器、业务记录

mod accessors;
mod bot_state;
mod models;
mod storage;

pub use accessors::{
    BotAccessors, ALARM_STATE_PROPERTY, DIALOG_STATE_PROPERTY, USER_INFO_PROPERTY,
};
pub use bot_state::{BotState, CachedState, StatePropertyAccessor, StateScope, TurnState};
pub use models::{GuestInfo, TableInfo, UserInfo, WakeUpInfo};
pub use storage::{
    create_storage, FileStorage, MemoryStorage, Storage, StorageError, StoreItems,
};
