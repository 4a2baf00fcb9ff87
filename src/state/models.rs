//! 持久化的业务记录

use serde::{Deserialize, Serialize};

/// 入住客人信息（入住登记对话逐步填写）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestInfo {
    pub name: String,
    pub room: String,
}

/// 叫醒闹钟：识别器给出的时间点（或时间段起点）的规范值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WakeUpInfo {
    pub time: String,
}

/// 订桌信息（订桌对话尚未实现，仅占位）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {}

/// 每个用户一份，存放在用户级状态的 `UserInfo` 属性中
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default)]
    pub guest: Option<GuestInfo>,
    #[serde(default)]
    pub table: Option<TableInfo>,
    #[serde(default)]
    pub wake_up: Option<WakeUpInfo>,
}

impl UserInfo {
    /// 已登记的客人姓名（空字符串视为未登记）
    pub fn guest_name(&self) -> Option<&str> {
        self.guest
            .as_ref()
            .map(|g| g.name.as_str())
            .filter(|name| !name.is_empty())
    }

    pub fn room(&self) -> Option<&str> {
        self.guest
            .as_ref()
            .map(|g| g.room.as_str())
            .filter(|room| !room.is_empty())
    }
}
