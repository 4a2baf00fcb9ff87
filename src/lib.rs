//! Concierge - 酒店前台对话机器人
//!
//! 模块划分：
//! - **bot**: 回合分发器（入住登记 / 主菜单的启动与结果处理）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、优雅关闭
//! - **dialogs**: 对话栈运行时与三个组件对话（入住登记、叫醒闹钟、主菜单）
//! - **gateway**: 活动 / 回复模型、回合上下文、适配器、控制台渠道
//! - **integrations**: HTTP 渠道（feature `http`）
//! - **observability**: 日志初始化
//! - **recognizer**: 日期时间识别
//! - **state**: 键值存储、会话级 / 用户级状态、属性访问器

pub mod bot;
pub mod config;
pub mod core;
pub mod dialogs;
pub mod gateway;
pub mod integrations;
pub mod observability;
pub mod recognizer;
pub mod state;

pub use bot::{ConciergeBot, ConciergeBotBuilder};
pub use crate::core::BotError;
