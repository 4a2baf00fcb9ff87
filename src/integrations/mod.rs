//! 外部渠道集成（需对应 feature）

#[cfg(feature = "http")]
pub mod http;
