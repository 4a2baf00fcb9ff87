//! 日期时间识别
//!
//! 给定自由文本，返回按可能性排序的候选解析结果。每个候选可能给出时间点（value）
//! 或时间段（start / end）；空列表是合法结果，调用方必须自行处理。

mod rules;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::core::BotError;

pub use rules::RuleBasedRecognizer;

/// 单个候选解析结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateTimeResolution {
    /// TIMEX 表达式（如 `2026-10-20T07:00`、`TMO`）
    #[serde(default)]
    pub timex: Option<String>,
    /// 时间点的规范值（`2026-10-20 07:00:00`、`07:00:00`、`2026-10-20`）
    #[serde(default)]
    pub value: Option<String>,
    /// 时间段起点
    #[serde(default)]
    pub start: Option<String>,
    /// 时间段终点
    #[serde(default)]
    pub end: Option<String>,
}

impl DateTimeResolution {
    pub fn point(timex: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            timex: Some(timex.into()),
            value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn range(
        timex: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        Self {
            timex: Some(timex.into()),
            start: Some(start.into()),
            end: Some(end.into()),
            ..Self::default()
        }
    }

    /// 时间点优先，否则取时间段起点
    pub fn point_or_start(&self) -> Option<&str> {
        self.value.as_deref().or(self.start.as_deref())
    }
}

/// 日期时间识别器接口（可替换为外部 NLU 服务）
#[async_trait]
pub trait DateTimeRecognizer: Send + Sync {
    /// `reference` 为用户本地的"现在"；未提供时由识别器自行决定参考时间
    async fn recognize(
        &self,
        text: &str,
        reference: Option<NaiveDateTime>,
    ) -> Result<Vec<DateTimeResolution>, BotError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_takes_precedence_over_start() {
        let both = DateTimeResolution {
            timex: None,
            value: Some("07:00:00".into()),
            start: Some("06:00:00".into()),
            end: None,
        };
        assert_eq!(both.point_or_start(), Some("07:00:00"));

        let range = DateTimeResolution::range("TMO", "08:00:00", "12:00:00");
        assert_eq!(range.point_or_start(), Some("08:00:00"));

        assert_eq!(DateTimeResolution::default().point_or_start(), None);
    }
}
