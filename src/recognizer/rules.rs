//! 基于规则的日期时间识别器
//!
//! 只覆盖叫醒场景常见的英文说法：today / tonight / tomorrow / 星期几、
//! `7am`、`7:30 pm`、`19:00`、`at 7`、noon / midnight、morning 等时段、
//! `in 20 minutes`、`now`。无法识别时返回空列表。

use std::sync::OnceLock;

use async_trait::async_trait;
use chrono::{
    Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc, Weekday,
};
use regex::Regex;

use super::{DateTimeRecognizer, DateTimeResolution};
use crate::core::BotError;

static RELATIVE_RE: OnceLock<Regex> = OnceLock::new();
static DAY_RE: OnceLock<Regex> = OnceLock::new();
static MERIDIEM_RE: OnceLock<Regex> = OnceLock::new();
static CLOCK_RE: OnceLock<Regex> = OnceLock::new();
static BARE_HOUR_RE: OnceLock<Regex> = OnceLock::new();
static PART_OF_DAY_RE: OnceLock<Regex> = OnceLock::new();

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M:%S";
const DATE_TIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// 一天中的时段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl PartOfDay {
    fn parse(word: &str) -> Option<Self> {
        match word {
            "morning" => Some(PartOfDay::Morning),
            "afternoon" => Some(PartOfDay::Afternoon),
            "evening" => Some(PartOfDay::Evening),
            "night" | "tonight" => Some(PartOfDay::Night),
            _ => None,
        }
    }

    fn timex(self) -> &'static str {
        match self {
            PartOfDay::Morning => "TMO",
            PartOfDay::Afternoon => "TAF",
            PartOfDay::Evening => "TEV",
            PartOfDay::Night => "TNI",
        }
    }

    /// 时段的起止（整点，终点 23:59:59 表示当天结束）
    fn bounds(self) -> (NaiveTime, NaiveTime) {
        let (start, end) = match self {
            PartOfDay::Morning => ((8, 0, 0), (12, 0, 0)),
            PartOfDay::Afternoon => ((12, 0, 0), (16, 0, 0)),
            PartOfDay::Evening => ((16, 0, 0), (20, 0, 0)),
            PartOfDay::Night => ((20, 0, 0), (23, 59, 59)),
        };
        (hms(start), hms(end))
    }

    fn is_afternoon_or_later(self) -> bool {
        !matches!(self, PartOfDay::Morning)
    }
}

fn hms((h, m, s): (u32, u32, u32)) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, s).unwrap_or(NaiveTime::MIN)
}

/// 规则识别器；未提供参考时间时使用 `utc_offset` 下的当前时间
#[derive(Debug, Clone)]
pub struct RuleBasedRecognizer {
    utc_offset: FixedOffset,
}

impl Default for RuleBasedRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleBasedRecognizer {
    pub fn new() -> Self {
        Self {
            utc_offset: Utc.fix(),
        }
    }

    /// 设置默认时区偏移（分钟）；越界时保持 UTC
    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        match minutes.checked_mul(60).and_then(FixedOffset::east_opt) {
            Some(offset) => self.utc_offset = offset,
            None => tracing::warn!(minutes, "invalid UTC offset, keeping UTC"),
        }
        self
    }

    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.utc_offset).naive_local()
    }

    /// 按给定参考时间识别
    pub fn recognize_at(&self, text: &str, reference: NaiveDateTime) -> Vec<DateTimeResolution> {
        let input = text.trim().to_lowercase();
        if input.is_empty() {
            return Vec::new();
        }

        if input == "now" || input == "right now" {
            return vec![point_date_time(reference)];
        }
        if let Some(delta) = relative_offset(&input) {
            // 超出可表示范围的偏移视为无法识别
            return delta
                .and_then(|d| reference.checked_add_signed(d))
                .map(point_date_time)
                .into_iter()
                .collect();
        }

        let date = day_reference(&input, reference.date());
        let part = part_of_day(&input);
        let times = times_of_day(&input, part);

        match (date, times.is_empty(), part) {
            (Some(date), false, _) => times
                .into_iter()
                .map(|t| point_date_time(date.and_time(t)))
                .collect(),
            (None, false, _) => times
                .into_iter()
                .map(|t| {
                    DateTimeResolution::point(
                        format!("T{}", t.format("%H:%M")),
                        t.format(TIME_FMT).to_string(),
                    )
                })
                .collect(),
            (Some(date), true, Some(part)) => {
                let (start, end) = part.bounds();
                vec![DateTimeResolution::range(
                    format!("{}{}", date.format(DATE_FMT), part.timex()),
                    date.and_time(start).format(DATE_TIME_FMT).to_string(),
                    date.and_time(end).format(DATE_TIME_FMT).to_string(),
                )]
            }
            (None, true, Some(part)) => {
                let (start, end) = part.bounds();
                vec![DateTimeResolution::range(
                    part.timex(),
                    start.format(TIME_FMT).to_string(),
                    end.format(TIME_FMT).to_string(),
                )]
            }
            (Some(date), true, None) => {
                let day = date.format(DATE_FMT).to_string();
                vec![DateTimeResolution::point(day.clone(), day)]
            }
            (None, true, None) => Vec::new(),
        }
    }
}

#[async_trait]
impl DateTimeRecognizer for RuleBasedRecognizer {
    async fn recognize(
        &self,
        text: &str,
        reference: Option<NaiveDateTime>,
    ) -> Result<Vec<DateTimeResolution>, BotError> {
        let reference = reference.unwrap_or_else(|| self.now());
        let candidates = self.recognize_at(text, reference);
        tracing::debug!(text, candidates = candidates.len(), "date/time recognized");
        Ok(candidates)
    }
}

fn point_date_time(at: NaiveDateTime) -> DateTimeResolution {
    DateTimeResolution::point(
        at.format("%Y-%m-%dT%H:%M").to_string(),
        at.format(DATE_TIME_FMT).to_string(),
    )
}

/// `in 20 minutes` / `in an hour`
///
/// 外层 `None` 表示不是相对时间说法；内层 `None` 表示数值越界
fn relative_offset(input: &str) -> Option<Option<Duration>> {
    let re = RELATIVE_RE.get_or_init(|| {
        Regex::new(r"\bin\s+(\d{1,6}|an?|one)\s+(minute|min|hour|hr)s?\b").unwrap()
    });
    let caps = re.captures(input)?;
    let amount: Option<i64> = match &caps[1] {
        "a" | "an" | "one" => Some(1),
        n => n.parse().ok(),
    };
    let delta = if caps[2].starts_with('h') {
        amount.and_then(Duration::try_hours)
    } else {
        amount.and_then(Duration::try_minutes)
    };
    Some(delta)
}

fn day_reference(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let re = DAY_RE.get_or_init(|| {
        Regex::new(concat!(
            r"\b(day after tomorrow|tomorrow|today|tonight|",
            r"monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b"
        ))
        .unwrap()
    });
    let word = re.captures(input)?.get(1)?.as_str();
    let days_ahead = match word {
        "today" | "tonight" => 0,
        "tomorrow" => 1,
        "day after tomorrow" => 2,
        weekday => {
            let target: Weekday = weekday.parse().ok()?;
            let diff = (7 + target.num_days_from_monday() as i64
                - today.weekday().num_days_from_monday() as i64)
                % 7;
            if diff == 0 {
                7
            } else {
                diff
            }
        }
    };
    today.checked_add_signed(Duration::days(days_ahead))
}

fn part_of_day(input: &str) -> Option<PartOfDay> {
    let re = PART_OF_DAY_RE
        .get_or_init(|| Regex::new(r"\b(morning|afternoon|evening|night|tonight)\b").unwrap());
    PartOfDay::parse(re.captures(input)?.get(1)?.as_str())
}

/// 识别一天中的时刻；`at 7` 这类不带上下午的说法在没有时段提示时给出两个候选
fn times_of_day(input: &str, part: Option<PartOfDay>) -> Vec<NaiveTime> {
    if has_word(input, "noon") || has_word(input, "midday") {
        return vec![hms((12, 0, 0))];
    }
    if has_word(input, "midnight") {
        return vec![NaiveTime::MIN];
    }

    let meridiem = MERIDIEM_RE.get_or_init(|| {
        Regex::new(r"\b(\d{1,2})(?::(\d{2}))?\s*(am|pm|a\.m\.|p\.m\.)").unwrap()
    });
    if let Some(caps) = meridiem.captures(input) {
        let hour: u32 = caps[1].parse().unwrap_or(0);
        let minute: u32 = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        if !(1..=12).contains(&hour) {
            return Vec::new();
        }
        let pm = caps[3].starts_with('p');
        let hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, false) => h,
            (h, true) => h + 12,
        };
        return NaiveTime::from_hms_opt(hour, minute, 0).into_iter().collect();
    }

    let clock = CLOCK_RE.get_or_init(|| Regex::new(r"\b(\d{1,2}):(\d{2})\b").unwrap());
    if let Some(caps) = clock.captures(input) {
        let hour: u32 = caps[1].parse().unwrap_or(99);
        let minute: u32 = caps[2].parse().unwrap_or(99);
        return NaiveTime::from_hms_opt(hour, minute, 0).into_iter().collect();
    }

    let bare = BARE_HOUR_RE.get_or_init(|| Regex::new(r"(?:\bat|@)\s*(\d{1,2})\b").unwrap());
    if let Some(caps) = bare.captures(input) {
        let hour: u32 = caps[1].parse().unwrap_or(99);
        return match (hour, part) {
            (0 | 13..=23, _) => NaiveTime::from_hms_opt(hour, 0, 0).into_iter().collect(),
            (1..=11, Some(p)) if p.is_afternoon_or_later() => vec![hms((hour + 12, 0, 0))],
            (1..=12, Some(_)) => vec![hms((hour, 0, 0))],
            (1..=11, None) => vec![hms((hour, 0, 0)), hms((hour + 12, 0, 0))],
            (12, None) => vec![hms((12, 0, 0)), NaiveTime::MIN],
            _ => Vec::new(),
        };
    }

    Vec::new()
}

fn has_word(input: &str, word: &str) -> bool {
    input
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| w == word)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> NaiveDateTime {
        // 2026-10-19 是星期一
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(21, 30, 0)
            .unwrap()
    }

    fn values(candidates: &[DateTimeResolution]) -> Vec<&str> {
        candidates.iter().filter_map(|c| c.value.as_deref()).collect()
    }

    #[test]
    fn test_tomorrow_with_meridiem() {
        let r = RuleBasedRecognizer::new();
        let got = r.recognize_at("tomorrow 7am", reference());
        assert_eq!(values(&got), vec!["2026-10-20 07:00:00"]);
        assert_eq!(got[0].timex.as_deref(), Some("2026-10-20T07:00"));
    }

    #[test]
    fn test_time_only() {
        let r = RuleBasedRecognizer::new();
        assert_eq!(values(&r.recognize_at("6:45 pm", reference())), vec!["18:45:00"]);
        assert_eq!(values(&r.recognize_at("at 19:15", reference())), vec!["19:15:00"]);
        assert_eq!(values(&r.recognize_at("12am", reference())), vec!["00:00:00"]);
    }

    #[test]
    fn test_ambiguous_hour_gives_two_candidates() {
        let r = RuleBasedRecognizer::new();
        let got = r.recognize_at("wake me at 7", reference());
        assert_eq!(values(&got), vec!["07:00:00", "19:00:00"]);

        let evening = r.recognize_at("tomorrow evening at 7", reference());
        assert_eq!(values(&evening), vec!["2026-10-20 19:00:00"]);
    }

    #[test]
    fn test_part_of_day_is_a_range() {
        let r = RuleBasedRecognizer::new();
        let afternoon = r.recognize_at("tomorrow afternoon", reference());
        assert_eq!(afternoon[0].start.as_deref(), Some("2026-10-20 12:00:00"));

        let got = r.recognize_at("tomorrow morning", reference());
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].value, None);
        assert_eq!(got[0].start.as_deref(), Some("2026-10-20 08:00:00"));
        assert_eq!(got[0].end.as_deref(), Some("2026-10-20 12:00:00"));
        assert_eq!(got[0].timex.as_deref(), Some("2026-10-20TMO"));
    }

    #[test]
    fn test_relative_and_weekday() {
        let r = RuleBasedRecognizer::new();
        assert_eq!(
            values(&r.recognize_at("in 30 minutes", reference())),
            vec!["2026-10-19 22:00:00"]
        );
        assert_eq!(
            values(&r.recognize_at("in an hour", reference())),
            vec!["2026-10-19 22:30:00"]
        );
        // 当天是星期一，"monday" 指下周一
        assert_eq!(values(&r.recognize_at("monday", reference())), vec!["2026-10-26"]);
        assert_eq!(
            values(&r.recognize_at("friday noon", reference())),
            vec!["2026-10-23 12:00:00"]
        );
    }

    #[test]
    fn test_unrecognized_input_is_empty() {
        let r = RuleBasedRecognizer::new();
        assert!(r.recognize_at("whenever you like", reference()).is_empty());
        assert!(r.recognize_at("   ", reference()).is_empty());
        assert!(r.recognize_at("13pm", reference()).is_empty());
    }

    #[test]
    fn test_huge_relative_offset_is_unrecognized() {
        let r = RuleBasedRecognizer::new();
        assert!(r.recognize_at("in 9999999999 hours", reference()).is_empty());
        assert!(r.recognize_at("in 99999999999999 minutes", reference()).is_empty());
        // 六位数以内可以计算，但超出日期范围
        assert!(r.recognize_at("in 999999 hours", NaiveDateTime::MAX).is_empty());
        assert_eq!(r.recognize_at("in 999999 minutes", reference()).len(), 1);
    }

    #[test]
    fn test_out_of_range_utc_offset_keeps_utc() {
        let r = RuleBasedRecognizer::new().with_utc_offset_minutes(i32::MAX);
        assert_eq!(r.utc_offset, Utc.fix());
    }

    #[tokio::test]
    async fn test_trait_uses_supplied_reference() {
        let r = RuleBasedRecognizer::new().with_utc_offset_minutes(120);
        let got = r.recognize("tomorrow 7am", Some(reference())).await.unwrap();
        assert_eq!(values(&got), vec!["2026-10-20 07:00:00"]);
    }
}
