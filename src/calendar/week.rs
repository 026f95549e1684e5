use std::fmt::Display;

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::layout::EntryBlock;
use crate::time_entry::TimeEntry;

/// カレンダーの表示モード。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ArgEnum)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Day,
    #[default]
    Week,
}

/// 1日分のtime entryの集計。
///
/// 描画ごとに作り直す値オブジェクトで、`total_duration`は`entries`の`duration`の合計になる。
#[derive(Clone, Debug, PartialEq)]
pub struct WeekDay {
    pub date: NaiveDate,
    /// 曜日の略称 (`Mon`など)
    pub day_name: String,
    pub day_number: u32,
    /// 秒単位の合計時間
    pub total_duration: i64,
    pub entries: Vec<TimeEntry>,
}

impl WeekDay {
    fn new(date: NaiveDate, entries: Vec<TimeEntry>) -> Self {
        let total_duration = entries.iter().map(|entry| entry.duration).sum();
        Self {
            date,
            day_name: date.format("%a").to_string(),
            day_number: date.day(),
            total_duration,
            entries,
        }
    }

    /// 描画用に各time entryを配置する。
    pub fn layout<Tz: TimeZone>(&self, tz: &Tz, now: DateTime<Utc>) -> DayLayout
    where
        Tz::Offset: Display,
    {
        DayLayout {
            date: self.date,
            day_name: self.day_name.clone(),
            day_number: self.day_number,
            total_duration: self.total_duration,
            blocks: self
                .entries
                .iter()
                .map(|entry| EntryBlock::layout(entry, tz, now))
                .collect(),
        }
    }
}

/// 1日分の配置済みブロック。
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DayLayout {
    pub date: NaiveDate,
    pub day_name: String,
    pub day_number: u32,
    pub total_duration: i64,
    pub blocks: Vec<EntryBlock>,
}

/// 表示する日付の一覧を返す。
///
/// 週表示の場合は`anchor`を含む月曜始まりの7日間、日表示の場合は`anchor`のみを返す。
pub fn visible_dates(anchor: NaiveDate, mode: ViewMode) -> Vec<NaiveDate> {
    match mode {
        ViewMode::Day => vec![anchor],
        ViewMode::Week => {
            let monday = anchor - Duration::days(anchor.weekday().num_days_from_monday() as i64);
            (0..7).map(|offset| monday + Duration::days(offset)).collect()
        }
    }
}

/// time entryを開始日ごとに振り分ける。
///
/// 開始時刻を`tz`に変換した日付で振り分け、表示する日付に含まれないtime entryは除外する。
/// 各日のtime entryは開始時刻順に並べる。
pub fn group_by_day<Tz: TimeZone>(
    entries: &[TimeEntry],
    dates: &[NaiveDate],
    tz: &Tz,
) -> Vec<WeekDay> {
    dates
        .iter()
        .map(|date| {
            let mut day_entries: Vec<TimeEntry> = entries
                .iter()
                .filter(|entry| entry.start.with_timezone(tz).date_naive() == *date)
                .cloned()
                .collect();
            day_entries.sort_by_key(|entry| entry.start);
            WeekDay::new(*date, day_entries)
        })
        .collect()
}

/// 表示する日付を取得するためのUTCの範囲を返す。
///
/// `tz`で最初の日の00:00:00から最後の日の翌日00:00:00までの半開区間とする。
pub fn fetch_range<Tz: TimeZone>(
    dates: &[NaiveDate],
    tz: &Tz,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let first = dates.iter().min().context("No dates to fetch")?;
    let last = dates.iter().max().context("No dates to fetch")?;
    let start_at = local_midnight(*first, tz)?;
    let end_at = local_midnight(*last + Duration::days(1), tz)?;

    Ok((start_at, end_at))
}

fn local_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<DateTime<Utc>> {
    let naive_datetime = date
        .and_hms_opt(0, 0, 0)
        .context("Failed to set hour, minute, and second")?;
    let datetime = tz
        .from_local_datetime(&naive_datetime)
        .earliest()
        .with_context(|| format!("Failed to resolve local midnight of {}", date))?
        .with_timezone(&Utc);

    Ok(datetime)
}
