use std::fmt::Display;

use chrono::{DateTime, TimeZone, Timelike, Utc};
use serde::Serialize;

use super::color::{color_class, ColorClass};
use crate::time_entry::TimeEntry;

/// 1時間あたりの高さ(px)。
pub const HOUR_HEIGHT: f64 = 70.0;

/// ブロックの最小の高さ(px)。短いtime entryでもクリックできるようにする。
pub const MIN_BLOCK_HEIGHT: f64 = 24.0;

/// 24時間分のトラックの高さ(px)。
pub const TRACK_HEIGHT: f64 = 24.0 * HOUR_HEIGHT;

const PX_PER_MINUTE: f64 = HOUR_HEIGHT / 60.0;

/// 時間グリッド上のブロックの位置。
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BlockPosition {
    pub top: f64,
    pub height: f64,
}

impl BlockPosition {
    /// 24時間のトラックからはみ出すかどうかを返す。
    pub fn overflows_track(&self) -> bool {
        self.top + self.height > TRACK_HEIGHT
    }
}

/// 開始時刻と経過秒数からブロックの位置を計算する。
///
/// 秒は切り捨てて、時と分のみで`top`を決める。
/// トラックからはみ出す場合もクランプしない。
///
/// # Arguments
///
/// * `start` - 表示するタイムゾーンでの開始時刻
/// * `duration` - 秒単位の経過時間
pub fn position<T: Timelike>(start: &T, duration: i64) -> BlockPosition {
    let top = start.hour() as f64 * HOUR_HEIGHT + start.minute() as f64 * PX_PER_MINUTE;
    let minutes = duration as f64 / 60.0;
    let height = (minutes * PX_PER_MINUTE).max(MIN_BLOCK_HEIGHT);

    BlockPosition { top, height }
}

/// 描画用に配置済みのtime entry。
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntryBlock {
    pub id: i64,
    pub description: String,
    pub project: Option<String>,
    pub task: Option<String>,
    pub billable: bool,
    pub tags: Vec<String>,
    /// 表示するタイムゾーンでの開始時刻 (`HH:MM`)
    pub start: String,
    /// 表示するタイムゾーンでの終了時刻 (`HH:MM`)。実行中の場合は`None`
    pub stop: Option<String>,
    pub running: bool,
    pub color_class: ColorClass,
    pub color: Option<String>,
    #[serde(flatten)]
    pub position: BlockPosition,
}

impl EntryBlock {
    /// time entryをグリッド上に配置する。
    ///
    /// # Arguments
    ///
    /// * `entry` - 配置するtime entry
    /// * `tz` - 表示するタイムゾーン
    /// * `now` - 実行中のtime entryの長さを決めるための現在時刻
    pub fn layout<Tz: TimeZone>(entry: &TimeEntry, tz: &Tz, now: DateTime<Utc>) -> Self
    where
        Tz::Offset: Display,
    {
        let start = entry.start.with_timezone(tz);
        let position = position(&start, entry.elapsed_seconds(now));
        if position.overflows_track() {
            log::warn!(
                "time entry {} overflows the day track: top={:.2}, height={:.2}",
                entry.id,
                position.top,
                position.height
            );
        }

        Self {
            id: entry.id,
            description: entry.description.clone(),
            project: entry.project.as_ref().map(|project| project.name.clone()),
            task: entry.task.as_ref().map(|task| task.title.clone()),
            billable: entry.billable,
            tags: entry.tags.clone(),
            start: start.format("%H:%M").to_string(),
            stop: entry
                .stop
                .map(|stop| stop.with_timezone(tz).format("%H:%M").to_string()),
            running: entry.is_running(),
            color_class: color_class(entry),
            color: entry.color.clone(),
            position,
        }
    }
}
