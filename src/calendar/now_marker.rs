use chrono::Timelike;
use serde::{Deserialize, Serialize};

use super::layout::HOUR_HEIGHT;

/// 現在時刻を示すためのグリッドの種類。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ArgEnum)]
#[serde(rename_all = "lowercase")]
pub enum HourGrid {
    /// 6:00 AMから11:00 PMまで
    Legacy,
    /// 24時間すべて
    #[default]
    Full,
}

impl HourGrid {
    fn first_hour(&self) -> u32 {
        match self {
            HourGrid::Legacy => 6,
            HourGrid::Full => 0,
        }
    }

    /// グリッドの行のラベルを返す。
    pub fn slots(&self) -> Vec<String> {
        (self.first_hour()..24).map(hour_label).collect()
    }
}

/// 時刻のラベルを12時間表記で返す。
///
/// # Examples
///
/// ```
/// assert_eq!(hour_label(0), "12:00 AM");
/// assert_eq!(hour_label(13), "1:00 PM");
/// ```
pub fn hour_label(hour: u32) -> String {
    let suffix = if hour < 12 { "AM" } else { "PM" };
    let display = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:00 {}", display, suffix)
}

/// 現在時刻の位置。
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NowMarker {
    pub slot_index: usize,
    pub label: String,
    /// 行の中での位置 (0.0以上1.0未満)
    pub fraction: f64,
}

impl NowMarker {
    /// グリッドの先頭からの位置(px)を返す。
    pub fn offset_px(&self) -> f64 {
        (self.slot_index as f64 + self.fraction) * HOUR_HEIGHT
    }
}

/// 現在時刻に対応する行と行内の位置を計算する。
///
/// グリッドに該当する行がない場合は`None`を返す。
pub fn now_marker<T: Timelike>(grid: HourGrid, time: &T) -> Option<NowMarker> {
    let label = hour_label(time.hour());
    let slot_index = grid.slots().iter().position(|slot| *slot == label)?;

    Some(NowMarker {
        slot_index,
        label,
        fraction: time.minute() as f64 / 60.0,
    })
}
