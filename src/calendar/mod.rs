//! 時間グリッド上へのtime entryの配置。

pub mod color;
pub mod layout;
pub mod now_marker;
pub mod week;

pub use layout::EntryBlock;
pub use now_marker::{now_marker, HourGrid};
pub use week::{fetch_range, group_by_day, visible_dates, DayLayout, ViewMode};
