use std::fmt::Display;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use log::info;

use crate::calendar::{fetch_range, group_by_day, visible_dates, DayLayout, ViewMode};
use crate::datetime::{self, parse_date};
use crate::toggl::TogglRepository;

/// 出力形式。
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ArgEnum)]
pub enum OutputFormat {
    Markdown,
    Json,
}

/// カレンダーを表示するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct CalendarArgs {
    #[clap(
        short = 'd',
        long = "date",
        help = "Sets the anchor date in the format YYYY-MM-DD",
        parse(try_from_str = parse_date),
    )]
    pub date: Option<NaiveDate>,

    #[clap(long = "view", help = "Sets the view mode", arg_enum)]
    pub view: Option<ViewMode>,

    #[clap(
        short = 'f',
        long = "format",
        help = "Sets the output format",
        default_value = "markdown",
        arg_enum
    )]
    pub format: OutputFormat,
}

pub struct CalendarCommand<'a, T: TogglRepository, Tz: TimeZone> {
    toggl_client: &'a T,
    tz: Tz,
    default_view: ViewMode,
}

impl<'a, T: TogglRepository, Tz: TimeZone> CalendarCommand<'a, T, Tz>
where
    Tz::Offset: Display,
{
    /// 新しい`CalendarCommand`を返す。
    ///
    /// # Arguments
    /// * `toggl_client` - Toggl APIと通信するためのリポジトリ
    /// * `tz` - カレンダーを表示するタイムゾーン
    /// * `default_view` - 引数で指定されなかった場合の表示モード
    pub fn new(toggl_client: &'a T, tz: Tz, default_view: ViewMode) -> Self {
        Self {
            toggl_client,
            tz,
            default_view,
        }
    }

    /// `calendar`サブコマンドの処理を行う。
    ///
    /// 指定された日付を含む日または週のタイムエントリーを取得し、日毎に時間グリッド上へ配置する。
    /// 日付が指定されていない場合は、表示するタイムゾーンで現在の日付を利用する。
    ///
    /// # Arguments
    ///
    /// * `args` - `calendar`サブコマンドの引数
    pub async fn run(&self, args: &CalendarArgs) -> Result<Vec<DayLayout>> {
        let now: DateTime<Utc> = datetime::now();
        let anchor = args
            .date
            .unwrap_or_else(|| now.with_timezone(&self.tz).date_naive());
        let view = args.view.unwrap_or(self.default_view);
        let dates = visible_dates(anchor, view);
        let (start_at, end_at) = fetch_range(&dates, &self.tz)?;
        info!("Start at: {}, End at: {}", start_at, end_at);

        let time_entries = self
            .toggl_client
            .read_time_entries(&start_at, &end_at)
            .await
            .context("Failed to retrieve time entries")?;
        info!("Time entries retrieved successfully.");

        let days = group_by_day(&time_entries, &dates, &self.tz)
            .iter()
            .map(|day| day.layout(&self.tz, now))
            .collect();

        Ok(days)
    }
}
