use std::fmt::Display;
use std::future::Future;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use log::{debug, error, info};
use tokio::time::Duration;

use crate::calendar::{now_marker, HourGrid};
use crate::clock::Clock;

/// 現在時刻の位置を表示し続けるためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct NowArgs {
    #[clap(
        short = 'g',
        long = "grid",
        help = "Sets the hour grid",
        arg_enum
    )]
    pub grid: Option<HourGrid>,

    #[clap(
        short = 'n',
        long = "ticks",
        help = "Stops after the given number of ticks instead of waiting for Ctrl+C"
    )]
    pub ticks: Option<u64>,
}

pub struct NowCommand<'a, W: Write, Tz: TimeZone> {
    writer: &'a mut W,
    tz: Tz,
    grid: HourGrid,
    period: Duration,
}

impl<'a, W: Write, Tz: TimeZone> NowCommand<'a, W, Tz>
where
    Tz::Offset: Display,
{
    /// 新しい`NowCommand`を返す。
    ///
    /// # Arguments
    /// * `writer` - 出力先
    /// * `tz` - 現在時刻を表示するタイムゾーン
    /// * `grid` - 引数で指定されなかった場合のグリッド
    /// * `period` - 表示を更新する間隔
    pub fn new(writer: &'a mut W, tz: Tz, grid: HourGrid, period: Duration) -> Self {
        Self {
            writer,
            tz,
            grid,
            period,
        }
    }

    /// `now`サブコマンドの処理を行う。
    ///
    /// 時計のtickごとに現在時刻の位置を表示する。
    /// `ticks`が指定された場合はその回数だけ表示し、指定されない場合はCtrl+Cで終了する。
    pub async fn run(&mut self, args: &NowArgs) -> Result<()> {
        self.run_until(args, async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", err);
                std::future::pending::<()>().await;
            }
            info!("Interrupted");
        })
        .await
    }

    /// `shutdown`が完了するか、`ticks`回表示するまで現在時刻の位置を表示する。
    ///
    /// `shutdown`はループの間ずっと同じfutureをpollする。
    pub async fn run_until<F>(&mut self, args: &NowArgs, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let grid = args.grid.unwrap_or(self.grid);
        let mut clock = Clock::new(self.period);
        let mut rx = clock.start()?;
        let mut shown = 0u64;
        tokio::pin!(shutdown);

        let result = loop {
            if let Some(limit) = args.ticks {
                if shown >= limit {
                    break Ok(());
                }
            }

            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        break Ok(());
                    }
                    let now = *rx.borrow_and_update();
                    if let Err(err) = self.show(grid, now) {
                        break Err(err);
                    }
                    shown += 1;
                }
                _ = &mut shutdown => {
                    break Ok(());
                }
            }
        };

        if clock.is_running() {
            clock.stop().await?;
        }
        debug!("shown {} ticks", shown);
        result
    }

    /// 現在時刻の位置を1行で表示する。
    fn show(&mut self, grid: HourGrid, now: DateTime<Utc>) -> Result<()> {
        let local = now.with_timezone(&self.tz);
        let time_str = local.format("%H:%M:%S");
        let written = match now_marker(grid, &local) {
            Some(marker) => writeln!(
                self.writer,
                "{} [{}] row={} fraction={:.3} offset={:.2}px",
                time_str,
                marker.label,
                marker.slot_index,
                marker.fraction,
                marker.offset_px()
            ),
            None => writeln!(self.writer, "{} outside of the grid", time_str),
        };
        written.context("Failed to write current time")?;
        self.writer.flush().context("Failed to flush")?;

        Ok(())
    }
}
