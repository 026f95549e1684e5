use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::datetime;

/// 現在時刻を更新する間隔。
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// 一定間隔で現在時刻を配信する時計。
///
/// 時刻は表示のためだけに使うので、tickが遅れた場合は追いつかずに読み飛ばす。
/// `stop`を呼ぶか、dropされた時点でtickを止める。
pub struct Clock {
    period: Duration,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl Clock {
    /// 新しい`Clock`を返す。
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            handle: None,
            cancel_token: None,
        }
    }

    /// tickを開始し、現在時刻を受け取るためのreceiverを返す。
    pub fn start(&mut self) -> Result<watch::Receiver<DateTime<Utc>>> {
        if self.handle.is_some() {
            bail!("clock already running");
        }

        let cancel_token = CancellationToken::new();
        let (tx, rx) = watch::channel(datetime::now());
        let handle = tokio::spawn(tick_loop(self.period, tx, cancel_token.clone()));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        info!("clock started with period {:?}", self.period);
        Ok(rx)
    }

    /// 動作中かどうかを返す。
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// tickを止めて、タスクの終了を待つ。
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle.await.context("clock task failed to join")?;
            info!("clock stopped");
        }

        Ok(())
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
    }
}

async fn tick_loop(
    period: Duration,
    tx: watch::Sender<DateTime<Utc>>,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if tx.send(datetime::now()).is_err() {
                    debug!("all clock receivers dropped");
                    break;
                }
            }
            _ = cancel_token.cancelled() => {
                debug!("clock loop shutting down");
                break;
            }
        }
    }
}
