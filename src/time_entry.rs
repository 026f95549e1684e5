use chrono::{DateTime, Utc};
use serde::Serialize;

/// time entryに紐づくプロジェクト。
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProjectRef {
    pub id: i64,
    pub name: String,
}

/// time entryに紐づくタスク。
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TaskRef {
    pub id: i64,
    pub title: String,
}

/// 1件のtime entry。
///
/// 実行中のtime entryは`stop`が`None`で、`duration`は負の値になる。
#[derive(Clone, Debug, PartialEq)]
pub struct TimeEntry {
    pub id: i64,
    pub description: String,
    pub start: DateTime<Utc>,
    pub stop: Option<DateTime<Utc>>,
    /// 秒単位の経過時間
    pub duration: i64,
    pub project: Option<ProjectRef>,
    pub task: Option<TaskRef>,
    pub billable: bool,
    pub tags: Vec<String>,
    /// 表示色 (`#rrggbb`)
    pub color: Option<String>,
}

impl TimeEntry {
    /// 実行中かどうかを返す。
    pub fn is_running(&self) -> bool {
        self.stop.is_none()
    }

    /// 表示に利用する経過秒数を返す。
    ///
    /// 終了済みの場合は`duration`をそのまま返し、実行中の場合は`now`までの経過時間を返す。
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        if self.is_running() {
            (now - self.start).num_seconds().max(0)
        } else {
            self.duration
        }
    }
}
