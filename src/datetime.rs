use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};

#[cfg(not(test))]
/// 現在のUTC時間を取得する。
pub fn now() -> DateTime<Utc> {
    Utc::now()
}


#[cfg(test)]
pub use mock_datetime::now;

/// `YYYY-MM-DD`形式の日付をパースする。
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("Failed to parse date: {}", s))
}

/// Toggl APIが返すRFC 3339形式の日時をパースする。
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let datetime = DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Failed to parse timestamp: {}", s))?
        .to_utc();

    Ok(datetime)
}
