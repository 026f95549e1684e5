use std::io::Write;

use anyhow::{Context, Result};

use crate::calendar::{DayLayout, EntryBlock};

/// Consoleに配置済みのカレンダーを表示するためのtrait。
pub trait ConsolePresenter {
    /// 日毎のブロックを表示する。
    ///
    /// # Arguments
    ///
    /// * `days` - 表示する日毎のブロック
    fn show_days(&mut self, days: &[DayLayout]) -> Result<()>;
}

/// カレンダーをMarkdownのlist形式で表示する。
pub struct ConsoleMarkdownList<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleMarkdownList<'a, W> {
    /// 新しい`ConsoleMarkdownList`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleMarkdownList<'a, W> {
    // 日毎に見出しを付け、ブロックをlist形式で表示する。
    fn show_days(&mut self, days: &[DayLayout]) -> Result<()> {
        for day in days {
            writeln!(
                self.writer,
                "## {} {} (total {})",
                day.date,
                day.day_name,
                format_duration(day.total_duration)
            )
            .with_context(|| format!("Failed to write day header: {}", day.date))?;

            for block in &day.blocks {
                writeln!(self.writer, "{}", format_block(block))
                    .with_context(|| format!("Failed to write time entry: {:?}", block))?;
            }
        }

        Ok(())
    }
}

/// カレンダーを描画レイヤー向けのJSONで出力する。
pub struct ConsoleJson<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleJson<'a, W> {
    /// 新しい`ConsoleJson`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleJson<'a, W> {
    fn show_days(&mut self, days: &[DayLayout]) -> Result<()> {
        serde_json::to_writer_pretty(&mut *self.writer, days)
            .context("Failed to serialize days to json")?;
        writeln!(self.writer).context("Failed to write newline")?;

        Ok(())
    }
}

/// 秒数を`H:MM`形式にする。
pub fn format_duration(seconds: i64) -> String {
    let minutes = seconds.max(0) / 60;
    format!("{}:{:02}", minutes / 60, minutes % 60)
}

fn format_block(block: &EntryBlock) -> String {
    let end_str = block.stop.as_deref().unwrap_or("now");
    let context = match (&block.project, &block.task) {
        (Some(project), Some(task)) => format!(" ({} / {})", project, task),
        (Some(project), None) => format!(" ({})", project),
        (None, Some(task)) => format!(" ({})", task),
        (None, None) => String::new(),
    };
    let billable = if block.billable { " $" } else { "" };

    format!(
        "- {} ~ {} [top={:.2}, height={:.2}, {}] {}{}{}",
        block.start,
        end_str,
        block.position.top,
        block.position.height,
        block.color_class,
        block.description,
        context,
        billable
    )
}
