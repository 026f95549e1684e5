use std::io;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use log::debug;

mod calendar;
mod calendar_command;
mod clock;
mod config;
mod console;
mod datetime;
mod logger;
mod now_command;
mod time_entry;
mod toggl;

use calendar_command::{CalendarArgs, CalendarCommand, OutputFormat};
use config::Config;
use console::{ConsoleJson, ConsoleMarkdownList, ConsolePresenter};
use now_command::{NowArgs, NowCommand};
use toggl::TogglClient;

/// Toggl Trackのtime entryをカレンダーの時間グリッドに配置するCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- calendar --view week
/// $ cargo run -- calendar --date 2024-03-04 --view day --format json
/// $ cargo run -- now --grid legacy
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(short = 'v', long = "verbose", global = true, help = "Shows debug logs")]
    verbose: bool,

    #[clap(subcommand)]
    subcommand: SubCommands,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    Calendar(CalendarArgs),
    Now(NowArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logger::init(args.verbose)?;
    debug!("Args: {:?}", args);

    match args.subcommand {
        SubCommands::Calendar(calendar) => {
            let config = Config::load().context("Failed to load config")?;
            let client = TogglClient::new(&config);
            let command = CalendarCommand::new(&client, Local, config.view);
            let days = command.run(&calendar).await?;

            let mut stdout = io::stdout();
            match calendar.format {
                OutputFormat::Markdown => {
                    ConsoleMarkdownList::new(&mut stdout).show_days(&days)?
                }
                OutputFormat::Json => ConsoleJson::new(&mut stdout).show_days(&days)?,
            }
        }
        SubCommands::Now(now) => {
            // 現在時刻の表示にはAPI tokenは不要
            let grid = Config::read().context("Failed to read config")?.grid;
            let mut stdout = io::stdout();
            let mut command = NowCommand::new(&mut stdout, Local, grid, clock::TICK_PERIOD);
            command.run(&now).await?;
        }
    }

    Ok(())
}
