//! Command-line summary for taskdesk.
//!
//! # Responsibility
//! - Load `taskdesk.toml`, open the configured store, print one summary line.
//! - Accept an optional status filter (`all|active|completed`) as the only
//!   argument and report how many tasks it shows.
//! - Exit non-zero with a readable message on any failure.

use std::process::ExitCode;
use taskdesk_core::{
    core_version, init_logging, open_store, AppConfig, StatusFilter, TaskService,
};

const CONFIG_FILE_NAME: &str = "taskdesk.toml";

fn main() -> ExitCode {
    match run() {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("taskdesk: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<String, String> {
    let filter = match std::env::args().nth(1) {
        Some(raw) => raw.parse::<StatusFilter>().map_err(|err| err.to_string())?,
        None => StatusFilter::default(),
    };
    let config = AppConfig::load(CONFIG_FILE_NAME).map_err(|err| err.to_string())?;

    if let Some(log_dir) = &config.logging.dir {
        init_logging(config.logging.effective_level(), log_dir).map_err(|err| err.to_string())?;
    }

    let store = open_store(&config.storage).map_err(|err| err.to_string())?;
    let service = TaskService::open(store).map_err(|err| err.to_string())?;
    let stats = service.stats();
    let shown = service.filtered_view("", filter).len();
    log::info!(
        "event=cli_summary module=cli status=ok total={} active={} completed={} filter={} shown={}",
        stats.total,
        stats.active,
        stats.completed,
        filter.as_str(),
        shown
    );

    Ok(format!(
        "taskdesk version={} backend={} total={} active={} completed={} filter={} shown={}",
        core_version(),
        config.storage.backend.as_str(),
        stats.total,
        stats.active,
        stats.completed,
        filter.as_str(),
        shown
    ))
}
