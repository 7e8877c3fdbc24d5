//! # Tide Engine Command Line
//!
//! Fetches (or reads from cache) the configured station's tide bulletin,
//! decodes a window of days starting today, substitutes synthetic tides for
//! any day the bulletin cannot provide, and prints the events plus the
//! current tide state.
//!
//! ```text
//! tide-engine [--date YYYY-MM-DD] [--time HH:MM] [--chart] [--write-config]
//! ```
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`.


use anyhow::Context;
use chrono::{Datelike, Local, NaiveDate, NaiveTime, Utc};
use std::collections::BTreeMap;
use std::env;
use tide_engine_lib::config::{Config, CONFIG_FILE};
use tide_engine_lib::source::{BulletinStore, FileCache, HttpBulletinSource};
use tide_engine_lib::{bulletin, fallback, minute_of_day, model, renderer, DayTides};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Value following `flag` on the command line, if any.
fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Decode `days` days from `start`, falling back per day.
///
/// `texts` holds one bulletin per year; a year with no text yields synthetic
/// days only.
fn build_window(texts: &BTreeMap<i32, String>, start: NaiveDate, days: usize) -> Vec<DayTides> {
    start
        .iter_days()
        .take(days)
        .map(|date| {
            let text = texts.get(&date.year()).map(String::as_str).unwrap_or_default();
            fallback::or_synthetic(date, bulletin::parse_day(text, date))
        })
        .collect()
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = Config::load();

    if args.iter().any(|arg| arg == "--write-config") {
        config.save_to_path(CONFIG_FILE)?;
        return Ok(());
    }

    // The only clock read in the program; everything below takes it as input.
    let now = Local::now();
    let date = match arg_value(&args, "--date") {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid --date {s:?}, expected YYYY-MM-DD"))?,
        None => now.date_naive(),
    };
    let time = match arg_value(&args, "--time") {
        Some(s) => NaiveTime::parse_from_str(s, "%H:%M")
            .with_context(|| format!("invalid --time {s:?}, expected HH:MM"))?,
        None => now.time(),
    };
    let show_chart = args.iter().any(|arg| arg == "--chart");

    let window_days = config.display.window_days.max(1);
    let source = HttpBulletinSource::new(config.station.clone())?;
    let store = BulletinStore::new(
        source,
        FileCache::new(&config.cache.dir),
        config.cache.ttl(),
        config.station.code.clone(),
    );

    // A window may run into the next year's bulletin.
    let mut years: Vec<i32> = date.iter_days().take(window_days).map(|d| d.year()).collect();
    years.dedup();

    let rt = tokio::runtime::Runtime::new()?;
    let texts: BTreeMap<i32, String> = rt.block_on(async {
        let mut texts = BTreeMap::new();
        for year in years {
            match store.load(year, now.with_timezone(&Utc)).await {
                Ok(text) => {
                    texts.insert(year, text);
                }
                Err(error) => {
                    warn!(year, %error, "bulletin unavailable, days will be synthetic");
                }
            }
        }
        texts
    });

    let window = build_window(&texts, date, window_days);
    let offline_days = window.iter().filter(|day| day.offline).count();
    info!(
        station = %config.station.name,
        days = window.len(),
        offline_days,
        "tide window ready"
    );

    println!("{} ({})", config.station.name, config.station.code);
    for day in &window {
        print!("{}", renderer::render_day(day));
    }
    println!();

    let today = &window[0];
    match model::current_state(&today.events, time) {
        Ok(state) => println!("{} {}", time.format("%H:%M"), renderer::render_state(&state)),
        Err(error) => println!("{} tide state not computable: {error}", time.format("%H:%M")),
    }

    if show_chart {
        match model::daily_curve(today, config.display.curve_step_minutes) {
            Ok(series) => {
                println!();
                print!(
                    "{}",
                    renderer::draw_ascii(&series, Some(minute_of_day(time) as u16))
                );
            }
            Err(error) => warn!(%error, "cannot draw tide curve"),
        }
    }

    Ok(())
}
