mod app;
mod ui;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};
use eframe::egui;

use app::DashboardApp;
use govcon_dashboard::config::DashboardConfig;
use govcon_dashboard::data::encoding::TextEncoding;
use govcon_dashboard::data::export;
use govcon_dashboard::state::DashboardState;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExportFormat {
    Csv,
    Json,
}

/// Filter SAM.gov contract opportunity extracts.
#[derive(Debug, Parser)]
#[command(name = "govcon-dashboard", version, about)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// CSV path or http(s) URL; overrides `source` in the configuration
    #[arg(short, long)]
    source: Option<String>,

    /// Character encoding of the CSV (latin1, cp1252, utf8)
    #[arg(short, long)]
    encoding: Option<TextEncoding>,

    /// Date treated as today for the response date rule (YYYY-MM-DD)
    #[arg(long)]
    today: Option<NaiveDate>,

    /// Write the filtered records to this file ("-" for stdout) instead of
    /// opening the window
    #[arg(long, value_name = "OUT")]
    export: Option<String>,

    /// Output format for --export
    #[arg(long, value_enum, default_value = "csv")]
    format: ExportFormat,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => DashboardConfig::default(),
    };
    if let Some(source) = &cli.source {
        config.source = Some(source.clone());
    }
    if let Some(encoding) = cli.encoding {
        config.encoding = encoding;
    }
    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());

    match &cli.export {
        Some(out) => run_headless(config, today, out, cli.format),
        None => run_window(config, today),
    }
}

/// Load, filter with every option selected, and write the result.
fn run_headless(config: DashboardConfig, today: NaiveDate, out: &str, format: ExportFormat) -> Result<()> {
    let source = config
        .source()
        .context("no source given; pass --source or set `source` in the configuration")?;
    let mut state = DashboardState::new(config, today);
    state
        .open(&source)
        .with_context(|| format!("loading {source}"))?;

    let text = match format {
        ExportFormat::Csv => state.export_csv()?,
        ExportFormat::Json => export::to_json(state.visible_records())?,
    };

    if out == "-" {
        std::io::stdout()
            .write_all(text.as_bytes())
            .context("writing to stdout")?;
    } else {
        std::fs::write(out, text).with_context(|| format!("writing {out}"))?;
    }
    log::info!(
        "Exported {} of {} records",
        state.visible_rows.len(),
        state.table.as_ref().map_or(0, |t| t.len())
    );
    Ok(())
}

fn run_window(config: DashboardConfig, today: NaiveDate) -> Result<()> {
    let source = config.source();
    let mut state = DashboardState::new(config, today);
    if let Some(source) = source {
        // A failed load is shown in the window's status line.
        let _ = state.open(&source);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Contract Opportunities Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("UI failed: {e}"))
}
