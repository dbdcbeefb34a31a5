use anyhow::{Context, Result};
use bbox_overlay::core_modules::date_range::{DateRange, RangeShortcut, parse_date};
use bbox_overlay::core_modules::overlay_surface::{StrokeStyle, composite};
use bbox_overlay::core_modules::report::ReportFeed;
use bbox_overlay::dashboard::DashboardController;
use bbox_overlay::{CardBoard, CardElement, CardOutcome, FileProbe, OverlayPipeline, PipelineConfig};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use image::imageops::{self, FilterType};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod chart_sink;

use chart_sink::JsonChartSink;

#[derive(Parser)]
#[command(name = "overlay_tester")]
#[command(about = "Render bounding-box overlays and dashboard data from the command line")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one overlay pass over a card manifest and write composited PNGs
    Overlay {
        /// JSON array of cards (id, fields, image)
        #[arg(long)]
        cards: PathBuf,
        /// Directory image `src` paths are resolved against
        #[arg(long)]
        images: PathBuf,
        /// Output directory for `<card id>.png`
        #[arg(long)]
        out: PathBuf,
        /// Per-image probe timeout, overrides BBOX_PROBE_TIMEOUT_MS
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Probes in flight, overrides BBOX_MAX_IN_FLIGHT
        #[arg(long)]
        max_in_flight: Option<usize>,
        /// Stroke color as #rrggbb, overrides BBOX_STROKE_COLOR
        #[arg(long)]
        stroke: Option<String>,
    },
    /// Print the date range a dashboard shortcut selects
    Range {
        #[arg(long, value_enum, default_value_t = Shortcut::Default)]
        shortcut: Shortcut,
        /// Pretend today is this date (yyyy-MM-dd)
        #[arg(long)]
        today: Option<String>,
    },
    /// Turn a report feed into the chart data for both canvases
    Chart {
        /// Report JSON as served by /admin/reports.json
        #[arg(long)]
        report: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Shortcut {
    Default,
    Yesterday,
    ThisWeek,
    LastWeek,
}

impl From<Shortcut> for RangeShortcut {
    fn from(value: Shortcut) -> Self {
        match value {
            Shortcut::Default => RangeShortcut::Default,
            Shortcut::Yesterday => RangeShortcut::Yesterday,
            Shortcut::ThisWeek => RangeShortcut::ThisWeek,
            Shortcut::LastWeek => RangeShortcut::LastWeek,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bbox_overlay=info,overlay_tester=info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Overlay {
            cards,
            images,
            out,
            timeout_ms,
            max_in_flight,
            stroke,
        } => {
            let mut config = PipelineConfig::from_env().context("reading BBOX_* environment")?;
            if let Some(ms) = timeout_ms {
                config.probe_timeout = Duration::from_millis(ms);
            }
            if let Some(max) = max_in_flight {
                config.max_in_flight = max.max(1);
            }
            if let Some(color) = stroke {
                config.stroke.color = StrokeStyle::parse_hex(&color)?;
            }
            run_overlay(&cards, &images, &out, config).await
        }
        Commands::Range { shortcut, today } => {
            let today = resolve_today(today.as_deref())?;
            let range = DateRange::for_shortcut(shortcut.into(), today);
            println!("{range}");
            Ok(())
        }
        Commands::Chart { report } => {
            let json = std::fs::read_to_string(&report)
                .with_context(|| format!("reading {}", report.display()))?;
            let feed = ReportFeed::from_json(&json)?;
            let charts = render_charts(&feed, Local::now().date_naive())?;
            println!("{}", serde_json::to_string_pretty(&charts)?);
            Ok(())
        }
    }
}

fn resolve_today(today: Option<&str>) -> Result<NaiveDate> {
    match today {
        Some(value) => Ok(parse_date(value)?),
        None => Ok(Local::now().date_naive()),
    }
}

/// Runs the feed through a dashboard controller and returns what it drew.
fn render_charts(feed: &ReportFeed, today: NaiveDate) -> Result<serde_json::Value> {
    let mut controller = DashboardController::new(JsonChartSink::default(), today);
    controller.render(feed)?;
    Ok(controller.backend().snapshot())
}

async fn run_overlay(cards_path: &Path, images: &Path, out: &Path, config: PipelineConfig) -> Result<()> {
    // --- 1. Load manifest ---
    let json = std::fs::read_to_string(cards_path)
        .with_context(|| format!("reading {}", cards_path.display()))?;
    let cards: Vec<CardElement> = serde_json::from_str(&json)
        .with_context(|| format!("parsing {}", cards_path.display()))?;
    std::fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;

    // --- 2. Overlay pass ---
    let probe = FileProbe::new(images);
    let board = CardBoard::new(cards);
    let pipeline = OverlayPipeline::new(Arc::new(probe.clone()), config);
    let report = pipeline.render(&board).await;

    // --- 3. Composite drawn cards ---
    let mut written = 0;
    for card in board.snapshot() {
        let (Some(image), Some(surface)) = (&card.image, card.overlay()) else {
            continue;
        };
        let source = probe.resolve(&image.src);
        let thumbnail = match image::open(&source) {
            Ok(img) => img.into_rgba8(),
            Err(err) => {
                warn!(card = %card.id, path = %source.display(), error = %err, "cannot reopen image");
                continue;
            }
        };
        let mut frame = imageops::resize(&thumbnail, surface.width(), surface.height(), FilterType::Triangle);
        composite(&mut frame, surface);
        let target = out.join(format!("{}.png", sanitize(&card.id)));
        frame
            .save(&target)
            .with_context(|| format!("writing {}", target.display()))?;
        written += 1;
    }

    for (id, outcome) in &report.outcomes {
        if !matches!(outcome, CardOutcome::Drawn(_)) {
            info!(card = %id, ?outcome, "not drawn");
        }
    }
    println!(
        "{} cards: {} drawn, {} skipped, {} failed, {} deferred; {} PNGs in {}",
        report.outcomes.len(),
        report.drawn(),
        report.skipped(),
        report.failed(),
        report.deferred(),
        written,
        out.display()
    );
    Ok(())
}

/// Card ids come from the page and may contain path separators.
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
