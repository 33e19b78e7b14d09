use std::io::Write;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use waypoint_core::{Rect, Viewport};
use waypoint_tour::{PlacementEngine, PreferredPosition, Side, Step, TourConfig, TourEvent};

use crate::error::{DemoError, Result};
use crate::host::{Host, Report, parse_script};
use crate::layout::Layout;
use crate::logging;

#[derive(Debug, Parser)]
#[command(
    name = "waypoint-demo",
    about = "Replay guided tours against page layouts without a browser",
    version
)]
pub struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a tour against a layout, following a script of user actions.
    Run(RunArgs),

    /// Compute a single tooltip placement.
    Place(PlaceArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// JSON array of tour steps.
    #[arg(long)]
    pub tour: PathBuf,

    /// JSON page layout keyed by route.
    #[arg(long)]
    pub layout: PathBuf,

    /// Comma-separated actions: next, back, skip, close, wait:MS, scroll:X,Y, resize:WxH.
    #[arg(long, default_value = "")]
    pub script: String,

    /// Override the layout viewport, e.g. 1920x1080.
    #[arg(long, value_parser = parse_viewport)]
    pub viewport: Option<Viewport>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Tour tuning (TOML, or JSON by extension).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct PlaceArgs {
    /// Target rectangle in viewport coordinates: x,y,width,height.
    #[arg(long, value_parser = parse_rect)]
    pub rect: Rect,

    #[arg(long, value_parser = parse_viewport, default_value = "1920x1080")]
    pub viewport: Viewport,

    /// Preferred side, or auto.
    #[arg(long, value_parser = parse_preferred, default_value = "auto")]
    pub prefer: PreferredPosition,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_json);
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::Run(args) => run_tour(args, &mut out),
        Commands::Place(args) => run_place(args, &mut out),
    }
}

pub fn run_tour(args: RunArgs, out: &mut impl Write) -> Result<()> {
    let steps = Step::list_from_json_file(&args.tour)?;
    let layout = Layout::from_json_file(&args.layout)?;
    let config = match &args.config {
        Some(path) => TourConfig::from_file(path)?,
        None => TourConfig::default(),
    };
    let script = parse_script(&args.script)?;

    let mut host = Host::new(layout, steps, config)?;
    if let Some(viewport) = args.viewport {
        host = host.with_viewport(viewport);
    }
    let report = host.run_script(&script)?;

    match args.format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => write_report(&report, out),
    }
    .map_err(|e| DemoError::io("<stdout>", e))
}

pub fn run_place(args: PlaceArgs, out: &mut impl Write) -> Result<()> {
    let result = PlacementEngine::default().place_rect(args.rect, &args.viewport, args.prefer);
    match args.format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => writeln!(
            out,
            "side={} tooltip=({}, {}) size={}x{} arrow=({}, {}) rotation={}",
            result.side,
            result.tooltip.x,
            result.tooltip.y,
            result.tooltip_width,
            result.tooltip_height,
            result.arrow.anchor.x,
            result.arrow.anchor.y,
            result.arrow.rotation,
        ),
    }
    .map_err(|e| DemoError::io("<stdout>", e))
}

fn write_report(report: &Report, out: &mut impl Write) -> std::io::Result<()> {
    for entry in &report.events {
        writeln!(out, "[{:>6} ms] {}", entry.at_ms, describe(&entry.event))?;
    }
    match &report.view {
        Some(view) => writeln!(
            out,
            "showing step {} ({}/{}) on {} | {} | side={} tooltip=({}, {}) | [{}]",
            view.step,
            view.step_index + 1,
            view.step_count,
            report.route,
            view.title.as_deref().unwrap_or("untitled"),
            view.placement.side,
            view.placement.tooltip.x,
            view.placement.tooltip.y,
            view.next_label,
        ),
        None => writeln!(out, "no step showing on {}", report.route),
    }
}

fn describe(event: &TourEvent) -> String {
    match event {
        TourEvent::ViewportListeners { attached: true } => "listeners attached".to_string(),
        TourEvent::ViewportListeners { attached: false } => "listeners detached".to_string(),
        TourEvent::Navigate { path } => format!("navigate {path}"),
        TourEvent::StepChanged { index, step, path } => match path {
            Some(path) => format!("step {step} (#{index}) on {path}"),
            None => format!("step {step} (#{index})"),
        },
        TourEvent::ScrollIntoView { region } => format!(
            "scroll into view {},{} {}x{}",
            region.x, region.y, region.width, region.height
        ),
        TourEvent::Skipped => "skipped".to_string(),
        TourEvent::Completed => "completed".to_string(),
    }
}

fn parse_viewport(s: &str) -> std::result::Result<Viewport, String> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{s}`"))?;
    let width: f64 = w.trim().parse().map_err(|_| format!("bad width `{w}`"))?;
    let height: f64 = h.trim().parse().map_err(|_| format!("bad height `{h}`"))?;
    if width <= 0.0 || height <= 0.0 {
        return Err(format!("viewport must be positive, got `{s}`"));
    }
    Ok(Viewport::new(width, height))
}

fn parse_rect(s: &str) -> std::result::Result<Rect, String> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|_| format!("bad number `{p}`")))
        .collect::<std::result::Result<_, _>>()?;
    match parts.as_slice() {
        &[x, y, w, h] => Ok(Rect::new(x, y, w, h)),
        _ => Err(format!("expected x,y,width,height, got `{s}`")),
    }
}

fn parse_preferred(s: &str) -> std::result::Result<PreferredPosition, String> {
    if s == "auto" {
        return Ok(PreferredPosition::Auto);
    }
    s.parse::<Side>().map(PreferredPosition::from)
}
