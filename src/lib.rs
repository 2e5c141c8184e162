pub mod errors;
pub mod forecast;
pub mod generator;
pub mod kpi;
pub mod models;
pub mod orchestrator;
pub mod quality;
pub mod render;
pub mod settings;

use crate::orchestrator::Orchestrator;
use crate::render::{DashboardRenderer, HtmlRenderer, JsonRenderer};
use crate::settings::{DashboardSettings, OutputFormat, SettingsOverrides};
use anyhow::Context;
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

#[derive(Debug, Parser)]
#[command(name = "sales-pulse")]
#[command(author, version, about = "Synthetic sales KPI dashboard")]
pub struct Cli {
    /// Settings file (.json, .yaml or .yml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Write the dashboard here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub leads: Option<usize>,

    #[arg(long)]
    pub opportunities: Option<usize>,

    #[arg(long)]
    pub closed_deals: Option<usize>,

    /// Directory for daily-rolling JSON logs
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

impl Cli {
    pub fn resolve_settings(&self) -> anyhow::Result<DashboardSettings> {
        let base = match &self.config {
            Some(path) => DashboardSettings::load(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => DashboardSettings::default(),
        };
        Ok(base.apply_overrides(SettingsOverrides {
            lead_count: self.leads,
            opportunity_count: self.opportunities,
            closed_deal_count: self.closed_deals,
            seed: self.seed,
            output_format: self.format,
            log_dir: self.log_dir.clone(),
        }))
    }
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = cli.resolve_settings()?;
    if let Err(error) = init_tracing(settings.log_dir.as_deref()) {
        eprintln!("tracing disabled: {}", error);
    }
    render_dashboard(&settings, cli.output.as_deref())
}

/// Runs the pipeline once and writes the dashboard to `output` or stdout.
pub fn render_dashboard(settings: &DashboardSettings, output: Option<&Path>) -> anyhow::Result<()> {
    tracing::info!(
        leads = settings.lead_count,
        opportunities = settings.opportunity_count,
        closed_deals = settings.closed_deal_count,
        seeded = settings.seed.is_some(),
        format = ?settings.output_format,
        "starting dashboard run"
    );

    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(
            std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut renderer: Box<dyn DashboardRenderer> = match settings.output_format {
        OutputFormat::Html => Box::new(HtmlRenderer::new(writer)),
        OutputFormat::Json => Box::new(JsonRenderer::new(writer)),
    };

    let view = Orchestrator::from_settings(settings).run(renderer.as_mut())?;
    if !view.quality_issues.is_empty() {
        tracing::warn!(count = view.quality_issues.len(), "dashboard rendered with data quality issues");
    }
    Ok(())
}

fn init_tracing(log_dir: Option<&Path>) -> Result<(), String> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match log_dir {
        Some(log_dir) => {
            std::fs::create_dir_all(log_dir).map_err(|error| error.to_string())?;
            let file_appender = tracing_appender::rolling::daily(log_dir, "sales-pulse.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let _ = LOG_GUARD.set(guard);

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_writer(non_blocking)
                .try_init()
                .map_err(|error| error.to_string())
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|error| error.to_string()),
    }
}
