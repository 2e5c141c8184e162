use crate::errors::{AppError, AppResult};
use crate::generator::GenerationCounts;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    Html,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardSettings {
    pub lead_count: usize,
    pub opportunity_count: usize,
    pub closed_deal_count: usize,
    pub seed: Option<u64>,
    pub output_format: OutputFormat,
    pub log_dir: Option<PathBuf>,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        let counts = GenerationCounts::default();
        Self {
            lead_count: counts.leads,
            opportunity_count: counts.opportunities,
            closed_deal_count: counts.closed_deals,
            seed: None,
            output_format: OutputFormat::Html,
            log_dir: None,
        }
    }
}

/// Values that take precedence over whatever the settings file holds.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub lead_count: Option<usize>,
    pub opportunity_count: Option<usize>,
    pub closed_deal_count: Option<usize>,
    pub seed: Option<u64>,
    pub output_format: Option<OutputFormat>,
    pub log_dir: Option<PathBuf>,
}

impl DashboardSettings {
    /// Reads settings from a `.json`, `.yaml` or `.yml` file. Missing keys
    /// fall back to defaults.
    pub fn load(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|error| AppError::Config(format!("Failed to read {}: {}", path.display(), error)))?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("json") => serde_json::from_str(&raw)
                .map_err(|error| AppError::Config(format!("Invalid settings in {}: {}", path.display(), error))),
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&raw)?),
            _ => Err(AppError::Config(format!(
                "Unsupported settings file {} (expected .json, .yaml or .yml)",
                path.display()
            ))),
        }
    }

    pub fn apply_overrides(mut self, overrides: SettingsOverrides) -> Self {
        if let Some(value) = overrides.lead_count {
            self.lead_count = value;
        }
        if let Some(value) = overrides.opportunity_count {
            self.opportunity_count = value;
        }
        if let Some(value) = overrides.closed_deal_count {
            self.closed_deal_count = value;
        }
        if overrides.seed.is_some() {
            self.seed = overrides.seed;
        }
        if let Some(value) = overrides.output_format {
            self.output_format = value;
        }
        if overrides.log_dir.is_some() {
            self.log_dir = overrides.log_dir;
        }
        self
    }

    pub fn counts(&self) -> GenerationCounts {
        GenerationCounts {
            leads: self.lead_count,
            opportunities: self.opportunity_count,
            closed_deals: self.closed_deal_count,
        }
    }
}
