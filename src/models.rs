use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::quality::QualityIssue;

// ─── Records ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeadSource {
    Web,
    Referral,
    Event,
    #[serde(rename = "Cold Call")]
    ColdCall,
}

impl LeadSource {
    pub const ALL: [LeadSource; 4] = [Self::Web, Self::Referral, Self::Event, Self::ColdCall];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Web => "Web",
            Self::Referral => "Referral",
            Self::Event => "Event",
            Self::ColdCall => "Cold Call",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Disqualified,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 4] = [Self::New, Self::Contacted, Self::Qualified, Self::Disqualified];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Contacted => "Contacted",
            Self::Qualified => "Qualified",
            Self::Disqualified => "Disqualified",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Product {
    #[serde(rename = "Product A")]
    ProductA,
    #[serde(rename = "Product B")]
    ProductB,
    #[serde(rename = "Product C")]
    ProductC,
}

impl Product {
    pub const ALL: [Product; 3] = [Self::ProductA, Self::ProductB, Self::ProductC];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProductA => "Product A",
            Self::ProductB => "Product B",
            Self::ProductC => "Product C",
        }
    }
}

/// Pipeline stage of an opportunity. The last two variants are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    Prospecting,
    Qualification,
    Demo,
    Proposal,
    Negotiation,
    #[serde(rename = "Closed Won")]
    ClosedWon,
    #[serde(rename = "Closed Lost")]
    ClosedLost,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Self::Prospecting,
        Self::Qualification,
        Self::Demo,
        Self::Proposal,
        Self::Negotiation,
        Self::ClosedWon,
        Self::ClosedLost,
    ];

    /// Stages reported in the stage-conversion chart.
    pub const CONVERSION_TRACKED: [Stage; 3] = [Self::Prospecting, Self::Qualification, Self::Demo];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prospecting => "Prospecting",
            Self::Qualification => "Qualification",
            Self::Demo => "Demo",
            Self::Proposal => "Proposal",
            Self::Negotiation => "Negotiation",
            Self::ClosedWon => "Closed Won",
            Self::ClosedLost => "Closed Lost",
        }
    }

    pub fn is_open(self) -> bool {
        !matches!(self, Self::ClosedWon | Self::ClosedLost)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DealStatus {
    #[serde(rename = "Closed Won")]
    ClosedWon,
    #[serde(rename = "Closed Lost")]
    ClosedLost,
}

impl DealStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClosedWon => "Closed Won",
            Self::ClosedLost => "Closed Lost",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub source: LeadSource,
    pub date: NaiveDate,
    pub status: LeadStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: String,
    /// Loose reference; the lead may not exist in the same dataset.
    pub lead_id: String,
    pub amount: f64,
    pub product: Product,
    pub stage: Stage,
    pub owner: String,
    pub created_date: NaiveDate,
    pub close_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedDeal {
    pub id: String,
    /// Loose reference; the opportunity may not exist in the same dataset.
    pub opportunity_id: String,
    pub amount: f64,
    pub close_date: NaiveDate,
    pub status: DealStatus,
}

/// The three record collections produced for a single dashboard run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesDataset {
    pub leads: Vec<Lead>,
    pub opportunities: Vec<Opportunity>,
    pub closed_deals: Vec<ClosedDeal>,
}

pub const LEADS_TABLE: &str = "leads";
pub const OPPORTUNITIES_TABLE: &str = "opportunities";
pub const CLOSED_DEALS_TABLE: &str = "closed_deals";

impl SalesDataset {
    pub fn lead(&self, id: &str) -> Option<&Lead> {
        self.leads.iter().find(|lead| lead.id == id)
    }

    pub fn opportunity(&self, id: &str) -> Option<&Opportunity> {
        self.opportunities.iter().find(|opportunity| opportunity.id == id)
    }

    /// Named raw rows in lead, opportunity, closed-deal order.
    pub fn raw_tables(&self) -> serde_json::Result<Vec<(&'static str, Vec<serde_json::Value>)>> {
        Ok(vec![
            (LEADS_TABLE, to_rows(&self.leads)?),
            (OPPORTUNITIES_TABLE, to_rows(&self.opportunities)?),
            (CLOSED_DEALS_TABLE, to_rows(&self.closed_deals)?),
        ])
    }
}

fn to_rows<T: Serialize>(records: &[T]) -> serde_json::Result<Vec<serde_json::Value>> {
    records.iter().map(serde_json::to_value).collect()
}

// ─── KPIs ───────────────────────────────────────────────────────────────────

/// Metrics aggregated from the dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputedKpis {
    pub monthly_revenue: f64,
    pub average_deal_size: f64,
    pub win_rate: f64,
    pub pipeline_value: f64,
    pub pipeline_velocity: f64,
    pub coverage_ratio: f64,
    pub lead_conversion_rate: f64,
}

/// Placeholder metrics drawn at random. None of these are backed by data and
/// each must be replaced by a real computation before being trusted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulatedKpis {
    pub sales_cycle_days: f64,
    pub quota_attainment: f64,
    pub forecast_accuracy: f64,
    pub stage_conversion: BTreeMap<Stage, f64>,
    pub cost_per_lead: f64,
    pub mql_to_sql: f64,
    pub website_conversion: f64,
    pub cac: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KpiValue {
    Scalar(f64),
    Nested(BTreeMap<String, f64>),
}

impl KpiValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(value) => Some(*value),
            Self::Nested(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiReport {
    pub computed: ComputedKpis,
    pub simulated: SimulatedKpis,
}

impl KpiReport {
    /// Flat metric-name view of both halves of the report.
    pub fn to_mapping(&self) -> BTreeMap<String, KpiValue> {
        let computed = &self.computed;
        let simulated = &self.simulated;
        let stage_conversion = simulated
            .stage_conversion
            .iter()
            .map(|(stage, rate)| (stage.as_str().to_string(), *rate))
            .collect();

        let mut mapping: BTreeMap<String, KpiValue> = [
            ("monthly_revenue", computed.monthly_revenue),
            ("average_deal_size", computed.average_deal_size),
            ("win_rate", computed.win_rate),
            ("pipeline_value", computed.pipeline_value),
            ("pipeline_velocity", computed.pipeline_velocity),
            ("coverage_ratio", computed.coverage_ratio),
            ("lead_conversion_rate", computed.lead_conversion_rate),
            ("sales_cycle_days", simulated.sales_cycle_days),
            ("quota_attainment", simulated.quota_attainment),
            ("forecast_accuracy", simulated.forecast_accuracy),
            ("cost_per_lead", simulated.cost_per_lead),
            ("mql_to_sql", simulated.mql_to_sql),
            ("website_conversion", simulated.website_conversion),
            ("cac", simulated.cac),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), KpiValue::Scalar(value)))
        .collect();
        mapping.insert("stage_conversion".to_string(), KpiValue::Nested(stage_conversion));
        mapping
    }

    pub fn ltv_estimate(&self) -> f64 {
        self.computed.average_deal_size * 3.0
    }

    /// `None` when acquisition cost is zero.
    pub fn ltv_cac_ratio(&self) -> Option<f64> {
        if self.simulated.cac == 0.0 {
            return None;
        }
        Some(self.ltv_estimate() / self.simulated.cac)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub next_30d_revenue: f64,
    pub next_30d_leads: i64,
}

// ─── Dashboard ──────────────────────────────────────────────────────────────

/// Everything handed to a renderer for one run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub kpis: KpiReport,
    pub forecast: Forecast,
    pub quality_issues: Vec<QualityIssue>,
    pub dataset: SalesDataset,
}

#[cfg(test)]
mod tests {
    use super::{KpiReport, KpiValue, Lead, LeadSource, LeadStatus, SalesDataset, SimulatedKpis, Stage};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    #[test]
    fn terminal_stages_are_not_open() {
        let open = Stage::ALL.iter().filter(|stage| stage.is_open()).count();
        assert_eq!(open, 5);
        assert!(!Stage::ClosedWon.is_open());
        assert!(!Stage::ClosedLost.is_open());
    }

    #[test]
    fn serializes_display_names() {
        assert_eq!(serde_json::to_string(&LeadSource::ColdCall).expect("json"), "\"Cold Call\"");
        assert_eq!(serde_json::to_string(&Stage::ClosedWon).expect("json"), "\"Closed Won\"");
    }

    #[test]
    fn mapping_nests_stage_conversion() {
        let mut stage_conversion = BTreeMap::new();
        stage_conversion.insert(Stage::Demo, 0.5);
        let report = KpiReport {
            simulated: SimulatedKpis {
                stage_conversion,
                cac: 1000.0,
                ..SimulatedKpis::default()
            },
            ..KpiReport::default()
        };
        let mapping = report.to_mapping();
        assert_eq!(mapping.len(), 15);
        assert_eq!(mapping["cac"].as_scalar(), Some(1000.0));
        match &mapping["stage_conversion"] {
            KpiValue::Nested(rates) => assert_eq!(rates.get("Demo"), Some(&0.5)),
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn raw_rows_keep_record_field_order() {
        let dataset = SalesDataset {
            leads: vec![Lead {
                id: "L1000".to_string(),
                name: "Cedar Labs Inc".to_string(),
                source: LeadSource::Referral,
                date: NaiveDate::from_ymd_opt(2024, 5, 2).expect("valid date"),
                status: LeadStatus::New,
            }],
            ..SalesDataset::default()
        };
        let tables = dataset.raw_tables().expect("raw tables");
        assert_eq!(tables[0].0, "leads");
        let columns = tables[0].1[0]
            .as_object()
            .expect("lead row")
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        assert_eq!(columns, vec!["id", "name", "source", "date", "status"]);
    }

    #[test]
    fn ltv_cac_ratio_is_undefined_without_cac() {
        let mut report = KpiReport::default();
        report.computed.average_deal_size = 10_000.0;
        assert_eq!(report.ltv_estimate(), 30_000.0);
        assert_eq!(report.ltv_cac_ratio(), None);

        report.simulated.cac = 1_500.0;
        assert_eq!(report.ltv_cac_ratio(), Some(20.0));
    }
}
