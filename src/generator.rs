//! Synthetic CRM record generation.
//!
//! Every draw goes through the injected random source so a seeded generator
//! reproduces the same dataset for the same `today`.

use crate::models::{
    ClosedDeal, DealStatus, Lead, LeadSource, LeadStatus, Opportunity, Product, SalesDataset, Stage,
};
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const LEAD_ID_BASE: usize = 1000;
const OPPORTUNITY_ID_BASE: usize = 2000;
const DEAL_ID_BASE: usize = 3000;

/// Range of lead ids an opportunity may point at.
const LEAD_REFERENCE_SPAN: usize = 100;
/// Range of opportunity ids a closed deal may point at.
const OPPORTUNITY_REFERENCE_SPAN: usize = 50;

const MIN_AMOUNT: f64 = 1_000.0;
const MAX_AMOUNT: f64 = 50_000.0;
const SALES_REP_COUNT: u32 = 5;
const WON_PROBABILITY: f64 = 0.7;

const LEAD_LOOKBACK_DAYS: i64 = 30;
const OPPORTUNITY_LOOKBACK_DAYS: i64 = 90;
const OPPORTUNITY_LOOKAHEAD_DAYS: i64 = 60;
const DEAL_LOOKBACK_DAYS: i64 = 30;

const COMPANY_PREFIXES: [&str; 12] = [
    "Apex", "Blue Harbor", "Cedar", "Northwind", "Summit", "Ironclad", "Brightline", "Granite",
    "Silverleaf", "Redwood", "Keystone", "Lumen",
];
const COMPANY_SUFFIXES: [&str; 8] = [
    "Systems", "Labs", "Holdings", "Group", "Logistics", "Analytics", "Partners", "Industries",
];
const COMPANY_FORMS: [&str; 4] = ["Inc", "LLC", "Ltd", "Co"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationCounts {
    pub leads: usize,
    pub opportunities: usize,
    pub closed_deals: usize,
}

impl Default for GenerationCounts {
    fn default() -> Self {
        Self {
            leads: 100,
            opportunities: 50,
            closed_deals: 30,
        }
    }
}

pub struct SyntheticDataGenerator<R: Rng> {
    rng: R,
    today: NaiveDate,
}

impl SyntheticDataGenerator<StdRng> {
    pub fn from_seed(seed: u64, today: NaiveDate) -> Self {
        Self::new(StdRng::seed_from_u64(seed), today)
    }

    pub fn from_entropy(today: NaiveDate) -> Self {
        Self::new(StdRng::from_os_rng(), today)
    }
}

impl<R: Rng> SyntheticDataGenerator<R> {
    pub fn new(rng: R, today: NaiveDate) -> Self {
        Self { rng, today }
    }

    /// Hands back the random source so later pipeline stages keep drawing
    /// from the same stream.
    pub fn into_rng(self) -> R {
        self.rng
    }

    pub fn generate_dataset(&mut self, counts: GenerationCounts) -> SalesDataset {
        let dataset = SalesDataset {
            leads: self.generate_leads(counts.leads),
            opportunities: self.generate_opportunities(counts.opportunities),
            closed_deals: self.generate_closed_deals(counts.closed_deals),
        };
        tracing::debug!(
            leads = dataset.leads.len(),
            opportunities = dataset.opportunities.len(),
            closed_deals = dataset.closed_deals.len(),
            "generated synthetic dataset"
        );
        dataset
    }

    pub fn generate_leads(&mut self, count: usize) -> Vec<Lead> {
        (0..count)
            .map(|index| Lead {
                id: format!("L{}", LEAD_ID_BASE + index),
                name: self.company_name(),
                source: pick(&mut self.rng, &LeadSource::ALL),
                date: self.days_ago(LEAD_LOOKBACK_DAYS),
                status: pick(&mut self.rng, &LeadStatus::ALL),
            })
            .collect()
    }

    pub fn generate_opportunities(&mut self, count: usize) -> Vec<Opportunity> {
        (0..count)
            .map(|index| Opportunity {
                id: format!("O{}", OPPORTUNITY_ID_BASE + index),
                lead_id: format!("L{}", LEAD_ID_BASE + self.rng.random_range(0..LEAD_REFERENCE_SPAN)),
                amount: self.amount(),
                product: pick(&mut self.rng, &Product::ALL),
                stage: pick(&mut self.rng, &Stage::ALL),
                owner: format!("Sales-{}", self.rng.random_range(1..=SALES_REP_COUNT)),
                created_date: self.days_ago(OPPORTUNITY_LOOKBACK_DAYS),
                close_date: self.days_ahead(OPPORTUNITY_LOOKAHEAD_DAYS),
            })
            .collect()
    }

    pub fn generate_closed_deals(&mut self, count: usize) -> Vec<ClosedDeal> {
        (0..count)
            .map(|index| ClosedDeal {
                id: format!("D{}", DEAL_ID_BASE + index),
                opportunity_id: format!(
                    "O{}",
                    OPPORTUNITY_ID_BASE + self.rng.random_range(0..OPPORTUNITY_REFERENCE_SPAN)
                ),
                amount: self.amount(),
                close_date: self.days_ago(DEAL_LOOKBACK_DAYS),
                status: if self.rng.random_bool(WON_PROBABILITY) {
                    DealStatus::ClosedWon
                } else {
                    DealStatus::ClosedLost
                },
            })
            .collect()
    }

    fn amount(&mut self) -> f64 {
        round_cents(self.rng.random_range(MIN_AMOUNT..=MAX_AMOUNT))
    }

    fn days_ago(&mut self, window: i64) -> NaiveDate {
        self.today - Duration::days(self.rng.random_range(0..=window))
    }

    fn days_ahead(&mut self, window: i64) -> NaiveDate {
        self.today + Duration::days(self.rng.random_range(0..=window))
    }

    fn company_name(&mut self) -> String {
        format!(
            "{} {} {}",
            pick(&mut self.rng, &COMPANY_PREFIXES),
            pick(&mut self.rng, &COMPANY_SUFFIXES),
            pick(&mut self.rng, &COMPANY_FORMS)
        )
    }
}

fn pick<T: Copy, R: Rng>(rng: &mut R, items: &[T]) -> T {
    items[rng.random_range(0..items.len())]
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
