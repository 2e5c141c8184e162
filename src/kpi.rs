//! KPI aggregation over a [`SalesDataset`].
//!
//! Computed metrics are pure reductions over the records. Simulated metrics
//! are stand-ins drawn from fixed ranges and carry no information about the
//! dataset; they live in [`SimulatedKpis`] so callers cannot mix them up.

use crate::models::{ComputedKpis, DealStatus, KpiReport, LeadStatus, SalesDataset, SimulatedKpis, Stage};
use rand::Rng;
use std::ops::RangeInclusive;

/// Share of the open pipeline expected to close.
const PIPELINE_CLOSE_RATE: f64 = 0.7;
const PIPELINE_WINDOW_DAYS: f64 = 30.0;
const COVERAGE_TARGET: f64 = 100_000.0;

const SALES_CYCLE_DAYS: RangeInclusive<f64> = 14.0..=45.0;
const QUOTA_ATTAINMENT: RangeInclusive<f64> = 70.0..=120.0;
const FORECAST_ACCURACY: RangeInclusive<f64> = 80.0..=95.0;
const STAGE_CONVERSION: RangeInclusive<f64> = 0.2..=0.8;
const COST_PER_LEAD: RangeInclusive<f64> = 50.0..=200.0;
const MQL_TO_SQL: RangeInclusive<f64> = 20.0..=50.0;
const WEBSITE_CONVERSION: RangeInclusive<f64> = 1.0..=5.0;
const CAC: RangeInclusive<f64> = 500.0..=2000.0;

#[derive(Debug, Default, Clone, Copy)]
pub struct KpiCalculator;

impl KpiCalculator {
    pub fn new() -> Self {
        Self
    }

    pub fn calculate<R: Rng>(&self, dataset: &SalesDataset, rng: &mut R) -> KpiReport {
        KpiReport {
            computed: self.compute(dataset),
            simulated: self.simulate(rng),
        }
    }

    pub fn compute(&self, dataset: &SalesDataset) -> ComputedKpis {
        let won_amounts = dataset
            .closed_deals
            .iter()
            .filter(|deal| deal.status == DealStatus::ClosedWon)
            .map(|deal| deal.amount)
            .collect::<Vec<_>>();
        let lost_count = dataset
            .closed_deals
            .iter()
            .filter(|deal| deal.status == DealStatus::ClosedLost)
            .count();

        let monthly_revenue: f64 = won_amounts.iter().sum();
        let average_deal_size = ratio(monthly_revenue, won_amounts.len());
        let win_rate = ratio(won_amounts.len() as f64, won_amounts.len() + lost_count) * 100.0;

        let open_amounts = dataset
            .opportunities
            .iter()
            .filter(|opportunity| opportunity.stage.is_open())
            .map(|opportunity| opportunity.amount)
            .collect::<Vec<_>>();
        let pipeline_value: f64 = open_amounts.iter().sum();
        let coverage_ratio = if open_amounts.is_empty() {
            0.0
        } else {
            pipeline_value / COVERAGE_TARGET
        };

        let qualified_leads = dataset
            .leads
            .iter()
            .filter(|lead| lead.status == LeadStatus::Qualified)
            .count();

        ComputedKpis {
            monthly_revenue,
            average_deal_size,
            win_rate,
            pipeline_value,
            pipeline_velocity: pipeline_value * PIPELINE_CLOSE_RATE / PIPELINE_WINDOW_DAYS,
            coverage_ratio,
            lead_conversion_rate: ratio(qualified_leads as f64, dataset.leads.len()) * 100.0,
        }
    }

    pub fn simulate<R: Rng>(&self, rng: &mut R) -> SimulatedKpis {
        SimulatedKpis {
            sales_cycle_days: rng.random_range(SALES_CYCLE_DAYS),
            quota_attainment: rng.random_range(QUOTA_ATTAINMENT),
            forecast_accuracy: rng.random_range(FORECAST_ACCURACY),
            stage_conversion: Stage::CONVERSION_TRACKED
                .iter()
                .map(|stage| (*stage, rng.random_range(STAGE_CONVERSION)))
                .collect(),
            cost_per_lead: rng.random_range(COST_PER_LEAD),
            mql_to_sql: rng.random_range(MQL_TO_SQL),
            website_conversion: rng.random_range(WEBSITE_CONVERSION),
            cac: rng.random_range(CAC),
        }
    }
}

/// `numerator / count`, or 0 when `count` is 0.
fn ratio(numerator: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    numerator / count as f64
}
