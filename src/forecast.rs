use crate::models::{Forecast, KpiReport};
use rand::Rng;
use std::ops::RangeInclusive;

const REVENUE_MULTIPLIER: RangeInclusive<f64> = 0.9..=1.2;
const LEAD_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Default, Clone, Copy)]
pub struct Forecaster;

impl Forecaster {
    pub fn new() -> Self {
        Self
    }

    pub fn forecast<R: Rng>(&self, kpis: &KpiReport, rng: &mut R) -> Forecast {
        Forecast {
            next_30d_revenue: kpis.computed.monthly_revenue * rng.random_range(REVENUE_MULTIPLIER),
            next_30d_leads: (kpis.computed.lead_conversion_rate * LEAD_MULTIPLIER).trunc() as i64,
        }
    }
}
