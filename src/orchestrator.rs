use crate::errors::AppResult;
use crate::forecast::Forecaster;
use crate::generator::{GenerationCounts, SyntheticDataGenerator};
use crate::kpi::KpiCalculator;
use crate::models::DashboardView;
use crate::quality;
use crate::render::DashboardRenderer;
use crate::settings::DashboardSettings;
use chrono::{NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

/// Runs one pass of generate, quality check, KPI calculation and forecast.
pub struct Orchestrator<R: Rng> {
    rng: R,
    today: NaiveDate,
    counts: GenerationCounts,
    kpi: KpiCalculator,
    forecaster: Forecaster,
}

impl Orchestrator<StdRng> {
    pub fn from_settings(settings: &DashboardSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::new(rng, Utc::now().date_naive(), settings.counts())
    }
}

impl<R: Rng> Orchestrator<R> {
    pub fn new(rng: R, today: NaiveDate, counts: GenerationCounts) -> Self {
        Self {
            rng,
            today,
            counts,
            kpi: KpiCalculator::new(),
            forecaster: Forecaster::new(),
        }
    }

    pub fn build_view(self) -> DashboardView {
        let run_id = Uuid::new_v4();
        let mut generator = SyntheticDataGenerator::new(self.rng, self.today);
        let dataset = generator.generate_dataset(self.counts);
        let mut rng = generator.into_rng();

        let quality_issues = quality::check_completeness(&dataset);
        for issue in &quality_issues {
            tracing::warn!(
                run_id = %run_id,
                dataset = %issue.dataset,
                record_id = issue.record_id.as_deref().unwrap_or_default(),
                missing_fields = ?issue.missing_fields,
                "{}",
                issue
            );
        }

        let kpis = self.kpi.calculate(&dataset, &mut rng);
        let forecast = self.forecaster.forecast(&kpis, &mut rng);
        tracing::info!(
            run_id = %run_id,
            monthly_revenue = kpis.computed.monthly_revenue,
            win_rate = kpis.computed.win_rate,
            pipeline_value = kpis.computed.pipeline_value,
            next_30d_revenue = forecast.next_30d_revenue,
            quality_issues = quality_issues.len(),
            "dashboard metrics computed"
        );

        DashboardView {
            run_id,
            generated_at: Utc::now(),
            kpis,
            forecast,
            quality_issues,
            dataset,
        }
    }

    pub fn run<D: DashboardRenderer + ?Sized>(self, renderer: &mut D) -> AppResult<DashboardView> {
        let view = self.build_view();
        renderer.render(&view)?;
        tracing::info!(run_id = %view.run_id, "dashboard rendered");
        Ok(view)
    }
}
