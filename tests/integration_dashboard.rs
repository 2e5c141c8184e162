use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sales_pulse_lib::generator::{GenerationCounts, SyntheticDataGenerator};
use sales_pulse_lib::kpi::KpiCalculator;
use sales_pulse_lib::models::{KpiValue, Stage};
use sales_pulse_lib::orchestrator::Orchestrator;
use sales_pulse_lib::quality::check_records;
use sales_pulse_lib::render_dashboard;
use sales_pulse_lib::settings::{DashboardSettings, OutputFormat};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, 14).expect("valid date")
}

#[test]
fn html_dashboard_is_written_to_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let output = dir.path().join("dashboard.html");
    let settings = DashboardSettings {
        seed: Some(123),
        ..DashboardSettings::default()
    };

    render_dashboard(&settings, Some(&output)).expect("render dashboard");

    let html = std::fs::read_to_string(&output).expect("read dashboard");
    for section in [
        "Sales Performance",
        "Pipeline Health",
        "Stage Conversion",
        "Lead Generation",
        "Financial Metrics",
        "Show Raw Data",
    ] {
        assert!(html.contains(section), "missing section {section}");
    }
    assert!(html.contains("L1000"));
    assert!(html.contains("D3029"));
}

#[test]
fn json_dashboard_exposes_kpi_mapping_and_forecast() {
    let dir = tempfile::tempdir().expect("temp dir");
    let output = dir.path().join("dashboard.json");
    let settings = DashboardSettings {
        seed: Some(7),
        output_format: OutputFormat::Json,
        lead_count: 10,
        ..DashboardSettings::default()
    };

    render_dashboard(&settings, Some(&output)).expect("render dashboard");

    let raw = std::fs::read_to_string(&output).expect("read dashboard");
    let parsed: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
    let kpis = parsed["kpis"].as_object().expect("kpi mapping");
    for name in [
        "monthly_revenue",
        "average_deal_size",
        "win_rate",
        "sales_cycle_days",
        "quota_attainment",
        "pipeline_value",
        "pipeline_velocity",
        "forecast_accuracy",
        "stage_conversion",
        "coverage_ratio",
        "lead_conversion_rate",
        "cost_per_lead",
        "mql_to_sql",
        "website_conversion",
        "cac",
    ] {
        assert!(kpis.contains_key(name), "missing metric {name}");
    }
    assert!(parsed["forecast"]["next_30d_revenue"].is_number());
    assert!(parsed["forecast"]["next_30d_leads"].is_i64());
}

#[test]
fn generated_kpis_follow_their_definitions() {
    let dataset = SyntheticDataGenerator::from_seed(31, today()).generate_dataset(GenerationCounts::default());
    let report = KpiCalculator::new().calculate(&dataset, &mut StdRng::seed_from_u64(31));
    let computed = report.computed;

    let open_total: f64 = dataset
        .opportunities
        .iter()
        .filter(|opportunity| opportunity.stage.is_open())
        .map(|opportunity| opportunity.amount)
        .sum();
    assert_eq!(computed.pipeline_value, open_total);
    assert!((computed.pipeline_velocity - open_total * 0.7 / 30.0).abs() < 1e-9);
    if open_total > 0.0 {
        assert_eq!(computed.coverage_ratio, open_total / 100_000.0);
    }
    assert!((0.0..=100.0).contains(&computed.win_rate));
    assert!((0.0..=100.0).contains(&computed.lead_conversion_rate));

    let mapping = report.to_mapping();
    match &mapping["stage_conversion"] {
        KpiValue::Nested(rates) => {
            let expected = Stage::CONVERSION_TRACKED
                .iter()
                .map(|stage| stage.as_str().to_string())
                .collect::<Vec<_>>();
            let mut actual = rates.keys().cloned().collect::<Vec<_>>();
            actual.sort();
            let mut expected_sorted = expected;
            expected_sorted.sort();
            assert_eq!(actual, expected_sorted);
        }
        other => panic!("stage_conversion should be nested, got {other:?}"),
    }
}

#[test]
fn references_are_lookup_or_absent() {
    let counts = GenerationCounts {
        leads: 3,
        opportunities: 20,
        closed_deals: 20,
    };
    let view = Orchestrator::new(StdRng::seed_from_u64(77), today(), counts).build_view();
    let dataset = &view.dataset;
    assert!(dataset.lead("L1000").is_some());
    assert!(dataset.lead("L1003").is_none());
    let dangling = dataset
        .opportunities
        .iter()
        .filter(|opportunity| dataset.lead(&opportunity.lead_id).is_none())
        .count();
    let resolved = dataset.opportunities.len() - dangling;
    assert_eq!(
        resolved,
        dataset
            .opportunities
            .iter()
            .filter(|opportunity| ["L1000", "L1001", "L1002"].contains(&opportunity.lead_id.as_str()))
            .count()
    );

    assert!(dataset.opportunity("O2000").is_some());
    assert!(dataset.opportunity("O2020").is_none());
    for deal in &dataset.closed_deals {
        let number: usize = deal.opportunity_id[1..].parse().expect("numeric opportunity ref");
        match dataset.opportunity(&deal.opportunity_id) {
            Some(opportunity) => {
                assert!(number < 2020);
                assert_eq!(opportunity.id, deal.opportunity_id);
            }
            None => assert!(number >= 2020),
        }
    }
}

#[test]
fn quality_check_flags_hand_built_null_record() {
    let rows = vec![
        serde_json::json!({"id": "D3000", "amount": 1200.0, "status": "Closed Won"}),
        serde_json::json!({"id": "D3001", "amount": null, "status": "Closed Lost"}),
    ];
    let issues = check_records("closed_deals", &rows);
    assert_eq!(issues.len(), 1);
    assert!(issues[0].to_string().contains("D3001"));
}
