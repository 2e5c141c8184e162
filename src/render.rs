//! Renderers that turn a [`DashboardView`] into something a person can read.

use crate::errors::{AppError, AppResult};
use crate::models::{DashboardView, KpiValue};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;

const CARD_STYLE: &str = r#"
.metric-card {
  background: linear-gradient(135deg, #e0f7fa 0%, #ffffff 100%);
  border-radius: 12px;
  padding: 20px;
  box-shadow: 0 4px 8px rgba(0, 0, 0, 0.1);
  transition: transform 0.3s ease, box-shadow 0.3s ease;
}
.metric-card:hover {
  transform: translateY(-5px);
  box-shadow: 0 8px 16px rgba(0, 0, 0, 0.2);
}
.metric-title { color: #555; font-size: 14px; font-weight: 600; }
.metric-value { color: #2c3e50; font-size: 28px; font-weight: 700; margin: 10px 0; }
.metric-row { display: grid; grid-auto-flow: column; gap: 16px; }
.section-header { color: #228B22; margin-top: 30px; }
.warning { background: #fff3cd; color: #856404; padding: 12px; border-radius: 8px; }
.bar-row { display: flex; align-items: center; gap: 8px; margin: 6px 0; }
.bar-label { width: 120px; }
.bar { background: #008080; height: 18px; }
table { border-collapse: collapse; margin: 12px 0; }
td, th { border: 1px solid #ddd; padding: 4px 8px; }
"#;

const BAR_MAX_WIDTH_PX: f64 = 400.0;

pub trait DashboardRenderer {
    fn render(&mut self, view: &DashboardView) -> AppResult<()>;
}

pub struct HtmlRenderer<W: Write> {
    writer: W,
}

impl<W: Write> HtmlRenderer<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DashboardRenderer for HtmlRenderer<W> {
    fn render(&mut self, view: &DashboardView) -> AppResult<()> {
        let page = render_html_page(view)?;
        self.writer
            .write_all(page.as_bytes())
            .map_err(|error| AppError::Render(error.to_string()))?;
        self.writer.flush()?;
        Ok(())
    }
}

pub struct JsonRenderer<W: Write> {
    writer: W,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DashboardRenderer for JsonRenderer<W> {
    fn render(&mut self, view: &DashboardView) -> AppResult<()> {
        let document = serde_json::json!({
            "runId": view.run_id,
            "generatedAt": view.generated_at,
            "kpis": view.kpis.to_mapping(),
            "ltvEstimate": view.kpis.ltv_estimate(),
            "ltvCacRatio": view.kpis.ltv_cac_ratio(),
            "forecast": view.forecast,
            "qualityIssues": view
                .quality_issues
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
        });
        serde_json::to_writer_pretty(&mut self.writer, &document)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

fn render_html_page(view: &DashboardView) -> AppResult<String> {
    let computed = &view.kpis.computed;
    let simulated = &view.kpis.simulated;

    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<title>Sales KPI Dashboard</title>\n");
    out.push_str(&format!("<style>{}</style>\n</head>\n<body>\n", CARD_STYLE));
    out.push_str("<h1 style=\"color: #008080;\">Sales Performance Dashboard</h1>\n");
    out.push_str(&format!(
        "<p>Run {} generated {}</p>\n",
        view.run_id,
        view.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    if !view.quality_issues.is_empty() {
        let joined = view
            .quality_issues
            .iter()
            .map(|issue| escape_html(&issue.to_string()))
            .collect::<Vec<_>>()
            .join("<br>");
        out.push_str(&format!("<div class=\"warning\">{}</div>\n", joined));
    }

    push_section(
        &mut out,
        "Sales Performance",
        &[
            ("Monthly Revenue", format_currency(computed.monthly_revenue)),
            ("Avg Deal Size", format_currency(computed.average_deal_size)),
            ("Win Rate", format!("{:.1}%", computed.win_rate)),
            ("Sales Cycle", format!("{:.1} days", simulated.sales_cycle_days)),
            ("Quota Attainment", format!("{:.1}%", simulated.quota_attainment)),
        ],
    );

    push_section(
        &mut out,
        "Pipeline Health",
        &[
            ("Pipeline Value", format_currency(computed.pipeline_value)),
            ("Pipeline Velocity", format!("{}/day", format_currency(computed.pipeline_velocity))),
            ("Forecast Accuracy", format!("{:.1}%", simulated.forecast_accuracy)),
            ("Coverage Ratio", format!("{:.2}x", computed.coverage_ratio)),
        ],
    );

    out.push_str("<h2 class=\"section-header\">Stage Conversion</h2>\n");
    if let Some(KpiValue::Nested(rates)) = view.kpis.to_mapping().get("stage_conversion") {
        push_bar_chart(&mut out, rates);
    }

    push_section(
        &mut out,
        "Lead Generation",
        &[
            ("Lead Conversion", format!("{:.1}%", computed.lead_conversion_rate)),
            ("Cost Per Lead", format_currency(simulated.cost_per_lead)),
            ("MQL to SQL", format!("{:.1}%", simulated.mql_to_sql)),
            ("Website Conv.", format!("{:.1}%", simulated.website_conversion)),
        ],
    );

    let ltv_cac = view
        .kpis
        .ltv_cac_ratio()
        .map(|ratio| format!("{:.1}x", ratio))
        .unwrap_or_else(|| "n/a".to_string());
    push_section(
        &mut out,
        "Financial Metrics",
        &[
            ("Customer Acquisition Cost", format_currency(simulated.cac)),
            ("LTV Estimate", format_currency(view.kpis.ltv_estimate())),
            ("LTV:CAC Ratio", ltv_cac),
        ],
    );

    out.push_str("<details>\n<summary>Show Raw Data</summary>\n");
    for (name, rows) in view.dataset.raw_tables()? {
        push_table(&mut out, name, &rows);
    }
    out.push_str("</details>\n</body>\n</html>\n");
    Ok(out)
}

fn push_section(out: &mut String, title: &str, cards: &[(&str, String)]) {
    out.push_str(&format!("<h2 class=\"section-header\">{}</h2>\n", escape_html(title)));
    out.push_str("<div class=\"metric-row\">\n");
    for (label, value) in cards {
        out.push_str(&format!(
            "<div class=\"metric-card\"><div class=\"metric-title\">{}</div><div class=\"metric-value\">{}</div></div>\n",
            escape_html(label),
            escape_html(value)
        ));
    }
    out.push_str("</div>\n");
}

fn push_bar_chart(out: &mut String, rates: &BTreeMap<String, f64>) {
    let max_rate = rates.values().copied().fold(0.0_f64, f64::max);
    for (stage, rate) in rates {
        let width = if max_rate > 0.0 {
            rate / max_rate * BAR_MAX_WIDTH_PX
        } else {
            0.0
        };
        out.push_str(&format!(
            "<div class=\"bar-row\"><span class=\"bar-label\">{}</span><div class=\"bar\" style=\"width: {:.0}px;\"></div><span>{:.2}</span></div>\n",
            escape_html(stage),
            width,
            rate
        ));
    }
}

fn push_table(out: &mut String, name: &str, rows: &[Value]) {
    out.push_str(&format!("<h3>{}</h3>\n<table>\n", escape_html(name)));
    let columns = rows
        .first()
        .and_then(Value::as_object)
        .map(|first| first.keys().cloned().collect::<Vec<_>>())
        .unwrap_or_default();

    out.push_str("<tr>");
    for column in &columns {
        out.push_str(&format!("<th>{}</th>", escape_html(column)));
    }
    out.push_str("</tr>\n");

    for row in rows {
        out.push_str("<tr>");
        for column in &columns {
            let cell = match row.get(column) {
                Some(Value::String(text)) => text.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            out.push_str(&format!("<td>{}</td>", escape_html(&cell)));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>\n");
}

/// Whole-dollar amount with thousands separators, e.g. `$12,345`.
pub fn format_currency(value: f64) -> String {
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}${}", sign, grouped)
}

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{escape_html, format_currency, DashboardRenderer, HtmlRenderer, JsonRenderer};
    use crate::generator::{GenerationCounts, SyntheticDataGenerator};
    use crate::models::{DashboardView, Forecast, KpiReport, SalesDataset};
    use crate::quality::QualityIssue;
    use chrono::Utc;
    use uuid::Uuid;

    fn empty_view() -> DashboardView {
        DashboardView {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            kpis: KpiReport::default(),
            forecast: Forecast::default(),
            quality_issues: Vec::new(),
            dataset: SalesDataset::default(),
        }
    }

    #[test]
    fn formats_currency_with_separators() {
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(999.4), "$999");
        assert_eq!(format_currency(1_000.0), "$1,000");
        assert_eq!(format_currency(70_000.0), "$70,000");
        assert_eq!(format_currency(1_234_567.89), "$1,234,568");
        assert_eq!(format_currency(-2_500.0), "-$2,500");
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("<b>\"A&B\"</b>"), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
    }

    #[test]
    fn html_tolerates_all_zero_values() {
        let mut renderer = HtmlRenderer::new(Vec::new());
        renderer.render(&empty_view()).expect("render html");
        let html = String::from_utf8(renderer.into_inner()).expect("utf8");
        assert!(html.contains("Monthly Revenue"));
        assert!(html.contains("$0"));
        assert!(html.contains("0.0%"));
        assert!(html.contains("LTV:CAC Ratio"));
        assert!(html.contains("n/a"));
        assert!(!html.contains("class=\"warning\""));
    }

    #[test]
    fn raw_lead_table_header_follows_field_order() {
        let mut view = empty_view();
        view.dataset = SyntheticDataGenerator::from_seed(2, Utc::now().date_naive()).generate_dataset(GenerationCounts {
            leads: 1,
            opportunities: 0,
            closed_deals: 0,
        });
        let mut renderer = HtmlRenderer::new(Vec::new());
        renderer.render(&view).expect("render html");
        let html = String::from_utf8(renderer.into_inner()).expect("utf8");
        assert!(html.contains(
            "<h3>leads</h3>\n<table>\n<tr><th>id</th><th>name</th><th>source</th><th>date</th><th>status</th></tr>"
        ));
    }

    #[test]
    fn html_surfaces_quality_issues() {
        let mut view = empty_view();
        view.quality_issues.push(QualityIssue {
            dataset: "leads".to_string(),
            record_id: Some("L1001".to_string()),
            missing_fields: vec!["name".to_string()],
        });
        let mut renderer = HtmlRenderer::new(Vec::new());
        renderer.render(&view).expect("render html");
        let html = String::from_utf8(renderer.into_inner()).expect("utf8");
        assert!(html.contains("Missing data in leads record L1001"));
    }

    #[test]
    fn json_includes_forecast_and_flat_kpis() {
        let mut view = empty_view();
        view.forecast.next_30d_leads = 12;
        let mut renderer = JsonRenderer::new(Vec::new());
        renderer.render(&view).expect("render json");
        let parsed: serde_json::Value = serde_json::from_slice(&renderer.into_inner()).expect("valid json");
        assert_eq!(parsed["forecast"]["next_30d_leads"], 12);
        assert_eq!(parsed["kpis"]["win_rate"], 0.0);
        assert!(parsed["kpis"]["stage_conversion"].is_object());
        assert_eq!(parsed["runId"], view.run_id.to_string());
        assert!(parsed["generatedAt"].is_string());
        assert_eq!(parsed["ltvEstimate"], 0.0);
        assert!(parsed["ltvCacRatio"].is_null());
        assert_eq!(parsed["qualityIssues"].as_array().map(Vec::len), Some(0));
    }
}
