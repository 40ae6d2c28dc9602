//! Bar chart and circular gauge fragments.

use std::f64::consts::PI;

use crate::domain::content::{BarChartData, MetricItem};

use super::escape::escape_html;

const RING_RADIUS: f64 = 40.0;
const CHART_FOOTER: &str = "Source: Aggregated Data Analysis";

/// Stroke geometry of a metric ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingGeometry {
    pub circumference: f64,
    /// Dash offset; zero draws the full ring, `circumference` draws nothing.
    pub offset: f64,
}

/// Geometry for `percent`, clamped to [0, 100].
pub fn ring_geometry(percent: f64) -> RingGeometry {
    let circumference = 2.0 * PI * RING_RADIUS;
    let filled = clamp_percent(percent) / 100.0 * circumference;
    RingGeometry {
        circumference,
        offset: circumference - filled,
    }
}

/// Fill of each bar as a percentage of the largest value. When the largest
/// value is zero every bar is empty.
pub(crate) fn bar_proportions(values: &[f64]) -> Vec<f64> {
    let max = values
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .fold(0.0_f64, f64::max);

    values
        .iter()
        .map(|value| {
            if max > 0.0 && value.is_finite() {
                clamp_percent(value / max * 100.0)
            } else {
                0.0
            }
        })
        .collect()
}

/// Horizontal bar list. Bars start at zero width and carry their target in
/// `data-width` so the page can animate the fill.
pub fn bar_chart(data: &BarChartData) -> String {
    let mut html = String::from(r#"<div class="chart-container bar-chart">"#);
    html.push_str(&format!("<h4>{}</h4>", escape_html(&data.title)));
    html.push_str(r#"<div class="chart-body">"#);

    let proportions = bar_proportions(&data.values);
    for ((label, value), proportion) in data.labels.iter().zip(&data.values).zip(proportions) {
        html.push_str(&format!(
            concat!(
                r#"<div class="chart-row">"#,
                r#"<div class="chart-label">{label}</div>"#,
                r#"<div class="chart-bar-area">"#,
                r#"<div class="chart-bar" style="width: 0%" data-width="{width}%">"#,
                r#"<span class="chart-value">{value}</span>"#,
                "</div></div></div>"
            ),
            label = escape_html(label),
            width = format_percent(proportion),
            value = value,
        ));
    }

    html.push_str(&format!(
        r#"</div><div class="chart-footer">{CHART_FOOTER}</div></div>"#
    ));
    html
}

/// Circular percentage gauge for one metric.
pub fn metric_card(item: &MetricItem) -> String {
    let percent = clamp_percent(item.percent);
    let geometry = ring_geometry(percent);
    format!(
        concat!(
            r#"<div class="metric-card">"#,
            r#"<svg width="100" height="100" viewBox="0 0 100 100" class="circular-chart">"#,
            r##"<circle class="circle-bg-ring" cx="50" cy="50" r="40" stroke="#eee" stroke-width="8" fill="none"/>"##,
            r##"<circle class="circle-progress" cx="50" cy="50" r="40" stroke="#3a7bd5" stroke-width="8" fill="none" "##,
            r#"stroke-dasharray="{circumference:.2}" stroke-dashoffset="{offset:.2}" stroke-linecap="round"/>"#,
            r#"<text x="50" y="55" class="percentage">{percent}%</text>"#,
            "</svg>",
            r#"<p class="metric-label">{label}</p>"#,
            "</div>"
        ),
        circumference = geometry.circumference,
        offset = geometry.offset,
        percent = format_percent(percent),
        label = escape_html(&item.label),
    )
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Two decimals at most, trailing zeros dropped: `50`, `7.14`, `12.5`.
pub(crate) fn format_percent(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    let text = format!("{rounded:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
