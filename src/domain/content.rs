//! Content records and their typed sections.
//!
//! A [`ContentRecord`] is what a content source hands to the renderer: a
//! title, a free-text meta line and an ordered list of [`Section`]s. On the
//! wire a section is an internally tagged object (`{"type": "table", ...}`);
//! unknown tags deserialize to [`Section::Unsupported`] instead of failing.
//!
//! Payloads with structural invariants (tables, bar charts, metric items)
//! are checked when they are built, either through their constructors or
//! during deserialization.

use serde::{Deserialize, Serialize};

use super::error::DomainError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub title: String,
    pub meta: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl ContentRecord {
    pub fn new(title: impl Into<String>, meta: impl Into<String>, sections: Vec<Section>) -> Self {
        Self {
            title: title.into(),
            meta: meta.into(),
            sections,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Section {
    #[serde(alias = "h2")]
    Heading(TextBlock),
    #[serde(alias = "p")]
    Paragraph(TextBlock),
    Image(ImageBlock),
    List(ListBlock),
    Blockquote(TextBlock),
    Callout(TextBlock),
    Table(TableBlock),
    Timeline(TimelineBlock),
    #[serde(alias = "chart-bar")]
    BarChart(BarChartBlock),
    MetricsGrid(MetricsGridBlock),
    Code(CodeBlock),
    Comparison(ComparisonBlock),
    /// Any tag this build does not know how to render.
    #[serde(other)]
    Unsupported,
}

impl Section {
    pub fn heading(content: impl Into<String>) -> Self {
        Self::Heading(TextBlock::new(content))
    }

    pub fn paragraph(content: impl Into<String>) -> Self {
        Self::Paragraph(TextBlock::new(content))
    }

    /// Wire tag of the section, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Section::Heading(_) => "heading",
            Section::Paragraph(_) => "paragraph",
            Section::Image(_) => "image",
            Section::List(_) => "list",
            Section::Blockquote(_) => "blockquote",
            Section::Callout(_) => "callout",
            Section::Table(_) => "table",
            Section::Timeline(_) => "timeline",
            Section::BarChart(_) => "bar-chart",
            Section::MetricsGrid(_) => "metrics-grid",
            Section::Code(_) => "code",
            Section::Comparison(_) => "comparison",
            Section::Unsupported => "unsupported",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    pub content: String,
}

impl TextBlock {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBlock {
    pub src: String,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBlock {
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTableBlock")]
pub struct TableBlock {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableBlock {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, DomainError> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != headers.len())
        {
            return Err(DomainError::validation(format!(
                "table row {index} has {} cells but the table declares {} headers",
                row.len(),
                headers.len()
            )));
        }
        Ok(Self { headers, rows })
    }
}

#[derive(Deserialize)]
struct RawTableBlock {
    headers: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<String>>,
}

impl TryFrom<RawTableBlock> for TableBlock {
    type Error = DomainError;

    fn try_from(raw: RawTableBlock) -> Result<Self, Self::Error> {
        Self::new(raw.headers, raw.rows)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineBlock {
    pub events: Vec<TimelineEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub date: String,
    pub title: String,
    pub desc: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarChartBlock {
    pub data: BarChartData,
}

/// Labelled series for a horizontal bar chart; labels and values align by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBarChartData")]
pub struct BarChartData {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl BarChartData {
    /// All-zero series are accepted; they render as empty bars.
    pub fn new(
        title: impl Into<String>,
        labels: Vec<String>,
        values: Vec<f64>,
    ) -> Result<Self, DomainError> {
        if values.is_empty() {
            return Err(DomainError::validation(
                "bar chart requires at least one value",
            ));
        }
        if labels.len() != values.len() {
            return Err(DomainError::validation(format!(
                "bar chart has {} labels for {} values",
                labels.len(),
                values.len()
            )));
        }
        if let Some(value) = values
            .iter()
            .find(|value| !value.is_finite() || **value < 0.0)
        {
            return Err(DomainError::validation(format!(
                "bar chart value `{value}` must be finite and non-negative"
            )));
        }
        Ok(Self {
            title: title.into(),
            labels,
            values,
        })
    }
}

#[derive(Deserialize)]
struct RawBarChartData {
    title: String,
    labels: Vec<String>,
    values: Vec<f64>,
}

impl TryFrom<RawBarChartData> for BarChartData {
    type Error = DomainError;

    fn try_from(raw: RawBarChartData) -> Result<Self, Self::Error> {
        Self::new(raw.title, raw.labels, raw.values)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsGridBlock {
    pub items: Vec<MetricItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMetricItem")]
pub struct MetricItem {
    pub label: String,
    pub percent: f64,
}

impl MetricItem {
    pub fn new(label: impl Into<String>, percent: f64) -> Result<Self, DomainError> {
        if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
            return Err(DomainError::validation(format!(
                "metric percent `{percent}` must lie within [0, 100]"
            )));
        }
        Ok(Self {
            label: label.into(),
            percent,
        })
    }
}

#[derive(Deserialize)]
struct RawMetricItem {
    label: String,
    percent: f64,
}

impl TryFrom<RawMetricItem> for MetricItem {
    type Error = DomainError;

    fn try_from(raw: RawMetricItem) -> Result<Self, Self::Error> {
        Self::new(raw.label, raw.percent)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// Display label only; never used to pick a highlighter.
    pub language: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonBlock {
    pub items: Vec<ComparisonItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonItem {
    pub name: String,
    pub price: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub winner: bool,
}
