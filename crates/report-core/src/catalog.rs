//! Master metric and dimension catalogs, and placeholder data generation.
//!
//! New table and chart blocks start with sampled e-commerce data: a random
//! subset of the metric catalog crossed with the leading values of one
//! dimension kind. All generators take the RNG as a parameter so callers can
//! seed them.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::block::{ChartBlock, ChartType, DataPoint, TableBlock, TableData};
use crate::migrate;
use crate::title::synthesize_title;
use crate::types::BlockId;

/// Master metric catalog, in catalog order.
pub const METRICS: &[&str] = &[
    "Revenue",
    "Sales",
    "Orders",
    "Conversion Rate",
    "Average Order Value",
    "Customer Acquisition Cost",
    "Return Rate",
    "Refund Rate",
    "Gross Profit",
    "Net Profit",
];

/// Bounds for sampled placeholder shapes.
pub const MIN_METRICS: usize = 1;
pub const MAX_METRICS: usize = 5;
pub const MIN_DIMENSIONS: usize = 5;
pub const MAX_DIMENSIONS: usize = 10;

// ============================================================================
// Dimensions
// ============================================================================

/// A family of dimension values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DimensionKind {
    Time,
    Region,
    Campaign,
    Channel,
    Product,
}

impl DimensionKind {
    /// All kinds, in catalog order.
    pub const ALL: [DimensionKind; 5] = [
        Self::Time,
        Self::Region,
        Self::Campaign,
        Self::Channel,
        Self::Product,
    ];

    /// Lowercase kind name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Region => "region",
            Self::Campaign => "campaign",
            Self::Channel => "channel",
            Self::Product => "product",
        }
    }

    /// Header label: the capitalized kind name.
    #[must_use]
    pub fn label(&self) -> String {
        capitalize(self.name())
    }

    /// Values of this kind, in catalog order.
    #[must_use]
    pub const fn values(&self) -> &'static [&'static str] {
        match self {
            Self::Time => &[
                "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
            ],
            Self::Region => &[
                "North",
                "South",
                "East",
                "West",
                "Central",
                "Northeast",
                "Northwest",
                "Southeast",
                "Southwest",
            ],
            Self::Campaign => &[
                "Campaign A",
                "Campaign B",
                "Campaign C",
                "Campaign D",
                "Summer Sale",
                "Winter Sale",
                "Black Friday",
                "Holiday Promo",
            ],
            Self::Channel => &[
                "Organic",
                "Paid Search",
                "Social Media",
                "Email",
                "Direct",
                "Referral",
                "Affiliate",
            ],
            Self::Product => &[
                "Electronics",
                "Clothing",
                "Home & Garden",
                "Sports",
                "Books",
                "Toys",
                "Beauty",
                "Food",
            ],
        }
    }
}

/// Every dimension value of every kind, in catalog order.
pub fn all_dimension_values() -> impl Iterator<Item = &'static str> {
    DimensionKind::ALL
        .iter()
        .flat_map(|kind| kind.values().iter().copied())
}

/// A dimension kind with the values selected for one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimensions {
    pub kind: DimensionKind,
    pub values: Vec<String>,
}

impl Dimensions {
    /// The first `count` values of `kind` (fewer if the kind is shorter).
    #[must_use]
    pub fn leading(kind: DimensionKind, count: usize) -> Self {
        Self {
            kind,
            values: kind
                .values()
                .iter()
                .take(count)
                .map(|v| (*v).to_string())
                .collect(),
        }
    }
}

/// Uppercases the first character.
#[must_use]
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============================================================================
// Metric values
// ============================================================================

fn is_rate(metric: &str) -> bool {
    metric.contains("Rate") || metric.contains("Conversion")
}

fn is_currency(metric: &str) -> bool {
    metric.contains("Cost")
        || metric.contains("Value")
        || metric.contains("Profit")
        || metric == "Revenue"
}

/// Samples a plausible value for a metric.
pub fn generate_metric_value<R: Rng + ?Sized>(rng: &mut R, metric: &str) -> f64 {
    if is_rate(metric) {
        rng.r#gen::<f64>() * 10.0 + 1.0
    } else if is_currency(metric) {
        rng.r#gen::<f64>() * 50_000.0 + 1_000.0
    } else {
        (rng.r#gen::<f64>() * 1_000.0 + 10.0).floor()
    }
}

/// Formats a metric value for a table cell.
///
/// Rates become `"4.20%"`, currency-like metrics `"$12,345.678"`, and
/// everything else grouped digits.
#[must_use]
pub fn format_metric_value(metric: &str, value: f64) -> String {
    if is_rate(metric) {
        format!("{value:.2}%")
    } else if is_currency(metric) {
        format!("${}", group_digits(value))
    } else {
        group_digits(value)
    }
}

/// Renders a number with thousands separators and at most three decimals.
fn group_digits(value: f64) -> String {
    let fixed = format!("{:.3}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, ""));
    let frac = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && (int_part != "0" || !frac.is_empty()) {
        "-"
    } else {
        ""
    };
    if frac.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac}")
    }
}

// ============================================================================
// Sampling
// ============================================================================

/// Metric and dimension counts for a placeholder block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderShape {
    pub metrics: usize,
    pub dimensions: usize,
}

impl PlaceholderShape {
    /// Samples 1-5 metrics and 5-10 dimension values.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            metrics: rng.gen_range(MIN_METRICS..=MAX_METRICS),
            dimensions: rng.gen_range(MIN_DIMENSIONS..=MAX_DIMENSIONS),
        }
    }
}

/// Samples `count` distinct metrics from the catalog.
pub fn sample_metrics<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<String> {
    let mut pool: Vec<&str> = METRICS.to_vec();
    pool.shuffle(rng);
    pool.into_iter().take(count).map(str::to_string).collect()
}

/// Samples a dimension kind that has at least `count` values.
pub fn sample_dimensions<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Dimensions {
    pick_dimensions(rng, count, &DimensionKind::ALL)
}

fn pick_dimensions<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    kinds: &[DimensionKind],
) -> Dimensions {
    let roomy: Vec<DimensionKind> = kinds
        .iter()
        .copied()
        .filter(|k| k.values().len() >= count)
        .collect();
    let kind = roomy
        .choose(rng)
        .or_else(|| kinds.choose(rng))
        .copied()
        .unwrap_or(DimensionKind::Time);
    Dimensions::leading(kind, count)
}

/// Builds table data: one row per dimension value, formatted metric cells.
pub fn generate_table_data<R: Rng + ?Sized>(
    rng: &mut R,
    metrics: &[String],
    dimensions: &Dimensions,
) -> TableData {
    let mut headers = Vec::with_capacity(metrics.len() + 1);
    headers.push(dimensions.kind.label());
    headers.extend(metrics.iter().cloned());

    let rows = dimensions
        .values
        .iter()
        .map(|dim| {
            let mut row = Vec::with_capacity(metrics.len() + 1);
            row.push(dim.clone());
            for metric in metrics {
                let value = generate_metric_value(rng, metric);
                row.push(format_metric_value(metric, value));
            }
            row
        })
        .collect();

    TableData { headers, rows }
}

/// Builds chart data: one point per dimension value, `value` mirroring the
/// first metric.
pub fn generate_chart_data<R: Rng + ?Sized>(
    rng: &mut R,
    metrics: &[String],
    dimensions: &Dimensions,
) -> Vec<DataPoint> {
    dimensions
        .values
        .iter()
        .map(|dim| {
            let mut point = DataPoint::named(dim.clone());
            for metric in metrics {
                point
                    .values
                    .insert(metric.clone(), generate_metric_value(rng, metric));
            }
            point.value = metrics.first().and_then(|m| point.get(m));
            point
        })
        .collect()
}

/// Samples a table whose headers do not trip the legacy-shape detector.
pub fn placeholder_table<R: Rng + ?Sized>(
    rng: &mut R,
    id: BlockId,
    shape: PlaceholderShape,
) -> TableBlock {
    let mut pool: Vec<&str> = METRICS
        .iter()
        .copied()
        .filter(|m| !migrate::is_legacy_header(m, shape.metrics + 1))
        .collect();
    pool.shuffle(rng);
    let metrics: Vec<String> = pool
        .into_iter()
        .take(shape.metrics)
        .map(str::to_string)
        .collect();

    let kinds: Vec<DimensionKind> = DimensionKind::ALL
        .iter()
        .copied()
        .filter(|k| !migrate::is_legacy_header(&k.label(), shape.metrics + 1))
        .collect();
    let dimensions = pick_dimensions(rng, shape.dimensions, &kinds);

    let data = generate_table_data(rng, &metrics, &dimensions);
    TableBlock {
        id,
        title: Some(synthesize_title(&metrics, &dimensions.kind.label())),
        data,
        is_view_group_open: None,
    }
}

/// Samples a line chart.
pub fn placeholder_chart<R: Rng + ?Sized>(
    rng: &mut R,
    id: BlockId,
    shape: PlaceholderShape,
) -> ChartBlock {
    let metrics = sample_metrics(rng, shape.metrics);
    let dimensions = sample_dimensions(rng, shape.dimensions);
    let data = generate_chart_data(rng, &metrics, &dimensions);
    ChartBlock {
        id,
        title: Some(synthesize_title(&metrics, &dimensions.kind.label())),
        chart_type: ChartType::Line,
        metrics,
        data,
        is_view_group_open: None,
    }
}

/// Deterministic RNG derived from a block id.
///
/// Regenerating data for the same block always yields the same values.
#[must_use]
pub fn seeded_rng(id: &BlockId) -> StdRng {
    StdRng::from_seed(*blake3::hash(id.as_str().as_bytes()).as_bytes())
}

// ============================================================================
// Tests
// ============================================================================
