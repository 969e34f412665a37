//! Upgrade of legacy block shapes to the current shape.
//!
//! [`migrate`] is pure, total, and idempotent. It runs whenever blocks come
//! out of storage or arrive over realtime sync, before anything else looks
//! at them.
//!
//! Legacy detection is heuristic. The signals below are the whole predicate
//! table; they match what older editors wrote and nothing more. A block that
//! trips one has its data regenerated from a seed derived from its id, so a
//! second pass produces the same block.

use crate::block::{Block, ChartBlock, TableBlock, TableData};
use crate::catalog::{self, PlaceholderShape};
use crate::title::synthesize_title;

/// Block shape version written by this crate.
///
/// Every [`LegacySignal`] describes a version 1 shape. A future shape change
/// adds its signals here and bumps this number.
pub const BLOCK_SCHEMA_VERSION: u32 = 2;

/// Why a table or chart block counts as legacy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacySignal {
    /// Table without a headers array.
    MissingHeaders,
    /// Table with only the dimension header.
    SingleHeader,
    /// A header containing the `"Column"` placeholder label.
    ColumnPlaceholder,
    /// A header that is exactly `"Product"`.
    ProductHeader,
    /// A `"Sales"` header in a table with at most three headers.
    SmallSalesTable,
    /// Chart without a non-empty metrics array.
    MissingMetrics,
    /// Chart whose first point carries only the bare `value` field.
    BareValuePoints,
}

/// Returns true if a single header label is a legacy placeholder.
#[must_use]
pub fn is_legacy_header(header: &str, header_count: usize) -> bool {
    header_signal(header, header_count).is_some()
}

fn header_signal(header: &str, header_count: usize) -> Option<LegacySignal> {
    if header.contains("Column") {
        Some(LegacySignal::ColumnPlaceholder)
    } else if header == "Product" {
        Some(LegacySignal::ProductHeader)
    } else if header == "Sales" && header_count <= 3 {
        Some(LegacySignal::SmallSalesTable)
    } else {
        None
    }
}

/// Detects a legacy table shape.
#[must_use]
pub fn table_legacy_signal(data: &TableData) -> Option<LegacySignal> {
    match data.headers.len() {
        0 => Some(LegacySignal::MissingHeaders),
        1 => Some(LegacySignal::SingleHeader),
        n => data.headers.iter().find_map(|h| header_signal(h, n)),
    }
}

/// Detects a legacy chart shape.
#[must_use]
pub fn chart_legacy_signal(chart: &ChartBlock) -> Option<LegacySignal> {
    if chart.metrics.is_empty() {
        return Some(LegacySignal::MissingMetrics);
    }
    match chart.data.first() {
        Some(point) if point.is_bare_value() => Some(LegacySignal::BareValuePoints),
        _ => None,
    }
}

/// Migrates a list of blocks to the current shape.
#[must_use]
pub fn migrate(blocks: Vec<Block>) -> Vec<Block> {
    blocks.into_iter().map(migrate_block).collect()
}

/// Migrates one block. Text and separator blocks pass through.
#[must_use]
pub fn migrate_block(block: Block) -> Block {
    match block {
        Block::Table(table) => Block::Table(migrate_table(table)),
        Block::Chart(chart) => Block::Chart(migrate_chart(chart)),
        other => other,
    }
}

fn migrate_table(table: TableBlock) -> TableBlock {
    if let Some(signal) = table_legacy_signal(&table.data) {
        tracing::debug!(block_id = %table.id, ?signal, "Regenerating legacy table data");
        let mut rng = catalog::seeded_rng(&table.id);
        let shape = PlaceholderShape::random(&mut rng);
        let fresh = catalog::placeholder_table(&mut rng, table.id.clone(), shape);
        return TableBlock {
            title: if table.has_title() { table.title } else { fresh.title },
            data: fresh.data,
            ..table
        };
    }

    let mut table = table;
    if !table.has_title() {
        let dimension = table.data.headers[0].to_lowercase();
        table.title = Some(synthesize_title(table.metrics(), &dimension));
    }
    let width = table.data.headers.len();
    for row in &mut table.data.rows {
        row.resize(width, String::new());
    }
    table
}

fn migrate_chart(chart: ChartBlock) -> ChartBlock {
    if let Some(signal) = chart_legacy_signal(&chart) {
        tracing::debug!(block_id = %chart.id, ?signal, "Regenerating legacy chart data");
        let mut rng = catalog::seeded_rng(&chart.id);
        let shape = PlaceholderShape::random(&mut rng);
        let fresh = catalog::placeholder_chart(&mut rng, chart.id.clone(), shape);
        return ChartBlock {
            title: if chart.has_title() { chart.title } else { fresh.title },
            metrics: fresh.metrics,
            data: fresh.data,
            ..chart
        };
    }

    let mut chart = chart;
    if !chart.has_title() && !chart.data.is_empty() {
        let dimension = if chart.data[0].name.is_empty() {
            "dimension"
        } else {
            "time"
        };
        chart.title = Some(synthesize_title(&chart.metrics, dimension));
    }
    for point in &mut chart.data {
        for metric in &chart.metrics {
            point.values.entry(metric.clone()).or_insert(0.0);
        }
    }
    chart
}

// ============================================================================
// Tests
// ============================================================================
