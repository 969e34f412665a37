//! Metric and dimension edits on a single data block.
//!
//! Each helper takes one chart or table block and returns the edited copy,
//! or `None` when the edit does not apply (not a data block, index out of
//! range, catalog exhausted). Edits keep the shape invariants: table rows
//! stay as wide as the headers, chart points carry every metric.

use crate::block::{Block, DataPoint};
use crate::catalog::{self, METRICS};

/// Metric names of a data block. Empty for text and separator blocks.
#[must_use]
pub fn metrics_of(block: &Block) -> Vec<String> {
    match block {
        Block::Table(table) => table.metrics().to_vec(),
        Block::Chart(chart) => chart.metrics.clone(),
        _ => Vec::new(),
    }
}

/// Dimension values of a data block, skipping empty names.
#[must_use]
pub fn dimensions_of(block: &Block) -> Vec<String> {
    match block {
        Block::Table(table) => table.dimensions(),
        Block::Chart(chart) => chart.dimensions(),
        _ => Vec::new(),
    }
}

/// Appends the first catalog metric not already on the block.
///
/// Table rows get a `"0"` cell, chart points a `0` value.
#[must_use]
pub fn add_metric(block: &Block) -> Option<Block> {
    let used = metrics_of(block);
    let metric = METRICS
        .iter()
        .find(|m| !DataPoint::is_reserved_field(m) && !used.iter().any(|u| u == *m))?;

    match block {
        Block::Table(table) if !table.data.headers.is_empty() => {
            let mut table = table.clone();
            table.data.headers.push((*metric).to_string());
            for row in &mut table.data.rows {
                row.push("0".to_string());
            }
            Some(Block::Table(table))
        }
        Block::Chart(chart) => {
            let mut chart = chart.clone();
            let first = chart.metrics.is_empty();
            chart.metrics.push((*metric).to_string());
            for point in &mut chart.data {
                point.values.insert((*metric).to_string(), 0.0);
                if first {
                    point.value = Some(0.0);
                }
            }
            Some(Block::Chart(chart))
        }
        _ => None,
    }
}

/// Removes the metric at `index` (into the metric list, not the headers).
#[must_use]
pub fn remove_metric(block: &Block, index: usize) -> Option<Block> {
    match block {
        Block::Table(table) => {
            if index >= table.metrics().len() {
                return None;
            }
            let mut table = table.clone();
            table.data.headers.remove(index + 1);
            for row in &mut table.data.rows {
                if index + 1 < row.len() {
                    row.remove(index + 1);
                }
            }
            Some(Block::Table(table))
        }
        Block::Chart(chart) => {
            if index >= chart.metrics.len() {
                return None;
            }
            let mut chart = chart.clone();
            let removed = chart.metrics.remove(index);
            for point in &mut chart.data {
                point.values.remove(&removed);
                // `value` mirrors whichever metric is now first.
                point.value = chart
                    .metrics
                    .first()
                    .map(|first| point.get(first).unwrap_or(0.0));
            }
            Some(Block::Chart(chart))
        }
        _ => None,
    }
}

/// Appends a row or point for the first catalog dimension value not already
/// on the block, with zeroed metrics.
#[must_use]
pub fn add_dimension(block: &Block) -> Option<Block> {
    let used = dimensions_of(block);
    let value = catalog::all_dimension_values().find(|d| !used.iter().any(|u| u == d))?;

    match block {
        Block::Table(table) if !table.data.headers.is_empty() => {
            let mut table = table.clone();
            let mut row = Vec::with_capacity(table.data.headers.len());
            row.push(value.to_string());
            row.extend(table.metrics().iter().map(|_| "0".to_string()));
            table.data.rows.push(row);
            Some(Block::Table(table))
        }
        Block::Chart(chart) => {
            let mut chart = chart.clone();
            let mut point = DataPoint::named(value);
            for metric in &chart.metrics {
                point.values.insert(metric.clone(), 0.0);
            }
            point.value = Some(0.0);
            chart.data.push(point);
            Some(Block::Chart(chart))
        }
        _ => None,
    }
}

/// Removes the row or point at `index`.
#[must_use]
pub fn remove_dimension(block: &Block, index: usize) -> Option<Block> {
    match block {
        Block::Table(table) if index < table.data.rows.len() => {
            let mut table = table.clone();
            table.data.rows.remove(index);
            Some(Block::Table(table))
        }
        Block::Chart(chart) if index < chart.data.len() => {
            let mut chart = chart.clone();
            chart.data.remove(index);
            Some(Block::Chart(chart))
        }
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
