//! Natural-language intent extraction contract.
//!
//! A side panel lets users describe the metrics and dimensions they want in
//! free text. An [`IntentSource`] turns that text into an [`Intent`]; the
//! model behind it is not part of this crate. Whatever a source returns is
//! restricted to catalog names, and a failing source falls back to
//! [`keyword_intent`].

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::block::{Block, DataPoint};
use crate::catalog::{self, METRICS};

/// Metrics and dimension values named by a query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    #[serde(default)]
    pub metrics: Vec<String>,
    #[serde(default)]
    pub dimensions: Vec<String>,
}

impl Intent {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.dimensions.is_empty()
    }

    /// Drops names that are not in the metric or dimension catalogs.
    #[must_use]
    pub fn restricted_to_catalog(self) -> Self {
        Self {
            metrics: self
                .metrics
                .into_iter()
                .filter(|m| METRICS.contains(&m.as_str()))
                .collect(),
            dimensions: self
                .dimensions
                .into_iter()
                .filter(|d| catalog::all_dimension_values().any(|v| v == d))
                .collect(),
        }
    }
}

/// Something that extracts an [`Intent`] from free text.
pub trait IntentSource {
    type Error: std::error::Error;

    fn extract(&self, query: &str) -> impl Future<Output = Result<Intent, Self::Error>> + Send;
}

/// Matches catalog names that appear in `query`, ignoring case.
#[must_use]
pub fn keyword_intent(query: &str) -> Intent {
    let query = query.to_lowercase();
    Intent {
        metrics: METRICS
            .iter()
            .filter(|m| query.contains(&m.to_lowercase()))
            .map(|m| (*m).to_string())
            .collect(),
        dimensions: catalog::all_dimension_values()
            .filter(|d| query.contains(&d.to_lowercase()))
            .map(str::to_string)
            .collect(),
    }
}

/// Asks `source`, falling back to keyword matching when it fails.
pub async fn extract_intent<S: IntentSource>(source: &S, query: &str) -> Intent {
    match source.extract(query).await {
        Ok(intent) => intent.restricted_to_catalog(),
        Err(e) => {
            tracing::warn!(error = %e, "Intent source failed; using keyword matching");
            keyword_intent(query)
        }
    }
}

/// Reshapes a data block to an intent.
///
/// Non-empty metrics replace the block's metrics; non-empty dimensions
/// rename existing rows or points in order and append zeroed ones as
/// needed. Returns `None` for text and separator blocks.
#[must_use]
pub fn apply_intent(block: &Block, intent: &Intent) -> Option<Block> {
    match block {
        Block::Table(table) => {
            let mut table = table.clone();
            if !intent.metrics.is_empty() {
                let dimension = table
                    .data
                    .headers
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "Dimension".to_string());
                table.data.headers = std::iter::once(dimension)
                    .chain(intent.metrics.iter().cloned())
                    .collect();
            }
            if !intent.dimensions.is_empty() {
                let existing = std::mem::take(&mut table.data.rows);
                table.data.rows = intent
                    .dimensions
                    .iter()
                    .enumerate()
                    .map(|(i, dim)| match existing.get(i) {
                        Some(row) => std::iter::once(dim.clone())
                            .chain(row.iter().skip(1).cloned())
                            .collect(),
                        None => vec![dim.clone()],
                    })
                    .collect();
            }
            let width = table.data.headers.len();
            for row in &mut table.data.rows {
                row.resize(width, "0".to_string());
            }
            Some(Block::Table(table))
        }
        Block::Chart(chart) => {
            let mut chart = chart.clone();
            if !intent.metrics.is_empty() {
                chart.metrics = intent.metrics.clone();
            }
            if !intent.dimensions.is_empty() {
                let existing = std::mem::take(&mut chart.data);
                chart.data = intent
                    .dimensions
                    .iter()
                    .enumerate()
                    .map(|(i, dim)| match existing.get(i) {
                        Some(point) => DataPoint {
                            name: dim.clone(),
                            ..point.clone()
                        },
                        None => DataPoint::named(dim.clone()),
                    })
                    .collect();
            }
            for point in &mut chart.data {
                for metric in &chart.metrics {
                    point.values.entry(metric.clone()).or_insert(0.0);
                }
            }
            Some(Block::Chart(chart))
        }
        _ => None,
    }
}
