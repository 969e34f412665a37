//! Chart and table conversion.
//!
//! Both directions are deterministic structural transforms. Values pass
//! through their string form: chart values become cells via `Display`, and
//! cells become values by stripping `$`, `,`, `%` and parsing the leading
//! number. Formatted cells therefore lose precision on a round trip; metric
//! names and dimension names survive it.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::block::{Block, ChartBlock, ChartType, DataPoint, TableBlock, TableData};
use crate::catalog::capitalize;
use crate::error::{CoreError, CoreResult};
use crate::title::synthesize_title;

/// How a data block is displayed: as a table or as one of the chart types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewType {
    Table,
    Line,
    Bar,
    Pie,
    Advanced,
}

impl ViewType {
    /// The chart type for chart views, `None` for table.
    #[must_use]
    pub const fn chart_type(&self) -> Option<ChartType> {
        match self {
            Self::Table => None,
            Self::Line => Some(ChartType::Line),
            Self::Bar => Some(ChartType::Bar),
            Self::Pie => Some(ChartType::Pie),
            Self::Advanced => Some(ChartType::Advanced),
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Line => "line",
            Self::Bar => "bar",
            Self::Pie => "pie",
            Self::Advanced => "advanced",
        }
    }
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(Self::Table),
            other => other.parse::<ChartType>().map(Self::from),
        }
    }
}

impl From<ChartType> for ViewType {
    fn from(chart_type: ChartType) -> Self {
        match chart_type {
            ChartType::Line => Self::Line,
            ChartType::Bar => Self::Bar,
            ChartType::Pie => Self::Pie,
            ChartType::Advanced => Self::Advanced,
        }
    }
}

/// Switches a data block to another view.
///
/// Chart to table and table to chart convert the data. Chart to another
/// chart type only changes `chart_type`. Table to table is unchanged.
pub fn convert_block(block: Block, to: ViewType) -> CoreResult<Block> {
    match (block, to.chart_type()) {
        (Block::Chart(chart), None) => Ok(Block::Table(chart_to_table(chart))),
        (Block::Chart(chart), Some(chart_type)) => {
            Ok(Block::Chart(ChartBlock { chart_type, ..chart }))
        }
        (Block::Table(table), Some(chart_type)) => {
            Ok(Block::Chart(table_to_chart(table, chart_type)))
        }
        (table @ Block::Table(_), None) => Ok(table),
        (other, _) => Err(CoreError::NotDataBlock(other.id().clone())),
    }
}

/// Converts a chart into a table.
///
/// Headers are `"Name"` followed by the metrics (or `"Value"` for a chart
/// without metrics). Missing values become `"0"`.
#[must_use]
pub fn chart_to_table(chart: ChartBlock) -> TableBlock {
    let columns: Vec<String> = if chart.metrics.is_empty() {
        vec!["Value".to_string()]
    } else {
        chart.metrics.clone()
    };

    let mut headers = Vec::with_capacity(columns.len() + 1);
    headers.push("Name".to_string());
    headers.extend(columns.iter().cloned());

    let rows = chart
        .data
        .iter()
        .map(|point| {
            let mut row = Vec::with_capacity(columns.len() + 1);
            row.push(point.name.clone());
            if chart.metrics.is_empty() {
                row.push(value_cell(point.value));
            } else {
                row.extend(chart.metrics.iter().map(|m| value_cell(point.get(m))));
            }
            row
        })
        .collect();

    TableBlock {
        id: chart.id,
        title: Some(synthesize_title(&columns, "dimension")),
        data: TableData { headers, rows },
        is_view_group_open: chart.is_view_group_open,
    }
}

fn value_cell(value: Option<f64>) -> String {
    value.map_or_else(|| "0".to_string(), |v| v.to_string())
}

/// Converts a table into a chart of the given type.
///
/// Every metric column becomes a numeric field of each point; `value` copies
/// the first metric. A column headed `name` or `value` is renamed, see
/// [`point_safe_metrics`].
#[must_use]
pub fn table_to_chart(table: TableBlock, chart_type: ChartType) -> ChartBlock {
    let metrics = point_safe_metrics(table.metrics());

    let data = table
        .data
        .rows
        .iter()
        .map(|row| {
            let name = row
                .first()
                .filter(|cell| !cell.is_empty())
                .cloned()
                .unwrap_or_else(|| "Unknown".to_string());
            let mut point = DataPoint::named(name);
            for (i, metric) in metrics.iter().enumerate() {
                let cell = row.get(i + 1).map_or("0", String::as_str);
                point.values.insert(metric.clone(), parse_cell(cell));
            }
            point.value = Some(metrics.first().and_then(|m| point.get(m)).unwrap_or(0.0));
            point
        })
        .collect();

    let dimension = table
        .data
        .headers
        .first()
        .filter(|h| !h.is_empty())
        .map_or_else(|| "dimension".to_string(), |h| h.to_lowercase());

    ChartBlock {
        id: table.id,
        title: Some(synthesize_title(&metrics, &dimension)),
        chart_type,
        metrics,
        data,
        is_view_group_open: table.is_view_group_open,
    }
}

/// Metric names that can be stored as point fields.
///
/// A name equal to one of [`DataPoint::RESERVED_FIELDS`] is capitalized,
/// then numbered (`"Value 2"`) if that is taken too. Order is kept.
#[must_use]
pub fn point_safe_metrics(metrics: &[String]) -> Vec<String> {
    let mut safe: Vec<String> = Vec::with_capacity(metrics.len());
    for metric in metrics {
        if !DataPoint::is_reserved_field(metric) {
            safe.push(metric.clone());
            continue;
        }
        let base = capitalize(metric);
        let mut candidate = base.clone();
        let mut n = 2;
        while metrics.contains(&candidate) || safe.contains(&candidate) {
            candidate = format!("{base} {n}");
            n += 1;
        }
        safe.push(candidate);
    }
    safe
}

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid regex")
});

/// Parses a formatted cell: `"$12,345.6"` is `12345.6`, `"4.2%"` is `4.2`.
///
/// Only the leading number counts; anything unparsable is `0`.
#[must_use]
pub fn parse_cell(cell: &str) -> f64 {
    let stripped: String = cell.chars().filter(|c| !matches!(c, '$' | ',' | '%')).collect();
    LEADING_NUMBER
        .find(stripped.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arb;
    use crate::migrate::migrate;
    use crate::types::BlockId;
    use proptest::{prop_assert_eq, proptest};

    fn chart() -> ChartBlock {
        let mut jan = DataPoint::named("Jan");
        jan.values.insert("Revenue".into(), 1200.5);
        jan.values.insert("Orders".into(), 40.0);
        jan.value = Some(1200.5);
        let mut feb = DataPoint::named("Feb");
        feb.values.insert("Revenue".into(), 900.0);
        ChartBlock {
            id: BlockId::from("c1"),
            title: Some("Old".into()),
            chart_type: ChartType::Bar,
            metrics: vec!["Revenue".into(), "Orders".into()],
            data: vec![jan, feb],
            is_view_group_open: Some(true),
        }
    }

    #[test]
    fn chart_to_table_stringifies_values() {
        let table = chart_to_table(chart());
        assert_eq!(table.data.headers, vec!["Name", "Revenue", "Orders"]);
        assert_eq!(table.data.rows[0], vec!["Jan", "1200.5", "40"]);
        assert_eq!(table.data.rows[1], vec!["Feb", "900", "0"]);
        assert_eq!(table.title.as_deref(), Some("Revenue and Orders by Dimension"));
        assert_eq!(table.is_view_group_open, Some(true));
    }

    #[test]
    fn chart_without_metrics_uses_value_column() {
        let mut point = DataPoint::named("North");
        point.value = Some(7.0);
        let legacy = ChartBlock {
            metrics: vec![],
            data: vec![point],
            ..chart()
        };
        let table = chart_to_table(legacy);
        assert_eq!(table.data.headers, vec!["Name", "Value"]);
        assert_eq!(table.data.rows[0], vec!["North", "7"]);
        assert_eq!(table.title.as_deref(), Some("Value by Dimension"));
    }

    #[test]
    fn table_to_chart_strips_formatting() {
        let table = TableBlock {
            id: BlockId::from("t1"),
            title: None,
            data: TableData {
                headers: vec!["Region".into(), "Revenue".into(), "Conversion Rate".into()],
                rows: vec![
                    vec!["North".into(), "$12,345.6".into(), "4.20%".into()],
                    vec!["".into(), "n/a".into()],
                ],
            },
            is_view_group_open: None,
        };
        let chart = table_to_chart(table, ChartType::Pie);
        assert_eq!(chart.chart_type, ChartType::Pie);
        assert_eq!(chart.metrics, vec!["Revenue", "Conversion Rate"]);
        assert_eq!(chart.data[0].get("Revenue"), Some(12345.6));
        assert_eq!(chart.data[0].get("Conversion Rate"), Some(4.2));
        assert_eq!(chart.data[0].value, Some(12345.6));
        assert_eq!(chart.data[1].name, "Unknown");
        assert_eq!(chart.data[1].get("Revenue"), Some(0.0));
        assert_eq!(chart.data[1].get("Conversion Rate"), Some(0.0));
        assert_eq!(
            chart.title.as_deref(),
            Some("Revenue and Conversion Rate by Region")
        );
    }

    #[test]
    fn columns_named_like_point_fields_are_renamed() {
        let table = TableBlock {
            id: BlockId::from("t2"),
            title: None,
            data: TableData {
                headers: vec!["Time".into(), "value".into(), "Value".into(), "name".into()],
                rows: vec![vec!["Jan".into(), "1".into(), "2".into(), "3".into()]],
            },
            is_view_group_open: None,
        };
        let chart = table_to_chart(table, ChartType::Line);
        assert_eq!(chart.metrics, vec!["Value 2", "Value", "Name"]);

        let json = serde_json::to_value(&chart.data[0]).unwrap();
        assert_eq!(json["name"], "Jan");
        assert_eq!(json["value"], 1.0);
        assert_eq!(json["Value 2"], 1.0);
        assert_eq!(json["Value"], 2.0);
        assert_eq!(json["Name"], 3.0);
    }

    #[test]
    fn round_trip_preserves_metrics_and_dimensions() {
        let original = chart();
        let back = table_to_chart(chart_to_table(original.clone()), original.chart_type);
        assert_eq!(back.metrics, original.metrics);
        assert_eq!(back.dimensions(), original.dimensions());
    }

    #[test]
    fn parse_cell_takes_leading_number() {
        assert_eq!(parse_cell("12abc"), 12.0);
        assert_eq!(parse_cell(" -3.5"), -3.5);
        assert_eq!(parse_cell("abc"), 0.0);
        assert_eq!(parse_cell("1e3"), 1000.0);
    }

    #[test]
    fn convert_between_chart_types_keeps_data() {
        let original = chart();
        let converted = convert_block(Block::Chart(original.clone()), ViewType::Line).unwrap();
        let Block::Chart(converted) = converted else {
            panic!("Expected chart");
        };
        assert_eq!(converted.chart_type, ChartType::Line);
        assert_eq!(converted.data, original.data);
        assert_eq!(converted.title, original.title);
    }

    #[test]
    fn convert_text_is_rejected() {
        let err = convert_block(Block::text("x", "hi"), ViewType::Table).unwrap_err();
        assert_eq!(err, CoreError::NotDataBlock(BlockId::from("x")));
    }

    #[test]
    fn view_type_parses() {
        assert_eq!("table".parse::<ViewType>().unwrap(), ViewType::Table);
        assert_eq!("pie".parse::<ViewType>().unwrap(), ViewType::Pie);
        assert!("radar".parse::<ViewType>().is_err());
    }

    proptest! {
        #[test]
        fn every_view_keeps_shape(blocks in arb::blocks()) {
            let views = [
                ViewType::Bar,
                ViewType::Table,
                ViewType::Pie,
                ViewType::Line,
                ViewType::Table,
            ];
            for block in migrate(blocks) {
                if !matches!(block, Block::Table(_) | Block::Chart(_)) {
                    continue;
                }
                let mut block = block;
                for to in views {
                    block = convert_block(block, to).unwrap();
                    prop_assert_eq!(arb::shape_violation(&block), None);
                }
            }
        }

        #[test]
        fn chart_survives_table_round_trip(blocks in arb::blocks()) {
            for block in migrate(blocks) {
                let Block::Chart(chart) = block else {
                    continue;
                };
                let back = table_to_chart(chart_to_table(chart.clone()), chart.chart_type);
                prop_assert_eq!(&back.metrics, &chart.metrics);
                prop_assert_eq!(back.data.len(), chart.data.len());
                for (before, after) in chart.data.iter().zip(&back.data) {
                    for metric in &chart.metrics {
                        prop_assert_eq!(after.get(metric), before.get(metric));
                    }
                }
            }
        }
    }
}
