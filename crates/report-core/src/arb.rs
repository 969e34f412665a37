//! proptest strategies for persisted block arrays and edit sequences.
//!
//! Blocks are generated as the JSON older and current editors wrote, then
//! decoded, so legacy headers, ragged rows and bare `value` points all show
//! up alongside well-formed blocks.

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Map, Value, json};

use crate::block::{Block, BlockKind, DataPoint, decode_blocks};
use crate::convert::ViewType;
use crate::types::Document;
use crate::{document, metrics};

const METRIC_POOL: [&str; 4] = ["Revenue", "Orders", "Users", "Return Rate"];

fn finite() -> impl Strategy<Value = f64> {
    -1.0e6..1.0e6f64
}

fn header() -> impl Strategy<Value = String> {
    prop_oneof![
        (1u8..6).prop_map(|n| format!("Column {n}")),
        prop::sample::select(vec![
            "Product", "Sales", "Region", "Month", "Revenue", "Orders", "value", "name", "",
        ])
        .prop_map(str::to_string),
    ]
}

fn cell() -> impl Strategy<Value = Value> {
    prop_oneof![
        finite().prop_map(|v| json!(v)),
        finite().prop_map(|v| json!(v.to_string())),
        (0u32..100_000).prop_map(|v| json!(format!("${v},000"))),
        (0u32..100).prop_map(|v| json!(format!("{v}.5%"))),
        Just(json!("")),
        Just(json!("n/a")),
        Just(Value::Null),
    ]
}

fn title() -> impl Strategy<Value = Option<&'static str>> {
    prop::option::of(prop::sample::select(vec!["", "Kept"]))
}

fn table_json() -> impl Strategy<Value = Value> {
    (
        prop::option::of(prop::collection::vec(header(), 0..5)),
        prop::collection::vec(prop::collection::vec(cell(), 0..6), 0..5),
        title(),
    )
        .prop_map(|(headers, rows, title)| {
            let mut data = Map::new();
            if let Some(headers) = headers {
                data.insert("headers".into(), json!(headers));
            }
            data.insert("rows".into(), json!(rows));
            let mut table = json!({"type": "table", "data": data});
            if let Some(title) = title {
                table["title"] = json!(title);
            }
            table
        })
}

type PointParts = (&'static str, Option<f64>, Vec<Option<f64>>);

fn point_parts() -> impl Strategy<Value = PointParts> {
    (
        prop::sample::select(vec!["Jan", "Feb", "North", ""]),
        prop::option::of(finite()),
        prop::collection::vec(prop::option::of(finite()), METRIC_POOL.len()),
    )
}

fn chart_json() -> impl Strategy<Value = Value> {
    (
        prop::option::of(prop::sample::subsequence(METRIC_POOL.to_vec(), 0..=4)),
        prop::collection::vec(point_parts(), 0..6),
        prop::sample::select(vec!["line", "bar", "pie", "advanced", "sparkline"]),
        title(),
    )
        .prop_map(|(metrics, points, chart_type, title)| {
            let names = metrics.clone().unwrap_or_default();
            let data: Vec<Value> = points
                .into_iter()
                .map(|(name, value, slots)| {
                    let mut point = Map::new();
                    point.insert("name".into(), json!(name));
                    if let Some(value) = value {
                        point.insert("value".into(), json!(value));
                    }
                    for (metric, slot) in names.iter().zip(slots) {
                        if let Some(v) = slot {
                            point.insert((*metric).to_string(), json!(v));
                        }
                    }
                    Value::Object(point)
                })
                .collect();
            let mut chart = json!({"type": "chart", "chartType": chart_type, "data": data});
            if let Some(metrics) = metrics {
                chart["metrics"] = json!(metrics);
            }
            if let Some(title) = title {
                chart["title"] = json!(title);
            }
            chart
        })
}

fn block_json() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(json!({"type": "text", "content": "<h1>Intro</h1>"})),
        Just(json!({"type": "separator"})),
        table_json(),
        chart_json(),
    ]
}

/// Persisted block arrays with unique ids, legacy and current shapes mixed.
pub fn blocks() -> impl Strategy<Value = Vec<Block>> {
    prop::collection::vec(block_json(), 0..8).prop_map(|items| {
        let items = items
            .into_iter()
            .enumerate()
            .map(|(i, mut item)| {
                item["id"] = json!(format!("b{i}"));
                item
            })
            .collect();
        decode_blocks(Value::Array(items))
    })
}

/// One user edit. Block positions wrap around the document length.
#[derive(Debug, Clone)]
pub enum Edit {
    AddMetric(usize),
    RemoveMetric(usize, usize),
    AddDimension(usize),
    RemoveDimension(usize, usize),
    Convert(usize, ViewType),
    Insert(BlockKind, usize),
}

fn view_type() -> impl Strategy<Value = ViewType> {
    prop::sample::select(vec![
        ViewType::Table,
        ViewType::Line,
        ViewType::Bar,
        ViewType::Pie,
        ViewType::Advanced,
    ])
}

fn block_kind() -> impl Strategy<Value = BlockKind> {
    prop::sample::select(vec![
        BlockKind::Text,
        BlockKind::Table,
        BlockKind::Chart,
        BlockKind::Separator,
    ])
}

fn edit() -> impl Strategy<Value = Edit> {
    let at = 0usize..16;
    prop_oneof![
        at.clone().prop_map(Edit::AddMetric),
        (at.clone(), 0usize..6).prop_map(|(b, i)| Edit::RemoveMetric(b, i)),
        at.clone().prop_map(Edit::AddDimension),
        (at.clone(), 0usize..12).prop_map(|(b, i)| Edit::RemoveDimension(b, i)),
        (at.clone(), view_type()).prop_map(|(b, to)| Edit::Convert(b, to)),
        (block_kind(), at).prop_map(|(kind, i)| Edit::Insert(kind, i)),
    ]
}

pub fn edits() -> impl Strategy<Value = Vec<Edit>> {
    prop::collection::vec(edit(), 0..24)
}

/// Applies one edit the way the session does: compute, then replace by id.
pub fn apply(doc: &mut Document, edit: &Edit, rng: &mut StdRng) {
    let target = |doc: &Document, at: usize| {
        (!doc.blocks.is_empty()).then(|| doc.blocks[at % doc.blocks.len()].clone())
    };
    let edited = match *edit {
        Edit::Insert(kind, index) => {
            document::insert(doc, kind, index, rng);
            None
        }
        Edit::Convert(at, to) => {
            if let Some(block) = target(doc, at) {
                // Text and separator blocks refuse; that is not a shape change.
                let _ = document::convert(doc, block.id(), to);
            }
            None
        }
        Edit::AddMetric(at) => target(doc, at).and_then(|b| metrics::add_metric(&b)),
        Edit::RemoveMetric(at, i) => target(doc, at).and_then(|b| metrics::remove_metric(&b, i)),
        Edit::AddDimension(at) => target(doc, at).and_then(|b| metrics::add_dimension(&b)),
        Edit::RemoveDimension(at, i) => {
            target(doc, at).and_then(|b| metrics::remove_dimension(&b, i))
        }
    };
    if let Some(block) = edited {
        document::update(doc, block);
    }
}

pub fn rng() -> StdRng {
    StdRng::seed_from_u64(17)
}

/// Describes the first way `block` breaks the current shape, if any.
///
/// Tables: every row as wide as the headers. Charts: every point carries a
/// finite value for every metric, and no metric shadows a point field.
pub fn shape_violation(block: &Block) -> Option<String> {
    match block {
        Block::Table(table) => {
            let width = table.data.headers.len();
            table
                .data
                .rows
                .iter()
                .position(|row| row.len() != width)
                .map(|r| format!("{}: row {r} is not {width} cells wide", table.id))
        }
        Block::Chart(chart) => {
            if let Some(m) = chart.metrics.iter().find(|m| DataPoint::is_reserved_field(m)) {
                return Some(format!("{}: metric {m:?} is a point field", chart.id));
            }
            for point in &chart.data {
                if point.value.is_some_and(|v| !v.is_finite()) {
                    return Some(format!("{}: {:?} has a non-finite value", chart.id, point.name));
                }
                for metric in &chart.metrics {
                    if !point.get(metric).is_some_and(f64::is_finite) {
                        return Some(format!("{}: {:?} lacks {metric}", chart.id, point.name));
                    }
                }
            }
            None
        }
        _ => None,
    }
}
