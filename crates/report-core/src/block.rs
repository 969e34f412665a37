//! Block variants.
//!
//! A block is one addressable unit of report content. The JSON form is
//! internally tagged by `type` (`text`, `table`, `chart`, `separator`).
//!
//! Decoding is lenient: persisted blocks may carry legacy or partial shapes,
//! so missing fields default, numeric strings become numbers, and scalar
//! cells become strings. Shapes that decode but are still legacy are
//! upgraded by [`crate::migrate`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::types::BlockId;

// ============================================================================
// Block
// ============================================================================

/// One unit of report content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    Text(TextBlock),
    Table(TableBlock),
    Chart(ChartBlock),
    Separator(SeparatorBlock),
}

impl Block {
    /// Returns the block's id.
    #[must_use]
    pub fn id(&self) -> &BlockId {
        match self {
            Self::Text(b) => &b.id,
            Self::Table(b) => &b.id,
            Self::Chart(b) => &b.id,
            Self::Separator(b) => &b.id,
        }
    }

    /// Returns the block's kind tag.
    #[must_use]
    pub fn kind(&self) -> BlockKind {
        match self {
            Self::Text(_) => BlockKind::Text,
            Self::Table(_) => BlockKind::Table,
            Self::Chart(_) => BlockKind::Chart,
            Self::Separator(_) => BlockKind::Separator,
        }
    }

    /// Creates an empty text block with a fresh id.
    #[must_use]
    pub fn empty_text() -> Self {
        Self::Text(TextBlock {
            id: BlockId::generate(),
            content: String::new(),
        })
    }

    /// Creates a separator block with a fresh id.
    #[must_use]
    pub fn separator() -> Self {
        Self::Separator(SeparatorBlock {
            id: BlockId::generate(),
        })
    }

    /// Creates a text block with the given id and content.
    #[must_use]
    pub fn text(id: impl Into<BlockId>, content: impl Into<String>) -> Self {
        Self::Text(TextBlock {
            id: id.into(),
            content: content.into(),
        })
    }
}

/// Block kind tag, as used by the insert command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    Table,
    Chart,
    Separator,
}

impl BlockKind {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Table => "table",
            Self::Chart => "chart",
            Self::Separator => "separator",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "table" => Ok(Self::Table),
            "chart" => Ok(Self::Chart),
            "separator" => Ok(Self::Separator),
            other => Err(CoreError::UnknownBlockKind(other.to_string())),
        }
    }
}

// ============================================================================
// Variants
// ============================================================================

/// Rich-text block. `content` is HTML-like markup owned by the editor surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub id: BlockId,
    #[serde(default, deserialize_with = "lenient::string")]
    pub content: String,
}

/// Horizontal rule between blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeparatorBlock {
    pub id: BlockId,
}

/// Data table. `headers[0]` labels the dimension, `headers[1..]` are metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableBlock {
    pub id: BlockId,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_string"
    )]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::table_data")]
    pub data: TableData,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_bool"
    )]
    pub is_view_group_open: Option<bool>,
}

impl TableBlock {
    /// Metric names (headers after the dimension label).
    #[must_use]
    pub fn metrics(&self) -> &[String] {
        self.data.headers.get(1..).unwrap_or(&[])
    }

    /// Dimension values (first cell of each row), skipping empty cells.
    #[must_use]
    pub fn dimensions(&self) -> Vec<String> {
        self.data
            .rows
            .iter()
            .filter_map(|row| row.first())
            .filter(|cell| !cell.is_empty())
            .cloned()
            .collect()
    }

    /// Returns true if the block has a non-empty title.
    #[must_use]
    pub fn has_title(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Headers and string cells of a table.
///
/// Every row has `headers.len()` cells once migrated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableData {
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub headers: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_rows")]
    pub rows: Vec<Vec<String>>,
}

/// Chart. Every data point carries a numeric value per metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartBlock {
    pub id: BlockId,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_string"
    )]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::chart_type")]
    pub chart_type: ChartType,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub metrics: Vec<String>,
    #[serde(default, deserialize_with = "lenient::data_points")]
    pub data: Vec<DataPoint>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_bool"
    )]
    pub is_view_group_open: Option<bool>,
}

impl ChartBlock {
    /// Dimension values (data point names), skipping empty names.
    #[must_use]
    pub fn dimensions(&self) -> Vec<String> {
        self.data
            .iter()
            .map(|point| point.name.clone())
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Returns true if the block has a non-empty title.
    #[must_use]
    pub fn has_title(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Visual form of a chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Line,
    Bar,
    Pie,
    Advanced,
}

impl FromStr for ChartType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "line" => Ok(Self::Line),
            "bar" => Ok(Self::Bar),
            "pie" => Ok(Self::Pie),
            "advanced" => Ok(Self::Advanced),
            other => Err(CoreError::UnknownChartType(other.to_string())),
        }
    }
}

/// One point of a chart series.
///
/// Serialized flat: `{"name": "Jan", "value": 3, "Revenue": 3, "Orders": 7}`.
/// `value` is the legacy single-metric field, kept as a copy of the first
/// metric for older readers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct DataPoint {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

impl DataPoint {
    /// Creates a point with the given name and no values.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            values: BTreeMap::new(),
        }
    }

    /// Returns the value of a metric.
    #[must_use]
    pub fn get(&self, metric: &str) -> Option<f64> {
        self.values.get(metric).copied()
    }

    /// Keys a point uses for itself. A metric stored under one of them
    /// would collide with it when serialized.
    pub const RESERVED_FIELDS: [&'static str; 2] = ["name", "value"];

    /// Returns true if `key` cannot be used as a metric field.
    #[must_use]
    pub fn is_reserved_field(key: &str) -> bool {
        Self::RESERVED_FIELDS.contains(&key)
    }

    /// Returns true if the point only carries the legacy `value` field.
    #[must_use]
    pub fn is_bare_value(&self) -> bool {
        self.value.is_some() && self.values.is_empty()
    }
}

impl From<Map<String, Value>> for DataPoint {
    fn from(map: Map<String, Value>) -> Self {
        let mut point = DataPoint::default();
        for (key, value) in map {
            match key.as_str() {
                "name" => point.name = lenient::scalar_to_string(&value),
                "value" => point.value = lenient::number(&value),
                _ => {
                    if let Some(n) = lenient::number(&value) {
                        point.values.insert(key, n);
                    }
                }
            }
        }
        point
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Decodes a JSON array of persisted blocks.
///
/// Entries that cannot be decoded as any block variant are dropped with a
/// warning; a non-array value yields no blocks.
pub fn decode_blocks(value: Value) -> Vec<Block> {
    let Value::Array(items) = value else {
        if !value.is_null() {
            tracing::warn!("Persisted blocks are not an array; ignoring");
        }
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Block>(item) {
            Ok(block) => Some(block),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping undecodable block");
                None
            }
        })
        .collect()
}

pub(crate) fn decode_block_list<'de, D>(deserializer: D) -> Result<Vec<Block>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(decode_blocks(Value::deserialize(deserializer)?))
}

pub(crate) mod lenient {
    //! Tolerant field decoders for persisted block JSON.

    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{ChartType, DataPoint, TableData};

    pub fn scalar_to_string(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => other.to_string(),
        }
    }

    pub fn number(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(scalar_to_string(&Value::deserialize(d)?))
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Null => None,
            other => Some(scalar_to_string(&other)),
        })
    }

    pub fn opt_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        Ok(Value::deserialize(d)?.as_bool())
    }

    pub fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items.iter().map(scalar_to_string).collect(),
            _ => Vec::new(),
        })
    }

    pub fn string_rows<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Vec<String>>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(rows) => rows
                .iter()
                .map(|row| match row {
                    Value::Array(cells) => cells.iter().map(scalar_to_string).collect(),
                    _ => Vec::new(),
                })
                .collect(),
            _ => Vec::new(),
        })
    }

    pub fn table_data<'de, D: Deserializer<'de>>(d: D) -> Result<TableData, D::Error> {
        let value = Value::deserialize(d)?;
        if !value.is_object() {
            return Ok(TableData::default());
        }
        Ok(serde_json::from_value(value).unwrap_or_default())
    }

    pub fn chart_type<'de, D: Deserializer<'de>>(d: D) -> Result<ChartType, D::Error> {
        Ok(Value::deserialize(d)?
            .as_str()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default())
    }

    pub fn data_points<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<DataPoint>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(map) => Some(DataPoint::from(map)),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
