//! Filter projection for display.
//!
//! [`project`] derives a filtered copy of a chart or table for rendering.
//! The stored document is never touched, and a projected block must never
//! be written back through [`crate::document::update`].
//!
//! Only `selected_dimensions` filters. The time period is stored with the
//! report but has no effect here.

use crate::block::Block;
use crate::types::{Document, Filters};

/// Returns the block as it should be displayed under `filters`.
///
/// Chart points whose name, or table rows whose first cell, is not among
/// the selected dimensions are dropped. Other blocks, and every block when
/// no dimension is selected, pass through.
#[must_use]
pub fn project(block: &Block, filters: &Filters) -> Block {
    if filters.is_pass_through() {
        return block.clone();
    }
    let selected = |name: &str| filters.selected_dimensions.iter().any(|d| d == name);

    match block {
        Block::Chart(chart) => {
            let mut chart = chart.clone();
            chart.data.retain(|point| selected(&point.name));
            Block::Chart(chart)
        }
        Block::Table(table) => {
            let mut table = table.clone();
            table
                .data
                .rows
                .retain(|row| row.first().is_some_and(|cell| selected(cell)));
            Block::Table(table)
        }
        other => other.clone(),
    }
}

/// Projects every block of a document through its stored filters.
#[must_use]
pub fn project_document(doc: &Document) -> Document {
    Document {
        blocks: doc.blocks.iter().map(|b| project(b, &doc.filters)).collect(),
        ..doc.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{ChartBlock, ChartType, DataPoint, TableBlock, TableData};
    use crate::types::BlockId;

    fn filters(dims: &[&str]) -> Filters {
        Filters {
            selected_dimensions: dims.iter().map(|d| (*d).to_string()).collect(),
            ..Filters::default()
        }
    }

    fn table() -> Block {
        Block::Table(TableBlock {
            id: BlockId::from("t"),
            title: None,
            data: TableData {
                headers: vec!["Region".into(), "Orders".into()],
                rows: vec![
                    vec!["North".into(), "1".into()],
                    vec!["South".into(), "2".into()],
                    vec!["East".into(), "3".into()],
                ],
            },
            is_view_group_open: None,
        })
    }

    fn chart() -> Block {
        Block::Chart(ChartBlock {
            id: BlockId::from("c"),
            title: None,
            chart_type: ChartType::Bar,
            metrics: vec![],
            data: ["Jan", "Feb", "Mar"].into_iter().map(DataPoint::named).collect(),
            is_view_group_open: None,
        })
    }

    #[test]
    fn filters_table_rows() {
        let Block::Table(t) = project(&table(), &filters(&["South", "East", "Nowhere"])) else {
            panic!("Expected table");
        };
        assert_eq!(t.dimensions(), vec!["South", "East"]);
        assert_eq!(t.data.headers.len(), 2);
    }

    #[test]
    fn filters_chart_points() {
        let Block::Chart(c) = project(&chart(), &filters(&["Feb"])) else {
            panic!("Expected chart");
        };
        assert_eq!(c.dimensions(), vec!["Feb"]);
    }

    #[test]
    fn empty_selection_passes_through() {
        let mut f = filters(&[]);
        f.time_period = "Last year".into();
        assert_eq!(project(&table(), &f), table());
    }

    #[test]
    fn projection_is_idempotent() {
        let f = filters(&["North"]);
        let once = project(&table(), &f);
        assert_eq!(project(&once, &f), once);
    }

    #[test]
    fn project_document_leaves_original() {
        let mut doc = Document::new("r", "R").with_blocks(vec![table(), Block::text("x", "hi")]);
        doc.filters = filters(&["North"]);
        let projected = project_document(&doc);
        let Block::Table(t) = &doc.blocks[0] else {
            panic!("Expected table");
        };
        assert_eq!(t.data.rows.len(), 3);
        let Block::Table(p) = &projected.blocks[0] else {
            panic!("Expected table");
        };
        assert_eq!(p.data.rows.len(), 1);
        assert_eq!(projected.blocks[1], doc.blocks[1]);
    }
}
