//! Sample reports.
//!
//! A fresh installation gets three editable sample reports and one shared,
//! read-only report. Their blocks come from a legacy single-document
//! snapshot when one exists, otherwise from a fixed welcome set.

use rand::Rng;

use report_core::catalog::{self, DimensionKind, Dimensions};
use report_core::{
    AccessLevel, Block, BlockId, CATEGORY_MY_REPORTS, CATEGORY_SHARED, ChartBlock, ChartType,
    Document, ReportId, TableBlock, migrate, synthesize_title,
};
use report_store::{PrimaryStore, ReportStore};

/// Report opened when nothing else is available.
pub const FIRST_SAMPLE_REPORT: &str = "my-reports-1";

const SAMPLE_REPORTS: &[(&str, &str, AccessLevel, &str)] = &[
    (
        FIRST_SAMPLE_REPORT,
        "[Sample] OM Creative Performance review",
        AccessLevel::Edit,
        CATEGORY_MY_REPORTS,
    ),
    (
        "my-reports-2",
        "[Sample] Q4 Marketing Performance",
        AccessLevel::Edit,
        CATEGORY_MY_REPORTS,
    ),
    (
        "my-reports-3",
        "[Sample] Sales Dashboard 2024",
        AccessLevel::Edit,
        CATEGORY_MY_REPORTS,
    ),
    (
        "shared-1",
        "[Sample] OM Creative Performance review",
        AccessLevel::Read,
        CATEGORY_SHARED,
    ),
];

/// The fixed welcome blocks: two paragraphs, a table and two charts.
pub fn sample_blocks<R: Rng + ?Sized>(rng: &mut R) -> Vec<Block> {
    let table_metrics = names(&["Revenue", "Sales", "Orders"]);
    let table_dims = Dimensions::leading(DimensionKind::Time, 7);

    let line_metrics = names(&["Revenue", "Sales"]);
    let line_dims = Dimensions::leading(DimensionKind::Time, 6);

    let bar_metrics = names(&["Orders", "Conversion Rate"]);
    let bar_dims = Dimensions::leading(DimensionKind::Region, 5);

    vec![
        Block::text(
            "1",
            "Welcome to CL Blocks! Type \"/\" to add a new block.",
        ),
        Block::text(
            "2",
            "This is a Notion-style block editor with drag-and-drop support.",
        ),
        Block::Table(TableBlock {
            id: BlockId::from("3"),
            title: Some(synthesize_title(&table_metrics, &table_dims.kind.label())),
            data: catalog::generate_table_data(rng, &table_metrics, &table_dims),
            is_view_group_open: None,
        }),
        sample_chart(rng, "4", ChartType::Line, line_metrics, &line_dims),
        sample_chart(rng, "5", ChartType::Bar, bar_metrics, &bar_dims),
    ]
}

fn names(metrics: &[&str]) -> Vec<String> {
    metrics.iter().map(|m| (*m).to_string()).collect()
}

fn sample_chart<R: Rng + ?Sized>(
    rng: &mut R,
    id: &str,
    chart_type: ChartType,
    metrics: Vec<String>,
    dims: &Dimensions,
) -> Block {
    Block::Chart(ChartBlock {
        id: BlockId::from(id),
        title: Some(synthesize_title(&metrics, &dims.kind.label())),
        chart_type,
        data: catalog::generate_chart_data(rng, &metrics, dims),
        metrics,
        is_view_group_open: None,
    })
}

/// Creates the sample reports unless the store already lists any report.
///
/// Returns the ids that were written; empty when reports already existed.
pub async fn initialize_reports<P, R>(store: &ReportStore<P>, rng: &mut R) -> Vec<ReportId>
where
    P: PrimaryStore,
    R: Rng + ?Sized,
{
    let existing = store.list_all().await;
    if !existing.is_empty() {
        tracing::debug!(count = existing.len(), "Reports already exist; skipping initialization");
        return Vec::new();
    }

    let blocks = match store.legacy_blocks().await {
        Ok(Some(legacy)) => {
            tracing::info!(blocks = legacy.len(), "Seeding reports from legacy document snapshot");
            migrate(legacy)
        }
        Ok(None) => sample_blocks(rng),
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable legacy document snapshot; using sample blocks");
            sample_blocks(rng)
        }
    };

    let mut created = Vec::with_capacity(SAMPLE_REPORTS.len());
    for (id, title, access_level, category) in SAMPLE_REPORTS {
        let doc = Document::new(*id, *title)
            .with_blocks(blocks.clone())
            .with_access_level(*access_level)
            .with_category(*category);
        if store.save(&doc).await {
            tracing::info!(report_id = %doc.id, "Initialized report");
            created.push(doc.id);
        }
    }
    created
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use report_store::{LocalReports, MemoryPrimary};

    fn store() -> ReportStore<MemoryPrimary> {
        ReportStore::new(Some(MemoryPrimary::new()), LocalReports::in_memory("cl-blocks"))
    }

    #[test]
    fn sample_blocks_have_the_welcome_shape() {
        let blocks = sample_blocks(&mut StdRng::seed_from_u64(7));
        assert_eq!(blocks.len(), 5);

        let Block::Table(table) = &blocks[2] else {
            panic!("Expected table");
        };
        assert_eq!(table.data.headers, vec!["Time", "Revenue", "Sales", "Orders"]);
        assert_eq!(table.data.rows.len(), 7);
        assert!(table.data.rows.iter().all(|row| row.len() == 4));

        let Block::Chart(bar) = &blocks[4] else {
            panic!("Expected chart");
        };
        assert_eq!(bar.chart_type, ChartType::Bar);
        assert_eq!(bar.dimensions(), vec!["North", "South", "East", "West", "Central"]);
    }

    #[test]
    fn sample_blocks_survive_migration_untouched() {
        let blocks = sample_blocks(&mut StdRng::seed_from_u64(7));
        assert_eq!(migrate(blocks.clone()), blocks);
    }

    #[tokio::test]
    async fn creates_four_reports_once() {
        let store = store();
        let created = initialize_reports(&store, &mut StdRng::seed_from_u64(1)).await;
        let ids: Vec<&str> = created.iter().map(ReportId::as_str).collect();
        assert_eq!(ids, vec!["my-reports-1", "my-reports-2", "my-reports-3", "shared-1"]);

        let shared = store.load(&ReportId::from("shared-1")).await.unwrap();
        assert!(shared.is_read_only());
        assert_eq!(shared.category, CATEGORY_SHARED);

        let again = initialize_reports(&store, &mut StdRng::seed_from_u64(1)).await;
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn seeds_from_legacy_snapshot() {
        let store = store();
        store
            .local()
            .set_legacy_blocks(&[Block::text("old", "kept from before")])
            .unwrap();

        initialize_reports(&store, &mut StdRng::seed_from_u64(1)).await;
        let doc = store.load(&ReportId::from("my-reports-2")).await.unwrap();
        assert_eq!(doc.blocks, vec![Block::text("old", "kept from before")]);
    }
}
