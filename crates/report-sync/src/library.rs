//! Sidebar grouping of the report library.

use serde::Serialize;

use report_core::{CATEGORY_MY_REPORTS, CATEGORY_SHARED, Document, ReportId};

/// One sidebar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub id: ReportId,
    pub title: String,
}

impl From<&Document> for ReportEntry {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            title: doc.display_title().to_string(),
        }
    }
}

/// Reports grouped the way the sidebar lists them.
///
/// A favourite report appears both under favourites and under its category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportGroups {
    pub favorites: Vec<ReportEntry>,
    pub my_reports: Vec<ReportEntry>,
    pub shared_with_me: Vec<ReportEntry>,
}

/// Groups `reports`, keeping their order within each group.
#[must_use]
pub fn group_reports(reports: &[Document]) -> ReportGroups {
    let mut groups = ReportGroups::default();
    for doc in reports {
        if doc.favorite {
            groups.favorites.push(doc.into());
        }
        match doc.category.as_str() {
            CATEGORY_MY_REPORTS => groups.my_reports.push(doc.into()),
            CATEGORY_SHARED => groups.shared_with_me.push(doc.into()),
            other => tracing::debug!(report_id = %doc.id, category = other, "Report in unknown category"),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_core::AccessLevel;

    #[test]
    fn groups_by_category_and_favorite() {
        let mut starred = Document::new("a", "");
        starred.favorite = true;
        let shared = Document::new("b", "Shared")
            .with_access_level(AccessLevel::Read)
            .with_category(CATEGORY_SHARED);
        let stray = Document::new("c", "Elsewhere").with_category("archive");

        let groups = group_reports(&[starred, shared, stray]);
        assert_eq!(
            groups.favorites,
            vec![ReportEntry {
                id: ReportId::from("a"),
                title: "New report".to_string()
            }]
        );
        assert_eq!(groups.my_reports.len(), 1);
        assert_eq!(groups.shared_with_me[0].title, "Shared");
    }
}
