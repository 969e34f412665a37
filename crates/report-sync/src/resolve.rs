//! Which report to open for a requested id.

use rand::Rng;

use report_core::{AccessLevel, ReportId};
use report_store::{PrimaryStore, ReportStore};

use crate::seed::{FIRST_SAMPLE_REPORT, initialize_reports};

/// Placeholder id meaning "the user's first editable report".
pub const DEFAULT_REPORT: &str = "default";

/// Outcome of resolving a requested report id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The requested report exists.
    Found(ReportId),
    /// Open this report instead of the requested one.
    Redirect(ReportId),
}

impl Resolution {
    /// The id to open.
    #[must_use]
    pub fn id(&self) -> &ReportId {
        match self {
            Self::Found(id) | Self::Redirect(id) => id,
        }
    }

    pub fn into_id(self) -> ReportId {
        match self {
            Self::Found(id) | Self::Redirect(id) => id,
        }
    }
}

/// Resolves `requested` to a report that can be opened.
///
/// `"default"` goes to the first editable report. An unknown id goes to the
/// first report listed. With no reports at all the sample reports are
/// created and the first sample is opened.
pub async fn resolve_report<P, R>(store: &ReportStore<P>, requested: &str, rng: &mut R) -> Resolution
where
    P: PrimaryStore,
    R: Rng + ?Sized,
{
    if requested == DEFAULT_REPORT {
        let reports = store.list_all().await;
        if let Some(first) = reports.into_iter().find(|r| r.access_level == AccessLevel::Edit) {
            return Resolution::Redirect(first.id);
        }
        return seed_and_redirect(store, rng).await;
    }

    let id = ReportId::from(requested);
    if store.load(&id).await.is_some() {
        return Resolution::Found(id);
    }

    let reports = store.list_all().await;
    if let Some(found) = reports.iter().find(|r| r.id == id) {
        return Resolution::Found(found.id.clone());
    }
    if let Some(first) = reports.into_iter().next() {
        tracing::info!(requested, redirect = %first.id, "Report not found; redirecting to first available");
        return Resolution::Redirect(first.id);
    }
    seed_and_redirect(store, rng).await
}

async fn seed_and_redirect<P, R>(store: &ReportStore<P>, rng: &mut R) -> Resolution
where
    P: PrimaryStore,
    R: Rng + ?Sized,
{
    tracing::info!("No reports found; initializing samples");
    initialize_reports(store, rng).await;
    Resolution::Redirect(ReportId::from(FIRST_SAMPLE_REPORT))
}
