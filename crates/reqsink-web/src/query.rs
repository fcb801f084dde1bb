//! Read-side projections over the capture store

use chrono::{DateTime, Utc};
use reqsink_db::entities::capture;
use uuid::Uuid;

use crate::store::{CaptureStore, StoreError};

/// The dashboard always shows at most this many captures. Deliberately not
/// user-adjustable: simplicity over pagination.
pub const DASHBOARD_LIMIT: u64 = 25;

/// One row of the dashboard listing
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardEntry {
    pub public_id: Uuid,
    pub method: String,
    pub url_path: String,
    /// None when the projection hides query strings; the stored row keeps
    /// them regardless.
    pub query_params: Option<String>,
    pub domain: String,
    pub made_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct CaptureQueries {
    store: CaptureStore,
}

impl CaptureQueries {
    pub fn new(store: CaptureStore) -> Self {
        Self { store }
    }

    /// The 25 most recent captures projected for the dashboard, optionally
    /// restricted to one domain.
    pub async fn recent_for_dashboard(
        &self,
        domain_filter: Option<&str>,
        hide_query_params: bool,
    ) -> Result<Vec<DashboardEntry>, StoreError> {
        let captures = self.store.list_recent(DASHBOARD_LIMIT, domain_filter).await?;

        Ok(captures
            .into_iter()
            .map(|c| DashboardEntry {
                public_id: c.public_id,
                method: c.method,
                url_path: c.url_path,
                query_params: if hide_query_params {
                    None
                } else {
                    Some(c.query_params)
                },
                domain: c.domain,
                made_at: c.made_at,
            })
            .collect())
    }

    /// Single-capture fetch for the permalink page.
    pub async fn fetch_for_permalink(&self, public_id: Uuid) -> Result<capture::Model, StoreError> {
        self.store.get_by_public_id(public_id).await
    }
}
