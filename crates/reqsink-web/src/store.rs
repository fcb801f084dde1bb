//! Capture store: durable, queryable collection of captured requests
//!
//! The database provides the two guarantees the pipeline leans on: the
//! ordinal is an auto-increment primary key (monotonic, never reused) and
//! the public id has a unique index. No application-level locking.

use std::collections::BTreeMap;

use chrono::Utc;
use reqsink_db::entities::capture;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the capture store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Persistence unreachable or a write was rejected. Never retried;
    /// the HTTP layer turns it into a generic server error.
    #[error("storage error: {0}")]
    Storage(#[from] sea_orm::DbErr),

    /// Permalink lookup miss. A normal negative result, not a fault.
    #[error("capture not found")]
    NotFound,
}

/// A capture candidate before the store assigns ordinal and public id
#[derive(Debug, Clone)]
pub struct NewCapture {
    pub method: String,
    pub url_path: String,
    pub query_params: String,
    pub domain: String,
    /// Header name -> value, duplicates already collapsed last-wins
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

#[derive(Clone)]
pub struct CaptureStore {
    db: DatabaseConnection,
}

impl CaptureStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Persist a capture, assigning a fresh public id and the next ordinal.
    /// Returns the fully populated row.
    pub async fn insert(&self, new: NewCapture) -> Result<capture::Model, StoreError> {
        let headers_json =
            serde_json::to_string(&new.headers).unwrap_or_else(|_| "{}".to_string());

        let model = capture::ActiveModel {
            id: NotSet,
            public_id: Set(Uuid::new_v4()),
            method: Set(new.method),
            url_path: Set(new.url_path),
            query_params: Set(new.query_params),
            domain: Set(new.domain),
            headers: Set(headers_json),
            body: Set(new.body),
            made_at: Set(Utc::now()),
        };

        Ok(model.insert(&self.db).await?)
    }

    /// Up to `limit` captures, newest first. An exact, case-sensitive domain
    /// match when `domain_filter` is present.
    pub async fn list_recent(
        &self,
        limit: u64,
        domain_filter: Option<&str>,
    ) -> Result<Vec<capture::Model>, StoreError> {
        let mut query = capture::Entity::find()
            .order_by_desc(capture::Column::Id)
            .limit(limit);

        if let Some(domain) = domain_filter {
            query = query.filter(capture::Column::Domain.eq(domain));
        }

        Ok(query.all(&self.db).await?)
    }

    /// Exact-match permalink lookup.
    pub async fn get_by_public_id(&self, public_id: Uuid) -> Result<capture::Model, StoreError> {
        capture::Entity::find()
            .filter(capture::Column::PublicId.eq(public_id))
            .one(&self.db)
            .await?
            .ok_or(StoreError::NotFound)
    }

    /// Administrative delete. Normal request traffic never calls this.
    pub async fn delete_by_public_id(&self, public_id: Uuid) -> Result<(), StoreError> {
        let result = capture::Entity::delete_many()
            .filter(capture::Column::PublicId.eq(public_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        Ok(capture::Entity::find().count(&self.db).await?)
    }
}
