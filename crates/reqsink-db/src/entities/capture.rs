//! Capture entity: one row per recorded inbound HTTP request

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "captures")]
pub struct Model {
    /// Insertion ordinal. Strictly increasing, assigned by the database,
    /// never reused. The only sort key for listing (descending = newest).
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Opaque permalink identifier. Random, so rows cannot be enumerated
    /// the way the ordinal could be.
    #[sea_orm(unique)]
    pub public_id: Uuid,

    /// HTTP method as received. Nonstandard methods pass through unchanged.
    pub method: String,

    /// Path component of the request URL, leading slash normalized
    #[sea_orm(column_type = "Text")]
    pub url_path: String,

    /// Raw query string, empty when the URL had none
    #[sea_orm(column_type = "Text")]
    pub query_params: String,

    /// Host header at capture time, empty when absent
    pub domain: String,

    /// JSON object of header name -> value (duplicate names collapse last-wins)
    #[sea_orm(column_type = "Text")]
    pub headers: String,

    /// Request body decoded as text, best effort; empty when undecodable
    #[sea_orm(column_type = "Text")]
    pub body: String,

    /// Server clock at capture time
    pub made_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
