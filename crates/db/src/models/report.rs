//! Report model.

use roadsim_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `report` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Report {
    pub id: DbId,
    pub batch_id: DbId,
    pub report_type_id: Option<DbId>,
    pub generated_at: Timestamp,
    pub file_link: String,
    pub content: String,
}
