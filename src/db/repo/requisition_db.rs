use crate::db::error::DbError;
use crate::db::repo::{RequisitionFilter, RequisitionRepo};
use crate::db::{Db, DbResult, map_row_opt};
use crate::models::requisition::{RequestedBlueprint, RequisitionOrder, RequisitionStatus};
use crate::models::types::{CharacterId, RequisitionId};
use std::sync::Arc;

pub struct RequisitionRepository {
    db: Arc<Db>,
}

impl RequisitionRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db: db.clone() }
    }
}

const ORDER_COLUMNS: &str = r#"
    o.id, o.character_id, c.character_name, o.status, o.blueprints,
    o.created_at, o.updated_at, o.updated_by, o.public_notes
"#;

#[async_trait::async_trait]
impl RequisitionRepo for RequisitionRepository {
    async fn create(&self, character_id: CharacterId, blueprints: &[RequestedBlueprint]) -> DbResult<RequisitionOrder> {
        let client = self.db.get_client().await?;
        let value = serde_json::to_value(blueprints)?;

        let sql = format!(
            r#"
            WITH o AS (
                INSERT INTO requisition_orders (character_id, status, blueprints)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            SELECT {ORDER_COLUMNS}
            FROM o
            JOIN characters c ON c.character_id = o.character_id
            "#
        );

        let row = client
            .query_one(&sql, &[&character_id, &RequisitionStatus::Open, &value])
            .await
            .map_err(DbError::from_pg)?;

        RequisitionOrder::try_from_row(&row)
    }

    async fn get(&self, id: RequisitionId) -> DbResult<Option<RequisitionOrder>> {
        let client = self.db.get_client().await?;

        let sql = format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM requisition_orders o
            JOIN characters c ON c.character_id = o.character_id
            WHERE o.id = $1
            "#
        );

        let row_opt = client.query_opt(&sql, &[&id]).await?;
        map_row_opt(row_opt, RequisitionOrder::try_from_row, "requisition_get")
    }

    async fn list(&self, filter: &RequisitionFilter) -> DbResult<Vec<RequisitionOrder>> {
        let client = self.db.get_client().await?;

        let sql = format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM requisition_orders o
            JOIN characters c ON c.character_id = o.character_id
            WHERE ($1::text IS NULL OR o.status = $1)
              AND ($2::integer IS NULL OR o.character_id = $2)
            ORDER BY o.created_at DESC, o.id DESC
            "#
        );

        let rows = client.query(&sql, &[&filter.status, &filter.character_id]).await?;
        rows.iter().map(RequisitionOrder::try_from_row).collect()
    }

    async fn close(
        &self,
        id: RequisitionId,
        status: RequisitionStatus,
        updated_by: &str,
        public_notes: Option<&str>,
    ) -> DbResult<Option<RequisitionOrder>> {
        let client = self.db.get_client().await?;

        let sql = format!(
            r#"
            WITH o AS (
                UPDATE requisition_orders
                SET status = $2, updated_by = $3, public_notes = $4, updated_at = NOW()
                WHERE id = $1 AND status = $5
                RETURNING *
            )
            SELECT {ORDER_COLUMNS}
            FROM o
            JOIN characters c ON c.character_id = o.character_id
            "#
        );

        let row_opt = client
            .query_opt(&sql, &[&id, &status, &updated_by, &public_notes, &RequisitionStatus::Open])
            .await?;
        map_row_opt(row_opt, RequisitionOrder::try_from_row, "requisition_close")
    }
}
