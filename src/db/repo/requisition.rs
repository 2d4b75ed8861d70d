use crate::db::DbResult;
use crate::models::requisition::{RequestedBlueprint, RequisitionOrder, RequisitionStatus};
use crate::models::types::{CharacterId, RequisitionId};

#[derive(Debug, Clone, Default)]
pub struct RequisitionFilter {
    pub status: Option<RequisitionStatus>,
    pub character_id: Option<CharacterId>,
}

#[async_trait::async_trait]
pub trait RequisitionRepo: Send + Sync {
    async fn create(&self, character_id: CharacterId, blueprints: &[RequestedBlueprint]) -> DbResult<RequisitionOrder>;
    async fn get(&self, id: RequisitionId) -> DbResult<Option<RequisitionOrder>>;
    /// Newest orders first
    async fn list(&self, filter: &RequisitionFilter) -> DbResult<Vec<RequisitionOrder>>;

    /// Sets a terminal status. Only open orders are touched; returns `None` when the order
    /// does not exist or is no longer open.
    async fn close(
        &self,
        id: RequisitionId,
        status: RequisitionStatus,
        updated_by: &str,
        public_notes: Option<&str>,
    ) -> DbResult<Option<RequisitionOrder>>;
}
