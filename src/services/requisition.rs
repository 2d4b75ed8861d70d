use crate::db::repo::{RequisitionFilter, RequisitionRepo};
use crate::inventory::ReferenceCache;
use crate::models::account::{AuthLevel, User};
use crate::models::requisition::{RequestedBlueprint, RequisitionLock, RequisitionOrder, RequisitionStatus};
use crate::models::types::{CharacterId, RequisitionId};
use crate::services::{ServiceError, ServiceResult};
use chrono::{TimeDelta, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

/// Locks nobody released are dropped after this long
pub const LOCK_TTL: TimeDelta = TimeDelta::hours(1);

/// Requisition orders plus the in-memory worker locks on them.
pub struct RequisitionService {
    repo: Arc<dyn RequisitionRepo>,
    cache: Arc<ReferenceCache>,
    locks: DashMap<RequisitionId, RequisitionLock>,
}

impl RequisitionService {
    pub fn new(repo: Arc<dyn RequisitionRepo>, cache: Arc<ReferenceCache>) -> Self {
        Self {
            repo,
            cache,
            locks: DashMap::new(),
        }
    }

    /// The current lock on `id`, dropping it when it has expired
    pub fn active_lock(&self, id: RequisitionId) -> Option<RequisitionLock> {
        let now = Utc::now();
        self.locks.remove_if(&id, |_, lock| now - lock.locked_at > LOCK_TTL);
        self.locks.get(&id).map(|l| l.value().clone())
    }

    fn with_lock(&self, mut order: RequisitionOrder) -> RequisitionOrder {
        order.lock = self.active_lock(order.id);
        order
    }

    async fn load(&self, id: RequisitionId) -> ServiceResult<RequisitionOrder> {
        self.repo
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound { entity: "requisition" })
    }

    pub async fn create(&self, user: &User, mut blueprints: Vec<RequestedBlueprint>) -> ServiceResult<RequisitionOrder> {
        if blueprints.is_empty() {
            return Err(ServiceError::InvalidInput("no blueprints requested".into()));
        }

        for bp in &mut blueprints {
            if bp.runs < 0 {
                return Err(ServiceError::InvalidInput(format!("negative run count for type {}", bp.type_id)));
            }
            if bp.name.is_empty() {
                bp.name = self.cache.type_name(bp.type_id).unwrap_or_default();
            }
        }

        let order = self.repo.create(user.character_id, &blueprints).await?;
        tracing::info!(id = %order.id, character_id = %user.character_id, lines = blueprints.len(), "requisition created");
        Ok(order)
    }

    /// Lists orders, newest first. Below worker level only the caller's own orders are visible;
    /// workers see everyone's unless they filter on a character.
    pub async fn list(
        &self,
        user: &User,
        status: Option<RequisitionStatus>,
        character_id: Option<CharacterId>,
    ) -> ServiceResult<Vec<RequisitionOrder>> {
        let character_id = if user.has_level(AuthLevel::Worker) {
            character_id.filter(|c| c.get() > 0)
        } else {
            Some(user.character_id)
        };

        let filter = RequisitionFilter {
            status: Some(status.unwrap_or(RequisitionStatus::Open)),
            character_id,
        };

        let orders = self.repo.list(&filter).await?;
        Ok(orders.into_iter().map(|o| self.with_lock(o)).collect())
    }

    pub async fn get(&self, id: RequisitionId) -> ServiceResult<RequisitionOrder> {
        Ok(self.with_lock(self.load(id).await?))
    }

    pub async fn lock(&self, user: &User, id: RequisitionId) -> ServiceResult<RequisitionLock> {
        if let Some(lock) = self.active_lock(id) {
            return Err(ServiceError::Conflict(format!("locked by {}", lock.character_name)));
        }

        let order = self.load(id).await?;
        if !order.is_open() {
            return Err(ServiceError::Conflict(format!("requisition is {}", order.status)));
        }

        let lock = RequisitionLock {
            character_id: user.character_id,
            character_name: user.character_name.clone(),
            locked_at: Utc::now(),
        };

        match self.locks.entry(id) {
            Entry::Occupied(held) => Err(ServiceError::Conflict(format!("locked by {}", held.get().character_name))),
            Entry::Vacant(slot) => {
                slot.insert(lock.clone());
                tracing::debug!(%id, character_id = %user.character_id, "requisition locked");
                Ok(lock)
            }
        }
    }

    pub fn unlock(&self, user: &User, id: RequisitionId) -> ServiceResult<()> {
        let Some(lock) = self.active_lock(id) else {
            return Err(ServiceError::Conflict("requisition is not locked".into()));
        };
        if lock.character_id != user.character_id {
            return Err(ServiceError::Forbidden(format!("locked by {}", lock.character_name)));
        }

        self.locks.remove_if(&id, |_, l| l.character_id == user.character_id);
        tracing::debug!(%id, character_id = %user.character_id, "requisition unlocked");
        Ok(())
    }

    /// Owners may cancel their own open orders as long as no worker holds them.
    pub async fn cancel(&self, user: &User, id: RequisitionId) -> ServiceResult<RequisitionOrder> {
        let order = self.load(id).await?;
        if order.character_id != user.character_id {
            return Err(ServiceError::Forbidden("only the owner can cancel a requisition".into()));
        }
        if let Some(lock) = self.active_lock(id) {
            return Err(ServiceError::Conflict(format!("locked by {}", lock.character_name)));
        }
        if !order.is_open() {
            return Err(ServiceError::Conflict(format!("requisition is {}", order.status)));
        }

        self.repo
            .close(id, RequisitionStatus::Canceled, &user.character_name, None)
            .await?
            .ok_or_else(|| ServiceError::Conflict("requisition is no longer open".into()))
    }

    pub async fn complete(&self, user: &User, id: RequisitionId, notes: Option<String>) -> ServiceResult<RequisitionOrder> {
        self.finish(user, id, RequisitionStatus::Completed, notes).await
    }

    pub async fn reject(&self, user: &User, id: RequisitionId, notes: Option<String>) -> ServiceResult<RequisitionOrder> {
        self.finish(user, id, RequisitionStatus::Rejected, notes).await
    }

    async fn finish(
        &self,
        user: &User,
        id: RequisitionId,
        status: RequisitionStatus,
        notes: Option<String>,
    ) -> ServiceResult<RequisitionOrder> {
        let Some(lock) = self.active_lock(id) else {
            return Err(ServiceError::Conflict("requisition is not locked".into()));
        };
        if lock.character_id != user.character_id {
            return Err(ServiceError::Forbidden(format!("locked by {}", lock.character_name)));
        }

        let order = self
            .repo
            .close(id, status, &user.character_name, notes.as_deref())
            .await?
            .ok_or_else(|| ServiceError::Conflict("requisition is not open".into()))?;

        self.locks.remove(&id);
        tracing::info!(%id, %status, character_id = %user.character_id, "requisition closed");
        Ok(order)
    }
}
