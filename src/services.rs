mod app_config;
mod blueprint;
mod error;
mod requisition;

pub use app_config::AppConfigService;
pub use blueprint::{BlueprintGroup, BlueprintKindFilter, BlueprintService, BlueprintView};
pub use requisition::{LOCK_TTL, RequisitionService};

pub use error::{ServiceError, ServiceResult};
