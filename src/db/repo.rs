mod app_config;
mod app_config_db;
mod requisition;
mod requisition_db;
mod session;
mod session_db;
mod token_db;

pub use app_config_db::AppConfigRepository;
pub use requisition_db::RequisitionRepository;
pub use session_db::SessionRepository;
pub use token_db::TokenRepository;

pub use app_config::AppConfigRepo;
pub use requisition::{RequisitionFilter, RequisitionRepo};
pub use session::SessionRepo;
