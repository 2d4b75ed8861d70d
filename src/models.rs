pub mod account;
pub mod app_config;
pub mod inventory;
pub mod requisition;
pub mod types;
