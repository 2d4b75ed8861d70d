pub mod config;
pub mod db;
pub mod error;
pub mod esi;
pub mod inventory;
pub mod models;
pub mod net;
pub mod services;
pub mod state;

// Convenient re-exports (so call sites can do `bpc_desk::Registry`, etc.)
pub use state::registry::Registry;
