//! Periodic inventory refresh.
//!
//! The [`scheduler::RefreshScheduler`] is the only writer: it asks the [`token::TokenProvider`] for an
//! authenticated context, lets the [`engine::RefreshEngine`] fetch, reconcile and name the corporation
//! inventory, and publishes the result into the [`snapshot::SnapshotStore`] that HTTP handlers read.

pub mod engine;
pub mod fetcher;
pub mod reconcile;
pub mod reference;
pub mod resolver;
pub mod scheduler;
pub mod snapshot;
pub mod token;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{RefreshEngine, RefreshError, RefreshReport};
pub use fetcher::{FetchError, RetryPolicy};
pub use reconcile::{AssetNode, AssetTree, RefreshMode, StackMap};
pub use reference::ReferenceCache;
pub use resolver::NameResolver;
pub use scheduler::{RefreshHandle, RefreshScheduler, SchedulerConfig, SchedulerState};
pub use snapshot::{InventorySnapshot, SnapshotStore};
pub use token::{AuthContext, CredentialStore, TokenError, TokenExchange, TokenProvider};
