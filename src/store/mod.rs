//! Agreement configuration store.
//!
//! Provides XML loading of `terms-of-service-config.xml`, the locked
//! in-memory snapshot, and hot-reload via file polling.

pub mod agreement_store;
pub mod loader;
pub mod watcher;

pub use agreement_store::AgreementStore;
