//! Service layer of the metrics admin module.
//! - Per-shop settings persisted in a key/value configuration store.
//! - Dashboard page composition over injected host collaborators.
//! - Native dashboard module switching once a shop is onboarded.

pub mod errors;
pub mod runtime;
pub mod settings;
pub mod collaborators;
pub mod native_stats;
pub mod dashboard;
