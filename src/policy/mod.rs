//! Acceptance policy: which agreement, if any, a user still has to accept.

pub mod acceptance;

pub use acceptance::{AcceptancePolicy, AcceptanceState};
