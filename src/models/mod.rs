//! Domain model module declarations.

pub mod acceptance;
pub mod agreement;
