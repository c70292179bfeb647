//! Persistence layer modules.

pub mod acceptance_repo;
pub mod db;
pub mod schema;
