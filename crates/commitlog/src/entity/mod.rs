//! SeaORM entity definitions for the commitlog database schema.

pub mod commit;
pub mod contributor;
pub mod prelude;
pub mod repository;
