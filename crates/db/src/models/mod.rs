//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A create DTO for inserts
//! - An update DTO (all `Option` fields) for patches where the entity
//!   supports partial updates

pub mod medication;
pub mod notification_log;
pub mod notification_settings;
pub mod schedule;
pub mod user;
