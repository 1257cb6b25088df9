//! Request handlers, grouped by resource.

pub mod auth;
pub mod medication;
pub mod schedule;
pub mod settings;
