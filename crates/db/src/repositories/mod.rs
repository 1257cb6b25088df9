//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod medication_repo;
pub mod notification_log_repo;
pub mod notification_settings_repo;
pub mod schedule_repo;
pub mod user_repo;

pub use medication_repo::MedicationRepo;
pub use notification_log_repo::NotificationLogRepo;
pub use notification_settings_repo::NotificationSettingsRepo;
pub use schedule_repo::ScheduleRepo;
pub use user_repo::UserRepo;
