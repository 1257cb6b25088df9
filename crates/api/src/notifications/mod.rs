//! Reminder delivery: per-user SMTP email sending and the dispatch flow
//! that drives a due dose from `pending` to its outcome state.

pub mod dispatcher;
pub mod email;
