//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the interfaces the sync engine depends on, whose
//! implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRepository`] - Version-control working copy (init, clone, stage, commit, pull, push, status, diff)
//! - [`INotificationSink`] - Success/error/progress reporting to the user

pub mod notification;
pub mod repository;

pub use notification::{INotificationSink, Notification, NotificationPriority};
pub use repository::{IRepository, PullOutcome};
