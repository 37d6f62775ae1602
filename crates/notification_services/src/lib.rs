//! # Notification Services
//!
//! This crate sends booking follow-up messages to customers.
//! It provides the `BookingNotifier` trait with an AWS SES implementation and a log-only one.

/// Notifier implementations.
pub mod service;
/// Types and structures used in notification services.
pub mod types;

pub use service::{BookingNotifier, LogNotifier, SesNotifier};
pub use types::{BookingConfirmation, NotificationError};
