//! Notification domain type.
//!
//! Notifications are persisted per user; the in-process event hub layered on
//! top only carries live-push signals.

use chrono::{DateTime, Utc};
use serde::Serialize;

use ecoshop_core::{NotificationId, UserId};

/// A persisted user notification.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    /// Type tag, e.g. `order_shipped`, `message`.
    pub kind: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
