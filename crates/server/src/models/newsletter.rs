//! Newsletter subscriber domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use ecoshop_core::{Email, SubscriberId};

/// A newsletter subscriber. Unsubscribing clears `is_active` but keeps the
/// row so a later re-subscribe reactivates it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterSubscriber {
    pub id: SubscriberId,
    pub email: Email,
    pub is_active: bool,
    pub subscribed_at: DateTime<Utc>,
    pub unsubscribed_at: Option<DateTime<Utc>>,
}
