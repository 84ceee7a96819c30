//! Direct-message domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use ecoshop_core::{MessageId, UserId};

use super::PublicUser;

/// A direct message between two users.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// A conversation head: the peer, the latest message, and the unread count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub user: PublicUser,
    pub last_message: Message,
    pub unread_count: i64,
}
