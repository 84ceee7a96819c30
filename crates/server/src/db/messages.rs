//! Direct-message repository.
//!
//! Messages are persisted rows, not an in-memory buffer; delivery to live
//! sockets is a separate concern handled by the event hub.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use ecoshop_core::{MessageId, UserId};

use super::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::message::{Conversation, Message};

/// Internal row type for message queries.
#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i32,
    sender_id: i32,
    receiver_id: i32,
    body: String,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            id: MessageId::new(row.id),
            sender_id: UserId::new(row.sender_id),
            receiver_id: UserId::new(row.receiver_id),
            body: row.body,
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }
}

const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, body, is_read, created_at";

/// Repository for direct-message database operations.
pub struct MessageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MessageRepository<'a> {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist a message.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        body: &str,
    ) -> Result<Message, RepositoryError> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            "INSERT INTO messages (sender_id, receiver_id, body)
             VALUES ($1, $2, $3)
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(sender_id.as_i32())
        .bind(receiver_id.as_i32())
        .bind(body)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Fetch the two-way thread between two users, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn thread(
        &self,
        user_id: UserId,
        peer_id: UserId,
    ) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE (sender_id = $1 AND receiver_id = $2)
                OR (sender_id = $2 AND receiver_id = $1)
             ORDER BY created_at ASC"
        ))
        .bind(user_id.as_i32())
        .bind(peer_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List conversation heads for a user: one entry per peer with the
    /// latest message and the unread count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a peer row is invalid.
    pub async fn conversations(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct ConversationRow {
            #[sqlx(flatten)]
            message: MessageRow,
            unread_count: i64,
        }

        let rows = sqlx::query_as::<_, ConversationRow>(
            "SELECT DISTINCT ON (peer_id)
                    m.id, m.sender_id, m.receiver_id, m.body, m.is_read, m.created_at,
                    (SELECT COUNT(*) FROM messages
                     WHERE sender_id = peer_id AND receiver_id = $1 AND is_read = FALSE
                    ) AS unread_count
             FROM (
                 SELECT *,
                        CASE WHEN sender_id = $1 THEN receiver_id ELSE sender_id END AS peer_id
                 FROM messages
                 WHERE sender_id = $1 OR receiver_id = $1
             ) m
             ORDER BY peer_id, m.created_at DESC",
        )
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        let users = UserRepository::new(self.pool);
        let mut conversations = Vec::with_capacity(rows.len());
        for row in rows {
            let message: Message = row.message.into();
            let peer_id = if message.sender_id == user_id {
                message.receiver_id
            } else {
                message.sender_id
            };
            let Some(peer) = users.get_by_id(peer_id).await? else {
                // Peer deleted between queries; skip the stale head.
                continue;
            };
            conversations.push(Conversation {
                user: peer.to_public(),
                last_message: message,
                unread_count: row.unread_count,
            });
        }

        // Newest conversation first.
        conversations.sort_by(|a, b| b.last_message.created_at.cmp(&a.last_message.created_at));
        Ok(conversations)
    }

    /// Mark every message from `peer_id` to `user_id` as read.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_thread_read(
        &self,
        user_id: UserId,
        peer_id: UserId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE messages SET is_read = TRUE
             WHERE sender_id = $1 AND receiver_id = $2 AND is_read = FALSE",
        )
        .bind(peer_id.as_i32())
        .bind(user_id.as_i32())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
