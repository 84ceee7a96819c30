//! Newsletter subscriber repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use ecoshop_core::{Email, SubscriberId};

use super::RepositoryError;
use crate::models::newsletter::NewsletterSubscriber;

/// Internal row type for subscriber queries.
#[derive(Debug, sqlx::FromRow)]
struct SubscriberRow {
    id: i32,
    email: String,
    is_active: bool,
    subscribed_at: DateTime<Utc>,
    unsubscribed_at: Option<DateTime<Utc>>,
}

impl TryFrom<SubscriberRow> for NewsletterSubscriber {
    type Error = RepositoryError;

    fn try_from(row: SubscriberRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: SubscriberId::new(row.id),
            email,
            is_active: row.is_active,
            subscribed_at: row.subscribed_at,
            unsubscribed_at: row.unsubscribed_at,
        })
    }
}

const SUBSCRIBER_COLUMNS: &str = "id, email, is_active, subscribed_at, unsubscribed_at";

/// Repository for newsletter database operations.
pub struct NewsletterRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> NewsletterRepository<'a> {
    /// Create a new newsletter repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a subscriber by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<NewsletterSubscriber>, RepositoryError> {
        let row = sqlx::query_as::<_, SubscriberRow>(&format!(
            "SELECT {SUBSCRIBER_COLUMNS} FROM newsletter_subscribers WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Subscribe an email, reactivating a previously unsubscribed row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn subscribe(&self, email: &Email) -> Result<NewsletterSubscriber, RepositoryError> {
        let row = sqlx::query_as::<_, SubscriberRow>(&format!(
            "INSERT INTO newsletter_subscribers (email)
             VALUES ($1)
             ON CONFLICT (email)
             DO UPDATE SET is_active = TRUE, subscribed_at = now(), unsubscribed_at = NULL
             RETURNING {SUBSCRIBER_COLUMNS}"
        ))
        .bind(email.as_str())
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Unsubscribe an email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the email is not on the list.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn unsubscribe(&self, email: &Email) -> Result<NewsletterSubscriber, RepositoryError> {
        let row = sqlx::query_as::<_, SubscriberRow>(&format!(
            "UPDATE newsletter_subscribers
             SET is_active = FALSE, unsubscribed_at = now()
             WHERE email = $1
             RETURNING {SUBSCRIBER_COLUMNS}"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// List active subscribers, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<NewsletterSubscriber>, RepositoryError> {
        let rows = sqlx::query_as::<_, SubscriberRow>(&format!(
            "SELECT {SUBSCRIBER_COLUMNS} FROM newsletter_subscribers
             WHERE is_active
             ORDER BY subscribed_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
