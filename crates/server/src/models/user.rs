//! User and session domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use ecoshop_core::{Email, UserId, UserRole};

/// A registered user.
///
/// The password hash never leaves the repository layer; this type is safe to
/// hold in handlers.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Strip down to the representation exposed over the API.
    #[must_use]
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }
}

/// API-facing user representation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// A bearer-token session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session has passed its expiry.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use ecoshop_core::Email;

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        let session = Session {
            token: "t".to_owned(),
            user_id: UserId::new(1),
            created_at: now,
            expires_at: now + Duration::days(30),
        };

        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + Duration::days(31)));
    }

    #[test]
    fn test_public_user_drops_nothing_sensitive() {
        let now = Utc::now();
        let user = User {
            id: UserId::new(3),
            name: "Jane".to_owned(),
            email: Email::parse("jane@example.com").expect("valid"),
            role: UserRole::Moderator,
            created_at: now,
            updated_at: now,
        };

        let public = user.to_public();
        assert_eq!(public.id, user.id);
        assert_eq!(public.role, UserRole::Moderator);
    }
}
