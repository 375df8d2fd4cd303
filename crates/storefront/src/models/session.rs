//! Session-related types.
//!
//! Guest sessions let anonymous visitors keep a cart; user sessions identify
//! a signed-in user. Both are keyed by an opaque [`SessionToken`] carried in
//! a cookie and live for seven days.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use footwear_core::{Email, SessionToken, UserId};

use super::cart::CartOwner;
use super::user::User;

/// Lifetime of guest and user sessions, and of their cookies (7 days).
pub const SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Minimum age before a user session's expiry is slid forward (24 hours).
pub const SESSION_REFRESH_AGE_SECONDS: i64 = 24 * 60 * 60;

/// Session lifetime as a `chrono` duration.
#[must_use]
pub fn session_ttl() -> Duration {
    Duration::seconds(SESSION_TTL_SECONDS)
}

/// An anonymous visitor's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestSession {
    pub token: SessionToken,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl GuestSession {
    /// A fresh guest session starting at `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            token: SessionToken::generate(),
            created_at: now,
            expires_at: now + session_ttl(),
        }
    }

    /// A session whose `expires_at` has been reached is dead.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// An authenticated user's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    pub token: SessionToken,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Last time `expires_at` was extended.
    pub updated_at: DateTime<Utc>,
}

impl UserSession {
    /// A fresh session for `user_id` starting at `now`.
    #[must_use]
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            token: SessionToken::generate(),
            user_id,
            created_at: now,
            expires_at: now + session_ttl(),
            updated_at: now,
        }
    }

    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Whether the sliding expiry is due to be pushed forward.
    #[must_use]
    pub fn needs_refresh_at(&self, now: DateTime<Utc>) -> bool {
        now - self.updated_at >= Duration::seconds(SESSION_REFRESH_AGE_SECONDS)
    }

    /// The same session with its expiry slid to `now + 7 days`.
    #[must_use]
    pub fn refreshed_at(self, now: DateTime<Utc>) -> Self {
        Self {
            expires_at: now + session_ttl(),
            updated_at: now,
            ..self
        }
    }
}

/// The identity of the signed-in user, as exposed to handlers and clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub name: String,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

/// Session state resolved once per request.
///
/// Inserted into request extensions by the session resolver middleware and
/// read by extractors and handlers; nothing else inspects session cookies.
#[derive(Debug, Clone, Default)]
pub struct CurrentSession {
    pub user: Option<CurrentUser>,
    pub guest: Option<GuestSession>,
}

impl CurrentSession {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Whose cart this request operates on, if anyone's.
    ///
    /// A signed-in user always wins over a leftover guest session.
    #[must_use]
    pub fn cart_owner(&self) -> Option<CartOwner> {
        self.user.as_ref().map_or_else(
            || self.guest.as_ref().map(|g| CartOwner::Guest(g.token)),
            |u| Some(CartOwner::User(u.id)),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_session_expires_after_seven_days() {
        let now = Utc::now();
        let session = GuestSession::new(now);
        assert_eq!(session.expires_at - session.created_at, Duration::days(7));
        assert!(!session.is_expired_at(now));
        assert!(session.is_expired_at(now + Duration::days(7)));
    }

    #[test]
    fn test_user_session_refreshes_at_most_daily() {
        let now = Utc::now();
        let session = UserSession::new(UserId::new(1), now);
        assert!(!session.needs_refresh_at(now + Duration::hours(23)));
        assert!(session.needs_refresh_at(now + Duration::hours(24)));

        let later = now + Duration::days(2);
        let refreshed = session.clone().refreshed_at(later);
        assert_eq!(refreshed.token, session.token);
        assert_eq!(refreshed.expires_at, later + Duration::days(7));
        assert!(!refreshed.needs_refresh_at(later));
    }

    #[test]
    fn test_cart_owner_prefers_user() {
        let guest = GuestSession::new(Utc::now());
        let mut current = CurrentSession {
            user: None,
            guest: Some(guest.clone()),
        };
        assert_eq!(current.cart_owner(), Some(CartOwner::Guest(guest.token)));

        current.user = Some(CurrentUser {
            id: UserId::new(9),
            email: Email::parse("a@b.co").unwrap(),
            name: "Ada".to_string(),
        });
        assert_eq!(current.cart_owner(), Some(CartOwner::User(UserId::new(9))));
    }
}
