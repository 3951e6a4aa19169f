//! Session expiry handling
//!
//! When the backend answers 401 the gateway walks its registered guards and,
//! for every session that still believes it is logged in, logs it out and
//! sends the UI to the matching login route.

use std::fmt;
use std::sync::Arc;

/// Header carrying the voter session token
pub const SESSION_TOKEN_HEADER: &str = "x-session-token";

/// Header carrying the admin session token
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// The two independent credentials a gateway can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialSlot {
    /// Voter session
    User,
    /// Administrator session
    Admin,
}

impl CredentialSlot {
    /// Request header the slot's token travels in
    pub const fn header_name(self) -> &'static str {
        match self {
            Self::User => SESSION_TOKEN_HEADER,
            Self::Admin => ADMIN_TOKEN_HEADER,
        }
    }

    /// Route the UI is sent to once this session expires
    pub const fn login_route(self) -> &'static str {
        match self {
            Self::User => "/login",
            Self::Admin => "/admin-login",
        }
    }
}

impl fmt::Display for CredentialSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Admin => f.write_str("admin"),
        }
    }
}

/// Client-side view of a login session
pub trait SessionStore: Send + Sync {
    /// Whether the UI currently considers this session logged in
    fn is_authenticated(&self) -> bool;

    /// Drop the session's local state
    fn logout(&self);
}

/// Application router
pub trait Navigator: Send + Sync {
    /// Navigate to `path`
    fn push(&self, path: &str);
}

/// Which sessions to expire when a single 401 arrives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryPolicy {
    /// Every authenticated session is logged out and redirected, in
    /// registration order; the last redirect wins
    #[default]
    EveryAuthenticated,
    /// Only the first authenticated session in registration order is handled
    FirstAuthenticated,
}

/// A session store bound to the credential slot it authenticates
#[derive(Clone)]
pub struct SessionGuard {
    slot: CredentialSlot,
    store: Arc<dyn SessionStore>,
}

impl SessionGuard {
    pub fn new(slot: CredentialSlot, store: Arc<dyn SessionStore>) -> Self {
        Self { slot, store }
    }

    pub fn slot(&self) -> CredentialSlot {
        self.slot
    }
}

impl fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionGuard")
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}

/// Reacts to rejected credentials on behalf of a gateway
#[derive(Clone)]
pub(crate) struct ExpiryHandler {
    guards: Vec<SessionGuard>,
    navigator: Option<Arc<dyn Navigator>>,
    policy: ExpiryPolicy,
}

impl ExpiryHandler {
    pub(crate) fn new(
        guards: Vec<SessionGuard>,
        navigator: Option<Arc<dyn Navigator>>,
        policy: ExpiryPolicy,
    ) -> Self {
        Self {
            guards,
            navigator,
            policy,
        }
    }

    /// Log out and redirect every session the policy selects.
    ///
    /// Returns the slots that were expired, in the order they were handled.
    pub(crate) fn expire_sessions(&self) -> Vec<CredentialSlot> {
        let mut expired = Vec::new();

        for guard in &self.guards {
            if !guard.store.is_authenticated() {
                continue;
            }

            tracing::warn!(slot = %guard.slot, "Session rejected by backend, logging out");
            guard.store.logout();

            let route = guard.slot.login_route();
            match &self.navigator {
                Some(navigator) => {
                    tracing::info!(slot = %guard.slot, route, "Redirecting to login");
                    navigator.push(route);
                }
                None => tracing::debug!(slot = %guard.slot, "No navigator registered"),
            }

            expired.push(guard.slot);
            if self.policy == ExpiryPolicy::FirstAuthenticated {
                break;
            }
        }

        if expired.len() > 1 {
            tracing::warn!(
                ?expired,
                "Multiple sessions expired by one response; last redirect wins"
            );
        }

        expired
    }
}

impl fmt::Debug for ExpiryHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiryHandler")
            .field("guards", &self.guards)
            .field("navigator", &self.navigator.is_some())
            .field("policy", &self.policy)
            .finish()
    }
}
