use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier of an authenticated user, resolved by the
/// [`Authenticator`](crate::auth::Authenticator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything an operation needs to know about the request that triggered it.
///
/// Built once at the edge (HTTP handler, CLI) and threaded through every
/// application call; nothing below reads the clock or the caller on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub user_id: UserId,
    /// Request time, second precision
    pub now: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            now: now.trunc_subsecs(0),
            ip_address: None,
            user_agent: None,
        }
    }

    pub fn with_client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_context_truncates_to_seconds() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 10, 5, 7).unwrap()
            + chrono::Duration::milliseconds(870);
        let ctx = RequestContext::new(UserId::new(1), at);
        assert_eq!(ctx.now.nanosecond(), 0);
        assert_eq!(ctx.now.second(), 7);
    }

    #[test]
    fn test_user_id_serializes_as_number() {
        let json = serde_json::to_value(UserId::new(42)).unwrap();
        assert_eq!(json, serde_json::json!(42));
    }
}
