//! Request context
//!
//! The identity material a key function may draw on. The limiter never
//! inspects transports directly; callers build a context from whatever they
//! know about the request or connection event.

use std::net::IpAddr;

/// Sentinel key used when no identity can be derived.
///
/// Failing open to a shared coarse bucket keeps limiting in effect instead of
/// erroring on anonymous traffic.
pub const UNKNOWN_KEY: &str = "unknown";

/// Identity material for a single admission check.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Remote peer address, when the transport knows it
    pub remote_addr: Option<IpAddr>,
    /// Verified project identity supplied by the auth collaborator
    pub project_id: Option<String>,
    /// Request path or event name, for logging and custom keys
    pub path: Option<String>,
}

impl RequestContext {
    /// Context carrying only a remote address.
    #[must_use]
    pub fn from_addr(addr: IpAddr) -> Self {
        Self {
            remote_addr: Some(addr),
            ..Self::default()
        }
    }

    /// The default key: remote address, or [`UNKNOWN_KEY`] when absent.
    #[must_use]
    pub fn default_key(&self) -> String {
        self.remote_addr
            .map_or_else(|| UNKNOWN_KEY.to_string(), |addr| addr.to_string())
    }

    /// A composite key of remote address and project identity.
    ///
    /// Two requests sharing an address but differing in project are tracked
    /// as independent keys.
    #[must_use]
    pub fn composite_key(&self) -> String {
        let addr = self.default_key();
        match &self.project_id {
            Some(project) => format!("{addr}:{project}"),
            None => addr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_key_uses_addr() {
        let ctx = RequestContext::from_addr("10.1.2.3".parse().unwrap());
        assert_eq!(ctx.default_key(), "10.1.2.3");
    }

    #[test]
    fn test_default_key_falls_back_to_sentinel() {
        let ctx = RequestContext::default();
        assert_eq!(ctx.default_key(), UNKNOWN_KEY);
    }

    #[test]
    fn test_composite_key_includes_project() {
        let ctx = RequestContext {
            remote_addr: Some("10.1.2.3".parse().unwrap()),
            project_id: Some("proj1".to_string()),
            path: None,
        };
        assert_eq!(ctx.composite_key(), "10.1.2.3:proj1");
    }

    #[test]
    fn test_composite_key_without_project() {
        let ctx = RequestContext::from_addr("10.1.2.3".parse().unwrap());
        assert_eq!(ctx.composite_key(), "10.1.2.3");
    }
}
