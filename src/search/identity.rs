//! Caller identity for owner scoping

use serde::{Deserialize, Serialize};

/// The authenticated caller, as needed to scope results to their own credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub principal: String,
    pub realm: String,
}

impl CallerIdentity {
    pub fn new(principal: impl Into<String>, realm: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            realm: realm.into(),
        }
    }
}

/// Resolves who is calling
pub trait IdentityResolver: Send + Sync {
    /// Returns `None` when the caller cannot be identified
    fn resolve(&self) -> Option<CallerIdentity>;
}

/// Resolver returning a fixed identity, or none
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityResolver {
    identity: Option<CallerIdentity>,
}

impl StaticIdentityResolver {
    pub fn authenticated(identity: CallerIdentity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl IdentityResolver for StaticIdentityResolver {
    fn resolve(&self) -> Option<CallerIdentity> {
        self.identity.clone()
    }
}
