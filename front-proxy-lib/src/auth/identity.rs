use std::fmt;

use crate::config::IdentityKey;

/// Rate-limit partition key derived from the authenticated user.
///
/// Always non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    /// Returns `None` for empty or whitespace-only input.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller identity attached to the request by the authentication layer.
///
/// Stored in the request extensions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthenticatedUser {
    pub name: String,
    pub uid: String,
    pub groups: Vec<String>,
}

impl AuthenticatedUser {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = uid.into();
        self
    }

    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }

    /// Pick the attribute selected by `key` as the rate-limit identity.
    pub fn identity(&self, key: IdentityKey) -> Option<Identity> {
        match key {
            IdentityKey::Name => Identity::new(self.name.as_str()),
            IdentityKey::Uid => Identity::new(self.uid.as_str()),
        }
    }
}
