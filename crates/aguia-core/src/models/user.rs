//! User identity and access model

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Opaque identifier of a platform user
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returned when a user identifier is blank
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("User ID cannot be empty")]
pub struct EmptyUserId;

impl FromStr for UserId {
    type Err = EmptyUserId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            Err(EmptyUserId)
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }
}

impl TryFrom<String> for UserId {
    type Error = EmptyUserId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

/// Permission held by a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    /// May edit their own profile, and therefore their own preferences
    EditOwnProfile,
    /// May export and erase any user's stored preferences
    ManagePrivacy,
}

impl Capability {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EditOwnProfile => "user:editownprofile",
            Self::ManagePrivacy => "privacy:manage",
        }
    }

    /// Parse a capability name, ignoring names this service does not know.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "user:editownprofile" => Some(Self::EditOwnProfile),
            "privacy:manage" => Some(Self::ManagePrivacy),
            _ => None,
        }
    }
}

/// The authenticated principal on whose behalf an operation runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    capabilities: BTreeSet<Capability>,
}

impl Caller {
    pub fn new(user_id: UserId, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            user_id,
            capabilities: capabilities.into_iter().collect(),
        }
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Whether this caller may change the preferences stored for `target`.
    pub fn can_edit(&self, target: &UserId) -> bool {
        (self.user_id == *target && self.has(Capability::EditOwnProfile))
            || self.has(Capability::ManagePrivacy)
    }
}
