//! Scope ordering for permission grants
//!
//! Scopes nest `self < department < tenant < global`. A grant held at a
//! broader scope satisfies any requirement a narrower grant would.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rank given to any scope string outside the known set
pub const UNKNOWN_SCOPE_RANK: u8 = 0;

/// Breadth of a permission grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// The caller's own records (`self`)
    #[serde(rename = "self")]
    Own,
    /// Records within the caller's org unit
    #[serde(rename = "department")]
    Department,
    /// Records anywhere in the caller's tenant
    #[serde(rename = "tenant")]
    Tenant,
    /// Records in any tenant
    #[serde(rename = "global")]
    Global,
}

impl Scope {
    /// Every known scope, narrowest first.
    pub const ALL: [Scope; 4] = [Scope::Own, Scope::Department, Scope::Tenant, Scope::Global];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Own => "self",
            Scope::Department => "department",
            Scope::Tenant => "tenant",
            Scope::Global => "global",
        }
    }

    /// Dominance rank; higher is broader.
    pub fn rank(&self) -> u8 {
        match self {
            Scope::Own => 1,
            Scope::Department => 2,
            Scope::Tenant => 3,
            Scope::Global => 4,
        }
    }

    /// True if a grant at this scope covers a requirement at `other`.
    pub fn dominates(&self, other: Scope) -> bool {
        self.rank() >= other.rank()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known scope
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scope: {0:?}")]
pub struct UnknownScope(pub String);

impl FromStr for Scope {
    type Err = UnknownScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "self" => Ok(Scope::Own),
            "department" => Ok(Scope::Department),
            "tenant" => Ok(Scope::Tenant),
            "global" => Ok(Scope::Global),
            other => Err(UnknownScope(other.to_string())),
        }
    }
}

/// Rank of a raw scope string. Unknown (including empty) scopes rank lowest.
pub fn scope_rank(scope: &str) -> u8 {
    scope
        .parse::<Scope>()
        .map(|s| s.rank())
        .unwrap_or(UNKNOWN_SCOPE_RANK)
}

/// Returns true if `user_scope` is equal to or broader than `required_scope`.
///
/// An unknown required scope ranks 0 and is therefore met by any grant, while an
/// unknown granted scope meets only another unknown or empty requirement.
pub fn scope_match(user_scope: &str, required_scope: &str) -> bool {
    scope_rank(user_scope) >= scope_rank(required_scope)
}
