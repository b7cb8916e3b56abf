//! Account lifecycle definitions
//!
//! An account/id pair is created the first time it is observed, either as an
//! explicit seed or as a follower of an expanded account. It carries no
//! profile and no followers at creation, gains a profile when a lookup batch
//! resolves it, and gains a follower list when it is expanded.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api::Profile;

/// One discovered account, keyed by handle in the persisted state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Remote-supplied metadata plus the locally-tracked distance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,

    /// Deduplicated follower ids, present once the account was expanded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers: Option<Vec<u64>>,
}

impl Account {
    pub fn is_annotated(&self) -> bool {
        self.profile.is_some()
    }

    pub fn is_expanded(&self) -> bool {
        self.followers.is_some()
    }
}

/// Phase of a candidate id in the explorer's state machine
///
/// `Unknown → AnnotationPending → Annotated → ExpansionPending → Expanded`,
/// with `Blacklisted` reachable from any non-terminal phase on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountPhase {
    /// Observed as a follower, no profile yet
    Unknown,

    /// Queued in a lookup batch
    AnnotationPending,

    /// Profile known, followers not yet fetched
    Annotated,

    /// Follower fetch in flight
    ExpansionPending,

    /// Follower list recorded; never re-selected for expansion
    Expanded,

    /// Permanently excluded from lookup and expansion for this run
    Blacklisted,
}

impl AccountPhase {
    /// Returns true if no further processing can happen for this id
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Expanded | Self::Blacklisted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::AnnotationPending => "annotation_pending",
            Self::Annotated => "annotated",
            Self::ExpansionPending => "expansion_pending",
            Self::Expanded => "expanded",
            Self::Blacklisted => "blacklisted",
        }
    }
}

impl fmt::Display for AccountPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
