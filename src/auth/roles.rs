//! Account roles and the elevation targets an account may request

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account roles, ordered by privilege
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Student account - submits proof, posts to the feed
    #[default]
    User,
    /// Campus partner - reviews submissions, creates targets
    Partner,
    /// Administrator - everything, plus role-request decisions
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Partner => write!(f, "partner"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Roles an account may request elevation to.
///
/// A closed subset of [`Role`]: there is no path that requests `user`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestedRole {
    Partner,
    Admin,
}

impl RequestedRole {
    /// The role granted when the request is approved
    pub fn granted_role(self) -> Role {
        match self {
            RequestedRole::Partner => Role::Partner,
            RequestedRole::Admin => Role::Admin,
        }
    }
}

impl fmt::Display for RequestedRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestedRole::Partner => write!(f, "partner"),
            RequestedRole::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for RequestedRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "partner" => Ok(RequestedRole::Partner),
            "admin" => Ok(RequestedRole::Admin),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ordering_matches_privilege() {
        assert!(Role::User < Role::Partner);
        assert!(Role::Partner < Role::Admin);
    }

    #[test]
    fn requested_role_rejects_user() {
        assert!("partner".parse::<RequestedRole>().is_ok());
        assert!("admin".parse::<RequestedRole>().is_ok());
        assert!("user".parse::<RequestedRole>().is_err());
        assert!("superuser".parse::<RequestedRole>().is_err());
    }

    #[test]
    fn granted_role_mapping() {
        assert_eq!(RequestedRole::Partner.granted_role(), Role::Partner);
        assert_eq!(RequestedRole::Admin.granted_role(), Role::Admin);
    }
}
