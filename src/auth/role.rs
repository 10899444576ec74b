//! Employee roles and the partial hierarchy used for rank-threshold rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Closed set of backend roles. Sourced from the login response, never
/// inferred client-side.
///
/// The management chain Developer > Director > Administrator > Accountant is
/// totally ordered; Mentor, SalesAgent, and Assistant sit outside it and are
/// mutually incomparable. Adding a role is a compile-time-checked change:
/// the permission engine matches exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Developer,
    Director,
    Administrator,
    Accountant,
    Mentor,
    SalesAgent,
    Assistant,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Developer,
        Role::Director,
        Role::Administrator,
        Role::Accountant,
        Role::Mentor,
        Role::SalesAgent,
        Role::Assistant,
    ];

    /// Rank within the management chain, highest first.
    /// `None` for the incomparable leaf roles: they never satisfy a
    /// rank-threshold rule, only explicit allow-lists.
    pub fn rank(&self) -> Option<u8> {
        match self {
            Role::Developer => Some(4),
            Role::Director => Some(3),
            Role::Administrator => Some(2),
            Role::Accountant => Some(1),
            Role::Mentor | Role::SalesAgent | Role::Assistant => None,
        }
    }

    /// Whether this role outranks-or-equals `threshold` within the
    /// management chain. Incomparable roles never do.
    pub fn at_least(&self, threshold: Role) -> bool {
        match (self.rank(), threshold.rank()) {
            (Some(mine), Some(required)) => mine >= required,
            _ => false,
        }
    }

    /// Backend wire name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Developer => "developer",
            Role::Director => "director",
            Role::Administrator => "administrator",
            Role::Accountant => "accountant",
            Role::Mentor => "mentor",
            Role::SalesAgent => "sales_agent",
            Role::Assistant => "assistant",
        }
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "developer" => Ok(Role::Developer),
            "director" => Ok(Role::Director),
            "administrator" => Ok(Role::Administrator),
            "accountant" => Ok(Role::Accountant),
            "mentor" => Ok(Role::Mentor),
            "sales_agent" => Ok(Role::SalesAgent),
            "assistant" => Ok(Role::Assistant),
            // Role drift between bot and backend requires a bot update
            other => Err(CoreError::Config(format!(
                "Unknown role {other:?} in backend response"
            ))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_management_chain_ordering() {
        assert!(Role::Developer.at_least(Role::Director));
        assert!(Role::Director.at_least(Role::Administrator));
        assert!(Role::Administrator.at_least(Role::Accountant));
        assert!(Role::Administrator.at_least(Role::Administrator));
        assert!(!Role::Accountant.at_least(Role::Administrator));
        assert!(!Role::Director.at_least(Role::Developer));
    }

    #[test]
    fn test_leaf_roles_never_meet_thresholds() {
        for leaf in [Role::Mentor, Role::SalesAgent, Role::Assistant] {
            assert_eq!(leaf.rank(), None);
            // Not even the lowest threshold in the chain
            assert!(!leaf.at_least(Role::Accountant));
            // Leaves are incomparable with each other too
            assert!(!leaf.at_least(Role::Mentor));
        }
    }

    #[test]
    fn test_wire_name_round_trip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_serde_matches_wire_names() {
        let json = serde_json::to_string(&Role::SalesAgent).unwrap();
        assert_eq!(json, "\"sales_agent\"");
        let parsed: Role = serde_json::from_str("\"administrator\"").unwrap();
        assert_eq!(parsed, Role::Administrator);
    }
}
