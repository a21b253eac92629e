//! Access control - role-set and access-level authorization.
//!
//! Two mutually exclusive models, chosen per handler by the provider it
//! declares:
//!
//! - **Roles**: the caller must hold any of the allowed roles. The wildcard
//!   role `*` admits any caller holding at least one role.
//! - **Level**: the caller's level must be at least the handler's minimum.
//!
//! Requirements are evaluated once at registration and frozen into the
//! handler record as [`AccessRules`]. The caller side is extracted per call
//! by the extractors configured on the
//! [`EngineBuilder`](crate::EngineBuilder).

mod policy;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::handler::CallArgs;
use crate::protocol::Action;

pub(crate) use policy::AccessControl;

/// The wildcard role token.
pub const WILDCARD: &str = "*";

/// An opaque role token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// Create a role token.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The wildcard role: any authenticated caller.
    pub fn wildcard() -> Self {
        Self(WILDCARD.to_string())
    }

    /// Check if this is the wildcard role.
    pub fn is_wildcard(&self) -> bool {
        self.0 == WILDCARD
    }

    /// The token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Role {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Role {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which access model a handler uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessModel {
    /// Role-set model.
    Roles,
    /// Access-level model.
    Level,
}

impl AccessModel {
    /// Lowercase model name.
    pub const fn as_str(self) -> &'static str {
        match self {
            AccessModel::Roles => "roles",
            AccessModel::Level => "level",
        }
    }
}

/// What an action demands from its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Any of these roles.
    Roles(BTreeSet<Role>),
    /// At least this level.
    Level(u32),
}

/// Frozen per-action requirements of one handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRules {
    model: AccessModel,
    rules: [Option<Requirement>; 4],
}

impl AccessRules {
    pub(crate) fn new(model: AccessModel) -> Self {
        Self {
            model,
            rules: [None, None, None, None],
        }
    }

    pub(crate) fn set(&mut self, action: Action, requirement: Requirement) {
        self.rules[action.index()] = Some(requirement);
    }

    /// The access model.
    pub fn model(&self) -> AccessModel {
        self.model
    }

    /// Requirement for `action`; `None` if the action is not implemented.
    pub fn requirement(&self, action: Action) -> Option<&Requirement> {
        self.rules[action.index()].as_ref()
    }
}

/// A caller or required credential, as reported in denials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// A role set.
    Roles(BTreeSet<Role>),
    /// An access level.
    Level(u32),
    /// Decided by the external access check.
    External,
    /// No extractor produced a credential.
    Unknown,
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Roles(roles) => {
                f.write_str("[")?;
                for (i, role) in roles.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}", role.as_str())?;
                }
                f.write_str("]")
            }
            Credential::Level(level) => write!(f, "level {}", level),
            Credential::External => f.write_str("external check"),
            Credential::Unknown => f.write_str("unknown"),
        }
    }
}

/// Full context of a denied call, delivered to the denial callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDenial {
    /// Handler name.
    pub handler: String,
    /// Handler id.
    pub handler_id: u8,
    /// Requested action.
    pub action: Action,
    /// What the caller presented.
    pub caller: Credential,
    /// What the action required.
    pub required: Credential,
    /// Rendered reason.
    pub reason: String,
}

/// Input of an external access check.
#[derive(Debug)]
pub struct AccessQuery<'a> {
    /// Handler name.
    pub handler: &'a str,
    /// Handler id.
    pub handler_id: u8,
    /// Requested action.
    pub action: Action,
    /// Frozen rules of the handler, if it declared any.
    pub rules: Option<&'a AccessRules>,
    /// The call's argument bag.
    pub args: &'a CallArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_role() {
        assert!(Role::wildcard().is_wildcard());
        assert!(!Role::new("admin").is_wildcard());
        assert_eq!(Role::from("*"), Role::wildcard());
    }

    #[test]
    fn test_rules_per_action() {
        let mut rules = AccessRules::new(AccessModel::Level);
        rules.set(Action::Read, Requirement::Level(2));

        assert_eq!(rules.model(), AccessModel::Level);
        assert_eq!(rules.requirement(Action::Read), Some(&Requirement::Level(2)));
        assert_eq!(rules.requirement(Action::Delete), None);
    }

    #[test]
    fn test_credential_display() {
        let roles: BTreeSet<Role> = ["member", "admin"].into_iter().map(Role::from).collect();
        assert_eq!(Credential::Roles(roles).to_string(), r#"["admin", "member"]"#);
        assert_eq!(Credential::Level(3).to_string(), "level 3");
        assert_eq!(Credential::Roles(BTreeSet::new()).to_string(), "[]");
    }
}
