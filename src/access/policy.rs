//! Call-time access decisions.

use std::collections::BTreeSet;

use super::{AccessDenial, AccessModel, AccessQuery, AccessRules, Credential, Requirement, Role};
use crate::error::CallError;
use crate::handler::CallArgs;
use crate::protocol::Action;

pub(crate) type RoleExtractor = Box<dyn Fn(&CallArgs) -> BTreeSet<Role> + Send + Sync>;
pub(crate) type LevelExtractor = Box<dyn Fn(&CallArgs) -> u32 + Send + Sync>;
pub(crate) type AccessCheck = Box<dyn Fn(&AccessQuery<'_>) -> bool + Send + Sync>;
pub(crate) type DenialHook = Box<dyn Fn(&AccessDenial) + Send + Sync>;

/// Access configuration, frozen when the engine is built.
#[derive(Default)]
pub(crate) struct AccessControl {
    pub(crate) dev_mode: bool,
    pub(crate) caller_roles: Option<RoleExtractor>,
    pub(crate) caller_level: Option<LevelExtractor>,
    pub(crate) access_check: Option<AccessCheck>,
    pub(crate) on_denied: Option<DenialHook>,
}

impl AccessControl {
    /// Whether handlers must declare an access provider.
    pub(crate) fn requires_provider(&self) -> bool {
        !self.dev_mode && self.access_check.is_none()
    }

    /// Whether callers of a handler using `model` can be identified.
    pub(crate) fn identifies(&self, model: AccessModel) -> bool {
        if self.dev_mode || self.access_check.is_some() {
            return true;
        }
        match model {
            AccessModel::Roles => self.caller_roles.is_some(),
            AccessModel::Level => self.caller_level.is_some(),
        }
    }

    /// Decide whether the call may proceed.
    pub(crate) fn check(
        &self,
        handler: &str,
        handler_id: u8,
        rules: Option<&AccessRules>,
        action: Action,
        args: &CallArgs,
    ) -> Result<(), CallError> {
        if self.dev_mode {
            return Ok(());
        }

        if let Some(check) = &self.access_check {
            let query = AccessQuery {
                handler,
                handler_id,
                action,
                rules,
                args,
            };
            if check(&query) {
                return Ok(());
            }
            return Err(self.deny(AccessDenial {
                handler: handler.to_string(),
                handler_id,
                action,
                caller: Credential::External,
                required: Credential::External,
                reason: "rejected by access check".to_string(),
            }));
        }

        // No rules or no requirement: nothing bound for this action.
        let Some(requirement) = rules.and_then(|rules| rules.requirement(action)) else {
            return Ok(());
        };

        match requirement {
            Requirement::Roles(allowed) => {
                let caller = match &self.caller_roles {
                    Some(extract) => extract(args),
                    None => BTreeSet::new(),
                };
                if has_any_role(&caller, allowed) {
                    return Ok(());
                }
                let caller = Credential::Roles(caller);
                let required = Credential::Roles(allowed.clone());
                Err(self.deny(AccessDenial {
                    reason: format!("required roles {}, caller has {}", required, caller),
                    handler: handler.to_string(),
                    handler_id,
                    action,
                    caller,
                    required,
                }))
            }
            Requirement::Level(min) => {
                let caller = self.caller_level.as_ref().map(|extract| extract(args));
                if matches!(caller, Some(level) if level >= *min) {
                    return Ok(());
                }
                let caller = caller.map_or(Credential::Unknown, Credential::Level);
                let required = Credential::Level(*min);
                Err(self.deny(AccessDenial {
                    reason: format!("required {}, caller has {}", required, caller),
                    handler: handler.to_string(),
                    handler_id,
                    action,
                    caller,
                    required,
                }))
            }
        }
    }

    fn deny(&self, denial: AccessDenial) -> CallError {
        if let Some(hook) = &self.on_denied {
            hook(&denial);
        }
        tracing::warn!(
            handler = %denial.handler,
            action = %denial.action,
            "access denied for handler: {}",
            denial.reason
        );
        CallError::AccessDenied
    }
}

/// OR semantics over the allowed set.
///
/// The wildcard admits any caller holding at least one role; an empty
/// caller set never matches it. An empty allowed set admits nobody.
pub(crate) fn has_any_role(caller: &BTreeSet<Role>, allowed: &BTreeSet<Role>) -> bool {
    allowed
        .iter()
        .any(|role| (role.is_wildcard() && !caller.is_empty()) || caller.contains(role))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::CallContext;
    use std::sync::{Arc, Mutex};

    struct Session {
        roles: Vec<&'static str>,
        level: u32,
    }

    fn roles(names: &[&str]) -> BTreeSet<Role> {
        names.iter().copied().map(Role::from).collect()
    }

    fn args(session: Session) -> CallArgs {
        CallArgs::new().context(CallContext::new().with(session))
    }

    fn session_roles() -> RoleExtractor {
        Box::new(|args: &CallArgs| {
            args.call_context()
                .get::<Session>()
                .map(|s| roles(&s.roles))
                .unwrap_or_default()
        })
    }

    fn role_rules(action: Action, allowed: &[&str]) -> AccessRules {
        let mut rules = AccessRules::new(AccessModel::Roles);
        rules.set(action, Requirement::Roles(roles(allowed)));
        rules
    }

    #[test]
    fn test_has_any_role() {
        assert!(has_any_role(&roles(&["admin"]), &roles(&["admin", "editor"])));
        assert!(!has_any_role(&roles(&["viewer"]), &roles(&["admin"])));
        assert!(has_any_role(&roles(&["member"]), &roles(&["*"])));
        assert!(!has_any_role(&roles(&[]), &roles(&["*"])));
        assert!(!has_any_role(&roles(&["admin"]), &roles(&[])));
    }

    #[test]
    fn test_role_model() {
        let control = AccessControl {
            caller_roles: Some(session_roles()),
            ..AccessControl::default()
        };
        let rules = role_rules(Action::Read, &["admin"]);

        let admin = args(Session { roles: vec!["admin"], level: 0 });
        assert!(control.check("users", 0, Some(&rules), Action::Read, &admin).is_ok());

        let guest = args(Session { roles: vec!["guest"], level: 0 });
        let err = control
            .check("users", 0, Some(&rules), Action::Read, &guest)
            .unwrap_err();
        assert!(matches!(err, CallError::AccessDenied));
        assert_eq!(err.to_string(), "access denied");
    }

    #[test]
    fn test_wildcard_needs_some_role() {
        let control = AccessControl {
            caller_roles: Some(session_roles()),
            ..AccessControl::default()
        };
        let rules = role_rules(Action::Create, &["*"]);

        let anonymous = args(Session { roles: vec![], level: 0 });
        assert!(control
            .check("users", 0, Some(&rules), Action::Create, &anonymous)
            .is_err());

        let member = args(Session { roles: vec!["member"], level: 0 });
        assert!(control
            .check("users", 0, Some(&rules), Action::Create, &member)
            .is_ok());
    }

    #[test]
    fn test_level_model() {
        let control = AccessControl {
            caller_level: Some(Box::new(|args: &CallArgs| {
                args.call_context().get::<Session>().map_or(0, |s| s.level)
            })),
            ..AccessControl::default()
        };
        let mut rules = AccessRules::new(AccessModel::Level);
        rules.set(Action::Update, Requirement::Level(5));

        let low = args(Session { roles: vec![], level: 4 });
        let exact = args(Session { roles: vec![], level: 5 });
        assert!(control.check("docs", 1, Some(&rules), Action::Update, &low).is_err());
        assert!(control.check("docs", 1, Some(&rules), Action::Update, &exact).is_ok());
    }

    #[test]
    fn test_level_without_extractor_denies() {
        let control = AccessControl::default();
        let mut rules = AccessRules::new(AccessModel::Level);
        rules.set(Action::Read, Requirement::Level(0));

        assert!(control
            .check("docs", 0, Some(&rules), Action::Read, &CallArgs::new())
            .is_err());
    }

    #[test]
    fn test_dev_mode_bypasses() {
        let control = AccessControl {
            dev_mode: true,
            ..AccessControl::default()
        };
        let rules = role_rules(Action::Delete, &["admin"]);
        assert!(control
            .check("users", 0, Some(&rules), Action::Delete, &CallArgs::new())
            .is_ok());
    }

    #[test]
    fn test_unimplemented_action_has_no_requirement() {
        let control = AccessControl::default();
        let rules = role_rules(Action::Read, &["admin"]);
        assert!(control
            .check("users", 0, Some(&rules), Action::Delete, &CallArgs::new())
            .is_ok());
    }

    #[test]
    fn test_external_check_replaces_models() {
        let control = AccessControl {
            access_check: Some(Box::new(|query: &AccessQuery<'_>| query.action == Action::Read)),
            ..AccessControl::default()
        };
        let rules = role_rules(Action::Read, &["admin"]);

        assert!(control
            .check("users", 0, Some(&rules), Action::Read, &CallArgs::new())
            .is_ok());
        assert!(control
            .check("users", 0, None, Action::Create, &CallArgs::new())
            .is_err());
    }

    #[test]
    fn test_denial_hook_receives_context() {
        let seen: Arc<Mutex<Vec<AccessDenial>>> = Arc::default();
        let sink = seen.clone();
        let control = AccessControl {
            caller_roles: Some(session_roles()),
            on_denied: Some(Box::new(move |denial: &AccessDenial| {
                sink.lock().unwrap().push(denial.clone());
            })),
            ..AccessControl::default()
        };
        let rules = role_rules(Action::Delete, &["admin"]);
        let editor = args(Session { roles: vec!["editor"], level: 0 });

        assert!(control
            .check("users", 3, Some(&rules), Action::Delete, &editor)
            .is_err());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let denial = &seen[0];
        assert_eq!(denial.handler, "users");
        assert_eq!(denial.handler_id, 3);
        assert_eq!(denial.action, Action::Delete);
        assert_eq!(denial.caller, Credential::Roles(roles(&["editor"])));
        assert_eq!(denial.required, Credential::Roles(roles(&["admin"])));
        assert_eq!(denial.reason, r#"required roles ["admin"], caller has ["editor"]"#);
    }

    #[test]
    fn test_identifies() {
        let control = AccessControl {
            caller_roles: Some(session_roles()),
            ..AccessControl::default()
        };
        assert!(control.identifies(AccessModel::Roles));
        assert!(!control.identifies(AccessModel::Level));
        assert!(control.requires_provider());
    }
}
