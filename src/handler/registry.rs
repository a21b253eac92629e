//! Handler table construction and registration-time checks.
//!
//! The table maps dense, 0-based handler ids (registration order) to frozen
//! [`HandlerRecord`]s. It is built completely before it is installed, so a
//! rejected registration never leaves a partial table behind.
//!
//! Checks, per handler:
//!
//! 1. an empty handler is rejected,
//! 2. a handler binding any capability needs a unique, non-empty name and a
//!    validator,
//! 3. it needs an access provider (roles or level, never both) unless the
//!    engine runs in dev mode or uses an external access check,
//! 4. a declared provider must yield a requirement for every implemented
//!    action.
//!
//! Finally a handler enforcing access needs a way to identify its caller.

use std::collections::HashSet;
use std::fmt;

use super::typed::{Binding, Capabilities, HandlerSpec};
use crate::access::{AccessControl, AccessModel, AccessRules, Requirement};
use crate::codec::Codec;
use crate::error::RegistrationError;
use crate::protocol::Action;

/// Largest table addressable by a one-byte handler id.
pub const MAX_HANDLERS: usize = u8::MAX as usize + 1;

/// Frozen description of one registered handler.
pub struct HandlerRecord<C> {
    name: Option<String>,
    id: u8,
    capabilities: Capabilities,
    has_validator: bool,
    access: Option<AccessRules>,
    item_type: Option<&'static str>,
    binding: Box<dyn Binding<C>>,
}

impl<C> HandlerRecord<C> {
    /// Display name; empty for an unnamed inert handler.
    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Handler id.
    #[inline]
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Bound capabilities.
    #[inline]
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Check if a validator is bound.
    #[inline]
    pub fn has_validator(&self) -> bool {
        self.has_validator
    }

    /// Frozen access requirements, if any.
    #[inline]
    pub fn access(&self) -> Option<&AccessRules> {
        self.access.as_ref()
    }

    /// Argument type payloads decode into; `None` for inert handlers.
    #[inline]
    pub fn item_type(&self) -> Option<&'static str> {
        self.item_type
    }

    pub(crate) fn binding(&self) -> &dyn Binding<C> {
        self.binding.as_ref()
    }
}

impl<C> fmt::Debug for HandlerRecord<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRecord")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("capabilities", &self.capabilities)
            .field("has_validator", &self.has_validator)
            .field("access", &self.access)
            .field("item_type", &self.item_type)
            .finish()
    }
}

/// Immutable, id-ordered table of handler records.
pub struct HandlerTable<C> {
    records: Vec<HandlerRecord<C>>,
}

impl<C> HandlerTable<C> {
    /// An empty table.
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Record by id.
    #[inline]
    pub fn get(&self, id: u8) -> Option<&HandlerRecord<C>> {
        self.records.get(usize::from(id))
    }

    /// Id of the handler with this name.
    pub fn find(&self, name: &str) -> Option<u8> {
        self.records
            .iter()
            .find(|record| record.name.as_deref() == Some(name))
            .map(|record| record.id)
    }

    /// Number of records.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the table is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &HandlerRecord<C>> {
        self.records.iter()
    }
}

impl<C> fmt::Debug for HandlerTable<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.records.iter()).finish()
    }
}

/// Build a table from handler specs, enforcing every registration check.
pub(crate) fn build_table<C: Codec>(
    specs: Vec<HandlerSpec<C>>,
    access: &AccessControl,
) -> Result<HandlerTable<C>, RegistrationError> {
    if specs.len() > MAX_HANDLERS {
        return Err(RegistrationError::TooManyHandlers {
            count: specs.len(),
            max: MAX_HANDLERS,
        });
    }

    let mut names = HashSet::new();
    let mut records = Vec::with_capacity(specs.len());

    for (index, spec) in specs.into_iter().enumerate() {
        let record = build_record(index, spec, access, &mut names)?;
        if let Some(name) = &record.name {
            tracing::info!("registered handler: {} at index {}", name, record.id);
        }
        records.push(record);
    }

    for record in &records {
        if let Some(rules) = &record.access {
            if !access.identifies(rules.model()) {
                return Err(RegistrationError::NoCallerIdentity {
                    name: record.name().to_string(),
                    model: rules.model().as_str(),
                });
            }
        }
    }

    Ok(HandlerTable { records })
}

fn build_record<C: Codec>(
    index: usize,
    spec: HandlerSpec<C>,
    access: &AccessControl,
    names: &mut HashSet<String>,
) -> Result<HandlerRecord<C>, RegistrationError> {
    if spec.is_empty() {
        return Err(RegistrationError::EmptyHandler { index });
    }

    // MAX_HANDLERS bounds index to the u8 range
    let id = u8::try_from(index).map_err(|_| RegistrationError::TooManyHandlers {
        count: index + 1,
        max: MAX_HANDLERS,
    })?;

    if let Some(name) = &spec.name {
        if !name.is_empty() && !names.insert(name.clone()) {
            return Err(RegistrationError::DuplicateName {
                name: name.clone(),
                index,
            });
        }
    }

    if spec.capabilities.is_empty() {
        return Ok(HandlerRecord {
            name: spec.name.filter(|name| !name.is_empty()),
            id,
            capabilities: spec.capabilities,
            has_validator: spec.has_validator,
            access: None,
            item_type: None,
            binding: spec.binding,
        });
    }

    let name = match spec.name {
        Some(name) if !name.is_empty() => name,
        _ => return Err(RegistrationError::MissingName { index }),
    };

    if !spec.has_validator {
        return Err(RegistrationError::MissingValidator { name });
    }

    let rules = match (&spec.roles, &spec.level) {
        (Some(_), Some(_)) => return Err(RegistrationError::ConflictingAccess { name }),
        (None, None) if access.requires_provider() => {
            return Err(RegistrationError::MissingAccess { name })
        }
        (None, None) => None,
        (Some(roles), None) => {
            let mut rules = AccessRules::new(AccessModel::Roles);
            for action in spec.capabilities.iter() {
                let allowed = roles(action);
                if allowed.is_empty() {
                    return Err(empty_access(name, action));
                }
                rules.set(action, Requirement::Roles(allowed));
            }
            Some(rules)
        }
        (None, Some(level)) => {
            let mut rules = AccessRules::new(AccessModel::Level);
            for action in spec.capabilities.iter() {
                match level(action) {
                    Some(min) => rules.set(action, Requirement::Level(min)),
                    None => return Err(empty_access(name, action)),
                }
            }
            Some(rules)
        }
    };

    Ok(HandlerRecord {
        name: Some(name),
        id,
        capabilities: spec.capabilities,
        has_validator: true,
        access: rules,
        item_type: Some(spec.item_type),
        binding: spec.binding,
    })
}

fn empty_access(name: String, action: Action) -> RegistrationError {
    RegistrationError::EmptyAccess { name, action }
}
