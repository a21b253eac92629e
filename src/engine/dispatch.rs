//! Single-call dispatch: bounds, action, access, capability, validation.

use super::Engine;
use crate::codec::Codec;
use crate::error::CallError;
use crate::handler::{CallArgs, HandlerTable, Output};
use crate::protocol::Action;

impl<C: Codec> Engine<C> {
    /// Dispatch one call to a handler capability.
    ///
    /// `action` is the raw wire code (`c`, `r`, `u`, `d`). Returns `Ok(None)`
    /// when the capability produced no data.
    ///
    /// # Errors
    ///
    /// - [`CallError::UnknownHandler`] if no handler has this id
    /// - [`CallError::UnknownAction`] if the code is not a CRUD action
    /// - [`CallError::AccessDenied`] if the access policy rejects the caller
    /// - [`CallError::NotImplemented`] if the capability is not bound
    /// - [`CallError::Validation`] if the validator rejects the arguments
    /// - [`CallError::Handler`] if the capability replied with a failure
    pub fn call(
        &self,
        handler_id: u8,
        action: u8,
        args: CallArgs,
    ) -> Result<Option<Output>, CallError> {
        let table = self.snapshot();
        self.dispatch(&table, handler_id, action, args)
    }

    pub(crate) fn dispatch(
        &self,
        table: &HandlerTable<C>,
        handler_id: u8,
        action: u8,
        args: CallArgs,
    ) -> Result<Option<Output>, CallError> {
        let record = table
            .get(handler_id)
            .ok_or(CallError::UnknownHandler(handler_id))?;

        let action = Action::from_code(action).ok_or_else(|| CallError::UnknownAction {
            code: action,
            handler: record.name().to_string(),
        })?;

        self.access
            .check(record.name(), record.id(), record.access(), action, &args)?;

        // Unbound actions never reach the validator.
        if !record.capabilities().contains(action) {
            return Err(CallError::NotImplemented {
                action,
                handler: record.name().to_string(),
            });
        }

        tracing::debug!(
            handler = record.name(),
            handler_id,
            action = %action,
            items = args.payload().len(),
            "dispatching call"
        );

        record.binding().invoke(record.name(), action, args)
    }
}
