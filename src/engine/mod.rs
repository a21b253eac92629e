//! Engine builder and handler table lifecycle.
//!
//! The [`EngineBuilder`] freezes the configuration: codec, dev mode, caller
//! identity extractors, external access check and denial callback. The
//! [`Engine`] then owns the handler table:
//! 1. `register` builds a complete table and swaps it in
//! 2. `call` dispatches one typed call
//! 3. `execute` runs a batch of wire packets
//!
//! # Example
//!
//! ```
//! use crudp::codec::{Codec, MsgPackCodec};
//! use crudp::{Action, Args, BatchRequest, CallContext, Engine, Handler, Packet, Reply, Role};
//!
//! let engine = Engine::builder()
//!     .codec(MsgPackCodec)
//!     .caller_roles(|_args| [Role::new("member")])
//!     .build();
//!
//! engine
//!     .register([Handler::<String>::named("echo")
//!         .create(|args: Args<String>| Reply::Many(args.items))
//!         .validate(|_, _| Ok(()))
//!         .allowed_roles(|_| [Role::wildcard()])])
//!     .unwrap();
//!
//! let block = MsgPackCodec.encode_bytes(&"hello").unwrap();
//! let request = BatchRequest::new(vec![Packet::new(Action::Create, 0, "r1").with_data(vec![block])]);
//! let response = engine.execute(&request, &CallContext::new());
//! assert!(response.results[0].is_success());
//! ```

mod batch;
mod dispatch;
mod routes;

use std::sync::Arc;

use parking_lot::RwLock;

use crate::access::{AccessControl, AccessDenial, AccessQuery, Role};
use crate::codec::{Codec, MsgPackCodec};
use crate::error::RegistrationError;
use crate::handler::{build_table, CallArgs, HandlerSpec, HandlerTable};

pub use routes::{Route, RouteTarget, BATCH_PATH};

/// Builder for configuring and creating an [`Engine`].
///
/// Dev mode is off unless enabled here; nothing in the environment turns it
/// on.
pub struct EngineBuilder<C = MsgPackCodec> {
    codec: Option<C>,
    access: AccessControl,
}

impl<C: Codec> EngineBuilder<C> {
    /// Create a builder with no codec and strict access.
    pub fn new() -> Self {
        Self {
            codec: None,
            access: AccessControl::default(),
        }
    }

    /// Set the codec used for payload blocks and envelopes.
    pub fn codec(mut self, codec: C) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Bypass every access check.
    ///
    /// Also relaxes the registration rule that handlers declare an access
    /// provider.
    pub fn dev_mode(mut self, enabled: bool) -> Self {
        self.access.dev_mode = enabled;
        self
    }

    /// Set how the caller's roles are read from a call's argument bag.
    pub fn caller_roles<F, I>(mut self, extract: F) -> Self
    where
        F: Fn(&CallArgs) -> I + Send + Sync + 'static,
        I: IntoIterator<Item = Role>,
    {
        self.access.caller_roles = Some(Box::new(move |args: &CallArgs| {
            extract(args).into_iter().collect()
        }));
        self
    }

    /// Set how the caller's access level is read from a call's argument bag.
    pub fn caller_level<F>(mut self, extract: F) -> Self
    where
        F: Fn(&CallArgs) -> u32 + Send + Sync + 'static,
    {
        self.access.caller_level = Some(Box::new(extract));
        self
    }

    /// Replace the built-in access models with an external decision.
    pub fn access_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&AccessQuery<'_>) -> bool + Send + Sync + 'static,
    {
        self.access.access_check = Some(Box::new(check));
        self
    }

    /// Be notified of every denied call.
    pub fn on_access_denied<F>(mut self, hook: F) -> Self
    where
        F: Fn(&AccessDenial) + Send + Sync + 'static,
    {
        self.access.on_denied = Some(Box::new(hook));
        self
    }

    /// Freeze the configuration.
    pub fn build(self) -> Engine<C> {
        if self.access.dev_mode {
            tracing::warn!("dev mode enabled, access control is bypassed");
        }
        Engine {
            codec: self.codec,
            access: self.access,
            table: RwLock::new(Arc::new(HandlerTable::empty())),
        }
    }
}

impl<C: Codec> Default for EngineBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// CRUD dispatch engine.
///
/// Cheap to share across threads; calls never hold the table lock while a
/// handler runs.
pub struct Engine<C = MsgPackCodec> {
    codec: Option<C>,
    access: AccessControl,
    table: RwLock<Arc<HandlerTable<C>>>,
}

impl<C: Codec> Engine<C> {
    /// Create a builder.
    pub fn builder() -> EngineBuilder<C> {
        EngineBuilder::new()
    }

    /// Create an engine with a codec and strict access.
    pub fn new(codec: C) -> Self {
        EngineBuilder::new().codec(codec).build()
    }

    /// Replace the handler table.
    ///
    /// Ids are assigned from 0 in iteration order. On error nothing changes
    /// and the previous table stays live.
    pub fn register<I, H>(&self, handlers: I) -> Result<(), RegistrationError>
    where
        I: IntoIterator<Item = H>,
        H: Into<HandlerSpec<C>>,
    {
        let specs = handlers.into_iter().map(Into::into).collect();
        let table = build_table(specs, &self.access)?;
        tracing::debug!("installed handler table with {} handlers", table.len());
        *self.table.write() = Arc::new(table);
        Ok(())
    }

    /// Name of the handler with this id.
    pub fn handler_name(&self, id: u8) -> Option<String> {
        self.table
            .read()
            .get(id)
            .map(|record| record.name().to_string())
    }

    /// Id of the handler with this name.
    pub fn handler_id(&self, name: &str) -> Option<u8> {
        self.table.read().find(name)
    }

    /// Number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.table.read().len()
    }

    /// Snapshot of the current handler table.
    pub fn handlers(&self) -> Arc<HandlerTable<C>> {
        self.snapshot()
    }

    /// Check if access control is bypassed.
    pub fn is_dev_mode(&self) -> bool {
        self.access.dev_mode
    }

    /// The configured codec.
    pub fn codec(&self) -> Option<&C> {
        self.codec.as_ref()
    }

    fn snapshot(&self) -> Arc<HandlerTable<C>> {
        Arc::clone(&self.table.read())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{Args, Handler, Reply};

    fn echo() -> Handler<String> {
        Handler::named("echo")
            .read(|args: Args<String>| Reply::Many(args.items))
            .validate(|_, _| Ok(()))
    }

    #[test]
    fn test_builder_defaults() {
        let engine: Engine = EngineBuilder::default().build();
        assert!(!engine.is_dev_mode());
        assert!(engine.codec().is_none());
        assert_eq!(engine.handler_count(), 0);
    }

    #[test]
    fn test_register_assigns_ids() {
        let engine: Engine = Engine::builder().dev_mode(true).build();
        engine
            .register([echo(), echo().name("mirror")])
            .unwrap();

        assert_eq!(engine.handler_count(), 2);
        assert_eq!(engine.handler_id("mirror"), Some(1));
        assert_eq!(engine.handler_name(0).as_deref(), Some("echo"));
        assert_eq!(engine.handler_name(7), None);
    }

    #[test]
    fn test_failed_register_keeps_table() {
        let engine: Engine = Engine::builder().dev_mode(true).build();
        engine.register([echo()]).unwrap();

        let err = engine.register([echo(), echo()]).unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateName { .. }));
        assert_eq!(engine.handler_count(), 1);
        assert_eq!(engine.handler_id("echo"), Some(0));
    }

    #[test]
    fn test_snapshot_survives_reregistration() {
        let engine: Engine = Engine::builder().dev_mode(true).build();
        engine.register([echo()]).unwrap();
        let before = engine.handlers();

        engine.register([echo().name("mirror"), echo()]).unwrap();
        assert_eq!(before.find("echo"), Some(0));
        assert_eq!(engine.handler_id("echo"), Some(1));
    }

    #[test]
    fn test_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
        assert_send_sync::<Engine<crate::codec::JsonCodec>>();
    }
}
