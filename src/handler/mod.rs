//! Handler module - typed handler descriptions and the handler table.
//!
//! Provides:
//! - [`Handler`] - fluent description of one CRUD handler
//! - [`CallArgs`] / [`Args`] - the argument bag, untyped and typed
//! - [`Reply`] - what a capability returns, including in-band failure
//! - [`HandlerTable`] - the frozen, id-ordered registry
//!
//! # Example
//!
//! ```
//! use crudp::{Args, Engine, Handler, Reply};
//!
//! let engine: Engine = Engine::builder().dev_mode(true).build();
//!
//! engine
//!     .register([Handler::<String>::named("echo")
//!         .read(|args: Args<String>| Reply::Many(args.items))
//!         .validate(|_, _| Ok(()))])
//!     .unwrap();
//!
//! assert_eq!(engine.handler_id("echo"), Some(0));
//! ```

mod args;
mod registry;
mod reply;
mod typed;

pub use args::{Args, CallArgs, CallContext, Value};
pub use registry::{HandlerRecord, HandlerTable, MAX_HANDLERS};
pub use reply::{HandlerError, Output, Reply};
pub use typed::{Capabilities, Handler, HandlerSpec};

pub(crate) use registry::build_table;
