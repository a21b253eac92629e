//! # crudp
//!
//! Capability-based CRUD dispatch engine.
//!
//! Handlers declare which of create, read, update and delete they support,
//! a validator, and an access policy. They are registered once; each gets a
//! dense one-byte id. Callers then address them by id and action code,
//! either one call at a time or through batches of wire packets whose
//! payload blocks are encoded with a pluggable codec.
//!
//! ## Architecture
//!
//! - **Registry**: handler descriptions are checked and frozen into an
//!   immutable table, swapped in atomically
//! - **Access control**: role-set or access-level model per handler, an
//!   optional external check, and an explicit dev-mode bypass
//! - **Dispatch**: bounds, action, access, validation, then exactly one
//!   capability
//! - **Batch**: per-packet decode, dispatch and encode; one failing packet
//!   never aborts the batch
//!
//! ## Example
//!
//! ```
//! use crudp::codec::{Codec, MsgPackCodec};
//! use crudp::{Action, Args, BatchRequest, CallContext, Engine, Handler, Packet, Reply, Role};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct User { id: u32, name: String }
//!
//! struct Session { roles: Vec<Role> }
//!
//! let engine = Engine::builder()
//!     .codec(MsgPackCodec)
//!     .caller_roles(|args| {
//!         args.call_context()
//!             .get::<Session>()
//!             .map(|s| s.roles.clone())
//!             .unwrap_or_default()
//!     })
//!     .build();
//!
//! engine
//!     .register([Handler::<User>::named("users")
//!         .create(|args: Args<User>| Reply::Many(args.items))
//!         .validate(|_, args| if args.is_empty() { Err("no user".into()) } else { Ok(()) })
//!         .allowed_roles(|_| [Role::wildcard()])])
//!     .unwrap();
//!
//! let user = MsgPackCodec.encode_bytes(&User { id: 1, name: "ana".into() }).unwrap();
//! let request = BatchRequest::new(vec![
//!     Packet::new(Action::Create, 0, "req-1").with_data(vec![user]),
//! ]);
//! let context = CallContext::new().with(Session { roles: vec![Role::new("member")] });
//!
//! let response = engine.execute(&request, &context);
//! assert!(response.results[0].is_success());
//! ```

pub mod access;
pub mod codec;
pub mod engine;
pub mod error;
pub mod handler;
pub mod protocol;

pub use access::{AccessDenial, AccessModel, AccessQuery, AccessRules, Credential, Requirement, Role};
pub use codec::{Codec, JsonCodec, MsgPackCodec};
pub use engine::{Engine, EngineBuilder, Route, RouteTarget};
pub use error::{CallError, CodecError, CrudpError, RegistrationError, Result};
pub use handler::{Args, CallArgs, CallContext, Handler, HandlerError, HandlerSpec, Output, Reply};
pub use protocol::{Action, BatchRequest, BatchResponse, Packet, PacketResult, Request, Response, Status};
