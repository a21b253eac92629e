//! Users service - batch dispatch example.
//!
//! This example demonstrates:
//! - Building an engine with a codec and a caller role extractor
//! - Registering a handler with create/read capabilities and role access
//! - Running a MessagePack batch and reading per-packet results
//!
//! # Running
//!
//! ```text
//! RUST_LOG=debug cargo run --example users
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crudp::codec::{Codec, MsgPackCodec};
use crudp::{Action, Args, BatchRequest, CallArgs, CallContext, Engine, Handler, Packet, Reply, Role};

/// A stored user.
#[derive(Serialize, Deserialize, Debug, Clone)]
struct User {
    #[serde(default)]
    id: u32,
    name: String,
}

/// Caller session, set by the transport for each batch.
struct Session {
    roles: Vec<Role>,
}

#[derive(Default)]
struct Store {
    next_id: u32,
    users: BTreeMap<u32, User>,
}

fn users(store: Arc<Mutex<Store>>) -> Handler<User> {
    let reader = store.clone();
    Handler::named("users")
        .create(move |args: Args<User>| {
            let mut store = store.lock();
            let created = args
                .items
                .into_iter()
                .map(|mut user| {
                    store.next_id += 1;
                    user.id = store.next_id;
                    store.users.insert(user.id, user.clone());
                    user
                })
                .collect::<Vec<_>>();
            Reply::Many(created)
        })
        .read(move |args: Args<User>| {
            let store = reader.lock();
            match args.path.as_deref().map(str::parse::<u32>) {
                Some(Ok(id)) => store.users.get(&id).cloned().into(),
                Some(Err(_)) => Reply::fail("invalid user id"),
                None => Reply::Many(store.users.values().cloned().collect()),
            }
        })
        .validate(|action, args| match action {
            Action::Create if args.is_empty() => Err("no user provided".into()),
            _ => Ok(()),
        })
        .allowed_roles(|_| [Role::wildcard()])
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let engine = Engine::builder()
        .codec(MsgPackCodec)
        .caller_roles(|args: &CallArgs| {
            args.call_context()
                .get::<Session>()
                .map(|session| session.roles.clone())
                .unwrap_or_default()
        })
        .build();

    engine.register([users(Arc::default())])?;
    let users_id = engine.handler_id("users").ok_or("users handler missing")?;

    for route in engine.routes() {
        println!("route: {}", route);
    }

    let ana = MsgPackCodec.encode_bytes(&User {
        id: 0,
        name: "ana".to_string(),
    })?;
    let request = BatchRequest::new(vec![
        Packet::new(Action::Create, users_id, "create-ana").with_data(vec![ana]),
        Packet::new(Action::Read, users_id, "list"),
        Packet::new(Action::Delete, users_id, "delete"),
    ]);

    let context = CallContext::new().with(Session {
        roles: vec![Role::new("member")],
    });
    let body = MsgPackCodec.encode(&request)?;
    let reply = engine.handle_batch(&body, &context)?;
    let response: crudp::BatchResponse = MsgPackCodec.decode(&reply)?;

    for result in &response.results {
        let users = result
            .data()
            .iter()
            .map(|block| MsgPackCodec.decode::<User>(block))
            .collect::<Result<Vec<_>, _>>()?;
        println!(
            "{} -> {:?} {} {:?}",
            result.req_id(),
            result.message_type,
            result.message,
            users
        );
    }

    Ok(())
}
