//! Route descriptors for a transport layer to mount.
//!
//! The engine does not serve HTTP itself. It describes one route per bound
//! capability, `METHOD /{name}/{path...}`, plus the batch route.

use std::fmt;

use super::Engine;
use crate::codec::Codec;
use crate::protocol::Action;

/// Path of the batch endpoint.
pub const BATCH_PATH: &str = "/batch";

/// What a route dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    /// The batch endpoint, see [`Engine::handle_batch`].
    Batch,
    /// One capability, see [`Engine::call_single`].
    Handler {
        /// Handler id.
        id: u8,
        /// Bound action.
        action: Action,
    },
}

/// A transport route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// HTTP method.
    pub method: &'static str,
    /// Path pattern; a trailing `{path...}` captures the path parameter.
    pub path: String,
    /// Dispatch target.
    pub target: RouteTarget,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

impl<C: Codec> Engine<C> {
    /// Routes for the current handler table, batch route first.
    pub fn routes(&self) -> Vec<Route> {
        let table = self.snapshot();
        let mut routes = vec![Route {
            method: Action::Create.http_method(),
            path: BATCH_PATH.to_string(),
            target: RouteTarget::Batch,
        }];

        for record in table.iter() {
            for action in record.capabilities().iter() {
                routes.push(Route {
                    method: action.http_method(),
                    path: format!("/{}/{{path...}}", record.name()),
                    target: RouteTarget::Handler {
                        id: record.id(),
                        action,
                    },
                });
            }
        }

        routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{Handler, Reply};

    #[test]
    fn test_routes_per_capability() {
        let engine: Engine = Engine::builder().dev_mode(true).build();
        engine
            .register([
                Handler::<String>::named("users")
                    .create(|_| Reply::Empty)
                    .read(|_| Reply::Empty)
                    .validate(|_, _| Ok(())),
                Handler::<String>::named("pages"),
            ])
            .unwrap();

        let routes = engine.routes();
        let rendered: Vec<_> = routes.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec!["POST /batch", "POST /users/{path...}", "GET /users/{path...}"]
        );
        assert_eq!(
            routes[2].target,
            RouteTarget::Handler {
                id: 0,
                action: Action::Read
            }
        );
    }
}
