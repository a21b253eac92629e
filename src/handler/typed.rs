//! Typed handler descriptions and their type-erased bindings.
//!
//! A [`Handler<T, R>`] is built once with the fluent API: its name, the
//! capabilities it binds, its validator and its access provider. `T` is the
//! argument type every payload block decodes into; `R` is the reply type.
//! Converting it into a [`HandlerSpec<C>`] erases both types behind a
//! binding that is monomorphized for the engine's codec `C`, so decoding
//! and encoding never inspect types at call time.
//!
//! # Example
//!
//! ```
//! use crudp::{Action, Args, Handler, Reply, Role};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Note { text: String }
//!
//! let notes: Handler<Note> = Handler::named("notes")
//!     .create(|args: Args<Note>| Reply::Many(args.items))
//!     .validate(|_action, args| {
//!         if args.is_empty() { Err("no note given".into()) } else { Ok(()) }
//!     })
//!     .allowed_roles(|_action| [Role::wildcard()]);
//!
//! assert!(notes.capabilities().contains(Action::Create));
//! assert!(!notes.capabilities().contains(Action::Read));
//! ```

use std::any::type_name;
use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::args::{Args, CallArgs, Value};
use super::reply::{HandlerError, Output, Reply};
use crate::access::Role;
use crate::codec::Codec;
use crate::error::CallError;
use crate::protocol::Action;

type CapabilityFn<T, R> = Box<dyn Fn(Args<T>) -> Reply<R> + Send + Sync>;
type ValidateFn<T> = Box<dyn Fn(Action, &Args<T>) -> Result<(), HandlerError> + Send + Sync>;
pub(crate) type RolesFn = Box<dyn Fn(Action) -> BTreeSet<Role> + Send + Sync>;
pub(crate) type LevelFn = Box<dyn Fn(Action) -> Option<u32> + Send + Sync>;

/// Set of bound CRUD capabilities.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    bits: u8,
}

impl Capabilities {
    /// No capability bound.
    pub const NONE: Capabilities = Capabilities { bits: 0 };

    /// Check if `action` is bound.
    #[inline]
    pub const fn contains(self, action: Action) -> bool {
        self.bits & (1 << action.index()) != 0
    }

    /// Check if nothing is bound.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Bound actions in wire order.
    pub fn iter(self) -> impl Iterator<Item = Action> {
        Action::ALL.into_iter().filter(move |action| self.contains(*action))
    }

    pub(crate) fn insert(&mut self, action: Action) {
        self.bits |= 1 << action.index();
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Fluent description of one handler.
pub struct Handler<T, R = T> {
    name: Option<String>,
    capabilities: [Option<CapabilityFn<T, R>>; 4],
    validate: Option<ValidateFn<T>>,
    roles: Option<RolesFn>,
    level: Option<LevelFn>,
    _types: PhantomData<fn(T) -> R>,
}

impl<T, R> Handler<T, R>
where
    T: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
{
    /// Create a handler that declares nothing yet.
    pub fn new() -> Self {
        Self {
            name: None,
            capabilities: [None, None, None, None],
            validate: None,
            roles: None,
            level: None,
            _types: PhantomData,
        }
    }

    /// Create a handler with a display name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new().name(name)
    }

    /// Set the display name (unique across the registry).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Bind the create capability.
    pub fn create<F>(self, f: F) -> Self
    where
        F: Fn(Args<T>) -> Reply<R> + Send + Sync + 'static,
    {
        self.bind(Action::Create, f)
    }

    /// Bind the read capability.
    pub fn read<F>(self, f: F) -> Self
    where
        F: Fn(Args<T>) -> Reply<R> + Send + Sync + 'static,
    {
        self.bind(Action::Read, f)
    }

    /// Bind the update capability.
    pub fn update<F>(self, f: F) -> Self
    where
        F: Fn(Args<T>) -> Reply<R> + Send + Sync + 'static,
    {
        self.bind(Action::Update, f)
    }

    /// Bind the delete capability.
    pub fn delete<F>(self, f: F) -> Self
    where
        F: Fn(Args<T>) -> Reply<R> + Send + Sync + 'static,
    {
        self.bind(Action::Delete, f)
    }

    /// Bind a capability by action.
    pub fn bind<F>(mut self, action: Action, f: F) -> Self
    where
        F: Fn(Args<T>) -> Reply<R> + Send + Sync + 'static,
    {
        self.capabilities[action.index()] = Some(Box::new(f));
        self
    }

    /// Set the validator run before every capability call.
    pub fn validate<F>(mut self, f: F) -> Self
    where
        F: Fn(Action, &Args<T>) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.validate = Some(Box::new(f));
        self
    }

    /// Use the role-set access model.
    ///
    /// The provider is evaluated once per implemented action at
    /// registration; an empty set is a registration error.
    pub fn allowed_roles<F, I>(mut self, f: F) -> Self
    where
        F: Fn(Action) -> I + Send + Sync + 'static,
        I: IntoIterator<Item = Role>,
    {
        self.roles = Some(Box::new(move |action| f(action).into_iter().collect()));
        self
    }

    /// Use the access-level model.
    ///
    /// The provider is evaluated once per implemented action at
    /// registration; `None` is a registration error.
    pub fn min_access<F>(mut self, f: F) -> Self
    where
        F: Fn(Action) -> Option<u32> + Send + Sync + 'static,
    {
        self.level = Some(Box::new(f));
        self
    }

    /// Capabilities bound so far.
    pub fn capabilities(&self) -> Capabilities {
        let mut capabilities = Capabilities::NONE;
        for action in Action::ALL {
            if self.capabilities[action.index()].is_some() {
                capabilities.insert(action);
            }
        }
        capabilities
    }
}

impl<T, R> Default for Handler<T, R>
where
    T: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased operations the engine needs from a handler.
pub(crate) trait Binding<C>: Send + Sync {
    /// Decode payload blocks into fresh argument values.
    fn decode(&self, codec: &C, blocks: &[Bytes]) -> Result<Vec<Value>, CallError>;

    /// Validate and invoke the capability for `action`.
    fn invoke(&self, handler: &str, action: Action, args: CallArgs)
        -> Result<Option<Output>, CallError>;

    /// Encode an output produced by [`Binding::invoke`].
    fn encode(&self, codec: &C, output: &Output) -> Result<Vec<Bytes>, CallError>;
}

struct TypedBinding<T, R> {
    capabilities: [Option<CapabilityFn<T, R>>; 4],
    validate: Option<ValidateFn<T>>,
}

impl<T, R> TypedBinding<T, R>
where
    T: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
{
    fn typed_args(handler: &str, args: CallArgs) -> Result<Args<T>, CallError> {
        let (context, path, values) = args.into_parts();
        let items = values
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                value
                    .downcast::<T>()
                    .map(|item| *item)
                    .map_err(|_| CallError::ArgumentType {
                        handler: handler.to_string(),
                        index,
                        expected: type_name::<T>(),
                    })
            })
            .collect::<Result<Vec<T>, CallError>>()?;

        Ok(Args {
            context,
            path,
            items,
        })
    }

    fn encode_one<C: Codec>(codec: &C, value: &Value) -> Result<Bytes, CallError> {
        let reply = value
            .downcast_ref::<R>()
            .ok_or(CallError::ResultType {
                expected: type_name::<R>(),
            })?;
        codec.encode_bytes(reply).map_err(CallError::Encode)
    }
}

impl<T, R, C> Binding<C> for TypedBinding<T, R>
where
    T: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    C: Codec,
{
    fn decode(&self, codec: &C, blocks: &[Bytes]) -> Result<Vec<Value>, CallError> {
        blocks
            .iter()
            .map(|block| {
                codec
                    .decode::<T>(block)
                    .map(|item| Box::new(item) as Value)
                    .map_err(CallError::Decode)
            })
            .collect()
    }

    fn invoke(
        &self,
        handler: &str,
        action: Action,
        args: CallArgs,
    ) -> Result<Option<Output>, CallError> {
        let args = Self::typed_args(handler, args)?;

        if let Some(validate) = &self.validate {
            validate(action, &args).map_err(CallError::Validation)?;
        }

        let capability =
            self.capabilities[action.index()]
                .as_ref()
                .ok_or_else(|| CallError::NotImplemented {
                    action,
                    handler: handler.to_string(),
                })?;

        match capability(args) {
            Reply::Empty => Ok(None),
            Reply::One(value) => Ok(Some(Output::One(Box::new(value)))),
            Reply::Many(values) => Ok(Some(Output::Many(
                values
                    .into_iter()
                    .map(|value| Box::new(value) as Value)
                    .collect(),
            ))),
            Reply::Failed(error) => Err(CallError::Handler(error)),
        }
    }

    fn encode(&self, codec: &C, output: &Output) -> Result<Vec<Bytes>, CallError> {
        match output {
            Output::One(value) => Ok(vec![Self::encode_one(codec, value)?]),
            Output::Many(values) => values
                .iter()
                .map(|value| Self::encode_one(codec, value))
                .collect(),
        }
    }
}

/// A handler ready for registration, with its types erased.
///
/// Obtained from a [`Handler`] through `From`/`Into`.
pub struct HandlerSpec<C> {
    pub(crate) name: Option<String>,
    pub(crate) capabilities: Capabilities,
    pub(crate) has_validator: bool,
    pub(crate) roles: Option<RolesFn>,
    pub(crate) level: Option<LevelFn>,
    pub(crate) item_type: &'static str,
    pub(crate) binding: Box<dyn Binding<C>>,
}

impl<C> HandlerSpec<C> {
    /// Display name, if declared.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Bound capabilities.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Check if the handler declares nothing at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.capabilities.is_empty()
            && !self.has_validator
            && self.roles.is_none()
            && self.level.is_none()
    }
}

impl<T, R, C> From<Handler<T, R>> for HandlerSpec<C>
where
    T: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    C: Codec,
{
    fn from(handler: Handler<T, R>) -> Self {
        let capabilities = handler.capabilities();
        let has_validator = handler.validate.is_some();

        Self {
            name: handler.name,
            capabilities,
            has_validator,
            roles: handler.roles,
            level: handler.level,
            item_type: type_name::<T>(),
            binding: Box::new(TypedBinding {
                capabilities: handler.capabilities,
                validate: handler.validate,
            }),
        }
    }
}

impl<C> fmt::Debug for HandlerSpec<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerSpec")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .field("has_validator", &self.has_validator)
            .field("item_type", &self.item_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MsgPackCodec;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: u32,
    }

    fn spec(handler: Handler<Item>) -> HandlerSpec<MsgPackCodec> {
        handler.into()
    }

    #[test]
    fn test_capabilities_tracked() {
        let handler = Handler::<Item>::named("items")
            .create(|_| Reply::Empty)
            .delete(|_| Reply::Empty);

        let caps = handler.capabilities();
        assert!(caps.contains(Action::Create));
        assert!(caps.contains(Action::Delete));
        assert!(!caps.contains(Action::Read));
        assert_eq!(caps.iter().collect::<Vec<_>>(), vec![Action::Create, Action::Delete]);
    }

    #[test]
    fn test_empty_spec() {
        assert!(spec(Handler::new()).is_empty());
        assert!(!spec(Handler::named("x")).is_empty());
    }

    #[test]
    fn test_decode_uses_argument_type() {
        let spec = spec(Handler::named("items").read(|_| Reply::Empty));
        let block = Bytes::from(MsgPackCodec.encode(&Item { id: 5 }).unwrap());

        let values = spec.binding.decode(&MsgPackCodec, &[block]).unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].downcast_ref::<Item>(), Some(&Item { id: 5 }));
    }

    #[test]
    fn test_invoke_validates_first() {
        let spec = spec(
            Handler::named("items")
                .create(|args: Args<Item>| Reply::Many(args.items))
                .validate(|_, args| {
                    if args.is_empty() {
                        Err("no data provided".into())
                    } else {
                        Ok(())
                    }
                }),
        );

        let err = spec
            .binding
            .invoke("items", Action::Create, CallArgs::new())
            .unwrap_err();
        assert!(matches!(err, CallError::Validation(_)));
        assert_eq!(err.to_string(), "no data provided");

        let output = spec
            .binding
            .invoke("items", Action::Create, CallArgs::new().item(Item { id: 1 }))
            .unwrap()
            .unwrap();
        assert_eq!(output.into_many::<Item>(), Some(vec![Item { id: 1 }]));
    }

    #[test]
    fn test_invoke_rejects_foreign_argument() {
        let spec = spec(Handler::named("items").read(|_| Reply::Empty));
        let err = spec
            .binding
            .invoke("items", Action::Read, CallArgs::new().item("not an item"))
            .unwrap_err();
        assert!(matches!(err, CallError::ArgumentType { index: 0, .. }));
    }

    #[test]
    fn test_in_band_failure_surfaces() {
        let spec = spec(Handler::named("items").update(|_| Reply::fail("row is locked")));
        let err = spec
            .binding
            .invoke("items", Action::Update, CallArgs::new())
            .unwrap_err();
        assert!(matches!(err, CallError::Handler(_)));
        assert_eq!(err.to_string(), "row is locked");
    }

    #[test]
    fn test_encode_many_preserves_order() {
        let spec = spec(Handler::named("items").read(|_| Reply::Empty));
        let output = Output::Many(vec![Box::new(Item { id: 1 }), Box::new(Item { id: 2 })]);

        let blocks = spec.binding.encode(&MsgPackCodec, &output).unwrap();
        assert_eq!(blocks.len(), 2);
        let second: Item = MsgPackCodec.decode(&blocks[1]).unwrap();
        assert_eq!(second, Item { id: 2 });
    }
}
