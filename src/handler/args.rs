//! Argument bags passed from the transport to handlers.
//!
//! A call carries three named slots, always in this order:
//!
//! 1. the injected [`CallContext`] (transport context, caller session, ...),
//! 2. an optional path parameter (single-operation routes),
//! 3. the payload items decoded from the packet.
//!
//! [`CallArgs`] is the type-erased bag the engine moves around. Typed
//! handlers receive an [`Args<T>`] whose items are already their argument
//! type.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A type-erased payload item or result value.
pub type Value = Box<dyn Any + Send>;

/// Injected transport context, keyed by type.
///
/// Cloning is cheap: values are reference counted and shared by every packet
/// of a batch.
///
/// # Example
///
/// ```
/// use crudp::CallContext;
///
/// #[derive(Debug, PartialEq)]
/// struct Session { user: String }
///
/// let ctx = CallContext::new().with(Session { user: "ana".into() });
/// assert_eq!(ctx.get::<Session>().unwrap().user, "ana");
/// assert!(ctx.get::<u32>().is_none());
/// ```
#[derive(Clone, Default)]
pub struct CallContext {
    values: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl CallContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, replacing any previous value of the same type.
    pub fn with<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    /// Insert a value, replacing any previous value of the same type.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.values.insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// Get the value of type `T`, if present.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|value| (**value).downcast_ref::<T>())
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the context is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for CallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallContext")
            .field("values", &self.values.len())
            .finish()
    }
}

/// Type-erased argument bag for one call.
#[derive(Default)]
pub struct CallArgs {
    context: CallContext,
    path: Option<String>,
    items: Vec<Value>,
}

impl CallArgs {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the injected context.
    pub fn context(mut self, context: CallContext) -> Self {
        self.context = context;
        self
    }

    /// Set the path parameter.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Append one payload item.
    pub fn item<T: Any + Send>(mut self, item: T) -> Self {
        self.items.push(Box::new(item));
        self
    }

    /// Append several payload items of one type.
    pub fn items<T, I>(mut self, items: I) -> Self
    where
        T: Any + Send,
        I: IntoIterator<Item = T>,
    {
        self.items
            .extend(items.into_iter().map(|item| Box::new(item) as Value));
        self
    }

    /// The injected context.
    #[inline]
    pub fn call_context(&self) -> &CallContext {
        &self.context
    }

    /// The path parameter.
    #[inline]
    pub fn path_param(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Payload items.
    #[inline]
    pub fn payload(&self) -> &[Value] {
        &self.items
    }

    pub(crate) fn from_parts(context: CallContext, path: Option<String>, items: Vec<Value>) -> Self {
        Self {
            context,
            path,
            items,
        }
    }

    pub(crate) fn into_parts(self) -> (CallContext, Option<String>, Vec<Value>) {
        (self.context, self.path, self.items)
    }
}

impl fmt::Debug for CallArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallArgs")
            .field("context", &self.context)
            .field("path", &self.path)
            .field("items", &self.items.len())
            .finish()
    }
}

/// Typed arguments received by a handler capability.
#[derive(Debug)]
pub struct Args<T> {
    /// Injected transport context.
    pub context: CallContext,
    /// Path parameter, if the call came through a single-operation route.
    pub path: Option<String>,
    /// Decoded payload items in packet order.
    pub items: Vec<T>,
}

impl<T> Args<T> {
    /// First payload item.
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    /// Take the first payload item.
    pub fn into_first(self) -> Option<T> {
        self.items.into_iter().next()
    }

    /// Check if there are no payload items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Token(&'static str);

    #[test]
    fn test_context_lookup_by_type() {
        let mut ctx = CallContext::new();
        assert!(ctx.is_empty());

        ctx.insert(Token("abc"));
        ctx.insert(7u32);

        assert_eq!(ctx.get::<Token>(), Some(&Token("abc")));
        assert_eq!(ctx.get::<u32>(), Some(&7));
        assert_eq!(ctx.len(), 2);
        assert!(ctx.get::<String>().is_none());
    }

    #[test]
    fn test_context_insert_replaces() {
        let ctx = CallContext::new().with(1u8).with(2u8);
        assert_eq!(ctx.get::<u8>(), Some(&2));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_context_clone_shares_values() {
        let ctx = CallContext::new().with(Token("shared"));
        let copy = ctx.clone();
        assert_eq!(copy.get::<Token>(), Some(&Token("shared")));
    }

    #[test]
    fn test_call_args_slots() {
        let args = CallArgs::new()
            .context(CallContext::new().with(Token("ctx")))
            .path("42")
            .item(1i32)
            .items(vec![2i32, 3i32]);

        assert_eq!(args.path_param(), Some("42"));
        assert_eq!(args.payload().len(), 3);
        assert!(args.call_context().get::<Token>().is_some());
        assert_eq!(args.payload()[2].downcast_ref::<i32>(), Some(&3));
    }

    #[test]
    fn test_args_first() {
        let args = Args {
            context: CallContext::new(),
            path: None,
            items: vec!["a", "b"],
        };
        assert_eq!(args.first(), Some(&"a"));
        assert_eq!(args.into_first(), Some("a"));
    }
}
