//! The route table.

use std::collections::HashMap;

use http::Method;
use talos_core::Handler;

/// A registered route: method, full path, handler.
///
/// The full path is the concatenation of every enclosing group prefix
/// with the entry's own suffix. Entries are created at registration time
/// and immutable thereafter.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    /// HTTP method.
    pub method: Method,

    /// Full registered path.
    pub path: String,
}

/// Route table with hierarchical grouping.
///
/// Routes are unique per `(method, path)`; registering the same pair
/// twice panics, surfacing the conflict at startup instead of silently
/// shadowing a handler.
#[derive(Debug, Default)]
pub struct Router {
    prefix: String,
    routes: HashMap<(Method, String), Handler>,
}

impl Router {
    /// Creates an empty route table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty route table whose entries all share a prefix.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            routes: HashMap::new(),
        }
    }

    /// Registers a handler under a method and path.
    ///
    /// The stored path is the accumulated group prefix plus `path`.
    /// Each registration logs the route, matching startup logs against
    /// the live table.
    ///
    /// # Panics
    ///
    /// Panics if the `(method, path)` pair is already registered.
    pub fn route(&mut self, method: Method, path: &str, handler: impl Into<Handler>) {
        let full_path = format!("{}{}", self.prefix, path);
        tracing::info!("{}: {}", method, full_path);

        let key = (method, full_path);
        assert!(
            !self.routes.contains_key(&key),
            "duplicate route registration: {} {}",
            key.0,
            key.1
        );
        self.routes.insert(key, handler.into());
    }

    /// Registers a GET handler.
    pub fn get(&mut self, path: &str, handler: impl Into<Handler>) {
        self.route(Method::GET, path, handler);
    }

    /// Registers a POST handler.
    pub fn post(&mut self, path: &str, handler: impl Into<Handler>) {
        self.route(Method::POST, path, handler);
    }

    /// Registers a PUT handler.
    pub fn put(&mut self, path: &str, handler: impl Into<Handler>) {
        self.route(Method::PUT, path, handler);
    }

    /// Registers a PATCH handler.
    pub fn patch(&mut self, path: &str, handler: impl Into<Handler>) {
        self.route(Method::PATCH, path, handler);
    }

    /// Registers a DELETE handler.
    pub fn delete(&mut self, path: &str, handler: impl Into<Handler>) {
        self.route(Method::DELETE, path, handler);
    }

    /// Registers routes under an extended prefix.
    ///
    /// Entries registered inside the closure land in this same table
    /// with the accumulated prefix; nested groups concatenate their
    /// prefixes in declaration order.
    ///
    /// # Example
    ///
    /// ```rust
    /// use http::Method;
    /// use talos_core::{JsonResponse, RequestContext};
    /// use talos_router::Router;
    ///
    /// let mut router = Router::new();
    /// router.group("/api", |api| {
    ///     api.group("/v1", |v1| {
    ///         v1.get("/items", |_: RequestContext| async { Some(JsonResponse::ok()) });
    ///     });
    /// });
    ///
    /// assert!(router.lookup(&Method::GET, "/api/v1/items").is_some());
    /// ```
    pub fn group<F>(&mut self, prefix: &str, f: F)
    where
        F: FnOnce(&mut Router),
    {
        let saved = self.prefix.len();
        self.prefix.push_str(prefix);
        f(self);
        self.prefix.truncate(saved);
    }

    /// Looks up the handler registered for an exact `(method, path)`.
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> Option<&Handler> {
        self.routes.get(&(method.clone(), path.to_string()))
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterates over the registered routes.
    pub fn entries(&self) -> impl Iterator<Item = RouteEntry> + '_ {
        self.routes.keys().map(|(method, path)| RouteEntry {
            method: method.clone(),
            path: path.clone(),
        })
    }
}
