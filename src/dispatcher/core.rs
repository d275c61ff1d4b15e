//! Dispatcher core module - method dispatch over matched routes.
//!
//! The dispatcher owns a [`Router`] whose handler type is [`BoxedHandler`] and an
//! ordered middleware list. It knows three HTTP rules and nothing more: method
//! names are upper-cased, `OPTIONS` is answered from the node's method set, and
//! middleware runs after the route's own handlers.

use http::header::{HeaderName, HeaderValue, ALLOW};
use http::Method;
use std::sync::Arc;
use tracing::{debug, info};

use crate::router::{NodeId, RouteError, RouteMatch, Router};

/// A request handler
///
/// Handlers receive the route match (node and captured params) and a
/// caller-defined context, typically a request/response pair. They run
/// sequentially in registration order.
pub trait Handler<C>: Send + Sync {
    /// Handle one matched request
    fn handle(&self, route: &RouteMatch, ctx: &mut C);
}

impl<C, F> Handler<C> for F
where
    F: Fn(&RouteMatch, &mut C) + Send + Sync,
{
    fn handle(&self, route: &RouteMatch, ctx: &mut C) {
        self(route, ctx);
    }
}

/// Shared, type-erased handler
pub type BoxedHandler<C> = Arc<dyn Handler<C>>;

/// Wrap a closure as a [`BoxedHandler`]
pub fn handler<C, F>(f: F) -> BoxedHandler<C>
where
    F: Fn(&RouteMatch, &mut C) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// What [`Dispatcher::dispatch`] did with a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No node matched the path; nothing ran
    NotFound,
    /// `OPTIONS` request; nothing ran. `allow` lists the node's methods joined by `,`
    Options {
        /// Value for the `Allow` response header
        allow: String,
    },
    /// Route handlers for the method ran, followed by the middleware
    Handled {
        /// The match the handlers were invoked with
        route: RouteMatch,
        /// Number of handlers invoked, middleware included
        invoked: usize,
    },
}

impl DispatchOutcome {
    /// The `Allow` header for an `OPTIONS` outcome
    ///
    /// `None` for other outcomes, or if the method list is not a valid header value.
    #[must_use]
    pub fn allow_header(&self) -> Option<(HeaderName, HeaderValue)> {
        match self {
            DispatchOutcome::Options { allow } => HeaderValue::from_str(allow)
                .ok()
                .map(|value| (ALLOW, value)),
            DispatchOutcome::NotFound | DispatchOutcome::Handled { .. } => None,
        }
    }

    /// Whether the path matched a node
    #[must_use]
    pub fn is_match(&self) -> bool {
        !matches!(self, DispatchOutcome::NotFound)
    }
}

/// Routes requests to the handlers registered for their path and method
pub struct Dispatcher<C> {
    router: Router<BoxedHandler<C>>,
    middlewares: Vec<BoxedHandler<C>>,
}

impl<C> Clone for Dispatcher<C> {
    fn clone(&self) -> Self {
        Self {
            router: self.router.clone(),
            middlewares: self.middlewares.clone(),
        }
    }
}

impl<C> Default for Dispatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Dispatcher<C> {
    /// Create a dispatcher with no routes and no middleware
    #[must_use]
    pub fn new() -> Self {
        Dispatcher {
            router: Router::new(),
            middlewares: Vec::new(),
        }
    }

    /// The router holding every registration
    #[must_use]
    pub fn router(&self) -> &Router<BoxedHandler<C>> {
        &self.router
    }

    /// Number of middleware handlers
    #[must_use]
    pub fn middleware_len(&self) -> usize {
        self.middlewares.len()
    }

    /// Register `handlers` for `method` on `pattern`
    ///
    /// The method is upper-cased before registration. Returns the terminal
    /// nodes the pattern resolved to.
    ///
    /// # Errors
    ///
    /// Any [`RouteError`] from compiling the pattern; nothing is registered then.
    pub fn add_route(
        &mut self,
        method: &str,
        pattern: &str,
        handlers: &[BoxedHandler<C>],
    ) -> Result<Vec<NodeId>, RouteError> {
        let method = method.trim().to_ascii_uppercase();
        self.router.register(&method, pattern, handlers)
    }

    /// Chainable form of [`Dispatcher::add_route`]
    ///
    /// # Errors
    ///
    /// Any [`RouteError`] from compiling the pattern.
    pub fn route(
        &mut self,
        method: &str,
        pattern: &str,
        handlers: &[BoxedHandler<C>],
    ) -> Result<&mut Self, RouteError> {
        self.add_route(method, pattern, handlers)?;
        Ok(self)
    }

    /// Register a `GET` route
    ///
    /// # Errors
    ///
    /// Any [`RouteError`] from compiling the pattern.
    pub fn get(
        &mut self,
        pattern: &str,
        handlers: &[BoxedHandler<C>],
    ) -> Result<&mut Self, RouteError> {
        self.route(Method::GET.as_str(), pattern, handlers)
    }

    /// Register a `PUT` route
    ///
    /// # Errors
    ///
    /// Any [`RouteError`] from compiling the pattern.
    pub fn put(
        &mut self,
        pattern: &str,
        handlers: &[BoxedHandler<C>],
    ) -> Result<&mut Self, RouteError> {
        self.route(Method::PUT.as_str(), pattern, handlers)
    }

    /// Register a `POST` route
    ///
    /// # Errors
    ///
    /// Any [`RouteError`] from compiling the pattern.
    pub fn post(
        &mut self,
        pattern: &str,
        handlers: &[BoxedHandler<C>],
    ) -> Result<&mut Self, RouteError> {
        self.route(Method::POST.as_str(), pattern, handlers)
    }

    /// Register a `PATCH` route
    ///
    /// # Errors
    ///
    /// Any [`RouteError`] from compiling the pattern.
    pub fn patch(
        &mut self,
        pattern: &str,
        handlers: &[BoxedHandler<C>],
    ) -> Result<&mut Self, RouteError> {
        self.route(Method::PATCH.as_str(), pattern, handlers)
    }

    /// Register a `DELETE` route
    ///
    /// # Errors
    ///
    /// Any [`RouteError`] from compiling the pattern.
    pub fn delete(
        &mut self,
        pattern: &str,
        handlers: &[BoxedHandler<C>],
    ) -> Result<&mut Self, RouteError> {
        self.route(Method::DELETE.as_str(), pattern, handlers)
    }

    /// Append middleware
    ///
    /// Middleware runs after the route handlers of every matched, non-`OPTIONS`
    /// request, in the order it was added.
    pub fn use_middleware<I>(&mut self, handlers: I) -> &mut Self
    where
        I: IntoIterator<Item = BoxedHandler<C>>,
    {
        let before = self.middlewares.len();
        self.middlewares.extend(handlers);
        info!(
            added = self.middlewares.len() - before,
            total = self.middlewares.len(),
            "Middleware registered"
        );
        self
    }

    /// Dispatch one request
    ///
    /// Matches `path`, then either answers `OPTIONS` from the node's method set
    /// or runs the handlers registered for `method` followed by the middleware.
    /// A path that matches a node with no handlers for `method` still runs the
    /// middleware.
    pub fn dispatch(&self, method: &str, path: &str, ctx: &mut C) -> DispatchOutcome {
        let Some(route) = self.router.route(path) else {
            return DispatchOutcome::NotFound;
        };
        let Some(node) = self.router.node(route.node) else {
            return DispatchOutcome::NotFound;
        };

        let method = method.trim().to_ascii_uppercase();
        if method == Method::OPTIONS.as_str() {
            let allow = node.methods().join(",");
            debug!(path = %path, allow = %allow, "Answered OPTIONS from method set");
            return DispatchOutcome::Options { allow };
        }

        let handlers = node.handlers(&method);
        for h in handlers.iter().chain(self.middlewares.iter()) {
            h.handle(&route, ctx);
        }
        let invoked = handlers.len() + self.middlewares.len();

        debug!(
            method = %method,
            path = %path,
            route_handlers = handlers.len(),
            middleware = self.middlewares.len(),
            "Dispatched request"
        );

        DispatchOutcome::Handled { route, invoked }
    }

    /// Dispatch an [`http::Request`] by its method and URI path
    pub fn dispatch_request<B>(&self, request: &http::Request<B>, ctx: &mut C) -> DispatchOutcome {
        self.dispatch(request.method().as_str(), request.uri().path(), ctx)
    }
}
