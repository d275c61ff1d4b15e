//! # Dispatcher Module
//!
//! The dispatcher sits between a request source and the router. It registers
//! handler lists per HTTP method and pattern, resolves incoming requests through
//! the [`Router`](crate::router::Router), and invokes the handlers it finds.
//!
//! ## Overview
//!
//! - Handlers for the matched method run in registration order, then the
//!   middleware list runs in the order it was added
//! - `OPTIONS` requests run nothing and yield the node's method set for an
//!   `Allow` header
//! - A path with no matching node yields [`DispatchOutcome::NotFound`]; what to
//!   send back is the caller's decision
//!
//! ## Example
//!
//! ```rust
//! use trierouter::dispatcher::{handler, DispatchOutcome, Dispatcher};
//!
//! let mut dispatcher: Dispatcher<Vec<String>> = Dispatcher::new();
//! dispatcher
//!     .get("/users/:id", &[handler(|route, out: &mut Vec<String>| {
//!         out.push(format!("user {}", route.get_path_param("id").unwrap_or("?")));
//!     })])
//!     .unwrap();
//!
//! let mut out = Vec::new();
//! dispatcher.dispatch("get", "/users/7", &mut out);
//! assert_eq!(out, vec!["user 7"]);
//!
//! let outcome = dispatcher.dispatch("OPTIONS", "/users/7", &mut out);
//! assert_eq!(outcome, DispatchOutcome::Options { allow: "GET".to_string() });
//! ```
//!
//! ## Concurrency
//!
//! A [`Dispatcher`] is built during setup and then shared read-only. When routes
//! must be added while requests are being served, wrap it in a
//! [`SharedDispatcher`], which publishes immutable snapshots.

mod core;
mod shared;

pub use core::{handler, BoxedHandler, DispatchOutcome, Dispatcher, Handler};
pub use shared::SharedDispatcher;
