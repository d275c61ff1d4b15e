//! # Router Module
//!
//! The router module compiles URL patterns into a segment trie and resolves
//! concrete request paths against it.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Classifying each `/`-delimited pattern segment ([`fragment`])
//! - Building the trie incrementally as patterns are registered ([`MatchTree`])
//! - Matching request paths and extracting named parameters ([`Router::route`])
//! - Keeping per-method handler lists at terminal nodes
//!
//! ## Pattern syntax
//!
//! Applied independently to every segment:
//!
//! | Form | Meaning |
//! |---|---|
//! | `literal` | exact match (word chars, `.`, `-`) |
//! | `a\|b\|c` | any of the literal alternatives |
//! | `:name` | any non-empty segment, bound to `name` |
//! | `:name?` | as above, and the segment may be omitted |
//! | `(regex)` | segment must fully match `regex` |
//! | `:name(regex)` | as above, bound to `name` |
//! | `(a\|b)` | same as `a\|b` |
//!
//! An unconstrained `:name?` directly followed by a required parameter is
//! rejected with [`RouteError::ShadowedOptional`]: without the optional, the next
//! segment would always be captured by `:name` instead. Constrain the optional
//! (`:lang([a-z]{2})?`) or register the two forms separately. `/:name?` also
//! matches `/`.
//!
//! ## Example
//!
//! ```rust
//! use trierouter::router::Router;
//!
//! let mut router: Router<&str> = Router::new();
//! router.register("GET", "/api/v1/users/:id([0-9]+)", &["get_user"]).unwrap();
//!
//! let m = router.route("/api/v1/users/42").unwrap();
//! assert_eq!(m.get_path_param("id"), Some("42"));
//! assert_eq!(router.node(m.node).unwrap().handlers("GET"), &["get_user"]);
//! assert!(router.route("/api/v1/users/abc").is_none());
//! ```
//!
//! ## Matching order
//!
//! At each depth a literal child is preferred over wildcard and regex children,
//! and those are tried in registration order. The first accepting child is
//! committed to; a later mismatch does not cause a retry with a sibling.

mod core;
mod error;
pub mod fragment;
mod tree;
#[cfg(test)]
mod tests;

pub use core::{RouteMatch, Router};
pub use error::RouteError;
pub use fragment::{parse_fragment, Fragment, Segment};
pub use tree::{MatchTree, Node, NodeId, ParamVec, MAX_INLINE_PARAMS};
