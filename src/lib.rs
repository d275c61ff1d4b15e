//! # trierouter
//!
//! **trierouter** matches request paths against URL patterns compiled into a
//! segment trie, and dispatches matched requests to ordered handler lists.
//!
//! ## Overview
//!
//! A pattern is split on `/` and every fragment becomes one node at its depth:
//!
//! | Fragment | Meaning |
//! |----------|---------|
//! | `users` | literal |
//! | `users\|posts` | literal alternatives, one sibling node each |
//! | `:id` | named wildcard, binds any non-empty fragment |
//! | `:id?` | optional wildcard, the route also matches without it |
//! | `:id([0-9]+)` | named regex constraint |
//! | `([0-9]+)` | unnamed regex constraint |
//! | `:kind(a\|b)` | named constraint over alternatives |
//!
//! Matching walks the tree one fragment at a time, preferring literal children
//! over wildcards and regexes, with no backtracking.
//!
//! ## Architecture
//!
//! - **[`router`]** - Fragment parsing, the match tree and the [`Router`] facade
//! - **[`dispatcher`]** - Method dispatch, `OPTIONS` handling and middleware
//! - **[`config`]** - TOML route tables
//! - **[`logging`]** - `tracing` subscriber setup for binaries
//! - **[`cli`]** - The `trierouter` command line tool
//!
//! ## Example
//!
//! ```rust
//! use trierouter::Router;
//!
//! let mut router: Router<&str> = Router::new();
//! router.register("GET", "/api/v1/users|posts/:id?", &["collection"]).unwrap();
//!
//! let m = router.route("/api/v1/posts/9").unwrap();
//! assert_eq!(m.get_path_param("id"), Some("9"));
//! assert!(router.route("/api/v1/users").is_some());
//! ```

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod logging;
pub mod router;

pub use dispatcher::{handler, DispatchOutcome, Dispatcher, SharedDispatcher};
pub use router::{MatchTree, NodeId, RouteError, RouteMatch, Router};
