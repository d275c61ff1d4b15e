//! # CLI Module
//!
//! Command-line front end for checking and querying route tables.
//!
//! ## Commands
//!
//! ```bash
//! # Compile every pattern; exits non-zero on the first bad constraint
//! trierouter check --routes routes.toml
//!
//! # Resolve a path: matched pattern, allowed methods, handlers, params
//! trierouter match --routes routes.toml --method GET /api/v1/users/42
//!
//! # Print every terminal node with its methods
//! trierouter tree --routes routes.toml
//! ```
//!
//! `--verbose` switches logging to debug, which traces every match attempt.

mod commands;


pub use commands::{run_cli, run_command, Cli, Commands};
