//! # Route table configuration
//!
//! Route tables describe registrations declaratively so they can be checked and
//! inspected without compiling a service:
//!
//! ```toml
//! [[routes]]
//! method = "GET"
//! pattern = "/api/v1/users/:id([0-9]+)"
//! handler = "get_user"
//!
//! [[routes]]
//! method = "GET"
//! pattern = "/api/v1/users|posts"
//! handler = "list"
//! ```
//!
//! Entries are registered in file order, which matters: among wildcard and regex
//! segments at the same depth, the first registered wins.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::router::{RouteError, Router};

/// One registration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouteEntry {
    /// HTTP method; case-insensitive
    pub method: String,
    /// Route pattern, starting with `/`
    pub pattern: String,
    /// Name of the handler attached at the terminal nodes
    pub handler: String,
}

/// A parsed route table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RouteTable {
    /// Registrations in file order
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
}

/// A semantic problem with one route table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableError {
    /// Zero-based entry index
    pub index: usize,
    /// What is wrong with it
    pub message: String,
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "routes[{}]: {}", self.index, self.message)
    }
}

impl std::error::Error for TableError {}

impl RouteTable {
    /// Parse and validate a TOML route table
    ///
    /// # Errors
    ///
    /// TOML syntax or schema errors, or every validation problem found.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: RouteTable = toml::from_str(content).context("Failed to parse route table")?;
        let problems = table.validate();
        if !problems.is_empty() {
            let joined = problems
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            anyhow::bail!("Route table validation failed: {}", joined);
        }
        Ok(table)
    }

    /// Check every entry, returning all problems at once
    #[must_use]
    pub fn validate(&self) -> Vec<TableError> {
        let mut problems = Vec::new();
        for (index, entry) in self.routes.iter().enumerate() {
            if entry.method.trim().is_empty() {
                problems.push(TableError {
                    index,
                    message: "method must not be empty".to_string(),
                });
            }
            if !entry.pattern.starts_with('/') {
                problems.push(TableError {
                    index,
                    message: format!("pattern '{}' must start with '/'", entry.pattern),
                });
            }
            if entry.handler.trim().is_empty() {
                problems.push(TableError {
                    index,
                    message: "handler must not be empty".to_string(),
                });
            }
        }
        problems
    }

    /// Register every entry, in order, with its handler name as the handler
    ///
    /// Methods are upper-cased the same way the dispatcher does.
    ///
    /// # Errors
    ///
    /// The first [`RouteError`] encountered; entries before it stay registered in
    /// the discarded router.
    pub fn build_router(&self) -> Result<Router<Arc<str>>, RouteError> {
        let mut router = Router::new();
        for entry in &self.routes {
            let method = entry.method.trim().to_ascii_uppercase();
            let handler: Arc<str> = Arc::from(entry.handler.as_str());
            router.register(&method, &entry.pattern, &[handler])?;
        }
        Ok(router)
    }
}

/// Load and validate a route table from a TOML file
///
/// # Errors
///
/// IO errors reading `path`, plus anything [`RouteTable::from_toml_str`] rejects.
pub fn load_route_table(path: &Path) -> Result<RouteTable> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read route table {}", path.display()))?;
    let table = RouteTable::from_toml_str(&content)
        .with_context(|| format!("Invalid route table {}", path.display()))?;
    info!(
        path = %path.display(),
        routes = table.routes.len(),
        "Route table loaded"
    );
    Ok(table)
}
