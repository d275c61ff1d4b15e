//! Router core module - hot path for request routing.
//!
//! [`Router`] wraps a [`MatchTree`] with structured logging and keeps the list of
//! registered patterns for diagnostics. Matching itself allocates only for the
//! captured parameter values.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::error::RouteError;
use super::tree::{MatchTree, Node, NodeId, ParamVec};

/// Matches slower than this are logged at `warn`.
const SLOW_MATCH: Duration = Duration::from_millis(1);

/// Result of successfully matching a request path
///
/// Holds the node reached by the last path fragment and the parameters bound
/// on the way there. The node is not necessarily terminal: a path that stops at
/// an intermediate node still matches, with no methods registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// The matched node
    pub node: NodeId,
    /// Path parameters extracted from the URL (e.g., `:id` → `("id", "123")`)
    pub path_params: ParamVec,
}

impl RouteMatch {
    /// Get a path parameter by name
    ///
    /// Uses "last write wins" semantics: if the same name is bound at several
    /// depths, the deepest binding is returned.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Convert path_params to a HashMap
    /// Note: This allocates - use get_path_param() in hot paths instead
    #[must_use]
    pub fn path_params_map(&self) -> HashMap<String, String> {
        self.path_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// Router that matches request paths against registered patterns
///
/// Registration is expected to happen during setup; afterwards `route` only
/// reads the tree and can be called from many threads through a shared
/// reference.
#[derive(Debug, Clone)]
pub struct Router<H> {
    tree: MatchTree<H>,
    patterns: Vec<(String, String)>,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Router<H> {
    /// Create an empty router
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: MatchTree::new(),
            patterns: Vec::new(),
        }
    }

    /// The underlying tree
    #[must_use]
    pub fn tree(&self) -> &MatchTree<H> {
        &self.tree
    }

    /// Look up a node of the underlying tree
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node<H>> {
        self.tree.node(id)
    }

    /// Every `(method, pattern)` registration, in registration order
    #[must_use]
    pub fn registered_patterns(&self) -> &[(String, String)] {
        &self.patterns
    }

    /// Match a request path
    ///
    /// # Returns
    ///
    /// * `Some(RouteMatch)` - the node reached by the final fragment plus params
    /// * `None` - some fragment had no accepting child
    #[must_use]
    pub fn route(&self, path: &str) -> Option<RouteMatch> {
        debug!(path = %path, "Route match attempt");

        let match_start = Instant::now();
        let result = self.tree.match_path(path);
        let match_duration = match_start.elapsed();

        if let Some((node, path_params)) = result {
            if match_duration > SLOW_MATCH {
                warn!(
                    path = %path,
                    node = node.index(),
                    path_params = ?path_params,
                    duration_us = match_duration.as_micros(),
                    "Slow route matching detected"
                );
            } else {
                info!(
                    path = %path,
                    node = node.index(),
                    path_params = ?path_params,
                    duration_us = match_duration.as_micros(),
                    "Route matched"
                );
            }
            return Some(RouteMatch { node, path_params });
        }

        warn!(
            path = %path,
            duration_us = match_duration.as_micros(),
            "No route matched"
        );
        None
    }

    /// Render every terminal node with its full path and methods
    ///
    /// One line per terminal node: `<path> [METHOD,METHOD] (<n> handlers)`.
    #[must_use]
    pub fn dump_routes(&self) -> String {
        self.tree
            .terminals()
            .filter_map(|id| self.tree.node(id).map(|node| (id, node)))
            .map(|(id, node)| {
                let handler_count: usize = node
                    .methods()
                    .iter()
                    .map(|m| node.handlers(m).len())
                    .sum();
                format!(
                    "{} [{}] ({} handlers)\n",
                    self.tree.path_of(id),
                    node.methods().join(","),
                    handler_count
                )
            })
            .collect()
    }
}

impl<H: Clone> Router<H> {
    /// Register `handlers` for `method` on `pattern`
    ///
    /// Returns the terminal nodes the pattern resolved to.
    ///
    /// # Errors
    ///
    /// Returns a [`RouteError`] when the method is blank or a constraint does not
    /// compile. The router is unchanged in that case.
    pub fn register(
        &mut self,
        method: &str,
        pattern: &str,
        handlers: &[H],
    ) -> Result<Vec<NodeId>, RouteError> {
        let nodes_before = self.tree.len();
        let terminals = match self.tree.register(method, pattern, handlers) {
            Ok(terminals) => terminals,
            Err(err) => {
                warn!(method = %method, pattern = %pattern, error = %err, "Route rejected");
                return Err(err);
            }
        };

        self.patterns
            .push((method.trim().to_string(), pattern.to_string()));

        info!(
            method = %method,
            pattern = %pattern,
            handlers = handlers.len(),
            terminals = terminals.len(),
            new_nodes = self.tree.len() - nodes_before,
            "Route registered"
        );
        Ok(terminals)
    }
}
