//! Segment trie holding compiled route patterns.
//!
//! The tree has one level per path depth. Every node owns two kinds of children:
//!
//! - a map from literal key to child, giving O(1) descent for exact fragments
//! - an ordered list of non-literal children (named wildcards and regex
//!   constraints), consulted in registration order when no literal key matches
//!
//! Nodes live in an arena (`Vec<Node<H>>`) and refer to each other by [`NodeId`].
//! The parent link is a plain back-index used for diagnostics only; ownership runs
//! strictly from the arena.
//!
//! ## Matching
//!
//! Matching walks the incoming path fragment by fragment. At each depth a literal
//! child wins over list children, and list children are tried in the order they
//! were registered. The first child that accepts a fragment is committed to: there
//! is no backtracking to a sibling if a deeper fragment later fails.

use regex::Regex;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

use super::error::RouteError;
use super::fragment::{parse_fragment, Fragment, Segment};

/// Maximum number of path parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Captured path parameters, in path order.
///
/// Names are shared with the tree (`Arc<str>`), values are copied out of the
/// request path.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Index of a node inside a [`MatchTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The tree root. It is never returned as a match.
    pub const ROOT: NodeId = NodeId(0);

    /// Position of the node in the arena
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// One tree node per distinct fragment at one depth.
#[derive(Debug, Clone)]
pub struct Node<H> {
    name: Option<Arc<str>>,
    key: Option<String>,
    pattern: Option<Regex>,
    literal_children: HashMap<String, NodeId>,
    children: Vec<NodeId>,
    methods: Vec<String>,
    handlers: HashMap<String, Vec<H>>,
    parent: Option<NodeId>,
}

impl<H> Node<H> {
    fn new(
        name: Option<Arc<str>>,
        key: Option<String>,
        pattern: Option<Regex>,
        parent: Option<NodeId>,
    ) -> Self {
        Self {
            name,
            key,
            pattern,
            literal_children: HashMap::new(),
            children: Vec::new(),
            methods: Vec::new(),
            handlers: HashMap::new(),
            parent,
        }
    }

    /// Parameter name bound when this node matches
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Literal key under which this node hangs in its parent's map
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Anchored constraint a fragment must satisfy
    #[must_use]
    pub fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }

    /// Parent node, for diagnostics
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// HTTP methods registered here, in registration order
    #[must_use]
    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    /// Handlers registered for `method`, in registration order
    #[must_use]
    pub fn handlers(&self, method: &str) -> &[H] {
        self.handlers.get(method).map_or(&[], Vec::as_slice)
    }

    /// Whether any registration ends at this node
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !self.methods.is_empty()
    }

    /// Literal-keyed child for `key`
    #[must_use]
    pub fn literal_child(&self, key: &str) -> Option<NodeId> {
        self.literal_children.get(key).copied()
    }

    /// Non-literal children in registration order
    #[must_use]
    pub fn list_children(&self) -> &[NodeId] {
        &self.children
    }

    fn accepts(&self, fragment: &str) -> bool {
        match &self.pattern {
            Some(re) => re.is_match(fragment),
            None => !fragment.is_empty(),
        }
    }

    fn label(&self) -> String {
        if let Some(key) = &self.key {
            return key.clone();
        }
        match (&self.name, &self.pattern) {
            (Some(name), Some(re)) => format!(":{}{}", name, constraint_source(re)),
            (Some(name), None) => format!(":{}", name),
            (None, Some(re)) => constraint_source(re).to_string(),
            (None, None) => "*".to_string(),
        }
    }
}

// `^(inner)$` -> `(inner)`
fn constraint_source(re: &Regex) -> &str {
    let src = re.as_str();
    src.strip_prefix('^')
        .and_then(|s| s.strip_suffix('$'))
        .unwrap_or(src)
}

fn same_constraint(a: Option<&Regex>, b: Option<&Regex>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.as_str() == b.as_str(),
        (None, None) => true,
        _ => false,
    }
}

fn push_unique(nodes: &mut Vec<NodeId>, id: NodeId) {
    if !nodes.contains(&id) {
        nodes.push(id);
    }
}

/// Arena-backed segment trie.
///
/// `H` is the handler type stored per method at terminal nodes. The tree treats
/// it as opaque.
#[derive(Debug, Clone)]
pub struct MatchTree<H> {
    nodes: Vec<Node<H>>,
}

impl<H> Default for MatchTree<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> MatchTree<H> {
    /// Create a tree holding only the root
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(None, None, None, None)],
        }
    }

    /// Number of nodes, root included
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when nothing has been registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Look up a node by id
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node<H>> {
        self.nodes.get(id.0)
    }

    /// Ids of every node with at least one registered method, in creation order
    pub fn terminals(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_terminal())
            .map(|(idx, _)| NodeId(idx))
    }

    /// Render the pattern path leading to `id` by walking parent links
    ///
    /// Literal nodes print their key, wildcard nodes `:name`, constrained nodes
    /// `:name(regex)` or `(regex)`.
    #[must_use]
    pub fn path_of(&self, id: NodeId) -> String {
        let mut labels = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            if cur == NodeId::ROOT {
                break;
            }
            let Some(node) = self.nodes.get(cur.0) else {
                break;
            };
            labels.push(node.label());
            current = node.parent;
        }
        labels.reverse();
        labels.join("/")
    }

    /// Compile `pattern` into the tree without attaching any handlers.
    ///
    /// Every fragment is parsed before the tree is touched, so a pattern with an
    /// invalid constraint leaves the tree unchanged. Returns the terminal nodes the
    /// pattern resolves to: more than one when it contains pipe alternatives or
    /// optional segments.
    ///
    /// # Errors
    ///
    /// [`RouteError::InvalidConstraint`] if a `(...)` segment fails to compile, or
    /// [`RouteError::ShadowedOptional`] if an unconstrained optional parameter is
    /// followed by a required parameter it would always capture.
    pub fn establish(&mut self, pattern: &str) -> Result<Vec<NodeId>, RouteError> {
        let fragments = pattern
            .split('/')
            .map(|fragment| {
                parse_fragment(fragment).map_err(|source| RouteError::InvalidConstraint {
                    pattern: pattern.to_string(),
                    fragment: fragment.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<Fragment>, RouteError>>()?;

        // With the optional left out, the next parameter would hang after the
        // optional's own node in the same list, and that node accepts everything.
        for (pos, pair) in fragments.windows(2).enumerate() {
            let (current, next) = (&pair[0], &pair[1]);
            if current.is_optional()
                && matches!(current.segment(), Segment::Wildcard)
                && !next.is_optional()
                && !matches!(next.segment(), Segment::Literal(_))
            {
                return Err(RouteError::ShadowedOptional {
                    pattern: pattern.to_string(),
                    fragment: pattern.split('/').nth(pos).unwrap_or_default().to_string(),
                });
            }
        }

        let mut terminals = Vec::new();
        self.define(&fragments, NodeId::ROOT, &mut terminals);
        Ok(terminals)
    }

    fn define(&mut self, fragments: &[Fragment], root: NodeId, terminals: &mut Vec<NodeId>) {
        let Some((fragment, rest)) = fragments.split_first() else {
            return;
        };

        for candidate in self.find_or_insert(root, fragment) {
            if rest.is_empty() {
                push_unique(terminals, candidate);
            } else {
                self.define(rest, candidate, terminals);
            }
        }

        // Elided variant is compiled after the full one so the present segment keeps
        // precedence among list siblings.
        if fragment.is_optional() {
            if rest.is_empty() {
                if self.is_leading_slash(root) {
                    // `/:page?` without the page is `/`, which splits as `["", ""]`
                    let index = self.literal_child_or_insert(root, "", None);
                    push_unique(terminals, index);
                } else if root != NodeId::ROOT {
                    push_unique(terminals, root);
                }
            } else {
                self.define(rest, root, terminals);
            }
        }
    }

    fn find_or_insert(&mut self, root: NodeId, fragment: &Fragment) -> SmallVec<[NodeId; 4]> {
        let mut found = SmallVec::new();

        if let Segment::Literal(keys) = fragment.segment() {
            for key in keys {
                found.push(self.literal_child_or_insert(root, key, fragment.shared_name()));
            }
            return found;
        }

        let existing = self.nodes[root.0].children.iter().copied().find(|&child| {
            let node = &self.nodes[child.0];
            node.name.as_deref() == fragment.name()
                && same_constraint(node.pattern.as_ref(), fragment.pattern())
        });

        let id = match existing {
            Some(id) => id,
            None => {
                let id = self.push_node(Node::new(
                    fragment.shared_name().cloned(),
                    None,
                    fragment.pattern().cloned(),
                    Some(root),
                ));
                self.nodes[root.0].children.push(id);
                id
            }
        };
        found.push(id);
        found
    }

    fn literal_child_or_insert(
        &mut self,
        root: NodeId,
        key: &str,
        name: Option<&Arc<str>>,
    ) -> NodeId {
        if let Some(existing) = self.nodes[root.0].literal_children.get(key).copied() {
            return existing;
        }
        let id = self.push_node(Node::new(
            name.cloned(),
            Some(key.to_string()),
            None,
            Some(root),
        ));
        self.nodes[root.0].literal_children.insert(key.to_string(), id);
        id
    }

    // The `""` literal every absolute pattern starts with
    fn is_leading_slash(&self, id: NodeId) -> bool {
        let node = &self.nodes[id.0];
        node.parent == Some(NodeId::ROOT) && node.key.as_deref() == Some("")
    }

    fn push_node(&mut self, node: Node<H>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Match a concrete request path against the tree.
    ///
    /// Returns the node reached when the last fragment is consumed together with
    /// the parameters bound along the way, or `None` when some fragment has no
    /// accepting child.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(NodeId, ParamVec)> {
        let mut current = NodeId::ROOT;
        let mut params = ParamVec::new();
        let mut fragments = path.split('/').peekable();

        while let Some(fragment) = fragments.next() {
            let node = &self.nodes[current.0];
            let next = node.literal_child(fragment).or_else(|| {
                node.children
                    .iter()
                    .copied()
                    .find(|&child| self.nodes[child.0].accepts(fragment))
            })?;

            if let Some(name) = &self.nodes[next.0].name {
                params.push((Arc::clone(name), fragment.to_string()));
            }

            if fragments.peek().is_none() {
                return Some((next, params));
            }
            current = next;
        }

        None
    }
}

impl<H: Clone> MatchTree<H> {
    /// Compile `pattern` and attach `method` and `handlers` to every terminal node.
    ///
    /// The method is recorded once per node; handlers are appended on every call,
    /// so registering the same pattern and method twice doubles its handler list.
    ///
    /// # Errors
    ///
    /// [`RouteError::EmptyMethod`] for a blank method, or any error from
    /// [`MatchTree::establish`].
    pub fn register(
        &mut self,
        method: &str,
        pattern: &str,
        handlers: &[H],
    ) -> Result<Vec<NodeId>, RouteError> {
        let method = method.trim();
        if method.is_empty() {
            return Err(RouteError::EmptyMethod {
                pattern: pattern.to_string(),
            });
        }

        let terminals = self.establish(pattern)?;
        for &id in &terminals {
            let node = &mut self.nodes[id.0];
            if !node.methods.iter().any(|m| m == method) {
                node.methods.push(method.to_string());
            }
            node.handlers
                .entry(method.to_string())
                .or_default()
                .extend_from_slice(handlers);
        }
        Ok(terminals)
    }
}
