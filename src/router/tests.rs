#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::{parse_fragment, Fragment, MatchTree, NodeId, RouteError, Router, Segment};
use std::io::Write;
use std::sync::{Arc, Mutex};

fn tree_with(patterns: &[&str]) -> MatchTree<&'static str> {
    let mut tree = MatchTree::new();
    for pattern in patterns {
        tree.register("GET", pattern, &[]).expect("register");
    }
    tree
}

// ---------------------------------------------------------------------------
// Fragment classification
// ---------------------------------------------------------------------------

#[test]
fn test_fragment_plain_slug_is_literal() {
    for slug in ["users", "v1.2", "a-b_c", ""] {
        let f = parse_fragment(slug).unwrap();
        assert_eq!(f.keys(), &[slug.to_string()]);
        assert!(f.name().is_none());
        assert!(f.pattern().is_none());
        assert!(!f.is_optional());
    }
}

#[test]
fn test_fragment_pipe_run_expands_keys_in_order() {
    let f = parse_fragment("users|posts|users").unwrap();
    assert_eq!(f.keys(), &["users".to_string(), "posts".to_string()]);
    assert!(f.name().is_none());
}

#[test]
fn test_fragment_named_wildcard() {
    let f = parse_fragment(":id").unwrap();
    assert_eq!(f.name(), Some("id"));
    assert!(matches!(f.segment(), Segment::Wildcard));
    assert!(!f.is_optional());
}

#[test]
fn test_fragment_optional_wildcard() {
    let f = parse_fragment(":page?").unwrap();
    assert_eq!(f.name(), Some("page"));
    assert!(matches!(f.segment(), Segment::Wildcard));
    assert!(f.is_optional());
}

#[test]
fn test_fragment_unnamed_regex_is_anchored() {
    let f = parse_fragment("([0-9]{1})").unwrap();
    let re = f.pattern().expect("constraint");
    assert_eq!(re.as_str(), "^([0-9]{1})$");
    assert!(re.is_match("7"));
    assert!(!re.is_match("77"));
    assert!(f.name().is_none());
}

#[test]
fn test_fragment_named_regex() {
    let f = parse_fragment(":id([0-9]+)").unwrap();
    assert_eq!(f.name(), Some("id"));
    assert!(f.pattern().unwrap().is_match("123"));
}

#[test]
fn test_fragment_parenthesised_alternatives_are_literals() {
    let f = parse_fragment("(a|b)").unwrap();
    assert_eq!(f.keys(), &["a".to_string(), "b".to_string()]);

    let named = parse_fragment(":kind(cats|dogs)").unwrap();
    assert_eq!(named.name(), Some("kind"));
    assert_eq!(named.keys(), &["cats".to_string(), "dogs".to_string()]);
}

#[test]
fn test_fragment_unrecognised_text_is_generic_wildcard() {
    let f = parse_fragment("*").unwrap();
    assert!(f.name().is_none());
    assert!(f.keys().is_empty());
    assert!(f.pattern().is_none());
}

#[test]
fn test_fragment_bad_regex_is_error() {
    assert!(parse_fragment(":id([0-9)").is_err());
}

#[test]
fn test_fragment_group_alternation_is_fully_anchored() {
    let f = parse_fragment(":x(a)|(b)").unwrap();
    let re = f.pattern().unwrap();
    assert_eq!(re.as_str(), "^((a)|(b))$");
    assert!(re.is_match("a"));
    assert!(re.is_match("b"));
    assert!(!re.is_match("ab"));
    assert!(!re.is_match("xb"));
}

#[test]
fn test_fragment_balanced_group_keeps_single_wrap() {
    let f = parse_fragment(r"(\((x|[()])+)").unwrap();
    assert_eq!(f.pattern().unwrap().as_str(), r"^(\((x|[()])+)$");
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn parse_with_logs(fragment: &str) -> (Fragment, String) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let parsed = tracing::subscriber::with_default(subscriber, || parse_fragment(fragment));
    let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    (parsed.unwrap(), output)
}

#[test]
fn test_fragment_malformed_group_is_wildcard_with_warning() {
    for text in [":id([0-9]+", "([0-9]+)?"] {
        let (f, logs) = parse_with_logs(text);
        assert!(matches!(f.segment(), Segment::Wildcard), "{text}");
        assert!(logs.contains("treated as a wildcard"), "{text}: {logs}");
        assert!(logs.contains(text), "{text}: {logs}");
    }

    let (_, logs) = parse_with_logs(":id([0-9]+)");
    assert!(logs.is_empty(), "{logs}");
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[test]
fn test_literal_pattern_matches_with_no_params() {
    let tree = tree_with(&["/api/v1/users"]);
    let (node, params) = tree.match_path("/api/v1/users").unwrap();
    assert_eq!(tree.node(node).unwrap().key(), Some("users"));
    assert!(params.is_empty());
}

#[test]
fn test_pipe_alternatives_are_siblings() {
    let mut tree: MatchTree<&str> = MatchTree::new();
    let terminals = tree.register("GET", "/api/v1/users|posts", &["h"]).unwrap();
    assert_eq!(terminals.len(), 2);

    let (users, _) = tree.match_path("/api/v1/users").unwrap();
    let (posts, _) = tree.match_path("/api/v1/posts").unwrap();
    let users = tree.node(users).unwrap();
    let posts = tree.node(posts).unwrap();

    assert_eq!(users.key(), Some("users"));
    assert_eq!(posts.key(), Some("posts"));
    assert_eq!(users.parent(), posts.parent());

    let parent = tree.node(users.parent().unwrap()).unwrap();
    assert_eq!(parent.key(), Some("v1"));
    assert_eq!(users.handlers("GET"), &["h"]);
    assert_eq!(posts.handlers("GET"), &["h"]);
}

#[test]
fn test_pipe_fan_out_collects_every_terminal() {
    let mut tree: MatchTree<&str> = MatchTree::new();
    let terminals = tree.register("GET", "/a|b/x|y", &["h"]).unwrap();
    assert_eq!(terminals.len(), 4);
    for path in ["/a/x", "/a/y", "/b/x", "/b/y"] {
        let (node, _) = tree.match_path(path).unwrap();
        assert!(terminals.contains(&node), "{path} should be terminal");
        assert_eq!(tree.node(node).unwrap().handlers("GET"), &["h"]);
    }
}

#[test]
fn test_repeat_registration_is_additive() {
    let mut tree: MatchTree<&str> = MatchTree::new();
    let first = tree.register("GET", "/api/v1/users/:id", &["a"]).unwrap();
    let shape = tree.len();
    let second = tree.register("GET", "/api/v1/users/:id", &["b"]).unwrap();

    assert_eq!(first, second);
    assert_eq!(tree.len(), shape);
    let node = tree.node(first[0]).unwrap();
    assert_eq!(node.handlers("GET"), &["a", "b"]);
    assert_eq!(node.methods(), &["GET".to_string()]);
}

#[test]
fn test_repeat_unnamed_regex_reuses_node() {
    let mut tree: MatchTree<&str> = MatchTree::new();
    tree.register("GET", "/users/([0-9]+)", &["a"]).unwrap();
    let shape = tree.len();
    tree.register("GET", "/users/([0-9]+)", &["b"]).unwrap();
    assert_eq!(tree.len(), shape);
}

#[test]
fn test_same_name_different_constraint_is_new_sibling() {
    let mut tree: MatchTree<&str> = MatchTree::new();
    let digits = tree.register("GET", "/items/:id([0-9]+)", &["num"]).unwrap();
    let words = tree.register("GET", "/items/:id([a-z]+)", &["word"]).unwrap();
    assert_ne!(digits, words);

    let (node, _) = tree.match_path("/items/abc").unwrap();
    assert_eq!(tree.node(node).unwrap().handlers("GET"), &["word"]);
    let (node, _) = tree.match_path("/items/123").unwrap();
    assert_eq!(tree.node(node).unwrap().handlers("GET"), &["num"]);
}

#[test]
fn test_methods_accumulate_without_duplicates() {
    let mut tree: MatchTree<&str> = MatchTree::new();
    tree.register("GET", "/things", &["list"]).unwrap();
    tree.register("POST", "/things", &["create"]).unwrap();
    let ids = tree.register("GET", "/things", &["list2"]).unwrap();

    let node = tree.node(ids[0]).unwrap();
    assert_eq!(node.methods(), &["GET".to_string(), "POST".to_string()]);
    assert_eq!(node.handlers("GET"), &["list", "list2"]);
    assert_eq!(node.handlers("POST"), &["create"]);
    assert!(node.handlers("DELETE").is_empty());
}

#[test]
fn test_invalid_constraint_creates_no_nodes() {
    let mut tree: MatchTree<&str> = MatchTree::new();
    let err = tree
        .register("GET", "/fresh/branch/:id([0-9)", &["h"])
        .unwrap_err();
    assert!(matches!(err, RouteError::InvalidConstraint { ref fragment, .. } if fragment == ":id([0-9)"));
    assert!(tree.is_empty());
    assert!(tree.match_path("/fresh/branch").is_none());
}

#[test]
fn test_blank_method_is_rejected() {
    let mut tree: MatchTree<&str> = MatchTree::new();
    let err = tree.register("  ", "/x", &["h"]).unwrap_err();
    assert!(matches!(err, RouteError::EmptyMethod { .. }));
    assert!(tree.is_empty());
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[test]
fn test_wildcard_binds_param() {
    let tree = tree_with(&["/api/v1/users/:id"]);
    let (node, params) = tree.match_path("/api/v1/users/1").unwrap();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].0.as_ref(), "id");
    assert_eq!(params[0].1, "1");
    assert_eq!(tree.node(node).unwrap().name(), Some("id"));
}

#[test]
fn test_wildcard_rejects_empty_fragment() {
    let tree = tree_with(&["/users/:id"]);
    assert!(tree.match_path("/users/").is_none());
}

#[test]
fn test_unnamed_regex_match() {
    let tree = tree_with(&["/api/v1/users/([0-9]{1})"]);
    let (_, params) = tree.match_path("/api/v1/users/1").unwrap();
    assert!(params.is_empty());
    assert!(tree.match_path("/api/v1/users/ab").is_none());
}

#[test]
fn test_named_regex_match() {
    let tree = tree_with(&["/api/v1/users/:id([0-9]{1})"]);
    let (node, params) = tree.match_path("/api/v1/users/1").unwrap();
    assert_eq!(params[0].1, "1");
    assert_eq!(tree.node(node).unwrap().name(), Some("id"));
    assert!(tree.match_path("/api/v1/users/12").is_none());
}

#[test]
fn test_named_literal_alternatives_bind_param() {
    let tree = tree_with(&["/pets/:kind(cats|dogs)/list"]);
    let (_, params) = tree.match_path("/pets/dogs/list").unwrap();
    assert_eq!(params[0].0.as_ref(), "kind");
    assert_eq!(params[0].1, "dogs");
    assert!(tree.match_path("/pets/birds/list").is_none());
}

#[test]
fn test_optional_param_matches_with_and_without_segment() {
    let mut tree: MatchTree<&str> = MatchTree::new();
    let terminals = tree
        .register("GET", "/test/:required/:optional?", &["h"])
        .unwrap();
    assert_eq!(terminals.len(), 2);

    let (full, params) = tree.match_path("/test/one/two").unwrap();
    assert_eq!(params.len(), 2);
    assert_eq!(params[1].0.as_ref(), "optional");
    assert_eq!(params[1].1, "two");
    assert_eq!(tree.node(full).unwrap().handlers("GET"), &["h"]);

    let (short, params) = tree.match_path("/test/one").unwrap();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].0.as_ref(), "required");
    assert_eq!(tree.node(short).unwrap().handlers("GET"), &["h"]);
}

#[test]
fn test_optional_param_in_the_middle() {
    let mut tree: MatchTree<&str> = MatchTree::new();
    tree.register("GET", "/docs/:lang?/index", &["h"]).unwrap();

    let (_, params) = tree.match_path("/docs/en/index").unwrap();
    assert_eq!(params[0].1, "en");
    let (node, params) = tree.match_path("/docs/index").unwrap();
    assert!(params.is_empty());
    assert_eq!(tree.node(node).unwrap().handlers("GET"), &["h"]);
}

#[test]
fn test_optional_directly_under_leading_slash() {
    let mut tree: MatchTree<&str> = MatchTree::new();
    tree.register("GET", "/:page?", &["h"]).unwrap();

    let (node, params) = tree.match_path("/home").unwrap();
    assert_eq!(params[0].1, "home");
    assert_eq!(tree.node(node).unwrap().handlers("GET"), &["h"]);

    let (node, params) = tree.match_path("/").unwrap();
    assert!(params.is_empty());
    assert_eq!(tree.node(node).unwrap().handlers("GET"), &["h"]);

    // same node a plain `/` registration uses
    let registered = tree.register("POST", "/", &["p"]).unwrap();
    assert_eq!(registered, vec![node]);
}

#[test]
fn test_optional_followed_by_parameter_is_rejected() {
    let mut tree: MatchTree<&str> = MatchTree::new();
    let err = tree
        .register("GET", "/docs/:lang?/:page", &["h"])
        .unwrap_err();
    assert!(
        matches!(err, RouteError::ShadowedOptional { ref fragment, .. } if fragment == ":lang?")
    );
    assert!(tree.is_empty());

    let err = tree
        .register("GET", "/docs/:lang?/:page([a-z]+)", &["h"])
        .unwrap_err();
    assert!(matches!(err, RouteError::ShadowedOptional { .. }));
}

#[test]
fn test_constrained_or_trailing_optional_before_parameter_is_accepted() {
    let mut tree: MatchTree<&str> = MatchTree::new();
    tree.register("GET", "/docs/:lang(en|fr)?/:page", &["h"])
        .unwrap();
    let (node, params) = tree.match_path("/docs/intro").unwrap();
    assert_eq!(params[0].0.as_ref(), "page");
    assert_eq!(tree.node(node).unwrap().handlers("GET"), &["h"]);

    tree.register("GET", "/feed/:a?/:b?", &["f"]).unwrap();
    tree.register("GET", "/blog/:slug?/comments", &["c"]).unwrap();
    let (node, _) = tree.match_path("/blog/comments").unwrap();
    assert_eq!(tree.node(node).unwrap().handlers("GET"), &["c"]);
}

#[test]
fn test_literal_preferred_over_wildcard() {
    let tree = tree_with(&["/users/:id", "/users/me"]);
    let (node, params) = tree.match_path("/users/me").unwrap();
    assert_eq!(tree.node(node).unwrap().key(), Some("me"));
    assert!(params.is_empty());
}

#[test]
fn test_first_registered_list_child_wins() {
    let mut tree: MatchTree<&str> = MatchTree::new();
    tree.register("GET", "/files/:name", &["by_name"]).unwrap();
    tree.register("GET", "/files/:id([0-9]+)", &["by_id"]).unwrap();

    let (node, params) = tree.match_path("/files/42").unwrap();
    assert_eq!(tree.node(node).unwrap().handlers("GET"), &["by_name"]);
    assert_eq!(params[0].0.as_ref(), "name");
}

#[test]
fn test_no_backtracking_after_commit() {
    let mut tree: MatchTree<&str> = MatchTree::new();
    tree.register("GET", "/a/b/c", &["literal"]).unwrap();
    tree.register("GET", "/a/:x/d", &["wild"]).unwrap();

    assert!(tree.match_path("/a/b/c").is_some());
    assert!(tree.match_path("/a/z/d").is_some());
    // `b` commits to the literal child, which has no `d` below it.
    assert!(tree.match_path("/a/b/d").is_none());
}

#[test]
fn test_intermediate_node_matches_without_methods() {
    let tree = tree_with(&["/api/v1/users"]);
    let (node, _) = tree.match_path("/api/v1").unwrap();
    assert!(!tree.node(node).unwrap().is_terminal());
}

#[test]
fn test_unknown_path_is_no_match() {
    let tree = tree_with(&["/api/v1/users"]);
    assert!(tree.match_path("/api/v2/users").is_none());
    assert!(tree.match_path("/api/v1/users/extra").is_none());
    assert!(tree.match_path("api/v1/users").is_none());
}

#[test]
fn test_root_is_never_a_match() {
    let tree: MatchTree<&str> = MatchTree::new();
    assert!(tree.match_path("/").is_none());
    assert!(tree.node(NodeId::ROOT).is_some());
}

#[test]
fn test_path_of_walks_parents() {
    let mut tree: MatchTree<&str> = MatchTree::new();
    let ids = tree
        .register("GET", "/api/:version/users/:id([0-9]+)", &[])
        .unwrap();
    assert_eq!(tree.path_of(ids[0]), "/api/:version/users/:id([0-9]+)");
}

// ---------------------------------------------------------------------------
// Router facade
// ---------------------------------------------------------------------------

#[test]
fn test_router_route_and_params() {
    let mut router: Router<&str> = Router::new();
    router
        .register("GET", "/org/:id/team/:team/user/:id", &["h"])
        .unwrap();

    let m = router.route("/org/1/team/red/user/9").unwrap();
    assert_eq!(m.get_path_param("id"), Some("9"));
    assert_eq!(m.get_path_param("team"), Some("red"));
    let map = m.path_params_map();
    assert_eq!(map.get("id").map(String::as_str), Some("9"));
    assert_eq!(map.len(), 2);
}

#[test]
fn test_router_records_registrations() {
    let mut router: Router<&str> = Router::new();
    router.register("get ", "/a", &["h"]).unwrap();
    assert!(router.register("GET", "/b/(x[)", &["h"]).is_err());
    assert_eq!(
        router.registered_patterns(),
        &[("get".to_string(), "/a".to_string())]
    );
}

#[test]
fn test_router_dump_routes() {
    let mut router: Router<&str> = Router::new();
    router.register("GET", "/users/:id", &["a", "b"]).unwrap();
    router.register("DELETE", "/users/:id", &["c"]).unwrap();
    let dump = router.dump_routes();
    assert_eq!(dump.trim(), "/users/:id [GET,DELETE] (3 handlers)");
}
