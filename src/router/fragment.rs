//! Fragment classification.
//!
//! A route pattern is compiled one `/`-delimited segment at a time. Each segment is
//! classified into a [`Segment`] that decides how the tree node built for it will
//! match incoming path fragments:
//!
//! | Pattern segment | Classification |
//! |---|---|
//! | `users`, `v1.2`, `a-b`, `` (empty) | [`Segment::Literal`] with one key |
//! | `users\|posts` | [`Segment::Literal`] with one key per alternative |
//! | `:id` | [`Segment::Wildcard`] named `id` |
//! | `:id?` | as above, marked optional |
//! | `([0-9]+)` | [`Segment::Constrained`] by `^([0-9]+)$` |
//! | `:id([0-9]+)` | [`Segment::Constrained`] named `id` |
//! | `(a\|b)`, `:kind(a\|b)` | [`Segment::Literal`] with keys `a`, `b` |
//! | `(a)\|(b)` | [`Segment::Constrained`] by `^((a)\|(b))$` |
//! | anything else | [`Segment::Wildcard`], logged at `warn` |
//!
//! The classification regexes are fixed and compiled once per process. Only
//! user-supplied constraints are compiled per pattern, at registration time.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::warn;

// ASCII word characters; `\w` in the regex crate is Unicode-aware.
static SLUG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("slug regex is valid"));

static PIPED_SLUG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_.\-][A-Za-z0-9_.\-|]+[A-Za-z0-9_.\-]$")
        .expect("piped slug regex is valid")
});

static PARAM_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:([A-Za-z0-9_]+)").expect("param name regex is valid"));

static GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\((.+)\)$").expect("group regex is valid"));

/// How a single pattern segment matches incoming fragments.
#[derive(Debug, Clone)]
pub enum Segment {
    /// Matched by exact string equality against any of the keys.
    Literal(Vec<String>),
    /// Matched when the anchored regex accepts the whole fragment.
    Constrained(Regex),
    /// Matches any non-empty fragment.
    Wildcard,
}

/// One classified pattern segment.
#[derive(Debug, Clone)]
pub struct Fragment {
    name: Option<Arc<str>>,
    segment: Segment,
    optional: bool,
}

impl Fragment {
    /// Parameter name bound when this fragment matches, if any
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn shared_name(&self) -> Option<&Arc<str>> {
        self.name.as_ref()
    }

    /// The matching rule for this fragment
    #[must_use]
    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    /// Whether the segment may be left out of a matching path entirely
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Literal keys this fragment matches exactly (empty for non-literal fragments)
    #[must_use]
    pub fn keys(&self) -> &[String] {
        match &self.segment {
            Segment::Literal(keys) => keys,
            Segment::Constrained(_) | Segment::Wildcard => &[],
        }
    }

    /// The compiled constraint, if this fragment has one
    #[must_use]
    pub fn pattern(&self) -> Option<&Regex> {
        match &self.segment {
            Segment::Constrained(re) => Some(re),
            Segment::Literal(_) | Segment::Wildcard => None,
        }
    }
}

fn is_valid_slug(slug: &str) -> bool {
    slug.is_empty() || SLUG.is_match(slug)
}

fn is_pipe_separated_slug(slug: &str) -> bool {
    PIPED_SLUG.is_match(slug)
}

fn split_keys(slugs: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for slug in slugs.split('|') {
        if !keys.iter().any(|k| k == slug) {
            keys.push(slug.to_string());
        }
    }
    keys
}

// Parentheses outside escapes and character classes never close below depth 0
// and end at depth 0.
fn has_balanced_parens(src: &str) -> bool {
    let mut depth = 0usize;
    let mut in_class = false;
    let mut chars = src.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '(' if !in_class => depth += 1,
            ')' if !in_class => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    depth == 0
}

/// Classify one pattern segment.
///
/// # Errors
///
/// Returns the regex compilation error when a `(...)` segment is not a valid
/// regular expression.
pub fn parse_fragment(fragment: &str) -> Result<Fragment, regex::Error> {
    if is_valid_slug(fragment) {
        return Ok(Fragment {
            name: None,
            segment: Segment::Literal(vec![fragment.to_string()]),
            optional: false,
        });
    }

    if is_pipe_separated_slug(fragment) {
        return Ok(Fragment {
            name: None,
            segment: Segment::Literal(split_keys(fragment)),
            optional: false,
        });
    }

    let mut rest = fragment;
    let mut name = None;
    if let Some(caps) = PARAM_NAME.captures(fragment) {
        if let (Some(whole), Some(ident)) = (caps.get(0), caps.get(1)) {
            name = Some(Arc::from(ident.as_str()));
            rest = &fragment[whole.end()..];
        }
    }

    let mut optional = false;
    if name.is_some() {
        if let Some(stripped) = rest.strip_suffix('?') {
            optional = true;
            rest = stripped;
        }
    }

    if rest.is_empty() {
        return Ok(Fragment {
            name,
            segment: Segment::Wildcard,
            optional,
        });
    }

    let segment = match GROUP.captures(rest).and_then(|caps| caps.get(1)) {
        Some(inner) if is_pipe_separated_slug(inner.as_str()) => {
            Segment::Literal(split_keys(inner.as_str()))
        }
        Some(inner) if has_balanced_parens(inner.as_str()) => {
            Segment::Constrained(Regex::new(&format!("^({})$", inner.as_str()))?)
        }
        // `(a)|(b)`: the outer parens are not one group, anchor the whole thing
        Some(_) => Segment::Constrained(Regex::new(&format!("^({})$", rest))?),
        None => {
            warn!(
                fragment = %fragment,
                "Unrecognised pattern segment treated as a wildcard"
            );
            Segment::Wildcard
        }
    };

    Ok(Fragment {
        name,
        segment,
        optional,
    })
}
