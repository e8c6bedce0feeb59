//! Segment trie backing each per-method route table.
//!
//! Every node is one path segment. Children are classified by how they
//! match:
//!
//! | kind       | syntax          | stored as                      |
//! |------------|-----------------|--------------------------------|
//! | static     | `users`         | `children[literal]`            |
//! | regex      | `:id([0-9]+)`   | `regex_child` (at most one)    |
//! | parameter  | `:id`           | `param_child` (at most one)    |
//! | wildcard   | `*`             | `wildcard_child` (at most one) |
//!
//! A position holds at most one of regex / parameter / wildcard. Mixing them
//! is rejected at registration time, which keeps resolution a single
//! non-backtracking walk: static, then regex, then parameter, then wildcard.

use std::collections::HashMap;
use std::fmt;

use percent_encoding::percent_decode_str;
use regex_lite::Regex;

use crate::error::RouteError;

/// How a trie node matches its segment.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeKind {
    Static,
    Regex,
    Param,
    Wildcard,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Static   => "static",
            Self::Regex    => "regex",
            Self::Param    => "parameter",
            Self::Wildcard => "wildcard",
        })
    }
}

pub(crate) struct Node<T> {
    kind: NodeKind,
    segment: String,
    /// The full registered route, set together with `value`.
    route: Option<String>,
    value: Option<T>,
    param_name: Option<String>,
    pattern: Option<Regex>,
    children: HashMap<String, Node<T>>,
    regex_child: Option<Box<Node<T>>>,
    param_child: Option<Box<Node<T>>>,
    wildcard_child: Option<Box<Node<T>>>,
}

/// Outcome of a successful walk. `node` may carry no value: that is an
/// intermediate segment, and callers treat it as a miss.
pub(crate) struct Resolved<'n, T> {
    pub(crate) node: &'n Node<T>,
    pub(crate) params: HashMap<String, String>,
}

// ── Segment parsing ───────────────────────────────────────────────────────────

struct Segment<'p> {
    raw: &'p str,
    kind: SegmentKind<'p>,
}

enum SegmentKind<'p> {
    Static,
    Param { name: &'p str },
    Regex { name: &'p str, pattern: Regex },
    Wildcard,
}

/// Validates `route` and classifies every segment before the tree is touched,
/// so a rejected route never leaves half-built branches behind.
fn parse_route(route: &str) -> Result<Vec<Segment<'_>>, RouteError> {
    if route.is_empty() {
        return Err(RouteError::EmptyPath);
    }
    if !route.starts_with('/') {
        return Err(RouteError::MissingLeadingSlash(route.to_owned()));
    }
    if route == "/" {
        return Ok(Vec::new());
    }
    if route.ends_with('/') {
        return Err(RouteError::TrailingSlash(route.to_owned()));
    }

    let raw: Vec<&str> = route[1..].split('/').collect();
    let last = raw.len() - 1;

    raw.into_iter()
        .enumerate()
        .map(|(i, seg)| {
            let kind = if seg.is_empty() {
                return Err(RouteError::EmptySegment(route.to_owned()));
            } else if seg == "*" {
                if i != last {
                    return Err(RouteError::WildcardNotLast { route: route.to_owned() });
                }
                SegmentKind::Wildcard
            } else if let Some(param) = seg.strip_prefix(':') {
                parse_param(route, seg, param)?
            } else {
                SegmentKind::Static
            };
            Ok(Segment { raw: seg, kind })
        })
        .collect()
}

/// `:name` or `:name(pattern)`. The pattern runs from the first `(` to the
/// trailing `)`; without a trailing `)` the whole thing is a plain name.
fn parse_param<'p>(
    route: &str,
    raw: &'p str,
    param: &'p str,
) -> Result<SegmentKind<'p>, RouteError> {
    let (name, pattern) = match param.split_once('(') {
        Some((name, rest)) if rest.ends_with(')') => (name, Some(&rest[..rest.len() - 1])),
        _ => (param, None),
    };

    if name.is_empty() {
        return Err(RouteError::UnnamedParam {
            route: route.to_owned(),
            segment: raw.to_owned(),
        });
    }

    match pattern {
        None => Ok(SegmentKind::Param { name }),
        Some(pattern) => {
            let pattern = Regex::new(pattern).map_err(|source| RouteError::InvalidPattern {
                route: route.to_owned(),
                segment: raw.to_owned(),
                source,
            })?;
            Ok(SegmentKind::Regex { name, pattern })
        }
    }
}

// ── Node ──────────────────────────────────────────────────────────────────────

impl<T> Node<T> {
    pub(crate) fn root() -> Self {
        Self::new(NodeKind::Static, "/", None, None)
    }

    fn new(kind: NodeKind, segment: &str, param_name: Option<&str>, pattern: Option<Regex>) -> Self {
        Self {
            kind,
            segment: segment.to_owned(),
            route: None,
            value: None,
            param_name: param_name.map(str::to_owned),
            pattern,
            children: HashMap::new(),
            regex_child: None,
            param_child: None,
            wildcard_child: None,
        }
    }

    pub(crate) fn route(&self) -> Option<&str> { self.route.as_deref() }
    pub(crate) fn value(&self) -> Option<&T> { self.value.as_ref() }

    /// Binds `value` to `route`, creating intermediate nodes on demand.
    pub(crate) fn insert(&mut self, route: &str, value: T) -> Result<(), RouteError> {
        let segments = parse_route(route)?;

        let mut node = self;
        for segment in segments {
            node = node.child_or_create(route, segment)?;
        }

        if node.value.is_some() {
            return Err(RouteError::Duplicate(route.to_owned()));
        }
        node.value = Some(value);
        node.route = Some(route.to_owned());
        Ok(())
    }

    fn child_or_create(&mut self, route: &str, segment: Segment<'_>) -> Result<&mut Node<T>, RouteError> {
        let raw = segment.raw;
        match segment.kind {
            SegmentKind::Static => Ok(self
                .children
                .entry(raw.to_owned())
                .or_insert_with(|| Node::new(NodeKind::Static, raw, None, None))),

            SegmentKind::Wildcard => {
                if let Some(existing) = self.param_child.as_deref().or(self.regex_child.as_deref()) {
                    return Err(existing.conflict(route, raw));
                }
                Ok(&mut **self
                    .wildcard_child
                    .get_or_insert_with(|| Box::new(Node::new(NodeKind::Wildcard, raw, None, None))))
            }

            SegmentKind::Param { name } => {
                if let Some(existing) = self.wildcard_child.as_deref().or(self.regex_child.as_deref()) {
                    return Err(existing.conflict(route, raw));
                }
                if let Some(existing) = self.param_child.as_deref() {
                    if existing.param_name.as_deref() != Some(name) {
                        return Err(existing.conflict(route, raw));
                    }
                }
                Ok(&mut **self
                    .param_child
                    .get_or_insert_with(|| Box::new(Node::new(NodeKind::Param, raw, Some(name), None))))
            }

            SegmentKind::Regex { name, pattern } => {
                if let Some(existing) = self.wildcard_child.as_deref().or(self.param_child.as_deref()) {
                    return Err(existing.conflict(route, raw));
                }
                if let Some(existing) = self.regex_child.as_deref() {
                    let same_name = existing.param_name.as_deref() == Some(name);
                    let same_pattern = existing.pattern.as_ref().map(Regex::as_str) == Some(pattern.as_str());
                    if !(same_name && same_pattern) {
                        return Err(existing.conflict(route, raw));
                    }
                }
                Ok(&mut **self.regex_child.get_or_insert_with(|| {
                    Box::new(Node::new(NodeKind::Regex, raw, Some(name), Some(pattern)))
                }))
            }
        }
    }

    fn conflict(&self, route: &str, segment: &str) -> RouteError {
        RouteError::Conflict {
            route: route.to_owned(),
            segment: segment.to_owned(),
            existing: self.kind,
            existing_segment: self.segment.clone(),
        }
    }

    /// Walks `path` segment by segment. Empty segments are skipped, so
    /// leading, trailing and doubled slashes are ignored. Each segment is
    /// percent-decoded before it is matched or captured; an encoded `%2F`
    /// stays inside its segment.
    ///
    /// No backtracking: once a child is chosen at one level, a miss further
    /// down is final even if a sibling of that child would have matched.
    pub(crate) fn resolve(&self, path: &str) -> Option<Resolved<'_, T>> {
        let mut node = self;
        let mut params = HashMap::new();

        for raw in path.split('/').filter(|s| !s.is_empty()) {
            let segment = percent_decode_str(raw).decode_utf8_lossy();
            let child = node.child_of(&segment)?;
            if child.kind == NodeKind::Wildcard {
                // `*` swallows this segment and everything after it.
                return Some(Resolved { node: child, params });
            }
            if let Some(name) = &child.param_name {
                params.insert(name.clone(), segment.into_owned());
            }
            node = child;
        }

        Some(Resolved { node, params })
    }

    fn child_of(&self, segment: &str) -> Option<&Node<T>> {
        if let Some(child) = self.children.get(segment) {
            return Some(child);
        }
        if let Some(child) = self.regex_child.as_deref() {
            if child.pattern.as_ref().is_some_and(|re| re.is_match(segment)) {
                return Some(child);
            }
        }
        self.param_child.as_deref().or(self.wildcard_child.as_deref())
    }
}
