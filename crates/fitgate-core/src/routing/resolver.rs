//! Route resolution over a [`RouteTree`].
//!
//! Candidates are ranked per segment: static beats `:param`, which beats
//! `*`. Among equal scores the first declared route wins.

use std::collections::BTreeMap;

use serde::Serialize;

use super::model::{Layout, RouteElement, RouteNode, RouteSegment, RouteTree, View};
use crate::error::{FitgateError, Result};

/// Redirect hops followed by [`navigate`] before giving up.
pub const MAX_REDIRECTS: usize = 8;

const STATIC_SCORE: i32 = 10;
const PARAM_SCORE: i32 = 3;
const INDEX_SCORE: i32 = 2;
const CATCH_ALL_SCORE: i32 = -2;

/// A path that renders a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteMatch {
    pub location: String,
    pub layout: Option<Layout>,
    pub view: View,
    pub params: BTreeMap<String, String>,
}

impl RouteMatch {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Outcome of resolving one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Resolution {
    Render(RouteMatch),
    Redirect { from: String, to: String },
    Unmatched { location: String },
}

/// Outcome of following redirects until a view renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    /// Final location after all redirects.
    pub location: String,
    pub matched: RouteMatch,
    /// Locations that were replaced on the way, in order.
    pub redirects: Vec<String>,
}

impl Navigation {
    pub fn was_redirected(&self) -> bool {
        !self.redirects.is_empty()
    }
}

/// Reduces a URL to a canonical path: query and fragment dropped, repeated
/// and trailing slashes removed, leading slash ensured.
pub fn normalize_path(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

/// Resolves a single location without following redirects.
pub fn resolve(tree: &RouteTree, url: &str) -> Resolution {
    let location = normalize_path(url);
    let segments: Vec<&str> = location.split('/').filter(|s| !s.is_empty()).collect();

    let Some(found) = match_node(tree.root(), &segments) else {
        return Resolution::Unmatched { location };
    };

    let layout = found.chain.iter().rev().find_map(|node| match node.element {
        RouteElement::Layout(layout) => Some(layout),
        _ => None,
    });

    // A non-empty match always ends in a node.
    let Some(leaf) = found.chain.last() else {
        return Resolution::Unmatched { location };
    };

    match &leaf.element {
        RouteElement::View { view } => Resolution::Render(RouteMatch {
            location,
            layout,
            view: *view,
            params: found.params,
        }),
        RouteElement::Redirect { to } => Resolution::Redirect {
            from: location,
            to: normalize_path(to),
        },
        RouteElement::Layout(_) => Resolution::Unmatched { location },
    }
}

/// Resolves `url`, following redirects with replace semantics.
///
/// # Errors
///
/// [`FitgateError::NoRoute`] when nothing matches and
/// [`FitgateError::RedirectLoop`] after [`MAX_REDIRECTS`] hops.
pub fn navigate(tree: &RouteTree, url: &str) -> Result<Navigation> {
    let mut location = normalize_path(url);
    let mut redirects = Vec::new();

    for _ in 0..=MAX_REDIRECTS {
        match resolve(tree, &location) {
            Resolution::Render(matched) => {
                return Ok(Navigation {
                    location: matched.location.clone(),
                    matched,
                    redirects,
                });
            }
            Resolution::Redirect { from, to } => {
                tracing::trace!("[Router] {} -> {}", from, to);
                redirects.push(from);
                location = to;
            }
            Resolution::Unmatched { location } => return Err(FitgateError::NoRoute(location)),
        }
    }

    Err(FitgateError::RedirectLoop {
        path: normalize_path(url),
        hops: redirects.len(),
    })
}

struct Found<'a> {
    chain: Vec<&'a RouteNode>,
    params: BTreeMap<String, String>,
    score: i32,
}

/// Matches `node` against the remaining path segments.
fn match_node<'a>(node: &'a RouteNode, segments: &[&str]) -> Option<Found<'a>> {
    let mut params = BTreeMap::new();
    let mut score = 0;
    let mut consumed = 0;

    if node.index {
        if !segments.is_empty() {
            return None;
        }
        score += INDEX_SCORE;
    }

    for pattern in &node.pattern.segments {
        match pattern {
            RouteSegment::Static(expected) => {
                let actual = segments.get(consumed)?;
                if !actual.eq_ignore_ascii_case(expected) {
                    return None;
                }
                score += STATIC_SCORE;
                consumed += 1;
            }
            RouteSegment::Param(name) => {
                let actual = segments.get(consumed)?;
                params.insert(name.clone(), (*actual).to_string());
                score += PARAM_SCORE;
                consumed += 1;
            }
            RouteSegment::CatchAll => {
                params.insert("*".to_string(), segments[consumed..].join("/"));
                score += CATCH_ALL_SCORE;
                consumed = segments.len();
            }
        }
    }

    let remaining = &segments[consumed..];

    if node.children.is_empty() {
        if !remaining.is_empty() {
            return None;
        }
        return Some(Found {
            chain: vec![node],
            params,
            score,
        });
    }

    let mut best: Option<Found<'a>> = None;
    for child in &node.children {
        if let Some(candidate) = match_node(child, remaining)
            && best.as_ref().is_none_or(|b| candidate.score > b.score)
        {
            best = Some(candidate);
        }
    }

    let child = best?;
    let mut chain = vec![node];
    chain.extend(child.chain);
    params.extend(child.params);
    Some(Found {
        chain,
        params,
        score: score + child.score,
    })
}
