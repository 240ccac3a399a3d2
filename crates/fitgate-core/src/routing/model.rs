//! Declarative route tree types.

use serde::{Deserialize, Serialize};
use strum::Display;

/// Root of both route trees.
pub const ROOT_PATH: &str = "/";
/// Activities listing, the landing page of an authenticated session.
pub const ACTIVITIES_PATH: &str = "/activities";

/// Session intents a layout exposes to its views (login button, logout menu).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionAction {
    Login,
    Logout,
}

/// Layout a route tree renders its children under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Layout {
    /// Navigation bar plus logout control.
    Authenticated { on_logout: SessionAction },
    /// Bare outlet; the welcome view offers login.
    Unauthenticated { on_login: SessionAction },
}

impl Layout {
    /// The session action this layout offers.
    pub fn action(&self) -> SessionAction {
        match self {
            Self::Authenticated { on_logout } => *on_logout,
            Self::Unauthenticated { on_login } => *on_login,
        }
    }
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authenticated { .. } => write!(f, "authenticated"),
            Self::Unauthenticated { .. } => write!(f, "unauthenticated"),
        }
    }
}

/// Views a route can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum View {
    Welcome,
    ActivitiesList,
    ActivityDetail,
    NotFound,
}

/// What an authenticated session sees on a path no route declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedRoutePolicy {
    /// Render the not-found view at the requested location.
    #[default]
    NotFound,
    /// Replace the location with the activities listing.
    RedirectToActivities,
}

/// One segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteSegment {
    Static(String),
    /// `:name`
    Param(String),
    /// `*`
    CatchAll,
}

/// Relative path pattern such as `activities/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoutePattern {
    pub segments: Vec<RouteSegment>,
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s == "*" {
                    RouteSegment::CatchAll
                } else if let Some(name) = s.strip_prefix(':') {
                    RouteSegment::Param(name.to_string())
                } else {
                    RouteSegment::Static(s.to_string())
                }
            })
            .collect();
        Self { segments }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl std::fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .segments
            .iter()
            .map(|segment| match segment {
                RouteSegment::Static(s) => s.clone(),
                RouteSegment::Param(name) => format!(":{}", name),
                RouteSegment::CatchAll => "*".to_string(),
            })
            .collect();
        write!(f, "{}", parts.join("/"))
    }
}

/// What a matched route produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteElement {
    Layout(Layout),
    View { view: View },
    /// Replace the current location.
    Redirect { to: String },
}

/// A node of the route tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteNode {
    pub pattern: RoutePattern,
    /// Index routes match only when the parent path is matched exactly.
    #[serde(default)]
    pub index: bool,
    pub element: RouteElement,
    #[serde(default)]
    pub children: Vec<RouteNode>,
}

impl RouteNode {
    pub fn new(pattern: &str, element: RouteElement) -> Self {
        Self {
            pattern: RoutePattern::parse(pattern),
            index: false,
            element,
            children: Vec::new(),
        }
    }

    pub fn index(element: RouteElement) -> Self {
        Self {
            pattern: RoutePattern::default(),
            index: true,
            element,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<RouteNode>) -> Self {
        self.children = children;
        self
    }

    /// Absolute patterns of every node below (and including) this one.
    fn collect_paths(&self, prefix: &str, out: &mut Vec<String>) {
        let own = if self.index {
            prefix.to_string()
        } else {
            join_path(prefix, &self.pattern.to_string())
        };
        out.push(own.clone());
        for child in &self.children {
            child.collect_paths(&own, out);
        }
    }
}

fn join_path(prefix: &str, relative: &str) -> String {
    match (prefix.trim_end_matches('/'), relative.trim_start_matches('/')) {
        ("", "") => "/".to_string(),
        (p, "") => p.to_string(),
        (p, r) => format!("{}/{}", p, r),
    }
}

/// One of exactly two route trees, chosen by whether the session is ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tree", content = "root", rename_all = "snake_case")]
pub enum RouteTree {
    Authenticated(RouteNode),
    Unauthenticated(RouteNode),
}

impl RouteTree {
    pub fn root(&self) -> &RouteNode {
        match self {
            Self::Authenticated(root) | Self::Unauthenticated(root) => root,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// Absolute patterns declared by the tree, e.g. `/activities/:id`.
    pub fn declared_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.root().collect_paths("", &mut out);
        out.dedup();
        out
    }

    /// Whether the tree declares `pattern` verbatim.
    pub fn declares(&self, pattern: &str) -> bool {
        self.declared_paths().iter().any(|p| p == pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_parse_and_display() {
        let pattern = RoutePattern::parse("activities/:id");
        assert_eq!(
            pattern.segments,
            vec![
                RouteSegment::Static("activities".to_string()),
                RouteSegment::Param("id".to_string()),
            ]
        );
        assert_eq!(pattern.to_string(), "activities/:id");
        assert!(RoutePattern::parse("/").is_root());
        assert_eq!(RoutePattern::parse("*").segments, vec![RouteSegment::CatchAll]);
    }

    #[test]
    fn test_declared_paths() {
        let tree = RouteTree::Unauthenticated(
            RouteNode::new(
                "/",
                RouteElement::Layout(Layout::Unauthenticated {
                    on_login: SessionAction::Login,
                }),
            )
            .with_children(vec![
                RouteNode::index(RouteElement::View {
                    view: View::Welcome,
                }),
                RouteNode::new(
                    "*",
                    RouteElement::Redirect {
                        to: ROOT_PATH.to_string(),
                    },
                ),
            ]),
        );

        assert_eq!(tree.declared_paths(), vec!["/".to_string(), "/*".to_string()]);
        assert!(tree.declares("/*"));
        assert!(!tree.declares(ACTIVITIES_PATH));
    }

    #[test]
    fn test_display_names() {
        assert_eq!(View::ActivityDetail.to_string(), "activity_detail");
        assert_eq!(SessionAction::Logout.to_string(), "logout");
        assert_eq!(
            UnmatchedRoutePolicy::RedirectToActivities.to_string(),
            "redirect_to_activities"
        );
    }
}
