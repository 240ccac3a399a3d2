//! Route table builder.
//!
//! Maps the session-ready flag to one of two fixed route trees. Routes of one
//! tree are structurally absent from the other.

use super::model::{
    ACTIVITIES_PATH, Layout, ROOT_PATH, RouteElement, RouteNode, RouteTree, SessionAction,
    UnmatchedRoutePolicy, View,
};

/// Builds the route tree for the given session state.
///
/// Deterministic: equal inputs always yield equal trees.
pub fn build_route_tree(session_ready: bool, unmatched: UnmatchedRoutePolicy) -> RouteTree {
    if session_ready {
        RouteTree::Authenticated(authenticated_root(unmatched))
    } else {
        RouteTree::Unauthenticated(unauthenticated_root())
    }
}

fn authenticated_root(unmatched: UnmatchedRoutePolicy) -> RouteNode {
    let fallback = match unmatched {
        UnmatchedRoutePolicy::NotFound => RouteElement::View {
            view: View::NotFound,
        },
        UnmatchedRoutePolicy::RedirectToActivities => RouteElement::Redirect {
            to: ACTIVITIES_PATH.to_string(),
        },
    };

    RouteNode::new(
        ROOT_PATH,
        RouteElement::Layout(Layout::Authenticated {
            on_logout: SessionAction::Logout,
        }),
    )
    .with_children(vec![
        RouteNode::index(RouteElement::Redirect {
            to: ACTIVITIES_PATH.to_string(),
        }),
        RouteNode::new(
            "activities",
            RouteElement::View {
                view: View::ActivitiesList,
            },
        ),
        RouteNode::new(
            "activities/:id",
            RouteElement::View {
                view: View::ActivityDetail,
            },
        ),
        RouteNode::new("*", fallback),
    ])
}

fn unauthenticated_root() -> RouteNode {
    RouteNode::new(
        ROOT_PATH,
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
    ])
}
