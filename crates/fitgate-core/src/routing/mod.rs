//! Route gating: the two route trees, their builder and the resolver.

pub mod builder;
pub mod model;
pub mod resolver;

pub use builder::build_route_tree;
pub use model::{
    ACTIVITIES_PATH, Layout, ROOT_PATH, RouteElement, RouteNode, RoutePattern, RouteSegment,
    RouteTree, SessionAction, UnmatchedRoutePolicy, View,
};
pub use resolver::{
    MAX_REDIRECTS, Navigation, Resolution, RouteMatch, navigate, normalize_path, resolve,
};
