use anyhow::{Context, Result};
use colored::Colorize;
use fitgate_core::routing::{RouteElement, RouteNode};

use super::App;

pub fn open(app: &mut App, url: &str) -> Result<()> {
    let navigation = app
        .shell
        .navigate(url)
        .with_context(|| format!("Cannot open {}", url))?;

    for hop in &navigation.redirects {
        println!("{} {}", "redirect".dimmed(), hop);
    }
    println!("Location: {}", navigation.location.bold());
    if let Some(layout) = navigation.matched.layout {
        println!("Layout:   {} ({})", layout, layout.action());
    }
    println!("View:     {}", navigation.matched.view);
    for (name, value) in &navigation.matched.params {
        println!("  :{} = {}", name, value);
    }
    Ok(())
}

pub fn print(app: &App, json: bool) -> Result<()> {
    let tree = app.shell.routes();
    if json {
        let rendered =
            serde_json::to_string_pretty(tree).context("Failed to serialize route tree")?;
        println!("{}", rendered);
        return Ok(());
    }

    let kind = if tree.is_authenticated() {
        "authenticated"
    } else {
        "unauthenticated"
    };
    println!("{} route tree", kind.bold());
    print_node(tree.root(), 0);
    Ok(())
}

fn print_node(node: &RouteNode, depth: usize) {
    let pattern = if node.index {
        "(index)".to_string()
    } else if node.pattern.is_root() {
        "/".to_string()
    } else {
        node.pattern.to_string()
    };
    let element = match &node.element {
        RouteElement::Layout(layout) => format!("{} layout", layout),
        RouteElement::View { view } => view.to_string(),
        RouteElement::Redirect { to } => format!("-> {}", to),
    };
    println!("{}{}  {}", "  ".repeat(depth), pattern, element.dimmed());
    for child in &node.children {
        print_node(child, depth + 1);
    }
}
