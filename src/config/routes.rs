//! Route definitions loaded from a YAML file.
//!
//! Format:
//! ```yaml
//! - label: physics
//!   template: |
//!     You are a very smart physics professor. ...
//!     {query}
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// One routable prompt template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub label: String,
    pub template: String,
}

const PHYSICS_TEMPLATE: &str = "You are a very smart physics professor. \
You are great at answering questions about physics in a concise and easy to understand manner. \
When you don't know the answer to a question you admit that you don't know.

Here is a question:
{query}";

const MATH_TEMPLATE: &str = "You are a very good mathematician. You are great at answering math questions. \
You are so good because you are able to break down hard problems into their component parts, \
answer the component parts, and then put them together to answer the broader question.

Here is a question:
{query}";

/// Routes used when no routes file exists.
pub fn default_routes() -> Vec<RouteEntry> {
    vec![
        RouteEntry {
            label: "physics".into(),
            template: PHYSICS_TEMPLATE.into(),
        },
        RouteEntry {
            label: "math".into(),
            template: MATH_TEMPLATE.into(),
        },
    ]
}

/// Load routes from `path`, or the defaults if the file does not exist.
pub fn load_routes(path: &Path) -> Result<Vec<RouteEntry>> {
    if !path.exists() {
        debug!("Routes file does not exist: {:?}", path);
        return Ok(default_routes());
    }

    let contents = std::fs::read_to_string(path).context("Failed to read routes file")?;
    let routes = parse_routes(&contents)?;
    info!("Loaded {} routes from {:?}", routes.len(), path);
    Ok(routes)
}

/// Parse and check a routes document.
pub fn parse_routes(contents: &str) -> Result<Vec<RouteEntry>> {
    let routes: Vec<RouteEntry> =
        serde_yaml::from_str(contents).context("Failed to parse routes file (YAML)")?;

    if routes.is_empty() {
        bail!("Routes file defines no routes");
    }

    let mut seen = HashSet::new();
    for route in &routes {
        if route.label.trim().is_empty() {
            bail!("Route label must not be empty");
        }
        if !seen.insert(route.label.as_str()) {
            bail!("Duplicate route label: {}", route.label);
        }
    }

    Ok(routes)
}

/// Write routes as YAML, creating parent directories.
pub fn save_routes(routes: &[RouteEntry], path: &Path) -> Result<()> {
    let contents = serde_yaml::to_string(routes).context("Failed to serialize routes")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents).context("Failed to write routes file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_routes_in_order() {
        let routes = parse_routes(
            "- label: physics\n  template: \"P {query}\"\n- label: math\n  template: \"M {query}\"\n",
        )
        .unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].label, "physics");
        assert_eq!(routes[1].template, "M {query}");
    }

    #[test]
    fn rejects_duplicate_and_empty_labels() {
        assert!(parse_routes("- label: a\n  template: x\n- label: a\n  template: y\n").is_err());
        assert!(parse_routes("- label: ''\n  template: x\n").is_err());
        assert!(parse_routes("[]").is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let routes = load_routes(&dir.path().join("routes.yml")).unwrap();
        assert_eq!(routes, default_routes());
        assert!(routes.iter().all(|r| r.template.contains("{query}")));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("routes.yml");
        save_routes(&default_routes(), &path).unwrap();
        assert_eq!(load_routes(&path).unwrap(), default_routes());
    }
}
