//! Dependency graph export for visualization.
//!
//! The graph is derived from a module's finalized factory list only: one
//! node per active factory, one edge from each dependent to each of its
//! dependencies.

use std::collections::HashSet;
use std::fmt::Write as _;

#[cfg(feature = "graph-export")]
use serde::{Deserialize, Serialize};

use crate::lifetime::Lifetime;
use crate::module::ServiceModule;

/// A service in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct GraphNode {
    /// Unique node id (the key id)
    pub id: u64,
    pub name: String,
    pub lifetime: Lifetime,
    pub scope: Option<String>,
    /// Dependency names in declaration order
    pub dependencies: Vec<String>,
}

/// Edge from a dependent service to one of its dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct GraphEdge {
    pub from: u64,
    pub to: u64,
}

/// Directed dependency graph of a module.
///
/// # Examples
///
/// ```rust
/// use keyed_di::{DependencyGraph, ServiceFactory, ServiceKey, ServiceModule};
///
/// let config = ServiceKey::<String>::new("Config");
/// let logger = ServiceKey::<String>::new("Logger");
/// let app = ServiceKey::<String>::new("App");
///
/// let module = ServiceModule::compose([
///     ServiceFactory::singleton(&config).initialize_sync(|_| Ok("cfg".to_string())),
///     ServiceFactory::singleton(&logger).initialize_sync(|_| Ok("log".to_string())),
///     ServiceFactory::one_shot(&app, [config.key(), logger.key()]).initialize_sync(|_| Ok("app".to_string())),
/// ])
/// .unwrap();
///
/// let graph = DependencyGraph::from_module(&module);
/// assert_eq!(graph.edges.len(), 2);
/// assert_eq!(graph.leaves().iter().map(|n| n.name.as_str()).collect::<Vec<_>>(), vec!["Config", "Logger"]);
/// assert_eq!(graph.roots().iter().map(|n| n.name.as_str()).collect::<Vec<_>>(), vec!["App"]);
///
/// let dot = graph.to_dot();
/// assert!(dot.contains("\"App\" -> \"Config\";"));
/// ```
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct DependencyGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl DependencyGraph {
    /// Builds the graph from the module's active factories, in module order.
    pub fn from_module(module: &ServiceModule) -> Self {
        let mut graph = DependencyGraph::default();
        for factory in module.factories() {
            let from = factory.provides().id();
            graph.nodes.push(GraphNode {
                id: from,
                name: factory.provides().name().to_string(),
                lifetime: factory.lifetime(),
                scope: factory.scope().map(|s| s.name().to_string()),
                dependencies: factory.depends_on().iter().map(|k| k.name().to_string()).collect(),
            });
            for dep in factory.depends_on() {
                let edge = GraphEdge { from, to: dep.id() };
                if !graph.edges.contains(&edge) {
                    graph.edges.push(edge);
                }
            }
        }
        graph
    }

    pub fn node(&self, id: u64) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Services with no dependencies (no outgoing edges).
    pub fn leaves(&self) -> Vec<&GraphNode> {
        let dependents: HashSet<u64> = self.edges.iter().map(|e| e.from).collect();
        self.nodes.iter().filter(|n| !dependents.contains(&n.id)).collect()
    }

    /// Services nothing depends on (no incoming edges).
    pub fn roots(&self) -> Vec<&GraphNode> {
        let dependencies: HashSet<u64> = self.edges.iter().map(|e| e.to).collect();
        self.nodes.iter().filter(|n| !dependencies.contains(&n.id)).collect()
    }

    /// Renders the graph in Graphviz DOT format.
    ///
    /// Leaves are drawn as boxes, roots with a double border, one-shot
    /// services dashed.
    pub fn to_dot(&self) -> String {
        let leaves: HashSet<u64> = self.leaves().iter().map(|n| n.id).collect();
        let roots: HashSet<u64> = self.roots().iter().map(|n| n.id).collect();

        let mut out = String::from("digraph services {\n    rankdir=LR;\n");
        for node in &self.nodes {
            let shape = if leaves.contains(&node.id) { "box" } else { "ellipse" };
            let peripheries = if roots.contains(&node.id) { 2 } else { 1 };
            let style = match node.lifetime {
                Lifetime::Singleton => "solid",
                Lifetime::OneShot => "dashed",
            };
            let _ = writeln!(
                out,
                "    \"{}\" [shape={}, peripheries={}, style={}];",
                escape(&node.name),
                shape,
                peripheries,
                style
            );
        }
        for edge in &self.edges {
            if let (Some(from), Some(to)) = (self.node(edge.from), self.node(edge.to)) {
                let _ = writeln!(out, "    \"{}\" -> \"{}\";", escape(&from.name), escape(&to.name));
            }
        }
        out.push_str("}\n");
        out
    }

    /// Serializes the graph as pretty-printed JSON.
    #[cfg(feature = "graph-export")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn escape(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}
