//! Dependency graph construction and traversal.

use std::collections::{HashMap, HashSet};
use std::fmt;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, EdgeRef};
use petgraph::Direction;

/// A resolved package in the graph. The image root has an empty version.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct ResolvedNode {
    pub name: String,
    pub version: String,
    pub url: String,
}

impl ResolvedNode {
    pub fn new(name: impl Into<String>, version: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            url: url.into(),
        }
    }
}

impl fmt::Display for ResolvedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{} {}", self.name, self.version)
        }
    }
}

/// Edge label: how the dependency was reached.
#[derive(Debug, Clone)]
pub struct DepEdge {
    /// True when the edge came from an OR-group rather than a literal requirement.
    pub alternative: bool,
}

/// A resolved dependency graph backed by petgraph.
pub struct DependencyGraph {
    graph: DiGraph<ResolvedNode, DepEdge>,
    /// Lookup from package name to node index (one selected version per name).
    index: HashMap<String, NodeIndex>,
    pub root: Option<NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            root: None,
        }
    }

    /// Add or retrieve a node. If the name already exists, returns the existing index.
    pub fn add_node(&mut self, node: ResolvedNode) -> NodeIndex {
        if let Some(&idx) = self.index.get(&node.name) {
            return idx;
        }
        let name = node.name.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(name, idx);
        idx
    }

    /// Set the root node of the graph (the image itself).
    pub fn set_root(&mut self, idx: NodeIndex) {
        self.root = Some(idx);
    }

    /// Add a dependency edge from `from` to `to`. Duplicate edges are ignored.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, edge: DepEdge) {
        if !self.graph.edges(from).any(|e| e.target() == to) {
            self.graph.add_edge(from, to, edge);
        }
    }

    pub fn find(&self, name: &str) -> Option<NodeIndex> {
        self.index.get(name).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &ResolvedNode {
        &self.graph[idx]
    }

    /// All resolved nodes (excluding root), in insertion order.
    pub fn all_nodes(&self) -> Vec<&ResolvedNode> {
        self.graph
            .node_indices()
            .filter(|&idx| Some(idx) != self.root)
            .map(|idx| &self.graph[idx])
            .collect()
    }

    /// Direct dependencies of a node, in the order they were recorded.
    pub fn dependencies_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, &DepEdge)> {
        self.neighbours(idx, Direction::Outgoing)
    }

    /// Reverse dependencies (who depends on this node).
    pub fn dependents_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, &DepEdge)> {
        self.neighbours(idx, Direction::Incoming)
    }

    fn neighbours(&self, idx: NodeIndex, direction: Direction) -> Vec<(NodeIndex, &DepEdge)> {
        let mut found: Vec<_> = self
            .graph
            .edges_directed(idx, direction)
            .map(|e| {
                let other = match direction {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                (e.id(), other, e.weight())
            })
            .collect();
        // petgraph walks edges newest first
        found.sort_by_key(|(id, _, _)| *id);
        found.into_iter().map(|(_, n, w)| (n, w)).collect()
    }

    /// Names of the packages that depend on `name`, excluding the image root.
    pub fn dependents(&self, name: &str) -> Vec<&ResolvedNode> {
        let Some(idx) = self.find(name) else {
            return Vec::new();
        };
        self.dependents_of(idx)
            .into_iter()
            .filter(|(n, _)| Some(*n) != self.root)
            .map(|(n, _)| &self.graph[n])
            .collect()
    }

    /// Render the dependency tree. Edges reached through an OR-group are
    /// marked `(alternative)`; a package already printed higher up the same
    /// branch is listed but not descended into again.
    pub fn print_tree(&self, max_depth: Option<usize>) -> String {
        match self.root {
            Some(root) => self.render_from(root, Direction::Outgoing, max_depth),
            None => String::new(),
        }
    }

    fn render_from(&self, start: NodeIndex, direction: Direction, max_depth: Option<usize>) -> String {
        let mut walk = Walk {
            output: format!("{}\n", self.graph[start]),
            direction,
            max_depth,
            visited: HashSet::from([start]),
        };
        let next = self.neighbours(start, direction);
        let count = next.len();
        for (i, (idx, edge)) in next.into_iter().enumerate() {
            self.render_branch(&mut walk, idx, edge, "", i == count - 1, 1);
        }
        walk.output
    }

    fn render_branch(
        &self,
        walk: &mut Walk,
        idx: NodeIndex,
        edge: &DepEdge,
        prefix: &str,
        is_last: bool,
        depth: usize,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        let marker = if edge.alternative && walk.direction == Direction::Outgoing {
            " (alternative)"
        } else {
            ""
        };
        walk.output
            .push_str(&format!("{prefix}{connector}{}{marker}\n", self.graph[idx]));

        if walk.max_depth.is_some_and(|max| depth >= max) || !walk.visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let next = self.neighbours(idx, walk.direction);
        let count = next.len();
        for (i, (child, child_edge)) in next.into_iter().enumerate() {
            self.render_branch(walk, child, child_edge, &child_prefix, i == count - 1, depth + 1);
        }

        walk.visited.remove(&idx);
    }

    /// Find the path from the image root to a package.
    pub fn find_path(&self, name: &str) -> Option<Vec<&ResolvedNode>> {
        let root = self.root?;
        let target = self.find(name)?;
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        if self.dfs_path(root, target, &mut path, &mut visited) {
            Some(path.iter().map(|&idx| &self.graph[idx]).collect())
        } else {
            None
        }
    }

    fn dfs_path(
        &self,
        current: NodeIndex,
        target: NodeIndex,
        path: &mut Vec<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
    ) -> bool {
        path.push(current);
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            path.pop();
            return false;
        }
        for (child, _) in self.dependencies_of(current) {
            if self.dfs_path(child, target, path, visited) {
                return true;
            }
        }
        path.pop();
        false
    }

    /// Render the reverse dependency chains leading to one package.
    pub fn print_inverted_tree(&self, name: &str) -> String {
        match self.find(name) {
            Some(idx) => self.render_from(idx, Direction::Incoming, None),
            None => String::new(),
        }
    }

    /// Installation order: every package after the packages it depends on.
    ///
    /// Each inner vector is one strongly connected component; packages in a
    /// dependency cycle share a group, sorted by name.
    pub fn install_order(&self) -> Vec<Vec<&ResolvedNode>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter_map(|scc| {
                let mut group: Vec<&ResolvedNode> = scc
                    .into_iter()
                    .filter(|&idx| Some(idx) != self.root)
                    .map(|idx| &self.graph[idx])
                    .collect();
                if group.is_empty() {
                    return None;
                }
                group.sort_by(|a, b| a.name.cmp(&b.name));
                Some(group)
            })
            .collect()
    }

    /// Names of every package reachable from the image root.
    pub fn reachable_from_root(&self) -> HashSet<String> {
        let mut reachable = HashSet::new();
        let Some(root) = self.root else {
            return reachable;
        };
        let mut bfs = Bfs::new(&self.graph, root);
        while let Some(idx) = bfs.next(&self.graph) {
            if idx != root {
                reachable.insert(self.graph[idx].name.clone());
            }
        }
        reachable
    }

    /// Number of nodes (excluding root).
    pub fn len(&self) -> usize {
        let total = self.graph.node_count();
        if self.root.is_some() {
            total.saturating_sub(1)
        } else {
            total
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// State threaded through a tree rendering.
struct Walk {
    output: String,
    direction: Direction,
    max_depth: Option<usize>,
    visited: HashSet<NodeIndex>,
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, version: &str) -> ResolvedNode {
        ResolvedNode::new(name, version, "")
    }

    const LITERAL: DepEdge = DepEdge { alternative: false };

    /// image -> a -> c, image -> b, b -(alt)-> c
    fn sample() -> DependencyGraph {
        let mut g = DependencyGraph::new();
        let root = g.add_node(node("bookworm-minimal", ""));
        g.set_root(root);
        let a = g.add_node(node("a", "1.0"));
        let b = g.add_node(node("b", "2.0"));
        let c = g.add_node(node("c", "3.0"));
        g.add_edge(root, a, LITERAL);
        g.add_edge(root, b, LITERAL);
        g.add_edge(a, c, LITERAL);
        g.add_edge(b, c, DepEdge { alternative: true });
        g
    }

    #[test]
    fn add_and_find() {
        let mut g = DependencyGraph::new();
        let idx = g.add_node(node("lib", "1.0"));
        assert_eq!(g.find("lib"), Some(idx));
        assert_eq!(g.node(idx).version, "1.0");
        assert_eq!(g.add_node(node("lib", "1.0")), idx);
    }

    #[test]
    fn tree_printing() {
        let tree = sample().print_tree(None);
        assert!(tree.starts_with("bookworm-minimal\n"));
        assert!(tree.contains("├── a 1.0"));
        assert!(tree.contains("└── b 2.0"));
        assert!(tree.contains("c 3.0 (alternative)"));
        let a = tree.find("a 1.0").unwrap();
        let b = tree.find("b 2.0").unwrap();
        assert!(a < b);
    }

    #[test]
    fn tree_depth_limit() {
        let tree = sample().print_tree(Some(1));
        assert!(tree.contains("a 1.0"));
        assert!(!tree.contains("c 3.0"));
    }

    #[test]
    fn find_path_exists() {
        let g = sample();
        let path = g.find_path("c").unwrap();
        let names: Vec<_> = path.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["bookworm-minimal", "a", "c"]);
        assert!(g.find_path("missing").is_none());
    }

    #[test]
    fn inverted_tree_and_dependents() {
        let g = sample();
        let inv = g.print_inverted_tree("c");
        assert!(inv.starts_with("c 3.0\n"));
        assert!(inv.contains("a 1.0"));
        assert!(inv.contains("b 2.0"));
        assert!(inv.contains("bookworm-minimal"));

        let names: Vec<_> = g.dependents("c").iter().map(|n| n.name.clone()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(g.dependents("a").is_empty());
    }

    #[test]
    fn install_order_puts_dependencies_first() {
        let g = sample();
        let order: Vec<String> = g
            .install_order()
            .into_iter()
            .flatten()
            .map(|n| n.name.clone())
            .collect();
        assert_eq!(order.len(), 3);
        let pos = |n: &str| order.iter().position(|x| x == n).unwrap();
        assert!(pos("c") < pos("a"));
        assert!(pos("c") < pos("b"));
    }

    #[test]
    fn install_order_groups_cycles() {
        let mut g = DependencyGraph::new();
        let root = g.add_node(node("image", ""));
        g.set_root(root);
        let x = g.add_node(node("x", "1"));
        let y = g.add_node(node("y", "1"));
        let z = g.add_node(node("z", "1"));
        g.add_edge(root, y, LITERAL);
        g.add_edge(y, x, LITERAL);
        g.add_edge(x, y, LITERAL);
        g.add_edge(x, z, LITERAL);

        let order = g.install_order();
        assert_eq!(order.len(), 2);
        assert_eq!(order[0][0].name, "z");
        let cycle: Vec<_> = order[1].iter().map(|n| n.name.as_str()).collect();
        assert_eq!(cycle, vec!["x", "y"]);
    }

    #[test]
    fn reachability() {
        let mut g = sample();
        g.add_node(node("orphan", "1.0"));
        let reachable = g.reachable_from_root();
        assert_eq!(reachable.len(), 3);
        assert!(!reachable.contains("orphan"));
        assert_eq!(g.len(), 4);
        assert_eq!(g.all_nodes().len(), 4);
    }
}
