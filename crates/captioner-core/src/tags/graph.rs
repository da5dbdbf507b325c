//! Tag co-occurrence network.

use super::{caption_files, count_tags, read_caption, split_tags};
use crate::error::Result;
use petgraph::dot::Dot;
use petgraph::graph::NodeIndex;
use petgraph::{Graph, Undirected};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// A tag and how many caption files carry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagNode {
    pub tag: String,
    pub count: usize,
}

impl fmt::Display for TagNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.tag, self.count)
    }
}

/// Nodes are the top-N tags; edge weights count files where both tags appear.
#[derive(Debug, Clone)]
pub struct TagGraph {
    pub graph: Graph<TagNode, usize, Undirected>,
    index: HashMap<String, NodeIndex>,
}

impl Default for TagGraph {
    fn default() -> Self {
        Self {
            graph: Graph::new_undirected(),
            index: HashMap::new(),
        }
    }
}

impl TagGraph {
    /// Add a node, or return the existing one for `tag`.
    pub fn add_tag(&mut self, tag: &str, count: usize) -> NodeIndex {
        if let Some(&idx) = self.index.get(tag) {
            return idx;
        }
        let idx = self.graph.add_node(TagNode {
            tag: tag.to_string(),
            count,
        });
        self.index.insert(tag.to_string(), idx);
        idx
    }

    /// Count one more shared file for `a` and `b`. Unknown tags are ignored.
    pub fn link(&mut self, a: &str, b: &str) {
        let (Some(&ia), Some(&ib)) = (self.index.get(a), self.index.get(b)) else {
            return;
        };
        match self.graph.find_edge(ia, ib) {
            Some(edge) => self.graph[edge] += 1,
            None => {
                self.graph.add_edge(ia, ib, 1);
            }
        }
    }

    /// Shared-file count between two tags.
    pub fn weight(&self, a: &str, b: &str) -> Option<usize> {
        let (ia, ib) = (*self.index.get(a)?, *self.index.get(b)?);
        self.graph.find_edge(ia, ib).map(|e| self.graph[e])
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

/// Build the co-occurrence graph among the `top_n` most frequent tags.
pub fn co_occurrence(folder: &Path, top_n: usize) -> Result<TagGraph> {
    let mut graph = TagGraph::default();
    for c in count_tags(folder, top_n)? {
        graph.add_tag(&c.tag, c.count);
    }

    for file in caption_files(folder) {
        let Some(text) = read_caption(&file) else {
            continue;
        };
        let mut present: Vec<String> = split_tags(&text)
            .into_iter()
            .filter(|t| graph.index.contains_key(t))
            .collect();
        present.sort();
        present.dedup();

        for (i, a) in present.iter().enumerate() {
            for b in &present[i + 1..] {
                graph.link(a, b);
            }
        }
    }

    tracing::debug!(
        "Tag network: {} node(s), {} edge(s)",
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

/// Render as an undirected Graphviz graph.
pub fn to_dot(graph: &TagGraph) -> String {
    format!("{}", Dot::new(&graph.graph))
}
