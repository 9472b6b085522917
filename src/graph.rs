use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::matchup::{Dataset, MatchRecord, MatchResult};
use crate::names::clean_name;

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub name: String,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl GraphNode {
    fn new(id: NodeId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            wins: 0,
            losses: 0,
            draws: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Win,
    Draw,
}

impl EdgeKind {
    pub fn label(self) -> &'static str {
        match self {
            EdgeKind::Win => "wins",
            EdgeKind::Draw => "draws",
        }
    }
}

/// Win edges point winner -> loser. Draw edges store the lower id as `source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub kind: EdgeKind,
}

impl GraphEdge {
    pub fn key(&self) -> EdgeKey {
        (self.source, self.target, self.kind)
    }
}

pub type EdgeKey = (NodeId, NodeId, EdgeKind);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn node_by_name(&self, name: &str) -> Option<&GraphNode> {
        let key = clean_name(name);
        self.nodes.iter().find(|n| n.name == key)
    }

    /// Indices into `edges` that pass the two visibility toggles.
    ///
    /// Win edges sit behind "show losses": every win is someone's loss.
    pub fn filter_edges(&self, show_losses: bool, show_draws: bool) -> Vec<usize> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, edge)| match edge.kind {
                EdgeKind::Win => show_losses,
                EdgeKind::Draw => show_draws,
            })
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn degree(&self, edges: &[usize]) -> Vec<usize> {
        let mut degree = vec![0usize; self.nodes.len()];
        for edge in edges.iter().filter_map(|idx| self.edges.get(*idx)) {
            if let Some(d) = degree.get_mut(edge.source) {
                *d += 1;
            }
            if let Some(d) = degree.get_mut(edge.target) {
                *d += 1;
            }
        }
        degree
    }
}

/// Single-pass builder; node ids follow first-seen order.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<GraphNode>,
    ids: HashMap<String, NodeId>,
    edges: Vec<GraphEdge>,
    seen: HashSet<EdgeKey>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_id(&mut self, raw_name: &str) -> NodeId {
        let key = clean_name(raw_name);
        if let Some(id) = self.ids.get(key) {
            return *id;
        }
        let id = self.nodes.len();
        self.nodes.push(GraphNode::new(id, key));
        self.ids.insert(key.to_string(), id);
        id
    }

    pub fn add_record(&mut self, record: &MatchRecord) {
        let subject = self.node_id(record.subject_key());
        let opponent = self.node_id(record.opponent_key());

        let edge = match record.result {
            MatchResult::Win => GraphEdge {
                source: subject,
                target: opponent,
                kind: EdgeKind::Win,
            },
            MatchResult::Lose => GraphEdge {
                source: opponent,
                target: subject,
                kind: EdgeKind::Win,
            },
            MatchResult::Draw => GraphEdge {
                source: subject.min(opponent),
                target: subject.max(opponent),
                kind: EdgeKind::Draw,
            },
            MatchResult::Unknown(_) => return,
        };

        // Mirrored entries (A beat B, B lost to A) collapse here, and only the
        // first occurrence moves the tallies.
        if !self.seen.insert(edge.key()) {
            return;
        }
        match edge.kind {
            EdgeKind::Win => {
                self.nodes[edge.source].wins += 1;
                self.nodes[edge.target].losses += 1;
            }
            EdgeKind::Draw => {
                self.nodes[edge.source].draws += 1;
                self.nodes[edge.target].draws += 1;
            }
        }
        self.edges.push(edge);
    }

    pub fn finish(self) -> Graph {
        Graph {
            nodes: self.nodes,
            edges: self.edges,
        }
    }
}

pub fn build_graph<'a>(records: impl IntoIterator<Item = &'a MatchRecord>) -> Graph {
    let mut builder = GraphBuilder::new();
    for record in records {
        builder.add_record(record);
    }
    builder.finish()
}

/// Like [`build_graph`], but subjects with an empty matchup list still get a node.
pub fn build_graph_for(dataset: &Dataset) -> Graph {
    let mut builder = GraphBuilder::new();
    for entry in &dataset.entries {
        builder.node_id(&entry.name);
        for record in &entry.matchups {
            builder.add_record(record);
        }
    }
    builder.finish()
}
