//! Team communication network: members are nodes, one-to-one communications
//! are undirected edges weighted by how many were exchanged.
//!
//! Rebuilt for every analysis; never persisted.

use crate::domain::{Communication, Member, MemberId};
use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use thiserror::Error;

pub mod centrality;
pub mod community;

pub use centrality::{
    betweenness_centrality, closeness_centrality, degree_centrality, eigenvector_centrality,
};
pub use community::{greedy_modularity_communities, modularity};

/// Failures inside the graph algorithms. Never leave the analyzer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("graph has no nodes")]
    EmptyGraph,

    #[error("graph has no edges; modularity is undefined")]
    NoEdges,

    #[error("power iteration failed to converge within {iterations} iterations")]
    NoConvergence { iterations: usize },

    #[error("non-finite {0} value")]
    NonFinite(&'static str),
}

/// Node payload.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberNode {
    pub member_id: MemberId,
    pub name: String,
    pub role: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CommunicationNetwork {
    graph: UnGraph<MemberNode, u32>,
}

impl CommunicationNetwork {
    /// Build the network for the current membership.
    ///
    /// Nodes are added in member id order so every traversal (and every
    /// tie-break) is deterministic. Members without any communication stay in
    /// the graph as isolated nodes. Group broadcasts and communications whose
    /// sender or receiver is not a current member contribute no edge; direction
    /// is discarded.
    pub fn build(members: &[Member], comms: &[Communication]) -> Self {
        let mut sorted: Vec<&Member> = members.iter().collect();
        sorted.sort_by_key(|m| m.id);
        sorted.dedup_by_key(|m| m.id);

        let mut graph = UnGraph::<MemberNode, u32>::with_capacity(sorted.len(), comms.len());
        let mut index = HashMap::with_capacity(sorted.len());
        for m in sorted {
            let idx = graph.add_node(MemberNode {
                member_id: m.id,
                name: m.name.clone(),
                role: m.role.clone(),
            });
            index.insert(m.id, idx);
        }

        for c in comms {
            let Some(receiver) = c.receiver_id else {
                continue;
            };
            let (Some(&a), Some(&b)) = (index.get(&c.sender_id), index.get(&receiver)) else {
                continue;
            };
            if a == b {
                continue;
            }
            match graph.find_edge(a, b) {
                Some(e) => graph[e] += 1,
                None => {
                    graph.add_edge(a, b, 1);
                }
            }
        }

        Self { graph }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Edges present over edges possible; 0 for fewer than two nodes.
    pub fn density(&self) -> f64 {
        let n = self.node_count() as f64;
        if n < 2.0 {
            return 0.0;
        }
        2.0 * self.edge_count() as f64 / (n * (n - 1.0))
    }

    /// True when a single component spans every node.
    pub fn is_connected(&self) -> bool {
        self.node_count() > 0 && petgraph::algo::connected_components(&self.graph) == 1
    }

    /// Nodes in member id order. Position in this slice is the node's index
    /// in every per-node vector the algorithms return.
    pub fn nodes(&self) -> Vec<&MemberNode> {
        self.graph.node_indices().map(|i| &self.graph[i]).collect()
    }

    /// Neighbor lists indexed by node position, each sorted ascending.
    pub(crate) fn adjacency(&self) -> Vec<Vec<usize>> {
        let mut adj = vec![Vec::new(); self.node_count()];
        for e in self.graph.edge_references() {
            let (a, b) = (e.source().index(), e.target().index());
            adj[a].push(b);
            adj[b].push(a);
        }
        for list in &mut adj {
            list.sort_unstable();
        }
        adj
    }

    /// `(a, b, weight)` per edge, node positions as in [`Self::nodes`].
    pub(crate) fn weighted_edges(&self) -> Vec<(usize, usize, f64)> {
        self.graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index(), f64::from(*e.weight())))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::domain::{Communication, CommunicationType, Member, MemberId, NewCommunication};
    use chrono::{Duration, Utc};

    pub fn members(n: i64) -> Vec<Member> {
        (1..=n)
            .map(|id| Member {
                id,
                name: format!("Member {}", id),
                email: None,
                role: Some("Engineer".into()),
                team_id: 1,
            })
            .collect()
    }

    /// One communication per listed pair.
    pub fn comms(pairs: &[(MemberId, MemberId)]) -> Vec<Communication> {
        pairs
            .iter()
            .enumerate()
            .map(|(i, &(a, b))| {
                NewCommunication::direct(
                    1,
                    a,
                    b,
                    CommunicationType::FaceToFace,
                    Utc::now() - Duration::hours(1),
                )
                .into_communication(i as i64 + 1)
            })
            .collect()
    }

    pub fn complete_pairs(n: i64) -> Vec<(MemberId, MemberId)> {
        let mut pairs = Vec::new();
        for a in 1..=n {
            for b in 1..=n {
                if a != b {
                    pairs.push((a, b));
                }
            }
        }
        pairs
    }

    pub fn star_pairs(center: MemberId, n: i64) -> Vec<(MemberId, MemberId)> {
        (1..=n)
            .filter(|&i| i != center)
            .flat_map(|i| [(i, center), (center, i)])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_empty_network_keeps_isolated_members() {
        let net = CommunicationNetwork::build(&members(5), &[]);
        assert_eq!(net.node_count(), 5);
        assert_eq!(net.edge_count(), 0);
        assert_eq!(net.density(), 0.0);
        assert!(!net.is_connected());
    }

    #[test]
    fn test_weights_accumulate_across_directions() {
        let net = CommunicationNetwork::build(
            &members(5),
            &comms(&[(1, 2), (1, 2), (2, 1), (1, 2), (2, 1)]),
        );
        assert_eq!(net.edge_count(), 1);
        assert_eq!(net.weighted_edges(), vec![(0, 1, 5.0)]);
    }

    #[test]
    fn test_group_and_outside_receivers_add_no_edges() {
        let mut cs = comms(&[(1, 2), (1, 99), (99, 1)]);
        let mut group = cs[0].clone();
        group.receiver_id = None;
        group.is_group = true;
        cs.push(group);
        let net = CommunicationNetwork::build(&members(3), &cs);
        assert_eq!(net.node_count(), 3);
        assert_eq!(net.edge_count(), 1);
        let ids: Vec<MemberId> = net.nodes().iter().map(|n| n.member_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(net.weighted_edges(), vec![(0, 1, 1.0)]);
    }

    #[test]
    fn test_complete_network_density() {
        let net = CommunicationNetwork::build(&members(5), &comms(&complete_pairs(5)));
        assert!((net.density() - 1.0).abs() < 1e-9);
        assert!(net.is_connected());
    }

    #[test]
    fn test_nodes_ordered_by_member_id() {
        let mut ms = members(4);
        ms.reverse();
        let net = CommunicationNetwork::build(&ms, &[]);
        let ids: Vec<MemberId> = net.nodes().iter().map(|n| n.member_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }
}
