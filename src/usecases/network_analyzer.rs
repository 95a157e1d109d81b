//! Network analyzer. Builds the team's communication graph for a window and
//! derives structure, community and centrality reports from it.
//!
//! Store failures propagate as `DomainError`. Everything that goes wrong inside
//! the graph algorithms is turned into an `Analysis::Failed` outcome or a
//! documented fallback instead.

use crate::domain::insights::{self, SILO_MODULARITY};
use crate::domain::network::{
    self, CommunicationNetwork, MemberNode, NetworkError, centrality::EIGENVECTOR_MAX_ITER,
    centrality::EIGENVECTOR_TOLERANCE,
};
use crate::domain::scoring::round_to;
use crate::domain::{
    Analysis, CentralityMetrics, CentralityReport, CommunityGroup, CommunityReport, DateWindow,
    DomainError, KeyPlayer, KeyRoles, MemberId, NetworkMetrics, NetworkMetricsReport,
    PartialNetworkMetrics, TeamId,
};
use crate::ports::CommunicationStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

const MIN_COMMUNITY_NODES: usize = 3;
const TOP_N: usize = 3;

pub struct NetworkAnalyzer {
    store: Arc<dyn CommunicationStore>,
}

impl NetworkAnalyzer {
    pub fn new(store: Arc<dyn CommunicationStore>) -> Self {
        Self { store }
    }

    /// One node per current member, one weighted edge per communicating pair.
    pub async fn build_communication_network(
        &self,
        team_id: TeamId,
        window: &DateWindow,
    ) -> Result<CommunicationNetwork, DomainError> {
        let members = self.store.get_members(team_id).await?;
        let comms = self.store.get_communications(team_id, window).await?;
        Ok(CommunicationNetwork::build(&members, &comms))
    }

    pub async fn analyze_network_metrics(
        &self,
        team_id: TeamId,
        window: &DateWindow,
    ) -> Result<Analysis<NetworkMetricsReport>, DomainError> {
        let net = self.build_communication_network(team_id, window).await?;
        if net.node_count() == 0 {
            return Ok(Analysis::failed("No data available for analysis"));
        }

        let density = net.density();
        let report = match full_metrics(&net) {
            Ok(metrics) => {
                info!(
                    team_id,
                    density = metrics.density,
                    bottlenecks = metrics.potential_bottlenecks.len(),
                    "network metrics calculated"
                );
                NetworkMetricsReport::Full(metrics)
            }
            Err(e) => {
                warn!(team_id, error = %e, "falling back to partial network metrics");
                NetworkMetricsReport::Partial(PartialNetworkMetrics {
                    density: round_to(density, 3),
                    num_nodes: net.node_count(),
                    num_edges: net.edge_count(),
                    note: format!("Network too sparse for full analysis: {}", e),
                })
            }
        };
        Ok(Analysis::Completed(report))
    }

    pub async fn detect_communities(
        &self,
        team_id: TeamId,
        window: &DateWindow,
    ) -> Result<Analysis<CommunityReport>, DomainError> {
        let net = self.build_communication_network(team_id, window).await?;
        if net.node_count() < MIN_COMMUNITY_NODES {
            return Ok(Analysis::failed(
                "Need at least 3 members for community detection",
            ));
        }

        let partition = network::greedy_modularity_communities(&net);
        let modularity = match network::modularity(&net, &partition) {
            Ok(q) => q,
            Err(e) => {
                warn!(team_id, error = %e, "community detection failed");
                return Ok(Analysis::failed(format!("Community detection failed: {}", e)));
            }
        };

        let nodes = net.nodes();
        let communities: Vec<CommunityGroup> = partition
            .iter()
            .enumerate()
            .map(|(i, group)| {
                let members: Vec<&MemberNode> = group.iter().map(|&pos| nodes[pos]).collect();
                CommunityGroup {
                    community_id: i + 1,
                    member_ids: members.iter().map(|m| m.member_id).collect(),
                    member_names: members.iter().map(|m| m.name.clone()).collect(),
                    size: members.len(),
                }
            })
            .collect();

        info!(
            team_id,
            communities = communities.len(),
            modularity,
            "communities detected"
        );
        Ok(Analysis::Completed(CommunityReport {
            num_communities: communities.len(),
            interpretation: insights::interpret_communities(communities.len(), modularity),
            communities,
            modularity: round_to(modularity, 3),
            is_siloed: modularity > SILO_MODULARITY,
        }))
    }

    pub async fn calculate_advanced_centrality(
        &self,
        team_id: TeamId,
        window: &DateWindow,
    ) -> Result<Analysis<CentralityReport>, DomainError> {
        let net = self.build_communication_network(team_id, window).await?;
        if net.node_count() == 0 {
            return Ok(Analysis::failed("No data available"));
        }

        match centrality_report(&net, team_id) {
            Ok(report) => Ok(Analysis::Completed(report)),
            Err(e) => {
                warn!(team_id, error = %e, "centrality calculation failed");
                Ok(Analysis::failed(format!("Centrality calculation failed: {}", e)))
            }
        }
    }
}

fn full_metrics(net: &CommunicationNetwork) -> Result<NetworkMetrics, NetworkError> {
    let betweenness = network::betweenness_centrality(net)?;
    // Closeness is not reported, but a failure still demotes to partial.
    network::closeness_centrality(net)?;

    let nodes = net.nodes();
    let (most_central, score) = first_max(&betweenness)
        .map(|i| (Some(nodes[i].member_id), betweenness[i]))
        .unwrap_or((None, 0.0));

    let (mean, std) = insights::mean_and_std(&betweenness);
    let threshold = mean + std;
    let potential_bottlenecks = betweenness
        .iter()
        .enumerate()
        .filter(|(_, b)| **b > threshold)
        .map(|(i, _)| nodes[i].member_id)
        .collect();

    Ok(NetworkMetrics {
        density: round_to(net.density(), 3),
        is_connected: net.is_connected(),
        num_nodes: net.node_count(),
        num_edges: net.edge_count(),
        most_central_member_id: most_central,
        centrality_score: round_to(score, 3),
        potential_bottlenecks,
        avg_betweenness: round_to(mean, 3),
    })
}

fn centrality_report(
    net: &CommunicationNetwork,
    team_id: TeamId,
) -> Result<CentralityReport, NetworkError> {
    let n = net.node_count();
    let degree = network::degree_centrality(net);
    let betweenness = network::betweenness_centrality(net)?;
    let closeness = network::closeness_centrality(net)?;
    let eigenvector =
        match network::eigenvector_centrality(net, EIGENVECTOR_MAX_ITER, EIGENVECTOR_TOLERANCE) {
            Ok(v) => v,
            Err(e) => {
                warn!(team_id, error = %e, "eigenvector centrality unavailable; using zeros");
                vec![0.0; n]
            }
        };

    let nodes = net.nodes();
    let by_member = |values: &[f64]| -> BTreeMap<MemberId, f64> {
        nodes
            .iter()
            .zip(values)
            .map(|(node, v)| (node.member_id, round_to(*v, 3)))
            .collect()
    };
    let top = |values: &[f64]| -> Vec<KeyPlayer> {
        top_positions(values, TOP_N.min(n))
            .into_iter()
            .map(|i| key_player(nodes[i], values[i]))
            .collect()
    };

    Ok(CentralityReport {
        centrality_metrics: CentralityMetrics {
            degree: by_member(&degree),
            betweenness: by_member(&betweenness),
            closeness: by_member(&closeness),
            eigenvector: by_member(&eigenvector),
        },
        key_roles: KeyRoles {
            connectors: top(&betweenness),
            influencers: top(&eigenvector),
            hubs: top(&degree),
        },
        insights: insights::centrality_insights(&degree, &betweenness),
    })
}

fn key_player(node: &MemberNode, score: f64) -> KeyPlayer {
    KeyPlayer {
        member_id: node.member_id,
        name: if node.name.is_empty() {
            format!("Member {}", node.member_id)
        } else {
            node.name.clone()
        },
        role: node.role.clone().unwrap_or_else(|| "Unknown".to_string()),
        score: round_to(score, 3),
    }
}

/// Index of the first maximum.
fn first_max(values: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, v) in values.iter().enumerate() {
        if best.is_none_or(|b| *v > values[b]) {
            best = Some(i);
        }
    }
    best
}

/// Positions of the `k` largest values, descending; ties keep node order.
fn top_positions(values: &[f64], k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
    order.truncate(k);
    order
}
