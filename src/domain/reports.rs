//! Result shapes returned by the calculators and the network analyzer.
//!
//! All of them serialize to the JSON objects the front end prints or exports.

use crate::domain::{DateWindow, MemberId, TeamId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnergyReport {
    pub energy_score: f64,
    pub total_communications: usize,
    pub avg_communications_per_member: f64,
    pub total_duration_minutes: f64,
    pub face_to_face_ratio: f64,
    pub frequency_normalized: f64,
    pub duration_normalized: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngagementReport {
    pub engagement_score: f64,
    pub participation_rate: f64,
    pub balance_score: f64,
    pub two_way_communication_score: f64,
    /// Lower is better.
    pub gini_coefficient: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExplorationReport {
    pub exploration_score: f64,
    pub cross_team_communications: usize,
    pub exploration_ratio: f64,
    pub members_exploring: usize,
    pub member_exploration_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl From<DateWindow> for CalculationPeriod {
    fn from(w: DateWindow) -> Self {
        Self {
            start: w.start,
            end: w.end,
        }
    }
}

/// Composite Three E's result for one team and window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreeEsReport {
    pub team_id: TeamId,
    pub calculation_period: CalculationPeriod,
    pub energy: EnergyReport,
    pub engagement: EngagementReport,
    pub exploration: ExplorationReport,
    pub overall_score: f64,
    pub calculated_at: DateTime<Utc>,
}

/// Outcome of a network analysis. `Failed` serializes as `{"error": "..."}`,
/// which is the only failure signal callers need to check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Analysis<T> {
    Completed(T),
    Failed(AnalysisFailure),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisFailure {
    pub error: String,
}

impl<T> Analysis<T> {
    pub fn failed(error: impl Into<String>) -> Self {
        Analysis::Failed(AnalysisFailure {
            error: error.into(),
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Analysis::Failed(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Analysis::Failed(f) => Some(&f.error),
            Analysis::Completed(_) => None,
        }
    }

    pub fn completed(&self) -> Option<&T> {
        match self {
            Analysis::Completed(v) => Some(v),
            Analysis::Failed(_) => None,
        }
    }
}

/// Network structure summary. `Partial` is the fallback when centrality
/// could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NetworkMetricsReport {
    Full(NetworkMetrics),
    Partial(PartialNetworkMetrics),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkMetrics {
    pub density: f64,
    pub is_connected: bool,
    pub num_nodes: usize,
    pub num_edges: usize,
    pub most_central_member_id: Option<MemberId>,
    pub centrality_score: f64,
    pub potential_bottlenecks: Vec<MemberId>,
    pub avg_betweenness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialNetworkMetrics {
    pub density: f64,
    pub num_nodes: usize,
    pub num_edges: usize,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunityGroup {
    pub community_id: usize,
    pub member_ids: Vec<MemberId>,
    pub member_names: Vec<String>,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunityReport {
    pub num_communities: usize,
    pub communities: Vec<CommunityGroup>,
    pub modularity: f64,
    pub is_siloed: bool,
    pub interpretation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CentralityMetrics {
    pub degree: BTreeMap<MemberId, f64>,
    pub betweenness: BTreeMap<MemberId, f64>,
    pub closeness: BTreeMap<MemberId, f64>,
    pub eigenvector: BTreeMap<MemberId, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyPlayer {
    pub member_id: MemberId,
    pub name: String,
    pub role: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeyRoles {
    /// High betweenness: bridge parts of the network.
    pub connectors: Vec<KeyPlayer>,
    /// High eigenvector: connected to other well-connected people.
    pub influencers: Vec<KeyPlayer>,
    /// High degree: most direct connections.
    pub hubs: Vec<KeyPlayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CentralityReport {
    pub centrality_metrics: CentralityMetrics,
    pub key_roles: KeyRoles,
    pub insights: Vec<String>,
}

/// Per-member view over a window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemberActivity {
    pub member_id: MemberId,
    pub sent: usize,
    pub received: usize,
    pub cross_team: usize,
    pub total_duration_minutes: f64,
    pub distinct_contacts: usize,
}
