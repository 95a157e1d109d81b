//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here: the Three E's scoring, the
//! communication network and its graph metrics. Dependencies flow inward.

pub mod entities;
pub mod errors;
pub mod insights;
pub mod network;
pub mod reports;
pub mod scoring;

pub use entities::{
    Communication, CommunicationStats, CommunicationType, DateWindow, Member, MemberId,
    MetricsSnapshot, NewCommunication, NewMember, NewMetricsSnapshot, Team, TeamId,
};
pub use errors::DomainError;
pub use reports::{
    Analysis, AnalysisFailure, CalculationPeriod, CentralityMetrics, CentralityReport,
    CommunityGroup, CommunityReport, EnergyReport, EngagementReport, ExplorationReport, KeyPlayer,
    KeyRoles, MemberActivity, NetworkMetrics, NetworkMetricsReport, PartialNetworkMetrics,
    ThreeEsReport,
};
