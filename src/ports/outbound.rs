//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{
    Communication, CommunicationStats, DateWindow, DomainError, Member, MemberId,
    MetricsSnapshot, NewCommunication, NewMember, NewMetricsSnapshot, Team, TeamId,
};

/// Read side of the communication log. The calculators and the network
/// analyzer only ever read through this port.
#[async_trait::async_trait]
pub trait CommunicationStore: Send + Sync {
    /// Current members of a team, ordered by member id.
    async fn get_members(&self, team_id: TeamId) -> Result<Vec<Member>, DomainError>;

    /// Communications logged for the team with `window.start <= timestamp <= window.end`.
    async fn get_communications(
        &self,
        team_id: TeamId,
        window: &DateWindow,
    ) -> Result<Vec<Communication>, DomainError>;

    /// Communications the member sent or received within the window.
    async fn get_member_communications(
        &self,
        member_id: MemberId,
        window: &DateWindow,
    ) -> Result<Vec<Communication>, DomainError>;

    /// Aggregate counts over the same selection as `get_communications`.
    async fn get_communication_stats(
        &self,
        team_id: TeamId,
        window: &DateWindow,
    ) -> Result<CommunicationStats, DomainError>;
}

/// Append-only metrics history.
#[async_trait::async_trait]
pub trait MetricsRepo: Send + Sync {
    async fn save_snapshot(
        &self,
        snapshot: &NewMetricsSnapshot,
    ) -> Result<MetricsSnapshot, DomainError>;

    /// Most recent snapshot by `calculated_at`.
    async fn latest_snapshot(&self, team_id: TeamId)
    -> Result<Option<MetricsSnapshot>, DomainError>;

    /// Newest first, at most `limit` entries.
    async fn snapshot_history(
        &self,
        team_id: TeamId,
        limit: u32,
    ) -> Result<Vec<MetricsSnapshot>, DomainError>;

    /// Latest snapshot of every team that has one.
    async fn latest_snapshots(&self) -> Result<Vec<MetricsSnapshot>, DomainError>;
}

/// Write side for teams, members and communications. Implementations
/// validate input before storing it.
#[async_trait::async_trait]
pub trait TeamRegistry: Send + Sync {
    async fn create_team(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Team, DomainError>;

    async fn list_teams(&self) -> Result<Vec<Team>, DomainError>;

    async fn add_member(&self, member: &NewMember) -> Result<Member, DomainError>;

    async fn record_communication(
        &self,
        communication: &NewCommunication,
    ) -> Result<Communication, DomainError>;
}
