//! In-memory store. Implements every outbound port over `RwLock`-guarded vectors.
//!
//! Backs the service tests and ad-hoc runs without a database file.

use crate::domain::{
    Communication, CommunicationStats, DateWindow, DomainError, Member, MemberId,
    MetricsSnapshot, NewCommunication, NewMember, NewMetricsSnapshot, Team, TeamId,
};
use crate::ports::{CommunicationStore, MetricsRepo, TeamRegistry};
use chrono::Utc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    teams: Vec<Team>,
    members: Vec<Member>,
    communications: Vec<Communication>,
    snapshots: Vec<MetricsSnapshot>,
}

/// Volatile store. Ids are assigned sequentially per table, starting at 1.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a communication without validation. Lets tests seed history
    /// that the registry would reject (e.g. records in other teams' windows).
    pub async fn insert_communication(&self, communication: NewCommunication) -> Communication {
        let mut t = self.tables.write().await;
        let stored = communication.into_communication(t.communications.len() as i64 + 1);
        t.communications.push(stored.clone());
        stored
    }
}

#[async_trait::async_trait]
impl CommunicationStore for InMemoryStore {
    async fn get_members(&self, team_id: TeamId) -> Result<Vec<Member>, DomainError> {
        let t = self.tables.read().await;
        let mut members: Vec<Member> = t
            .members
            .iter()
            .filter(|m| m.team_id == team_id)
            .cloned()
            .collect();
        members.sort_by_key(|m| m.id);
        Ok(members)
    }

    async fn get_communications(
        &self,
        team_id: TeamId,
        window: &DateWindow,
    ) -> Result<Vec<Communication>, DomainError> {
        let t = self.tables.read().await;
        let mut comms: Vec<Communication> = t
            .communications
            .iter()
            .filter(|c| c.team_id == team_id && window.contains(c.timestamp))
            .cloned()
            .collect();
        comms.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(comms)
    }

    async fn get_member_communications(
        &self,
        member_id: MemberId,
        window: &DateWindow,
    ) -> Result<Vec<Communication>, DomainError> {
        let t = self.tables.read().await;
        let mut comms: Vec<Communication> = t
            .communications
            .iter()
            .filter(|c| c.sender_id == member_id || c.receiver_id == Some(member_id))
            .filter(|c| window.contains(c.timestamp))
            .cloned()
            .collect();
        comms.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(comms)
    }

    async fn get_communication_stats(
        &self,
        team_id: TeamId,
        window: &DateWindow,
    ) -> Result<CommunicationStats, DomainError> {
        let comms = self.get_communications(team_id, window).await?;
        Ok(CommunicationStats::from_communications(&comms))
    }
}

#[async_trait::async_trait]
impl MetricsRepo for InMemoryStore {
    async fn save_snapshot(
        &self,
        snapshot: &NewMetricsSnapshot,
    ) -> Result<MetricsSnapshot, DomainError> {
        let mut t = self.tables.write().await;
        let stored = snapshot.clone().into_snapshot(t.snapshots.len() as i64 + 1);
        t.snapshots.push(stored.clone());
        Ok(stored)
    }

    async fn latest_snapshot(
        &self,
        team_id: TeamId,
    ) -> Result<Option<MetricsSnapshot>, DomainError> {
        Ok(self.snapshot_history(team_id, 1).await?.into_iter().next())
    }

    async fn snapshot_history(
        &self,
        team_id: TeamId,
        limit: u32,
    ) -> Result<Vec<MetricsSnapshot>, DomainError> {
        let t = self.tables.read().await;
        let mut history: Vec<MetricsSnapshot> = t
            .snapshots
            .iter()
            .filter(|s| s.team_id == team_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| {
            b.calculated_at
                .cmp(&a.calculated_at)
                .then(b.id.cmp(&a.id))
        });
        history.truncate(limit as usize);
        Ok(history)
    }

    async fn latest_snapshots(&self) -> Result<Vec<MetricsSnapshot>, DomainError> {
        let team_ids: Vec<TeamId> = {
            let t = self.tables.read().await;
            let mut ids: Vec<TeamId> = t.snapshots.iter().map(|s| s.team_id).collect();
            ids.sort_unstable();
            ids.dedup();
            ids
        };
        let mut latest = Vec::with_capacity(team_ids.len());
        for team_id in team_ids {
            if let Some(s) = self.latest_snapshot(team_id).await? {
                latest.push(s);
            }
        }
        Ok(latest)
    }
}

#[async_trait::async_trait]
impl TeamRegistry for InMemoryStore {
    async fn create_team(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Team, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation(
                "team name cannot be empty or whitespace".into(),
            ));
        }
        let mut t = self.tables.write().await;
        if t.teams.iter().any(|team| team.name == name) {
            return Err(DomainError::Validation(format!(
                "team '{}' already exists",
                name
            )));
        }
        let team = Team {
            id: t.teams.len() as i64 + 1,
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: Utc::now(),
        };
        t.teams.push(team.clone());
        Ok(team)
    }

    async fn list_teams(&self) -> Result<Vec<Team>, DomainError> {
        Ok(self.tables.read().await.teams.clone())
    }

    async fn add_member(&self, member: &NewMember) -> Result<Member, DomainError> {
        member.validate()?;
        let mut t = self.tables.write().await;
        if !t.teams.iter().any(|team| team.id == member.team_id) {
            return Err(DomainError::NotFound(format!("team {}", member.team_id)));
        }
        if let Some(email) = &member.email {
            if t.members.iter().any(|m| m.email.as_ref() == Some(email)) {
                return Err(DomainError::Validation(format!(
                    "email {} is already registered",
                    email
                )));
            }
        }
        let stored = Member {
            id: t.members.len() as i64 + 1,
            name: member.name.trim().to_string(),
            email: member.email.clone(),
            role: member.role.clone(),
            team_id: member.team_id,
        };
        t.members.push(stored.clone());
        Ok(stored)
    }

    async fn record_communication(
        &self,
        communication: &NewCommunication,
    ) -> Result<Communication, DomainError> {
        communication.validate(Utc::now())?;
        {
            let t = self.tables.read().await;
            let sender_in_team = t
                .members
                .iter()
                .any(|m| m.id == communication.sender_id && m.team_id == communication.team_id);
            if !sender_in_team {
                return Err(DomainError::NotFound(format!(
                    "member {} in team {}",
                    communication.sender_id, communication.team_id
                )));
            }
        }
        Ok(self.insert_communication(communication.clone()).await)
    }
}
