//! Three E's calculator. Fetches a team's members and communications for a
//! window and turns them into Energy, Engagement and Exploration scores.
//!
//! Each call re-reads the store; nothing is cached between calls.

use crate::domain::scoring;
use crate::domain::{
    DateWindow, DomainError, EnergyReport, EngagementReport, ExplorationReport, MemberActivity,
    MemberId, NewMetricsSnapshot, ThreeEsReport, TeamId,
};
use crate::ports::{CommunicationStore, MetricsRepo};
use crate::shared::config::DEFAULT_WINDOW_DAYS;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

pub struct ThreeEsCalculator {
    store: Arc<dyn CommunicationStore>,
    metrics: Arc<dyn MetricsRepo>,
    window_days: i64,
}

impl ThreeEsCalculator {
    pub fn new(store: Arc<dyn CommunicationStore>, metrics: Arc<dyn MetricsRepo>) -> Self {
        Self {
            store,
            metrics,
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }

    /// Override the default window length.
    pub fn with_window_days(mut self, days: i64) -> Self {
        self.window_days = days.max(1);
        self
    }

    /// Resolve optional bounds into a window using the configured default length.
    pub fn window(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<DateWindow, DomainError> {
        DateWindow::resolve(start, end, self.window_days)
    }

    pub async fn calculate_energy(
        &self,
        team_id: TeamId,
        window: &DateWindow,
    ) -> Result<EnergyReport, DomainError> {
        let members = self.store.get_members(team_id).await?;
        let comms = self.store.get_communications(team_id, window).await?;
        debug!(
            team_id,
            members = members.len(),
            communications = comms.len(),
            "calculating energy"
        );
        Ok(scoring::energy(&members, &comms, window))
    }

    pub async fn calculate_engagement(
        &self,
        team_id: TeamId,
        window: &DateWindow,
    ) -> Result<EngagementReport, DomainError> {
        let members = self.store.get_members(team_id).await?;
        let comms = self.store.get_communications(team_id, window).await?;
        debug!(
            team_id,
            members = members.len(),
            communications = comms.len(),
            "calculating engagement"
        );
        Ok(scoring::engagement(&members, &comms))
    }

    pub async fn calculate_exploration(
        &self,
        team_id: TeamId,
        window: &DateWindow,
    ) -> Result<ExplorationReport, DomainError> {
        let members = self.store.get_members(team_id).await?;
        let comms = self.store.get_communications(team_id, window).await?;
        debug!(
            team_id,
            members = members.len(),
            communications = comms.len(),
            "calculating exploration"
        );
        Ok(scoring::exploration(&members, &comms))
    }

    pub fn calculate_overall_performance(&self, energy: f64, engagement: f64, exploration: f64) -> f64 {
        scoring::overall_performance(energy, engagement, exploration)
    }

    /// Run all three calculators over one window and assemble the composite
    /// result. With `persist`, one snapshot is appended to the metrics history.
    pub async fn calculate_all_metrics(
        &self,
        team_id: TeamId,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        persist: bool,
    ) -> Result<ThreeEsReport, DomainError> {
        let window = self.window(start, end)?;

        let energy = self.calculate_energy(team_id, &window).await?;
        let engagement = self.calculate_engagement(team_id, &window).await?;
        let exploration = self.calculate_exploration(team_id, &window).await?;
        let overall_score = self.calculate_overall_performance(
            energy.energy_score,
            engagement.engagement_score,
            exploration.exploration_score,
        );

        let report = ThreeEsReport {
            team_id,
            calculation_period: window.into(),
            energy,
            engagement,
            exploration,
            overall_score,
            calculated_at: Utc::now(),
        };

        if persist {
            let stats = self.store.get_communication_stats(team_id, &window).await?;
            let saved = self
                .metrics
                .save_snapshot(&NewMetricsSnapshot {
                    team_id,
                    energy_score: report.energy.energy_score,
                    engagement_score: report.engagement.engagement_score,
                    exploration_score: report.exploration.exploration_score,
                    overall_score,
                    window,
                    total_communications: stats.total_communications,
                    participation_rate: report.engagement.participation_rate,
                    gini_coefficient: report.engagement.gini_coefficient,
                    calculated_at: report.calculated_at,
                })
                .await?;
            info!(team_id, snapshot_id = saved.id, "metrics snapshot saved");
        }

        info!(
            team_id,
            energy = report.energy.energy_score,
            engagement = report.engagement.engagement_score,
            exploration = report.exploration.exploration_score,
            overall = overall_score,
            "three E's calculated"
        );
        Ok(report)
    }

    /// Sent/received counts, cross-team volume and distinct contacts for one member.
    pub async fn member_activity(
        &self,
        member_id: MemberId,
        window: &DateWindow,
    ) -> Result<MemberActivity, DomainError> {
        let comms = self.store.get_member_communications(member_id, window).await?;
        let mut activity = MemberActivity {
            member_id,
            ..Default::default()
        };
        let mut contacts = HashSet::new();
        for c in &comms {
            if c.sender_id == member_id {
                activity.sent += 1;
                if c.is_cross_team {
                    activity.cross_team += 1;
                }
                if let Some(r) = c.receiver_id {
                    contacts.insert(r);
                }
            } else {
                activity.received += 1;
                contacts.insert(c.sender_id);
            }
            activity.total_duration_minutes += c.duration_minutes.unwrap_or(0.0);
        }
        activity.distinct_contacts = contacts.len();
        activity.total_duration_minutes = scoring::round_to(activity.total_duration_minutes, 2);
        Ok(activity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::InMemoryStore;
    use crate::domain::{CommunicationType, Member, NewCommunication, NewMember};
    use crate::ports::TeamRegistry;
    use chrono::Duration;

    struct Fixture {
        store: Arc<InMemoryStore>,
        calc: ThreeEsCalculator,
        team_id: TeamId,
        members: Vec<Member>,
        window: DateWindow,
    }

    async fn fixture(size: usize) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let team = store.create_team("Platform", None).await.unwrap();
        let mut members = Vec::new();
        for i in 0..size {
            members.push(
                store
                    .add_member(&NewMember {
                        name: format!("Member {}", i + 1),
                        email: None,
                        role: None,
                        team_id: team.id,
                    })
                    .await
                    .unwrap(),
            );
        }
        let end = Utc::now() - Duration::minutes(1);
        let calc = ThreeEsCalculator::new(store.clone(), store.clone());
        Fixture {
            store,
            calc,
            team_id: team.id,
            members,
            window: DateWindow::ending_at(end, 30),
        }
    }

    impl Fixture {
        async fn log(&self, from: usize, to: usize, kind: CommunicationType, count: usize) {
            for k in 0..count {
                let ts = self.window.end - Duration::hours(k as i64 + 1);
                let c = NewCommunication::direct(
                    self.team_id,
                    self.members[from].id,
                    self.members[to].id,
                    kind,
                    ts,
                );
                self.store.record_communication(&c).await.unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_face_to_face_pair_energy() {
        let f = fixture(5).await;
        for k in 0..20 {
            let c = NewCommunication::direct(
                f.team_id,
                f.members[0].id,
                f.members[1].id,
                CommunicationType::FaceToFace,
                f.window.end - Duration::hours(k + 1),
            )
            .with_duration(30.0);
            f.store.record_communication(&c).await.unwrap();
        }
        let energy = f.calc.calculate_energy(f.team_id, &f.window).await.unwrap();
        assert!(energy.energy_score > 0.0);
        assert_eq!(energy.total_communications, 20);
        assert_eq!(energy.face_to_face_ratio, 1.0);
        assert_eq!(energy.total_duration_minutes, 600.0);
    }

    #[tokio::test]
    async fn test_dominant_sender_is_unbalanced() {
        let f = fixture(5).await;
        for to in 1..5 {
            f.log(0, to, CommunicationType::Chat, if to == 1 { 23 } else { 24 })
                .await;
        }
        f.log(1, 0, CommunicationType::Chat, 5).await;
        let engagement = f.calc.calculate_engagement(f.team_id, &f.window).await.unwrap();
        assert!(engagement.gini_coefficient > 0.5);
        assert!(engagement.balance_score < 0.5);
        assert!(engagement.engagement_score <= 100.0);
    }

    #[tokio::test]
    async fn test_half_cross_team_exploration() {
        let f = fixture(3).await;
        for k in 0..20 {
            let mut c = NewCommunication::direct(
                f.team_id,
                f.members[0].id,
                f.members[1].id,
                CommunicationType::Email,
                f.window.end - Duration::hours(k + 1),
            );
            if k % 2 == 0 {
                c = c.cross_team();
            }
            f.store.record_communication(&c).await.unwrap();
        }
        let exploration = f
            .calc
            .calculate_exploration(f.team_id, &f.window)
            .await
            .unwrap();
        assert_eq!(exploration.exploration_ratio, 0.5);
        assert_eq!(exploration.cross_team_communications, 10);
        assert_eq!(exploration.members_exploring, 1);
    }

    #[tokio::test]
    async fn test_empty_team_scores_zero() {
        let f = fixture(0).await;
        let report = f
            .calc
            .calculate_all_metrics(f.team_id, Some(f.window.start), Some(f.window.end), false)
            .await
            .unwrap();
        assert_eq!(report.overall_score, 0.0);
        assert_eq!(report.energy, EnergyReport::default());
        assert_eq!(report.exploration, ExplorationReport::default());
    }

    #[tokio::test]
    async fn test_all_metrics_persists_one_snapshot() {
        let f = fixture(4).await;
        f.log(0, 1, CommunicationType::Meeting, 3).await;
        f.log(1, 0, CommunicationType::Meeting, 3).await;
        f.log(2, 3, CommunicationType::Chat, 2).await;

        let report = f
            .calc
            .calculate_all_metrics(f.team_id, Some(f.window.start), Some(f.window.end), true)
            .await
            .unwrap();
        let expected = scoring::overall_performance(
            report.energy.energy_score,
            report.engagement.engagement_score,
            report.exploration.exploration_score,
        );
        assert_eq!(report.overall_score, expected);
        assert_eq!(report.calculation_period.start, f.window.start);

        let history = f.store.snapshot_history(f.team_id, 10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].total_communications, 8);
        assert_eq!(history[0].overall_score, report.overall_score);
        assert_eq!(history[0].period_end, f.window.end);

        f.calc
            .calculate_all_metrics(f.team_id, Some(f.window.start), Some(f.window.end), false)
            .await
            .unwrap();
        assert_eq!(f.store.snapshot_history(f.team_id, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_all_metrics_are_repeatable_without_persisting() {
        let f = fixture(5).await;
        f.log(0, 1, CommunicationType::FaceToFace, 4).await;
        f.log(1, 0, CommunicationType::Chat, 2).await;
        f.log(2, 3, CommunicationType::Email, 3).await;
        f.log(4, 0, CommunicationType::Meeting, 1).await;

        let (start, end) = (Some(f.window.start), Some(f.window.end));
        let first = f
            .calc
            .calculate_all_metrics(f.team_id, start, end, false)
            .await
            .unwrap();
        let second = f
            .calc
            .calculate_all_metrics(f.team_id, start, end, false)
            .await
            .unwrap();
        assert_eq!(first.calculation_period, second.calculation_period);
        assert_eq!(first.energy, second.energy);
        assert_eq!(first.engagement, second.engagement);
        assert_eq!(first.exploration, second.exploration);
        assert_eq!(first.overall_score, second.overall_score);
        assert!(f.store.snapshot_history(f.team_id, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_inverted_window() {
        let f = fixture(2).await;
        let result = f
            .calc
            .calculate_all_metrics(f.team_id, Some(f.window.end), Some(f.window.start), false)
            .await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_member_activity_counts_both_directions() {
        let f = fixture(3).await;
        f.log(0, 1, CommunicationType::Chat, 2).await;
        f.log(2, 0, CommunicationType::Chat, 1).await;
        let activity = f
            .calc
            .member_activity(f.members[0].id, &f.window)
            .await
            .unwrap();
        assert_eq!(activity.sent, 2);
        assert_eq!(activity.received, 1);
        assert_eq!(activity.distinct_contacts, 2);
    }
}
