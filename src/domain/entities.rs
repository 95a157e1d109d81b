//! Domain entities. Pure data structures for the core business.
//!
//! No database/IO types here; adapters map rows into these.

use crate::domain::DomainError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type TeamId = i64;
pub type MemberId = i64;

/// Longest accepted interaction: one working day.
pub const MAX_DURATION_MINUTES: f64 = 480.0;

/// A team whose communication is analyzed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A member of exactly one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub team_id: TeamId,
}

/// Input for registering a member.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub name: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub team_id: TeamId,
}

impl NewMember {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation(
                "member name cannot be empty or whitespace".into(),
            ));
        }
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(DomainError::Validation(format!(
                    "invalid email address: {}",
                    email
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommunicationType {
    FaceToFace,
    Email,
    Chat,
    Meeting,
    VideoCall,
    Phone,
    Other,
}

impl CommunicationType {
    pub const ALL: [CommunicationType; 7] = [
        CommunicationType::FaceToFace,
        CommunicationType::Email,
        CommunicationType::Chat,
        CommunicationType::Meeting,
        CommunicationType::VideoCall,
        CommunicationType::Phone,
        CommunicationType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommunicationType::FaceToFace => "face-to-face",
            CommunicationType::Email => "email",
            CommunicationType::Chat => "chat",
            CommunicationType::Meeting => "meeting",
            CommunicationType::VideoCall => "video-call",
            CommunicationType::Phone => "phone",
            CommunicationType::Other => "other",
        }
    }
}

impl fmt::Display for CommunicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommunicationType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .find(|t| t.as_str() == lower)
            .copied()
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|t| t.as_str()).collect();
                DomainError::Validation(format!(
                    "invalid communication type '{}'; must be one of: {}",
                    s,
                    valid.join(", ")
                ))
            })
    }
}

/// A logged communication event. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Communication {
    pub id: i64,
    pub sender_id: MemberId,
    /// `None` for group/broadcast communication.
    pub receiver_id: Option<MemberId>,
    pub team_id: TeamId,
    pub communication_type: CommunicationType,
    pub duration_minutes: Option<f64>,
    pub is_group: bool,
    /// Exploration signal: the event involved someone outside the team.
    pub is_cross_team: bool,
    pub timestamp: DateTime<Utc>,
}

/// Input for recording a communication. Validated before it reaches storage.
#[derive(Debug, Clone)]
pub struct NewCommunication {
    pub sender_id: MemberId,
    pub receiver_id: Option<MemberId>,
    pub team_id: TeamId,
    pub communication_type: CommunicationType,
    pub duration_minutes: Option<f64>,
    pub is_group: bool,
    pub is_cross_team: bool,
    pub timestamp: DateTime<Utc>,
}

impl NewCommunication {
    /// One-to-one communication stamped `timestamp`; flags default to internal, non-group.
    pub fn direct(
        team_id: TeamId,
        sender_id: MemberId,
        receiver_id: MemberId,
        communication_type: CommunicationType,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            sender_id,
            receiver_id: Some(receiver_id),
            team_id,
            communication_type,
            duration_minutes: None,
            is_group: false,
            is_cross_team: false,
            timestamp,
        }
    }

    pub fn with_duration(mut self, minutes: f64) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    pub fn cross_team(mut self) -> Self {
        self.is_cross_team = true;
        self
    }

    /// Reject records that would corrupt the metrics.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if let Some(d) = self.duration_minutes {
            if !d.is_finite() || d < 0.0 {
                return Err(DomainError::Validation("duration cannot be negative".into()));
            }
            if d > MAX_DURATION_MINUTES {
                return Err(DomainError::Validation(format!(
                    "duration cannot exceed {} minutes",
                    MAX_DURATION_MINUTES
                )));
            }
        }
        if self.timestamp > now {
            return Err(DomainError::Validation(
                "cannot record communications with future timestamps".into(),
            ));
        }
        if self.receiver_id == Some(self.sender_id) {
            return Err(DomainError::Validation(
                "sender and receiver must be different people".into(),
            ));
        }
        if self.is_group && self.receiver_id.is_some() {
            return Err(DomainError::Validation(
                "group communication cannot have a specific receiver".into(),
            ));
        }
        Ok(())
    }

    pub fn into_communication(self, id: i64) -> Communication {
        Communication {
            id,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            team_id: self.team_id,
            communication_type: self.communication_type,
            duration_minutes: self.duration_minutes,
            is_group: self.is_group,
            is_cross_team: self.is_cross_team,
            timestamp: self.timestamp,
        }
    }
}

/// Aggregate counts over a team's communications in a window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommunicationStats {
    pub total_communications: usize,
    pub face_to_face: usize,
    pub group_communications: usize,
    pub cross_team_communications: usize,
    pub avg_duration_minutes: f64,
}

impl CommunicationStats {
    /// Average duration ignores records without a duration.
    pub fn from_communications(comms: &[Communication]) -> Self {
        let durations: Vec<f64> = comms.iter().filter_map(|c| c.duration_minutes).collect();
        let avg_duration_minutes = if durations.is_empty() {
            0.0
        } else {
            durations.iter().sum::<f64>() / durations.len() as f64
        };
        Self {
            total_communications: comms.len(),
            face_to_face: comms
                .iter()
                .filter(|c| c.communication_type == CommunicationType::FaceToFace)
                .count(),
            group_communications: comms.iter().filter(|c| c.is_group).count(),
            cross_team_communications: comms.iter().filter(|c| c.is_cross_team).count(),
            avg_duration_minutes,
        }
    }
}

/// Closed time window `[start, end]` used for every calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, DomainError> {
        if end < start {
            return Err(DomainError::Validation(
                "end date must be after start date".into(),
            ));
        }
        Ok(Self { start, end })
    }

    /// `days` ending at `end`.
    pub fn ending_at(end: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: end - Duration::days(days),
            end,
        }
    }

    /// Fill in missing bounds: end defaults to now, start to `end - days`.
    pub fn resolve(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        days: i64,
    ) -> Result<Self, DomainError> {
        let end = end.unwrap_or_else(Utc::now);
        let start = start.unwrap_or(end - Duration::days(days));
        Self::new(start, end)
    }

    /// Whole days covered, never less than one.
    pub fn days_in_period(&self) -> i64 {
        (self.end - self.start).num_days().max(1)
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }
}

/// Persisted Three E's result. Append-only history per team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub id: i64,
    pub team_id: TeamId,
    pub energy_score: f64,
    pub engagement_score: f64,
    pub exploration_score: f64,
    pub overall_score: f64,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub total_communications: usize,
    pub participation_rate: f64,
    pub gini_coefficient: f64,
    pub calculated_at: DateTime<Utc>,
}

/// Snapshot fields supplied by the calculator; storage assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMetricsSnapshot {
    pub team_id: TeamId,
    pub energy_score: f64,
    pub engagement_score: f64,
    pub exploration_score: f64,
    pub overall_score: f64,
    pub window: DateWindow,
    pub total_communications: usize,
    pub participation_rate: f64,
    pub gini_coefficient: f64,
    pub calculated_at: DateTime<Utc>,
}

impl NewMetricsSnapshot {
    pub fn into_snapshot(self, id: i64) -> MetricsSnapshot {
        MetricsSnapshot {
            id,
            team_id: self.team_id,
            energy_score: self.energy_score,
            engagement_score: self.engagement_score,
            exploration_score: self.exploration_score,
            overall_score: self.overall_score,
            period_start: self.window.start,
            period_end: self.window.end,
            total_communications: self.total_communications,
            participation_rate: self.participation_rate,
            gini_coefficient: self.gini_coefficient,
            calculated_at: self.calculated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(now: DateTime<Utc>) -> NewCommunication {
        NewCommunication::direct(1, 10, 11, CommunicationType::Chat, now - Duration::hours(1))
    }

    #[test]
    fn test_communication_type_parse() {
        assert_eq!(
            "Face-To-Face".parse::<CommunicationType>().unwrap(),
            CommunicationType::FaceToFace
        );
        assert_eq!(
            "video-call".parse::<CommunicationType>().unwrap(),
            CommunicationType::VideoCall
        );
        assert!("carrier-pigeon".parse::<CommunicationType>().is_err());
        assert_eq!(CommunicationType::Phone.to_string(), "phone");
    }

    #[test]
    fn test_validate_rejects_bad_records() {
        let now = Utc::now();
        assert!(base(now).validate(now).is_ok());
        assert!(base(now).with_duration(481.0).validate(now).is_err());
        assert!(base(now).with_duration(-1.0).validate(now).is_err());
        assert!(base(now).with_duration(480.0).validate(now).is_ok());

        let mut future = base(now);
        future.timestamp = now + Duration::minutes(5);
        assert!(future.validate(now).is_err());

        let mut self_talk = base(now);
        self_talk.receiver_id = Some(self_talk.sender_id);
        assert!(self_talk.validate(now).is_err());

        let mut group = base(now);
        group.is_group = true;
        assert!(group.validate(now).is_err());
        group.receiver_id = None;
        assert!(group.validate(now).is_ok());
    }

    #[test]
    fn test_window_days_in_period() {
        let end = Utc::now();
        assert_eq!(DateWindow::ending_at(end, 30).days_in_period(), 30);
        let same = DateWindow::new(end, end).unwrap();
        assert_eq!(same.days_in_period(), 1);
        assert!(DateWindow::new(end, end - Duration::days(1)).is_err());
    }

    #[test]
    fn test_window_resolve_defaults() {
        let end = Utc::now();
        let w = DateWindow::resolve(None, Some(end), 30).unwrap();
        assert_eq!(w.end, end);
        assert_eq!(w.start, end - Duration::days(30));
        assert!(w.contains(end));
        assert!(!w.contains(end - Duration::days(31)));
    }

    #[test]
    fn test_stats_average_ignores_missing_durations() {
        let now = Utc::now();
        let comms = vec![
            base(now).with_duration(30.0).into_communication(1),
            base(now).into_communication(2),
            base(now).with_duration(10.0).cross_team().into_communication(3),
        ];
        let stats = CommunicationStats::from_communications(&comms);
        assert_eq!(stats.total_communications, 3);
        assert_eq!(stats.cross_team_communications, 1);
        assert_eq!(stats.face_to_face, 0);
        assert!((stats.avg_duration_minutes - 20.0).abs() < 1e-9);
    }
}
