//! SQLite-backed store via libsql. Implements CommunicationStore, MetricsRepo and TeamRegistry.
//!
//! One database file (orgnet.db) in the data directory. Timestamps are stored as
//! unix milliseconds so window filters are plain integer range scans.

use crate::domain::{
    Communication, CommunicationStats, DateWindow, DomainError, Member, MemberId,
    MetricsSnapshot, NewCommunication, NewMember, NewMetricsSnapshot, Team, TeamId,
};
use crate::ports::{CommunicationStore, MetricsRepo, TeamRegistry};
use chrono::{DateTime, Utc};
use libsql::{Connection, Database, Row, params};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SCHEMA: [&str; 9] = [
    r#"
CREATE TABLE IF NOT EXISTS teams (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT,
    created_at INTEGER NOT NULL
)"#,
    r#"
CREATE TABLE IF NOT EXISTS team_members (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT UNIQUE,
    role TEXT,
    team_id INTEGER NOT NULL REFERENCES teams (id)
)"#,
    r#"
CREATE TABLE IF NOT EXISTS communications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sender_id INTEGER NOT NULL REFERENCES team_members (id),
    receiver_id INTEGER,
    team_id INTEGER NOT NULL REFERENCES teams (id),
    communication_type TEXT NOT NULL,
    duration_minutes REAL,
    is_group INTEGER NOT NULL DEFAULT 0,
    is_cross_team INTEGER NOT NULL DEFAULT 0,
    timestamp INTEGER NOT NULL
)"#,
    r#"
CREATE TABLE IF NOT EXISTS team_metrics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    team_id INTEGER NOT NULL REFERENCES teams (id),
    energy_score REAL NOT NULL,
    engagement_score REAL NOT NULL,
    exploration_score REAL NOT NULL,
    overall_score REAL NOT NULL,
    period_start INTEGER NOT NULL,
    period_end INTEGER NOT NULL,
    total_communications INTEGER NOT NULL,
    participation_rate REAL NOT NULL,
    gini_coefficient REAL NOT NULL,
    calculated_at INTEGER NOT NULL
)"#,
    "CREATE INDEX IF NOT EXISTS idx_comm_team_timestamp ON communications (team_id, timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_comm_sender_timestamp ON communications (sender_id, timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_comm_team_cross_timestamp ON communications (team_id, is_cross_team, timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_comm_type ON communications (communication_type)",
    "CREATE INDEX IF NOT EXISTS idx_metrics_team_calculated ON team_metrics (team_id, calculated_at DESC)",
];

const COMMUNICATION_COLUMNS: &str = "id, sender_id, receiver_id, team_id, communication_type, \
     duration_minutes, is_group, is_cross_team, timestamp";

const SNAPSHOT_COLUMNS: &str = "id, team_id, energy_score, engagement_score, exploration_score, \
     overall_score, period_start, period_end, total_communications, participation_rate, \
     gini_coefficient, calculated_at";

/// SQLite store. Safe to share via Arc; every call opens its own connection.
pub struct SqliteRepo {
    db: Database,
    db_path: PathBuf,
}

impl SqliteRepo {
    /// Connect to (or create) `<base_dir>/orgnet.db` and ensure the schema exists.
    ///
    /// Sets WAL mode and synchronous=NORMAL for concurrent reads during writes.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(|e| DomainError::Repo(e.to_string()))?;
        let db_path = base.join("orgnet.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        let conn = db.connect().map_err(|e| DomainError::Repo(e.to_string()))?;

        // PRAGMA returns a row; consume it (execute fails when rows are returned).
        for pragma in ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL"] {
            let mut rows = conn
                .query(pragma, ())
                .await
                .map_err(|e| DomainError::Repo(format!("{} failed: {}", pragma, e)))?;
            while rows
                .next()
                .await
                .map_err(|e| DomainError::Repo(e.to_string()))?
                .is_some()
            {}
        }

        for ddl in SCHEMA {
            conn.execute(ddl, ())
                .await
                .map_err(|e| DomainError::Repo(e.to_string()))?;
        }

        info!(path = %db_path.display(), "SQLite connected with WAL mode");
        Ok(Self { db, db_path })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn conn(&self) -> Result<Connection, DomainError> {
        self.db.connect().map_err(|e| DomainError::Repo(e.to_string()))
    }

    async fn query_communications(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<Communication>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(sql, params)
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        let mut comms = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?
        {
            comms.push(row_to_communication(&row)?);
        }
        Ok(comms)
    }

    async fn query_snapshots(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<MetricsSnapshot>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(sql, params)
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        let mut snapshots = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?
        {
            snapshots.push(row_to_snapshot(&row)?);
        }
        Ok(snapshots)
    }

    /// Runs an `INSERT ... RETURNING id` and yields the new id.
    async fn insert_returning_id(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<i64, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(sql, params)
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        let row = rows
            .next()
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?
            .ok_or_else(|| DomainError::Repo("insert returned no id".into()))?;
        row.get::<i64>(0).map_err(|e| DomainError::Repo(e.to_string()))
    }

    async fn exists(&self, sql: &str, params: impl libsql::params::IntoParams) -> Result<bool, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(sql, params)
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        Ok(rows
            .next()
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?
            .is_some())
    }
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, DomainError> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| DomainError::Repo(format!("timestamp out of range: {}", ms)))
}

fn row_to_communication(row: &Row) -> Result<Communication, DomainError> {
    let kind: String = row.get(4).map_err(|e| DomainError::Repo(e.to_string()))?;
    Ok(Communication {
        id: row.get(0).map_err(|e| DomainError::Repo(e.to_string()))?,
        sender_id: row.get(1).map_err(|e| DomainError::Repo(e.to_string()))?,
        receiver_id: row.get::<i64>(2).ok(),
        team_id: row.get(3).map_err(|e| DomainError::Repo(e.to_string()))?,
        communication_type: kind.parse()?,
        duration_minutes: row.get::<f64>(5).ok(),
        is_group: row.get::<i64>(6).unwrap_or(0) != 0,
        is_cross_team: row.get::<i64>(7).unwrap_or(0) != 0,
        timestamp: from_millis(row.get(8).map_err(|e| DomainError::Repo(e.to_string()))?)?,
    })
}

fn row_to_snapshot(row: &Row) -> Result<MetricsSnapshot, DomainError> {
    let real = |i: i32| row.get::<f64>(i).map_err(|e| DomainError::Repo(e.to_string()));
    let int = |i: i32| row.get::<i64>(i).map_err(|e| DomainError::Repo(e.to_string()));
    Ok(MetricsSnapshot {
        id: int(0)?,
        team_id: int(1)?,
        energy_score: real(2)?,
        engagement_score: real(3)?,
        exploration_score: real(4)?,
        overall_score: real(5)?,
        period_start: from_millis(int(6)?)?,
        period_end: from_millis(int(7)?)?,
        total_communications: int(8)?.max(0) as usize,
        participation_rate: real(9)?,
        gini_coefficient: real(10)?,
        calculated_at: from_millis(int(11)?)?,
    })
}

#[async_trait::async_trait]
impl CommunicationStore for SqliteRepo {
    async fn get_members(&self, team_id: TeamId) -> Result<Vec<Member>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT id, name, email, role, team_id FROM team_members WHERE team_id = ?1 ORDER BY id",
                params![team_id],
            )
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        let mut members = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?
        {
            members.push(Member {
                id: row.get(0).map_err(|e| DomainError::Repo(e.to_string()))?,
                name: row.get::<String>(1).unwrap_or_default(),
                email: row.get::<String>(2).ok(),
                role: row.get::<String>(3).ok(),
                team_id: row.get(4).map_err(|e| DomainError::Repo(e.to_string()))?,
            });
        }
        Ok(members)
    }

    async fn get_communications(
        &self,
        team_id: TeamId,
        window: &DateWindow,
    ) -> Result<Vec<Communication>, DomainError> {
        let sql = format!(
            "SELECT {} FROM communications \
             WHERE team_id = ?1 AND timestamp >= ?2 AND timestamp <= ?3 \
             ORDER BY timestamp DESC, id DESC",
            COMMUNICATION_COLUMNS
        );
        let comms = self
            .query_communications(
                &sql,
                params![
                    team_id,
                    window.start.timestamp_millis(),
                    window.end.timestamp_millis()
                ],
            )
            .await?;
        debug!(team_id, count = comms.len(), "loaded communications");
        Ok(comms)
    }

    async fn get_member_communications(
        &self,
        member_id: MemberId,
        window: &DateWindow,
    ) -> Result<Vec<Communication>, DomainError> {
        let sql = format!(
            "SELECT {} FROM communications \
             WHERE (sender_id = ?1 OR receiver_id = ?1) AND timestamp >= ?2 AND timestamp <= ?3 \
             ORDER BY timestamp DESC, id DESC",
            COMMUNICATION_COLUMNS
        );
        self.query_communications(
            &sql,
            params![
                member_id,
                window.start.timestamp_millis(),
                window.end.timestamp_millis()
            ],
        )
        .await
    }

    async fn get_communication_stats(
        &self,
        team_id: TeamId,
        window: &DateWindow,
    ) -> Result<CommunicationStats, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(CASE WHEN communication_type = 'face-to-face' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(is_group), 0),
                    COALESCE(SUM(is_cross_team), 0),
                    COALESCE(AVG(duration_minutes), 0.0)
                FROM communications
                WHERE team_id = ?1 AND timestamp >= ?2 AND timestamp <= ?3
                "#,
                params![
                    team_id,
                    window.start.timestamp_millis(),
                    window.end.timestamp_millis()
                ],
            )
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?
        else {
            return Ok(CommunicationStats::default());
        };
        let count = |i: i32| -> usize { row.get::<i64>(i).unwrap_or(0).max(0) as usize };
        Ok(CommunicationStats {
            total_communications: count(0),
            face_to_face: count(1),
            group_communications: count(2),
            cross_team_communications: count(3),
            avg_duration_minutes: row.get::<f64>(4).unwrap_or(0.0),
        })
    }
}

#[async_trait::async_trait]
impl MetricsRepo for SqliteRepo {
    async fn save_snapshot(
        &self,
        snapshot: &NewMetricsSnapshot,
    ) -> Result<MetricsSnapshot, DomainError> {
        let id = self
            .insert_returning_id(
                r#"
                INSERT INTO team_metrics (
                    team_id, energy_score, engagement_score, exploration_score, overall_score,
                    period_start, period_end, total_communications, participation_rate,
                    gini_coefficient, calculated_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                RETURNING id
                "#,
                params![
                    snapshot.team_id,
                    snapshot.energy_score,
                    snapshot.engagement_score,
                    snapshot.exploration_score,
                    snapshot.overall_score,
                    snapshot.window.start.timestamp_millis(),
                    snapshot.window.end.timestamp_millis(),
                    snapshot.total_communications as i64,
                    snapshot.participation_rate,
                    snapshot.gini_coefficient,
                    snapshot.calculated_at.timestamp_millis()
                ],
            )
            .await?;
        info!(team_id = snapshot.team_id, id, "saved metrics snapshot");
        Ok(snapshot.clone().into_snapshot(id))
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
        let sql = format!(
            "SELECT {} FROM team_metrics WHERE team_id = ?1 \
             ORDER BY calculated_at DESC, id DESC LIMIT ?2",
            SNAPSHOT_COLUMNS
        );
        self.query_snapshots(&sql, params![team_id, limit as i64]).await
    }

    async fn latest_snapshots(&self) -> Result<Vec<MetricsSnapshot>, DomainError> {
        // Highest id among the rows sharing each team's newest calculated_at.
        let sql = format!(
            "SELECT {} FROM team_metrics m WHERE m.id = (\
                 SELECT id FROM team_metrics WHERE team_id = m.team_id \
                 ORDER BY calculated_at DESC, id DESC LIMIT 1\
             ) ORDER BY m.team_id",
            SNAPSHOT_COLUMNS
        );
        self.query_snapshots(&sql, ()).await
    }
}

#[async_trait::async_trait]
impl TeamRegistry for SqliteRepo {
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
        if self
            .exists("SELECT 1 FROM teams WHERE name = ?1", params![name])
            .await?
        {
            return Err(DomainError::Validation(format!(
                "team '{}' already exists",
                name
            )));
        }
        let created_at = Utc::now();
        let id = self
            .insert_returning_id(
                "INSERT INTO teams (name, description, created_at) VALUES (?1, ?2, ?3) RETURNING id",
                params![name, description, created_at.timestamp_millis()],
            )
            .await?;
        info!(team_id = id, name, "team created");
        Ok(Team {
            id,
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: from_millis(created_at.timestamp_millis())?,
        })
    }

    async fn list_teams(&self) -> Result<Vec<Team>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT id, name, description, created_at FROM teams ORDER BY id",
                (),
            )
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        let mut teams = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?
        {
            teams.push(Team {
                id: row.get(0).map_err(|e| DomainError::Repo(e.to_string()))?,
                name: row.get::<String>(1).unwrap_or_default(),
                description: row.get::<String>(2).ok(),
                created_at: from_millis(row.get(3).map_err(|e| DomainError::Repo(e.to_string()))?)?,
            });
        }
        Ok(teams)
    }

    async fn add_member(&self, member: &NewMember) -> Result<Member, DomainError> {
        member.validate()?;
        if !self
            .exists("SELECT 1 FROM teams WHERE id = ?1", params![member.team_id])
            .await?
        {
            return Err(DomainError::NotFound(format!("team {}", member.team_id)));
        }
        if let Some(email) = member.email.as_deref() {
            if self
                .exists("SELECT 1 FROM team_members WHERE email = ?1", params![email])
                .await?
            {
                return Err(DomainError::Validation(format!(
                    "email {} is already registered",
                    email
                )));
            }
        }
        let name = member.name.trim();
        let id = self
            .insert_returning_id(
                "INSERT INTO team_members (name, email, role, team_id) VALUES (?1, ?2, ?3, ?4) RETURNING id",
                params![
                    name,
                    member.email.as_deref(),
                    member.role.as_deref(),
                    member.team_id
                ],
            )
            .await?;
        Ok(Member {
            id,
            name: name.to_string(),
            email: member.email.clone(),
            role: member.role.clone(),
            team_id: member.team_id,
        })
    }

    async fn record_communication(
        &self,
        communication: &NewCommunication,
    ) -> Result<Communication, DomainError> {
        communication.validate(Utc::now())?;
        if !self
            .exists(
                "SELECT 1 FROM team_members WHERE id = ?1 AND team_id = ?2",
                params![communication.sender_id, communication.team_id],
            )
            .await?
        {
            return Err(DomainError::NotFound(format!(
                "member {} in team {}",
                communication.sender_id, communication.team_id
            )));
        }
        let ts = communication.timestamp.timestamp_millis();
        let id = self
            .insert_returning_id(
                r#"
                INSERT INTO communications (
                    sender_id, receiver_id, team_id, communication_type, duration_minutes,
                    is_group, is_cross_team, timestamp
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                RETURNING id
                "#,
                params![
                    communication.sender_id,
                    communication.receiver_id,
                    communication.team_id,
                    communication.communication_type.as_str(),
                    communication.duration_minutes,
                    communication.is_group as i64,
                    communication.is_cross_team as i64,
                    ts
                ],
            )
            .await?;
        let mut stored = communication.clone().into_communication(id);
        stored.timestamp = from_millis(ts)?;
        Ok(stored)
    }
}
