//! CSV import of communication logs. Uses the `csv` crate with serde records.
//!
//! Columns: `sender_id,receiver_id,communication_type,duration_minutes,is_group,is_cross_team,timestamp`.
//! Every row goes through the registry, so the same validation applies as for
//! manual entry. Bad rows are counted and logged; they never abort the import.

use crate::domain::{CommunicationType, DomainError, MemberId, NewCommunication, TeamId};
use crate::ports::TeamRegistry;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct CommunicationRecord {
    sender_id: MemberId,
    receiver_id: Option<MemberId>,
    communication_type: String,
    duration_minutes: Option<f64>,
    is_group: Option<bool>,
    is_cross_team: Option<bool>,
    timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportStats {
    pub imported: usize,
    pub rejected: usize,
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` (UTC) or a bare date.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DomainError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| DomainError::Validation(format!("unrecognized timestamp '{}'", raw)))
}

fn to_new_communication(
    team_id: TeamId,
    record: CommunicationRecord,
) -> Result<NewCommunication, DomainError> {
    let communication_type: CommunicationType = record.communication_type.parse()?;
    Ok(NewCommunication {
        sender_id: record.sender_id,
        receiver_id: record.receiver_id,
        team_id,
        communication_type,
        duration_minutes: record.duration_minutes,
        is_group: record.is_group.unwrap_or(false),
        is_cross_team: record.is_cross_team.unwrap_or(false),
        timestamp: parse_timestamp(&record.timestamp)?,
    })
}

/// Parse CSV text into communications for `team_id`. Rows that fail to parse
/// are returned as `(line, reason)`.
pub fn parse_communications(
    team_id: TeamId,
    content: &str,
) -> (Vec<NewCommunication>, Vec<(u64, String)>) {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut parsed = Vec::new();
    let mut errors = Vec::new();
    for (i, result) in rdr.deserialize::<CommunicationRecord>().enumerate() {
        // header is line 1
        let line = i as u64 + 2;
        match result
            .map_err(|e| DomainError::Import(e.to_string()))
            .and_then(|record| to_new_communication(team_id, record))
        {
            Ok(c) => parsed.push(c),
            Err(e) => errors.push((line, e.to_string())),
        }
    }
    (parsed, errors)
}

/// Feeds CSV rows into a team registry.
pub struct CsvImporter {
    registry: Arc<dyn TeamRegistry>,
}

impl CsvImporter {
    pub fn new(registry: Arc<dyn TeamRegistry>) -> Self {
        Self { registry }
    }

    pub async fn import_file(
        &self,
        team_id: TeamId,
        path: impl AsRef<Path>,
    ) -> Result<ImportStats, DomainError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DomainError::Import(format!("{}: {}", path.display(), e)))?;
        let stats = self.import_str(team_id, &content).await?;
        info!(
            path = %path.display(),
            team_id,
            imported = stats.imported,
            rejected = stats.rejected,
            "csv import finished"
        );
        Ok(stats)
    }

    /// Only storage failures abort; validation failures count as rejected rows.
    pub async fn import_str(&self, team_id: TeamId, content: &str) -> Result<ImportStats, DomainError> {
        let (rows, parse_errors) = parse_communications(team_id, content);
        let mut stats = ImportStats {
            imported: 0,
            rejected: parse_errors.len(),
        };
        for (line, reason) in parse_errors {
            warn!(line, reason = %reason, "rejected csv row");
        }

        for row in rows {
            match self.registry.record_communication(&row).await {
                Ok(_) => stats.imported += 1,
                Err(e @ (DomainError::Validation(_) | DomainError::NotFound(_))) => {
                    warn!(sender_id = row.sender_id, error = %e, "rejected communication");
                    stats.rejected += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(stats)
    }
}
