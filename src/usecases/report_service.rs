//! Report service. Turns calculation results into files under the reports directory.
//!
//! Markdown for Three E's results, pretty JSON for any analysis result.

use crate::domain::insights::{rating, recommendations};
use crate::domain::{DomainError, Team, ThreeEsReport};
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use tokio::fs;
use tracing::info;

pub struct ReportService {
    reports_dir: PathBuf,
}

impl ReportService {
    pub fn new(reports_dir: PathBuf) -> Self {
        Self { reports_dir }
    }

    /// Write `three_es_<team>_<timestamp>.md` and return its path.
    pub async fn write_three_es_report(
        &self,
        team: &Team,
        report: &ThreeEsReport,
    ) -> Result<PathBuf, DomainError> {
        self.ensure_dir().await?;
        let filename = format!(
            "three_es_{}_{}.md",
            team.id,
            report.calculated_at.format("%Y%m%d_%H%M%S")
        );
        let path = self.reports_dir.join(&filename);

        fs::write(&path, render_markdown(team, report))
            .await
            .map_err(|e| DomainError::Export(format!("Failed to write report: {}", e)))?;

        info!(path = %path.display(), team_id = team.id, "report generated");
        Ok(path)
    }

    /// Write any serializable result as `metrics_<timestamp>.json`.
    pub async fn export_json<T: Serialize + Sync>(&self, value: &T) -> Result<PathBuf, DomainError> {
        self.ensure_dir().await?;
        let filename = format!("metrics_{}.json", Utc::now().format("%Y%m%d_%H%M%S"));
        let path = self.reports_dir.join(&filename);

        let json = serde_json::to_string_pretty(value)
            .map_err(|e| DomainError::Export(format!("Failed to serialize: {}", e)))?;
        fs::write(&path, json)
            .await
            .map_err(|e| DomainError::Export(format!("Failed to write export: {}", e)))?;

        info!(path = %path.display(), "json exported");
        Ok(path)
    }

    async fn ensure_dir(&self) -> Result<(), DomainError> {
        fs::create_dir_all(&self.reports_dir)
            .await
            .map_err(|e| DomainError::Export(format!("Failed to create reports dir: {}", e)))
    }
}

/// Markdown body of a Three E's report.
pub fn render_markdown(team: &Team, report: &ThreeEsReport) -> String {
    let e = &report.energy;
    let g = &report.engagement;
    let x = &report.exploration;

    let mut md = String::new();
    md.push_str(&format!("# Three E's Report: {}\n\n", team.name));
    md.push_str(&format!(
        "**Team ID:** {} | **Period:** {} to {} | **Calculated:** {}\n\n",
        team.id,
        report.calculation_period.start.format("%Y-%m-%d"),
        report.calculation_period.end.format("%Y-%m-%d"),
        report.calculated_at.format("%Y-%m-%d %H:%M UTC")
    ));
    md.push_str("---\n\n");

    md.push_str("## Scores\n\n");
    md.push_str("| Metric | Score | Rating |\n|---|---|---|\n");
    for (label, score) in [
        ("Energy", e.energy_score),
        ("Engagement", g.engagement_score),
        ("Exploration", x.exploration_score),
        ("Overall", report.overall_score),
    ] {
        md.push_str(&format!("| {} | {:.2} | {} |\n", label, score, rating(score)));
    }
    md.push('\n');

    md.push_str("## Energy\n\n");
    md.push_str(&format!("- Total communications: {}\n", e.total_communications));
    md.push_str(&format!(
        "- Communications per member: {:.2}\n",
        e.avg_communications_per_member
    ));
    md.push_str(&format!(
        "- Total duration: {:.0} minutes\n",
        e.total_duration_minutes
    ));
    md.push_str(&format!("- Face-to-face ratio: {:.2}\n\n", e.face_to_face_ratio));

    md.push_str("## Engagement\n\n");
    md.push_str(&format!("- Participation rate: {:.2}\n", g.participation_rate));
    md.push_str(&format!("- Balance score: {:.2}\n", g.balance_score));
    md.push_str(&format!(
        "- Two-way communication: {:.2}\n",
        g.two_way_communication_score
    ));
    md.push_str(&format!("- Gini coefficient: {:.3}\n\n", g.gini_coefficient));

    md.push_str("## Exploration\n\n");
    md.push_str(&format!(
        "- Cross-team communications: {}\n",
        x.cross_team_communications
    ));
    md.push_str(&format!("- Exploration ratio: {:.2}\n", x.exploration_ratio));
    md.push_str(&format!(
        "- Members exploring: {} ({:.2})\n\n",
        x.members_exploring, x.member_exploration_rate
    ));

    md.push_str("## Recommendations\n\n");
    for rec in recommendations(e.energy_score, g.engagement_score, x.exploration_score) {
        md.push_str(&format!("- {}\n", rec));
    }
    md.push('\n');

    md.push_str("---\n");
    md.push_str("*Generated by orgnet*\n");
    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DateWindow, EnergyReport, EngagementReport, ExplorationReport};

    fn sample() -> (Team, ThreeEsReport) {
        let now = Utc::now();
        let team = Team {
            id: 7,
            name: "Payments".into(),
            description: None,
            created_at: now,
        };
        let report = ThreeEsReport {
            team_id: 7,
            calculation_period: DateWindow::ending_at(now, 30).into(),
            energy: EnergyReport {
                energy_score: 85.0,
                ..Default::default()
            },
            engagement: EngagementReport {
                engagement_score: 30.0,
                ..Default::default()
            },
            exploration: ExplorationReport::default(),
            overall_score: 41.75,
            calculated_at: now,
        };
        (team, report)
    }

    #[test]
    fn test_markdown_has_scores_and_recommendations() {
        let (team, report) = sample();
        let md = render_markdown(&team, &report);
        assert!(md.starts_with("# Three E's Report: Payments"));
        assert!(md.contains("| Energy | 85.00 | Excellent |"));
        assert!(md.contains("| Overall | 41.75 | Fair |"));
        assert!(md.contains("## Recommendations"));
    }

    #[tokio::test]
    async fn test_writes_report_and_export() {
        let dir = tempfile::tempdir().unwrap();
        let service = ReportService::new(dir.path().join("reports"));
        let (team, report) = sample();

        let md_path = service.write_three_es_report(&team, &report).await.unwrap();
        let name = md_path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("three_es_7_") && name.ends_with(".md"));

        let json_path = service.export_json(&report).await.unwrap();
        let raw = std::fs::read_to_string(json_path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["overall_score"], 41.75);
        assert_eq!(value["team_id"], 7);
    }
}
