//! Implements InputPort. Inquire-based interactive menu over the use cases.
//!
//! Results are printed as pretty JSON; failures of a single action are shown
//! and the menu continues.

use crate::adapters::import::CsvImporter;
use crate::adapters::ui::progress::with_spinner;
use crate::domain::{
    CommunicationType, DateWindow, DomainError, Member, NewCommunication, NewMember, Team,
};
use crate::ports::{CommunicationStore, InputPort, MetricsRepo, TeamRegistry};
use crate::usecases::{NetworkAnalyzer, ReportService, ThreeEsCalculator};
use async_trait::async_trait;
use chrono::Utc;
use inquire::error::InquireError;
use inquire::ui::{Color, RenderConfig, Styled};
use inquire::{Confirm, CustomType, Select, Text};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Applies the prompt theme for every subsequent inquire prompt.
pub fn apply_theme() {
    let config = RenderConfig::default()
        .with_prompt_prefix(Styled::new("?").with_fg(Color::LightCyan))
        .with_highlighted_option_prefix(Styled::new(">").with_fg(Color::LightYellow))
        .with_answered_prompt_prefix(Styled::new("*").with_fg(Color::DarkGrey));
    inquire::set_global_render_config(config);
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MenuAction {
    SelectTeam,
    CreateTeam,
    AddMember,
    RecordCommunication,
    ImportCsv,
    ThreeEs,
    NetworkMetrics,
    Communities,
    Centrality,
    History,
    MemberActivity,
    AllTeams,
    Quit,
}

impl MenuAction {
    const ALL: [MenuAction; 13] = [
        MenuAction::SelectTeam,
        MenuAction::CreateTeam,
        MenuAction::AddMember,
        MenuAction::RecordCommunication,
        MenuAction::ImportCsv,
        MenuAction::ThreeEs,
        MenuAction::NetworkMetrics,
        MenuAction::Communities,
        MenuAction::Centrality,
        MenuAction::History,
        MenuAction::MemberActivity,
        MenuAction::AllTeams,
        MenuAction::Quit,
    ];

    /// Actions that act on the selected team.
    fn needs_team(self) -> bool {
        !matches!(
            self,
            MenuAction::SelectTeam | MenuAction::CreateTeam | MenuAction::AllTeams | MenuAction::Quit
        )
    }
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MenuAction::SelectTeam => "Select team",
            MenuAction::CreateTeam => "Create team",
            MenuAction::AddMember => "Add member",
            MenuAction::RecordCommunication => "Record communication",
            MenuAction::ImportCsv => "Import communications (CSV)",
            MenuAction::ThreeEs => "Calculate Three E's",
            MenuAction::NetworkMetrics => "Network metrics",
            MenuAction::Communities => "Detect communities",
            MenuAction::Centrality => "Centrality & key players",
            MenuAction::History => "Metrics history",
            MenuAction::MemberActivity => "Member activity",
            MenuAction::AllTeams => "Latest metrics for all teams",
            MenuAction::Quit => "Quit",
        };
        f.write_str(label)
    }
}

struct TeamChoice(Team);

impl fmt::Display for TeamChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0.name, self.0.id)
    }
}

struct MemberChoice(Member);

impl fmt::Display for MemberChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.role {
            Some(role) => write!(f, "{} [{}] ({})", self.0.name, role, self.0.id),
            None => write!(f, "{} ({})", self.0.name, self.0.id),
        }
    }
}

fn ui_err(e: InquireError) -> DomainError {
    DomainError::Ui(e.to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), DomainError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| DomainError::Ui(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

/// Interactive settings resolved from configuration.
#[derive(Debug, Clone)]
pub struct TuiSettings {
    pub window_days: i64,
    pub history_limit: u32,
    pub persist_metrics: bool,
}

/// TUI adapter. Inquire prompts.
pub struct TuiInputPort {
    registry: Arc<dyn TeamRegistry>,
    store: Arc<dyn CommunicationStore>,
    metrics: Arc<dyn MetricsRepo>,
    calculator: Arc<ThreeEsCalculator>,
    analyzer: Arc<NetworkAnalyzer>,
    reports: Arc<ReportService>,
    importer: Arc<CsvImporter>,
    settings: TuiSettings,
}

impl TuiInputPort {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<dyn TeamRegistry>,
        store: Arc<dyn CommunicationStore>,
        metrics: Arc<dyn MetricsRepo>,
        calculator: Arc<ThreeEsCalculator>,
        analyzer: Arc<NetworkAnalyzer>,
        reports: Arc<ReportService>,
        importer: Arc<CsvImporter>,
        settings: TuiSettings,
    ) -> Self {
        Self {
            registry,
            store,
            metrics,
            calculator,
            analyzer,
            reports,
            importer,
            settings,
        }
    }

    async fn pick_team(&self) -> Result<Option<Team>, DomainError> {
        let teams = self.registry.list_teams().await?;
        if teams.is_empty() {
            println!("No teams yet. Create one first.");
            return Ok(None);
        }
        let options: Vec<TeamChoice> = teams.into_iter().map(TeamChoice).collect();
        let choice = Select::new("Team:", options).prompt().map_err(ui_err)?;
        Ok(Some(choice.0))
    }

    async fn pick_member(&self, team: &Team, prompt: &str) -> Result<Option<Member>, DomainError> {
        let members = self.store.get_members(team.id).await?;
        if members.is_empty() {
            println!("Team {} has no members yet.", team.name);
            return Ok(None);
        }
        let options: Vec<MemberChoice> = members.into_iter().map(MemberChoice).collect();
        let choice = Select::new(prompt, options).prompt().map_err(ui_err)?;
        Ok(Some(choice.0))
    }

    fn prompt_window(&self) -> Result<DateWindow, DomainError> {
        let days = CustomType::<i64>::new("Window (days, ending now):")
            .with_default(self.settings.window_days)
            .with_error_message("Enter a whole number of days")
            .prompt()
            .map_err(ui_err)?;
        Ok(DateWindow::ending_at(Utc::now(), days.clamp(1, 365)))
    }

    async fn create_team(&self) -> Result<Option<Team>, DomainError> {
        let name = Text::new("Team name:").prompt().map_err(ui_err)?;
        let description = Text::new("Description (optional):")
            .prompt()
            .map_err(ui_err)?;
        let description = Some(description.trim()).filter(|d| !d.is_empty());
        let team = self.registry.create_team(&name, description).await?;
        print_json(&team)?;
        Ok(Some(team))
    }

    async fn add_member(&self, team: &Team) -> Result<(), DomainError> {
        let name = Text::new("Name:").prompt().map_err(ui_err)?;
        let optional = |label: &str| -> Result<Option<String>, DomainError> {
            let v = Text::new(label).prompt().map_err(ui_err)?;
            Ok(Some(v.trim().to_string()).filter(|v| !v.is_empty()))
        };
        let email = optional("Email (optional):")?;
        let role = optional("Role (optional):")?;
        let member = self
            .registry
            .add_member(&NewMember {
                name,
                email,
                role,
                team_id: team.id,
            })
            .await?;
        print_json(&member)
    }

    async fn record_communication(&self, team: &Team) -> Result<(), DomainError> {
        let Some(sender) = self.pick_member(team, "Sender:").await? else {
            return Ok(());
        };
        let is_group = Confirm::new("Group communication?")
            .with_default(false)
            .prompt()
            .map_err(ui_err)?;
        let receiver_id = if is_group {
            None
        } else {
            match self.pick_member(team, "Receiver:").await? {
                Some(m) => Some(m.id),
                None => return Ok(()),
            }
        };
        let communication_type = Select::new("Type:", CommunicationType::ALL.to_vec())
            .prompt()
            .map_err(ui_err)?;
        let duration_minutes = CustomType::<f64>::new("Duration in minutes (0 for none):")
            .with_default(0.0)
            .prompt()
            .map_err(ui_err)?;
        let is_cross_team = Confirm::new("Involves people outside the team?")
            .with_default(false)
            .prompt()
            .map_err(ui_err)?;

        let stored = self
            .registry
            .record_communication(&NewCommunication {
                sender_id: sender.id,
                receiver_id,
                team_id: team.id,
                communication_type,
                duration_minutes: (duration_minutes > 0.0).then_some(duration_minutes),
                is_group,
                is_cross_team,
                timestamp: Utc::now(),
            })
            .await?;
        print_json(&stored)
    }

    async fn import_csv(&self, team: &Team) -> Result<(), DomainError> {
        let path = Text::new("CSV path:").prompt().map_err(ui_err)?;
        let stats = with_spinner(
            "Importing communications...",
            self.importer.import_file(team.id, path.trim()),
        )
        .await?;
        print_json(&stats)
    }

    async fn three_es(&self, team: &Team) -> Result<(), DomainError> {
        let window = self.prompt_window()?;
        let persist = Confirm::new("Save snapshot to history?")
            .with_default(self.settings.persist_metrics)
            .prompt()
            .map_err(ui_err)?;
        let report = with_spinner(
            "Calculating Three E's...",
            self.calculator
                .calculate_all_metrics(team.id, Some(window.start), Some(window.end), persist),
        )
        .await?;
        print_json(&report)?;

        let write_report = Confirm::new("Write Markdown report?")
            .with_default(false)
            .prompt()
            .map_err(ui_err)?;
        if write_report {
            let path = self.reports.write_three_es_report(team, &report).await?;
            println!("Report written to {}", path.display());
        }
        Ok(())
    }

    async fn offer_export<T: Serialize + Sync>(&self, value: &T) -> Result<(), DomainError> {
        let export = Confirm::new("Export as JSON?")
            .with_default(false)
            .prompt()
            .map_err(ui_err)?;
        if export {
            let path = self.reports.export_json(value).await?;
            println!("Exported to {}", path.display());
        }
        Ok(())
    }

    async fn handle(&self, action: MenuAction, team: &Team) -> Result<(), DomainError> {
        match action {
            MenuAction::AddMember => self.add_member(team).await,
            MenuAction::RecordCommunication => self.record_communication(team).await,
            MenuAction::ImportCsv => self.import_csv(team).await,
            MenuAction::ThreeEs => self.three_es(team).await,
            MenuAction::NetworkMetrics => {
                let window = self.prompt_window()?;
                let result = with_spinner(
                    "Analyzing network...",
                    self.analyzer.analyze_network_metrics(team.id, &window),
                )
                .await?;
                print_json(&result)?;
                self.offer_export(&result).await
            }
            MenuAction::Communities => {
                let window = self.prompt_window()?;
                let result = with_spinner(
                    "Detecting communities...",
                    self.analyzer.detect_communities(team.id, &window),
                )
                .await?;
                print_json(&result)?;
                self.offer_export(&result).await
            }
            MenuAction::Centrality => {
                let window = self.prompt_window()?;
                let result = with_spinner(
                    "Calculating centrality...",
                    self.analyzer.calculate_advanced_centrality(team.id, &window),
                )
                .await?;
                print_json(&result)?;
                self.offer_export(&result).await
            }
            MenuAction::History => {
                let history = self
                    .metrics
                    .snapshot_history(team.id, self.settings.history_limit)
                    .await?;
                if history.is_empty() {
                    println!("No snapshots saved for {} yet.", team.name);
                    return Ok(());
                }
                print_json(&history)
            }
            MenuAction::MemberActivity => {
                let Some(member) = self.pick_member(team, "Member:").await? else {
                    return Ok(());
                };
                let window = self.prompt_window()?;
                let activity = self.calculator.member_activity(member.id, &window).await?;
                print_json(&activity)
            }
            MenuAction::SelectTeam
            | MenuAction::CreateTeam
            | MenuAction::AllTeams
            | MenuAction::Quit => Ok(()),
        }
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        let mut current: Option<Team> = None;
        loop {
            let title = match &current {
                Some(t) => format!("[{}] What next?", t.name),
                None => "What next?".to_string(),
            };
            let action = match Select::new(&title, MenuAction::ALL.to_vec()).prompt() {
                Ok(a) => a,
                Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                    return Ok(());
                }
                Err(e) => return Err(ui_err(e)),
            };

            let outcome = match action {
                MenuAction::Quit => return Ok(()),
                MenuAction::SelectTeam => self.pick_team().await.map(|t| {
                    if t.is_some() {
                        current = t;
                    }
                }),
                MenuAction::CreateTeam => self.create_team().await.map(|t| {
                    if t.is_some() {
                        current = t;
                    }
                }),
                MenuAction::AllTeams => match self.metrics.latest_snapshots().await {
                    Ok(latest) => print_json(&latest),
                    Err(e) => Err(e),
                },
                other => {
                    if current.is_none() && other.needs_team() {
                        current = self.pick_team().await.unwrap_or_else(|e| {
                            warn!(error = %e, "team selection failed");
                            None
                        });
                    }
                    match &current {
                        Some(team) => self.handle(other, team).await,
                        None => Ok(()),
                    }
                }
            };

            if let Err(e) = outcome {
                println!("Error: {}", e);
                warn!(error = %e, action = %action, "menu action failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_labels_are_unique() {
        let mut labels: Vec<String> = MenuAction::ALL.iter().map(|a| a.to_string()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), MenuAction::ALL.len());
    }

    #[test]
    fn test_team_scoped_actions() {
        assert!(MenuAction::ThreeEs.needs_team());
        assert!(MenuAction::MemberActivity.needs_team());
        assert!(!MenuAction::AllTeams.needs_team());
        assert!(!MenuAction::Quit.needs_team());
    }
}
