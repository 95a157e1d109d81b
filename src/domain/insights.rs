//! Human-readable interpretation of scores and network structure.
//!
//! Each rule set is an ordered list of (condition, outcome) pairs.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rating {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
    Poor,
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rating::Excellent => "Excellent",
            Rating::Good => "Good",
            Rating::Fair => "Fair",
            Rating::NeedsImprovement => "Needs Improvement",
            Rating::Poor => "Poor",
        };
        f.write_str(s)
    }
}

const RATING_THRESHOLDS: [(f64, Rating); 4] = [
    (80.0, Rating::Excellent),
    (60.0, Rating::Good),
    (40.0, Rating::Fair),
    (20.0, Rating::NeedsImprovement),
];

/// Qualitative rating of a 0-100 score.
pub fn rating(score: f64) -> Rating {
    RATING_THRESHOLDS
        .iter()
        .find(|(threshold, _)| score >= *threshold)
        .map(|(_, r)| *r)
        .unwrap_or(Rating::Poor)
}

const ENERGY_GOOD: f64 = 60.0;
const ENERGY_FAIR: f64 = 40.0;
const ENERGY_EXCELLENT: f64 = 80.0;
const ENGAGEMENT_GOOD: f64 = 65.0;
const ENGAGEMENT_FAIR: f64 = 45.0;
const ENGAGEMENT_EXCELLENT: f64 = 85.0;
const EXPLORATION_GOOD: f64 = 50.0;
const EXPLORATION_FAIR: f64 = 30.0;
const EXPLORATION_EXCELLENT: f64 = 70.0;

/// Every matching recommendation, in rule order.
pub fn recommendations(energy: f64, engagement: f64, exploration: f64) -> Vec<&'static str> {
    let rules = [
        (
            energy < ENERGY_FAIR,
            "Energy is low. Encourage more face-to-face communication and regular team interactions.",
        ),
        (
            (ENERGY_FAIR..ENERGY_GOOD).contains(&energy),
            "Increase communication frequency. Consider daily stand-ups or brief check-ins.",
        ),
        (
            engagement < ENGAGEMENT_FAIR,
            "Engagement needs improvement. Ensure all team members participate equally in discussions.",
        ),
        (
            engagement < ENGAGEMENT_FAIR,
            "Avoid communication dominated by single individuals. Encourage two-way dialogue.",
        ),
        (
            (ENGAGEMENT_FAIR..ENGAGEMENT_GOOD).contains(&engagement),
            "Good engagement, but can improve. Foster more back-channel communications and peer interactions.",
        ),
        (
            exploration < EXPLORATION_FAIR,
            "Exploration is limited. Encourage team members to engage with other teams and share findings.",
        ),
        (
            exploration < EXPLORATION_FAIR,
            "Set up cross-functional meetings and collaboration opportunities.",
        ),
        (
            (EXPLORATION_FAIR..EXPLORATION_GOOD).contains(&exploration),
            "Increase cross-team interactions. Promote serendipitous encounters through workspace design or events.",
        ),
        (
            energy >= ENERGY_EXCELLENT
                && engagement >= ENGAGEMENT_EXCELLENT
                && exploration >= EXPLORATION_EXCELLENT,
            "Excellent team performance! Maintain current communication patterns and continue to iterate.",
        ),
    ];

    let picked: Vec<&'static str> = rules
        .into_iter()
        .filter(|(cond, _)| *cond)
        .map(|(_, msg)| msg)
        .collect();

    if picked.is_empty() {
        vec![
            "Team performance is strong. Continue monitoring and maintain healthy communication patterns.",
        ]
    } else {
        picked
    }
}

/// Modularity above which the team is reported as siloed.
pub const SILO_MODULARITY: f64 = 0.4;

/// First matching rule wins.
pub fn interpret_communities(num_communities: usize, modularity: f64) -> String {
    let rules: [(bool, fn(usize, f64) -> String); 4] = [
        (num_communities == 1, |_, _| {
            "Team is well-integrated with no distinct sub-groups.".to_string()
        }),
        (modularity > 0.5, |n, q| {
            format!(
                "Warning: Team has {} distinct silos (high modularity: {:.2}). Consider cross-group activities to improve collaboration.",
                n, q
            )
        }),
        (modularity > 0.3, |n, q| {
            format!(
                "Team has {} sub-groups but maintains good cross-communication (moderate modularity: {:.2}).",
                n, q
            )
        }),
        (true, |n, q| {
            format!(
                "Team has {} informal groupings with excellent cross-communication (low modularity: {:.2}).",
                n, q
            )
        }),
    ];

    rules
        .iter()
        .find(|(cond, _)| *cond)
        .map(|(_, render)| render(num_communities, modularity))
        .unwrap_or_default()
}

/// Betweenness above which one person carries the network.
pub const OVER_CENTRALIZED_BETWEENNESS: f64 = 0.5;
/// Coefficient of variation below which betweenness counts as well spread.
pub const WELL_DISTRIBUTED_CV: f64 = 0.5;

pub const HEALTHY_NETWORK: &str = "Network structure appears healthy";

/// Insights from degree and betweenness centrality values (one entry per member).
pub fn centrality_insights(degree: &[f64], betweenness: &[f64]) -> Vec<String> {
    let mut insights = Vec::new();

    if betweenness
        .iter()
        .any(|&b| b > OVER_CENTRALIZED_BETWEENNESS)
    {
        insights.push(
            "Warning: Network is highly centralized around one person - consider distributing communication responsibilities"
                .to_string(),
        );
    }

    let isolated = degree.iter().filter(|&&d| d == 0.0).count();
    if isolated > 0 {
        insights.push(format!(
            "Warning: {} member(s) are isolated with no connections",
            isolated
        ));
    }

    if betweenness.len() > 3 {
        let (mean, std) = mean_and_std(betweenness);
        if mean > 0.0 && std / mean < WELL_DISTRIBUTED_CV {
            insights.push("Communication responsibility is well-distributed across team".to_string());
        }
    }

    if insights.is_empty() {
        insights.push(HEALTHY_NETWORK.to_string());
    }
    insights
}

/// Mean and population standard deviation.
pub fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_boundaries() {
        assert_eq!(rating(95.0), Rating::Excellent);
        assert_eq!(rating(80.0), Rating::Excellent);
        assert_eq!(rating(79.99), Rating::Good);
        assert_eq!(rating(40.0), Rating::Fair);
        assert_eq!(rating(20.0), Rating::NeedsImprovement);
        assert_eq!(rating(0.0), Rating::Poor);
        assert_eq!(Rating::NeedsImprovement.to_string(), "Needs Improvement");
    }

    #[test]
    fn test_recommendations_low_scores_collect_all_rules() {
        let recs = recommendations(10.0, 10.0, 10.0);
        assert_eq!(recs.len(), 5);
        assert!(recs[0].starts_with("Energy is low"));
    }

    #[test]
    fn test_recommendations_excellent() {
        let recs = recommendations(90.0, 90.0, 90.0);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].starts_with("Excellent"));
    }

    #[test]
    fn test_recommendations_default_when_nothing_matches() {
        let recs = recommendations(70.0, 70.0, 60.0);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].contains("strong"));
    }

    #[test]
    fn test_interpretation_order() {
        // A single community wins even with high modularity.
        assert!(interpret_communities(1, 0.9).contains("well-integrated"));
        assert!(interpret_communities(3, 0.6).starts_with("Warning"));
        assert!(interpret_communities(2, 0.35).contains("moderate modularity: 0.35"));
        assert!(interpret_communities(2, 0.1).contains("low modularity"));
    }

    #[test]
    fn test_centrality_insights_star() {
        // Hub of a 5-node star plus leaves.
        let degree = [1.0, 0.25, 0.25, 0.25, 0.25];
        let betweenness = [1.0, 0.0, 0.0, 0.0, 0.0];
        let insights = centrality_insights(&degree, &betweenness);
        assert_eq!(insights.len(), 1);
        assert!(insights[0].contains("highly centralized"));
    }

    #[test]
    fn test_centrality_insights_isolated_and_healthy() {
        let insights = centrality_insights(&[0.5, 0.5, 0.0, 0.0], &[0.0; 4]);
        assert_eq!(insights, vec!["Warning: 2 member(s) are isolated with no connections"]);

        let insights = centrality_insights(&[0.75; 4], &[0.0; 4]);
        assert_eq!(insights, vec![HEALTHY_NETWORK.to_string()]);

        let insights = centrality_insights(&[0.5; 4], &[0.2, 0.25, 0.2, 0.25]);
        assert!(insights[0].contains("well-distributed"));
    }

    #[test]
    fn test_mean_and_std() {
        let (m, s) = mean_and_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((m - 5.0).abs() < 1e-12);
        assert!((s - 2.0).abs() < 1e-12);
    }
}
