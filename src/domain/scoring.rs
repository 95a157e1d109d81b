//! Three E's scoring. Pure functions over a team's members and the
//! communications logged in one window.
//!
//! Every component is normalized to [0, 1] before weighting, so each score
//! stays within [0, 100] regardless of input volume.

use crate::domain::{
    Communication, CommunicationType, DateWindow, EnergyReport, EngagementReport,
    ExplorationReport, Member, MemberId,
};
use std::collections::{HashMap, HashSet};

/// Communications per person per day treated as saturation.
pub const FREQUENCY_BENCHMARK: f64 = 5.0;
/// Minutes per person per day treated as saturation.
pub const DURATION_BENCHMARK_MINUTES: f64 = 120.0;
/// Cross-team communications per member treated as saturation.
pub const EXPLORATION_VOLUME_BENCHMARK: f64 = 5.0;

const ENERGY_WEIGHTS: (f64, f64, f64) = (20.0, 30.0, 50.0);
const ENGAGEMENT_WEIGHTS: (f64, f64, f64) = (40.0, 40.0, 20.0);
const EXPLORATION_WEIGHTS: (f64, f64, f64) = (40.0, 40.0, 20.0);

const OVERALL_ENERGY_WEIGHT: f64 = 0.35;
const OVERALL_ENGAGEMENT_WEIGHT: f64 = 0.40;
const OVERALL_EXPLORATION_WEIGHT: f64 = 0.25;

/// Round the exact binary value to `places` decimals, ties to even.
pub fn round_to(value: f64, places: usize) -> f64 {
    format!("{:.*}", places, value).parse().unwrap_or(value)
}

/// Energy: volume, frequency and face-to-face share of communication.
pub fn energy(members: &[Member], comms: &[Communication], window: &DateWindow) -> EnergyReport {
    if members.is_empty() || comms.is_empty() {
        return EnergyReport::default();
    }

    let num_members = members.len() as f64;
    let days = window.days_in_period() as f64;
    let total = comms.len();
    let total_duration: f64 = comms.iter().map(|c| c.duration_minutes.unwrap_or(0.0)).sum();
    let face_to_face = comms
        .iter()
        .filter(|c| c.communication_type == CommunicationType::FaceToFace)
        .count();

    let frequency = total as f64 / (num_members * days);
    let duration_per_member_per_day = total_duration / num_members / days;
    let face_to_face_ratio = face_to_face as f64 / total as f64;

    let freq_normalized = (frequency / FREQUENCY_BENCHMARK).min(1.0);
    let duration_normalized = (duration_per_member_per_day / DURATION_BENCHMARK_MINUTES).min(1.0);

    let (wf, wd, wx) = ENERGY_WEIGHTS;
    let score =
        (freq_normalized * wf + duration_normalized * wd + face_to_face_ratio * wx).clamp(0.0, 100.0);

    EnergyReport {
        energy_score: round_to(score, 2),
        total_communications: total,
        avg_communications_per_member: round_to(total as f64 / num_members, 2),
        total_duration_minutes: round_to(total_duration, 2),
        face_to_face_ratio: round_to(face_to_face_ratio, 2),
        frequency_normalized: round_to(freq_normalized, 2),
        duration_normalized: round_to(duration_normalized, 2),
    }
}

/// Engagement: participation, balance of voice and reciprocal dialogue.
pub fn engagement(members: &[Member], comms: &[Communication]) -> EngagementReport {
    if members.is_empty() || comms.is_empty() {
        return EngagementReport::default();
    }

    let member_ids: HashSet<MemberId> = members.iter().map(|m| m.id).collect();
    let n = member_ids.len();

    let mut sent: HashMap<MemberId, usize> = member_ids.iter().map(|&id| (id, 0)).collect();
    let mut pairs: HashMap<(MemberId, MemberId), usize> = HashMap::new();
    for c in comms {
        if let Some(count) = sent.get_mut(&c.sender_id) {
            *count += 1;
        }
        if let Some(r) = c.receiver_id {
            if member_ids.contains(&c.sender_id) && member_ids.contains(&r) {
                let key = (c.sender_id.min(r), c.sender_id.max(r));
                *pairs.entry(key).or_insert(0) += 1;
            }
        }
    }

    let active = sent.values().filter(|&&count| count > 0).count();
    let participation_rate = active as f64 / n as f64;

    let counts: Vec<f64> = sent.values().map(|&c| c as f64).collect();
    let gini = gini_coefficient(&counts);
    let balance_score = 1.0 - gini;

    // A pair counts as a dialogue once it has exchanged at least two messages.
    let two_way_pairs = pairs.values().filter(|&&count| count >= 2).count();
    let possible_pairs = (n * n.saturating_sub(1)) as f64 / 2.0;
    let two_way_score = if possible_pairs > 0.0 {
        two_way_pairs as f64 / possible_pairs
    } else {
        0.0
    };

    let (wp, wb, wt) = ENGAGEMENT_WEIGHTS;
    let score = participation_rate * wp + balance_score * wb + two_way_score * wt;

    EngagementReport {
        engagement_score: round_to(score, 2),
        participation_rate: round_to(participation_rate, 2),
        balance_score: round_to(balance_score, 2),
        two_way_communication_score: round_to(two_way_score, 2),
        gini_coefficient: round_to(gini, 3),
    }
}

/// Exploration: share and spread of cross-team communication.
///
/// Only an empty team short-circuits; a team with members but no
/// communications still goes through the formula and scores zero.
pub fn exploration(members: &[Member], comms: &[Communication]) -> ExplorationReport {
    if members.is_empty() {
        return ExplorationReport::default();
    }

    let member_ids: HashSet<MemberId> = members.iter().map(|m| m.id).collect();
    let n = member_ids.len() as f64;
    let total = comms.len();

    let cross_team: Vec<&Communication> = comms.iter().filter(|c| c.is_cross_team).collect();
    let exploring: HashSet<MemberId> = cross_team
        .iter()
        .map(|c| c.sender_id)
        .filter(|id| member_ids.contains(id))
        .collect();

    let cross_team_count = cross_team.len();
    let exploration_ratio = if total > 0 {
        cross_team_count as f64 / total as f64
    } else {
        0.0
    };
    let member_exploration_rate = exploring.len() as f64 / n;
    let avg_exploration = cross_team_count as f64 / n;

    let (wr, wm, wv) = EXPLORATION_WEIGHTS;
    let score = exploration_ratio * wr
        + member_exploration_rate * wm
        + (avg_exploration / EXPLORATION_VOLUME_BENCHMARK).min(1.0) * wv;

    ExplorationReport {
        exploration_score: round_to(score, 2),
        cross_team_communications: cross_team_count,
        exploration_ratio: round_to(exploration_ratio, 2),
        members_exploring: exploring.len(),
        member_exploration_rate: round_to(member_exploration_rate, 2),
    }
}

/// Weighted average of the three scores, rounded to two decimals.
pub fn overall_performance(energy: f64, engagement: f64, exploration: f64) -> f64 {
    round_to(
        energy * OVERALL_ENERGY_WEIGHT
            + engagement * OVERALL_ENGAGEMENT_WEIGHT
            + exploration * OVERALL_EXPLORATION_WEIGHT,
        2,
    )
}

/// Gini coefficient of non-negative values: 0 = perfect equality,
/// (n-1)/n = one value holds everything. Empty or all-zero input is 0.
pub fn gini_coefficient(values: &[f64]) -> f64 {
    if values.is_empty() || values.iter().all(|&v| v == 0.0) {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len() as f64;

    let mut running = 0.0;
    let mut cumsum_total = 0.0;
    for v in &sorted {
        running += v;
        cumsum_total += running;
    }
    if running == 0.0 {
        return 0.0;
    }

    (n + 1.0 - 2.0 * cumsum_total / running) / n
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewCommunication;
    use chrono::{Duration, Utc};

    fn team(n: i64) -> Vec<Member> {
        (1..=n)
            .map(|id| Member {
                id,
                name: format!("Member {}", id),
                email: None,
                role: Some("Engineer".into()),
                team_id: 1,
            })
            .collect()
    }

    fn comm(id: i64, from: MemberId, to: MemberId, kind: CommunicationType) -> Communication {
        NewCommunication::direct(1, from, to, kind, Utc::now() - Duration::days(1))
            .into_communication(id)
    }

    fn window() -> DateWindow {
        DateWindow::ending_at(Utc::now(), 30)
    }

    #[test]
    fn test_gini_perfect_equality() {
        assert!(gini_coefficient(&[1.0, 1.0, 1.0, 1.0]).abs() < 1e-9);
        assert!(gini_coefficient(&[7.0, 7.0, 7.0, 7.0]).abs() < 1e-9);
    }

    #[test]
    fn test_gini_concentrated() {
        assert!((gini_coefficient(&[0.0, 0.0, 0.0, 10.0]) - 0.75).abs() < 1e-9);
        let moderate = gini_coefficient(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(moderate > 0.2 && moderate < 0.4);
    }

    #[test]
    fn test_gini_degenerate_inputs() {
        assert_eq!(gini_coefficient(&[]), 0.0);
        assert_eq!(gini_coefficient(&[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_overall_weighted_average() {
        assert_eq!(overall_performance(80.0, 70.0, 60.0), 71.0);
        assert_eq!(overall_performance(0.0, 0.0, 0.0), 0.0);
        assert_eq!(overall_performance(100.0, 100.0, 100.0), 100.0);
        assert_eq!(overall_performance(33.33, 66.67, 12.5), 41.46);
    }

    #[test]
    fn test_rounding_resolves_ties_to_even() {
        // 0.25 * 0.5 = 0.125 exactly
        assert_eq!(overall_performance(0.0, 0.0, 0.5), 0.12);
        assert_eq!(round_to(0.375, 2), 0.38);
        // 2.675 is stored just below the tie
        assert_eq!(round_to(2.675, 2), 2.67);
        assert_eq!(round_to(0.3333, 3), 0.333);
        assert_eq!(round_to(-1.005, 2), -1.0);
    }

    #[test]
    fn test_energy_zero_without_communications() {
        let r = energy(&team(5), &[], &window());
        assert_eq!(r, EnergyReport::default());
        let r = energy(&[], &[comm(1, 1, 2, CommunicationType::Chat)], &window());
        assert_eq!(r.energy_score, 0.0);
    }

    #[test]
    fn test_energy_face_to_face_scenario() {
        let comms: Vec<Communication> = (0..20)
            .map(|i| {
                let mut c = comm(i, 1, 2, CommunicationType::FaceToFace);
                c.duration_minutes = Some(30.0);
                c
            })
            .collect();
        let r = energy(&team(5), &comms, &window());
        assert!(r.energy_score > 0.0);
        assert_eq!(r.total_communications, 20);
        assert_eq!(r.face_to_face_ratio, 1.0);
        assert_eq!(r.total_duration_minutes, 600.0);
        assert_eq!(r.avg_communications_per_member, 4.0);
        // 20 / (5*30) / 5 = 0.0267; 600/5/30/120 = 0.0333
        assert_eq!(r.energy_score, 51.53);
    }

    #[test]
    fn test_energy_email_scores_lower_than_face_to_face() {
        let f2f: Vec<_> = (0..10).map(|i| comm(i, 1, 2, CommunicationType::FaceToFace)).collect();
        let email: Vec<_> = (0..10).map(|i| comm(i, 1, 2, CommunicationType::Email)).collect();
        let members = team(5);
        assert!(
            energy(&members, &f2f, &window()).energy_score
                > energy(&members, &email, &window()).energy_score
        );
    }

    #[test]
    fn test_energy_capped_at_100() {
        let comms: Vec<_> = (0..5000)
            .map(|i| {
                let mut c = comm(i, 1, 2, CommunicationType::FaceToFace);
                c.duration_minutes = Some(480.0);
                c
            })
            .collect();
        let r = energy(&team(2), &comms, &DateWindow::ending_at(Utc::now(), 1));
        assert_eq!(r.energy_score, 100.0);
        assert_eq!(r.frequency_normalized, 1.0);
        assert_eq!(r.duration_normalized, 1.0);
    }

    #[test]
    fn test_engagement_balanced_team() {
        let members = team(5);
        let mut comms = Vec::new();
        let mut id = 0;
        for s in 1..=5 {
            for r in 1..=5 {
                if s != r {
                    for _ in 0..2 {
                        id += 1;
                        comms.push(comm(id, s, r, CommunicationType::FaceToFace));
                    }
                }
            }
        }
        let r = engagement(&members, &comms);
        assert_eq!(r.participation_rate, 1.0);
        assert!(r.gini_coefficient < 0.2);
        assert_eq!(r.two_way_communication_score, 1.0);
        assert_eq!(r.engagement_score, 100.0);
    }

    #[test]
    fn test_engagement_dominated_team() {
        let members = team(5);
        let mut comms: Vec<_> = (0..95)
            .map(|i| comm(i, 1, (i % 4) + 2, CommunicationType::FaceToFace))
            .collect();
        for (i, s) in [2, 3, 4, 5, 2].into_iter().enumerate() {
            comms.push(comm(100 + i as i64, s, 1, CommunicationType::FaceToFace));
        }
        let r = engagement(&members, &comms);
        assert!(r.gini_coefficient > 0.5);
        assert!(r.balance_score < 0.5);
        assert_eq!(r.participation_rate, 1.0);
    }

    #[test]
    fn test_engagement_partial_participation() {
        let comms: Vec<_> = (0..10)
            .map(|i| comm(i, (i % 3) + 1, ((i + 1) % 3) + 1, CommunicationType::Chat))
            .collect();
        let r = engagement(&team(5), &comms);
        assert!((r.participation_rate - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_engagement_two_way_counts_either_direction() {
        // Two messages one way still make the pair a dialogue.
        let comms = vec![
            comm(1, 1, 2, CommunicationType::Chat),
            comm(2, 1, 2, CommunicationType::Chat),
            comm(3, 3, 4, CommunicationType::Chat),
        ];
        let r = engagement(&team(4), &comms);
        // 1 of 6 possible pairs
        assert_eq!(r.two_way_communication_score, 0.17);
    }

    #[test]
    fn test_exploration_zero_without_cross_team() {
        let comms: Vec<_> = (0..20).map(|i| comm(i, 1, 2, CommunicationType::Chat)).collect();
        let r = exploration(&team(5), &comms);
        assert_eq!(r.exploration_score, 0.0);
        assert_eq!(r.cross_team_communications, 0);
    }

    #[test]
    fn test_exploration_half_cross_team() {
        let mut comms: Vec<_> = (0..10).map(|i| comm(i, 1, 2, CommunicationType::Chat)).collect();
        for i in 10..20 {
            let mut c = comm(i, 1, 2, CommunicationType::Chat);
            c.is_cross_team = true;
            comms.push(c);
        }
        let r = exploration(&team(5), &comms);
        assert_eq!(r.exploration_ratio, 0.5);
        assert_eq!(r.members_exploring, 1);
        assert_eq!(r.member_exploration_rate, 0.2);
        // 0.5*40 + 0.2*40 + min(2/5, 1)*20
        assert_eq!(r.exploration_score, 36.0);
    }

    #[test]
    fn test_exploration_all_cross_team() {
        let comms: Vec<_> = (0..4)
            .map(|i| {
                let mut c = comm(i, (i % 2) + 1, 3, CommunicationType::Meeting);
                c.is_cross_team = true;
                c
            })
            .collect();
        let r = exploration(&team(3), &comms);
        assert_eq!(r.exploration_ratio, 1.0);
        assert_eq!(r.members_exploring, 2);
    }

    #[test]
    fn test_exploration_members_without_communications() {
        let r = exploration(&team(3), &[]);
        assert_eq!(r.exploration_score, 0.0);
        assert_eq!(r.exploration_ratio, 0.0);
        assert_eq!(exploration(&[], &[]), ExplorationReport::default());
    }

    #[test]
    fn test_scores_bounded() {
        let members = team(3);
        let comms: Vec<_> = (0..300)
            .map(|i| {
                let mut c = comm(i, (i % 3) + 1, ((i + 1) % 3) + 1, CommunicationType::FaceToFace);
                c.is_cross_team = true;
                c.duration_minutes = Some(480.0);
                c
            })
            .collect();
        let w = DateWindow::ending_at(Utc::now(), 1);
        for s in [
            energy(&members, &comms, &w).energy_score,
            engagement(&members, &comms).engagement_score,
            exploration(&members, &comms).exploration_score,
        ] {
            assert!((0.0..=100.0).contains(&s));
        }
    }
}
