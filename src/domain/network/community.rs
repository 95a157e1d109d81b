//! Community detection by greedy modularity maximization (Clauset-Newman-Moore).
//!
//! Modularity of a partition:
//! Q = Σ_c [ L_c / m - (D_c / 2m)^2 ]
//!
//! where m is the total edge weight, L_c the weight inside community c and
//! D_c the summed (weighted) degree of its nodes.

use super::{CommunicationNetwork, NetworkError};
use std::collections::BTreeMap;
use tracing::debug;

/// Agglomerative merge: start from singletons, repeatedly join the pair of
/// connected communities with the largest modularity gain, stop once the best
/// gain turns negative. Merges treat every edge as weight 1.
///
/// Among pairs with equal gain, the pair with the lowest `(a, b)` node
/// positions merges first, so the partition depends only on member id order.
///
/// Returns node positions grouped per community, each group sorted
/// ascending, groups ordered by size (largest first) then lowest node.
pub fn greedy_modularity_communities(net: &CommunicationNetwork) -> Vec<Vec<usize>> {
    let n = net.node_count();
    let edges = net.weighted_edges();
    if edges.is_empty() {
        return (0..n).map(|i| vec![i]).collect();
    }

    let m = edges.len() as f64;
    let mut groups: Vec<Option<Vec<usize>>> = (0..n).map(|i| Some(vec![i])).collect();
    let mut degree = vec![0.0f64; n];
    let mut between: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for &(a, b, _) in &edges {
        degree[a] += 1.0;
        degree[b] += 1.0;
        *between.entry((a.min(b), a.max(b))).or_insert(0.0) += 1.0;
    }

    loop {
        let mut best: Option<(f64, usize, usize)> = None;
        for (&(a, b), &links) in &between {
            let gain = links / m - degree[a] * degree[b] / (2.0 * m * m);
            if best.is_none_or(|(g, _, _)| gain > g) {
                best = Some((gain, a, b));
            }
        }
        let Some((gain, keep, absorb)) = best else {
            break;
        };
        if gain < 0.0 {
            break;
        }

        debug!(keep, absorb, gain, "merging communities");
        let moved = groups[absorb].take().unwrap_or_default();
        if let Some(target) = groups[keep].as_mut() {
            target.extend(moved);
        }
        degree[keep] += degree[absorb];
        degree[absorb] = 0.0;

        let touching: Vec<((usize, usize), f64)> = between
            .iter()
            .filter(|((a, b), _)| *a == absorb || *b == absorb)
            .map(|(k, v)| (*k, *v))
            .collect();
        for (key, links) in touching {
            between.remove(&key);
            let other = if key.0 == absorb { key.1 } else { key.0 };
            if other == keep {
                continue;
            }
            *between
                .entry((keep.min(other), keep.max(other)))
                .or_insert(0.0) += links;
        }
    }

    let mut result: Vec<Vec<usize>> = groups.into_iter().flatten().collect();
    for g in &mut result {
        g.sort_unstable();
    }
    result.sort_by(|a, b| b.len().cmp(&a.len()).then(a[0].cmp(&b[0])));
    result
}

/// Weighted modularity of a partition given as node-position groups.
pub fn modularity(
    net: &CommunicationNetwork,
    communities: &[Vec<usize>],
) -> Result<f64, NetworkError> {
    let edges = net.weighted_edges();
    let m: f64 = edges.iter().map(|(_, _, w)| w).sum();
    if m == 0.0 {
        return Err(NetworkError::NoEdges);
    }

    let mut label = vec![usize::MAX; net.node_count()];
    for (c, members) in communities.iter().enumerate() {
        for &node in members {
            label[node] = c;
        }
    }

    let mut inside = vec![0.0f64; communities.len()];
    let mut degree_sum = vec![0.0f64; communities.len()];
    for &(a, b, w) in &edges {
        let (ca, cb) = (label[a], label[b]);
        if ca == usize::MAX || cb == usize::MAX {
            continue;
        }
        degree_sum[ca] += w;
        degree_sum[cb] += w;
        if ca == cb {
            inside[ca] += w;
        }
    }

    let q: f64 = inside
        .iter()
        .zip(&degree_sum)
        .map(|(l, d)| l / m - (d / (2.0 * m)).powi(2))
        .sum();
    if q.is_finite() {
        Ok(q)
    } else {
        Err(NetworkError::NonFinite("modularity"))
    }
}
