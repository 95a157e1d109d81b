//! Node centrality measures over the unweighted communication network.
//!
//! Every function returns one value per node, in [`CommunicationNetwork::nodes`] order.

use super::{CommunicationNetwork, NetworkError};
use std::collections::VecDeque;

/// Default power-iteration budget for eigenvector centrality.
pub const EIGENVECTOR_MAX_ITER: usize = 1000;
pub const EIGENVECTOR_TOLERANCE: f64 = 1e-6;

/// Fraction of other nodes each node is directly connected to.
/// A lone node is defined as fully central.
pub fn degree_centrality(net: &CommunicationNetwork) -> Vec<f64> {
    let n = net.node_count();
    if n <= 1 {
        return vec![1.0; n];
    }
    let scale = 1.0 / (n - 1) as f64;
    net.adjacency()
        .iter()
        .map(|nbrs| nbrs.len() as f64 * scale)
        .collect()
}

/// Normalized betweenness (Brandes): the share of shortest paths between
/// other node pairs that run through each node.
pub fn betweenness_centrality(net: &CommunicationNetwork) -> Result<Vec<f64>, NetworkError> {
    let adj = net.adjacency();
    let n = adj.len();
    let mut cb = vec![0.0; n];

    for s in 0..n {
        let mut stack = Vec::with_capacity(n);
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0f64; n];
        let mut dist = vec![-1i64; n];
        sigma[s] = 1.0;
        dist[s] = 0;

        let mut queue = VecDeque::from([s]);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for &w in &adj[v] {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
            }
        }

        let mut delta = vec![0.0f64; n];
        while let Some(w) = stack.pop() {
            for &v in &preds[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != s {
                cb[w] += delta[w];
            }
        }
    }

    // Each unordered pair was counted from both ends.
    if n > 2 {
        let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
        cb.iter_mut().for_each(|v| *v *= scale);
    }

    ensure_finite(cb, "betweenness")
}

/// Closeness with the Wasserman-Faust correction for disconnected graphs:
/// `(r-1)/sum_dist * (r-1)/(n-1)` where `r` counts nodes reachable from the node.
pub fn closeness_centrality(net: &CommunicationNetwork) -> Result<Vec<f64>, NetworkError> {
    let adj = net.adjacency();
    let n = adj.len();
    let mut out = vec![0.0; n];

    for (u, slot) in out.iter_mut().enumerate() {
        let dist = bfs_distances(&adj, u);
        let reachable: Vec<usize> = dist.iter().filter_map(|d| *d).collect();
        let total: usize = reachable.iter().sum();
        if total > 0 && n > 1 {
            let r = (reachable.len() - 1) as f64;
            *slot = r / total as f64 * (r / (n - 1) as f64);
        }
    }

    ensure_finite(out, "closeness")
}

/// Eigenvector centrality by power iteration on `A + I`, normalized to unit
/// Euclidean length. Fails on an empty graph or when the iteration does not
/// settle within `max_iter` rounds.
pub fn eigenvector_centrality(
    net: &CommunicationNetwork,
    max_iter: usize,
    tol: f64,
) -> Result<Vec<f64>, NetworkError> {
    let adj = net.adjacency();
    let n = adj.len();
    if n == 0 {
        return Err(NetworkError::EmptyGraph);
    }

    let mut x = vec![1.0 / n as f64; n];
    for _ in 0..max_iter {
        let last = x.clone();
        for (u, nbrs) in adj.iter().enumerate() {
            for &v in nbrs {
                x[v] += last[u];
            }
        }
        let norm = x.iter().map(|v| v * v).sum::<f64>().sqrt();
        let norm = if norm == 0.0 { 1.0 } else { norm };
        x.iter_mut().for_each(|v| *v /= norm);

        let change: f64 = x.iter().zip(&last).map(|(a, b)| (a - b).abs()).sum();
        if change < n as f64 * tol {
            return ensure_finite(x, "eigenvector");
        }
    }

    Err(NetworkError::NoConvergence {
        iterations: max_iter,
    })
}

fn bfs_distances(adj: &[Vec<usize>], source: usize) -> Vec<Option<usize>> {
    let mut dist = vec![None; adj.len()];
    dist[source] = Some(0);
    let mut queue = VecDeque::from([source]);
    while let Some(v) = queue.pop_front() {
        let next = dist[v].map(|d| d + 1);
        for &w in &adj[v] {
            if dist[w].is_none() {
                dist[w] = next;
                queue.push_back(w);
            }
        }
    }
    dist
}

fn ensure_finite(values: Vec<f64>, what: &'static str) -> Result<Vec<f64>, NetworkError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(values)
    } else {
        Err(NetworkError::NonFinite(what))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_star_betweenness() {
        let net = CommunicationNetwork::build(&members(5), &comms(&star_pairs(3, 5)));
        let b = betweenness_centrality(&net).unwrap();
        assert!(approx(b[2], 1.0));
        for i in [0, 1, 3, 4] {
            assert!(approx(b[i], 0.0));
        }
    }

    #[test]
    fn test_path_betweenness_and_closeness() {
        // 1 - 2 - 3
        let net = CommunicationNetwork::build(&members(3), &comms(&[(1, 2), (2, 3)]));
        let b = betweenness_centrality(&net).unwrap();
        assert!(approx(b[1], 1.0));
        assert!(approx(b[0], 0.0));

        let c = closeness_centrality(&net).unwrap();
        assert!(approx(c[1], 1.0));
        assert!(approx(c[0], 2.0 / 3.0));
    }

    #[test]
    fn test_closeness_disconnected_is_scaled() {
        // 1 - 2, 3 and 4 isolated
        let net = CommunicationNetwork::build(&members(4), &comms(&[(1, 2)]));
        let c = closeness_centrality(&net).unwrap();
        assert!(approx(c[0], 1.0 / 3.0));
        assert!(approx(c[2], 0.0));
    }

    #[test]
    fn test_degree_centrality() {
        let net = CommunicationNetwork::build(&members(5), &comms(&star_pairs(1, 5)));
        let d = degree_centrality(&net);
        assert!(approx(d[0], 1.0));
        assert!(approx(d[1], 0.25));

        let single = CommunicationNetwork::build(&members(1), &[]);
        assert_eq!(degree_centrality(&single), vec![1.0]);
    }

    #[test]
    fn test_eigenvector_complete_graph_is_uniform() {
        let net = CommunicationNetwork::build(&members(4), &comms(&complete_pairs(4)));
        let e = eigenvector_centrality(&net, EIGENVECTOR_MAX_ITER, EIGENVECTOR_TOLERANCE).unwrap();
        for v in &e {
            assert!(approx(*v, 0.5));
        }
    }

    #[test]
    fn test_eigenvector_star_center_dominates() {
        let net = CommunicationNetwork::build(&members(5), &comms(&star_pairs(1, 5)));
        let e = eigenvector_centrality(&net, EIGENVECTOR_MAX_ITER, EIGENVECTOR_TOLERANCE).unwrap();
        assert!(e[0] > e[1]);
        assert!(approx(e[1], e[4]));
    }

    #[test]
    fn test_eigenvector_failures() {
        let empty = CommunicationNetwork::build(&[], &[]);
        assert_eq!(
            eigenvector_centrality(&empty, 10, EIGENVECTOR_TOLERANCE),
            Err(NetworkError::EmptyGraph)
        );
        let net = CommunicationNetwork::build(&members(5), &comms(&star_pairs(1, 5)));
        assert_eq!(
            eigenvector_centrality(&net, 1, 1e-12),
            Err(NetworkError::NoConvergence { iterations: 1 })
        );
    }
}
