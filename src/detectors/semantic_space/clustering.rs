//! Deterministic k-means over cosine distance.
//!
//! Seeding is farthest-first starting at the first vector in input order, so
//! a fixed input and a fixed k always produce the same clusters. A new seed
//! is opened only when it lies farther than `min_separation` from every
//! existing seed; tight sets therefore collapse into fewer clusters than
//! requested. Empty clusters are dropped.
//!
//! Automatic k uses the elbow rule: with `I(k)` the total cosine distance of
//! points to their centroids, the chosen k is the smallest k in
//! `[2, min(max_k, n)]` for which `(I(k) - I(k+1)) / I(1) < elbow_gain`,
//! or the upper bound when no such k exists.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::similarity::{cosine_distance, cosine_distance_to_centroid};

/// Requested cluster count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClusterCount {
    /// Choose k with the elbow rule
    #[default]
    Auto,
    /// Use this k, clamped to [1, n]
    Fixed(usize),
}

/// Clustering parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusteringParams {
    /// Upper bound for automatic k
    pub max_auto_clusters: usize,
    /// Minimum seed separation (cosine distance)
    pub min_separation: f64,
    /// Elbow threshold as a fraction of single-cluster inertia
    pub elbow_gain: f64,
    /// Lloyd iteration cap
    pub max_iterations: usize,
}

impl Default for ClusteringParams {
    fn default() -> Self {
        Self {
            max_auto_clusters: 8,
            min_separation: 0.15,
            elbow_gain: 0.15,
            max_iterations: 50,
        }
    }
}

/// A cluster before behavioural judgment: member indices and centroid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSkeleton {
    /// Cluster index in output order
    pub id: usize,
    /// Indices into the clustered vector slice, ascending
    pub members: Vec<usize>,
    /// Mean of the member vectors
    pub centroid: Vec<f64>,
}

impl ClusterSkeleton {
    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True when the cluster has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

struct KMeansRun {
    assignments: Vec<usize>,
    centroids: Vec<Vec<f64>>,
    inertia: f64,
}

/// Cluster `vectors` into concept clusters.
///
/// Empty and single-vector input yields one trivial cluster.
pub fn cluster(
    vectors: &[Vec<f32>],
    count: ClusterCount,
    params: &ClusteringParams,
) -> Vec<ClusterSkeleton> {
    let n = vectors.len();
    if n <= 1 {
        return vec![trivial_cluster(vectors)];
    }

    let k = match count {
        ClusterCount::Fixed(k) => k.clamp(1, n),
        ClusterCount::Auto => choose_k(vectors, params),
    };

    let run = kmeans(vectors, k, params);
    let skeletons = into_skeletons(run);
    debug!(units = n, requested_k = k, clusters = skeletons.len(), "Clustered unit vectors");
    skeletons
}

fn trivial_cluster(vectors: &[Vec<f32>]) -> ClusterSkeleton {
    ClusterSkeleton {
        id: 0,
        members: (0..vectors.len()).collect(),
        centroid: vectors
            .first()
            .map(|v| v.iter().map(|x| f64::from(*x)).collect())
            .unwrap_or_default(),
    }
}

fn choose_k(vectors: &[Vec<f32>], params: &ClusteringParams) -> usize {
    let n = vectors.len();
    let upper = params.max_auto_clusters.min(n).max(1);
    if upper < 2 {
        return 1;
    }

    let base = kmeans(vectors, 1, params).inertia;
    if base <= f64::EPSILON {
        return 2;
    }

    let mut previous = kmeans(vectors, 2, params).inertia;
    for k in 2..upper {
        let next = kmeans(vectors, k + 1, params).inertia;
        let gain = (previous - next) / base;
        if gain < params.elbow_gain {
            return k;
        }
        previous = next;
    }
    upper
}

fn kmeans(vectors: &[Vec<f32>], k: usize, params: &ClusteringParams) -> KMeansRun {
    let seeds = farthest_first_seeds(vectors, k, params.min_separation);
    let mut centroids: Vec<Vec<f64>> = seeds
        .iter()
        .map(|&idx| vectors[idx].iter().map(|x| f64::from(*x)).collect())
        .collect();

    let mut assignments = vec![usize::MAX; vectors.len()];
    for _ in 0..params.max_iterations.max(1) {
        let mut changed = false;
        for (idx, vector) in vectors.iter().enumerate() {
            let nearest = nearest_centroid(vector, &centroids);
            if assignments[idx] != nearest {
                assignments[idx] = nearest;
                changed = true;
            }
        }
        if !changed {
            break;
        }
        update_centroids(vectors, &assignments, &mut centroids);
    }

    let inertia = vectors
        .iter()
        .zip(&assignments)
        .map(|(vector, &cluster)| cosine_distance_to_centroid(vector, &centroids[cluster]))
        .sum();

    KMeansRun {
        assignments,
        centroids,
        inertia,
    }
}

fn farthest_first_seeds(vectors: &[Vec<f32>], k: usize, min_separation: f64) -> Vec<usize> {
    let mut seeds = vec![0usize];
    let mut min_distance: Vec<f64> = vectors
        .iter()
        .map(|v| cosine_distance(v, &vectors[0]))
        .collect();

    while seeds.len() < k {
        // Ties go to the lowest index.
        let Some((candidate, distance)) = min_distance
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (idx, d)| match best {
                Some((_, best_d)) if best_d >= d => best,
                _ => Some((idx, d)),
            })
        else {
            break;
        };
        if distance <= min_separation {
            break;
        }
        seeds.push(candidate);
        for (idx, vector) in vectors.iter().enumerate() {
            let d = cosine_distance(vector, &vectors[candidate]);
            if d < min_distance[idx] {
                min_distance[idx] = d;
            }
        }
    }
    seeds
}

fn nearest_centroid(vector: &[f32], centroids: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (idx, centroid) in centroids.iter().enumerate() {
        let d = cosine_distance_to_centroid(vector, centroid);
        if d < best_distance {
            best = idx;
            best_distance = d;
        }
    }
    best
}

fn update_centroids(vectors: &[Vec<f32>], assignments: &[usize], centroids: &mut [Vec<f64>]) {
    let dimension = vectors.first().map_or(0, Vec::len);
    let mut sums = vec![vec![0.0f64; dimension]; centroids.len()];
    let mut counts = vec![0usize; centroids.len()];

    for (vector, &cluster) in vectors.iter().zip(assignments) {
        counts[cluster] += 1;
        for (sum, x) in sums[cluster].iter_mut().zip(vector) {
            *sum += f64::from(*x);
        }
    }

    for ((centroid, sum), count) in centroids.iter_mut().zip(sums).zip(counts) {
        // Empty clusters keep their previous centroid.
        if count > 0 {
            *centroid = sum.into_iter().map(|s| s / count as f64).collect();
        }
    }
}

fn into_skeletons(run: KMeansRun) -> Vec<ClusterSkeleton> {
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); run.centroids.len()];
    for (idx, &cluster) in run.assignments.iter().enumerate() {
        members[cluster].push(idx);
    }

    members
        .into_iter()
        .zip(run.centroids)
        .filter(|(members, _)| !members.is_empty())
        .enumerate()
        .map(|(id, (members, centroid))| ClusterSkeleton {
            id,
            members,
            centroid,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tight_triple() -> Vec<Vec<f32>> {
        vec![
            vec![1.0, 0.0, 0.0],
            vec![0.98, 0.1, 0.0],
            vec![0.97, 0.05, 0.1],
        ]
    }

    fn two_groups() -> Vec<Vec<f32>> {
        vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.95, 0.05, 0.0],
            vec![0.05, 0.95, 0.0],
            vec![0.9, 0.1, 0.05],
            vec![0.1, 0.9, 0.05],
        ]
    }

    #[test]
    fn empty_and_single_inputs_yield_one_trivial_cluster() {
        let params = ClusteringParams::default();
        let empty = cluster(&[], ClusterCount::Auto, &params);
        assert_eq!(empty.len(), 1);
        assert!(empty[0].is_empty());

        let single = cluster(&[vec![1.0, 2.0]], ClusterCount::Fixed(4), &params);
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].members, vec![0]);
    }

    #[test]
    fn tight_triple_collapses_to_one_cluster_for_any_k() {
        let params = ClusteringParams::default();
        for k in [ClusterCount::Auto, ClusterCount::Fixed(3), ClusterCount::Fixed(5), ClusterCount::Fixed(50)] {
            let clusters = cluster(&tight_triple(), k, &params);
            assert_eq!(clusters.len(), 1, "k = {k:?}");
            assert_eq!(clusters[0].members, vec![0, 1, 2]);
        }
    }

    #[test]
    fn separated_groups_are_found_automatically() {
        let clusters = cluster(&two_groups(), ClusterCount::Auto, &ClusteringParams::default());
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].members, vec![0, 2, 4]);
        assert_eq!(clusters[1].members, vec![1, 3, 5]);
    }

    #[test]
    fn clustering_is_deterministic() {
        let params = ClusteringParams::default();
        let first = cluster(&two_groups(), ClusterCount::Fixed(3), &params);
        let second = cluster(&two_groups(), ClusterCount::Fixed(3), &params);
        assert_eq!(first, second);
    }

    #[test]
    fn fixed_k_of_one_keeps_everything_together() {
        let clusters = cluster(&two_groups(), ClusterCount::Fixed(1), &ClusteringParams::default());
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 6);
    }
}
