//! Isolation forest over fixed-width feature vectors.
//!
//! Each tree recursively partitions a random subsample with axis-aligned
//! splits (random feature, uniform split value) until points are isolated or
//! the height limit is reached. Points that isolate in few splits receive
//! scores close to 1; typical points score around or below 0.5.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_samples: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_samples: 256,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Average path length of an unsuccessful binary-search-tree lookup among
/// `n` points; normalizes path lengths and corrects truncated leaves.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug, Clone)]
pub struct IsolationForest<const D: usize> {
    trees: Vec<Node>,
    sample_size: usize,
}

impl<const D: usize> IsolationForest<D> {
    /// Fit on `points`. The same points and params always give the same forest.
    pub fn fit(points: &[[f64; D]], params: ForestParams) -> Self {
        let mut rng = StdRng::seed_from_u64(params.seed);
        let sample_size = params.max_samples.min(points.len()).max(1);
        let height_limit = (sample_size as f64).log2().ceil() as usize;

        let trees = if points.is_empty() {
            Vec::new()
        } else {
            (0..params.n_trees)
                .map(|_| {
                    let mut sample = index::sample(&mut rng, points.len(), sample_size).into_vec();
                    build(points, &mut sample, 0, height_limit, &mut rng)
                })
                .collect()
        };

        Self { trees, sample_size }
    }

    fn path_length(node: &Node, point: &[f64; D], depth: usize) -> f64 {
        match node {
            Node::Leaf { size } => depth as f64 + average_path_length(*size),
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                let next = if point[*feature] < *threshold { left } else { right };
                Self::path_length(next, point, depth + 1)
            }
        }
    }

    /// Anomaly score in (0, 1]; higher is more anomalous.
    pub fn score(&self, point: &[f64; D]) -> f64 {
        let norm = average_path_length(self.sample_size);
        if self.trees.is_empty() || norm == 0.0 {
            return 0.5;
        }
        let mean = self
            .trees
            .iter()
            .map(|tree| Self::path_length(tree, point, 0))
            .sum::<f64>()
            / self.trees.len() as f64;
        2f64.powf(-mean / norm)
    }

    pub fn score_all(&self, points: &[[f64; D]]) -> Vec<f64> {
        points.iter().map(|p| self.score(p)).collect()
    }
}

fn build<const D: usize>(
    points: &[[f64; D]],
    sample: &mut [usize],
    depth: usize,
    height_limit: usize,
    rng: &mut StdRng,
) -> Node {
    if depth >= height_limit || sample.len() <= 1 {
        return Node::Leaf { size: sample.len() };
    }

    // Only features that still vary within this node can split it.
    let mut splittable: Vec<(usize, f64, f64)> = Vec::with_capacity(D);
    for feature in 0..D {
        let (lo, hi) = sample.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
            (lo.min(points[i][feature]), hi.max(points[i][feature]))
        });
        if hi > lo {
            splittable.push((feature, lo, hi));
        }
    }
    if splittable.is_empty() {
        return Node::Leaf { size: sample.len() };
    }

    let (feature, lo, hi) = splittable[rng.gen_range(0..splittable.len())];
    let threshold = rng.gen_range(lo..hi);

    let mut boundary = 0;
    for i in 0..sample.len() {
        if points[sample[i]][feature] < threshold {
            sample.swap(i, boundary);
            boundary += 1;
        }
    }
    let (left, right) = sample.split_at_mut(boundary);

    Node::Split {
        feature,
        threshold,
        left: Box::new(build(points, left, depth + 1, height_limit, rng)),
        right: Box::new(build(points, right, depth + 1, height_limit, rng)),
    }
}

/// Percentile with linear interpolation between closest ranks, `q` in [0, 100].
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64))
}

/// Flag the `contamination` fraction of rows with the highest scores.
///
/// The cut-off is the `contamination` percentile of the negated scores and
/// rows are flagged only when strictly beyond it, so tied scores at the
/// boundary stay unflagged.
pub fn flag_outliers(scores: &[f64], contamination: f64) -> Vec<bool> {
    let negated: Vec<f64> = scores.iter().map(|s| -s).collect();
    match percentile(&negated, contamination * 100.0) {
        Some(offset) => negated.iter().map(|s| *s < offset).collect(),
        None => Vec::new(),
    }
}
