//! CART decision tree shared by the forest and the boosting ensemble
//!
//! Splits minimize weighted squared error. On 0/1 targets that is the Gini
//! criterion up to a constant factor, so one builder serves both the
//! classification forest and the residual-fitting boosting rounds.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Tree growth limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    /// Maximum depth (root is depth 0)
    pub max_depth: usize,
    /// Minimum weighted-sample count to attempt a split
    pub min_samples_split: usize,
    /// Features examined per split; `None` means all
    pub max_features: Option<usize>,
}

/// Tree node stored in a flat arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    /// Terminal prediction
    Leaf {
        /// Predicted value
        value: f64,
    },
    /// Binary split: `row[feature] <= threshold` goes left
    Split {
        /// Column index
        feature: usize,
        /// Split threshold
        threshold: f64,
        /// Left child index
        left: usize,
        /// Right child index
        right: usize,
    },
}

/// Fitted regression/classification tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
    importances: Vec<f64>,
}

/// Per-split running sums
#[derive(Debug, Clone, Copy, Default)]
struct Moments {
    w: f64,
    wy: f64,
    wyy: f64,
}

impl Moments {
    fn add(&mut self, w: f64, y: f64) {
        self.w += w;
        self.wy += w * y;
        self.wyy += w * y * y;
    }

    fn sub(self, other: Self) -> Self {
        Self {
            w: self.w - other.w,
            wy: self.wy - other.wy,
            wyy: self.wyy - other.wyy,
        }
    }

    /// Weighted sum of squared deviations from the mean
    fn sse(&self) -> f64 {
        if self.w <= 0.0 {
            0.0
        } else {
            (self.wyy - self.wy * self.wy / self.w).max(0.0)
        }
    }

    fn mean(&self) -> f64 {
        if self.w <= 0.0 {
            0.0
        } else {
            self.wy / self.w
        }
    }
}

struct Builder<'a, R: Rng> {
    rows: &'a [Vec<f64>],
    targets: &'a [f64],
    weights: &'a [f64],
    params: TreeParams,
    rng: &'a mut R,
    nodes: Vec<Node>,
    importances: Vec<f64>,
    features: Vec<usize>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl DecisionTree {
    /// Grow a tree on the samples with non-zero weight.
    ///
    /// Leaves predict the weighted mean target of the samples they hold.
    pub fn fit<R: Rng>(
        rows: &[Vec<f64>],
        targets: &[f64],
        weights: &[f64],
        params: TreeParams,
        rng: &mut R,
    ) -> Self {
        let n_features = rows.first().map_or(0, Vec::len);
        let indices: Vec<usize> = (0..rows.len()).filter(|&i| weights[i] > 0.0).collect();

        let mut builder = Builder {
            rows,
            targets,
            weights,
            params,
            rng,
            nodes: Vec::new(),
            importances: vec![0.0; n_features],
            features: (0..n_features).collect(),
        };
        builder.grow(indices, 0);

        Self {
            nodes: builder.nodes,
            n_features,
            importances: builder.importances,
        }
    }

    /// Value of the leaf `row` lands in
    #[must_use]
    pub fn predict(&self, row: &[f64]) -> f64 {
        match self.nodes.get(self.leaf_index(row)) {
            Some(Node::Leaf { value }) => *value,
            _ => 0.0,
        }
    }

    /// Arena index of the leaf `row` lands in
    #[must_use]
    pub fn leaf_index(&self, row: &[f64]) -> usize {
        let mut idx = 0;
        while let Some(Node::Split {
            feature,
            threshold,
            left,
            right,
        }) = self.nodes.get(idx)
        {
            let value = row.get(*feature).copied().unwrap_or(0.0);
            idx = if value <= *threshold { *left } else { *right };
        }
        idx
    }

    /// Overwrite a leaf value (boosting's Newton step); splits are ignored
    pub fn set_leaf_value(&mut self, idx: usize, new_value: f64) {
        if let Some(Node::Leaf { value }) = self.nodes.get_mut(idx) {
            *value = new_value;
        }
    }

    /// Number of nodes
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of input columns the tree was grown on
    #[must_use]
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Depth of the deepest leaf
    #[must_use]
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(Node::Split { left, right, .. }) => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    /// Total impurity decrease per feature, normalized to sum to 1
    /// (all zeros for a stump)
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        normalize(&self.importances)
    }

    /// Check a deserialized tree before it is walked.
    ///
    /// Children must sit after their parent and inside the arena, which
    /// bounds every walk by the node count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArtifactCorrupt`] for a broken arena or a column
    /// count other than `n_features`.
    pub fn validate(&self, n_features: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(Error::ArtifactCorrupt("tree has no nodes".to_string()));
        }
        if self.n_features != n_features || self.importances.len() != n_features {
            return Err(Error::ArtifactCorrupt(format!(
                "tree grown on {} columns ({} importances), expected {n_features}",
                self.n_features,
                self.importances.len()
            )));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                let len = self.nodes.len();
                if *feature >= n_features {
                    return Err(Error::ArtifactCorrupt(format!(
                        "node {idx} splits on column {feature} of {n_features}"
                    )));
                }
                if *left <= idx || *right <= idx || *left >= len || *right >= len {
                    return Err(Error::ArtifactCorrupt(format!(
                        "node {idx} links to {left}/{right} in an arena of {len}"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl<R: Rng> Builder<'_, R> {
    fn grow(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        let mut total = Moments::default();
        for &i in &indices {
            total.add(self.weights[i], self.targets[i]);
        }

        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: total.mean(),
        });

        if depth >= self.params.max_depth
            || indices.len() < self.params.min_samples_split.max(2)
            || total.sse() <= f64::EPSILON
        {
            return id;
        }

        let Some(best) = self.best_split(&indices, total) else {
            return id;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.rows[i][best.feature] <= best.threshold);
        if left_idx.is_empty() || right_idx.is_empty() {
            return id;
        }

        self.importances[best.feature] += best.gain;
        let left = self.grow(left_idx, depth + 1);
        let right = self.grow(right_idx, depth + 1);
        self.nodes[id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        id
    }

    /// Best split over a random feature subset.
    ///
    /// Features that are constant within the node do not count towards the
    /// `max_features` budget, so the search keeps drawing until it has seen
    /// that many splittable columns or runs out.
    fn best_split(&mut self, indices: &[usize], total: Moments) -> Option<BestSplit> {
        let budget = match self.params.max_features {
            Some(k) if k < self.features.len() => {
                self.features.shuffle(&mut *self.rng);
                k.max(1)
            }
            _ => self.features.len(),
        };

        let parent_sse = total.sse();
        let mut best: Option<BestSplit> = None;
        let mut order = indices.to_vec();
        let mut examined = 0;

        for f in 0..self.features.len() {
            if examined >= budget {
                break;
            }
            let feature = self.features[f];
            order.sort_by(|&a, &b| self.rows[a][feature].total_cmp(&self.rows[b][feature]));
            let (Some(&lo), Some(&hi)) = (order.first(), order.last()) else {
                return None;
            };
            if self.rows[hi][feature] <= self.rows[lo][feature] {
                continue;
            }
            examined += 1;

            let mut left = Moments::default();
            for pos in 0..order.len() - 1 {
                let i = order[pos];
                left.add(self.weights[i], self.targets[i]);

                let here = self.rows[i][feature];
                let next = self.rows[order[pos + 1]][feature];
                if next <= here {
                    continue;
                }

                let right = total.sub(left);
                let gain = parent_sse - left.sse() - right.sse();
                if gain > best.as_ref().map_or(f64::EPSILON, |b| b.gain) {
                    best = Some(BestSplit {
                        feature,
                        threshold: here + (next - here) / 2.0,
                        gain,
                    });
                }
            }
        }
        best
    }
}

/// Scale non-negative values to sum to 1 (all zeros stays all zeros)
pub(crate) fn normalize(values: &[f64]) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        values.iter().map(|v| v / total).collect()
    } else {
        vec![0.0; values.len()]
    }
}
