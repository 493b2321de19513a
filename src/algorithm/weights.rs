use ndarray::{Array1, Array4};
use rand::{Rng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::spatial::geometry::{BORDER_COUNT, BorderFlags, BorderSide};

/// Logistic-regression parameters of a generator
///
/// One weight per `(class, neighborhood row, neighborhood column, feature)`
/// plus one bias per class. The feature axis carries one slot per tile index,
/// one for "uncollapsed", and one per border side; border slots only receive
/// gradient when their side is acknowledged, otherwise they keep their
/// initial values and never fire.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneratorWeights {
    weights: Array4<f64>,
    biases: Array1<f64>,
    epochs_trained: u64,
    acknowledge: BorderFlags,
    radius: usize,
}

impl GeneratorWeights {
    /// Create a freshly initialized tensor for `unique_count` classes
    ///
    /// Weights are Xavier-uniform with bound `1/sqrt(area)`; biases start
    /// at 1.0.
    pub fn new(
        unique_count: usize,
        radius: usize,
        acknowledge: BorderFlags,
        rng: &mut StdRng,
    ) -> Self {
        let side = 2 * radius + 1;
        let area = (side * side) as f64;
        let bound = 1.0 / area.sqrt();
        let features = feature_count(unique_count);

        let weights = Array4::from_shape_fn((unique_count, side, side, features), |_| {
            rng.random::<f64>().mul_add(2.0 * bound, -bound)
        });
        let biases = Array1::ones(unique_count);

        Self {
            weights,
            biases,
            epochs_trained: 0,
            acknowledge,
            radius,
        }
    }

    /// Copy into a tensor sized for more classes, preserving learned values
    ///
    /// Existing class rows and tile-feature columns keep their weights; the
    /// uncollapsed and border columns shift to their new slots. New classes
    /// and new tile columns are Xavier-initialized.
    #[must_use]
    pub fn grown(&self, unique_count: usize, rng: &mut StdRng) -> Self {
        let old_unique = self.unique_count();
        if unique_count <= old_unique {
            return self.clone();
        }
        let mut next = Self::new(unique_count, self.radius, self.acknowledge, rng);
        next.epochs_trained = self.epochs_trained;
        let side = self.side();

        for class in 0..old_unique {
            if let (Some(old_bias), Some(new_bias)) =
                (self.biases.get(class), next.biases.get_mut(class))
            {
                *new_bias = *old_bias;
            }
            for ny in 0..side {
                for nx in 0..side {
                    for feature in 0..feature_count(old_unique) {
                        let shifted = if feature < old_unique {
                            feature
                        } else {
                            feature + unique_count - old_unique
                        };
                        if let (Some(old), Some(new)) = (
                            self.weights.get([class, ny, nx, feature]),
                            next.weights.get_mut([class, ny, nx, shifted]),
                        ) {
                            *new = *old;
                        }
                    }
                }
            }
        }
        next
    }

    /// Number of classes (distinct layered tiles)
    pub fn unique_count(&self) -> usize {
        self.biases.len()
    }

    /// Neighborhood radius the tensor was sized for
    pub const fn radius(&self) -> usize {
        self.radius
    }

    /// Neighborhood side length `2r + 1`
    pub const fn side(&self) -> usize {
        2 * self.radius + 1
    }

    /// Border sides whose out-of-bounds features are live
    pub const fn acknowledge(&self) -> BorderFlags {
        self.acknowledge
    }

    /// Cumulative number of training epochs applied
    pub const fn epochs_trained(&self) -> u64 {
        self.epochs_trained
    }

    /// Count one finished training epoch
    pub fn bump_epoch(&mut self) {
        self.epochs_trained += 1;
    }

    /// Feature slot for an uncollapsed neighborhood cell
    pub fn uncollapsed_feature(&self) -> usize {
        self.unique_count()
    }

    /// Feature slot for a neighborhood cell beyond one border side
    pub fn border_feature(&self, side: BorderSide) -> usize {
        self.unique_count() + 1 + side.index()
    }

    /// Logits for every class given one feature index per neighborhood cell
    ///
    /// `features` is row-major over the neighborhood: entry `ny * side + nx`
    /// is the active feature at that cell.
    pub fn logits(&self, features: &[usize]) -> Vec<f64> {
        let side = self.side();
        (0..self.unique_count())
            .map(|class| {
                let mut z = self.biases.get(class).copied().unwrap_or(0.0);
                for (slot, &feature) in features.iter().enumerate() {
                    let ny = slot / side;
                    let nx = slot % side;
                    z += self
                        .weights
                        .get([class, ny, nx, feature])
                        .copied()
                        .unwrap_or(0.0);
                }
                z
            })
            .collect()
    }

    /// One additive cross-entropy gradient step toward `target`
    ///
    /// For each class the gradient on the logit is `p - 1{class = target}`;
    /// it lands on the bias and on the active feature weight of every
    /// neighborhood cell.
    pub fn apply_gradient(
        &mut self,
        features: &[usize],
        probabilities: &[f64],
        target: usize,
        learning_rate: f64,
    ) {
        let side = self.side();
        for (class, &probability) in probabilities.iter().enumerate() {
            let indicator = if class == target { 1.0 } else { 0.0 };
            let step = learning_rate * (probability - indicator);
            if let Some(bias) = self.biases.get_mut(class) {
                *bias -= step;
            }
            for (slot, &feature) in features.iter().enumerate() {
                let ny = slot / side;
                let nx = slot % side;
                if let Some(weight) = self.weights.get_mut([class, ny, nx, feature]) {
                    *weight -= step;
                }
            }
        }
    }
}

/// Feature-axis extent for a class count: tile slots, the uncollapsed slot,
/// and one slot per border side
pub fn feature_count(unique_count: usize) -> usize {
    unique_count + 1 + BORDER_COUNT
}
