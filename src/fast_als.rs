/**
 * FactoReco
 * Copyright (C) 2026 The FactoReco Authors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

// Weighted alternating least squares over *all* cells of the interaction matrix. Observed cells
// count with their confidence weight, unobserved cells count as zeros with a per-item exposure
// weight derived from item popularity.
//
// Iterating over the unobserved cells is avoided with two Gram caches,
//
//   user_cache[f][g] = Σ_u p_uf · p_ug
//   item_cache[f][g] = Σ_i w_i · q_if · q_ig
//
// so that refitting one user or item costs O(F² + F·|observed cells of the row|). A refit
// snapshots the old feature vector, fits all factors by coordinate descent and finally
// reconciles the cache of its side with one exact rank-1 correction.

use std::time::Instant;

use log::Level;
use rand::XorShiftRng;
use serde_derive::{Deserialize, Serialize};

use crate::recommender::{Recommender, POSITIVE_SIGNAL};
use crate::topk::TopK;
use crate::types::{self, DenseMatrix, DenseVector, SparseMatrix};
use crate::utils;

/// Coordinate updates with a denominator this close to zero keep their previous value.
const MIN_DENOMINATOR: f64 = 1e-12;

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct FastAlsParameters {
    pub factors: usize,
    pub max_iterations: usize,
    pub max_iterations_online: usize,
    pub regularization: f64,
    /// Confidence of cells observed through `update_online`.
    pub update_weight: f64,
    /// Total exposure weight, distributed over the items.
    pub coefficient: f64,
    /// Popularity exponent of the exposure weights.
    pub power: f64,
    pub seed: u64,
}

impl Default for FastAlsParameters {
    fn default() -> Self {
        FastAlsParameters {
            factors: 75,
            max_iterations: 25,
            max_iterations_online: 1,
            regularization: 0.01,
            update_weight: 1.0,
            coefficient: 50.0,
            power: 0.5,
            seed: 0,
        }
    }
}

/// An observed cell of the row being refitted.
struct Observation {
    /// Index on the other side (item for a user refit, user for an item refit).
    index: usize,
    rating: f64,
    confidence: f64,
    exposure: f64,
    prediction: f64,
}

pub struct FastAls {
    data: SparseMatrix,
    parameters: FastAlsParameters,
    rng: XorShiftRng,

    user_features: DenseMatrix,
    item_features: DenseMatrix,

    weight: SparseMatrix,
    item_weight: DenseVector,

    user_cache: DenseMatrix,
    item_cache: DenseMatrix,
}

impl FastAls {

    pub fn new(data: SparseMatrix, parameters: FastAlsParameters) -> Self {
        let rng = utils::seeded_rng(parameters.seed);

        let mut als = FastAls {
            weight: SparseMatrix::new(data.num_rows(), data.num_columns()),
            data,
            parameters,
            rng,
            user_features: Vec::new(),
            item_features: Vec::new(),
            item_weight: Vec::new(),
            user_cache: Vec::new(),
            item_cache: Vec::new(),
        };
        als.init();
        als
    }

    pub fn parameters(&self) -> &FastAlsParameters {
        &self.parameters
    }

    /// Takes effect with the next `init`.
    pub fn set_parameters(&mut self, parameters: FastAlsParameters) {
        self.parameters = parameters;
    }

    pub fn user_features(&self) -> &DenseMatrix {
        &self.user_features
    }

    pub fn item_features(&self) -> &DenseMatrix {
        &self.item_features
    }

    /// Confidence weights of the observed cells.
    pub fn weight(&self) -> &SparseMatrix {
        &self.weight
    }

    /// Exposure weights of the items.
    pub fn item_weight(&self) -> &DenseVector {
        &self.item_weight
    }

    pub fn user_cache(&self) -> &DenseMatrix {
        &self.user_cache
    }

    pub fn item_cache(&self) -> &DenseMatrix {
        &self.item_cache
    }

    fn update_user(&mut self, user: usize) {
        let mut observed: Vec<Observation> = self.data.row(user).iter()
            .map(|(item, rating)| Observation {
                index: item,
                rating,
                confidence: self.weight.get(user, item),
                exposure: self.item_weight[item],
                prediction: utils::dot_product(&self.user_features[user], &self.item_features[item]),
            })
            .collect();

        if observed.is_empty() {
            return;
        }
        observed.sort_by_key(|observation| observation.index);

        let old_features = self.user_features[user].clone();

        let new_features = refit(
            &old_features,
            &mut observed,
            &self.item_features,
            &self.item_cache,
            1.0,
            self.parameters.regularization,
        );

        apply_rank_one_update(&mut self.user_cache, &old_features, &new_features, 1.0);
        self.user_features[user] = new_features;
    }

    fn update_item(&mut self, item: usize) {
        let exposure = self.item_weight[item];

        let mut observed: Vec<Observation> = self.data.column(item).iter()
            .map(|(user, rating)| Observation {
                index: user,
                rating,
                confidence: self.weight.get(user, item),
                exposure,
                prediction: utils::dot_product(&self.user_features[user], &self.item_features[item]),
            })
            .collect();

        if observed.is_empty() {
            return;
        }
        observed.sort_by_key(|observation| observation.index);

        let old_features = self.item_features[item].clone();

        let new_features = refit(
            &old_features,
            &mut observed,
            &self.user_features,
            &self.user_cache,
            exposure,
            self.parameters.regularization,
        );

        apply_rank_one_update(&mut self.item_cache, &old_features, &new_features, exposure);
        self.item_features[item] = new_features;
    }
}

/// Coordinate descent over all factors of one row. The contribution of the unobserved cells is
/// taken from the Gram cache of the other side (scaled by `gram_scale`), the observed cells
/// correct it with their confidence. The cached predictions of the observed cells are kept in
/// sync after every factor.
fn refit(
    old_features: &[f64],
    observed: &mut [Observation],
    other_features: &DenseMatrix,
    gram: &DenseMatrix,
    gram_scale: f64,
    regularization: f64,
) -> DenseVector {

    let factors = old_features.len();
    let mut features = old_features.to_vec();

    for f in 0..factors {
        let mut numerator = 0.0;
        for g in 0..factors {
            if g != f {
                numerator -= features[g] * gram[g][f];
            }
        }
        numerator *= gram_scale;

        let mut denominator = 0.0;

        for observation in observed.iter_mut() {
            let other = other_features[observation.index][f];

            observation.prediction -= features[f] * other;

            numerator += (observation.confidence * observation.rating -
                (observation.confidence - observation.exposure) * observation.prediction) * other;
            denominator += (observation.confidence - observation.exposure) * other * other;
        }

        denominator += gram_scale * gram[f][f] + regularization;

        if denominator.abs() > MIN_DENOMINATOR {
            features[f] = numerator / denominator;
        } else {
            debug!("Degenerate denominator {} for factor {}, keeping previous value", denominator, f);
        }

        for observation in observed.iter_mut() {
            observation.prediction += features[f] * other_features[observation.index][f];
        }
    }

    features
}

/// `cache[f][g] += scale · (new_f · new_g - old_f · old_g)`, the exact change of a Gram matrix
/// when one of its summed rows changes from `old` to `new`.
fn apply_rank_one_update(cache: &mut DenseMatrix, old: &[f64], new: &[f64], scale: f64) {
    for f in 0..new.len() {
        for g in 0..=f {
            let value = cache[f][g] + scale * (new[f] * new[g] - old[f] * old[g]);
            cache[f][g] = value;
            cache[g][f] = value;
        }
    }
}

/// `Σ_u p_uf · p_ug`, computed from scratch.
pub fn user_gram(user_features: &DenseMatrix, factors: usize) -> DenseMatrix {
    let mut gram = types::new_dense_matrix(factors, factors);
    for f in 0..factors {
        for g in 0..=f {
            let value: f64 = user_features.iter()
                .map(|features| features[f] * features[g])
                .sum();
            gram[f][g] = value;
            gram[g][f] = value;
        }
    }
    gram
}

/// `Σ_i w_i · q_if · q_ig`, computed from scratch.
pub fn item_gram(item_features: &DenseMatrix, item_weight: &[f64], factors: usize) -> DenseMatrix {
    let mut gram = types::new_dense_matrix(factors, factors);
    for f in 0..factors {
        for g in 0..=f {
            let value: f64 = item_features.iter()
                .zip(item_weight.iter())
                .map(|(features, weight)| weight * features[f] * features[g])
                .sum();
            gram[f][g] = value;
            gram[g][f] = value;
        }
    }
    gram
}

/// Item popularity raised to `power`, rescaled so that the weights sum up to `coefficient`.
/// Items nobody interacted with get no weight, whatever the power.
fn exposure_weights(data: &SparseMatrix, coefficient: f64, power: f64) -> DenseVector {
    let num_items = data.num_columns();

    let popularity: Vec<f64> = (0..num_items)
        .map(|item| data.column(item).len() as f64)
        .collect();

    let num_interactions: f64 = popularity.iter().sum();
    if num_interactions == 0.0 {
        return vec![0.0; num_items];
    }

    let scaled: Vec<f64> = popularity.iter()
        .map(|&count| if count == 0.0 { 0.0 } else { (count / num_interactions).powf(power) })
        .collect();

    let normalizer: f64 = scaled.iter().sum();
    if normalizer == 0.0 {
        return vec![0.0; num_items];
    }

    scaled.iter().map(|value| coefficient * value / normalizer).collect()
}

fn quadratic_form(matrix: &DenseMatrix, vector: &[f64]) -> f64 {
    matrix.iter()
        .zip(vector.iter())
        .map(|(row, value)| value * utils::dot_product(row, vector))
        .sum()
}

impl Recommender for FastAls {

    fn data(&self) -> &SparseMatrix {
        &self.data
    }

    fn data_mut(&mut self) -> &mut SparseMatrix {
        &mut self.data
    }

    fn set_data(&mut self, data: SparseMatrix) {
        self.data = data;
    }

    fn init(&mut self) {
        let num_users = self.data.num_rows();
        let num_items = self.data.num_columns();
        let factors = self.parameters.factors;

        self.user_features = utils::random_features(num_users, factors, &mut self.rng);
        self.item_features = utils::random_features(num_items, factors, &mut self.rng);

        self.weight = SparseMatrix::new(num_users, num_items);
        for (user, item, _) in self.data.iter() {
            self.weight.set(user, item, 1.0);
        }

        self.item_weight = exposure_weights(
            &self.data,
            self.parameters.coefficient,
            self.parameters.power,
        );

        self.user_cache = user_gram(&self.user_features, factors);
        self.item_cache = item_gram(&self.item_features, &self.item_weight, factors);
    }

    /// Full passes over all users, then all items. Item refits of a pass see the user features
    /// of the same pass.
    fn build(&mut self) {
        let build_start = Instant::now();

        for iteration in 0..self.parameters.max_iterations {
            for user in 0..self.data.num_rows() {
                self.update_user(user);
            }
            for item in 0..self.data.num_columns() {
                self.update_item(item);
            }

            if log_enabled!(Level::Trace) {
                trace!("Fast ALS pass {}, loss {}", iteration, self.loss());
            }
        }

        info!(
            "{} passes of fast ALS over {} interactions, {}ms training time",
            self.parameters.max_iterations,
            self.data.non_zeros(),
            utils::to_millis(build_start.elapsed())
        );
    }

    /// Only the user and the item are refitted. A cold item first receives the default exposure
    /// weight `coefficient / num_items`, which also enters the item cache.
    fn update_online(&mut self, user: usize, item: usize) {
        self.data.set(user, item, POSITIVE_SIGNAL);
        self.weight.set(user, item, self.parameters.update_weight);

        if self.item_weight[item] == 0.0 {
            let exposure = self.parameters.coefficient / self.data.num_columns() as f64;
            self.item_weight[item] = exposure;

            let no_features = vec![0.0; self.parameters.factors];
            apply_rank_one_update(
                &mut self.item_cache,
                &no_features,
                &self.item_features[item],
                exposure,
            );
        }

        for _ in 0..self.parameters.max_iterations_online {
            self.update_user(user);
            self.update_item(item);
        }
    }

    fn predict(&self, user: usize, item: usize) -> f64 {
        utils::dot_product(&self.user_features[user], &self.item_features[item])
    }

    fn similar_items(&self, item: usize, how_many: usize) -> Vec<usize> {
        let features = &self.item_features[item];

        let scores = (0..self.item_features.len())
            .filter(|other| *other != item)
            .map(|other| (other, utils::cosine_similarity(features, &self.item_features[other])));

        TopK::from_scores(scores, how_many).into_sorted_items()
    }

    /// Weighted squared error over the observed cells, plus the exposure-weighted squared
    /// predictions of the unobserved cells (all cells via the item cache, minus the observed
    /// ones), plus L2 regularization.
    fn loss(&self) -> f64 {
        let magnitudes: f64 = self.user_features.iter()
            .chain(self.item_features.iter())
            .map(|features| utils::magnitude_squared(features))
            .sum();

        let mut loss = self.parameters.regularization * magnitudes;

        for (user, item, rating) in self.data.iter() {
            let prediction = self.predict(user, item);
            let difference = prediction - rating;
            loss += self.weight.get(user, item) * difference * difference;
            loss -= self.item_weight[item] * prediction * prediction;
        }

        for features in self.user_features.iter() {
            loss += quadratic_form(&self.item_cache, features);
        }

        loss
    }
}
