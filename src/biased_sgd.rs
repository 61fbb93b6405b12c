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

use std::time::Instant;

use log::Level;
use rand::{Rng, XorShiftRng};
use serde_derive::{Deserialize, Serialize};

use crate::recommender::{self, Recommender, POSITIVE_SIGNAL};
use crate::topk::TopK;
use crate::types::{DenseMatrix, DenseVector, SparseMatrix};
use crate::utils;

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct SgdParameters {
    pub factors: usize,
    pub max_iterations: usize,
    pub max_iterations_online: usize,
    pub learning_rate: f64,
    pub regularization: f64,
    pub seed: u64,
}

impl Default for SgdParameters {
    fn default() -> Self {
        SgdParameters {
            factors: 75,
            max_iterations: 25,
            max_iterations_online: 1,
            learning_rate: 0.005,
            regularization: 0.01,
            seed: 0,
        }
    }
}

/// Biased matrix factorization fitted with stochastic gradient descent on the known ratings.
pub struct BiasedSgd {
    data: SparseMatrix,
    parameters: SgdParameters,
    rng: XorShiftRng,

    global_bias: f64,
    training_rmse: f64,
    user_bias: DenseVector,
    item_bias: DenseVector,
    user_features: DenseMatrix,
    item_features: DenseMatrix,
}

impl BiasedSgd {

    pub fn new(data: SparseMatrix, parameters: SgdParameters) -> Self {
        let rng = utils::seeded_rng(parameters.seed);

        let mut sgd = BiasedSgd {
            data,
            parameters,
            rng,
            global_bias: 0.0,
            training_rmse: 0.0,
            user_bias: Vec::new(),
            item_bias: Vec::new(),
            user_features: Vec::new(),
            item_features: Vec::new(),
        };
        sgd.init();
        sgd
    }

    pub fn parameters(&self) -> &SgdParameters {
        &self.parameters
    }

    /// Takes effect with the next `init`.
    pub fn set_parameters(&mut self, parameters: SgdParameters) {
        self.parameters = parameters;
    }

    pub fn global_bias(&self) -> f64 {
        self.global_bias
    }

    /// Root mean squared error of the steps taken in the last epoch of `build`, zero before any.
    pub fn training_rmse(&self) -> f64 {
        self.training_rmse
    }

    /// Fits the model like `build` and returns the training RMSE of the last epoch.
    pub fn tune(&mut self) -> f64 {
        self.build();
        self.training_rmse
    }

    pub fn user_features(&self) -> &DenseMatrix {
        &self.user_features
    }

    pub fn item_features(&self) -> &DenseMatrix {
        &self.item_features
    }

    /// One gradient step on the cell `(user, item)`, returns the error before the step. Both
    /// feature vectors are updated from each other's values before the step.
    fn step(&mut self, user: usize, item: usize, rating: f64) -> f64 {
        let learning_rate = self.parameters.learning_rate;
        let regularization = self.parameters.regularization;

        let error = rating - self.predict(user, item);

        self.global_bias += learning_rate * error;
        self.user_bias[user] += learning_rate * (error - regularization * self.user_bias[user]);
        self.item_bias[item] += learning_rate * (error - regularization * self.item_bias[item]);

        let user_features = &mut self.user_features[user];
        let item_features = &mut self.item_features[item];

        for (user_feature, item_feature) in user_features.iter_mut().zip(item_features.iter_mut()) {
            let old_user_feature = *user_feature;
            let old_item_feature = *item_feature;

            *user_feature += learning_rate * (error * old_item_feature - regularization * old_user_feature);
            *item_feature += learning_rate * (error * old_user_feature - regularization * old_item_feature);
        }

        error
    }
}

impl Recommender for BiasedSgd {

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

        self.global_bias = 0.0;
        self.training_rmse = 0.0;
        self.user_bias = vec![0.0; num_users];
        self.item_bias = vec![0.0; num_items];
        self.user_features = utils::random_features(num_users, factors, &mut self.rng);
        self.item_features = utils::random_features(num_items, factors, &mut self.rng);
    }

    /// Each epoch draws as many samples as there are ratings: a random user with at least one
    /// rating, then one of that user's ratings.
    fn build(&mut self) {
        let build_start = Instant::now();

        // Rows of the users with ratings, sorted by item so the draws only depend on the seed.
        let active_rows: Vec<(usize, Vec<(usize, f64)>)> = (0..self.data.num_rows())
            .filter_map(|user| {
                let mut ratings: Vec<(usize, f64)> = self.data.row(user).iter().collect();
                if ratings.is_empty() {
                    return None;
                }
                ratings.sort_by_key(|&(item, _)| item);
                Some((user, ratings))
            })
            .collect();

        if active_rows.is_empty() {
            return;
        }

        let num_samples = self.data.non_zeros();

        for iteration in 0..self.parameters.max_iterations {
            let mut squared_errors = 0.0;

            for _ in 0..num_samples {
                let (user, ratings) = &active_rows[self.rng.gen_range(0, active_rows.len())];
                let (item, rating) = ratings[self.rng.gen_range(0, ratings.len())];

                let error = self.step(*user, item, rating);
                squared_errors += error * error;
            }

            self.training_rmse = (squared_errors / num_samples as f64).sqrt();

            if log_enabled!(Level::Trace) {
                trace!("Biased SGD epoch {}, loss {}", iteration, self.loss());
            }
        }

        info!(
            "{} epochs of biased SGD over {} ratings, {}ms training time",
            self.parameters.max_iterations,
            num_samples,
            utils::to_millis(build_start.elapsed())
        );
    }

    fn update_online(&mut self, user: usize, item: usize) {
        self.data.set(user, item, POSITIVE_SIGNAL);

        let mut ratings: Vec<(usize, f64)> = self.data.row(user).iter().collect();
        ratings.sort_by_key(|&(rated_item, _)| rated_item);

        for _ in 0..self.parameters.max_iterations_online {
            self.rng.shuffle(&mut ratings);
            for &(rated_item, rating) in ratings.iter() {
                self.step(user, rated_item, rating);
            }
        }
    }

    fn predict(&self, user: usize, item: usize) -> f64 {
        self.global_bias + self.user_bias[user] + self.item_bias[item] +
            utils::dot_product(&self.user_features[user], &self.item_features[item])
    }

    fn similar_items(&self, item: usize, how_many: usize) -> Vec<usize> {
        let features = &self.item_features[item];

        let scores = (0..self.item_features.len())
            .filter(|other| *other != item)
            .map(|other| (other, utils::cosine_similarity(features, &self.item_features[other])));

        TopK::from_scores(scores, how_many).into_sorted_items()
    }

    /// Squared error plus L2 regularization of both feature matrices.
    fn loss(&self) -> f64 {
        let magnitudes: f64 = self.user_features.iter()
            .chain(self.item_features.iter())
            .map(|features| utils::magnitude_squared(features))
            .sum();

        recommender::squared_error(self) + self.parameters.regularization * magnitudes
    }
}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::types::Rating;

    fn dense_data() -> SparseMatrix {
        // 5 users x 5 items, all cells known
        let ratings = [
            [5.0, 3.0, 4.0, 1.0, 2.0],
            [4.0, 2.0, 5.0, 1.0, 1.0],
            [1.0, 5.0, 2.0, 4.0, 5.0],
            [2.0, 4.0, 1.0, 5.0, 4.0],
            [5.0, 2.0, 4.0, 2.0, 1.0],
        ];

        let mut data = SparseMatrix::new(5, 5);
        for (user, row) in ratings.iter().enumerate() {
            for (item, rating) in row.iter().enumerate() {
                data.set(user, item, *rating);
            }
        }
        data
    }

    fn parameters() -> SgdParameters {
        SgdParameters {
            factors: 3,
            max_iterations: 1,
            max_iterations_online: 3,
            learning_rate: 0.02,
            regularization: 0.01,
            seed: 17,
        }
    }

    #[test]
    fn loss_decreases_on_average() {
        let mut sgd = BiasedSgd::new(dense_data(), parameters());

        let initial_loss = sgd.loss();
        let mut losses = Vec::new();
        for _ in 0..200 {
            sgd.build();
            losses.push(sgd.loss());
        }

        let first_half: f64 = losses[..100].iter().sum::<f64>() / 100.0;
        let second_half: f64 = losses[100..].iter().sum::<f64>() / 100.0;

        assert!(first_half < initial_loss);
        assert!(second_half < first_half);
    }

    #[test]
    fn same_seed_same_model() {
        let mut first = BiasedSgd::new(dense_data(), parameters());
        let mut second = BiasedSgd::new(dense_data(), parameters());

        first.build();
        second.build();

        assert_eq!(first.user_features(), second.user_features());
        assert_eq!(first.predict(2, 3), second.predict(2, 3));
    }

    #[test]
    fn fitted_model_beats_global_mean() {
        let mut params = parameters();
        params.max_iterations = 300;
        let mut sgd = BiasedSgd::new(dense_data(), params);
        sgd.build();

        let ratings: Vec<Rating> = sgd.data().iter()
            .map(|(user, item, score)| Rating::new(user, item, score))
            .collect();

        let mean = ratings.iter().map(|rating| rating.score).sum::<f64>() / ratings.len() as f64;
        let baseline = (ratings.iter()
            .map(|rating| (rating.score - mean) * (rating.score - mean))
            .sum::<f64>() / ratings.len() as f64).sqrt();

        assert!(sgd.rmse(&ratings) < baseline);
    }

    #[test]
    fn online_update_moves_towards_signal() {
        let mut data = SparseMatrix::new(3, 4);
        data.set(0, 0, 1.0);
        data.set(1, 1, 1.0);
        data.set(2, 0, 1.0);

        let mut params = parameters();
        params.max_iterations_online = 50;
        params.learning_rate = 0.05;
        let mut sgd = BiasedSgd::new(data, params);
        sgd.build();

        let before = sgd.predict(0, 3);
        sgd.update_online(0, 3);

        assert_eq!(sgd.data().get(0, 3), POSITIVE_SIGNAL);
        assert!((sgd.predict(0, 3) - POSITIVE_SIGNAL).abs() < (before - POSITIVE_SIGNAL).abs());
    }

    #[test]
    fn similar_items_exclude_item() {
        let mut sgd = BiasedSgd::new(dense_data(), parameters());
        sgd.build();

        let similar = sgd.similar_items(2, 3);
        assert_eq!(similar.len(), 3);
        assert!(!similar.contains(&2));

        assert_eq!(sgd.similar_items(2, 0).len(), 4);
    }

    #[test]
    fn build_without_ratings_is_a_no_op() {
        let mut sgd = BiasedSgd::new(SparseMatrix::new(2, 2), parameters());
        sgd.build();

        assert_eq!(sgd.global_bias(), 0.0);
        assert_eq!(sgd.tune(), 0.0);
    }

    #[test]
    fn draws_match_sampling_from_the_live_rows() {
        let mut data = dense_data();
        data.set(1, 3, 0.0);
        data.set(4, 0, 0.0);
        data.set(4, 1, 0.0);
        let mut params = parameters();
        params.max_iterations = 3;

        let mut built = BiasedSgd::new(data.clone(), params.clone());
        built.build();

        // Same draws, but collecting and sorting the sampled row for every single draw.
        let mut replayed = BiasedSgd::new(data, params);
        let active_users: Vec<usize> = (0..5).collect();
        let num_samples = replayed.data().non_zeros();
        for _ in 0..3 {
            for _ in 0..num_samples {
                let user = active_users[replayed.rng.gen_range(0, active_users.len())];
                let mut ratings: Vec<(usize, f64)> = replayed.data().row(user).iter().collect();
                ratings.sort_by_key(|&(item, _)| item);
                let (item, rating) = ratings[replayed.rng.gen_range(0, ratings.len())];
                replayed.step(user, item, rating);
            }
        }

        assert_eq!(built.user_features(), replayed.user_features());
        assert_eq!(built.item_features(), replayed.item_features());
        assert_eq!(built.global_bias(), replayed.global_bias());
    }

    #[test]
    fn tune_reports_training_error() {
        let mut params = parameters();
        params.max_iterations = 5;
        let mut sgd = BiasedSgd::new(dense_data(), params);

        let first = sgd.tune();
        assert!(first > 0.0 && first.is_finite());
        assert_eq!(sgd.training_rmse(), first);

        let mut last = first;
        for _ in 0..100 {
            last = sgd.tune();
        }
        assert!(last < first);

        sgd.init();
        assert_eq!(sgd.training_rmse(), 0.0);
    }
}
