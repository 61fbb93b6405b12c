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

use crate::topk::TopK;
use crate::types::{Rating, SparseMatrix};

/// Value recorded in the interaction matrix for an online interaction.
pub const POSITIVE_SIGNAL: f64 = 1.0;

/// Common contract of all estimators. An estimator owns the user x item interaction matrix it is
/// fitted on and supplies the primitives `init`, `build`, `update_online`, `predict` and
/// `similar_items`; ranking and evaluation are provided on top of them.
///
/// User and item indices must be in range, callers validate them.
pub trait Recommender {

    fn data(&self) -> &SparseMatrix;

    fn data_mut(&mut self) -> &mut SparseMatrix;

    /// Replaces the interaction matrix. The estimator state is stale until `init` has run.
    fn set_data(&mut self, data: SparseMatrix);

    /// Allocates (or regenerates) all model state for the current shape of the data.
    fn init(&mut self);

    /// Fits the model on all known interactions.
    fn build(&mut self);

    /// Records an interaction of `user` with `item` and re-optimises locally around it.
    fn update_online(&mut self, user: usize, item: usize);

    fn predict(&self, user: usize, item: usize) -> f64;

    /// Up to `how_many` items most similar to `item`, best first, never `item` itself.
    fn similar_items(&self, item: usize, how_many: usize) -> Vec<usize>;

    fn num_users(&self) -> usize {
        self.data().num_rows()
    }

    fn num_items(&self) -> usize {
        self.data().num_columns()
    }

    /// Objective value of the model, plain squared error unless an estimator adds its own terms.
    fn loss(&self) -> f64 {
        squared_error(self)
    }

    /// The `how_many` best scored items for `user`, best first. A size of zero ranks all items.
    fn recommend_top_k(&self, user: usize, how_many: usize, ignore_known: bool) -> Vec<usize> {
        let known = self.data().row(user);

        let scores = (0..self.num_items()).map(|item| (item, self.predict(user, item)));

        TopK::from_scores_filtered(scores, how_many, |item, _| !(ignore_known && known.contains(item)))
            .into_sorted_items()
    }

    /// Whether `item` is part of `recommend_top_k(user, how_many, ignore_known)`. Counts the
    /// eligible items scoring strictly higher first and gives up as soon as they fill the list.
    fn is_hit(&self, user: usize, item: usize, how_many: usize, ignore_known: bool) -> bool {
        let known = self.data().row(user);
        let eligible = |other: usize| !(ignore_known && known.contains(other));

        if !eligible(item) {
            return false;
        }

        let target_score = self.predict(user, item);
        let num_items = self.num_items();

        let mut scores = Vec::with_capacity(num_items);
        let mut num_better = 0;

        for other in 0..num_items {
            let score = self.predict(user, other);
            if eligible(other) && score > target_score {
                num_better += 1;
                if how_many > 0 && num_better >= how_many {
                    return false;
                }
            }
            scores.push((other, score));
        }

        TopK::from_scores_filtered(scores, how_many, |other, _| eligible(other)).contains(item)
    }

    /// Fraction of the ratings whose item shows up in the user's top list, zero for no ratings.
    fn hit_rate(&self, ratings: &[Rating], how_many: usize, ignore_known: bool) -> f64 {
        if ratings.is_empty() {
            return 0.0;
        }

        let hits = ratings.iter()
            .filter(|rating| self.is_hit(rating.user, rating.item, how_many, ignore_known))
            .count();

        hits as f64 / ratings.len() as f64
    }

    /// Root mean squared error over the ratings, zero for no ratings.
    fn rmse(&self, ratings: &[Rating]) -> f64 {
        if ratings.is_empty() {
            return 0.0;
        }

        let sum_of_squares: f64 = ratings.iter()
            .map(|rating| {
                let difference = self.predict(rating.user, rating.item) - rating.score;
                difference * difference
            })
            .sum();

        (sum_of_squares / ratings.len() as f64).sqrt()
    }
}

/// Sum of squared residuals over all nonzero cells of the estimator's data.
pub fn squared_error<R: Recommender + ?Sized>(recommender: &R) -> f64 {
    recommender.data()
        .iter()
        .map(|(user, item, rating)| {
            let difference = recommender.predict(user, item) - rating;
            difference * difference
        })
        .sum()
}
