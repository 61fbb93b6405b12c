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

use serde_derive::{Deserialize, Serialize};

use crate::recommender::{Recommender, POSITIVE_SIGNAL};
use crate::topk::{ScoredItem, TopK};
use crate::types::{DenseVector, SparseMatrix, SparseVector};
use crate::utils;

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct MemoryBasedParameters {
    /// Most similar items a prediction is aggregated over, zero uses all.
    pub neighbours: usize,
}

impl Default for MemoryBasedParameters {
    fn default() -> Self {
        MemoryBasedParameters { neighbours: 25 }
    }
}

/// Mean-centred item neighbourhood model. Items are compared by their cosine similarity over the
/// users who rated both, a prediction adds the similarity-weighted deviations of the user's
/// ratings of the most similar items to the item's mean rating.
pub struct MemoryBased {
    data: SparseMatrix,
    parameters: MemoryBasedParameters,
    means: DenseVector,
    neighbours: Vec<Vec<ScoredItem>>,
}

impl MemoryBased {

    pub fn new(data: SparseMatrix, parameters: MemoryBasedParameters) -> Self {
        let mut memory_based = MemoryBased {
            means: Vec::new(),
            neighbours: Vec::new(),
            data,
            parameters,
        };
        memory_based.init();
        memory_based
    }

    pub fn parameters(&self) -> &MemoryBasedParameters {
        &self.parameters
    }

    /// Takes effect with the next `build`.
    pub fn set_parameters(&mut self, parameters: MemoryBasedParameters) {
        self.parameters = parameters;
    }

    /// Mean of the known ratings of `item`, zero if nobody rated it.
    pub fn mean(&self, item: usize) -> f64 {
        self.means[item]
    }

    /// Retained neighbours of `item`, most similar first.
    pub fn neighbours(&self, item: usize) -> &[ScoredItem] {
        &self.neighbours[item]
    }

    /// Cosine similarity of two items over the users who rated both. An item is fully similar to
    /// itself.
    pub fn similarity(&self, first: usize, second: usize) -> f64 {
        if first == second {
            return 1.0;
        }
        co_rated_cosine(self.data.column(first), self.data.column(second))
    }
}

fn co_rated_cosine(first: &SparseVector, second: &SparseVector) -> f64 {
    let (sparser, denser) = if first.len() <= second.len() {
        (first, second)
    } else {
        (second, first)
    };

    let mut dot = 0.0;
    let mut sparser_magnitude = 0.0;
    let mut denser_magnitude = 0.0;

    for (user, x) in sparser.iter() {
        let y = denser.get(user);
        if y != 0.0 {
            dot += x * y;
            sparser_magnitude += x * x;
            denser_magnitude += y * y;
        }
    }

    if sparser_magnitude == 0.0 || denser_magnitude == 0.0 {
        0.0
    } else {
        dot / (sparser_magnitude * denser_magnitude).sqrt()
    }
}

fn column_mean(data: &SparseMatrix, item: usize) -> f64 {
    let column = data.column(item);
    if column.is_empty() {
        0.0
    } else {
        column.iter().map(|(_, rating)| rating).sum::<f64>() / column.len() as f64
    }
}

impl Recommender for MemoryBased {

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
        let num_items = self.data.num_columns();
        self.means = (0..num_items).map(|item| column_mean(&self.data, item)).collect();
        self.neighbours = vec![Vec::new(); num_items];
    }

    fn build(&mut self) {
        let build_start = Instant::now();
        let num_items = self.data.num_columns();

        let neighbours: Vec<Vec<ScoredItem>> = (0..num_items)
            .map(|item| {
                let scores = (0..num_items)
                    .filter(|other| *other != item)
                    .map(|other| (other, self.similarity(item, other)))
                    .filter(|&(_, similarity)| similarity != 0.0);

                TopK::from_scores(scores, self.parameters.neighbours).into_sorted_vec()
            })
            .collect();

        self.neighbours = neighbours;

        info!(
            "Co-rated neighbourhoods for {} items, {}ms training time",
            num_items,
            utils::to_millis(build_start.elapsed())
        );
    }

    /// Means and neighbourhoods depend on every rating of the item, both are recomputed.
    fn update_online(&mut self, user: usize, item: usize) {
        self.data.set(user, item, POSITIVE_SIGNAL);
        self.means[item] = column_mean(&self.data, item);
        self.build();
    }

    fn predict(&self, user: usize, item: usize) -> f64 {
        let ratings = self.data.row(user);

        let mut numerator = 0.0;
        let mut denominator = 0.0;

        for neighbour in self.neighbours[item].iter() {
            let rating = ratings.get(neighbour.item);
            if rating != 0.0 {
                numerator += neighbour.score * (rating - self.means[neighbour.item]);
                denominator += neighbour.score.abs();
            }
        }

        if denominator == 0.0 {
            self.means[item]
        } else {
            self.means[item] + numerator / denominator
        }
    }

    /// Ranks all other items by co-rated similarity, computed on demand.
    fn similar_items(&self, item: usize, how_many: usize) -> Vec<usize> {
        let scores = (0..self.data.num_columns())
            .filter(|other| *other != item)
            .map(|other| (other, self.similarity(item, other)));

        TopK::from_scores(scores, how_many).into_sorted_items()
    }
}


#[cfg(test)]
mod tests {

    use super::*;

    /// Rows are items, columns are users, zero means unrated.
    const TABLE: [[f64; 5]; 5] = [
        [0.0, 3.0, 4.0, 5.0, 2.0],
        [3.0, 5.0, 2.0, 2.0, 5.0],
        [5.0, 3.0, 0.0, 4.0, 3.0],
        [5.0, 5.0, 5.0, 0.0, 4.0],
        [2.0, 3.0, 0.0, 2.0, 2.0],
    ];

    fn table_data() -> SparseMatrix {
        let mut data = SparseMatrix::new(5, 5);
        for (item, ratings) in TABLE.iter().enumerate() {
            for (user, rating) in ratings.iter().enumerate() {
                data.set(user, item, *rating);
            }
        }
        data
    }

    fn co_rated(a: usize, b: usize) -> f64 {
        let (mut dot, mut magnitude_a, mut magnitude_b) = (0.0, 0.0, 0.0);
        for (x, y) in TABLE[a].iter().zip(TABLE[b].iter()) {
            if *x != 0.0 && *y != 0.0 {
                dot += x * y;
                magnitude_a += x * x;
                magnitude_b += y * y;
            }
        }
        dot / (magnitude_a * magnitude_b).sqrt()
    }

    #[test]
    fn similarity_over_co_rated_users() {
        let model = MemoryBased::new(table_data(), MemoryBasedParameters::default());

        assert_eq!(model.similar_items(0, 3), vec![3, 2, 4]);
        assert_eq!(model.similar_items(0, 0), vec![3, 2, 4, 1]);

        assert!((model.similarity(0, 3) - 0.982_873).abs() < 1e-6);
        assert!((model.similarity(0, 1) - 0.768_347).abs() < 1e-6);
        assert!((model.similarity(3, 0) - model.similarity(0, 3)).abs() < 1e-12);
        assert_eq!(model.similarity(2, 2), 1.0);
    }

    #[test]
    fn means_ignore_unrated_cells() {
        let model = MemoryBased::new(table_data(), MemoryBasedParameters::default());

        assert!((model.mean(0) - 3.5).abs() < 1e-12);
        assert!((model.mean(3) - 4.75).abs() < 1e-12);
        assert!((model.mean(1) - 3.4).abs() < 1e-12);
    }

    #[test]
    fn prediction_centres_on_item_mean() {
        let mut model = MemoryBased::new(table_data(), MemoryBasedParameters::default());
        model.build();

        let mean = |item: usize| {
            let rated: Vec<f64> = TABLE[item].iter().cloned().filter(|r| *r != 0.0).collect();
            rated.iter().sum::<f64>() / rated.len() as f64
        };

        let (mut numerator, mut denominator) = (0.0, 0.0);
        for other in 1..5 {
            let similarity = co_rated(0, other);
            numerator += similarity * (TABLE[other][0] - mean(other));
            denominator += similarity.abs();
        }

        assert!((model.predict(0, 0) - (3.5 + numerator / denominator)).abs() < 1e-9);
    }

    #[test]
    fn prediction_uses_retained_neighbours_only() {
        let mut model = MemoryBased::new(table_data(), MemoryBasedParameters { neighbours: 1 });

        // not built yet, no neighbours
        assert!((model.predict(0, 0) - 3.5).abs() < 1e-12);

        model.build();

        assert_eq!(model.neighbours(0).len(), 1);
        assert_eq!(model.neighbours(0)[0].item, 3);
        // 3.5 + (5 - 4.75)
        assert!((model.predict(0, 0) - 3.75).abs() < 1e-12);
    }

    #[test]
    fn online_update_refreshes_means_and_neighbours() {
        let mut data = SparseMatrix::new(2, 3);
        data.set(0, 0, 4.0);
        data.set(1, 1, 2.0);

        let mut model = MemoryBased::new(data, MemoryBasedParameters::default());
        model.build();
        assert!(model.neighbours(2).is_empty());
        assert_eq!(model.mean(2), 0.0);

        model.update_online(0, 2);

        assert_eq!(model.data().get(0, 2), POSITIVE_SIGNAL);
        assert_eq!(model.mean(2), POSITIVE_SIGNAL);
        assert_eq!(model.neighbours(2)[0].item, 0);
        assert!((model.similarity(0, 2) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn growth_keeps_model_usable() {
        let mut model = MemoryBased::new(table_data(), MemoryBasedParameters::default());
        model.build();

        let grown = model.data().clone().grow(1, 1);
        model.set_data(grown);
        model.init();
        model.build();

        assert_eq!(model.mean(5), 0.0);
        assert_eq!(model.predict(5, 5), 0.0);
        assert_eq!(model.similar_items(5, 0).len(), 5);
    }
}
