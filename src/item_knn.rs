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

use scoped_pool::Pool;
use serde_derive::{Deserialize, Serialize};

use crate::recommender::{Recommender, POSITIVE_SIGNAL};
use crate::topk::{ScoredItem, TopK};
use crate::types::{DenseVector, SparseMatrix};
use crate::utils;

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct ItemKnnParameters {
    /// Number of neighbours kept per item, zero keeps all nonzero similarities.
    pub neighbours: usize,
    /// Worker threads used to compute the similarity rows.
    pub num_threads: usize,
}

impl Default for ItemKnnParameters {
    fn default() -> Self {
        ItemKnnParameters { neighbours: 100, num_threads: 1 }
    }
}

/// Item neighbourhood model: cosine similarities between the item columns of the interaction
/// matrix, optionally pruned to the top neighbours per item.
pub struct ItemKnn {
    data: SparseMatrix,
    parameters: ItemKnnParameters,
    similarity: SparseMatrix,
    magnitudes: DenseVector,
}

impl ItemKnn {

    pub fn new(data: SparseMatrix, parameters: ItemKnnParameters) -> Self {
        let mut knn = ItemKnn {
            similarity: SparseMatrix::new(0, 0),
            magnitudes: Vec::new(),
            data,
            parameters,
        };
        knn.init();
        knn
    }

    pub fn parameters(&self) -> &ItemKnnParameters {
        &self.parameters
    }

    /// Recomputes the column magnitudes right away, the similarities with the next `build`.
    pub fn set_parameters(&mut self, parameters: ItemKnnParameters) {
        self.parameters = parameters;
        self.magnitudes = column_magnitudes(&self.data);
    }

    /// Stored similarities, row `i` holds the (possibly pruned) neighbours of item `i`.
    pub fn similarity(&self) -> &SparseMatrix {
        &self.similarity
    }
}

fn column_magnitudes(data: &SparseMatrix) -> DenseVector {
    (0..data.num_columns())
        .map(|item| data.column(item).magnitude())
        .collect()
}

/// Cosine similarities of `item` to all other items with a nonzero dot product.
fn similarity_row(data: &SparseMatrix, magnitudes: &[f64], item: usize) -> Vec<(usize, f64)> {
    let mut row = Vec::new();

    if magnitudes[item] == 0.0 {
        return row;
    }

    let column = data.column(item);

    for other in 0..data.num_columns() {
        if other == item || magnitudes[other] == 0.0 {
            continue;
        }

        let dot = column.dot(data.column(other));
        if dot != 0.0 {
            row.push((other, dot / (magnitudes[item] * magnitudes[other])));
        }
    }

    row
}

impl Recommender for ItemKnn {

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
        self.similarity = SparseMatrix::new(num_items, num_items);
        self.magnitudes = column_magnitudes(&self.data);
    }

    fn build(&mut self) {
        let build_start = Instant::now();

        let num_items = self.data.num_columns();
        let num_threads = self.parameters.num_threads.max(1);
        let neighbours = self.parameters.neighbours;

        let mut rows: Vec<Vec<ScoredItem>> = vec![Vec::new(); num_items];

        if num_items > 0 {
            let chunk_size = (num_items + num_threads - 1) / num_threads;
            let data = &self.data;
            let magnitudes = &self.magnitudes;

            let pool = Pool::new(num_threads);

            pool.scoped(|scope| {
                for (chunk_index, chunk) in rows.chunks_mut(chunk_size).enumerate() {
                    scope.execute(move || {
                        for (offset, row) in chunk.iter_mut().enumerate() {
                            let item = chunk_index * chunk_size + offset;
                            let scores = similarity_row(data, magnitudes, item);
                            *row = TopK::from_scores(scores, neighbours).into_sorted_vec();
                        }
                    });
                }
            });

            pool.shutdown();
        }

        let mut similarity = SparseMatrix::new(num_items, num_items);
        for (item, row) in rows.into_iter().enumerate() {
            for scored_item in row {
                similarity.set(item, scored_item.item, scored_item.score);
            }
        }
        self.similarity = similarity;

        info!(
            "Item similarities for {} items, {} retained, {}ms training time",
            num_items,
            self.similarity.non_zeros(),
            utils::to_millis(build_start.elapsed())
        );
    }

    /// No incremental state, the similarities are rebuilt completely.
    fn update_online(&mut self, user: usize, item: usize) {
        self.data.set(user, item, POSITIVE_SIGNAL);
        self.magnitudes[item] = self.data.column(item).magnitude();
        self.build();
    }

    /// Weighted sum of the user's known ratings over the neighbours of `item`.
    fn predict(&self, user: usize, item: usize) -> f64 {
        self.data.row(user).dot(self.similarity.row(item))
    }

    /// Served from the stored neighbours unless more are requested than were kept.
    fn similar_items(&self, item: usize, how_many: usize) -> Vec<usize> {
        let neighbours = self.parameters.neighbours;
        let needs_recomputation = neighbours > 0 && (how_many == 0 || how_many > neighbours);

        if needs_recomputation {
            let scores = similarity_row(&self.data, &self.magnitudes, item);
            TopK::from_scores(scores, how_many).into_sorted_items()
        } else {
            TopK::from_scores(self.similarity.row(item).iter(), how_many).into_sorted_items()
        }
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

    fn cosine(a: usize, b: usize) -> f64 {
        let dot: f64 = TABLE[a].iter().zip(TABLE[b].iter()).map(|(x, y)| x * y).sum();
        let magnitude = |row: &[f64; 5]| row.iter().map(|x| x * x).sum::<f64>().sqrt();
        dot / (magnitude(&TABLE[a]) * magnitude(&TABLE[b]))
    }

    #[test]
    fn similar_items_by_cosine() {
        let mut knn = ItemKnn::new(table_data(), ItemKnnParameters::default());
        knn.build();

        let similar = knn.similar_items(0, 3);

        assert_eq!(similar, vec![1, 4, 2]);
        assert!(cosine(0, 1) > cosine(0, 4));
        assert!(cosine(0, 4) > cosine(0, 2));
        assert!(cosine(0, 2) > cosine(0, 3));

        assert!((knn.similarity().get(0, 1) - cosine(0, 1)).abs() < 1e-12);
        assert!((knn.similarity().get(3, 4) - cosine(3, 4)).abs() < 1e-12);
    }

    #[test]
    fn prediction_sums_over_neighbours() {
        let mut knn = ItemKnn::new(table_data(), ItemKnnParameters::default());
        knn.build();

        let expected: f64 = (1..5).map(|other| TABLE[other][0] * cosine(0, other)).sum();

        assert!((knn.predict(0, 0) - expected).abs() < 1e-9);
    }

    #[test]
    fn pruned_neighbours() {
        let parameters = ItemKnnParameters { neighbours: 2, num_threads: 1 };
        let mut knn = ItemKnn::new(table_data(), parameters);
        knn.build();

        assert_eq!(knn.similarity().row(0).len(), 2);
        assert!(knn.similarity().row(0).contains(1));
        assert!(knn.similarity().row(0).contains(4));

        assert_eq!(knn.similar_items(0, 2), vec![1, 4]);
        assert_eq!(knn.similar_items(0, 1), vec![1]);
        // more than stored, recomputed on demand
        assert_eq!(knn.similar_items(0, 3), vec![1, 4, 2]);
        assert_eq!(knn.similar_items(0, 0), vec![1, 4, 2, 3]);
    }

    #[test]
    fn parallel_build_matches_sequential() {
        let mut sequential = ItemKnn::new(table_data(), ItemKnnParameters::default());
        sequential.build();

        let parameters = ItemKnnParameters { neighbours: 100, num_threads: 3 };
        let mut parallel = ItemKnn::new(table_data(), parameters);
        parallel.build();

        assert_eq!(sequential.similarity(), parallel.similarity());
    }

    #[test]
    fn online_update_rebuilds() {
        let mut data = SparseMatrix::new(2, 3);
        data.set(0, 0, 1.0);
        data.set(1, 0, 1.0);
        data.set(1, 1, 1.0);

        let mut knn = ItemKnn::new(data, ItemKnnParameters::default());
        knn.build();

        assert!(knn.similarity().row(2).is_empty());
        assert_eq!(knn.predict(0, 2), 0.0);

        knn.update_online(1, 2);

        assert_eq!(knn.data().get(1, 2), POSITIVE_SIGNAL);
        assert!((knn.similarity().get(2, 1) - 1.0).abs() < 1e-12);
        assert!(knn.predict(0, 2) > 0.0);
        assert!(!knn.similar_items(2, 5).contains(&2));
    }

    #[test]
    fn parameter_change_recomputes_magnitudes() {
        let mut knn = ItemKnn::new(SparseMatrix::new(2, 2), ItemKnnParameters::default());
        knn.data_mut().set(0, 0, 2.0);
        knn.data_mut().set(0, 1, 1.0);

        knn.set_parameters(ItemKnnParameters { neighbours: 1, num_threads: 2 });
        knn.build();

        assert!((knn.similarity().get(0, 1) - 1.0).abs() < 1e-12);
    }
}
