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

use fnv::FnvHashMap;

pub type DenseVector = Vec<f64>;
pub type DenseMatrix = Vec<DenseVector>;

pub fn new_dense_matrix(num_rows: usize, num_columns: usize) -> DenseMatrix {
    vec![vec![0.0; num_columns]; num_rows]
}

/// Index-based rating, only used for batch evaluation (loss, RMSE, hit rate).
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rating {
    pub user: usize,
    pub item: usize,
    pub score: f64,
}

impl Rating {
    pub fn new(user: usize, item: usize, score: f64) -> Self {
        Rating { user, item, score }
    }
}

/// Sparse vector over a fixed logical dimension. Zeros are never stored.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct SparseVector {
    size: usize,
    entries: FnvHashMap<usize, f64>,
}

impl SparseVector {

    pub fn new(size: usize) -> Self {
        SparseVector { size, entries: FnvHashMap::default() }
    }

    /// Logical dimension, not the number of stored entries.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of nonzero entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> f64 {
        self.entries.get(&index).cloned().unwrap_or(0.0)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.entries.contains_key(&index)
    }

    pub fn set(&mut self, index: usize, value: f64) {
        if value == 0.0 {
            self.entries.remove(&index);
        } else {
            self.entries.insert(index, value);
        }
    }

    pub fn iter<'a>(&'a self) -> impl Iterator<Item=(usize, f64)> + 'a {
        self.entries.iter().map(|(index, value)| (*index, *value))
    }

    /// Iterates over the sparser side and looks up the other one.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        if self.len() > other.len() {
            return other.dot(self);
        }

        self.entries.iter()
            .map(|(index, value)| value * other.get(*index))
            .sum()
    }

    pub fn magnitude_squared(&self) -> f64 {
        self.entries.values().map(|value| value * value).sum()
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude_squared().sqrt()
    }

    fn resize(&mut self, size: usize) {
        self.size = size;
    }
}

/// Sparse matrix holding the same cells twice, once indexed by row and once by column. Both views
/// are only mutated through `set`, which keeps `rows[i][j] == columns[j][i]`.
#[derive(Clone, PartialEq, Debug)]
pub struct SparseMatrix {
    rows: Vec<SparseVector>,
    columns: Vec<SparseVector>,
}

impl SparseMatrix {

    pub fn new(num_rows: usize, num_columns: usize) -> Self {
        SparseMatrix {
            rows: vec![SparseVector::new(num_columns); num_rows],
            columns: vec![SparseVector::new(num_rows); num_columns],
        }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.rows[row].get(column)
    }

    pub fn set(&mut self, row: usize, column: usize, value: f64) {
        self.rows[row].set(column, value);
        self.columns[column].set(row, value);
    }

    pub fn row(&self, row: usize) -> &SparseVector {
        &self.rows[row]
    }

    pub fn column(&self, column: usize) -> &SparseVector {
        &self.columns[column]
    }

    /// Number of nonzero cells, counted along the shorter dimension.
    pub fn non_zeros(&self) -> usize {
        if self.rows.len() < self.columns.len() {
            self.rows.iter().map(|row| row.len()).sum()
        } else {
            self.columns.iter().map(|column| column.len()).sum()
        }
    }

    /// All nonzero cells as `(row, column, value)`, ordered by row index.
    pub fn iter<'a>(&'a self) -> impl Iterator<Item=(usize, usize, f64)> + 'a {
        self.rows.iter()
            .enumerate()
            .flat_map(|(row_index, row)| {
                row.iter().map(move |(column_index, value)| (row_index, column_index, value))
            })
    }

    /// Consumes the matrix and returns one with additional empty rows and columns. Existing cells
    /// keep their positions and values.
    pub fn grow(self, additional_rows: usize, additional_columns: usize) -> SparseMatrix {
        let num_rows = self.rows.len() + additional_rows;
        let num_columns = self.columns.len() + additional_columns;

        let SparseMatrix { mut rows, mut columns } = self;

        for row in rows.iter_mut() {
            row.resize(num_columns);
        }
        rows.resize(num_rows, SparseVector::new(num_columns));

        for column in columns.iter_mut() {
            column.resize(num_rows);
        }
        columns.resize(num_columns, SparseVector::new(num_rows));

        SparseMatrix { rows, columns }
    }
}


#[cfg(test)]
mod tests {

    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_removes_entry() {
        let mut vector = SparseVector::new(10);
        vector.set(3, 2.0);
        assert_eq!(vector.len(), 1);
        assert!(vector.contains(3));

        vector.set(3, 0.0);
        assert!(vector.is_empty());
        assert!(!vector.contains(3));
        assert_eq!(vector.get(3), 0.0);
        assert_eq!(vector.size(), 10);
    }

    #[test]
    fn dot_and_magnitude() {
        let mut a = SparseVector::new(5);
        a.set(0, 1.0);
        a.set(2, 2.0);
        a.set(4, 3.0);

        let mut b = SparseVector::new(5);
        b.set(2, 4.0);

        assert_eq!(a.dot(&b), 8.0);
        assert_eq!(b.dot(&a), 8.0);
        assert_eq!(a.magnitude_squared(), 14.0);
        assert!((a.magnitude() - 14.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(SparseVector::new(5).dot(&a), 0.0);
    }

    #[test]
    fn non_zeros_counts_cells() {
        let mut matrix = SparseMatrix::new(2, 3);
        matrix.set(0, 0, 1.0);
        matrix.set(1, 2, 5.0);
        matrix.set(1, 1, 2.0);
        matrix.set(1, 1, 0.0);

        assert_eq!(matrix.non_zeros(), 2);

        let mut cells: Vec<(usize, usize, f64)> = matrix.iter().collect();
        cells.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        assert_eq!(cells, vec![(0, 0, 1.0), (1, 2, 5.0)]);
    }

    #[test]
    fn grow_keeps_cells() {
        let mut matrix = SparseMatrix::new(2, 2);
        matrix.set(0, 1, 3.0);
        matrix.set(1, 0, 4.0);

        let grown = matrix.grow(1, 2);

        assert_eq!(grown.num_rows(), 3);
        assert_eq!(grown.num_columns(), 4);
        assert_eq!(grown.get(0, 1), 3.0);
        assert_eq!(grown.column(0).get(1), 4.0);
        assert_eq!(grown.row(0).size(), 4);
        assert_eq!(grown.column(3).size(), 3);
        assert_eq!(grown.get(2, 3), 0.0);
        assert_eq!(grown.non_zeros(), 2);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn row_and_column_views_agree(
            cells in prop::collection::vec((0usize..8, 0usize..6, -3i32..4), 0..40)
        ) {
            let mut matrix = SparseMatrix::new(8, 6);

            for &(row, column, value) in cells.iter() {
                let value = value as f64;
                matrix.set(row, column, value);

                prop_assert_eq!(matrix.row(row).get(column), value);
                prop_assert_eq!(matrix.column(column).get(row), value);
                if value == 0.0 {
                    prop_assert!(!matrix.row(row).contains(column));
                    prop_assert!(!matrix.column(column).contains(row));
                }
            }

            for row in 0..8 {
                for column in 0..6 {
                    prop_assert_eq!(matrix.row(row).get(column), matrix.column(column).get(row));
                }
            }
        }

        #[test]
        fn growth_preserves_data(
            cells in prop::collection::vec((0usize..5, 0usize..5, 1i32..6), 0..20),
            additional_rows in 0usize..4,
            additional_columns in 0usize..4
        ) {
            let mut matrix = SparseMatrix::new(5, 5);
            for &(row, column, value) in cells.iter() {
                matrix.set(row, column, value as f64);
            }
            let original = matrix.clone();

            let grown = matrix.grow(additional_rows, additional_columns);

            for (row, column, value) in original.iter() {
                prop_assert_eq!(grown.get(row, column), value);
                prop_assert_eq!(grown.column(column).get(row), value);
            }
            for row in 0..grown.num_rows() {
                for column in 0..grown.num_columns() {
                    if row >= 5 || column >= 5 {
                        prop_assert_eq!(grown.get(row, column), 0.0);
                    }
                }
            }
            prop_assert_eq!(grown.non_zeros(), original.non_zeros());
        }
    }
}
