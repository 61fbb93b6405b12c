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

use std::time::Duration;

use rand::{Rng, SeedableRng, XorShiftRng};
use rand::distributions::{IndependentSample, Normal};

use crate::types::DenseMatrix;

/// Standard deviation of the Gaussian used to initialise feature vectors.
const FEATURE_STD_DEV: f64 = 0.1;

pub fn to_millis(duration: Duration) -> u64 {
    (duration.as_secs() * 1_000) + (duration.subsec_nanos() / 1_000_000) as u64
}

/// Creates a generator from a 64 bit seed. The xorshift generator must not be seeded with zeros
/// only, so the upper half of its state is fixed.
pub fn seeded_rng(seed: u64) -> XorShiftRng {
    XorShiftRng::from_seed([seed as u32, (seed >> 32) as u32, 0x9E37_79B9, 0x7F4A_7C15])
}

/// Dense `num_rows x factors` matrix of small Gaussian noise, N(0, 0.1²).
pub fn random_features<R: Rng>(num_rows: usize, factors: usize, rng: &mut R) -> DenseMatrix {
    let normal = Normal::new(0.0, FEATURE_STD_DEV);

    let mut features = Vec::with_capacity(num_rows);
    for _ in 0..num_rows {
        let mut row = Vec::with_capacity(factors);
        for _ in 0..factors {
            row.push(normal.ind_sample(rng));
        }
        features.push(row);
    }
    features
}

pub fn dot_product(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

pub fn magnitude_squared(a: &[f64]) -> f64 {
    dot_product(a, a)
}

/// Cosine similarity, zero if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let magnitudes = (magnitude_squared(a) * magnitude_squared(b)).sqrt();
    if magnitudes == 0.0 {
        0.0
    } else {
        dot_product(a, b) / magnitudes
    }
}

/// Randomly holds out roughly `test_fraction` of the given entries.
pub fn train_test_split<T, R: Rng>(
    entries: Vec<T>,
    test_fraction: f64,
    rng: &mut R,
) -> (Vec<T>, Vec<T>) {

    let mut train = Vec::with_capacity(entries.len());
    let mut test = Vec::new();

    for entry in entries.into_iter() {
        if rng.next_f64() < test_fraction {
            test.push(entry);
        } else {
            train.push(entry);
        }
    }

    (train, test)
}
