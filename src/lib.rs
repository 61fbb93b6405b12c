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

// Recommenders that learn from user/item interactions and keep learning from new ones:
// biased matrix factorization fitted with SGD, element-wise weighted ALS with cached Gram
// matrices, and two item-neighbourhood models. A `RecommendationManager` maps arbitrary user
// and item identities onto the dense indices the estimators work with.

#[macro_use]
extern crate log;

pub mod types;
pub mod topk;
pub mod utils;
pub mod error;
pub mod recommender;
pub mod biased_sgd;
pub mod fast_als;
pub mod item_knn;
pub mod memory_based;
pub mod catalog;
pub mod manager;
pub mod config;
pub mod stats;
pub mod io;

mod usage_tests;

pub use crate::catalog::Catalog;
pub use crate::config::ModelConfig;
pub use crate::error::{RecoError, Result};
pub use crate::manager::RecommendationManager;
pub use crate::recommender::Recommender;
