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

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_derive::{Deserialize, Serialize};

use crate::biased_sgd::{BiasedSgd, SgdParameters};
use crate::error::Result;
use crate::fast_als::{FastAls, FastAlsParameters};
use crate::item_knn::{ItemKnn, ItemKnnParameters};
use crate::memory_based::{MemoryBased, MemoryBasedParameters};
use crate::recommender::Recommender;
use crate::types::SparseMatrix;

/// Estimator choice together with its parameters, e.g.
/// `{"model": "fast_als", "factors": 10, "coefficient": 25.0}`. Omitted parameters take their
/// defaults.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ModelConfig {
    BiasedSgd(SgdParameters),
    FastAls(FastAlsParameters),
    ItemKnn(ItemKnnParameters),
    MemoryBased(MemoryBasedParameters),
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig::FastAls(FastAlsParameters::default())
    }
}

impl ModelConfig {

    /// Default parameters for a model name as used in configuration files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "biased_sgd" => Some(ModelConfig::BiasedSgd(SgdParameters::default())),
            "fast_als" => Some(ModelConfig::FastAls(FastAlsParameters::default())),
            "item_knn" => Some(ModelConfig::ItemKnn(ItemKnnParameters::default())),
            "memory_based" => Some(ModelConfig::MemoryBased(MemoryBasedParameters::default())),
            _ => None,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config = serde_json::from_reader(reader)?;
        Ok(config)
    }

    pub fn name(&self) -> &'static str {
        match *self {
            ModelConfig::BiasedSgd(_) => "biased_sgd",
            ModelConfig::FastAls(_) => "fast_als",
            ModelConfig::ItemKnn(_) => "item_knn",
            ModelConfig::MemoryBased(_) => "memory_based",
        }
    }

    /// Creates the (initialised, not yet fitted) estimator over `data`.
    pub fn into_recommender(self, data: SparseMatrix) -> Box<dyn Recommender> {
        match self {
            ModelConfig::BiasedSgd(parameters) => Box::new(BiasedSgd::new(data, parameters)),
            ModelConfig::FastAls(parameters) => Box::new(FastAls::new(data, parameters)),
            ModelConfig::ItemKnn(parameters) => Box::new(ItemKnn::new(data, parameters)),
            ModelConfig::MemoryBased(parameters) => Box::new(MemoryBased::new(data, parameters)),
        }
    }
}
