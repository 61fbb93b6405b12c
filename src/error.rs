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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecoError {
    #[error("unknown user {0}")]
    UnknownUser(String),

    #[error("unknown item {0}")]
    UnknownItem(String),

    #[error("user {0} is already known")]
    DuplicateUser(String),

    #[error("item {0} is already known")]
    DuplicateItem(String),

    #[error("could not parse '{value}' in line {line}")]
    Parse { line: u64, value: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RecoError>;
