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
use std::io::{stdout, BufWriter, Write};
use std::path::Path;

use serde_derive::Serialize;

use crate::error::{RecoError, Result};

/// Score assumed for lines without an explicit rating.
pub const IMPLICIT_FEEDBACK: f64 = 1.0;

/// Reads a ratings file. We expect NO headers, and a user, an item and an optional score per
/// line with tab separation.
pub fn read_ratings<P: AsRef<Path>>(path: P) -> Result<Vec<(String, String, f64)>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .flexible(true)
        .from_path(path)?;

    let mut ratings = Vec::new();

    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|position| position.line()).unwrap_or(0);

        let (user, item) = match (record.get(0), record.get(1)) {
            (Some(user), Some(item)) => (user, item),
            _ => return Err(RecoError::Parse { line, value: record.iter().collect::<Vec<_>>().join("\t") }),
        };

        let score = match record.get(2) {
            Some(value) if !value.trim().is_empty() => value.trim().parse::<f64>()
                .map_err(|_| RecoError::Parse { line, value: value.to_owned() })?,
            _ => IMPLICIT_FEEDBACK,
        };

        ratings.push((user.to_owned(), item.to_owned(), score));
    }

    Ok(ratings)
}

/// Struct used for JSON serialization of computed recommendations. Field names will be used in
/// JSON.
#[derive(Serialize)]
struct Recommendations<'a> {
    for_user: &'a str,
    recommended_items: &'a [String],
}

/// Writes one JSON object per user. If an `output_path` is supplied, we write to a file at the
/// specified path, otherwise, we output to stdout.
pub fn write_recommendations(
    recommendations: &[(String, Vec<String>)],
    output_path: Option<String>,
) -> Result<()> {

    let out: Box<dyn Write> = match output_path {
        Some(path) => Box::new(File::create(Path::new(&path))?),
        _ => Box::new(stdout()),
    };

    let mut out = BufWriter::new(out);

    for (for_user, recommended_items) in recommendations.iter() {
        let json = serde_json::to_string(&Recommendations { for_user, recommended_items })?;
        writeln!(out, "{}", json)?;
    }

    out.flush()?;

    Ok(())
}
