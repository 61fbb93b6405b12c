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

use fnv::{FnvHashMap, FnvHashSet};

use crate::catalog::Catalog;

/// In-memory catalog over string identities. Users and items are kept in the order in which they
/// first appear, a later rating for the same pair replaces the earlier one.
pub struct DataDictionary {
    users: Vec<String>,
    items: Vec<String>,
    ratings: FnvHashMap<String, FnvHashMap<String, f64>>,
    num_interactions: u64,
}

impl DataDictionary {

    pub fn num_users(&self) -> usize {
        self.users.len()
    }

    pub fn num_items(&self) -> usize {
        self.items.len()
    }

    /// Number of rating triples read, including overwritten ones.
    pub fn num_interactions(&self) -> u64 {
        self.num_interactions
    }

    pub fn users(&self) -> &[String] {
        &self.users
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Registers identities without ratings, e.g. those only seen in held-out data.
    pub fn register(&mut self, user: &str, item: &str) {
        if !self.users.iter().any(|known| known == user) {
            self.users.push(user.to_owned());
        }
        if !self.items.iter().any(|known| known == item) {
            self.items.push(item.to_owned());
        }
    }
}

impl DataDictionary {

    pub fn from_ratings<'a, T>(ratings: T) -> Self
        where T: IntoIterator<Item=&'a (String, String, f64)> {

        let mut users = Vec::new();
        let mut seen_users: FnvHashSet<String> =
            FnvHashSet::with_capacity_and_hasher(100, Default::default());

        let mut items = Vec::new();
        let mut seen_items: FnvHashSet<String> =
            FnvHashSet::with_capacity_and_hasher(100, Default::default());

        let mut stored: FnvHashMap<String, FnvHashMap<String, f64>> =
            FnvHashMap::with_capacity_and_hasher(100, Default::default());

        let mut num_interactions: u64 = 0;

        for (user, item, score) in ratings {

            if !seen_users.contains(user) {
                seen_users.insert(user.clone());
                users.push(user.clone());
            }

            if !seen_items.contains(item) {
                seen_items.insert(item.clone());
                items.push(item.clone());
            }

            stored.entry(user.clone())
                .or_insert_with(FnvHashMap::default)
                .insert(item.clone(), *score);
            num_interactions += 1;
        }

        DataDictionary { users, items, ratings: stored, num_interactions }
    }
}

impl Catalog for DataDictionary {
    type User = String;
    type Item = String;

    fn all_users(&self) -> Vec<String> {
        self.users.clone()
    }

    fn all_items(&self) -> Vec<String> {
        self.items.clone()
    }

    fn rating(&self, item: &String, user: &String) -> Option<f64> {
        self.ratings.get(user)
            .and_then(|rated| rated.get(item))
            .cloned()
    }
}
