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

use std::fmt::Debug;
use std::hash::Hash;
use std::mem;

use fnv::FnvHashMap;

use crate::catalog::Catalog;
use crate::error::{RecoError, Result};
use crate::recommender::Recommender;
use crate::types::{Rating, SparseMatrix};

/// Maps user and item identities to the dense indices of one estimator and back. The estimator
/// owns the interaction matrix; whenever the matrix changes shape or content from here, the
/// estimator is re-initialised before control returns to the caller.
pub struct RecommendationManager<U, I> {
    users: Vec<U>,
    items: Vec<I>,
    user_indices: FnvHashMap<U, usize>,
    item_indices: FnvHashMap<I, usize>,
    recommender: Box<dyn Recommender>,
}

/// Position of every identity, or the first one that shows up twice.
fn index_identities<T>(identities: &[T]) -> std::result::Result<FnvHashMap<T, usize>, String>
    where T: Eq + Hash + Clone + Debug {

    let mut indices: FnvHashMap<T, usize> =
        FnvHashMap::with_capacity_and_hasher(identities.len(), Default::default());

    for (index, identity) in identities.iter().enumerate() {
        if indices.insert(identity.clone(), index).is_some() {
            return Err(format!("{:?}", identity));
        }
    }

    Ok(indices)
}

impl<U, I> RecommendationManager<U, I>
    where U: Eq + Hash + Clone + Debug,
          I: Eq + Hash + Clone + Debug {

    /// Creates the interaction matrix from the ratings and hands it to `generator`, which returns
    /// an initialised estimator like the constructors of this crate do. Call `initialize` to fit.
    pub fn new<R, F>(users: Vec<U>, items: Vec<I>, ratings: R, generator: F) -> Result<Self>
        where R: IntoIterator<Item=(U, I, f64)>,
              F: FnOnce(SparseMatrix) -> Box<dyn Recommender> {

        let user_indices = index_identities(&users).map_err(RecoError::DuplicateUser)?;
        let item_indices = index_identities(&items).map_err(RecoError::DuplicateItem)?;

        let mut data = SparseMatrix::new(users.len(), items.len());

        for (user, item, score) in ratings {
            let user_index = user_indices.get(&user).cloned()
                .ok_or_else(|| RecoError::UnknownUser(format!("{:?}", user)))?;
            let item_index = item_indices.get(&item).cloned()
                .ok_or_else(|| RecoError::UnknownItem(format!("{:?}", item)))?;

            data.set(user_index, item_index, score);
        }

        let recommender = generator(data);

        Ok(RecommendationManager { users, items, user_indices, item_indices, recommender })
    }

    pub fn from_catalog<C, F>(catalog: &C, generator: F) -> Result<Self>
        where C: Catalog<User=U, Item=I>,
              F: FnOnce(SparseMatrix) -> Box<dyn Recommender> {

        let users = catalog.all_users();
        let items = catalog.all_items();

        let mut ratings = Vec::new();
        for item in items.iter() {
            for user in users.iter() {
                if let Some(score) = catalog.rating(item, user) {
                    ratings.push((user.clone(), item.clone(), score));
                }
            }
        }

        RecommendationManager::new(users, items, ratings, generator)
    }

    pub fn users(&self) -> &[U] {
        &self.users
    }

    pub fn items(&self) -> &[I] {
        &self.items
    }

    /// The active estimator, e.g. for evaluation with `rmse` or `hit_rate`.
    pub fn recommender(&self) -> &dyn Recommender {
        self.recommender.as_ref()
    }

    pub fn user_index(&self, user: &U) -> Result<usize> {
        self.user_indices.get(user)
            .cloned()
            .ok_or_else(|| RecoError::UnknownUser(format!("{:?}", user)))
    }

    pub fn item_index(&self, item: &I) -> Result<usize> {
        self.item_indices.get(item)
            .cloned()
            .ok_or_else(|| RecoError::UnknownItem(format!("{:?}", item)))
    }

    /// Index-based rating for batch evaluation.
    pub fn to_rating(&self, user: &U, item: &I, score: f64) -> Result<Rating> {
        Ok(Rating::new(self.user_index(user)?, self.item_index(item)?, score))
    }

    /// Fits the estimator on all known interactions.
    pub fn initialize(&mut self) {
        self.recommender.build();
    }

    /// Stored rating, `None` if unrated.
    pub fn rating(&self, user: &U, item: &I) -> Result<Option<f64>> {
        let score = self.recommender.data().get(self.user_index(user)?, self.item_index(item)?);
        Ok(if score == 0.0 { None } else { Some(score) })
    }

    /// Writes one cell and resets the estimator, `initialize` fits it again.
    pub fn put_rating(&mut self, user: &U, item: &I, score: f64) -> Result<()> {
        let cell = (self.user_index(user)?, self.item_index(item)?, score);
        self.write_cells(vec![cell]);
        Ok(())
    }

    /// Like `put_rating` for many cells, resets the estimator once. Nothing is written if any
    /// identity is unknown.
    pub fn put_ratings<R>(&mut self, ratings: R) -> Result<()>
        where R: IntoIterator<Item=(U, I, f64)> {

        let mut cells = Vec::new();
        for (user, item, score) in ratings {
            cells.push((self.user_index(&user)?, self.item_index(&item)?, score));
        }
        self.write_cells(cells);
        Ok(())
    }

    fn write_cells(&mut self, cells: Vec<(usize, usize, f64)>) {
        let data = self.recommender.data_mut();
        for (user, item, score) in cells {
            data.set(user, item, score);
        }
        self.recommender.init();
    }

    /// Online update of the estimator with a new interaction.
    pub fn on_interaction(&mut self, user: &U, item: &I) -> Result<()> {
        let user_index = self.user_index(user)?;
        let item_index = self.item_index(item)?;
        self.recommender.update_online(user_index, item_index);
        Ok(())
    }

    pub fn add_user(&mut self, user: U) -> Result<()> {
        if self.user_indices.contains_key(&user) {
            return Err(RecoError::DuplicateUser(format!("{:?}", user)));
        }

        self.user_indices.insert(user.clone(), self.users.len());
        self.users.push(user);
        self.grow(1, 0);
        Ok(())
    }

    pub fn add_item(&mut self, item: I) -> Result<()> {
        if self.item_indices.contains_key(&item) {
            return Err(RecoError::DuplicateItem(format!("{:?}", item)));
        }

        self.item_indices.insert(item.clone(), self.items.len());
        self.items.push(item);
        self.grow(0, 1);
        Ok(())
    }

    /// Replaces the estimator's matrix by a grown copy and re-initialises the estimator against
    /// the new shape.
    fn grow(&mut self, additional_users: usize, additional_items: usize) {
        let data = mem::replace(self.recommender.data_mut(), SparseMatrix::new(0, 0));
        self.recommender.set_data(data.grow(additional_users, additional_items));
        self.recommender.init();
    }

    pub fn predict(&self, user: &U, item: &I) -> Result<f64> {
        Ok(self.recommender.predict(self.user_index(user)?, self.item_index(item)?))
    }

    pub fn recommend_items(&self, user: &U, how_many: usize, ignore_known: bool) -> Result<Vec<I>> {
        let user_index = self.user_index(user)?;
        let recommended = self.recommender.recommend_top_k(user_index, how_many, ignore_known);
        Ok(self.to_items(recommended))
    }

    pub fn similar_items(&self, item: &I, how_many: usize) -> Result<Vec<I>> {
        let item_index = self.item_index(item)?;
        let similar = self.recommender.similar_items(item_index, how_many);
        Ok(self.to_items(similar))
    }

    fn to_items(&self, indices: Vec<usize>) -> Vec<I> {
        indices.into_iter()
            .map(|index| self.items[index].clone())
            .collect()
    }
}
