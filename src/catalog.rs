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

/// Source of users, items and their ratings. The order of `all_users` and `all_items` defines
/// the dense indices and has to be stable for the lifetime of a session.
pub trait Catalog {
    type User;
    type Item;

    fn all_users(&self) -> Vec<Self::User>;

    fn all_items(&self) -> Vec<Self::Item>;

    /// `None` if the user did not rate the item.
    fn rating(&self, item: &Self::Item, user: &Self::User) -> Option<f64>;
}
