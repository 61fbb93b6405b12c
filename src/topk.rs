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

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// An item index together with its score.
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct ScoredItem {
    pub item: usize,
    pub score: f64,
}

impl ScoredItem {
    pub fn new(item: usize, score: f64) -> Self {
        ScoredItem { item, score }
    }
}

/// Heap entry, remembers when it was offered so that equal scores have a stable order.
#[derive(Debug)]
struct RankedItem {
    scored_item: ScoredItem,
    sequence: usize,
}

/// Total order on scores in which NaN ranks below every number and equals any other NaN.
fn cmp_scores(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Ordering for our heap: the better an entry, the *smaller* it compares, so the root of the
/// max-heap is always the worst retained entry. Higher scores are better, and for equal scores
/// the entry inserted first is better.
fn cmp_reverse(ranked_a: &RankedItem, ranked_b: &RankedItem) -> Ordering {
    cmp_scores(ranked_b.scored_item.score, ranked_a.scored_item.score)
        .then_with(|| ranked_a.sequence.cmp(&ranked_b.sequence))
}

impl PartialEq for RankedItem {
    fn eq(&self, other: &Self) -> bool {
        cmp_reverse(self, other) == Ordering::Equal
    }
}

impl Eq for RankedItem {}

impl Ord for RankedItem {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_reverse(self, other)
    }
}

impl PartialOrd for RankedItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(cmp_reverse(self, other))
    }
}

/// Retains the `capacity` best scored items offered to it. A capacity of zero means unbounded,
/// which is used to request a full ranking.
pub struct TopK {
    heap: BinaryHeap<RankedItem>,
    capacity: usize,
    offered: usize,
}

impl TopK {

    pub fn new(capacity: usize) -> Self {
        TopK {
            heap: BinaryHeap::with_capacity(capacity),
            capacity,
            offered: 0,
        }
    }

    pub fn from_scores<S>(scores: S, capacity: usize) -> Self
        where S: IntoIterator<Item=(usize, f64)> {

        TopK::from_scores_filtered(scores, capacity, |_, _| true)
    }

    /// The filter is evaluated before an entry is offered, rejected entries never touch the heap.
    pub fn from_scores_filtered<S, F>(scores: S, capacity: usize, filter: F) -> Self
        where S: IntoIterator<Item=(usize, f64)>,
              F: Fn(usize, f64) -> bool {

        let mut topk = TopK::new(capacity);
        for (item, score) in scores {
            if filter(item, score) {
                topk.add(ScoredItem::new(item, score));
            }
        }
        topk
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Offers an entry, returns whether it was retained.
    pub fn add(&mut self, scored_item: ScoredItem) -> bool {
        let ranked_item = RankedItem { scored_item, sequence: self.offered };
        self.offered += 1;

        if self.capacity == 0 || self.heap.len() < self.capacity {
            self.heap.push(ranked_item);
            return true;
        }

        match self.heap.peek_mut() {
            Some(mut top) => {
                if ranked_item < *top {
                    *top = ranked_item;
                    true
                } else {
                    false
                }
            },
            None => false,
        }
    }

    pub fn contains(&self, item: usize) -> bool {
        self.heap.iter().any(|ranked_item| ranked_item.scored_item.item == item)
    }

    /// Retained entries, best first.
    pub fn into_sorted_vec(self) -> Vec<ScoredItem> {
        self.heap.into_sorted_vec()
            .into_iter()
            .map(|ranked_item| ranked_item.scored_item)
            .collect()
    }

    pub fn into_sorted_items(self) -> Vec<usize> {
        self.heap.into_sorted_vec()
            .into_iter()
            .map(|ranked_item| ranked_item.scored_item.item)
            .collect()
    }
}
