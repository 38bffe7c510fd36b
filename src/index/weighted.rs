//! Weighted index - an implicit binary tree for O(log n) weighted sampling
//!
//! Item `i` sits at node `i`; its children are `2i + 1` and `2i + 2`. Every
//! node caches the total weight of its subtree, so a position in
//! `[0, total)` can be walked down to the item whose range contains it.

use rand::Rng;

use crate::core::error::{Result, ScheduleError};
use crate::core::types::{check_item, ItemId};

#[derive(Debug, Clone, Default)]
pub struct WeightedIndex {
    item_weight: Vec<f64>,
    subtree_weight: Vec<f64>,
}

#[inline]
fn left(id: usize) -> usize {
    2 * id + 1
}

#[inline]
fn right(id: usize) -> usize {
    2 * id + 2
}

#[inline]
fn parent(id: usize) -> usize {
    (id - 1) / 2
}

/// Largest float strictly below a positive `bound`, or `p` if already below
#[inline]
fn below(p: f64, bound: f64) -> f64 {
    if p < bound {
        p
    } else {
        f64::from_bits(bound.to_bits() - 1)
    }
}

impl WeightedIndex {
    /// Create an index of `size` items, all with weight zero
    pub fn new(size: usize) -> Self {
        Self {
            item_weight: vec![0.0; size],
            subtree_weight: vec![0.0; size],
        }
    }

    pub fn len(&self) -> usize {
        self.item_weight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_weight.is_empty()
    }

    /// Weight of a single item (zero for ids outside the index)
    pub fn weight(&self, id: ItemId) -> f64 {
        self.item_weight.get(id).copied().unwrap_or(0.0)
    }

    /// Sum of all item weights
    #[inline]
    pub fn total_weight(&self) -> f64 {
        self.subtree_weight.first().copied().unwrap_or(0.0)
    }

    /// Set the weight of `id` and refresh every ancestor's subtree total
    ///
    /// A weight that would push the total past `f64::MAX` is rejected and the
    /// index is left unchanged.
    pub fn set_weight(&mut self, id: ItemId, weight: f64) -> Result<()> {
        check_item(id, self.len())?;
        if !(weight >= 0.0) || weight.is_infinite() {
            return Err(ScheduleError::InvalidWeight(weight));
        }

        let old = std::mem::replace(&mut self.item_weight[id], weight);
        self.refresh_ancestors(id);

        if !self.total_weight().is_finite() {
            self.item_weight[id] = old;
            self.refresh_ancestors(id);
            return Err(ScheduleError::InvalidWeight(weight));
        }
        Ok(())
    }

    // Recompute instead of applying a delta so rounding never accumulates.
    fn refresh_ancestors(&mut self, id: ItemId) {
        let mut node = id;
        loop {
            self.subtree_weight[node] = self.subtree_total(node);
            if node == 0 {
                break;
            }
            node = parent(node);
        }
    }

    fn subtree_total(&self, node: usize) -> f64 {
        let child = |id: usize| self.subtree_weight.get(id).copied().unwrap_or(0.0);
        self.item_weight[node] + child(left(node)) + child(right(node))
    }

    /// Find the item whose cumulative weight range contains `position`
    pub fn find_position(&self, position: f64) -> Result<ItemId> {
        self.find_position_from(position, 0)
    }

    /// Same as `find_position`, restricted to the subtree rooted at `root`
    pub fn find_position_from(&self, position: f64, root: usize) -> Result<ItemId> {
        check_item(root, self.len())?;
        let total = self.subtree_weight[root];
        if !(position >= 0.0 && position < total) {
            return Err(ScheduleError::PositionOutOfRange { position, total });
        }

        let size = self.len();
        let mut node = root;
        let mut p = position;
        loop {
            let item = self.item_weight[node];
            if p < item {
                return Ok(node);
            }
            p -= item;

            let (l, r) = (left(node), right(node));
            let left_weight = if l < size { self.subtree_weight[l] } else { 0.0 };
            let right_weight = if r < size { self.subtree_weight[r] } else { 0.0 };

            if p < left_weight {
                node = l;
                continue;
            }
            p -= left_weight;

            if right_weight > 0.0 {
                node = r;
                p = below(p, right_weight);
            } else if left_weight > 0.0 {
                // Rounding pushed us past the end; take the last item on the left.
                node = l;
                p = below(left_weight, left_weight);
            } else {
                debug_assert!(item > 0.0);
                return Ok(node);
            }
        }
    }

    /// Draw an item with probability proportional to its weight
    ///
    /// Returns `None` when every weight is zero.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<ItemId> {
        let total = self.total_weight();
        if !(total > 0.0 && total.is_finite()) {
            return None;
        }
        let position = rng.gen_range(0.0..total);
        self.find_position(position).ok()
    }

    /// Change the number of items, keeping the weights of surviving ids
    pub fn resize(&mut self, new_size: usize) {
        let mut weights = std::mem::take(&mut self.item_weight);
        weights.resize(new_size, 0.0);
        self.item_weight = weights;
        self.subtree_weight = vec![0.0; new_size];
        for node in (0..new_size).rev() {
            self.subtree_weight[node] = self.subtree_total(node);
        }
    }

    /// Verify every cached subtree total
    pub fn is_consistent(&self) -> bool {
        if self.item_weight.len() != self.subtree_weight.len() {
            return false;
        }
        (0..self.len()).all(|node| {
            self.item_weight[node] >= 0.0 && self.subtree_weight[node] == self.subtree_total(node)
        })
    }
}
