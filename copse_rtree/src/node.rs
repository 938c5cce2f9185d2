// Copyright 2026 the Copse Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-capacity tree node: layout, sibling ordering, and in-node sorting.

use alloc::sync::Arc;
use core::array;

use crate::types::{Aabb, Coord};

/// Maximum entries per node.
pub(crate) const MAX_ENTRIES: usize = 64;

/// Minimum entries per non-root node, restored by splits and by reinsertion
/// after deletes.
pub(crate) const MIN_ENTRIES: usize = MAX_ENTRIES * 10 / 100;

/// A tree node. Entry rectangles live in `rects[..count]`; the parallel
/// payload or child reference lives in the matching `slots` position. The
/// rectangles are kept separate from the tail so MBR scans stay dense.
#[derive(Clone)]
pub(crate) struct Node<N: Coord, T> {
    /// Version tag: the node is writable by a tree iff this matches the
    /// tree's own version.
    pub(crate) cow: u64,
    pub(crate) count: usize,
    pub(crate) rects: [Aabb<N>; MAX_ENTRIES],
    pub(crate) slots: Slots<N, T>,
}

/// Tail storage. A node's kind is fixed at allocation: a leaf carries
/// payload items, a branch carries child references. Positions at `count..`
/// hold `None`, so a removed entry never keeps a payload alive and a stale
/// child reference can never be followed.
#[derive(Clone)]
pub(crate) enum Slots<N: Coord, T> {
    Leaf([Option<T>; MAX_ENTRIES]),
    Branch([Option<Arc<Node<N, T>>>; MAX_ENTRIES]),
}

impl<N: Coord, T> Node<N, T> {
    pub(crate) fn new(cow: u64, leaf: bool) -> Self {
        let slots = if leaf {
            Slots::Leaf(array::from_fn(|_| None))
        } else {
            Slots::Branch(array::from_fn(|_| None))
        };
        Self {
            cow,
            count: 0,
            rects: [Aabb::ZERO; MAX_ENTRIES],
            slots,
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self.slots, Slots::Leaf(_))
    }

    /// MBR covering the active entries. Meaningful only when `count >= 1`.
    pub(crate) fn rect(&self) -> Aabb<N> {
        let mut r = self.rects[0];
        for i in 1..self.count {
            r.expand(&self.rects[i]);
        }
        r
    }

    pub(crate) fn child(&self, i: usize) -> &Arc<Node<N, T>> {
        match &self.slots {
            Slots::Branch(children) => children[i].as_ref().expect("empty child slot"),
            Slots::Leaf(_) => unreachable!("leaf nodes have no children"),
        }
    }

    pub(crate) fn children_mut(&mut self) -> &mut [Option<Arc<Node<N, T>>>; MAX_ENTRIES] {
        match &mut self.slots {
            Slots::Branch(children) => children,
            Slots::Leaf(_) => unreachable!("leaf nodes have no children"),
        }
    }

    /// Swap entries `i` and `j`, keeping the tail in lockstep.
    pub(crate) fn swap(&mut self, i: usize, j: usize) {
        self.rects.swap(i, j);
        match &mut self.slots {
            Slots::Leaf(items) => items.swap(i, j),
            Slots::Branch(children) => children.swap(i, j),
        }
    }

    /// Bubble entry `idx` left while it sorts before its predecessor.
    /// Returns the final index.
    pub(crate) fn order_to_left(&mut self, mut idx: usize) -> usize {
        while idx > 0 && self.rects[idx].min[0] < self.rects[idx - 1].min[0] {
            self.swap(idx, idx - 1);
            idx -= 1;
        }
        idx
    }

    /// Bubble entry `idx` right while its successor sorts before it.
    /// Returns the final index.
    pub(crate) fn order_to_right(&mut self, mut idx: usize) -> usize {
        while idx + 1 < self.count && self.rects[idx + 1].min[0] < self.rects[idx].min[0] {
            self.swap(idx + 1, idx);
            idx += 1;
        }
        idx
    }

    /// First index whose rectangle's `min[0]` does not sort before `key`,
    /// or `count`. Leaves are kept ordered, so this is the insertion slot.
    pub(crate) fn rsearch(&self, key: N) -> usize {
        for i in 0..self.count {
            if self.rects[i].min[0] >= key {
                return i;
            }
        }
        self.count
    }

    pub(crate) fn sort(&mut self) {
        self.qsort(0, self.count, 0, false, false);
    }

    /// Sort by `min[axis]` (or `max[axis]` when `use_max`), descending when
    /// `rev`. Only the splitter's underflow repair uses non-default keys.
    pub(crate) fn sort_by_axis(&mut self, axis: usize, rev: bool, use_max: bool) {
        self.qsort(0, self.count, axis, rev, use_max);
    }

    pub(crate) fn is_sorted(&self) -> bool {
        for i in 1..self.count {
            if self.rects[i].min[0] < self.rects[i - 1].min[0] {
                return false;
            }
        }
        true
    }

    // Middle-pivot quicksort over rects[s..e] with the tail reordered in
    // lockstep. No randomization; nodes hold at most MAX_ENTRIES entries.
    fn qsort(&mut self, s: usize, e: usize, axis: usize, rev: bool, use_max: bool) {
        let n = e - s;
        if n < 2 {
            return;
        }
        let mut left = 0;
        let right = n - 1;
        let pivot = n / 2;
        self.swap(s + pivot, s + right);
        let key = |r: &Aabb<N>| if use_max { r.max[axis] } else { r.min[axis] };
        for i in 0..n {
            let a = key(&self.rects[s + i]);
            let b = key(&self.rects[s + right]);
            let before = if rev { b < a } else { a < b };
            if before {
                self.swap(s + i, s + left);
                left += 1;
            }
        }
        self.swap(s + left, s + right);
        self.qsort(s, s + left, axis, rev, use_max);
        self.qsort(s + left + 1, e, axis, rev, use_max);
    }

    /// Move entry `i` into `into` by swapping with the last entry and
    /// clearing the vacated slot. Both nodes must share a kind.
    pub(crate) fn move_entry_into(&mut self, i: usize, into: &mut Node<N, T>) {
        into.rects[into.count] = self.rects[i];
        self.rects[i] = self.rects[self.count - 1];
        match (&mut self.slots, &mut into.slots) {
            (Slots::Leaf(from), Slots::Leaf(to)) => {
                to[into.count] = from[i].take();
                from[i] = from[self.count - 1].take();
            }
            (Slots::Branch(from), Slots::Branch(to)) => {
                to[into.count] = from[i].take();
                from[i] = from[self.count - 1].take();
            }
            _ => unreachable!("split siblings share a kind"),
        }
        self.count -= 1;
        into.count += 1;
    }

    /// Index of the child whose MBR needs the least area enlargement to
    /// cover `ir`; ties break toward the smaller existing area.
    pub(crate) fn choose_least_enlargement(&self, ir: &Aabb<N>) -> usize {
        let mut best = 0;
        let mut best_cost: Option<(N, N)> = None;
        for i in 0..self.count {
            let area = self.rects[i].area();
            let enlargement = self.rects[i].union_area(ir) - area;
            let better = match best_cost {
                None => true,
                Some((be, ba)) => enlargement < be || (enlargement <= be && area < ba),
            };
            if better {
                best = i;
                best_cost = Some((enlargement, area));
            }
        }
        best
    }

    /// Number of entries reachable under this node.
    pub(crate) fn deep_count(&self) -> usize {
        match &self.slots {
            Slots::Leaf(_) => self.count,
            Slots::Branch(children) => children[..self.count]
                .iter()
                .map(|c| c.as_ref().expect("empty child slot").deep_count())
                .sum(),
        }
    }
}
