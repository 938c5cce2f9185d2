// Copyright 2026 the Copse Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree core: mutation, queries, and the copy-on-write layer.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::node::{MAX_ENTRIES, MIN_ENTRIES, Node, Slots};
use crate::split::split_largest_axis_edge_snap;
use crate::types::{Aabb, Coord};

/// Process-wide version dispenser for snapshots. Fresh trees start at the 0
/// sentinel; every snapshot hands out two new versions. The counter is
/// 64-bit and wraparound is not a practical concern.
static COW_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_version() -> u64 {
    COW_COUNTER.fetch_add(1, Ordering::Relaxed) + 1
}

/// An in-memory two-dimensional R-tree over axis-aligned rectangles.
///
/// Stores `(Aabb<N>, T)` entries and answers overlap queries. [`copy`]
/// produces a constant-time logical snapshot: the two trees share nodes
/// until one of them writes, at which point the touched path is cloned
/// lazily.
///
/// A tree is single-threaded: callers must serialize mutations with each
/// other and with queries on the same instance. Distinct trees (including a
/// tree and its snapshot) are independent.
///
/// [`copy`]: RTree::copy
pub struct RTree<N: Coord, T> {
    cow: u64,
    count: usize,
    rect: Aabb<N>,
    root: Option<Arc<Node<N, T>>>,
}

impl<N: Coord, T> RTree<N, T> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            cow: 0,
            count: 0,
            rect: Aabb::ZERO,
            root: None,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.count
    }

    /// True when the tree holds no entries.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Minimum bounding rectangle of all entries, or the zero rectangle
    /// when the tree is empty.
    pub fn bounds(&self) -> Aabb<N> {
        self.rect
    }

    /// Visit every entry whose rectangle intersects `target`, until `iter`
    /// returns `false`.
    pub fn search<F>(&self, target: Aabb<N>, mut iter: F)
    where
        F: FnMut(Aabb<N>, &T) -> bool,
    {
        let Some(root) = &self.root else { return };
        if target.intersects(&self.rect) {
            node_search(root, &target, &mut iter);
        }
    }

    /// Visit every entry, until `iter` returns `false`.
    pub fn scan<F>(&self, mut iter: F)
    where
        F: FnMut(Aabb<N>, &T) -> bool,
    {
        if let Some(root) = &self.root {
            node_scan(root, &mut iter);
        }
    }
}

impl<N: Coord, T: Clone> RTree<N, T> {
    /// Insert one entry.
    pub fn insert(&mut self, aabb: Aabb<N>, data: T) {
        if self.root.is_none() {
            self.root = Some(Arc::new(Node::new(self.cow, true)));
            self.rect = aabb;
        }
        let grown = node_insert(
            self.cow,
            &self.rect,
            self.root.as_mut().expect("root just ensured"),
            &aabb,
            data,
        );
        let split = self.root.as_ref().expect("root present").count == MAX_ENTRIES;
        if grown {
            self.rect.expand(&aabb);
        }
        if split {
            // The root overflowed: split it and grow the tree by one level.
            let mut left = self.root.take().expect("root present");
            let right = {
                let left = Arc::get_mut(&mut left).expect("mutating a shared node");
                split_largest_axis_edge_snap(self.cow, self.rect, left)
            };
            let mut root = Node::new(self.cow, false);
            root.rects[0] = left.rect();
            root.rects[1] = right.rect();
            {
                let children = root.children_mut();
                children[0] = Some(left);
                children[1] = Some(Arc::new(right));
            }
            root.count = 2;
            self.root = Some(Arc::new(root));
        }
        if grown || split {
            let root = Arc::get_mut(self.root.as_mut().expect("root present"))
                .expect("mutating a shared node");
            if !root.is_leaf() {
                root.sort();
            }
        }
        self.count += 1;
    }

    /// Snapshot the tree.
    ///
    /// The snapshot shares every node with the source; both trees then
    /// receive fresh versions, so the first write on either side through a
    /// shared node clones just the touched path. Takes `&mut self` because
    /// the source is re-versioned.
    pub fn copy(&mut self) -> Self {
        let root = self.root.clone();
        let count = self.count;
        let rect = self.rect;
        self.cow = next_version();
        Self {
            cow: next_version(),
            count,
            rect,
            root,
        }
    }
}

impl<N: Coord, T: Clone + PartialEq> RTree<N, T> {
    /// Remove at most one entry whose rectangle lies inside `aabb` and whose
    /// payload equals `data`. Returns whether an entry was removed.
    pub fn delete(&mut self, aabb: Aabb<N>, data: &T) -> bool {
        if self.root.is_none() || !self.rect.contains(&aabb) {
            return false;
        }
        let mut reinsert = Vec::new();
        let (removed, _) = node_delete(
            self.cow,
            &mut self.rect,
            self.root.as_mut().expect("root present"),
            &aabb,
            data,
            &mut reinsert,
        );
        if !removed {
            return false;
        }
        self.count -= 1;
        for n in &reinsert {
            self.count -= n.deep_count();
        }
        if self.count == 0 {
            self.root = None;
            self.rect = Aabb::ZERO;
        } else {
            // A branch root with a single child is replaced by that child.
            loop {
                let Some(root) = &self.root else { break };
                if root.is_leaf() || root.count != 1 {
                    break;
                }
                let child = root.child(0).clone();
                self.root = Some(child);
            }
        }
        for n in reinsert {
            self.node_reinsert(&n);
        }
        true
    }

    /// Delete `old` and, only when it was present, insert `new`.
    pub fn replace(&mut self, old: Aabb<N>, old_data: &T, new: Aabb<N>, new_data: T) {
        if self.delete(old, old_data) {
            self.insert(new, new_data);
        }
    }

    // Re-add every entry reachable under a node pruned during delete. Going
    // back through `insert` re-chooses subtrees under the current geometry.
    fn node_reinsert(&mut self, n: &Node<N, T>) {
        match &n.slots {
            Slots::Leaf(items) => {
                for i in 0..n.count {
                    let data = items[i].as_ref().expect("empty payload slot").clone();
                    self.insert(n.rects[i], data);
                }
            }
            Slots::Branch(children) => {
                for child in &children[..n.count] {
                    self.node_reinsert(child.as_ref().expect("empty child slot"));
                }
            }
        }
    }
}

impl<N: Coord, T> Default for RTree<N, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Coord, T> fmt::Debug for RTree<N, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RTree")
            .field("len", &self.count)
            .field("bounds", &self.rect)
            .field("has_root", &self.root.is_some())
            .finish_non_exhaustive()
    }
}

/// Load the node behind `slot` for writing. When the node's version differs
/// from the tree's, it belongs to a snapshot sibling: clone it (header, MBR
/// array, and active tail) and swap the clone into the slot first.
fn cow_load<'a, N: Coord, T: Clone>(cow: u64, slot: &'a mut Arc<Node<N, T>>) -> &'a mut Node<N, T> {
    if slot.cow != cow {
        let mut copy = (**slot).clone();
        copy.cow = cow;
        *slot = Arc::new(copy);
    }
    // A version-matched node is referenced by exactly one tree.
    Arc::get_mut(slot).expect("mutating a shared node")
}

fn node_insert<N: Coord, T: Clone>(
    cow: u64,
    nr: &Aabb<N>,
    slot: &mut Arc<Node<N, T>>,
    ir: &Aabb<N>,
    data: T,
) -> bool {
    let n = cow_load(cow, slot);
    if n.is_leaf() {
        // Leaves stay ordered by min x: shift the tail right and drop the
        // new entry into its slot.
        let index = n.rsearch(ir.min[0]);
        let count = n.count;
        n.rects.copy_within(index..count, index + 1);
        n.rects[index] = *ir;
        match &mut n.slots {
            Slots::Leaf(items) => {
                items[index..=count].rotate_right(1);
                items[index] = Some(data);
            }
            Slots::Branch(_) => unreachable!("leaf insert on a branch"),
        }
        n.count += 1;
        return !nr.contains(ir);
    }

    // Choose a subtree: the smallest child already covering the rectangle
    // wins, otherwise fall back to least enlargement.
    let mut covering: Option<(usize, N)> = None;
    for i in 0..n.count {
        if n.rects[i].contains(ir) {
            let area = n.rects[i].area();
            if covering.is_none_or(|(_, best)| area < best) {
                covering = Some((i, area));
            }
        }
    }
    let mut index = match covering {
        Some((i, _)) => i,
        None => n.choose_least_enlargement(ir),
    };

    let (mut grown, split) = {
        let (rects, slots) = (&mut n.rects, &mut n.slots);
        let children = match slots {
            Slots::Branch(children) => children,
            Slots::Leaf(_) => unreachable!("descending through a leaf"),
        };
        let child = children[index].as_mut().expect("empty child slot");
        let grown = node_insert(cow, &rects[index], child, ir, data);
        let child_count = children[index].as_ref().expect("empty child slot").count;
        (grown, child_count == MAX_ENTRIES)
    };
    if grown {
        // The child rectangle must expand to cover the new entry, which can
        // move it left in the sibling order.
        n.rects[index].expand(ir);
        index = n.order_to_left(index);
        grown = !nr.contains(ir);
    }
    if split {
        let crect = n.rects[index];
        let right = {
            let child = n.children_mut()[index].as_mut().expect("empty child slot");
            let child = Arc::get_mut(child).expect("mutating a shared node");
            split_largest_axis_edge_snap(cow, crect, child)
        };
        n.rects[index] = n.child(index).rect();
        // The right sibling goes immediately after the left; later entries
        // shift right by one.
        let count = n.count;
        n.rects.copy_within(index + 1..count, index + 2);
        n.rects[index + 1] = right.rect();
        match &mut n.slots {
            Slots::Branch(children) => {
                children[index + 1..=count].rotate_right(1);
                children[index + 1] = Some(Arc::new(right));
            }
            Slots::Leaf(_) => unreachable!("splitting a leaf child of a leaf"),
        }
        n.count += 1;
        if n.rects[index + 1].min[0] < n.rects[index].min[0] {
            n.swap(index + 1, index);
        }
        n.order_to_right(index + 1);
    }
    grown
}

fn node_delete<N: Coord, T: Clone + PartialEq>(
    cow: u64,
    nr: &mut Aabb<N>,
    slot: &mut Arc<Node<N, T>>,
    ir: &Aabb<N>,
    data: &T,
    reinsert: &mut Vec<Arc<Node<N, T>>>,
) -> (bool, bool) {
    let n = cow_load(cow, slot);
    if n.is_leaf() {
        let mut found = None;
        if let Slots::Leaf(items) = &n.slots {
            for i in 0..n.count {
                if ir.contains(&n.rects[i]) && items[i].as_ref() == Some(data) {
                    found = Some(i);
                    break;
                }
            }
        }
        let Some(i) = found else {
            return (false, false);
        };
        // Ordered removal: shift the tail left and clear the vacated slot.
        let removed = n.rects[i];
        let count = n.count;
        n.rects.copy_within(i + 1..count, i);
        if let Slots::Leaf(items) = &mut n.slots {
            items[i..count].rotate_left(1);
            items[count - 1] = None;
        }
        n.count -= 1;
        let shrunk = removed.on_edge(nr);
        if shrunk {
            *nr = n.rect();
        }
        return (true, shrunk);
    }

    let count = n.count;
    for i in 0..count {
        if !n.rects[i].contains(ir) {
            continue;
        }
        let crect = n.rects[i];
        let (removed, mut shrunk) = {
            let (rects, slots) = (&mut n.rects, &mut n.slots);
            let children = match slots {
                Slots::Branch(children) => children,
                Slots::Leaf(_) => unreachable!("descending through a leaf"),
            };
            let child = children[i].as_mut().expect("empty child slot");
            node_delete(cow, &mut rects[i], child, ir, data, reinsert)
        };
        if !removed {
            continue;
        }
        if n.child(i).count < MIN_ENTRIES {
            // The child underflowed: prune the whole subtree and schedule
            // its entries for reinsertion.
            let child = n.children_mut()[i].take().expect("empty child slot");
            reinsert.push(child);
            n.rects.copy_within(i + 1..count, i);
            if let Slots::Branch(children) = &mut n.slots {
                children[i..count].rotate_left(1);
            }
            n.count -= 1;
            *nr = n.rect();
            return (true, true);
        }
        if shrunk {
            shrunk = n.rects[i] != crect;
            if shrunk {
                *nr = n.rect();
            }
            n.order_to_right(i);
        }
        return (true, shrunk);
    }
    (false, false)
}

fn node_search<N: Coord, T, F>(n: &Node<N, T>, target: &Aabb<N>, iter: &mut F) -> bool
where
    F: FnMut(Aabb<N>, &T) -> bool,
{
    match &n.slots {
        Slots::Leaf(items) => {
            for i in 0..n.count {
                if n.rects[i].intersects(target) {
                    let item = items[i].as_ref().expect("empty payload slot");
                    if !iter(n.rects[i], item) {
                        return false;
                    }
                }
            }
        }
        Slots::Branch(children) => {
            for i in 0..n.count {
                if target.intersects(&n.rects[i]) {
                    let child = children[i].as_ref().expect("empty child slot");
                    if !node_search(child, target, iter) {
                        return false;
                    }
                }
            }
        }
    }
    true
}

fn node_scan<N: Coord, T, F>(n: &Node<N, T>, iter: &mut F) -> bool
where
    F: FnMut(Aabb<N>, &T) -> bool,
{
    match &n.slots {
        Slots::Leaf(items) => {
            for i in 0..n.count {
                let item = items[i].as_ref().expect("empty payload slot");
                if !iter(n.rects[i], item) {
                    return false;
                }
            }
        }
        Slots::Branch(children) => {
            for child in &children[..n.count] {
                let child = child.as_ref().expect("empty child slot");
                if !node_scan(child, iter) {
                    return false;
                }
            }
        }
    }
    true
}

#[cfg(test)]
impl<N: Coord, T> RTree<N, T> {
    /// Walk the whole tree asserting the structural invariants: tight slot
    /// MBRs, capacity bounds, sibling order, cleared sentinels, and the
    /// count/bounds bookkeeping.
    pub(crate) fn check_invariants(&self) {
        let Some(root) = &self.root else {
            assert_eq!(self.count, 0, "empty tree with nonzero count");
            assert_eq!(self.rect, Aabb::ZERO, "empty tree with nonzero bounds");
            return;
        };
        assert!(self.count > 0, "rooted tree with zero count");
        assert_eq!(self.count, root.deep_count(), "count out of sync");
        assert_eq!(self.rect, root.rect(), "tree bounds not tight");
        if !root.is_leaf() {
            assert!(root.count >= 2, "branch root not collapsed");
        }
        check_node(root, true);
    }
}

#[cfg(test)]
fn check_node<N: Coord, T>(n: &Node<N, T>, is_root: bool) {
    assert!(n.count <= MAX_ENTRIES);
    if !is_root {
        assert!(n.count >= MIN_ENTRIES, "non-root node under capacity");
    }
    assert!(n.is_sorted(), "sibling order broken");
    match &n.slots {
        Slots::Leaf(items) => {
            for item in &items[..n.count] {
                assert!(item.is_some(), "active payload slot is empty");
            }
            for item in &items[n.count..] {
                assert!(item.is_none(), "stale payload past count");
            }
        }
        Slots::Branch(children) => {
            for i in 0..n.count {
                let child = children[i].as_ref().expect("empty child slot");
                assert_eq!(n.rects[i], child.rect(), "slot MBR not tight");
                check_node(child, false);
            }
            for child in &children[n.count..] {
                assert!(child.is_none(), "stale child past count");
            }
        }
    }
}
