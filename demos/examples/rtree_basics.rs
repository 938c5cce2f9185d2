// Copyright 2026 the Copse Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! R-tree basics.
//!
//! Build a small index, query it by rectangle, and delete an entry.
//!
//! Run:
//! - `cargo run -p copse_demos --example rtree_basics`

use copse_rtree::{Aabb, RTree};

fn main() {
    // Index a handful of named boxes
    let mut tree = RTree::new();
    tree.insert(Aabb::new([0.0, 0.0], [40.0, 40.0]), "backdrop");
    tree.insert(Aabb::new([10.0, 10.0], [20.0, 20.0]), "button");
    tree.insert(Aabb::new([15.0, 15.0], [35.0, 25.0]), "tooltip");
    tree.insert(Aabb::new([60.0, 60.0], [70.0, 70.0]), "offscreen");

    println!("{} entries, bounds {:?}", tree.len(), tree.bounds());

    // Everything overlapping the pointer region
    let probe = Aabb::new([18.0, 18.0], [19.0, 19.0]);
    let mut hits = Vec::new();
    tree.search(probe, |rect, &name| {
        hits.push((name, rect));
        true
    });
    println!("hits at {:?}:", probe);
    for (name, rect) in &hits {
        println!("  {name}: {rect:?}");
    }
    assert_eq!(hits.len(), 3, "backdrop, button, and tooltip overlap");

    // Delete matches by containment plus payload equality
    let removed = tree.delete(Aabb::new([10.0, 10.0], [20.0, 20.0]), &"button");
    println!("deleted button: {removed}");
    assert!(removed);
    assert_eq!(tree.len(), 3);

    // Full scan visits what is left
    let mut names = Vec::new();
    tree.scan(|_, &name| {
        names.push(name);
        true
    });
    names.sort_unstable();
    println!("remaining: {names:?}");
    assert_eq!(names, ["backdrop", "offscreen", "tooltip"]);
}
