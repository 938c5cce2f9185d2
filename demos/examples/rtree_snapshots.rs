// Copyright 2026 the Copse Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Copy-on-write snapshots.
//!
//! Take a constant-time snapshot, keep mutating the live tree, and show the
//! two diverging without copying the shared structure up front.
//!
//! Run:
//! - `cargo run -p copse_demos --example rtree_snapshots`

use copse_rtree::{Aabb, RTree};

fn main() {
    let mut live = RTree::new();
    for i in 0..1000i64 {
        live.insert(Aabb::point([i % 100, i / 100]), i);
    }
    println!("live: {} entries, bounds {:?}", live.len(), live.bounds());

    // The snapshot shares all 1000 entries with the live tree.
    let frozen = live.copy();

    // Mutations on the live side clone only the touched paths.
    for i in 0..500i64 {
        live.delete(Aabb::point([i % 100, i / 100]), &i);
    }
    live.insert(Aabb::point([500, 500]), 9999);

    println!("live after churn: {} entries", live.len());
    println!("frozen snapshot:  {} entries", frozen.len());
    assert_eq!(live.len(), 501);
    assert_eq!(frozen.len(), 1000);

    // The snapshot still answers queries against the old state.
    let mut frozen_hits = 0;
    frozen.search(Aabb::new([0, 0], [99, 4]), |_, _| {
        frozen_hits += 1;
        true
    });
    let mut live_hits = 0;
    live.search(Aabb::new([0, 0], [99, 4]), |_, _| {
        live_hits += 1;
        true
    });
    println!("hits in the first five rows: frozen={frozen_hits} live={live_hits}");
    assert_eq!(frozen_hits, 500);
    assert_eq!(live_hits, 0);
}
