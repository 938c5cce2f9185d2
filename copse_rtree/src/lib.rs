// Copyright 2026 the Copse Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=copse_rtree --heading-base-level=0

//! Copse R-tree: an in-memory 2D R-tree with copy-on-write snapshots.
//!
//! Copse R-tree indexes `(rectangle, payload)` pairs for fast point and
//! region overlap queries.
//!
//! - Insert, delete, and replace axis-aligned rectangles with user payloads.
//! - Query by intersecting rectangle ([`RTree::search`]) or walk every entry
//!   ([`RTree::scan`]), with early stop when the visitor returns `false`.
//! - Take a constant-time logical snapshot with [`RTree::copy`]: the trees
//!   share nodes until one side writes, then just the touched path is cloned.
//!
//! It is generic over the scalar type `N` (any primitive integer, or
//! `f32`/`f64`) and does not depend on any geometry crate. Nodes hold up to
//! 64 entries in parallel fixed arrays (rectangles separate from payloads)
//! so bounding-box scans stay dense in cache. Splits use a largest-axis
//! edge-snap heuristic, and deletions that underfill a node reinsert the
//! node's entries so the tree re-packs under its current geometry.
//!
//! # Example
//!
//! ```rust
//! use copse_rtree::{Aabb, RTree};
//!
//! let mut tree = RTree::new();
//! tree.insert(Aabb::new([0.0, 0.0], [10.0, 10.0]), "a");
//! tree.insert(Aabb::new([5.0, 5.0], [15.0, 15.0]), "b");
//!
//! // Collect everything overlapping a probe rectangle.
//! let mut hits = Vec::new();
//! tree.search(Aabb::new([9.0, 9.0], [11.0, 11.0]), |_rect, &name| {
//!     hits.push(name);
//!     true
//! });
//! hits.sort_unstable();
//! assert_eq!(hits, ["a", "b"]);
//!
//! // Delete matches by rectangle containment plus payload equality.
//! assert!(tree.delete(Aabb::new([0.0, 0.0], [10.0, 10.0]), &"a"));
//! assert_eq!(tree.len(), 1);
//! ```
//!
//! ## Snapshots
//!
//! ```rust
//! use copse_rtree::{Aabb, RTree};
//!
//! let mut live = RTree::new();
//! for i in 0..100i64 {
//!     live.insert(Aabb::point([i, i]), i);
//! }
//!
//! // A snapshot is O(1); the 100 entries are shared, not copied.
//! let frozen = live.copy();
//! for i in 100..150 {
//!     live.insert(Aabb::point([i, i]), i);
//! }
//! assert_eq!(live.len(), 150);
//! assert_eq!(frozen.len(), 100);
//! ```
//!
//! ## Scalar semantics
//!
//! Coordinates use their native comparison and arithmetic semantics. For
//! floating-point scalars the crate assumes finite values: `NaN` corners
//! give unspecified (but non-panicking) results, and rectangles with
//! `min > max` are accepted as-is with degenerate query behavior. A tree is
//! not safe for concurrent use with itself; snapshots are the sharing story.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod node;
mod split;
mod tree;
mod types;

pub use tree::RTree;
pub use types::{Aabb, Coord};
