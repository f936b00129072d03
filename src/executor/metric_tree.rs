// Copyright 2025 Joinkit Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Metric-tree executor for distance conditions.
//!
//! Builds a vantage-point tree over the right-side coordinates: each node
//! holds one point and a threshold splitting the remaining points into an
//! inside ball and an outside shell by distance to that point. A radius
//! query walks the tree, pruning subtrees with the triangle inequality.
//!
//! Pruning assumes the metric is a true metric, but every reported index is
//! re-checked with the exact metric and radius predicate. A user function
//! that violates the triangle inequality can therefore miss matches, never
//! invent them.
//!
//! Nodes live in a flat vector with `u32` child links, `u32::MAX` marking
//! an absent child.

use smallvec::SmallVec;

use crate::condition::{Accessor, Condition, Metric, Radius};
use crate::core::Datum;

use super::{Candidates, Probe};

/// Sentinel for an absent child.
const NONE: u32 = u32::MAX;

struct VpNode {
    /// Right index of the vantage point.
    item: u32,
    /// Split distance: inside children satisfy `d(vantage, p) <= threshold`.
    threshold: f64,
    inside: u32,
    outside: u32,
}

struct VpTree {
    nodes: Vec<VpNode>,
    /// Right-side coordinates, indexed by right index.
    coords: Vec<Datum>,
    root: u32,
}

impl VpTree {
    fn build(coords: Vec<Datum>, metric: &Metric) -> Self {
        let mut nodes = Vec::with_capacity(coords.len());
        let items: Vec<u32> = (0..coords.len() as u32).collect();
        let root = Self::build_rec(items, &coords, metric, &mut nodes);
        Self {
            nodes,
            coords,
            root,
        }
    }

    fn build_rec(
        mut items: Vec<u32>,
        coords: &[Datum],
        metric: &Metric,
        nodes: &mut Vec<VpNode>,
    ) -> u32 {
        let Some(vantage) = items.first().copied() else {
            return NONE;
        };
        let rest = items.split_off(1);

        let node_idx = nodes.len() as u32;
        nodes.push(VpNode {
            item: vantage,
            threshold: 0.0,
            inside: NONE,
            outside: NONE,
        });
        if rest.is_empty() {
            return node_idx;
        }

        let mut dists: Vec<(f64, u32)> = rest
            .into_iter()
            .map(|i| {
                (
                    metric.eval(&coords[vantage as usize], &coords[i as usize]),
                    i,
                )
            })
            .collect();
        let mid = (dists.len() - 1) / 2;
        dists.select_nth_unstable_by(mid, |a, b| a.0.total_cmp(&b.0));
        let threshold = dists[mid].0;

        let mut inside = Vec::new();
        let mut outside = Vec::new();
        for (d, i) in dists {
            if d <= threshold {
                inside.push(i);
            } else {
                outside.push(i);
            }
        }

        let inside_root = Self::build_rec(inside, coords, metric, nodes);
        let outside_root = Self::build_rec(outside, coords, metric, nodes);
        nodes[node_idx as usize].threshold = threshold;
        nodes[node_idx as usize].inside = inside_root;
        nodes[node_idx as usize].outside = outside_root;
        node_idx
    }

    /// Collect all right indices whose coordinate satisfies the radius
    /// predicate around `query`. Results come back ascending.
    fn query(
        &self,
        query: &Datum,
        radius: Radius,
        metric: &Metric,
        out: &mut SmallVec<[usize; 8]>,
    ) {
        self.walk(self.root, query, radius, metric, out);
        out.sort_unstable();
    }

    fn walk(
        &self,
        node_idx: u32,
        query: &Datum,
        radius: Radius,
        metric: &Metric,
        out: &mut SmallVec<[usize; 8]>,
    ) {
        if node_idx == NONE {
            return;
        }
        let node = &self.nodes[node_idx as usize];
        let d = metric.eval(query, &self.coords[node.item as usize]);
        // Exact predicate check: pruning is only ever an over-approximation
        if radius.admits(d) {
            out.push(node.item as usize);
        }
        let tau = radius.tau();
        if d - tau <= node.threshold {
            self.walk(node.inside, query, radius, metric, out);
        }
        if d + tau >= node.threshold {
            self.walk(node.outside, query, radius, metric, out);
        }
    }
}

pub(crate) struct TreeProbe<'a, L> {
    left: &'a [L],
    left_coord: Accessor<L>,
    metric: Metric,
    radius: Radius,
    tree: VpTree,
}

impl<'a, L> TreeProbe<'a, L> {
    pub(crate) fn new<R>(left: &'a [L], right: &[R], anchor: &Condition<L, R>) -> Self {
        let (left_coord, right_coord, metric, radius) = match anchor {
            Condition::Distance {
                left,
                right,
                metric,
                radius,
            } => (left.clone(), right, metric.clone(), *radius),
            other => unreachable!("planner selected Tree for {:?}", other),
        };
        let coords: Vec<Datum> = right.iter().map(|r| right_coord.get(r)).collect();
        let tree = VpTree::build(coords, &metric);
        Self {
            left,
            left_coord,
            metric,
            radius,
            tree,
        }
    }
}

impl<L> Probe for TreeProbe<'_, L> {
    fn candidates(&self, li: usize) -> Candidates<'_> {
        let q = self.left_coord.get(&self.left[li]);
        let mut out: SmallVec<[usize; 8]> = SmallVec::new();
        self.tree.query(&q, self.radius, &self.metric, &mut out);
        if out.is_empty() {
            Candidates::Empty
        } else {
            Candidates::Owned(out)
        }
    }
}
