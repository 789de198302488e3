//! Ordering of the affected part of the animated graph.

use crate::error::AnimatedError;
use crate::node::{AnimatedNode, Graph};
use hashbrown::{HashMap, HashSet};
use rnhost_api_core::Tag;
use std::collections::VecDeque;

/// Nodes to evaluate for one update cycle, in dependency order.
#[derive(Debug, Default)]
pub struct EvalPlan {
    pub order: Vec<Tag>,
    /// Planned parents of each planned node.
    pub parents: HashMap<Tag, Vec<Tag>>,
    /// Dangling edges met while walking, plus a cycle error if ordering stalled.
    pub errors: Vec<AnimatedError>,
}

/// Plan evaluation of every node reachable from `changed` that also feeds an
/// attachment point (as decided by `is_attachment`). Everything else is left alone.
///
/// Ordering is Kahn's algorithm restricted to the planned subgraph, seeded in
/// discovery order so the result is deterministic for a given `changed` order.
pub fn plan_updates<F>(graph: &Graph, changed: impl IntoIterator<Item = Tag>, is_attachment: F) -> EvalPlan
where
    F: Fn(Tag, &AnimatedNode) -> bool,
{
    let mut errors = Vec::new();

    // 1) Forward reachability along children edges.
    let mut visited: HashSet<Tag> = HashSet::new();
    let mut reachable: Vec<Tag> = Vec::new();
    let mut edges: Vec<(Tag, Tag)> = Vec::new();
    let mut queue: VecDeque<Tag> = VecDeque::new();
    for tag in changed {
        if graph.contains(tag) && visited.insert(tag) {
            queue.push_back(tag);
        }
    }
    while let Some(tag) = queue.pop_front() {
        reachable.push(tag);
        if let Ok(entry) = graph.get(tag) {
            for &child in &entry.children {
                if !graph.contains(child) {
                    errors.push(AnimatedError::DanglingReference {
                        from: tag,
                        tag: child,
                    });
                    continue;
                }
                edges.push((tag, child));
                if visited.insert(child) {
                    queue.push_back(child);
                }
            }
        }
    }

    // 2) Keep only nodes that reach an attachment point.
    let mut parents: HashMap<Tag, Vec<Tag>> = HashMap::new();
    for &(parent, child) in &edges {
        parents.entry(child).or_default().push(parent);
    }
    let mut pending: Vec<Tag> = reachable
        .iter()
        .copied()
        .filter(|t| {
            graph
                .get(*t)
                .map(|entry| is_attachment(*t, &entry.node))
                .unwrap_or(false)
        })
        .collect();
    let mut planned: HashSet<Tag> = pending.iter().copied().collect();
    while let Some(tag) = pending.pop() {
        if let Some(ps) = parents.get(&tag) {
            for &p in ps {
                if planned.insert(p) {
                    pending.push(p);
                }
            }
        }
    }

    // 3) Topological order within the planned set.
    let mut indeg: HashMap<Tag, usize> = planned.iter().map(|t| (*t, 0)).collect();
    for &(parent, child) in &edges {
        if planned.contains(&parent) {
            if let Some(d) = indeg.get_mut(&child) {
                *d += 1;
            }
        }
    }
    let mut q: VecDeque<Tag> = reachable
        .iter()
        .copied()
        .filter(|t| indeg.get(t) == Some(&0))
        .collect();
    let mut order = Vec::with_capacity(planned.len());
    while let Some(u) = q.pop_front() {
        order.push(u);
        if let Ok(entry) = graph.get(u) {
            for child in &entry.children {
                if let Some(d) = indeg.get_mut(child) {
                    *d -= 1;
                    if *d == 0 {
                        q.push_back(*child);
                    }
                }
            }
        }
    }
    if order.len() != planned.len() {
        errors.push(AnimatedError::CyclicGraph {
            count: planned.len() - order.len(),
        });
    }

    parents.retain(|child, ps| {
        ps.retain(|p| planned.contains(p));
        planned.contains(child)
    });

    EvalPlan {
        order,
        parents,
        errors,
    }
}

/// Whether adding the edge `parent -> child` would close a cycle.
pub fn would_create_cycle(graph: &Graph, parent: Tag, child: Tag) -> bool {
    if parent == child {
        return true;
    }
    let mut seen: HashSet<Tag> = HashSet::new();
    let mut stack = vec![child];
    while let Some(tag) = stack.pop() {
        if tag == parent {
            return true;
        }
        if !seen.insert(tag) {
            continue;
        }
        if let Ok(entry) = graph.get(tag) {
            stack.extend(entry.children.iter().copied());
        }
    }
    false
}
