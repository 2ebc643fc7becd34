//! Longest-simple-cycle detection over one key's adjacency.
//!
//! Two algorithms, chosen by graph shape:
//!
//! - [`longest_cycle_functional`] for functional graphs (max out-degree ≤ 1).
//!   Every node has at most one successor, so the graph is a set of
//!   "rho"-shaped walks: each walk either dies at a node without a
//!   successor, merges into territory an earlier walk already covered, or
//!   closes a cycle. Every node enters and leaves the bookkeeping at most
//!   once, O(|V|) overall.
//!
//! - [`longest_cycle_dfs`] for everything else. A backtracking DFS with the
//!   canonical minimum-start rule: nodes are totally ordered by raw bytes,
//!   and the DFS rooted at index `s` never steps to a node with index < `s`
//!   (other than closing back to `s` itself). Each simple cycle is therefore
//!   explored exactly once, from its lexicographically smallest node.
//!
//! Both report only the longest length; cycle membership is never
//! materialized. Self-loops count as cycles of length 1.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::graph::Adjacency;

/// Finds the length of the longest simple cycle, dispatching on graph shape.
///
/// `max_out_degree` is the largest number of unique successors of any node
/// (as tracked by the builder); `<= 1` selects the linear walk.
/// Returns 0 when the graph is acyclic or empty.
pub fn longest_cycle(adj: &Adjacency, max_out_degree: usize) -> usize {
    if adj.is_empty() {
        return 0;
    }
    if max_out_degree <= 1 {
        longest_cycle_functional(adj)
    } else {
        longest_cycle_dfs(adj)
    }
}

// ---------------------------------------------------------------------------
// Functional-graph walk
// ---------------------------------------------------------------------------

/// O(|V|) longest-cycle search for functional graphs (out-degree ≤ 1).
///
/// Walks forward from every node not yet covered by an earlier walk,
/// recording each node's step index within the current walk. Re-reaching a
/// node of the current walk at step `k` that was first seen at step `p`
/// closes a cycle of length `k - p`.
pub fn longest_cycle_functional(adj: &Adjacency) -> usize {
    // Collapse the singleton adjacency sets into a successor map. Nodes
    // without an outgoing edge are simply absent.
    let mut next_node: FxHashMap<&[u8], &[u8]> = FxHashMap::default();
    for (source, targets) in adj {
        if let Some(target) = targets.iter().next() {
            next_node.insert(source.as_ref(), target.as_ref());
        }
    }
    if next_node.is_empty() {
        return 0;
    }

    // Destination-only nodes can sit on a cycle's walk-in path, so every
    // endpoint is a candidate start.
    let mut all_nodes: FxHashSet<&[u8]> = next_node.keys().copied().collect();
    all_nodes.extend(next_node.values().copied());

    let mut visited: FxHashSet<&[u8]> = FxHashSet::default();
    let mut longest = 0;

    for &start in &all_nodes {
        if visited.contains(start) {
            continue;
        }

        let mut position: FxHashMap<&[u8], usize> = FxHashMap::default();
        let mut current = start;
        let mut step = 0usize;

        loop {
            if visited.contains(current) {
                // Merged into an earlier walk; any cycle there was already
                // measured.
                break;
            }
            if let Some(&first_seen) = position.get(current) {
                let cycle_len = step - first_seen;
                if cycle_len > longest {
                    longest = cycle_len;
                }
                break;
            }
            position.insert(current, step);
            step += 1;
            match next_node.get(current) {
                Some(&next) => current = next,
                None => break,
            }
        }

        visited.extend(position.keys().copied());
    }

    longest
}

// ---------------------------------------------------------------------------
// Canonical DFS
// ---------------------------------------------------------------------------

/// Longest-cycle search for general directed graphs.
///
/// Backtracking DFS under the canonical minimum-start rule (see the module
/// docs). Worst case is exponential in pathological dense graphs; bucket
/// granularity keeps per-key graphs small in practice.
pub fn longest_cycle_dfs(adj: &Adjacency) -> usize {
    let mut longest = 0;
    scan_cycles(adj, |cycle_len| {
        if cycle_len > longest {
            longest = cycle_len;
        }
    });
    longest
}

/// Runs the canonical DFS, invoking `on_cycle` once per simple cycle with
/// that cycle's length.
fn scan_cycles(adj: &Adjacency, mut on_cycle: impl FnMut(usize)) {
    // Only nodes with outgoing edges can lie on a cycle; order them by raw
    // bytes to fix the canonical start of every cycle.
    let mut nodes: Vec<&[u8]> = adj.keys().map(|node| node.as_ref()).collect();
    nodes.sort_unstable();
    let index_of: FxHashMap<&[u8], usize> = nodes
        .iter()
        .enumerate()
        .map(|(index, &node)| (node, index))
        .collect();

    for (start_index, &start) in nodes.iter().enumerate() {
        // Iterative DFS. Each frame holds a node's successor list and a
        // cursor into it; the frame's depth is its stack position, so a
        // child equal to `start` closes a cycle of length depth + 1 =
        // stack.len().
        let mut stack: Vec<(Vec<&[u8]>, usize)> = vec![(successors(adj, start), 0)];
        let mut path: Vec<&[u8]> = vec![start];
        let mut on_path: FxHashSet<&[u8]> = FxHashSet::default();
        on_path.insert(start);

        while let Some((children, cursor)) = stack.last_mut() {
            if *cursor >= children.len() {
                // Frame exhausted: backtrack.
                stack.pop();
                if let Some(node) = path.pop() {
                    on_path.remove(node);
                }
                continue;
            }

            let child = children[*cursor];
            *cursor += 1;

            if child == start {
                on_cycle(stack.len());
                continue;
            }
            if on_path.contains(child) {
                continue;
            }
            match index_of.get(child) {
                // The canonical rule: never descend below the start index.
                Some(&child_index) if child_index > start_index => {
                    on_path.insert(child);
                    path.push(child);
                    stack.push((successors(adj, child), 0));
                }
                _ => {}
            }
        }
    }
}

/// Materializes a node's successor list for one DFS frame.
fn successors<'a>(adj: &'a Adjacency, node: &[u8]) -> Vec<&'a [u8]> {
    adj.get(node)
        .map(|targets| targets.iter().map(|t| t.as_ref()).collect())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use std::collections::BTreeSet;

    use super::*;
    use crate::graph::Node;

    /// Builds an adjacency from edge pairs.
    fn adj(edges: &[(&[u8], &[u8])]) -> Adjacency {
        let mut adjacency = Adjacency::default();
        for &(source, target) in edges {
            adjacency
                .entry(Node::from(source))
                .or_default()
                .insert(Node::from(target));
        }
        adjacency
    }

    fn max_degree(adjacency: &Adjacency) -> usize {
        adjacency
            .values()
            .map(|targets| targets.len())
            .max()
            .unwrap_or(0)
    }

    /// Independent brute force: enumerates every simple cycle by extending
    /// simple paths from every node, deduplicating by rotation-normalized
    /// node sequence. Only usable on tiny graphs.
    fn brute_force_cycles(adjacency: &Adjacency) -> BTreeSet<Vec<Vec<u8>>> {
        fn extend(
            adjacency: &Adjacency,
            path: &mut Vec<Vec<u8>>,
            found: &mut BTreeSet<Vec<Vec<u8>>>,
        ) {
            let last = path.last().expect("path is never empty").clone();
            let Some(targets) = adjacency.get(last.as_slice()) else {
                return;
            };
            for target in targets {
                let target = target.to_vec();
                if target == path[0] {
                    // Normalize the rotation so each cycle counts once.
                    let min_pos = path
                        .iter()
                        .enumerate()
                        .min_by(|a, b| a.1.cmp(b.1))
                        .map(|(pos, _)| pos)
                        .expect("path is never empty");
                    let mut normalized = path[min_pos..].to_vec();
                    normalized.extend_from_slice(&path[..min_pos]);
                    found.insert(normalized);
                } else if !path.contains(&target) {
                    path.push(target);
                    extend(adjacency, path, found);
                    path.pop();
                }
            }
        }

        let mut found = BTreeSet::new();
        for source in adjacency.keys() {
            let mut path = vec![source.to_vec()];
            extend(adjacency, &mut path, &mut found);
        }
        found
    }

    // ── dispatch ─────────────────────────────────────────────────────────────

    #[test]
    fn empty_graph_has_no_cycle() {
        assert_eq!(longest_cycle(&Adjacency::default(), 0), 0);
    }

    // ── functional walk ──────────────────────────────────────────────────────

    #[test]
    fn functional_triangle() {
        let g = adj(&[(b"A", b"B"), (b"B", b"C"), (b"C", b"A")]);
        assert_eq!(longest_cycle_functional(&g), 3);
    }

    #[test]
    fn functional_self_loop_is_length_one() {
        let g = adj(&[(b"A", b"A")]);
        assert_eq!(longest_cycle_functional(&g), 1);
    }

    #[test]
    fn functional_chain_is_acyclic() {
        let g = adj(&[(b"A", b"B"), (b"B", b"C")]);
        assert_eq!(longest_cycle_functional(&g), 0);
    }

    #[test]
    fn functional_rho_shape_measures_only_the_loop() {
        // T1 → T2 → A → B → C → A: the tail must not count.
        let g = adj(&[
            (b"T1", b"T2"),
            (b"T2", b"A"),
            (b"A", b"B"),
            (b"B", b"C"),
            (b"C", b"A"),
        ]);
        assert_eq!(longest_cycle_functional(&g), 3);
    }

    #[test]
    fn functional_two_components_takes_the_longer() {
        let g = adj(&[
            (b"A", b"B"),
            (b"B", b"A"),
            (b"X", b"Y"),
            (b"Y", b"Z"),
            (b"Z", b"W"),
            (b"W", b"X"),
        ]);
        assert_eq!(longest_cycle_functional(&g), 4);
    }

    #[test]
    fn functional_walk_is_immune_to_start_order() {
        // Whatever node the hash map yields first, the merge-into-visited
        // rule keeps the measurement correct.
        let g = adj(&[(b"C", b"A"), (b"A", b"B"), (b"B", b"C"), (b"D", b"A")]);
        assert_eq!(longest_cycle_functional(&g), 3);
    }

    // ── canonical DFS ────────────────────────────────────────────────────────

    #[test]
    fn dfs_triangle() {
        let g = adj(&[(b"A", b"B"), (b"B", b"C"), (b"C", b"A")]);
        assert_eq!(longest_cycle_dfs(&g), 3);
    }

    #[test]
    fn dfs_self_loop_is_length_one() {
        let g = adj(&[(b"A", b"A"), (b"A", b"B")]);
        assert_eq!(longest_cycle_dfs(&g), 1);
    }

    #[test]
    fn dfs_overlapping_cycles_takes_the_longest() {
        // A→B→A and A→B→C→A share two nodes; the longest is 3.
        let g = adj(&[(b"A", b"B"), (b"B", b"A"), (b"B", b"C"), (b"C", b"A")]);
        assert_eq!(longest_cycle_dfs(&g), 3);
    }

    #[test]
    fn dfs_dense_clique() {
        // Complete digraph on 4 nodes: the longest simple cycle is a
        // Hamiltonian tour.
        let names: Vec<&[u8]> = vec![b"a", b"b", b"c", b"d"];
        let mut edges = Vec::new();
        for &u in &names {
            for &v in &names {
                if u != v {
                    edges.push((u, v));
                }
            }
        }
        let g = adj(&edges);
        assert_eq!(longest_cycle_dfs(&g), 4);
    }

    #[test]
    fn dfs_acyclic_branching() {
        let g = adj(&[(b"A", b"B"), (b"A", b"C"), (b"B", b"D"), (b"C", b"D")]);
        assert_eq!(longest_cycle_dfs(&g), 0);
    }

    #[test]
    fn dfs_counts_each_cycle_exactly_once() {
        // Two overlapping cycles plus a self-loop. The number of "found"
        // events must equal the number of distinct simple cycles as counted
        // by an independent enumerator.
        let g = adj(&[
            (b"A", b"B"),
            (b"B", b"A"),
            (b"B", b"C"),
            (b"C", b"A"),
            (b"C", b"C"),
        ]);
        let expected = brute_force_cycles(&g);

        let mut events = 0usize;
        let mut lengths: Vec<usize> = Vec::new();
        scan_cycles(&g, |len| {
            events += 1;
            lengths.push(len);
        });

        assert_eq!(events, expected.len(), "one event per simple cycle");
        lengths.sort_unstable();
        let mut expected_lengths: Vec<usize> = expected.iter().map(Vec::len).collect();
        expected_lengths.sort_unstable();
        assert_eq!(lengths, expected_lengths);
    }

    #[test]
    fn dfs_agrees_with_brute_force_on_small_graphs() {
        let cases: Vec<Adjacency> = vec![
            adj(&[(b"A", b"B"), (b"B", b"C"), (b"C", b"A"), (b"B", b"A")]),
            adj(&[
                (b"1", b"2"),
                (b"2", b"3"),
                (b"3", b"1"),
                (b"3", b"4"),
                (b"4", b"2"),
            ]),
            adj(&[(b"x", b"x"), (b"x", b"y"), (b"y", b"x")]),
            adj(&[(b"p", b"q")]),
        ];
        for g in &cases {
            let expected = brute_force_cycles(g)
                .iter()
                .map(Vec::len)
                .max()
                .unwrap_or(0);
            assert_eq!(longest_cycle_dfs(g), expected);
        }
    }

    // ── dispatch agreement ───────────────────────────────────────────────────

    #[test]
    fn finders_agree_on_functional_graphs() {
        // On out-degree ≤ 1 graphs the walk and the DFS are
        // interchangeable.
        let cases: Vec<Adjacency> = vec![
            adj(&[(b"A", b"B"), (b"B", b"C"), (b"C", b"A")]),
            adj(&[(b"A", b"A")]),
            adj(&[(b"A", b"B"), (b"B", b"C")]),
            adj(&[(b"T", b"A"), (b"A", b"B"), (b"B", b"A")]),
        ];
        for g in &cases {
            assert!(max_degree(g) <= 1);
            assert_eq!(longest_cycle_functional(g), longest_cycle_dfs(g));
        }
    }
}
