// src/rollup.rs

use crate::tree::{NodeId, TaxonTree};

/// Recompute every node's clade totals from its self counts, bottom-up:
/// `clade[s] = self[s] + sum(child.clade[s])` for every sample index.
///
/// Children appear after their parent in pre-order, so walking the
/// pre-order sequence backwards visits every child before its parent; no
/// recursion, so arbitrarily deep taxonomies are fine. Any clade values
/// carried in from the input files are overwritten, which makes the tree
/// consistent even when a source's own totals were not.
pub fn rollup(tree: &mut TaxonTree) {
    let order: Vec<NodeId> = tree.preorder().collect();
    for &id in order.iter().rev() {
        let children = tree.node(id).children.clone();
        for s in 0..tree.num_samples() {
            let mut clade = tree.node(id).counts[s].self_reads;
            for &child in &children {
                clade += tree.node(child).counts[s].clade_reads;
            }
            tree.node_mut(id).counts[s].clade_reads = clade;
        }
    }
}

/// Check the rollup invariant for every node and sample index.
pub fn verify_rollup(tree: &TaxonTree) -> bool {
    tree.preorder().all(|id| {
        let node = tree.node(id);
        (0..tree.num_samples()).all(|s| {
            let child_sum: u64 = node
                .children
                .iter()
                .map(|&c| tree.node(c).counts[s].clade_reads)
                .sum();
            node.counts[s].clade_reads == node.counts[s].self_reads + child_sum
                && node.counts[s].clade_reads >= node.counts[s].self_reads
        })
    })
}
