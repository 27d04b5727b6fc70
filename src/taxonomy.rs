// src/taxonomy.rs

use std::io::BufRead;

use ahash::AHashMap;

use crate::error::TreeError;
use crate::rank::RankCode;
use crate::record::{parse_classified_line, parse_taxonomy_line};
use crate::tree::{NodeId, TaxonTree};

/// Build a single-sample tree from an unordered flat taxonomy stream
/// (`taxid\tparent\tname\trank` lines, in any order).
///
/// Two passes: the first creates every node with its parent deferred
/// (forward references are expected), the second links children to
/// parents. A parent id that never resolves is a data-integrity warning,
/// not a fatal error; the orphan is attached to the root so its counts
/// still roll up somewhere. Malformed lines are skipped and counted.
pub fn build_taxonomy_tree<R: BufRead>(reader: R) -> Result<TaxonTree, TreeError> {
    let mut tree = TaxonTree::new(1);
    let mut parent_of: Vec<(NodeId, u32)> = Vec::new();
    let mut raw_ranks: AHashMap<u32, String> = AHashMap::new();

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some(rec) = parse_taxonomy_line(&line) else {
            tree.skipped_lines += 1;
            continue;
        };
        if tree.lookup(rec.taxid).is_some() {
            log::warn!("taxonomy: duplicate taxid {} ignored", rec.taxid);
            continue;
        }

        // Rank placeholders are resolved top-down once the tree is linked.
        raw_ranks.insert(rec.taxid, rec.raw_rank.clone());
        let is_root = rec.taxid == 1 || rec.parent_taxid == rec.taxid;
        // ranks are provisional until resolve_ranks runs top-down
        let id = tree.add_detached(rec.taxid, rec.name, RankCode::Root, 0);
        if is_root {
            if tree.root().is_none() {
                tree.set_root(id);
            } else {
                log::warn!("taxonomy: extra root candidate taxid {} kept as child of root", rec.taxid);
                parent_of.push((id, 1));
            }
        } else {
            parent_of.push((id, rec.parent_taxid));
        }
    }

    let Some(root) = tree.root() else {
        return Err(TreeError::EmptySource {
            path: "taxonomy".to_string(),
        });
    };

    for (id, parent_taxid) in parent_of {
        match tree.lookup(parent_taxid) {
            Some(parent) => tree.link(id, parent),
            None => {
                log::warn!(
                    "taxonomy: taxid {} references unknown parent {}; attaching to root",
                    tree.node(id).taxid,
                    parent_taxid
                );
                tree.link(id, root);
            }
        }
    }

    tree.recompute_depths();
    resolve_ranks(&mut tree, &raw_ranks);
    Ok(tree)
}

/// Assign rank codes top-down: table-resolved where possible, otherwise
/// the minor-rank synthesis from the parent's (already assigned) code.
fn resolve_ranks(tree: &mut TaxonTree, raw_ranks: &AHashMap<u32, String>) {
    let order: Vec<NodeId> = tree.preorder().collect();
    for id in order {
        let node = tree.node(id);
        if node.parent.is_none() {
            tree.node_mut(id).rank = RankCode::Root;
            continue;
        }
        let resolved = raw_ranks
            .get(&node.taxid)
            .and_then(|raw| RankCode::from_raw(raw));
        let rank = match resolved {
            Some(rank) => rank,
            None => {
                let parent = node.parent.expect("non-root has parent");
                RankCode::minor_under(tree.node(parent).rank)
            }
        };
        tree.node_mut(id).rank = rank;
    }
}

/// Tally classifier output lines (`C/U \t readID \t taxid \t length`)
/// into per-taxid counts plus the total number of reads seen. With
/// `use_read_len` the tally is summed read lengths instead of read
/// counts. Unclassified reads land under taxid 0.
pub fn count_classified<R: BufRead>(
    reader: R,
    use_read_len: bool,
) -> Result<(AHashMap<u32, u64>, u64), TreeError> {
    let mut counts: AHashMap<u32, u64> = AHashMap::new();
    let mut reads = 0u64;
    for line in reader.lines() {
        let line = line?;
        let Some(parsed) = parse_classified_line(&line) else {
            continue;
        };
        reads += 1;
        let amount = if use_read_len { parsed.length } else { 1 };
        let taxid = if parsed.classified { parsed.taxid } else { 0 };
        *counts.entry(taxid).or_insert(0) += amount;
    }
    Ok((counts, reads))
}

/// Apply leaf-level counts to a single-sample tree, propagating each
/// count up the parent chain as it is discovered. This is the
/// incremental formulation of the clade rollup: after all counts are
/// applied the tree satisfies the same invariant `rollup` establishes.
///
/// Counts under taxid 0 go to the unclassified scalar. Counts for
/// taxids absent from the tree are returned so the caller can decide
/// whether that is an error.
pub fn apply_leaf_counts(tree: &mut TaxonTree, counts: &AHashMap<u32, u64>) -> Vec<u32> {
    let mut missing = Vec::new();
    for (&taxid, &count) in counts {
        tree.total_reads[0] += count;
        if taxid == 0 {
            tree.unclassified[0] += count;
            continue;
        }
        let Some(id) = tree.lookup(taxid) else {
            log::warn!("count for taxid {taxid} has no node in the taxonomy");
            missing.push(taxid);
            continue;
        };
        tree.add_reads(id, 0, count, count);
        let mut cur = tree.node(id).parent;
        while let Some(p) = cur {
            tree.add_reads(p, 0, count, 0);
            cur = tree.node(p).parent;
        }
    }
    missing.sort_unstable();
    missing
}

/// Condense a taxonomy to the nodes lying on some leaf-to-root path for
/// the given leaf set, preserving pre-order, counts and ranks. Returns
/// the condensed tree plus the leaf taxids that matched nothing.
pub fn condense_to(tree: &TaxonTree, leaf_taxids: &[u32]) -> (TaxonTree, Vec<u32>) {
    let mut keep: Vec<bool> = Vec::new();
    let order: Vec<NodeId> = tree.preorder().collect();
    let mut position: AHashMap<u32, usize> = AHashMap::new();
    for (i, &id) in order.iter().enumerate() {
        position.insert(tree.node(id).taxid, i);
        keep.push(false);
    }

    let mut missing = Vec::new();
    for &taxid in leaf_taxids {
        let Some(id) = tree.lookup(taxid) else {
            missing.push(taxid);
            continue;
        };
        let mut cur = Some(id);
        while let Some(c) = cur {
            let pos = position[&tree.node(c).taxid];
            if keep[pos] {
                break; // ancestors above are already marked
            }
            keep[pos] = true;
            cur = tree.node(c).parent;
        }
    }

    let mut out = TaxonTree::new(tree.num_samples());
    let mut mapped: AHashMap<u32, NodeId> = AHashMap::new();
    for (i, &id) in order.iter().enumerate() {
        if !keep[i] {
            continue;
        }
        let node = tree.node(id);
        let parent = node.parent.map(|p| mapped[&tree.node(p).taxid]);
        let new_id = out.add_node(node.taxid, node.name.clone(), node.rank, node.depth, parent);
        for (s, c) in node.counts.iter().enumerate() {
            out.add_reads(new_id, s, c.clade_reads, c.self_reads);
        }
        mapped.insert(node.taxid, new_id);
    }
    out.recompute_depths();
    out.unclassified.clone_from(&tree.unclassified);
    out.total_reads.clone_from(&tree.total_reads);

    missing.sort_unstable();
    (out, missing)
}
