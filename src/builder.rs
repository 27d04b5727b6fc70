// src/builder.rs

use std::io::BufRead;

use crate::error::TreeError;
use crate::rank::RankCode;
use crate::record::parse_report_line;
use crate::tree::{NodeId, TaxonTree};
use crate::types::ReportRecord;

/// Per-source outcome of a depth-cursor build pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceStats {
    /// Data records applied (tree nodes + unclassified rows).
    pub data_records: usize,
    /// Non-comment lines that failed to parse as data records.
    pub skipped: u64,
}

/// Fold one indentation-ordered report stream into the tree as sample
/// `sample`.
///
/// The source is parsed and depth-validated in full before any mutation,
/// so a structurally broken report (depth jumping by more than one level,
/// or a non-root record before the root) returns an error without
/// touching the tree: a source is either applied completely or not at
/// all. Header, comment and blank lines are ignored; other unparseable
/// lines are skipped and counted.
pub fn add_report_source<R: BufRead>(
    tree: &mut TaxonTree,
    sample: usize,
    reader: R,
) -> Result<SourceStats, TreeError> {
    assert!(sample < tree.num_samples(), "sample index out of range");

    let (records, stats) = stage_source(tree, reader)?;
    apply_records(tree, sample, &records);
    tree.skipped_lines += stats.skipped;

    log::info!(
        "sample {}: {} data records, {} skipped lines",
        sample,
        stats.data_records,
        stats.skipped
    );
    Ok(stats)
}

fn is_unclassified(rec: &ReportRecord) -> bool {
    rec.taxid == 0 || RankCode::from_raw(&rec.raw_rank) == Some(RankCode::Unclassified)
}

fn is_root(rec: &ReportRecord) -> bool {
    rec.taxid == 1 || rec.depth == 0
}

/// Parse every line and check that the depth sequence describes a single
/// well-formed pre-order tree. No tree mutation happens here.
fn stage_source<R: BufRead>(
    tree: &TaxonTree,
    reader: R,
) -> Result<(Vec<ReportRecord>, SourceStats), TreeError> {
    let mut records = Vec::new();
    let mut stats = SourceStats::default();

    // Simulated cursor: number of nodes on the current root-to-cursor
    // path. The real walk in apply_records can then never underflow.
    let mut path_len: usize = if tree.root().is_some() { 1 } else { 0 };
    let mut root_taxid: Option<u32> = tree.root().map(|r| tree.node(r).taxid);

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some(rec) = parse_report_line(&line) else {
            stats.skipped += 1;
            continue;
        };

        if is_unclassified(&rec) {
            // tracked outside the tree, no cursor movement
        } else if is_root(&rec) {
            match root_taxid {
                None => root_taxid = Some(rec.taxid),
                Some(t) if t != rec.taxid => {
                    // root lines must all name the one root taxon; a
                    // depth-0 line for any other node cannot attach
                    return Err(TreeError::DepthJump {
                        line: lineno,
                        taxid: rec.taxid,
                        depth: rec.depth,
                        cursor_depth: path_len.saturating_sub(1),
                    });
                }
                Some(_) => {}
            }
            path_len = 1;
        } else if root_taxid.is_none() {
            return Err(TreeError::MissingRoot {
                line: lineno,
                taxid: rec.taxid,
                depth: rec.depth,
            });
        } else if rec.depth > path_len {
            return Err(TreeError::DepthJump {
                line: lineno,
                taxid: rec.taxid,
                depth: rec.depth,
                cursor_depth: path_len - 1,
            });
        } else {
            path_len = rec.depth + 1;
        }

        stats.data_records += 1;
        records.push(rec);
    }

    Ok((records, stats))
}

/// Apply staged, pre-validated records. Cannot fail.
fn apply_records(tree: &mut TaxonTree, sample: usize, records: &[ReportRecord]) {
    // Root-to-cursor path in this source's own depth coordinates;
    // truncating to the record's depth is the upward cursor walk. A
    // later source may omit its root line, so start from the shared one.
    let mut path: Vec<NodeId> = tree.root().into_iter().collect();

    for rec in records {
        tree.total_reads[sample] += rec.self_reads;

        if is_unclassified(rec) {
            tree.unclassified[sample] += rec.self_reads;
            continue;
        }

        if is_root(rec) {
            let root = match tree.lookup(rec.taxid) {
                Some(id) => id,
                None => tree.add_node(rec.taxid, rec.name.clone(), RankCode::Root, 0, None),
            };
            tree.add_reads(root, sample, rec.clade_reads, rec.self_reads);
            path.clear();
            path.push(root);
            continue;
        }

        path.truncate(rec.depth);
        let parent = *path.last().expect("validated: parent on path");

        // Same taxid seen before (earlier sample or repeated stream):
        // fold into the existing node, never duplicate it.
        if let Some(id) = tree.lookup(rec.taxid) {
            tree.add_reads(id, sample, rec.clade_reads, rec.self_reads);
            path.push(id);
            continue;
        }

        let rank = match RankCode::from_raw(&rec.raw_rank) {
            Some(rank) => rank,
            None => RankCode::minor_under(tree.node(parent).rank),
        };
        let id = tree.add_node(rec.taxid, rec.name.clone(), rank, rec.depth, Some(parent));
        tree.add_reads(id, sample, rec.clade_reads, rec.self_reads);
        path.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const REPORT: &str = "\
  6.76\t50\t50\tU\t0\tunclassified\n\
 93.24\t690\t10\tR\t1\troot\n\
 91.89\t680\t0\tD\t2\t  Bacteria\n\
 44.59\t330\t30\tP\t1224\t    Proteobacteria\n\
 40.54\t300\t300\tG\t561\t      Escherichia\n\
 47.30\t350\t350\tP\t1239\t    Firmicutes\n";

    fn build(text: &str) -> TaxonTree {
        let mut tree = TaxonTree::new(1);
        add_report_source(&mut tree, 0, Cursor::new(text)).unwrap();
        tree
    }

    #[test]
    fn builds_expected_shape() {
        let tree = build(REPORT);
        assert_eq!(tree.len(), 5);
        let root = tree.root().unwrap();
        assert_eq!(tree.node(root).taxid, 1);
        let bacteria = tree.lookup(2).unwrap();
        let proteo = tree.lookup(1224).unwrap();
        let firmi = tree.lookup(1239).unwrap();
        let esch = tree.lookup(561).unwrap();
        assert_eq!(tree.node(bacteria).parent, Some(root));
        assert_eq!(tree.node(proteo).parent, Some(bacteria));
        assert_eq!(tree.node(firmi).parent, Some(bacteria));
        assert_eq!(tree.node(esch).parent, Some(proteo));
        assert_eq!(tree.node(esch).counts[0].self_reads, 300);
        assert_eq!(tree.node(esch).counts[0].clade_reads, 300);
    }

    #[test]
    fn depth_round_trips_through_parent_links() {
        let tree = build(REPORT);
        for id in tree.preorder() {
            assert_eq!(tree.depth_by_parent_links(id), tree.node(id).depth);
        }
    }

    #[test]
    fn unclassified_never_becomes_a_node() {
        let tree = build(REPORT);
        assert!(tree.lookup(0).is_none());
        assert_eq!(tree.unclassified[0], 50);
        assert_eq!(tree.total_reads[0], 50 + 10 + 30 + 300 + 350);
        // 6 data records, 1 unclassified, 5 nodes
        assert_eq!(tree.len(), 6 - 1);
    }

    #[test]
    fn malformed_lines_are_skipped_and_counted() {
        let text = format!("not a record line\n{REPORT}0.0\tNaN\t0\tG\t999\t  broken\n");
        let mut tree = TaxonTree::new(1);
        let stats = add_report_source(&mut tree, 0, Cursor::new(text.as_str())).unwrap();
        assert_eq!(stats.skipped, 2);
        assert_eq!(tree.skipped_lines, 2);
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn header_and_comment_lines_are_not_counted_as_skipped() {
        let text = format!("#Number of Samples: 1\n\n%\treads\ttaxReads\trank\ttaxID\ttaxName\n{REPORT}");
        let mut tree = TaxonTree::new(1);
        let stats = add_report_source(&mut tree, 0, Cursor::new(text.as_str())).unwrap();
        // the % header is not a comment, so it counts as skipped
        assert_eq!(stats.skipped, 1);
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn depth_jump_is_fatal_and_rolls_back() {
        let text = "\
 95.00\t950\t10\tR\t1\troot\n\
 90.00\t900\t0\tD\t2\t  Bacteria\n\
 55.00\t550\t30\tG\t561\t      Escherichia\n";
        let mut tree = TaxonTree::new(1);
        let err = add_report_source(&mut tree, 0, Cursor::new(text)).unwrap_err();
        assert!(matches!(err, TreeError::DepthJump { depth: 3, .. }));
        // nothing applied
        assert!(tree.is_empty());
        assert_eq!(tree.total_reads[0], 0);
    }

    #[test]
    fn record_before_root_is_fatal() {
        let text = " 90.00\t900\t0\tD\t2\t  Bacteria\n";
        let mut tree = TaxonTree::new(1);
        let err = add_report_source(&mut tree, 0, Cursor::new(text)).unwrap_err();
        assert!(matches!(err, TreeError::MissingRoot { taxid: 2, .. }));
    }

    #[test]
    fn repeated_root_lines_fold_into_one_root() {
        let text = "\
 95.00\t950\t10\tR\t1\troot\n\
 90.00\t900\t0\tD\t2\t  Bacteria\n\
  5.00\t40\t5\tR\t1\troot\n\
 90.00\t900\t0\tP\t1224\t  Proteobacteria\n";
        let tree = build(text);
        let root = tree.root().unwrap();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.node(root).counts[0].self_reads, 15);
        // the second root line reset the cursor to the root
        let proteo = tree.lookup(1224).unwrap();
        assert_eq!(tree.node(proteo).parent, Some(root));
    }

    #[test]
    fn depth_zero_line_for_a_non_root_node_is_rejected() {
        let mut tree = TaxonTree::new(2);
        add_report_source(&mut tree, 0, Cursor::new(REPORT)).unwrap();
        // second sample claims an existing deep taxon at depth 0; if it
        // were accepted the next depth-1 record would attach under a
        // depth-2 parent
        let second = "\
 44.59\t330\t30\tP\t1224\tProteobacteria\n\
 91.89\t680\t0\tD\t2\t  Bacteria\n";
        let err = add_report_source(&mut tree, 1, Cursor::new(second)).unwrap_err();
        assert!(matches!(err, TreeError::DepthJump { taxid: 1224, depth: 0, .. }));
        // second sample rolled back entirely
        assert_eq!(tree.total_reads, vec![740, 0]);
        let proteo = tree.lookup(1224).unwrap();
        assert_eq!(tree.node(proteo).counts[1].self_reads, 0);
    }

    #[test]
    fn minor_ranks_synthesize_along_the_chain() {
        let text = "\
 95.00\t950\t10\tR\t1\troot\n\
 90.00\t900\t0\t-\t131567\t  cellular organisms\n\
 90.00\t890\t0\tD\t2\t    Bacteria\n\
 50.00\t500\t0\tG\t561\t      Escherichia\n\
 40.00\t400\t0\t-\t1000001\t        environmental group\n\
 35.00\t350\t350\t-\t1000002\t          subgroup A\n";
        let tree = build(text);
        assert_eq!(tree.node(tree.lookup(131567).unwrap()).rank, RankCode::Minor('R', 1));
        assert_eq!(tree.node(tree.lookup(1000001).unwrap()).rank, RankCode::Minor('G', 1));
        assert_eq!(tree.node(tree.lookup(1000002).unwrap()).rank, RankCode::Minor('G', 2));
    }

    #[test]
    fn species_chain_starts_its_own_minor_numbering() {
        let text = "\
 95.00\t950\t10\tR\t1\troot\n\
 50.00\t500\t0\tG\t561\t  Escherichia\n\
 45.00\t450\t0\tS\t562\t    Escherichia coli\n\
 40.00\t400\t400\t-\t100010\t      E. coli K-12\n\
 35.00\t350\t350\t-\t100011\t        E. coli K-12 MG1655\n";
        let tree = build(text);
        assert_eq!(tree.node(tree.lookup(100010).unwrap()).rank, RankCode::Minor('S', 1));
        assert_eq!(tree.node(tree.lookup(100011).unwrap()).rank, RankCode::Minor('S', 2));
    }
}
