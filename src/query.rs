// src/query.rs

use ahash::AHashSet;

use crate::tree::{NodeId, TaxonTree};

/// Result of an ancestor/descendant closure query. Membership is all
/// that matters, so the ids come back as a set; query taxids with no
/// node in the tree are listed in `missing` and it is the caller's
/// policy whether that is an error.
#[derive(Debug, Default, Clone)]
pub struct QueryResult {
    pub taxids: AHashSet<u32>,
    pub missing: Vec<u32>,
}

impl QueryResult {
    pub fn contains(&self, taxid: u32) -> bool {
        self.taxids.contains(&taxid)
    }
}

fn locate(tree: &TaxonTree, query: &[u32], result: &mut QueryResult) -> Vec<NodeId> {
    let mut found = Vec::with_capacity(query.len());
    for &taxid in query {
        match tree.lookup(taxid) {
            Some(id) => found.push(id),
            None => result.missing.push(taxid),
        }
    }
    result.missing.sort_unstable();
    result.missing.dedup();
    found
}

/// All ancestors of each query taxid, up to and including the root.
/// With `include_self` the query taxids themselves are included too.
pub fn ancestors(tree: &TaxonTree, query: &[u32], include_self: bool) -> QueryResult {
    let mut result = QueryResult::default();
    for id in locate(tree, query, &mut result) {
        if include_self {
            result.taxids.insert(tree.node(id).taxid);
        }
        let mut cur = tree.node(id).parent;
        while let Some(p) = cur {
            result.taxids.insert(tree.node(p).taxid);
            cur = tree.node(p).parent;
        }
    }
    result
}

/// All descendants of each query taxid. Explicit stack rather than
/// recursion, so deep taxonomies cannot blow the call stack.
pub fn descendants(tree: &TaxonTree, query: &[u32], include_self: bool) -> QueryResult {
    let mut result = QueryResult::default();
    for id in locate(tree, query, &mut result) {
        if include_self {
            result.taxids.insert(tree.node(id).taxid);
        }
        let mut stack: Vec<NodeId> = tree.node(id).children.clone();
        while let Some(cur) = stack.pop() {
            result.taxids.insert(tree.node(cur).taxid);
            stack.extend_from_slice(&tree.node(cur).children);
        }
    }
    result
}

/// Expand a filter taxid set the way read extraction needs it: the query
/// ids themselves, plus ancestors and/or descendants on request.
pub fn filter_taxids(
    tree: &TaxonTree,
    query: &[u32],
    include_parents: bool,
    include_children: bool,
) -> QueryResult {
    let mut result = QueryResult::default();
    for id in locate(tree, query, &mut result) {
        result.taxids.insert(tree.node(id).taxid);
    }
    if include_parents {
        let up = ancestors(tree, query, false);
        result.taxids.extend(up.taxids);
    }
    if include_children {
        let down = descendants(tree, query, false);
        result.taxids.extend(down.taxids);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::add_report_source;
    use std::io::Cursor;

    // ids 1 -> 2 -> {3, 4}
    const REPORT: &str = "\
100.00\t100\t0\tR\t1\troot\n\
100.00\t100\t0\tP\t2\t  node two\n\
 50.00\t50\t50\tC\t3\t    node three\n\
 50.00\t50\t50\tC\t4\t    node four\n";

    fn tree() -> TaxonTree {
        let mut tree = TaxonTree::new(1);
        add_report_source(&mut tree, 0, Cursor::new(REPORT)).unwrap();
        tree
    }

    #[test]
    fn ancestor_closure() {
        let tree = tree();
        let up = ancestors(&tree, &[4], false);
        let mut got: Vec<u32> = up.taxids.iter().copied().collect();
        got.sort_unstable();
        assert_eq!(got, vec![1, 2]);
        assert!(up.missing.is_empty());

        let with_self = ancestors(&tree, &[4], true);
        assert!(with_self.contains(4));
    }

    #[test]
    fn descendant_closure() {
        let tree = tree();
        let down = descendants(&tree, &[2], false);
        let mut got: Vec<u32> = down.taxids.iter().copied().collect();
        got.sort_unstable();
        assert_eq!(got, vec![3, 4]);
    }

    #[test]
    fn absent_query_ids_do_not_fail() {
        let tree = tree();
        let up = ancestors(&tree, &[4, 999], false);
        assert_eq!(up.missing, vec![999]);
        assert!(up.contains(1));

        let down = descendants(&tree, &[999], true);
        assert!(down.taxids.is_empty());
        assert_eq!(down.missing, vec![999]);
    }

    #[test]
    fn filter_expansion_matches_flags() {
        let tree = tree();
        let exact = filter_taxids(&tree, &[2], false, false);
        assert_eq!(exact.taxids.len(), 1);
        assert!(exact.contains(2));

        let both = filter_taxids(&tree, &[2], true, true);
        let mut got: Vec<u32> = both.taxids.iter().copied().collect();
        got.sort_unstable();
        assert_eq!(got, vec![1, 2, 3, 4]);
    }
}
