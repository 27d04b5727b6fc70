// src/tree.rs

use ahash::AHashMap;

use crate::rank::RankCode;

/// Handle to a node inside a [`TaxonTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Read counts for one sample at one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleCounts {
    /// Reads in this node plus all descendants.
    pub clade_reads: u64,
    /// Reads assigned directly to this node.
    pub self_reads: u64,
}

/// One taxon in the reconstructed hierarchy.
///
/// Parent/child relationships are arena indices: the tree owns every node
/// in a flat vector, a node never owns another node, and `parent` is a
/// plain back-index used for upward walks.
#[derive(Debug, Clone)]
pub struct TaxonNode {
    pub taxid: u32,
    pub name: String,
    pub rank: RankCode,
    pub depth: usize,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Per-sample counts, index 0 = first sample.
    pub counts: Vec<SampleCounts>,
}

/// A rooted taxonomy tree with per-sample read counts at every node.
///
/// The unclassified pseudo-taxon (rank `U`, taxid 0) is never a node;
/// its per-sample counts live in `unclassified`, and per-sample input
/// totals (classified + unclassified) in `total_reads`.
#[derive(Debug, Clone)]
pub struct TaxonTree {
    nodes: Vec<TaxonNode>,
    index: AHashMap<u32, NodeId>,
    root: Option<NodeId>,
    num_samples: usize,
    pub unclassified: Vec<u64>,
    pub total_reads: Vec<u64>,
    /// Lines that failed to parse as data records, across all sources.
    pub skipped_lines: u64,
}

impl TaxonTree {
    pub fn new(num_samples: usize) -> Self {
        TaxonTree {
            nodes: Vec::new(),
            index: AHashMap::new(),
            root: None,
            num_samples,
            unclassified: vec![0; num_samples],
            total_reads: vec![0; num_samples],
            skipped_lines: 0,
        }
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &TaxonNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut TaxonNode {
        &mut self.nodes[id.0]
    }

    /// Resolve a taxid to its node, if the tree has seen it.
    pub fn lookup(&self, taxid: u32) -> Option<NodeId> {
        self.index.get(&taxid).copied()
    }

    /// Insert a new node. The first node added with `parent == None`
    /// becomes the root; the caller guarantees the taxid is not already
    /// indexed (re-encountered taxids must go through [`Self::lookup`]).
    pub fn add_node(
        &mut self,
        taxid: u32,
        name: String,
        rank: RankCode,
        depth: usize,
        parent: Option<NodeId>,
    ) -> NodeId {
        let id = self.add_detached(taxid, name, rank, depth);
        match parent {
            Some(p) => {
                self.nodes[id.0].parent = Some(p);
                self.nodes[p.0].children.push(id);
            }
            None => {
                if self.root.is_none() {
                    self.root = Some(id);
                }
            }
        }
        id
    }

    /// Insert a node with no links at all; the caller wires parent and
    /// root later (parent-pointer construction with forward references).
    pub fn add_detached(&mut self, taxid: u32, name: String, rank: RankCode, depth: usize) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(TaxonNode {
            taxid,
            name,
            rank,
            depth,
            parent: None,
            children: Vec::new(),
            counts: vec![SampleCounts::default(); self.num_samples],
        });
        self.index.insert(taxid, id);
        id
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    /// Attach `child` under `parent` after the fact. Used by the
    /// parent-pointer builder, where nodes are created before their
    /// parent is known to exist.
    pub fn link(&mut self, child: NodeId, parent: NodeId) {
        debug_assert!(self.nodes[child.0].parent.is_none());
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Re-derive every node's depth from its parent chain. Needed after
    /// deferred linking, where depths are unknown at creation time.
    pub fn recompute_depths(&mut self) {
        let order: Vec<NodeId> = self.preorder().collect();
        for id in order {
            let depth = match self.nodes[id.0].parent {
                Some(p) => self.nodes[p.0].depth + 1,
                None => 0,
            };
            self.nodes[id.0].depth = depth;
        }
    }

    /// Record one sample's reads for a node, accumulating on repeat sight.
    pub fn add_reads(&mut self, id: NodeId, sample: usize, clade_reads: u64, self_reads: u64) {
        let counts = &mut self.nodes[id.0].counts[sample];
        counts.clade_reads += clade_reads;
        counts.self_reads += self_reads;
    }

    /// Clade reads summed over every sample, the sort key for output order.
    pub fn combined_clade(&self, id: NodeId) -> u64 {
        self.nodes[id.0].counts.iter().map(|c| c.clade_reads).sum()
    }

    /// Sort every node's children by descending combined clade reads.
    /// The sort is stable, so ties keep their insertion order.
    pub fn sort_children_by_clade(&mut self) {
        for i in 0..self.nodes.len() {
            let mut kids = std::mem::take(&mut self.nodes[i].children);
            kids.sort_by_key(|&c| std::cmp::Reverse(self.combined_clade(c)));
            self.nodes[i].children = kids;
        }
    }

    /// Pre-order traversal from the root, children in their current order.
    /// Iterative (explicit stack) so deep taxonomies cannot overflow.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: self.root.into_iter().collect(),
        }
    }

    /// Number of parent links between a node and the root. After a
    /// depth-cursor build this reproduces the indentation-derived depth.
    pub fn depth_by_parent_links(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut cur = self.nodes[id.0].parent;
        while let Some(p) = cur {
            depth += 1;
            cur = self.nodes[p.0].parent;
        }
        depth
    }
}

pub struct Preorder<'a> {
    tree: &'a TaxonTree,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        for &child in self.tree.node(id).children.iter().rev() {
            self.stack.push(child);
        }
        Some(id)
    }
}
