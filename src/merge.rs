// src/merge.rs

use std::io::BufRead;

use crate::builder::{add_report_source, SourceStats};
use crate::error::TreeError;
use crate::rollup::rollup;
use crate::tree::TaxonTree;

/// Folds K per-sample reports describing the same taxonomy into one tree
/// with a K-wide count vector at every node.
///
/// Sources are consumed strictly sequentially; the shared taxid index is
/// what makes the fold correct, so there is nothing to parallelize here.
/// The first source to mention a taxid creates the node and fixes its
/// rank code; later sources only contribute counts. A taxon a source
/// never mentions keeps zero counts at that source's index.
pub struct ReportMerger {
    tree: TaxonTree,
    next_sample: usize,
}

impl ReportMerger {
    pub fn new(num_samples: usize) -> Self {
        ReportMerger {
            tree: TaxonTree::new(num_samples),
            next_sample: 0,
        }
    }

    /// Fold the next source in. A structural error leaves the tree exactly
    /// as it was before this source (see [`add_report_source`]); earlier
    /// sources' contributions are never corrupted.
    pub fn merge_source<R: BufRead>(&mut self, reader: R) -> Result<SourceStats, TreeError> {
        assert!(
            self.next_sample < self.tree.num_samples(),
            "more sources than declared samples"
        );
        let stats = add_report_source(&mut self.tree, self.next_sample, reader)?;
        self.next_sample += 1;
        Ok(stats)
    }

    pub fn samples_merged(&self) -> usize {
        self.next_sample
    }

    /// Finalize the merged tree: recompute clade totals from self counts
    /// and order children by descending combined clade reads (insertion
    /// order breaks ties), the order merged reports are rendered in.
    pub fn finish(mut self) -> TaxonTree {
        rollup(&mut self.tree);
        self.tree.sort_children_by_clade();
        self.tree
    }
}
